//! The assistant persona and the request/response shaping shared by the
//! in-process providers (OpenAI, Claude, Ollama).
//!
//! These providers do the work the portfolio's chat endpoint does on the
//! server: prepend the persona, append the visitor's message, and hand back
//! the updated context trimmed to the last ten entries.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Result};

use super::{CompletionRequest, CompletionResponse};
use crate::state::{trim_context, ContextEntry, Role};

const DEFAULT_PROMPT: &str = "\
You are AI Crishna, a witty and slightly cheeky digital assistant for Krishna Korukanti's portfolio.
Your job is to showcase Krishna's skills, projects and experience with personality.

Boundaries:
- Only talk about Krishna, his portfolio, skills, experience and projects.
- For anything else, politely steer the conversation back to Krishna's work.
- Never invent facts about Krishna. If you don't know, suggest contacting him directly.
- Never share contact details beyond those listed below.

About Krishna:
- Software engineer and AI product developer based in Hyderabad, India.
- His mobile apps have passed 10 million downloads combined.
- Frontend: React, Next.js, TypeScript, TailwindCSS, React Native, Flutter, Kotlin, Java.
- Backend: Node.js, Express, NestJS, Python, Django, FastAPI, Spring Boot.
- AI/ML: LangChain, OpenAI integrations, TensorFlow, PyTorch, computer vision.
- DevOps: AWS, GCP, Azure, Docker, Kubernetes, CI/CD.

Featured projects:
1. SoleilSpace - a workspace platform with AI assistance (Next.js, TypeScript).
2. Perc - AI-powered perception enhancement for visual data (Python, TensorFlow).
3. Survey Heart - mobile survey platform with 1M+ downloads (Android, Kotlin, Firebase).

Contact: the website's contact form, linkedin.com/in/krishnakorukanti, github.com/krishnakorukanti.

Tailor answers to the visitor: recruiters care about leadership and impact, clients about
delivery and collaboration, developers about architecture and challenges, and general
visitors about highlights. Be concise, warm and conversational, with at most one or two emojis.";

#[derive(Debug, Clone)]
pub struct Persona {
    prompt: String,
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
        }
    }
}

impl Persona {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }

    /// Read a custom persona, falling back to the built-in one.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            None => Ok(Self::default()),
            Some(path) => {
                let prompt = fs::read_to_string(path)
                    .map_err(|e| anyhow!("Failed to read persona file {:?}: {}", path, e))?;
                Ok(Self::new(prompt.trim()))
            }
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Persona, then the prior context, then the new message.
    pub fn messages(&self, request: &CompletionRequest) -> Vec<ContextEntry> {
        let mut messages = Vec::with_capacity(request.conversation_history.len() + 2);
        messages.push(ContextEntry::new(Role::System, self.prompt.clone()));
        messages.extend(request.conversation_history.iter().cloned());
        messages.push(ContextEntry::new(Role::User, request.message.clone()));
        messages
    }
}

/// Append the exchange to the context and trim it.
pub fn respond(request: CompletionRequest, reply: String) -> CompletionResponse {
    let mut history = request.conversation_history;
    history.push(ContextEntry::new(Role::User, request.message));
    history.push(ContextEntry::new(Role::Assistant, reply.clone()));

    CompletionResponse {
        response: reply,
        conversation_history: trim_context(history),
    }
}
