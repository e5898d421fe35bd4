//! Visitor self-identification.
//!
//! After the scripted intro the assistant asks who it is talking to. The
//! first message that matches one of the cue lists below locks the visitor
//! type for the rest of the session.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisitorType {
    Recruiter,
    Client,
    Developer,
    Visitor,
}

/// Cue lists in evaluation order. The first category with a matching cue
/// wins, so "2 just looking" is a client.
const CUES: &[(VisitorType, &[&str])] = &[
    (VisitorType::Recruiter, &["1", "recruiter", "employer", "hiring"]),
    (VisitorType::Client, &["2", "client", "service", "project"]),
    (VisitorType::Developer, &["3", "developer", "tech", "engineer"]),
    (VisitorType::Visitor, &["4", "browsing", "curious", "just"]),
];

/// Canned question appended once the scripted intro has finished.
pub const CLASSIFICATION_PROMPT: &[&str] = &[
    "Before we dive in, who do I have the pleasure of chatting with?",
    "",
    "  1. Recruiter or employer",
    "  2. Potential client",
    "  3. Fellow developer",
    "  4. Just browsing",
    "",
    "Type a number or tell me in your own words.",
];

const RECRUITER_WELCOME: &[&str] = &[
    "A recruiter! Excellent taste in portfolios, I must say.",
    "",
    "Krishna builds products end to end: mobile apps with over **10 million** downloads,",
    "AI features that ship to real users, and backends that stay up at 3am.",
    "",
    "Try **why hire** for the short version, or ask me about leadership, team projects or impact.",
];

const CLIENT_WELCOME: &[&str] = &[
    "Welcome! Looking to get something built? You're in the right terminal.",
    "",
    "Krishna takes ideas from napkin sketch to production: web, mobile and AI integrations,",
    "with clear communication along the way.",
    "",
    "Tell me about your project, or type **pitch** to hear what working together looks like.",
];

const DEVELOPER_WELCOME: &[&str] = &[
    "A fellow developer! Pull up a chair and mind the cables.",
    "",
    "Stack highlights: React/Next.js, React Native and Kotlin on the client; Node, Python and",
    "Spring Boot on the server; LangChain, TensorFlow and OpenAI for the AI bits.",
    "",
    "Ask about architecture decisions, tricky bugs or the projects behind the portfolio.",
];

const VISITOR_WELCOME: &[&str] = &[
    "Happy to have you here, no agenda required.",
    "",
    "Krishna is a software engineer and AI product developer from Hyderabad who builds apps",
    "that millions of people use (and one chatty terminal that you're using right now).",
    "",
    "Type **fun facts** for some trivia, or ask me anything about his work.",
];

impl VisitorType {
    /// Case-insensitive substring match against the cue lists.
    pub fn classify(input: &str) -> Option<Self> {
        let lowered = input.to_lowercase();
        CUES.iter()
            .find(|(_, cues)| cues.iter().any(|cue| lowered.contains(cue)))
            .map(|(kind, _)| *kind)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VisitorType::Recruiter => "recruiter",
            VisitorType::Client => "client",
            VisitorType::Developer => "developer",
            VisitorType::Visitor => "visitor",
        }
    }

    pub fn welcome(&self) -> &'static [&'static str] {
        match self {
            VisitorType::Recruiter => RECRUITER_WELCOME,
            VisitorType::Client => CLIENT_WELCOME,
            VisitorType::Developer => DEVELOPER_WELCOME,
            VisitorType::Visitor => VISITOR_WELCOME,
        }
    }

    /// System-role note added to the completion context (never displayed).
    pub fn context_note(&self) -> String {
        let focus = match self {
            VisitorType::Recruiter => {
                "leadership, scalable projects, team contributions and measurable impact"
            }
            VisitorType::Client => {
                "relevant case studies, problem solving, delivery and collaboration style"
            }
            VisitorType::Developer => {
                "technical approaches, architecture decisions and interesting challenges"
            }
            VisitorType::Visitor => "engaging overviews of the most impressive work and career highlights",
        };
        format!(
            "The visitor identified as a {}. Tailor answers towards {}.",
            self.as_str(),
            focus
        )
    }
}
