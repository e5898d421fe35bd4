//! UI-agnostic conversation types
//!
//! This module contains the data structures shared by the session reducer,
//! the completion clients and any front-end (TUI, web, ...). None of them
//! depend on a UI framework.

use serde::{Deserialize, Serialize};

/// Sentinel `command` value marking an entry as an AI reply.
pub const AI_RESPONSE: &str = "ai-response";

/// Maximum number of context entries kept between exchanges.
pub const CONTEXT_LIMIT: usize = 10;

/// One rendered turn of the terminal transcript.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// How an entry should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// `clear` or an `ai-crishna ...` invocation.
    System,
    /// Something typed by (or on behalf of) the visitor.
    User,
    /// A reply from the assistant.
    Ai,
}

impl HistoryEntry {
    pub fn scripted(command: &ScriptedCommand, timestamp: String) -> Self {
        Self {
            command: Some(command.command.clone()),
            output: command.output.clone(),
            timestamp: Some(timestamp),
        }
    }

    pub fn user(input: &str, timestamp: String) -> Self {
        Self {
            command: Some(input.to_string()),
            output: None,
            timestamp: Some(timestamp),
        }
    }

    pub fn ai_response(lines: Vec<String>, timestamp: String) -> Self {
        Self {
            command: Some(AI_RESPONSE.to_string()),
            output: Some(lines),
            timestamp: Some(timestamp),
        }
    }

    pub fn is_ai_response(&self) -> bool {
        self.command.as_deref() == Some(AI_RESPONSE)
    }

    pub fn kind(&self) -> EntryKind {
        match self.command.as_deref() {
            Some(AI_RESPONSE) => EntryKind::Ai,
            Some(cmd) if is_system_command(cmd) => EntryKind::System,
            _ => EntryKind::User,
        }
    }
}

/// System commands render with a plain `$` prompt instead of `user>`.
pub fn is_system_command(command: &str) -> bool {
    command == "clear" || command.starts_with("ai-crishna")
}

/// The role of a context entry sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A message in the context sent to the completion service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub role: Role,
    pub content: String,
}

impl ContextEntry {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Drop the oldest entries so that at most [`CONTEXT_LIMIT`] remain.
pub fn trim_context(mut context: Vec<ContextEntry>) -> Vec<ContextEntry> {
    if context.len() > CONTEXT_LIMIT {
        context.drain(..context.len() - CONTEXT_LIMIT);
    }
    context
}

/// A predefined command replayed by the playback engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedCommand {
    pub command: String,
    /// Milliseconds between the command being typed and its output appearing.
    pub delay: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Vec<String>>,
}

impl ScriptedCommand {
    pub fn new(command: impl Into<String>, delay: u64) -> Self {
        Self {
            command: command.into(),
            delay,
            output: None,
        }
    }

    pub fn with_output<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output = Some(lines.into_iter().map(Into::into).collect());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trim_context_keeps_newest_entries() {
        let context: Vec<ContextEntry> = (0..13)
            .map(|i| ContextEntry::new(Role::User, format!("m{i}")))
            .collect();

        let trimmed = trim_context(context);

        assert_eq!(trimmed.len(), CONTEXT_LIMIT);
        assert_eq!(trimmed[0].content, "m3");
        assert_eq!(trimmed[9].content, "m12");
    }

    #[test]
    fn entry_kinds() {
        let ts = String::from("10:00:00");
        assert_eq!(HistoryEntry::user("clear", ts.clone()).kind(), EntryKind::System);
        assert_eq!(
            HistoryEntry::user("ai-crishna start", ts.clone()).kind(),
            EntryKind::System
        );
        assert_eq!(HistoryEntry::user("hello", ts.clone()).kind(), EntryKind::User);
        assert_eq!(HistoryEntry::ai_response(vec![], ts).kind(), EntryKind::Ai);
    }

    #[test]
    fn context_entry_uses_lowercase_roles() {
        let json = serde_json::to_string(&ContextEntry::new(Role::Assistant, "hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }

    #[test]
    fn scripted_command_parses_without_output() {
        let cmd: ScriptedCommand =
            serde_json::from_str(r#"{"command":"cd ~/projects","delay":400}"#).unwrap();
        assert_eq!(cmd, ScriptedCommand::new("cd ~/projects", 400));
    }
}
