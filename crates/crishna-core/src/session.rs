//! Conversation state and its transitions.
//!
//! [`Session`] owns everything a front-end renders: the transcript, the
//! completion context, the visitor type and the half-typed scripted command.
//! It only changes through [`Session::apply`], which takes an [`Event`] and
//! returns the [`Effect`] the caller has to carry out (a completion request,
//! a transcript write). Timers and I/O live in [`crate::driver`].

use tracing::debug;

use crate::ai::CompletionRequest;
use crate::commands::{self, LocalCommand};
use crate::state::{trim_context, ContextEntry, HistoryEntry, Role, ScriptedCommand};
use crate::transcript;
use crate::visitor::{VisitorType, CLASSIFICATION_PROMPT};

/// Reply shown when the completion service cannot be reached.
pub const FALLBACK_REPLY: &[&str] = &[
    "Sorry, I'm having trouble connecting to my brain right now.",
    "Please try again in a moment, or type 'help' to see what I can do offline.",
];

/// Scripted playback progress for the command at `index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Waiting to start typing.
    Idle { index: usize },
    /// `typed` characters of the command are visible.
    TypingCommand { index: usize, typed: usize },
    WaitingBeforeOutput { index: usize },
    AiThinkingPause { index: usize },
}

impl PlaybackState {
    pub fn index(&self) -> usize {
        match *self {
            PlaybackState::Idle { index }
            | PlaybackState::TypingCommand { index, .. }
            | PlaybackState::WaitingBeforeOutput { index }
            | PlaybackState::AiThinkingPause { index } => index,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatState {
    Ready,
    Thinking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Before the activation delay has elapsed.
    Dormant,
    Playback(PlaybackState),
    /// All scripted commands shown, visitor prompt not yet asked.
    ScriptComplete,
    /// Free-form chat, entered once the visitor prompt has been shown.
    Chat(ChatState),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Activated,
    TypingStarted,
    CharTyped,
    ThinkingStarted,
    OutputRevealed { timestamp: String },
    VisitorPrompted { timestamp: String },
    Submitted { input: String, timestamp: String },
    /// A locally produced reply for the pending exchange.
    Replied { lines: Vec<String>, timestamp: String },
    Completed {
        response: String,
        context: Vec<ContextEntry>,
        timestamp: String,
    },
    CompletionFailed { timestamp: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// The transition happened and nothing else needs doing.
    None,
    /// The event does not apply in the current phase; state is unchanged.
    Ignored,
    /// Ask the completion service, then apply `Completed` or `CompletionFailed`.
    Request(CompletionRequest),
    /// Write this transcript to disk, then apply `Replied` with a confirmation.
    SaveTranscript(String),
}

#[derive(Debug, Clone)]
pub struct Session {
    script: Vec<ScriptedCommand>,
    phase: Phase,
    history: Vec<HistoryEntry>,
    context: Vec<ContextEntry>,
    visitor: Option<VisitorType>,
    typed: String,
}

impl Session {
    pub fn new(script: Vec<ScriptedCommand>) -> Self {
        Self {
            script,
            phase: Phase::Dormant,
            history: Vec::new(),
            context: Vec::new(),
            visitor: None,
            typed: String::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn context(&self) -> &[ContextEntry] {
        &self.context
    }

    pub fn visitor(&self) -> Option<VisitorType> {
        self.visitor
    }

    /// The part of the current scripted command typed so far.
    pub fn typed(&self) -> &str {
        &self.typed
    }

    pub fn is_typing(&self) -> bool {
        matches!(
            self.phase,
            Phase::Playback(PlaybackState::TypingCommand { .. })
        )
    }

    pub fn is_thinking(&self) -> bool {
        matches!(
            self.phase,
            Phase::Chat(ChatState::Thinking) | Phase::Playback(PlaybackState::AiThinkingPause { .. })
        )
    }

    /// Whether a submission would currently be accepted.
    pub fn accepts_input(&self) -> bool {
        self.phase == Phase::Chat(ChatState::Ready)
    }

    pub fn is_script_complete(&self) -> bool {
        matches!(self.phase, Phase::ScriptComplete | Phase::Chat(_))
    }

    pub fn apply(&mut self, event: Event) -> Effect {
        let effect = match (self.phase, event) {
            (Phase::Dormant, Event::Activated) => {
                self.phase = if self.script.is_empty() {
                    Phase::ScriptComplete
                } else {
                    Phase::Playback(PlaybackState::Idle { index: 0 })
                };
                Effect::None
            }
            (Phase::Playback(PlaybackState::Idle { index }), Event::TypingStarted) => {
                self.typed.clear();
                self.phase = if self.script[index].command.is_empty() {
                    Phase::Playback(PlaybackState::WaitingBeforeOutput { index })
                } else {
                    Phase::Playback(PlaybackState::TypingCommand { index, typed: 0 })
                };
                Effect::None
            }
            (Phase::Playback(PlaybackState::TypingCommand { index, typed }), Event::CharTyped) => {
                self.type_char(index, typed);
                Effect::None
            }
            (Phase::Playback(PlaybackState::WaitingBeforeOutput { index }), Event::ThinkingStarted) => {
                self.phase = Phase::Playback(PlaybackState::AiThinkingPause { index });
                Effect::None
            }
            (
                Phase::Playback(
                    PlaybackState::WaitingBeforeOutput { index }
                    | PlaybackState::AiThinkingPause { index },
                ),
                Event::OutputRevealed { timestamp },
            ) => {
                self.reveal(index, timestamp);
                Effect::None
            }
            (Phase::ScriptComplete, Event::VisitorPrompted { timestamp }) => {
                self.history.push(HistoryEntry::ai_response(
                    commands::to_lines(CLASSIFICATION_PROMPT),
                    timestamp,
                ));
                self.phase = Phase::Chat(ChatState::Ready);
                Effect::None
            }
            (Phase::Chat(ChatState::Ready), Event::Submitted { input, timestamp }) => {
                self.submit(input, timestamp)
            }
            (Phase::Chat(ChatState::Thinking), Event::Replied { lines, timestamp }) => {
                self.finish(lines, timestamp);
                Effect::None
            }
            (
                Phase::Chat(ChatState::Thinking),
                Event::Completed {
                    response,
                    context,
                    timestamp,
                },
            ) => {
                self.context = trim_context(context);
                self.finish(response.lines().map(str::to_string).collect(), timestamp);
                Effect::None
            }
            (Phase::Chat(ChatState::Thinking), Event::CompletionFailed { timestamp }) => {
                self.finish(commands::to_lines(FALLBACK_REPLY), timestamp);
                Effect::None
            }
            (phase, event) => {
                debug!(?phase, ?event, "ignoring event");
                Effect::Ignored
            }
        };

        if effect != Effect::Ignored {
            debug!(phase = ?self.phase, "session transition");
        }
        effect
    }

    fn type_char(&mut self, index: usize, typed: usize) {
        let command = &self.script[index].command;
        if let Some(c) = command.chars().nth(typed) {
            self.typed.push(c);
        }
        let typed = typed + 1;
        self.phase = if typed >= command.chars().count() {
            Phase::Playback(PlaybackState::WaitingBeforeOutput { index })
        } else {
            Phase::Playback(PlaybackState::TypingCommand { index, typed })
        };
    }

    fn reveal(&mut self, index: usize, timestamp: String) {
        self.history
            .push(HistoryEntry::scripted(&self.script[index], timestamp));
        self.typed.clear();

        let next = index + 1;
        self.phase = if next >= self.script.len() {
            Phase::ScriptComplete
        } else {
            Phase::Playback(PlaybackState::Idle { index: next })
        };
    }

    /// The transcript keeps the trimmed text; the completion request gets
    /// the input exactly as typed.
    fn submit(&mut self, input: String, timestamp: String) -> Effect {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Effect::Ignored;
        }

        self.history
            .push(HistoryEntry::user(trimmed, timestamp.clone()));
        self.phase = Phase::Chat(ChatState::Thinking);

        if self.visitor.is_none() {
            if let Some(kind) = VisitorType::classify(trimmed) {
                self.visitor = Some(kind);
                self.context
                    .push(ContextEntry::new(Role::System, kind.context_note()));
                self.context = trim_context(std::mem::take(&mut self.context));
                self.finish(commands::to_lines(kind.welcome()), timestamp);
                return Effect::None;
            }
        }

        match LocalCommand::lookup(trimmed) {
            Some(LocalCommand::Clear) => {
                self.history.clear();
                self.context.clear();
                self.phase = Phase::Chat(ChatState::Ready);
                Effect::None
            }
            Some(LocalCommand::Canned(text)) => {
                self.finish(commands::to_lines(text), timestamp);
                Effect::None
            }
            Some(LocalCommand::Save) => Effect::SaveTranscript(transcript::render(&self.history)),
            None => Effect::Request(CompletionRequest {
                message: input,
                conversation_history: self.context.clone(),
            }),
        }
    }

    fn finish(&mut self, lines: Vec<String>, timestamp: String) {
        self.history.push(HistoryEntry::ai_response(lines, timestamp));
        self.phase = Phase::Chat(ChatState::Ready);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::CONTEXT_LIMIT;
    use pretty_assertions::assert_eq;

    fn ts() -> String {
        "12:00:00 PM".to_string()
    }

    fn submit(session: &mut Session, input: &str) -> Effect {
        session.apply(Event::Submitted {
            input: input.to_string(),
            timestamp: ts(),
        })
    }

    /// Drive every scripted command to completion.
    fn play_script(session: &mut Session) {
        assert_eq!(session.apply(Event::Activated), Effect::None);
        while let Phase::Playback(_) = session.phase() {
            session.apply(Event::TypingStarted);
            while session.is_typing() {
                session.apply(Event::CharTyped);
            }
            session.apply(Event::OutputRevealed { timestamp: ts() });
        }
    }

    fn chatting(script: Vec<ScriptedCommand>) -> Session {
        let mut session = Session::new(script);
        play_script(&mut session);
        session.apply(Event::VisitorPrompted { timestamp: ts() });
        session
    }

    #[test]
    fn typing_reveals_one_character_at_a_time() {
        let mut session = Session::new(vec![ScriptedCommand::new("ls", 100)]);
        session.apply(Event::Activated);
        session.apply(Event::TypingStarted);

        session.apply(Event::CharTyped);
        assert_eq!(session.typed(), "l");
        assert!(session.is_typing());

        session.apply(Event::CharTyped);
        assert_eq!(session.typed(), "ls");
        assert_eq!(
            session.phase(),
            Phase::Playback(PlaybackState::WaitingBeforeOutput { index: 0 })
        );
    }

    #[test]
    fn script_entries_are_appended_in_order() {
        let script = vec![
            ScriptedCommand::new("cd ~/projects", 400),
            ScriptedCommand::new("ls", 600).with_output(["ai-app/", "backend-api/"]),
        ];
        let mut session = Session::new(script);
        play_script(&mut session);

        let commands: Vec<_> = session
            .history()
            .iter()
            .map(|e| e.command.clone().unwrap_or_default())
            .collect();
        assert_eq!(commands, vec!["cd ~/projects", "ls"]);
        assert_eq!(
            session.history()[1].output,
            Some(vec!["ai-app/".to_string(), "backend-api/".to_string()])
        );
        assert_eq!(session.typed(), "");
        assert_eq!(session.phase(), Phase::ScriptComplete);
    }

    #[test]
    fn script_complete_is_never_left_for_playback() {
        for n in 0..4 {
            let script = (0..n).map(|i| ScriptedCommand::new(format!("c{i}"), 10)).collect();
            let mut session = Session::new(script);
            play_script(&mut session);
            assert_eq!(session.phase(), Phase::ScriptComplete);
            assert_eq!(session.history().len(), n);

            for event in [
                Event::Activated,
                Event::TypingStarted,
                Event::CharTyped,
                Event::ThinkingStarted,
                Event::OutputRevealed { timestamp: ts() },
            ] {
                assert_eq!(session.apply(event), Effect::Ignored);
            }
            assert_eq!(session.phase(), Phase::ScriptComplete);
        }
    }

    #[test]
    fn empty_script_completes_on_activation() {
        let mut session = Session::new(Vec::new());
        assert_eq!(session.phase(), Phase::Dormant);

        session.apply(Event::Activated);

        assert_eq!(session.phase(), Phase::ScriptComplete);
        assert!(session.history().is_empty());
    }

    #[test]
    fn visitor_prompt_is_shown_once() {
        let mut session = Session::new(Vec::new());
        session.apply(Event::Activated);

        assert_eq!(
            session.apply(Event::VisitorPrompted { timestamp: ts() }),
            Effect::None
        );
        assert_eq!(
            session.apply(Event::VisitorPrompted { timestamp: ts() }),
            Effect::Ignored
        );

        let prompts = session
            .history()
            .iter()
            .filter(|e| e.is_ai_response())
            .count();
        assert_eq!(prompts, 1);
        assert!(session.accepts_input());
    }

    #[test]
    fn input_is_refused_before_chat() {
        let mut session = Session::new(vec![ScriptedCommand::new("ls", 10)]);
        session.apply(Event::Activated);

        assert_eq!(submit(&mut session, "help"), Effect::Ignored);
        assert!(session.history().is_empty());
    }

    #[test]
    fn blank_input_is_ignored() {
        let mut session = chatting(Vec::new());
        let before = session.history().len();

        assert_eq!(submit(&mut session, "   "), Effect::Ignored);
        assert_eq!(session.history().len(), before);
        assert!(session.accepts_input());
    }

    #[test]
    fn classification_answers_locally_and_notes_context() {
        let mut session = chatting(Vec::new());

        assert_eq!(submit(&mut session, "2"), Effect::None);

        assert_eq!(session.visitor(), Some(VisitorType::Client));
        let last = session.history().last().unwrap();
        assert_eq!(last.output, Some(commands::to_lines(VisitorType::Client.welcome())));
        assert_eq!(session.context().len(), 1);
        assert_eq!(session.context()[0].role, Role::System);
        assert!(session.accepts_input());
    }

    #[test]
    fn transcript_gets_trimmed_text_and_request_gets_raw_input() {
        let mut session = chatting(Vec::new());

        let effect = submit(&mut session, "  Hello there \n");

        assert_eq!(
            session.history().last().unwrap().command.as_deref(),
            Some("Hello there")
        );
        assert!(matches!(effect, Effect::Request(r) if r.message == "  Hello there \n"));
    }

    #[test]
    fn late_classification_keeps_context_bounded() {
        let mut session = chatting(Vec::new());
        assert!(matches!(submit(&mut session, "Hello there"), Effect::Request(_)));
        session.apply(Event::Completed {
            response: "Hi!".to_string(),
            context: (0..CONTEXT_LIMIT)
                .map(|i| ContextEntry::new(Role::User, format!("m{i}")))
                .collect(),
            timestamp: ts(),
        });
        assert_eq!(session.context().len(), CONTEXT_LIMIT);

        assert_eq!(submit(&mut session, "I'm a recruiter"), Effect::None);

        assert_eq!(session.visitor(), Some(VisitorType::Recruiter));
        let context = session.context();
        assert_eq!(context.len(), CONTEXT_LIMIT);
        assert_eq!(context[0].content, "m1");
        assert_eq!(context[CONTEXT_LIMIT - 1].role, Role::System);
    }

    #[test]
    fn visitor_type_is_never_reclassified() {
        let mut session = chatting(Vec::new());
        submit(&mut session, "I'm a developer");
        assert_eq!(session.visitor(), Some(VisitorType::Developer));

        let effect = submit(&mut session, "1");
        assert!(matches!(effect, Effect::Request(_)));
        assert_eq!(session.visitor(), Some(VisitorType::Developer));
    }

    #[test]
    fn unclassified_message_goes_to_completion() {
        let mut session = chatting(Vec::new());

        let effect = submit(&mut session, "Hello there");

        assert_eq!(
            effect,
            Effect::Request(CompletionRequest {
                message: "Hello there".to_string(),
                conversation_history: Vec::new(),
            })
        );
        assert_eq!(session.visitor(), None);
        assert!(session.is_thinking());
        assert!(!session.accepts_input());
    }

    #[test]
    fn help_is_answered_locally() {
        let mut session = chatting(Vec::new());
        submit(&mut session, "4");

        assert_eq!(submit(&mut session, "HELP"), Effect::None);

        let last = session.history().last().unwrap();
        assert!(last.is_ai_response());
        assert_eq!(last.output.as_ref().unwrap()[0], "Available commands:");
    }

    #[test]
    fn clear_resets_history_and_context() {
        let mut session = chatting(vec![ScriptedCommand::new("ls", 10)]);
        submit(&mut session, "recruiter");
        assert!(!session.context().is_empty());

        assert_eq!(submit(&mut session, "clear"), Effect::None);

        assert!(session.history().is_empty());
        assert!(session.context().is_empty());
        assert!(session.accepts_input());
    }

    #[test]
    fn save_requests_transcript_including_the_command() {
        let mut session = chatting(Vec::new());
        submit(&mut session, "3");

        let Effect::SaveTranscript(text) = submit(&mut session, "save") else {
            panic!("expected a transcript");
        };
        assert!(text.ends_with("User (12:00:00 PM):\nsave\n"));
        assert!(session.is_thinking());

        session.apply(Event::Replied {
            lines: vec!["saved".into()],
            timestamp: ts(),
        });
        assert!(session.accepts_input());
    }

    #[test]
    fn completion_replaces_and_trims_context() {
        let mut session = chatting(Vec::new());
        submit(&mut session, "what does he build?");

        let context: Vec<_> = (0..12)
            .map(|i| ContextEntry::new(Role::User, format!("m{i}")))
            .collect();
        session.apply(Event::Completed {
            response: "Apps.\nLots of apps.".into(),
            context,
            timestamp: ts(),
        });

        assert_eq!(session.context().len(), 10);
        assert_eq!(session.context()[0].content, "m2");
        let last = session.history().last().unwrap();
        assert_eq!(
            last.output,
            Some(vec!["Apps.".to_string(), "Lots of apps.".to_string()])
        );
        assert!(session.accepts_input());
    }

    #[test]
    fn failure_shows_fallback_and_clears_thinking() {
        let mut session = chatting(Vec::new());
        submit(&mut session, "tell me a story");

        session.apply(Event::CompletionFailed { timestamp: ts() });

        let last = session.history().last().unwrap();
        assert_eq!(last.output, Some(commands::to_lines(FALLBACK_REPLY)));
        assert!(!session.is_thinking());
    }

    #[test]
    fn second_submission_while_pending_is_ignored() {
        let mut session = chatting(Vec::new());
        submit(&mut session, "first question");
        let len = session.history().len();

        assert_eq!(submit(&mut session, "second question"), Effect::Ignored);
        assert_eq!(session.history().len(), len);
    }

    #[test]
    fn late_reply_after_exchange_is_ignored() {
        let mut session = chatting(Vec::new());
        assert_eq!(
            session.apply(Event::CompletionFailed { timestamp: ts() }),
            Effect::Ignored
        );
    }
}
