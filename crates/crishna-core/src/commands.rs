//! Local commands answered without calling the completion service.

/// What a local command does once matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalCommand {
    /// Reset the display history and the completion context.
    Clear,
    /// Write the transcript to disk and confirm.
    Save,
    /// Reply with fixed text.
    Canned(&'static [&'static str]),
}

const HELP: &[&str] = &[
    "Available commands:",
    "  help       show this list",
    "  why hire   the elevator pitch for recruiters",
    "  fun facts  a few things you won't find on the resume",
    "  pitch      what working with Krishna looks like",
    "  save       download this conversation as a text file",
    "  clear      wipe the terminal and start over",
    "",
    "Anything else goes straight to AI Crishna. Ask away!",
];

const WHY_HIRE: &[&str] = &[
    "Why hire Krishna? Glad you asked.",
    "",
    "  * Shipped mobile apps with **10M+** combined downloads",
    "  * Full-stack: React/Next.js, React Native, Kotlin, Node, Python, Spring Boot",
    "  * Brings AI into products people actually use, not just demos",
    "  * Has led teams through complex launches with everyone's sanity intact",
    "",
    "In short: one engineer, many hats, all of them fitting nicely.",
];

const FUN_FACTS: &[&str] = &[
    "Fun facts about Krishna:",
    "",
    "  * He built the assistant you're talking to (so be nice to both of us)",
    "  * Survey Heart crossed a million downloads before most people finish their first survey",
    "  * His browser history is basically a preview of next year's tech news",
    "  * He dreams in code, but mostly in TypeScript",
];

const PITCH: &[&str] = &[
    "Here's the pitch:",
    "",
    "You bring the problem, Krishna brings the plan. Discovery, design, build and launch,",
    "with honest timelines and regular demos along the way. Web, mobile or AI, it all",
    "ships from the same pair of hands.",
    "",
    "Interested? Reach out through the contact form or linkedin.com/in/krishnakorukanti.",
];

/// Checked in order before any completion request is made.
const TABLE: &[(&str, LocalCommand)] = &[
    ("clear", LocalCommand::Clear),
    ("help", LocalCommand::Canned(HELP)),
    ("why hire", LocalCommand::Canned(WHY_HIRE)),
    ("fun facts", LocalCommand::Canned(FUN_FACTS)),
    ("pitch", LocalCommand::Canned(PITCH)),
    ("save", LocalCommand::Save),
];

impl LocalCommand {
    /// Exact match on the trimmed, lower-cased input.
    pub fn lookup(input: &str) -> Option<Self> {
        let normalized = input.trim().to_lowercase();
        TABLE
            .iter()
            .find(|(name, _)| *name == normalized)
            .map(|(_, command)| *command)
    }

    pub fn names() -> impl Iterator<Item = &'static str> {
        TABLE.iter().map(|(name, _)| *name)
    }
}

/// Convert a static reply into owned lines for a history entry.
pub fn to_lines(text: &[&str]) -> Vec<String> {
    text.iter().map(|line| line.to_string()).collect()
}
