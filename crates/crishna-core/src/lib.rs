pub mod ai;
pub mod commands;
pub mod config;
pub mod driver;
pub mod error;
pub mod playback;
pub mod provider;
pub mod session;
pub mod state;
pub mod transcript;
pub mod visitor;

// Re-export main types for convenience
pub use ai::{
    ClaudeClient, CompletionClient, CompletionRequest, CompletionResponse, EndpointClient,
    OllamaClient, OpenAIClient,
};
pub use config::Config;
pub use driver::{Driver, DriverOptions};
pub use error::CompletionError;
pub use playback::Timings;
pub use provider::Provider;
pub use session::{ChatState, Phase, PlaybackState, Session};
pub use state::{ContextEntry, EntryKind, HistoryEntry, Role, ScriptedCommand};
pub use visitor::VisitorType;
