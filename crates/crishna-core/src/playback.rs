//! Scripted playback: timings, scripts and the task that types them out.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::driver::Driver;
use crate::session::Event;
use crate::state::{is_system_command, ScriptedCommand};

/// Fixed delays of the scripted intro. Stored in config as milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    /// Before anything animates at all.
    #[serde(rename = "activation_ms", with = "millis")]
    pub activation: Duration,
    /// Before typing of each command begins.
    #[serde(rename = "pre_typing_ms", with = "millis")]
    pub pre_typing: Duration,
    #[serde(rename = "typing_interval_ms", with = "millis")]
    pub typing_interval: Duration,
    /// Between the command being typed and the thinking indicator.
    #[serde(rename = "pre_output_ms", with = "millis")]
    pub pre_output: Duration,
    /// Between the end of the script and the visitor prompt.
    #[serde(rename = "prompt_ms", with = "millis")]
    pub prompt: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            activation: Duration::from_millis(300),
            pre_typing: Duration::from_millis(300),
            typing_interval: Duration::from_millis(40),
            pre_output: Duration::from_millis(200),
            prompt: Duration::from_millis(800),
        }
    }
}

impl Timings {
    /// Everything immediate; handy for tests and `--no-animation`.
    pub fn instant() -> Self {
        Self {
            activation: Duration::ZERO,
            pre_typing: Duration::ZERO,
            typing_interval: Duration::ZERO,
            pre_output: Duration::ZERO,
            prompt: Duration::ZERO,
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// The intro played when no script file is configured.
pub fn default_script() -> Vec<ScriptedCommand> {
    vec![
        ScriptedCommand::new("ai-crishna start", 600).with_output([
            "Booting AI Crishna v2.0...",
            "Hi! I'm Krishna's digital assistant. Ask me anything about his work.",
        ]),
        ScriptedCommand::new("cd ~/projects", 400),
        ScriptedCommand::new("ls", 600).with_output([
            "ai-app/",
            "mobile-client/",
            "backend-api/",
            "web-frontend/",
        ]),
        ScriptedCommand::new("cd ai-app && npm run dev", 800).with_output([
            "Starting development server...",
            "AI application running on http://localhost:3000",
        ]),
    ]
}

/// Read a JSON array of `{command, delay, output?}` objects.
pub fn load_script(path: &Path) -> Result<Vec<ScriptedCommand>> {
    let content = fs::read_to_string(path)
        .map_err(|e| anyhow!("Failed to read script {:?}: {}", path, e))?;
    serde_json::from_str(&content).map_err(|e| anyhow!("Invalid script {:?}: {}", path, e))
}

/// Play the whole script, then ask the visitor prompt.
///
/// Returns early once the driver is shut down.
pub(crate) async fn play(driver: Driver) {
    let timings = driver.timings();

    if !driver.pause(timings.activation).await || !driver.step(Event::Activated) {
        return;
    }

    let script = driver.script();
    for (index, command) in script.iter().enumerate() {
        debug!(index, command = %command.command, "playing scripted command");

        if !driver.pause(timings.pre_typing).await || !driver.step(Event::TypingStarted) {
            return;
        }
        for _ in command.command.chars() {
            if !driver.pause(timings.typing_interval).await || !driver.step(Event::CharTyped) {
                return;
            }
        }

        if !driver.pause(timings.pre_output).await {
            return;
        }
        if command.output.is_some()
            && !is_system_command(&command.command)
            && !driver.step(Event::ThinkingStarted)
        {
            return;
        }

        if !driver.pause(Duration::from_millis(command.delay)).await
            || !driver.step(Event::OutputRevealed {
                timestamp: driver.timestamp(),
            })
        {
            return;
        }
    }

    if driver.pause(timings.prompt).await {
        driver.step(Event::VisitorPrompted {
            timestamp: driver.timestamp(),
        });
    }
}
