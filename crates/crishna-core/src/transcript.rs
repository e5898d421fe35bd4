use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use chrono::NaiveDate;

use crate::state::HistoryEntry;

/// Render the history as plain text, one block per entry.
pub fn render(history: &[HistoryEntry]) -> String {
    history
        .iter()
        .map(|entry| {
            let timestamp = entry.timestamp.as_deref().unwrap_or("-");
            if entry.is_ai_response() {
                let body = entry.output.as_deref().unwrap_or_default().join("\n");
                format!("AI ({timestamp}):\n{body}\n")
            } else {
                let command = entry.command.as_deref().unwrap_or_default();
                format!("User ({timestamp}):\n{command}\n")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn file_name(date: NaiveDate) -> String {
    format!("conversation-{}.txt", date.format("%Y-%m-%d"))
}

/// Where saved conversations go when nothing is configured.
pub fn default_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Write `contents` to `dir/conversation-<date>.txt`, returning the path.
pub fn write(dir: &Path, date: NaiveDate, contents: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .map_err(|e| anyhow!("Failed to create transcript directory {:?}: {}", dir, e))?;

    let path = dir.join(file_name(date));
    fs::write(&path, contents)
        .map_err(|e| anyhow!("Failed to write transcript {:?}: {}", path, e))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn renders_user_and_ai_blocks() {
        let history = vec![
            HistoryEntry::user("what does he build?", "10:00:01 AM".into()),
            HistoryEntry::ai_response(
                vec!["Apps.".into(), "Lots of apps.".into()],
                "10:00:03 AM".into(),
            ),
        ];

        assert_eq!(
            render(&history),
            "User (10:00:01 AM):\nwhat does he build?\n\nAI (10:00:03 AM):\nApps.\nLots of apps.\n"
        );
    }

    #[test]
    fn scripted_entries_render_as_user_blocks() {
        let entry = HistoryEntry {
            command: Some("ls".into()),
            output: Some(vec!["ai-app/".into()]),
            timestamp: None,
        };
        assert_eq!(render(&[entry]), "User (-):\nls\n");
    }

    #[test]
    fn file_name_uses_iso_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(file_name(date), "conversation-2024-03-09.txt");
    }

    #[test]
    fn write_creates_directory_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested");
        let date = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();

        let path = write(&target, date, "hello\n").unwrap();

        assert_eq!(path, target.join("conversation-2025-01-02.txt"));
        assert_eq!(fs::read_to_string(path).unwrap(), "hello\n");
    }
}
