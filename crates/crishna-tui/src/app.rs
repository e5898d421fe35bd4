use crishna_core::{Driver, Phase, Provider, Session};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub struct App {
    pub should_quit: bool,
    pub driver: Driver,
    pub session: watch::Receiver<Session>,

    // Input line
    pub input: String,
    pub cursor: usize,

    // Lines scrolled back from the bottom of the transcript
    pub scroll_back: u16,
    pub max_scroll_back: u16,
    pub page_height: u16,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation
    pub cursor_visible: bool,

    pub provider: Provider,
    pub model: Option<String>,

    pub pending: Option<JoinHandle<()>>,
}

impl App {
    pub fn new(driver: Driver, provider: Provider, model: Option<String>) -> Self {
        let session = driver.subscribe();
        Self {
            should_quit: false,
            driver,
            session,
            input: String::new(),
            cursor: 0,
            scroll_back: 0,
            max_scroll_back: 0,
            page_height: 0,
            animation_frame: 0,
            cursor_visible: true,
            provider,
            model,
            pending: None,
        }
    }

    /// The input line only exists once the chat has started.
    pub fn input_visible(&self) -> bool {
        matches!(self.session.borrow().phase(), Phase::Chat(_))
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        self.animation_frame = (self.animation_frame + 1) % 3;
        self.cursor_visible = !self.cursor_visible;

        if self.pending.as_ref().is_some_and(|task| task.is_finished()) {
            self.pending = None;
        }
    }

    /// Hand the input line to the driver. Ignored while a reply is pending.
    pub fn submit(&mut self) {
        if self.pending.is_some() || !self.session.borrow().accepts_input() {
            return;
        }
        if self.input.trim().is_empty() {
            return;
        }

        let input = std::mem::take(&mut self.input);
        self.cursor = 0;
        self.scroll_back = 0;

        let driver = self.driver.clone();
        self.pending = Some(tokio::spawn(async move { driver.submit(input).await }));
    }

    pub fn quit(&mut self) {
        self.driver.shutdown();
        if let Some(task) = self.pending.take() {
            task.abort();
        }
        self.should_quit = true;
    }

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.input, self.cursor);
        self.input.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.input.chars().count() {
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.input.chars().count());
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.input.chars().count();
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll_back = self.scroll_back.saturating_add(lines).min(self.max_scroll_back);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll_back = self.scroll_back.saturating_sub(lines);
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.page_height.max(1) / 2);
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.page_height.max(1) / 2);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crishna_core::{DriverOptions, EndpointClient, Timings};
    use std::sync::Arc;

    /// A driver whose endpoint is unreachable, so only local answers succeed.
    pub(crate) fn offline_app() -> App {
        let driver = Driver::new(
            Vec::new(),
            Arc::new(EndpointClient::new("http://127.0.0.1:9/api/ai-chat")),
            DriverOptions {
                timings: Timings::instant(),
                transcript_dir: std::env::temp_dir(),
            },
        );
        App::new(driver, Provider::Endpoint, None)
    }

    #[tokio::test]
    async fn editing_is_utf8_safe() {
        let mut app = offline_app();
        for c in "héllo".chars() {
            app.insert_char(c);
        }
        app.cursor_left();
        app.cursor_left();
        app.backspace();
        assert_eq!(app.input, "hélo");

        app.cursor_home();
        app.delete();
        assert_eq!(app.input, "élo");

        app.cursor_end();
        app.insert_char('!');
        assert_eq!(app.input, "élo!");
        assert_eq!(app.cursor, 4);
    }

    #[tokio::test]
    async fn scroll_is_clamped() {
        let mut app = offline_app();
        app.max_scroll_back = 5;
        app.page_height = 20;

        app.page_up();
        assert_eq!(app.scroll_back, 5);
        app.scroll_down(3);
        assert_eq!(app.scroll_back, 2);
        app.page_down();
        assert_eq!(app.scroll_back, 0);
    }

    #[tokio::test]
    async fn submit_waits_for_chat() {
        let mut app = offline_app();
        app.input = "help".into();

        app.submit();

        assert!(app.pending.is_none());
        assert_eq!(app.input, "help");
    }

    #[tokio::test]
    async fn submit_clears_input_and_runs_exchange() {
        let mut app = offline_app();
        app.driver.start();
        app.session.wait_for(|s| s.accepts_input()).await.unwrap();

        app.input = "help".into();
        app.cursor = 4;
        app.submit();

        assert_eq!(app.input, "");
        assert_eq!(app.cursor, 0);
        app.pending.take().unwrap().await.unwrap();

        let session = app.session.borrow();
        let last = session.history().last().unwrap();
        assert!(last.is_ai_response());
    }

    #[tokio::test]
    async fn quit_shuts_the_driver_down() {
        let mut app = offline_app();
        app.quit();
        assert!(app.should_quit);
        assert!(app.driver.is_shut_down());
    }
}
