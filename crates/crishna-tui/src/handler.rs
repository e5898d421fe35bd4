use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::App;
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize(_, _) | AppEvent::Session => {}
        AppEvent::Tick => app.tick_animation(),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any phase
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    match key.code {
        KeyCode::Esc => app.quit(),

        // Scrolling the transcript
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::PageUp => app.page_up(),
        KeyCode::PageDown => app.page_down(),

        _ if app.input_visible() => handle_input(app, key),
        _ => {}
    }
}

fn handle_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.submit(),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => app.insert_char(c),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::offline_app;

    fn press(app: &mut App, code: KeyCode) {
        handle_event(app, AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    #[tokio::test]
    async fn typing_before_chat_is_ignored() {
        let mut app = offline_app();
        press(&mut app, KeyCode::Char('x'));
        assert!(app.input.is_empty());
    }

    #[tokio::test]
    async fn keys_edit_and_submit_once_chat_starts() {
        let mut app = offline_app();
        app.driver.start();
        app.session.wait_for(|s| s.accepts_input()).await.unwrap();

        for c in "pitch".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        assert_eq!(app.input, "pitch");

        press(&mut app, KeyCode::Enter);
        app.pending.take().unwrap().await.unwrap();

        let session = app.session.borrow();
        let history = session.history();
        assert_eq!(history[history.len() - 2].command.as_deref(), Some("pitch"));
        assert!(history[history.len() - 1].is_ai_response());
    }

    #[tokio::test]
    async fn ctrl_c_quits() {
        let mut app = offline_app();
        handle_event(
            &mut app,
            AppEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
        );
        assert!(app.should_quit);
    }
}
