use crishna_core::state::is_system_command;
use crishna_core::{EntryKind, HistoryEntry, Phase, Session};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::App;

const PROMPT_SYSTEM: &str = "$ ";
const PROMPT_USER: &str = "user> ";
const REPLY_GUTTER: &str = "  │ ";

/// Render `**bold**` spans; an unmatched `**` stays literal.
fn markdown_line(text: &str, base: Style) -> Line<'static> {
    let parts: Vec<&str> = text.split("**").collect();
    let mut spans: Vec<Span<'static>> = Vec::new();

    for (i, part) in parts.iter().enumerate() {
        if i % 2 == 0 {
            if !part.is_empty() {
                spans.push(Span::styled(part.to_string(), base));
            }
        } else if i + 1 == parts.len() {
            spans.push(Span::styled(format!("**{part}"), base));
        } else if !part.is_empty() {
            spans.push(Span::styled(
                part.to_string(),
                base.add_modifier(Modifier::BOLD),
            ));
        }
    }

    Line::from(spans)
}

fn prompt_style(kind: EntryKind) -> (&'static str, Style, Style) {
    match kind {
        EntryKind::System => (
            PROMPT_SYSTEM,
            Style::default().fg(Color::DarkGray),
            Style::default().fg(Color::Gray),
        ),
        _ => (
            PROMPT_USER,
            Style::default().fg(Color::Magenta),
            Style::default()
                .fg(Color::LightMagenta)
                .add_modifier(Modifier::BOLD),
        ),
    }
}

fn entry_lines(entry: &HistoryEntry, lines: &mut Vec<Line<'static>>) {
    let kind = entry.kind();
    let output = entry.output.as_deref().unwrap_or_default();

    if kind == EntryKind::Ai {
        lines.push(Line::from(Span::styled(
            "AI Crishna:",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )));
        let reply = Style::default().fg(Color::LightBlue);
        for line in output {
            let mut styled = markdown_line(line, reply);
            styled
                .spans
                .insert(0, Span::styled(REPLY_GUTTER, Style::default().fg(Color::Blue)));
            lines.push(styled);
        }
    } else {
        let (prompt, prompt_style, text_style) = prompt_style(kind);
        let command = entry.command.clone().unwrap_or_default();
        lines.push(Line::from(vec![
            Span::styled(prompt, prompt_style),
            Span::styled(command, text_style),
        ]));
        for line in output {
            lines.push(Line::from(Span::styled(
                format!("  {line}"),
                Style::default().fg(Color::Gray),
            )));
        }
    }
    lines.push(Line::default());
}

fn transcript(app: &App, session: &Session) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for entry in session.history() {
        entry_lines(entry, &mut lines);
    }

    // Command currently being typed by the playback engine
    if !session.typed().is_empty() || session.is_typing() {
        let typed = session.typed().to_string();
        let kind = if is_system_command(&typed) {
            EntryKind::System
        } else {
            EntryKind::User
        };
        let (prompt, prompt_style, text_style) = prompt_style(kind);
        let mut spans = vec![
            Span::styled(prompt, prompt_style),
            Span::styled(typed, text_style),
        ];
        if session.is_typing() && app.cursor_visible {
            spans.push(Span::styled("█", Style::default().fg(Color::Gray)));
        }
        lines.push(Line::from(spans));
    }

    if session.is_thinking() {
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{dots}"),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

/// Rows `lines` occupy once wrapped to `width`.
fn wrapped_height(lines: &[Line], width: u16) -> u16 {
    let width = width.max(1) as usize;
    lines
        .iter()
        .map(|line| line.width().max(1).div_ceil(width) as u16)
        .fold(0u16, |acc, rows| acc.saturating_add(rows))
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let [body_area, footer_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(area);

    let backend = match &app.model {
        Some(model) => format!("{}: {}", app.provider.display_name(), model),
        None => app.provider.display_name().to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Line::from(vec![
            Span::styled(" ● ", Style::default().fg(Color::Red)),
            Span::styled("● ", Style::default().fg(Color::Yellow)),
            Span::styled("● ", Style::default().fg(Color::Green)),
            Span::styled("AI Crishna Terminal ", Style::default().fg(Color::Gray)),
        ]))
        .title_bottom(Line::from(format!(" {backend} ")).right_aligned());

    let inner = block.inner(body_area);
    frame.render_widget(block, body_area);

    let session = app.session.borrow().clone();
    let input_height = if app.input_visible() { 1 } else { 0 };
    let [chat_area, input_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(input_height)]).areas(inner);

    render_transcript(app, frame, chat_area, &session);
    if input_height > 0 {
        render_input(app, frame, input_area, &session);
    }
    render_footer(frame, footer_area);
}

fn render_transcript(app: &mut App, frame: &mut Frame, area: Rect, session: &Session) {
    if session.phase() == Phase::Dormant {
        let waiting = Paragraph::new(Span::styled(
            "Connecting to AI Crishna...",
            Style::default().fg(Color::DarkGray),
        ));
        frame.render_widget(waiting, area);
        return;
    }

    let lines = transcript(app, session);
    let total = wrapped_height(&lines, area.width);

    app.page_height = area.height;
    app.max_scroll_back = total.saturating_sub(area.height);
    app.scroll_back = app.scroll_back.min(app.max_scroll_back);
    let offset = app.max_scroll_back - app.scroll_back;

    let chat = Paragraph::new(Text::from(lines))
        .wrap(Wrap { trim: false })
        .scroll((offset, 0));
    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect, session: &Session) {
    let prompt_width = PROMPT_USER.chars().count() as u16;
    let inner_width = area.width.saturating_sub(prompt_width) as usize;

    // Keep the cursor visible with horizontal scrolling
    let scroll_offset = if inner_width == 0 || app.cursor < inner_width {
        0
    } else {
        app.cursor - inner_width + 1
    };
    let visible_text: String = app
        .input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let text_style = if session.accepts_input() {
        Style::default().fg(Color::LightMagenta)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let input = Paragraph::new(Line::from(vec![
        Span::styled(PROMPT_USER, Style::default().fg(Color::Magenta)),
        Span::styled(visible_text, text_style),
    ]));
    frame.render_widget(input, area);

    if session.accepts_input() {
        let x = area.x + prompt_width + (app.cursor - scroll_offset) as u16;
        frame.set_cursor_position((x.min(area.right().saturating_sub(1)), area.y));
    }
}

fn render_footer(frame: &mut Frame, area: Rect) {
    let key = Style::default().fg(Color::Yellow);
    let hint = Style::default().fg(Color::DarkGray);
    let footer = Paragraph::new(Line::from(vec![
        Span::styled(" Enter", key),
        Span::styled(" send  ", hint),
        Span::styled("PgUp/PgDn", key),
        Span::styled(" scroll  ", hint),
        Span::styled("Esc", key),
        Span::styled(" quit  ", hint),
        Span::styled("help", key),
        Span::styled(" commands", hint),
    ]));
    frame.render_widget(footer, area);
}
