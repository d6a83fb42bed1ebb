use ratatui::Frame;
use ratatui::layout::{Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, Wrap};

use super::app::{Focus, MessageType, StatusMessage};
use super::layout::AppLayout;
use super::timestamps::format_session_time;
use crate::models::{ChatSession, Message, Role};
use crate::utils::sanitize_for_terminal;

const MUTED: Color = Color::Rgb(113, 113, 122);
const BRIGHT: Color = Color::Rgb(250, 250, 250);
const ACCENT: Color = Color::Rgb(16, 185, 129);
const USER: Color = Color::Rgb(56, 189, 248);
const ERROR: Color = Color::Rgb(239, 68, 68);
const BAR_BG: Color = Color::Rgb(24, 24, 27);

const EXCERPT_CHARS: usize = 80;

/// Everything the chat screen shows, borrowed from the app for one frame
pub struct RenderState<'a> {
    pub sessions: &'a [ChatSession],
    pub active_id: Option<&'a str>,
    pub selected_idx: usize,
    pub messages: &'a [Message],
    pub has_thread: bool,
    pub awaiting_reply: bool,
    pub loading_history: bool,
    pub logged_in: bool,
    pub recording: bool,
    pub input: &'a str,
    pub focus: Focus,
    /// Lines scrolled up from the bottom of the transcript
    pub scroll: u16,
    pub status_message: Option<&'a StatusMessage>,
}

/// Render the entire UI
pub fn render_ui(frame: &mut Frame, state: &RenderState) {
    let layout = AppLayout::new(frame.area());

    render_sessions(frame, layout.sessions_area, state);
    render_transcript(frame, layout.transcript_area, state);
    render_input(frame, layout.input_area, state);
    render_status_bar(frame, layout.status_area, state);
}

fn border(title: &str, focused: bool) -> Block<'_> {
    let color = if focused { ACCENT } else { MUTED };
    Block::default().borders(Borders::ALL).border_style(Style::default().fg(color)).title(title)
}

fn render_sessions(frame: &mut Frame, area: Rect, state: &RenderState) {
    let focused = state.focus == Focus::Sessions;
    let items: Vec<ListItem> = state
        .sessions
        .iter()
        .enumerate()
        .map(|(idx, session)| {
            let marker = if state.active_id == Some(session.id.as_str()) { "●" } else { " " };
            let title: String =
                sanitize_for_terminal(session.display_title()).chars().take(40).collect();
            let when = format_session_time(session);
            let content = if when.is_empty() {
                format!("{} {}", marker, title)
            } else {
                format!("{} {} · {}", marker, title, when)
            };

            let style = if focused && idx == state.selected_idx {
                Style::default().fg(BRIGHT).bg(ACCENT).add_modifier(Modifier::BOLD)
            } else if state.active_id == Some(session.id.as_str()) {
                Style::default().fg(BRIGHT)
            } else {
                Style::default().fg(MUTED)
            };
            ListItem::new(content).style(style)
        })
        .collect();

    let list = List::new(items).block(border(" Chats ", focused));
    frame.render_widget(list, area);
}

/// Transcript as styled lines, before wrapping
pub(crate) fn transcript_lines(state: &RenderState) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    if !state.logged_in {
        lines.push(Line::styled(
            "Not logged in. Run `vta-chat login <email>` and start the chat again.",
            Style::default().fg(MUTED),
        ));
        return lines;
    }
    if state.loading_history {
        lines.push(Line::styled("Loading history...", Style::default().fg(MUTED)));
        return lines;
    }
    if state.messages.is_empty() && !state.awaiting_reply {
        let hint = if state.has_thread {
            "No messages yet. Ask a question below."
        } else {
            "Type a question and press Enter to start a new chat."
        };
        lines.push(Line::styled(hint, Style::default().fg(MUTED)));
        return lines;
    }

    for message in state.messages {
        let (speaker, color) = match message.role {
            Role::User => ("You", USER),
            Role::Assistant => ("VTA", ACCENT),
        };
        lines.push(Line::styled(speaker, Style::default().fg(color).add_modifier(Modifier::BOLD)));
        for text in sanitize_for_terminal(&message.content).lines() {
            lines.push(Line::raw(text.to_string()));
        }

        if message.has_sources() {
            lines.push(Line::styled("Sources:", Style::default().fg(MUTED)));
            for (n, node) in message.source_nodes.iter().enumerate() {
                lines.push(Line::from(vec![
                    Span::styled(format!("  [{}] ", n + 1), Style::default().fg(MUTED)),
                    Span::raw(format!("Relevance Score: {}", node.display_score())),
                ]));
                let excerpt: String = sanitize_for_terminal(&node.text)
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
                    .chars()
                    .take(EXCERPT_CHARS)
                    .collect();
                if !excerpt.is_empty() {
                    let excerpt = format!("      {}", excerpt);
                    lines.push(Line::styled(excerpt, Style::default().fg(MUTED)));
                }
            }
        }
        lines.push(Line::raw(""));
    }

    if state.awaiting_reply {
        lines.push(Line::styled(
            "The agent is thinking...",
            Style::default().fg(MUTED).add_modifier(Modifier::ITALIC),
        ));
    }
    lines
}

/// Rows `lines` occupy once wrapped to `width` columns
pub(crate) fn wrapped_height(lines: &[Line], width: u16) -> usize {
    let width = usize::from(width.max(1));
    lines.iter().map(|line| line.width().div_ceil(width).max(1)).sum()
}

fn render_transcript(frame: &mut Frame, area: Rect, state: &RenderState) {
    let lines = transcript_lines(state);
    let inner_width = area.width.saturating_sub(2);
    let inner_height = usize::from(area.height.saturating_sub(2));

    // Stick to the bottom unless the user scrolled up
    let total = wrapped_height(&lines, inner_width);
    let offset = total.saturating_sub(inner_height).saturating_sub(usize::from(state.scroll));
    let offset = u16::try_from(offset).unwrap_or(u16::MAX);

    let title = match state.sessions.iter().find(|s| Some(s.id.as_str()) == state.active_id) {
        Some(session) => format!(" {} ", sanitize_for_terminal(session.display_title())),
        None => " Chat ".to_string(),
    };
    let paragraph = Paragraph::new(Text::from(lines))
        .block(border(&title, false))
        .wrap(Wrap { trim: false })
        .scroll((offset, 0));
    frame.render_widget(paragraph, area);
}

fn render_input(frame: &mut Frame, area: Rect, state: &RenderState) {
    let focused = state.focus == Focus::Input;
    let title = if state.recording {
        " Recording... (Ctrl+R to stop and send) "
    } else if state.awaiting_reply {
        " Waiting for reply "
    } else {
        " Message "
    };

    let paragraph = Paragraph::new(state.input).block(border(title, focused));
    frame.render_widget(paragraph, area);

    if focused {
        // Keep the cursor inside the box; long input scrolls off to the left
        let max_x = area.width.saturating_sub(2);
        let typed = u16::try_from(state.input.chars().count()).unwrap_or(u16::MAX);
        frame.set_cursor_position(Position::new(area.x + 1 + typed.min(max_x), area.y + 1));
    }
}

fn render_status_bar(frame: &mut Frame, area: Rect, state: &RenderState) {
    let (status_text, style) = if let Some(msg) = state.status_message {
        let color = match msg.message_type {
            MessageType::Success => ACCENT,
            MessageType::Info => BRIGHT,
            MessageType::Error => ERROR,
        };
        (format!(" {} ", msg.text), Style::default().fg(color).bg(BAR_BG))
    } else {
        let mut parts = vec![];
        parts.push(if state.logged_in { "[LOGGED IN]" } else { "[LOGGED OUT]" }.to_string());
        if state.recording {
            parts.push("● REC".to_string());
        }
        parts.push(format!("{} chats", state.sessions.len()));
        parts.push("Enter: send".to_string());
        parts.push("Tab: chats".to_string());
        parts.push("Ctrl+N: new".to_string());
        parts.push("Ctrl+R: voice".to_string());
        parts.push("Ctrl+S: reload".to_string());
        parts.push("Ctrl+L: logout".to_string());
        parts.push("Ctrl+C: quit".to_string());
        (format!(" {} ", parts.join(" | ")), Style::default().fg(BRIGHT).bg(BAR_BG))
    };

    frame.render_widget(Paragraph::new(status_text).style(style), area);
}
