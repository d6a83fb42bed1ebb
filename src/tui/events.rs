use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// User actions from keyboard events
#[derive(Debug, PartialEq)]
pub enum Action {
    Quit,
    ClearInput,
    Submit,
    ToggleFocus,
    MoveUp,
    MoveDown,
    ScrollUp,
    ScrollDown,
    NewChat,
    ToggleRecording,
    RefreshSessions,
    Logout,
    InsertChar(char),
    DeleteChar,
    None,
}

/// Poll for keyboard events and convert to actions
pub fn poll_event(timeout: Duration) -> anyhow::Result<Action> {
    if event::poll(timeout)?
        && let Event::Key(key) = event::read()?
        && key.kind != KeyEventKind::Release
    {
        return Ok(key_to_action(key));
    }
    Ok(Action::None)
}

fn key_to_action(key: KeyEvent) -> Action {
    match (key.code, key.modifiers) {
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => Action::Quit,
        (KeyCode::Esc, _) => Action::ClearInput,

        // Sessions sidebar and transcript
        (KeyCode::Tab, _) | (KeyCode::BackTab, _) => Action::ToggleFocus,
        (KeyCode::Up, _) => Action::MoveUp,
        (KeyCode::Down, _) => Action::MoveDown,
        (KeyCode::PageUp, _) => Action::ScrollUp,
        (KeyCode::PageDown, _) => Action::ScrollDown,

        // Chat actions
        (KeyCode::Enter, _) => Action::Submit,
        (KeyCode::Char('n'), KeyModifiers::CONTROL) => Action::NewChat,
        (KeyCode::Char('r'), KeyModifiers::CONTROL) => Action::ToggleRecording,
        (KeyCode::Char('s'), KeyModifiers::CONTROL) => Action::RefreshSessions,
        (KeyCode::Char('l'), KeyModifiers::CONTROL) => Action::Logout,

        // Message input
        (KeyCode::Char(c), KeyModifiers::NONE) | (KeyCode::Char(c), KeyModifiers::SHIFT) => {
            Action::InsertChar(c)
        }
        (KeyCode::Backspace, _) => Action::DeleteChar,

        _ => Action::None,
    }
}
