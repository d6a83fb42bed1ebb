//! TUI application state and event handling.
//!
//! The `App` owns the [`ChatController`] and turns key presses into controller calls. Network
//! requests the controller asks for are spawned on the tokio runtime; each task sends its
//! [`Response`] back over a channel that the event loop drains every tick, so all state is
//! mutated on the UI thread and late responses are filtered by the controller's tickets.

use std::time::{Duration, Instant};

use anyhow::Result;
use ratatui::Terminal;
use ratatui::backend::Backend;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::events::{Action, poll_event};
use super::rendering::{RenderState, render_ui};
use crate::chat::{self, AudioInput, ChatController, Response};
use crate::notify::{Level, Notification};

/// Duration for success and info status messages (milliseconds)
const STATUS_SUCCESS_DURATION_MS: u64 = 3000;
/// Duration for error status messages (milliseconds)
const STATUS_ERROR_DURATION_MS: u64 = 5000;
/// Longest message accepted by the input box
const MAX_INPUT_CHARS: usize = 4000;
/// Transcript rows moved per PageUp/PageDown
const SCROLL_STEP: u16 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Success,
    Info,
    Error,
}

/// Transient status message with expiry
#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub message_type: MessageType,
    pub expires_at: Instant,
}

/// Which pane receives navigation keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Input,
    Sessions,
}

pub struct App {
    controller: ChatController,
    audio_input: Box<dyn AudioInput>,
    runtime: Handle,
    responses_tx: UnboundedSender<Response>,
    responses_rx: UnboundedReceiver<Response>,
    input: String,
    focus: Focus,
    selected_idx: usize,
    scroll: u16,
    should_quit: bool,
    status_message: Option<StatusMessage>,
    // Dirty state tracking for efficient rendering
    needs_redraw: bool,
    last_draw_time: Instant,
}

impl App {
    pub fn new(
        controller: ChatController,
        audio_input: Box<dyn AudioInput>,
        runtime: Handle,
    ) -> Self {
        let (responses_tx, responses_rx) = mpsc::unbounded_channel();
        Self {
            controller,
            audio_input,
            runtime,
            responses_tx,
            responses_rx,
            input: String::new(),
            focus: Focus::Input,
            selected_idx: 0,
            scroll: 0,
            should_quit: false,
            status_message: None,
            needs_redraw: true,
            last_draw_time: Instant::now(),
        }
    }

    /// Set a transient status message with automatic expiry
    fn set_status(&mut self, text: impl Into<String>, message_type: MessageType, duration_ms: u64) {
        self.status_message = Some(StatusMessage {
            text: text.into(),
            message_type,
            expires_at: Instant::now() + Duration::from_millis(duration_ms),
        });
        self.needs_redraw = true;
    }

    fn notify(&mut self, note: Notification) {
        let (prefix, message_type, duration) = match note.level {
            Level::Success => ("✓", MessageType::Success, STATUS_SUCCESS_DURATION_MS),
            Level::Info => ("ℹ", MessageType::Info, STATUS_SUCCESS_DURATION_MS),
            Level::Error => ("✗", MessageType::Error, STATUS_ERROR_DURATION_MS),
        };
        self.set_status(format!("{} {}", prefix, note.description), message_type, duration);
    }

    /// Check and clear expired status messages
    fn check_and_clear_expired_status(&mut self) {
        if self.status_message.as_ref().is_some_and(|msg| Instant::now() >= msg.expires_at) {
            self.status_message = None;
            self.needs_redraw = true;
        }
    }

    /// Show notifications now and spawn requests on the runtime
    fn dispatch(&mut self, actions: Vec<chat::Action>) {
        for action in actions {
            match action {
                chat::Action::Notify(note) => self.notify(note),
                chat::Action::Send(request) => {
                    let backend = self.controller.backend();
                    let tx = self.responses_tx.clone();
                    self.runtime.spawn(async move {
                        let response = request.execute(backend.as_ref()).await;
                        // The receiver is gone only when the app has quit
                        let _ = tx.send(response);
                    });
                }
            }
            self.needs_redraw = true;
        }
    }

    /// Apply every response that finished since the last tick
    fn process_responses(&mut self) {
        while let Ok(response) = self.responses_rx.try_recv() {
            let actions = self.controller.apply(response);
            self.dispatch(actions);
            self.clamp_selection();
            self.needs_redraw = true;
        }
    }

    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        let startup = self.controller.startup();
        self.dispatch(startup);
        if !self.controller.is_logged_in() {
            self.notify(Notification::login_required());
        }

        while !self.should_quit {
            self.check_and_clear_expired_status();
            self.process_responses();
            if self.controller.is_recording() {
                let actions = self.controller.poll_recording();
                self.dispatch(actions);
            }

            // Draw if dirty or if it's been >100ms (for terminal resize handling)
            let now = Instant::now();
            let elapsed = now.duration_since(self.last_draw_time);
            if self.needs_redraw || elapsed >= Duration::from_millis(100) {
                terminal.draw(|f| render_ui(f, &self.render_state()))?;
                self.needs_redraw = false;
                self.last_draw_time = now;
            }

            let action = poll_event(Duration::from_millis(50))?;
            self.handle_action(action);
        }

        // Never leave a capture process running behind the shell prompt
        self.controller.cancel_recording();
        Ok(())
    }

    fn render_state(&self) -> RenderState<'_> {
        let transcript = self.controller.transcript();
        RenderState {
            sessions: self.controller.registry().sessions(),
            active_id: self.controller.registry().active_id(),
            selected_idx: self.selected_idx,
            messages: transcript.messages(),
            has_thread: transcript.thread_id().is_some(),
            awaiting_reply: transcript.is_awaiting_reply(),
            loading_history: transcript.is_loading_history(),
            logged_in: self.controller.is_logged_in(),
            recording: self.controller.is_recording(),
            input: &self.input,
            focus: self.focus,
            scroll: self.scroll,
            status_message: self.status_message.as_ref(),
        }
    }

    /// Handle a user action (extracted for testing)
    fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::ClearInput => {
                if self.input.is_empty() {
                    self.should_quit = true;
                } else {
                    self.input.clear();
                    self.needs_redraw = true;
                }
            }
            Action::Submit => match self.focus {
                Focus::Sessions => self.open_selected(),
                Focus::Input => self.submit(),
            },
            Action::ToggleFocus => {
                self.focus = match self.focus {
                    Focus::Input => Focus::Sessions,
                    Focus::Sessions => Focus::Input,
                };
                self.clamp_selection();
                self.needs_redraw = true;
            }
            Action::MoveUp => match self.focus {
                Focus::Sessions => self.move_selection(-1),
                Focus::Input => self.scroll_by(1),
            },
            Action::MoveDown => match self.focus {
                Focus::Sessions => self.move_selection(1),
                Focus::Input => self.scroll_by(-1),
            },
            Action::ScrollUp => self.scroll_by(SCROLL_STEP as i32),
            Action::ScrollDown => self.scroll_by(-(SCROLL_STEP as i32)),
            Action::NewChat => {
                let actions = self.controller.new_chat();
                self.dispatch(actions);
                self.scroll = 0;
            }
            Action::ToggleRecording => self.toggle_recording(),
            Action::RefreshSessions => {
                if self.controller.is_logged_in() {
                    let actions = self.controller.refresh_sessions();
                    self.dispatch(actions);
                    self.set_status(
                        "Reloading chats...",
                        MessageType::Info,
                        STATUS_SUCCESS_DURATION_MS,
                    );
                } else {
                    self.notify(Notification::login_required());
                }
            }
            Action::Logout => match self.controller.logout() {
                Ok(()) => {
                    self.input.clear();
                    self.selected_idx = 0;
                    self.scroll = 0;
                    self.set_status(
                        "✓ Logged out",
                        MessageType::Success,
                        STATUS_SUCCESS_DURATION_MS,
                    );
                }
                Err(e) => self.set_status(
                    format!("✗ Logout failed: {}", e),
                    MessageType::Error,
                    STATUS_ERROR_DURATION_MS,
                ),
            },
            Action::InsertChar(c) => self.insert_char(c),
            Action::DeleteChar => {
                if self.input.pop().is_some() {
                    self.needs_redraw = true;
                }
            }
            Action::None => {}
        }
    }

    fn submit(&mut self) {
        if self.input.trim().is_empty() {
            return;
        }
        if self.controller.is_logged_in() && self.controller.is_busy() {
            self.set_status(
                "Please wait for the current reply",
                MessageType::Info,
                STATUS_SUCCESS_DURATION_MS,
            );
            return;
        }
        let actions = self.controller.submit(&self.input);
        if self.controller.is_logged_in() {
            self.input.clear();
            self.scroll = 0;
        }
        self.dispatch(actions);
        self.needs_redraw = true;
    }

    fn open_selected(&mut self) {
        let sessions = self.controller.registry().sessions();
        let Some(id) = sessions.get(self.selected_idx).map(|s| s.id.clone()) else {
            return;
        };
        let actions = self.controller.open_thread(&id);
        self.dispatch(actions);
        self.focus = Focus::Input;
        self.scroll = 0;
        self.needs_redraw = true;
    }

    fn toggle_recording(&mut self) {
        let actions = if self.controller.is_recording() {
            self.controller.stop_recording()
        } else {
            self.controller.start_recording(self.audio_input.as_mut())
        };
        self.dispatch(actions);
        self.needs_redraw = true;
    }

    fn insert_char(&mut self, c: char) {
        if self.input.chars().count() < MAX_INPUT_CHARS {
            self.input.push(c);
            self.needs_redraw = true;
        }
    }

    fn move_selection(&mut self, delta: isize) {
        let total = self.controller.registry().sessions().len();
        if total == 0 {
            self.selected_idx = 0;
            return;
        }

        let old_idx = self.selected_idx;
        let new_idx = (self.selected_idx as isize + delta).max(0) as usize;
        self.selected_idx = new_idx.min(total - 1);

        if old_idx != self.selected_idx {
            self.needs_redraw = true;
        }
    }

    /// Keep the selection on a listed thread; outside the sidebar it follows the active one
    fn clamp_selection(&mut self) {
        let registry = self.controller.registry();
        if self.focus == Focus::Input
            && let Some(idx) = registry.active_id().and_then(|id| registry.position(id))
        {
            self.selected_idx = idx;
            return;
        }
        let total = registry.sessions().len();
        self.selected_idx = self.selected_idx.min(total.saturating_sub(1));
    }

    fn scroll_by(&mut self, delta: i32) {
        let next = (i32::from(self.scroll) + delta).clamp(0, i32::from(u16::MAX));
        let next = u16::try_from(next).unwrap_or(0);
        if next != self.scroll {
            self.scroll = next;
            self.needs_redraw = true;
        }
    }
}
