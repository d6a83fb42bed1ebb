//! Interactive chat view.
mod app;
mod events;
mod layout;
mod rendering;
mod terminal;
mod timestamps;

use anyhow::Result;
pub use app::App;
use tokio::runtime::Handle;

use self::terminal::TerminalGuard;
use crate::chat::{AudioInput, ChatController};

/// Run the chat TUI until the user quits
pub fn run_interactive(
    controller: ChatController,
    audio_input: Box<dyn AudioInput>,
    runtime: Handle,
) -> Result<()> {
    let mut guard = TerminalGuard::new()?;
    let mut app = App::new(controller, audio_input, runtime);
    app.run(guard.terminal_mut())
}
