//! Chat session lifecycle.
//!
//! - [`registry`] - The user's threads and the active thread id
//! - [`reconciler`] - The active thread's message sequence and stale-response guard
//! - [`recorder`] - Exclusive microphone ownership and clip buffering
//! - [`controller`] - The process-wide context tying them to the session store and backend

pub mod controller;
pub mod reconciler;
pub mod recorder;
pub mod registry;

pub use controller::{Action, ChatController, Queued, Request, Response};
pub use reconciler::{Applied, Reconciler, Rejection, Ticket};
pub use recorder::{
    AudioInput, CaptureError, CaptureHandle, CommandInput, Recorder, StartOutcome, WavFileInput,
};
pub use registry::SessionRegistry;
