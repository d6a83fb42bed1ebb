//! Recording bridge: exclusive ownership of one audio capture device.
//!
//! A [`CaptureHandle`] owns the device and a reader thread that pumps raw chunks into a
//! channel. The handle is held by the [`Recorder`] only while recording; dropping it stops the
//! device and joins the reader, so every exit path (stop, capture error, cancel, drop)
//! releases the microphone.

use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};

use thiserror::Error;
use tracing::{debug, warn};

use crate::client::AudioClip;

/// Upper bound for a single clip
pub const MAX_CLIP_BYTES: usize = 10 * 1024 * 1024;

const CHUNK_SIZE: usize = 4096;

#[derive(Debug, Error)]
pub enum CaptureError {
    /// The device could not be opened (missing, unsupported or permission denied)
    #[error("audio input unavailable: {0}")]
    Unavailable(String),

    #[error("audio capture failed: {0}")]
    Io(#[from] io::Error),
}

/// Something that keeps producing audio until told to stop
pub trait CaptureDevice: Send {
    fn stop(&mut self);
}

/// Source of capture devices
pub trait AudioInput {
    fn open(&mut self) -> Result<CaptureHandle, CaptureError>;
}

/// A device with nothing to stop; the reader ends on EOF
pub struct NoopDevice;

impl CaptureDevice for NoopDevice {
    fn stop(&mut self) {}
}

struct ChildDevice(Child);

impl CaptureDevice for ChildDevice {
    fn stop(&mut self) {
        if let Err(e) = self.0.kill() {
            debug!(error = %e, "recorder process already exited");
        }
        match self.0.wait() {
            Ok(status) => debug!(%status, "recorder process reaped"),
            Err(e) => debug!(error = %e, "failed to reap recorder process"),
        }
    }
}

pub struct CaptureHandle {
    device: Box<dyn CaptureDevice>,
    chunks: Receiver<io::Result<Vec<u8>>>,
    reader: Option<JoinHandle<()>>,
}

impl CaptureHandle {
    /// Start pumping `reader` on a background thread
    pub fn from_reader<R>(mut reader: R, device: Box<dyn CaptureDevice>) -> Self
    where
        R: Read + Send + 'static,
    {
        let (tx, chunks) = mpsc::channel();
        let reader = thread::spawn(move || {
            let mut buf = vec![0u8; CHUNK_SIZE];
            loop {
                match reader.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.send(Ok(buf[..n].to_vec())).is_err() {
                            break;
                        }
                    }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        let _ = tx.send(Err(e));
                        break;
                    }
                }
            }
        });
        Self { device, chunks, reader: Some(reader) }
    }

    /// Chunks that arrived since the last call, without blocking
    fn drain(&mut self) -> io::Result<Vec<Vec<u8>>> {
        let mut out = Vec::new();
        loop {
            match self.chunks.try_recv() {
                Ok(chunk) => out.push(chunk?),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return Ok(out),
            }
        }
    }

    /// Stop the device, wait for the reader and collect everything left
    fn finish(mut self) -> io::Result<Vec<Vec<u8>>> {
        self.release();
        self.chunks.try_iter().collect()
    }

    fn release(&mut self) {
        self.device.stop();
        if let Some(reader) = self.reader.take()
            && reader.join().is_err()
        {
            warn!("audio reader thread panicked");
        }
    }
}

impl Drop for CaptureHandle {
    fn drop(&mut self) {
        self.release();
    }
}

/// Runs an external recorder (e.g. `arecord`) that writes WAV to stdout
#[derive(Debug, Clone)]
pub struct CommandInput {
    program: String,
    args: Vec<String>,
}

impl CommandInput {
    /// Parse a whitespace-separated command line
    pub fn parse(command_line: &str) -> Result<Self, CaptureError> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| CaptureError::Unavailable("no recorder command configured".into()))?;
        Ok(Self { program, args: parts.collect() })
    }
}

impl AudioInput for CommandInput {
    fn open(&mut self) -> Result<CaptureHandle, CaptureError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| CaptureError::Unavailable(format!("{}: {}", self.program, e)))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CaptureError::Unavailable("recorder has no stdout".into()))?;
        Ok(CaptureHandle::from_reader(stdout, Box::new(ChildDevice(child))))
    }
}

/// Replays a recorded WAV file as if it came from a microphone
#[derive(Debug, Clone)]
pub struct WavFileInput {
    path: PathBuf,
}

impl WavFileInput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl AudioInput for WavFileInput {
    fn open(&mut self) -> Result<CaptureHandle, CaptureError> {
        let file = File::open(&self.path)
            .map_err(|e| CaptureError::Unavailable(format!("{}: {}", self.path.display(), e)))?;
        Ok(CaptureHandle::from_reader(file, Box::new(NoopDevice)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRecording,
}

enum State {
    Idle,
    Recording { handle: CaptureHandle, buffer: Vec<u8>, truncated: bool },
}

pub struct Recorder {
    state: State,
    max_bytes: usize,
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

impl Recorder {
    pub fn new() -> Self {
        Self::with_limit(MAX_CLIP_BYTES)
    }

    pub fn with_limit(max_bytes: usize) -> Self {
        Self { state: State::Idle, max_bytes }
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, State::Recording { .. })
    }

    /// Acquire the device; a no-op while a recording is already running
    pub fn start(&mut self, input: &mut dyn AudioInput) -> Result<StartOutcome, CaptureError> {
        if self.is_recording() {
            return Ok(StartOutcome::AlreadyRecording);
        }
        let handle = input.open()?;
        self.state = State::Recording { handle, buffer: Vec::new(), truncated: false };
        debug!("recording started");
        Ok(StartOutcome::Started)
    }

    /// Move captured chunks into the clip buffer
    ///
    /// A capture error ends the recording and releases the device.
    pub fn poll(&mut self) -> Result<(), CaptureError> {
        let max_bytes = self.max_bytes;
        let State::Recording { handle, buffer, truncated } = &mut self.state else {
            return Ok(());
        };
        match handle.drain() {
            Ok(chunks) => {
                append_bounded(buffer, truncated, chunks, max_bytes);
                Ok(())
            }
            Err(e) => {
                self.state = State::Idle;
                Err(e.into())
            }
        }
    }

    /// Finalize the buffer into a single clip and release the device
    ///
    /// Returns `Ok(None)` when no recording was running.
    pub fn stop(&mut self) -> Result<Option<AudioClip>, CaptureError> {
        let State::Recording { handle, mut buffer, mut truncated } =
            std::mem::replace(&mut self.state, State::Idle)
        else {
            return Ok(None);
        };
        let rest = handle.finish()?;
        append_bounded(&mut buffer, &mut truncated, rest, self.max_bytes);
        if truncated {
            warn!(max_bytes = self.max_bytes, "recording truncated at size limit");
        }
        debug!(bytes = buffer.len(), "recording stopped");
        Ok(Some(AudioClip { bytes: buffer, truncated }))
    }

    /// Discard the current recording, if any
    pub fn cancel(&mut self) {
        self.state = State::Idle;
    }
}

fn append_bounded(buffer: &mut Vec<u8>, truncated: &mut bool, chunks: Vec<Vec<u8>>, max: usize) {
    for chunk in chunks {
        let room = max.saturating_sub(buffer.len());
        if chunk.len() > room {
            buffer.extend_from_slice(&chunk[..room]);
            *truncated = true;
        } else {
            buffer.extend_from_slice(&chunk);
        }
    }
}
