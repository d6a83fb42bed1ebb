//! The chat context: one session store, one registry, one transcript, one recorder.
//!
//! UI events become [`Action`]s. An [`Action::Send`] carries a [`Request`] that the caller
//! executes against the backend however it likes (awaited inline by CLI subcommands, spawned
//! by the TUI) and feeds back through [`ChatController::apply`]. All state changes happen in
//! the controller, on the caller's thread, so the only concurrency concern is responses that
//! come back late; those are filtered by ticket.

use std::collections::VecDeque;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use super::reconciler::{Applied, Reconciler, Ticket};
use super::recorder::{AudioInput, Recorder, StartOutcome};
use super::registry::SessionRegistry;
use crate::client::{AudioClip, Backend};
use crate::error::ClientError;
use crate::models::api::{AudioResponse, QueryResponse};
use crate::models::{ChatSession, Message};
use crate::notify::{self, Notification};
use crate::session::{self, SessionStore};

/// Work to resume once a lazily created thread exists
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Queued {
    Nothing,
    Query(String),
    Audio(AudioClip),
}

#[derive(Debug)]
pub enum Request {
    Sessions { token: String },
    NewSession { token: String, generation: u64, then: Queued },
    History { token: String, ticket: Ticket },
    Query { token: String, ticket: Ticket, query: String },
    Audio { token: String, ticket: Ticket, clip: AudioClip },
}

#[derive(Debug)]
pub enum Response {
    Sessions { token: String, result: Result<Vec<ChatSession>, ClientError> },
    NewSession {
        token: String,
        generation: u64,
        then: Queued,
        result: Result<String, ClientError>,
    },
    History { ticket: Ticket, result: Result<Vec<Message>, ClientError> },
    Query { ticket: Ticket, result: Result<QueryResponse, ClientError> },
    Audio { ticket: Ticket, result: Result<AudioResponse, ClientError> },
}

impl Request {
    pub async fn execute(self, backend: &dyn Backend) -> Response {
        match self {
            Request::Sessions { token } => {
                let result = backend.list_sessions(&token).await;
                Response::Sessions { token, result }
            }
            Request::NewSession { token, generation, then } => {
                let result = backend.new_session(&token).await;
                Response::NewSession { token, generation, then, result }
            }
            Request::History { token, ticket } => {
                let result = backend.history(&token, ticket.thread_id()).await;
                Response::History { ticket, result }
            }
            Request::Query { token, ticket, query } => {
                let result = backend.query(&token, &query, ticket.thread_id()).await;
                Response::Query { ticket, result }
            }
            Request::Audio { token, ticket, clip } => {
                let result = backend.send_audio(&token, clip, ticket.thread_id()).await;
                Response::Audio { ticket, result }
            }
        }
    }
}

#[derive(Debug)]
pub enum Action {
    Notify(Notification),
    Send(Request),
}

pub struct ChatController {
    backend: Arc<dyn Backend>,
    session: SessionStore,
    registry: SessionRegistry,
    transcript: Reconciler,
    recorder: Recorder,
    /// Generation in which a thread creation was issued
    creating: Option<u64>,
}

impl ChatController {
    pub fn new(backend: Arc<dyn Backend>, session: SessionStore) -> Self {
        Self {
            backend,
            session,
            registry: SessionRegistry::new(),
            transcript: Reconciler::new(),
            recorder: Recorder::new(),
            creating: None,
        }
    }

    pub fn with_recorder(mut self, recorder: Recorder) -> Self {
        self.recorder = recorder;
        self
    }

    pub fn backend(&self) -> Arc<dyn Backend> {
        Arc::clone(&self.backend)
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn transcript(&self) -> &Reconciler {
        &self.transcript
    }

    pub fn messages(&self) -> &[Message] {
        self.transcript.messages()
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_logged_in()
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    fn is_creating(&self) -> bool {
        self.creating == Some(self.transcript.generation())
    }

    /// A query, audio request, history load or thread creation is in flight
    pub fn is_busy(&self) -> bool {
        self.transcript.is_busy() || self.is_creating()
    }

    fn token(&self) -> Option<String> {
        self.session.current_token().map(str::to_string)
    }

    /// App start: a persisted token means the user is logged in; load their threads
    pub fn startup(&self) -> Vec<Action> {
        self.refresh_sessions()
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Vec<Notification> {
        let backend = self.backend();
        match self.session.login(backend.as_ref(), email, password).await {
            Ok(()) => self.after_login(notify::LOGIN_SUCCESS).await,
            Err(e) => {
                warn!(error = %e, "login failed");
                vec![session::auth_failure(&e)]
            }
        }
    }

    pub async fn register(&mut self, email: &str, password: &str) -> Vec<Notification> {
        let backend = self.backend();
        match self.session.register(backend.as_ref(), email, password).await {
            Ok(()) => self.after_login(notify::REGISTER_SUCCESS).await,
            Err(e) => {
                warn!(error = %e, "registration failed");
                vec![session::auth_failure(&e)]
            }
        }
    }

    async fn after_login(&mut self, description: &str) -> Vec<Notification> {
        self.clear_caches();
        let mut notes = vec![Notification::success("Success", description)];
        let refresh = self.refresh_sessions();
        notes.extend(self.run(refresh).await);
        notes
    }

    /// Clear the token and everything cached for it
    pub fn logout(&mut self) -> Result<()> {
        self.session.logout()?;
        self.clear_caches();
        Ok(())
    }

    fn clear_caches(&mut self) {
        self.registry.clear();
        self.transcript.reset();
        self.recorder.cancel();
        self.creating = None;
    }

    pub fn refresh_sessions(&self) -> Vec<Action> {
        match self.token() {
            Some(token) => vec![Action::Send(Request::Sessions { token })],
            None => Vec::new(),
        }
    }

    /// Create a thread explicitly ("New chat")
    pub fn new_chat(&mut self) -> Vec<Action> {
        self.create_thread(Queued::Nothing)
    }

    fn create_thread(&mut self, then: Queued) -> Vec<Action> {
        let Some(token) = self.token() else {
            return vec![Action::Notify(Notification::login_required())];
        };
        if self.is_creating() {
            return Vec::new();
        }
        let generation = self.transcript.generation();
        self.creating = Some(generation);
        vec![Action::Send(Request::NewSession { token, generation, then })]
    }

    /// Make `thread_id` active and load its history
    pub fn open_thread(&mut self, thread_id: &str) -> Vec<Action> {
        let Some(token) = self.token() else {
            return vec![Action::Notify(Notification::login_required())];
        };
        self.registry.set_active(thread_id);
        let ticket = self.transcript.switch_thread(thread_id);
        vec![Action::Send(Request::History { token, ticket })]
    }

    /// Send a text query, creating a thread first when none is active
    pub fn submit(&mut self, input: &str) -> Vec<Action> {
        if input.trim().is_empty() {
            return Vec::new();
        }
        let Some(token) = self.token() else {
            return vec![Action::Notify(Notification::login_required())];
        };
        if self.is_busy() {
            return Vec::new();
        }
        if self.transcript.thread_id().is_none() {
            if let Err(rejection) = self.transcript.push_question(input) {
                debug!(?rejection, "submission rejected");
                return Vec::new();
            }
            return self.create_thread(Queued::Query(input.to_string()));
        }
        match self.transcript.begin_submit(input) {
            Ok(ticket) => {
                vec![Action::Send(Request::Query { token, ticket, query: input.to_string() })]
            }
            Err(rejection) => {
                debug!(?rejection, "submission rejected");
                Vec::new()
            }
        }
    }

    pub fn start_recording(&mut self, input: &mut dyn AudioInput) -> Vec<Action> {
        match self.recorder.start(input) {
            Ok(StartOutcome::Started) | Ok(StartOutcome::AlreadyRecording) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "could not start recording");
                vec![Action::Notify(Notification::error("Error", notify::RECORDING_FAILED))]
            }
        }
    }

    /// Buffer captured audio; call regularly while recording
    pub fn poll_recording(&mut self) -> Vec<Action> {
        match self.recorder.poll() {
            Ok(()) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "recording aborted");
                vec![Action::Notify(Notification::error("Error", notify::RECORDING_FAILED))]
            }
        }
    }

    /// Drop the current recording without sending it
    pub fn cancel_recording(&mut self) {
        self.recorder.cancel();
    }

    /// Finalize the clip and send it
    pub fn stop_recording(&mut self) -> Vec<Action> {
        match self.recorder.stop() {
            Ok(Some(clip)) => self.submit_audio(clip),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "recording failed");
                vec![Action::Notify(Notification::error("Error", notify::AUDIO_FAILED))]
            }
        }
    }

    pub fn submit_audio(&mut self, clip: AudioClip) -> Vec<Action> {
        let Some(token) = self.token() else {
            return vec![Action::Notify(Notification::login_required())];
        };
        if clip.is_empty() {
            return vec![Action::Notify(Notification::error("Error", notify::AUDIO_FAILED))];
        }
        if self.is_busy() {
            return vec![Action::Notify(Notification::info(
                "Busy",
                "Please wait for the current reply before sending audio.",
            ))];
        }
        if self.transcript.thread_id().is_none() {
            return self.create_thread(Queued::Audio(clip));
        }
        match self.transcript.begin_audio() {
            Ok(ticket) => vec![Action::Send(Request::Audio { token, ticket, clip })],
            Err(rejection) => {
                debug!(?rejection, "audio rejected");
                Vec::new()
            }
        }
    }

    /// Apply a finished request; returns follow-up work
    pub fn apply(&mut self, response: Response) -> Vec<Action> {
        match response {
            Response::Sessions { token, result } => {
                if self.session.current_token() != Some(token.as_str()) {
                    debug!("discarding session list for a previous login");
                    return Vec::new();
                }
                match self.registry.apply_sessions(result) {
                    Ok(_) => Vec::new(),
                    Err(e) => {
                        warn!(error = %e, "failed to fetch sessions");
                        vec![Action::Notify(Notification::error("Error", notify::SESSIONS_FAILED))]
                    }
                }
            }
            Response::NewSession { token, generation, then, result } => {
                self.apply_new_session(token, generation, then, result)
            }
            Response::History { ticket, result } => {
                match self.transcript.apply_history(&ticket, result) {
                    Ok(_) => Vec::new(),
                    Err(e) => {
                        warn!(error = %e, thread = ticket.thread_id(), "failed to load history");
                        vec![Action::Notify(Notification::error("Error", notify::HISTORY_FAILED))]
                    }
                }
            }
            Response::Query { ticket, result } => {
                let failed = result.is_err();
                match self.transcript.apply_reply(&ticket, result) {
                    Applied::Applied if failed => {
                        vec![Action::Notify(Notification::error("Error", notify::QUERY_FAILED))]
                    }
                    _ => Vec::new(),
                }
            }
            Response::Audio { ticket, result } => match result {
                Ok(reply) => {
                    self.transcript.apply_audio(&ticket, reply);
                    Vec::new()
                }
                Err(e) => {
                    warn!(error = %e, "audio request failed");
                    match self.transcript.abandon(&ticket) {
                        Applied::Applied => vec![Action::Notify(Notification::error(
                            "Error",
                            notify::AUDIO_FAILED,
                        ))],
                        Applied::Stale => Vec::new(),
                    }
                }
            },
        }
    }

    fn apply_new_session(
        &mut self,
        token: String,
        generation: u64,
        then: Queued,
        result: Result<String, ClientError>,
    ) -> Vec<Action> {
        let current = self.creating == Some(generation)
            && self.transcript.generation() == generation
            && self.session.current_token() == Some(token.as_str());
        if self.creating == Some(generation) {
            self.creating = None;
        }
        if !current {
            debug!(generation, "discarding stale thread creation");
            return Vec::new();
        }

        let thread_id = match self.registry.apply_created(result) {
            Ok(id) => id.to_string(),
            Err(e) => {
                warn!(error = %e, "failed to create session");
                if matches!(then, Queued::Query(_)) {
                    self.transcript.apologize();
                }
                return vec![Action::Notify(Notification::error("Error", notify::NEW_CHAT_FAILED))];
            }
        };
        info!(thread = %thread_id, "new thread");
        match then {
            Queued::Nothing => self.transcript.start_thread(thread_id),
            _ => self.transcript.adopt_thread(thread_id),
        }

        let mut actions = self.refresh_sessions();
        actions.extend(match then {
            Queued::Nothing => Vec::new(),
            Queued::Query(query) => match self.transcript.issue_query() {
                Ok(ticket) => vec![Action::Send(Request::Query { token, ticket, query })],
                Err(rejection) => {
                    debug!(?rejection, "queued query dropped");
                    Vec::new()
                }
            },
            Queued::Audio(clip) => self.submit_audio(clip),
        });
        actions
    }

    /// Drive actions to completion, awaiting each request in turn
    pub async fn run(&mut self, actions: Vec<Action>) -> Vec<Notification> {
        let mut queue: VecDeque<Action> = actions.into();
        let mut notes = Vec::new();
        while let Some(action) = queue.pop_front() {
            match action {
                Action::Notify(note) => notes.push(note),
                Action::Send(request) => {
                    let backend = self.backend();
                    let response = request.execute(backend.as_ref()).await;
                    queue.extend(self.apply(response));
                }
            }
        }
        notes
    }
}
