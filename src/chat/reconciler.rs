//! Message history reconciliation for the active thread.
//!
//! Every request that will later touch the transcript is stamped with a [`Ticket`]. Changing
//! threads (switch, new thread, logout) bumps the generation, so replies that arrive for a
//! thread the user already left are recognised as stale and dropped instead of being appended
//! to whatever thread is active now.

use tracing::{debug, warn};

use crate::error::ClientError;
use crate::models::api::{AudioResponse, QueryResponse};
use crate::models::Message;
use crate::notify::QUERY_APOLOGY;

/// Proof that a request was issued for a given thread in a given generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    thread_id: String,
}

impl Ticket {
    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Whether a response was applied or discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Applied,
    Stale,
}

/// Why a submission was refused without issuing a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    EmptyInput,
    NoActiveThread,
    Busy,
}

#[derive(Debug, Default)]
pub struct Reconciler {
    thread_id: Option<String>,
    messages: Vec<Message>,
    generation: u64,
    /// Query or audio request awaiting its reply
    pending: Option<Ticket>,
    /// History fetch for the current thread
    loading: Option<Ticket>,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn thread_id(&self) -> Option<&str> {
        self.thread_id.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_loading_history(&self) -> bool {
        self.loading.is_some()
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some() || self.loading.is_some()
    }

    /// Make a freshly created, empty thread active
    pub fn start_thread(&mut self, thread_id: impl Into<String>) {
        self.enter(thread_id.into());
    }

    /// Attach a freshly created thread to what is already shown
    pub fn adopt_thread(&mut self, thread_id: impl Into<String>) {
        self.generation += 1;
        self.pending = None;
        self.loading = None;
        self.thread_id = Some(thread_id.into());
    }

    /// Make an existing thread active; its history must be fetched with the returned ticket
    pub fn switch_thread(&mut self, thread_id: impl Into<String>) -> Ticket {
        let ticket = self.enter(thread_id.into());
        self.loading = Some(ticket.clone());
        ticket
    }

    /// Drop the active thread and everything shown for it
    pub fn reset(&mut self) {
        self.generation += 1;
        self.thread_id = None;
        self.messages.clear();
        self.pending = None;
        self.loading = None;
    }

    fn enter(&mut self, thread_id: String) -> Ticket {
        self.generation += 1;
        self.messages.clear();
        self.pending = None;
        self.loading = None;
        self.thread_id = Some(thread_id.clone());
        Ticket { generation: self.generation, thread_id }
    }

    fn current_ticket(&self) -> Result<Ticket, Rejection> {
        let thread_id = self.thread_id.clone().ok_or(Rejection::NoActiveThread)?;
        if self.is_busy() {
            return Err(Rejection::Busy);
        }
        Ok(Ticket { generation: self.generation, thread_id })
    }

    fn is_current(&self, ticket: &Ticket) -> bool {
        ticket.generation == self.generation
            && self.thread_id.as_deref() == Some(ticket.thread_id.as_str())
    }

    /// Append the optimistic user message and enter AwaitingReply
    pub fn begin_submit(&mut self, input: &str) -> Result<Ticket, Rejection> {
        if input.trim().is_empty() {
            return Err(Rejection::EmptyInput);
        }
        let ticket = self.current_ticket()?;
        self.messages.push(Message::user(input));
        Ok(self.await_reply(ticket))
    }

    /// Append the optimistic user message while the thread it belongs to is still being created
    pub fn push_question(&mut self, input: &str) -> Result<(), Rejection> {
        if input.trim().is_empty() {
            return Err(Rejection::EmptyInput);
        }
        if self.is_busy() {
            return Err(Rejection::Busy);
        }
        self.messages.push(Message::user(input));
        Ok(())
    }

    /// Enter AwaitingReply for a question already shown by [`Reconciler::push_question`]
    pub fn issue_query(&mut self) -> Result<Ticket, Rejection> {
        let ticket = self.current_ticket()?;
        Ok(self.await_reply(ticket))
    }

    /// The question pushed ahead of its thread will never be sent
    pub fn apologize(&mut self) {
        self.messages.push(Message::assistant(QUERY_APOLOGY, Vec::new()));
    }

    /// Enter AwaitingReply for an audio clip; nothing is appended until the transcript arrives
    pub fn begin_audio(&mut self) -> Result<Ticket, Rejection> {
        let ticket = self.current_ticket()?;
        Ok(self.await_reply(ticket))
    }

    fn await_reply(&mut self, ticket: Ticket) -> Ticket {
        debug!(thread = %ticket.thread_id, generation = ticket.generation, "awaiting reply");
        self.pending = Some(ticket.clone());
        ticket
    }

    /// Apply a query outcome: the answer on success, the fixed apology on failure
    ///
    /// The optimistic user message stays in place either way.
    pub fn apply_reply(
        &mut self,
        ticket: &Ticket,
        result: Result<QueryResponse, ClientError>,
    ) -> Applied {
        if !self.settle(ticket) {
            return Applied::Stale;
        }
        match result {
            Ok(reply) => self.messages.push(Message::assistant(reply.answer, reply.source_nodes)),
            Err(e) => {
                warn!(error = %e, "query failed");
                self.messages.push(Message::assistant(QUERY_APOLOGY, Vec::new()));
            }
        }
        Applied::Applied
    }

    /// Splice the transcribed utterance and the answer, in that order
    pub fn apply_audio(&mut self, ticket: &Ticket, reply: AudioResponse) -> Applied {
        if !self.settle(ticket) {
            return Applied::Stale;
        }
        self.messages.push(Message::user(reply.transcribed));
        self.messages.push(Message::assistant(reply.answer, reply.source_nodes));
        Applied::Applied
    }

    /// Leave AwaitingReply after a failed audio request without touching the transcript
    pub fn abandon(&mut self, ticket: &Ticket) -> Applied {
        if self.settle(ticket) { Applied::Applied } else { Applied::Stale }
    }

    /// Replace the whole sequence with the fetched history
    ///
    /// On failure the sequence stays as it is (empty after a switch).
    pub fn apply_history(
        &mut self,
        ticket: &Ticket,
        result: Result<Vec<Message>, ClientError>,
    ) -> Result<Applied, ClientError> {
        if !self.is_current(ticket) || self.loading.as_ref() != Some(ticket) {
            debug!(thread = %ticket.thread_id, "discarding stale history");
            return Ok(Applied::Stale);
        }
        self.loading = None;
        self.messages = result?;
        Ok(Applied::Applied)
    }

    fn settle(&mut self, ticket: &Ticket) -> bool {
        if !self.is_current(ticket) || self.pending.as_ref() != Some(ticket) {
            warn!(
                thread = %ticket.thread_id,
                generation = ticket.generation,
                current = self.generation,
                "discarding stale response"
            );
            return false;
        }
        self.pending = None;
        true
    }
}
