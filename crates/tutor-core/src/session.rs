//! ============================================================================
//! Chat Session Controller
//! ============================================================================
//! One session per subject. Mediates between user input, the tutoring
//! service, and the profile: credit spend up front, transcript append and
//! persist on both sides of the call, reward detection on the reply.
//! States: Idle -> AwaitingResponse -> Idle; a second turn while a response
//! is outstanding is rejected.
//! ============================================================================

use std::sync::Arc;

use tracing::{debug, warn};

use crate::profile::ProfileManager;
use crate::reward::{self, Praise};
use crate::service::{TutorService, APOLOGY_MESSAGE, MAX_HISTORY_DEPTH};
use crate::store::{self, KvStore};
use crate::types::{ChatMessage, HistoryEntry, Role, Subject};

/// Credits consumed per chat turn
pub const CREDIT_COST: u64 = 10;

/// Progress granted to the subject on a detected success
pub const PROGRESS_INCREMENT: u8 = 5;

/// Synthetic tutor message appended when the credit gate refuses a turn
pub const NO_CREDITS_MESSAGE: &str = "Eyah! Your sachet credits don finish o. Master more quests \
    to earn coins and top up!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingResponse,
}

/// Effect of a `send_turn` call
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// Empty prompt or a response already outstanding; nothing changed
    Rejected,
    /// Credit gate refused the turn; a synthetic notice was appended
    InsufficientCredits,
    /// The tutor replied (possibly with the fixed apology)
    Replied {
        reply: String,
        praise: Option<Praise>,
    },
}

/// Per-subject chat session
pub struct ChatSession {
    subject: Subject,
    messages: Vec<ChatMessage>,
    state: SessionState,
    store: Arc<dyn KvStore>,
    service: Arc<dyn TutorService>,
}

impl ChatSession {
    /// Open a subject's session, replaying the stored transcript or seeding
    /// the greeting on first open. The greeting reaches storage with the
    /// first persisted append.
    pub fn open(subject: Subject, store: Arc<dyn KvStore>, service: Arc<dyn TutorService>) -> Self {
        let messages = match store::load_transcript(store.as_ref(), subject) {
            Ok(Some(messages)) => messages,
            Ok(None) => vec![ChatMessage::now(Role::Model, greeting(subject))],
            Err(e) => {
                warn!("Could not replay {} transcript: {:#}", subject, e);
                vec![ChatMessage::now(Role::Model, greeting(subject))]
            }
        };

        Self {
            subject,
            messages,
            state: SessionState::Idle,
            store,
            service,
        }
    }

    pub fn subject(&self) -> Subject {
        self.subject
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Run one tutoring turn end to end. Never fails outward: every error
    /// path degrades to a conversational message in the transcript.
    pub async fn send_turn(&mut self, profile: &mut ProfileManager, prompt: &str) -> TurnOutcome {
        if prompt.trim().is_empty() || self.state == SessionState::AwaitingResponse {
            debug!("Turn rejected: empty prompt or response outstanding");
            return TurnOutcome::Rejected;
        }

        if !profile.spend_credits(CREDIT_COST) {
            self.append(ChatMessage::now(Role::Model, NO_CREDITS_MESSAGE));
            return TurnOutcome::InsufficientCredits;
        }

        self.append(ChatMessage::now(Role::User, prompt));
        self.state = SessionState::AwaitingResponse;

        // Bounded suffix, inclusive of the just-appended user message
        let history = self.history_window();

        let reply = match self.service.ask(prompt, self.subject, &history).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Tutoring service call failed: {:#}", e);
                APOLOGY_MESSAGE.to_string()
            }
        };

        self.append(ChatMessage::now(Role::Model, reply.clone()));
        self.state = SessionState::Idle;

        let praise = if reward::detect(&reply) {
            profile.award_progress(self.subject, PROGRESS_INCREMENT);
            Some(reward::pick_praise(self.subject))
        } else {
            None
        };

        TurnOutcome::Replied { reply, praise }
    }

    fn history_window(&self) -> Vec<HistoryEntry> {
        let skip = self.messages.len().saturating_sub(MAX_HISTORY_DEPTH);
        self.messages[skip..].iter().map(HistoryEntry::from).collect()
    }

    fn append(&mut self, message: ChatMessage) {
        self.messages.push(message);
        if let Err(e) = store::save_transcript(self.store.as_ref(), self.subject, &self.messages) {
            warn!(
                "Transcript write failed for {}, keeping in-memory state: {:#}",
                self.subject, e
            );
        }
    }
}

/// Seeded model greeting for a fresh transcript
fn greeting(subject: Subject) -> String {
    format!(
        "Bawo ni, omo mi! I am Alámò, your {} expert. Ready to master some topics today? \
         Oya, shoot your question!",
        subject
    )
}
