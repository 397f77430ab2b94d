//! ============================================================================
//! TUTOR-CORE: Alámò's Brain
//! ============================================================================
//! Local-first core for the Alámò STEM tutor:
//! - Profile state machine (coins, credits, streak, per-subject progress)
//! - Per-subject chat sessions against the Gemini tutoring service
//! - Reward detection over tutor replies
//! - Embedded redb persistence for the profile and transcripts
//! ============================================================================

pub mod auth;
pub mod profile;
pub mod reward;
pub mod service;
pub mod session;
pub mod store;
pub mod types;

// Re-export main types for convenience
pub use auth::{IdentityInfo, IdentityProvider, LocalIdentity};
pub use profile::ProfileManager;
pub use reward::Praise;
pub use service::{GeminiTutor, TutorService};
pub use session::{ChatSession, SessionState, TurnOutcome};
pub use store::{KvStore, TutorDb};
pub use types::*;
