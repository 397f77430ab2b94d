//! ============================================================================
//! Core Types for the Alámò Tutor
//! ============================================================================
//! Defines the user profile, chat transcript entries, and the wire shapes
//! exchanged with the external tutoring service.
//! ============================================================================

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Starting coin balance for a new profile
pub const STARTING_COINS: u64 = 50;

/// Starting credit balance for a new profile
pub const STARTING_CREDITS: u64 = 100;

/// One of the four STEM subjects.
/// Keys both progress tracking and transcript storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Subject {
    Physics,
    Mathematics,
    Chemistry,
    Biology,
}

impl Subject {
    /// All subjects, in display order
    pub const ALL: [Subject; 4] = [
        Subject::Physics,
        Subject::Mathematics,
        Subject::Chemistry,
        Subject::Biology,
    ];

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "physics" => Some(Self::Physics),
            "mathematics" | "math" | "maths" => Some(Self::Mathematics),
            "chemistry" => Some(Self::Chemistry),
            "biology" => Some(Self::Biology),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Physics => "Physics",
            Self::Mathematics => "Mathematics",
            Self::Chemistry => "Chemistry",
            Self::Biology => "Biology",
        }
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The local user profile.
/// One record per device, persisted under `profile:v1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    /// Display/reward currency, earned on detected learning success
    pub coins: u64,
    /// Consumable balance spent per chat turn; never goes negative
    pub credits: u64,
    /// Consecutive active days, at least 1
    pub streak: u32,
    /// Date of the most recent recorded visit (YYYY-MM-DD, UTC)
    pub last_visit: String,
    /// Per-subject mastery in [0, 100]
    pub progress: BTreeMap<Subject, u8>,
    #[serde(default)]
    pub notifications_enabled: bool,
    /// Daily reminder time as "HH:MM", if configured
    #[serde(default)]
    pub reminder_time: Option<String>,
}

impl Default for UserStats {
    fn default() -> Self {
        Self {
            coins: STARTING_COINS,
            credits: STARTING_CREDITS,
            streak: 1,
            last_visit: chrono::Utc::now().date_naive().to_string(),
            progress: Subject::ALL.iter().map(|s| (*s, 0)).collect(),
            notifications_enabled: false,
            reminder_time: None,
        }
    }
}

/// Who authored a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }
}

/// Single entry in a subject's transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
    /// Epoch milliseconds
    pub timestamp: i64,
}

impl ChatMessage {
    /// Build a message stamped with the current time
    pub fn now(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Trimmed transcript entry in the shape the tutoring service expects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

impl From<&ChatMessage> for HistoryEntry {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: msg.role,
            content: msg.text.clone(),
        }
    }
}

/// Error taxonomy for the tutor core.
/// None of these are fatal; every one degrades to a conversational message.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TutorError {
    #[error("Insufficient credits: need {needed}, have {available}")]
    InsufficientCredits { needed: u64, available: u64 },

    #[error("Persistence write failed: {0}")]
    PersistenceWriteFailure(String),

    #[error("Tutoring service failure: {0}")]
    ExternalServiceFailure(String),

    #[error("Tutoring service is not configured")]
    ConfigurationMissing,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_from_str() {
        assert_eq!(Subject::from_str("physics"), Some(Subject::Physics));
        assert_eq!(Subject::from_str("MATH"), Some(Subject::Mathematics));
        assert_eq!(Subject::from_str("Mathematics"), Some(Subject::Mathematics));
        assert_eq!(Subject::from_str("chemistry"), Some(Subject::Chemistry));
        assert_eq!(Subject::from_str("biology"), Some(Subject::Biology));
        assert_eq!(Subject::from_str("geography"), None);
    }

    #[test]
    fn test_subject_round_trip() {
        for subject in Subject::ALL {
            assert_eq!(Subject::from_str(subject.as_str()), Some(subject));
        }
    }

    #[test]
    fn test_default_stats() {
        let stats = UserStats::default();
        assert_eq!(stats.coins, 50);
        assert_eq!(stats.credits, 100);
        assert_eq!(stats.streak, 1);
        assert_eq!(stats.progress.len(), 4);
        assert!(stats.progress.values().all(|p| *p == 0));
        assert!(!stats.notifications_enabled);
        assert!(stats.reminder_time.is_none());
    }

    #[test]
    fn test_role_serde_names() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(serde_json::to_string(&Role::Model).unwrap(), "\"model\"");
    }

    #[test]
    fn test_message_json_round_trip() {
        let msg = ChatMessage {
            role: Role::Model,
            text: "Bawo ni!".to_string(),
            timestamp: 1_700_000_000_000,
        };
        let raw = serde_json::to_string(&msg).unwrap();
        let back: ChatMessage = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, msg);
    }
}
