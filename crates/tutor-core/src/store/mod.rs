//! ============================================================================
//! Persistent Store — key/value durability boundary
//! ============================================================================
//! Key layout:
//!   profile:v1                 JSON UserStats
//!   transcript:v1:<subject>    JSON ordered ChatMessage sequence
//!   reminder:last-date         Last date a study reminder fired (YYYY-MM-DD)
//! ============================================================================

pub mod db;

pub use db::TutorDb;

use anyhow::{anyhow, Result};
use tracing::warn;

use crate::types::{ChatMessage, Subject, UserStats};

/// Key holding the JSON-serialized user profile
pub const PROFILE_KEY: &str = "profile:v1";

/// Key holding the date the daily reminder last fired
pub const REMINDER_KEY: &str = "reminder:last-date";

/// Storage key for a subject's transcript
pub fn transcript_key(subject: Subject) -> String {
    format!("transcript:v1:{}", subject.as_str())
}

/// Minimal durable key/value contract consumed by the profile and session
/// layers. Writes are best-effort at the call sites: a failed `set` is logged
/// and swallowed, leaving in-memory state authoritative.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
    /// Wipe everything, profile and transcripts included
    fn clear(&self) -> Result<()>;
}

/// Load the profile, falling back to defaults on a missing or unreadable
/// record. First run lands here with no stored profile at all.
pub fn load_profile(store: &dyn KvStore) -> UserStats {
    match store.get(PROFILE_KEY) {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Stored profile is unreadable, starting fresh: {}", e);
            UserStats::default()
        }),
        Ok(None) => UserStats::default(),
        Err(e) => {
            warn!("Failed to read profile, starting fresh: {:#}", e);
            UserStats::default()
        }
    }
}

pub fn save_profile(store: &dyn KvStore, stats: &UserStats) -> Result<()> {
    let raw = serde_json::to_string(stats)
        .map_err(|e| anyhow!("Failed to serialize profile: {}", e))?;
    store.set(PROFILE_KEY, &raw)
}

/// Load a subject's transcript. `Ok(None)` means no transcript has been
/// stored yet and the caller should seed the greeting.
pub fn load_transcript(store: &dyn KvStore, subject: Subject) -> Result<Option<Vec<ChatMessage>>> {
    match store.get(&transcript_key(subject))? {
        Some(raw) => {
            let messages = serde_json::from_str(&raw)
                .map_err(|e| anyhow!("Failed to deserialize {} transcript: {}", subject, e))?;
            Ok(Some(messages))
        }
        None => Ok(None),
    }
}

pub fn save_transcript(
    store: &dyn KvStore,
    subject: Subject,
    messages: &[ChatMessage],
) -> Result<()> {
    let raw = serde_json::to_string(messages)
        .map_err(|e| anyhow!("Failed to serialize {} transcript: {}", subject, e))?;
    store.set(&transcript_key(subject), &raw)
}

/// In-memory store double for tests. `fail_writes` simulates quota
/// exhaustion so the write-is-best-effort paths can be exercised.
#[cfg(test)]
pub(crate) mod mem {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use anyhow::{bail, Result};

    use super::KvStore;

    #[derive(Default)]
    pub struct MemStore {
        entries: Mutex<BTreeMap<String, String>>,
        fail_writes: AtomicBool,
    }

    impl MemStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }
    }

    impl KvStore for MemStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                bail!("simulated quota exhaustion");
            }
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn remove(&self, key: &str) -> Result<()> {
            self.entries.lock().unwrap().remove(key);
            Ok(())
        }

        fn clear(&self) -> Result<()> {
            self.entries.lock().unwrap().clear();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mem::MemStore;
    use super::*;
    use crate::types::{Role, UserStats};

    #[test]
    fn test_transcript_key_layout() {
        assert_eq!(transcript_key(Subject::Physics), "transcript:v1:Physics");
        assert_eq!(transcript_key(Subject::Biology), "transcript:v1:Biology");
    }

    #[test]
    fn test_profile_round_trip() {
        let store = MemStore::new();
        let mut stats = UserStats::default();
        stats.credits = 70;
        stats.coins = 120;
        *stats.progress.get_mut(&Subject::Chemistry).unwrap() = 45;

        save_profile(&store, &stats).unwrap();
        assert_eq!(load_profile(&store), stats);
    }

    #[test]
    fn test_missing_profile_defaults() {
        let store = MemStore::new();
        assert_eq!(load_profile(&store), UserStats::default());
    }

    #[test]
    fn test_corrupt_profile_defaults() {
        let store = MemStore::new();
        store.set(PROFILE_KEY, "{not json").unwrap();
        assert_eq!(load_profile(&store), UserStats::default());
    }

    #[test]
    fn test_transcript_round_trip() {
        let store = MemStore::new();
        let messages = vec![
            ChatMessage {
                role: Role::Model,
                text: "Bawo ni, omo mi!".to_string(),
                timestamp: 1,
            },
            ChatMessage {
                role: Role::User,
                text: "Explain refraction".to_string(),
                timestamp: 2,
            },
        ];

        save_transcript(&store, Subject::Physics, &messages).unwrap();
        let loaded = load_transcript(&store, Subject::Physics).unwrap().unwrap();
        assert_eq!(loaded, messages);

        // Other subjects are untouched
        assert!(load_transcript(&store, Subject::Biology).unwrap().is_none());
    }
}
