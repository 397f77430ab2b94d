//! ============================================================================
//! Profile State Machine
//! ============================================================================
//! Owns the UserStats record: credit spend gating, reward bookkeeping,
//! streak maintenance, and the full reset. Every mutation persists the new
//! state best-effort; a failed write is logged and the in-memory profile
//! stays authoritative until the next successful write.
//! ============================================================================

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::store::{self, KvStore};
use crate::types::{Subject, UserStats};

/// Coins granted on every detected learning success
pub const COIN_REWARD: u64 = 10;

/// Owns and mutates the local user profile
pub struct ProfileManager {
    stats: UserStats,
    store: Arc<dyn KvStore>,
}

impl ProfileManager {
    /// Load the stored profile, or start from defaults on first run
    pub fn load(store: Arc<dyn KvStore>) -> Self {
        let stats = store::load_profile(store.as_ref());
        Self { stats, store }
    }

    pub fn stats(&self) -> &UserStats {
        &self.stats
    }

    /// Sole admission gate on chat turns. Returns false with no mutation
    /// when the balance is short; on success the new balance is persisted.
    pub fn spend_credits(&mut self, amount: u64) -> bool {
        if self.stats.credits < amount {
            debug!(
                "Credit spend refused: need {}, have {}",
                amount, self.stats.credits
            );
            return false;
        }
        self.stats.credits -= amount;
        self.persist();
        true
    }

    /// Record a learning success: bump the subject's mastery (saturating at
    /// 100) and grant the fixed coin reward.
    pub fn award_progress(&mut self, subject: Subject, increment: u8) {
        let entry = self.stats.progress.entry(subject).or_insert(0);
        *entry = entry.saturating_add(increment).min(100);
        self.stats.coins += COIN_REWARD;
        info!(
            "Awarded progress: {} now {}%, coins {}",
            subject, *entry, self.stats.coins
        );
        self.persist();
    }

    /// Restore defaults and purge every transcript. Irreversible; the caller
    /// owns the confirmation prompt.
    pub fn reset_all(&mut self) {
        self.stats = UserStats::default();
        if let Err(e) = self.store.clear() {
            warn!("Failed to wipe store during reset: {:#}", e);
        }
        self.persist();
        info!("Profile reset to defaults");
    }

    /// Daily streak bookkeeping, called once on app startup:
    /// same day is a no-op, the next day extends the streak, a gap resets
    /// it to 1.
    pub fn record_visit(&mut self) {
        let today = Utc::now().date_naive();
        let last = NaiveDate::parse_from_str(&self.stats.last_visit, "%Y-%m-%d").ok();

        match last {
            Some(d) if d == today => return,
            Some(d) if d + Duration::days(1) == today => {
                self.stats.streak += 1;
                info!("Streak extended to {} days", self.stats.streak);
            }
            _ => {
                self.stats.streak = 1;
            }
        }
        self.stats.last_visit = today.to_string();
        self.persist();
    }

    pub fn set_notifications_enabled(&mut self, enabled: bool) {
        self.stats.notifications_enabled = enabled;
        self.persist();
    }

    pub fn set_reminder_time(&mut self, time: Option<String>) {
        self.stats.reminder_time = time;
        self.persist();
    }

    fn persist(&self) {
        if let Err(e) = store::save_profile(self.store.as_ref(), &self.stats) {
            warn!("Profile write failed, keeping in-memory state: {:#}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mem::MemStore;
    use crate::store::PROFILE_KEY;

    fn manager() -> (Arc<MemStore>, ProfileManager) {
        let store = Arc::new(MemStore::new());
        let profile = ProfileManager::load(store.clone() as Arc<dyn KvStore>);
        (store, profile)
    }

    #[test]
    fn test_spend_refused_when_short() {
        let (_, mut profile) = manager();
        for amount in [101, 150, 1000, u64::MAX] {
            assert!(!profile.spend_credits(amount));
            assert_eq!(profile.stats().credits, 100);
        }
    }

    #[test]
    fn test_spend_exact_drain() {
        let (_, mut profile) = manager();
        for _ in 0..10 {
            assert!(profile.spend_credits(10));
        }
        assert_eq!(profile.stats().credits, 0);

        // Eleventh turn is refused and the balance stays put
        assert!(!profile.spend_credits(10));
        assert_eq!(profile.stats().credits, 0);
    }

    #[test]
    fn test_spend_persists() {
        let (store, mut profile) = manager();
        assert!(profile.spend_credits(30));

        let reloaded = ProfileManager::load(store as Arc<dyn KvStore>);
        assert_eq!(reloaded.stats().credits, 70);
    }

    #[test]
    fn test_progress_clamps_at_100() {
        let (_, mut profile) = manager();
        for _ in 0..25 {
            profile.award_progress(Subject::Mathematics, 5);
        }
        assert_eq!(profile.stats().progress[&Subject::Mathematics], 100);

        profile.award_progress(Subject::Mathematics, 5);
        assert_eq!(profile.stats().progress[&Subject::Mathematics], 100);
    }

    #[test]
    fn test_progress_never_decreases() {
        let (_, mut profile) = manager();
        let mut previous = 0;
        for increment in [5, 0, 17, 90, 5] {
            profile.award_progress(Subject::Biology, increment);
            let current = profile.stats().progress[&Subject::Biology];
            assert!(current >= previous);
            assert!(current <= 100);
            previous = current;
        }
    }

    #[test]
    fn test_award_always_grants_coins() {
        let (_, mut profile) = manager();
        profile.award_progress(Subject::Physics, 5);
        assert_eq!(profile.stats().coins, 60);

        // Coins keep accruing even once progress is capped
        for _ in 0..30 {
            profile.award_progress(Subject::Physics, 5);
        }
        assert_eq!(profile.stats().progress[&Subject::Physics], 100);
        assert_eq!(profile.stats().coins, 50 + 31 * COIN_REWARD);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let (store, mut profile) = manager();
        profile.spend_credits(40);
        profile.award_progress(Subject::Chemistry, 60);
        store.set("transcript:v1:Chemistry", "[]").unwrap();

        profile.reset_all();
        let after_once = profile.stats().clone();
        assert_eq!(after_once.credits, 100);
        assert_eq!(after_once.coins, 50);
        assert_eq!(after_once.progress[&Subject::Chemistry], 0);
        assert!(store.get("transcript:v1:Chemistry").unwrap().is_none());

        profile.reset_all();
        assert_eq!(profile.stats(), &after_once);
    }

    #[test]
    fn test_write_failure_keeps_memory_state() {
        let (store, mut profile) = manager();
        store.set_fail_writes(true);

        assert!(profile.spend_credits(10));
        assert_eq!(profile.stats().credits, 90);
        // Nothing reached the store
        assert!(store.get(PROFILE_KEY).unwrap().is_none());

        // Next successful write carries the full state forward
        store.set_fail_writes(false);
        assert!(profile.spend_credits(10));
        let reloaded = store::load_profile(store.as_ref());
        assert_eq!(reloaded.credits, 80);
    }

    #[test]
    fn test_visit_same_day_is_noop() {
        let (_, mut profile) = manager();
        profile.record_visit();
        let streak = profile.stats().streak;
        profile.record_visit();
        assert_eq!(profile.stats().streak, streak);
    }

    #[test]
    fn test_visit_consecutive_day_extends_streak() {
        let (_, mut profile) = manager();
        let yesterday = Utc::now().date_naive() - Duration::days(1);
        profile.stats.last_visit = yesterday.to_string();
        profile.stats.streak = 3;

        profile.record_visit();
        assert_eq!(profile.stats().streak, 4);
        assert_eq!(
            profile.stats().last_visit,
            Utc::now().date_naive().to_string()
        );
    }

    #[test]
    fn test_visit_after_gap_resets_streak() {
        let (_, mut profile) = manager();
        let last_week = Utc::now().date_naive() - Duration::days(7);
        profile.stats.last_visit = last_week.to_string();
        profile.stats.streak = 12;

        profile.record_visit();
        assert_eq!(profile.stats().streak, 1);
    }
}
