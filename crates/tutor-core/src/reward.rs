//! ============================================================================
//! Reward Detector
//! ============================================================================
//! Best-effort positive-sentiment detection over tutor replies. A substring
//! match against the fixed keyword set decides whether a turn counts as a
//! learning success; it is a heuristic, not an answer grader, and will
//! occasionally fire on an echoed keyword.
//! ============================================================================

use std::time::Duration;

use rand::Rng;

use crate::types::Subject;

/// Phrases the tutor uses when a student gets something right.
/// Case-insensitive; any match triggers the reward.
pub const SUCCESS_KEYWORDS: [&str; 11] = [
    "correct", "sabi", "oshey", "gbayi", "opor", "sharp", "excellent", "praise", "correctly",
    "mad oh", "gbogbo e",
];

/// How long a praise toast stays on screen
pub const PRAISE_DISPLAY: Duration = Duration::from_millis(3500);

/// Presentational praise event emitted on a detected success
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Praise {
    pub text: &'static str,
    /// Auto-clear duration for the toast
    pub display_for: Duration,
}

/// Scan a tutor reply for a success signal
pub fn detect(response: &str) -> bool {
    let lower = response.to_lowercase();
    SUCCESS_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Fixed praise pool for a subject
pub fn praise_pool(subject: Subject) -> &'static [&'static str; 4] {
    match subject {
        Subject::Physics => &[
            "Gbayi! Newton don bow!",
            "Potential Energy check! ✅",
            "Frequency tuned well!",
            "Oshey! You're moving at light speed!",
        ],
        Subject::Mathematics => &[
            "X don find his master!",
            "Logic is 100%!",
            "Geometric Genius!",
            "Opor! Numbers don surrender!",
        ],
        Subject::Chemistry => &[
            "Reaction is balanced well!",
            "The bonds are strong!",
            "Pure element of success!",
            "The solution is clear!",
        ],
        Subject::Biology => &[
            "DNA of a scholar!",
            "Brain cells dey fire!",
            "Life Science guru!",
            "Naturally gifted!",
        ],
    }
}

/// Uniform random pick from the subject's praise pool
pub fn pick_praise(subject: Subject) -> Praise {
    let pool = praise_pool(subject);
    let text = pool[rand::thread_rng().gen_range(0..pool.len())];
    Praise {
        text,
        display_for: PRAISE_DISPLAY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_is_case_insensitive() {
        assert!(detect("Gbayi! Newton would be proud."));
        assert!(detect("GBAYI!"));
        assert!(detect("That is CORRECT, omo mi."));
    }

    #[test]
    fn test_detect_matches_every_keyword() {
        for keyword in SUCCESS_KEYWORDS {
            let reply = format!("Well... {} ...indeed", keyword);
            assert!(detect(&reply), "'{}' should trigger", keyword);
        }
    }

    #[test]
    fn test_detect_substring_semantics() {
        // "correctly" contains "correct"; either way the turn rewards
        assert!(detect("You solved it correctly."));
        // Keywords match inside longer words too; that is the accepted
        // false-positive risk of the heuristic
        assert!(detect("Sharpen your pencil"));
    }

    #[test]
    fn test_detect_negative() {
        assert!(!detect("Not quite. Try balancing the equation again."));
        assert!(!detect(""));
    }

    #[test]
    fn test_praise_comes_from_subject_pool() {
        for subject in Subject::ALL {
            let pool = praise_pool(subject);
            for _ in 0..20 {
                let praise = pick_praise(subject);
                assert!(pool.contains(&praise.text));
                assert_eq!(praise.display_for, PRAISE_DISPLAY);
            }
        }
    }

    #[test]
    fn test_pools_are_fixed_size() {
        for subject in Subject::ALL {
            assert_eq!(praise_pool(subject).len(), 4);
        }
    }
}
