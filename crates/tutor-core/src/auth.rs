//! ============================================================================
//! Identity Provider — display-only session identity
//! ============================================================================
//! The identity is a banner label, never an authorization input. Subscribers
//! get a watch receiver; dropping it is the unsubscribe.
//! ============================================================================

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::info;

/// Signed-in identity, if any
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityInfo {
    pub id: String,
    pub display_label: String,
}

/// Subscription handle for identity changes
pub type IdentityWatch = watch::Receiver<Option<IdentityInfo>>;

/// Session/identity oracle consumed by the UI layer
pub trait IdentityProvider: Send + Sync {
    fn current(&self) -> Option<IdentityInfo>;
    fn subscribe(&self) -> IdentityWatch;
}

/// Local-first provider: identity comes from the ALAMO_USER env var or
/// explicit sign-in, with no remote auth service involved.
pub struct LocalIdentity {
    tx: watch::Sender<Option<IdentityInfo>>,
}

impl LocalIdentity {
    pub fn new(identity: Option<IdentityInfo>) -> Self {
        let (tx, _rx) = watch::channel(identity);
        Self { tx }
    }

    /// Read the display name from ALAMO_USER, anonymous when unset
    pub fn from_env() -> Self {
        let identity = std::env::var("ALAMO_USER").ok().and_then(|name| {
            let name = name.trim().to_string();
            if name.is_empty() {
                None
            } else {
                Some(IdentityInfo {
                    id: name.clone(),
                    display_label: name,
                })
            }
        });
        Self::new(identity)
    }

    pub fn sign_in(&self, identity: IdentityInfo) {
        info!("Signed in as {}", identity.display_label);
        // send_replace updates even with no live subscribers
        self.tx.send_replace(Some(identity));
    }

    pub fn sign_out(&self) {
        info!("Signed out");
        self.tx.send_replace(None);
    }
}

impl IdentityProvider for LocalIdentity {
    fn current(&self) -> Option<IdentityInfo> {
        self.tx.borrow().clone()
    }

    fn subscribe(&self) -> IdentityWatch {
        self.tx.subscribe()
    }
}
