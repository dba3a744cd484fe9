//! Authentication database trait

use nxs_protocol::Cookie;

use crate::error::AuthError;
use crate::types::DisplayId;

/// Store of display cookies, keyed by display
pub trait AuthDatabase: Send + Sync {
    /// Register `cookie` for `display`, replacing any previous entry
    fn add(&self, display: DisplayId, cookie: &Cookie) -> Result<(), AuthError>;

    /// Remove the entry for `display`; removing a missing entry succeeds
    fn remove(&self, display: DisplayId) -> Result<(), AuthError>;

    /// Cookie registered for `display`, if any
    fn extract(&self, display: DisplayId) -> Result<Option<Cookie>, AuthError>;
}
