//! Secret generation
//!
//! A fresh cookie is generated exactly once per session creation. Resumes
//! re-extract it from the authentication database instead.

use nxs_protocol::Cookie;
use rand::Rng;

/// Length of the cookie in bytes (before hex encoding)
const COOKIE_BYTES: usize = 16;

/// Generate a new random cookie
///
/// Returns 32 hex characters (16 random bytes).
pub fn generate_cookie() -> Cookie {
    let mut bytes = [0u8; COOKIE_BYTES];
    rand::thread_rng().fill(&mut bytes);
    Cookie::new(hex::encode(bytes)).expect("hex encoding is always a valid cookie")
}
