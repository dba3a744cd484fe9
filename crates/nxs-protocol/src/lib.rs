//! nxs-protocol: Handoff line exchanged between nxsession roles
//!
//! The remote role announces readiness by printing exactly one line of the
//! form `Cookie:<secret>` on its standard output. The local role reads the
//! first line and nothing else: the readiness marker yields the secret, any
//! other content is the remote side's error message.

pub mod cookie;
pub mod error;
pub mod handshake;

pub use cookie::Cookie;
pub use error::ProtocolError;
pub use handshake::{announce, parse_first_line, read_handshake, Handshake, READY_MARKER};
