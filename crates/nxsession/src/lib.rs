//! nxsession: Command-line front end for the session coordinators
//!
//! Parses the classic single-dash flag surface, then dispatches to the
//! remote role (`-C`), the local role, or the session listing.

pub mod cli;
pub mod commands;
pub mod output;
