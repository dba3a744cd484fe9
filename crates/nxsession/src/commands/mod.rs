//! CLI command implementations

mod config;
mod list;
mod local;
mod remote;

pub use config::config_init;
pub use list::list_command;
pub use local::{local_command, RemoteTarget};
pub use remote::remote_command;
