//! Argument parsing
//!
//! `-h` names the remote host, so clap's short help flag is disabled and
//! only `--help` remains. The historical `-ssh OPTS` spelling is rewritten
//! to `--ssh OPTS` before parsing.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{ArgAction, Parser};

use nxs_coordinator::RemoteAction;
use nxs_core::options::OptionEntry;
use nxs_core::DisplayId;

#[derive(Parser, Debug)]
#[command(name = "nxsession")]
#[command(author, version, about = "Start, suspend, resume and terminate NX display sessions")]
#[command(disable_help_flag = true)]
pub struct Cli {
    /// Display number (`5` or `:5`)
    #[arg(value_name = "DISPLAY", required_unless_present_any = ["list", "init_config"])]
    pub display: Option<DisplayId>,

    /// Remote host to tunnel to (same machine if omitted)
    #[arg(short = 'h', long, value_name = "HOST", conflicts_with = "remote")]
    pub host: Option<String>,

    /// Extra options for the secure-shell client
    #[arg(
        long = "ssh",
        value_name = "OPTS",
        allow_hyphen_values = true,
        requires = "host"
    )]
    pub ssh: Option<String>,

    /// Extra agent options, comma-joined key=value entries
    #[arg(short = 'o', long = "options", value_name = "OPTS", action = ArgAction::Append)]
    pub options: Vec<String>,

    /// Suspend instead of connecting
    #[arg(short = 's', long, conflicts_with = "terminate")]
    pub suspend: bool,

    /// Take over a session that is active elsewhere
    #[arg(short = 'f', long)]
    pub force: bool,

    /// Act as the remote role (owns the display agent)
    #[arg(short = 'C', long = "remote")]
    pub remote: bool,

    /// Terminate the session (remote role only)
    #[arg(short = 't', long, requires = "remote")]
    pub terminate: bool,

    /// List sessions under the session root
    #[arg(
        short = 'l',
        long,
        conflicts_with_all = ["display", "host", "suspend", "force", "remote", "terminate"]
    )]
    pub list: bool,

    /// Print the listing as JSON
    #[arg(long, requires = "list")]
    pub json: bool,

    /// Write the default configuration file (-f overwrites)
    #[arg(
        long,
        conflicts_with_all = ["display", "host", "suspend", "remote", "terminate", "list"]
    )]
    pub init_config: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable verbose output (repeat for more)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    pub help: Option<bool>,
}

impl Cli {
    /// Parse `args` (program name first)
    pub fn parse_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::try_parse_from(args.into_iter().map(|arg| normalize(arg.into())))
    }

    /// Caller options from every `-o`, in order
    pub fn extra_options(&self) -> Vec<OptionEntry> {
        OptionEntry::parse_list(&self.options.join(","))
    }

    /// `--ssh` value split into client arguments
    pub fn ssh_options(&self) -> Vec<String> {
        self.ssh
            .as_deref()
            .map(|opts| opts.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn remote_action(&self) -> RemoteAction {
        if self.terminate {
            RemoteAction::Terminate
        } else if self.suspend {
            RemoteAction::Suspend
        } else {
            RemoteAction::Start
        }
    }

    /// Default log filter for the verbosity flags
    pub fn log_level(&self) -> &'static str {
        match (self.quiet, self.verbose) {
            (true, _) => "error",
            (false, 0) => "warn",
            (false, 1) => "info",
            (false, 2) => "debug",
            (false, _) => "trace",
        }
    }
}

fn normalize(arg: OsString) -> OsString {
    match arg.to_str() {
        Some("-ssh") => OsString::from("--ssh"),
        Some(s) if s.starts_with("-ssh=") => OsString::from(format!("-{}", s)),
        _ => arg,
    }
}
