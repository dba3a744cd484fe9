//! Authentication database backed by the `xauth` utility

use std::process::{Command, Output};

use nxs_protocol::Cookie;

use crate::error::AuthError;
use crate::traits::AuthDatabase;
use crate::types::DisplayId;

/// Authentication protocol name registered for every display
const AUTH_PROTOCOL: &str = "MIT-MAGIC-COOKIE-1";

/// `xauth` wrapper keyed by `:<display>`
#[derive(Debug, Clone)]
pub struct Xauth {
    program: String,
}

impl Xauth {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, args: &[&str]) -> Result<Output, AuthError> {
        tracing::debug!("Running {} {}", self.program, args.first().unwrap_or(&""));

        let output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|source| AuthError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(AuthError::Failed {
                command: format!("{} {}", self.program, args.first().unwrap_or(&"")),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output)
    }
}

/// Cookie from `xauth list` output
///
/// Lines look like `host/unix:5  MIT-MAGIC-COOKIE-1  <hex>`; the first line
/// carrying our protocol wins.
pub fn parse_list_output(output: &str) -> Option<Cookie> {
    output.lines().find_map(|line| {
        let mut fields = line.split_whitespace();
        let _entry = fields.next()?;
        if fields.next()? != AUTH_PROTOCOL {
            return None;
        }
        Cookie::new(fields.next()?).ok()
    })
}

impl AuthDatabase for Xauth {
    fn add(&self, display: DisplayId, cookie: &Cookie) -> Result<(), AuthError> {
        let name = format!(":{}", display);
        self.run(&["add", &name, AUTH_PROTOCOL, cookie.as_str()])?;
        tracing::info!("Registered cookie for {}", name);
        Ok(())
    }

    fn remove(&self, display: DisplayId) -> Result<(), AuthError> {
        let name = format!(":{}", display);
        self.run(&["remove", &name])?;
        tracing::info!("Removed cookie for {}", name);
        Ok(())
    }

    fn extract(&self, display: DisplayId) -> Result<Option<Cookie>, AuthError> {
        let name = format!(":{}", display);
        let output = self.run(&["list", &name])?;
        Ok(parse_list_output(&String::from_utf8_lossy(&output.stdout)))
    }
}
