//! Options blob handed to the display agent and the proxy
//!
//! Rendered as `nx/nx,<key=value>,...:<display>`, the form both the agent's
//! `-display nx/nx,options=<file>:<display>` and the proxy's `options=<file>`
//! read.

use std::fmt;

use nxs_protocol::Cookie;

use crate::types::DisplayId;

const TRANSPORT_PREFIX: &str = "nx/nx";

/// Link policy for loopback sessions
pub const LINK_LAN: &str = "lan";
/// Link policy for tunnelled sessions
pub const LINK_WAN: &str = "wan";

/// One `key[=value]` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionEntry {
    pub key: String,
    pub value: Option<String>,
}

impl OptionEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }

    /// Parse a comma-joined list of `key=value` entries
    ///
    /// Empty items are skipped; an item without `=` becomes a bare key.
    pub fn parse_list(raw: &str) -> Vec<OptionEntry> {
        raw.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| match item.split_once('=') {
                Some((key, value)) => OptionEntry::new(key.trim(), value.trim()),
                None => OptionEntry {
                    key: item.to_string(),
                    value: None,
                },
            })
            .collect()
    }
}

impl fmt::Display for OptionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}={}", self.key, value),
            None => f.write_str(&self.key),
        }
    }
}

/// Configuration blob written to a session's `options` file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    display: DisplayId,
    entries: Vec<OptionEntry>,
}

impl SessionOptions {
    /// Options for the display agent
    ///
    /// Fixed entries come first in a stable order, then caller extras. An
    /// extra naming a fixed key (including `link`) replaces it in place; an
    /// extra `cookie` is dropped so the blob always carries the registered
    /// secret.
    pub fn for_agent(display: DisplayId, cookie: &Cookie, extras: &[OptionEntry]) -> Self {
        let mut options = Self {
            display,
            entries: vec![
                OptionEntry::new("nodelay", "1"),
                OptionEntry::new("cleanup", "0"),
                OptionEntry::new("accept", "localhost"),
                OptionEntry::new("taint", "1"),
                OptionEntry::new("cookie", cookie.as_str()),
                OptionEntry::new("link", LINK_LAN),
            ],
        };

        for extra in extras {
            if extra.key == "cookie" {
                let shown = display.to_string();
                tracing::warn!("Ignoring caller-supplied cookie option for display {}", shown);
                continue;
            }
            options.set(extra.clone());
        }

        options
    }

    /// Options for the local proxy: just the shared secret
    pub fn for_proxy(display: DisplayId, cookie: &Cookie) -> Self {
        Self {
            display,
            entries: vec![OptionEntry::new("cookie", cookie.as_str())],
        }
    }

    /// Replace an entry with the same key, or append
    pub fn set(&mut self, entry: OptionEntry) {
        match self.entries.iter_mut().find(|e| e.key == entry.key) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn display(&self) -> DisplayId {
        self.display
    }

    pub fn entries(&self) -> &[OptionEntry] {
        &self.entries
    }

    /// Value of the first entry named `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .and_then(|e| e.value.as_deref())
    }

    /// Secret carried by this blob
    pub fn cookie(&self) -> Option<Cookie> {
        self.get("cookie").and_then(|c| Cookie::new(c).ok())
    }

    /// Text written to the options file
    pub fn render(&self) -> String {
        let mut out = String::from(TRANSPORT_PREFIX);
        for entry in &self.entries {
            out.push(',');
            out.push_str(&entry.to_string());
        }
        out.push(':');
        out.push_str(&self.display.to_string());
        out
    }

    /// Parse a rendered blob back
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (body, display) = raw.rsplit_once(':')?;
        let display = display.parse().ok()?;
        let body = body.strip_prefix(TRANSPORT_PREFIX)?;
        Some(Self {
            display,
            entries: OptionEntry::parse_list(body),
        })
    }
}
