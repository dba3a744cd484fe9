//! Output formatting utilities for the CLI
//!
//! Session tables and colored status messages. Nothing here writes the
//! readiness line; that belongs to the remote role alone.

use tabled::{settings::Style, Table, Tabled};

use nxs_coordinator::Inspection;

/// Format inspected sessions as an ASCII table
///
/// Returns "No sessions" if the list is empty.
pub fn format_sessions(sessions: &[Inspection]) -> String {
    if sessions.is_empty() {
        return "No sessions".to_string();
    }

    #[derive(Tabled)]
    struct SessionRow {
        #[tabled(rename = "DISPLAY")]
        display: String,
        #[tabled(rename = "ROLE")]
        role: String,
        #[tabled(rename = "STATE")]
        state: String,
        #[tabled(rename = "PID")]
        pid: String,
        #[tabled(rename = "CONTROL")]
        control: u16,
        #[tabled(rename = "X PORT")]
        display_port: u16,
    }

    let rows: Vec<SessionRow> = sessions
        .iter()
        .map(|s| SessionRow {
            display: format!(":{}", s.display),
            role: s.role.to_string(),
            state: s.state.to_string(),
            pid: s
                .pid
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string()),
            control: s.ports.control,
            display_port: s.ports.display,
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

/// Print a success message in green with a checkmark prefix
///
/// Outputs to stdout with green coloring for positive feedback to the user.
pub fn print_success(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Green),
        Print("✓ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an error message in red with an X prefix
///
/// Outputs to stderr.
pub fn print_error(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Red),
        Print("✗ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an informational message in cyan with an info symbol prefix
pub fn print_info(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Cyan),
        Print("ℹ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}
