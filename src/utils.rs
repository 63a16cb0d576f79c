use std::io::IsTerminal;

use crossterm::style::{Color, Stylize};

/// Truncate error message to a reasonable number of lines for display
pub fn truncate_error_message(message: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = message.lines().collect();
    if lines.len() <= max_lines {
        message.to_string()
    } else {
        let truncated_lines = &lines[..max_lines];
        format!(
            "{}\n... (truncated {} more lines)",
            truncated_lines.join("\n"),
            lines.len() - max_lines
        )
    }
}

/// Print a bold colored line to stdout, plain when stdout is not a terminal.
pub fn print_colored(message: &str, color: Color) {
    if std::io::stdout().is_terminal() {
        println!("{}", message.with(color).bold());
    } else {
        println!("{}", message);
    }
}

/// Print a bold colored line to stderr, plain when stderr is not a terminal.
pub fn eprint_colored(message: &str, color: Color) {
    if std::io::stderr().is_terminal() {
        eprintln!("{}", message.with(color).bold());
    } else {
        eprintln!("{}", message);
    }
}
