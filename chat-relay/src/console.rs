//! Operator console output. Lines are written over the pending `> ` prompt and the prompt is
//! redrawn afterwards, so notices from background tasks do not garble the input line.

use std::io::{self, Write};

pub const PROMPT: &str = "> ";

/// Prints `line` on its own row and redraws the prompt.
pub fn notice(line: &str) {
    let mut stdout = io::stdout().lock();
    let _ = write!(stdout, "\r{}\n{}", line, PROMPT);
    let _ = stdout.flush();
}

/// Prints the prompt without a newline.
pub fn prompt() {
    let mut stdout = io::stdout().lock();
    let _ = write!(stdout, "\n{}", PROMPT);
    let _ = stdout.flush();
}
