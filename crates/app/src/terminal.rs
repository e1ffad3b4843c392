use std::io::{self, BufRead, Write};

use services::LineInput;
use tracing::warn;

/// Reads answers and menu choices from standard input.
#[derive(Debug, Default)]
pub struct StdinInput;

impl LineInput for StdinInput {
    fn read_line(&mut self, prompt: &str) -> Option<String> {
        if !prompt.is_empty() {
            let mut out = io::stdout().lock();
            let _ = out.write_all(prompt.as_bytes());
            let _ = out.flush();
        }

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(trim_newline(line)),
            Err(err) => {
                warn!(%err, "failed to read from stdin");
                None
            }
        }
    }
}

fn trim_newline(mut line: String) -> String {
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_line_endings_only() {
        assert_eq!(trim_newline("  a, c \r\n".to_string()), "  a, c ");
        assert_eq!(trim_newline("END\n".to_string()), "END");
        assert_eq!(trim_newline(String::new()), "");
    }
}
