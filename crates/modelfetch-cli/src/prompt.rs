//! Console prompt plumbing.
//!
//! Reads free-text lines from any `BufRead` so the session logic can be
//! driven by scripted input in tests.

use std::io::{self, BufRead, Write};

pub struct Console<R> {
    input: R,
}

impl<R: BufRead> Console<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }

    /// Print `prompt` and read one trimmed line.
    ///
    /// Returns `None` on end-of-input, which callers treat as cancellation.
    pub fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        print!("{prompt}");
        io::stdout().flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_ask_trims_input() {
        let mut console = Console::new(Cursor::new("  hello  \n"));
        assert_eq!(console.ask("> ").unwrap(), Some("hello".to_string()));
    }

    #[test]
    fn test_ask_empty_line_is_empty_string() {
        let mut console = Console::new(Cursor::new("\n"));
        assert_eq!(console.ask("> ").unwrap(), Some(String::new()));
    }

    #[test]
    fn test_ask_eof_is_none() {
        let mut console = Console::new(Cursor::new(""));
        assert_eq!(console.ask("> ").unwrap(), None);
    }

    #[test]
    fn test_ask_sequential_lines() {
        let mut console = Console::new(Cursor::new("one\ntwo\n"));
        assert_eq!(console.ask("> ").unwrap(), Some("one".to_string()));
        assert_eq!(console.ask("> ").unwrap(), Some("two".to_string()));
        assert_eq!(console.ask("> ").unwrap(), None);
    }
}
