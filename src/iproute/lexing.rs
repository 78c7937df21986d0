//! Lexer
//!
//!     `ip route` prints one route per line, each line a run of whitespace separated
//!     words. The grammar never looks inside a word, so lexing is a single logos pass
//!     that keeps the words and remembers where lines break.
//!
//!     Blank lines survive as empty token lists. Skipping them is the caller's job
//!     (see [table](crate::iproute::table)), which keeps line numbers in error
//!     messages aligned with the source text.

pub mod tokens;

pub use tokens::Token;

use logos::Logos;

/// Splits route table text into one token list per line.
///
/// Leading and trailing blank lines of the whole text are dropped first, the
/// way the command output is stripped before use.
pub fn tokenize(text: &str) -> Vec<Vec<String>> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let mut lines = Vec::new();
    let mut current = Vec::new();
    let mut lexer = Token::lexer(text);

    while let Some(result) = lexer.next() {
        match result {
            Ok(Token::Word) => current.push(lexer.slice().to_string()),
            Ok(Token::Newline) => lines.push(std::mem::take(&mut current)),
            Ok(Token::Whitespace) | Err(_) => {}
        }
    }
    lines.push(current);

    lines
}

/// Tokenizes a single route line. Any embedded line breaks count as whitespace.
pub fn tokenize_line(line: &str) -> Vec<String> {
    tokenize(line).into_iter().flatten().collect()
}
