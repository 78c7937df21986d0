//! Token definitions for route table text
//!
//! Route lines only distinguish words from the whitespace between them, so the
//! token set is tiny. Line breaks get their own token because each line is one
//! route.
use logos::Logos;

/// All possible tokens in `ip route` output
#[derive(Logos, Debug, PartialEq, Eq, Clone, Copy)]
pub enum Token {
    // Any run of non-whitespace: keywords, addresses, prefixes, interface names
    #[regex(r"[^ \t\r\f\n]+")]
    Word,

    // Whitespace inside a line (ip pads clauses with double spaces)
    #[regex(r"[ \t\r\f]+")]
    Whitespace,

    // Line breaks
    #[token("\n")]
    Newline,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        Token::lexer(source).filter_map(|result| result.ok()).collect()
    }

    #[test]
    fn test_route_line_tokens() {
        assert_eq!(
            kinds("10.0.0.0/8 dev  eth0"),
            vec![
                Token::Word,
                Token::Whitespace,
                Token::Word,
                Token::Whitespace,
                Token::Word
            ]
        );
    }

    #[test]
    fn test_newline_is_separate_from_whitespace() {
        assert_eq!(
            kinds("a \nb"),
            vec![Token::Word, Token::Whitespace, Token::Newline, Token::Word]
        );
    }

    #[test]
    fn test_ipv6_and_punctuation_stay_in_one_word() {
        let mut lexer = Token::lexer("fe80::1%eth0/64");
        assert_eq!(lexer.next(), Some(Ok(Token::Word)));
        assert_eq!(lexer.slice(), "fe80::1%eth0/64");
        assert_eq!(lexer.next(), None);
    }
}
