//! Logos-based lexer for Java type-reference text
//!
//! Tokenizes the raw type text a front end hands us (`Map<String, List<Order>>`,
//! `Outer.Inner[]`, `? extends Number`) so the reference parser can work on tokens
//! instead of string slicing.

use logos::Logos;

/// A token with its kind, text, and byte offset into the original text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub offset: usize,
}

impl Token<'_> {
    /// Byte offset one past the end of this token.
    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }
}

/// Token kinds produced by [`Lexer`]. `Error` covers any unrecognized input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Extends,
    Super,
    Dot,
    Ellipsis,
    Lt,
    Gt,
    Comma,
    LBracket,
    RBracket,
    Question,
    Amp,
    Pipe,
    At,
    LParen,
    RParen,
    Error,
}

/// Lexer wrapping the logos-generated tokenizer. Whitespace is skipped.
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, LogosToken>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            inner: LogosToken::lexer(input),
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let logos_token = self.inner.next()?;
        let text = self.inner.slice();
        let offset = self.inner.span().start;

        let kind = match logos_token {
            Ok(t) => t.into(),
            Err(()) => TokenKind::Error,
        };

        Some(Token { kind, text, offset })
    }
}

/// Tokenize an entire string into a Vec
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    Lexer::new(input).collect()
}

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
enum LogosToken {
    #[token("extends")]
    Extends,

    #[token("super")]
    Super,

    #[regex(r"[\p{XID_Start}_$][\p{XID_Continue}$]*")]
    Ident,

    #[token("...")]
    Ellipsis,

    #[token(".")]
    Dot,

    #[token("<")]
    Lt,

    #[token(">")]
    Gt,

    #[token(",")]
    Comma,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("?")]
    Question,

    #[token("&")]
    Amp,

    #[token("|")]
    Pipe,

    #[token("@")]
    At,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,
}

impl From<LogosToken> for TokenKind {
    fn from(token: LogosToken) -> Self {
        match token {
            LogosToken::Extends => TokenKind::Extends,
            LogosToken::Super => TokenKind::Super,
            LogosToken::Ident => TokenKind::Ident,
            LogosToken::Ellipsis => TokenKind::Ellipsis,
            LogosToken::Dot => TokenKind::Dot,
            LogosToken::Lt => TokenKind::Lt,
            LogosToken::Gt => TokenKind::Gt,
            LogosToken::Comma => TokenKind::Comma,
            LogosToken::LBracket => TokenKind::LBracket,
            LogosToken::RBracket => TokenKind::RBracket,
            LogosToken::Question => TokenKind::Question,
            LogosToken::Amp => TokenKind::Amp,
            LogosToken::Pipe => TokenKind::Pipe,
            LogosToken::At => TokenKind::At,
            LogosToken::LParen => TokenKind::LParen,
            LogosToken::RParen => TokenKind::RParen,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_generic_tokens() {
        assert_eq!(
            kinds("Map<String, List<Order>>"),
            vec![
                TokenKind::Ident,
                TokenKind::Lt,
                TokenKind::Ident,
                TokenKind::Comma,
                TokenKind::Ident,
                TokenKind::Lt,
                TokenKind::Ident,
                TokenKind::Gt,
                TokenKind::Gt,
            ]
        );
    }

    #[test]
    fn test_keywords_vs_identifiers() {
        assert_eq!(
            kinds("? extends Number"),
            vec![TokenKind::Question, TokenKind::Extends, TokenKind::Ident]
        );
        assert_eq!(kinds("extendsFoo"), vec![TokenKind::Ident]);
    }

    #[test]
    fn test_offsets_skip_whitespace() {
        let tokens = tokenize("a . b");
        assert_eq!(tokens[2].offset, 4);
        assert_eq!(tokens[2].end(), 5);
    }

    #[test]
    fn test_unrecognized_input_is_error() {
        assert_eq!(kinds("#"), vec![TokenKind::Error]);
    }
}
