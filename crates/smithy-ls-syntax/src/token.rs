//! Tokenizer shared by the IDL and JSON-with-comments parsers.
//!
//! The scanner is a single linear pass over the bytes of a document.
//! Whitespace is skipped but never lost: every token carries the exact
//! byte span it covered, so downstream position queries stay precise.
//! Identifiers absorb `.`, `#`, and `$` so a fully-qualified shape id
//! like `com.example#Shape$member` is one token.

use crate::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier, keyword, or shape id (absolute ids are one token).
    Ident,
    /// Quoted string, without surrounding quotes decoded yet.
    Str,
    /// Triple-quoted text block.
    TextBlock,
    Number,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Colon,
    /// `:=`, introducing an inline operation input/output structure.
    Walrus,
    Equals,
    Comma,
    At,
    Dollar,
    /// `//` comment (doc comments are [`TokenKind::DocComment`]).
    Comment,
    /// `///` documentation comment.
    DocComment,
    /// A byte the scanner could not start a token from.
    Error,
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.start.min(source.len())..self.span.end.min(source.len())]
    }
}

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_ident_continue(c: u8) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, b'_' | b'.' | b'#' | b'$')
}

/// Tokenize `source` completely. The trailing element is always `Eof`.
pub fn tokenize(source: &str) -> Vec<Token> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos];
        if c.is_ascii_whitespace() {
            pos += 1;
            continue;
        }
        let start = pos;
        let kind = match c {
            b'{' => single(&mut pos, TokenKind::LBrace),
            b'}' => single(&mut pos, TokenKind::RBrace),
            b'[' => single(&mut pos, TokenKind::LBracket),
            b']' => single(&mut pos, TokenKind::RBracket),
            b'(' => single(&mut pos, TokenKind::LParen),
            b')' => single(&mut pos, TokenKind::RParen),
            b',' => single(&mut pos, TokenKind::Comma),
            b'@' => single(&mut pos, TokenKind::At),
            b'$' => single(&mut pos, TokenKind::Dollar),
            b'=' => single(&mut pos, TokenKind::Equals),
            b':' => {
                if bytes.get(pos + 1) == Some(&b'=') {
                    pos += 2;
                    TokenKind::Walrus
                } else {
                    pos += 1;
                    TokenKind::Colon
                }
            }
            b'/' if bytes.get(pos + 1) == Some(&b'/') => {
                let doc = bytes.get(pos + 2) == Some(&b'/');
                while pos < bytes.len() && bytes[pos] != b'\n' {
                    pos += 1;
                }
                if doc {
                    TokenKind::DocComment
                } else {
                    TokenKind::Comment
                }
            }
            b'"' => scan_string(bytes, &mut pos),
            b'-' | b'0'..=b'9' => scan_number(bytes, &mut pos),
            c if is_ident_start(c) => {
                while pos < bytes.len() && is_ident_continue(bytes[pos]) {
                    pos += 1;
                }
                TokenKind::Ident
            }
            _ => {
                // skip the whole UTF-8 scalar, not just one byte
                let width = source[pos..].chars().next().map_or(1, char::len_utf8);
                pos += width;
                TokenKind::Error
            }
        };
        tokens.push(Token {
            kind,
            span: Span::new(start, pos),
        });
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span::empty(bytes.len()),
    });
    tokens
}

fn single(pos: &mut usize, kind: TokenKind) -> TokenKind {
    *pos += 1;
    kind
}

fn scan_string(bytes: &[u8], pos: &mut usize) -> TokenKind {
    if bytes[*pos..].starts_with(b"\"\"\"") {
        *pos += 3;
        while *pos < bytes.len() {
            if bytes[*pos..].starts_with(b"\"\"\"") {
                *pos += 3;
                return TokenKind::TextBlock;
            }
            *pos += 1;
        }
        return TokenKind::TextBlock; // unterminated; runs to EOF
    }
    *pos += 1;
    while *pos < bytes.len() {
        match bytes[*pos] {
            b'"' => {
                *pos += 1;
                return TokenKind::Str;
            }
            b'\\' => *pos += 2.min(bytes.len() - *pos),
            b'\n' => return TokenKind::Str, // unterminated; stop at line end
            _ => *pos += 1,
        }
    }
    TokenKind::Str
}

fn scan_number(bytes: &[u8], pos: &mut usize) -> TokenKind {
    if bytes[*pos] == b'-' {
        *pos += 1;
        if !bytes.get(*pos).is_some_and(u8::is_ascii_digit) {
            return TokenKind::Error;
        }
    }
    while bytes.get(*pos).is_some_and(u8::is_ascii_digit) {
        *pos += 1;
    }
    if bytes.get(*pos) == Some(&b'.') && bytes.get(*pos + 1).is_some_and(u8::is_ascii_digit) {
        *pos += 1;
        while bytes.get(*pos).is_some_and(u8::is_ascii_digit) {
            *pos += 1;
        }
    }
    if matches!(bytes.get(*pos), Some(b'e' | b'E')) {
        let mut lookahead = *pos + 1;
        if matches!(bytes.get(lookahead), Some(b'+' | b'-')) {
            lookahead += 1;
        }
        if bytes.get(lookahead).is_some_and(u8::is_ascii_digit) {
            *pos = lookahead;
            while bytes.get(*pos).is_some_and(u8::is_ascii_digit) {
                *pos += 1;
            }
        }
    }
    TokenKind::Number
}

/// Decode the value of a string token: strip quotes and process the
/// escape sequences the IDL shares with JSON.
pub fn string_value(raw: &str) -> String {
    let inner = if let Some(stripped) = raw
        .strip_prefix("\"\"\"")
        .and_then(|s| s.strip_suffix("\"\"\""))
    {
        // text blocks keep their interior verbatim, minus the leading newline
        return stripped.strip_prefix('\n').unwrap_or(stripped).to_string();
    } else {
        raw.strip_prefix('"')
            .map(|s| s.strip_suffix('"').unwrap_or(s))
            .unwrap_or(raw)
    };

    if !inner.contains('\\') {
        return inner.to_string();
    }
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn shape_id_is_one_token() {
        let tokens = tokenize("com.example#Shape$member");
        assert_eq!(tokens[0].kind, TokenKind::Ident);
        assert_eq!(tokens[0].span, Span::new(0, 24));
    }

    #[test]
    fn control_statement_tokens() {
        assert_eq!(
            kinds("$version: \"2.0\""),
            vec![
                TokenKind::Dollar,
                TokenKind::Ident,
                TokenKind::Colon,
                TokenKind::Str,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn walrus_vs_colon() {
        assert_eq!(
            kinds("input := {}"),
            vec![
                TokenKind::Ident,
                TokenKind::Walrus,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn comments_are_kept_with_spans() {
        let tokens = tokenize("// plain\n/// doc\nfoo");
        assert_eq!(tokens[0].kind, TokenKind::Comment);
        assert_eq!(tokens[1].kind, TokenKind::DocComment);
        assert_eq!(tokens[2].kind, TokenKind::Ident);
        assert_eq!(tokens[2].span, Span::new(17, 20));
    }

    #[test]
    fn token_spans_cover_text_in_order() {
        let source = "metadata k = [1, -2.5e3] // tail";
        let tokens = tokenize(source);
        let mut last = 0;
        for token in &tokens {
            assert!(token.span.start >= last);
            last = token.span.end;
        }
        assert_eq!(last, source.len());
    }

    #[test]
    fn tokens_plus_trivia_reproduce_the_source() {
        let source = "$version: \"2\"  // trailing\nnamespace com.a\n\nstructure S {\n    a: String\n}\n";
        let tokens = tokenize(source);
        let mut rebuilt = String::new();
        let mut last = 0;
        for token in &tokens {
            rebuilt.push_str(&source[last..token.span.start]);
            rebuilt.push_str(token.text(source));
            last = token.span.end;
        }
        rebuilt.push_str(&source[last..]);
        assert_eq!(rebuilt, source);
    }

    #[test]
    fn unterminated_string_stops_at_line_end() {
        let tokens = tokenize("\"open\nnext");
        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(tokens[0].span, Span::new(0, 5));
        assert_eq!(tokens[1].kind, TokenKind::Ident);
    }

    #[test]
    fn string_value_decodes_escapes() {
        assert_eq!(string_value(r#""a\nbA""#), "a\nbA");
        assert_eq!(string_value("\"\"\"\nblock\"\"\""), "block");
    }
}
