//! The node sub-parser shared by trait values, metadata values, and
//! build files.

use crate::node::{ArrNode, ErrNode, IdentNode, Kvp, Node, NumNode, ObjNode, StrNode};
use crate::span::Span;
use crate::statement::{ParseError, Severity};
use crate::token::{string_value, TokenKind};

use super::TokenCursor;

/// Tokens a value parse must never consume, so enclosing loops can close
/// their own delimiters and always make progress.
fn is_stop(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::RBrace
            | TokenKind::RBracket
            | TokenKind::RParen
            | TokenKind::Comma
            | TokenKind::Eof
    )
}

/// Parse a single node value. On input that cannot start a value this
/// returns an `Err` node; stop tokens are left for the caller.
pub(crate) fn parse_node(cursor: &mut TokenCursor<'_>, errors: &mut Vec<ParseError>) -> Node {
    let token = cursor.peek();
    match token.kind {
        TokenKind::LBrace => parse_obj(cursor, errors),
        TokenKind::LBracket => parse_arr(cursor, errors),
        TokenKind::Str | TokenKind::TextBlock => {
            cursor.bump();
            Node::Str(StrNode {
                value: string_value(cursor.text(token)),
                span: token.span,
            })
        }
        TokenKind::Number => {
            cursor.bump();
            Node::Num(NumNode {
                value: cursor.text(token).parse().unwrap_or(0.0),
                span: token.span,
            })
        }
        TokenKind::Ident => {
            cursor.bump();
            Node::Ident(IdentNode {
                value: cursor.text(token).to_string(),
                span: token.span,
            })
        }
        kind if is_stop(kind) => {
            errors.push(ParseError {
                message: "expected a value".to_string(),
                span: Span::empty(token.span.start),
                severity: Severity::Error,
            });
            Node::Err(ErrNode {
                message: "expected a value".to_string(),
                span: Span::empty(token.span.start),
            })
        }
        _ => {
            cursor.bump();
            errors.push(ParseError {
                message: "unexpected token in value".to_string(),
                span: token.span,
                severity: Severity::Error,
            });
            Node::Err(ErrNode {
                message: "unexpected token in value".to_string(),
                span: token.span,
            })
        }
    }
}

fn parse_obj(cursor: &mut TokenCursor<'_>, errors: &mut Vec<ParseError>) -> Node {
    let open = cursor.bump();
    let mut kvps = Vec::new();
    let end;
    loop {
        while cursor.eat(TokenKind::Comma).is_some() {}
        let token = cursor.peek();
        match token.kind {
            TokenKind::RBrace => {
                cursor.bump();
                end = token.span.end;
                break;
            }
            TokenKind::Eof => {
                errors.push(ParseError {
                    message: "unclosed object".to_string(),
                    span: Span::empty(token.span.start),
                    severity: Severity::Error,
                });
                end = token.span.start;
                break;
            }
            TokenKind::Str | TokenKind::TextBlock | TokenKind::Ident => {
                cursor.bump();
                let key = StrNode {
                    value: key_text(cursor.text(token), token.kind),
                    span: token.span,
                };
                let value = if cursor.eat(TokenKind::Colon).is_some() {
                    parse_node(cursor, errors)
                } else {
                    errors.push(ParseError {
                        message: "expected ':' after member key".to_string(),
                        span: Span::empty(token.span.end),
                        severity: Severity::Error,
                    });
                    Node::Err(ErrNode {
                        message: "missing value".to_string(),
                        span: Span::empty(token.span.end),
                    })
                };
                let span = key.span.union(value.span());
                kvps.push(Kvp { key, value, span });
            }
            _ => {
                cursor.bump();
                errors.push(ParseError {
                    message: "unexpected token in object".to_string(),
                    span: token.span,
                    severity: Severity::Error,
                });
            }
        }
    }
    Node::Obj(ObjNode {
        kvps,
        span: Span::new(open.span.start, end),
    })
}

fn parse_arr(cursor: &mut TokenCursor<'_>, errors: &mut Vec<ParseError>) -> Node {
    let open = cursor.bump();
    let mut elements = Vec::new();
    let end;
    loop {
        while cursor.eat(TokenKind::Comma).is_some() {}
        let token = cursor.peek();
        match token.kind {
            TokenKind::RBracket => {
                cursor.bump();
                end = token.span.end;
                break;
            }
            TokenKind::Eof => {
                errors.push(ParseError {
                    message: "unclosed array".to_string(),
                    span: Span::empty(token.span.start),
                    severity: Severity::Error,
                });
                end = token.span.start;
                break;
            }
            TokenKind::RBrace | TokenKind::RParen => {
                // the enclosing construct's closer; bail out without it
                errors.push(ParseError {
                    message: "unclosed array".to_string(),
                    span: Span::empty(token.span.start),
                    severity: Severity::Error,
                });
                end = token.span.start;
                break;
            }
            _ => elements.push(parse_node(cursor, errors)),
        }
    }
    Node::Arr(ArrNode {
        elements,
        span: Span::new(open.span.start, end),
    })
}

/// Parse the parenthesized value of a trait application. Key-value sugar
/// (`@http(method: "GET")`) is folded into an object node spanning the
/// parens so cursor descent works inside it.
pub(crate) fn parse_trait_value(
    cursor: &mut TokenCursor<'_>,
    errors: &mut Vec<ParseError>,
) -> (Option<Node>, usize) {
    let open = cursor.bump(); // '('
    if let Some(close) = cursor.eat(TokenKind::RParen) {
        return (None, close.span.end);
    }

    let first = cursor.peek();
    let sugar = matches!(first.kind, TokenKind::Ident | TokenKind::Str)
        && cursor.peek2().kind == TokenKind::Colon;

    let value = if sugar {
        let mut kvps = Vec::new();
        loop {
            while cursor.eat(TokenKind::Comma).is_some() {}
            let token = cursor.peek();
            match token.kind {
                TokenKind::RParen | TokenKind::Eof => break,
                TokenKind::Str | TokenKind::TextBlock | TokenKind::Ident => {
                    cursor.bump();
                    let key = StrNode {
                        value: key_text(cursor.text(token), token.kind),
                        span: token.span,
                    };
                    let value = if cursor.eat(TokenKind::Colon).is_some() {
                        parse_node(cursor, errors)
                    } else {
                        Node::Err(ErrNode {
                            message: "missing value".to_string(),
                            span: Span::empty(token.span.end),
                        })
                    };
                    let span = key.span.union(value.span());
                    kvps.push(Kvp { key, value, span });
                }
                _ => {
                    cursor.bump();
                    errors.push(ParseError {
                        message: "unexpected token in trait value".to_string(),
                        span: token.span,
                        severity: Severity::Error,
                    });
                }
            }
        }
        let end = cursor.peek().span.start;
        Node::Obj(ObjNode {
            kvps,
            span: Span::new(open.span.start, end.max(open.span.end)),
        })
    } else {
        parse_node(cursor, errors)
    };

    let end = match cursor.eat(TokenKind::RParen) {
        Some(close) => close.span.end,
        None => {
            errors.push(ParseError {
                message: "expected ')'".to_string(),
                span: Span::empty(cursor.prev_end()),
                severity: Severity::Error,
            });
            value.span().end
        }
    };

    // widen the sugar object to the closing paren so offsets between the
    // last kvp and ')' still land inside it
    let value = match value {
        Node::Obj(mut obj) if sugar => {
            obj.span.end = end;
            Node::Obj(obj)
        }
        other => other,
    };
    (Some(value), end)
}

fn key_text(raw: &str, kind: TokenKind) -> String {
    match kind {
        TokenKind::Str | TokenKind::TextBlock => string_value(raw),
        _ => raw.to_string(),
    }
}
