//! Tokenizer for canonical filter text
//!
//! Bracketed forms (`<regex>`, `{prefix list}`, `"string"`) are captured
//! as single tokens with their raw bodies; word-shaped tokens are
//! classified by the parser, not here.

use crate::error::{ParseError, Result};
use rpfilter_core::HopOp;
use std::fmt;

/// A lexical token with no classification applied.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    LParen,
    RParen,
    Comma,
    /// `^-`, `^+`, `^n`, `^n-m`
    Hop(HopOp),
    /// The body of a `<...>` AS-path regex
    Regex(String),
    /// The body of a `{...}` prefix list
    List(String),
    /// The body of a quoted string
    Str(String),
    /// A word starting with a letter: keywords, names, calls
    Word(String),
    /// A word starting with a digit: numbers, addresses, communities
    NumWord(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
            Token::Comma => f.write_str(","),
            Token::Hop(op) => write!(f, "{op}"),
            Token::Regex(s) => write!(f, "<{s}>"),
            Token::List(s) => write!(f, "{{{s}}}"),
            Token::Str(s) => write!(f, "\"{s}\""),
            Token::Word(s) | Token::NumWord(s) => f.write_str(s),
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ':' | '.')
}

fn is_numword_char(c: char) -> bool {
    c.is_ascii_hexdigit() || matches!(c, ':' | '.' | '/')
}

/// Tokenize `input`, pairing each token with its byte offset.
pub fn tokenize(input: &str) -> Result<Vec<(Token, usize)>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '(' => tokens.push((Token::LParen, start)),
            ')' => tokens.push((Token::RParen, start)),
            ',' => tokens.push((Token::Comma, start)),
            '<' => {
                let body = take_until(&mut chars, '>')
                    .ok_or(ParseError::Unterminated { what: "AS-path regex", offset: start })?;
                tokens.push((Token::Regex(body.trim().to_string()), start));
            }
            '{' => {
                let body = take_until(&mut chars, '}')
                    .ok_or(ParseError::Unterminated { what: "prefix list", offset: start })?;
                tokens.push((Token::List(body.trim().to_string()), start));
            }
            '"' => {
                let body = take_until(&mut chars, '"')
                    .ok_or(ParseError::Unterminated { what: "string", offset: start })?;
                tokens.push((Token::Str(body), start));
            }
            '^' => tokens.push((Token::Hop(lex_hop_op(&mut chars, start)?), start)),
            c if c.is_ascii_alphabetic() => {
                let mut word = String::new();
                word.push(c);
                while let Some(&(_, c)) = chars.peek() {
                    if is_word_char(c) {
                        word.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push((Token::Word(word), start));
            }
            c if c.is_ascii_digit() => {
                let mut word = String::new();
                word.push(c);
                while let Some(&(_, c)) = chars.peek() {
                    if is_numword_char(c) {
                        word.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push((Token::NumWord(word), start));
            }
            _ => {
                return Err(ParseError::UnexpectedToken {
                    token: c.to_string(),
                    offset: start,
                })
            }
        }
    }

    Ok(tokens)
}

fn take_until(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    close: char,
) -> Option<String> {
    let mut body = String::new();
    for (_, c) in chars.by_ref() {
        if c == close {
            return Some(body);
        }
        body.push(c);
    }
    None
}

fn lex_hop_op(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    start: usize,
) -> Result<HopOp> {
    match chars.peek().map(|&(_, c)| c) {
        Some('-') => {
            chars.next();
            Ok(HopOp::AtLeastOne)
        }
        Some('+') => {
            chars.next();
            Ok(HopOp::ExactlyOne)
        }
        Some(c) if c.is_ascii_digit() => {
            let low = lex_number(chars);
            // `^n-m` only when a digit follows the dash
            let mut lookahead = chars.clone();
            if let (Some((_, '-')), Some((_, d))) = (lookahead.next(), lookahead.next()) {
                if d.is_ascii_digit() {
                    chars.next();
                    let high = lex_number(chars);
                    return Ok(HopOp::between(low, high)?);
                }
            }
            Ok(HopOp::between(low, low)?)
        }
        _ => Err(ParseError::UnexpectedToken {
            token: "^".to_string(),
            offset: start,
        }),
    }
}

fn lex_number(chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>) -> u32 {
    let mut n: u32 = 0;
    while let Some(&(_, c)) = chars.peek() {
        if let Some(d) = c.to_digit(10) {
            n = n.saturating_mul(10).saturating_add(d);
            chars.next();
        } else {
            break;
        }
    }
    n
}
