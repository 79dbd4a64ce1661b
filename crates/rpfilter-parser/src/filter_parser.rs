//! Recursive-descent parser from canonical text to [`FilterExpr`]
//!
//! Precedence, loosest first: OR, EXCEPT, AND, then the prefix operators
//! NOT and `afi`, then postfix hop-count operators. Keywords are
//! case-insensitive; names keep the case they were written in.
//!
//! Word classification follows RPSL reserved name prefixes: `AS<digits>`
//! is an AS number; a name with an `AS-`, `RS-`, `RTRS-` or `FLTR-`
//! component is the corresponding set reference; `attr.method(...)` is an
//! RP-attribute call; an address is a router identity; any other dotted
//! word is a router DNS name.

use crate::error::{ParseError, Result};
use crate::lexer::{tokenize, Token};
use rpfilter_core::{FilterExpr, Item, MpPrefix, MpPrefixRanges, PathRegex, SetName};
use std::net::IpAddr;

/// Parse a canonical filter expression.
pub fn parse(input: &str) -> Result<FilterExpr> {
    FilterParser::new(input)?.parse_filter()
}

/// Filter expression parser
pub struct FilterParser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

impl FilterParser {
    /// Tokenize `input` and prepare a parser over it
    pub fn new(input: &str) -> Result<Self> {
        let tokens = tokenize(input)?;
        Ok(FilterParser { tokens, pos: 0 })
    }

    /// Parse one complete filter; trailing tokens are an error
    pub fn parse_filter(mut self) -> Result<FilterExpr> {
        let expr = self.parse_or()?;
        match self.tokens.get(self.pos) {
            None => Ok(expr),
            Some(&(_, offset)) => Err(ParseError::TrailingInput { offset }),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn advance(&mut self) -> Result<(Token, usize)> {
        let entry = self.tokens.get(self.pos).cloned().ok_or(ParseError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(entry)
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if let Some(Token::Word(w)) = self.peek() {
            if w.eq_ignore_ascii_case(keyword) {
                self.pos += 1;
                return true;
            }
        }
        false
    }

    fn expect_rparen(&mut self) -> Result<()> {
        match self.advance()? {
            (Token::RParen, _) => Ok(()),
            (token, offset) => Err(ParseError::UnexpectedToken {
                token: token.to_string(),
                offset,
            }),
        }
    }

    fn parse_or(&mut self) -> Result<FilterExpr> {
        let mut expr = self.parse_except()?;
        while self.eat_keyword("OR") {
            expr = FilterExpr::or(expr, self.parse_except()?);
        }
        Ok(expr)
    }

    fn parse_except(&mut self) -> Result<FilterExpr> {
        let mut expr = self.parse_and()?;
        while self.eat_keyword("EXCEPT") {
            expr = FilterExpr::except(expr, self.parse_and()?);
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> Result<FilterExpr> {
        let mut expr = self.parse_unary()?;
        while self.eat_keyword("AND") {
            expr = FilterExpr::and(expr, self.parse_unary()?);
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<FilterExpr> {
        if self.eat_keyword("NOT") {
            return Ok(FilterExpr::not(self.parse_unary()?));
        }
        if self.eat_keyword("AFI") {
            let afis = self.parse_afi_list()?;
            let inner = self.parse_unary()?;
            return Ok(FilterExpr::afi(afis, inner));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<FilterExpr> {
        let mut expr = self.parse_primary()?;
        while let Some(Token::Hop(op)) = self.peek() {
            let op = *op;
            self.pos += 1;
            expr = FilterExpr::hops(op, Some(expr));
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<FilterExpr> {
        match self.advance()? {
            (Token::LParen, _) => {
                let expr = self.parse_or()?;
                self.expect_rparen()?;
                Ok(expr)
            }
            // a bare hop operator owns no inner filter
            (Token::Hop(op), _) => Ok(FilterExpr::hops(op, None)),
            (Token::Regex(body), _) => Ok(FilterExpr::AsPath(PathRegex::new(body)?)),
            (Token::List(body), _) => {
                let list: MpPrefixRanges = body.parse()?;
                if list.is_all_v4() {
                    Ok(FilterExpr::Prefixes(list.project_v4()))
                } else {
                    Ok(FilterExpr::MpPrefixes(list))
                }
            }
            (Token::Word(word), offset) => self.word_expr(word, offset),
            (Token::NumWord(word), offset) => match word.parse::<IpAddr>() {
                Ok(addr) => Ok(FilterExpr::Router(MpPrefix::host(addr))),
                Err(_) => Err(ParseError::UnexpectedToken { token: word, offset }),
            },
            (token, offset) => Err(ParseError::UnexpectedToken {
                token: token.to_string(),
                offset,
            }),
        }
    }

    fn word_expr(&mut self, word: String, offset: usize) -> Result<FilterExpr> {
        let upper = word.to_ascii_uppercase();
        match upper.as_str() {
            "ANY" => return Ok(FilterExpr::Any),
            "PEERAS" => return Ok(FilterExpr::PeerAs),
            "HAVE-COMPONENTS" => return self.components_expr(true),
            "EXCLUDE" => return self.components_expr(false),
            _ => {}
        }

        if let Some(digits) = upper.strip_prefix("AS") {
            if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                let asn = digits
                    .parse()
                    .map_err(|_| ParseError::UnexpectedToken { token: word.clone(), offset })?;
                return Ok(FilterExpr::AsNum(asn));
            }
        }

        // reserved name prefixes may sit in any component of a
        // hierarchical name such as AS64500:AS-CUSTOMERS
        for component in upper.split(':') {
            if component.starts_with("AS-") {
                return Ok(FilterExpr::AsSet(SetName::new(word)));
            }
            if component.starts_with("RS-") {
                return Ok(FilterExpr::RouteSet(SetName::new(word)));
            }
            if component.starts_with("RTRS-") {
                return Ok(FilterExpr::RouterSet(SetName::new(word)));
            }
            if component.starts_with("FLTR-") {
                return Ok(FilterExpr::FilterSet(SetName::new(word)));
            }
        }

        if self.peek() == Some(&Token::LParen) {
            if let Some((attr, method)) = word.rsplit_once('.') {
                let (attr, method) = (attr.to_string(), method.to_string());
                let args = self.parse_args()?;
                return Ok(FilterExpr::Call { attr, method, args });
            }
        }

        if let Ok(addr) = word.parse::<IpAddr>() {
            return Ok(FilterExpr::Router(MpPrefix::host(addr)));
        }

        if word.contains('.') {
            return Ok(FilterExpr::RouterName(word));
        }

        Err(ParseError::UnexpectedToken { token: word, offset })
    }

    fn components_expr(&mut self, have: bool) -> Result<FilterExpr> {
        let (token, offset) = self.advance()?;
        let Token::List(body) = token else {
            return Err(ParseError::UnexpectedToken { token: token.to_string(), offset });
        };
        let list: MpPrefixRanges = body.parse()?;
        Ok(match (have, list.is_all_v4()) {
            (true, true) => FilterExpr::HaveComponents(list.project_v4()),
            (false, true) => FilterExpr::ExcludeComponents(list.project_v4()),
            (true, false) => FilterExpr::MpHaveComponents(list),
            (false, false) => FilterExpr::MpExcludeComponents(list),
        })
    }

    fn parse_afi_list(&mut self) -> Result<Vec<rpfilter_core::Afi>> {
        let mut afis = vec![self.parse_afi_token()?];
        while self.peek() == Some(&Token::Comma) {
            self.pos += 1;
            afis.push(self.parse_afi_token()?);
        }
        Ok(afis)
    }

    fn parse_afi_token(&mut self) -> Result<rpfilter_core::Afi> {
        match self.advance()? {
            (Token::Word(w), _) => Ok(w.parse()?),
            (token, offset) => Err(ParseError::UnexpectedToken {
                token: token.to_string(),
                offset,
            }),
        }
    }

    fn parse_args(&mut self) -> Result<Vec<Item>> {
        // caller peeked the '('
        self.pos += 1;
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.parse_item()?);
            if self.peek() == Some(&Token::Comma) {
                self.pos += 1;
                continue;
            }
            break;
        }
        self.expect_rparen()?;
        Ok(args)
    }

    fn parse_item(&mut self) -> Result<Item> {
        match self.advance()? {
            (Token::Str(s), _) => Ok(Item::Str(s)),
            (Token::Word(w), _) => {
                let upper = w.to_ascii_uppercase();
                if let Some(digits) = upper.strip_prefix("AS") {
                    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                        if let Ok(asn) = digits.parse() {
                            return Ok(Item::Asn(asn));
                        }
                    }
                }
                Ok(Item::Word(w))
            }
            (Token::NumWord(w), _) => {
                if w.bytes().all(|b| b.is_ascii_digit()) {
                    if let Ok(n) = w.parse() {
                        return Ok(Item::Int(n));
                    }
                }
                Ok(Item::Word(w))
            }
            (token, offset) => Err(ParseError::UnexpectedToken {
                token: token.to_string(),
                offset,
            }),
        }
    }
}
