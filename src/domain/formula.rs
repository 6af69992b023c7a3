//! Price formula parser.
//!
//! Recognizes exactly `=PRICES(MARKET,CODE)` and `=PRICES(MARKET,CODE,TENOR)`,
//! case-insensitive on the function name, where every argument is one or more
//! ASCII word characters. No whitespace is tolerated. Text that does not match
//! is simply not a formula, so parsing yields `None` rather than an error.

use std::fmt;

const PREFIX: &str = "=PRICES(";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Formula {
    pub market: String,
    pub code: String,
    pub tenor: Option<String>,
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tenor {
            Some(tenor) => write!(f, "=PRICES({},{},{})", self.market, self.code, tenor),
            None => write!(f, "=PRICES({},{})", self.market, self.code),
        }
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn consume_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn consume_prefix_ignore_case(&mut self, prefix: &str) -> bool {
        match self.remaining().get(..prefix.len()) {
            Some(head) if head.eq_ignore_ascii_case(prefix) => {
                self.pos += prefix.len();
                true
            }
            _ => false,
        }
    }

    fn word(&mut self) -> Option<&'a str> {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if !is_word_char(ch) {
                break;
            }
            self.pos += ch.len_utf8();
        }
        (self.pos > start).then(|| &self.input[start..self.pos])
    }

    fn parse_formula(&mut self) -> Option<Formula> {
        if !self.consume_prefix_ignore_case(PREFIX) {
            return None;
        }
        let market = self.word()?;
        if !self.consume_char(',') {
            return None;
        }
        let code = self.word()?;
        let tenor = if self.consume_char(',') {
            Some(self.word()?)
        } else {
            None
        };
        if !self.consume_char(')') || !self.remaining().is_empty() {
            return None;
        }

        Some(Formula {
            market: market.to_string(),
            code: code.to_string(),
            tenor: tenor.map(str::to_string),
        })
    }
}

/// Parse cell text as a price formula.
pub fn parse(text: &str) -> Option<Formula> {
    Parser::new(text).parse_formula()
}
