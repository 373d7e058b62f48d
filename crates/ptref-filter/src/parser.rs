//! Recursive-descent parser for filter strings.
//!
//! Clause alternatives are attempted in a fixed order -- binary, having,
//! after, method -- and each alternative rewinds the cursor entirely on
//! failure. Whitespace may separate any two tokens, but never splits a
//! word, an operator or the `AFTER(` opener.

use crate::ast::{CompareOp, Filter};
use crate::cursor::Cursor;
use crate::error::ParseError;

/// Characters allowed in a bare word (object names, attributes, values).
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | ':' | '|' | '-')
}

/// Characters allowed inside a parenthesized (bracket) literal.
fn is_bracket_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | ':' | '=' | '.' | '<' | '>' | '|' | ' ' | '-' | ',')
}

/// Characters allowed inside `AFTER(...)` -- as a bracket literal, minus
/// the comma.
fn is_after_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | ':' | '=' | '.' | '<' | '>' | '|' | ' ' | '-')
}

/// Parse a filter string into its clause list.
///
/// Empty or whitespace-only input parses to an empty list.
pub fn parse(input: &str) -> Result<Vec<Filter>, ParseError> {
    let mut parser = Parser { cursor: Cursor::new(input) };

    parser.cursor.skip_whitespace();
    if parser.cursor.is_eof() {
        return Ok(Vec::new());
    }

    let mut filters = Vec::new();
    match parser.clause() {
        Some(filter) => filters.push(filter),
        None => return Err(ParseError::Global(input.to_string())),
    }

    loop {
        let save = parser.cursor.checkpoint();
        parser.cursor.skip_whitespace();
        if !(parser.cursor.eat_str("AND") || parser.cursor.eat_str("and")) {
            parser.cursor.restore(save);
            break;
        }
        match parser.clause() {
            Some(filter) => filters.push(filter),
            None => {
                parser.cursor.restore(save);
                break;
            }
        }
    }

    parser.cursor.skip_whitespace();
    if !parser.cursor.is_eof() {
        return Err(ParseError::Partial(parser.cursor.rest().to_string()));
    }
    Ok(filters)
}

struct Parser<'src> {
    cursor: Cursor<'src>,
}

impl Parser<'_> {
    // ── Clause alternatives ────────────────────────────────────────────

    fn clause(&mut self) -> Option<Filter> {
        let save = self.cursor.checkpoint();
        if let Some(filter) = self.binary_clause() {
            return Some(filter);
        }
        self.cursor.restore(save);
        if let Some(filter) = self.having_clause() {
            return Some(filter);
        }
        self.cursor.restore(save);
        if let Some(filter) = self.after_clause() {
            return Some(filter);
        }
        self.cursor.restore(save);
        if let Some(filter) = self.method_clause() {
            return Some(filter);
        }
        self.cursor.restore(save);
        None
    }

    /// `word.word <op> (word | "escaped" | (bracket))`
    fn binary_clause(&mut self) -> Option<Filter> {
        let object = self.word()?;
        self.expect_char('.')?;
        let attribute = self.word()?;
        let op = self.operator()?;
        let value = self.value()?;
        Some(Filter::Binary { object, attribute, op, value })
    }

    /// `word HAVING (bracket)`
    fn having_clause(&mut self) -> Option<Filter> {
        let object = self.word()?;
        self.cursor.skip_whitespace();
        if !self.cursor.eat_str("HAVING") {
            return None;
        }
        let value = self.bracket_string()?;
        Some(Filter::Having { object, value })
    }

    /// `AFTER(text)` -- the opener is a single token.
    fn after_clause(&mut self) -> Option<Filter> {
        self.cursor.skip_whitespace();
        if !self.cursor.eat_str("AFTER(") {
            return None;
        }
        self.cursor.skip_whitespace();
        let value = self.cursor.eat_while(is_after_char).to_string();
        if value.is_empty() || !self.cursor.eat_char(')') {
            return None;
        }
        Some(Filter::After { value })
    }

    /// `word.word(arg, ...)` -- the argument list may be empty.
    fn method_clause(&mut self) -> Option<Filter> {
        let object = self.word()?;
        self.expect_char('.')?;
        let method = self.word()?;
        self.expect_char('(')?;

        let mut args = Vec::new();
        if let Some(arg) = self.try_argument() {
            args.push(arg);
            loop {
                let save = self.cursor.checkpoint();
                self.cursor.skip_whitespace();
                if !self.cursor.eat_char(',') {
                    self.cursor.restore(save);
                    break;
                }
                match self.try_argument() {
                    Some(arg) => args.push(arg),
                    None => {
                        self.cursor.restore(save);
                        break;
                    }
                }
            }
        }

        self.expect_char(')')?;
        Some(Filter::Method { object, method, args })
    }

    // ── Tokens ─────────────────────────────────────────────────────────

    fn word(&mut self) -> Option<String> {
        self.cursor.skip_whitespace();
        let word = self.cursor.eat_while(is_word_char);
        if word.is_empty() {
            None
        } else {
            Some(word.to_string())
        }
    }

    /// Binary operators, longest match first.
    fn operator(&mut self) -> Option<CompareOp> {
        self.cursor.skip_whitespace();
        if self.cursor.eat_str("<=") {
            Some(CompareOp::Leq)
        } else if self.cursor.eat_str(">=") {
            Some(CompareOp::Geq)
        } else if self.cursor.eat_str("<>") {
            Some(CompareOp::Neq)
        } else if self.cursor.eat_str("<") {
            Some(CompareOp::Lt)
        } else if self.cursor.eat_str(">") {
            Some(CompareOp::Gt)
        } else if self.cursor.eat_str("=") {
            Some(CompareOp::Eq)
        } else if self.cursor.eat_str("DWITHIN") {
            Some(CompareOp::DWithin)
        } else {
            None
        }
    }

    /// `"..."` with backslash escaping any character.
    fn escaped_string(&mut self) -> Option<String> {
        self.cursor.skip_whitespace();
        if !self.cursor.eat_char('"') {
            return None;
        }
        let mut out = String::new();
        loop {
            match self.cursor.advance()? {
                '"' => return Some(out),
                '\\' => out.push(self.cursor.advance()?),
                c => out.push(c),
            }
        }
    }

    /// `(...)` as one opaque literal; commas allowed, parens not.
    fn bracket_string(&mut self) -> Option<String> {
        self.cursor.skip_whitespace();
        if !self.cursor.eat_char('(') {
            return None;
        }
        let value = self.cursor.eat_while(is_bracket_char).to_string();
        if value.is_empty() || !self.cursor.eat_char(')') {
            return None;
        }
        Some(value)
    }

    /// Right-hand side of a binary clause.
    fn value(&mut self) -> Option<String> {
        let save = self.cursor.checkpoint();
        if let Some(value) = self.word() {
            return Some(value);
        }
        self.cursor.restore(save);
        if let Some(value) = self.escaped_string() {
            return Some(value);
        }
        self.cursor.restore(save);
        if let Some(value) = self.bracket_string() {
            return Some(value);
        }
        self.cursor.restore(save);
        None
    }

    /// A method argument, or rewind and yield nothing.
    fn try_argument(&mut self) -> Option<String> {
        let save = self.cursor.checkpoint();
        match self.value() {
            Some(arg) => Some(arg),
            None => {
                self.cursor.restore(save);
                None
            }
        }
    }

    fn expect_char(&mut self, c: char) -> Option<()> {
        self.cursor.skip_whitespace();
        if self.cursor.eat_char(c) {
            Some(())
        } else {
            None
        }
    }
}
