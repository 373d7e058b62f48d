//! Byte-level source cursor for the filter parser.
//!
//! Unlike a plain forward iterator, the cursor exposes a checkpoint /
//! restore pair: clause alternatives are tried in order and a failed
//! alternative rewinds wholesale. Positions are byte offsets into the
//! UTF-8 source.

/// A rewindable position in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

pub struct Cursor<'src> {
    source: &'src str,
    pos: usize,
}

impl<'src> Cursor<'src> {
    pub fn new(source: &'src str) -> Self {
        Cursor { source, pos: 0 }
    }

    /// Look at the current character without consuming it.
    pub fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    /// Consume the current character.
    pub fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Consume `c` if it is the current character.
    pub fn eat_char(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    /// Consume `s` if the remaining input starts with it.
    pub fn eat_str(&mut self, s: &str) -> bool {
        if self.source[self.pos..].starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    /// Consume characters while `predicate` holds, returning the slice.
    pub fn eat_while(&mut self, predicate: impl Fn(char) -> bool) -> &'src str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if predicate(c) {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        &self.source[start..self.pos]
    }

    /// Skip ASCII whitespace between tokens.
    pub fn skip_whitespace(&mut self) {
        self.eat_while(|c| c.is_whitespace());
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// The unconsumed remainder of the input.
    pub fn rest(&self) -> &'src str {
        &self.source[self.pos..]
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.pos)
    }

    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.pos = checkpoint.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eat_str_consumes_only_on_match() {
        let mut cursor = Cursor::new("DWITHIN(1,2,3)");
        assert!(!cursor.eat_str("HAVING"));
        assert!(cursor.eat_str("DWITHIN"));
        assert_eq!(cursor.rest(), "(1,2,3)");
    }

    #[test]
    fn checkpoint_rewinds() {
        let mut cursor = Cursor::new("abc");
        let start = cursor.checkpoint();
        cursor.advance();
        cursor.advance();
        assert_eq!(cursor.rest(), "c");
        cursor.restore(start);
        assert_eq!(cursor.rest(), "abc");
    }

    #[test]
    fn eat_while_returns_slice() {
        let mut cursor = Cursor::new("abc123 rest");
        let taken = cursor.eat_while(|c| c.is_alphanumeric());
        assert_eq!(taken, "abc123");
        cursor.skip_whitespace();
        assert_eq!(cursor.rest(), "rest");
    }

    #[test]
    fn multibyte_positions() {
        let mut cursor = Cursor::new("gare Saint-Lazare \u{00e9}");
        cursor.eat_while(|c| c != '\u{00e9}');
        assert_eq!(cursor.advance(), Some('\u{00e9}'));
        assert!(cursor.is_eof());
    }
}
