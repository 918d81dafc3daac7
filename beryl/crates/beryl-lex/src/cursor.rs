//! Character cursor for traversing source code.
//!
//! The cursor maintains a byte position plus the 0-based line/column of that
//! position. Lookahead is byte-offset based with an ASCII fast path; a
//! lookahead that lands inside a multi-byte sequence yields `'\0'`, the
//! same sentinel used for end-of-input.

/// A cursor over source text
pub struct Cursor<'a> {
    /// The source text being traversed
    source: &'a str,

    /// Current byte position in the source
    position: usize,

    /// Current line number (0-based)
    line: usize,

    /// Current column number (0-based)
    column: usize,
}

impl<'a> Cursor<'a> {
    /// Create a cursor at the start of `source`
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            position: 0,
            line: 0,
            column: 0,
        }
    }

    /// The full source text
    #[inline]
    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Current byte position
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Current line (0-based)
    #[inline]
    pub fn line(&self) -> usize {
        self.line
    }

    /// Current column (0-based)
    #[inline]
    pub fn column(&self) -> usize {
        self.column
    }

    /// True once the cursor has passed the last byte
    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.position >= self.source.len()
    }

    /// The character at the cursor, or `'\0'` at end of input
    #[inline]
    pub fn current_char(&self) -> char {
        self.char_at(0)
    }

    /// The character `offset` bytes past the cursor
    ///
    /// Returns `'\0'` past the end of input or when the offset lands inside
    /// a multi-byte sequence.
    #[inline]
    pub fn char_at(&self, offset: usize) -> char {
        let pos = self.position + offset;
        if pos >= self.source.len() {
            return '\0';
        }

        // Fast path for ASCII (most common case)
        let b = self.source.as_bytes()[pos];
        if b < 128 {
            return b as char;
        }

        match self.source.get(pos..) {
            Some(rest) => rest.chars().next().unwrap_or('\0'),
            None => '\0',
        }
    }

    /// The character one byte past the cursor
    #[inline]
    pub fn peek(&self) -> char {
        self.char_at(1)
    }

    /// Advance past the current character, updating line/column
    pub fn advance(&mut self) {
        let c = self.current_char();
        if c == '\0' && self.is_at_end() {
            return;
        }
        self.position += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
    }

    /// Advance `count` characters
    pub fn advance_by(&mut self, count: usize) {
        for _ in 0..count {
            self.advance();
        }
    }

    /// Advance the cursor to an absolute byte position
    ///
    /// Used after a heredoc body has been consumed out-of-band: the cursor
    /// jumps over text it never walked, so the line counter is updated from
    /// the skipped bytes.
    pub fn advance_to(&mut self, position: usize) {
        while self.position < position && !self.is_at_end() {
            self.advance();
        }
    }

    /// The source text from `start` up to the current position
    #[inline]
    pub fn slice_from(&self, start: usize) -> &'a str {
        &self.source[start..self.position]
    }

    /// Consume `word` if it appears at the cursor and is not directly
    /// followed by an identifier character or a `?`/`!` message suffix
    pub fn match_keyword(&mut self, word: &str) -> bool {
        let end = self.position + word.len();
        if end > self.source.len() {
            return false;
        }
        if &self.source.as_bytes()[self.position..end] != word.as_bytes() {
            return false;
        }
        if let Some(next) = self.source.as_bytes().get(end) {
            let next = *next as char;
            if next.is_ascii_alphanumeric() || next == '_' || next == '?' || next == '!' {
                return false;
            }
        }
        self.advance_by(word.chars().count());
        true
    }
}
