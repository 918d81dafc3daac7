//! Numeric literal lexing.
//!
//! Supported forms: decimal, `0d`/`0D` forced decimal, `0o`/`0O` octal,
//! `0x`/`0X` hex, `0b`/`0B` binary, and floats via a `.` followed by a
//! digit. Underscores between digits are ignored. The caller checks for a
//! trailing alphabetic character and turns the result into an invalid
//! token (`123abc` is not a number followed by a name).

use crate::token::Token;
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lex a numeric literal; the cursor sits on the first digit
    pub(crate) fn consume_numeric(&mut self, negative: bool) -> Token {
        let start_index = self.cursor.position();

        if self.cursor.current_char() == '0' {
            match self.cursor.peek() {
                'd' | 'D' => {
                    self.cursor.advance_by(2);
                    return self.consume_integer_in_base(10, negative);
                },
                'o' | 'O' => {
                    self.cursor.advance_by(2);
                    return self.consume_integer_in_base(8, negative);
                },
                'x' | 'X' => {
                    self.cursor.advance_by(2);
                    return self.consume_integer_in_base(16, negative);
                },
                'b' | 'B' => {
                    self.cursor.advance_by(2);
                    return self.consume_integer_in_base(2, negative);
                },
                _ => {},
            }
        }

        let mut number: i64 = 0;
        let mut c = self.cursor.current_char();
        loop {
            number = number
                .wrapping_mul(10)
                .wrapping_add((c as u8 - b'0') as i64);
            self.cursor.advance();
            c = self.cursor.current_char();
            if c == '_' {
                self.cursor.advance();
                c = self.cursor.current_char();
            }
            if !c.is_ascii_digit() {
                break;
            }
        }

        if c == '.' && self.cursor.peek().is_ascii_digit() {
            self.cursor.advance();
            while self.cursor.current_char().is_ascii_digit() {
                self.cursor.advance();
            }
            let text: String = self
                .cursor
                .slice_from(start_index)
                .chars()
                .filter(|&c| c != '_')
                .collect();
            let mut value = text.parse::<f64>().unwrap_or(0.0);
            if negative {
                value = -value;
            }
            Token::with_float(value, self.file.clone(), self.token_line, self.token_column)
        } else {
            if negative {
                number = number.wrapping_neg();
            }
            Token::with_integer(number, self.file.clone(), self.token_line, self.token_column)
        }
    }

    /// Lex the digits of a prefixed integer literal (`0x…`, `0b…`, …)
    fn consume_integer_in_base(&mut self, base: u32, negative: bool) -> Token {
        let mut c = self.cursor.current_char();
        if !c.is_digit(base) {
            return self.invalid_token(c.to_string());
        }
        let mut number: i64 = 0;
        loop {
            let digit = c.to_digit(base).unwrap_or(0) as i64;
            number = number.wrapping_mul(base as i64).wrapping_add(digit);
            self.cursor.advance();
            c = self.cursor.current_char();
            if c == '_' {
                self.cursor.advance();
                c = self.cursor.current_char();
            }
            if !c.is_digit(base) {
                break;
            }
        }
        if negative {
            number = number.wrapping_neg();
        }
        Token::with_integer(number, self.file.clone(), self.token_line, self.token_column)
    }
}
