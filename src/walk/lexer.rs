use crate::error::{Result, SiphonError};

/// Low-level JSON scanner the walker pulls tokens from.
///
/// Strings are unescaped eagerly; numbers keep their raw source text so a
/// mirrored document reproduces them byte for byte.
pub(crate) struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Lexer {
            src,
            bytes: src.as_bytes(),
            pos: 0,
        }
    }

    pub fn offset(&self) -> usize {
        self.pos
    }

    fn fail(&self, reason: impl Into<String>) -> SiphonError {
        SiphonError::Parse {
            offset: self.pos,
            reason: reason.into(),
        }
    }

    pub fn skip_whitespace(&mut self) {
        while let Some(b) = self.bytes.get(self.pos) {
            match b {
                b' ' | b'\t' | b'\n' | b'\r' => self.pos += 1,
                _ => break,
            }
        }
    }

    /// Peek the next byte without consuming it
    pub fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    /// Consume one byte
    pub fn bump(&mut self) {
        self.pos += 1;
    }

    /// Consume the given punctuation byte or fail
    pub fn expect(&mut self, expected: u8) -> Result<()> {
        match self.peek() {
            Some(b) if b == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(b) => Err(self.fail(format!(
                "expected '{}', found '{}'",
                expected as char, b as char
            ))),
            None => Err(self.fail(format!(
                "expected '{}', found end of input",
                expected as char
            ))),
        }
    }

    /// True once only trailing whitespace remains
    pub fn at_end(&mut self) -> bool {
        self.skip_whitespace();
        self.pos >= self.bytes.len()
    }

    /// Read a JSON string starting at the opening quote, returning the
    /// unescaped value
    pub fn read_string(&mut self) -> Result<String> {
        self.expect(b'"')?;
        let mut out = String::new();
        let mut run_start = self.pos;
        loop {
            let Some(&b) = self.bytes.get(self.pos) else {
                return Err(self.fail("unterminated string"));
            };
            match b {
                b'"' => {
                    out.push_str(&self.src[run_start..self.pos]);
                    self.pos += 1;
                    return Ok(out);
                }
                b'\\' => {
                    out.push_str(&self.src[run_start..self.pos]);
                    self.pos += 1;
                    self.read_escape(&mut out)?;
                    run_start = self.pos;
                }
                0x00..=0x1f => {
                    return Err(self.fail("unescaped control character in string"));
                }
                _ => self.pos += 1,
            }
        }
    }

    fn read_escape(&mut self, out: &mut String) -> Result<()> {
        let Some(&b) = self.bytes.get(self.pos) else {
            return Err(self.fail("unterminated escape sequence"));
        };
        self.pos += 1;
        match b {
            b'"' => out.push('"'),
            b'\\' => out.push('\\'),
            b'/' => out.push('/'),
            b'b' => out.push('\u{0008}'),
            b'f' => out.push('\u{000c}'),
            b'n' => out.push('\n'),
            b'r' => out.push('\r'),
            b't' => out.push('\t'),
            b'u' => {
                let first = self.read_hex4()?;
                let code = if (0xd800..=0xdbff).contains(&first) {
                    // high surrogate, a low surrogate escape must follow
                    if self.bytes.get(self.pos) != Some(&b'\\')
                        || self.bytes.get(self.pos + 1) != Some(&b'u')
                    {
                        return Err(self.fail("unpaired surrogate in string"));
                    }
                    self.pos += 2;
                    let second = self.read_hex4()?;
                    if !(0xdc00..=0xdfff).contains(&second) {
                        return Err(self.fail("invalid low surrogate in string"));
                    }
                    0x10000 + ((first - 0xd800) << 10) + (second - 0xdc00)
                } else if (0xdc00..=0xdfff).contains(&first) {
                    return Err(self.fail("unpaired surrogate in string"));
                } else {
                    first
                };
                match char::from_u32(code) {
                    Some(c) => out.push(c),
                    None => return Err(self.fail("invalid unicode escape")),
                }
            }
            _ => return Err(self.fail(format!("invalid escape character '{}'", b as char))),
        }
        Ok(())
    }

    fn read_hex4(&mut self) -> Result<u32> {
        let end = self.pos + 4;
        let Some(hex) = self.src.get(self.pos..end) else {
            return Err(self.fail("truncated unicode escape"));
        };
        let value = u32::from_str_radix(hex, 16)
            .map_err(|_| self.fail("invalid hex digits in unicode escape"))?;
        self.pos = end;
        Ok(value)
    }

    /// Read a number, returning its raw source text
    pub fn read_number(&mut self) -> Result<String> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        if self.digit_run() == 0 {
            return Err(self.fail("invalid number"));
        }
        if self.peek() == Some(b'.') {
            self.pos += 1;
            if self.digit_run() == 0 {
                return Err(self.fail("expected digits after decimal point"));
            }
        }
        if matches!(self.peek(), Some(b'e') | Some(b'E')) {
            self.pos += 1;
            if matches!(self.peek(), Some(b'+') | Some(b'-')) {
                self.pos += 1;
            }
            if self.digit_run() == 0 {
                return Err(self.fail("expected digits in exponent"));
            }
        }
        Ok(self.src[start..self.pos].to_string())
    }

    fn digit_run(&mut self) -> usize {
        let start = self.pos;
        while matches!(self.bytes.get(self.pos), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        self.pos - start
    }

    /// Consume a literal keyword (`true`, `false`, `null`)
    pub fn read_keyword(&mut self, keyword: &str) -> Result<()> {
        let end = self.pos + keyword.len();
        if self.src.get(self.pos..end) == Some(keyword) {
            self.pos = end;
            Ok(())
        } else {
            Err(self.fail(format!("expected '{keyword}'")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_string() {
        let mut lexer = Lexer::new(r#""hello""#);
        assert_eq!(lexer.read_string().unwrap(), "hello");
        assert!(lexer.at_end());
    }

    #[test]
    fn test_escapes() {
        let mut lexer = Lexer::new(r#""a\"b\\c\ndA""#);
        assert_eq!(lexer.read_string().unwrap(), "a\"b\\c\nd\u{0041}");
    }

    #[test]
    fn test_surrogate_pair() {
        let mut lexer = Lexer::new(r#""\ud83d\ude00""#);
        assert_eq!(lexer.read_string().unwrap(), "\u{1f600}");
    }

    #[test]
    fn test_raw_multibyte_passthrough() {
        let mut lexer = Lexer::new("\"héllo\"");
        assert_eq!(lexer.read_string().unwrap(), "héllo");
    }

    #[test]
    fn test_unpaired_surrogate_fails() {
        let mut lexer = Lexer::new(r#""\ud83d""#);
        assert!(lexer.read_string().is_err());
    }

    #[test]
    fn test_unterminated_string_fails() {
        let mut lexer = Lexer::new(r#""abc"#);
        assert!(lexer.read_string().is_err());
    }

    #[test]
    fn test_numbers_keep_raw_text() {
        for raw in ["0", "-1", "3.14", "1e10", "2.5E-3", "1000"] {
            let mut lexer = Lexer::new(raw);
            assert_eq!(lexer.read_number().unwrap(), raw);
        }
    }

    #[test]
    fn test_invalid_number_fails() {
        for raw in ["-", "1.", "1e", "."] {
            let mut lexer = Lexer::new(raw);
            assert!(lexer.read_number().is_err(), "accepted {raw}");
        }
    }

    #[test]
    fn test_keyword() {
        let mut lexer = Lexer::new("true");
        assert!(lexer.read_keyword("true").is_ok());
        let mut lexer = Lexer::new("tru");
        assert!(lexer.read_keyword("true").is_err());
    }
}
