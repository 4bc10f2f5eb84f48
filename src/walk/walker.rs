use crate::error::Result;
use crate::walk::lexer::Lexer;
use std::fmt;

/// One step on the structural path from the document root to a value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(idx) => write!(f, "{idx}"),
        }
    }
}

/// Render a segment sequence as a dotted path, e.g. `items.3.title`
pub fn render_path(segments: &[PathSegment]) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            out.push('.');
        }
        match segment {
            PathSegment::Key(key) => out.push_str(key),
            PathSegment::Index(idx) => out.push_str(&idx.to_string()),
        }
    }
    out
}

/// A single value token produced by the walker
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Unescaped string value
    String(String),
    /// Number kept as raw source text
    Number(String),
    Bool(bool),
    Null,
    ObjectOpen,
    ObjectClose,
    ArrayOpen,
    ArrayClose,
}

impl Token {
    pub fn is_string(&self) -> bool {
        matches!(self, Token::String(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Token::String(value) => Some(value),
            _ => None,
        }
    }

    /// Integer view of a number token, None for anything else
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Token::Number(raw) => raw.parse().ok(),
            _ => None,
        }
    }
}

/// One traversal event: where we are, what key got us here, and the value
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Structural path as a segment sequence; open/close events carry the
    /// container's own path
    pub segments: Vec<PathSegment>,
    /// Dotted rendering of `segments`
    pub path: String,
    /// Object key of this value; None for array elements, the document
    /// root and close tokens
    pub key: Option<String>,
    pub token: Token,
}

#[derive(Debug, Clone, Copy)]
enum Frame {
    Object,
    Array(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    /// Expecting a value (document root, after a key, after an array comma)
    Value,
    /// Just after `{`: `}` or the first member
    FirstMember,
    /// After a value inside an object: `,` or `}`
    NextMember,
    /// Just after `[`: `]` or the first element
    FirstElement,
    /// After a value inside an array: `,` or `]`
    NextElement,
    /// Root value finished; only trailing whitespace is allowed
    End,
    Done,
}

/// Streaming JSON walker.
///
/// Yields one [`Event`] per token in document order (pre-order, depth
/// first), tracking the structural path as it goes. Object key order is
/// reported exactly as it appears in the input. The first malformed byte
/// ends the stream with a single `Err` event; nothing is yielded after
/// that.
pub struct Walker<'a> {
    lexer: Lexer<'a>,
    stack: Vec<Frame>,
    segments: Vec<PathSegment>,
    mode: Mode,
    pending_key: Option<String>,
}

impl<'a> Walker<'a> {
    pub fn new(input: &'a str) -> Self {
        Walker {
            lexer: Lexer::new(input),
            stack: Vec::new(),
            segments: Vec::new(),
            mode: Mode::Value,
            pending_key: None,
        }
    }

    fn event(&mut self, token: Token) -> Event {
        Event {
            segments: self.segments.clone(),
            path: render_path(&self.segments),
            key: self.pending_key.take(),
            token,
        }
    }

    /// Mode to resume once the current value is complete
    fn resume_mode(&self) -> Mode {
        match self.stack.last() {
            None => Mode::End,
            Some(Frame::Object) => Mode::NextMember,
            Some(Frame::Array(_)) => Mode::NextElement,
        }
    }

    /// Drop the path segment that addressed the value just completed. The
    /// root value has no segment of its own.
    fn pop_value_segment(&mut self) {
        if !self.stack.is_empty() {
            self.segments.pop();
        }
    }

    fn parse_value(&mut self) -> Result<Event> {
        self.lexer.skip_whitespace();
        match self.lexer.peek() {
            Some(b'{') => {
                self.lexer.bump();
                let event = self.event(Token::ObjectOpen);
                self.stack.push(Frame::Object);
                self.mode = Mode::FirstMember;
                Ok(event)
            }
            Some(b'[') => {
                self.lexer.bump();
                let event = self.event(Token::ArrayOpen);
                self.stack.push(Frame::Array(0));
                self.mode = Mode::FirstElement;
                Ok(event)
            }
            Some(b'"') => {
                let value = self.lexer.read_string()?;
                self.scalar(Token::String(value))
            }
            Some(b't') => {
                self.lexer.read_keyword("true")?;
                self.scalar(Token::Bool(true))
            }
            Some(b'f') => {
                self.lexer.read_keyword("false")?;
                self.scalar(Token::Bool(false))
            }
            Some(b'n') => {
                self.lexer.read_keyword("null")?;
                self.scalar(Token::Null)
            }
            Some(b'-') | Some(b'0'..=b'9') => {
                let raw = self.lexer.read_number()?;
                self.scalar(Token::Number(raw))
            }
            Some(other) => Err(self.unexpected(other, "a value")),
            None => Err(crate::error::SiphonError::Parse {
                offset: self.lexer.offset(),
                reason: "unexpected end of input, expected a value".to_string(),
            }),
        }
    }

    fn scalar(&mut self, token: Token) -> Result<Event> {
        let event = self.event(token);
        self.pop_value_segment();
        self.mode = self.resume_mode();
        Ok(event)
    }

    /// Parse `"key": value` inside an object
    fn parse_member(&mut self) -> Result<Event> {
        let key = self.lexer.read_string()?;
        self.lexer.skip_whitespace();
        self.lexer.expect(b':')?;
        self.segments.push(PathSegment::Key(key.clone()));
        self.pending_key = Some(key);
        self.parse_value()
    }

    fn close_container(&mut self, token: Token) -> Result<Event> {
        self.lexer.bump();
        self.stack.pop();
        self.pending_key = None;
        let event = self.event(token);
        self.pop_value_segment();
        self.mode = self.resume_mode();
        Ok(event)
    }

    fn unexpected(&self, byte: u8, expected: &str) -> crate::error::SiphonError {
        crate::error::SiphonError::Parse {
            offset: self.lexer.offset(),
            reason: format!("unexpected '{}', expected {expected}", byte as char),
        }
    }

    fn step(&mut self) -> Result<Option<Event>> {
        match self.mode {
            Mode::Value => self.parse_value().map(Some),
            Mode::FirstMember => {
                self.lexer.skip_whitespace();
                match self.lexer.peek() {
                    Some(b'}') => self.close_container(Token::ObjectClose).map(Some),
                    Some(b'"') => self.parse_member().map(Some),
                    Some(other) => Err(self.unexpected(other, "'}' or a key")),
                    None => Err(self.unexpected_end("'}' or a key")),
                }
            }
            Mode::NextMember => {
                self.lexer.skip_whitespace();
                match self.lexer.peek() {
                    Some(b'}') => self.close_container(Token::ObjectClose).map(Some),
                    Some(b',') => {
                        self.lexer.bump();
                        self.lexer.skip_whitespace();
                        match self.lexer.peek() {
                            Some(b'"') => self.parse_member().map(Some),
                            Some(other) => Err(self.unexpected(other, "a key")),
                            None => Err(self.unexpected_end("a key")),
                        }
                    }
                    Some(other) => Err(self.unexpected(other, "',' or '}'")),
                    None => Err(self.unexpected_end("',' or '}'")),
                }
            }
            Mode::FirstElement => {
                self.lexer.skip_whitespace();
                match self.lexer.peek() {
                    Some(b']') => self.close_container(Token::ArrayClose).map(Some),
                    Some(_) => {
                        self.segments.push(PathSegment::Index(0));
                        self.parse_value().map(Some)
                    }
                    None => Err(self.unexpected_end("']' or a value")),
                }
            }
            Mode::NextElement => {
                self.lexer.skip_whitespace();
                match self.lexer.peek() {
                    Some(b']') => self.close_container(Token::ArrayClose).map(Some),
                    Some(b',') => {
                        self.lexer.bump();
                        let index = match self.stack.last_mut() {
                            Some(Frame::Array(i)) => {
                                *i += 1;
                                *i
                            }
                            _ => unreachable!("array mode without array frame"),
                        };
                        self.segments.push(PathSegment::Index(index));
                        self.parse_value().map(Some)
                    }
                    Some(other) => Err(self.unexpected(other, "',' or ']'")),
                    None => Err(self.unexpected_end("',' or ']'")),
                }
            }
            Mode::End => {
                if self.lexer.at_end() {
                    self.mode = Mode::Done;
                    Ok(None)
                } else {
                    Err(crate::error::SiphonError::Parse {
                        offset: self.lexer.offset(),
                        reason: "trailing characters after document".to_string(),
                    })
                }
            }
            Mode::Done => Ok(None),
        }
    }

    fn unexpected_end(&self, expected: &str) -> crate::error::SiphonError {
        crate::error::SiphonError::Parse {
            offset: self.lexer.offset(),
            reason: format!("unexpected end of input, expected {expected}"),
        }
    }
}

impl<'a> Iterator for Walker<'a> {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.mode == Mode::Done {
            return None;
        }
        match self.step() {
            Ok(Some(event)) => Some(Ok(event)),
            Ok(None) => None,
            Err(err) => {
                self.mode = Mode::Done;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(input: &str) -> Vec<Event> {
        Walker::new(input).map(|e| e.unwrap()).collect()
    }

    #[test]
    fn test_flat_object() {
        let evs = events(r#"{"id": 7, "title": "Hello"}"#);
        assert_eq!(evs.len(), 4);

        assert_eq!(evs[0].token, Token::ObjectOpen);
        assert_eq!(evs[0].path, "");
        assert_eq!(evs[0].key, None);

        assert_eq!(evs[1].path, "id");
        assert_eq!(evs[1].key.as_deref(), Some("id"));
        assert_eq!(evs[1].token, Token::Number("7".to_string()));

        assert_eq!(evs[2].path, "title");
        assert_eq!(evs[2].token, Token::String("Hello".to_string()));

        assert_eq!(evs[3].token, Token::ObjectClose);
        assert_eq!(evs[3].path, "");
        assert_eq!(evs[3].key, None);
    }

    #[test]
    fn test_array_indices_in_path() {
        let evs = events(r#"{"items": [{"title": "a"}, {"title": "b"}]}"#);
        let paths: Vec<&str> = evs.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "",
                "items",
                "items.0",
                "items.0.title",
                "items.0",
                "items.1",
                "items.1.title",
                "items.1",
                "items",
                "",
            ]
        );
        assert_eq!(evs[3].token, Token::String("a".to_string()));
        assert_eq!(evs[6].token, Token::String("b".to_string()));
        // array elements carry no key
        assert_eq!(evs[2].key, None);
        assert_eq!(evs[5].key, None);
    }

    #[test]
    fn test_key_order_preserved() {
        let evs = events(r#"{"zeta": 1, "alpha": 2, "mid": 3}"#);
        let keys: Vec<_> = evs
            .iter()
            .filter_map(|e| e.key.clone())
            .collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_scalar_root() {
        let evs = events(r#""hello""#);
        assert_eq!(evs.len(), 1);
        assert_eq!(evs[0].path, "");
        assert_eq!(evs[0].token, Token::String("hello".to_string()));
    }

    #[test]
    fn test_nested_path_segments() {
        let evs = events(r#"{"a": {"b": [10, 20]}}"#);
        let inner: Vec<_> = evs
            .iter()
            .filter(|e| matches!(e.token, Token::Number(_)))
            .collect();
        assert_eq!(inner[0].path, "a.b.0");
        assert_eq!(
            inner[0].segments,
            vec![
                PathSegment::Key("a".to_string()),
                PathSegment::Key("b".to_string()),
                PathSegment::Index(0),
            ]
        );
        assert_eq!(inner[1].path, "a.b.1");
    }

    #[test]
    fn test_all_scalar_types() {
        let evs = events(r#"{"s": "x", "n": 1.5, "b": true, "z": null}"#);
        assert_eq!(evs[1].token, Token::String("x".to_string()));
        assert_eq!(evs[2].token, Token::Number("1.5".to_string()));
        assert_eq!(evs[3].token, Token::Bool(true));
        assert_eq!(evs[4].token, Token::Null);
    }

    #[test]
    fn test_malformed_input_ends_stream() {
        let mut walker = Walker::new(r#"{"a": 1,}"#);
        assert!(walker.next().unwrap().is_ok()); // {
        assert!(walker.next().unwrap().is_ok()); // a: 1
        assert!(walker.next().unwrap().is_err()); // , }
        assert!(walker.next().is_none());
    }

    #[test]
    fn test_trailing_garbage_is_an_error() {
        let results: Vec<_> = Walker::new("1 2").collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }

    #[test]
    fn test_empty_containers() {
        let evs = events(r#"{"a": {}, "b": []}"#);
        let tokens: Vec<_> = evs.iter().map(|e| e.token.clone()).collect();
        assert_eq!(
            tokens,
            vec![
                Token::ObjectOpen,
                Token::ObjectOpen,
                Token::ObjectClose,
                Token::ArrayOpen,
                Token::ArrayClose,
                Token::ObjectClose,
            ]
        );
        // open and close report the same path for one container
        assert_eq!(evs[1].path, "a");
        assert_eq!(evs[2].path, "a");
    }

    #[test]
    fn test_token_as_i64() {
        assert_eq!(Token::Number("42".to_string()).as_i64(), Some(42));
        assert_eq!(Token::Number("4.2".to_string()).as_i64(), None);
        assert_eq!(Token::String("42".to_string()).as_i64(), None);
    }
}
