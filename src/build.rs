//! Incremental JSON output.
//!
//! The builder accepts an ordered stream of emissions (scalars, scope
//! opens, scope closes) and produces pretty-printed JSON. Keys land in the
//! output in emission order. Driving it with an unbalanced sequence is a
//! programming error and fails loudly instead of silently producing
//! invalid JSON.

use crate::error::{Result, SiphonError};
use crate::walk::Token;

#[derive(Debug, Clone, Copy, PartialEq)]
enum ScopeKind {
    Object,
    Array,
}

#[derive(Debug)]
struct Scope {
    kind: ScopeKind,
    entries: usize,
}

/// Order-preserving incremental JSON builder with two-space indentation
pub struct JsonBuilder {
    out: String,
    indent: &'static str,
    stack: Vec<Scope>,
    root_emitted: bool,
}

impl Default for JsonBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonBuilder {
    pub fn new() -> Self {
        JsonBuilder {
            out: String::new(),
            indent: "  ",
            stack: Vec::new(),
            root_emitted: false,
        }
    }

    /// Open an object scope; `key` must be empty outside object scopes
    pub fn open_object(&mut self, key: &str) -> Result<()> {
        self.begin_entry(key)?;
        self.out.push('{');
        self.stack.push(Scope {
            kind: ScopeKind::Object,
            entries: 0,
        });
        Ok(())
    }

    /// Open an array scope; `key` must be empty outside object scopes
    pub fn open_array(&mut self, key: &str) -> Result<()> {
        self.begin_entry(key)?;
        self.out.push('[');
        self.stack.push(Scope {
            kind: ScopeKind::Array,
            entries: 0,
        });
        Ok(())
    }

    /// Emit a string scalar
    pub fn string(&mut self, key: &str, value: &str) -> Result<()> {
        self.begin_entry(key)?;
        escape_into(&mut self.out, value);
        Ok(())
    }

    /// Emit a number from its raw JSON text
    pub fn raw_number(&mut self, key: &str, raw: &str) -> Result<()> {
        self.begin_entry(key)?;
        self.out.push_str(raw);
        Ok(())
    }

    pub fn bool(&mut self, key: &str, value: bool) -> Result<()> {
        self.begin_entry(key)?;
        self.out.push_str(if value { "true" } else { "false" });
        Ok(())
    }

    pub fn null(&mut self, key: &str) -> Result<()> {
        self.begin_entry(key)?;
        self.out.push_str("null");
        Ok(())
    }

    /// Mirror a walker token; close tokens ignore the key
    pub fn token(&mut self, key: &str, token: &Token) -> Result<()> {
        match token {
            Token::String(value) => self.string(key, value),
            Token::Number(raw) => self.raw_number(key, raw),
            Token::Bool(value) => self.bool(key, *value),
            Token::Null => self.null(key),
            Token::ObjectOpen => self.open_object(key),
            Token::ArrayOpen => self.open_array(key),
            Token::ObjectClose | Token::ArrayClose => self.close(),
        }
    }

    /// Close the innermost open scope
    pub fn close(&mut self) -> Result<()> {
        let Some(scope) = self.stack.pop() else {
            return Err(SiphonError::Build(
                "close with no open scope".to_string(),
            ));
        };
        if scope.entries > 0 {
            self.out.push('\n');
            self.push_indent(self.stack.len());
        }
        self.out.push(match scope.kind {
            ScopeKind::Object => '}',
            ScopeKind::Array => ']',
        });
        Ok(())
    }

    /// Finish building; every opened scope must have been closed
    pub fn finish(self) -> Result<String> {
        if !self.stack.is_empty() {
            return Err(SiphonError::Build(format!(
                "finish with {} unclosed scope(s)",
                self.stack.len()
            )));
        }
        if !self.root_emitted {
            return Err(SiphonError::Build("nothing was emitted".to_string()));
        }
        Ok(self.out)
    }

    /// Write the separator, indentation and (for object scopes) the key
    /// that precede a value
    fn begin_entry(&mut self, key: &str) -> Result<()> {
        match self.stack.last_mut() {
            None => {
                if self.root_emitted {
                    return Err(SiphonError::Build(
                        "a second root value was emitted".to_string(),
                    ));
                }
                self.root_emitted = true;
                Ok(())
            }
            Some(scope) => {
                let kind = scope.kind;
                if kind == ScopeKind::Object && key.is_empty() {
                    return Err(SiphonError::Build(
                        "value in object scope needs a key".to_string(),
                    ));
                }
                if kind == ScopeKind::Array && !key.is_empty() {
                    return Err(SiphonError::Build(format!(
                        "key '{key}' is not allowed in array scope"
                    )));
                }
                if scope.entries > 0 {
                    self.out.push(',');
                }
                scope.entries += 1;
                self.out.push('\n');
                self.push_indent(self.stack.len());
                if kind == ScopeKind::Object {
                    escape_into(&mut self.out, key);
                    self.out.push_str(": ");
                }
                Ok(())
            }
        }
    }

    fn push_indent(&mut self, depth: usize) {
        for _ in 0..depth {
            self.out.push_str(self.indent);
        }
    }
}

/// Write `value` as a quoted JSON string with RFC 8259 escaping
fn escape_into(out: &mut String, value: &str) {
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{0008}' => out.push_str("\\b"),
            '\u{000c}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_build_parses_back() {
        let mut b = JsonBuilder::new();
        b.open_object("").unwrap();
        b.raw_number("id", "7").unwrap();
        b.string("title", "Hello").unwrap();
        b.open_array("tags").unwrap();
        b.string("", "a").unwrap();
        b.string("", "b").unwrap();
        b.close().unwrap();
        b.open_object("meta").unwrap();
        b.bool("done", true).unwrap();
        b.null("extra").unwrap();
        b.close().unwrap();
        b.close().unwrap();

        let out = b.finish().unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 7,
                "title": "Hello",
                "tags": ["a", "b"],
                "meta": {"done": true, "extra": null}
            })
        );
    }

    #[test]
    fn test_emission_order_is_output_order() {
        let mut b = JsonBuilder::new();
        b.open_object("").unwrap();
        b.string("zeta", "1").unwrap();
        b.string("alpha", "2").unwrap();
        b.close().unwrap();
        let out = b.finish().unwrap();
        assert!(out.find("zeta").unwrap() < out.find("alpha").unwrap());
    }

    #[test]
    fn test_empty_object_and_array() {
        let mut b = JsonBuilder::new();
        b.open_object("").unwrap();
        b.open_object("a").unwrap();
        b.close().unwrap();
        b.open_array("b").unwrap();
        b.close().unwrap();
        b.close().unwrap();
        let out = b.finish().unwrap();
        assert!(out.contains("{}"));
        assert!(out.contains("[]"));
    }

    #[test]
    fn test_close_without_scope_fails() {
        let mut b = JsonBuilder::new();
        assert!(b.close().is_err());
    }

    #[test]
    fn test_finish_with_open_scope_fails() {
        let mut b = JsonBuilder::new();
        b.open_object("").unwrap();
        assert!(b.finish().is_err());
    }

    #[test]
    fn test_key_rules_per_scope() {
        let mut b = JsonBuilder::new();
        b.open_object("").unwrap();
        assert!(b.string("", "keyless in object").is_err());

        let mut b = JsonBuilder::new();
        b.open_array("").unwrap();
        assert!(b.string("oops", "keyed in array").is_err());
    }

    #[test]
    fn test_second_root_fails() {
        let mut b = JsonBuilder::new();
        b.string("", "one").unwrap();
        assert!(b.string("", "two").is_err());
    }

    #[test]
    fn test_escaping_round_trips() {
        let tricky = "line\nbreak \"quoted\" back\\slash \t\u{0001}";
        let mut b = JsonBuilder::new();
        b.string("", tricky).unwrap();
        let out = b.finish().unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value.as_str().unwrap(), tricky);
    }

    #[test]
    fn test_walker_events_round_trip_through_builder() {
        let input = r#"{"id": 7, "title": "Héllo \"q\"", "blocks": [{"text": "a", "w": 1.5e2}, []], "done": false, "extra": null}"#;
        let mut b = JsonBuilder::new();
        for event in crate::walk::Walker::new(input) {
            let event = event.unwrap();
            b.token(event.key.as_deref().unwrap_or(""), &event.token)
                .unwrap();
        }
        let out = b.finish().unwrap();

        let original: serde_json::Value = serde_json::from_str(input).unwrap();
        let mirrored: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(original, mirrored);
        // key order survives the mirror
        assert!(out.find("title").unwrap() < out.find("blocks").unwrap());
        assert!(out.find("done").unwrap() < out.find("extra").unwrap());
    }

    #[test]
    fn test_token_mirroring() {
        let mut b = JsonBuilder::new();
        b.token("", &Token::ObjectOpen).unwrap();
        b.token("n", &Token::Number("1e3".to_string())).unwrap();
        b.token("", &Token::ObjectClose).unwrap();
        let out = b.finish().unwrap();
        assert!(out.contains("1e3"));
    }
}
