//! Streaming JSON traversal.
//!
//! This module turns raw JSON text into a lazy, forward-only sequence of
//! events, each carrying the structural path from the document root, the
//! object key (when there is one) and the value token. No tree is
//! materialized; one record is walked in a single pass in document order.

mod lexer;
pub mod walker;

pub use walker::{render_path, Event, PathSegment, Token, Walker};
