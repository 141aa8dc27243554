//! Shared error taxonomy for binding resolution and string decoding.
//!
//! One tagged enum covers both halves of the core: scope/reference failures
//! (duplicate, unknown, incomplete context, access) and string decode failures
//! (truncation, missing terminator, match mismatch). Every variant carries the
//! structured data a caller needs for a useful message; none is recoverable.

/// Any failure raised by this crate. Decoding a field is all-or-nothing:
/// the first error aborts that field and propagates upward unchanged.
#[derive(Debug, thiserror::Error)]
pub enum BindError {
    /// Same name registered twice in one scope. Surfaced at structure-setup
    /// time, never at decode time.
    #[error("duplicate binding {name:?} in scope")]
    DuplicateBinding { name: String },

    /// `resolve()` of a name that is neither registered nor the reserved
    /// `outer`. `known` holds the scope's full set of names for diagnostics.
    #[error("unknown binding {name:?}, expected {}", render_known(.known))]
    UnknownBinding { name: String, known: Vec<String> },

    /// A binding was resolved against a resolver whose container instance is
    /// absent: the field this expression depends on has not been decoded yet.
    #[error("cannot resolve {name:?}: incomplete context")]
    IncompleteContext { name: String },

    /// The accessor failed against a valid container instance (missing
    /// attribute, index out of bounds, wrong runtime shape).
    #[error("failed to bind to {name:?}: {reason}")]
    BindingAccess { name: String, reason: String },

    /// Fixed-length string decode ran out of data before the declared byte
    /// length.
    #[error("truncated string data: expected {expected} bytes, got {got}")]
    TruncatedData { expected: u64, got: u64 },

    /// Null-terminated string decode reached end of data without a decoded
    /// null character.
    #[error("unterminated string: end of data after {decoded} characters")]
    UnterminatedString { decoded: usize },

    /// Decoded string failed the configured literal/pattern match.
    #[error("string mismatch: expected {expected:?}, got {actual:?}")]
    MatchMismatch { expected: String, actual: String },

    /// Failure from the external expression evaluator, propagated unchanged.
    #[error("expression evaluation failed: {0}")]
    Expression(String),
}

fn render_known(known: &[String]) -> String {
    if known.is_empty() {
        "no variables".to_string()
    } else {
        format!("one of {}", known.join(", "))
    }
}
