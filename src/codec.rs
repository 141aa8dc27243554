//! String decoding strategies over a bit buffer.
//!
//! Two strategies share the [`TextDecoder`]: fixed-length (decode exactly N
//! encoded bytes' worth of characters) and null-terminated (decode until a
//! decoded null character). Lengths are always counted in encoded bytes,
//! never characters: the byte count is what moves the bit cursor, and
//! character counts are encoding-dependent. Both strategies optionally
//! validate the complete decoded string against a literal or pattern.

use crate::bitbuf::BitBuffer;
use crate::error::BindError;
use crate::expr::{evaluate_size, Const, Expression};
use crate::scope::Resolver;
use crate::text::{Charset, TextDecoder};
use crate::value::Value;
use regex::Regex;
use std::sync::Arc;

/// Post-decode validation of the full decoded string. Matching happens only
/// after the string is complete; there is no partial matching during decode.
#[derive(Debug, Clone)]
pub enum Match {
    /// The decoded string must equal this literal exactly.
    Literal(String),
    /// The decoded string must match the pattern in full. Built by
    /// [`Match::pattern`], which anchors the regex to the whole string;
    /// `source` keeps the un-anchored pattern for diagnostics.
    Pattern { regex: Regex, source: String },
}

impl Match {
    /// Whole-string pattern match. The pattern is anchored here, once, so
    /// that checking can use plain `is_match`: an un-anchored find would
    /// report the regex engine's preferred match, which for alternations
    /// like `a|ab` is not necessarily the full-string one.
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{pattern})$"))?;
        Ok(Match::Pattern { regex, source: pattern.to_string() })
    }

    pub fn check(&self, actual: &str) -> Result<(), BindError> {
        let ok = match self {
            Match::Literal(expected) => actual == expected,
            Match::Pattern { regex, .. } => regex.is_match(actual),
        };
        if ok {
            Ok(())
        } else {
            Err(BindError::MatchMismatch {
                expected: self.expected().to_string(),
                actual: actual.to_string(),
            })
        }
    }

    fn expected(&self) -> &str {
        match self {
            Match::Literal(s) => s,
            Match::Pattern { source, .. } => source,
        }
    }
}

enum Strategy {
    /// Byte length computed per decode by evaluating the expression against
    /// the enclosing resolver.
    Fixed(Arc<dyn Expression>),
    NullTerminated,
}

/// Decoder for one bound text field.
pub struct StringCodec {
    strategy: Strategy,
    charset: Charset,
    matcher: Option<Match>,
}

impl StringCodec {
    /// Fixed-length strategy with an expression-driven byte length.
    pub fn fixed(length: Arc<dyn Expression>, charset: Charset) -> Self {
        StringCodec { strategy: Strategy::Fixed(length), charset, matcher: None }
    }

    /// Fixed-length strategy with a literal byte length.
    pub fn fixed_len(length: u64, charset: Charset) -> Self {
        Self::fixed(Arc::new(Const(Value::U64(length))), charset)
    }

    pub fn null_terminated(charset: Charset) -> Self {
        StringCodec { strategy: Strategy::NullTerminated, charset, matcher: None }
    }

    pub fn with_match(mut self, matcher: Match) -> Self {
        self.matcher = Some(matcher);
        self
    }

    /// Decode one string field at the buffer's current cursor. The resolver
    /// is consulted only when the length is expression-driven.
    pub fn decode<B: BitBuffer + ?Sized>(
        &self,
        buf: &mut B,
        resolver: &Resolver<'_>,
    ) -> Result<String, BindError> {
        let decoded = match &self.strategy {
            Strategy::Fixed(length) => {
                let n = evaluate_size(length.as_ref(), resolver)?;
                decode_fixed(buf, n, self.charset)?
            }
            Strategy::NullTerminated => decode_null_terminated(buf, self.charset)?,
        };
        if let Some(matcher) = &self.matcher {
            matcher.check(&decoded)?;
        }
        Ok(decoded)
    }
}

/// Decode exactly `byte_length` encoded bytes' worth of characters. With a
/// multi-byte encoding the result naturally holds fewer characters than
/// bytes. Exhausting the buffer before the declared length is an error; no
/// partial string is returned.
pub fn decode_fixed<B: BitBuffer + ?Sized>(
    buf: &mut B,
    byte_length: u64,
    charset: Charset,
) -> Result<String, BindError> {
    let mut decoder = TextDecoder::limited(buf, charset, byte_length);
    let mut out = String::new();
    while let Some(c) = decoder.next_char() {
        out.push(c);
    }
    let consumed = decoder.bytes_consumed();
    if consumed < byte_length {
        return Err(BindError::TruncatedData { expected: byte_length, got: consumed });
    }
    Ok(out)
}

/// Decode until the first decoded null character, which is consumed but not
/// appended. "Null" is a decoded code point of zero, so a multi-byte
/// encoding's terminator spans several zero bytes. End of data before a
/// terminator is an error, however many valid characters preceded it.
pub fn decode_null_terminated<B: BitBuffer + ?Sized>(
    buf: &mut B,
    charset: Charset,
) -> Result<String, BindError> {
    let mut decoder = TextDecoder::new(buf, charset);
    let mut out = String::new();
    loop {
        match decoder.next_char() {
            Some('\0') => return Ok(out),
            Some(c) => out.push(c),
            None => {
                return Err(BindError::UnterminatedString { decoded: out.chars().count() })
            }
        }
    }
}
