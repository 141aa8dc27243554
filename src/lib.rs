//! # bitbound — binding resolution and bit-buffer string decoding
//!
//! The resolution-and-decoding core of a declarative binary-format framework.
//! A format is described as nested *bound fields*; fields decoded earlier are
//! tracked in a chain of lexical scopes so that later fields can compute
//! their own size, presence, or validity from them through an embedded
//! expression language. Two pieces live here:
//!
//! - **Binding resolution graph** ([`scope`], [`binding`]): scopes holding
//!   [`Binding`]s, [`Reference`]s produced by name lookup (including the
//!   reserved `outer` name, indexed access, and polymorphic fan-out), and
//!   [`Resolver`]s that supply the live decoded instance at evaluation time.
//! - **Bit-buffer string codec** ([`bitbuf`], [`text`], [`codec`]):
//!   fixed-length and null-terminated string decoding straight from a
//!   bit-addressable buffer, with encoding-aware terminator detection and
//!   optional post-decode match validation.
//!
//! The schema front-end that builds bound-field trees and the expression
//! parser are external collaborators: the former supplies
//! `(name, types, accessor)` tuples that become [`Binding`]s, the latter is
//! consumed through the [`Expression`] trait.
//!
//! ## Example
//!
//! ```
//! use bitbound::{
//!     Binding, Charset, Resolver, Scopes, SliceBitBuffer, StringCodec, TypeTag, Value,
//! };
//! use std::sync::Arc;
//!
//! // A structure with a `len` field followed by a string of `len` bytes.
//! let mut scopes = Scopes::new();
//! let scope = scopes.create(None);
//! scopes.register(scope, Binding::field("len", TypeTag::Uint)).unwrap();
//!
//! let mut container = indexmap::IndexMap::new();
//! container.insert("len".to_string(), Value::U8(3));
//! let container = Value::Struct(container);
//!
//! let length = Arc::new(scopes.resolve(scope, "len").unwrap());
//! let codec = StringCodec::fixed(length, Charset::Ascii);
//!
//! let mut buf = SliceBitBuffer::new(b"abc...");
//! let resolver = Resolver::new(&scopes, scope, Some(&container));
//! assert_eq!(codec.decode(&mut buf, &resolver).unwrap(), "abc");
//! ```

pub mod binding;
pub mod bitbuf;
pub mod codec;
pub mod error;
pub mod expr;
pub mod scope;
pub mod text;
pub mod value;

pub use binding::{Accessor, Binding};
pub use bitbuf::{BitBuffer, ByteView, SliceBitBuffer, Underflow};
pub use codec::{decode_fixed, decode_null_terminated, Match, StringCodec};
pub use error::BindError;
pub use expr::{Const, Expression};
pub use scope::{Reference, Resolver, ScopeId, Scopes, OUTER};
pub use text::{Charset, TextDecoder};
pub use value::{TypeTag, Value};
