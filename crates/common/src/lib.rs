//! Shared types for every fenestra crate.
//!
//! # Invariants
//! - `Transform` is plain data; scene nodes and panels copy it freely.
//! - Span arithmetic goes through [`inner_span`] and nowhere else.

mod span;
mod types;

pub use span::{ResizeError, Span, inner_span};
pub use types::{Color, ColorParseError, MaterialHandle, MeshHandle, NodeId, Transform};
