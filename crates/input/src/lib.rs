//! GUI-facing controls.
//!
//! Widgets edit a [`GuiParams`]; the difference between two snapshots is a
//! list of [`Control`]s, which is all the scene composer ever consumes.
//!
//! # Invariants
//! - Every edited field yields exactly one control, in field order.
//! - Values are clamped to the slider ranges before a control is produced.

mod control;
mod params;

pub use control::Control;
pub use params::GuiParams;
