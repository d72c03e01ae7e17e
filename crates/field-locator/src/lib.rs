//! Field location rules.
//!
//! Elements are re-located by rule on every rescan; nothing here keeps
//! a long-lived element reference, because the host destroys and
//! recreates its inputs at will.

pub mod strategies;

pub use strategies::{locate, locate_fields, FieldMap};
