//! Chunk reconciliation and adaptive pacing for an RSVP reader.
//!
//! The crate is split leaf-first: [`complexity`] scores text, [`segment`]
//! turns untrusted model fragments into a chunk sequence that covers the
//! source exactly, [`pacing`] turns a chunk into an on-screen duration and
//! [`session`] drives playback from a millisecond clock.

pub mod complexity;
pub mod pacing;
pub mod segment;
pub mod session;
pub mod settings;
pub mod text_policy;
