//! Core domain types
//!
//! These types are the canonical shape of every entity the engine tracks.
//! The engine mutates them, the store persists them as JSON, and the
//! server hands them to clients unchanged.

pub mod capability;
pub mod job;
pub mod pipeline;
