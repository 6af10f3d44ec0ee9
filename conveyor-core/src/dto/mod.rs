//! Data Transfer Objects for the HTTP API
//!
//! Request and response bodies shared by the server and the client.
//! Entities themselves travel as their domain types.

pub mod capability;
pub mod job;
pub mod pipeline;
pub mod stats;
