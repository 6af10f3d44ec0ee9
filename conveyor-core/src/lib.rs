//! Conveyor Core
//!
//! Core types shared by the Conveyor engine, server, client and CLI.
//!
//! This crate contains:
//! - Domain types: jobs, pipelines and capability descriptors
//! - DTOs: request/response bodies exchanged over the HTTP API

pub mod domain;
pub mod dto;
