//! Core types and utilities for courier.
//!
//! This crate provides the foundational types and error handling shared by
//! the provider orchestration library and the command-line front end.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ParseIdError, QueryId};
