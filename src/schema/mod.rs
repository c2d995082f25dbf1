//! Assessment request schema
//!
//! This module defines how inbound request records are decoded into user
//! metrics, and how batch documents are split and validated.

mod adapter;
mod request;

pub use adapter::*;
pub use request::*;
