//! Crate-internal test support and cross-module pipeline tests.

pub mod support;

mod pipeline;
