//! Converter process plumbing: reads captured streams, runs them through a
//! [`Converter`](crate::converter::Converter) and writes the results back.

pub mod protocol;
pub mod runner;

pub use protocol::{write_result, StreamReader};
pub use runner::{Harness, RunSummary};
