pub mod configuration;
pub mod converter;
pub mod error_handling;
pub mod harness;
pub mod http;
pub mod storage;
pub mod stream;
