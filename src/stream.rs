pub mod types;

pub use types::{ConversionResult, Direction, Stream, StreamChunk, StreamMetadata};
