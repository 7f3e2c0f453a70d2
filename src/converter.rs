//! Rendering of captured streams into replay scripts.

pub mod host_template;
pub mod literal;
pub mod python_requests;
pub mod renderer;
pub mod script;

pub use host_template::{HostKind, HostTemplate};
pub use python_requests::PythonRequestsConverter;
pub use renderer::CallForm;
pub use script::{ScriptArtifact, ScriptBuilder};

use crate::stream::{ConversionResult, Stream, StreamChunk};

/// A stream converter as driven by the harness: one call per stream, no
/// state carried between calls.
pub trait Converter: Send + Sync {
    fn name(&self) -> &str;

    /// Returns the chunks kept while decoding the stream and its script.
    fn render(&self, stream: &Stream) -> (Vec<StreamChunk>, ScriptArtifact);

    fn convert(&self, stream: &Stream) -> ConversionResult {
        let (kept, artifact) = self.render(stream);
        assemble(kept, &artifact)
    }
}

/// Kept chunks followed by exactly one artifact chunk.
pub fn assemble(mut kept: Vec<StreamChunk>, artifact: &ScriptArtifact) -> ConversionResult {
    kept.push(artifact.to_chunk());
    ConversionResult::new(kept)
}
