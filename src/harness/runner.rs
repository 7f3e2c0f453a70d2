use std::io::{BufRead, Write};

use log::{debug, info};

use super::protocol::{write_result, StreamReader};
use crate::converter::{assemble, Converter};
use crate::error_handling::types::HarnessError;
use crate::storage::ScriptStore;

/// Totals of one harness run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub streams: usize,
    pub chunks_written: usize,
    pub scripts_saved: usize,
}

/// Drives a converter over every stream of an input, in order.
pub struct Harness<'a> {
    converter: &'a dyn Converter,
    store: Option<&'a dyn ScriptStore>,
}

impl<'a> Harness<'a> {
    pub fn new(converter: &'a dyn Converter) -> Self {
        Self {
            converter,
            store: None,
        }
    }

    /// Also persist every script through `store`.
    pub fn with_store(mut self, store: &'a dyn ScriptStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn run<R: BufRead, W: Write>(&self, input: R, mut output: W) -> Result<RunSummary, HarnessError> {
        info!("Running converter {}", self.converter.name());
        let mut reader = StreamReader::new(input);
        let mut summary = RunSummary::default();

        while let Some(stream) = reader.next_stream()? {
            let (kept, artifact) = self.converter.render(&stream);
            if let Some(store) = self.store {
                store.save_script(&artifact)?;
                summary.scripts_saved += 1;
            }
            let result = assemble(kept, &artifact);

            write_result(&mut output, &result)?;
            debug!(
                "[{}] wrote {} chunk(s)",
                stream.metadata.stream_id,
                result.chunks.len()
            );
            summary.streams += 1;
            summary.chunks_written += result.chunks.len();
        }

        info!(
            "Converted {} stream(s), {} line(s) read",
            summary.streams,
            reader.line_no()
        );
        Ok(summary)
    }
}
