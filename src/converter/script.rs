//! Stream-scoped script assembly.

use chrono::{DateTime, Utc};

use super::host_template::HostTemplate;
use super::literal::str_literal;
use super::renderer::{render_request, SESSION_VAR};
use crate::http::DecodedRequest;
use crate::stream::{Direction, StreamChunk, StreamMetadata};

/// Accumulates the replay script of one stream.
///
/// The preamble is written on construction and the host template is fixed
/// for the lifetime of the builder. [`finish`](Self::finish) consumes the
/// builder, so a script can neither be emitted twice nor leak into the next
/// stream.
#[derive(Debug)]
pub struct ScriptBuilder {
    stream_id: u64,
    host: HostTemplate,
    text: String,
    requests: usize,
}

impl ScriptBuilder {
    pub fn new(metadata: &StreamMetadata) -> Self {
        let text = format!(
            "#!/usr/bin/env python3\n\
             import requests\n\
             import sys\n\
             \n\
             IP = sys.argv[1]\n\
             # IP = {host}\n\
             \n\
             # Generated from stream {id}\n\
             {session} = requests.Session()\n\
             \n",
            // a repr keeps line breaks and NULs in the host out of the comment
            host = str_literal(&metadata.server_host),
            id = metadata.stream_id,
            session = SESSION_VAR,
        );
        Self {
            stream_id: metadata.stream_id,
            host: HostTemplate::for_stream(metadata),
            text,
            requests: 0,
        }
    }

    pub fn host(&self) -> &HostTemplate {
        &self.host
    }

    pub fn push_request(&mut self, request: &DecodedRequest) {
        render_request(request, &self.host, &mut self.text);
        self.requests += 1;
    }

    pub fn request_count(&self) -> usize {
        self.requests
    }

    pub fn finish(self, time: DateTime<Utc>) -> ScriptArtifact {
        ScriptArtifact {
            stream_id: self.stream_id,
            script: self.text,
            request_count: self.requests,
            time,
        }
    }
}

/// The finished replay script of one stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptArtifact {
    pub stream_id: u64,
    pub script: String,
    pub request_count: usize,
    pub time: DateTime<Utc>,
}

impl ScriptArtifact {
    /// The artifact as the single client-to-server chunk appended to a result.
    pub fn to_chunk(&self) -> StreamChunk {
        StreamChunk::new(
            Direction::ClientToServer,
            self.script.as_bytes().to_vec(),
            self.time,
        )
    }
}
