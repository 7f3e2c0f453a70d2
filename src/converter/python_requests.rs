//! Stream → Python `requests` replay script.
//!
//! Every client request of a stream becomes one call on a shared
//! `requests.Session`; responses are observed and dropped. The finished
//! script is appended to the result as a single client-to-server chunk
//! stamped with the time of the first captured chunk.
//!
//! ```
//! use chrono::Utc;
//! use requests_converter::converter::{Converter, PythonRequestsConverter};
//! use requests_converter::stream::{Direction, Stream, StreamChunk, StreamMetadata};
//!
//! let metadata = StreamMetadata {
//!     stream_id: 1,
//!     client_host: "10.0.0.1".into(),
//!     client_port: 41000,
//!     server_host: "10.0.0.5".into(),
//!     server_port: 8080,
//!     protocol: "TCP".into(),
//! };
//! let chunk = StreamChunk::new(
//!     Direction::ClientToServer,
//!     b"GET /status HTTP/1.1\r\n\r\n".to_vec(),
//!     Utc::now(),
//! );
//! let result = PythonRequestsConverter::new().convert(&Stream::new(metadata, vec![chunk]));
//! let script = String::from_utf8(result.artifact().unwrap().content.clone()).unwrap();
//! assert!(script.ends_with("r = s.get(f\"http://{IP}:8080/status\")\n"));
//! ```

use chrono::Utc;
use log::{debug, info};

use super::script::{ScriptArtifact, ScriptBuilder};
use super::Converter;
use crate::http::{dispatch, DecodedRequest, DecodedResponse, HttpHandler};
use crate::stream::{Stream, StreamChunk};

/// Converter rendering replay scripts for the Python `requests` library.
///
/// The converter holds no per-stream state; each call to
/// [`convert`](Converter::convert) builds its own script, so one instance can
/// serve any number of streams, sequentially or from several threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct PythonRequestsConverter;

/// Request/response callbacks for one conversion pass.
struct ScriptHandler {
    builder: ScriptBuilder,
}

impl HttpHandler for ScriptHandler {
    fn handle_request(
        &mut self,
        _header: &[u8],
        _body: &[u8],
        _chunk: &StreamChunk,
        request: &DecodedRequest,
    ) -> Vec<StreamChunk> {
        self.builder.push_request(request);
        Vec::new()
    }

    fn handle_response(
        &mut self,
        _header: &[u8],
        _body: &[u8],
        _chunk: &StreamChunk,
        _response: &DecodedResponse,
    ) -> Vec<StreamChunk> {
        Vec::new()
    }
}

impl PythonRequestsConverter {
    pub const NAME: &'static str = "pythonrequests";

    pub fn new() -> Self {
        Self
    }
}

impl Converter for PythonRequestsConverter {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn render(&self, stream: &Stream) -> (Vec<StreamChunk>, ScriptArtifact) {
        let id = stream.metadata.stream_id;
        let mut handler = ScriptHandler {
            builder: ScriptBuilder::new(&stream.metadata),
        };
        debug!(
            "[{}] rendering against {}:{} as {}",
            id,
            stream.metadata.server_host,
            stream.metadata.server_port,
            handler.builder.host()
        );

        let kept = dispatch(stream, &mut handler);

        // a stream without chunks has no capture time to inherit
        let time = stream.first_time().unwrap_or_else(Utc::now);
        let artifact = handler.builder.finish(time);
        info!(
            "[{}] rendered {} request(s) into a {} byte script",
            id,
            artifact.request_count,
            artifact.script.len()
        );
        (kept, artifact)
    }
}
