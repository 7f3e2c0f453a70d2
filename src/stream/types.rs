//! Common data types describing a captured stream and the result handed back
//! to the traffic-analysis framework.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direction of TCP flow for captured bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Bytes flowing from the client to the server.
    #[serde(rename = "client-to-server")]
    ClientToServer,
    /// Bytes flowing from the server back to the client.
    #[serde(rename = "server-to-client")]
    ServerToClient,
}

impl Direction {
    /// Short label used in log lines.
    pub fn label(&self) -> &'static str {
        match self {
            Direction::ClientToServer => "C->S",
            Direction::ServerToClient => "S->C",
        }
    }
}

/// One directional fragment of a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamChunk {
    pub direction: Direction,
    pub content: Vec<u8>,
    pub time: DateTime<Utc>,
}

impl StreamChunk {
    pub fn new(direction: Direction, content: impl Into<Vec<u8>>, time: DateTime<Utc>) -> Self {
        Self {
            direction,
            content: content.into(),
            time,
        }
    }
}

/// Connection metadata recorded alongside the chunks.
///
/// Field names on the wire follow the framework's PascalCase convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StreamMetadata {
    #[serde(rename = "StreamID")]
    pub stream_id: u64,
    #[serde(default)]
    pub client_host: String,
    #[serde(default)]
    pub client_port: u16,
    pub server_host: String,
    pub server_port: u16,
    #[serde(default)]
    pub protocol: String,
}

/// A captured bidirectional conversation. Read-only input to the converter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stream {
    pub metadata: StreamMetadata,
    pub chunks: Vec<StreamChunk>,
}

impl Stream {
    pub fn new(metadata: StreamMetadata, chunks: Vec<StreamChunk>) -> Self {
        Self { metadata, chunks }
    }

    /// Time of the first captured chunk, if any.
    pub fn first_time(&self) -> Option<DateTime<Utc>> {
        self.chunks.first().map(|c| c.time)
    }
}

/// Ordered chunks produced for one stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionResult {
    pub chunks: Vec<StreamChunk>,
}

impl ConversionResult {
    pub fn new(chunks: Vec<StreamChunk>) -> Self {
        Self { chunks }
    }

    /// The last chunk of the result. For converter output this is the artifact.
    pub fn artifact(&self) -> Option<&StreamChunk> {
        self.chunks.last()
    }
}
