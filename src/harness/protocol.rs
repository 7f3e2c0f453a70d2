//! Line-oriented wire format between the traffic-analysis framework and a
//! converter process.
//!
//! Per stream the framework writes one metadata line, one line per chunk and
//! an empty line. The converter answers with one line per result chunk, an
//! empty line and a result-data line (`{}`).

use std::io::{BufRead, Write};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::error_handling::types::HarnessError;
use crate::stream::{ConversionResult, Direction, Stream, StreamChunk, StreamMetadata};

/// One chunk on the wire; `content` is base64.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ChunkRecord {
    direction: Direction,
    content: String,
    time: DateTime<Utc>,
}

/// Reads streams from the framework, tracking line numbers for error reports.
pub struct StreamReader<R> {
    reader: R,
    line_no: usize,
    line: String,
}

impl<R: BufRead> StreamReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            line: String::new(),
        }
    }

    /// Number of lines consumed so far.
    pub fn line_no(&self) -> usize {
        self.line_no
    }

    /// Next line without its terminator, `None` at EOF.
    fn next_line(&mut self) -> Result<Option<&str>, HarnessError> {
        self.line.clear();
        if self.reader.read_line(&mut self.line)? == 0 {
            return Ok(None);
        }
        self.line_no += 1;
        Ok(Some(self.line.trim_end_matches(['\r', '\n'])))
    }

    /// Reads the next stream; `Ok(None)` once the input is exhausted.
    pub fn next_stream(&mut self) -> Result<Option<Stream>, HarnessError> {
        let metadata: StreamMetadata = loop {
            let line_no = self.line_no + 1;
            match self.next_line()? {
                None => return Ok(None),
                Some(l) if l.trim().is_empty() => continue,
                Some(l) => {
                    break serde_json::from_str(l).map_err(|source| HarnessError::JsonError {
                        line: line_no,
                        source,
                    })?
                }
            }
        };

        let mut chunks = Vec::new();
        loop {
            let line_no = self.line_no + 1;
            let record: ChunkRecord = match self.next_line()? {
                None => {
                    debug!("[{}] input ended without stream terminator", metadata.stream_id);
                    break;
                }
                Some(l) if l.trim().is_empty() => break,
                Some(l) => serde_json::from_str(l).map_err(|source| HarnessError::JsonError {
                    line: line_no,
                    source,
                })?,
            };
            let content = STANDARD
                .decode(record.content.as_bytes())
                .map_err(|source| HarnessError::Base64Error {
                    line: line_no,
                    source,
                })?;
            chunks.push(StreamChunk::new(record.direction, content, record.time));
        }

        trace!(
            "[{}] read {} chunk(s) up to line {}",
            metadata.stream_id,
            chunks.len(),
            self.line_no
        );
        Ok(Some(Stream::new(metadata, chunks)))
    }
}

fn json_error(source: serde_json::Error) -> HarnessError {
    HarnessError::JsonError { line: 0, source }
}

/// Writes one conversion result and flushes it.
pub fn write_result<W: Write>(writer: &mut W, result: &ConversionResult) -> Result<(), HarnessError> {
    for chunk in &result.chunks {
        let record = ChunkRecord {
            direction: chunk.direction,
            content: STANDARD.encode(&chunk.content),
            time: chunk.time,
        };
        serde_json::to_writer(&mut *writer, &record).map_err(json_error)?;
        writer.write_all(b"\n")?;
    }
    writer.write_all(b"\n{}\n")?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const INPUT: &str = concat!(
        r#"{"StreamID":1,"ClientHost":"10.0.0.1","ClientPort":5000,"ServerHost":"10.0.0.5","ServerPort":80,"Protocol":"TCP"}"#,
        "\n",
        r#"{"Direction":"client-to-server","Content":"R0VUIC8gSFRUUC8xLjENCg0K","Time":"2024-01-02T03:04:05Z"}"#,
        "\n",
        "\n",
        r#"{"StreamID":2,"ServerHost":"::1","ServerPort":8080}"#,
        "\n",
        "\n",
    );

    #[test]
    fn reads_consecutive_streams() {
        let mut reader = StreamReader::new(Cursor::new(INPUT));

        let first = reader.next_stream().unwrap().unwrap();
        assert_eq!(first.metadata.stream_id, 1);
        assert_eq!(first.chunks.len(), 1);
        assert_eq!(first.chunks[0].direction, Direction::ClientToServer);
        assert_eq!(first.chunks[0].content, b"GET / HTTP/1.1\r\n\r\n");
        assert_eq!(first.chunks[0].time.to_rfc3339(), "2024-01-02T03:04:05+00:00");

        let second = reader.next_stream().unwrap().unwrap();
        assert_eq!(second.metadata.stream_id, 2);
        assert_eq!(second.metadata.server_host, "::1");
        assert!(second.chunks.is_empty());

        assert!(reader.next_stream().unwrap().is_none());
    }

    #[test]
    fn reports_line_of_bad_json() {
        let input = "{\"StreamID\":1,\"ServerHost\":\"a\",\"ServerPort\":80}\n{not json}\n";
        let mut reader = StreamReader::new(Cursor::new(input));
        match reader.next_stream() {
            Err(HarnessError::JsonError { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn reports_line_of_bad_base64() {
        let input = concat!(
            "{\"StreamID\":1,\"ServerHost\":\"a\",\"ServerPort\":80}\n",
            "{\"Direction\":\"client-to-server\",\"Content\":\"***\",\"Time\":\"2024-01-02T03:04:05Z\"}\n",
        );
        let mut reader = StreamReader::new(Cursor::new(input));
        assert!(matches!(
            reader.next_stream(),
            Err(HarnessError::Base64Error { line: 2, .. })
        ));
    }

    #[test]
    fn writes_chunks_then_terminator() {
        let time = DateTime::parse_from_rfc3339("2024-01-02T03:04:05Z")
            .unwrap()
            .with_timezone(&Utc);
        let result = ConversionResult::new(vec![StreamChunk::new(
            Direction::ClientToServer,
            b"hi".to_vec(),
            time,
        )]);
        let mut out = Vec::new();
        write_result(&mut out, &result).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\"Direction\":\"client-to-server\",\"Content\":\"aGk=\",\"Time\":\"2024-01-02T03:04:05Z\"}\n\n{}\n"
        );
    }
}
