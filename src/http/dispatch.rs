//! Splits a captured stream into HTTP/1.x messages and hands each one to an
//! [`HttpHandler`].
//!
//! Both directions are buffered independently. Whenever a chunk arrives the
//! buffer of its direction is parsed for as many complete messages as it
//! holds, so handlers observe requests and responses in capture order. Bytes
//! that do not parse as HTTP/1.x switch that direction to pass-through: the
//! chunks carrying them are returned unchanged instead of being dispatched.

use std::collections::{BTreeSet, VecDeque};

use httparse::Status;
use log::{debug, trace, warn};

use super::body::{read_body, request_framing, response_framing, BodyStatus};
use super::types::{DecodedRequest, DecodedResponse, Headers};
use crate::stream::{Direction, Stream, StreamChunk};

const INITIAL_HEADER_SLOTS: usize = 64;
const MAX_HEADER_SLOTS: usize = 1024;

/// Callbacks invoked per decoded message.
///
/// `header` and `body` are the raw wire bytes of the message (the body still
/// carries its transfer coding), `chunk` is the chunk in which the message
/// started. Each callback returns the chunks to keep in the result.
pub trait HttpHandler {
    fn handle_request(
        &mut self,
        header: &[u8],
        body: &[u8],
        chunk: &StreamChunk,
        request: &DecodedRequest,
    ) -> Vec<StreamChunk>;

    fn handle_response(
        &mut self,
        header: &[u8],
        body: &[u8],
        chunk: &StreamChunk,
        response: &DecodedResponse,
    ) -> Vec<StreamChunk>;
}

enum Parsed<M> {
    Complete {
        head_len: usize,
        body_len: usize,
        message: M,
    },
    Incomplete,
    Invalid(String),
}

fn latin1(value: &[u8]) -> String {
    value.iter().map(|&b| b as char).collect()
}

fn collect_headers(headers: &[httparse::Header<'_>]) -> Headers {
    headers.iter().map(|h| (h.name, latin1(h.value))).collect()
}

fn finish_request(
    buf: &[u8],
    at_eof: bool,
    head_len: usize,
    line: RequestLine,
    headers: &[httparse::Header<'_>],
) -> Parsed<DecodedRequest> {
    let Some(framing) = request_framing(headers) else {
        return Parsed::Invalid("bad Content-Length".to_string());
    };
    match read_body(framing, &buf[head_len..], at_eof) {
        BodyStatus::Complete { raw_len, decoded } => Parsed::Complete {
            head_len,
            body_len: raw_len,
            message: DecodedRequest {
                method: line.method,
                path: line.path,
                version: line.version,
                headers: collect_headers(headers),
                body: decoded,
            },
        },
        BodyStatus::Incomplete => Parsed::Incomplete,
        BodyStatus::Invalid => Parsed::Invalid("bad chunked body".to_string()),
    }
}

struct RequestLine {
    method: String,
    path: String,
    version: u8,
}

fn parse_request(buf: &[u8], at_eof: bool) -> Parsed<DecodedRequest> {
    let mut slots = INITIAL_HEADER_SLOTS;
    loop {
        let mut headers = vec![httparse::EMPTY_HEADER; slots];
        let mut req = httparse::Request::new(&mut headers);
        match req.parse(buf) {
            Ok(Status::Complete(head_len)) => {
                let line = RequestLine {
                    method: req.method.unwrap_or_default().to_string(),
                    path: req.path.unwrap_or_default().to_string(),
                    version: req.version.unwrap_or(1),
                };
                return finish_request(buf, at_eof, head_len, line, req.headers);
            }
            Ok(Status::Partial) => return Parsed::Incomplete,
            Err(httparse::Error::TooManyHeaders) if slots < MAX_HEADER_SLOTS => slots *= 2,
            Err(
                e @ (httparse::Error::Token
                | httparse::Error::HeaderName
                | httparse::Error::HeaderValue
                | httparse::Error::NewLine),
            ) => return parse_request_leniently(buf, at_eof, e),
            Err(e) => return Parsed::Invalid(e.to_string()),
        }
    }
}

/// Request head as read by a lenient HTTP/1.x server.
enum LenientHead {
    Complete {
        head_len: usize,
        line: RequestLine,
        fields: Vec<(String, Vec<u8>)>,
    },
    Partial,
    Invalid,
}

fn is_token(b: u8) -> bool {
    b.is_ascii_graphic() && !b"\"(),/:;<=>?@[\\]{}".contains(&b)
}

/// Next line without its terminator, and the bytes consumed.
fn next_head_line(buf: &[u8]) -> Option<(&[u8], usize)> {
    let end = buf.iter().position(|&b| b == b'\n')?;
    let line = &buf[..end];
    Some((line.strip_suffix(b"\r").unwrap_or(line), end + 1))
}

/// Reads heads httparse refuses: a request target carrying non-ASCII bytes
/// (decoded as ISO-8859-1) and obs-folded header lines (joined with a space).
fn lenient_request_head(buf: &[u8]) -> LenientHead {
    let Some((request_line, mut pos)) = next_head_line(buf) else {
        let method_ok = buf.iter().take_while(|&&b| b != b' ').all(|&b| is_token(b));
        return if method_ok {
            LenientHead::Partial
        } else {
            LenientHead::Invalid
        };
    };

    let mut parts = request_line.splitn(3, |&b| b == b' ');
    let (Some(method), Some(target), Some(version)) = (parts.next(), parts.next(), parts.next())
    else {
        return LenientHead::Invalid;
    };
    let version = match version {
        b"HTTP/1.1" => 1,
        b"HTTP/1.0" => 0,
        _ => return LenientHead::Invalid,
    };
    if method.is_empty()
        || !method.iter().all(|&b| is_token(b))
        || target.is_empty()
        || target.iter().any(|&b| b <= b' ' || b == 0x7f)
    {
        return LenientHead::Invalid;
    }

    let mut fields: Vec<(String, Vec<u8>)> = Vec::new();
    loop {
        let Some((line, used)) = next_head_line(&buf[pos..]) else {
            return LenientHead::Partial;
        };
        pos += used;
        if line.is_empty() {
            break;
        }
        if matches!(line[0], b' ' | b'\t') {
            let Some((_, value)) = fields.last_mut() else {
                return LenientHead::Invalid;
            };
            value.push(b' ');
            value.extend_from_slice(line.trim_ascii());
            continue;
        }
        let Some(colon) = line.iter().position(|&b| b == b':') else {
            return LenientHead::Invalid;
        };
        let name = &line[..colon];
        if name.is_empty() || !name.iter().all(|&b| is_token(b)) {
            return LenientHead::Invalid;
        }
        fields.push((latin1(name), line[colon + 1..].trim_ascii().to_vec()));
    }

    LenientHead::Complete {
        head_len: pos,
        line: RequestLine {
            method: latin1(method),
            path: latin1(target),
            version,
        },
        fields,
    }
}

fn parse_request_leniently(buf: &[u8], at_eof: bool, err: httparse::Error) -> Parsed<DecodedRequest> {
    match lenient_request_head(buf) {
        LenientHead::Complete {
            head_len,
            line,
            fields,
        } => {
            let headers: Vec<httparse::Header<'_>> = fields
                .iter()
                .map(|(name, value)| httparse::Header {
                    name: name.as_str(),
                    value: value.as_slice(),
                })
                .collect();
            finish_request(buf, at_eof, head_len, line, &headers)
        }
        LenientHead::Partial => Parsed::Incomplete,
        LenientHead::Invalid => Parsed::Invalid(err.to_string()),
    }
}

fn parse_response(buf: &[u8], at_eof: bool, request_method: Option<&str>) -> Parsed<DecodedResponse> {
    let mut slots = INITIAL_HEADER_SLOTS;
    loop {
        let mut headers = vec![httparse::EMPTY_HEADER; slots];
        let mut resp = httparse::Response::new(&mut headers);
        match resp.parse(buf) {
            Ok(Status::Complete(head_len)) => {
                let status = resp.code.unwrap_or_default();
                let Some(framing) = response_framing(resp.headers, status, request_method) else {
                    return Parsed::Invalid("bad Content-Length".to_string());
                };
                return match read_body(framing, &buf[head_len..], at_eof) {
                    BodyStatus::Complete { raw_len, decoded } => Parsed::Complete {
                        head_len,
                        body_len: raw_len,
                        message: DecodedResponse {
                            version: resp.version.unwrap_or(1),
                            status,
                            reason: resp.reason.unwrap_or_default().to_string(),
                            headers: collect_headers(resp.headers),
                            body: decoded,
                        },
                    },
                    BodyStatus::Incomplete => Parsed::Incomplete,
                    BodyStatus::Invalid => Parsed::Invalid("bad chunked body".to_string()),
                };
            }
            Ok(Status::Partial) => return Parsed::Incomplete,
            Err(httparse::Error::TooManyHeaders) if slots < MAX_HEADER_SLOTS => slots *= 2,
            Err(e) => return Parsed::Invalid(e.to_string()),
        }
    }
}

/// Bytes of one chunk still sitting in a direction buffer.
struct Span {
    chunk: usize,
    remaining: usize,
}

/// Unparsed bytes of one direction.
struct Pending {
    buf: Vec<u8>,
    spans: VecDeque<Span>,
    passthrough: bool,
}

impl Pending {
    fn new() -> Self {
        Self {
            buf: Vec::new(),
            spans: VecDeque::new(),
            passthrough: false,
        }
    }

    fn push(&mut self, chunk: usize, content: &[u8]) {
        self.buf.extend_from_slice(content);
        self.spans.push_back(Span {
            chunk,
            remaining: content.len(),
        });
    }

    /// Index of the chunk holding the first buffered byte.
    fn start_chunk(&self) -> Option<usize> {
        self.spans
            .iter()
            .find(|s| s.remaining > 0)
            .or(self.spans.front())
            .map(|s| s.chunk)
    }

    fn consume(&mut self, mut n: usize) {
        self.buf.drain(..n);
        while let Some(front) = self.spans.front_mut() {
            if front.remaining > n {
                front.remaining -= n;
                break;
            }
            n -= front.remaining;
            self.spans.pop_front();
        }
    }

    /// Stops parsing this direction; returns the chunks that still hold bytes.
    fn give_up(&mut self) -> Vec<usize> {
        self.passthrough = true;
        self.buf.clear();
        self.spans
            .drain(..)
            .filter(|s| s.remaining > 0)
            .map(|s| s.chunk)
            .collect()
    }
}

struct Dispatcher<'s, 'h, H: HttpHandler + ?Sized> {
    stream: &'s Stream,
    handler: &'h mut H,
    client: Pending,
    server: Pending,
    /// Methods of requests whose final response has not been seen yet.
    methods: VecDeque<String>,
    kept: Vec<StreamChunk>,
    passthrough: BTreeSet<usize>,
}

impl<'s, 'h, H: HttpHandler + ?Sized> Dispatcher<'s, 'h, H> {
    fn new(stream: &'s Stream, handler: &'h mut H) -> Self {
        Self {
            stream,
            handler,
            client: Pending::new(),
            server: Pending::new(),
            methods: VecDeque::new(),
            kept: Vec::new(),
            passthrough: BTreeSet::new(),
        }
    }

    fn pending(&mut self, direction: Direction) -> &mut Pending {
        match direction {
            Direction::ClientToServer => &mut self.client,
            Direction::ServerToClient => &mut self.server,
        }
    }

    fn give_up(&mut self, direction: Direction, reason: &str) {
        let id = self.stream.metadata.stream_id;
        warn!(
            "[{}] {} data is not HTTP/1.x ({}); keeping it unchanged",
            id,
            direction.label(),
            reason
        );
        let chunks = self.pending(direction).give_up();
        self.passthrough.extend(chunks);
    }

    fn feed(&mut self, index: usize, chunk: &StreamChunk) {
        let pending = self.pending(chunk.direction);
        if pending.passthrough {
            self.passthrough.insert(index);
            return;
        }
        pending.push(index, &chunk.content);
        self.drain(chunk.direction, false);
    }

    fn drain(&mut self, direction: Direction, at_eof: bool) {
        loop {
            let pending = self.pending(direction);
            if pending.passthrough || pending.buf.is_empty() {
                return;
            }
            let Some(start) = pending.start_chunk() else {
                return;
            };
            let progressed = match direction {
                Direction::ClientToServer => self.next_request(start, at_eof),
                Direction::ServerToClient => self.next_response(start, at_eof),
            };
            if !progressed {
                return;
            }
        }
    }

    fn next_request(&mut self, start: usize, at_eof: bool) -> bool {
        let id = self.stream.metadata.stream_id;
        match parse_request(&self.client.buf, at_eof) {
            Parsed::Complete {
                head_len,
                body_len,
                message,
            } => {
                trace!(
                    "[{}] request {} {} ({} header bytes, {} body bytes)",
                    id,
                    message.method,
                    message.path,
                    head_len,
                    body_len
                );
                let end = head_len + body_len;
                let kept = self.handler.handle_request(
                    &self.client.buf[..head_len],
                    &self.client.buf[head_len..end],
                    &self.stream.chunks[start],
                    &message,
                );
                self.kept.extend(kept);
                self.methods.push_back(message.method);
                self.client.consume(end);
                true
            }
            Parsed::Incomplete if at_eof => {
                self.give_up(Direction::ClientToServer, "truncated request head");
                false
            }
            Parsed::Incomplete => false,
            Parsed::Invalid(reason) => {
                self.give_up(Direction::ClientToServer, &reason);
                false
            }
        }
    }

    fn next_response(&mut self, start: usize, at_eof: bool) -> bool {
        let id = self.stream.metadata.stream_id;
        let method = self.methods.front().map(String::as_str);
        match parse_response(&self.server.buf, at_eof, method) {
            Parsed::Complete {
                head_len,
                body_len,
                message,
            } => {
                trace!(
                    "[{}] response {} {} ({} header bytes, {} body bytes)",
                    id,
                    message.status,
                    message.reason,
                    head_len,
                    body_len
                );
                let end = head_len + body_len;
                let kept = self.handler.handle_response(
                    &self.server.buf[..head_len],
                    &self.server.buf[head_len..end],
                    &self.stream.chunks[start],
                    &message,
                );
                self.kept.extend(kept);
                self.server.consume(end);
                if message.status >= 200 {
                    self.methods.pop_front();
                }
                if message.status == 101 {
                    // the connection no longer speaks HTTP/1.x
                    self.give_up(Direction::ServerToClient, "protocol switched");
                    self.give_up(Direction::ClientToServer, "protocol switched");
                    return false;
                }
                true
            }
            Parsed::Incomplete if at_eof => {
                self.give_up(Direction::ServerToClient, "truncated response head");
                false
            }
            Parsed::Incomplete => false,
            Parsed::Invalid(reason) => {
                self.give_up(Direction::ServerToClient, &reason);
                false
            }
        }
    }

    fn finish(mut self) -> Vec<StreamChunk> {
        self.drain(Direction::ClientToServer, true);
        self.drain(Direction::ServerToClient, true);

        let mut kept = self.kept;
        kept.extend(
            self.passthrough
                .iter()
                .map(|&i| self.stream.chunks[i].clone()),
        );
        kept
    }
}

/// Runs every HTTP/1.x message of `stream` through `handler`.
///
/// Returns the chunks kept by the handler callbacks in dispatch order,
/// followed by the original chunks that could not be parsed.
pub fn dispatch<H: HttpHandler + ?Sized>(stream: &Stream, handler: &mut H) -> Vec<StreamChunk> {
    debug!(
        "[{}] dispatching {} chunk(s)",
        stream.metadata.stream_id,
        stream.chunks.len()
    );
    let mut dispatcher = Dispatcher::new(stream, handler);
    for (index, chunk) in stream.chunks.iter().enumerate() {
        dispatcher.feed(index, chunk);
    }
    dispatcher.finish()
}
