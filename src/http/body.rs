//! Message body framing for HTTP/1.x.

use httparse::Header;

/// How the body following a message head is delimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Framing {
    Empty,
    Length(usize),
    Chunked,
    UntilClose,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum BodyStatus {
    /// `raw_len` bytes of the buffer belong to the body.
    Complete { raw_len: usize, decoded: Vec<u8> },
    Incomplete,
    Invalid,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Chunked {
    Complete { consumed: usize, decoded: Vec<u8> },
    Partial { decoded: Vec<u8> },
    Invalid,
}

fn is_chunked(headers: &[Header<'_>]) -> bool {
    headers
        .iter()
        .filter(|h| h.name.eq_ignore_ascii_case("transfer-encoding"))
        .filter_map(|h| std::str::from_utf8(h.value).ok())
        .any(|v| {
            v.rsplit(',')
                .next()
                .map(|last| last.trim().eq_ignore_ascii_case("chunked"))
                .unwrap_or(false)
        })
}

/// `Some(None)` when no Content-Length is present, `None` when it is unparsable.
fn content_length(headers: &[Header<'_>]) -> Option<Option<usize>> {
    match headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case("content-length"))
    {
        None => Some(None),
        Some(h) => std::str::from_utf8(h.value)
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .map(Some),
    }
}

/// Requests without Transfer-Encoding or Content-Length carry no body.
pub(crate) fn request_framing(headers: &[Header<'_>]) -> Option<Framing> {
    if is_chunked(headers) {
        return Some(Framing::Chunked);
    }
    Some(match content_length(headers)? {
        Some(n) => Framing::Length(n),
        None => Framing::Empty,
    })
}

pub(crate) fn response_framing(
    headers: &[Header<'_>],
    status: u16,
    request_method: Option<&str>,
) -> Option<Framing> {
    let head_request = request_method
        .map(|m| m.eq_ignore_ascii_case("HEAD"))
        .unwrap_or(false);
    if head_request || (100..200).contains(&status) || status == 204 || status == 304 {
        return Some(Framing::Empty);
    }
    if is_chunked(headers) {
        return Some(Framing::Chunked);
    }
    Some(match content_length(headers)? {
        Some(n) => Framing::Length(n),
        None => Framing::UntilClose,
    })
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

pub(crate) fn decode_chunked(buf: &[u8]) -> Chunked {
    let mut pos = 0usize;
    let mut decoded = Vec::new();
    loop {
        let Some(line_end) = find_crlf(&buf[pos..]) else {
            return Chunked::Partial { decoded };
        };
        let line = &buf[pos..pos + line_end];
        let size_field = line.split(|&b| b == b';').next().unwrap_or(line);
        let size = match std::str::from_utf8(size_field)
            .ok()
            .and_then(|s| usize::from_str_radix(s.trim(), 16).ok())
        {
            Some(size) => size,
            None => return Chunked::Invalid,
        };
        pos += line_end + 2;

        if size == 0 {
            // trailer section, ends with an empty line
            loop {
                let Some(end) = find_crlf(&buf[pos..]) else {
                    return Chunked::Partial { decoded };
                };
                pos += end + 2;
                if end == 0 {
                    return Chunked::Complete {
                        consumed: pos,
                        decoded,
                    };
                }
            }
        }

        let Some(data_end) = pos.checked_add(size) else {
            return Chunked::Invalid;
        };
        if buf.len() < data_end.saturating_add(2) {
            decoded.extend_from_slice(&buf[pos..buf.len().min(data_end)]);
            return Chunked::Partial { decoded };
        }
        decoded.extend_from_slice(&buf[pos..data_end]);
        if &buf[data_end..data_end + 2] != b"\r\n" {
            return Chunked::Invalid;
        }
        pos = data_end + 2;
    }
}

/// Extracts the body from `buf`, which starts right after the message head.
///
/// At end of stream a truncated body is returned with whatever bytes exist.
pub(crate) fn read_body(framing: Framing, buf: &[u8], at_eof: bool) -> BodyStatus {
    match framing {
        Framing::Empty => BodyStatus::Complete {
            raw_len: 0,
            decoded: Vec::new(),
        },
        Framing::Length(n) if buf.len() >= n => BodyStatus::Complete {
            raw_len: n,
            decoded: buf[..n].to_vec(),
        },
        Framing::Length(_) | Framing::UntilClose if at_eof => BodyStatus::Complete {
            raw_len: buf.len(),
            decoded: buf.to_vec(),
        },
        Framing::Length(_) | Framing::UntilClose => BodyStatus::Incomplete,
        Framing::Chunked => match decode_chunked(buf) {
            Chunked::Complete { consumed, decoded } => BodyStatus::Complete {
                raw_len: consumed,
                decoded,
            },
            Chunked::Partial { decoded } if at_eof => BodyStatus::Complete {
                raw_len: buf.len(),
                decoded,
            },
            Chunked::Partial { .. } => BodyStatus::Incomplete,
            Chunked::Invalid => BodyStatus::Invalid,
        },
    }
}
