//! Target address placeholder for generated URLs.
//!
//! The generated script reads the target address from `argv[1]` into a
//! variable named `IP`; every URL interpolates it as `{IP}` inside an
//! f-string, so the address is only resolved when the script runs.

use std::fmt;

use crate::stream::StreamMetadata;

/// Port implied by the `http://` scheme the renderer emits.
pub const DEFAULT_HTTP_PORT: u16 = 80;

/// Interpolation of the script's address variable.
pub const IP_PLACEHOLDER: &str = "{IP}";

/// Shape of the recorded server host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKind {
    Ipv4OrHostname,
    /// Must be bracketed inside a URL.
    Ipv6Literal,
}

impl HostKind {
    /// Any colon in the host text is taken to mean an IPv6 literal.
    pub fn classify(host: &str) -> Self {
        if host.contains(':') {
            HostKind::Ipv6Literal
        } else {
            HostKind::Ipv4OrHostname
        }
    }
}

/// Host part of every URL rendered for one stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostTemplate {
    kind: HostKind,
    port: u16,
    rendered: String,
}

impl HostTemplate {
    pub fn new(host: &str, port: u16) -> Self {
        let kind = HostKind::classify(host);
        let mut rendered = match kind {
            HostKind::Ipv6Literal => format!("[{}]", IP_PLACEHOLDER),
            HostKind::Ipv4OrHostname => IP_PLACEHOLDER.to_string(),
        };
        if port != DEFAULT_HTTP_PORT {
            rendered.push_str(&format!(":{}", port));
        }
        Self {
            kind,
            port,
            rendered,
        }
    }

    pub fn for_stream(metadata: &StreamMetadata) -> Self {
        Self::new(&metadata.server_host, metadata.server_port)
    }

    pub fn kind(&self) -> HostKind {
        self.kind
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn has_port_suffix(&self) -> bool {
        self.port != DEFAULT_HTTP_PORT
    }

    pub fn as_str(&self) -> &str {
        &self.rendered
    }
}

impl fmt::Display for HostTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}
