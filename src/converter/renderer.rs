//! Renders one decoded request as one `requests` call.

use super::host_template::HostTemplate;
use super::literal::{bytes_literal, dict_literal, fstring_text, str_literal};
use crate::http::DecodedRequest;

/// Methods with a dedicated `Session` helper (`s.get(...)`, `s.post(...)`, ...).
pub const SHORTHAND_METHODS: [&str; 6] = ["get", "post", "put", "delete", "head", "patch"];

/// Name the preamble binds the `requests.Session` to.
pub const SESSION_VAR: &str = "s";

/// How the call names its HTTP method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallForm {
    /// `s.<method>(url, ...)`, keyed by the lower-cased method.
    Shorthand(&'static str),
    /// `s.request(<method>, url, ...)`; anything outside the shortlist,
    /// carrying the method exactly as captured.
    Generic(String),
}

impl CallForm {
    pub fn classify(method: &str) -> Self {
        let lower = method.to_lowercase();
        match SHORTHAND_METHODS.iter().copied().find(|m| *m == lower) {
            Some(m) => CallForm::Shorthand(m),
            None => CallForm::Generic(method.to_string()),
        }
    }
}

/// Appends `r = s.<call>(f"http://<host><path>"[, headers=...][, data=...])`
/// and a newline to `out`.
pub fn render_request(request: &DecodedRequest, host: &HostTemplate, out: &mut String) {
    out.push_str("r = ");
    out.push_str(SESSION_VAR);
    match CallForm::classify(&request.method) {
        CallForm::Shorthand(name) => {
            out.push('.');
            out.push_str(name);
            out.push('(');
        }
        CallForm::Generic(method) => {
            out.push_str(".request(");
            out.push_str(&str_literal(&method));
            out.push_str(", ");
        }
    }

    out.push_str("f\"http://");
    out.push_str(host.as_str());
    out.push_str(&fstring_text(&request.path));
    out.push('"');

    if !request.headers.is_empty() {
        out.push_str(", headers=");
        out.push_str(&dict_literal(request.headers.iter()));
    }
    if !request.body.is_empty() {
        out.push_str(", data=");
        out.push_str(&bytes_literal(&request.body));
    }
    out.push_str(")\n");
}
