//! Python source literals.
//!
//! `str_literal` and `bytes_literal` produce the same text as Python's
//! `repr()` for the values the converter emits, so the generated script reads
//! like one written by hand and evaluates back to the captured data.

/// Python picks double quotes only when the text holds a single quote and no
/// double quote.
fn quote_for(has_single: bool, has_double: bool) -> char {
    if has_single && !has_double {
        '"'
    } else {
        '\''
    }
}

fn is_printable(c: char) -> bool {
    if c.is_control() {
        return false;
    }
    if c.is_whitespace() && c != ' ' {
        return false;
    }
    !matches!(
        c,
        '\u{ad}' | '\u{200b}'..='\u{200f}' | '\u{2060}'..='\u{2064}' | '\u{feff}'
    )
}

fn push_hex_escape(out: &mut String, c: char) {
    let code = c as u32;
    if code <= 0xff {
        out.push_str(&format!("\\x{:02x}", code));
    } else if code <= 0xffff {
        out.push_str(&format!("\\u{:04x}", code));
    } else {
        out.push_str(&format!("\\U{:08x}", code));
    }
}

/// Renders `text` as a Python `str` literal.
pub fn str_literal(text: &str) -> String {
    let quote = quote_for(text.contains('\''), text.contains('"'));
    let mut out = String::with_capacity(text.len() + 2);
    out.push(quote);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if is_printable(c) => out.push(c),
            c => push_hex_escape(&mut out, c),
        }
    }
    out.push(quote);
    out
}

/// Renders `data` as a Python `bytes` literal. Any byte sequence round-trips.
pub fn bytes_literal(data: &[u8]) -> String {
    let quote = quote_for(data.contains(&b'\''), data.contains(&b'"')) as u8;
    let mut out = String::with_capacity(data.len() + 3);
    out.push('b');
    out.push(quote as char);
    for &b in data {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            b if b == quote => {
                out.push('\\');
                out.push(b as char);
            }
            0x20..=0x7e => out.push(b as char),
            b => out.push_str(&format!("\\x{:02x}", b)),
        }
    }
    out.push(quote as char);
    out
}

/// Escapes `text` for the literal part of a double-quoted f-string so that
/// the evaluated string equals `text`.
pub fn fstring_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '{' => out.push_str("{{"),
            '}' => out.push_str("}}"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if is_printable(c) => out.push(c),
            c => push_hex_escape(&mut out, c),
        }
    }
    out
}

/// Renders ordered pairs as a Python `dict` display.
pub fn dict_literal<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let entries: Vec<String> = pairs
        .into_iter()
        .map(|(k, v)| format!("{}: {}", str_literal(k), str_literal(v)))
        .collect();
    format!("{{{}}}", entries.join(", "))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Evaluates a Python bytes literal as produced by `bytes_literal`.
    pub(crate) fn eval_bytes_literal(lit: &str) -> Vec<u8> {
        let inner = lit.strip_prefix('b').expect("bytes prefix");
        let quote = inner.chars().next().expect("opening quote");
        assert!(quote == '\'' || quote == '"');
        let body = &inner[1..inner.len() - 1];
        assert!(inner.ends_with(quote));

        let mut out = Vec::new();
        let mut chars = body.chars();
        while let Some(c) = chars.next() {
            if c == quote {
                panic!("unescaped quote in {}", lit);
            }
            if c != '\\' {
                assert!(c.is_ascii() && !c.is_ascii_control(), "raw {:?} in bytes literal", c);
                out.push(c as u8);
                continue;
            }
            match chars.next().expect("dangling backslash") {
                '\\' => out.push(b'\\'),
                '\'' => out.push(b'\''),
                '"' => out.push(b'"'),
                'n' => out.push(b'\n'),
                'r' => out.push(b'\r'),
                't' => out.push(b'\t'),
                'x' => {
                    let hex: String = chars.by_ref().take(2).collect();
                    out.push(u8::from_str_radix(&hex, 16).expect("hex escape"));
                }
                other => panic!("unsupported escape \\{}", other),
            }
        }
        out
    }

    #[test]
    fn str_literal_matches_python_repr() {
        assert_eq!(str_literal("text/html"), "'text/html'");
        assert_eq!(str_literal("it's"), "\"it's\"");
        assert_eq!(str_literal("both ' and \""), "'both \\' and \"'");
        assert_eq!(str_literal("a\\b"), "'a\\\\b'");
        assert_eq!(str_literal("line\r\nnext"), "'line\\r\\nnext'");
        assert_eq!(str_literal("\u{0}\u{1b}\u{7f}"), "'\\x00\\x1b\\x7f'");
        assert_eq!(str_literal("caf\u{e9}"), "'caf\u{e9}'");
        assert_eq!(str_literal("\u{a0}\u{ad}\u{85}"), "'\\xa0\\xad\\x85'");
        assert_eq!(str_literal("\u{2028}"), "'\\u2028'");
    }

    #[test]
    fn bytes_literal_matches_python_repr() {
        assert_eq!(bytes_literal(b"x=1"), "b'x=1'");
        assert_eq!(bytes_literal(b"{\"a\": 1}"), "b'{\"a\": 1}'");
        assert_eq!(bytes_literal(b"it's"), "b\"it's\"");
        assert_eq!(bytes_literal(b"\x00\xff\n"), "b'\\x00\\xff\\n'");
        assert_eq!(bytes_literal(b""), "b''");
    }

    #[test]
    fn fstring_text_escapes_syntax() {
        assert_eq!(fstring_text("/status"), "/status");
        assert_eq!(fstring_text("/q?x={a}"), "/q?x={{a}}");
        assert_eq!(fstring_text("/\"\\"), "/\\\"\\\\");
    }

    #[test]
    fn dict_literal_keeps_order() {
        let pairs = vec![("Host", "x"), ("Accept", "*/*")];
        assert_eq!(dict_literal(pairs), "{'Host': 'x', 'Accept': '*/*'}");
    }

    #[test]
    fn every_byte_value_round_trips() {
        let all: Vec<u8> = (0..=255u8).collect();
        assert_eq!(eval_bytes_literal(&bytes_literal(&all)), all);
    }

    proptest! {
        #[test]
        fn bytes_literal_round_trips(data in prop::collection::vec(any::<u8>(), 0..512)) {
            let lit = bytes_literal(&data);
            prop_assert!(!lit.contains('\n'));
            prop_assert_eq!(eval_bytes_literal(&lit), data);
        }
    }
}
