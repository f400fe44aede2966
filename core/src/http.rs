//! HTTP vocabulary shared by requests and responses.
//!
//! # Design
//! `Method` is a closed enum; anything the engine needs to know about a
//! method (whether it may carry a body, which verb string to send) lives here
//! so the request state machine can stay declarative.
//!
//! `ResponseHeaders` is built from the raw header lines captured during a
//! transfer. Names are normalized to `Title-Case-With-Hyphens`, lookups are
//! case-insensitive, `get` is last-value-wins and `get_all` keeps every value
//! in arrival order (needed for repeated headers such as `Set-Cookie`).

use std::fmt;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Connect,
    Trace,
    Patch,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Connect => "CONNECT",
            Method::Trace => "TRACE",
            Method::Patch => "PATCH",
        }
    }

    /// Whether parameters or a raw body may be sent with this method.
    pub fn accepts_body(self) -> bool {
        matches!(self, Method::Post | Method::Put | Method::Delete)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalize a header name: `content-type` -> `Content-Type`.
pub fn normalize_name(name: &str) -> String {
    name.trim()
        .split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Response headers captured off the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeaders {
    entries: Vec<(String, Vec<String>)>,
}

impl ResponseHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw wire lines (`Name: value\r\n`). Status lines, the blank
    /// terminator and any other line without a colon are skipped.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut headers = Self::new();
        for line in lines {
            headers.capture_line(line.as_ref());
        }
        headers
    }

    /// Capture a single wire line. Returns `false` if the line was skipped.
    pub fn capture_line(&mut self, line: &str) -> bool {
        let Some((name, value)) = line.split_once(':') else {
            return false;
        };
        let name = normalize_name(name);
        if name.is_empty() {
            return false;
        }
        self.insert(name, value.trim().to_string());
        true
    }

    fn insert(&mut self, name: String, value: String) {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((name, vec![value])),
        }
    }

    /// Last value received for `name`, matched case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).last().map(String::as_str)
    }

    /// Every value received for `name`, in arrival order.
    pub fn get_all(&self, name: &str) -> &[String] {
        let name = normalize_name(name);
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        !self.get_all(name).is_empty()
    }

    /// Iterate `(name, last value)` pairs in first-arrival order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().filter_map(|(name, values)| {
            values.last().map(|value| (name.as_str(), value.as_str()))
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_names_to_title_case() {
        assert_eq!(normalize_name("content-type"), "Content-Type");
        assert_eq!(normalize_name("X-REQUEST-ID"), "X-Request-Id");
        assert_eq!(normalize_name(" etag "), "Etag");
    }

    #[test]
    fn content_type_lookup_is_case_insensitive() {
        let headers = ResponseHeaders::from_lines(["Content-Type: application/json\r\n", "\r\n"]);
        assert_eq!(headers.get("Content-Type"), Some("application/json"));
        assert_eq!(headers.get("content-type"), Some("application/json"));
        assert_eq!(headers.get("CONTENT-TYPE"), Some("application/json"));
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn status_and_blank_lines_are_skipped() {
        let mut headers = ResponseHeaders::new();
        assert!(!headers.capture_line("HTTP/1.1 200 OK\r\n"));
        assert!(!headers.capture_line("\r\n"));
        assert!(headers.is_empty());
    }

    #[test]
    fn splits_on_first_colon_only() {
        let headers = ResponseHeaders::from_lines(["Location: http://example.com:8080/x\r\n"]);
        assert_eq!(headers.get("location"), Some("http://example.com:8080/x"));
    }

    #[test]
    fn last_value_wins_but_all_are_kept() {
        let headers = ResponseHeaders::from_lines([
            "set-cookie: a=1\r\n",
            "Server: one\r\n",
            "Set-Cookie: b=2\r\n",
        ]);
        assert_eq!(headers.get("Set-Cookie"), Some("b=2"));
        assert_eq!(headers.get_all("set-cookie"), ["a=1", "b=2"]);
        let names: Vec<_> = headers.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["Set-Cookie", "Server"]);
    }

    #[test]
    fn only_post_put_delete_accept_body() {
        assert!(Method::Post.accepts_body());
        assert!(Method::Put.accepts_body());
        assert!(Method::Delete.accepts_body());
        assert!(!Method::Get.accepts_body());
        assert!(!Method::Patch.accepts_body());
    }
}
