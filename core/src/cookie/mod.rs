//! Cookies and their two text encodings.
//!
//! # Design
//! `Cookie` is the common entity. `JarCodec` reads and writes the
//! tab-separated lines of on-disk cookie jars (what the engine loads and
//! dumps); `HeaderCodec` handles `Set-Cookie` / `Cookie` header text. Each
//! codec round-trips its own output; a cookie moved from one format to the
//! other may lose attributes the target format cannot carry.

mod header;
mod jar;

pub use header::HeaderCodec;
pub use jar::{parse_jar, JarCodec, HTTP_ONLY_MARKER};

use crate::error::{Error, Result};

/// Name prefixes that only restate `secure`; decoders drop them.
const NAME_PREFIXES: [&str; 2] = ["__Secure-", "__Host-"];

fn strip_name_prefix(name: &str) -> &str {
    NAME_PREFIXES
        .iter()
        .find_map(|prefix| name.strip_prefix(prefix))
        .unwrap_or(name)
}

/// A cookie both codecs can carry unchanged.
///
/// Fields are only set through the checked constructors, so every `Cookie`
/// survives `decode(encode(c))` in either format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    name: String,
    value: String,
    path: String,
    domain: String,
    include_subdomains: bool,
    /// Lifetime in seconds; 0 marks a session cookie.
    max_age: u64,
    /// Only sent over TLS.
    secure: bool,
    /// Hidden from scripts.
    http_only: bool,
}

fn malformed(message: String) -> Error {
    Error::MalformedCookie(message)
}

/// Control characters (tab included) and `;` split fields in one format or
/// the other.
fn splits_fields(text: &str) -> bool {
    text.chars().any(|c| c.is_control() || c == ';')
}

fn padded(text: &str) -> bool {
    text.trim() != text
}

fn check_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(malformed("cookie name is empty".to_string()));
    }
    if splits_fields(name) || name.contains(['=', '"']) || name.contains(char::is_whitespace) {
        return Err(malformed(format!("invalid cookie name {name:?}")));
    }
    if NAME_PREFIXES.iter().any(|prefix| name.starts_with(prefix)) {
        return Err(malformed(format!("cookie name {name:?} keeps its security prefix")));
    }
    Ok(())
}

fn check_value(name: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(malformed(format!("cookie {name} has no value")));
    }
    if splits_fields(value) || padded(value) || value.contains('"') {
        return Err(malformed(format!("invalid value {value:?} for cookie {name}")));
    }
    Ok(())
}

impl Cookie {
    pub fn new(name: &str, value: &str) -> Result<Self> {
        check_name(name)?;
        check_value(name, value)?;
        Ok(Self {
            name: name.to_string(),
            value: value.to_string(),
            path: "/".to_string(),
            domain: String::new(),
            include_subdomains: false,
            max_age: 0,
            secure: false,
            http_only: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn include_subdomains(&self) -> bool {
        self.include_subdomains
    }

    pub fn max_age(&self) -> u64 {
        self.max_age
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn is_http_only(&self) -> bool {
        self.http_only
    }

    pub fn is_session(&self) -> bool {
        self.max_age == 0
    }

    /// An empty path means `/`.
    pub fn with_path(mut self, path: &str) -> Result<Self> {
        if splits_fields(path) || padded(path) {
            return Err(malformed(format!("invalid cookie path {path:?}")));
        }
        self.path = if path.is_empty() { "/".to_string() } else { path.to_string() };
        Ok(self)
    }

    /// Leading dots are dropped; subdomain matching is `with_subdomains`.
    pub fn with_domain(mut self, domain: &str) -> Result<Self> {
        if splits_fields(domain)
            || domain.contains(['#', '"'])
            || domain.contains(char::is_whitespace)
        {
            return Err(malformed(format!("invalid cookie domain {domain:?}")));
        }
        self.domain = domain.trim_start_matches('.').to_string();
        Ok(self)
    }

    pub fn with_subdomains(mut self, include: bool) -> Self {
        self.include_subdomains = include;
        self
    }

    pub fn with_max_age(mut self, seconds: u64) -> Self {
        self.max_age = seconds;
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }
}

/// A textual cookie format.
pub trait CookieCodec {
    fn encode(&self, cookie: &Cookie) -> String;
    fn decode(&self, text: &str) -> Result<Cookie>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_name_or_value_is_rejected() {
        assert!(matches!(Cookie::new("", "v"), Err(Error::MalformedCookie(_))));
        assert!(matches!(Cookie::new("n", ""), Err(Error::MalformedCookie(_))));
    }

    #[test]
    fn defaults_to_root_path_session_cookie() {
        let cookie = Cookie::new("hello", "world").unwrap();
        assert_eq!(cookie.path(), "/");
        assert!(cookie.is_session());
        assert!(!cookie.is_secure() && !cookie.is_http_only());
    }

    #[test]
    fn empty_path_normalizes_to_root() {
        let cookie = Cookie::new("a", "b").unwrap().with_path("").unwrap();
        assert_eq!(cookie.path(), "/");
    }

    #[test]
    fn values_the_formats_cannot_carry_are_rejected() {
        for value in ["\"q\"", " v ", "x;y", "a\tb", "line\nbreak"] {
            assert!(
                matches!(Cookie::new("a", value), Err(Error::MalformedCookie(_))),
                "{value:?}"
            );
        }
        assert_eq!(Cookie::new("a", "x y=z,w").unwrap().value(), "x y=z,w");
    }

    #[test]
    fn names_the_formats_cannot_carry_are_rejected() {
        for name in ["a=b", "a b", "a;b", "__Host-sid", "__Secure-id", "a\tb"] {
            assert!(
                matches!(Cookie::new(name, "v"), Err(Error::MalformedCookie(_))),
                "{name:?}"
            );
        }
    }

    #[test]
    fn domain_drops_leading_dot() {
        let cookie = Cookie::new("a", "b").unwrap().with_domain(".example.com").unwrap();
        assert_eq!(cookie.domain(), "example.com");
        assert!(!cookie.include_subdomains());
    }

    #[test]
    fn domain_and_path_reject_separators() {
        let cookie = Cookie::new("a", "b").unwrap();
        assert!(cookie.clone().with_domain("ex ample.com").is_err());
        assert!(cookie.clone().with_domain("example.com#HttpOnly_").is_err());
        assert!(cookie.clone().with_path("/a;b").is_err());
        assert!(cookie.with_path(" /a").is_err());
    }
}
