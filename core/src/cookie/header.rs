use super::{strip_name_prefix, Cookie, CookieCodec};
use crate::error::{Error, Result};

/// `Set-Cookie` header text: `name=value; Domain=..; Path=..; Max-Age=..;
/// Secure; HttpOnly`.
///
/// A leading dot on `Domain` carries `include_subdomains`; a bare `Domain=.`
/// keeps it for a cookie without a domain.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderCodec;

impl HeaderCodec {
    /// `name=value`, as sent in a request `Cookie` header.
    pub fn pair(cookie: &Cookie) -> String {
        format!("{}={}", cookie.name(), cookie.value())
    }
}

impl CookieCodec for HeaderCodec {
    fn encode(&self, cookie: &Cookie) -> String {
        let mut out = Self::pair(cookie);
        if !cookie.domain.is_empty() || cookie.include_subdomains {
            let dot = if cookie.include_subdomains { "." } else { "" };
            out.push_str(&format!("; Domain={dot}{}", cookie.domain));
        }
        out.push_str(&format!("; Path={}", cookie.path));
        if cookie.max_age > 0 {
            out.push_str(&format!("; Max-Age={}", cookie.max_age));
        }
        if cookie.secure {
            out.push_str("; Secure");
        }
        if cookie.http_only {
            out.push_str("; HttpOnly");
        }
        out
    }

    fn decode(&self, text: &str) -> Result<Cookie> {
        let mut parts = text.trim().split(';');
        let pair = parts.next().unwrap_or_default();
        let Some((name, value)) = pair.split_once('=') else {
            return Err(Error::MalformedCookie(format!("missing '=' in {pair:?}")));
        };
        let name = strip_name_prefix(name.trim());
        let mut cookie = Cookie::new(name, value.trim().trim_matches('"'))?;

        for attribute in parts {
            let (key, val) = match attribute.split_once('=') {
                Some((key, val)) => (key.trim(), val.trim()),
                None => (attribute.trim(), ""),
            };
            match key.to_ascii_lowercase().as_str() {
                "domain" => {
                    cookie = cookie
                        .with_domain(val)?
                        .with_subdomains(val.starts_with('.'));
                }
                "path" => cookie = cookie.with_path(val)?,
                "max-age" => {
                    // negative or garbage lifetimes expire immediately
                    cookie.max_age = val.parse::<u64>().unwrap_or(0);
                }
                "secure" => cookie.secure = true,
                "httponly" => cookie.http_only = true,
                _ => {}
            }
        }
        Ok(cookie)
    }
}
