use tracing::warn;

use super::{strip_name_prefix, Cookie, CookieCodec};
use crate::error::{Error, Result};

/// Marker the engine puts on the domain field of script-hidden cookies.
pub const HTTP_ONLY_MARKER: &str = "#HttpOnly_";

/// Seven tab-separated fields:
/// `domain  subdomains  path  secure  max-age  name  value`.
///
/// `http_only` is written as a `#HttpOnly_` suffix on the domain. Decoding
/// also accepts it as a prefix, which is how the engine writes its own jars,
/// and drops `__Secure-` / `__Host-` name prefixes like the header codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct JarCodec;

fn flag(on: bool) -> &'static str {
    if on {
        "TRUE"
    } else {
        "FALSE"
    }
}

fn parse_flag(field: &str) -> bool {
    field.eq_ignore_ascii_case("TRUE")
}

impl CookieCodec for JarCodec {
    fn encode(&self, cookie: &Cookie) -> String {
        let marker = if cookie.http_only { HTTP_ONLY_MARKER } else { "" };
        format!(
            "{}{marker}\t{}\t{}\t{}\t{}\t{}\t{}",
            cookie.domain,
            flag(cookie.include_subdomains),
            cookie.path,
            flag(cookie.secure),
            cookie.max_age,
            cookie.name(),
            cookie.value(),
        )
    }

    fn decode(&self, text: &str) -> Result<Cookie> {
        let line = text.trim_end_matches(['\r', '\n']);
        let fields: Vec<&str> = line.split('\t').collect();
        let &[domain, subdomains, path, secure, max_age, name, value] = fields.as_slice() else {
            return Err(Error::MalformedCookie(format!(
                "expected 7 jar fields, found {}",
                fields.len()
            )));
        };

        let (domain, http_only) = if let Some(rest) = domain.strip_prefix(HTTP_ONLY_MARKER) {
            (rest, true)
        } else if let Some(rest) = domain.strip_suffix(HTTP_ONLY_MARKER) {
            (rest, true)
        } else {
            (domain, false)
        };
        let max_age = max_age
            .trim()
            .parse::<u64>()
            .map_err(|_| Error::MalformedCookie(format!("invalid max-age {max_age:?}")))?;

        Ok(Cookie::new(strip_name_prefix(name), value)?
            .with_domain(domain)?
            .with_subdomains(parse_flag(subdomains))
            .with_path(path)?
            .secure(parse_flag(secure))
            .with_max_age(max_age)
            .http_only(http_only))
    }
}

/// Decode every cookie in a jar file body.
///
/// Blank lines and comments are ignored; malformed lines are skipped with a
/// warning.
pub fn parse_jar(text: &str) -> Vec<Cookie> {
    let codec = JarCodec;
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && (!line.starts_with('#') || line.starts_with(HTTP_ONLY_MARKER))
        })
        .filter_map(|(number, line)| match codec.decode(line) {
            Ok(cookie) => Some(cookie),
            Err(e) => {
                warn!(line = number + 1, error = %e, "skipping cookie jar line");
                None
            }
        })
        .collect()
}
