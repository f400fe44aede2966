use super::Request;
use crate::cookie::{Cookie, HeaderCodec};
use crate::error::{Error, Result};
use crate::http::normalize_name;
use crate::options::{TimeCondition, TransferOption};

/// Headers set by a dedicated method and the method that owns each.
const OWNED: &[(&str, &str)] = &[
    ("If-Modified-Since", "set_if_modified_since"),
    ("If-Unmodified-Since", "set_if_unmodified_since"),
    ("User-Agent", "set_user_agent"),
    ("Referer", "set_referer"),
    ("Cookie", "add_cookie"),
];

#[derive(Debug)]
pub struct Headers<'a> {
    request: &'a mut Request,
}

impl<'a> Headers<'a> {
    pub(super) fn new(request: &'a mut Request) -> Self {
        Self { request }
    }

    fn set(&mut self, option: TransferOption) -> Result<&mut Self> {
        self.request.handle.set(option)?;
        Ok(self)
    }

    /// Only fetch if changed after `timestamp` (unix seconds).
    pub fn set_if_modified_since(&mut self, timestamp: i64) -> Result<&mut Self> {
        self.set(TransferOption::TimeCondition(TimeCondition::IfModifiedSince))?
            .set(TransferOption::TimeValue(timestamp))
    }

    pub fn set_if_unmodified_since(&mut self, timestamp: i64) -> Result<&mut Self> {
        self.set(TransferOption::TimeCondition(TimeCondition::IfUnmodifiedSince))?
            .set(TransferOption::TimeValue(timestamp))
    }

    pub fn set_user_agent(&mut self, agent: &str) -> Result<&mut Self> {
        self.set(TransferOption::UserAgent(agent.to_string()))
    }

    pub fn set_referer(&mut self, referer: &str) -> Result<&mut Self> {
        self.set(TransferOption::Referer(referer.to_string()))
    }

    /// Send `cookie` in the request `Cookie` header.
    pub fn add_cookie(&mut self, cookie: &Cookie) -> Result<&mut Self> {
        let settings = &mut self.request.settings;
        settings.cookie_pairs.push(HeaderCodec::pair(cookie));
        let joined = settings.cookie_pairs.join("; ");
        self.set(TransferOption::Cookie(joined))
    }

    pub fn add_custom_header(&mut self, name: &str, value: &str) -> Result<&mut Self> {
        let name = normalize_name(name);
        if let Some(&(_, method)) = OWNED.iter().find(|(owned, _)| *owned == name) {
            return Err(Error::HeaderConflict {
                header: name,
                method,
            });
        }
        let settings = &mut self.request.settings;
        settings.header_lines.push(format!("{name}: {value}"));
        let lines = settings.header_lines.clone();
        self.set(TransferOption::HttpHeaders(lines))
    }
}
