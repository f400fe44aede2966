//! Immutable result of one executed request.

use std::borrow::Cow;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::cookie::{Cookie, CookieCodec, HeaderCodec};
use crate::error::{Error, Result};
use crate::http::ResponseHeaders;
use crate::transfer::{TransferHandle, TransferInfo};

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    url: String,
    status: u32,
    duration_ms: u64,
    body: Vec<u8>,
    headers: ResponseHeaders,
    info: TransferInfo,
}

impl Response {
    /// Snapshot a finished handle. `elapsed` overrides the engine's own
    /// timing when the caller measured the call itself.
    pub(crate) fn capture(
        handle: &mut TransferHandle,
        body: Vec<u8>,
        elapsed: Option<Duration>,
    ) -> Result<Self> {
        let info = handle.info()?;
        let duration = elapsed.unwrap_or(info.total_time);
        Ok(Self {
            url: handle.effective_url()?,
            status: handle.status_code()?,
            duration_ms: duration.as_millis() as u64,
            body,
            headers: ResponseHeaders::from_lines(handle.sink().header_lines()),
            info,
        })
    }

    /// Effective URL, after any followed redirects.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn status(&self) -> u32 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    /// Body as text; invalid UTF-8 is replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(Error::Decode)
    }

    pub fn headers(&self) -> &ResponseHeaders {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn info(&self) -> &TransferInfo {
        &self.info
    }

    /// Cookies set by this response. Unparseable `Set-Cookie` values are
    /// left out.
    pub fn cookies(&self) -> Vec<Cookie> {
        self.headers
            .get_all("Set-Cookie")
            .iter()
            .filter_map(|value| HeaderCodec.decode(value).ok())
            .collect()
    }
}

#[cfg(test)]
impl Response {
    pub(crate) fn fixture(status: u32, body: &[u8], header_lines: &[&str]) -> Self {
        Self {
            url: "http://localhost/".to_string(),
            status,
            duration_ms: 0,
            body: body.to_vec(),
            headers: ResponseHeaders::from_lines(header_lines),
            info: TransferInfo::default(),
        }
    }
}
