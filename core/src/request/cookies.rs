//! Engine-side cookie store of one request.
//!
//! The engine keeps absolute expiry timestamps in its jar lines while
//! `Cookie` carries a relative `max_age`, so cookies are converted on the
//! way in and out.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use super::Request;
use crate::cookie::{parse_jar, Cookie, CookieCodec, JarCodec, HTTP_ONLY_MARKER};
use crate::error::{Error, Result};
use crate::options::TransferOption;

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

/// Jar line the engine accepts: absolute expiry, `#HttpOnly_` as a prefix.
fn engine_line(cookie: &Cookie) -> String {
    let expires = match cookie.max_age() {
        0 => 0,
        seconds => now().saturating_add(seconds),
    };
    let stored = cookie.clone().with_max_age(expires).http_only(false);
    let line = JarCodec.encode(&stored);
    if cookie.is_http_only() {
        format!("{HTTP_ONLY_MARKER}{line}")
    } else {
        line
    }
}

fn from_engine(cookie: Cookie) -> Cookie {
    match cookie.max_age() {
        0 => cookie,
        expires => cookie.with_max_age(expires.saturating_sub(now())),
    }
}

#[derive(Debug)]
pub struct Cookies<'a> {
    request: &'a mut Request,
}

impl<'a> Cookies<'a> {
    pub(super) fn new(request: &'a mut Request) -> Self {
        Self { request }
    }

    fn command(&mut self, option: TransferOption) -> Result<&mut Self> {
        self.request.handle.set(option)?;
        Ok(self)
    }

    /// Forget session cookies loaded from files on the next transfer.
    pub fn start_new_session(&mut self) -> Result<&mut Self> {
        self.command(TransferOption::CookieSession(true))
    }

    pub fn set_file_to_read(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        self.command(TransferOption::CookieFile(path.to_path_buf()))
    }

    /// Jar the engine dumps its cookies to when the handle is dropped or
    /// `flush_all` is called.
    pub fn set_file_to_write(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        self.command(TransferOption::CookieJar(path.to_path_buf()))
    }

    pub fn write(&mut self, cookie: &Cookie) -> Result<&mut Self> {
        self.command(TransferOption::CookieList(engine_line(cookie)))
    }

    /// Every cookie the engine currently holds.
    pub fn get_all(&mut self) -> Result<Vec<Cookie>> {
        let lines = self.request.handle.cookies()?;
        Ok(parse_jar(&lines.join("\n"))
            .into_iter()
            .map(from_engine)
            .collect())
    }

    pub fn flush_all(&mut self) -> Result<&mut Self> {
        self.command(TransferOption::CookieList("FLUSH".to_string()))
    }

    pub fn reload_all(&mut self) -> Result<&mut Self> {
        self.command(TransferOption::CookieList("RELOAD".to_string()))
    }

    pub fn delete_session(&mut self) -> Result<&mut Self> {
        self.command(TransferOption::CookieList("SESS".to_string()))
    }

    pub fn delete_all(&mut self) -> Result<&mut Self> {
        self.command(TransferOption::CookieList("ALL".to_string()))
    }
}
