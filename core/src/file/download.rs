use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::progress::{Direction, ProgressHandler, ProgressTracker};
use crate::config::ExecuteOptions;
use crate::error::{Error, Result};
use crate::http::Method;
use crate::options::{TransferOption, DOWNLOAD_COVERED};
use crate::request::{Cookies, Headers, Proxy, Request, RequestState, Ssl};
use crate::response::Response;

/// GET request whose body streams into a local file.
///
/// The target is opened by `set_file` and closed when `execute` returns, so
/// every download needs its own `set_file` call.
#[derive(Debug)]
pub struct FileDownload {
    request: Request,
    target: Option<PathBuf>,
}

impl Default for FileDownload {
    fn default() -> Self {
        Self::new()
    }
}

impl FileDownload {
    pub fn new() -> Self {
        Self {
            request: Request::with_overlay(DOWNLOAD_COVERED),
            target: None,
        }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub(crate) fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }

    pub(crate) fn into_parts(self) -> (Request, Option<PathBuf>) {
        (self.request, self.target)
    }

    pub(crate) fn from_parts(request: Request, target: Option<PathBuf>) -> Self {
        Self { request, target }
    }

    pub fn target(&self) -> Option<&Path> {
        self.target.as_deref()
    }

    pub fn set_url(&mut self, url: &str) -> Result<&mut Self> {
        self.request.set_url(url)?;
        Ok(self)
    }

    /// Only GET is supported.
    pub fn set_method(&mut self, method: Method) -> Result<&mut Self> {
        if method != Method::Get {
            return Err(Error::UnsupportedMethod(method));
        }
        self.request.set_method(method);
        Ok(self)
    }

    /// Create (or truncate) the file the body is written to.
    pub fn set_file(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        let path = path.as_ref();
        let file = File::create(path)?;
        self.request.handle_mut().sink_mut().set_target(file);
        self.target = Some(path.to_path_buf());
        self.request.set_return_transfer(true);
        Ok(self)
    }

    /// Report `(total, downloaded)` while the body arrives.
    pub fn set_progress_handler(
        &mut self,
        handler: impl ProgressHandler + 'static,
    ) -> Result<&mut Self> {
        let tracker = ProgressTracker::new(Box::new(handler), Direction::Download);
        let handle = self.request.handle_mut();
        handle.set(TransferOption::BufferSize(tracker.buffer_size()))?;
        handle.set(TransferOption::Progress(true))?;
        handle.sink_mut().set_progress(tracker);
        Ok(self)
    }

    pub fn set_headers(&mut self) -> Headers<'_> {
        self.request.set_headers()
    }

    pub fn set_cookies(&mut self) -> Cookies<'_> {
        self.request.set_cookies()
    }

    pub fn set_ssl(&mut self, ca_bundle: impl AsRef<Path>) -> Result<Ssl<'_>> {
        self.request.set_ssl(ca_bundle)
    }

    pub fn set_proxy(&mut self) -> Proxy<'_> {
        self.request.set_proxy()
    }

    pub fn set_custom_option(&mut self, option: TransferOption) -> Result<&mut Self> {
        self.request.set_custom_option(option)?;
        Ok(self)
    }

    pub fn prepare(&mut self, options: &ExecuteOptions) -> Result<()> {
        if self.request.state() == RequestState::Prepared {
            return Ok(());
        }
        if !self.request.handle().sink().has_target() {
            return Err(Error::MissingFileTarget);
        }
        self.request.prepare(options)
    }

    /// Download into the target file. The returned response has an empty
    /// body.
    pub fn execute(&mut self, options: &ExecuteOptions) -> Result<Response> {
        self.prepare(options)?;
        let response = self.request.execute(options)?;
        debug!(target = ?self.target, status = response.status(), "download finished");
        Ok(response)
    }
}
