use std::fs::File;
use std::path::Path;

use tracing::debug;

use super::progress::{Direction, ProgressHandler, ProgressTracker};
use crate::config::ExecuteOptions;
use crate::error::{Error, Result};
use crate::http::Method;
use crate::options::{TransferOption, UPLOAD_COVERED};
use crate::request::{Cookies, Headers, Proxy, Request, RequestState, Ssl};
use crate::response::Response;

/// PUT of a local file, or POST of a raw body.
#[derive(Debug)]
pub struct FileUpload {
    request: Request,
    source_size: Option<u64>,
}

impl Default for FileUpload {
    fn default() -> Self {
        Self::new()
    }
}

impl FileUpload {
    pub fn new() -> Self {
        let mut request = Request::with_overlay(UPLOAD_COVERED);
        request.set_method(Method::Put);
        Self {
            request,
            source_size: None,
        }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub(crate) fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }

    pub(crate) fn into_parts(self) -> (Request, Option<u64>) {
        (self.request, self.source_size)
    }

    pub(crate) fn from_parts(request: Request, source_size: Option<u64>) -> Self {
        Self {
            request,
            source_size,
        }
    }

    pub fn set_url(&mut self, url: &str) -> Result<&mut Self> {
        self.request.set_url(url)?;
        Ok(self)
    }

    /// POST or PUT (the default).
    pub fn set_method(&mut self, method: Method) -> Result<&mut Self> {
        if !matches!(method, Method::Post | Method::Put) {
            return Err(Error::UnsupportedMethod(method));
        }
        self.request.set_method(method);
        Ok(self)
    }

    /// Source streamed by a PUT upload.
    pub fn set_file(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let file = File::open(path)?;
        self.source_size = Some(file.metadata()?.len());
        self.request.handle_mut().sink_mut().set_source(file);
        self.request.set_return_transfer(true);
        Ok(self)
    }

    /// Body sent by a POST upload.
    pub fn set_raw(&mut self, body: impl Into<Vec<u8>>) -> &mut Self {
        self.request.set_raw(body);
        self
    }

    /// Report `(total, uploaded)` while the body is sent.
    pub fn set_progress_handler(
        &mut self,
        handler: impl ProgressHandler + 'static,
    ) -> Result<&mut Self> {
        let tracker = ProgressTracker::new(Box::new(handler), Direction::Upload);
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
        let method = self.request.method();
        let has_file = self.request.handle().sink().has_source();
        match method {
            Method::Put if !has_file => return Err(Error::MissingFileSource),
            Method::Put if self.request.has_body() => return Err(Error::InvalidBodyUsage(method)),
            Method::Post if has_file => return Err(Error::InvalidBodyUsage(method)),
            Method::Post if !self.request.has_body() => return Err(Error::MissingBody),
            _ => {}
        }
        // clearing the upload flag resets the engine to GET, so it goes first
        self.request
            .handle_mut()
            .set(TransferOption::Upload(false))?;
        self.request.prepare(options)?;

        if let (Method::Put, Some(size)) = (method, self.source_size) {
            let handle = self.request.handle_mut();
            handle.set(TransferOption::Upload(true))?;
            handle.set(TransferOption::InFileSize(size))?;
        }
        Ok(())
    }

    pub fn execute(&mut self, options: &ExecuteOptions) -> Result<Response> {
        self.prepare(options)?;
        let response = self.request.execute(options)?;
        debug!(method = %self.request.method(), status = response.status(), "upload finished");
        Ok(response)
    }
}
