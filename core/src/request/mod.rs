//! Request configuration, validation and execution.
//!
//! # Design
//! A `Request` owns its `TransferHandle` and moves through
//! `New -> Configured -> Prepared -> Executed`. Configuration calls go
//! through small borrowing builders (`set_headers()`, `set_cookies()`, ...)
//! that apply options to the handle immediately. Everything that depends on
//! several settings at once (method verb, body encoding, SSL defaults,
//! redirect policy) is resolved in `prepare`, which runs at most once per
//! configuration and never touches the network.

mod cookies;
mod headers;
mod parameters;
mod proxy;
mod ssl;

pub use cookies::Cookies;
pub use headers::Headers;
pub use parameters::Parameters;
pub use proxy::Proxy;
pub use ssl::Ssl;

use std::time::Instant;

use curl::easy::Form;
use tracing::debug;
use url::Url;

use crate::config::ExecuteOptions;
use crate::error::{Error, Result};
use crate::http::Method;
use crate::options::{covering_method, Coverage, TransferOption};
use crate::response::Response;
use crate::transfer::{TransferHandle, UploadFile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestState {
    #[default]
    New,
    Configured,
    Prepared,
    Executed,
}

/// Everything a request knows besides its engine handle.
#[derive(Debug, Default)]
pub(crate) struct Settings {
    url: Option<Url>,
    method: Method,
    state: RequestState,
    explicit_ssl: bool,
    return_transfer: bool,
    params: Vec<(String, String)>,
    files: Vec<(String, UploadFile)>,
    raw: Option<Vec<u8>>,
    header_lines: Vec<String>,
    cookie_pairs: Vec<String>,
    custom_verb: bool,
    overlay: &'static [Coverage],
}

impl Settings {
    fn has_body(&self) -> bool {
        !self.params.is_empty() || !self.files.is_empty() || self.raw.is_some()
    }
}

#[derive(Debug)]
pub struct Request {
    settings: Settings,
    handle: TransferHandle,
}

impl Default for Request {
    fn default() -> Self {
        Self::new()
    }
}

impl Request {
    pub fn new() -> Self {
        Self {
            settings: Settings {
                return_transfer: true,
                ..Default::default()
            },
            handle: TransferHandle::new(),
        }
    }

    /// Shorthand for `new()` followed by `set_url(url)`.
    pub fn get(url: &str) -> Result<Self> {
        let mut request = Self::new();
        request.set_url(url)?;
        Ok(request)
    }

    pub(crate) fn with_overlay(overlay: &'static [Coverage]) -> Self {
        let mut request = Self::new();
        request.settings.overlay = overlay;
        request
    }

    pub(crate) fn into_parts(self) -> (Settings, TransferHandle) {
        (self.settings, self.handle)
    }

    pub(crate) fn from_parts(settings: Settings, handle: TransferHandle) -> Self {
        Self { settings, handle }
    }

    pub fn state(&self) -> RequestState {
        self.settings.state
    }

    pub fn url(&self) -> Option<&Url> {
        self.settings.url.as_ref()
    }

    pub fn method(&self) -> Method {
        self.settings.method
    }

    pub fn has_body(&self) -> bool {
        self.settings.has_body()
    }

    pub fn has_ssl(&self) -> bool {
        self.settings.explicit_ssl
    }

    pub fn return_transfer(&self) -> bool {
        self.settings.return_transfer
    }

    pub fn handle(&self) -> &TransferHandle {
        &self.handle
    }

    pub(crate) fn handle_mut(&mut self) -> &mut TransferHandle {
        &mut self.handle
    }

    fn touch(&mut self) {
        self.settings.state = RequestState::Configured;
    }

    /// Absolute URL with a host.
    pub fn set_url(&mut self, url: &str) -> Result<&mut Self> {
        let parsed = Url::parse(url).map_err(|_| Error::InvalidUrl(url.to_string()))?;
        if !parsed.has_host() {
            return Err(Error::InvalidUrl(url.to_string()));
        }
        self.handle.set(TransferOption::Url(parsed.as_str().to_string()))?;
        self.settings.url = Some(parsed);
        self.touch();
        Ok(self)
    }

    pub fn set_method(&mut self, method: Method) -> &mut Self {
        self.settings.method = method;
        self.touch();
        self
    }

    /// Form parameters sent as the body.
    pub fn set_parameters(&mut self) -> Parameters<'_> {
        self.settings.raw = None;
        self.touch();
        Parameters::new(self)
    }

    /// Raw body sent verbatim, replacing any parameters.
    pub fn set_raw(&mut self, body: impl Into<Vec<u8>>) -> &mut Self {
        self.settings.params.clear();
        self.settings.files.clear();
        self.settings.raw = Some(body.into());
        self.touch();
        self
    }

    pub fn set_headers(&mut self) -> Headers<'_> {
        self.touch();
        Headers::new(self)
    }

    pub fn set_cookies(&mut self) -> Cookies<'_> {
        self.touch();
        Cookies::new(self)
    }

    /// Verify peer and host against `ca_bundle`.
    pub fn set_ssl(&mut self, ca_bundle: impl AsRef<std::path::Path>) -> Result<Ssl<'_>> {
        self.touch();
        Ssl::new(self, ca_bundle.as_ref())
    }

    pub fn set_proxy(&mut self) -> Proxy<'_> {
        self.touch();
        Proxy::new(self)
    }

    /// Set an engine option that no dedicated method covers.
    pub fn set_custom_option(&mut self, option: TransferOption) -> Result<&mut Self> {
        let id = option.id();
        if let Some(method) = covering_method(id, self.settings.overlay) {
            return Err(Error::ConfigConflict { option: id, method });
        }
        self.handle.set(option)?;
        self.touch();
        Ok(self)
    }

    /// Keep the body and headers of the response (on by default).
    pub fn set_return_transfer(&mut self, enabled: bool) -> &mut Self {
        self.settings.return_transfer = enabled;
        self.touch();
        self
    }

    /// Validate the configuration and resolve it into engine options.
    ///
    /// Does nothing if the request is already prepared.
    pub fn prepare(&mut self, options: &ExecuteOptions) -> Result<()> {
        if self.settings.state == RequestState::Prepared {
            return Ok(());
        }
        let Some(url) = self.settings.url.clone() else {
            return Err(Error::MissingUrl);
        };
        let method = self.settings.method;
        if method == Method::Post && !self.settings.has_body() {
            return Err(Error::MissingBody);
        }
        if self.settings.has_body() && !method.accepts_body() {
            return Err(Error::InvalidBodyUsage(method));
        }
        let https = url.scheme() == "https";
        if !https && self.settings.explicit_ssl {
            return Err(Error::UnnecessarySsl(url.to_string()));
        }
        if https && !self.settings.explicit_ssl {
            if let Some(bundle) = options.default_ca_bundle() {
                if !bundle.is_file() {
                    return Err(Error::FileNotFound(bundle));
                }
                self.handle.set(TransferOption::CaInfo(bundle))?;
            }
            self.handle.set(TransferOption::SslVerifyPeer(true))?;
            self.handle.set(TransferOption::SslVerifyHost(true))?;
        }

        self.apply_method()?;
        self.apply_body()?;

        self.handle
            .set(TransferOption::FollowLocation(options.max_redirects > 0))?;
        if options.max_redirects > 0 {
            self.handle
                .set(TransferOption::MaxRedirections(options.max_redirects))?;
        }
        self.handle
            .set(TransferOption::ConnectTimeout(options.connect_timeout()))?;
        let capture = self.settings.return_transfer;
        self.handle.sink_mut().set_capture(capture);

        debug!(%url, %method, "request prepared");
        self.settings.state = RequestState::Prepared;
        Ok(())
    }

    fn apply_method(&mut self) -> Result<()> {
        let method = self.settings.method;
        let handle = &mut self.handle;
        match method {
            Method::Get => {
                handle.set(TransferOption::NoBody(false))?;
                handle.set(TransferOption::HttpGet(true))?;
            }
            Method::Head => handle.set(TransferOption::NoBody(true))?,
            Method::Post => {
                handle.set(TransferOption::NoBody(false))?;
                handle.set(TransferOption::Post(true))?;
            }
            _ => {
                handle.set(TransferOption::NoBody(false))?;
                handle.set(TransferOption::CustomRequest(method.as_str().to_string()))?;
                self.settings.custom_verb = true;
                return Ok(());
            }
        }
        // a verb left over from an earlier configuration would override ours
        if self.settings.custom_verb {
            handle.set(TransferOption::CustomRequest(method.as_str().to_string()))?;
        }
        Ok(())
    }

    fn apply_body(&mut self) -> Result<()> {
        let settings = &self.settings;
        if !settings.files.is_empty() {
            let mut form = Form::new();
            for (name, value) in &settings.params {
                form.part(name).contents(value.as_bytes()).add()?;
            }
            for (name, file) in &settings.files {
                let mut part = form.part(name);
                part.file(&file.path).filename(&file.display_name);
                if let Some(content_type) = &file.content_type {
                    part.content_type(content_type);
                }
                part.add()?;
            }
            self.handle.set_form(form)?;
        } else if !settings.params.is_empty() {
            let encoded = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(&settings.params)
                .finish();
            self.handle
                .set(TransferOption::PostFields(encoded.into_bytes()))?;
        } else if let Some(raw) = &settings.raw {
            self.handle.set(TransferOption::PostFields(raw.clone()))?;
        }
        Ok(())
    }

    /// Prepare if needed, run the transfer and snapshot the response.
    pub fn execute(&mut self, options: &ExecuteOptions) -> Result<Response> {
        self.prepare(options)?;
        let url = self.settings.url.as_ref().map(Url::as_str);
        debug!(?url, method = %self.settings.method, "executing request");
        let started = Instant::now();
        let body = self.handle.execute()?;
        let elapsed = started.elapsed();
        self.settings.state = RequestState::Executed;
        Response::capture(&mut self.handle, body, Some(elapsed))
    }

    /// Snapshot the response after a pooled run delivered `body`.
    pub(crate) fn complete(&mut self, body: Vec<u8>) -> Result<Response> {
        self.settings.state = RequestState::Executed;
        Response::capture(&mut self.handle, body, None)
    }
}
