//! Requests bound to one shared cookie / DNS / TLS-session cache.

use tracing::debug;

use std::path::Path;

use crate::config::ExecuteOptions;
use crate::error::Result;
use crate::http::Method;
use crate::options::TransferOption;
use crate::request::{Cookies, Headers, Parameters, Proxy, Request, Ssl};
use crate::response::Response;
use crate::transfer::{ShareType, SharedContext};

/// Owns the shared context together with the requests bound to it.
///
/// Requests are executed one at a time through `&mut self`; what one of them
/// learns (cookies, resolved hosts, TLS sessions) is visible to the next.
/// A bound request never leaves: it is reconfigured through `configure`,
/// which hands out a `SharedMember` rather than the `Request` itself.
///
/// ```compile_fail
/// use requester_core::{Request, ShareType, SharedRequest};
///
/// let mut shared = SharedRequest::new(&[ShareType::Cookies]).unwrap();
/// shared.add(Request::new()).unwrap();
/// let mut member = shared.configure(0).unwrap();
/// let escaped: Request = std::mem::replace(&mut *member, Request::new());
/// ```
#[derive(Debug)]
pub struct SharedRequest {
    // dropped before the context they point at
    requests: Vec<Request>,
    context: SharedContext,
}

impl SharedRequest {
    pub fn new(shares: &[ShareType]) -> Result<Self> {
        Ok(Self {
            requests: Vec::new(),
            context: SharedContext::new(shares)?,
        })
    }

    pub fn shares(&self) -> &[ShareType] {
        self.context.shares()
    }

    /// Bind `request` to the shared context; returns its index.
    pub fn add(&mut self, mut request: Request) -> Result<usize> {
        self.context.bind(request.handle_mut())?;
        if self.context.is_sharing(ShareType::Cookies) {
            // an empty cookie file turns the cookie engine on
            request
                .handle_mut()
                .set(TransferOption::CookieFile(Default::default()))?;
        }
        self.requests.push(request);
        let index = self.requests.len() - 1;
        debug!(index, "request bound to shared context");
        Ok(index)
    }

    /// Reconfigure the request at `index` in place.
    pub fn configure(&mut self, index: usize) -> Option<SharedMember<'_>> {
        self.requests
            .get_mut(index)
            .map(|request| SharedMember { request })
    }

    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Execute the request at `index`. Returns `None` for an unknown index.
    pub fn execute(
        &mut self,
        index: usize,
        options: &ExecuteOptions,
    ) -> Option<Result<Response>> {
        self.requests
            .get_mut(index)
            .map(|request| request.execute(options))
    }
}

/// Configuration access to one bound request.
#[derive(Debug)]
pub struct SharedMember<'a> {
    request: &'a mut Request,
}

impl SharedMember<'_> {
    pub fn request(&self) -> &Request {
        self.request
    }

    pub fn set_url(&mut self, url: &str) -> Result<&mut Self> {
        self.request.set_url(url)?;
        Ok(self)
    }

    pub fn set_method(&mut self, method: Method) -> &mut Self {
        self.request.set_method(method);
        self
    }

    pub fn set_parameters(&mut self) -> Parameters<'_> {
        self.request.set_parameters()
    }

    pub fn set_raw(&mut self, body: impl Into<Vec<u8>>) -> &mut Self {
        self.request.set_raw(body);
        self
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

    pub fn set_return_transfer(&mut self, enabled: bool) -> &mut Self {
        self.request.set_return_transfer(enabled);
        self
    }
}
