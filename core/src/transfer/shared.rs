//! Cross-handle cache for cookies, DNS lookups and TLS sessions.
//!
//! The safe `curl` API does not expose libcurl's share interface, so this
//! module owns the raw `CURLSH` pointer directly. Handles bound to a context
//! keep a pointer to it; the owner must drop those handles first.

use curl_sys::{CURLSH, CURLSHE_OK, CURLE_OK};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::transfer::single::TransferHandle;

/// Data a shared context can hold for its handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShareType {
    Cookies,
    DnsCache,
    SslSession,
}

impl ShareType {
    fn lock_data(self) -> curl_sys::curl_lock_data {
        match self {
            ShareType::Cookies => curl_sys::CURL_LOCK_DATA_COOKIE,
            ShareType::DnsCache => curl_sys::CURL_LOCK_DATA_DNS,
            ShareType::SslSession => curl_sys::CURL_LOCK_DATA_SSL_SESSION,
        }
    }
}

#[derive(Debug)]
pub struct SharedContext {
    raw: *mut CURLSH,
    shares: Vec<ShareType>,
}

// The share handle is only touched through `&mut` owners and has no lock
// callbacks installed, so it may move between threads but never be shared.
unsafe impl Send for SharedContext {}

impl SharedContext {
    pub fn new(shares: &[ShareType]) -> Result<Self> {
        curl::init();
        let raw = unsafe { curl_sys::curl_share_init() };
        if raw.is_null() {
            return Err(Error::Engine {
                message: "could not allocate a share handle".to_string(),
                code: 0,
            });
        }
        let context = Self {
            raw,
            shares: shares.to_vec(),
        };
        for share in shares {
            let code = unsafe {
                curl_sys::curl_share_setopt(
                    context.raw,
                    curl_sys::CURLSHOPT_SHARE,
                    share.lock_data(),
                )
            };
            if code != CURLSHE_OK {
                return Err(Error::Engine {
                    message: format!("could not share {share:?}"),
                    code: code as i32,
                });
            }
        }
        debug!(?shares, "shared context created");
        Ok(context)
    }

    pub fn shares(&self) -> &[ShareType] {
        &self.shares
    }

    pub fn is_sharing(&self, share: ShareType) -> bool {
        self.shares.contains(&share)
    }

    /// Point `handle` at this context.
    ///
    /// The caller keeps the context alive for as long as the handle exists.
    pub(crate) fn bind(&self, handle: &mut TransferHandle) -> Result<()> {
        let code =
            unsafe { curl_sys::curl_easy_setopt(handle.raw(), curl_sys::CURLOPT_SHARE, self.raw) };
        if code != CURLE_OK {
            return Err(Error::engine(curl::Error::new(code)));
        }
        Ok(())
    }
}

impl Drop for SharedContext {
    fn drop(&mut self) {
        let code = unsafe { curl_sys::curl_share_cleanup(self.raw) };
        if code != CURLSHE_OK {
            warn!(code, "share handle still in use at drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_reports_what_it_shares() {
        let context = SharedContext::new(&[ShareType::Cookies, ShareType::DnsCache]).unwrap();
        assert!(context.is_sharing(ShareType::Cookies));
        assert!(!context.is_sharing(ShareType::SslSession));
        assert_eq!(context.shares().len(), 2);
    }

    #[test]
    fn handles_bind_to_context() {
        let context = SharedContext::new(&[ShareType::Cookies]).unwrap();
        let mut handle = TransferHandle::new();
        context.bind(&mut handle).unwrap();
        drop(handle);
    }
}
