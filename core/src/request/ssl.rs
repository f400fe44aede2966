use std::path::Path;

use super::Request;
use crate::error::{Error, Result};
use crate::options::TransferOption;

/// Explicit TLS setup. Creating it turns on peer and host verification
/// against the given CA bundle.
#[derive(Debug)]
pub struct Ssl<'a> {
    request: &'a mut Request,
}

fn existing(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(Error::FileNotFound(path.to_path_buf()))
    }
}

impl<'a> Ssl<'a> {
    pub(super) fn new(request: &'a mut Request, ca_bundle: &Path) -> Result<Self> {
        existing(ca_bundle)?;
        let handle = &mut request.handle;
        handle.set(TransferOption::CaInfo(ca_bundle.to_path_buf()))?;
        handle.set(TransferOption::SslVerifyPeer(true))?;
        handle.set(TransferOption::SslVerifyHost(true))?;
        request.settings.explicit_ssl = true;
        Ok(Self { request })
    }

    /// Client certificate, with the passphrase of its key if it has one.
    pub fn set_certificate(
        &mut self,
        path: impl AsRef<Path>,
        password: Option<&str>,
    ) -> Result<&mut Self> {
        let path = path.as_ref();
        existing(path)?;
        self.request
            .handle
            .set(TransferOption::SslCert(path.to_path_buf()))?;
        self.set_password(password)
    }

    pub fn set_private_key(
        &mut self,
        path: impl AsRef<Path>,
        password: Option<&str>,
    ) -> Result<&mut Self> {
        let path = path.as_ref();
        existing(path)?;
        self.request
            .handle
            .set(TransferOption::SslKey(path.to_path_buf()))?;
        self.set_password(password)
    }

    fn set_password(&mut self, password: Option<&str>) -> Result<&mut Self> {
        if let Some(password) = password {
            self.request
                .handle
                .set(TransferOption::KeyPassword(password.to_string()))?;
        }
        Ok(self)
    }
}
