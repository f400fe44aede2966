use std::path::Path;

use super::Request;
use crate::error::Result;
use crate::transfer::TransferHandle;

/// Body parameters. Sent url-encoded, or as a multipart form once a file is
/// attached.
#[derive(Debug)]
pub struct Parameters<'a> {
    request: &'a mut Request,
}

impl<'a> Parameters<'a> {
    pub(super) fn new(request: &'a mut Request) -> Self {
        Self { request }
    }

    pub fn add(&mut self, key: &str, value: &str) -> &mut Self {
        self.request
            .settings
            .params
            .push((key.to_string(), value.to_string()));
        self
    }

    pub fn extend<I, K, V>(&mut self, pairs: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in pairs {
            self.add(key.as_ref(), value.as_ref());
        }
        self
    }

    /// Attach a local file under `key`, shown to the server as `name`.
    pub fn add_file(&mut self, key: &str, path: impl AsRef<Path>, name: &str) -> Result<&mut Self> {
        let file = TransferHandle::create_upload_file(path, name)?;
        self.request.settings.files.push((key.to_string(), file));
        Ok(self)
    }

    pub fn is_multipart(&self) -> bool {
        !self.request.settings.files.is_empty()
    }
}
