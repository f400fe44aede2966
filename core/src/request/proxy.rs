use super::Request;
use crate::error::Result;
use crate::options::TransferOption;

#[derive(Debug)]
pub struct Proxy<'a> {
    request: &'a mut Request,
}

impl<'a> Proxy<'a> {
    pub(super) fn new(request: &'a mut Request) -> Self {
        Self { request }
    }

    pub fn set_host(&mut self, host: &str, port: u16) -> Result<&mut Self> {
        self.request
            .handle
            .set(TransferOption::Proxy(format!("{host}:{port}")))?;
        Ok(self)
    }

    pub fn set_authentication(&mut self, user: &str, password: &str) -> Result<&mut Self> {
        let handle = &mut self.request.handle;
        handle.set(TransferOption::ProxyUsername(user.to_string()))?;
        handle.set(TransferOption::ProxyPassword(password.to_string()))?;
        Ok(self)
    }
}
