//! Batches of requests run concurrently on one transfer pool.
//!
//! # Design
//! Members (plain requests, downloads and uploads) keep ownership of their
//! handles between runs. `execute` prepares every member first, so
//! validation errors surface before any I/O, then lends the handles to a
//! fresh `TransferPool` and takes them back once the pool is done, whatever
//! the outcome. Any failure aborts the whole batch.

use std::path::PathBuf;

use tracing::{debug, warn};

use crate::config::ExecuteOptions;
use crate::error::{Error, Result};
use crate::file::{FileDownload, FileUpload};
use crate::request::{Request, Settings};
use crate::response::Response;
use crate::transfer::{PoolOption, TransferPool};

/// `CURLMOPT_PIPELINING`, owned by `MultiRequest::new`.
const PIPELINING_OPTION: i32 = 3;

/// Connection reuse strategy for a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pipelining {
    Disabled,
    Http1,
    #[default]
    Http2,
    Http1Http2,
}

impl From<Pipelining> for PoolOption {
    fn from(pipelining: Pipelining) -> Self {
        let (http1, multiplex) = match pipelining {
            Pipelining::Disabled => (false, false),
            Pipelining::Http1 => (true, false),
            Pipelining::Http2 => (false, true),
            Pipelining::Http1Http2 => (true, true),
        };
        PoolOption::Pipelining { http1, multiplex }
    }
}

/// One entry of a batch.
#[derive(Debug)]
pub enum BatchMember {
    Request(Request),
    Download(FileDownload),
    Upload(FileUpload),
}

impl From<Request> for BatchMember {
    fn from(request: Request) -> Self {
        BatchMember::Request(request)
    }
}

impl From<FileDownload> for BatchMember {
    fn from(download: FileDownload) -> Self {
        BatchMember::Download(download)
    }
}

impl From<FileUpload> for BatchMember {
    fn from(upload: FileUpload) -> Self {
        BatchMember::Upload(upload)
    }
}

impl BatchMember {
    pub fn request(&self) -> &Request {
        match self {
            BatchMember::Request(request) => request,
            BatchMember::Download(download) => download.request(),
            BatchMember::Upload(upload) => upload.request(),
        }
    }

    fn request_mut(&mut self) -> &mut Request {
        match self {
            BatchMember::Request(request) => request,
            BatchMember::Download(download) => download.request_mut(),
            BatchMember::Upload(upload) => upload.request_mut(),
        }
    }

    fn prepare(&mut self, options: &ExecuteOptions) -> Result<()> {
        match self {
            BatchMember::Request(request) => request.prepare(options),
            BatchMember::Download(download) => download.prepare(options),
            BatchMember::Upload(upload) => upload.prepare(options),
        }
    }

    fn split(self) -> (Shell, Request) {
        match self {
            BatchMember::Request(request) => (Shell::Request, request),
            BatchMember::Download(download) => {
                let (request, target) = download.into_parts();
                (Shell::Download(target), request)
            }
            BatchMember::Upload(upload) => {
                let (request, size) = upload.into_parts();
                (Shell::Upload(size), request)
            }
        }
    }
}

/// What is left of a member while its request runs in the pool.
#[derive(Debug)]
enum Shell {
    Request,
    Download(Option<PathBuf>),
    Upload(Option<u64>),
}

impl Shell {
    fn rejoin(self, request: Request) -> BatchMember {
        match self {
            Shell::Request => BatchMember::Request(request),
            Shell::Download(target) => {
                BatchMember::Download(FileDownload::from_parts(request, target))
            }
            Shell::Upload(size) => BatchMember::Upload(FileUpload::from_parts(request, size)),
        }
    }
}

type Parked = (Shell, Settings);

#[derive(Debug, Default)]
pub struct MultiRequest {
    pipelining: Pipelining,
    pool_options: Vec<PoolOption>,
    return_transfer: Option<bool>,
    members: Vec<BatchMember>,
}

impl MultiRequest {
    pub fn new(pipelining: Pipelining) -> Self {
        Self {
            pipelining,
            ..Default::default()
        }
    }

    /// Register a request, download or upload; returns its index in the
    /// batch.
    pub fn add(&mut self, member: impl Into<BatchMember>) -> usize {
        self.members.push(member.into());
        self.members.len() - 1
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut BatchMember> {
        self.members.get_mut(index)
    }

    pub fn members(&self) -> &[BatchMember] {
        &self.members
    }

    pub fn set_custom_option(&mut self, option: PoolOption) -> Result<&mut Self> {
        if let PoolOption::Pipelining { .. } = option {
            return Err(Error::ConfigConflict {
                option: PIPELINING_OPTION,
                method: "new",
            });
        }
        self.pool_options.push(option);
        Ok(self)
    }

    /// Applied to every member, including ones added later, when the batch
    /// runs.
    pub fn set_return_transfer(&mut self, enabled: bool) -> &mut Self {
        self.return_transfer = Some(enabled);
        self
    }

    /// Run every member and return their responses in registration order.
    ///
    /// A handle the pool refuses to register is lost together with its
    /// member; the remaining members stay in the batch.
    pub fn execute(&mut self, options: &ExecuteOptions) -> Result<Vec<Response>> {
        if let Some(enabled) = self.return_transfer {
            for member in &mut self.members {
                if member.request().return_transfer() != enabled {
                    member.request_mut().set_return_transfer(enabled);
                }
            }
        }
        for member in &mut self.members {
            member.prepare(options)?;
        }

        let mut pool = TransferPool::new();
        pool.set_option(self.pipelining.into())?;
        for option in &self.pool_options {
            pool.set_option(*option)?;
        }

        let mut parked: Vec<Parked> = Vec::with_capacity(self.members.len());
        let mut pending = std::mem::take(&mut self.members).into_iter();
        while let Some(member) = pending.next() {
            let (shell, request) = member.split();
            let (settings, handle) = request.into_parts();
            if let Err(e) = pool.add(handle) {
                warn!(index = parked.len(), error = %e, "member dropped from batch");
                self.members = Self::rejoin(parked, pool)?;
                self.members.extend(pending);
                return Err(e);
            }
            parked.push((shell, settings));
        }

        debug!(members = parked.len(), pipelining = ?self.pipelining, "executing batch");
        let outcome = pool.execute();
        self.members = Self::rejoin(parked, pool)?;
        let mut bodies = outcome?;

        self.members
            .iter_mut()
            .enumerate()
            .map(|(key, member)| {
                let body = bodies.remove(&key).unwrap_or_default();
                member.request_mut().complete(body)
            })
            .collect()
    }

    fn rejoin(parked: Vec<Parked>, pool: TransferPool) -> Result<Vec<BatchMember>> {
        let handles = pool.release()?;
        Ok(parked
            .into_iter()
            .zip(handles)
            .map(|((shell, settings), handle)| shell.rejoin(Request::from_parts(settings, handle)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Method;

    #[test]
    fn pipelining_is_owned_by_the_constructor() {
        let mut multi = MultiRequest::new(Pipelining::Http1);
        let err = multi
            .set_custom_option(Pipelining::Disabled.into())
            .unwrap_err();
        assert_eq!(err.to_string(), "option 3 already covered by new()");
        multi
            .set_custom_option(PoolOption::MaxHostConnections(2))
            .unwrap();
    }

    #[test]
    fn indices_follow_registration() {
        let mut multi = MultiRequest::default();
        assert_eq!(multi.add(Request::new()), 0);
        assert_eq!(multi.add(FileDownload::new()), 1);
        assert_eq!(multi.add(FileUpload::new()), 2);
        assert_eq!(multi.len(), 3);
        assert!(matches!(multi.members()[1], BatchMember::Download(_)));
        assert_eq!(multi.members()[2].request().method(), Method::Put);
    }

    #[test]
    fn validation_fails_before_any_transfer() {
        let mut multi = MultiRequest::default();
        multi.add(Request::get("http://localhost/").unwrap());
        let mut post = Request::get("http://localhost/").unwrap();
        post.set_method(Method::Post);
        multi.add(post);

        let err = multi.execute(&ExecuteOptions::default()).unwrap_err();
        assert!(matches!(err, Error::MissingBody));
        assert_eq!(multi.len(), 2);
    }

    #[test]
    fn file_members_are_validated_like_single_transfers() {
        let mut multi = MultiRequest::default();
        let mut download = FileDownload::new();
        download.set_url("http://localhost/download").unwrap();
        multi.add(download);

        let err = multi.execute(&ExecuteOptions::default()).unwrap_err();
        assert!(matches!(err, Error::MissingFileTarget));
    }

    #[test]
    fn return_transfer_reaches_members_added_later() {
        let mut multi = MultiRequest::default();
        multi.add(Request::get("http://localhost/").unwrap());
        multi.set_return_transfer(false);
        multi.add(Request::get("http://localhost/").unwrap());
        let mut post = Request::get("http://localhost/").unwrap();
        post.set_method(Method::Post);
        multi.add(post);

        // the body-less POST stops the run before any transfer
        let err = multi.execute(&ExecuteOptions::default()).unwrap_err();
        assert!(matches!(err, Error::MissingBody));
        assert!(multi
            .members()
            .iter()
            .all(|member| !member.request().return_transfer()));
    }
}
