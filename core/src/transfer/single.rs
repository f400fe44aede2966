//! One engine transfer handle and the accumulator its callbacks write into.
//!
//! # Design
//! The engine drives `Sink` through the `Handler` callbacks. Nothing else
//! touches the wire: the request layer configures the handle with typed
//! options, calls `execute` (or hands the handle to a pool) and afterwards
//! reads the body, the captured header lines and the diagnostics.

use std::fs::File;
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use curl::easy::{Easy2, Form, Handler, List, ReadError, SeekResult, WriteError};
use tracing::trace;

use crate::error::{Error, Result};
use crate::file::progress::ProgressTracker;
use crate::options::TransferOption;

/// Callback target for one transfer.
#[derive(Debug)]
pub struct Sink {
    body: Vec<u8>,
    header_lines: Vec<String>,
    capture: bool,
    target: Option<BufWriter<File>>,
    written: u64,
    write_error: Option<io::Error>,
    source: Option<File>,
    read: u64,
    progress: Option<ProgressTracker>,
}

impl Default for Sink {
    fn default() -> Self {
        Self {
            body: Vec::new(),
            header_lines: Vec::new(),
            capture: true,
            target: None,
            written: 0,
            write_error: None,
            source: None,
            read: 0,
            progress: None,
        }
    }
}

impl Sink {
    /// Raw header lines of the final response, in arrival order.
    pub fn header_lines(&self) -> &[String] {
        &self.header_lines
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub(crate) fn set_capture(&mut self, capture: bool) {
        self.capture = capture;
    }

    pub(crate) fn set_target(&mut self, file: File) {
        self.target = Some(BufWriter::new(file));
    }

    pub(crate) fn set_source(&mut self, file: File) {
        self.source = Some(file);
    }

    pub(crate) fn has_target(&self) -> bool {
        self.target.is_some()
    }

    pub(crate) fn has_source(&self) -> bool {
        self.source.is_some()
    }

    pub(crate) fn set_progress(&mut self, tracker: ProgressTracker) {
        self.progress = Some(tracker);
    }

    /// Clear what a previous run left behind and rewind the upload source.
    pub(crate) fn reset(&mut self) -> Result<()> {
        self.body.clear();
        self.header_lines.clear();
        self.written = 0;
        self.read = 0;
        self.write_error = None;
        if let Some(source) = self.source.as_mut() {
            source.seek(SeekFrom::Start(0))?;
        }
        if let Some(progress) = self.progress.as_mut() {
            progress.reset();
        }
        Ok(())
    }

    /// Settle the accumulator after the engine returned.
    ///
    /// The download target is closed whatever the outcome. A local write
    /// failure takes precedence over whatever the engine reported, since the
    /// engine only sees it as an aborted write.
    pub(crate) fn finish(
        &mut self,
        outcome: std::result::Result<(), curl::Error>,
    ) -> Result<Vec<u8>> {
        let target = self.target.take();
        if let Some(e) = self.write_error.take() {
            return Err(Error::Io(e));
        }
        outcome.map_err(Error::transfer)?;
        if let Some(mut target) = target {
            target.flush()?;
        }
        if let Some(progress) = self.progress.as_mut() {
            let processed = match progress.direction() {
                crate::file::progress::Direction::Download => self.written,
                crate::file::progress::Direction::Upload => self.read,
            };
            progress.finish(processed);
        }
        Ok(std::mem::take(&mut self.body))
    }
}

impl Handler for Sink {
    fn write(&mut self, data: &[u8]) -> std::result::Result<usize, WriteError> {
        if let Some(target) = self.target.as_mut() {
            if let Err(e) = target.write_all(data) {
                self.write_error = Some(e);
                return Ok(0);
            }
        } else if self.capture {
            self.body.extend_from_slice(data);
        }
        self.written += data.len() as u64;
        Ok(data.len())
    }

    fn read(&mut self, data: &mut [u8]) -> std::result::Result<usize, ReadError> {
        match self.source.as_mut() {
            Some(source) => match source.read(data) {
                Ok(n) => {
                    self.read += n as u64;
                    Ok(n)
                }
                Err(_) => Err(ReadError::Abort),
            },
            None => Ok(0),
        }
    }

    fn seek(&mut self, whence: SeekFrom) -> SeekResult {
        match self.source.as_mut().map(|source| source.seek(whence)) {
            Some(Ok(_)) => SeekResult::Ok,
            Some(Err(_)) => SeekResult::Fail,
            None => SeekResult::CantSeek,
        }
    }

    fn header(&mut self, data: &[u8]) -> bool {
        if !self.capture {
            return true;
        }
        let line = String::from_utf8_lossy(data);
        // a new status line starts the headers of a followed redirect
        if line.starts_with("HTTP/") {
            self.header_lines.clear();
        }
        self.header_lines.push(line.into_owned());
        true
    }

    fn progress(&mut self, dltotal: f64, dlnow: f64, ultotal: f64, ulnow: f64) -> bool {
        if let Some(progress) = self.progress.as_mut() {
            progress.tick(dltotal, dlnow, ultotal, ulnow);
        }
        true
    }
}

/// File attached to a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub path: PathBuf,
    pub display_name: String,
    pub content_type: Option<String>,
}

impl UploadFile {
    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }
}

/// Diagnostics the engine keeps about the last transfer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferInfo {
    pub redirect_count: u32,
    pub content_type: Option<String>,
    pub primary_ip: Option<String>,
    pub download_size: f64,
    pub upload_size: f64,
    pub namelookup_time: Duration,
    pub connect_time: Duration,
    pub total_time: Duration,
}

/// Owned engine handle. `Send` but not `Sync`: one transfer at a time.
#[derive(Debug)]
pub struct TransferHandle {
    easy: Easy2<Sink>,
}

impl Default for TransferHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferHandle {
    pub fn new() -> Self {
        Self {
            easy: Easy2::new(Sink::default()),
        }
    }

    pub(crate) fn from_easy(easy: Easy2<Sink>) -> Self {
        Self { easy }
    }

    pub(crate) fn into_easy(self) -> Easy2<Sink> {
        self.easy
    }

    pub fn sink(&self) -> &Sink {
        self.easy.get_ref()
    }

    pub(crate) fn sink_mut(&mut self) -> &mut Sink {
        self.easy.get_mut()
    }

    pub(crate) fn raw(&self) -> *mut curl_sys::CURL {
        self.easy.raw()
    }

    /// Apply one typed option to the engine.
    pub fn set(&mut self, option: TransferOption) -> Result<()> {
        use TransferOption::*;
        let easy = &mut self.easy;
        match option {
            Url(url) => easy.url(&url),
            HttpGet(on) => easy.get(on),
            Post(on) => easy.post(on),
            NoBody(on) => easy.nobody(on),
            CustomRequest(verb) => easy.custom_request(&verb),
            Upload(on) => easy.upload(on),
            InFileSize(size) => easy.in_filesize(size),
            PostFields(body) => easy.post_fields_copy(&body),
            HttpHeaders(lines) => {
                let mut list = List::new();
                for line in &lines {
                    list.append(line)?;
                }
                easy.http_headers(list)
            }
            UserAgent(agent) => easy.useragent(&agent),
            Referer(referer) => easy.referer(&referer),
            Cookie(cookie) => easy.cookie(&cookie),
            CookieFile(path) => easy.cookie_file(path),
            CookieJar(path) => easy.cookie_jar(path),
            CookieSession(on) => easy.cookie_session(on),
            CookieList(command) => easy.cookie_list(&command),
            TimeCondition(condition) => easy.time_condition(condition.into()),
            TimeValue(seconds) => easy.time_value(seconds),
            Proxy(proxy) => easy.proxy(&proxy),
            ProxyUsername(user) => easy.proxy_username(&user),
            ProxyPassword(password) => easy.proxy_password(&password),
            CaInfo(path) => easy.cainfo(path),
            SslVerifyPeer(on) => easy.ssl_verify_peer(on),
            SslVerifyHost(on) => easy.ssl_verify_host(on),
            SslCert(path) => easy.ssl_cert(path),
            SslKey(path) => easy.ssl_key(path),
            KeyPassword(password) => easy.key_password(&password),
            FollowLocation(on) => easy.follow_location(on),
            MaxRedirections(max) => easy.max_redirections(max),
            ConnectTimeout(timeout) => easy.connect_timeout(timeout),
            BufferSize(size) => easy.buffer_size(size),
            Progress(on) => easy.progress(on),
            Verbose(on) => easy.verbose(on),
            Timeout(timeout) => easy.timeout(timeout),
            TcpKeepAlive(on) => easy.tcp_keepalive(on),
            TcpNoDelay(on) => easy.tcp_nodelay(on),
            LowSpeedLimit(bytes) => easy.low_speed_limit(bytes),
            LowSpeedTime(window) => easy.low_speed_time(window),
            DnsCacheTimeout(timeout) => easy.dns_cache_timeout(timeout),
            AcceptEncoding(encoding) => easy.accept_encoding(&encoding),
            Interface(interface) => easy.interface(&interface),
            FreshConnect(on) => easy.fresh_connect(on),
            ForbidReuse(on) => easy.forbid_reuse(on),
            FailOnError(on) => easy.fail_on_error(on),
            Range(range) => easy.range(&range),
            ResumeFrom(offset) => easy.resume_from(offset),
            MaxConnects(max) => easy.max_connects(max),
            Port(port) => easy.port(port),
            Username(user) => easy.username(&user),
            Password(password) => easy.password(&password),
            HttpVersion(version) => easy.http_version(version.into()),
        }
        .map_err(Error::engine)
    }

    /// Attach a multipart form body.
    pub fn set_form(&mut self, form: Form) -> Result<()> {
        self.easy.httppost(form).map_err(Error::engine)
    }

    /// Reference a local file for a multipart upload.
    pub fn create_upload_file(path: impl AsRef<Path>, display_name: &str) -> Result<UploadFile> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        Ok(UploadFile {
            path: path.to_path_buf(),
            display_name: display_name.to_string(),
            content_type: None,
        })
    }

    /// Run the transfer to completion and return the captured body.
    pub fn execute(&mut self) -> Result<Vec<u8>> {
        self.sink_mut().reset()?;
        let outcome = self.easy.perform();
        trace!(ok = outcome.is_ok(), "transfer finished");
        self.sink_mut().finish(outcome)
    }

    pub fn effective_url(&mut self) -> Result<String> {
        Ok(self.easy.effective_url()?.unwrap_or_default().to_string())
    }

    pub fn status_code(&mut self) -> Result<u32> {
        Ok(self.easy.response_code()?)
    }

    pub fn total_time(&mut self) -> Result<Duration> {
        Ok(self.easy.total_time()?)
    }

    pub fn info(&mut self) -> Result<TransferInfo> {
        let easy = &mut self.easy;
        Ok(TransferInfo {
            redirect_count: easy.redirect_count()?,
            content_type: easy.content_type()?.map(str::to_string),
            primary_ip: easy.primary_ip()?.map(str::to_string),
            download_size: easy.download_size()?,
            upload_size: easy.upload_size()?,
            namelookup_time: easy.namelookup_time()?,
            connect_time: easy.connect_time()?,
            total_time: easy.total_time()?,
        })
    }

    /// Raw jar lines for every cookie the engine currently knows.
    pub fn cookies(&mut self) -> Result<Vec<String>> {
        let list = self.easy.cookies()?;
        Ok(list
            .iter()
            .map(|line| String::from_utf8_lossy(line).into_owned())
            .collect())
    }
}
