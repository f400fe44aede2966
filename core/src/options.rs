//! Typed transfer options and the table of options owned by dedicated methods.
//!
//! # Design
//! Every option the client can hand to the engine is a `TransferOption`
//! variant that knows its libcurl option id. High-level methods
//! (`set_url`, `set_headers`, ...) set their options internally; the same ids
//! are listed in `COVERED` so `set_custom_option` can refuse to let a caller
//! bypass them. Specializations (downloads, uploads) add an overlay table
//! that is consulted before the base one.

use std::path::PathBuf;
use std::time::Duration;

/// Numeric libcurl option identifier (`CURLOPT_*`).
pub type OptionId = i32;

const LONG: OptionId = 0;
const OBJECTPOINT: OptionId = 10_000;
const OFF_T: OptionId = 30_000;

pub mod id {
    use super::{OptionId, LONG, OBJECTPOINT, OFF_T};

    pub const PORT: OptionId = LONG + 3;
    pub const INFILESIZE: OptionId = LONG + 14;
    pub const LOW_SPEED_LIMIT: OptionId = LONG + 19;
    pub const LOW_SPEED_TIME: OptionId = LONG + 20;
    pub const TIMECONDITION: OptionId = LONG + 33;
    pub const TIMEVALUE: OptionId = LONG + 34;
    pub const VERBOSE: OptionId = LONG + 41;
    pub const NOPROGRESS: OptionId = LONG + 43;
    pub const NOBODY: OptionId = LONG + 44;
    pub const FAILONERROR: OptionId = LONG + 45;
    pub const UPLOAD: OptionId = LONG + 46;
    pub const POST: OptionId = LONG + 47;
    pub const FOLLOWLOCATION: OptionId = LONG + 52;
    pub const SSL_VERIFYPEER: OptionId = LONG + 64;
    pub const MAXREDIRS: OptionId = LONG + 68;
    pub const MAXCONNECTS: OptionId = LONG + 71;
    pub const FRESH_CONNECT: OptionId = LONG + 74;
    pub const FORBID_REUSE: OptionId = LONG + 75;
    pub const HTTPGET: OptionId = LONG + 80;
    pub const SSL_VERIFYHOST: OptionId = LONG + 81;
    pub const HTTP_VERSION: OptionId = LONG + 84;
    pub const DNS_CACHE_TIMEOUT: OptionId = LONG + 92;
    pub const COOKIESESSION: OptionId = LONG + 96;
    pub const BUFFERSIZE: OptionId = LONG + 98;
    pub const TCP_NODELAY: OptionId = LONG + 121;
    pub const TIMEOUT_MS: OptionId = LONG + 155;
    pub const CONNECTTIMEOUT_MS: OptionId = LONG + 156;
    pub const TCP_KEEPALIVE: OptionId = LONG + 213;

    pub const URL: OptionId = OBJECTPOINT + 2;
    pub const PROXY: OptionId = OBJECTPOINT + 4;
    pub const USERNAME: OptionId = OBJECTPOINT + 173;
    pub const PASSWORD: OptionId = OBJECTPOINT + 174;
    pub const PROXYUSERNAME: OptionId = OBJECTPOINT + 175;
    pub const PROXYPASSWORD: OptionId = OBJECTPOINT + 176;
    pub const RANGE: OptionId = OBJECTPOINT + 7;
    pub const POSTFIELDS: OptionId = OBJECTPOINT + 15;
    pub const REFERER: OptionId = OBJECTPOINT + 16;
    pub const USERAGENT: OptionId = OBJECTPOINT + 18;
    pub const COOKIE: OptionId = OBJECTPOINT + 22;
    pub const HTTPHEADER: OptionId = OBJECTPOINT + 23;
    pub const HTTPPOST: OptionId = OBJECTPOINT + 24;
    pub const SSLCERT: OptionId = OBJECTPOINT + 25;
    pub const KEYPASSWD: OptionId = OBJECTPOINT + 26;
    pub const COOKIEFILE: OptionId = OBJECTPOINT + 31;
    pub const CUSTOMREQUEST: OptionId = OBJECTPOINT + 36;
    pub const INTERFACE: OptionId = OBJECTPOINT + 62;
    pub const CAINFO: OptionId = OBJECTPOINT + 65;
    pub const COOKIEJAR: OptionId = OBJECTPOINT + 82;
    pub const SSLKEY: OptionId = OBJECTPOINT + 87;
    pub const ACCEPT_ENCODING: OptionId = OBJECTPOINT + 102;
    pub const COOKIELIST: OptionId = OBJECTPOINT + 135;

    pub const RESUME_FROM_LARGE: OptionId = OFF_T + 116;
}

/// Conditional request header driven by `TIMEVALUE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeCondition {
    None,
    IfModifiedSince,
    IfUnmodifiedSince,
}

impl From<TimeCondition> for curl::easy::TimeCondition {
    fn from(condition: TimeCondition) -> Self {
        match condition {
            TimeCondition::None => curl::easy::TimeCondition::None,
            TimeCondition::IfModifiedSince => curl::easy::TimeCondition::IfModifiedSince,
            TimeCondition::IfUnmodifiedSince => curl::easy::TimeCondition::IfUnmodifiedSince,
        }
    }
}

/// HTTP protocol version to negotiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpVersion {
    Any,
    V10,
    V11,
    V2,
    V2Tls,
    V2PriorKnowledge,
}

impl From<HttpVersion> for curl::easy::HttpVersion {
    fn from(version: HttpVersion) -> Self {
        match version {
            HttpVersion::Any => curl::easy::HttpVersion::Any,
            HttpVersion::V10 => curl::easy::HttpVersion::V10,
            HttpVersion::V11 => curl::easy::HttpVersion::V11,
            HttpVersion::V2 => curl::easy::HttpVersion::V2,
            HttpVersion::V2Tls => curl::easy::HttpVersion::V2TLS,
            HttpVersion::V2PriorKnowledge => curl::easy::HttpVersion::V2PriorKnowledge,
        }
    }
}

/// One engine option with its typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferOption {
    Url(String),
    HttpGet(bool),
    Post(bool),
    NoBody(bool),
    CustomRequest(String),
    Upload(bool),
    InFileSize(u64),
    PostFields(Vec<u8>),
    HttpHeaders(Vec<String>),
    UserAgent(String),
    Referer(String),
    Cookie(String),
    CookieFile(PathBuf),
    CookieJar(PathBuf),
    CookieSession(bool),
    CookieList(String),
    TimeCondition(TimeCondition),
    TimeValue(i64),
    Proxy(String),
    ProxyUsername(String),
    ProxyPassword(String),
    CaInfo(PathBuf),
    SslVerifyPeer(bool),
    SslVerifyHost(bool),
    SslCert(PathBuf),
    SslKey(PathBuf),
    KeyPassword(String),
    FollowLocation(bool),
    MaxRedirections(u32),
    ConnectTimeout(Duration),
    BufferSize(usize),
    /// Enables the progress callback (clears `NOPROGRESS`).
    Progress(bool),
    Verbose(bool),
    Timeout(Duration),
    TcpKeepAlive(bool),
    TcpNoDelay(bool),
    LowSpeedLimit(u32),
    LowSpeedTime(Duration),
    DnsCacheTimeout(Duration),
    AcceptEncoding(String),
    Interface(String),
    FreshConnect(bool),
    ForbidReuse(bool),
    FailOnError(bool),
    Range(String),
    ResumeFrom(u64),
    MaxConnects(u32),
    Port(u16),
    Username(String),
    Password(String),
    HttpVersion(HttpVersion),
}

impl TransferOption {
    /// libcurl option id this variant sets.
    pub fn id(&self) -> OptionId {
        use TransferOption::*;
        match self {
            Url(_) => id::URL,
            HttpGet(_) => id::HTTPGET,
            Post(_) => id::POST,
            NoBody(_) => id::NOBODY,
            CustomRequest(_) => id::CUSTOMREQUEST,
            Upload(_) => id::UPLOAD,
            InFileSize(_) => id::INFILESIZE,
            PostFields(_) => id::POSTFIELDS,
            HttpHeaders(_) => id::HTTPHEADER,
            UserAgent(_) => id::USERAGENT,
            Referer(_) => id::REFERER,
            Cookie(_) => id::COOKIE,
            CookieFile(_) => id::COOKIEFILE,
            CookieJar(_) => id::COOKIEJAR,
            CookieSession(_) => id::COOKIESESSION,
            CookieList(_) => id::COOKIELIST,
            TimeCondition(_) => id::TIMECONDITION,
            TimeValue(_) => id::TIMEVALUE,
            Proxy(_) => id::PROXY,
            ProxyUsername(_) => id::PROXYUSERNAME,
            ProxyPassword(_) => id::PROXYPASSWORD,
            CaInfo(_) => id::CAINFO,
            SslVerifyPeer(_) => id::SSL_VERIFYPEER,
            SslVerifyHost(_) => id::SSL_VERIFYHOST,
            SslCert(_) => id::SSLCERT,
            SslKey(_) => id::SSLKEY,
            KeyPassword(_) => id::KEYPASSWD,
            FollowLocation(_) => id::FOLLOWLOCATION,
            MaxRedirections(_) => id::MAXREDIRS,
            ConnectTimeout(_) => id::CONNECTTIMEOUT_MS,
            BufferSize(_) => id::BUFFERSIZE,
            Progress(_) => id::NOPROGRESS,
            Verbose(_) => id::VERBOSE,
            Timeout(_) => id::TIMEOUT_MS,
            TcpKeepAlive(_) => id::TCP_KEEPALIVE,
            TcpNoDelay(_) => id::TCP_NODELAY,
            LowSpeedLimit(_) => id::LOW_SPEED_LIMIT,
            LowSpeedTime(_) => id::LOW_SPEED_TIME,
            DnsCacheTimeout(_) => id::DNS_CACHE_TIMEOUT,
            AcceptEncoding(_) => id::ACCEPT_ENCODING,
            Interface(_) => id::INTERFACE,
            FreshConnect(_) => id::FRESH_CONNECT,
            ForbidReuse(_) => id::FORBID_REUSE,
            FailOnError(_) => id::FAILONERROR,
            Range(_) => id::RANGE,
            ResumeFrom(_) => id::RESUME_FROM_LARGE,
            MaxConnects(_) => id::MAXCONNECTS,
            Port(_) => id::PORT,
            Username(_) => id::USERNAME,
            Password(_) => id::PASSWORD,
            HttpVersion(_) => id::HTTP_VERSION,
        }
    }
}

/// An option id and the method that owns it.
pub type Coverage = (OptionId, &'static str);

/// Options every request sets through a dedicated method.
pub const COVERED: &[Coverage] = &[
    (id::URL, "set_url"),
    (id::HTTPGET, "set_method"),
    (id::POST, "set_method"),
    (id::NOBODY, "set_method"),
    (id::CUSTOMREQUEST, "set_method"),
    (id::COOKIESESSION, "set_cookies"),
    (id::COOKIEFILE, "set_cookies"),
    (id::COOKIEJAR, "set_cookies"),
    (id::COOKIELIST, "set_cookies"),
    (id::TIMECONDITION, "set_headers"),
    (id::TIMEVALUE, "set_headers"),
    (id::USERAGENT, "set_headers"),
    (id::REFERER, "set_headers"),
    (id::COOKIE, "set_headers"),
    (id::HTTPHEADER, "set_headers"),
    (id::POSTFIELDS, "set_parameters"),
    (id::PROXY, "set_proxy"),
    (id::PROXYUSERNAME, "set_proxy"),
    (id::PROXYPASSWORD, "set_proxy"),
    (id::CAINFO, "set_ssl"),
    (id::SSL_VERIFYPEER, "set_ssl"),
    (id::SSL_VERIFYHOST, "set_ssl"),
    (id::SSLCERT, "set_ssl"),
    (id::SSLKEY, "set_ssl"),
    (id::KEYPASSWD, "set_ssl"),
    (id::FOLLOWLOCATION, "prepare"),
    (id::MAXREDIRS, "prepare"),
    (id::CONNECTTIMEOUT_MS, "prepare"),
];

/// Additional options owned by `FileDownload`.
pub const DOWNLOAD_COVERED: &[Coverage] = &[
    (id::BUFFERSIZE, "set_progress_handler"),
    (id::NOPROGRESS, "set_progress_handler"),
];

/// Additional options owned by `FileUpload`.
pub const UPLOAD_COVERED: &[Coverage] = &[
    (id::UPLOAD, "set_method"),
    (id::INFILESIZE, "set_file"),
    (id::POSTFIELDS, "set_raw"),
    (id::BUFFERSIZE, "set_progress_handler"),
    (id::NOPROGRESS, "set_progress_handler"),
];

/// Method owning `option`, looking at `overlay` first and then the base table.
pub fn covering_method(option: OptionId, overlay: &[Coverage]) -> Option<&'static str> {
    overlay
        .iter()
        .chain(COVERED)
        .find(|(covered, _)| *covered == option)
        .map(|(_, method)| *method)
}
