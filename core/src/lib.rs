//! Typed HTTP(S) client over libcurl.
//!
//! # Overview
//! A `Request` is configured through typed builders, validated and resolved
//! into engine options by `prepare`, and executed into an immutable
//! `Response`. `MultiRequest` runs many requests (file transfers included)
//! concurrently on one thread, `SharedRequest` lets requests share cookies,
//! DNS and TLS sessions, and `FileDownload` / `FileUpload` stream bodies to
//! and from local files with progress reporting.
//!
//! # Design
//! - Every engine option is a `TransferOption` variant. Options owned by a
//!   dedicated method are listed in a conflict table and rejected by
//!   `set_custom_option`, so typed configuration cannot be bypassed.
//! - Validation (`MissingUrl`, `MissingBody`, ...) happens before any I/O.
//!   Transfer failures keep the engine's error code and are never retried.
//! - Each request owns exactly one engine handle. Batches borrow the handles
//!   for the length of a run and always give them back.
//! - `https` requests without their own SSL block verify against
//!   `ExecuteOptions::ca_bundle`, `REQUESTER_CA_BUNDLE` or a shipped
//!   `certificates/cacert.pem`, in that order, and otherwise against the
//!   engine's built-in CA store.
//! - The library logs through `tracing` and installs no subscriber.

pub mod config;
pub mod cookie;
pub mod error;
pub mod file;
pub mod http;
pub mod multi;
pub mod options;
pub mod request;
pub mod response;
pub mod shared;
pub mod transfer;

pub use config::ExecuteOptions;
pub use cookie::{parse_jar, Cookie, CookieCodec, HeaderCodec, JarCodec};
pub use error::{Error, Result};
pub use file::{FileDownload, FileUpload, ProgressHandler};
pub use http::{Method, ResponseHeaders};
pub use multi::{BatchMember, MultiRequest, Pipelining};
pub use options::{HttpVersion, OptionId, TimeCondition, TransferOption};
pub use request::{Request, RequestState};
pub use response::Response;
pub use shared::{SharedMember, SharedRequest};
pub use transfer::{PoolOption, ShareType, TransferHandle, TransferInfo, UploadFile};
