//! Live transfers against the receiver fixture.
//!
//! # Design
//! Each test starts its own receiver on a random port in a background Tokio
//! runtime, then drives real libcurl transfers through the public API. The
//! receiver echoes plain requests as JSON and keeps the last uploaded body,
//! so uploads are verified by reading it back.

use std::sync::{Arc, Mutex};

use mock_server::{Echo, Stored, DOWNLOAD_BODY};
use requester_core::{
    BatchMember, Error, ExecuteOptions, FileDownload, FileUpload, Method, MultiRequest,
    Pipelining, Request, RequestState, ShareType, SharedRequest,
};

/// Start the receiver on a random port and return its base URL.
fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
    });

    format!("http://{addr}")
}

/// URL of a port nothing listens on.
fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/")
}

fn last_upload(base: &str) -> Vec<u8> {
    let mut request = Request::get(&format!("{base}/uploads/last")).unwrap();
    let response = request.execute(&ExecuteOptions::default()).unwrap();
    assert_eq!(response.status(), 200);
    response.into_body()
}

// ---------------------------------------------------------------------------
// Single requests
// ---------------------------------------------------------------------------

#[test]
fn get_sends_configured_headers() {
    let base = start_server();
    let mut request = Request::get(&format!("{base}/?page=2")).unwrap();
    request
        .set_headers()
        .set_user_agent("requester-test")
        .unwrap()
        .add_custom_header("x-trace-id", "7")
        .unwrap();

    let response = request.execute(&ExecuteOptions::default()).unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.header("content-type"), Some("application/json"));
    assert_eq!(request.state(), RequestState::Executed);

    let echo: Echo = response.json().unwrap();
    assert_eq!(echo.method, "GET");
    assert_eq!(echo.query["page"], "2");
    assert_eq!(echo.headers["user-agent"], "requester-test");
    assert_eq!(echo.headers["x-trace-id"], "7");
}

#[test]
fn post_parameters_are_url_encoded() {
    let base = start_server();
    let mut request = Request::get(&format!("{base}/")).unwrap();
    request.set_method(Method::Post);
    request.set_parameters().add("a", "1").add("b", "two words");

    let response = request.execute(&ExecuteOptions::default()).unwrap();
    let stored: Stored = response.json().unwrap();
    assert_eq!(stored.bytes, "a=1&b=two+words".len());
    assert_eq!(last_upload(&base), b"a=1&b=two+words");
}

#[test]
fn put_raw_body_is_sent_verbatim() {
    let base = start_server();
    let mut request = Request::get(&format!("{base}/")).unwrap();
    request.set_method(Method::Put).set_raw(r#"{"k":1}"#);

    let response = request.execute(&ExecuteOptions::default()).unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(last_upload(&base), br#"{"k":1}"#);
}

#[test]
fn post_without_body_fails_before_any_transfer() {
    let base = start_server();
    let mut request = Request::get(&format!("{base}/")).unwrap();
    request.set_method(Method::Post);

    let err = request.execute(&ExecuteOptions::default()).unwrap_err();
    assert!(matches!(err, Error::MissingBody));
    assert_eq!(request.state(), RequestState::Configured);
}

#[test]
fn non_success_status_is_a_response() {
    let base = start_server();
    let mut request = Request::get(&format!("{base}/status/418")).unwrap();
    let response = request.execute(&ExecuteOptions::default()).unwrap();
    assert_eq!(response.status(), 418);
    assert!(!response.is_success());
}

#[test]
fn redirects_follow_the_configured_cap() {
    let base = start_server();
    let mut request = Request::get(&format!("{base}/redirect")).unwrap();

    let response = request.execute(&ExecuteOptions::default()).unwrap();
    assert_eq!(response.status(), 303);
    assert_eq!(response.header("location"), Some("/"));

    let follow = ExecuteOptions {
        max_redirects: 3,
        ..Default::default()
    };
    let response = request.execute(&follow).unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.url(), format!("{base}/"));
    assert_eq!(response.info().redirect_count, 1);
}

#[test]
fn return_transfer_off_discards_body() {
    let base = start_server();
    let mut request = Request::get(&format!("{base}/download")).unwrap();
    request.set_return_transfer(false);

    let response = request.execute(&ExecuteOptions::default()).unwrap();
    assert_eq!(response.status(), 200);
    assert!(response.body().is_empty());
    assert!(response.headers().is_empty());
}

#[test]
fn unreachable_host_is_a_transfer_error() {
    let mut request = Request::get(&closed_port_url()).unwrap();
    let options = ExecuteOptions {
        connect_timeout_ms: 2_000,
        ..Default::default()
    };

    let err = request.execute(&options).unwrap_err();
    assert!(matches!(err, Error::Transfer { .. }), "{err}");
    assert!(err.code().is_some());
}

// ---------------------------------------------------------------------------
// Batches
// ---------------------------------------------------------------------------

#[test]
fn multi_returns_one_response_per_request_in_order() {
    let base = start_server();
    let mut multi = MultiRequest::new(Pipelining::default());
    for n in 0..3 {
        multi.add(Request::get(&format!("{base}/?n={n}")).unwrap());
    }

    let responses = multi.execute(&ExecuteOptions::default()).unwrap();
    assert_eq!(responses.len(), 3);
    for (n, response) in responses.iter().enumerate() {
        assert_eq!(response.status(), 200);
        assert_eq!(response.url(), format!("{base}/?n={n}"));
        let echo: Echo = response.json().unwrap();
        assert_eq!(echo.query["n"], n.to_string());
    }
    assert_eq!(multi.len(), 3);
}

#[test]
fn multi_can_run_twice() {
    let base = start_server();
    let mut multi = MultiRequest::new(Pipelining::Disabled);
    multi.add(Request::get(&format!("{base}/")).unwrap());
    multi.add(Request::get(&format!("{base}/download")).unwrap());

    let first = multi.execute(&ExecuteOptions::default()).unwrap();
    let second = multi.execute(&ExecuteOptions::default()).unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(second[1].body(), DOWNLOAD_BODY.as_bytes());
}

#[test]
fn one_failed_member_aborts_the_batch() {
    let base = start_server();
    let mut multi = MultiRequest::default();
    multi.add(Request::get(&format!("{base}/")).unwrap());
    multi.add(Request::get(&closed_port_url()).unwrap());

    let err = multi.execute(&ExecuteOptions::default()).unwrap_err();
    assert!(matches!(err, Error::Transfer { .. }), "{err}");
    assert_eq!(multi.len(), 2);
}

#[test]
fn multi_return_transfer_covers_later_members() {
    let base = start_server();
    let mut multi = MultiRequest::default();
    multi.set_return_transfer(false);
    multi.add(Request::get(&format!("{base}/download")).unwrap());
    multi.add(Request::get(&format!("{base}/")).unwrap());

    let responses = multi.execute(&ExecuteOptions::default()).unwrap();
    assert_eq!(responses.len(), 2);
    assert!(responses
        .iter()
        .all(|response| response.status() == 200 && response.body().is_empty()));
}

#[test]
fn multi_runs_file_transfers_next_to_requests() {
    let base = start_server();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("batched.json");

    let mut download = FileDownload::new();
    download
        .set_url(&format!("{base}/download"))
        .unwrap()
        .set_file(&path)
        .unwrap();
    let mut upload = FileUpload::new();
    upload
        .set_url(&format!("{base}/"))
        .unwrap()
        .set_method(Method::Post)
        .unwrap()
        .set_raw("batched-body");

    let mut multi = MultiRequest::new(Pipelining::Disabled);
    multi.add(download);
    multi.add(Request::get(&format!("{base}/?n=1")).unwrap());
    multi.add(upload);

    let responses = multi.execute(&ExecuteOptions::default()).unwrap();
    assert_eq!(responses.len(), 3);
    assert!(responses[0].body().is_empty());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), DOWNLOAD_BODY);
    let echo: Echo = responses[1].json().unwrap();
    assert_eq!(echo.query["n"], "1");
    let stored: Stored = responses[2].json().unwrap();
    assert_eq!(stored.bytes, "batched-body".len());
    assert!(matches!(multi.members()[0], BatchMember::Download(_)));
}

// ---------------------------------------------------------------------------
// Shared context
// ---------------------------------------------------------------------------

#[test]
fn shared_requests_see_each_others_cookies() {
    let base = start_server();
    let mut shared = SharedRequest::new(&[ShareType::Cookies, ShareType::DnsCache]).unwrap();
    let setter = shared
        .add(Request::get(&format!("{base}/?newcookie=1")).unwrap())
        .unwrap();
    let reader = shared.add(Request::get(&format!("{base}/")).unwrap()).unwrap();
    let options = ExecuteOptions::default();

    let first = shared.execute(setter, &options).unwrap().unwrap();
    let cookies = first.cookies();
    assert_eq!(cookies.len(), 1);
    assert_eq!(cookies[0].name(), "hello");
    assert_eq!(cookies[0].max_age(), 3600);

    let second = shared.execute(reader, &options).unwrap().unwrap();
    let echo: Echo = second.json().unwrap();
    assert_eq!(echo.headers["cookie"], "hello=world");
}

#[test]
fn unshared_requests_keep_cookies_apart() {
    let base = start_server();
    let options = ExecuteOptions::default();
    let mut setter = Request::get(&format!("{base}/?newcookie=1")).unwrap();
    setter.set_cookies().start_new_session().unwrap();
    setter.execute(&options).unwrap();

    let mut reader = Request::get(&format!("{base}/")).unwrap();
    let echo: Echo = reader.execute(&options).unwrap().json().unwrap();
    assert!(!echo.headers.contains_key("cookie"));
}

// ---------------------------------------------------------------------------
// File transfers
// ---------------------------------------------------------------------------

#[test]
fn download_writes_body_and_reports_progress() {
    let base = start_server();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("download.json");
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let mut download = FileDownload::new();
    download
        .set_url(&format!("{base}/download"))
        .unwrap()
        .set_file(&path)
        .unwrap()
        .set_progress_handler(move |total, processed| sink.lock().unwrap().push((total, processed)))
        .unwrap();

    let response = download.execute(&ExecuteOptions::default()).unwrap();
    assert_eq!(response.status(), 200);
    assert!(response.body().is_empty());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), DOWNLOAD_BODY);

    let seen = seen.lock().unwrap();
    assert!(!seen.is_empty());
    assert!(seen.windows(2).all(|w| w[0].1 <= w[1].1));
    assert_eq!(seen.last().unwrap().1, DOWNLOAD_BODY.len() as u64);
}

#[test]
fn download_target_is_consumed_by_execute() {
    let base = start_server();
    let dir = tempfile::tempdir().unwrap();
    let mut download = FileDownload::new();
    download
        .set_url(&format!("{base}/download"))
        .unwrap()
        .set_file(dir.path().join("once.json"))
        .unwrap();
    download.execute(&ExecuteOptions::default()).unwrap();

    let err = download.execute(&ExecuteOptions::default()).unwrap_err();
    assert!(matches!(err, Error::MissingFileTarget));
}

#[test]
fn put_upload_streams_the_file() {
    let base = start_server();
    let mut source = tempfile::NamedTempFile::new().unwrap();
    std::io::Write::write_all(&mut source, br#"{"name":"put"}"#).unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let mut upload = FileUpload::new();
    upload
        .set_url(&format!("{base}/"))
        .unwrap()
        .set_file(source.path())
        .unwrap()
        .set_progress_handler(move |total, processed| sink.lock().unwrap().push((total, processed)))
        .unwrap();

    let response = upload.execute(&ExecuteOptions::default()).unwrap();
    let stored: Stored = response.json().unwrap();
    assert_eq!(stored.bytes, 14);
    assert_eq!(last_upload(&base), br#"{"name":"put"}"#);
    assert_eq!(seen.lock().unwrap().last(), Some(&(14, 14)));
}

#[test]
fn post_upload_sends_raw_body() {
    let base = start_server();
    let mut upload = FileUpload::new();
    upload
        .set_url(&format!("{base}/"))
        .unwrap()
        .set_method(Method::Post)
        .unwrap()
        .set_raw("raw-body");

    let response = upload.execute(&ExecuteOptions::default()).unwrap();
    let stored: Stored = response.json().unwrap();
    assert_eq!(stored.bytes, 8);
    assert_eq!(last_upload(&base), b"raw-body");
}

#[test]
fn post_upload_after_put_keeps_the_post_verb() {
    let base = start_server();
    let mut source = tempfile::NamedTempFile::new().unwrap();
    std::io::Write::write_all(&mut source, b"put-first").unwrap();

    let mut put = FileUpload::new();
    put.set_url(&format!("{base}/"))
        .unwrap()
        .set_file(source.path())
        .unwrap();
    put.execute(&ExecuteOptions::default()).unwrap();
    assert_eq!(last_upload(&base), b"put-first");

    let mut post = FileUpload::new();
    post.set_url(&format!("{base}/"))
        .unwrap()
        .set_method(Method::Post)
        .unwrap()
        .set_raw("posted");
    let response = post.execute(&ExecuteOptions::default()).unwrap();
    let stored: Stored = response.json().unwrap();
    assert_eq!(stored.bytes, 6);
    assert_eq!(last_upload(&base), b"posted");
}

#[test]
fn multipart_parameters_carry_the_file() {
    let base = start_server();
    let mut source = tempfile::NamedTempFile::new().unwrap();
    std::io::Write::write_all(&mut source, b"file-contents").unwrap();

    let mut request = Request::get(&format!("{base}/")).unwrap();
    request.set_method(Method::Post);
    request
        .set_parameters()
        .add("field", "value")
        .add_file("upload", source.path(), "notes.txt")
        .unwrap();

    let response = request.execute(&ExecuteOptions::default()).unwrap();
    assert_eq!(response.status(), 200);
    let body = String::from_utf8(last_upload(&base)).unwrap();
    assert!(body.contains(r#"filename="notes.txt""#));
    assert!(body.contains("file-contents"));
    assert!(body.contains("value"));
}
