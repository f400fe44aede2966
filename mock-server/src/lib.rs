use std::{collections::BTreeMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};

/// Cookie handed out when a request carries `?newcookie=1`.
pub const SESSION_COOKIE: &str = "hello=world; Max-Age=3600; Path=/";

/// Exact payload served by `/download`.
pub const DOWNLOAD_BODY: &str = r#"{"body":"OK"}"#;

/// What the receiver saw, echoed back for requests that carry no upload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub query: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

/// Acknowledgement for a stored upload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Stored {
    pub bytes: usize,
}

pub type Uploads = Arc<RwLock<Option<Vec<u8>>>>;

pub fn app() -> Router {
    let uploads: Uploads = Arc::new(RwLock::new(None));
    Router::new()
        .route("/", any(receive))
        .route("/download", get(download))
        .route("/uploads/last", get(last_upload))
        .route("/redirect", get(redirect))
        .route("/status/{code}", any(status))
        .with_state(uploads)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn receive(
    State(uploads): State<Uploads>,
    method: Method,
    Query(query): Query<BTreeMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let stores = method == Method::PUT || (method == Method::POST && !body.is_empty());
    let mut response = if stores {
        tracing::info!(%method, bytes = body.len(), "stored upload");
        let bytes = body.len();
        *uploads.write().await = Some(body.to_vec());
        Json(Stored { bytes }).into_response()
    } else {
        let echo = Echo {
            method: method.to_string(),
            query: query.clone(),
            headers: headers
                .iter()
                .map(|(name, value)| {
                    (
                        name.as_str().to_string(),
                        String::from_utf8_lossy(value.as_bytes()).into_owned(),
                    )
                })
                .collect(),
            body: "OK".to_string(),
        };
        Json(echo).into_response()
    };

    if query.get("newcookie").is_some_and(|v| !v.is_empty()) {
        response
            .headers_mut()
            .insert(header::SET_COOKIE, HeaderValue::from_static(SESSION_COOKIE));
    }
    response
}

async fn download() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json")], DOWNLOAD_BODY)
}

async fn last_upload(State(uploads): State<Uploads>) -> Result<Vec<u8>, StatusCode> {
    uploads.read().await.clone().ok_or(StatusCode::NOT_FOUND)
}

async fn redirect() -> Redirect {
    Redirect::to("/")
}

async fn status(Path(code): Path<u16>) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_serializes_to_json() {
        let echo = Echo {
            method: "GET".to_string(),
            query: BTreeMap::from([("a".to_string(), "1".to_string())]),
            headers: BTreeMap::new(),
            body: "OK".to_string(),
        };
        let json = serde_json::to_value(&echo).unwrap();
        assert_eq!(json["method"], "GET");
        assert_eq!(json["query"]["a"], "1");
        assert_eq!(json["body"], "OK");
    }

    #[test]
    fn echo_roundtrips_through_json() {
        let echo = Echo {
            method: "DELETE".to_string(),
            query: BTreeMap::new(),
            headers: BTreeMap::from([("cookie".to_string(), "a=b".to_string())]),
            body: "OK".to_string(),
        };
        let json = serde_json::to_string(&echo).unwrap();
        let back: Echo = serde_json::from_str(&json).unwrap();
        assert_eq!(back.method, echo.method);
        assert_eq!(back.headers, echo.headers);
    }

    #[test]
    fn download_body_is_valid_json() {
        let value: serde_json::Value = serde_json::from_str(DOWNLOAD_BODY).unwrap();
        assert_eq!(value["body"], "OK");
    }
}
