//! Canned HTTP endpoint used to exercise the fetch pipeline end-to-end.
//!
//! Every route returns a fixed, deterministic response except `/counter`,
//! which increments on each hit, and `/echo`, which reflects the request.

use std::{
    collections::BTreeMap,
    io::{BufRead, BufReader, Write},
    net::SocketAddr,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    http::{header, HeaderMap, HeaderName, Method, StatusCode},
    response::{AppendHeaders, IntoResponse},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// Header the `/ok` and `/binary` routes send twice.
pub const REPEATED_HEADER: &str = "x-foo";

/// How long `/slow` waits before answering.
pub const SLOW_DELAY: Duration = Duration::from_secs(2);

/// `Content-Length` announced by [`spawn_stalled_body`]; only
/// [`STALLED_BODY_PREFIX`] of it is ever sent.
pub const STALLED_BODY_LENGTH: usize = 10;
pub const STALLED_BODY_PREFIX: &str = "abc";

/// Body of `/echo`: what the server saw.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Echo {
    pub method: String,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

pub type Hits = Arc<AtomicU64>;

pub fn app() -> Router {
    let hits: Hits = Arc::new(AtomicU64::new(0));
    Router::new()
        .route("/ok", get(ok).post(ok))
        .route("/binary", get(binary))
        .route("/json", get(json))
        .route("/latin1", get(latin1))
        .route("/untyped", get(untyped))
        .route("/status/{code}", get(status))
        .route("/counter", get(counter))
        .route("/slow", get(slow))
        .route("/echo", any(echo))
        .with_state(hits)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Bind a random local port and serve [`app`] from a background thread.
///
/// Returns once the listener is bound, so callers can issue requests
/// immediately.
pub fn spawn() -> Result<SocketAddr, std::io::Error> {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let addr = std_listener.local_addr()?;
    std_listener.set_nonblocking(true)?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    std::thread::spawn(move || {
        rt.block_on(async {
            let listener = TcpListener::from_std(std_listener)?;
            run(listener).await
        })
    });

    Ok(addr)
}

/// Serve responses that send their headers and part of the body, then go
/// quiet for [`SLOW_DELAY`] before closing the connection. Speaks HTTP/1.1
/// over a plain socket so the body can be cut short.
pub fn spawn_stalled_body() -> Result<SocketAddr, std::io::Error> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;

    std::thread::spawn(move || -> Result<(), std::io::Error> {
        for stream in listener.incoming() {
            let mut stream = stream?;
            {
                let mut reader = BufReader::new(&stream);
                let mut line = String::new();
                while reader.read_line(&mut line)? > 0 && line != "\r\n" {
                    line.clear();
                }
            }
            write!(
                stream,
                "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {STALLED_BODY_LENGTH}\r\n\r\n{STALLED_BODY_PREFIX}"
            )?;
            stream.flush()?;
            std::thread::sleep(SLOW_DELAY);
        }
        Ok(())
    });

    Ok(addr)
}

fn repeated(first: &'static str, second: &'static str) -> AppendHeaders<[(HeaderName, &'static str); 2]> {
    let name = HeaderName::from_static(REPEATED_HEADER);
    AppendHeaders([(name.clone(), first), (name, second)])
}

async fn ok() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain")],
        repeated("a", "b"),
        Body::from("hello"),
    )
}

async fn binary() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/octet-stream")],
        repeated("a", "b"),
        Body::from("hello"),
    )
}

async fn json() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        Body::from(r#"{"ok":true}"#),
    )
}

async fn latin1() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=iso-8859-1")],
        Body::from("caf\u{e9}"),
    )
}

async fn untyped() -> impl IntoResponse {
    (StatusCode::OK, Body::from("no content type"))
}

async fn status(Path(code): Path<u16>) -> impl IntoResponse {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST);
    (
        status,
        [(header::CONTENT_TYPE, "text/plain")],
        Body::from(status.to_string()),
    )
}

async fn counter(State(hits): State<Hits>) -> impl IntoResponse {
    let n = hits.fetch_add(1, Ordering::SeqCst) + 1;
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain")],
        Body::from(n.to_string()),
    )
}

async fn slow() -> impl IntoResponse {
    tokio::time::sleep(SLOW_DELAY).await;
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain")],
        Body::from("late"),
    )
}

async fn echo(method: Method, headers: HeaderMap, body: Bytes) -> Json<Echo> {
    let headers = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    Json(Echo {
        method: method.to_string(),
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}
