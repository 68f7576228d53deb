use std::sync::{Arc, Mutex};

use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use futures::stream;
use tokio::net::TcpListener;

pub const TEST_TOKEN: &str = "test-channel-token";

/// Smallest valid PNG: signature plus the start of an IHDR chunk
pub const PNG_BYTES: &[u8] = &[
    0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, b'I', b'H', b'D', b'R',
];
pub const GIF_BYTES: &[u8] = b"GIF89a\x01\x00\x01\x00\x00\x00\x00;";

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub path: String,
    pub authorization: Option<String>,
    pub body: Vec<u8>,
}

type Captured = Arc<Mutex<Vec<CapturedRequest>>>;

/// Local stand-in for the LINE content and reply APIs and for an external image host
pub struct MockLineServer {
    pub base_url: String,
    captured: Captured,
}

impl MockLineServer {
    pub async fn start() -> Self {
        let captured: Captured = Arc::default();

        let app = Router::new()
            .route("/v2/bot/message/{id}/content", get(line_content))
            .route("/external/{name}", get(external_content))
            .route("/v2/bot/message/reply", post(reply))
            .with_state(captured.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            captured,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub fn captured(&self) -> Vec<CapturedRequest> {
        self.captured.lock().unwrap().clone()
    }
}

fn capture(captured: &Captured, path: String, headers: &HeaderMap, body: &[u8]) {
    captured.lock().unwrap().push(CapturedRequest {
        path,
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string),
        body: body.to_vec(),
    });
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        == Some(format!("Bearer {TEST_TOKEN}").as_str())
}

async fn line_content(
    State(captured): State<Captured>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    capture(&captured, format!("/v2/bot/message/{id}/content"), &headers, &[]);

    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, r#"{"message":"Authentication failed"}"#).into_response();
    }

    ([(header::CONTENT_TYPE, "image/png")], PNG_BYTES).into_response()
}

async fn external_content(
    State(captured): State<Captured>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Response {
    capture(&captured, format!("/external/{name}"), &headers, &[]);

    match name.as_str() {
        "photo.gif" => ([(header::CONTENT_TYPE, "image/gif")], GIF_BYTES).into_response(),
        "untyped" => Response::new(Body::from(PNG_BYTES)),
        "chunked.jpg" => {
            let chunks = (0u8..4).map(|i| Ok::<_, std::io::Error>(Bytes::from(vec![i; 1024])));
            (
                [(header::CONTENT_TYPE, "image/jpeg")],
                Body::from_stream(stream::iter(chunks)),
            )
                .into_response()
        }
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn reply(State(captured): State<Captured>, headers: HeaderMap, body: Bytes) -> Response {
    capture(&captured, "/v2/bot/message/reply".to_string(), &headers, &body);

    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, r#"{"message":"Authentication failed"}"#).into_response();
    }

    (StatusCode::OK, "{}").into_response()
}
