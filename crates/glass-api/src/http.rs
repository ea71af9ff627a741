use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    response::{
        IntoResponse,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio_stream::{StreamExt, wrappers::ReceiverStream};
use tracing::debug;

use glass_exec::Execution;
use glass_model::{CommandId, SessionId};

use crate::{error::ApiError, frame::Frame, handler::ApiHandler, request::ExecuteRequest};

/// HTTP API service builder.
pub struct HttpApi<H> {
    handler: Arc<H>,
}

impl<H> HttpApi<H>
where
    H: ApiHandler,
{
    /// Create new HTTP API with the given handler.
    pub fn new(handler: Arc<H>) -> Self {
        Self { handler }
    }

    /// Build axum router with mounted endpoints.
    ///
    /// Routes:
    /// - GET  /api/session - Mint a session id
    /// - GET  /api/v1/config - Server info and command catalog
    /// - POST /api/v1/commands - Run a command, streamed as SSE
    /// - POST /api/v1/commands/{id}/stop - Stop a running command
    pub fn router(self) -> Router {
        Router::new()
            .route("/api/session", get(new_session::<H>))
            .route("/api/v1/config", get(get_config::<H>))
            .route("/api/v1/commands", post(execute::<H>))
            .route("/api/v1/commands/{id}/stop", post(stop::<H>))
            .with_state(self.handler)
    }
}

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct SessionResponse {
    session_id: SessionId,
}

#[derive(Debug, Serialize, Deserialize)]
struct StopResponse {
    success: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/session
async fn new_session<H>(State(handler): State<Arc<H>>) -> impl IntoResponse
where
    H: ApiHandler,
{
    Json(SessionResponse {
        session_id: handler.new_session(),
    })
}

/// GET /api/v1/config
async fn get_config<H>(State(handler): State<Arc<H>>) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    Ok(Json(handler.config().await?))
}

/// POST /api/v1/commands
async fn execute<H>(
    State(handler): State<Arc<H>>,
    Json(req): Json<ExecuteRequest>,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let Execution { id, events } = handler.execute(req).await?;
    debug!(target: "glass.api", command_id = %id, "streaming command output");

    let frames = tokio_stream::once(Frame::Started { command_id: id })
        .chain(ReceiverStream::new(events).map(Frame::from))
        .map(|frame| Event::default().event(frame.name()).json_data(&frame));

    Ok(Sse::new(frames).keep_alive(KeepAlive::default()))
}

/// POST /api/v1/commands/{id}/stop
async fn stop<H>(
    State(handler): State<Arc<H>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let id = CommandId::from(id);
    let success = handler.stop(&id).await?;
    Ok(Json(StopResponse { success }))
}

#[cfg(all(test, target_family = "unix"))]
mod tests {
    use std::{net::IpAddr, net::SocketAddr, time::Duration};

    use async_trait::async_trait;
    use glass_core::RateLimiter;
    use glass_dns::{DnsError, Resolve};
    use glass_exec::Launcher;
    use glass_model::{CommandCatalog, CommandTemplate, IpVersion, RateLimitConfig, ServerInfo};
    use serde_json::{Value, json};

    use super::*;
    use crate::adapter::GlassAdapter;

    struct NoDns;

    #[async_trait]
    impl Resolve for NoDns {
        async fn resolve(&self, domain: &str, _: IpVersion) -> Result<Vec<IpAddr>, DnsError> {
            Err(DnsError::Exhausted {
                domain: domain.to_string(),
                reason: "offline".into(),
            })
        }
    }

    async fn serve(max_commands: usize) -> SocketAddr {
        let catalog: CommandCatalog = [
            CommandTemplate::new("hello", "echo hello").ignoring_target(),
            CommandTemplate::new("echo", "echo").with_description("echo the target"),
            CommandTemplate::new("sleep", "sleep 30").ignoring_target(),
        ]
        .into_iter()
        .collect();
        let launcher = Launcher::new(Arc::new(catalog), Arc::new(NoDns));
        let limiter = RateLimiter::new(&RateLimitConfig {
            enabled: true,
            max_commands,
            time_window: 60,
        });
        let info = ServerInfo {
            name: "lg-test".into(),
            ..Default::default()
        };
        let adapter = GlassAdapter::new(launcher, Arc::new(limiter), info).with_version("9.9.9");
        let router = HttpApi::new(Arc::new(adapter)).router();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    async fn post(addr: SocketAddr, path: &str, body: Value) -> reqwest::Response {
        reqwest::Client::new()
            .post(format!("http://{addr}{path}"))
            .header("content-type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .unwrap()
    }

    fn frames(body: &str) -> Vec<Frame> {
        body.lines()
            .filter_map(|l| l.strip_prefix("data:"))
            .map(|d| serde_json::from_str(d.trim()).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn session_ids_are_uuids() {
        let addr = serve(10).await;
        let body: Value = reqwest::get(format!("http://{addr}/api/session"))
            .await
            .unwrap()
            .text()
            .await
            .map(|t| serde_json::from_str(&t).unwrap())
            .unwrap();
        let id = body["session_id"].as_str().unwrap();
        assert!(uuid::Uuid::parse_str(id).is_ok());
    }

    #[tokio::test]
    async fn config_lists_commands_in_order() {
        let addr = serve(10).await;
        let text = reqwest::get(format!("http://{addr}/api/v1/config"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        let body: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(body["version"], "9.9.9");
        assert_eq!(body["host"]["name"], "lg-test");
        let names: Vec<&str> = body["commands"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["hello", "echo", "sleep"]);
        assert_eq!(body["commands"][1]["description"], "echo the target");
    }

    #[tokio::test]
    async fn command_output_is_streamed() {
        let addr = serve(10).await;
        let resp = post(
            addr,
            "/api/v1/commands",
            json!({"command": "hello", "session_id": "s1"}),
        )
        .await;
        assert_eq!(resp.status(), 200);
        let frames = frames(&resp.text().await.unwrap());

        assert!(matches!(&frames[0], Frame::Started { command_id } if command_id.as_str().starts_with("hello-s1-")));
        assert_eq!(
            frames[1..],
            [
                Frame::Output {
                    output: "hello".into(),
                    is_error: false
                },
                Frame::Complete {
                    success: true,
                    error: None
                },
            ]
        );
    }

    #[tokio::test]
    async fn invalid_target_is_reported_in_stream() {
        let addr = serve(10).await;
        let resp = post(
            addr,
            "/api/v1/commands",
            json!({"command": "echo", "target": "not a host", "session_id": "s1"}),
        )
        .await;
        let frames = frames(&resp.text().await.unwrap());
        assert_eq!(frames.len(), 3);
        assert!(matches!(&frames[1], Frame::Error { error } if error.starts_with("invalid target")));
        assert_eq!(
            frames[2],
            Frame::Complete {
                success: false,
                error: None
            }
        );
    }

    #[tokio::test]
    async fn rejected_requests_map_to_status_codes() {
        let addr = serve(1).await;

        let resp = post(addr, "/api/v1/commands", json!({"command": "hello", "session_id": " "})).await;
        assert_eq!(resp.status(), 400);

        let resp = post(addr, "/api/v1/commands", json!({"command": "nope", "session_id": "s1"})).await;
        assert_eq!(resp.status(), 404);

        // the 404 above consumed the only slot
        let resp = post(addr, "/api/v1/commands", json!({"command": "hello", "session_id": "s1"})).await;
        assert_eq!(resp.status(), 429);
        assert!(resp.headers().contains_key("retry-after"));
        let body: Value = serde_json::from_str(&resp.text().await.unwrap()).unwrap();
        let secs = body["retry_after_secs"].as_u64().unwrap();
        assert!((1..=60).contains(&secs));

        let resp = post(addr, "/api/v1/commands", json!({"command": "hello", "session_id": "s2"})).await;
        assert_eq!(resp.status(), 200);
    }

    #[tokio::test]
    async fn stop_ends_a_running_stream() {
        let addr = serve(10).await;
        let resp = post(addr, "/api/v1/commands", json!({"command": "sleep", "session_id": "s1"})).await;
        let mut stream = SseReader::new(resp);
        let started = stream.first_frame().await;
        let Frame::Started { command_id } = started else {
            panic!("expected started frame, got {started:?}");
        };

        let stop = post(addr, &format!("/api/v1/commands/{command_id}/stop"), json!({})).await;
        let body: Value = serde_json::from_str(&stop.text().await.unwrap()).unwrap();
        assert_eq!(body, json!({"success": true}));

        let rest = tokio::time::timeout(Duration::from_secs(10), stream.rest())
            .await
            .unwrap();
        assert_eq!(frames(&rest), [Frame::Stopped]);
    }

    #[tokio::test]
    async fn stopping_unknown_command_reports_false() {
        let addr = serve(10).await;
        let resp = post(addr, "/api/v1/commands/ghost/stop", json!({})).await;
        let body: Value = serde_json::from_str(&resp.text().await.unwrap()).unwrap();
        assert_eq!(body, json!({"success": false}));
    }

    /// Incremental reader over an SSE response body.
    struct SseReader {
        resp: reqwest::Response,
        buf: String,
    }

    impl SseReader {
        fn new(resp: reqwest::Response) -> Self {
            Self {
                resp,
                buf: String::new(),
            }
        }

        async fn first_frame(&mut self) -> Frame {
            loop {
                if let Some(end) = self.buf.find("\n\n") {
                    let block: String = self.buf.drain(..end + 2).collect();
                    if let Some(frame) = frames(&block).into_iter().next() {
                        return frame;
                    }
                    continue;
                }
                let chunk = self.resp.chunk().await.unwrap().expect("stream ended early");
                self.buf.push_str(&String::from_utf8_lossy(&chunk));
            }
        }

        async fn rest(mut self) -> String {
            while let Some(chunk) = self.resp.chunk().await.unwrap() {
                self.buf.push_str(&String::from_utf8_lossy(&chunk));
            }
            self.buf
        }
    }
}
