//! WebSocket client for the remote graph-building service.
//!
//! One call to [`GraphClient::build_graph`] is one exchange: connect, send the
//! request, then read messages in arrival order until a graph arrives or the
//! exchange fails. There is no retry or reconnect.

mod messages;

pub use messages::{decode, ServiceMessage};

use std::future::Future;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::config::ServiceConfig;
use crate::error::{GeneagrapherError, Result};
use crate::graph::Geneagraph;
use crate::progress::ProgressCounts;
use crate::request::RequestPayload;

/// Address of the hosted graph-building service.
pub const DEFAULT_SERVICE_URL: &str = "wss://placeholder";

/// Default timeout for opening the connection
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default limit on silence between two messages
pub const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_secs(300);

/// Client for a single build-graph exchange.
#[derive(Debug, Clone)]
pub struct GraphClient {
    url: String,
    connect_timeout: Option<Duration>,
    receive_timeout: Option<Duration>,
}

impl GraphClient {
    /// Create a client targeting the given `ws://` or `wss://` URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
            receive_timeout: Some(DEFAULT_RECEIVE_TIMEOUT),
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            url: config.url.clone(),
            connect_timeout: config.connect_timeout(),
            receive_timeout: config.receive_timeout(),
        }
    }

    /// Bound connection setup; `None` waits indefinitely.
    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Bound the wait for each next message; `None` waits indefinitely.
    pub fn with_receive_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.receive_timeout = timeout;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Run one exchange. `on_progress` is called once per progress message,
    /// in arrival order, before the next message is read.
    pub async fn build_graph<F>(&self, payload: &RequestPayload, mut on_progress: F) -> Result<Geneagraph>
    where
        F: FnMut(&ProgressCounts),
    {
        let request_json = payload.to_json()?;

        let (ws_stream, _) = bounded(self.connect_timeout, connect_async(self.url.as_str()))
            .await
            .map_err(|_| GeneagrapherError::unavailable(format!("Timeout connecting to {}", self.url)))?
            .map_err(|e| {
                log::warn!("Connection to {} failed: {}", self.url, e);
                GeneagrapherError::unavailable(format!("Connect to {} failed: {}", self.url, e))
            })?;
        log::info!("Connected to {}", self.url);

        let (mut write, mut read) = ws_stream.split();

        write
            .send(Message::Text(request_json))
            .await
            .map_err(|e| GeneagrapherError::unavailable(format!("Failed to send request: {e}")))?;
        log::debug!("Sent build-graph request for {} start node(s)", payload.start_nodes.len());

        loop {
            let next = bounded(self.receive_timeout, read.next())
                .await
                .map_err(|_| GeneagrapherError::unavailable("Timeout waiting for service message"))?;

            let text = match next {
                Some(Ok(Message::Text(text))) => text,
                Some(Ok(Message::Binary(data))) => match String::from_utf8(data) {
                    Ok(text) => text,
                    Err(e) => {
                        return Err(GeneagrapherError::UnexpectedResponse {
                            response: String::from_utf8_lossy(e.as_bytes()).into_owned(),
                        })
                    }
                },
                Some(Ok(Message::Close(frame))) => {
                    log::warn!("Service closed the connection: {:?}", frame);
                    return Err(GeneagrapherError::unavailable(
                        "Connection closed before a graph was received",
                    ));
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    log::warn!("WebSocket error: {}", e);
                    return Err(GeneagrapherError::unavailable(format!("WebSocket error: {e}")));
                }
                None => {
                    return Err(GeneagrapherError::unavailable(
                        "Connection ended before a graph was received",
                    ))
                }
            };

            match decode(&text) {
                Some(ServiceMessage::Progress(counts)) => {
                    log::debug!(
                        "Progress: queued={} fetching={} done={}",
                        counts.queued,
                        counts.fetching,
                        counts.done
                    );
                    on_progress(&counts);
                }
                Some(ServiceMessage::Graph(graph)) => {
                    log::info!(
                        "Received graph with {} node(s), status {:?}",
                        graph.nodes.len(),
                        graph.status
                    );
                    let _ = write.close().await;
                    return Ok(graph);
                }
                None => {
                    log::warn!("Unexpected response from service");
                    let _ = write.close().await;
                    return Err(GeneagrapherError::UnexpectedResponse { response: text });
                }
            }
        }
    }
}

async fn bounded<F: Future>(
    limit: Option<Duration>,
    fut: F,
) -> std::result::Result<F::Output, tokio::time::error::Elapsed> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut).await,
        None => Ok(fut.await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphStatus;
    use crate::request::{build, StartNodeSpec};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;
    use tokio_tungstenite::accept_async;

    const GRAPH_MESSAGE: &str = r#"{"kind":"graph","payload":{"start_nodes":[30484],"status":"complete","nodes":{
        "30484":{"id":30484,"name":"Peter Chris Pappas","institution":"The Pennsylvania State University",
                 "year":1982,"descendants":[],"advisors":[]}}}}"#;

    fn payload() -> RequestPayload {
        build(&[StartNodeSpec::new(30484, true, false)], false)
    }

    /// Serve one connection: capture the request, then send `replies` in order.
    async fn serve_once(replies: Vec<Message>) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            let request = match ws.next().await {
                Some(Ok(Message::Text(text))) => text,
                other => panic!("expected text request, got {other:?}"),
            };
            for reply in replies {
                if ws.send(reply).await.is_err() {
                    break;
                }
            }
            let _ = ws.close(None).await;
            request
        });

        (url, handle)
    }

    #[tokio::test]
    async fn test_progress_then_graph() {
        let (url, server) = serve_once(vec![
            Message::Text(r#"{"kind":"progress","payload":{"queued":1,"fetching":0,"done":0}}"#.into()),
            Message::Text(r#"{"kind":"progress","payload":{"queued":0,"fetching":1,"done":0}}"#.into()),
            Message::Text(r#"{"kind":"progress","payload":{"queued":0,"fetching":0,"done":1}}"#.into()),
            Message::Text(GRAPH_MESSAGE.into()),
        ])
        .await;

        let mut seen = Vec::new();
        let graph = GraphClient::new(url)
            .build_graph(&payload(), |c| seen.push(*c))
            .await
            .unwrap();

        assert_eq!(graph.status, GraphStatus::Complete);
        assert_eq!(graph.nodes.get(30484).unwrap().year, Some(1982));
        assert_eq!(seen.iter().map(|c| c.done).collect::<Vec<_>>(), vec![0, 0, 1]);
        assert_eq!(seen[1].fetching, 1);

        let request: RequestPayload = serde_json::from_str(&server.await.unwrap()).unwrap();
        assert_eq!(request, payload());
    }

    #[tokio::test]
    async fn test_binary_frame_is_decoded() {
        let (url, _server) = serve_once(vec![Message::Binary(GRAPH_MESSAGE.as_bytes().to_vec())]).await;
        let graph = GraphClient::new(url).build_graph(&payload(), |_| {}).await.unwrap();
        assert_eq!(graph.nodes.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_kind_is_unexpected_response() {
        let error = r#"{"kind":"error","payload":{"message":"Invalid id"}}"#;
        let (url, _server) = serve_once(vec![
            Message::Text(r#"{"kind":"progress","payload":{"queued":1,"fetching":0,"done":0}}"#.into()),
            Message::Text(error.into()),
            Message::Text(GRAPH_MESSAGE.into()),
        ])
        .await;

        let mut calls = 0;
        let err = GraphClient::new(url)
            .build_graph(&payload(), |_| calls += 1)
            .await
            .unwrap_err();

        match err {
            GeneagrapherError::UnexpectedResponse { response } => assert_eq!(response, error),
            other => panic!("expected UnexpectedResponse, got {other:?}"),
        }
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_close_before_graph_is_unavailable() {
        let (url, _server) = serve_once(vec![Message::Text(
            r#"{"kind":"progress","payload":{"queued":3,"fetching":0,"done":0}}"#.into(),
        )])
        .await;

        let err = GraphClient::new(url).build_graph(&payload(), |_| {}).await.unwrap_err();
        assert!(matches!(err, GeneagrapherError::ServiceUnavailable { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn test_refused_connection_is_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = GraphClient::new(format!("ws://{addr}"))
            .build_graph(&payload(), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, GeneagrapherError::ServiceUnavailable { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn test_silent_service_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        let _server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            let _ = ws.next().await;
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let err = GraphClient::new(url)
            .with_receive_timeout(Some(Duration::from_millis(100)))
            .build_graph(&payload(), |_| {})
            .await
            .unwrap_err();
        match err {
            GeneagrapherError::ServiceUnavailable { reason } => assert!(reason.contains("Timeout")),
            other => panic!("expected ServiceUnavailable, got {other:?}"),
        }
    }
}
