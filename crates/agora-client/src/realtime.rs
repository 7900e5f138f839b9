//! WebSocket realtime client for subscriptions
//!
//! One socket carries every live subscription. After the init/ack handshake
//! each subscription is started with its own id; the reader task routes
//! `data`/`error`/`complete` frames by id to the matching [`EventChannel`]
//! sender. Closing a channel sends the stop frame and removes the route, so
//! no new delivery can reach a consumer after `close()` returns.
//!
//! A payload that fails to decode is forwarded as a [`StreamError`] delivery
//! and never closes the channel; losing the socket faults every open route.

// Lock poisoning from panics is unrecoverable; expect() is the handling.
#![allow(clippy::expect_used)]

use crate::channel::{EventChannel, EventSender};
use crate::config::ClientConfig;
use crate::effects::SubscriptionEffects;
use crate::graphql::{
    GraphQlResponse, ON_CREATE_COMMENT_BY_TOPIC_ID, ON_CREATE_TOPIC,
    ON_DELETE_COMMENT_BY_TOPIC_ID,
};
use agora_core::{Comment, CommentId, StreamError, Topic, TopicId};
use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Frames the client sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientFrame {
    ConnectionInit,
    Start { id: String, payload: StartPayload },
    Stop { id: String },
}

/// Operation payload of a start frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct StartPayload {
    query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    variables: Option<serde_json::Value>,
}

/// Frames the server sends.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerFrame {
    ConnectionAck,
    #[serde(rename = "ka")]
    KeepAlive,
    Data {
        id: String,
        payload: GraphQlResponse,
    },
    Error {
        id: Option<String>,
        payload: serde_json::Value,
    },
    Complete {
        id: String,
    },
}

/// What the reader hands to one subscription's route.
enum RouteDelivery {
    Payload(GraphQlResponse),
    Fault(String),
}

type Route = Box<dyn Fn(RouteDelivery) + Send + Sync>;

struct RealtimeInner {
    routes: Mutex<HashMap<String, Route>>,
    out_tx: mpsc::UnboundedSender<Message>,
    next_id: AtomicU64,
    tasks: Mutex<Vec<tokio::task::JoinHandle<()>>>,
}

impl RealtimeInner {
    fn fault_all(&self, detail: &str) {
        let routes = self.routes.lock().expect("route table poisoned");
        for route in routes.values() {
            route(RouteDelivery::Fault(detail.to_string()));
        }
    }
}

/// Multiplexing realtime client; one instance serves every view.
#[derive(Clone)]
pub struct RealtimeClient {
    inner: Arc<RealtimeInner>,
}

impl RealtimeClient {
    /// Connect, perform the init/ack handshake, and start the socket tasks.
    pub async fn connect(config: &ClientConfig) -> Result<Self, StreamError> {
        config
            .validate()
            .map_err(|e| StreamError::Transport(e.to_string()))?;

        let (socket, _response) = timeout(
            config.connect_timeout(),
            connect_async(config.realtime_url.as_str()),
        )
        .await
        .map_err(|_| StreamError::Transport("realtime connect timeout".into()))?
        .map_err(|e| StreamError::Transport(format!("realtime connect failed: {e}")))?;

        let (mut sink, mut stream) = socket.split();
        send_frame(&mut sink, &ClientFrame::ConnectionInit).await?;
        timeout(config.connect_timeout(), await_ack(&mut stream))
            .await
            .map_err(|_| StreamError::Transport("realtime handshake timeout".into()))??;

        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let inner = Arc::new(RealtimeInner {
            routes: Mutex::new(HashMap::new()),
            out_tx,
            next_id: AtomicU64::new(1),
            tasks: Mutex::new(Vec::new()),
        });

        let writer = tokio::spawn(write_loop(out_rx, sink));
        let reader = tokio::spawn(read_loop(stream, inner.clone()));
        inner
            .tasks
            .lock()
            .expect("task list poisoned")
            .extend([writer, reader]);

        tracing::info!(url = %config.realtime_url, "realtime connected");
        Ok(Self { inner })
    }

    /// Tear the connection down; every open route is faulted and no further
    /// delivery occurs.
    pub fn shutdown(&self) {
        self.inner.fault_all("realtime client shut down");
        self.inner
            .routes
            .lock()
            .expect("route table poisoned")
            .clear();
        let _ = self.inner.out_tx.send(Message::Close(None));
        for task in self
            .inner
            .tasks
            .lock()
            .expect("task list poisoned")
            .drain(..)
        {
            task.abort();
        }
    }

    /// Start one subscription, decoding `data.<field>` as `W` and mapping it
    /// into the channel's item type.
    fn subscribe_with<W, T, F>(
        &self,
        query: &'static str,
        variables: Option<serde_json::Value>,
        field: &'static str,
        map: F,
    ) -> Result<EventChannel<T>, StreamError>
    where
        W: DeserializeOwned + Send + 'static,
        T: Send + 'static,
        F: Fn(W) -> T + Send + Sync + 'static,
    {
        let id = self
            .inner
            .next_id
            .fetch_add(1, Ordering::Relaxed)
            .to_string();

        let close_inner = self.inner.clone();
        let close_id = id.clone();
        let (sender, channel) = EventChannel::pair_with_close(move || {
            close_inner
                .routes
                .lock()
                .expect("route table poisoned")
                .remove(&close_id);
            if let Ok(text) = serde_json::to_string(&ClientFrame::Stop { id: close_id }) {
                let _ = close_inner.out_tx.send(Message::Text(text));
            }
        });

        let route = make_route(sender, field, map);
        self.inner
            .routes
            .lock()
            .expect("route table poisoned")
            .insert(id.clone(), route);

        let start = ClientFrame::Start {
            id,
            payload: StartPayload {
                query: query.to_string(),
                variables,
            },
        };
        let text = serde_json::to_string(&start)
            .map_err(|e| StreamError::Transport(format!("could not encode start frame: {e}")))?;
        self.inner
            .out_tx
            .send(Message::Text(text))
            .map_err(|_| StreamError::Transport("realtime connection closed".into()))?;

        Ok(channel)
    }
}

#[async_trait]
impl SubscriptionEffects for RealtimeClient {
    async fn on_create_topic(&self) -> Result<EventChannel<Topic>, StreamError> {
        self.subscribe_with(ON_CREATE_TOPIC, None, "onCreateTopic", |topic: Topic| topic)
    }

    async fn on_create_comment(
        &self,
        topic_id: &TopicId,
    ) -> Result<EventChannel<Comment>, StreamError> {
        self.subscribe_with(
            ON_CREATE_COMMENT_BY_TOPIC_ID,
            Some(serde_json::json!({ "topicId": topic_id.as_str() })),
            "onCreateCommentByTopicId",
            |comment: Comment| comment,
        )
    }

    async fn on_delete_comment(
        &self,
        topic_id: &TopicId,
    ) -> Result<EventChannel<CommentId>, StreamError> {
        self.subscribe_with(
            ON_DELETE_COMMENT_BY_TOPIC_ID,
            Some(serde_json::json!({ "topicId": topic_id.as_str() })),
            "onDeleteCommentByTopicId",
            |comment: Comment| comment.id,
        )
    }
}

fn make_route<W, T, F>(sender: EventSender<T>, field: &'static str, map: F) -> Route
where
    W: DeserializeOwned + Send + 'static,
    T: Send + 'static,
    F: Fn(W) -> T + Send + Sync + 'static,
{
    Box::new(move |delivery| match delivery {
        RouteDelivery::Payload(response) => match response.decode::<W>(field) {
            Ok(wire) => {
                sender.deliver(map(wire));
            }
            Err(messages) => {
                sender.fault(StreamError::Parse(messages.join("\n")));
            }
        },
        RouteDelivery::Fault(detail) => {
            sender.fault(StreamError::Transport(detail));
        }
    })
}

async fn send_frame(
    sink: &mut SplitSink<Socket, Message>,
    frame: &ClientFrame,
) -> Result<(), StreamError> {
    let text = serde_json::to_string(frame)
        .map_err(|e| StreamError::Transport(format!("could not encode frame: {e}")))?;
    sink.send(Message::Text(text))
        .await
        .map_err(|e| StreamError::Transport(format!("realtime send failed: {e}")))
}

async fn await_ack(stream: &mut SplitStream<Socket>) -> Result<(), StreamError> {
    while let Some(message) = stream.next().await {
        let message =
            message.map_err(|e| StreamError::Transport(format!("realtime read failed: {e}")))?;
        let Message::Text(text) = message else {
            continue;
        };
        match serde_json::from_str::<ServerFrame>(&text) {
            Ok(ServerFrame::ConnectionAck) => return Ok(()),
            Ok(ServerFrame::KeepAlive) | Err(_) => continue,
            Ok(other) => {
                tracing::debug!(?other, "frame before connection ack");
            }
        }
    }
    Err(StreamError::Transport(
        "realtime connection closed during handshake".into(),
    ))
}

async fn write_loop(mut out_rx: mpsc::UnboundedReceiver<Message>, mut sink: SplitSink<Socket, Message>) {
    while let Some(message) = out_rx.recv().await {
        let closing = matches!(message, Message::Close(_));
        if let Err(e) = sink.send(message).await {
            tracing::warn!(error = %e, "realtime write failed");
            break;
        }
        if closing {
            break;
        }
    }
}

async fn read_loop(mut stream: SplitStream<Socket>, inner: Arc<RealtimeInner>) {
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => dispatch_frame(&inner, &text),
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "realtime socket error");
                break;
            }
        }
    }
    // Socket gone: every open subscription gets a transport fault. The
    // channels stay open; consumers decide whether to reconnect by remount.
    inner.fault_all("realtime connection closed");
    tracing::info!("realtime disconnected");
}

fn dispatch_frame(inner: &RealtimeInner, text: &str) {
    let frame = match serde_json::from_str::<ServerFrame>(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!(error = %e, "unparseable realtime frame");
            return;
        }
    };
    match frame {
        ServerFrame::ConnectionAck | ServerFrame::KeepAlive => {}
        ServerFrame::Data { id, payload } => {
            let routes = inner.routes.lock().expect("route table poisoned");
            match routes.get(&id) {
                Some(route) => route(RouteDelivery::Payload(payload)),
                None => tracing::debug!(%id, "data frame for closed subscription"),
            }
        }
        ServerFrame::Error { id, payload } => match id {
            Some(id) => {
                let routes = inner.routes.lock().expect("route table poisoned");
                if let Some(route) = routes.get(&id) {
                    route(RouteDelivery::Fault(payload.to_string()));
                }
            }
            None => tracing::warn!(%payload, "realtime connection error"),
        },
        ServerFrame::Complete { id } => {
            inner
                .routes
                .lock()
                .expect("route table poisoned")
                .remove(&id);
            tracing::debug!(%id, "subscription completed by server");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthMode;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    fn config_for(addr: std::net::SocketAddr) -> ClientConfig {
        ClientConfig {
            api_url: "http://forum.example.com/graphql".into(),
            realtime_url: format!("ws://{addr}"),
            auth: AuthMode::ApiKey { key: "k".into() },
            request_timeout_ms: 1_000,
            connect_timeout_ms: 1_000,
        }
    }

    #[test]
    fn test_client_frames_serialize_with_type_tags() {
        let init = serde_json::to_value(ClientFrame::ConnectionInit).unwrap();
        assert_eq!(init["type"], "connection_init");

        let start = serde_json::to_value(ClientFrame::Start {
            id: "1".into(),
            payload: StartPayload {
                query: ON_CREATE_TOPIC.to_string(),
                variables: None,
            },
        })
        .unwrap();
        assert_eq!(start["type"], "start");
        assert_eq!(start["id"], "1");
        assert!(start["payload"].get("variables").is_none());

        let stop = serde_json::to_value(ClientFrame::Stop { id: "1".into() }).unwrap();
        assert_eq!(stop["type"], "stop");
    }

    #[test]
    fn test_server_frames_deserialize() {
        let ack: ServerFrame = serde_json::from_str(r#"{"type":"connection_ack"}"#).unwrap();
        assert!(matches!(ack, ServerFrame::ConnectionAck));

        let ka: ServerFrame = serde_json::from_str(r#"{"type":"ka"}"#).unwrap();
        assert!(matches!(ka, ServerFrame::KeepAlive));

        let data: ServerFrame = serde_json::from_str(
            r#"{"type":"data","id":"3","payload":{"data":{"onCreateTopic":null}}}"#,
        )
        .unwrap();
        assert!(matches!(data, ServerFrame::Data { .. }));

        let complete: ServerFrame = serde_json::from_str(r#"{"type":"complete","id":"3"}"#).unwrap();
        assert!(matches!(complete, ServerFrame::Complete { .. }));
    }

    #[tokio::test]
    async fn test_subscribe_and_receive_over_socket() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut socket = accept_async(stream).await.unwrap();

            let init = socket.next().await.unwrap().unwrap();
            assert!(init.to_text().unwrap().contains("connection_init"));
            socket
                .send(Message::Text(r#"{"type":"connection_ack"}"#.into()))
                .await
                .unwrap();

            let start = socket.next().await.unwrap().unwrap();
            let frame: serde_json::Value =
                serde_json::from_str(start.to_text().unwrap()).unwrap();
            assert_eq!(frame["type"], "start");
            let id = frame["id"].as_str().unwrap().to_string();

            // One well-formed delivery, then one malformed payload.
            let data = serde_json::json!({
                "type": "data",
                "id": id,
                "payload": { "data": { "onCreateTopic": {
                    "id": "t1",
                    "title": "Graph API",
                    "createdAt": "2024-03-01T12:00:00Z",
                    "updatedAt": "2024-03-01T12:00:00Z"
                }}}
            });
            socket.send(Message::Text(data.to_string())).await.unwrap();

            let bad = serde_json::json!({
                "type": "data",
                "id": id,
                "payload": { "data": { "onCreateTopic": { "id": 42 } } }
            });
            socket.send(Message::Text(bad.to_string())).await.unwrap();

            // Expect the stop frame once the consumer closes its channel.
            loop {
                match socket.next().await {
                    Some(Ok(Message::Text(text))) => {
                        let frame: serde_json::Value = serde_json::from_str(&text).unwrap();
                        if frame["type"] == "stop" {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    _ => break,
                }
            }
        });

        let client = RealtimeClient::connect(&config_for(addr)).await.unwrap();
        let mut channel = client.on_create_topic().await.unwrap();

        let first = channel.recv().await.unwrap();
        let topic = first.unwrap();
        assert_eq!(topic.title, "Graph API");

        // The malformed payload arrives as a fault and leaves the channel open.
        let second = channel.recv().await.unwrap();
        assert!(matches!(second, Err(StreamError::Parse(_))));

        let (mut handle, _rx) = channel.split();
        handle.close();
        server.await.unwrap();
        client.shutdown();
    }
}
