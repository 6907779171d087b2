//! In-process fake gateway for socket tests.

use crate::gateway::protocol::{ClientInfo, ConnectParams, PROTOCOL_VERSION, AuthParams};
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

pub fn test_connect_params(token: Option<&str>) -> ConnectParams {
    ConnectParams {
        min_protocol: PROTOCOL_VERSION,
        max_protocol: PROTOCOL_VERSION,
        client: ClientInfo::current("gateway-bridge", "backend"),
        role: "operator".to_string(),
        scopes: vec!["operator.admin".to_string()],
        caps: Vec::new(),
        auth: token.map(|t| AuthParams {
            token: t.to_string(),
        }),
    }
}

/// How the fake gateway answers.
#[derive(Clone, Default)]
pub struct GatewayBehavior {
    reject_handshake: Option<String>,
    close_during_handshake: bool,
    handshake_delay: Duration,
    delays: HashMap<String, Duration>,
    failing: HashSet<String>,
    close_on: HashSet<String>,
    noise: bool,
}

impl GatewayBehavior {
    pub fn reject_handshake(mut self, reason: &str) -> Self {
        self.reject_handshake = Some(reason.to_string());
        self
    }

    /// Drop the connection instead of answering the handshake.
    pub fn close_during_handshake(mut self) -> Self {
        self.close_during_handshake = true;
        self
    }

    pub fn with_handshake_delay(mut self, delay: Duration) -> Self {
        self.handshake_delay = delay;
        self
    }

    pub fn with_delay(mut self, method: &str, delay: Duration) -> Self {
        self.delays.insert(method.to_string(), delay);
        self
    }

    pub fn fail_method(mut self, method: &str) -> Self {
        self.failing.insert(method.to_string());
        self
    }

    /// Drop the connection when `method` is requested.
    pub fn close_on(mut self, method: &str) -> Self {
        self.close_on.insert(method.to_string());
        self
    }

    /// Send an event, an unknown-id response and malformed text before each reply.
    pub fn with_noise(mut self) -> Self {
        self.noise = true;
        self
    }
}

#[derive(Default)]
struct Recorded {
    handshakes: Mutex<Vec<Value>>,
    requests: Mutex<Vec<Value>>,
    connections: AtomicUsize,
}

/// Fake gateway bound to an ephemeral localhost port.
///
/// Every application request `m` is answered with
/// `{"method": m, "params": .., "connection": n}` unless the behavior says
/// otherwise. The method `hang` is never answered.
pub struct FakeGateway {
    url: String,
    recorded: Arc<Recorded>,
    handle: JoinHandle<()>,
}

impl FakeGateway {
    pub async fn start(behavior: GatewayBehavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        let recorded = Arc::new(Recorded::default());
        let accept_recorded = Arc::clone(&recorded);

        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let connection = accept_recorded.connections.fetch_add(1, Ordering::SeqCst) + 1;
                let recorded = Arc::clone(&accept_recorded);
                let behavior = behavior.clone();
                tokio::spawn(async move {
                    if let Ok(ws) = accept_async(stream).await {
                        serve(ws, behavior, recorded, connection).await;
                    }
                });
            }
        });

        Self {
            url,
            recorded,
            handle,
        }
    }

    pub fn url(&self) -> String {
        self.url.clone()
    }

    pub fn handshakes(&self) -> Vec<Value> {
        self.recorded.handshakes.lock().unwrap().clone()
    }

    pub fn requests(&self) -> Vec<Value> {
        self.recorded.requests.lock().unwrap().clone()
    }

    pub fn connections(&self) -> usize {
        self.recorded.connections.load(Ordering::SeqCst)
    }

    pub async fn wait_for_requests(&self, n: usize) {
        while self.requests().len() < n {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

impl Drop for FakeGateway {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve(
    ws: tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>,
    behavior: GatewayBehavior,
    recorded: Arc<Recorded>,
    connection: usize,
) {
    let (sink, mut source) = ws.split();
    let sink = Arc::new(tokio::sync::Mutex::new(sink));

    while let Some(Ok(message)) = source.next().await {
        let Message::Text(text) = message else {
            continue;
        };
        let Ok(frame) = serde_json::from_str::<Value>(text.as_str()) else {
            continue;
        };
        let id = frame["id"].clone();
        let method = frame["method"].as_str().unwrap_or_default().to_string();

        if method == "connect" {
            recorded.handshakes.lock().unwrap().push(frame.clone());
            tokio::time::sleep(behavior.handshake_delay).await;
            if behavior.close_during_handshake {
                let _ = sink.lock().await.close().await;
                return;
            }
            let reply = match &behavior.reject_handshake {
                Some(reason) => {
                    json!({"type": "res", "id": id, "ok": false, "error": {"message": reason}})
                }
                None => json!({"type": "res", "id": id, "ok": true, "payload": {"protocol": 3}}),
            };
            let mut sink = sink.lock().await;
            let _ = sink.send(Message::Text(reply.to_string().into())).await;
            if behavior.reject_handshake.is_some() {
                let _ = sink.close().await;
                return;
            }
            continue;
        }

        recorded.requests.lock().unwrap().push(frame.clone());

        if behavior.close_on.contains(&method) {
            let _ = sink.lock().await.close().await;
            return;
        }
        if method == "hang" {
            continue;
        }

        let reply = if behavior.failing.contains(&method) {
            json!({"type": "res", "id": id, "ok": false, "error": {"message": format!("{method} failed")}})
        } else {
            json!({
                "type": "res",
                "id": id,
                "ok": true,
                "payload": {"method": method, "params": frame["params"], "connection": connection}
            })
        };
        let delay = behavior.delays.get(&method).copied().unwrap_or_default();
        let noise = behavior.noise;
        let sink = Arc::clone(&sink);

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut sink = sink.lock().await;
            if noise {
                let _ = sink
                    .send(Message::Text(json!({"type": "event", "event": "tick"}).to_string().into()))
                    .await;
                let _ = sink
                    .send(Message::Text(
                        json!({"type": "res", "id": "999999", "ok": true, "payload": "stray"})
                            .to_string()
                            .into(),
                    ))
                    .await;
                let _ = sink.send(Message::Text("{not json".to_string().into())).await;
            }
            let _ = sink.send(Message::Text(reply.to_string().into())).await;
        });
    }
}
