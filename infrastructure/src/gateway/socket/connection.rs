//! Connection session: one persistent, handshake-gated gateway socket.
//!
//! A session moves through `Connecting → Authenticating → Ready → Closed`.
//! A background driver task owns the read half of the WebSocket, performs
//! the handshake and routes response frames to the pending request with the
//! matching id. A session that has not reached `Ready` within its handshake
//! timeout closes itself. Once `Closed`, a session is never reused; the
//! owner opens a fresh one.

use crate::gateway::error::{GatewayClientError, Result};
use crate::gateway::protocol::{
    ConnectParams, FrameKind, HANDSHAKE_ID, RequestFrame, ResponseFrame, classify_frame,
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, oneshot, watch};
use tokio::time::{Instant, timeout_at};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Lifecycle state of a [`ConnectionSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Socket being opened; no frames may be sent.
    Connecting,
    /// Handshake sent, waiting for its response.
    Authenticating,
    /// Application calls may be sent.
    Ready,
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connecting => "connecting",
            Self::Authenticating => "authenticating",
            Self::Ready => "ready",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Why a session closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// The gateway answered the handshake negatively.
    HandshakeRejected(String),
    /// Transport-level close or failure.
    Disconnected(String),
}

impl CloseReason {
    fn to_error(&self) -> GatewayClientError {
        match self {
            Self::HandshakeRejected(reason) => GatewayClientError::HandshakeRejected(reason.clone()),
            Self::Disconnected(reason) => GatewayClientError::ConnectionClosed(reason.clone()),
        }
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HandshakeRejected(reason) => write!(f, "handshake rejected: {reason}"),
            Self::Disconnected(reason) => f.write_str(reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SessionStatus {
    Connecting,
    Authenticating,
    Ready,
    Closed(CloseReason),
}

impl SessionStatus {
    fn state(&self) -> ConnectionState {
        match self {
            Self::Connecting => ConnectionState::Connecting,
            Self::Authenticating => ConnectionState::Authenticating,
            Self::Ready => ConnectionState::Ready,
            Self::Closed(_) => ConnectionState::Closed,
        }
    }
}

/// A request sent on the session and not yet answered.
struct PendingRequest {
    method: String,
    resolver: oneshot::Sender<Result<Value>>,
    deadline: Instant,
}

/// State shared between the session handle and its driver task.
struct SessionShared {
    status: watch::Sender<SessionStatus>,
    pending: std::sync::Mutex<HashMap<String, PendingRequest>>,
}

impl SessionShared {
    fn lock_pending(&self) -> std::sync::MutexGuard<'_, HashMap<String, PendingRequest>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn advance(&self, from: ConnectionState, to: SessionStatus) -> bool {
        self.status.send_if_modified(|status| {
            if status.state() == from {
                *status = to;
                true
            } else {
                false
            }
        })
    }

    /// Move to `Closed` (first reason wins) and fail every pending request.
    fn close(&self, reason: CloseReason) {
        self.status.send_if_modified(|status| {
            if matches!(status, SessionStatus::Closed(_)) {
                false
            } else {
                *status = SessionStatus::Closed(reason.clone());
                true
            }
        });

        let final_reason = match &*self.status.borrow() {
            SessionStatus::Closed(r) => r.clone(),
            _ => reason,
        };

        let drained: Vec<PendingRequest> = self.lock_pending().drain().map(|(_, p)| p).collect();
        if !drained.is_empty() {
            debug!(
                "Failing {} pending gateway requests: {}",
                drained.len(),
                final_reason
            );
        }
        for pending in drained {
            let _ = pending.resolver.send(Err(final_reason.to_error()));
        }
    }

    /// Resolve the pending request matching `frame`, if any.
    fn resolve(&self, frame: ResponseFrame) {
        let Some(pending) = self.lock_pending().remove(&frame.id) else {
            debug!("Dropping gateway response for unknown id={}", frame.id);
            return;
        };
        let method = pending.method;
        let outcome = frame
            .into_result()
            .map_err(|message| GatewayClientError::RequestFailed { method, message });
        let _ = pending.resolver.send(outcome);
    }

    /// Forget requests whose caller is gone or whose deadline has passed.
    ///
    /// A live caller whose entry is dropped here observes its deadline and
    /// reports a timeout.
    fn prune(&self, now: Instant) {
        self.lock_pending()
            .retain(|_, p| p.deadline > now && !p.resolver.is_closed());
    }
}

/// One persistent connection to the gateway, shared by concurrent callers.
///
/// Requests are correlated by id: ids come from a counter that is never
/// reset, so a late response for a timed-out request can never match a
/// newer request and is simply dropped.
pub struct ConnectionSession {
    url: String,
    shared: Arc<SessionShared>,
    writer: Arc<Mutex<Option<WsSink>>>,
    next_id: AtomicU64,
    cancel: CancellationToken,
}

impl ConnectionSession {
    /// Start connecting to `url` and authenticate with `connect`.
    ///
    /// Returns immediately in the `Connecting` state; callers of
    /// [`request`](Self::request) wait for `Ready`. If the socket is not
    /// open and the handshake accepted within `handshake_timeout`, the
    /// session closes.
    pub fn open(
        url: impl Into<String>,
        connect: ConnectParams,
        handshake_timeout: Duration,
    ) -> Arc<Self> {
        let url = url.into();
        let (status, _) = watch::channel(SessionStatus::Connecting);
        let shared = Arc::new(SessionShared {
            status,
            pending: std::sync::Mutex::new(HashMap::new()),
        });
        let writer = Arc::new(Mutex::new(None));
        let cancel = CancellationToken::new();

        tokio::spawn(Self::drive(
            url.clone(),
            connect,
            handshake_timeout,
            Arc::clone(&shared),
            Arc::clone(&writer),
            cancel.clone(),
        ));

        Arc::new(Self {
            url,
            shared,
            writer,
            next_id: AtomicU64::new(1),
            cancel,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.status.borrow().state()
    }

    /// Reason the session closed, once it has.
    pub fn close_reason(&self) -> Option<CloseReason> {
        match &*self.shared.status.borrow() {
            SessionStatus::Closed(reason) => Some(reason.clone()),
            _ => None,
        }
    }

    pub fn pending_count(&self) -> usize {
        self.shared.lock_pending().len()
    }

    /// Shut the session down, failing pending requests.
    pub fn close(&self) {
        self.shared.close(CloseReason::Disconnected(
            "connection closed by client".to_string(),
        ));
        self.cancel.cancel();
    }

    /// Send `method` and wait for its response, all within `timeout`.
    ///
    /// Waits for the handshake first if the session is not yet ready.
    pub async fn request(&self, method: &str, params: Value, timeout: Duration) -> Result<Value> {
        let deadline = Instant::now() + timeout;
        let timeout_error = || GatewayClientError::Timeout {
            method: method.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        };

        self.wait_ready(deadline).await.map_err(|e| e.unwrap_or_else(timeout_error))?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed).to_string();
        let text = serde_json::to_string(&RequestFrame::new(id.clone(), method, params))?;
        let rx = self.register(&id, method, deadline)?;

        trace!("Gateway request id={} method={}", id, method);
        let sent = timeout_at(deadline, self.send_text(text)).await;
        match sent {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.shared.lock_pending().remove(&id);
                return Err(e);
            }
            Err(_) => {
                self.shared.lock_pending().remove(&id);
                return Err(timeout_error());
            }
        }

        match timeout_at(deadline, rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) if Instant::now() >= deadline => Err(timeout_error()),
            Ok(Err(_)) => Err(GatewayClientError::ConnectionClosed(
                "session dropped".to_string(),
            )),
            Err(_) => {
                self.shared.lock_pending().remove(&id);
                debug!("Gateway request id={} ({}) timed out", id, method);
                Err(timeout_error())
            }
        }
    }

    /// Wait for `Ready`. `Err(None)` means the deadline passed.
    async fn wait_ready(
        &self,
        deadline: Instant,
    ) -> std::result::Result<(), Option<GatewayClientError>> {
        let mut status = self.shared.status.subscribe();
        let settled = timeout_at(
            deadline,
            status.wait_for(|s| matches!(s, SessionStatus::Ready | SessionStatus::Closed(_))),
        )
        .await;

        match settled {
            Err(_) => Err(None),
            Ok(Err(_)) => Err(Some(GatewayClientError::ConnectionClosed(
                "session dropped".to_string(),
            ))),
            Ok(Ok(current)) => match &*current {
                SessionStatus::Closed(reason) => Err(Some(reason.to_error())),
                _ => Ok(()),
            },
        }
    }

    /// Register a pending request unless the session already closed.
    fn register(
        &self,
        id: &str,
        method: &str,
        deadline: Instant,
    ) -> Result<oneshot::Receiver<Result<Value>>> {
        self.shared.prune(Instant::now());

        let (tx, rx) = oneshot::channel();
        let mut pending = self.shared.lock_pending();
        if let SessionStatus::Closed(reason) = &*self.shared.status.borrow() {
            return Err(reason.to_error());
        }
        pending.insert(
            id.to_string(),
            PendingRequest {
                method: method.to_string(),
                resolver: tx,
                deadline,
            },
        );
        Ok(rx)
    }

    async fn send_text(&self, text: String) -> Result<()> {
        let mut writer = self.writer.lock().await;
        let sink = writer.as_mut().ok_or_else(|| {
            GatewayClientError::ConnectionClosed("connection not established".to_string())
        })?;
        sink.send(Message::Text(text.into())).await?;
        Ok(())
    }

    /// Driver task: connect, handshake, then read until the socket closes.
    async fn drive(
        url: String,
        connect: ConnectParams,
        handshake_timeout: Duration,
        shared: Arc<SessionShared>,
        writer: Arc<Mutex<Option<WsSink>>>,
        cancel: CancellationToken,
    ) {
        let handshake_deadline = Instant::now() + handshake_timeout;
        let established = timeout_at(
            handshake_deadline,
            Self::establish(&url, &connect, &writer, &cancel),
        )
        .await
        .unwrap_or_else(|_| Err(handshake_timed_out(handshake_timeout)));

        let reason = match established {
            Ok(source) => {
                shared.advance(ConnectionState::Connecting, SessionStatus::Authenticating);
                debug!("Gateway handshake sent to {}", url);
                Self::reader_loop(source, &shared, &cancel, handshake_deadline, handshake_timeout)
                    .await
            }
            Err(reason) => reason,
        };

        match &reason {
            CloseReason::HandshakeRejected(r) => warn!("Gateway handshake rejected: {}", r),
            CloseReason::Disconnected(r) => info!("Gateway session closed: {}", r),
        }
        shared.close(reason);

        if let Some(mut sink) = writer.lock().await.take() {
            let _ = sink.close().await;
        }
    }

    /// Open the socket and send the handshake frame.
    async fn establish(
        url: &str,
        connect: &ConnectParams,
        writer: &Mutex<Option<WsSink>>,
        cancel: &CancellationToken,
    ) -> std::result::Result<WsSource, CloseReason> {
        let connected = tokio::select! {
            _ = cancel.cancelled() => {
                return Err(CloseReason::Disconnected("connection closed by client".to_string()));
            }
            connected = connect_async(url) => connected,
        };
        let (ws, _) = connected.map_err(|e| {
            CloseReason::Disconnected(format!("failed to connect to {url}: {e}"))
        })?;
        info!("Connected to gateway at {}", url);

        let (mut sink, source) = ws.split();
        let handshake = RequestFrame::connect(connect)
            .and_then(|frame| serde_json::to_string(&frame))
            .map_err(|e| CloseReason::Disconnected(format!("failed to encode handshake: {e}")))?;
        sink.send(Message::Text(handshake.into()))
            .await
            .map_err(|e| CloseReason::Disconnected(format!("failed to send handshake: {e}")))?;

        *writer.lock().await = Some(sink);
        Ok(source)
    }

    /// Route frames until the socket closes; returns the close reason.
    ///
    /// Gives up if the handshake is still unanswered at `handshake_deadline`.
    async fn reader_loop(
        mut source: WsSource,
        shared: &SessionShared,
        cancel: &CancellationToken,
        handshake_deadline: Instant,
        handshake_timeout: Duration,
    ) -> CloseReason {
        let mut ready = false;
        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => {
                    return CloseReason::Disconnected("connection closed by client".to_string());
                }
                _ = tokio::time::sleep_until(handshake_deadline), if !ready => {
                    return handshake_timed_out(handshake_timeout);
                }
                next = source.next() => next,
            };

            let message = match next {
                None => return CloseReason::Disconnected("connection closed by gateway".to_string()),
                Some(Err(e)) => return CloseReason::Disconnected(format!("WebSocket error: {e}")),
                Some(Ok(message)) => message,
            };

            let text = match message {
                Message::Text(text) => text,
                Message::Close(frame) => {
                    let detail = frame
                        .map(|f| f.reason.as_str().to_string())
                        .filter(|r| !r.is_empty());
                    return CloseReason::Disconnected(match detail {
                        Some(detail) => format!("connection closed by gateway: {detail}"),
                        None => "connection closed by gateway".to_string(),
                    });
                }
                _ => continue,
            };

            trace!("Gateway frame: {}", text.as_str());

            let Ok(value) = serde_json::from_str::<Value>(text.as_str()) else {
                warn!("Ignoring malformed gateway frame");
                continue;
            };

            match classify_frame(&value) {
                FrameKind::Response => {}
                FrameKind::Event => {
                    trace!("Ignoring gateway event frame");
                    continue;
                }
                FrameKind::Unknown => {
                    debug!("Ignoring unrecognized gateway frame");
                    continue;
                }
            }

            let frame = match serde_json::from_value::<ResponseFrame>(value) {
                Ok(frame) => frame,
                Err(e) => {
                    warn!("Ignoring undecodable gateway response: {}", e);
                    continue;
                }
            };

            if frame.id == HANDSHAKE_ID {
                match frame.into_result() {
                    Ok(_) => {
                        ready = true;
                        if shared.advance(ConnectionState::Authenticating, SessionStatus::Ready) {
                            info!("Gateway handshake accepted");
                        }
                    }
                    Err(reason) => return CloseReason::HandshakeRejected(reason),
                }
                continue;
            }

            shared.resolve(frame);
        }
    }
}

fn handshake_timed_out(timeout: Duration) -> CloseReason {
    CloseReason::Disconnected(format!(
        "handshake timed out after {}ms",
        timeout.as_millis()
    ))
}

impl Drop for ConnectionSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
