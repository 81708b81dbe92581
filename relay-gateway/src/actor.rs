//! The shard's actor task: the only place a shard's socket, timers, and
//! send queue are touched. Everything here runs on a single task, so all
//! protocol state mutation is naturally serialized — only the externally
//! visible parts of [`Session`] need synchronization, since the handle reads
//! them from other tasks.

use crate::{
    config::ShardConfig,
    error::{ShardError, ShardErrorType},
    event::ShardEvent,
    queue::SendQueue,
    session::Session,
    stage::ShardState,
};
use futures_util::{SinkExt, StreamExt};
use relay_gateway_queue::Queue;
use relay_model::{
    close_code::CloseCode,
    incoming::{Hello, IncomingFrame, Ready},
    opcode::OpCode,
    outgoing::{Identify, IdentifyProperties, OutgoingFrame, Resume},
};
use std::{pin::Pin, sync::Arc, time::Duration};
use tokio::{
    net::TcpStream,
    sync::{mpsc, oneshot, Notify},
    time::Sleep,
};
use tokio_tungstenite::{
    tungstenite::{
        protocol::{frame::coding::CloseCode as WsCloseCode, CloseFrame},
        Message,
    },
    MaybeTlsStream, WebSocketStream,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Messages the [`Shard`](crate::shard::Shard) handle sends to its actor.
pub(crate) enum ActorCommand {
    /// Begin connecting. `bounded_attempts` is `Some(n)` for the initial
    /// `spawn()` and `None` for an unbounded `restart()`.
    Connect {
        bounded_attempts: Option<u8>,
        ack: oneshot::Sender<Result<(), ShardError>>,
    },
    /// A frame to send, queued if the shard isn't `Running`.
    Send {
        payload: String,
        resolve: oneshot::Sender<Result<(), ShardError>>,
    },
    /// Close the connection and stop reconnecting.
    Kill { code: u16, reason: String },
}

/// Why a connection attempt, or a running session, ended.
enum Ended {
    /// Reconnectable: try again.
    Retry,
    /// The gateway closed with a non-reconnectable code.
    Fatal(u16),
    /// `kill()` was called.
    Killed,
    /// The handshake completed; the caller should enter the running loop.
    Running,
}

/// What `next_frame` produced.
enum SocketEvent {
    Frame(IncomingFrame),
    /// The socket closed or errored; carries the close code if one was sent.
    Closed(Option<u16>),
}

pub(crate) struct ShardActor {
    id: u64,
    total_shards: u64,
    config: ShardConfig,
    identify_queue: Arc<dyn Queue>,
    session: Arc<Session>,
    events_tx: mpsc::UnboundedSender<ShardEvent>,
    command_rx: mpsc::UnboundedReceiver<ActorCommand>,
    kill_notify: Arc<Notify>,
    send_queue: SendQueue,
    socket: Option<WsStream>,
    heartbeat_timer: Option<Pin<Box<Sleep>>>,
}

impl ShardActor {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: u64,
        total_shards: u64,
        config: ShardConfig,
        identify_queue: Arc<dyn Queue>,
        session: Arc<Session>,
        events_tx: mpsc::UnboundedSender<ShardEvent>,
        command_rx: mpsc::UnboundedReceiver<ActorCommand>,
        kill_notify: Arc<Notify>,
    ) -> Self {
        Self {
            id,
            total_shards,
            config,
            identify_queue,
            session,
            events_tx,
            command_rx,
            kill_notify,
            send_queue: SendQueue::new(),
            socket: None,
            heartbeat_timer: None,
        }
    }

    pub(crate) async fn run(mut self) {
        loop {
            let Some(command) = self.command_rx.recv().await else {
                return;
            };

            match command {
                ActorCommand::Connect { bounded_attempts, ack } => {
                    let result = self.connect_retry_loop(bounded_attempts).await;
                    let _ = ack.send(result);
                }
                ActorCommand::Send { payload, resolve } => {
                    self.send_queue.push(payload, resolve);
                }
                ActorCommand::Kill { .. } => {
                    // Nothing is connected yet; killing an idle shard just
                    // makes sure a concurrent spawn() observes it.
                    self.session.kill();
                }
            }
        }
    }

    fn emit(&self, event: ShardEvent) {
        let _ = self.events_tx.send(event);
    }

    fn transition(&self, to: ShardState) {
        let from = self.session.set_state(to);

        if from != to {
            self.emit(ShardEvent::StateUpdate { from, to });
        }
    }

    async fn connect_retry_loop(&mut self, bounded_attempts: Option<u8>) -> Result<(), ShardError> {
        self.session.revive();
        let mut attempt: u8 = 0;

        loop {
            if self.session.is_killed() {
                self.transition(ShardState::Idle);
                return Err(ShardError::new(ShardErrorType::InterruptFromKill));
            }

            attempt += 1;
            let ended = self.run_one_connection().await;

            match ended {
                Ended::Running => {
                    match self.running_loop().await {
                        Ended::Killed => return Ok(()),
                        Ended::Fatal(code) => return self.go_fatal(code),
                        Ended::Retry => {
                            self.transition(ShardState::Disconnected);
                            self.wait_before_retry().await;
                        }
                        Ended::Running => unreachable!(),
                    }
                }
                Ended::Killed => {
                    self.transition(ShardState::Idle);
                    return Err(ShardError::new(ShardErrorType::InterruptFromKill));
                }
                Ended::Fatal(code) => return self.go_fatal(code),
                Ended::Retry => {
                    if let Some(max) = bounded_attempts {
                        if attempt >= max {
                            self.transition(ShardState::Idle);
                            return Err(ShardError::new(ShardErrorType::MaxSpawnAttemptsReached {
                                attempts: max,
                            }));
                        }
                    }

                    self.wait_before_retry().await;
                }
            }
        }
    }

    fn go_fatal(&self, code: u16) -> Result<(), ShardError> {
        self.transition(ShardState::Idle);
        self.emit(ShardEvent::Fatal { close_code: code });
        Err(ShardError::new(ShardErrorType::Fatal { close_code: code }))
    }

    async fn wait_before_retry(&mut self) {
        tokio::select! {
            biased;
            _ = self.kill_notify.notified() => {}
            _ = tokio::time::sleep(self.config.spawn_attempt_delay) => {}
        }
    }

    /// Connect the socket and drive it through Hello and Identify/Resume, up
    /// to (but not including) the running phase. Bounded by `spawn_timeout`.
    async fn run_one_connection(&mut self) -> Ended {
        self.transition(ShardState::Connecting);

        let timeout = self.config.spawn_timeout;
        let kill_notify = self.kill_notify.clone();
        let handshake = tokio::time::timeout(timeout, self.handshake());

        tokio::select! {
            biased;
            _ = kill_notify.notified() => {
                self.close_socket(1000, "killed").await;
                Ended::Killed
            }
            result = handshake => match result {
                Ok(ended) => ended,
                Err(_elapsed) => {
                    self.close_socket(1000, "handshake timed out").await;
                    Ended::Retry
                }
            },
        }
    }

    fn gateway_url(&self) -> String {
        let base = if self.session.can_resume() {
            self.session
                .resume_url()
                .unwrap_or_else(|| self.config.gateway_url.to_string())
        } else {
            self.config.gateway_url.to_string()
        };

        format!("{base}?v={}&encoding=json", self.config.version)
    }

    async fn handshake(&mut self) -> Ended {
        let url = self.gateway_url();

        let socket = match tokio_tungstenite::connect_async(&url).await {
            Ok((socket, _response)) => socket,
            Err(error) => {
                tracing::warn!(shard.id = self.id, %error, "failed to open gateway socket");
                return Ended::Retry;
            }
        };

        self.socket = Some(socket);

        let hello = match self.next_frame().await {
            SocketEvent::Frame(frame) if frame.op == OpCode::Hello => {
                match serde_json::from_value::<Hello>(frame.d) {
                    Ok(hello) => hello,
                    Err(_) => return Ended::Retry,
                }
            }
            SocketEvent::Frame(_unexpected) => return Ended::Retry,
            SocketEvent::Closed(code) => return self.close_outcome(code),
        };

        self.session
            .set_heartbeat_interval(Duration::from_millis(hello.heartbeat_interval));
        self.heartbeat_timer = Some(Box::pin(tokio::time::sleep(
            Duration::from_millis(hello.heartbeat_interval).mul_f64(0.5),
        )));

        if self.session.can_resume() {
            self.transition(ShardState::Resuming);
            self.send_resume().await;
        } else {
            self.transition(ShardState::Identifying);
            self.identify_queue.request([self.id, self.total_shards]).await;
            self.send_identify().await;
        }

        self.await_ready_or_resumed().await
    }

    fn close_outcome(&self, code: Option<u16>) -> Ended {
        match code {
            Some(code) if !CloseCode::from(code).is_reconnectable() => Ended::Fatal(code),
            _ => Ended::Retry,
        }
    }

    async fn await_ready_or_resumed(&mut self) -> Ended {
        loop {
            tokio::select! {
                biased;
                _ = Self::heartbeat_due(&mut self.heartbeat_timer) => {
                    self.send_heartbeat().await;
                }
                event = Self::next_frame_on(self.id, &mut self.socket) => {
                    match self.handle_common_frame(event).await {
                        FrameOutcome::Continue => {}
                        FrameOutcome::ReadyOrResumed => return Ended::Running,
                        FrameOutcome::Ended(ended) => return ended,
                    }
                }
            }
        }
    }

    async fn running_loop(&mut self) -> Ended {
        self.transition(ShardState::Running);
        self.drain_send_queue().await;

        loop {
            tokio::select! {
                biased;
                command = self.command_rx.recv() => {
                    match command {
                        None => return Ended::Killed,
                        Some(ActorCommand::Kill { code, reason }) => {
                            self.session.kill();
                            self.send_queue.force_flush();
                            self.close_socket(code, &reason).await;
                            return Ended::Killed;
                        }
                        Some(ActorCommand::Send { payload, resolve }) => {
                            self.send_queue.push(payload, resolve);
                            self.drain_send_queue().await;
                        }
                        Some(ActorCommand::Connect { ack, .. }) => {
                            let _ = ack.send(Err(ShardError::new(ShardErrorType::AlreadyConnecting)));
                        }
                    }
                }
                _ = Self::heartbeat_due(&mut self.heartbeat_timer) => {
                    if self.session.is_awaiting_ack() {
                        self.close_socket(4009, "zombie connection").await;
                        return Ended::Retry;
                    }

                    self.send_heartbeat().await;
                }
                event = Self::next_frame_on(self.id, &mut self.socket) => {
                    match self.handle_common_frame(event).await {
                        FrameOutcome::Continue | FrameOutcome::ReadyOrResumed => {}
                        FrameOutcome::Ended(ended) => return ended,
                    }
                }
            }
        }
    }

    async fn drain_send_queue(&mut self) {
        while let Some(frame) = self.send_queue.pop() {
            let result = self.write_raw(&frame.payload).await;
            let _ = frame.resolve.send(result);
        }
    }

    /// Handles frame kinds common to both the handshake wait and the running
    /// loop: heartbeats, acks, invalid session, reconnect, dispatch, close.
    async fn handle_common_frame(&mut self, event: SocketEvent) -> FrameOutcome {
        let frame = match event {
            SocketEvent::Frame(frame) => frame,
            SocketEvent::Closed(code) => return FrameOutcome::Ended(self.close_outcome(code)),
        };

        match frame.op {
            OpCode::Heartbeat => {
                self.send_heartbeat().await;
                FrameOutcome::Continue
            }
            OpCode::HeartbeatAck => {
                if let Some(ping) = self.session.mark_heartbeat_acked() {
                    self.emit(ShardEvent::HeartbeatAck { ping });
                }
                FrameOutcome::Continue
            }
            OpCode::Reconnect => {
                self.close_socket(4000, "reconnect requested").await;
                FrameOutcome::Ended(Ended::Retry)
            }
            OpCode::InvalidSession => {
                let resumable = frame.d.as_bool().unwrap_or(false);

                if resumable {
                    self.close_socket(4000, "invalid session, resumable").await;
                } else {
                    self.session.discard_session();
                    self.close_socket(1000, "invalid session").await;

                    tokio::select! {
                        biased;
                        _ = self.kill_notify.notified() => {}
                        _ = tokio::time::sleep(Duration::from_millis(2500)) => {}
                    }
                }

                FrameOutcome::Ended(Ended::Retry)
            }
            OpCode::Dispatch => {
                if let Some(sequence) = frame.s {
                    self.session.set_last_sequence(sequence);
                }

                let kind = frame.t.clone().unwrap_or_default();
                self.emit(ShardEvent::ReceivedPayload {
                    kind: kind.clone(),
                    sequence: frame.s.unwrap_or_default(),
                    data: frame.d.clone(),
                });

                match kind.as_str() {
                    "READY" => {
                        if let Ok(ready) = serde_json::from_value::<Ready>(frame.d) {
                            self.session.set_session_id(Some(ready.session_id));
                            self.session.set_resume_url(ready.resume_gateway_url);
                        }
                        FrameOutcome::ReadyOrResumed
                    }
                    "RESUMED" => FrameOutcome::ReadyOrResumed,
                    _ => FrameOutcome::Continue,
                }
            }
            OpCode::Identify
            | OpCode::PresenceUpdate
            | OpCode::VoiceStateUpdate
            | OpCode::Resume
            | OpCode::RequestGuildMembers
            | OpCode::Hello => FrameOutcome::Continue,
        }
    }

    async fn heartbeat_due(timer: &mut Option<Pin<Box<Sleep>>>) {
        match timer {
            Some(timer) => timer.as_mut().await,
            None => std::future::pending().await,
        }
    }

    async fn send_heartbeat(&mut self) {
        let seq = self.session.last_sequence();
        let frame = OutgoingFrame::new(OpCode::Heartbeat, seq);

        if let Ok(payload) = serde_json::to_string(&frame) {
            let _ = self.write_raw(&payload).await;
        }

        self.session.mark_heartbeat_sent();
        self.heartbeat_timer = Some(Box::pin(tokio::time::sleep(self.session.heartbeat_interval())));
    }

    async fn send_identify(&mut self) {
        let identify = Identify {
            token: self.config.token.to_string(),
            intents: self.config.intents,
            large_threshold: self.config.large_threshold,
            presence: self.config.presence.clone(),
            properties: IdentifyProperties::new("relay"),
            shard: [self.id, self.total_shards],
            compress: false,
        };

        let frame = OutgoingFrame::new(OpCode::Identify, identify);

        if let Ok(payload) = serde_json::to_string(&frame) {
            let _ = self.write_raw(&payload).await;
        }
    }

    async fn send_resume(&mut self) {
        let (Some(session_id), Some(seq)) = (self.session.session_id(), self.session.last_sequence())
        else {
            return;
        };

        let resume = Resume {
            token: self.config.token.to_string(),
            session_id,
            seq,
        };

        let frame = OutgoingFrame::new(OpCode::Resume, resume);

        if let Ok(payload) = serde_json::to_string(&frame) {
            let _ = self.write_raw(&payload).await;
        }
    }

    async fn write_raw(&mut self, payload: &str) -> Result<(), ShardError> {
        let Some(socket) = &mut self.socket else {
            return Err(ShardError::new(ShardErrorType::SendWithoutOpenSocket));
        };

        match socket.send(Message::Text(payload.to_owned())).await {
            Ok(()) => {
                self.emit(ShardEvent::SentPayload { bytes: payload.len() });
                Ok(())
            }
            Err(source) => Err(ShardError::with_source(
                ShardErrorType::SendWithoutOpenSocket,
                source,
            )),
        }
    }

    /// Reads and parses the next frame. Malformed JSON is logged and
    /// skipped without ending the connection.
    async fn next_frame(&mut self) -> SocketEvent {
        Self::next_frame_on(self.id, &mut self.socket).await
    }

    async fn next_frame_on(id: u64, socket: &mut Option<WsStream>) -> SocketEvent {
        loop {
            let Some(socket) = socket.as_mut() else {
                return SocketEvent::Closed(None);
            };

            match socket.next().await {
                Some(Ok(Message::Text(text))) => match serde_json::from_str(&text) {
                    Ok(frame) => return SocketEvent::Frame(frame),
                    Err(error) => {
                        tracing::warn!(shard.id = id, %error, "dropping malformed frame");
                        continue;
                    }
                },
                Some(Ok(Message::Close(frame))) => {
                    return SocketEvent::Closed(frame.map(|frame| frame.code.into()));
                }
                Some(Ok(_other)) => continue,
                Some(Err(error)) => {
                    tracing::warn!(shard.id = id, %error, "socket error");
                    return SocketEvent::Closed(None);
                }
                None => return SocketEvent::Closed(None),
            }
        }
    }

    async fn close_socket(&mut self, code: u16, reason: &str) {
        if let Some(mut socket) = self.socket.take() {
            let _ = socket
                .close(Some(CloseFrame {
                    code: WsCloseCode::from(code),
                    reason: reason.to_owned().into(),
                }))
                .await;
        }

        self.heartbeat_timer = None;
    }
}

enum FrameOutcome {
    Continue,
    ReadyOrResumed,
    Ended(Ended),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShardConfig;
    use relay_gateway_queue::NoopQueue;

    fn test_actor() -> ShardActor {
        let (events_tx, _events_rx) = mpsc::unbounded_channel();
        let (_command_tx, command_rx) = mpsc::unbounded_channel();

        ShardActor::new(
            0,
            1,
            ShardConfig::builder("token").build(),
            Arc::new(NoopQueue),
            Arc::new(Session::new()),
            events_tx,
            command_rx,
            Arc::new(Notify::new()),
        )
    }

    #[test]
    fn close_outcome_is_fatal_only_for_non_reconnectable_codes() {
        let actor = test_actor();

        assert!(matches!(actor.close_outcome(Some(4004)), Ended::Fatal(4004)));
        assert!(matches!(actor.close_outcome(Some(4009)), Ended::Retry));
        assert!(matches!(actor.close_outcome(Some(1000)), Ended::Retry));
        assert!(matches!(actor.close_outcome(None), Ended::Retry));
    }

    #[test]
    fn gateway_url_carries_version_and_json_encoding() {
        let actor = test_actor();
        assert_eq!("wss://gateway.discord.gg?v=10&encoding=json", actor.gateway_url());
    }

    #[test]
    fn gateway_url_prefers_resume_url_once_a_session_is_resumable() {
        let actor = test_actor();
        actor.session.set_session_id(Some("abc".into()));
        actor.session.set_last_sequence(5);
        actor.session.set_resume_url(Some("wss://resume.example".into()));

        assert_eq!("wss://resume.example?v=10&encoding=json", actor.gateway_url());
    }

    #[test]
    fn gateway_url_falls_back_to_base_when_resumable_but_no_resume_url_was_given() {
        let actor = test_actor();
        actor.session.set_session_id(Some("abc".into()));
        actor.session.set_last_sequence(5);

        assert_eq!("wss://gateway.discord.gg?v=10&encoding=json", actor.gateway_url());
    }

    #[tokio::test]
    async fn heartbeat_due_never_resolves_before_a_timer_is_armed() {
        let mut actor = test_actor();

        tokio::select! {
            _ = ShardActor::heartbeat_due(&mut actor.heartbeat_timer) => panic!("heartbeat_due resolved with no timer armed"),
            _ = tokio::time::sleep(Duration::from_millis(10)) => {}
        }
    }
}
