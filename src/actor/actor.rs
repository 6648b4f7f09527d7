//! The connection actor: mailbox loop, callback dispatcher, close handshake
//! manager, and termination reporter.
//!
//! One actor owns one connection. It processes exactly one mailbox event to
//! completion at a time; every handler invocation runs inside a panic-catch
//! boundary, and every exit path funnels through a single termination report
//! so the `terminate` hook runs exactly once.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};

use crate::actor::phase::Phase;
use crate::config::Config;
use crate::frame::{CloseCode, Frame, MAX_CONTROL_PAYLOAD};
use crate::handler::{Handler, Outcome};
use crate::termination::{Culprit, DisconnectReason, ExitSignal, Fault, TerminationReason};
use crate::transport::{EventReceiver, Transport, TransportEvent};

/// A user-originated mailbox event.
enum UserEvent<H: Handler> {
    Cast(H::Command),
    Info(H::Message),
}

/// One source of the actor's mailbox resolved to an event, or exhausted.
enum Polled<H: Handler> {
    Transport(Option<TransportEvent>),
    User(Option<UserEvent<H>>),
}

/// Owner-side handle to a spawned connection actor.
///
/// `cast` and `notify` are fire-and-forget enqueues; [`join`] consumes the
/// handle and resolves once the actor has exited, yielding the structured
/// [`ExitSignal`].
///
/// [`join`]: ConnectionHandle::join
pub struct ConnectionHandle<H: Handler> {
    tx: mpsc::UnboundedSender<UserEvent<H>>,
    task: JoinHandle<ExitSignal<H::State>>,
}

impl<H: Handler> ConnectionHandle<H> {
    /// Spawn a connection actor over an already-open transport.
    ///
    /// The actor starts in phase `Open`. [`start`](crate::start) calls this
    /// after URL validation and connect; test harnesses can call it directly
    /// with a mock transport.
    pub fn spawn<T: Transport>(
        transport: T,
        events: EventReceiver,
        handler: H,
        state: H::State,
        config: Config,
    ) -> Self {
        let (tx, user_rx) = mpsc::unbounded_channel();
        let actor = ConnectionActor {
            transport,
            handler,
            state,
            config,
            phase: Phase::Open,
            pending_close: None,
            transport_rx: events.rx,
            user_rx,
        };
        let task = tokio::spawn(actor.run());
        Self { tx, task }
    }

    /// Enqueue a user command for `handle_cast`. Fire-and-forget: if the
    /// actor has already exited the command is dropped.
    pub fn cast(&self, command: H::Command) {
        let _ = self.tx.send(UserEvent::Cast(command));
    }

    /// Enqueue an arbitrary message for `handle_info`. Fire-and-forget.
    pub fn notify(&self, message: H::Message) {
        let _ = self.tx.send(UserEvent::Info(message));
    }

    /// Returns `true` once the actor has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the actor to exit and return its exit signal.
    ///
    /// Drops the command sender first, so an actor that is otherwise idle
    /// drains any queued commands and shuts down normally. Handler faults
    /// are captured inside the actor, so the task itself never panics.
    pub async fn join(self) -> Result<ExitSignal<H::State>, JoinError> {
        drop(self.tx);
        self.task.await
    }
}

struct ConnectionActor<H: Handler, T: Transport> {
    transport: T,
    handler: H,
    state: H::State,
    config: Config,
    phase: Phase,
    // At most one close descriptor per actor; set once, never replaced.
    pending_close: Option<DisconnectReason>,
    transport_rx: mpsc::UnboundedReceiver<TransportEvent>,
    user_rx: mpsc::UnboundedReceiver<UserEvent<H>>,
}

impl<H: Handler, T: Transport> ConnectionActor<H, T> {
    async fn run(mut self) -> ExitSignal<H::State> {
        let reason = self.event_loop().await;
        self.report(reason)
    }

    /// Pull one event at a time until a termination reason is decided.
    async fn event_loop(&mut self) -> TerminationReason {
        let mut transport_open = true;
        let mut user_open = true;

        loop {
            let polled: Polled<H> = tokio::select! {
                biased;
                event = self.transport_rx.recv(), if transport_open => Polled::Transport(event),
                event = self.user_rx.recv(), if user_open => Polled::User(event),
            };

            let step = match polled {
                Polled::Transport(Some(event)) => self.dispatch_transport(event).await,
                Polled::User(Some(event)) => self.dispatch_user(event).await,
                Polled::Transport(None) => {
                    transport_open = false;
                    None
                }
                Polled::User(None) => {
                    user_open = false;
                    None
                }
            };

            if let Some(reason) = step {
                return reason;
            }
            if !transport_open && !user_open {
                return TerminationReason::Normal;
            }
        }
    }

    async fn dispatch_user(&mut self, event: UserEvent<H>) -> Option<TerminationReason> {
        match event {
            UserEvent::Cast(command) => {
                self.run_handler(Culprit::HandleCast, move |h, s| h.handle_cast(command, s))
                    .await
            }
            UserEvent::Info(message) => {
                self.run_handler(Culprit::HandleInfo, move |h, s| h.handle_info(message, s))
                    .await
            }
        }
    }

    async fn dispatch_transport(&mut self, event: TransportEvent) -> Option<TerminationReason> {
        match event {
            TransportEvent::Frame(Frame::Ping(payload)) => {
                self.run_handler(Culprit::HandlePing, move |h, s| h.handle_ping(payload, s))
                    .await
            }
            TransportEvent::Frame(Frame::Pong(payload)) => {
                self.run_handler(Culprit::HandlePong, move |h, s| h.handle_pong(payload, s))
                    .await
            }
            TransportEvent::Frame(Frame::Close(cf)) => {
                self.remote_disconnect(cf.code, cf.reason, true).await
            }
            TransportEvent::Frame(frame) => {
                self.run_handler(Culprit::HandleFrame, move |h, s| h.handle_frame(frame, s))
                    .await
            }
            TransportEvent::Disconnected(cause) => {
                let reason =
                    cause.map_or_else(|| "connection dropped".to_owned(), |e| e.to_string());
                self.remote_disconnect(CloseCode::Abnormal, reason, false).await
            }
        }
    }

    /// Invoke one handler inside the catch boundary, validate the outcome,
    /// and apply it.
    async fn run_handler<F>(&mut self, culprit: Culprit, f: F) -> Option<TerminationReason>
    where
        F: FnOnce(&mut H, &mut H::State) -> Outcome,
    {
        let outcome = match self.invoke(culprit, f).and_then(|o| validate(culprit, o)) {
            Ok(outcome) => outcome,
            Err(fault) => return Some(self.fail(fault)),
        };
        self.apply(outcome).await
    }

    fn invoke<F>(&mut self, culprit: Culprit, f: F) -> Result<Outcome, Fault>
    where
        F: FnOnce(&mut H, &mut H::State) -> Outcome,
    {
        let handler = &mut self.handler;
        let state = &mut self.state;
        panic::catch_unwind(AssertUnwindSafe(|| f(handler, state))).map_err(|payload| {
            Fault::Panic {
                culprit,
                message: panic_message(payload.as_ref()),
            }
        })
    }

    async fn apply(&mut self, outcome: Outcome) -> Option<TerminationReason> {
        match outcome {
            Outcome::Continue => None,
            Outcome::Reply(frame) => {
                if let Err(err) = self.transport.send(frame).await {
                    tracing::warn!(error = %err, "reply write failed, treating as disconnect");
                    return self
                        .remote_disconnect(CloseCode::Abnormal, err.to_string(), false)
                        .await;
                }
                None
            }
            Outcome::Close => {
                let close = self.config.default_close().clone();
                self.close_local(close.code, close.reason).await
            }
            Outcome::CloseWith(code, reason) => self.close_local(code, reason).await,
        }
    }

    /// Local close initiation: record the descriptor, send exactly one
    /// Close frame, terminate. Idempotent once a close is in flight.
    async fn close_local(&mut self, code: CloseCode, reason: String) -> Option<TerminationReason> {
        if self.pending_close.is_some() {
            return None;
        }
        self.phase = Phase::ClosingLocal;
        self.pending_close = Some(DisconnectReason::Local {
            code,
            reason: reason.clone(),
        });
        tracing::debug!(code = %code, reason = %reason, "closing locally");

        if let Err(err) = self.transport.send(Frame::close(code, reason.clone())).await {
            // Completion is the send attempt, not transport confirmation.
            tracing::warn!(error = %err, "close frame write failed");
        }
        self.phase = Phase::Closed;
        Some(TerminationReason::LocalClose { code, reason })
    }

    /// Remote close initiation: record the descriptor, run
    /// `handle_disconnect`, optionally reply with one Close frame, and
    /// terminate. `echo` is false for frameless (abnormal) disconnects.
    ///
    /// The descriptor is already recorded when the handler runs, so its
    /// outcome cannot reopen the connection or record a second close; a
    /// `Close`/`CloseWith` outcome only shapes the reply frame, `Continue`
    /// suppresses it, and `Reply` substitutes its own frame. A `Reply` is
    /// held to the same frame contract as replies from any other handler.
    async fn remote_disconnect(
        &mut self,
        code: CloseCode,
        reason: String,
        echo: bool,
    ) -> Option<TerminationReason> {
        if self.pending_close.is_some() {
            return None;
        }
        self.phase = Phase::ClosingRemote;
        let disconnect = DisconnectReason::Remote {
            code,
            reason: reason.clone(),
        };
        self.pending_close = Some(disconnect.clone());
        tracing::debug!(code = %code, reason = %reason, echo, "peer disconnected");

        let outcome = {
            let handler = &mut self.handler;
            let state = &mut self.state;
            let disconnect = &disconnect;
            panic::catch_unwind(AssertUnwindSafe(|| handler.handle_disconnect(disconnect, state)))
        };
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(payload) => {
                return Some(self.fail(Fault::Panic {
                    culprit: Culprit::HandleDisconnect,
                    message: panic_message(payload.as_ref()),
                }));
            }
        };
        // Close/CloseWith only shape the recorded reason and the echo, so
        // the close-code rule does not apply to them here; Reply goes onto
        // the wire as-is and gets the full contract check.
        let outcome = match outcome {
            Outcome::Reply(_) => match validate(Culprit::HandleDisconnect, outcome) {
                Ok(outcome) => outcome,
                Err(fault) => return Some(self.fail(fault)),
            },
            other => other,
        };

        if echo {
            let reply = match outcome {
                Outcome::Continue => None,
                Outcome::Close => Some(Frame::Close(self.config.default_close().clone())),
                Outcome::CloseWith(code, reason) => Some(Frame::close(code, reason)),
                Outcome::Reply(frame) => Some(frame),
            };
            if let Some(frame) = reply {
                if let Err(err) = self.transport.send(frame).await {
                    tracing::warn!(error = %err, "close reply write failed");
                }
            }
        }

        self.phase = Phase::Closed;
        Some(TerminationReason::RemoteClose { code, reason })
    }

    fn fail(&mut self, fault: Fault) -> TerminationReason {
        tracing::error!(culprit = %fault.culprit(), error = %fault, "handler fault");
        self.phase = Phase::Closed;
        TerminationReason::Error(fault)
    }

    /// Termination reporter: runs the terminate hook exactly once, then
    /// shapes the exit signal. A panicking hook never replaces the reason.
    fn report(mut self, reason: TerminationReason) -> ExitSignal<H::State> {
        self.phase = Phase::Closed;
        let hook = {
            let handler = &mut self.handler;
            let state = &self.state;
            let reason = &reason;
            panic::catch_unwind(AssertUnwindSafe(|| handler.terminate(reason, state)))
        };
        if hook.is_err() {
            tracing::warn!("terminate hook panicked, keeping original exit reason");
        }

        match reason {
            TerminationReason::Normal => ExitSignal::Normal,
            TerminationReason::LocalClose { code, reason } => ExitSignal::Local { code, reason },
            TerminationReason::RemoteClose { code, reason } => ExitSignal::Remote { code, reason },
            TerminationReason::Error(fault) => ExitSignal::Fault {
                fault,
                last_state: self.state,
            },
        }
    }
}

/// Reject outcomes the dispatcher must not act on.
fn validate(culprit: Culprit, outcome: Outcome) -> Result<Outcome, Fault> {
    let detail = match &outcome {
        Outcome::Reply(Frame::Close(_)) => {
            Some("close frames must be initiated with Close or CloseWith")
        }
        Outcome::Reply(frame)
            if frame
                .control_payload_len()
                .is_some_and(|len| len > MAX_CONTROL_PAYLOAD) =>
        {
            Some("control frame payload exceeds 125 bytes")
        }
        Outcome::CloseWith(code, _) if !code.is_sendable() => {
            Some("close code may not be sent by an endpoint")
        }
        Outcome::CloseWith(_, reason) if reason.len() + 2 > MAX_CONTROL_PAYLOAD => {
            Some("close reason does not fit a control frame")
        }
        _ => None,
    };
    match detail {
        Some(detail) => Err(Fault::BadResponse {
            culprit,
            offending: outcome,
            detail: detail.to_owned(),
        }),
        None => Ok(outcome),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "opaque panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::transport::event_channel;
    use bytes::Bytes;

    struct MockTransport {
        sent: Vec<Frame>,
        fail_sends: bool,
    }

    impl MockTransport {
        fn new() -> Self {
            Self {
                sent: Vec::new(),
                fail_sends: false,
            }
        }
    }

    impl Transport for MockTransport {
        async fn send(&mut self, frame: Frame) -> Result<(), TransportError> {
            if self.fail_sends {
                return Err(TransportError::Closed);
            }
            self.sent.push(frame);
            Ok(())
        }
    }

    #[derive(Debug, PartialEq, Eq)]
    enum Cmd {
        Echo(&'static str),
        CloseNow(u16, &'static str),
        BadControl,
        Boom,
    }

    #[derive(Default)]
    struct Recording {
        disconnects: Vec<DisconnectReason>,
        terminations: Vec<TerminationReason>,
    }

    impl Handler for Recording {
        type State = u32;
        type Command = Cmd;
        type Message = &'static str;

        fn handle_cast(&mut self, command: Cmd, state: &mut u32) -> Outcome {
            *state += 1;
            match command {
                Cmd::Echo(text) => Outcome::Reply(Frame::text(text)),
                Cmd::CloseNow(code, reason) => {
                    Outcome::CloseWith(CloseCode::from_u16(code), reason.to_owned())
                }
                Cmd::BadControl => Outcome::Reply(Frame::ping(vec![0u8; 200])),
                Cmd::Boom => panic!("cast blew up"),
            }
        }

        fn handle_info(&mut self, _message: &'static str, _state: &mut u32) -> Outcome {
            Outcome::Continue
        }

        fn handle_disconnect(&mut self, reason: &DisconnectReason, _state: &mut u32) -> Outcome {
            self.disconnects.push(reason.clone());
            crate::handler::defaults::handle_disconnect(reason)
        }

        fn terminate(&mut self, reason: &TerminationReason, _state: &u32) {
            self.terminations.push(reason.clone());
        }
    }

    fn actor(handler: Recording) -> ConnectionActor<Recording, MockTransport> {
        let (_sink, events) = event_channel();
        let (_tx, user_rx) = mpsc::unbounded_channel();
        ConnectionActor {
            transport: MockTransport::new(),
            handler,
            state: 0,
            config: Config::default(),
            phase: Phase::Open,
            pending_close: None,
            transport_rx: events.rx,
            user_rx,
        }
    }

    #[tokio::test]
    async fn test_reply_outcome_writes_exact_frame_once() {
        let mut actor = actor(Recording::default());
        let step = actor.dispatch_user(UserEvent::Cast(Cmd::Echo("hi"))).await;
        assert_eq!(step, None);
        assert_eq!(actor.transport.sent, vec![Frame::text("hi")]);
        assert_eq!(actor.state, 1);
        assert!(actor.phase.is_open());
    }

    #[tokio::test]
    async fn test_default_ping_sends_pong_with_same_payload() {
        let mut actor = actor(Recording::default());
        let payload = Bytes::from_static(b"keepalive");
        let step = actor
            .dispatch_transport(TransportEvent::Frame(Frame::Ping(Some(payload.clone()))))
            .await;
        assert_eq!(step, None);
        assert_eq!(actor.transport.sent, vec![Frame::Pong(Some(payload))]);
        assert!(actor.phase.is_open());
    }

    #[tokio::test]
    async fn test_local_close_sends_one_close_frame() {
        let mut actor = actor(Recording::default());
        let step = actor
            .dispatch_user(UserEvent::Cast(Cmd::CloseNow(4012, "Test Close")))
            .await;
        assert_eq!(
            step,
            Some(TerminationReason::LocalClose {
                code: CloseCode::Other(4012),
                reason: "Test Close".into(),
            })
        );
        assert_eq!(
            actor.transport.sent,
            vec![Frame::close(CloseCode::Other(4012), "Test Close")]
        );
        assert_eq!(actor.phase, Phase::Closed);
    }

    #[tokio::test]
    async fn test_second_close_is_idempotent() {
        let mut actor = actor(Recording::default());
        actor
            .close_local(CloseCode::Normal, "first".into())
            .await
            .unwrap();
        let second = actor.close_local(CloseCode::GoingAway, "second".into()).await;
        assert_eq!(second, None);
        assert_eq!(actor.transport.sent.len(), 1);
        assert!(matches!(
            actor.pending_close,
            Some(DisconnectReason::Local { code: CloseCode::Normal, .. })
        ));
    }

    #[tokio::test]
    async fn test_remote_close_runs_disconnect_and_echoes() {
        let mut actor = actor(Recording::default());
        let step = actor
            .dispatch_transport(TransportEvent::Frame(Frame::close(
                CloseCode::GoingAway,
                "maintenance",
            )))
            .await;
        assert_eq!(
            step,
            Some(TerminationReason::RemoteClose {
                code: CloseCode::GoingAway,
                reason: "maintenance".into(),
            })
        );
        assert_eq!(actor.handler.disconnects.len(), 1);
        assert!(actor.handler.disconnects[0].is_remote());
        // default handle_disconnect echoes the peer's code and reason
        assert_eq!(
            actor.transport.sent,
            vec![Frame::close(CloseCode::GoingAway, "maintenance")]
        );
        assert_eq!(actor.phase, Phase::Closed);
    }

    #[tokio::test]
    async fn test_frameless_disconnect_records_abnormal_code_without_echo() {
        let mut actor = actor(Recording::default());
        let step = actor
            .dispatch_transport(TransportEvent::Disconnected(None))
            .await;
        assert_eq!(
            step,
            Some(TerminationReason::RemoteClose {
                code: CloseCode::Abnormal,
                reason: "connection dropped".into(),
            })
        );
        assert_eq!(actor.handler.disconnects.len(), 1);
        assert!(actor.transport.sent.is_empty());
    }

    #[tokio::test]
    async fn test_oversized_control_reply_is_bad_response() {
        let mut actor = actor(Recording::default());
        let step = actor.dispatch_user(UserEvent::Cast(Cmd::BadControl)).await;
        match step {
            Some(TerminationReason::Error(Fault::BadResponse { culprit, .. })) => {
                assert_eq!(culprit, Culprit::HandleCast);
            }
            other => panic!("expected BadResponse, got {other:?}"),
        }
        assert!(actor.transport.sent.is_empty());
    }

    #[tokio::test]
    async fn test_panicking_handler_becomes_error_reason() {
        let mut actor = actor(Recording::default());
        let step = actor.dispatch_user(UserEvent::Cast(Cmd::Boom)).await;
        match step {
            Some(TerminationReason::Error(Fault::Panic { culprit, message })) => {
                assert_eq!(culprit, Culprit::HandleCast);
                assert_eq!(message, "cast blew up");
            }
            other => panic!("expected Panic fault, got {other:?}"),
        }
        // state mutation before the panic is preserved
        assert_eq!(actor.state, 1);
    }

    #[tokio::test]
    async fn test_failed_reply_write_routes_through_disconnect() {
        let mut actor = actor(Recording::default());
        actor.transport.fail_sends = true;
        let step = actor.dispatch_user(UserEvent::Cast(Cmd::Echo("hi"))).await;
        assert!(matches!(
            step,
            Some(TerminationReason::RemoteClose { code: CloseCode::Abnormal, .. })
        ));
        assert_eq!(actor.handler.disconnects.len(), 1);
    }

    #[tokio::test]
    async fn test_report_invokes_terminate_with_final_state() {
        let actor = actor(Recording::default());
        let signal = actor.report(TerminationReason::Normal);
        assert!(matches!(signal, ExitSignal::Normal));
    }

    #[tokio::test]
    async fn test_report_keeps_reason_when_terminate_panics() {
        struct PanickyTerminate;

        impl Handler for PanickyTerminate {
            type State = ();
            type Command = ();
            type Message = ();

            fn handle_cast(&mut self, _c: (), _s: &mut ()) -> Outcome {
                Outcome::Continue
            }

            fn handle_info(&mut self, _m: (), _s: &mut ()) -> Outcome {
                Outcome::Continue
            }

            fn terminate(&mut self, _reason: &TerminationReason, _state: &()) {
                panic!("hook failure");
            }
        }

        let (_sink, events) = event_channel();
        let (_tx, user_rx) = mpsc::unbounded_channel();
        let actor = ConnectionActor {
            transport: MockTransport::new(),
            handler: PanickyTerminate,
            state: (),
            config: Config::default(),
            phase: Phase::Open,
            pending_close: None,
            transport_rx: events.rx,
            user_rx,
        };
        let signal = actor.report(TerminationReason::LocalClose {
            code: CloseCode::Normal,
            reason: "done".into(),
        });
        assert!(
            matches!(signal, ExitSignal::Local { code: CloseCode::Normal, ref reason } if reason == "done")
        );
    }

    #[test]
    fn test_validate_rejects_reply_close_frame() {
        let outcome = Outcome::Reply(Frame::close(CloseCode::Normal, "sneaky"));
        let fault = validate(Culprit::HandleInfo, outcome).unwrap_err();
        assert!(matches!(fault, Fault::BadResponse { culprit: Culprit::HandleInfo, .. }));
    }

    #[tokio::test]
    async fn test_oversized_disconnect_reply_is_bad_response() {
        struct OversizedDisconnectReply;

        impl Handler for OversizedDisconnectReply {
            type State = ();
            type Command = ();
            type Message = ();

            fn handle_cast(&mut self, _c: (), _s: &mut ()) -> Outcome {
                Outcome::Continue
            }

            fn handle_info(&mut self, _m: (), _s: &mut ()) -> Outcome {
                Outcome::Continue
            }

            fn handle_disconnect(&mut self, _reason: &DisconnectReason, _state: &mut ()) -> Outcome {
                Outcome::Reply(Frame::ping(vec![0u8; 200]))
            }
        }

        let (_sink, events) = event_channel();
        let (_tx, user_rx) = mpsc::unbounded_channel();
        let mut actor = ConnectionActor {
            transport: MockTransport::new(),
            handler: OversizedDisconnectReply,
            state: (),
            config: Config::default(),
            phase: Phase::Open,
            pending_close: None,
            transport_rx: events.rx,
            user_rx,
        };

        let step = actor
            .dispatch_transport(TransportEvent::Frame(Frame::close(CloseCode::Normal, "bye")))
            .await;
        match step {
            Some(TerminationReason::Error(Fault::BadResponse { culprit, .. })) => {
                assert_eq!(culprit, Culprit::HandleDisconnect);
            }
            other => panic!("expected BadResponse, got {other:?}"),
        }
        assert!(actor.transport.sent.is_empty());
    }

    #[test]
    fn test_validate_rejects_unsendable_close_code() {
        let outcome = Outcome::CloseWith(CloseCode::Abnormal, String::new());
        assert!(validate(Culprit::HandleCast, outcome).is_err());

        let outcome = Outcome::CloseWith(CloseCode::Other(4012), "fine".into());
        assert!(validate(Culprit::HandleCast, outcome).is_ok());
    }

    #[test]
    fn test_validate_rejects_oversized_close_reason() {
        let outcome = Outcome::CloseWith(CloseCode::Normal, "x".repeat(160));
        assert!(validate(Culprit::HandleCast, outcome).is_err());
    }
}
