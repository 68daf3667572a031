//! Event loop & process supervisor (C1, §4.1, §5). Grounded on the
//! teacher's `calloop::EventLoop` wiring in `state.rs`/`main.rs` (insert a
//! signal source, an executor, and the Wayland display's own source, then
//! `run()` with a per-iteration callback) — the teacher drives a
//! `wayland-server` display only; this supervisor additionally drives the
//! upstream `wayland-client` connection via `calloop-wayland-source`, and
//! owns the Xwayland + inferior child processes directly instead of the
//! teacher's tokio+passfd process model, since sommelier's (and this
//! bridge's) only child processes are fire-and-forget — no IPC beyond exit
//! status is needed.

use std::cell::RefCell;
use std::os::fd::{AsFd, BorrowedFd, RawFd};
use std::os::unix::net::UnixStream;
use std::process::Child;
use std::rc::Rc;
use std::time::Duration;

use calloop::generic::Generic;
use calloop::{EventLoop, Interest, LoopSignal, Mode, PostAction};
use calloop_wayland_source::WaylandSource;
use wayland_server::backend::{ClientData, ClientId, DisconnectReason};
use wayland_server::Display;
use x11rb::connection::Connection as _;
use x11rb::rust_connection::RustConnection;

use crate::bridge::Bridge;
use crate::error::Result;

/// Per-client bookkeeping the guest `Display` requires (§4.1: the bridge's
/// sole client is always Xwayland itself, so there is nothing to key off
/// the client id for beyond satisfying the trait) — grounded on the
/// teacher's own `ClientState`/`ClientData` pair in `state.rs`.
#[derive(Debug, Default)]
pub struct XwaylandClientData;

impl ClientData for XwaylandClientData {
    fn initialized(&self, _client_id: ClientId) {}
    fn disconnected(&self, _client_id: ClientId, _reason: DisconnectReason) {}
}

/// Why the loop stopped, surfaced to `main` to pick an exit code (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The supervised program exited and `--no-exit-with-child` was not
    /// given (the default, per SPEC_FULL.md §10).
    InferiorExited(i32),
    /// Xwayland itself died unexpectedly.
    XwaylandExited,
    /// The host compositor connection dropped.
    HostDisconnected,
}

pub struct Supervisor {
    pub event_loop: EventLoop<'static, Bridge>,
    pub signal: LoopSignal,
    xwayland: Rc<RefCell<Child>>,
    inferior: Rc<RefCell<Option<Child>>>,
    stop_reason: Rc<RefCell<Option<StopReason>>>,
    exit_with_child: bool,
}

impl Supervisor {
    pub fn new(event_loop: EventLoop<'static, Bridge>, xwayland: Child, exit_with_child: bool) -> Self {
        let signal = event_loop.get_signal();
        Self {
            event_loop,
            signal,
            xwayland: Rc::new(RefCell::new(xwayland)),
            inferior: Rc::new(RefCell::new(None)),
            stop_reason: Rc::new(RefCell::new(None)),
            exit_with_child,
        }
    }

    /// Register the upstream Wayland connection as a calloop source
    /// (mirrors the teacher's own `WaylandSource::new(display).insert()`
    /// call, just against a client `Connection`/`EventQueue` instead of a
    /// server `Display`).
    pub fn insert_host_source(
        &mut self,
        queue: wayland_client::EventQueue<Bridge>,
    ) -> Result<()> {
        let source = WaylandSource::new(queue).map_err(|_| {
            crate::error::BridgeError::HostDisconnected(wayland_client::backend::WaylandError::Io(
                std::io::Error::other("failed to wrap host event queue"),
            ))
        })?;
        self.event_loop
            .handle()
            .insert_source(source, |_, queue, bridge| queue.dispatch_pending(bridge))
            .map_err(|_| {
                crate::error::BridgeError::HostDisconnected(wayland_client::backend::WaylandError::Io(
                    std::io::Error::other("failed to insert host source"),
                ))
            })?;
        Ok(())
    }

    /// Register the window-manager X11 connection as a calloop source
    /// (C5/C7, §4.5–§4.7): one `Generic` on the connection's own fd, level
    /// triggered since `poll_for_event` can leave events buffered that
    /// never re-arm readability — grounded on smithay's own `X11Source` in
    /// `original_source`-adjacent reference code (`xwayland/xwm/mod.rs`),
    /// reimplemented directly against `x11rb` rather than pulled in as a
    /// dependency (see DESIGN.md "Bypassing smithay's XWayland/X11Wm").
    pub fn insert_x11_source(&mut self, xconn: Rc<RustConnection>, fd: RawFd) -> Result<()> {
        let source = Generic::new(BorrowedFdSource(fd), Interest::READ, Mode::Level);
        self.event_loop
            .handle()
            .insert_source(source, move |_readiness, _fd, bridge: &mut Bridge| {
                loop {
                    let event = xconn.poll_for_event().map_err(std::io::Error::other)?;
                    let Some(event) = event else { break };
                    if let Err(err) = crate::x11event::dispatch(bridge, event) {
                        tracing::error!(?err, "error handling X11 event");
                    }
                }
                Ok(PostAction::Continue)
            })
            .map_err(|_| {
                crate::error::BridgeError::HostDisconnected(wayland_client::backend::WaylandError::Io(
                    std::io::Error::other("failed to insert X11 source"),
                ))
            })?;
        Ok(())
    }

    /// Hand the guest `Display<Bridge>` itself to calloop (mirrors the
    /// teacher's `Generic::new(display, Interest::READ, Mode::Level)` in
    /// `Pinnacle::new`): the display is not kept as a `Bridge` field
    /// (see bridge.rs's doc comment on `guest`), it lives inside this
    /// source and is handed back to the callback directly, which is what
    /// lets `dispatch_clients(bridge)` run without a self-referential
    /// borrow.
    pub fn insert_guest_source(&mut self, display: Display<Bridge>) -> Result<()> {
        let source = Generic::new(display, Interest::READ, Mode::Level);
        self.event_loop
            .handle()
            .insert_source(source, |_readiness, display, bridge| {
                // Safety: the display is owned by this calloop source for
                // its whole lifetime, never moved or dropped out from
                // under `dispatch_clients` (same invariant the teacher's
                // own `Generic::new(display, ...)` callback relies on).
                let dispatched = unsafe { display.get_mut().dispatch_clients(bridge) };
                dispatched.map_err(std::io::Error::other)?;
                bridge.guest.flush_clients().map_err(std::io::Error::other)?;
                Ok(PostAction::Continue)
            })
            .map_err(|_| {
                crate::error::BridgeError::HostDisconnected(wayland_client::backend::WaylandError::Io(
                    std::io::Error::other("failed to insert guest source"),
                ))
            })?;
        Ok(())
    }

    /// Insert Xwayland's end of the socketpair as the guest display's sole
    /// client (§4.1 step 2). Returns the `ClientId` so the bridge can tell
    /// its own requests/events apart from a hypothetical second client,
    /// though in practice there is only ever this one.
    pub fn insert_xwayland_client(
        display: &Display<Bridge>,
        stream: UnixStream,
    ) -> Result<ClientId> {
        let client = display
            .handle()
            .insert_client(stream, std::sync::Arc::new(XwaylandClientData))
            .map_err(|e| {
                crate::error::BridgeError::HostDisconnected(wayland_client::backend::WaylandError::Io(
                    std::io::Error::other(e),
                ))
            })?;
        Ok(client.id())
    }

    /// SIGCHLD, delivered as a message to the loop rather than handled
    /// asynchronously in a signal handler (DESIGN NOTES: "model SIGCHLD as
    /// a message delivered to the event loop, not as asynchronous
    /// process-global state read from inside a signal handler") — calloop's
    /// `calloop::signals::Signals` source already does exactly this by
    /// delivering the signal on the next loop iteration via a signalfd.
    pub fn insert_sigchld_source(&mut self) -> Result<()> {
        use calloop::signals::{Signal, Signals};
        let signals = Signals::new(&[Signal::SIGCHLD]).map_err(|e| {
            crate::error::BridgeError::HostDisconnected(wayland_client::backend::WaylandError::Io(
                std::io::Error::other(e),
            ))
        })?;
        let xwayland = Rc::clone(&self.xwayland);
        let inferior = Rc::clone(&self.inferior);
        let stop_reason = Rc::clone(&self.stop_reason);
        let exit_with_child = self.exit_with_child;
        let signal = self.signal.clone();
        self.event_loop
            .handle()
            .insert_source(signals, move |_, _, _bridge| {
                reap_children(&xwayland, &inferior, &stop_reason, exit_with_child, &signal);
            })
            .map_err(|_| {
                crate::error::BridgeError::HostDisconnected(wayland_client::backend::WaylandError::Io(
                    std::io::Error::other("failed to insert signal source"),
                ))
            })?;
        Ok(())
    }

    pub fn set_inferior(&mut self, child: Child) {
        *self.inferior.borrow_mut() = Some(child);
    }

    pub fn stop(&mut self, reason: StopReason) {
        *self.stop_reason.borrow_mut() = Some(reason);
        self.signal.stop();
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        *self.stop_reason.borrow()
    }

    /// Startup sequence (§4.1): spawn Xwayland with `-displayfd`, wait for
    /// it to write the display number, connect the upstream host
    /// connection, bind the mirrored globals, *then* spawn the inferior
    /// program with `DISPLAY` set — in that order, since the inferior must
    /// never be able to connect before the bridge is ready to manage its
    /// windows.
    pub fn run(&mut self, bridge: &mut Bridge) -> Result<()> {
        self.event_loop
            .run(Duration::from_millis(16), bridge, |bridge| {
                if let Err(err) = bridge.on_event_loop_cycle_completion() {
                    tracing::error!(?err, "event loop cycle completion failed");
                }
            })
            .map_err(|e| {
                crate::error::BridgeError::HostDisconnected(wayland_client::backend::WaylandError::Io(
                    std::io::Error::other(e),
                ))
            })?;
        Ok(())
    }
}

/// SIGCHLD handler body (§4.1 item 4, §7 kind 6): check both children with
/// a non-blocking `try_wait` (a signalfd wakeup only means *some* child
/// changed state, not which one) and apply the exit policy. Xwayland dying
/// always stops the bridge (§7 kind 3/4: its X connection going away is
/// fatal regardless of `exit_with_child`); the inferior dying only stops
/// the bridge if `exit_with_child` is set, otherwise it's logged and the
/// bridge keeps running bridging the now-childless Xwayland (§7 kind 6).
fn reap_children(
    xwayland: &Rc<RefCell<Child>>,
    inferior: &Rc<RefCell<Option<Child>>>,
    stop_reason: &Rc<RefCell<Option<StopReason>>>,
    exit_with_child: bool,
    signal: &LoopSignal,
) {
    if let Ok(Some(status)) = xwayland.borrow_mut().try_wait() {
        tracing::info!(?status, "Xwayland exited");
        *stop_reason.borrow_mut() = Some(StopReason::XwaylandExited);
        signal.stop();
        return;
    }

    let mut inferior_ref = inferior.borrow_mut();
    if let Some(child) = inferior_ref.as_mut() {
        if let Ok(Some(status)) = child.try_wait() {
            let code = status.code().unwrap_or(1);
            if exit_with_child {
                tracing::info!(code, "inferior exited, terminating Xwayland");
                let _ = xwayland.borrow_mut().kill();
                *stop_reason.borrow_mut() = Some(StopReason::InferiorExited(code));
                signal.stop();
            } else {
                tracing::info!(code, "inferior exited, continuing (--no-exit-with-child)");
            }
            *inferior_ref = None;
        }
    }
}

/// Lets calloop watch an fd this crate doesn't own the lifetime of — the
/// X11 connection's socket stays alive inside `xconn` for as long as the
/// bridge runs, so borrowing its raw fd here is sound without taking
/// ownership a second time.
struct BorrowedFdSource(RawFd);

impl AsFd for BorrowedFdSource {
    fn as_fd(&self) -> BorrowedFd<'_> {
        unsafe { BorrowedFd::borrow_raw(self.0) }
    }
}
