//! Typed error kinds for the parts of the bridge that callers need to match
//! on. Configuration errors and invariant violations are not modeled here:
//! the former are `anyhow::Error` raised before any side effect in
//! [`crate::cli`], the latter are `panic!`/`assert!` at the point of
//! detection (see spec §7 kinds 1 and 2).

use std::io;

/// Recoverable/typed failures, corresponding to spec.md §7 kinds 3, 5 and 6.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("X protocol error from our own request: {0:?}")]
    X11Protocol(x11rb::x11_utils::X11Error),

    #[error("X connection lost: {0}")]
    X11Connection(#[from] x11rb::errors::ConnectionError),

    #[error("X reply error: {0}")]
    X11Reply(#[from] x11rb::errors::ReplyError),

    #[error("clipboard transfer failed: {0}")]
    ClipboardTransfer(#[source] io::Error),

    #[error("inferior program exited with status {0:?}")]
    InferiorExited(Option<i32>),

    #[error("host Wayland compositor disconnected: {0}")]
    HostDisconnected(#[from] wayland_client::backend::WaylandError),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
