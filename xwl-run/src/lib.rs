//! A rootless X-to-Wayland bridge.
//!
//! Runs an embedded Xwayland, manages its windows over ICCCM/EWMH, bridges
//! the X `CLIPBOARD`/`PRIMARY` selections with the host Wayland
//! compositor's data-device clipboard, and re-exports a curated subset of
//! the host's Wayland globals so Xwayland's own renderer can draw directly
//! through the host compositor instead of an intermediate software path.
//!
//! Split between a `lib.rs`/`main.rs` pair the way the teacher's root
//! package is — `main.rs` only parses the CLI, installs the tracing
//! subscriber, and calls into [`run`]; everything else is unit-testable
//! library code.

pub mod atoms;
pub mod bridge;
pub mod cli;
pub mod clipboard;
pub mod error;
pub mod focus;
pub mod geometry;
pub mod proxy;
pub mod registry;
pub mod supervisor;
pub mod window;
pub mod x11event;

pub use error::{BridgeError, Result};
