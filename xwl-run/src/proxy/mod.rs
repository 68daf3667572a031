//! Proxy resources (C3, §4.3): the glue that makes a request on the
//! downstream (guest-facing, `wayland-server`) side turn into the matching
//! request on the upstream (host-facing, `wayland-client`) side, and vice
//! versa for events. Every interface the bridge mirrors gets its own
//! module here; each one pairs a `wayland_server::Resource` with the
//! `wayland_client::Proxy` it forwards to, stored in the `Bridge`'s
//! resource tables (§3 "Host resource pairs").
//!
//! Grounded on the teacher's protocol-handler modules under
//! `src/handlers/` — one file per interface, each a small `impl
//! wayland_server::Dispatch<Interface, Data> for State` block — except the
//! teacher implements a *compositor* role (it originates events) while
//! every handler here implements a *relay* role (translate and forward).

pub mod aura_shell;
pub mod buffer;
pub mod data_device;
pub mod dmabuf;
pub mod output;
pub mod seat;
pub mod shell;
pub mod shm;
pub mod surface;
pub mod viewporter;

/// Shared glue: a guest-facing `wayland-server` resource paired with the
/// host-facing `wayland-client` proxy it relays to. Both ids are untyped
/// `ObjectId`s at this layer; the typed `Resource`/`Proxy` values live in
/// the per-interface modules, which is where request/event translation
/// actually happens.
pub use crate::bridge::ResourcePair;
