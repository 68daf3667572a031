//! `wl_compositor`/`wl_surface` relay (§4.3 first bullet).
//!
//! Every guest `wl_surface` owns exactly one host `wl_surface` created at
//! `wl_compositor.create_surface` time and destroyed with it; all other
//! requests (`attach`, `damage`, `frame`, `commit`, `set_buffer_scale`,
//! `set_input_region`, ...) are relayed 1:1 onto the host surface, with
//! `attach`/`damage` passing through the scale conversions in
//! [`crate::geometry`] first.

use wayland_client::protocol::wl_surface::WlSurface as HostSurface;
use wayland_protocols::wp::viewporter::client::wp_viewport::WpViewport;
use wayland_server::protocol::wl_surface::WlSurface as GuestSurface;

use crate::geometry::{attach_offset_to_host, damage_outset, Rect, Size};

/// One surface's host/guest pair plus the handful of fields needed to
/// translate its requests correctly: the current scale (read from
/// `Bridge::effective_scale` at the point of each request, not cached,
/// since the bridge never changes scale after an output's first
/// advertisement per spec.md's non-goals) and whether a `wp_viewport` has
/// been created for it yet (§4.3: "the surface proxy creates a
/// `wp_viewport` for itself lazily, the first time a non-1 effective scale
/// is observed").
pub struct SurfaceProxy {
    pub guest: GuestSurface,
    pub host: HostSurface,
    pub viewport: Option<WpViewport>,
    pub pending_destination: Option<(i32, i32)>,
    /// The most recently attached buffer's size, in guest pixels; `(0, 0)`
    /// before the first `attach`. Feeds [`crate::window::config::ConfigureState::try_ack`]
    /// once this surface is paired with a window (§4.5).
    pub contents_size: Size,
    /// The most recent serial observed on any event targeting this surface
    /// (enter/leave, frame callback), used to break ties when an
    /// override-redirect window needs a "most recently active" sibling to
    /// parent itself to (§4.5 step 2, E6).
    pub last_event_serial: u32,
    /// Set once this surface has been handed to `wl_pointer.set_cursor` —
    /// cursor surfaces commit immediately rather than waiting for an
    /// xdg-surface to exist (§4.3 "commit").
    pub is_cursor: bool,
}

impl SurfaceProxy {
    pub fn new(guest: GuestSurface, host: HostSurface) -> Self {
        Self {
            guest,
            host,
            viewport: None,
            pending_destination: None,
            contents_size: Size::default(),
            last_event_serial: 0,
            is_cursor: false,
        }
    }

    /// Relay `wl_surface.attach`: the buffer object itself is relayed by
    /// [`super::buffer`], this only needs to convert the `x`/`y` hotspot
    /// offset into host space (§4.8).
    pub fn attach_offset(&self, guest_x: i32, guest_y: i32, scale: f64) -> (i32, i32) {
        (
            attach_offset_to_host(guest_x, scale),
            attach_offset_to_host(guest_y, scale),
        )
    }

    /// Relay `wl_surface.damage`/`damage_buffer`: outset-and-scale per
    /// §4.8's exact formula, implemented in [`damage_outset`].
    pub fn damage_rect(&self, guest_rect: Rect, scale: f64) -> Rect {
        damage_outset(guest_rect, scale)
    }

    /// The destination size a `wp_viewport.set_destination` call should
    /// use for a buffer whose contents are `contents_w x contents_h` in
    /// guest pixels, or `None` if no viewport is needed (scale is exactly
    /// 1, or the buffer is zero-sized, §8 boundary case).
    pub fn viewport_destination(&self, contents_w: i32, contents_h: i32, scale: f64) -> Option<(i32, i32)> {
        if scale == 1.0 || contents_w == 0 || contents_h == 0 {
            return None;
        }
        Some((
            crate::geometry::viewport_destination(contents_w, scale),
            crate::geometry::viewport_destination(contents_h, scale),
        ))
    }
}

use wayland_client::Proxy as _;
use wayland_server::protocol::wl_callback::WlCallback as GuestCallback;
use wayland_server::protocol::wl_compositor::WlCompositor as GuestCompositor;
use wayland_server::protocol::wl_region::WlRegion as GuestRegion;
use wayland_server::{Client, DataInit, Dispatch, DisplayHandle, GlobalDispatch, New, Resource as _};

use crate::bridge::Bridge;

/// Guest-facing `wl_compositor`: every `create_surface` creates the
/// matching host surface eagerly (§4.3 first bullet), keyed by the guest
/// surface's own protocol id so [`super::super::window::driver`] can look
/// it up from the `WL_SURFACE_ID` client message.
impl GlobalDispatch<GuestCompositor, ()> for Bridge {
    fn bind(
        _state: &mut Self,
        _handle: &DisplayHandle,
        _client: &Client,
        resource: New<GuestCompositor>,
        _global_data: &(),
        data_init: &mut DataInit<'_, Self>,
    ) {
        data_init.init(resource, ());
    }
}

impl Dispatch<GuestCompositor, ()> for Bridge {
    fn request(
        bridge: &mut Self,
        _client: &Client,
        _resource: &GuestCompositor,
        request: wayland_server::protocol::wl_compositor::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        use wayland_server::protocol::wl_compositor::Request;
        match request {
            Request::CreateSurface { id } => {
                let guest = data_init.init(id, ());
                let guest_id = guest.id().protocol_id();
                let Some(compositor) = &bridge.host_compositor else {
                    tracing::warn!("create_surface with no host wl_compositor bound");
                    return;
                };
                let host = compositor.create_surface(&bridge.host_qh, guest_id);
                bridge.surfaces.insert(guest_id, SurfaceProxy::new(guest, host));
                crate::window::driver::handle_surface_created(bridge, guest_id);
            }
            Request::CreateRegion { id } => {
                data_init.init::<GuestRegion>(id, ());
            }
            _ => {}
        }
    }
}

/// `wl_region` carries no semantics the bridge needs (damage/input regions
/// are never forwarded per-pixel, only the surface's overall geometry is,
/// §4.3) — every request on it is a no-op.
impl Dispatch<GuestRegion, ()> for Bridge {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &GuestRegion,
        _request: wayland_server::protocol::wl_region::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
    }
}

impl Dispatch<GuestCallback, ()> for Bridge {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &GuestCallback,
        request: wayland_server::protocol::wl_callback::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
        match request {}
    }
}

/// Guest `wl_surface`: every mutating request is relayed onto the paired
/// host surface after the scale conversions in [`crate::geometry`];
/// `set_buffer_scale`/`set_buffer_transform` are protocol errors here
/// because the bridge always presents buffer-scale 1 downstream (§4.3,
/// §4.4 "Downstream buffer-scale is always 1").
impl Dispatch<wayland_server::protocol::wl_surface::WlSurface, ()> for Bridge {
    fn request(
        bridge: &mut Self,
        _client: &Client,
        resource: &wayland_server::protocol::wl_surface::WlSurface,
        request: wayland_server::protocol::wl_surface::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        use wayland_server::protocol::wl_surface::{Error as SurfaceError, Request};

        let guest_id = resource.id().protocol_id();
        let scale = bridge.effective_scale();

        match request {
            Request::Attach { buffer, x, y } => {
                let Some(surface) = bridge.surfaces.get(&guest_id) else { return };
                let (host_x, host_y) = surface.attach_offset(x, y, scale);
                let guest_buffer_id = buffer.as_ref().map(|b| b.id().protocol_id());
                let (host_buffer, contents) = match guest_buffer_id.and_then(|id| bridge.buffers.get(&id)) {
                    Some(proxy) => (Some(proxy.host.clone()), proxy.size()),
                    None => (None, crate::geometry::Size::default()),
                };

                // §4.3/§4.8: emulate the effective scale on the host side —
                // a viewport destination when viewporter is available, a
                // plain integer buffer-scale otherwise.
                let destination = bridge
                    .surfaces
                    .get(&guest_id)
                    .and_then(|s| s.viewport_destination(contents.w, contents.h, scale));
                if bridge.viewporter.is_some() {
                    if let Some((dest_w, dest_h)) = destination {
                        if let Some(viewport) = ensure_viewport(bridge, guest_id) {
                            viewport.set_destination(dest_w, dest_h);
                        }
                    }
                } else if let Some(surface) = bridge.surfaces.get(&guest_id) {
                    surface.host.set_buffer_scale(scale.round().max(1.0) as i32);
                }

                if let Some(surface) = bridge.surfaces.get_mut(&guest_id) {
                    surface.contents_size = contents;
                    surface.host.attach(host_buffer.as_ref(), host_x, host_y);
                }
                let _ = crate::window::driver::handle_attach(bridge, guest_id, contents);
            }
            Request::Damage { x, y, width, height } => {
                let Some(surface) = bridge.surfaces.get(&guest_id) else { return };
                let rect = surface.damage_rect(Rect::new(x, y, width, height), scale);
                surface.host.damage(rect.loc.x, rect.loc.y, rect.size.w, rect.size.h);
            }
            Request::DamageBuffer { x, y, width, height } => {
                let Some(surface) = bridge.surfaces.get(&guest_id) else { return };
                // Buffer-space damage is already in host pixels once the
                // buffer itself is shared 1:1 with the host (no
                // server-side scaling of pixel content, only geometry),
                // so this relays verbatim rather than through the
                // guest-space outset formula.
                surface.host.damage_buffer(x, y, width, height);
            }
            Request::Frame { callback } => {
                let Some(surface) = bridge.surfaces.get(&guest_id) else { return };
                let guest_cb = data_init.init(callback, ());
                let host_cb = surface.host.frame(&bridge.host_qh, ());
                bridge.callbacks.insert(host_cb.id(), guest_cb);
            }
            Request::SetOpaqueRegion { .. } | Request::SetInputRegion { .. } => {
                // Regions carry no forwarded semantics (see `WlRegion`
                // above); nothing to relay.
            }
            Request::Commit => {
                let Some(surface) = bridge.surfaces.get(&guest_id) else { return };
                surface.host.commit();
            }
            Request::SetBufferScale { .. } => {
                resource.post_error(SurfaceError::InvalidScale, "buffer scale is fixed at 1 by this bridge");
            }
            Request::SetBufferTransform { .. } => {
                resource.post_error(SurfaceError::InvalidTransform, "buffer transform is not supported by this bridge");
            }
            Request::Destroy => {
                if let Some(surface) = bridge.surfaces.remove(&guest_id) {
                    if let Some(viewport) = surface.viewport {
                        viewport.destroy();
                    }
                    surface.host.destroy();
                }
            }
            _ => {}
        }
    }
}

/// Lazily creates (and caches on the `SurfaceProxy`) the host `wp_viewport`
/// backing this surface's scale emulation, the first time one is needed
/// (§4.3: "the surface proxy creates a `wp_viewport` for itself lazily, the
/// first time a non-1 effective scale is observed").
fn ensure_viewport(bridge: &mut Bridge, guest_id: u32) -> Option<WpViewport> {
    if let Some(viewport) = bridge.surfaces.get(&guest_id).and_then(|s| s.viewport.clone()) {
        return Some(viewport);
    }
    let viewporter = bridge.viewporter.as_ref()?;
    let host_surface = bridge.surfaces.get(&guest_id)?.host.clone();
    let viewport = viewporter.get_viewport(&host_surface, &bridge.host_qh);
    if let Some(surface) = bridge.surfaces.get_mut(&guest_id) {
        surface.viewport = Some(viewport.clone());
    }
    Some(viewport)
}

/// Host-facing `wl_surface`: the only events it can receive are
/// `enter`/`leave` naming outputs, which the bridge ignores (downstream
/// output enter/leave is driven from the window's own geometry against
/// `OutputState`, not relayed 1:1, since guest surfaces and host surfaces
/// don't share an output-enumeration space).
impl wayland_client::Dispatch<HostSurface, u32> for Bridge {
    fn event(
        _bridge: &mut Self,
        _proxy: &HostSurface,
        _event: wayland_client::protocol::wl_surface::Event,
        _data: &u32,
        _conn: &wayland_client::Connection,
        _qh: &wayland_client::QueueHandle<Self>,
    ) {
    }
}

/// Host-facing `wl_callback`: the one event (`done`) fires the
/// corresponding guest callback and forgets it (callbacks are one-shot,
/// §4.3 "frame").
impl wayland_client::Dispatch<wayland_client::protocol::wl_callback::WlCallback, ()> for Bridge {
    fn event(
        bridge: &mut Self,
        proxy: &wayland_client::protocol::wl_callback::WlCallback,
        event: wayland_client::protocol::wl_callback::Event,
        _data: &(),
        _conn: &wayland_client::Connection,
        _qh: &wayland_client::QueueHandle<Self>,
    ) {
        use wayland_client::protocol::wl_callback::Event;
        let Event::Done { callback_data } = event else { return };
        if let Some(guest_cb) = bridge.callbacks.remove(&proxy.id()) {
            guest_cb.done(callback_data);
        }
    }
}

impl wayland_client::Dispatch<WpViewport, ()> for Bridge {
    fn event(
        _bridge: &mut Self,
        _proxy: &WpViewport,
        event: wayland_protocols::wp::viewporter::client::wp_viewport::Event,
        _data: &(),
        _conn: &wayland_client::Connection,
        _qh: &wayland_client::QueueHandle<Self>,
    ) {
        match event {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_destination_skips_unit_scale() {
        // Constructing a real SurfaceProxy needs a live connection; the
        // method under test only touches `scale`/`contents`, so exercise
        // the pure geometry path it delegates to directly via the
        // free functions instead of standing up wayland objects here.
        assert_eq!(crate::geometry::viewport_destination(100, 1.0), 100);
    }

    #[test]
    fn zero_contents_is_a_boundary_not_a_panic() {
        assert_eq!(crate::geometry::viewport_destination(0, 2.0), 0);
    }
}
