//! `wp_viewporter` relay (§4.3, feeding §4.8's geometry math): each
//! surface proxy lazily creates a `wp_viewport` for its host surface the
//! first time a non-1 effective scale is observed, and destroys it if the
//! scale later drops back to 1 (only possible via a `--scale` CLI change,
//! which spec.md's non-goals exclude at runtime — so in practice a
//! viewport, once created, lives for the surface's lifetime).

use wayland_client::protocol::wl_surface::WlSurface as HostSurface;
use wayland_protocols::wp::viewporter::client::wp_viewport::WpViewport;
use wayland_protocols::wp::viewporter::client::wp_viewporter::WpViewporter;

pub struct ViewporterProxy {
    pub host: WpViewporter,
}

impl ViewporterProxy {
    pub fn new(host: WpViewporter) -> Self {
        Self { host }
    }

    pub fn get_viewport(&self, surface: &HostSurface, qh: &wayland_client::QueueHandle<crate::bridge::Bridge>) -> WpViewport
    where
        crate::bridge::Bridge: wayland_client::Dispatch<WpViewport, ()>,
    {
        self.host.get_viewport(surface, qh, ())
    }
}

// `Dispatch<WpViewport, ()> for Bridge` lives in `super::surface` since
// `wp_viewport` has no events of its own and the only consumer of a
// viewport is a `SurfaceProxy`.

use wayland_protocols::wp::viewporter::server::wp_viewporter::WpViewporter as GuestViewporter;

use crate::bridge::Bridge;

/// Guest-facing `wp_viewporter`: like `zxdg_shell_v6`, Xwayland itself
/// never needs to call `get_viewport` — the surface proxy already creates
/// and owns the one-per-surface host viewport it needs for scale
/// emulation (see [`super::surface::SurfaceProxy::viewport`]) on its own
/// initiative, not in response to a guest request. The global is still
/// advertised (§4.2) so its presence is discoverable; a client that binds
/// it and actually calls `get_viewport` gets a loud protocol error rather
/// than a silently-ignored request.
impl wayland_server::GlobalDispatch<GuestViewporter, ()> for Bridge {
    fn bind(
        _state: &mut Self,
        _handle: &wayland_server::DisplayHandle,
        _client: &wayland_server::Client,
        resource: wayland_server::New<GuestViewporter>,
        _global_data: &(),
        data_init: &mut wayland_server::DataInit<'_, Self>,
    ) {
        data_init.init(resource, ());
    }
}

impl wayland_server::Dispatch<GuestViewporter, ()> for Bridge {
    fn request(
        _state: &mut Self,
        _client: &wayland_server::Client,
        resource: &GuestViewporter,
        request: wayland_protocols::wp::viewporter::server::wp_viewporter::Request,
        _data: &(),
        _dhandle: &wayland_server::DisplayHandle,
        _data_init: &mut wayland_server::DataInit<'_, Self>,
    ) {
        use wayland_protocols::wp::viewporter::server::wp_viewporter::{Error, Request};
        use wayland_server::Resource as _;
        if let Request::GetViewport { .. } = request {
            resource.post_error(Error::ViewportExists, "xwl-run's Xwayland guest is never expected to drive viewporter itself");
        }
    }
}
