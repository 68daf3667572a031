//! Guest-facing `zaura_shell` (§4.2): the frame-type/parent hints this
//! extension carries are set by the window manager itself, directly on
//! the host surface paired with a managed window (see
//! `crate::window::driver`'s own `aura_shell` client binding) — Xwayland
//! never needs a `zaura_surface` of its own. As with `zxdg_shell_v6` and
//! `wp_viewporter`, the global is advertised purely for discoverability;
//! an actual `get_aura_surface`/`get_aura_output` call is a loud protocol
//! error rather than a silent no-op.

use wayland_server::{Client, DataInit, DisplayHandle, GlobalDispatch, New, Resource as _};
use xwl_protocols::aura_shell::server::zaura_shell::{Error, Request, ZauraShell as GuestAuraShell};

use crate::bridge::Bridge;

impl GlobalDispatch<GuestAuraShell, ()> for Bridge {
    fn bind(
        _state: &mut Self,
        _handle: &DisplayHandle,
        _client: &Client,
        resource: New<GuestAuraShell>,
        _global_data: &(),
        data_init: &mut DataInit<'_, Self>,
    ) {
        data_init.init(resource, ());
    }
}

impl wayland_server::Dispatch<GuestAuraShell, ()> for Bridge {
    fn request(
        _state: &mut Self,
        _client: &Client,
        resource: &GuestAuraShell,
        request: Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            Request::GetAuraSurface { .. } => {
                resource.post_error(Error::AuraSurfaceExists, "xwl-run's Xwayland guest is never expected to drive aura-shell itself");
            }
            Request::GetAuraOutput { .. } => {
                resource.post_error(Error::AuraOutputExists, "xwl-run's Xwayland guest is never expected to drive aura-shell itself");
            }
            _ => {}
        }
    }
}
