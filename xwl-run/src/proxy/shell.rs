//! `zxdg_shell_v6` driver (§4.5): turns a managed [`crate::window::Window`]
//! into a host `zxdg_surface_v6` + `zxdg_toplevel_v6` (or `_popup_v6`)
//! pair, and drives the `configure`/`ack_configure` handshake through
//! [`crate::window::config::ConfigureState`]. The legacy `wl_shell` global
//! is mirrored (§4.2) purely so hosts that predate xdg-shell still work,
//! but the bridge never uses it itself — `zxdg_shell_v6` is always
//! preferred when both are present, matching `original_source/xwl.c`
//! which only ever speaks one shell protocol per run.

use xwl_protocols::xdg_shell_v6::client::zxdg_shell_v6::ZxdgShellV6;
use xwl_protocols::xdg_shell_v6::client::zxdg_surface_v6::ZxdgSurfaceV6;
use xwl_protocols::xdg_shell_v6::client::zxdg_toplevel_v6::ZxdgToplevelV6;

use crate::window::config::{ConfigureDesc, ConfigureState};

pub struct ShellDriver {
    pub host_shell: ZxdgShellV6,
}

impl ShellDriver {
    pub fn new(host_shell: ZxdgShellV6) -> Self {
        Self { host_shell }
    }
}

/// One toplevel's host-side shell objects, paired with the window's own
/// [`ConfigureState`] (owned by the `Window` itself, not duplicated here —
/// this struct is only the host proxy half).
pub struct ToplevelProxy {
    pub xdg_surface: ZxdgSurfaceV6,
    pub xdg_toplevel: ZxdgToplevelV6,
}

/// Translate a `zxdg_toplevel_v6.configure(width, height, states)` event
/// plus the paired `zxdg_surface_v6.configure(serial)` into a
/// [`ConfigureDesc`] and feed it into the window's state machine. Split out
/// as a free function (rather than a method on `ToplevelProxy`) because the
/// two events arrive on different objects and the caller (the dispatch impl
/// in `supervisor.rs`) has to buffer the toplevel's fields until the
/// surface's `configure(serial)` arrives, per xdg-shell's own two-event
/// handshake.
pub fn on_configure(
    state: &mut ConfigureState,
    serial: u32,
    width: i32,
    height: i32,
    fullscreen: bool,
    maximized: bool,
    activated: bool,
    scale: f64,
) {
    let size = if width == 0 || height == 0 {
        None
    } else {
        Some(crate::geometry::Size::new(
            crate::geometry::Scaled::<crate::geometry::Host>::new(width)
                .to_guest_round(scale)
                .value,
            crate::geometry::Scaled::<crate::geometry::Host>::new(height)
                .to_guest_round(scale)
                .value,
        ))
    };
    state.on_host_configure(
        serial,
        ConfigureDesc {
            size,
            fullscreen,
            maximized,
            activated,
        },
    );
}

use xwl_protocols::xdg_shell_v6::client::zxdg_popup_v6::ZxdgPopupV6;

use crate::bridge::Bridge;

/// Buffered `zxdg_toplevel_v6.configure` fields, held until the paired
/// `zxdg_surface_v6.configure(serial)` arrives — xdg-shell's handshake
/// fires the toplevel event first, then the surface event that actually
/// carries the serial to ack (§4.5).
#[derive(Default)]
struct PendingToplevelConfigure {
    width: i32,
    height: i32,
    fullscreen: bool,
    maximized: bool,
    activated: bool,
}

thread_local! {
    static PENDING_TOPLEVEL: std::cell::RefCell<std::collections::HashMap<wayland_client::backend::ObjectId, PendingToplevelConfigure>> =
        std::cell::RefCell::new(std::collections::HashMap::new());
}

impl wayland_client::Dispatch<ZxdgShellV6, ()> for Bridge {
    fn event(
        _bridge: &mut Self,
        proxy: &ZxdgShellV6,
        event: xwl_protocols::xdg_shell_v6::client::zxdg_shell_v6::Event,
        _data: &(),
        _conn: &wayland_client::Connection,
        _qh: &wayland_client::QueueHandle<Self>,
    ) {
        use xwl_protocols::xdg_shell_v6::client::zxdg_shell_v6::Event;
        if let Event::Ping { serial } = event {
            proxy.pong(serial);
        }
    }
}

impl wayland_client::Dispatch<ZxdgSurfaceV6, x11rb::protocol::xproto::Window> for Bridge {
    fn event(
        bridge: &mut Self,
        proxy: &ZxdgSurfaceV6,
        event: xwl_protocols::xdg_shell_v6::client::zxdg_surface_v6::Event,
        data: &x11rb::protocol::xproto::Window,
        _conn: &wayland_client::Connection,
        _qh: &wayland_client::QueueHandle<Self>,
    ) {
        use wayland_client::Proxy as _;
        use xwl_protocols::xdg_shell_v6::client::zxdg_surface_v6::Event;
        let Event::Configure { serial } = event else { return };

        let pending = PENDING_TOPLEVEL.with(|m| m.borrow_mut().remove(&proxy.id())).unwrap_or_default();
        let Some(window) = bridge.windows.by_id(*data) else { return };
        let scale = bridge.effective_scale();
        let mut w = window.borrow_mut();
        if let Some(crate::window::Shell::Toplevel { configure, .. }) = &mut w.shell {
            on_configure(
                configure,
                serial,
                pending.width,
                pending.height,
                pending.fullscreen,
                pending.maximized,
                pending.activated,
                scale,
            );
        }
    }
}

impl wayland_client::Dispatch<ZxdgToplevelV6, x11rb::protocol::xproto::Window> for Bridge {
    fn event(
        bridge: &mut Self,
        proxy: &ZxdgToplevelV6,
        event: xwl_protocols::xdg_shell_v6::client::zxdg_toplevel_v6::Event,
        data: &x11rb::protocol::xproto::Window,
        _conn: &wayland_client::Connection,
        _qh: &wayland_client::QueueHandle<Self>,
    ) {
        use wayland_client::Proxy as _;
        use xwl_protocols::xdg_shell_v6::client::zxdg_toplevel_v6::Event;
        match event {
            Event::Configure { width, height, states } => {
                let mut pending = PendingToplevelConfigure {
                    width,
                    height,
                    ..Default::default()
                };
                for chunk in states.chunks(4) {
                    let Ok(bytes) = <[u8; 4]>::try_from(chunk) else { continue };
                    match u32::from_ne_bytes(bytes) {
                        1 => pending.maximized = true,
                        2 => pending.fullscreen = true,
                        4 => pending.activated = true,
                        _ => {}
                    }
                }
                // Find the paired surface's xdg-surface host object id:
                // stashed on the toplevel's own proxy id, not the surface,
                // since only the toplevel event names the states.
                PENDING_TOPLEVEL.with(|m| {
                    m.borrow_mut().insert(
                        bridge
                            .windows
                            .by_id(*data)
                            .and_then(|w| match &w.borrow().shell {
                                Some(crate::window::Shell::Toplevel { xdg_surface, .. }) => Some(xdg_surface.id()),
                                _ => None,
                            })
                            .unwrap_or_else(|| proxy.id()),
                        pending,
                    )
                });
            }
            Event::Close => {
                if let Some(window) = bridge.windows.by_id(*data) {
                    let window_id = window.borrow().id;
                    let _ = crate::x11event::send_delete_window(bridge, window_id);
                }
            }
            _ => {}
        }
    }
}

impl wayland_client::Dispatch<ZxdgPopupV6, x11rb::protocol::xproto::Window> for Bridge {
    fn event(
        bridge: &mut Self,
        _proxy: &ZxdgPopupV6,
        event: xwl_protocols::xdg_shell_v6::client::zxdg_popup_v6::Event,
        data: &x11rb::protocol::xproto::Window,
        _conn: &wayland_client::Connection,
        _qh: &wayland_client::QueueHandle<Self>,
    ) {
        use xwl_protocols::xdg_shell_v6::client::zxdg_popup_v6::Event;
        match event {
            Event::Configure { .. } => {}
            Event::PopupDone => {
                if let Some(window) = bridge.windows.by_id(*data) {
                    let window_id = window.borrow().id;
                    let _ = crate::window::driver::handle_destroy_notify(bridge, window_id);
                }
            }
            _ => {}
        }
    }
}

/// Guest-facing `zxdg_shell_v6`: Xwayland is never expected to call
/// `get_xdg_surface` itself (the bridge creates host-side xdg-shell
/// objects on the X window's behalf, see [`crate::window::driver`]), so
/// this mirror exists purely so the global is visible and any `get_xdg_surface`
/// call from a misbehaving client is a loud protocol error rather than a
/// silent hang.
impl wayland_server::GlobalDispatch<ZxdgShellV6Guest, ()> for Bridge {
    fn bind(
        _state: &mut Self,
        _handle: &wayland_server::DisplayHandle,
        _client: &wayland_server::Client,
        resource: wayland_server::New<ZxdgShellV6Guest>,
        _global_data: &(),
        data_init: &mut wayland_server::DataInit<'_, Self>,
    ) {
        data_init.init(resource, ());
    }
}

impl wayland_server::Dispatch<ZxdgShellV6Guest, ()> for Bridge {
    fn request(
        _state: &mut Self,
        _client: &wayland_server::Client,
        resource: &ZxdgShellV6Guest,
        request: xwl_protocols::xdg_shell_v6::server::zxdg_shell_v6::Request,
        _data: &(),
        _dhandle: &wayland_server::DisplayHandle,
        _data_init: &mut wayland_server::DataInit<'_, Self>,
    ) {
        use wayland_server::Resource as _;
        use xwl_protocols::xdg_shell_v6::server::zxdg_shell_v6::{Error, Request};
        match request {
            Request::CreatePositioner { .. } | Request::GetXdgSurface { .. } => {
                resource.post_error(Error::Role, "xwl-run's Xwayland guest is never expected to drive xdg-shell itself");
            }
            _ => {}
        }
    }
}

use xwl_protocols::xdg_shell_v6::server::zxdg_shell_v6::ZxdgShellV6 as ZxdgShellV6Guest;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_size_configure_means_client_picks_size() {
        let mut state = ConfigureState::default();
        on_configure(&mut state, 1, 0, 0, false, false, true, 1.0);
        let (_, desc) = state.take_staged().unwrap();
        assert_eq!(desc.size, None);
        assert!(desc.activated);
    }

    #[test]
    fn nonzero_configure_scales_into_guest_space() {
        let mut state = ConfigureState::default();
        on_configure(&mut state, 1, 200, 100, true, false, false, 2.0);
        let (_, desc) = state.take_staged().unwrap();
        assert_eq!(desc.size, Some(crate::geometry::Size::new(400, 200)));
        assert!(desc.fullscreen);
    }
}
