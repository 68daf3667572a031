//! `wl_seat` + pointer/keyboard/touch relay (§4.3). The bridge is not an
//! input method and does no input translation of its own — every pointer
//! motion/button, keyboard key/modifiers, and touch event the host sends
//! is relayed verbatim to whichever guest surface currently has host
//! pointer/keyboard focus, after retargeting the `enter` surface argument
//! from the host surface id to the matching guest surface id.

use wayland_client::protocol::{
    wl_keyboard::WlKeyboard as HostKeyboard, wl_pointer::WlPointer as HostPointer,
    wl_seat::WlSeat as HostSeat, wl_touch::WlTouch as HostTouch,
};
use wayland_server::protocol::{
    wl_keyboard::WlKeyboard as GuestKeyboard, wl_pointer::WlPointer as GuestPointer,
    wl_seat::WlSeat as GuestSeat, wl_touch::WlTouch as GuestTouch,
};

pub struct SeatProxy {
    pub guest: GuestSeat,
    pub host: HostSeat,
    pub pointer: Option<(GuestPointer, HostPointer)>,
    pub keyboard: Option<(GuestKeyboard, HostKeyboard)>,
    pub touch: Option<(GuestTouch, HostTouch)>,
    /// The most recent serial observed on any of this seat's input
    /// devices, used as the `time`/`serial` argument for focus and
    /// selection requests the bridge originates on this seat's behalf
    /// (DESIGN NOTES OQ-3, resolved per-seat in DESIGN.md).
    pub last_event_serial: u32,
}

impl SeatProxy {
    pub fn new(guest: GuestSeat, host: HostSeat) -> Self {
        Self {
            guest,
            host,
            pointer: None,
            keyboard: None,
            touch: None,
            last_event_serial: 0,
        }
    }

    pub fn record_serial(&mut self, serial: u32) {
        self.last_event_serial = serial;
    }
}

use wayland_client::Proxy as _;
use wayland_server::{Client, DataInit, Dispatch, DisplayHandle, GlobalDispatch, New, Resource as _};

use crate::bridge::Bridge;

impl GlobalDispatch<GuestSeat, ()> for Bridge {
    fn bind(
        bridge: &mut Self,
        _handle: &DisplayHandle,
        _client: &Client,
        resource: New<GuestSeat>,
        _global_data: &(),
        data_init: &mut DataInit<'_, Self>,
    ) {
        let guest = data_init.init(resource, ());
        guest.capabilities(wayland_server::protocol::wl_seat::Capability::Pointer | wayland_server::protocol::wl_seat::Capability::Keyboard);
        if let Some(host) = bridge.pending_host_seat.take() {
            bridge.seat_proxies.push(SeatProxy::new(guest, host));
            bridge.seats.push(crate::bridge::SeatState::default());
        }
    }
}

impl Dispatch<GuestSeat, ()> for Bridge {
    fn request(
        bridge: &mut Self,
        _client: &Client,
        resource: &GuestSeat,
        request: wayland_server::protocol::wl_seat::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        use wayland_server::protocol::wl_seat::Request;
        let guest_seat_id = resource.id().protocol_id();
        let Some(seat_index) = bridge.seat_proxies.iter().position(|s| s.guest.id().protocol_id() == guest_seat_id) else {
            return;
        };
        match request {
            Request::GetPointer { id } => {
                let guest = data_init.init(id, ());
                let host = bridge.seat_proxies[seat_index].host.get_pointer(&bridge.host_qh, ());
                bridge.seat_proxies[seat_index].pointer = Some((guest, host));
            }
            Request::GetKeyboard { id } => {
                let guest = data_init.init(id, ());
                let host = bridge.seat_proxies[seat_index].host.get_keyboard(&bridge.host_qh, ());
                bridge.seat_proxies[seat_index].keyboard = Some((guest, host));
            }
            Request::GetTouch { id } => {
                let guest = data_init.init(id, ());
                let host = bridge.seat_proxies[seat_index].host.get_touch(&bridge.host_qh, ());
                bridge.seat_proxies[seat_index].touch = Some((guest, host));
            }
            Request::Release => {}
            _ => {}
        }
    }
}

impl Dispatch<GuestPointer, ()> for Bridge {
    fn request(
        bridge: &mut Self,
        _client: &Client,
        resource: &GuestPointer,
        request: wayland_server::protocol::wl_pointer::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
        use wayland_server::protocol::wl_pointer::Request;
        match request {
            // `set_cursor` names a guest surface that should be committed
            // immediately rather than waiting on an xdg-surface to exist
            // (§4.3 "commit"): mark it and relay the request as a
            // `set_cursor` against the matching host pointer/surface.
            Request::SetCursor { serial, surface, hotspot_x, hotspot_y } => {
                let host_surface = surface.as_ref().and_then(|s| {
                    let guest_id = s.id().protocol_id();
                    if let Some(proxy) = bridge.surfaces.get_mut(&guest_id) {
                        proxy.is_cursor = true;
                    }
                    bridge.surfaces.get(&guest_id).map(|p| p.host.clone())
                });
                if let Some((_, host_pointer)) = bridge
                    .seat_proxies
                    .iter()
                    .find(|s| s.pointer.as_ref().map(|(g, _)| g.id().protocol_id()) == Some(resource.id().protocol_id()))
                    .and_then(|s| s.pointer.clone())
                {
                    host_pointer.set_cursor(serial, host_surface.as_ref(), hotspot_x, hotspot_y);
                }
            }
            Request::Release => {}
            _ => {}
        }
    }
}

impl Dispatch<GuestKeyboard, ()> for Bridge {
    fn request(
        _bridge: &mut Self,
        _client: &Client,
        _resource: &GuestKeyboard,
        _request: wayland_server::protocol::wl_keyboard::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
    }
}

impl Dispatch<GuestTouch, ()> for Bridge {
    fn request(
        _bridge: &mut Self,
        _client: &Client,
        _resource: &GuestTouch,
        _request: wayland_server::protocol::wl_touch::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
    }
}

/// Find the seat index owning a given host proxy id, shared by the
/// pointer/keyboard/touch event handlers below.
fn seat_index_for<T: wayland_client::Proxy>(bridge: &Bridge, pick: impl Fn(&SeatProxy) -> Option<&T>) -> Option<usize> {
    bridge.seat_proxies.iter().position(|s| pick(s).is_some())
}

impl wayland_client::Dispatch<HostSeat, ()> for Bridge {
    fn event(
        bridge: &mut Self,
        proxy: &HostSeat,
        event: wayland_client::protocol::wl_seat::Event,
        _data: &(),
        _conn: &wayland_client::Connection,
        qh: &wayland_client::QueueHandle<Self>,
    ) {
        use wayland_client::protocol::wl_seat::Event;
        match event {
            Event::Capabilities { .. } => {
                // First capabilities report is also the signal to create
                // the bridge's own clipboard data device, mirroring
                // `original_source/xwl.c`'s seat-capability-triggered
                // `wl_data_device_manager.get_data_device` call (§4.7).
                if bridge.host_data_device.is_none() {
                    if let Some(manager) = &bridge.host_data_device_manager {
                        bridge.host_data_device = Some(manager.get_data_device(proxy, qh, ()));
                    }
                }
            }
            Event::Name { name } => {
                if let Some(idx) = bridge.seat_proxies.iter().position(|s| s.host.id() == proxy.id()) {
                    bridge.seats.get_mut(idx).map(|s| s.host_name = name.clone());
                }
            }
            _ => {}
        }
    }
}

impl wayland_client::Dispatch<HostPointer, ()> for Bridge {
    fn event(
        bridge: &mut Self,
        proxy: &HostPointer,
        event: wayland_client::protocol::wl_pointer::Event,
        _data: &(),
        _conn: &wayland_client::Connection,
        _qh: &wayland_client::QueueHandle<Self>,
    ) {
        use wayland_client::protocol::wl_pointer::Event;
        let Some(idx) = seat_index_for(bridge, |s| s.pointer.as_ref().map(|(_, h)| h).filter(|h| h.id() == proxy.id())) else {
            return;
        };
        let guest_pointer = bridge.seat_proxies[idx].pointer.as_ref().unwrap().0.clone();
        let scale = bridge.effective_scale();

        match event {
            Event::Enter { serial, surface, surface_x, surface_y } => {
                bridge.seat_proxies[idx].record_serial(serial);
                let host_id = surface.id().protocol_id();
                let Some(guest_surface) = bridge.surfaces.get(&host_id).map(|p| p.guest.clone()) else {
                    return;
                };
                if let Some(window) = bridge.windows.by_surface(host_id) {
                    let window_id = window.borrow().id;
                    let _ = crate::focus::restack_for_enter(bridge.xconn.as_ref(), &bridge.windows, window_id);
                }
                let gx = crate::geometry::Scaled::<crate::geometry::Host>::new(surface_x.round() as i32)
                    .to_guest_round(scale)
                    .value as f64;
                let gy = crate::geometry::Scaled::<crate::geometry::Host>::new(surface_y.round() as i32)
                    .to_guest_round(scale)
                    .value as f64;
                guest_pointer.enter(serial, &guest_surface, gx, gy);
            }
            Event::Leave { serial, surface } => {
                let host_id = surface.id().protocol_id();
                if let Some(guest_surface) = bridge.surfaces.get(&host_id).map(|p| p.guest.clone()) {
                    guest_pointer.leave(serial, &guest_surface);
                }
            }
            Event::Motion { time, surface_x, surface_y } => {
                let gx = surface_x / scale;
                let gy = surface_y / scale;
                guest_pointer.motion(time, gx, gy);
            }
            Event::Button { serial, time, button, state } => {
                bridge.seat_proxies[idx].record_serial(serial);
                guest_pointer.button(serial, time, button, state.into_result().unwrap_or(wayland_server::protocol::wl_pointer::ButtonState::Released));
            }
            Event::Axis { time, axis, value } => {
                guest_pointer.axis(time, axis.into_result().unwrap_or(wayland_server::protocol::wl_pointer::Axis::VerticalScroll), value / scale);
            }
            Event::Frame => {
                guest_pointer.frame();
            }
            _ => {}
        }
    }
}

impl wayland_client::Dispatch<HostKeyboard, ()> for Bridge {
    fn event(
        bridge: &mut Self,
        proxy: &HostKeyboard,
        event: wayland_client::protocol::wl_keyboard::Event,
        _data: &(),
        _conn: &wayland_client::Connection,
        _qh: &wayland_client::QueueHandle<Self>,
    ) {
        use wayland_client::protocol::wl_keyboard::Event;
        let Some(idx) = seat_index_for(bridge, |s| s.keyboard.as_ref().map(|(_, h)| h).filter(|h| h.id() == proxy.id())) else {
            return;
        };
        let guest_keyboard = bridge.seat_proxies[idx].keyboard.as_ref().unwrap().0.clone();

        match event {
            Event::Keymap { format, fd, size } => {
                guest_keyboard.keymap(format.into_result().unwrap_or(wayland_server::protocol::wl_keyboard::KeymapFormat::NoKeymap), fd, size);
            }
            Event::Enter { serial, surface, keys } => {
                bridge.seat_proxies[idx].record_serial(serial);
                let host_id = surface.id().protocol_id();
                if let Some(guest_surface) = bridge.surfaces.get(&host_id).map(|p| p.guest.clone()) {
                    guest_keyboard.enter(serial, &guest_surface, keys);
                }
            }
            Event::Leave { serial, surface } => {
                let host_id = surface.id().protocol_id();
                if let Some(guest_surface) = bridge.surfaces.get(&host_id).map(|p| p.guest.clone()) {
                    guest_keyboard.leave(serial, &guest_surface);
                }
            }
            Event::Key { serial, time, key, state } => {
                bridge.seat_proxies[idx].record_serial(serial);
                guest_keyboard.key(serial, time, key, state.into_result().unwrap_or(wayland_server::protocol::wl_keyboard::KeyState::Released));
            }
            Event::Modifiers { serial, mods_depressed, mods_latched, mods_locked, group } => {
                guest_keyboard.modifiers(serial, mods_depressed, mods_latched, mods_locked, group);
            }
            Event::RepeatInfo { rate, delay } => {
                guest_keyboard.repeat_info(rate, delay);
            }
            _ => {}
        }
    }
}

impl wayland_client::Dispatch<HostTouch, ()> for Bridge {
    fn event(
        bridge: &mut Self,
        proxy: &HostTouch,
        event: wayland_client::protocol::wl_touch::Event,
        _data: &(),
        _conn: &wayland_client::Connection,
        _qh: &wayland_client::QueueHandle<Self>,
    ) {
        use wayland_client::protocol::wl_touch::Event;
        let Some(idx) = seat_index_for(bridge, |s| s.touch.as_ref().map(|(_, h)| h).filter(|h| h.id() == proxy.id())) else {
            return;
        };
        let guest_touch = bridge.seat_proxies[idx].touch.as_ref().unwrap().0.clone();
        let scale = bridge.effective_scale();

        match event {
            Event::Down { serial, time, surface, id, x, y } => {
                bridge.seat_proxies[idx].record_serial(serial);
                let host_id = surface.id().protocol_id();
                if let Some(guest_surface) = bridge.surfaces.get(&host_id).map(|p| p.guest.clone()) {
                    guest_touch.down(serial, time, &guest_surface, id, x / scale, y / scale);
                }
            }
            Event::Up { serial, time, id } => {
                guest_touch.up(serial, time, id);
            }
            Event::Motion { time, id, x, y } => {
                guest_touch.motion(time, id, x / scale, y / scale);
            }
            Event::Frame => guest_touch.frame(),
            Event::Cancel => guest_touch.cancel(),
            _ => {}
        }
    }
}
