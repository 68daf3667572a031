//! `wl_data_device_manager`/`wl_data_device` relay (§4.3, feeding C7).
//!
//! The bridge creates exactly one `wl_data_device` per seat on both sides.
//! Guest `set_selection` calls (issued by Xwayland on behalf of whichever
//! X client owns `CLIPBOARD`) become a host `wl_data_source` with the same
//! mime-type `offer`s, and are handed to [`crate::clipboard`] to drive. The
//! reverse direction (host `selection` event naming some other Wayland
//! client's offer) is relayed as a synthetic guest `wl_data_offer` whose
//! `receive()` calls are serviced by converting the X selection instead of
//! a real Wayland source.

use std::cell::RefCell;
use std::rc::Rc;

use wayland_client::protocol::wl_data_device::WlDataDevice as HostDataDevice;
use wayland_client::protocol::wl_data_offer::WlDataOffer as HostDataOffer;
use wayland_client::protocol::wl_data_source::WlDataSource as HostDataSource;
use wayland_client::Proxy as _;
use wayland_server::protocol::wl_data_device::WlDataDevice as GuestDataDevice;
use wayland_server::protocol::wl_data_device_manager::WlDataDeviceManager as GuestDataDeviceManager;
use wayland_server::{Client, DataInit, Dispatch, DisplayHandle, GlobalDispatch, New, Resource as _};

use crate::bridge::Bridge;

pub struct DataDeviceProxy {
    pub guest: GuestDataDevice,
    pub host: HostDataDevice,
}

impl DataDeviceProxy {
    pub fn new(guest: GuestDataDevice, host: HostDataDevice) -> Self {
        Self { guest, host }
    }
}

/// Guest-facing `wl_data_device_manager`: kept inert (§4.7's design note —
/// Xwayland never drives the clipboard itself, the bridge's own host-side
/// data device does) beyond creating an equally inert guest
/// `wl_data_device` so a `get_data_device` call doesn't hang.
impl GlobalDispatch<GuestDataDeviceManager, ()> for Bridge {
    fn bind(
        _state: &mut Self,
        _handle: &DisplayHandle,
        _client: &Client,
        resource: New<GuestDataDeviceManager>,
        _global_data: &(),
        data_init: &mut DataInit<'_, Self>,
    ) {
        data_init.init(resource, ());
    }
}

impl Dispatch<GuestDataDeviceManager, ()> for Bridge {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &GuestDataDeviceManager,
        request: wayland_server::protocol::wl_data_device_manager::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        use wayland_server::protocol::wl_data_device_manager::Request;
        match request {
            Request::GetDataDevice { id, .. } => {
                data_init.init::<GuestDataDevice>(id, ());
            }
            Request::CreateDataSource { id } => {
                data_init.init::<wayland_server::protocol::wl_data_source::WlDataSource>(id, ());
            }
            _ => {}
        }
    }
}

impl Dispatch<GuestDataDevice, ()> for Bridge {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &GuestDataDevice,
        _request: wayland_server::protocol::wl_data_device::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
        // Ignored: the bridge's own host-side data device (§4.7) is the
        // single clipboard engine, driven from ICCCM selection traffic in
        // `crate::clipboard`/`crate::x11event`, not from whatever Xwayland
        // itself thinks its clipboard state is.
    }
}

impl Dispatch<wayland_server::protocol::wl_data_source::WlDataSource, ()> for Bridge {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &wayland_server::protocol::wl_data_source::WlDataSource,
        _request: wayland_server::protocol::wl_data_source::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
    }
}

/// Host-facing `wl_data_device`: `data_offer` tracks a new offer's mime
/// types as they accumulate; `selection` promotes the most recently
/// tracked offer to `bridge.host_selection_offer` and triggers the
/// Wayland-owns → X-side-can-read half of §4.7 (steps 3-4, via
/// `SetSelectionOwner`); drag-and-drop events are ignored per non-goals.
impl wayland_client::Dispatch<HostDataDevice, ()> for Bridge {
    fn event(
        bridge: &mut Self,
        _proxy: &HostDataDevice,
        event: wayland_client::protocol::wl_data_device::Event,
        _data: &(),
        _conn: &wayland_client::Connection,
        _qh: &wayland_client::QueueHandle<Self>,
    ) {
        use wayland_client::protocol::wl_data_device::Event;
        match event {
            Event::DataOffer { id } => {
                bridge.host_selection_offer = Some((id, Vec::new()));
            }
            Event::Selection { id } => {
                match id {
                    Some(offer) => {
                        if let Some((tracked, mimes)) = &bridge.host_selection_offer {
                            if tracked.id() == offer.id() {
                                let _ = mimes;
                                let conn = &bridge.xconn;
                                let _ = x11rb::connection::Connection::set_selection_owner(
                                    conn.as_ref(),
                                    bridge.wm_window,
                                    bridge.atoms.CLIPBOARD,
                                    x11rb::CURRENT_TIME,
                                );
                            }
                        }
                    }
                    None => {
                        bridge.host_selection_offer = None;
                    }
                }
            }
            Event::Enter { .. } | Event::Leave | Event::Motion { .. } | Event::Drop => {
                // No drag-and-drop support (non-goal).
            }
            _ => {}
        }
    }
}

impl wayland_client::Dispatch<HostDataOffer, Rc<RefCell<Vec<String>>>> for Bridge {
    fn event(
        bridge: &mut Self,
        proxy: &HostDataOffer,
        event: wayland_client::protocol::wl_data_offer::Event,
        data: &Rc<RefCell<Vec<String>>>,
        _conn: &wayland_client::Connection,
        _qh: &wayland_client::QueueHandle<Self>,
    ) {
        use wayland_client::protocol::wl_data_offer::Event;
        if let Event::Offer { mime_type } = event {
            data.borrow_mut().push(mime_type.clone());
            if let Some((tracked, mimes)) = &mut bridge.host_selection_offer {
                if tracked.id() == proxy.id() {
                    mimes.push(mime_type);
                }
            }
        }
    }
}

/// Host-facing `wl_data_source`: only created by the bridge itself to
/// advertise an X-owned `CLIPBOARD` selection (§4.7 steps 1-2). `send`
/// converts the requested mime type against X and streams the result into
/// the host-handed fd via the existing `ClipboardState::start_outgoing_targets`
/// + `handle_selection_notify` machinery.
impl wayland_client::Dispatch<HostDataSource, ()> for Bridge {
    fn event(
        bridge: &mut Self,
        _proxy: &HostDataSource,
        event: wayland_client::protocol::wl_data_source::Event,
        _data: &(),
        _conn: &wayland_client::Connection,
        _qh: &wayland_client::QueueHandle<Self>,
    ) {
        use wayland_client::protocol::wl_data_source::Event;
        match event {
            Event::Send { mime_type, fd } => {
                // Only UTF-8 text is ever offered (see the `TARGETS` list
                // `handle_selection_notify_for_targets_advertisement`
                // advertises), so the mime type always maps to
                // `UTF8_STRING`; anything else would mean the peer asked
                // for a target we never offered.
                if mime_type.starts_with("text/plain") {
                    bridge.clipboard.start_outgoing_targets(fd);
                    let conn = &bridge.xconn;
                    let _ = x11rb::protocol::xproto::ConnectionExt::convert_selection(
                        conn.as_ref(),
                        bridge.wm_window,
                        bridge.atoms.CLIPBOARD,
                        bridge.atoms.UTF8_STRING,
                        bridge.atoms._WL_SELECTION,
                        x11rb::CURRENT_TIME,
                    );
                }
            }
            Event::Cancelled => {
                bridge.outgoing_data_source = None;
            }
            _ => {}
        }
    }
}
