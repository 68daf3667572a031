//! `wl_buffer` relay (§4.3): a guest buffer is always backed by either an
//! `wl_shm_pool`-derived buffer or (when `--drm-device`/`--glamor` is in
//! effect) a dmabuf-derived one; either way the host buffer is created
//! eagerly alongside the guest one so `attach` never has to do more than
//! look up the pair.

use wayland_client::protocol::wl_buffer::WlBuffer as HostBuffer;
use wayland_server::protocol::wl_buffer::WlBuffer as GuestBuffer;

pub struct BufferProxy {
    pub guest: GuestBuffer,
    pub host: HostBuffer,
    pub width: i32,
    pub height: i32,
}

impl BufferProxy {
    pub fn new(guest: GuestBuffer, host: HostBuffer, width: i32, height: i32) -> Self {
        Self {
            guest,
            host,
            width,
            height,
        }
    }

    /// `wl_buffer.release` only ever needs to be relayed guest-ward; the
    /// host is the one telling us the buffer is free again.
    pub fn size(&self) -> crate::geometry::Size {
        crate::geometry::Size::new(self.width, self.height)
    }
}

use wayland_client::Proxy as _;
use wayland_server::{Client, DataInit, Dispatch, DisplayHandle, Resource as _};

use crate::bridge::Bridge;

impl Dispatch<GuestBuffer, ()> for Bridge {
    fn request(
        bridge: &mut Self,
        _client: &Client,
        resource: &GuestBuffer,
        request: wayland_server::protocol::wl_buffer::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
        let wayland_server::protocol::wl_buffer::Request::Destroy = request else { return };
        let guest_id = resource.id().protocol_id();
        if let Some(proxy) = bridge.buffers.remove(&guest_id) {
            proxy.host.destroy();
        }
    }
}

impl wayland_client::Dispatch<HostBuffer, u32> for Bridge {
    fn event(
        bridge: &mut Self,
        _proxy: &HostBuffer,
        event: wayland_client::protocol::wl_buffer::Event,
        data: &u32,
        _conn: &wayland_client::Connection,
        _qh: &wayland_client::QueueHandle<Self>,
    ) {
        let wayland_client::protocol::wl_buffer::Event::Release = event else { return };
        if let Some(proxy) = bridge.buffers.get(data) {
            proxy.guest.release();
        }
    }
}
