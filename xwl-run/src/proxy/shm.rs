//! `wl_shm`/`wl_shm_pool` relay (§4.3): the guest's pool fd is re-used
//! directly as the host pool's fd (both sides mmap the same memory — the
//! bridge never copies pixel data for the shm path, only for the dmabuf
//! compatibility shim in [`super::dmabuf`] where no better option exists).

use std::os::unix::io::OwnedFd;

use wayland_client::protocol::wl_shm_pool::WlShmPool as HostPool;
use wayland_server::protocol::wl_shm_pool::WlShmPool as GuestPool;

pub struct ShmPoolProxy {
    pub guest: GuestPool,
    pub host: HostPool,
    /// Kept alive for the lifetime of the pool; `wl_shm.create_pool`'s fd
    /// argument is consumed by the host proxy's constructor but the guest
    /// side needs to remember the size for `resize` validation.
    pub fd: OwnedFd,
    pub size: i32,
}

impl ShmPoolProxy {
    pub fn new(guest: GuestPool, host: HostPool, fd: OwnedFd, size: i32) -> Self {
        Self { guest, host, fd, size }
    }
}

use wayland_client::protocol::wl_shm::WlShm as HostShm;
use wayland_client::Proxy as _;
use wayland_server::protocol::wl_buffer::WlBuffer as GuestBuffer;
use wayland_server::protocol::wl_shm::WlShm as GuestShm;
use wayland_server::{Client, DataInit, Dispatch, DisplayHandle, GlobalDispatch, New, Resource as _};

use crate::bridge::Bridge;
use crate::proxy::buffer::BufferProxy;

impl GlobalDispatch<GuestShm, ()> for Bridge {
    fn bind(
        bridge: &mut Self,
        _handle: &DisplayHandle,
        _client: &Client,
        resource: New<GuestShm>,
        _global_data: &(),
        data_init: &mut DataInit<'_, Self>,
    ) {
        let guest = data_init.init(resource, ());
        for format in &bridge.shm_formats {
            guest.format(*format);
        }
    }
}

impl Dispatch<GuestShm, ()> for Bridge {
    fn request(
        bridge: &mut Self,
        _client: &Client,
        _resource: &GuestShm,
        request: wayland_server::protocol::wl_shm::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        let wayland_server::protocol::wl_shm::Request::CreatePool { id, fd, size } = request else {
            return;
        };
        let Some(shm) = bridge.host_shm.clone() else {
            tracing::warn!("wl_shm.create_pool with no host wl_shm bound");
            return;
        };
        let guest = data_init.init(id, ());
        let guest_id = guest.id().protocol_id();
        // The host pool needs its own fd (wayland-client's constructor
        // takes ownership and hands it across the wire); `dup` so the
        // guest-side proxy can keep one too for `resize` bookkeeping.
        let host_fd = rustix::io::fcntl_dupfd_cloexec(&fd, 0).unwrap_or_else(|_| fd.try_clone().expect("dup pool fd"));
        let host = shm.create_pool(host_fd, size, &bridge.host_qh, ());
        bridge.shm_pools.insert(guest_id, ShmPoolProxy::new(guest, host, fd, size));
    }
}

impl Dispatch<GuestPool, ()> for Bridge {
    fn request(
        bridge: &mut Self,
        _client: &Client,
        resource: &GuestPool,
        request: wayland_server::protocol::wl_shm_pool::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        use wayland_server::protocol::wl_shm_pool::Request;
        let guest_id = resource.id().protocol_id();
        match request {
            Request::CreateBuffer {
                id,
                offset,
                width,
                height,
                stride,
                format,
            } => {
                let Some(pool) = bridge.shm_pools.get(&guest_id) else { return };
                let guest_buffer = data_init.init(id, ());
                let buffer_guest_id = guest_buffer.id().protocol_id();
                let host_buffer =
                    pool.host.create_buffer(offset, width, height, stride, format, &bridge.host_qh, buffer_guest_id);
                bridge
                    .buffers
                    .insert(buffer_guest_id, BufferProxy::new(guest_buffer, host_buffer, width, height));
            }
            Request::Resize { size } => {
                if let Some(pool) = bridge.shm_pools.get_mut(&guest_id) {
                    pool.host.resize(size);
                    pool.size = size;
                }
            }
            Request::Destroy => {
                if let Some(pool) = bridge.shm_pools.remove(&guest_id) {
                    pool.host.destroy();
                }
            }
            _ => {}
        }
    }
}

impl wayland_client::Dispatch<HostShm, ()> for Bridge {
    fn event(
        bridge: &mut Self,
        _proxy: &HostShm,
        event: wayland_client::protocol::wl_shm::Event,
        _data: &(),
        _conn: &wayland_client::Connection,
        _qh: &wayland_client::QueueHandle<Self>,
    ) {
        let wayland_client::protocol::wl_shm::Event::Format { format } = event else { return };
        if let wayland_client::WEnum::Value(format) = format {
            if !bridge.shm_formats.contains(&format) {
                bridge.shm_formats.push(format);
            }
        }
    }
}

impl wayland_client::Dispatch<HostPool, ()> for Bridge {
    fn event(
        _bridge: &mut Self,
        _proxy: &HostPool,
        event: wayland_client::protocol::wl_shm_pool::Event,
        _data: &(),
        _conn: &wayland_client::Connection,
        _qh: &wayland_client::QueueHandle<Self>,
    ) {
        match event {}
    }
}
