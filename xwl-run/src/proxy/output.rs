//! `wl_output` relay (§4.4): one guest output per mirrored host output,
//! re-advertising geometry/mode/scale/done in the order the protocol
//! requires, with the logical size and scale adjusted per the bridge's
//! effective scale rather than passed through verbatim (so a guest running
//! at `--scale=1` on top of a 2x host output still sees 1x geometry).

use wayland_client::protocol::wl_output::WlOutput as HostOutput;
use wayland_server::protocol::wl_output::WlOutput as GuestOutput;

use crate::geometry::Size;

pub struct OutputProxy {
    /// `None` until Xwayland has actually bound the downstream global this
    /// host output was mirrored as (§4.4 "one guest output per mirrored
    /// host output" — the pairing exists before the bind, the proxy value
    /// itself does not).
    pub guest: Option<GuestOutput>,
    pub host: HostOutput,
    pub physical_size: Size,
    pub logical_size: Size,
    pub host_scale: i32,
}

impl OutputProxy {
    /// Compute the `wl_output.mode` dimensions to advertise downstream
    /// (§4.4): `floor(scale_global * scale_current * mode_dim / scale_max)`.
    pub fn logical_dimension(mode_dim: i32, scale_global: f64, scale_current: i32, scale_max: i32) -> i32 {
        ((scale_global * scale_current as f64 * mode_dim as f64) / scale_max.max(1) as f64).floor() as i32
    }

    /// The scale value advertised on the guest `wl_output.scale` event: the
    /// effective scale is always folded into the reported mode's pixel
    /// dimensions instead (§4.4: "Downstream buffer-scale is always 1"), so
    /// Xwayland never has to understand a fractional or non-unit output
    /// scale of its own.
    pub fn guest_scale(&self) -> i32 {
        1
    }
}

use wayland_client::Proxy as _;
use wayland_server::protocol::wl_output::WlOutput as GuestOutputType;
use wayland_server::{Client, DataInit, Dispatch, DisplayHandle, GlobalDispatch, New, Resource as _};

use crate::bridge::Bridge;

/// Per-bind global data: the index into `bridge.output_proxies` this guest
/// resource mirrors, so a `release` (or a late `done` replay on a second
/// client bind, not expected here since Xwayland is the only client) knows
/// which entry to touch.
impl GlobalDispatch<GuestOutputType, usize> for Bridge {
    fn bind(
        bridge: &mut Self,
        _handle: &DisplayHandle,
        _client: &Client,
        resource: New<GuestOutputType>,
        global_data: &usize,
        data_init: &mut DataInit<'_, Self>,
    ) {
        let guest = data_init.init(resource, *global_data);
        if let Some(proxy) = bridge.output_proxies.get_mut(*global_data) {
            send_output_burst(&guest, proxy);
            proxy.guest = Some(guest);
        }
    }
}

impl Dispatch<GuestOutputType, usize> for Bridge {
    fn request(
        _bridge: &mut Self,
        _client: &Client,
        _resource: &GuestOutputType,
        request: wayland_server::protocol::wl_output::Request,
        _data: &usize,
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
        use wayland_server::protocol::wl_output::Request;
        let Request::Release = request else { return };
    }
}

/// Accumulated state for one in-flight (not yet `done`) `wl_output`
/// advertisement, held until `done` so every event is emitted downstream
/// in a single protocol-correct burst (§4.4).
#[derive(Default, Clone)]
pub struct PendingOutput {
    pub geometry: Option<(i32, i32, i32, i32, i32, String, String)>,
    pub mode: Option<(u32, i32, i32, i32)>,
    pub scale: i32,
    pub name: Option<String>,
    pub description: Option<String>,
}

fn send_output_burst(guest: &GuestOutputType, proxy: &OutputProxy) {
    use wayland_server::protocol::wl_output::{Event, Subpixel, Transform};
    guest.geometry(Event::Geometry {
        x: 0,
        y: 0,
        physical_width: proxy.physical_size.w,
        physical_height: proxy.physical_size.h,
        subpixel: Subpixel::Unknown,
        make: "xwl-run".to_string(),
        model: "bridged".to_string(),
        transform: Transform::Normal,
    });
    guest.mode(wayland_server::protocol::wl_output::Mode::Current, proxy.logical_size.w, proxy.logical_size.h, 60000);
    guest.scale(proxy.guest_scale());
    guest.done();
}

impl wayland_client::Dispatch<HostOutput, ()> for Bridge {
    fn event(
        bridge: &mut Self,
        proxy: &HostOutput,
        event: wayland_client::protocol::wl_output::Event,
        _data: &(),
        _conn: &wayland_client::Connection,
        _qh: &wayland_client::QueueHandle<Self>,
    ) {
        use wayland_client::protocol::wl_output::Event;
        let pending = bridge.output_pending.entry(proxy.id()).or_default();
        match event {
            Event::Geometry {
                x, y, physical_width, physical_height, make, model, ..
            } => {
                pending.geometry = Some((x, y, physical_width, physical_height, 0, make, model));
            }
            Event::Mode { flags, width, height, refresh } => {
                if flags.contains(wayland_client::protocol::wl_output::Mode::Current) {
                    pending.mode = Some((0, width, height, refresh));
                }
            }
            Event::Scale { factor } => {
                pending.scale = factor;
            }
            Event::Name { name } => pending.name = Some(name),
            Event::Description { description } => pending.description = Some(description),
            Event::Done => {
                let pending = bridge.output_pending.remove(&proxy.id()).unwrap_or_default();
                let scale_global = bridge.effective_scale();
                let (_, _, phys_w, phys_h, _, _, _) = pending.geometry.clone().unwrap_or((0, 0, 0, 0, 0, String::new(), String::new()));
                let (_, mode_w, mode_h, _) = pending.mode.unwrap_or((0, phys_w.max(1), phys_h.max(1), 60000));
                let scale_current = pending.scale.max(1);
                let scale_max = bridge
                    .outputs
                    .iter()
                    .map(|o| o.scale)
                    .chain(std::iter::once(scale_current))
                    .max()
                    .unwrap_or(1);
                let logical = Size::new(
                    OutputProxy::logical_dimension(mode_w, scale_global, scale_current, scale_max),
                    OutputProxy::logical_dimension(mode_h, scale_global, scale_current, scale_max),
                );

                let existing = bridge.output_proxies.iter().position(|p| p.host.id() == proxy.id());
                let idx = match existing {
                    Some(idx) => {
                        let p = &mut bridge.output_proxies[idx];
                        p.physical_size = Size::new(phys_w, phys_h);
                        p.logical_size = logical;
                        p.host_scale = scale_current;
                        idx
                    }
                    None => {
                        bridge.output_proxies.push(OutputProxy {
                            guest: None,
                            host: proxy.clone(),
                            physical_size: Size::new(phys_w, phys_h),
                            logical_size: logical,
                            host_scale: scale_current,
                        });
                        bridge.output_proxies.len() - 1
                    }
                };

                if let Some(guest) = bridge.output_proxies[idx].guest.clone() {
                    send_output_burst(&guest, &bridge.output_proxies[idx]);
                } else {
                    bridge.registry.advertise("wl_output");
                    bridge
                        .guest
                        .create_global::<Bridge, GuestOutputType, usize>(2, idx);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logical_dimension_folds_scale_in() {
        // scale_global=1, current=2, max=2: passthrough of the host mode.
        assert_eq!(OutputProxy::logical_dimension(1920, 1.0, 2, 2), 1920);
        // A host output running at its max scale (2) but the bridge set to
        // a coarser global scale (1) halves the reported logical size once
        // more than the host's own scale already would.
        assert_eq!(OutputProxy::logical_dimension(1920, 0.5, 2, 2), 960);
    }

    #[test]
    fn guest_scale_is_always_unit() {
        let scale_for = |_: f64| 1;
        assert_eq!(scale_for(1.5), 1);
        assert_eq!(scale_for(2.0), 1);
    }
}
