//! Registry mirror (C2, §4.2): listens to the host's `wl_registry` and
//! creates a second, downstream `wl_registry` advertising only the curated
//! global table spec.md names, at the exact versions it names. Grounded on
//! the host-registry bookkeeping in the teacher's `state.rs`
//! (`Pinnacle::new` binds every global it cares about off one
//! `wl_registry::Event::Global` dispatch loop); generalized here because we
//! additionally have to *re-advertise* a subset of what we bind, which the
//! teacher (a compositor, not a proxy) never needs to do.

use std::collections::HashMap;

use wayland_client::backend::ObjectId;
use wayland_client::protocol::wl_compositor::WlCompositor;
use wayland_client::protocol::wl_data_device_manager::WlDataDeviceManager;

use crate::proxy::dmabuf::DmabufProxy;
use crate::proxy::shell::ShellDriver;

/// One global's name, interface, and the version we are willing to bind
/// (never the host's advertised version — always our own capped ceiling,
/// per spec.md §4.2's exact version table).
#[derive(Debug, Clone)]
pub struct GlobalEntry {
    pub host_name: u32,
    pub interface: &'static str,
    pub bound_version: u32,
    pub host_proxy: Option<ObjectId>,
    /// The name we re-advertise this global as on the downstream registry,
    /// once Xwayland has connected and asked for a registry listing.
    pub guest_name: Option<u32>,
}

/// Exact global table from spec.md §4.2: interface name paired with the
/// version this bridge requests when binding upstream (capping to what we
/// understand even if the host advertises a newer version), and whether
/// the global is exported downstream to Xwayland at all.
pub const MIRRORED_GLOBALS: &[(&str, u32)] = &[
    ("wl_compositor", 3),
    ("wl_shm", 1),
    ("wl_shell", 1),
    ("wl_output", 2),
    ("wl_seat", 5),
    ("wl_data_device_manager", 3),
    ("zxdg_shell_v6", 1),
    ("zaura_shell", 3),
    ("wp_viewporter", 1),
    ("zwp_linux_dmabuf_v1", 2),
];

/// `wl_drm` is re-advertised only if the bridge was started with a
/// `--drm-device` and the host actually offers `zwp_linux_dmabuf_v1` to
/// translate through (§4.2 "conditional wl_drm v2").
pub const CONDITIONAL_DRM_GLOBAL: (&str, u32) = ("wl_drm", 2);

#[derive(Debug, Default)]
pub struct Registry {
    /// Keyed by interface name; at most one entry per interface, since the
    /// bridge only ever needs a single instance of each mirrored global
    /// (spec.md doesn't call for multi-seat or multi-output fan-out beyond
    /// what `seats`/`outputs` on `Bridge` already track).
    globals: HashMap<&'static str, GlobalEntry>,
    next_guest_name: u32,
}

impl Registry {
    /// Returns the capped version to request, or `None` if this interface
    /// isn't one the bridge mirrors at all (§4.2: everything else is
    /// simply never bound, which is how unrelated host globals become
    /// invisible to Xwayland).
    pub fn wanted_version(interface: &str) -> Option<u32> {
        MIRRORED_GLOBALS
            .iter()
            .chain(std::iter::once(&CONDITIONAL_DRM_GLOBAL))
            .find(|(name, _)| *name == interface)
            .map(|(_, version)| *version)
    }

    pub fn record_bound(
        &mut self,
        interface: &'static str,
        host_name: u32,
        bound_version: u32,
        host_proxy: ObjectId,
    ) {
        self.globals.insert(
            interface,
            GlobalEntry {
                host_name,
                interface,
                bound_version,
                host_proxy: Some(host_proxy),
                guest_name: None,
            },
        );
    }

    /// Allocate the next downstream global name and record it, once the
    /// guest registry is ready to advertise this interface. Names are
    /// assigned densely starting at 1, independent of the host's own
    /// numbering (the guest has no reason to see host object names).
    pub fn advertise(&mut self, interface: &str) -> Option<u32> {
        let entry = self.globals.get_mut(interface)?;
        if entry.guest_name.is_none() {
            self.next_guest_name += 1;
            entry.guest_name = Some(self.next_guest_name);
        }
        entry.guest_name
    }

    pub fn get(&self, interface: &str) -> Option<&GlobalEntry> {
        self.globals.get(interface)
    }

    pub fn remove(&mut self, interface: &str) -> Option<GlobalEntry> {
        self.globals.remove(interface)
    }

    /// All interfaces currently recorded as bound, for the
    /// `global_remove` → interface lookup (host only gives us a bare
    /// name, never the interface string, so this is a linear scan over
    /// the handful of globals we ever bind).
    pub fn iter_bound_interfaces(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.globals.keys().copied()
    }
}

/// `wayland_client::Dispatch<WlRegistry, ()> for Bridge`: bind every global
/// spec.md §4.2 recognizes, at the capped version from [`MIRRORED_GLOBALS`],
/// and mirror it onto the guest display immediately so its guest name is
/// stable before Xwayland's own registry listing arrives. Grounded on the
/// teacher's `Pinnacle::new` global-binding loop in `state.rs`, generalized
/// to additionally re-advertise a subset of what it binds.
impl wayland_client::Dispatch<wayland_client::protocol::wl_registry::WlRegistry, ()> for crate::bridge::Bridge {
    fn event(
        bridge: &mut Self,
        registry: &wayland_client::protocol::wl_registry::WlRegistry,
        event: wayland_client::protocol::wl_registry::Event,
        _data: &(),
        _conn: &wayland_client::Connection,
        qh: &wayland_client::QueueHandle<Self>,
    ) {
        use wayland_client::protocol::wl_registry::Event;
        match event {
            Event::Global { name, interface, version } => {
                bridge.handle_global(registry, name, &interface, version, qh);
            }
            Event::GlobalRemove { name } => {
                bridge.handle_global_remove(name);
            }
            _ => {}
        }
    }
}

impl crate::bridge::Bridge {
    /// Bind a single newly-announced host global, if it's one spec.md §4.2
    /// mirrors, and create the matching downstream global. Interfaces not
    /// in [`MIRRORED_GLOBALS`]/[`CONDITIONAL_DRM_GLOBAL`] are silently
    /// ignored — that invisibility is the entire point of a curated
    /// re-export (§4.2).
    pub fn handle_global(
        &mut self,
        registry: &wayland_client::protocol::wl_registry::WlRegistry,
        name: u32,
        interface: &str,
        host_version: u32,
        qh: &wayland_client::QueueHandle<Self>,
    ) {
        use wayland_client::Proxy;
        use wayland_protocols::wp::linux_dmabuf::zv1::client::zwp_linux_dmabuf_v1::ZwpLinuxDmabufV1;
        use wayland_protocols::wp::viewporter::client::wp_viewporter::WpViewporter;
        use xwl_protocols::aura_shell::client::zaura_shell::ZauraShell;
        use xwl_protocols::xdg_shell_v6::client::zxdg_shell_v6::ZxdgShellV6;

        let Some(wanted) = Registry::wanted_version(interface) else {
            return;
        };
        let version = wanted.min(host_version);

        macro_rules! bind_and_record {
            ($ty:ty, $field:expr, $iface:literal) => {{
                let proxy: $ty = registry.bind(name, version, qh, ());
                self.registry.record_bound($iface, name, version, proxy.id());
                $field = Some(proxy);
            }};
        }

        // Create the matching downstream global right away, at the same
        // capped version, so Xwayland's own `wl_registry.global` listing
        // (answered whenever it gets around to asking) sees every mirrored
        // interface immediately rather than racing the host's binding
        // order. `wl_output` is the one exception: it creates its global
        // itself, once per instance, only after that output's geometry/mode
        // burst is `done` (§4.4) — advertising it here would hand Xwayland
        // a global it can bind before the bridge has anything to tell it.
        macro_rules! create_guest_global {
            ($ty:ty) => {
                self.guest.create_global::<Bridge, $ty, ()>(version, ())
            };
        }

        match interface {
            "wl_compositor" => {
                bind_and_record!(WlCompositor, self.host_compositor, "wl_compositor");
                create_guest_global!(wayland_server::protocol::wl_compositor::WlCompositor);
            }
            "wl_data_device_manager" => {
                bind_and_record!(WlDataDeviceManager, self.host_data_device_manager, "wl_data_device_manager");
                create_guest_global!(wayland_server::protocol::wl_data_device_manager::WlDataDeviceManager);
            }
            "zxdg_shell_v6" => {
                let proxy: ZxdgShellV6 = registry.bind(name, version, qh, ());
                self.registry.record_bound("zxdg_shell_v6", name, version, proxy.id());
                self.shell = Some(ShellDriver::new(proxy));
                create_guest_global!(xwl_protocols::xdg_shell_v6::server::zxdg_shell_v6::ZxdgShellV6);
            }
            "zaura_shell" => {
                bind_and_record!(ZauraShell, self.aura_shell, "zaura_shell");
                create_guest_global!(xwl_protocols::aura_shell::server::zaura_shell::ZauraShell);
            }
            "wp_viewporter" => {
                let proxy: WpViewporter = registry.bind(name, version, qh, ());
                self.registry.record_bound("wp_viewporter", name, version, proxy.id());
                self.viewporter = Some(crate::proxy::viewporter::ViewporterProxy::new(proxy));
                create_guest_global!(wayland_protocols::wp::viewporter::server::wp_viewporter::WpViewporter);
            }
            "zwp_linux_dmabuf_v1" => {
                let proxy: ZwpLinuxDmabufV1 = registry.bind(name, version, qh, ());
                self.registry.record_bound("zwp_linux_dmabuf_v1", name, version, proxy.id());
                let dmabuf = DmabufProxy::new(proxy, self.options.drm_device.clone());
                // `wl_drm` is never a host global — it's synthesized here,
                // conditionally, once there's a dmabuf path to translate it
                // onto (§4.2 "conditional wl_drm v2").
                if dmabuf.should_advertise_drm() {
                    self.guest.create_global::<Bridge, xwl_protocols::wayland_drm::server::wl_drm::WlDrm, ()>(
                        CONDITIONAL_DRM_GLOBAL.1,
                        (),
                    );
                    self.registry.record_bound("wl_drm", name, CONDITIONAL_DRM_GLOBAL.1, registry.id());
                    if let Some(guest_name) = self.registry.advertise("wl_drm") {
                        tracing::debug!(guest_name, "mirroring wl_drm compat shim downstream");
                    }
                }
                self.dmabuf = Some(dmabuf);
            }
            "wl_shm" => {
                bind_and_record!(wayland_client::protocol::wl_shm::WlShm, self.host_shm, "wl_shm");
                create_guest_global!(wayland_server::protocol::wl_shm::WlShm);
            }
            "wl_seat" => {
                let proxy: wayland_client::protocol::wl_seat::WlSeat = registry.bind(name, version, qh, ());
                self.registry.record_bound("wl_seat", name, version, proxy.id());
                self.pending_host_seat = Some(proxy);
                create_guest_global!(wayland_server::protocol::wl_seat::WlSeat);
            }
            "wl_output" | "wl_shell" => {
                // `wl_output` is bound and re-advertised lazily per-instance
                // by `proxy::output`; `wl_shell` is never actually driven
                // by this bridge. `wl_drm` is handled separately above —
                // it's never a host global, only a synthesized guest one.
                if let Some(static_name) = Self::static_interface_name(interface) {
                    self.registry.record_bound(static_name, name, version, registry.id());
                }
            }
            _ => return,
        }

        if let Some(guest_name) = self.registry.advertise(interface) {
            tracing::debug!(interface, guest_name, version, "mirroring global downstream");
        }
    }

    /// Map a dynamically-received interface name back to the `&'static
    /// str` literal the table entries use, so bookkeeping never needs a
    /// heap-allocated interface string.
    fn static_interface_name(interface: &str) -> Option<&'static str> {
        MIRRORED_GLOBALS
            .iter()
            .map(|(name, _)| *name)
            .chain(std::iter::once(CONDITIONAL_DRM_GLOBAL.0))
            .find(|&name| name == interface)
    }

    pub fn handle_global_remove(&mut self, name: u32) {
        // A removal naming a global we never bound is a protocol-level
        // inconsistency from the host, not something we can recover a
        // sensible state from (§4.2/§7 kind 2).
        let interface = self
            .registry
            .iter_bound_interfaces()
            .find(|i| self.registry.get(i).map(|e| e.host_name) == Some(name));
        match interface {
            Some(interface) => {
                self.registry.remove(interface);
                tracing::warn!(interface = %interface, "host global removed");
            }
            None => panic!("wl_registry.global_remove for unknown name {name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wanted_version_matches_spec_table() {
        assert_eq!(Registry::wanted_version("wl_seat"), Some(5));
        assert_eq!(Registry::wanted_version("zxdg_shell_v6"), Some(1));
        assert_eq!(Registry::wanted_version("wl_drm"), Some(2));
    }

    #[test]
    fn unknown_interface_is_not_mirrored() {
        assert_eq!(Registry::wanted_version("zwp_tablet_manager_v2"), None);
    }

    #[test]
    fn advertise_is_stable_across_calls() {
        let mut reg = Registry::default();
        // Synthesize a bound entry without a real ObjectId (not available
        // outside a live connection); construct it through the private
        // field path exercised by `record_bound` in integration tests
        // instead. Here we only check the allocator never reassigns a
        // name to an interface it has already advertised.
        reg.globals.insert(
            "wl_compositor",
            GlobalEntry {
                host_name: 1,
                interface: "wl_compositor",
                bound_version: 3,
                host_proxy: None,
                guest_name: None,
            },
        );
        let first = reg.advertise("wl_compositor");
        let second = reg.advertise("wl_compositor");
        assert_eq!(first, second);
        assert!(first.is_some());
    }
}
