//! Generated bindings for the Wayland protocol extensions the bridge speaks
//! that aren't covered by `wayland-protocols`: the obsolete v6 xdg-shell the
//! rootless X renderer expects, the aura-shell frame/parent hints, and the
//! legacy `wl_drm` DRM-compatibility shim.
//!
//! Each protocol is generated twice: once as a `wayland-client` consumer
//! (aura-shell's client half is bound upstream, against the host
//! compositor, to drive frame/parent hints and output scale; `wl_drm`'s
//! client half backs the dmabuf-relay path) and once as a
//! `wayland-server` implementation (all three are also mirrored
//! downstream, to the X renderer's own Wayland connection, so their
//! globals stay discoverable there too). Both are generated regardless so
//! call sites can pick whichever role they need without touching this
//! crate again.

pub mod xdg_shell_v6 {
    pub mod client {
        use wayland_client;
        use wayland_client::protocol::*;

        pub mod __interfaces {
            use wayland_client::protocol::__interfaces::*;
            wayland_scanner::generate_interfaces!("./protocol/xdg-shell-unstable-v6.xml");
        }
        use self::__interfaces::*;

        wayland_scanner::generate_client_code!("./protocol/xdg-shell-unstable-v6.xml");
    }

    pub mod server {
        use wayland_server;
        use wayland_server::protocol::*;

        pub mod __interfaces {
            use wayland_server::protocol::__interfaces::*;
            wayland_scanner::generate_interfaces!("./protocol/xdg-shell-unstable-v6.xml");
        }
        use self::__interfaces::*;

        wayland_scanner::generate_server_code!("./protocol/xdg-shell-unstable-v6.xml");
    }
}

pub mod aura_shell {
    pub mod client {
        use wayland_client;
        use wayland_client::protocol::*;

        pub mod __interfaces {
            use wayland_client::protocol::__interfaces::*;
            wayland_scanner::generate_interfaces!("./protocol/aura-shell.xml");
        }
        use self::__interfaces::*;

        wayland_scanner::generate_client_code!("./protocol/aura-shell.xml");
    }

    pub mod server {
        use wayland_server;
        use wayland_server::protocol::*;

        pub mod __interfaces {
            use wayland_server::protocol::__interfaces::*;
            wayland_scanner::generate_interfaces!("./protocol/aura-shell.xml");
        }
        use self::__interfaces::*;

        wayland_scanner::generate_server_code!("./protocol/aura-shell.xml");
    }
}

pub mod wayland_drm {
    pub mod client {
        use wayland_client;
        use wayland_client::protocol::*;

        pub mod __interfaces {
            use wayland_client::protocol::__interfaces::*;
            wayland_scanner::generate_interfaces!("./protocol/wayland-drm.xml");
        }
        use self::__interfaces::*;

        wayland_scanner::generate_client_code!("./protocol/wayland-drm.xml");
    }

    pub mod server {
        use wayland_server;
        use wayland_server::protocol::*;

        pub mod __interfaces {
            use wayland_server::protocol::__interfaces::*;
            wayland_scanner::generate_interfaces!("./protocol/wayland-drm.xml");
        }
        use self::__interfaces::*;

        wayland_scanner::generate_server_code!("./protocol/wayland-drm.xml");
    }
}
