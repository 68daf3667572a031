//! Exercises the registry mirror's global-filtering contract (C2, §4.2)
//! against a real `wayland-server` display and `wayland-client` connection
//! joined by a socketpair, rather than mocking either side — grounded on
//! the teacher's `tests/integration/common/client.rs`, which drives its
//! compositor through a real `wayland-client::Connection::from_socket`
//! instead of a fake protocol implementation.
//!
//! This only exercises [`xwl_run::registry::Registry::wanted_version`]'s
//! filtering decision, not the full bridge dispatch pipeline (not yet
//! wired into a live `Bridge` in this crate): it proves that a
//! `wl_registry::Global` advertisement for an interface outside spec.md
//! §4.2's table is correctly recognized as "don't mirror" and one inside
//! it is recognized as "mirror at this capped version."

use std::os::unix::net::UnixStream;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use wayland_client::protocol::wl_registry::{self, WlRegistry};
use wayland_client::{Connection, Dispatch, QueueHandle};
use wayland_server::backend::GlobalId;
use wayland_server::protocol::wl_compositor::WlCompositor;
use wayland_server::protocol::wl_output::WlOutput;
use wayland_server::protocol::wl_seat::WlSeat;
use wayland_server::{Display, GlobalDispatch, New};

use xwl_run::registry::Registry;

struct DummyGuestState;

macro_rules! delegate_global_noop {
    ($iface:ty) => {
        impl GlobalDispatch<$iface, ()> for DummyGuestState {
            fn bind(
                _state: &mut Self,
                _handle: &wayland_server::DisplayHandle,
                _client: &wayland_server::Client,
                resource: New<$iface>,
                _global_data: &(),
                data_init: &mut wayland_server::DataInit<'_, Self>,
            ) {
                data_init.init(resource, ());
            }
        }
        impl wayland_server::Dispatch<$iface, ()> for DummyGuestState {
            fn request(
                _state: &mut Self,
                _client: &wayland_server::Client,
                _resource: &$iface,
                _request: <$iface as wayland_server::Resource>::Request,
                _data: &(),
                _dhandle: &wayland_server::DisplayHandle,
                _data_init: &mut wayland_server::DataInit<'_, Self>,
            ) {
            }
        }
    };
}

delegate_global_noop!(WlCompositor);
delegate_global_noop!(WlOutput);
delegate_global_noop!(WlSeat);

struct GuestClientState;
impl wayland_server::backend::ClientData for GuestClientState {
    fn initialized(&self, _client_id: wayland_server::backend::ClientId) {}
    fn disconnected(
        &self,
        _client_id: wayland_server::backend::ClientId,
        _reason: wayland_server::backend::DisconnectReason,
    ) {
    }
}

#[test]
fn registry_only_advertises_mirrored_interfaces() {
    let mut display = Display::<DummyGuestState>::new().expect("create display");
    let dh = display.handle();

    // Advertise three globals server-side: two that spec.md §4.2 mirrors
    // (wl_compositor, wl_seat) and one that it doesn't (wl_output is
    // actually mirrored too, so swap in a non-mirrored stand-in by only
    // checking the version cap logic on names, not by omitting a global
    // wholesale — the filtering under test happens on the *bridge* side,
    // this harness just needs something real to advertise).
    let _compositor_global: GlobalId = dh.create_global::<DummyGuestState, WlCompositor, _>(3, ());
    let _seat_global: GlobalId = dh.create_global::<DummyGuestState, WlSeat, _>(5, ());

    let (client_sock, server_sock) = UnixStream::pair().expect("socketpair");
    server_sock.set_nonblocking(true).unwrap();
    client_sock.set_nonblocking(true).unwrap();

    dh.insert_client(server_sock, Arc::new(GuestClientState))
        .expect("insert client");

    let conn = Connection::from_socket(client_sock).expect("client connect");
    let mut event_queue = conn.new_event_queue::<ClientState>();
    let qh = event_queue.handle();
    let _registry = conn.display().get_registry(&qh, ());

    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut client_state = ClientState {
        seen: seen.clone(),
    };

    let mut guest_state = DummyGuestState;

    // Pump both sides a few times; a real calloop-driven bridge would do
    // this continuously, but a fixed number of rounds is enough for two
    // globals to cross a loopback socketpair in a test.
    for _ in 0..10 {
        display.dispatch_clients(&mut guest_state).ok();
        display.flush_clients().ok();
        conn.flush().ok();
        let _ = event_queue.dispatch_pending(&mut client_state);
        std::thread::sleep(Duration::from_millis(5));
    }

    let seen = seen.lock().unwrap();
    assert!(
        seen.iter().any(|i: &String| i == "wl_compositor"),
        "expected wl_compositor to be observed by the client, got {seen:?}"
    );
    assert!(
        seen.iter().any(|i: &String| i == "wl_seat"),
        "expected wl_seat to be observed by the client, got {seen:?}"
    );

    // The interfaces that actually crossed the wire are exactly the ones
    // spec.md §4.2 mirrors, at a version the registry's own table allows.
    for interface in seen.iter() {
        assert!(
            Registry::wanted_version(interface).is_some(),
            "{interface} crossed the wire but isn't in the mirrored-globals table"
        );
    }

    // An interface nowhere in the pack's protocol list is never mirrored.
    assert_eq!(Registry::wanted_version("zwp_tablet_manager_v2"), None);
}

struct ClientState {
    seen: Arc<Mutex<Vec<String>>>,
}

impl Dispatch<WlRegistry, ()> for ClientState {
    fn event(
        state: &mut Self,
        _registry: &WlRegistry,
        event: <WlRegistry as wayland_client::Proxy>::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        if let wl_registry::Event::Global { interface, .. } = event {
            state.seen.lock().unwrap().push(interface);
        }
    }
}
