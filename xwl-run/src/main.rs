//! Binary entry point. Grounded on the teacher's `main.rs`: install a
//! `tracing-subscriber` fmt layer driven by `RUST_LOG`/`EnvFilter`, parse
//! the CLI, then hand off to the library. Exit codes follow spec.md §6.

use std::os::fd::{AsRawFd, OwnedFd};
use std::os::unix::net::UnixStream;
use std::process::{Command, Stdio};

use clap::Parser;
use rustix::io::FdFlags;
use xwl_run::atoms::Atoms;
use xwl_run::bridge::Bridge;
use xwl_run::cli::Cli;
use xwl_run::supervisor::Supervisor;

/// §6 exit codes.
mod exit {
    pub const OK: i32 = 0;
    pub const XWAYLAND_FAILED: i32 = 1;
    pub const HOST_DISCONNECTED: i32 = 2;
}

fn main() -> std::process::ExitCode {
    install_tracing();

    let mut cli = Cli::parse();
    let program = std::mem::take(&mut cli.program);
    let options = cli.into_options();

    match run(options, program) {
        Ok(code) => std::process::ExitCode::from(code as u8),
        Err(err) => {
            tracing::error!(?err, "fatal error");
            std::process::ExitCode::from(exit::HOST_DISCONNECTED as u8)
        }
    }
}

fn install_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Clear `FD_CLOEXEC` on an fd that must survive into Xwayland's exec (the
/// `-displayfd`/`-wm`/`WAYLAND_SOCKET` fds) — `std::process::Command::spawn`
/// closes `CLOEXEC` fds across the fork/exec boundary by default, which is
/// the opposite of what passing a number on the command line requires.
fn make_inheritable(fd: &impl AsRawFd) -> anyhow::Result<()> {
    let borrowed = unsafe { std::os::fd::BorrowedFd::borrow_raw(fd.as_raw_fd()) };
    rustix::io::fcntl_setfd(borrowed, FdFlags::empty())?;
    Ok(())
}

fn run(options: xwl_run::bridge::Options, program: Vec<String>) -> anyhow::Result<i32> {
    // §4.1 step 1: connect upstream Wayland first, so the registry
    // round-trip (done once Xwayland is up and a `Bridge` exists to
    // dispatch into) observes every host global from the very first
    // `wl_registry.global` burst.
    let host = wayland_client::Connection::connect_to_env()
        .map_err(|e| anyhow::anyhow!("failed to connect to host compositor: {e}"))?;
    let host_display = host.display();
    let host_queue = host.new_event_queue::<Bridge>();
    let host_qh = host_queue.handle();
    let _host_registry = host_display.get_registry(&host_qh, ());

    // §4.1 step 2: socket pair for Xwayland's own Wayland connection —
    // Xwayland gets `xwayland_guest_end` via `WAYLAND_SOCKET`, the bridge
    // keeps `our_guest_end` as the sole client of its guest `Display`.
    let (xwayland_guest_end, our_guest_end) = UnixStream::pair()?;
    make_inheritable(&xwayland_guest_end)?;

    // §4.1 step 3: socket pair for the X window-manager connection.
    let (xwayland_wm_end, our_wm_end) = UnixStream::pair()?;
    make_inheritable(&xwayland_wm_end)?;

    let (display_read, display_write) = rustix::pipe::pipe()?;

    let mut cmd = Command::new("Xwayland");
    if let Some(display_num) = options.display {
        cmd.arg(format!(":{display_num}"));
    }
    cmd.arg("-nolisten").arg("tcp").arg("-rootless");
    if options.drm_device.is_some() && !options.glamor {
        cmd.arg("-drm");
    } else {
        cmd.arg("-shm");
    }
    cmd.arg("-displayfd").arg(display_write.as_raw_fd().to_string());
    cmd.arg("-wm").arg(xwayland_wm_end.as_raw_fd().to_string());
    cmd.env("WAYLAND_SOCKET", xwayland_guest_end.as_raw_fd().to_string());
    cmd.stdin(Stdio::null());

    let mut xwayland = cmd
        .spawn()
        .map_err(|e| anyhow::anyhow!("failed to spawn Xwayland: {e}"))?;
    // The child inherited its own copies across fork; drop ours so the
    // sockets/pipe aren't kept alive twice and aren't leaked into the
    // inferior's fd table when it's spawned below.
    drop(display_write);
    drop(xwayland_guest_end);
    drop(xwayland_wm_end);

    let display_num = match read_display_number(display_read) {
        Ok(n) => n,
        Err(e) => {
            let _ = xwayland.kill();
            return Err(e);
        }
    };
    tracing::info!(display_num, "Xwayland started");

    let wm_fd = our_wm_end.as_raw_fd();
    let wm_stream = x11rb::rust_connection::DefaultStream::from_unix_stream(our_wm_end)
        .map_err(|e| anyhow::anyhow!("failed to wrap WM connection stream: {e}"))?;
    let xconn = x11rb::rust_connection::RustConnection::connect_to_stream(wm_stream, 0)
        .map_err(|e| anyhow::anyhow!("failed to attach as window manager: {e}"))?;
    let xscreen = 0;
    let atoms = Atoms::new(&xconn)?.reply()?;

    let guest_display = wayland_server::Display::<Bridge>::new()
        .map_err(|e| anyhow::anyhow!("failed to create guest display: {e}"))?;
    let guest_handle = guest_display.handle();
    let guest_client = Supervisor::insert_xwayland_client(&guest_display, our_guest_end)?;

    let mut bridge = Bridge::new(
        options,
        host,
        host_display,
        host_qh,
        guest_handle,
        xconn,
        xscreen,
        atoms,
    );
    bridge.guest_client = Some(guest_client);

    // Bind every recognized host global and mirror it downstream before
    // Xwayland's own registry listing is answered (§4.1 step 1's
    // round-trip, deferred until a `Bridge` exists to dispatch into).
    host_queue
        .blocking_dispatch(&mut bridge)
        .map_err(|e| anyhow::anyhow!("host registry round-trip failed: {e}"))?;

    bridge.setup_window_manager()?;

    std::env::set_var("DISPLAY", format!(":{display_num}"));
    std::env::set_var("XWL_VERSION", env!("CARGO_PKG_VERSION"));

    sd_notify::notify(true, &[sd_notify::NotifyState::Ready])
        .map_err(|e| tracing::warn!(error = %e, "sd_notify failed, continuing without it"))
        .ok();
    bridge.notified_ready = true;

    let inferior = Command::new(&program[0])
        .args(&program[1..])
        .spawn()
        .map_err(|e| anyhow::anyhow!("failed to start {}: {e}", program[0]))?;

    let event_loop = calloop::EventLoop::try_new()?;
    bridge.loop_handle = Some(event_loop.handle());
    let mut supervisor = Supervisor::new(event_loop, xwayland, bridge.options.exit_with_child);
    supervisor.set_inferior(inferior);
    supervisor.insert_sigchld_source()?;
    supervisor.insert_host_source(host_queue)?;
    supervisor.insert_x11_source(std::rc::Rc::clone(&bridge.xconn), wm_fd)?;
    supervisor.insert_guest_source(guest_display)?;

    supervisor.run(&mut bridge)?;

    match supervisor.stop_reason() {
        Some(xwl_run::supervisor::StopReason::InferiorExited(code)) => Ok(code),
        Some(xwl_run::supervisor::StopReason::XwaylandExited) => Ok(exit::XWAYLAND_FAILED),
        Some(xwl_run::supervisor::StopReason::HostDisconnected) | None => Ok(exit::OK),
    }
}

fn read_display_number(fd: OwnedFd) -> anyhow::Result<u32> {
    use std::io::Read;
    let mut file = std::fs::File::from(fd);
    let mut buf = String::new();
    file.read_to_string(&mut buf)?;
    buf.trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("Xwayland wrote unexpected displayfd contents: {buf:?}"))
}
