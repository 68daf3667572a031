//! The X11-protocol half of the clipboard bridge (C7, §4.7): answers
//! `SelectionRequest` when some X client wants the `CLIPBOARD` contents we
//! are (transiently) the owner of, and drives the `ConvertSelection` →
//! `SelectionNotify` → (optional `INCR` property chain) sequence when the
//! bridge itself is the requestor, i.e. the host's Wayland clipboard wants
//! to read the X side's selection. Grounded on the teacher's own ICCCM
//! selection-owner bookkeeping in `handlers/xwayland.rs` (`new_selection`/
//! `send_selection`), generalized to the full `INCR` chunking protocol that
//! smithay's `X11Wm` abstraction already hides from the teacher.

use std::os::unix::io::OwnedFd;

use calloop::generic::Generic;
use calloop::{Interest, Mode, PostAction};
use x11rb::connection::Connection as _;
use x11rb::protocol::xfixes::SelectionNotifyEvent as XfixesSelectionNotifyEvent;
use x11rb::protocol::xproto::{
    self, AtomEnum, ChangeWindowAttributesAux, ConnectionExt as _, EventMask, PropMode,
    SelectionNotifyEvent,
};

use super::{write_chunked_fd, IncomingTransfer, OutgoingTransfer, INCR_CHUNK_SIZE};
use crate::bridge::Bridge;
use crate::error::{BridgeError, Result};

/// `SelectionRequest` (§4.7): some X client, acting through Xwayland, asked
/// the bridge (as `CLIPBOARD` owner) for the selection in `e.target`.
/// `TARGETS`/`TIMESTAMP` are answered synchronously; `UTF8_STRING`/`TEXT`
/// kick off [`start_incoming_receive`] and defer the `SelectionNotify`
/// until the host offer's data has actually arrived. Everything else (and
/// any request while another incoming transfer is already in flight, §4.7
/// "only one transfer per direction is in flight at a time") is refused by
/// setting `property` to `None` on the reply, per ICCCM 2.6.2.
pub fn handle_selection_request(bridge: &mut Bridge, e: &xproto::SelectionRequestEvent) -> Result<()> {
    if e.selection == bridge.atoms.CLIPBOARD {
        let atoms = &bridge.atoms;
        if e.target == atoms.TARGETS {
            let targets = [atoms.TARGETS, atoms.TIMESTAMP, atoms.UTF8_STRING, atoms.TEXT];
            bridge
                .xconn
                .change_property32(PropMode::REPLACE, e.requestor, e.property, AtomEnum::ATOM, &targets)?;
            return send_selection_notify(bridge, e.requestor, e.selection, e.target, e.time, e.property);
        }
        if e.target == atoms.TIMESTAMP {
            bridge
                .xconn
                .change_property32(PropMode::REPLACE, e.requestor, e.property, AtomEnum::INTEGER, &[e.time])?;
            return send_selection_notify(bridge, e.requestor, e.selection, e.target, e.time, e.property);
        }
        if (e.target == atoms.UTF8_STRING || e.target == atoms.TEXT) && bridge.clipboard.incoming.is_none() {
            if start_incoming_receive(bridge, e)? {
                // The reply is sent once the host offer's data lands
                // (directly, or as the first `INCR` property) —
                // `finalize_incoming_receive` below.
                return Ok(());
            }
        }
    }
    send_selection_notify(bridge, e.requestor, e.selection, e.target, e.time, x11rb::NONE)
}

fn send_selection_notify(
    bridge: &Bridge,
    requestor: xproto::Window,
    selection: xproto::Atom,
    target: xproto::Atom,
    time: xproto::Timestamp,
    property: xproto::Atom,
) -> Result<()> {
    let notify = SelectionNotifyEvent {
        response_type: xproto::SELECTION_NOTIFY_EVENT,
        sequence: 0,
        time,
        requestor,
        selection,
        target,
        property,
    };
    bridge.xconn.send_event(false, requestor, xproto::EventMask::NO_EVENT, notify)?;
    Ok(())
}

/// Opens a pipe, asks the host's current selection offer to `receive()`
/// the only mime type this bridge ever offers into its write end, and
/// registers a calloop source draining the read end into
/// [`IncomingTransfer::Receiving::buffer`] (§4.7: "open a pipe; call
/// `wl_data_offer.receive(mime, write_end)`; accumulate reads into a
/// buffer"). Returns `Ok(true)` once a transfer has actually been started
/// (the caller must not reply synchronously), `Ok(false)` if there is no
/// host offer — or no loop handle yet — to read from, in which case the
/// caller falls through to the ICCCM refusal.
fn start_incoming_receive(bridge: &mut Bridge, e: &xproto::SelectionRequestEvent) -> Result<bool> {
    let Some((offer, mimes)) = &bridge.host_selection_offer else {
        return Ok(false);
    };
    let Some(mime) = mimes.iter().find(|m| m.starts_with("text/plain")).cloned() else {
        return Ok(false);
    };
    let Some(loop_handle) = bridge.loop_handle.clone() else {
        return Ok(false);
    };

    let (read_fd, write_fd) =
        rustix::pipe::pipe().map_err(|err| BridgeError::ClipboardTransfer(err.into()))?;
    offer.receive(mime, write_fd);

    let requestor = e.requestor;
    let property = e.property;
    bridge
        .clipboard
        .start_incoming_receiving(requestor, property, e.selection, e.target, e.time);

    let inserted = loop_handle.insert_source(
        Generic::new(read_fd, Interest::READ, Mode::Level),
        move |_readiness, file, bridge: &mut Bridge| read_incoming_chunk(bridge, file, requestor, property),
    );
    if inserted.is_err() {
        bridge.clipboard.finish_incoming();
        return Ok(false);
    }
    Ok(true)
}

/// Calloop callback for the pipe registered by [`start_incoming_receive`]:
/// append whatever is available to the in-flight transfer's buffer, or
/// finalize it on EOF. Removes itself (`PostAction::Remove`) once the
/// transfer this fd belonged to is no longer the current one (e.g. it was
/// cancelled) or has finished.
fn read_incoming_chunk(
    bridge: &mut Bridge,
    file: &mut OwnedFd,
    requestor: xproto::Window,
    property: xproto::Atom,
) -> std::io::Result<PostAction> {
    let current = matches!(
        &bridge.clipboard.incoming,
        Some(IncomingTransfer::Receiving { requestor: r, property: p, .. })
            if *r == requestor && *p == property
    );
    if !current {
        return Ok(PostAction::Remove);
    }

    let mut buf = [0u8; 16 * 1024];
    let n = rustix::io::read(&*file, &mut buf).map_err(std::io::Error::from)?;
    if n == 0 {
        finalize_incoming_receive(bridge).map_err(std::io::Error::other)?;
        return Ok(PostAction::Remove);
    }

    if let Some(IncomingTransfer::Receiving { buffer, .. }) = &mut bridge.clipboard.incoming {
        buffer.extend_from_slice(&buf[..n]);
    }
    Ok(PostAction::Continue)
}

/// All of the host offer's data has been read (§4.7): either write it into
/// the requestor's property directly and reply, or — past
/// `INCR_CHUNK_SIZE` — switch to `INCR` and reply pointing at the
/// now-`INCR`-typed property, handing the rest of the transfer to
/// [`handle_property_delete`].
fn finalize_incoming_receive(bridge: &mut Bridge) -> Result<()> {
    let Some(IncomingTransfer::Receiving { requestor, property, selection, target, time, buffer }) =
        bridge.clipboard.incoming.take()
    else {
        return Ok(());
    };

    if buffer.len() > INCR_CHUNK_SIZE {
        if let Err(err) = start_incr_send(bridge, requestor, property, &buffer) {
            tracing::warn!(?err, "failed to start INCR clipboard send");
            return send_selection_notify(bridge, requestor, selection, target, time, x11rb::NONE);
        }
        bridge.clipboard.incoming = Some(IncomingTransfer::SendingIncr { requestor, property, buffer, sent: 0 });
        return send_selection_notify(bridge, requestor, selection, target, time, property);
    }

    let written = bridge.xconn.change_property8(
        PropMode::REPLACE,
        requestor,
        property,
        bridge.atoms.UTF8_STRING,
        &buffer,
    );
    let reply_property = if written.is_ok() { property } else { x11rb::NONE };
    written?;
    send_selection_notify(bridge, requestor, selection, target, time, reply_property)
}

/// Marks the property `INCR`-typed with the (approximate) total size, and
/// starts watching the requestor window for the `PropertyNotify` deletes
/// that drive each subsequent chunk (ICCCM requires the *sender* to select
/// `PropertyChange` on the requestor, since it doesn't own that window).
fn start_incr_send(bridge: &Bridge, requestor: xproto::Window, property: xproto::Atom, buffer: &[u8]) -> Result<()> {
    bridge
        .xconn
        .change_window_attributes(requestor, &ChangeWindowAttributesAux::new().event_mask(EventMask::PROPERTY_CHANGE))?;
    bridge.xconn.change_property32(
        PropMode::REPLACE,
        requestor,
        property,
        bridge.atoms.INCR,
        &[buffer.len() as u32],
    )?;
    Ok(())
}

/// `PropertyNotify(state=Deleted)` on a window the bridge is mid-`INCR`-send
/// to (§4.7): the requestor consumed the previous chunk, so append the next
/// one, or — once `sent` has caught up with the buffer — write the
/// zero-length chunk that signals end-of-data and finish.
pub fn handle_property_delete(bridge: &mut Bridge, window: xproto::Window, atom: xproto::Atom) -> Result<()> {
    let current = matches!(
        &bridge.clipboard.incoming,
        Some(IncomingTransfer::SendingIncr { requestor, property, .. })
            if *requestor == window && *property == atom
    );
    if !current {
        return Ok(());
    }
    let Some(IncomingTransfer::SendingIncr { requestor, property, buffer, sent }) = &bridge.clipboard.incoming else {
        return Ok(());
    };
    let (requestor, property, sent) = (*requestor, *property, *sent);
    let done = sent >= buffer.len();
    let chunk: Vec<u8> = if done {
        Vec::new()
    } else {
        let end = (sent + INCR_CHUNK_SIZE).min(buffer.len());
        buffer[sent..end].to_vec()
    };
    let chunk_len = chunk.len();

    bridge
        .xconn
        .change_property8(PropMode::REPLACE, requestor, property, bridge.atoms.UTF8_STRING, &chunk)?;

    if done {
        bridge.clipboard.finish_incoming();
    } else if let Some(IncomingTransfer::SendingIncr { sent, .. }) = &mut bridge.clipboard.incoming {
        *sent += chunk_len;
    }
    Ok(())
}

/// `SelectionClear` handled `handle_selection_clear` already covers the
/// owner-ship-lost case at the `x11event` layer.
///
/// `SelectionNotify` (§4.7): the reply to a `ConvertSelection` the bridge
/// itself issued as the requestor, on behalf of the host's Wayland
/// clipboard wanting to read the X `CLIPBOARD`. Only meaningful while
/// [`crate::clipboard::ClipboardState::outgoing`] is `AwaitingTargets`;
/// anything else is a stray reply to a conversion nobody is waiting on.
pub fn handle_selection_notify(bridge: &mut Bridge, e: &xproto::SelectionNotifyEvent) -> Result<()> {
    if !matches!(bridge.clipboard.outgoing, Some(OutgoingTransfer::AwaitingTargets { .. })) {
        return Ok(());
    }
    if e.property == x11rb::NONE {
        // The owner refused the conversion outright.
        bridge.clipboard.finish_outgoing();
        return Ok(());
    }

    let conn = &bridge.xconn;
    let reply = conn
        .get_property(false, e.requestor, e.property, AtomEnum::ANY, 0, u32::MAX)?
        .reply()?;

    if reply.type_ == bridge.atoms.INCR {
        // ICCCM `INCR`: this first property only carries the (ignored)
        // expected size. Delete it to tell the owner to start appending
        // chunks, each announced by a `PropertyNotify`.
        conn.delete_property(e.requestor, e.property)?;
        if let Some(OutgoingTransfer::AwaitingTargets { fd }) = bridge.clipboard.outgoing.take() {
            bridge.clipboard.outgoing = Some(OutgoingTransfer::AwaitingData { fd, received: 0 });
        }
        return Ok(());
    }

    if let Some(OutgoingTransfer::AwaitingTargets { fd }) = bridge.clipboard.outgoing.take() {
        write_chunked_fd(&fd, &reply.value)?;
    }
    conn.delete_property(e.requestor, e.property)?;
    bridge.clipboard.finish_outgoing();
    Ok(())
}

/// `PropertyNotify` with `state == NewValue` on the bridge's own selection
/// window, while an `INCR` transfer is in flight (§4.7): read the newly
/// appended chunk and forward it, or finish on the zero-length property
/// that signals `INCR` end-of-data.
pub fn handle_property_notify(bridge: &mut Bridge, window: xproto::Window, atom: xproto::Atom) -> Result<()> {
    if !matches!(bridge.clipboard.outgoing, Some(OutgoingTransfer::AwaitingData { .. })) {
        return Ok(());
    }
    let conn = &bridge.xconn;
    let reply = conn
        .get_property(false, window, atom, AtomEnum::ANY, 0, u32::MAX)?
        .reply()?;

    if reply.value.is_empty() {
        conn.delete_property(window, atom)?;
        bridge.clipboard.finish_outgoing();
        return Ok(());
    }

    if let Some(OutgoingTransfer::AwaitingData { fd, received }) = &mut bridge.clipboard.outgoing {
        let n = write_chunked_fd(fd, &reply.value)?;
        *received += n;
    }
    conn.delete_property(window, atom)?;
    Ok(())
}

/// XFIXES `SelectionNotify` (ownership changed, §4.7 steps 1-2): when some
/// other X client (not the bridge's own `wm_window`) takes ownership of
/// `CLIPBOARD`, ask it for `TARGETS` so the mime-type list can be turned
/// into a host `wl_data_source` advertisement once the reply lands in
/// `handle_selection_notify_for_targets_advertisement` below. When the
/// owner becomes `None` (cleared), the bridge's advertised source, if any,
/// is cancelled the same way a real client would drop its own selection.
pub fn handle_xfixes_selection_notify(
    bridge: &mut Bridge,
    e: &XfixesSelectionNotifyEvent,
) -> Result<()> {
    if e.selection != bridge.atoms.CLIPBOARD {
        return Ok(());
    }
    if e.owner == bridge.wm_window {
        // We just became the owner ourselves (§4.7 step 3-4's reverse
        // direction, driven by `handle_selection_notify` instead); nothing
        // to convert.
        return Ok(());
    }
    if e.owner == x11rb::NONE {
        bridge.outgoing_data_source = None;
        return Ok(());
    }

    let conn = &bridge.xconn;
    conn.convert_selection(
        bridge.wm_window,
        bridge.atoms.CLIPBOARD,
        bridge.atoms.TARGETS,
        bridge.atoms._WL_SELECTION,
        e.timestamp,
    )?;
    Ok(())
}

/// The `SelectionNotify` reply to the `_WL_SELECTION`-targeted conversion
/// `handle_xfixes_selection_notify` just issued: turn the returned atom
/// list into mime-type strings and create a host `wl_data_source`
/// advertising them, so Wayland peers see the X-owned clipboard as a
/// normal offer (§4.7 steps 1-2). Distinguished from the outgoing-transfer
/// `handle_selection_notify` above by its target/property, which names
/// `_WL_SELECTION` rather than the per-transfer property the bridge
/// allocates for itself.
pub fn handle_selection_notify_for_targets_advertisement(
    bridge: &mut Bridge,
    e: &xproto::SelectionNotifyEvent,
) -> Result<()> {
    if e.property != bridge.atoms._WL_SELECTION || e.target != bridge.atoms.TARGETS {
        return Ok(());
    }
    let conn = &bridge.xconn;
    let reply = conn
        .get_property(false, e.requestor, e.property, AtomEnum::ATOM, 0, u32::MAX)?
        .reply()?;
    conn.delete_property(e.requestor, e.property)?;

    let atoms: Vec<xproto::Atom> = reply
        .value32()
        .map(|iter| iter.collect())
        .unwrap_or_default();
    let mut mimes = Vec::new();
    for atom in atoms {
        if atom == bridge.atoms.UTF8_STRING || atom == bridge.atoms.TEXT {
            mimes.push("text/plain;charset=utf-8".to_string());
        }
    }
    if mimes.is_empty() {
        return Ok(());
    }

    let Some(manager) = &bridge.host_data_device_manager else {
        return Ok(());
    };
    let Some(device) = &bridge.host_data_device else {
        return Ok(());
    };
    let source = manager.create_data_source(&bridge.host_qh, ());
    for mime in &mimes {
        source.offer(mime.clone());
    }
    device.set_selection(Some(&source), 0);
    bridge.outgoing_data_source = Some(source);
    Ok(())
}
