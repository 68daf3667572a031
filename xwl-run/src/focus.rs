//! Focus & restacking controller (C6, §4.6). Grounded on the teacher's
//! `focus.rs::update_keyboard_focus` — the same "compute the window that
//! should have focus, diff it against what currently has focus, only then
//! issue the side effects" shape — generalized here to additionally
//! perform the synchronous X round-trip spec.md §4.6 requires before
//! issuing `SetInputFocus` (the teacher never needs this because smithay's
//! `X11Wm` hides the round-trip inside `X11Surface::set_activated`).

use x11rb::protocol::xproto::Window as XWindow;

use crate::atoms::Atoms;
use crate::error::Result;

/// Resolved per spec.md §3's focus model: a plain optional X window id plus
/// the restack order, rather than the strong `Rc<Window>` the window set
/// itself holds, so a destroyed window clears focus without anyone having
/// to chase a dangling pointer (the weak-reference discipline spec.md
/// calls for).
#[derive(Debug, Default)]
pub struct FocusState {
    pub focused: Option<XWindow>,
    /// Front-to-back stacking order, index 0 is topmost. Maintained
    /// independently of the X server's own stacking (`ConfigureWindow`
    /// with `Sibling`/`StackMode`) so restacks can be computed locally and
    /// applied as one batch of `ConfigureWindow` calls (§4.6).
    pub stack: Vec<XWindow>,
}

impl FocusState {
    pub fn raise_to_front(&mut self, window: XWindow) {
        self.stack.retain(|&w| w != window);
        self.stack.insert(0, window);
    }

    pub fn remove(&mut self, window: XWindow) {
        self.stack.retain(|&w| w != window);
        if self.focused == Some(window) {
            self.focused = None;
        }
    }

    pub fn topmost(&self) -> Option<XWindow> {
        self.stack.first().copied()
    }
}

/// Focus `window`, issuing `WM_TAKE_FOCUS` and `SetInputFocus` in the order
/// spec.md §4.6 demands: a synchronous round-trip (`GetInputFocus`) runs
/// first, so that if the X server already considers `window` focused (a
/// race with a client-initiated `SetInputFocus`) the bridge does not send a
/// redundant `WM_TAKE_FOCUS` client message — mirrors the teacher's own
/// "don't re-notify a window that's already focused" guard in
/// `update_keyboard_focus`, just with an explicit round-trip standing in
/// for smithay's already-synchronized internal state.
pub fn focus_window<C: x11rb::connection::Connection>(
    conn: &C,
    atoms: &Atoms,
    root: XWindow,
    state: &mut FocusState,
    window: XWindow,
    timestamp: u32,
) -> Result<()> {
    use x11rb::protocol::xproto::{ClientMessageEvent, ConnectionExt, InputFocus};

    if state.focused == Some(window) {
        let current = conn.get_input_focus()?.reply()?;
        if current.focus == window {
            return Ok(());
        }
    }

    let event = ClientMessageEvent::new(
        32,
        window,
        atoms.WM_PROTOCOLS,
        [atoms.WM_TAKE_FOCUS, timestamp, 0, 0, 0],
    );
    conn.send_event(false, window, x11rb::protocol::xproto::EventMask::NO_EVENT, event)?;
    conn.set_input_focus(InputFocus::PARENT, window, timestamp)?;
    let _ = root;

    state.focused = Some(window);
    state.raise_to_front(window);
    Ok(())
}

/// §4.6 "restack so the entered surface is on top at the X level": raise the
/// frame belonging to `entered` above every other managed window's frame,
/// push everyone else `Below` it, then force a synchronous round-trip
/// (`GetInputFocus`, chosen because it is the cheapest reply-bearing request
/// that has no side effect of its own) so the stacking is visible to the X
/// renderer before the caller forwards the downstream `enter` event.
pub fn restack_for_enter<C: x11rb::connection::Connection>(
    conn: &C,
    windows: &crate::window::WindowSet,
    entered: XWindow,
) -> Result<()> {
    use x11rb::protocol::xproto::{ConfigureWindowAux, ConnectionExt, StackMode};

    for (&id, window) in windows.windows.iter() {
        let w = window.borrow();
        if w.frame_id == 0 {
            continue;
        }
        let stack_mode = if id == entered { StackMode::ABOVE } else { StackMode::BELOW };
        conn.configure_window(w.frame_id, &ConfigureWindowAux::new().stack_mode(stack_mode))?;
    }
    // Synchronous no-op round-trip: by the time the reply comes back, every
    // `ConfigureWindow` above has taken effect in the server.
    conn.get_input_focus()?.reply()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raise_to_front_dedupes_and_moves() {
        let mut s = FocusState::default();
        s.stack = vec![1, 2, 3];
        s.raise_to_front(2);
        assert_eq!(s.stack, vec![2, 1, 3]);
    }

    #[test]
    fn remove_clears_focus_only_if_it_was_focused() {
        let mut s = FocusState {
            focused: Some(5),
            stack: vec![5, 6],
        };
        s.remove(6);
        assert_eq!(s.focused, Some(5));
        assert_eq!(s.stack, vec![5]);

        s.remove(5);
        assert_eq!(s.focused, None);
        assert!(s.stack.is_empty());
    }

    #[test]
    fn topmost_reflects_last_raise() {
        let mut s = FocusState::default();
        s.stack = vec![1, 2];
        assert_eq!(s.topmost(), Some(1));
        s.raise_to_front(2);
        assert_eq!(s.topmost(), Some(2));
    }
}
