//! Window model & xdg-shell driver (C5, §3, §4.5).
//!
//! A [`Window`] is created the moment the X connection sees a `CreateNotify`
//! for a top-level (override-redirect or not) and is paired with a host
//! surface either by a `WL_SURFACE_ID` client message (the common path) or
//! by `xwl_window_update` scanning `unpaired_windows` when the host surface
//! shows up first — mirrors the two-sided pairing race the teacher's
//! `XwmHandler::map_window_request` / `mapped_override_redirect_window` pair
//! has to resolve for smithay's own X11 surfaces, generalized here because
//! we own both sides of the pairing instead of being handed a pre-paired
//! `X11Surface`.

pub mod config;
pub mod driver;

use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use x11rb::protocol::xproto::Window as XWindow;
use xwl_protocols::aura_shell::client::zaura_surface::ZauraSurface;
use xwl_protocols::xdg_shell_v6::client::zxdg_popup_v6::ZxdgPopupV6;
use xwl_protocols::xdg_shell_v6::client::zxdg_surface_v6::ZxdgSurfaceV6;
use xwl_protocols::xdg_shell_v6::client::zxdg_toplevel_v6::ZxdgToplevelV6;

use crate::geometry::{Point, Rect, Size};
use config::ConfigureState;

bitflags::bitflags! {
    /// Packed boolean state (§3's `unpaired/managed/realized/activated/
    /// decorated/transient_for/size_flags` field group). Kept as one
    /// bitflags value rather than individual `bool` fields because several
    /// of these are mutually exclusive or co-vary (e.g. `MANAGED` implies
    /// `REALIZED` is reachable), matching the teacher's own `WindowState`-
    /// style flag packing in `state.rs`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct WindowFlags: u16 {
        /// No host surface paired yet; lives in `unpaired_windows` instead
        /// of `windows` while this bit is set.
        const UNPAIRED    = 1 << 0;
        /// This bridge has decided to give the window window-manager
        /// treatment (frame window, xdg_toplevel); override-redirect
        /// windows the bridge chooses not to manage never get this bit.
        const MANAGED     = 1 << 1;
        /// The frame window has been mapped and has a live xdg_surface.
        const REALIZED    = 1 << 2;
        const ACTIVATED   = 1 << 3;
        const DECORATED   = 1 << 4;
        const TRANSIENT   = 1 << 5;
        const USPOSITION  = 1 << 6;
        const PPOSITION   = 1 << 7;
    }
}

/// Exactly one of these is present on a managed, realized window — never
/// both (§3 invariant: xdg_popup/xdg_toplevel exclusivity).
#[derive(Debug)]
pub enum Shell {
    Toplevel {
        xdg_surface: ZxdgSurfaceV6,
        xdg_toplevel: ZxdgToplevelV6,
        configure: ConfigureState,
    },
    Popup {
        xdg_surface: ZxdgSurfaceV6,
        xdg_popup: ZxdgPopupV6,
        parent: XWindow,
    },
}

#[derive(Debug, Default)]
pub struct WindowName {
    pub title: Option<String>,
    pub class: Option<String>,
    pub instance: Option<String>,
}

/// A single X top-level, and everything the bridge tracks about its Wayland
/// side (§3 `Window`).
#[derive(Debug)]
pub struct Window {
    pub id: XWindow,
    /// 0 until `MANAGED` is set and a frame window has been created; the
    /// `managed ⇒ frame_id != 0` invariant is upheld by only ever
    /// constructing a `Window` with `MANAGED` already reflecting whether a
    /// frame exists (see [`Window::new_managed`]).
    pub frame_id: XWindow,
    pub host_surface_id: Option<u32>,

    pub geometry: Rect,
    pub border_width: u16,
    pub depth: u8,
    pub flags: WindowFlags,
    pub name: WindowName,

    pub transient_for: Option<XWindow>,
    pub shell: Option<Shell>,
    /// Set only for the implicit aura-shell decoration path (§4.2's
    /// `zaura_shell` global); `None` on hosts that don't advertise it.
    pub aura_surface: Option<ZauraSurface>,

    /// Back-reference to whichever seat last focused this window, used by
    /// the focus controller to invalidate stale focus on destroy without
    /// the window needing to know about the seat's full state (§3: "weak
    /// back-references").
    pub focused_by: Vec<Weak<()>>,
}

impl Window {
    pub fn new_unpaired(id: XWindow, geometry: Rect) -> Self {
        Self {
            id,
            frame_id: 0,
            host_surface_id: None,
            geometry,
            border_width: 0,
            depth: 24,
            flags: WindowFlags::UNPAIRED,
            name: WindowName::default(),
            transient_for: None,
            shell: None,
            aura_surface: None,
            focused_by: Vec::new(),
        }
    }

    pub fn is_unpaired(&self) -> bool {
        self.flags.contains(WindowFlags::UNPAIRED)
    }

    pub fn is_managed(&self) -> bool {
        self.flags.contains(WindowFlags::MANAGED)
    }

    /// Pair this window with a host surface and promote it out of
    /// `unpaired_windows`; does not yet create a frame (that happens on
    /// `MapRequest`, §4.5).
    pub fn pair(&mut self, host_surface_id: u32) {
        self.host_surface_id = Some(host_surface_id);
        self.flags.remove(WindowFlags::UNPAIRED);
    }

    pub fn toplevel_configure_mut(&mut self) -> Option<&mut ConfigureState> {
        match &mut self.shell {
            Some(Shell::Toplevel { configure, .. }) => Some(configure),
            _ => None,
        }
    }
}

/// All windows known to the bridge, split exactly as spec.md §3 describes:
/// unpaired windows are not yet addressable by host surface id, so they
/// live in a side table keyed by X id only.
#[derive(Debug, Default)]
pub struct WindowSet {
    /// Keyed by X window id; holds every window regardless of pairing
    /// state once paired. `IndexMap` (not `HashMap`) so restack operations
    /// that need a stable front-to-back order don't need a second index,
    /// mirroring the teacher's own preference for `indexmap` collections
    /// over raw hashmaps for anything iterated in display order.
    pub windows: IndexMap<XWindow, Rc<std::cell::RefCell<Window>>>,
    pub unpaired_windows: IndexMap<XWindow, Rc<std::cell::RefCell<Window>>>,
    /// Host surface id -> X window id, for the common "host event arrives
    /// first, look up the X window" direction.
    surface_to_window: bimap::BiHashMap<u32, XWindow>,
}

impl WindowSet {
    pub fn insert_unpaired(&mut self, window: Window) {
        let id = window.id;
        self.unpaired_windows
            .insert(id, Rc::new(std::cell::RefCell::new(window)));
    }

    /// `xwl_window_update`: a host surface with a pending `WL_SURFACE_ID`
    /// association resolved. Moves the window from `unpaired_windows` into
    /// `windows` and records the bidirectional lookup.
    pub fn pair(&mut self, id: XWindow, host_surface_id: u32) -> Option<Rc<std::cell::RefCell<Window>>> {
        let entry = self.unpaired_windows.shift_remove(&id)?;
        entry.borrow_mut().pair(host_surface_id);
        self.surface_to_window.insert(host_surface_id, id);
        self.windows.insert(id, entry.clone());
        Some(entry)
    }

    pub fn by_surface(&self, host_surface_id: u32) -> Option<Rc<std::cell::RefCell<Window>>> {
        let id = self.surface_to_window.get_by_left(&host_surface_id)?;
        self.windows.get(id).cloned()
    }

    pub fn by_id(&self, id: XWindow) -> Option<Rc<std::cell::RefCell<Window>>> {
        self.windows
            .get(&id)
            .or_else(|| self.unpaired_windows.get(&id))
            .cloned()
    }

    pub fn remove(&mut self, id: XWindow) {
        self.unpaired_windows.shift_remove(&id);
        if let Some(w) = self.windows.shift_remove(&id) {
            if let Some(surface_id) = w.borrow().host_surface_id {
                self.surface_to_window.remove_by_left(&surface_id);
            }
        }
    }
}

/// Size hints that drive initial placement (§4.5: USPosition/PPosition take
/// precedence over centering).
#[derive(Debug, Clone, Copy, Default)]
pub struct SizeHints {
    pub requested: Option<Point>,
    pub min_size: Option<Size>,
    pub max_size: Option<Size>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_window_is_unpaired_and_unmanaged() {
        let w = Window::new_unpaired(1, Rect::new(0, 0, 100, 100));
        assert!(w.is_unpaired());
        assert!(!w.is_managed());
        assert_eq!(w.frame_id, 0);
    }

    #[test]
    fn pairing_clears_unpaired_flag() {
        let mut w = Window::new_unpaired(1, Rect::new(0, 0, 100, 100));
        w.pair(42);
        assert!(!w.is_unpaired());
        assert_eq!(w.host_surface_id, Some(42));
    }

    #[test]
    fn managed_flag_requires_explicit_opt_in() {
        // `is_managed` only reflects the `MANAGED` bit; setting up a real
        // `Shell::Toplevel` needs a live host connection, so that transition
        // is exercised by `window::driver`'s tests instead.
        let mut w = Window::new_unpaired(1, Rect::new(0, 0, 100, 100));
        w.pair(42);
        assert!(!w.is_managed());
        w.flags.insert(WindowFlags::MANAGED);
        assert!(w.is_managed());
    }

    #[test]
    fn window_set_round_trips_pairing() {
        let mut set = WindowSet::default();
        set.insert_unpaired(Window::new_unpaired(5, Rect::default()));
        assert!(set.by_id(5).is_some());
        assert!(set.by_surface(99).is_none());

        set.pair(5, 99);
        assert!(set.unpaired_windows.get(&5).is_none());
        assert!(set.by_surface(99).is_some());
        assert_eq!(set.by_surface(99).unwrap().borrow().id, 5);
    }

    #[test]
    fn window_set_remove_clears_surface_lookup() {
        let mut set = WindowSet::default();
        set.insert_unpaired(Window::new_unpaired(5, Rect::default()));
        set.pair(5, 99);
        set.remove(5);
        assert!(set.by_id(5).is_none());
        assert!(set.by_surface(99).is_none());
    }
}
