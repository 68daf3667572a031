//! Atom & protocol constants table (C8).
//!
//! `x11rb::atom_manager!` interns every atom in one round-trip and hands
//! back a plain struct of [`x11rb::protocol::xproto::Atom`] values — this
//! sidesteps the "self-referential union" pitfall spec.md's DESIGN NOTES
//! calls out (the source's atom struct is reused first for the atom name,
//! then for the pending `InternAtom` cookie, then for the resolved value):
//! here there is no overlap, the cookie is a temporary local and the atoms
//! struct only ever holds resolved [`Atom`] values.

use x11rb::atom_manager;

atom_manager! {
    /// All atoms interned at connect time (spec.md §6).
    pub Atoms: AtomsCookie {
        WM_S0,
        WM_PROTOCOLS,
        WM_STATE,
        WM_DELETE_WINDOW,
        WM_TAKE_FOCUS,
        WL_SURFACE_ID,
        UTF8_STRING,
        _MOTIF_WM_HINTS,
        _NET_FRAME_EXTENTS,
        _NET_SUPPORTING_WM_CHECK,
        _NET_WM_NAME,
        _NET_WM_MOVERESIZE,
        _NET_WM_STATE,
        _NET_WM_STATE_FULLSCREEN,
        _NET_WM_STATE_MAXIMIZED_VERT,
        _NET_WM_STATE_MAXIMIZED_HORZ,
        CLIPBOARD,
        CLIPBOARD_MANAGER,
        TARGETS,
        TIMESTAMP,
        TEXT,
        INCR,
        _WL_SELECTION,
    }
}

/// `WM_STATE` property values (ICCCM 4.1.3.1). Only the two states the
/// bridge ever sets are named; `Iconic` is not produced by this bridge
/// (no minimize support) but is kept so a reader can see the full legal
/// range of the property we're writing into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum WmState {
    Withdrawn = 0,
    Normal = 1,
    Iconic = 3,
}

/// `_NET_WM_MOVERESIZE` direction constants (EWMH), used only to decode the
/// client message the X renderer sends when its client starts an
/// interactive move/resize; the bridge does not support resize-from-edge
/// grabs itself (the X renderer's clients drive their own resize via
/// `ConfigureRequest`), so only `MOVE` is consumed.
pub const NET_WM_MOVERESIZE_MOVE: u32 = 8;

/// Caption height, in *logical* (scale == 1) pixels, used to size the
/// `_NET_FRAME_EXTENTS` top inset for decorated windows (§4.5). Taken from
/// `original_source/xwl.c`'s default decoration height.
pub const CAPTION_HEIGHT: i32 = 32;
