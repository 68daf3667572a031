//! Scale-aware coordinate math (C9).
//!
//! Every coordinate that crosses the host/guest boundary is scaled exactly
//! once, in exactly one direction. The `Host`/`Guest` marker types on
//! [`Scaled`] make it a type error to add a host-space value to a
//! guest-space one without going through [`Scaled::to_guest`] /
//! [`Scaled::to_host`] first (DESIGN NOTES: "Introduce a `Scaled<T>`
//! wrapper so host-space and guest-space coordinates cannot be accidentally
//! mixed").

use std::marker::PhantomData;

/// The guest side: the rootless X server and its clients. Coordinates here
/// are what X windows see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Guest;

/// The host side: the Wayland compositor being proxied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Host;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scaled<Space> {
    pub value: i32,
    _space: PhantomData<Space>,
}

impl<Space> Scaled<Space> {
    pub fn new(value: i32) -> Self {
        Self {
            value,
            _space: PhantomData,
        }
    }
}

impl Scaled<Guest> {
    /// `to_host(x) = x / scale`, not rounded at the call site — callers
    /// floor or ceil depending on what the value is used for (position vs.
    /// size), per spec.md §4.8.
    pub fn to_host_f64(self, scale: f64) -> f64 {
        self.value as f64 / scale
    }

    pub fn to_host_floor(self, scale: f64) -> Scaled<Host> {
        Scaled::new(self.to_host_f64(scale).floor() as i32)
    }

    pub fn to_host_ceil(self, scale: f64) -> Scaled<Host> {
        Scaled::new(self.to_host_f64(scale).ceil() as i32)
    }
}

impl Scaled<Host> {
    /// `to_guest(x) = x * scale`.
    pub fn to_guest_f64(self, scale: f64) -> f64 {
        self.value as f64 * scale
    }

    pub fn to_guest_round(self, scale: f64) -> Scaled<Guest> {
        Scaled::new(self.to_guest_f64(scale).round() as i32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub w: i32,
    pub h: i32,
}

impl Size {
    pub fn new(w: i32, h: i32) -> Self {
        Self { w, h }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub loc: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self {
            loc: Point::new(x, y),
            size: Size::new(w, h),
        }
    }
}

/// Floor a guest-space position coordinate into host space: `x / scale`,
/// used for `wl_surface.attach`'s `x`/`y` arguments.
pub fn attach_offset_to_host(x: i32, scale: f64) -> i32 {
    Scaled::<Guest>::new(x).to_host_floor(scale).value
}

/// Ceil of `contents / scale`, used for viewport destination size (§4.3,
/// §4.8) and for zero-sized buffers (edge case: a zero content size yields
/// a zero destination and is not "set", per spec.md §8 boundaries).
pub fn viewport_destination(contents: i32, scale: f64) -> i32 {
    Scaled::<Guest>::new(contents).to_host_ceil(scale).value
}

/// The damage-rect outset used by `wl_surface.damage` forwarding (§4.3,
/// §4.8): "outset-by-one enclosing rect after scaling, to absorb
/// filtering." Operates in guest (downstream) coordinates, producing a host
/// (upstream) rectangle.
///
/// `x1 = (x-1)/scale` (floored), `x2 = ceil((x+w+1)/scale)`, matching
/// spec.md exactly; same for y.
pub fn damage_outset(rect: Rect, scale: f64) -> Rect {
    let x1 = Scaled::<Guest>::new(rect.loc.x - 1).to_host_floor(scale).value;
    let y1 = Scaled::<Guest>::new(rect.loc.y - 1).to_host_floor(scale).value;
    let x2 = Scaled::<Guest>::new(rect.loc.x + rect.size.w + 1)
        .to_host_ceil(scale)
        .value;
    let y2 = Scaled::<Guest>::new(rect.loc.y + rect.size.h + 1)
        .to_host_ceil(scale)
        .value;

    Rect::new(x1, y1, x2 - x1, y2 - y1)
}

/// When viewporter is unavailable the effective scale is coerced up to the
/// next integer at startup (§4.8), since whole-number `wl_surface.set_buffer_scale`
/// is the only fallback available.
pub fn coerce_scale_without_viewporter(scale: f64) -> f64 {
    scale.ceil()
}

/// Clamp a managed window's geometry so it never exceeds the screen (§4.5,
/// tested invariant in §8).
pub fn clamp_to_screen(mut rect: Rect, screen: Size) -> Rect {
    rect.size.w = rect.size.w.min(screen.w).max(1);
    rect.size.h = rect.size.h.min(screen.h).max(1);
    rect.loc.x = rect.loc.x.clamp(0, (screen.w - rect.size.w).max(0));
    rect.loc.y = rect.loc.y.clamp(0, (screen.h - rect.size.h).max(0));
    rect
}

/// Center `size` within `screen`, used when neither `USPosition` nor
/// `PPosition` size hints are set (§4.5).
pub fn center_on_screen(size: Size, screen: Size) -> Point {
    Point::new((screen.w - size.w) / 2, (screen.h - size.h) / 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn scale_one_is_identity() {
        let r = Rect::new(10, 20, 100, 50);
        assert_eq!(attach_offset_to_host(10, 1.0), 10);
        assert_eq!(viewport_destination(100, 1.0), 100);
        // Damage outset at scale 1 still grows by one pixel on each side
        // (the "outset" is unconditional, scale-independent at scale 1).
        let d = damage_outset(r, 1.0);
        assert_eq!(d, Rect::new(9, 19, 102, 52));
    }

    #[test]
    fn zero_sized_buffer_has_zero_destination() {
        assert_eq!(viewport_destination(0, 2.0), 0);
    }

    #[test]
    fn scale_two_halves_offsets() {
        assert_eq!(attach_offset_to_host(100, 2.0), 50);
        assert_eq!(viewport_destination(401, 2.0), 201); // ceil(401/2)
    }

    #[test]
    fn coerce_rounds_up() {
        assert_eq!(coerce_scale_without_viewporter(1.25), 2.0);
        assert_eq!(coerce_scale_without_viewporter(2.0), 2.0);
    }

    #[test]
    fn clamp_shrinks_oversized_window() {
        let r = Rect::new(-10, -10, 5000, 5000);
        let clamped = clamp_to_screen(r, Size::new(1920, 1080));
        assert!(clamped.size.w <= 1920 && clamped.size.h <= 1080);
        assert!(clamped.loc.x >= 0 && clamped.loc.y >= 0);
    }

    #[test]
    fn center_is_symmetric() {
        let p = center_on_screen(Size::new(640, 480), Size::new(1920, 1080));
        assert_eq!(p, Point::new(640, 300));
    }

    proptest! {
        #[test]
        fn damage_outset_always_contains_scaled_input(
            x in -2000i32..2000, y in -2000i32..2000,
            w in 1i32..2000, h in 1i32..2000,
            scale in 1i32..4,
        ) {
            let scale = scale as f64;
            let rect = Rect::new(x, y, w, h);
            let outset = damage_outset(rect, scale);

            let inner_x1 = attach_offset_to_host(x, scale);
            let inner_y1 = attach_offset_to_host(y, scale);

            prop_assert!(outset.loc.x <= inner_x1);
            prop_assert!(outset.loc.y <= inner_y1);
            prop_assert!(outset.size.w >= 0);
            prop_assert!(outset.size.h >= 0);
        }

        #[test]
        fn clamp_never_exceeds_screen(
            x in -5000i32..5000, y in -5000i32..5000,
            w in 1i32..10000, h in 1i32..10000,
        ) {
            let screen = Size::new(1920, 1080);
            let clamped = clamp_to_screen(Rect::new(x, y, w, h), screen);
            prop_assert!(clamped.size.w <= screen.w);
            prop_assert!(clamped.size.h <= screen.h);
            prop_assert!(clamped.loc.x + clamped.size.w <= screen.w);
            prop_assert!(clamped.loc.y + clamped.size.h <= screen.h);
        }
    }
}
