//! The xdg-configure state machine for a single window (§4.5, DESIGN NOTES
//! "Pending-config state machine"). Modeled as an explicit three-state enum
//! rather than the teacher's raw `serial`/`pending` pair of fields, so the
//! only place `ack_configure` can be called is [`ConfigureState::try_ack`].

use crate::geometry::Size;

/// The X-side values and EWMH state atoms a single xdg `configure` implies,
/// derived from the staged toplevel `width`/`height`/`states` (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfigureDesc {
    /// Guest-space (already scaled) size, or `None` if the compositor left
    /// width/height at 0 (client picks its own size).
    pub size: Option<Size>,
    pub fullscreen: bool,
    pub maximized: bool,
    pub activated: bool,
}

/// `Idle`: no configure in flight. `Staged`: a configure was received from
/// the host but not yet applied to the X side (waiting for the end of the
/// current event-loop iteration, per §5's ordering guarantee). `Awaiting`:
/// applied to the X side (a `ConfigureNotify`/property change was sent) and
/// waiting for a buffer `attach` whose size matches before `ack_configure`
/// can be sent.
#[derive(Debug, Clone, Default)]
pub enum ConfigureState {
    #[default]
    Idle,
    Staged {
        serial: u32,
        desc: ConfigureDesc,
    },
    Awaiting {
        serial: u32,
        desc: ConfigureDesc,
        /// A second configure arrived while still awaiting the ack for the
        /// first; staged here and applied once the first is acked or
        /// dropped.
        next: Option<(u32, ConfigureDesc)>,
    },
}

impl ConfigureState {
    /// A `zxdg_surface_v6.configure(serial)` arrived. If nothing is
    /// outstanding, stage it directly; if something is already `Awaiting`
    /// ack, queue it as `next` (§4.5: "If no pending ack is outstanding...
    /// move pending := next").
    pub fn on_host_configure(&mut self, serial: u32, desc: ConfigureDesc) {
        match self {
            ConfigureState::Idle => {
                *self = ConfigureState::Staged { serial, desc };
            }
            ConfigureState::Staged { .. } => {
                // A second configure before the first was even applied to
                // the X side: the newer one wins, matching "apply the
                // staged configure" semantics — there is nothing to ack
                // yet so there is no ordering hazard.
                *self = ConfigureState::Staged { serial, desc };
            }
            ConfigureState::Awaiting { next, .. } => {
                *next = Some((serial, desc));
            }
        }
    }

    /// Called once per event-loop iteration (§5) to move a `Staged`
    /// configure to `Awaiting` after its X-side effects (ConfigureNotify /
    /// `_NET_WM_STATE`) have been applied by the caller.
    pub fn take_staged(&mut self) -> Option<(u32, ConfigureDesc)> {
        if let ConfigureState::Staged { serial, desc } = *self {
            *self = ConfigureState::Awaiting {
                serial,
                desc,
                next: None,
            };
            Some((serial, desc))
        } else {
            None
        }
    }

    /// A buffer `attach` landed; if we're `Awaiting` and the attached
    /// contents size (including border×2, per §4.5) matches what we asked
    /// for, returns the serial to ack and transitions to `Idle` or to the
    /// queued `next` configure (staged, not yet applied).
    pub fn try_ack(&mut self, contents: Size) -> Option<u32> {
        let ConfigureState::Awaiting { serial, desc, next } = self else {
            return None;
        };

        let matches = match desc.size {
            Some(expected) => expected == contents,
            // No explicit size was requested (client picks its own size):
            // any nonzero attach satisfies it.
            None => contents.w > 0 && contents.h > 0,
        };

        if !matches {
            return None;
        }

        let acked_serial = *serial;
        match next.take() {
            Some((next_serial, next_desc)) => {
                *self = ConfigureState::Staged {
                    serial: next_serial,
                    desc: next_desc,
                };
            }
            None => *self = ConfigureState::Idle,
        }

        Some(acked_serial)
    }

    /// The X client issued a conflicting `ConfigureRequest`: per §4.5,
    /// "ack both pending and next and drop them — the client's size takes
    /// precedence." Returns the serials that must be acked (in order).
    pub fn drop_for_client_resize(&mut self) -> Vec<u32> {
        let acked = match std::mem::take(self) {
            ConfigureState::Idle => vec![],
            ConfigureState::Staged { serial, .. } => vec![serial],
            ConfigureState::Awaiting { serial, next, .. } => {
                let mut v = vec![serial];
                if let Some((next_serial, _)) = next {
                    v.push(next_serial);
                }
                v
            }
        };
        *self = ConfigureState::Idle;
        acked
    }

    pub fn is_awaiting(&self) -> bool {
        matches!(self, ConfigureState::Awaiting { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(w: i32, h: i32) -> ConfigureDesc {
        ConfigureDesc {
            size: Some(Size::new(w, h)),
            ..Default::default()
        }
    }

    #[test]
    fn idle_stages_then_awaits_then_acks() {
        let mut s = ConfigureState::Idle;
        s.on_host_configure(42, desc(400, 200));
        assert!(matches!(s, ConfigureState::Staged { serial: 42, .. }));

        let staged = s.take_staged();
        assert_eq!(staged, Some((42, desc(400, 200))));
        assert!(s.is_awaiting());

        // Wrong size: no ack yet.
        assert_eq!(s.try_ack(Size::new(100, 100)), None);
        // Matching size: ack fires and we return to idle.
        assert_eq!(s.try_ack(Size::new(400, 200)), Some(42));
        assert!(matches!(s, ConfigureState::Idle));
    }

    #[test]
    fn second_configure_while_awaiting_queues_as_next() {
        let mut s = ConfigureState::Idle;
        s.on_host_configure(1, desc(100, 100));
        s.take_staged();
        s.on_host_configure(2, desc(200, 200));

        assert!(matches!(
            s,
            ConfigureState::Awaiting { serial: 1, next: Some((2, _)), .. }
        ));

        assert_eq!(s.try_ack(Size::new(100, 100)), Some(1));
        // Next configure applied (now staged), not yet awaiting.
        assert!(matches!(s, ConfigureState::Staged { serial: 2, .. }));
    }

    #[test]
    fn client_resize_drops_both_pending_and_next() {
        let mut s = ConfigureState::Idle;
        s.on_host_configure(1, desc(100, 100));
        s.take_staged();
        s.on_host_configure(2, desc(200, 200));

        let acked = s.drop_for_client_resize();
        assert_eq!(acked, vec![1, 2]);
        assert!(matches!(s, ConfigureState::Idle));
    }

    #[test]
    fn idempotent_double_ack_is_a_noop() {
        let mut s = ConfigureState::Idle;
        s.on_host_configure(1, desc(100, 100));
        s.take_staged();
        assert_eq!(s.try_ack(Size::new(100, 100)), Some(1));
        // Already idle: nothing to ack.
        assert_eq!(s.try_ack(Size::new(100, 100)), None);
    }
}
