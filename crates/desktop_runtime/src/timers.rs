//! Timer state machines for click and hover disambiguation.
//!
//! All timing is expressed as deadlines against an injected clock and driven
//! by explicit tick actions, so tests never wait on the wall clock.

/// Window within which a second press counts as a double click.
pub const DOUBLE_CLICK_WINDOW_MS: u64 = 250;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// Per-launcher single/double click arbiter.
///
/// `Idle -> PendingSingle -> {single fired, double fired}`; a second press
/// before the deadline cancels the pending single and fires a double.
pub enum ClickArbiter {
    /// No press outstanding.
    #[default]
    Idle,
    /// One press seen; fires as a single at `deadline` unless pressed again.
    PendingSingle {
        /// When the pending single fires.
        deadline: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Result of feeding a press into the arbiter.
pub enum PressOutcome {
    /// First press; the single fires later unless a second press arrives.
    Pending,
    /// Second press within the window.
    Double,
}

impl ClickArbiter {
    /// Feeds a press at `now`.
    pub fn press(&mut self, now: u64) -> PressOutcome {
        match *self {
            Self::PendingSingle { deadline } if now < deadline => {
                *self = Self::Idle;
                PressOutcome::Double
            }
            _ => {
                *self = Self::PendingSingle {
                    deadline: now + DOUBLE_CLICK_WINDOW_MS,
                };
                PressOutcome::Pending
            }
        }
    }

    /// Advances to `now`, returning whether a pending single click fired.
    pub fn fire(&mut self, now: u64) -> bool {
        match *self {
            Self::PendingSingle { deadline } if now >= deadline => {
                *self = Self::Idle;
                true
            }
            _ => false,
        }
    }

    /// Returns whether the arbiter holds no pending press.
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn two_presses_inside_window_fire_a_double() {
        let mut arbiter = ClickArbiter::default();
        assert_eq!(arbiter.press(1_000), PressOutcome::Pending);
        assert_eq!(arbiter.press(1_100), PressOutcome::Double);
        assert!(arbiter.is_idle());
        assert!(!arbiter.fire(2_000));
    }

    #[test]
    fn lone_press_fires_single_after_deadline() {
        let mut arbiter = ClickArbiter::default();
        arbiter.press(1_000);
        assert!(!arbiter.fire(1_249));
        assert!(arbiter.fire(1_250));
        assert!(arbiter.is_idle());
    }

    #[test]
    fn press_after_expiry_starts_a_new_pending_single() {
        let mut arbiter = ClickArbiter::default();
        arbiter.press(1_000);
        assert_eq!(arbiter.press(1_300), PressOutcome::Pending);
        assert!(arbiter.fire(1_550));
    }
}
