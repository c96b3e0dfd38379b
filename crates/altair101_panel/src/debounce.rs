use std::time::{Duration, Instant};

use altair101_common::{Switch, SwitchInput};

/// How long the operator has to flip CLEAR a second time.
pub const CLEAR_CONFIRM_WINDOW: Duration = Duration::from_millis(1000);

/// Turns raw switch levels into release edges.
///
/// A switch fires once when it is let go, never while it is held, so a
/// bouncing contact or a long press still counts as one action.
#[derive(Clone, Debug, Default)]
pub struct SwitchDebouncer {
    latched: [bool; Switch::COUNT],
}

impl SwitchDebouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw reading; returns `true` on the release edge.
    pub fn update(&mut self, switch: Switch, pressed: bool) -> bool {
        let latch = &mut self.latched[switch.index()];
        match (pressed, *latch) {
            (true, false) => {
                *latch = true;
                false
            }
            (false, true) => {
                *latch = false;
                true
            }
            _ => false,
        }
    }

    /// Read every switch once and return the ones that were just released,
    /// in panel order.
    pub fn poll(&mut self, input: &mut impl SwitchInput) -> Vec<Switch> {
        Switch::ALL
            .into_iter()
            .filter(|&switch| {
                let pressed = input.is_pressed(switch);
                self.update(switch, pressed)
            })
            .collect()
    }

}

/// Two-release confirmation with a deadline, used for CLEAR.
///
/// The first release arms the window, a second one inside it confirms.
/// Nothing blocks while waiting: a window that lapsed is simply re-armed by
/// the next release.
#[derive(Clone, Debug)]
pub struct ConfirmWindow {
    window: Duration,
    armed_at: Option<Instant>,
}

impl Default for ConfirmWindow {
    fn default() -> Self {
        Self::new(CLEAR_CONFIRM_WINDOW)
    }
}

impl ConfirmWindow {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            armed_at: None,
        }
    }

    /// Register a release at `now`; `true` means confirmed.
    pub fn release(&mut self, now: Instant) -> bool {
        if let Some(armed_at) = self.armed_at.take() {
            if now.saturating_duration_since(armed_at) <= self.window {
                return true;
            }
            log::debug!("confirmation window lapsed, re-arming");
        }
        self.armed_at = Some(now);
        false
    }

    /// Forget a pending first release.
    pub fn cancel(&mut self) {
        self.armed_at = None;
    }
}
