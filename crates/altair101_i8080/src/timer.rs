use std::time::{Duration, Instant};

use anyhow::{ensure, Context, Result};

/// Host lag beyond which the throttle stops trying to catch up.
pub const MAX_THROTTLE_LAG: Duration = Duration::from_millis(100);
/// Period of the timer that drives [`Throttle`].
pub const THROTTLE_PERIOD_US: u32 = 10_000;

#[derive(Clone, Debug)]
struct TimerSlot<E> {
    event: E,
    period: u64,
    expires_at: u64,
    recurring: bool,
    running: bool,
}

/// Software timers counted in emulated cycles.
///
/// Each slot carries an event value that [`CycleTimer::add_cycles`] hands
/// back when the timer fires; the owner dispatches on it.
#[derive(Clone, Debug)]
pub struct CycleTimer<E> {
    clock_hz: u32,
    slots: Vec<Option<TimerSlot<E>>>,
    cycles: u64,
    next_due: u64,
}

impl<E: Copy> CycleTimer<E> {
    pub fn new(clock_hz: u32, max_timers: usize) -> Self {
        Self {
            clock_hz,
            slots: vec![None; max_timers],
            cycles: 0,
            next_due: u64::MAX,
        }
    }

    #[inline]
    pub fn clock_hz(&self) -> u32 {
        self.clock_hz
    }

    /// Total cycles reported so far.
    #[inline]
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    fn us_to_cycles(&self, period_us: u32) -> u64 {
        u64::from(period_us) * u64::from(self.clock_hz) / 1_000_000
    }

    fn slot_mut(&mut self, id: usize) -> Result<&mut TimerSlot<E>> {
        let count = self.slots.len();
        self.slots
            .get_mut(id)
            .with_context(|| format!("timer id {id} out of range (0..{count})"))?
            .as_mut()
            .with_context(|| format!("timer {id} has not been set up"))
    }

    /// Configure slot `id`; the timer starts stopped.
    pub fn setup(&mut self, id: usize, period_us: u32, event: E) -> Result<()> {
        ensure!(
            id < self.slots.len(),
            "timer id {id} out of range (0..{})",
            self.slots.len()
        );
        let period = self.us_to_cycles(period_us);
        ensure!(period > 0, "timer {id}: period of {period_us} us is zero cycles");
        self.slots[id] = Some(TimerSlot {
            event,
            period,
            expires_at: 0,
            recurring: false,
            running: false,
        });
        log::debug!("timer {id}: {period_us} us = {period} cycles");
        Ok(())
    }

    /// Arm a configured timer, optionally with a new period.
    pub fn start(&mut self, id: usize, period_us: Option<u32>, recurring: bool) -> Result<()> {
        let period = match period_us {
            Some(us) => {
                let cycles = self.us_to_cycles(us);
                ensure!(cycles > 0, "timer {id}: period of {us} us is zero cycles");
                Some(cycles)
            }
            None => None,
        };
        let now = self.cycles;
        let slot = self.slot_mut(id)?;
        if let Some(period) = period {
            slot.period = period;
        }
        slot.recurring = recurring;
        slot.running = true;
        slot.expires_at = now + slot.period;
        self.refresh_next_due();
        Ok(())
    }

    pub fn stop(&mut self, id: usize) -> Result<()> {
        self.slot_mut(id)?.running = false;
        self.refresh_next_due();
        Ok(())
    }

    pub fn is_running(&self, id: usize) -> bool {
        matches!(self.slots.get(id), Some(Some(slot)) if slot.running)
    }

    pub fn period_cycles(&self, id: usize) -> Option<u64> {
        self.slots.get(id)?.as_ref().map(|slot| slot.period)
    }

    /// Account for `n` executed cycles and collect the events of every timer
    /// that came due.
    pub fn add_cycles(&mut self, n: u32) -> Vec<E> {
        self.cycles += u64::from(n);
        if self.cycles < self.next_due {
            return Vec::new();
        }

        let now = self.cycles;
        let mut fired = Vec::new();
        for slot in self.slots.iter_mut().flatten() {
            if !slot.running || slot.expires_at > now {
                continue;
            }
            fired.push(slot.event);
            if slot.recurring {
                slot.expires_at += slot.period;
                if slot.expires_at <= now {
                    // Fell more than a period behind; skip the missed ticks.
                    slot.expires_at = now + slot.period;
                }
            } else {
                slot.running = false;
            }
        }
        self.refresh_next_due();
        fired
    }

    fn refresh_next_due(&mut self) {
        self.next_due = self
            .slots
            .iter()
            .flatten()
            .filter(|slot| slot.running)
            .map(|slot| slot.expires_at)
            .min()
            .unwrap_or(u64::MAX);
    }
}

/// Keeps emulated time from running ahead of wall time.
#[derive(Clone, Debug)]
pub struct Throttle {
    clock_hz: u32,
    origin: Instant,
    origin_cycles: u64,
}

impl Throttle {
    pub fn new(clock_hz: u32) -> Self {
        Self::starting_at(clock_hz, Instant::now())
    }

    pub fn starting_at(clock_hz: u32, origin: Instant) -> Self {
        Self {
            clock_hz,
            origin,
            origin_cycles: 0,
        }
    }

    /// Measure from `now` and `total_cycles`, e.g. when a program starts.
    pub fn restart(&mut self, total_cycles: u64, now: Instant) {
        self.origin = now;
        self.origin_cycles = total_cycles;
    }

    /// How long to wait so that `total_cycles` of emulated time have also
    /// passed on the host at `now`.
    ///
    /// Returns `None` when the host is behind. Past [`MAX_THROTTLE_LAG`]
    /// the origin moves to `now` so the emulator does not sprint to catch up.
    pub fn delay_for(&mut self, total_cycles: u64, now: Instant) -> Option<Duration> {
        let elapsed_cycles = total_cycles.saturating_sub(self.origin_cycles);
        let nanos = u128::from(elapsed_cycles) * 1_000_000_000 / u128::from(self.clock_hz.max(1));
        let emulated = Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX));
        let wall = now.saturating_duration_since(self.origin);

        if emulated > wall {
            return Some(emulated - wall);
        }
        if wall - emulated > MAX_THROTTLE_LAG {
            log::debug!("throttle: host {:?} behind, resyncing", wall - emulated);
            self.origin = now;
            self.origin_cycles = total_cycles;
        }
        None
    }

    /// Sleep off any lead emulated time has over the host.
    pub fn pace(&mut self, total_cycles: u64) {
        if let Some(delay) = self.delay_for(total_cycles, Instant::now()) {
            std::thread::sleep(delay);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum Tick {
        Fast,
        Slow,
    }

    #[test]
    fn setup_rejects_bad_ids_and_zero_periods() {
        let mut timer = CycleTimer::new(2_000_000, 2);
        assert!(timer.setup(2, 100, Tick::Fast).is_err());
        assert!(timer.setup(0, 0, Tick::Fast).is_err());
        assert!(timer.start(1, None, true).is_err());
        assert!(timer.setup(0, 100, Tick::Fast).is_ok());
        assert_eq!(timer.period_cycles(0), Some(200));
        assert!(!timer.is_running(0));
    }

    #[test]
    fn recurring_timer_fires_every_period() {
        let mut timer = CycleTimer::new(1_000_000, 1);
        timer.setup(0, 10, Tick::Fast).unwrap();
        timer.start(0, None, true).unwrap();

        assert!(timer.add_cycles(9).is_empty());
        assert_eq!(timer.add_cycles(1), vec![Tick::Fast]);
        assert!(timer.add_cycles(5).is_empty());
        assert_eq!(timer.add_cycles(7), vec![Tick::Fast]);
        assert!(timer.is_running(0));
        assert_eq!(timer.cycles(), 22);
    }

    #[test]
    fn one_shot_timer_stops_after_firing() {
        let mut timer = CycleTimer::new(1_000_000, 2);
        timer.setup(0, 10, Tick::Fast).unwrap();
        timer.setup(1, 20, Tick::Slow).unwrap();
        timer.start(0, None, true).unwrap();
        timer.start(1, None, false).unwrap();

        assert_eq!(timer.add_cycles(20), vec![Tick::Fast, Tick::Slow]);
        assert!(!timer.is_running(1));
        assert_eq!(timer.add_cycles(20), vec![Tick::Fast]);
    }

    #[test]
    fn start_can_change_period() {
        let mut timer = CycleTimer::new(1_000_000, 1);
        timer.setup(0, 10, Tick::Slow).unwrap();
        timer.start(0, Some(3), false).unwrap();
        assert_eq!(timer.period_cycles(0), Some(3));
        assert_eq!(timer.add_cycles(3), vec![Tick::Slow]);
        timer.start(0, None, false).unwrap();
        timer.stop(0).unwrap();
        assert!(timer.add_cycles(100).is_empty());
    }

    #[test]
    fn throttle_waits_when_host_is_ahead() {
        let origin = Instant::now();
        let mut throttle = Throttle::starting_at(2_000_000, origin);
        // 20_000 cycles at 2 MHz is 10 ms of emulated time.
        let delay = throttle.delay_for(20_000, origin + Duration::from_millis(4));
        assert_eq!(delay, Some(Duration::from_millis(6)));
    }

    #[test]
    fn throttle_resyncs_after_large_lag() {
        let origin = Instant::now();
        let mut throttle = Throttle::starting_at(2_000_000, origin);
        let late = origin + Duration::from_millis(500);
        assert_eq!(throttle.delay_for(20_000, late), None);
        // After the resync the next 10 ms of cycles is measured from `late`.
        let delay = throttle.delay_for(40_000, late + Duration::from_millis(2));
        assert_eq!(delay, Some(Duration::from_millis(8)));
    }
}
