pub mod app;
pub mod switch;

pub use switch::{Switch, SwitchBank, SwitchInput, Toggle, Toggles};

/// Snapshot of every indicator light on the front panel.
///
/// `status`, `address` and `data` are the three LED rows driven through the
/// shift register chain; `wait`, `hlda` and `inte` are wired to their own pins.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct Lights {
    pub status: u8,
    pub address: u16,
    pub data: u8,
    pub wait: bool,
    pub hlda: bool,
    pub inte: bool,
}

impl Lights {
    pub const OFF: Lights = Lights::new(0, 0, 0);

    #[inline]
    pub const fn new(status: u8, address: u16, data: u8) -> Lights {
        Lights {
            status,
            address,
            data,
            wait: false,
            hlda: false,
            inte: false,
        }
    }

    /// Bytes in the order they are shifted out to the display device:
    /// status, data, address low, address high.
    #[inline]
    pub const fn frame(&self) -> [u8; 4] {
        let [lo, hi] = self.address.to_le_bytes();
        [self.status, self.data, lo, hi]
    }

    /// True when the panel is not showing a running program, so a frontend
    /// may sleep between updates.
    pub fn is_idle(&self) -> bool {
        self.wait || self.hlda || *self == Lights::OFF
    }
}
