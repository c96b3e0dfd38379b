/// Momentary control switches on the front panel.
///
/// The variants follow the two PCF8574 expanders the panel is wired to: the
/// control bank (STOP .. RESET) and the aux bank (STEP-DOWN .. AUX2 down).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Switch {
    Stop,
    Run,
    Step,
    Examine,
    ExamineNext,
    Deposit,
    DepositNext,
    Reset,
    StepDown,
    Clear,
    Protect,
    Unprotect,
    Aux1Up,
    Aux1Down,
    Aux2Up,
    Aux2Down,
}

/// Which I/O expander a switch is read from.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SwitchBank {
    Control,
    Aux,
}

impl Switch {
    pub const COUNT: usize = 16;

    pub const ALL: [Switch; Switch::COUNT] = [
        Switch::Stop,
        Switch::Run,
        Switch::Step,
        Switch::Examine,
        Switch::ExamineNext,
        Switch::Deposit,
        Switch::DepositNext,
        Switch::Reset,
        Switch::StepDown,
        Switch::Clear,
        Switch::Protect,
        Switch::Unprotect,
        Switch::Aux1Up,
        Switch::Aux1Down,
        Switch::Aux2Up,
        Switch::Aux2Down,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn bank(self) -> SwitchBank {
        match self {
            Switch::Stop
            | Switch::Run
            | Switch::Step
            | Switch::Examine
            | Switch::ExamineNext
            | Switch::Deposit
            | Switch::DepositNext
            | Switch::Reset => SwitchBank::Control,
            _ => SwitchBank::Aux,
        }
    }

    /// Expander pin the switch pulls low when pressed.
    pub const fn pin(self) -> u8 {
        match self {
            Switch::Stop => 7,
            Switch::Run => 6,
            Switch::Step => 5,
            Switch::Examine => 4,
            Switch::ExamineNext => 3,
            Switch::Deposit => 2,
            Switch::DepositNext => 1,
            Switch::Reset => 0,
            Switch::StepDown => 7,
            Switch::Clear => 6,
            Switch::Protect => 5,
            Switch::Unprotect => 4,
            Switch::Aux1Up => 3,
            Switch::Aux1Down => 2,
            Switch::Aux2Up => 1,
            Switch::Aux2Down => 0,
        }
    }
}

/// A single on/off toggle, identified by its bank and bit number.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Toggle {
    /// Address toggle A0..A15.
    Address(u8),
    /// Data toggle D0..D7.
    Data(u8),
    /// Sense toggle S0..S7.
    Sense(u8),
}

/// Decoded toggle positions (1 = up).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct Toggles {
    pub address: u16,
    pub data: u8,
    pub sense: u8,
}

impl Toggles {
    /// Decode active-low expander readings: a toggle that is up pulls its
    /// line to ground, so every bit is inverted.
    pub const fn from_raw(address_raw: u16, data_raw: u8, sense_raw: u8) -> Self {
        Self {
            address: !address_raw,
            data: !data_raw,
            sense: !sense_raw,
        }
    }

    /// Toggles as wired on an original Altair panel, where the low address
    /// byte doubles as the data toggles and the high byte as the sense toggles.
    pub const fn wired(address: u16) -> Self {
        let [lo, hi] = address.to_le_bytes();
        Self {
            address,
            data: lo,
            sense: hi,
        }
    }

    /// Index of the highest address toggle that is up.
    pub fn highest_address_bit(&self) -> Option<u8> {
        if self.address == 0 {
            None
        } else {
            Some(15 - self.address.leading_zeros() as u8)
        }
    }
}

/// Raw access to the physical (or virtual) panel inputs.
///
/// Implementations report the instantaneous, undebounced state.
pub trait SwitchInput {
    fn is_pressed(&mut self, switch: Switch) -> bool;
    fn toggles(&mut self) -> Toggles;
}
