use altair101_common::{Switch, SwitchBank, SwitchInput, Toggle, Toggles};

use crate::notify::ChangeNotifier;

/// Pin levels of the panel's I/O expanders.
///
/// Every line is pulled up, so a pressed switch or a raised toggle reads 0.
/// Any change raises the [`ChangeNotifier`], the way the expanders' shared
/// interrupt line does on the real panel.
#[derive(Clone, Debug)]
pub struct RawPanel {
    control: u8,
    aux: u8,
    address: u16,
    data: u8,
    sense: u8,
    /// Data and sense follow the address toggles (low and high byte).
    wired: bool,
    notifier: ChangeNotifier,
}

impl RawPanel {
    pub fn new(notifier: ChangeNotifier) -> Self {
        Self {
            control: 0xFF,
            aux: 0xFF,
            address: 0xFFFF,
            data: 0xFF,
            sense: 0xFF,
            wired: false,
            notifier,
        }
    }

    /// Panel whose data and sense toggles are the two halves of the address
    /// toggles.
    pub fn wired(notifier: ChangeNotifier) -> Self {
        Self {
            wired: true,
            ..Self::new(notifier)
        }
    }

    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    fn bank_mut(&mut self, bank: SwitchBank) -> &mut u8 {
        match bank {
            SwitchBank::Control => &mut self.control,
            SwitchBank::Aux => &mut self.aux,
        }
    }

    pub fn set_switch(&mut self, switch: Switch, pressed: bool) {
        let mask = 1u8 << switch.pin();
        let bank = self.bank_mut(switch.bank());
        let before = *bank;
        if pressed {
            *bank &= !mask;
        } else {
            *bank |= mask;
        }
        if *bank != before {
            self.notifier.notify();
        }
    }

    pub fn set_toggle(&mut self, toggle: Toggle, on: bool) {
        let before = (self.address, self.data, self.sense);
        match toggle {
            Toggle::Address(bit) => self.address = set_low(self.address, bit & 0x0F, on),
            Toggle::Data(bit) => self.data = set_low(self.data.into(), bit & 0x07, on) as u8,
            Toggle::Sense(bit) => self.sense = set_low(self.sense.into(), bit & 0x07, on) as u8,
        }
        if (self.address, self.data, self.sense) != before {
            self.notifier.notify();
        }
    }

    /// Replace all pin levels at once, as read from hardware.
    pub fn set_raw(&mut self, control: u8, aux: u8, address: u16, data: u8, sense: u8) {
        let before = (self.control, self.aux, self.address, self.data, self.sense);
        self.control = control;
        self.aux = aux;
        self.address = address;
        self.data = data;
        self.sense = sense;
        if (control, aux, address, data, sense) != before {
            self.notifier.notify();
        }
    }
}

/// Active low: `on` pulls the line to 0.
fn set_low(bits: u16, bit: u8, on: bool) -> u16 {
    let mask = 1u16 << bit;
    if on {
        bits & !mask
    } else {
        bits | mask
    }
}

impl SwitchInput for RawPanel {
    fn is_pressed(&mut self, switch: Switch) -> bool {
        let bank = match switch.bank() {
            SwitchBank::Control => self.control,
            SwitchBank::Aux => self.aux,
        };
        bank & (1 << switch.pin()) == 0
    }

    fn toggles(&mut self) -> Toggles {
        let toggles = Toggles::from_raw(self.address, self.data, self.sense);
        if self.wired {
            Toggles::wired(toggles.address)
        } else {
            toggles
        }
    }
}
