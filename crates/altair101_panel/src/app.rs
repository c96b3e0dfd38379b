use std::time::Instant;

use altair101_common::app::App;
use altair101_common::{Lights, Switch, Toggle};

use crate::input::RawPanel;
use crate::machine::Altair101;

/// Frontend-facing wrapper around the [`Altair101`] controller.
///
/// Frontend events are written to a virtual expander panel and polled right
/// away, so a press and release delivered back to back still make one edge.
pub struct Altair101App {
    pub machine: Altair101,
    panel: RawPanel,
    slice_cycles: u32,
    should_exit: bool,
}

impl Altair101App {
    pub fn new(machine: Altair101) -> Self {
        let panel = RawPanel::wired(machine.notifier());
        // One update runs about 10 ms of emulated time.
        let slice_cycles = (machine.clock_hz() / 100).max(1);
        Self {
            machine,
            panel,
            slice_cycles,
            should_exit: false,
        }
    }
}

impl App for Altair101App {
    fn init(&mut self) {
        log::info!("Altair 101 init ({} profile)", self.machine.profile());
    }

    fn update(&mut self, lights: &mut Lights) {
        self.machine
            .run_for(&mut self.panel, self.slice_cycles, Instant::now());
        *lights = self.machine.lights();
    }

    fn handle_switch_event(&mut self, switch: Switch, is_down: bool) {
        self.panel.set_switch(switch, is_down);
        self.machine.poll_switches(&mut self.panel, Instant::now());
    }

    fn handle_toggle_event(&mut self, toggle: Toggle, is_on: bool) {
        self.panel.set_toggle(toggle, is_on);
        self.machine.poll_switches(&mut self.panel, Instant::now());
    }

    fn handle_serial_input(&mut self, bytes: &[u8]) {
        self.machine.receive_serial(bytes);
    }

    fn should_exit(&self) -> bool {
        self.should_exit
    }

    fn exit(&mut self) {
        self.should_exit = true;
        log::info!(
            "Altair 101 exit after {} cycles in state {}",
            self.machine.cycles(),
            self.machine.state()
        );
    }

    fn title(&self) -> String {
        format!("Altair 101 ({})", self.machine.profile())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::Collaborators;
    use crate::control::ProgramState;
    use crate::machine::MachineConfig;
    use altair101_i8080::TargetProfile;

    fn app() -> Altair101App {
        let config = MachineConfig::builder()
            .profile(TargetProfile::Mega)
            .throttle(false)
            .build();
        Altair101App::new(Altair101::new(config, Collaborators::default()).unwrap())
    }

    #[test]
    fn back_to_back_press_and_release_counts() {
        let mut app = app();
        app.handle_toggle_event(Toggle::Address(0), true);
        app.handle_toggle_event(Toggle::Address(2), true);
        // Wired panel: data toggles are the low address byte.
        app.handle_switch_event(Switch::Deposit, true);
        app.handle_switch_event(Switch::Deposit, false);
        assert_eq!(app.machine.memory().read(0x0005), 0x05);

        let mut lights = Lights::OFF;
        app.update(&mut lights);
        assert_eq!(lights.address, 0x0005);
        assert_eq!(lights.data, 0x05);
        assert!(lights.wait);
    }

    #[test]
    fn run_and_stop_from_events() {
        let mut app = app();
        app.handle_switch_event(Switch::Run, true);
        app.handle_switch_event(Switch::Run, false);
        assert_eq!(app.machine.state(), ProgramState::Run);

        let mut lights = Lights::OFF;
        app.update(&mut lights);
        assert!(!lights.wait);
        assert!(app.machine.cycles() >= 20_000);

        app.handle_switch_event(Switch::Stop, true);
        app.handle_switch_event(Switch::Stop, false);
        assert_eq!(app.machine.state(), ProgramState::Wait);
    }

    #[test]
    fn exit_is_sticky() {
        let mut app = app();
        assert!(!app.should_exit());
        app.exit();
        assert!(app.should_exit());
        assert_eq!(app.title(), "Altair 101 (mega)");
    }
}
