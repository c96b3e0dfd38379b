use std::time::Instant;

use anyhow::{ensure, Context, Result};
use typed_builder::TypedBuilder;

use altair101_common::{Lights, Switch, SwitchInput, Toggles};
use altair101_i8080::timer::THROTTLE_PERIOD_US;
use altair101_i8080::{
    Cpu8080, CycleTimer, Memory, SystemBus, TargetProfile, Throttle, CPU_CLOCK_HZ,
};

use crate::collaborators::{report, Collaborators};
use crate::control::{Command, ControlStateMachine, ProgramState};
use crate::debounce::{ConfirmWindow, SwitchDebouncer};
use crate::notify::ChangeNotifier;
use crate::ports::{PanelPorts, PortEvent};
use crate::programs;
use crate::status::{PanelSnapshot, StatusEncoder};

/// Periodic RST raised by the real-time-clock timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RtcInterrupt {
    pub period_us: u32,
    pub vector: u8,
}

#[derive(Clone, Debug, TypedBuilder)]
pub struct MachineConfig {
    #[builder(default)]
    pub profile: TargetProfile,
    #[builder(default = CPU_CLOCK_HZ)]
    pub clock_hz: u32,
    /// Overrides the profile's throttle setting.
    #[builder(default, setter(strip_option))]
    pub throttle: Option<bool>,
    #[builder(default, setter(strip_option))]
    pub rtc_interrupt: Option<RtcInterrupt>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TimerEvent {
    Throttle,
    RealTimeClock,
}

const THROTTLE_TIMER: usize = 0;
const RTC_TIMER: usize = 1;

/// The Altair 101: an 8080, its memory and ports, and the front panel that
/// controls them.
///
/// The controller is driven from a single loop. Each [`Altair101::tick`]
/// reads the panel, lets the control state machine decide, executes at most
/// one instruction and republishes the lights.
pub struct Altair101 {
    cpu: Cpu8080,
    bus: SystemBus<PanelPorts>,
    control: ControlStateMachine,
    debouncer: SwitchDebouncer,
    clear_confirm: ConfirmWindow,
    toggles: Toggles,
    timer: CycleTimer<TimerEvent>,
    throttle: Option<Throttle>,
    rtc_vector: Option<u8>,
    notifier: ChangeNotifier,
    encoder: StatusEncoder,
    collaborators: Collaborators,
    download_address: u16,
    profile: TargetProfile,
}

impl Altair101 {
    pub fn new(config: MachineConfig, collaborators: Collaborators) -> Result<Self> {
        let MachineConfig {
            profile,
            clock_hz,
            throttle,
            rtc_interrupt,
        } = config;
        ensure!(clock_hz > 0, "clock frequency must be non-zero");

        let memory = Memory::new(profile.memory_size())
            .with_context(|| format!("sizing memory for the {profile} profile"))?;
        let mut timer = CycleTimer::new(clock_hz, profile.max_timers());

        let throttle = if throttle.unwrap_or(profile.throttle()) {
            timer
                .setup(THROTTLE_TIMER, THROTTLE_PERIOD_US, TimerEvent::Throttle)
                .context("setting up the throttle timer")?;
            timer.start(THROTTLE_TIMER, None, true)?;
            Some(Throttle::new(clock_hz))
        } else {
            None
        };

        let rtc_vector = match rtc_interrupt {
            Some(rtc) => {
                ensure!(rtc.vector < 8, "RST vector {} out of range", rtc.vector);
                timer
                    .setup(RTC_TIMER, rtc.period_us, TimerEvent::RealTimeClock)
                    .context("setting up the real-time-clock timer")?;
                timer.start(RTC_TIMER, None, true)?;
                Some(rtc.vector)
            }
            None => None,
        };

        let mut machine = Self {
            cpu: Cpu8080::new(),
            bus: SystemBus::new(memory, PanelPorts::new()),
            control: ControlStateMachine::new(),
            debouncer: SwitchDebouncer::new(),
            clear_confirm: ConfirmWindow::default(),
            toggles: Toggles::default(),
            timer,
            throttle,
            rtc_vector,
            notifier: ChangeNotifier::new(),
            encoder: StatusEncoder::new(),
            collaborators,
            download_address: 0,
            profile,
        };
        machine.bus.examine(0);
        machine.publish();
        log::info!(
            "Altair 101 ready: {} profile, {} bytes, {} Hz",
            profile,
            profile.memory_size(),
            clock_hz
        );
        Ok(machine)
    }

    pub fn profile(&self) -> TargetProfile {
        self.profile
    }

    pub fn clock_hz(&self) -> u32 {
        self.timer.clock_hz()
    }

    pub fn state(&self) -> ProgramState {
        self.control.state()
    }

    pub fn cpu(&self) -> &Cpu8080 {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu8080 {
        &mut self.cpu
    }

    pub fn bus(&self) -> &SystemBus<PanelPorts> {
        &self.bus
    }

    pub fn memory(&self) -> &Memory {
        self.bus.memory()
    }

    /// Total emulated cycles since power on.
    pub fn cycles(&self) -> u64 {
        self.timer.cycles()
    }

    /// Handle for input sources to signal switch changes.
    pub fn notifier(&self) -> ChangeNotifier {
        self.notifier.clone()
    }

    pub fn toggles(&self) -> Toggles {
        self.toggles
    }

    pub fn set_toggles(&mut self, toggles: Toggles) {
        self.toggles = toggles;
        self.bus.ports_mut().set_sense(toggles.sense);
    }

    pub fn lights(&self) -> Lights {
        StatusEncoder::encode(&self.snapshot())
    }

    /// Copy an image into memory and point the CPU at it.
    pub fn load_image(&mut self, origin: u16, bytes: &[u8]) -> Result<()> {
        ensure!(
            bytes.len() <= self.memory().len(),
            "image of {} bytes does not fit in {} bytes of memory",
            bytes.len(),
            self.memory().len()
        );
        self.bus.memory_mut().load(origin, bytes);
        self.cpu.reset();
        self.examine(origin);
        log::info!("loaded {} bytes at {:04X}", bytes.len(), origin);
        Ok(())
    }

    pub fn load_builtin(&mut self, number: u8) -> Result<()> {
        let program = programs::builtin(number)
            .with_context(|| format!("no built-in program number {number}"))?;
        self.bus.memory_mut().clear();
        self.load_image(program.origin, program.bytes)
            .with_context(|| format!("loading {}", program.name))?;
        log::info!("program {}: {}", number, program.name);
        Ok(())
    }

    /// Bytes arriving on the serial line. In serial download mode they go
    /// straight into memory.
    pub fn receive_serial(&mut self, bytes: &[u8]) {
        self.bus.ports_mut().receive(bytes);
        if self.state() == ProgramState::SerialDownload {
            self.download_pending();
            self.publish();
        }
    }

    /// Read the panel and act on every released switch.
    ///
    /// While a program runs the panel is only read after the notifier
    /// reported a change.
    pub fn poll_switches(&mut self, input: &mut impl SwitchInput, now: Instant) {
        let changed = self.notifier.take();
        if self.state().is_running() && !changed {
            return;
        }
        self.set_toggles(input.toggles());
        for switch in self.debouncer.poll(input) {
            self.release(switch, now);
        }
    }

    /// Act on one debounced release edge.
    pub fn release(&mut self, switch: Switch, now: Instant) {
        if switch == Switch::Clear
            && self.state() == ProgramState::Wait
            && !self.clear_confirm.release(now)
        {
            log::info!("CLEAR: flip again within a second to confirm");
            return;
        }

        for command in self.control.handle(switch, self.toggles) {
            self.apply(command, now);
        }
        if self.state() != ProgramState::Wait {
            self.clear_confirm.cancel();
        }
        self.publish();
    }

    /// One loop iteration: panel, at most one instruction, lights.
    /// Returns the cycles executed.
    pub fn tick(&mut self, input: &mut impl SwitchInput, now: Instant) -> u32 {
        self.poll_switches(input, now);
        let cycles = if self.state().is_running() {
            self.step_instruction()
        } else {
            if self.state() == ProgramState::SerialDownload {
                self.download_pending();
            }
            0
        };
        self.publish();
        cycles
    }

    /// Tick until `budget` cycles ran or the machine stops running.
    pub fn run_for(&mut self, input: &mut impl SwitchInput, budget: u32, now: Instant) -> u32 {
        let mut cycles = 0u32;
        loop {
            cycles = cycles.saturating_add(self.tick(input, now));
            if !self.state().is_running() || cycles >= budget {
                return cycles;
            }
        }
    }

    /// Execute one instruction and account for its cycles.
    pub fn step_instruction(&mut self) -> u32 {
        let cycles = self.cpu.step(&mut self.bus);
        self.account(cycles);
        self.dispatch_port_events();
        cycles
    }

    /// EXAMINE: show the byte at `address` and move the program counter there.
    pub fn examine(&mut self, address: u16) -> u8 {
        let value = self.bus.examine(address);
        self.cpu.regs.pc = self.bus.address();
        value
    }

    /// EXAMINE-NEXT: the panel address follows the program counter, which
    /// STEP also advances, so this is PC + 1 and not the last bus address.
    pub fn examine_next(&mut self) -> u8 {
        self.examine(self.cpu.pc().wrapping_add(1))
    }

    /// DEPOSIT: store `value` at `address` and show it.
    pub fn deposit(&mut self, address: u16, value: u8) -> u8 {
        let stored = self.bus.deposit(address, value);
        self.cpu.regs.pc = self.bus.address();
        stored
    }

    pub fn deposit_next(&mut self, value: u8) -> u8 {
        self.deposit(self.cpu.pc().wrapping_add(1), value)
    }

    pub fn reset(&mut self) {
        log::info!("RESET");
        self.cpu.reset();
        if self.state().is_running() {
            self.bus.reset_latches();
        } else {
            self.bus.examine(0);
        }
    }

    /// Zero memory and reset the CPU.
    pub fn clear(&mut self) {
        log::info!("CLEAR: memory zeroed");
        self.bus.memory_mut().clear();
        self.cpu.reset();
        self.bus.reset_latches();
        self.bus.examine(0);
    }

    fn apply(&mut self, command: Command, now: Instant) {
        match command {
            Command::Run => {
                log::info!("RUN from {:04X}", self.cpu.pc());
                let cycles = self.timer.cycles();
                if let Some(throttle) = &mut self.throttle {
                    throttle.restart(cycles, now);
                }
            }
            Command::Stop => {
                log::info!("STOP at {:04X}", self.cpu.pc());
            }
            Command::Step => {
                self.step_instruction();
            }
            Command::Examine(address) => {
                self.examine(address);
            }
            Command::ExamineNext => {
                self.examine_next();
            }
            Command::Deposit { address, value } => {
                self.deposit(address, value);
            }
            Command::DepositNext(value) => {
                self.deposit_next(value);
            }
            Command::Reset => self.reset(),
            Command::Clear => self.clear(),
            Command::LightsOff => log::info!("lights off"),
            Command::LightsOn => log::info!("lights on"),
            Command::Player(command) => {
                report("player", self.collaborators.player.command(command));
            }
            Command::Clock(command) => {
                report("clock", self.collaborators.clock.command(command));
            }
            Command::Sound(effect) => {
                report("sound effect", self.collaborators.player.sound_effect(effect));
            }
            Command::Volume(volume) => {
                report("volume", self.collaborators.player.volume(volume));
            }
            Command::LoadProgram { number, run } => {
                let next = match self.load_builtin(number) {
                    Ok(()) if run => ProgramState::SdCardRun,
                    Ok(()) => ProgramState::Wait,
                    Err(err) => {
                        log::warn!("{err:#}");
                        ProgramState::Wait
                    }
                };
                self.control.set_state(next);
            }
            Command::BeginDownload => {
                log::info!("serial download: waiting for bytes");
                self.bus.ports_mut().clear_input();
                self.download_address = 0;
            }
            Command::EndDownload => {
                log::info!("serial download: {} bytes", self.download_address);
                self.examine(0);
            }
        }
    }

    fn download_pending(&mut self) {
        while let Some(byte) = self.bus.ports_mut().next_input() {
            self.bus.deposit(self.download_address, byte);
            self.download_address = self.download_address.wrapping_add(1);
        }
    }

    fn account(&mut self, cycles: u32) {
        for event in self.timer.add_cycles(cycles) {
            match event {
                TimerEvent::Throttle => {
                    let total = self.timer.cycles();
                    if let Some(throttle) = &mut self.throttle {
                        throttle.pace(total);
                    }
                }
                TimerEvent::RealTimeClock => {
                    if let Some(vector) = self.rtc_vector {
                        self.cpu.raise_interrupt(vector);
                    }
                }
            }
        }
    }

    fn dispatch_port_events(&mut self) {
        for event in self.bus.ports_mut().take_events() {
            match event {
                PortEvent::Console(byte) => {
                    report("console", self.collaborators.console.write_byte(byte));
                }
                PortEvent::Player(command) => {
                    report("player", self.collaborators.player.command(command));
                }
            }
        }
    }

    fn snapshot(&self) -> PanelSnapshot {
        PanelSnapshot {
            state: self.state(),
            status: self.bus.status(),
            address: self.bus.address(),
            data: self.bus.data(),
            inte: self.cpu.inte,
        }
    }

    fn publish(&mut self) {
        let snapshot = self.snapshot();
        if let Some(lights) = self.encoder.publish(&snapshot) {
            report("lights", self.collaborators.lights.render(&lights));
        }
    }
}
