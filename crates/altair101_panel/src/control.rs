//! Front panel switch protocol.
//!
//! What a switch does depends on the machine's [`ProgramState`]. The state
//! machine here only decides: it turns a released switch plus the current
//! toggle positions into [`Command`]s and tracks the resulting state. The
//! controller that owns the CPU carries the commands out.

use std::fmt;

use altair101_common::{Switch, Toggles};

/// Run state of the whole machine. The numeric codes are the ones shared
/// with the player and clock collaborators.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ProgramState {
    LightsOff,
    #[default]
    Wait,
    Run,
    ClockRun,
    PlayerRun,
    SerialDownload,
    Load,
    SdCardRun,
}

impl ProgramState {
    pub const fn code(self) -> u8 {
        match self {
            ProgramState::LightsOff => 0,
            ProgramState::Wait => 1,
            ProgramState::Run => 2,
            ProgramState::ClockRun => 3,
            ProgramState::PlayerRun => 4,
            ProgramState::SerialDownload => 5,
            ProgramState::Load => 6,
            ProgramState::SdCardRun => 7,
        }
    }

    pub const fn from_code(code: u8) -> Option<ProgramState> {
        Some(match code {
            0 => ProgramState::LightsOff,
            1 => ProgramState::Wait,
            2 => ProgramState::Run,
            3 => ProgramState::ClockRun,
            4 => ProgramState::PlayerRun,
            5 => ProgramState::SerialDownload,
            6 => ProgramState::Load,
            7 => ProgramState::SdCardRun,
            _ => return None,
        })
    }

    /// The 8080 is executing a program.
    pub const fn is_running(self) -> bool {
        matches!(self, ProgramState::Run | ProgramState::SdCardRun)
    }

    /// Another process (clock or player) owns the panel.
    pub const fn is_hold(self) -> bool {
        matches!(self, ProgramState::ClockRun | ProgramState::PlayerRun)
    }
}

impl fmt::Display for ProgramState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProgramState::LightsOff => "LIGHTS OFF",
            ProgramState::Wait => "WAIT",
            ProgramState::Run => "RUN",
            ProgramState::ClockRun => "CLOCK",
            ProgramState::PlayerRun => "PLAYER",
            ProgramState::SerialDownload => "SERIAL DOWNLOAD",
            ProgramState::Load => "LOAD",
            ProgramState::SdCardRun => "SD CARD RUN",
        };
        f.write_str(name)
    }
}

/// MP3 player transport commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerCommand {
    Play,
    Stop,
    PlayTrack(u16),
    LoopTrack(u8),
    Next,
    Previous,
    NextDirectory,
    PreviousDirectory,
    SingleLoop(bool),
    Reset,
}

/// Real-time clock commands issued from clock mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockCommand {
    Run,
    Stop,
    Reset,
    Clear,
    /// Examine in clock mode: the highest address toggle as a hex digit.
    Digit(char),
}

/// Short sounds played when the panel changes mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SoundEffect {
    ClockOn,
    ClockOff,
    PlayerOn,
    PlayerOff,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Volume {
    Up,
    Down,
}

/// Work for the controller produced by a released switch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Wait -> Run.
    Run,
    /// A running program was stopped.
    Stop,
    /// Execute exactly one instruction.
    Step,
    Examine(u16),
    ExamineNext,
    Deposit { address: u16, value: u8 },
    DepositNext(u8),
    Reset,
    /// Confirmed CLEAR: zero memory and reset.
    Clear,
    LightsOff,
    LightsOn,
    Player(PlayerCommand),
    Clock(ClockCommand),
    Sound(SoundEffect),
    Volume(Volume),
    /// Load a built-in program; start it when `run` is set.
    LoadProgram { number: u8, run: bool },
    BeginDownload,
    EndDownload,
}

/// Maps a hex digit index to the character the clock expects.
fn hex_digit(value: u8) -> char {
    char::from_digit(u32::from(value & 0x0F), 16).unwrap_or('0')
}

#[derive(Clone, Debug, Default)]
pub struct ControlStateMachine {
    state: ProgramState,
    single_loop: bool,
}

impl ControlStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn state(&self) -> ProgramState {
        self.state
    }

    /// Force a state, e.g. when a program finishes loading.
    pub fn set_state(&mut self, state: ProgramState) {
        if state != self.state {
            log::info!("{} -> {}", self.state, state);
            self.state = state;
        }
    }

    /// Interpret a released switch. CLEAR must already be confirmed by the
    /// caller.
    pub fn handle(&mut self, switch: Switch, toggles: Toggles) -> Vec<Command> {
        let mut out = Vec::new();
        log::debug!("{} switch released: {:?}", self.state, switch);

        // Mode selectors work everywhere except with the lights off and
        // while a program is being loaded.
        match switch {
            Switch::Aux1Up if self.accepts_mode_switch() => {
                self.toggle_mode(ProgramState::ClockRun, &mut out);
                return out;
            }
            Switch::Aux1Down if self.accepts_mode_switch() => {
                self.toggle_mode(ProgramState::PlayerRun, &mut out);
                return out;
            }
            Switch::Protect | Switch::Unprotect
                if self.accepts_mode_switch() && self.state != ProgramState::PlayerRun =>
            {
                let volume = if switch == Switch::Protect {
                    Volume::Down
                } else {
                    Volume::Up
                };
                out.push(Command::Volume(volume));
                return out;
            }
            _ => {}
        }

        match self.state {
            ProgramState::Wait => self.handle_wait(switch, toggles, &mut out),
            ProgramState::Run | ProgramState::SdCardRun => match switch {
                Switch::Stop => {
                    self.set_state(ProgramState::Wait);
                    out.push(Command::Stop);
                }
                Switch::Reset => out.push(Command::Reset),
                _ => {}
            },
            ProgramState::PlayerRun => {
                if let Some(command) = self.player_command(switch, toggles) {
                    out.push(Command::Player(command));
                }
            }
            ProgramState::ClockRun => {
                let command = match switch {
                    Switch::Run => Some(ClockCommand::Run),
                    Switch::Stop => Some(ClockCommand::Stop),
                    Switch::Reset => Some(ClockCommand::Reset),
                    Switch::Clear => Some(ClockCommand::Clear),
                    Switch::Examine => Some(ClockCommand::Digit(
                        toggles.highest_address_bit().map_or('0', hex_digit),
                    )),
                    _ => None,
                };
                if let Some(command) = command {
                    out.push(Command::Clock(command));
                }
            }
            ProgramState::SerialDownload => {
                if matches!(switch, Switch::Stop | Switch::Reset) {
                    self.set_state(ProgramState::Wait);
                    out.push(Command::EndDownload);
                }
            }
            ProgramState::LightsOff => {
                if matches!(switch, Switch::StepDown | Switch::Reset) {
                    self.set_state(ProgramState::Wait);
                    out.push(Command::LightsOn);
                }
            }
            ProgramState::Load => {
                log::debug!("ignoring {:?} while loading", switch);
            }
        }
        out
    }

    fn accepts_mode_switch(&self) -> bool {
        !matches!(self.state, ProgramState::LightsOff | ProgramState::Load)
    }

    fn handle_wait(&mut self, switch: Switch, toggles: Toggles, out: &mut Vec<Command>) {
        match switch {
            Switch::Run => {
                self.set_state(ProgramState::Run);
                out.push(Command::Run);
            }
            Switch::Step => out.push(Command::Step),
            Switch::Examine => out.push(Command::Examine(toggles.address)),
            Switch::ExamineNext => out.push(Command::ExamineNext),
            Switch::Deposit => out.push(Command::Deposit {
                address: toggles.address,
                value: toggles.data,
            }),
            Switch::DepositNext => out.push(Command::DepositNext(toggles.data)),
            Switch::Reset => out.push(Command::Reset),
            Switch::Clear => out.push(Command::Clear),
            Switch::StepDown => {
                self.set_state(ProgramState::LightsOff);
                out.push(Command::LightsOff);
            }
            Switch::Aux2Up => {
                self.set_state(ProgramState::Load);
                out.push(Command::LoadProgram {
                    number: (toggles.address & 0x00FF) as u8,
                    run: toggles.address & 0x8000 != 0,
                });
            }
            Switch::Aux2Down => {
                self.set_state(ProgramState::SerialDownload);
                out.push(Command::BeginDownload);
            }
            Switch::Stop
            | Switch::Protect
            | Switch::Unprotect
            | Switch::Aux1Up
            | Switch::Aux1Down => {}
        }
    }

    fn player_command(&mut self, switch: Switch, toggles: Toggles) -> Option<PlayerCommand> {
        Some(match switch {
            Switch::Run => PlayerCommand::Play,
            Switch::Stop => PlayerCommand::Stop,
            Switch::Examine => PlayerCommand::PlayTrack(toggles.address),
            Switch::ExamineNext => PlayerCommand::Next,
            Switch::Deposit => PlayerCommand::PreviousDirectory,
            Switch::DepositNext => PlayerCommand::NextDirectory,
            Switch::Step => {
                self.single_loop = !self.single_loop;
                PlayerCommand::SingleLoop(self.single_loop)
            }
            Switch::StepDown => PlayerCommand::Previous,
            Switch::Reset => PlayerCommand::Reset,
            _ => return None,
        })
    }

    /// Flip between `mode` and Wait, telling the player about the change.
    fn toggle_mode(&mut self, mode: ProgramState, out: &mut Vec<Command>) {
        let target = if self.state == mode {
            ProgramState::Wait
        } else {
            mode
        };

        match self.state {
            ProgramState::ClockRun => out.push(Command::Sound(SoundEffect::ClockOff)),
            ProgramState::PlayerRun => out.push(Command::Sound(SoundEffect::PlayerOff)),
            ProgramState::Run | ProgramState::SdCardRun => out.push(Command::Stop),
            ProgramState::SerialDownload => out.push(Command::EndDownload),
            _ => {}
        }
        match target {
            ProgramState::ClockRun => out.push(Command::Sound(SoundEffect::ClockOn)),
            ProgramState::PlayerRun => out.push(Command::Sound(SoundEffect::PlayerOn)),
            _ => {}
        }
        self.set_state(target);
    }
}
