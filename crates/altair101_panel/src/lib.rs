pub mod app;
pub mod collaborators;
pub mod control;
pub mod debounce;
pub mod input;
pub mod machine;
pub mod notify;
pub mod ports;
pub mod programs;
pub mod status;

pub use app::Altair101App;
pub use collaborators::{Collaborators, Console, LightsDevice, Player, RealTimeClock};
pub use control::{Command, ControlStateMachine, ProgramState};
pub use input::RawPanel;
pub use machine::{Altair101, MachineConfig, RtcInterrupt};
pub use notify::ChangeNotifier;
