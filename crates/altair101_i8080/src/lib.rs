mod alu;
pub mod bus;
pub mod cpu;
pub mod memory;
pub mod opcodes;
pub mod profile;
pub mod regs;
pub mod status;
pub mod timer;

pub use bus::{Bus8080, NullPorts, PortHandler, SystemBus};
pub use cpu::Cpu8080;
pub use memory::{Memory, MAX_MEMORY_SIZE};
pub use opcodes::{Instr, Opcode, OPCODES};
pub use profile::TargetProfile;
pub use regs::{Flags, Registers};
pub use status::StatusByte;
pub use timer::{CycleTimer, Throttle};

/// Default emulated clock: the 2 MHz of the original Altair 8800.
pub const CPU_CLOCK_HZ: u32 = 2_000_000;
