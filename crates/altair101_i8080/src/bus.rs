use crate::memory::Memory;
use crate::status::StatusByte;

/// Simple bus interface for an Intel 8080-compatible CPU core.
///
/// The CPU uses this trait to access memory and IO ports without knowing
/// anything about the concrete machine. Addresses are plain values, so an
/// access can never re-evaluate its address expression.
///
/// The hooks with default implementations let a bus tell machine cycles
/// apart (opcode fetch, stack traffic, halt, interrupt acknowledge); buses
/// that do not care can ignore them.
pub trait Bus8080 {
    fn mem_read(&mut self, addr: u16) -> u8;
    fn mem_write(&mut self, addr: u16, value: u8);

    fn io_read(&mut self, port: u8) -> u8;
    fn io_write(&mut self, port: u8, value: u8);

    /// Opcode fetch (M1 cycle).
    fn fetch_opcode(&mut self, addr: u16) -> u8 {
        self.mem_read(addr)
    }

    fn stack_read(&mut self, addr: u16) -> u8 {
        self.mem_read(addr)
    }

    fn stack_write(&mut self, addr: u16, value: u8) {
        self.mem_write(addr, value);
    }

    /// The CPU entered (`true`) or left (`false`) the halted state.
    fn halt_acknowledge(&mut self, _halted: bool) {}

    /// The CPU is accepting an interrupt.
    fn interrupt_acknowledge(&mut self) {}

    /// Reduce a program counter value into the populated address range.
    fn wrap_address(&self, addr: u16) -> u16 {
        addr
    }
}

/// Peripheral side of the IN/OUT instructions.
///
/// The front panel, player and clock are mapped onto port numbers by the
/// implementation; the CPU never knows who is listening.
pub trait PortHandler {
    fn port_in(&mut self, port: u8) -> u8;
    fn port_out(&mut self, port: u8, value: u8);
}

/// Port handler with nothing attached: reads return 0, writes are dropped.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullPorts;

impl PortHandler for NullPorts {
    fn port_in(&mut self, port: u8) -> u8 {
        log::debug!("IN from unmapped port 0x{:02X}", port);
        0
    }

    fn port_out(&mut self, port: u8, value: u8) {
        log::debug!("OUT 0x{:02X} to unmapped port 0x{:02X}", value, port);
    }
}

/// Memory plus ports, with the address/data/status latches the front panel
/// lights are driven from.
///
/// Every access updates the latches to describe the machine cycle that just
/// happened, so after an instruction they show its last bus transfer.
pub struct SystemBus<P: PortHandler> {
    memory: Memory,
    ports: P,
    status: StatusByte,
    address: u16,
    data: u8,
}

impl<P: PortHandler> SystemBus<P> {
    pub fn new(memory: Memory, ports: P) -> Self {
        Self {
            memory,
            ports,
            status: StatusByte::IDLE,
            address: 0,
            data: 0,
        }
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    pub fn ports(&self) -> &P {
        &self.ports
    }

    pub fn ports_mut(&mut self) -> &mut P {
        &mut self.ports
    }

    pub fn status(&self) -> StatusByte {
        self.status
    }

    pub fn address(&self) -> u16 {
        self.address
    }

    pub fn data(&self) -> u8 {
        self.data
    }

    /// Front panel EXAMINE: an ordinary M1 read that leaves the address and
    /// value on the lights.
    pub fn examine(&mut self, addr: u16) -> u8 {
        self.fetch_opcode(addr)
    }

    /// Front panel DEPOSIT: write, then read back so the data lights show
    /// what memory now holds.
    pub fn deposit(&mut self, addr: u16, value: u8) -> u8 {
        self.mem_write(addr, value);
        self.examine(addr)
    }

    /// Forget the latched cycle, as after a reset or clear.
    pub fn reset_latches(&mut self) {
        self.status = StatusByte::IDLE;
        self.address = 0;
        self.data = 0;
    }

    fn latch(&mut self, cycle: StatusByte, addr: u16, value: u8) {
        self.status.begin_cycle(cycle);
        self.address = addr;
        self.data = value;
    }
}

impl<P: PortHandler> Bus8080 for SystemBus<P> {
    fn mem_read(&mut self, addr: u16) -> u8 {
        let addr = self.memory.wrap(addr);
        let value = self.memory.read(addr);
        self.latch(StatusByte::MEMR | StatusByte::WO, addr, value);
        value
    }

    fn mem_write(&mut self, addr: u16, value: u8) {
        let addr = self.memory.wrap(addr);
        self.memory.write(addr, value);
        self.latch(StatusByte::empty(), addr, value);
    }

    fn io_read(&mut self, port: u8) -> u8 {
        let value = self.ports.port_in(port);
        // The 8080 puts the port number on both halves of the address bus.
        let addr = u16::from_le_bytes([port, port]);
        self.latch(StatusByte::INP | StatusByte::WO, addr, value);
        value
    }

    fn io_write(&mut self, port: u8, value: u8) {
        self.ports.port_out(port, value);
        let addr = u16::from_le_bytes([port, port]);
        self.latch(StatusByte::OUT, addr, value);
    }

    fn fetch_opcode(&mut self, addr: u16) -> u8 {
        let addr = self.memory.wrap(addr);
        let value = self.memory.read(addr);
        self.latch(
            StatusByte::MEMR | StatusByte::M1 | StatusByte::WO,
            addr,
            value,
        );
        // A new instruction fetch ends any interrupt acknowledge cycle.
        self.status.remove(StatusByte::INT);
        value
    }

    fn stack_read(&mut self, addr: u16) -> u8 {
        let addr = self.memory.wrap(addr);
        let value = self.memory.read(addr);
        self.latch(
            StatusByte::MEMR | StatusByte::STACK | StatusByte::WO,
            addr,
            value,
        );
        value
    }

    fn stack_write(&mut self, addr: u16, value: u8) {
        let addr = self.memory.wrap(addr);
        self.memory.write(addr, value);
        self.latch(StatusByte::STACK, addr, value);
    }

    fn halt_acknowledge(&mut self, halted: bool) {
        if halted {
            self.status.begin_cycle(StatusByte::MEMR | StatusByte::WO);
        }
        self.status.set(StatusByte::HLTA, halted);
    }

    fn interrupt_acknowledge(&mut self) {
        self.status.begin_cycle(StatusByte::M1 | StatusByte::WO);
        self.status.insert(StatusByte::INT);
    }

    fn wrap_address(&self, addr: u16) -> u16 {
        self.memory.wrap(addr)
    }
}
