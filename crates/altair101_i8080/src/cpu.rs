use crate::bus::Bus8080;
use crate::opcodes::{Cond, Instr, Opcode, OPCODES};
use crate::regs::{Flags, Reg, Registers, StackPair};

/// T-states burnt by each step while the processor sits in HLT.
pub const HALT_IDLE_CYCLES: u32 = 4;
/// T-states for the RST cycle that services an interrupt.
pub const INTERRUPT_CYCLES: u32 = 11;
/// Extra T-states when a conditional CALL or RET is taken.
const TAKEN_BRANCH_CYCLES: u32 = 6;

/// Intel 8080 CPU core.
///
/// The core owns only processor state. Memory, ports and the front panel
/// latches live behind a [`Bus8080`], so the same core can drive the full
/// machine or a bare test harness.
#[derive(Clone, Debug, Default)]
pub struct Cpu8080 {
    pub regs: Registers,
    /// Interrupt enable flip-flop (INTE).
    pub inte: bool,
    halted: bool,
    pending_interrupt: Option<u8>,
}

impl Cpu8080 {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hardware RESET: PC, SP and flags go back to their power-on values,
    /// interrupts are disabled and HALT is released. Memory and the other
    /// registers keep their contents.
    pub fn reset(&mut self) {
        self.regs.pc = 0;
        self.regs.sp = 0;
        self.regs.set_f(0);
        self.inte = false;
        self.halted = false;
        self.pending_interrupt = None;
    }

    #[inline]
    pub fn pc(&self) -> u16 {
        self.regs.pc
    }

    #[inline]
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    #[inline]
    pub fn pending_interrupt(&self) -> Option<u8> {
        self.pending_interrupt
    }

    /// Drive the INT line with RST vector `vector` (0-7).
    ///
    /// The request stays pending until the CPU accepts it, which happens at
    /// the next instruction boundary with INTE set.
    pub fn raise_interrupt(&mut self, vector: u8) {
        self.pending_interrupt = Some(vector & 0x07);
    }

    pub fn clear_interrupt(&mut self) {
        self.pending_interrupt = None;
    }

    /// Execute a single instruction (or service an interrupt, or idle in
    /// HLT) and return the number of T-states consumed.
    pub fn step<B: Bus8080>(&mut self, bus: &mut B) -> u32 {
        if self.inte {
            if let Some(vector) = self.pending_interrupt.take() {
                return self.service_interrupt(bus, vector);
            }
        }

        if self.halted {
            bus.halt_acknowledge(true);
            return HALT_IDLE_CYCLES;
        }

        let pc = self.regs.pc;
        let raw = bus.fetch_opcode(pc);
        self.regs.pc = bus.wrap_address(pc.wrapping_add(1));
        let opcode = OPCODES[raw as usize];

        if log::log_enabled!(log::Level::Trace) {
            log::trace!("{:04X}  {:02X}  {}", pc, raw, opcode.instr);
        }

        let cycles = self.execute(bus, opcode);
        self.regs.pc = bus.wrap_address(self.regs.pc);
        cycles
    }

    fn service_interrupt<B: Bus8080>(&mut self, bus: &mut B, vector: u8) -> u32 {
        self.inte = false;
        if self.halted {
            self.halted = false;
            bus.halt_acknowledge(false);
        }
        bus.interrupt_acknowledge();
        log::debug!("interrupt RST {} at PC={:04X}", vector, self.regs.pc);
        self.push(bus, self.regs.pc);
        self.regs.pc = bus.wrap_address(u16::from(vector) << 3);
        INTERRUPT_CYCLES
    }

    fn execute<B: Bus8080>(&mut self, bus: &mut B, opcode: Opcode) -> u32 {
        let cycles = u32::from(opcode.cycles);

        match opcode.instr {
            Instr::Nop => {}

            Instr::Lxi(pair) => {
                let v = self.fetch_word(bus);
                self.regs.set16(pair, v);
            }
            Instr::Stax(pair) => bus.mem_write(self.regs.get16(pair), self.regs.a()),
            Instr::Ldax(pair) => {
                let v = bus.mem_read(self.regs.get16(pair));
                self.regs.set_a(v);
            }
            Instr::Shld => {
                let addr = self.fetch_word(bus);
                bus.mem_write(addr, self.regs.hl.lo);
                bus.mem_write(addr.wrapping_add(1), self.regs.hl.hi);
            }
            Instr::Lhld => {
                let addr = self.fetch_word(bus);
                self.regs.hl.lo = bus.mem_read(addr);
                self.regs.hl.hi = bus.mem_read(addr.wrapping_add(1));
            }
            Instr::Sta => {
                let addr = self.fetch_word(bus);
                bus.mem_write(addr, self.regs.a());
            }
            Instr::Lda => {
                let addr = self.fetch_word(bus);
                let v = bus.mem_read(addr);
                self.regs.set_a(v);
            }

            Instr::Inx(pair) => {
                let v = self.regs.get16(pair).wrapping_add(1);
                self.regs.set16(pair, v);
            }
            Instr::Dcx(pair) => {
                let v = self.regs.get16(pair).wrapping_sub(1);
                self.regs.set16(pair, v);
            }
            Instr::Inr(reg) => {
                let v = self.read_operand(bus, reg);
                let r = self.inr(v);
                self.write_operand(bus, reg, r);
            }
            Instr::Dcr(reg) => {
                let v = self.read_operand(bus, reg);
                let r = self.dcr(v);
                self.write_operand(bus, reg, r);
            }
            Instr::Mvi(reg) => {
                let v = self.fetch_byte(bus);
                self.write_operand(bus, reg, v);
            }
            Instr::Dad(pair) => self.dad(self.regs.get16(pair)),

            Instr::Rlc => self.rlc(),
            Instr::Rrc => self.rrc(),
            Instr::Ral => self.ral(),
            Instr::Rar => self.rar(),
            Instr::Daa => self.daa(),
            Instr::Cma => self.regs.set_a(!self.regs.a()),
            Instr::Stc => self.regs.set_flag(Flags::CARRY, true),
            Instr::Cmc => {
                let carry = self.regs.flag(Flags::CARRY);
                self.regs.set_flag(Flags::CARRY, !carry);
            }

            Instr::Mov(dst, src) => {
                let v = self.read_operand(bus, src);
                self.write_operand(bus, dst, v);
            }
            Instr::Hlt => {
                self.halted = true;
                bus.halt_acknowledge(true);
                log::debug!("HLT at {:04X}", self.regs.pc.wrapping_sub(1));
            }

            Instr::Alu(op, reg) => {
                let v = self.read_operand(bus, reg);
                self.alu(op, v);
            }
            Instr::AluImm(op) => {
                let v = self.fetch_byte(bus);
                self.alu(op, v);
            }

            Instr::Ret => self.regs.pc = self.pop(bus),
            Instr::RetCond(cond) => {
                if self.condition(cond) {
                    self.regs.pc = self.pop(bus);
                    return cycles + TAKEN_BRANCH_CYCLES;
                }
            }
            Instr::Jmp => self.regs.pc = self.fetch_word(bus),
            Instr::JmpCond(cond) => {
                let addr = self.fetch_word(bus);
                if self.condition(cond) {
                    self.regs.pc = addr;
                }
            }
            Instr::Call => {
                let addr = self.fetch_word(bus);
                self.push(bus, self.regs.pc);
                self.regs.pc = addr;
            }
            Instr::CallCond(cond) => {
                let addr = self.fetch_word(bus);
                if self.condition(cond) {
                    self.push(bus, self.regs.pc);
                    self.regs.pc = addr;
                    return cycles + TAKEN_BRANCH_CYCLES;
                }
            }
            Instr::Rst(n) => {
                self.push(bus, self.regs.pc);
                self.regs.pc = u16::from(n) << 3;
            }

            Instr::Push(pair) => {
                let v = match pair {
                    StackPair::BC => self.regs.bc(),
                    StackPair::DE => self.regs.de(),
                    StackPair::HL => self.regs.hl(),
                    StackPair::PSW => self.regs.af(),
                };
                self.push(bus, v);
            }
            Instr::Pop(pair) => {
                let v = self.pop(bus);
                match pair {
                    StackPair::BC => self.regs.set_bc(v),
                    StackPair::DE => self.regs.set_de(v),
                    StackPair::HL => self.regs.set_hl(v),
                    StackPair::PSW => self.regs.set_af(v),
                }
            }

            Instr::Out => {
                let port = self.fetch_byte(bus);
                bus.io_write(port, self.regs.a());
            }
            Instr::In => {
                let port = self.fetch_byte(bus);
                let v = bus.io_read(port);
                self.regs.set_a(v);
            }

            Instr::Xthl => {
                let sp = self.regs.sp;
                let lo = bus.stack_read(sp);
                let hi = bus.stack_read(sp.wrapping_add(1));
                bus.stack_write(sp, self.regs.hl.lo);
                bus.stack_write(sp.wrapping_add(1), self.regs.hl.hi);
                self.regs.hl.lo = lo;
                self.regs.hl.hi = hi;
            }
            Instr::Pchl => self.regs.pc = self.regs.hl(),
            Instr::Xchg => std::mem::swap(&mut self.regs.de, &mut self.regs.hl),
            Instr::Sphl => self.regs.sp = self.regs.hl(),

            Instr::Di => self.inte = false,
            Instr::Ei => self.inte = true,
        }

        cycles
    }

    fn fetch_byte<B: Bus8080>(&mut self, bus: &mut B) -> u8 {
        let v = bus.mem_read(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        v
    }

    fn fetch_word<B: Bus8080>(&mut self, bus: &mut B) -> u16 {
        let lo = self.fetch_byte(bus);
        let hi = self.fetch_byte(bus);
        u16::from_le_bytes([lo, hi])
    }

    fn read_operand<B: Bus8080>(&mut self, bus: &mut B, reg: Reg) -> u8 {
        match self.regs.get8(reg) {
            Some(v) => v,
            None => bus.mem_read(self.regs.hl()),
        }
    }

    fn write_operand<B: Bus8080>(&mut self, bus: &mut B, reg: Reg, value: u8) {
        match reg {
            Reg::M => bus.mem_write(self.regs.hl(), value),
            _ => self.regs.set8(reg, value),
        }
    }

    fn push<B: Bus8080>(&mut self, bus: &mut B, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        bus.stack_write(self.regs.sp, hi);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        bus.stack_write(self.regs.sp, lo);
    }

    fn pop<B: Bus8080>(&mut self, bus: &mut B) -> u16 {
        let lo = bus.stack_read(self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(1);
        let hi = bus.stack_read(self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(1);
        u16::from_le_bytes([lo, hi])
    }

    fn condition(&self, cond: Cond) -> bool {
        let flags = self.regs.flags();
        match cond {
            Cond::NotZero => !flags.contains(Flags::ZERO),
            Cond::Zero => flags.contains(Flags::ZERO),
            Cond::NoCarry => !flags.contains(Flags::CARRY),
            Cond::Carry => flags.contains(Flags::CARRY),
            Cond::ParityOdd => !flags.contains(Flags::PARITY),
            Cond::ParityEven => flags.contains(Flags::PARITY),
            Cond::Plus => !flags.contains(Flags::SIGN),
            Cond::Minus => flags.contains(Flags::SIGN),
        }
    }
}

#[cfg(test)]
mod tests;
