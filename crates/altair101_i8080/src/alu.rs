use crate::cpu::Cpu8080;
use crate::opcodes::AluOp;
use crate::regs::Flags;

/// Sign, zero and parity bits for an 8-bit result.
#[inline]
pub(crate) fn szp(value: u8) -> Flags {
    let mut flags = Flags::empty();
    flags.set(Flags::SIGN, value & 0x80 != 0);
    flags.set(Flags::ZERO, value == 0);
    flags.set(Flags::PARITY, value.count_ones() % 2 == 0);
    flags
}

impl Cpu8080 {
    /// Run one of the eight accumulator operations against `value`.
    pub(crate) fn alu(&mut self, op: AluOp, value: u8) {
        let carry = self.regs.flag(Flags::CARRY);
        match op {
            AluOp::Add => {
                let r = self.add(value, false);
                self.regs.set_a(r);
            }
            AluOp::Adc => {
                let r = self.add(value, carry);
                self.regs.set_a(r);
            }
            AluOp::Sub => {
                let r = self.sub(value, false);
                self.regs.set_a(r);
            }
            AluOp::Sbb => {
                let r = self.sub(value, carry);
                self.regs.set_a(r);
            }
            AluOp::Ana => self.logic(self.regs.a() & value),
            AluOp::Xra => self.logic(self.regs.a() ^ value),
            AluOp::Ora => self.logic(self.regs.a() | value),
            AluOp::Cmp => {
                // Same flags as SUB, accumulator untouched.
                self.sub(value, false);
            }
        }
    }

    fn set_result_flags(&mut self, result: u8, carry: bool, half_carry: bool) {
        let mut flags = szp(result);
        flags.set(Flags::CARRY, carry);
        flags.set(Flags::HALF_CARRY, half_carry);
        self.regs.set_flags(flags);
    }

    /// A + value + carry_in, flags updated, result returned.
    fn add(&mut self, value: u8, carry_in: bool) -> u8 {
        let a = self.regs.a();
        let c = carry_in as u8;
        let full = a as u16 + value as u16 + c as u16;
        let result = full as u8;
        let half = (a & 0x0F) + (value & 0x0F) + c > 0x0F;
        self.set_result_flags(result, full > 0xFF, half);
        result
    }

    /// A - value - borrow_in, flags updated, result returned.
    ///
    /// The 8080 subtracts by adding the complement, so the half-carry bit is
    /// the carry out of bit 3 of `a + !value + !borrow_in`, while the carry
    /// bit reports a borrow.
    fn sub(&mut self, value: u8, borrow_in: bool) -> u8 {
        let a = self.regs.a();
        let b = borrow_in as u8;
        let result = a.wrapping_sub(value).wrapping_sub(b);
        let borrow = (a as u16) < value as u16 + b as u16;
        let half = (a & 0x0F) + (!value & 0x0F) + (1 - b) > 0x0F;
        self.set_result_flags(result, borrow, half);
        result
    }

    fn logic(&mut self, result: u8) {
        self.set_result_flags(result, false, false);
        self.regs.set_a(result);
    }

    /// INR: S Z P AC updated, carry preserved.
    pub(crate) fn inr(&mut self, value: u8) -> u8 {
        let result = value.wrapping_add(1);
        let mut flags = szp(result);
        flags.set(Flags::HALF_CARRY, value & 0x0F == 0x0F);
        flags.set(Flags::CARRY, self.regs.flag(Flags::CARRY));
        self.regs.set_flags(flags);
        result
    }

    /// DCR: S Z P AC updated, carry preserved.
    pub(crate) fn dcr(&mut self, value: u8) -> u8 {
        let result = value.wrapping_sub(1);
        let mut flags = szp(result);
        // value + 0xFF carries out of bit 3 unless the low nibble was zero.
        flags.set(Flags::HALF_CARRY, value & 0x0F != 0);
        flags.set(Flags::CARRY, self.regs.flag(Flags::CARRY));
        self.regs.set_flags(flags);
        result
    }

    /// DAD: HL += value, only carry affected.
    pub(crate) fn dad(&mut self, value: u16) {
        let hl = self.regs.hl();
        let (result, carry) = hl.overflowing_add(value);
        self.regs.set_hl(result);
        self.regs.set_flag(Flags::CARRY, carry);
    }

    pub(crate) fn daa(&mut self) {
        let a = self.regs.a();
        let flags = self.regs.flags();
        let mut correction = 0u8;
        let mut carry = flags.contains(Flags::CARRY);
        let low = a & 0x0F;
        let high = a >> 4;

        if low > 9 || flags.contains(Flags::HALF_CARRY) {
            correction |= 0x06;
        }
        if high > 9 || carry || (high >= 9 && low > 9) {
            correction |= 0x60;
            carry = true;
        }

        let result = self.add(correction, false);
        self.regs.set_a(result);
        self.regs.set_flag(Flags::CARRY, carry);
    }

    pub(crate) fn rlc(&mut self) {
        let a = self.regs.a();
        self.regs.set_a(a.rotate_left(1));
        self.regs.set_flag(Flags::CARRY, a & 0x80 != 0);
    }

    pub(crate) fn rrc(&mut self) {
        let a = self.regs.a();
        self.regs.set_a(a.rotate_right(1));
        self.regs.set_flag(Flags::CARRY, a & 0x01 != 0);
    }

    pub(crate) fn ral(&mut self) {
        let a = self.regs.a();
        let carry = self.regs.flag(Flags::CARRY) as u8;
        self.regs.set_a((a << 1) | carry);
        self.regs.set_flag(Flags::CARRY, a & 0x80 != 0);
    }

    pub(crate) fn rar(&mut self) {
        let a = self.regs.a();
        let carry = (self.regs.flag(Flags::CARRY) as u8) << 7;
        self.regs.set_a((a >> 1) | carry);
        self.regs.set_flag(Flags::CARRY, a & 0x01 != 0);
    }
}
