//! Opcode table for the Intel 8080.
//!
//! `decode` matches every byte value explicitly (there is no wildcard arm),
//! so a missing opcode is a compile error rather than a runtime gap. The
//! twelve undocumented encodings are listed as aliases of the instruction
//! the silicon actually executes for them.

use std::fmt;

use crate::regs::{Reg, RegPair, StackPair};

/// Accumulator operation selected by bits 3-5 of the ALU group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Adc,
    Sub,
    Sbb,
    Ana,
    Xra,
    Ora,
    Cmp,
}

impl AluOp {
    pub const fn from_bits(op: u8) -> AluOp {
        match (op >> 3) & 0x07 {
            0 => AluOp::Add,
            1 => AluOp::Adc,
            2 => AluOp::Sub,
            3 => AluOp::Sbb,
            4 => AluOp::Ana,
            5 => AluOp::Xra,
            6 => AluOp::Ora,
            _ => AluOp::Cmp,
        }
    }

    const fn mnemonics(self) -> (&'static str, &'static str) {
        match self {
            AluOp::Add => ("ADD", "ADI"),
            AluOp::Adc => ("ADC", "ACI"),
            AluOp::Sub => ("SUB", "SUI"),
            AluOp::Sbb => ("SBB", "SBI"),
            AluOp::Ana => ("ANA", "ANI"),
            AluOp::Xra => ("XRA", "XRI"),
            AluOp::Ora => ("ORA", "ORI"),
            AluOp::Cmp => ("CMP", "CPI"),
        }
    }
}

/// Branch condition selected by bits 3-5 of Jcc/Ccc/Rcc.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cond {
    NotZero,
    Zero,
    NoCarry,
    Carry,
    ParityOdd,
    ParityEven,
    Plus,
    Minus,
}

impl Cond {
    pub const fn from_bits(op: u8) -> Cond {
        match (op >> 3) & 0x07 {
            0 => Cond::NotZero,
            1 => Cond::Zero,
            2 => Cond::NoCarry,
            3 => Cond::Carry,
            4 => Cond::ParityOdd,
            5 => Cond::ParityEven,
            6 => Cond::Plus,
            _ => Cond::Minus,
        }
    }

    const fn suffix(self) -> &'static str {
        match self {
            Cond::NotZero => "NZ",
            Cond::Zero => "Z",
            Cond::NoCarry => "NC",
            Cond::Carry => "C",
            Cond::ParityOdd => "PO",
            Cond::ParityEven => "PE",
            Cond::Plus => "P",
            Cond::Minus => "M",
        }
    }
}

/// Decoded instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instr {
    Nop,
    Lxi(RegPair),
    Stax(RegPair),
    Ldax(RegPair),
    Shld,
    Lhld,
    Sta,
    Lda,
    Inx(RegPair),
    Dcx(RegPair),
    Inr(Reg),
    Dcr(Reg),
    Mvi(Reg),
    Dad(RegPair),
    Rlc,
    Rrc,
    Ral,
    Rar,
    Daa,
    Cma,
    Stc,
    Cmc,
    Mov(Reg, Reg),
    Hlt,
    Alu(AluOp, Reg),
    AluImm(AluOp),
    Ret,
    RetCond(Cond),
    Jmp,
    JmpCond(Cond),
    Call,
    CallCond(Cond),
    Rst(u8),
    Push(StackPair),
    Pop(StackPair),
    Out,
    In,
    Xthl,
    Pchl,
    Xchg,
    Sphl,
    Di,
    Ei,
}

/// One row of the opcode table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Opcode {
    pub instr: Instr,
    /// Instruction length in bytes, opcode included.
    pub length: u8,
    /// Documented cost in T-states. Conditional calls and returns cost six
    /// more when the condition holds.
    pub cycles: u8,
    /// Undocumented encoding that behaves like a documented instruction.
    pub alias: bool,
}

const fn op(instr: Instr, length: u8, cycles: u8) -> Opcode {
    Opcode {
        instr,
        length,
        cycles,
        alias: false,
    }
}

const fn alias(instr: Instr, length: u8, cycles: u8) -> Opcode {
    Opcode {
        instr,
        length,
        cycles,
        alias: true,
    }
}

const fn memory_operand(reg: Reg) -> bool {
    matches!(reg, Reg::M)
}

pub const fn decode(opcode: u8) -> Opcode {
    match opcode {
        0x00 => op(Instr::Nop, 1, 4),
        0x08 | 0x10 | 0x18 | 0x20 | 0x28 | 0x30 | 0x38 => alias(Instr::Nop, 1, 4),

        0x01 | 0x11 | 0x21 | 0x31 => op(Instr::Lxi(RegPair::from_bits(opcode)), 3, 10),
        0x02 | 0x12 => op(Instr::Stax(RegPair::from_bits(opcode)), 1, 7),
        0x0A | 0x1A => op(Instr::Ldax(RegPair::from_bits(opcode)), 1, 7),
        0x22 => op(Instr::Shld, 3, 16),
        0x2A => op(Instr::Lhld, 3, 16),
        0x32 => op(Instr::Sta, 3, 13),
        0x3A => op(Instr::Lda, 3, 13),

        0x03 | 0x13 | 0x23 | 0x33 => op(Instr::Inx(RegPair::from_bits(opcode)), 1, 5),
        0x0B | 0x1B | 0x2B | 0x3B => op(Instr::Dcx(RegPair::from_bits(opcode)), 1, 5),
        0x09 | 0x19 | 0x29 | 0x39 => op(Instr::Dad(RegPair::from_bits(opcode)), 1, 10),

        0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => {
            let reg = Reg::from_bits(opcode >> 3);
            op(Instr::Inr(reg), 1, if memory_operand(reg) { 10 } else { 5 })
        }
        0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => {
            let reg = Reg::from_bits(opcode >> 3);
            op(Instr::Dcr(reg), 1, if memory_operand(reg) { 10 } else { 5 })
        }
        0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => {
            let reg = Reg::from_bits(opcode >> 3);
            op(Instr::Mvi(reg), 2, if memory_operand(reg) { 10 } else { 7 })
        }

        0x07 => op(Instr::Rlc, 1, 4),
        0x0F => op(Instr::Rrc, 1, 4),
        0x17 => op(Instr::Ral, 1, 4),
        0x1F => op(Instr::Rar, 1, 4),
        0x27 => op(Instr::Daa, 1, 4),
        0x2F => op(Instr::Cma, 1, 4),
        0x37 => op(Instr::Stc, 1, 4),
        0x3F => op(Instr::Cmc, 1, 4),

        // MOV r1,r2 (0x76 would be MOV M,M and is HLT instead)
        0x40..=0x75 | 0x77..=0x7F => {
            let dst = Reg::from_bits(opcode >> 3);
            let src = Reg::from_bits(opcode);
            let cycles = if memory_operand(dst) || memory_operand(src) {
                7
            } else {
                5
            };
            op(Instr::Mov(dst, src), 1, cycles)
        }
        0x76 => op(Instr::Hlt, 1, 7),

        0x80..=0xBF => {
            let reg = Reg::from_bits(opcode);
            let cycles = if memory_operand(reg) { 7 } else { 4 };
            op(Instr::Alu(AluOp::from_bits(opcode), reg), 1, cycles)
        }

        0xC0 | 0xC8 | 0xD0 | 0xD8 | 0xE0 | 0xE8 | 0xF0 | 0xF8 => {
            op(Instr::RetCond(Cond::from_bits(opcode)), 1, 5)
        }
        0xC2 | 0xCA | 0xD2 | 0xDA | 0xE2 | 0xEA | 0xF2 | 0xFA => {
            op(Instr::JmpCond(Cond::from_bits(opcode)), 3, 10)
        }
        0xC4 | 0xCC | 0xD4 | 0xDC | 0xE4 | 0xEC | 0xF4 | 0xFC => {
            op(Instr::CallCond(Cond::from_bits(opcode)), 3, 11)
        }
        0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
            op(Instr::AluImm(AluOp::from_bits(opcode)), 2, 7)
        }
        0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
            op(Instr::Rst((opcode >> 3) & 0x07), 1, 11)
        }

        0xC1 | 0xD1 | 0xE1 | 0xF1 => op(Instr::Pop(StackPair::from_bits(opcode)), 1, 10),
        0xC5 | 0xD5 | 0xE5 | 0xF5 => op(Instr::Push(StackPair::from_bits(opcode)), 1, 11),

        0xC3 => op(Instr::Jmp, 3, 10),
        0xCB => alias(Instr::Jmp, 3, 10),
        0xC9 => op(Instr::Ret, 1, 10),
        0xD9 => alias(Instr::Ret, 1, 10),
        0xCD => op(Instr::Call, 3, 17),
        0xDD | 0xED | 0xFD => alias(Instr::Call, 3, 17),

        0xD3 => op(Instr::Out, 2, 10),
        0xDB => op(Instr::In, 2, 10),
        0xE3 => op(Instr::Xthl, 1, 18),
        0xE9 => op(Instr::Pchl, 1, 5),
        0xEB => op(Instr::Xchg, 1, 4),
        0xF3 => op(Instr::Di, 1, 4),
        0xF9 => op(Instr::Sphl, 1, 5),
        0xFB => op(Instr::Ei, 1, 4),
    }
}

const fn build_table() -> [Opcode; 256] {
    let mut table = [op(Instr::Nop, 1, 4); 256];
    let mut i = 0;
    while i < 256 {
        table[i] = decode(i as u8);
        i += 1;
    }
    table
}

/// Every opcode byte, decoded at compile time.
pub static OPCODES: [Opcode; 256] = build_table();

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Instr::Nop => write!(f, "NOP"),
            Instr::Lxi(rp) => write!(f, "LXI {},d16", rp.name()),
            Instr::Stax(rp) => write!(f, "STAX {}", rp.name()),
            Instr::Ldax(rp) => write!(f, "LDAX {}", rp.name()),
            Instr::Shld => write!(f, "SHLD a16"),
            Instr::Lhld => write!(f, "LHLD a16"),
            Instr::Sta => write!(f, "STA a16"),
            Instr::Lda => write!(f, "LDA a16"),
            Instr::Inx(rp) => write!(f, "INX {}", rp.name()),
            Instr::Dcx(rp) => write!(f, "DCX {}", rp.name()),
            Instr::Inr(r) => write!(f, "INR {}", r.name()),
            Instr::Dcr(r) => write!(f, "DCR {}", r.name()),
            Instr::Mvi(r) => write!(f, "MVI {},d8", r.name()),
            Instr::Dad(rp) => write!(f, "DAD {}", rp.name()),
            Instr::Rlc => write!(f, "RLC"),
            Instr::Rrc => write!(f, "RRC"),
            Instr::Ral => write!(f, "RAL"),
            Instr::Rar => write!(f, "RAR"),
            Instr::Daa => write!(f, "DAA"),
            Instr::Cma => write!(f, "CMA"),
            Instr::Stc => write!(f, "STC"),
            Instr::Cmc => write!(f, "CMC"),
            Instr::Mov(dst, src) => write!(f, "MOV {},{}", dst.name(), src.name()),
            Instr::Hlt => write!(f, "HLT"),
            Instr::Alu(alu, r) => write!(f, "{} {}", alu.mnemonics().0, r.name()),
            Instr::AluImm(alu) => write!(f, "{} d8", alu.mnemonics().1),
            Instr::Ret => write!(f, "RET"),
            Instr::RetCond(c) => write!(f, "R{}", c.suffix()),
            Instr::Jmp => write!(f, "JMP a16"),
            Instr::JmpCond(c) => write!(f, "J{} a16", c.suffix()),
            Instr::Call => write!(f, "CALL a16"),
            Instr::CallCond(c) => write!(f, "C{} a16", c.suffix()),
            Instr::Rst(n) => write!(f, "RST {}", n),
            Instr::Push(sp) => write!(f, "PUSH {}", sp.name()),
            Instr::Pop(sp) => write!(f, "POP {}", sp.name()),
            Instr::Out => write!(f, "OUT d8"),
            Instr::In => write!(f, "IN d8"),
            Instr::Xthl => write!(f, "XTHL"),
            Instr::Pchl => write!(f, "PCHL"),
            Instr::Xchg => write!(f, "XCHG"),
            Instr::Sphl => write!(f, "SPHL"),
            Instr::Di => write!(f, "DI"),
            Instr::Ei => write!(f, "EI"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_matches_decode_for_every_byte() {
        for byte in 0..=255u8 {
            assert_eq!(OPCODES[byte as usize], decode(byte), "opcode {:02X}", byte);
        }
    }

    #[test]
    fn exactly_twelve_aliases() {
        let aliases: Vec<u8> = (0..=255u8)
            .filter(|&b| OPCODES[b as usize].alias)
            .collect();
        assert_eq!(
            aliases,
            vec![0x08, 0x10, 0x18, 0x20, 0x28, 0x30, 0x38, 0xCB, 0xD9, 0xDD, 0xED, 0xFD]
        );
        assert_eq!(OPCODES[0xCB].instr, Instr::Jmp);
        assert_eq!(OPCODES[0xD9].instr, Instr::Ret);
        assert_eq!(OPCODES[0xFD].instr, Instr::Call);
    }

    #[test]
    fn lengths_follow_operand_kind() {
        for opcode in OPCODES.iter() {
            let expected = match opcode.instr {
                Instr::Lxi(_)
                | Instr::Shld
                | Instr::Lhld
                | Instr::Sta
                | Instr::Lda
                | Instr::Jmp
                | Instr::JmpCond(_)
                | Instr::Call
                | Instr::CallCond(_) => 3,
                Instr::Mvi(_) | Instr::AluImm(_) | Instr::In | Instr::Out => 2,
                _ => 1,
            };
            assert_eq!(opcode.length, expected, "{}", opcode.instr);
            assert!(opcode.cycles >= 4, "{}", opcode.instr);
        }
    }

    #[test]
    fn spot_check_decoding() {
        assert_eq!(OPCODES[0x3E].instr, Instr::Mvi(Reg::A));
        assert_eq!(OPCODES[0x3E].cycles, 7);
        assert_eq!(OPCODES[0x36].cycles, 10);
        assert_eq!(OPCODES[0x7E].instr, Instr::Mov(Reg::A, Reg::M));
        assert_eq!(OPCODES[0x7E].cycles, 7);
        assert_eq!(OPCODES[0x41].cycles, 5);
        assert_eq!(OPCODES[0x76].instr, Instr::Hlt);
        assert_eq!(OPCODES[0x86].instr, Instr::Alu(AluOp::Add, Reg::M));
        assert_eq!(OPCODES[0xFE].instr, Instr::AluImm(AluOp::Cmp));
        assert_eq!(OPCODES[0xF5].instr, Instr::Push(StackPair::PSW));
        assert_eq!(OPCODES[0xEF].instr, Instr::Rst(5));
        assert_eq!(OPCODES[0xE2].instr, Instr::JmpCond(Cond::ParityOdd));
        assert_eq!(format!("{}", OPCODES[0xB8].instr), "CMP B");
    }
}
