use bitflags::bitflags;

bitflags! {
    /// Condition bits held in the low byte of the AF pair.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Flags: u8 {
        const SIGN = 0x80;
        const ZERO = 0x40;
        const HALF_CARRY = 0x10;
        const PARITY = 0x04;
        const CARRY = 0x01;
    }
}

/// Bit 1 of the flag byte always reads back as 1 on the 8080.
pub const FLAGS_FIXED_ONE: u8 = 0x02;

/// A 16-bit register pair stored as two explicit bytes.
///
/// The pair value is always `hi << 8 | lo`; there is no other view of the
/// storage, so byte and pair accesses cannot disagree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegisterPair {
    pub hi: u8,
    pub lo: u8,
}

impl RegisterPair {
    #[inline]
    pub const fn new(value: u16) -> Self {
        let [hi, lo] = value.to_be_bytes();
        Self { hi, lo }
    }

    #[inline]
    pub const fn get(self) -> u16 {
        u16::from_be_bytes([self.hi, self.lo])
    }

    #[inline]
    pub fn set(&mut self, value: u16) {
        *self = Self::new(value);
    }
}

/// Register file of the 8080.
///
/// `af.hi` is the accumulator and `af.lo` the flag byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Registers {
    pub af: RegisterPair,
    pub bc: RegisterPair,
    pub de: RegisterPair,
    pub hl: RegisterPair,
    pub sp: u16,
    pub pc: u16,
}

impl Default for Registers {
    fn default() -> Self {
        Self {
            af: RegisterPair::new(FLAGS_FIXED_ONE as u16),
            bc: RegisterPair::default(),
            de: RegisterPair::default(),
            hl: RegisterPair::default(),
            sp: 0,
            pc: 0,
        }
    }
}

impl Registers {
    #[inline]
    pub fn a(&self) -> u8 {
        self.af.hi
    }

    #[inline]
    pub fn set_a(&mut self, value: u8) {
        self.af.hi = value;
    }

    #[inline]
    pub fn f(&self) -> u8 {
        self.af.lo
    }

    /// Store a raw flag byte, forcing the fixed bits (1 high, 3 and 5 low).
    #[inline]
    pub fn set_f(&mut self, value: u8) {
        self.af.lo = (value & Flags::all().bits()) | FLAGS_FIXED_ONE;
    }

    #[inline]
    pub fn af(&self) -> u16 {
        self.af.get()
    }

    #[inline]
    pub fn set_af(&mut self, value: u16) {
        let [a, f] = value.to_be_bytes();
        self.set_a(a);
        self.set_f(f);
    }

    #[inline]
    pub fn bc(&self) -> u16 {
        self.bc.get()
    }

    #[inline]
    pub fn set_bc(&mut self, value: u16) {
        self.bc.set(value);
    }

    #[inline]
    pub fn de(&self) -> u16 {
        self.de.get()
    }

    #[inline]
    pub fn set_de(&mut self, value: u16) {
        self.de.set(value);
    }

    #[inline]
    pub fn hl(&self) -> u16 {
        self.hl.get()
    }

    #[inline]
    pub fn set_hl(&mut self, value: u16) {
        self.hl.set(value);
    }

    #[inline]
    pub fn flags(&self) -> Flags {
        Flags::from_bits_truncate(self.af.lo)
    }

    #[inline]
    pub fn set_flags(&mut self, flags: Flags) {
        self.set_f(flags.bits());
    }

    #[inline]
    pub fn flag(&self, flag: Flags) -> bool {
        self.flags().contains(flag)
    }

    #[inline]
    pub fn set_flag(&mut self, flag: Flags, value: bool) {
        let mut flags = self.flags();
        flags.set(flag, value);
        self.set_flags(flags);
    }

    /// 8-bit register selected by a 3-bit opcode field. `Reg::M` has no
    /// register storage and yields `None`.
    pub fn get8(&self, reg: Reg) -> Option<u8> {
        match reg {
            Reg::B => Some(self.bc.hi),
            Reg::C => Some(self.bc.lo),
            Reg::D => Some(self.de.hi),
            Reg::E => Some(self.de.lo),
            Reg::H => Some(self.hl.hi),
            Reg::L => Some(self.hl.lo),
            Reg::M => None,
            Reg::A => Some(self.af.hi),
        }
    }

    pub fn set8(&mut self, reg: Reg, value: u8) {
        match reg {
            Reg::B => self.bc.hi = value,
            Reg::C => self.bc.lo = value,
            Reg::D => self.de.hi = value,
            Reg::E => self.de.lo = value,
            Reg::H => self.hl.hi = value,
            Reg::L => self.hl.lo = value,
            Reg::M => {}
            Reg::A => self.af.hi = value,
        }
    }

    pub fn get16(&self, pair: RegPair) -> u16 {
        match pair {
            RegPair::BC => self.bc(),
            RegPair::DE => self.de(),
            RegPair::HL => self.hl(),
            RegPair::SP => self.sp,
        }
    }

    pub fn set16(&mut self, pair: RegPair, value: u16) {
        match pair {
            RegPair::BC => self.set_bc(value),
            RegPair::DE => self.set_de(value),
            RegPair::HL => self.set_hl(value),
            RegPair::SP => self.sp = value,
        }
    }
}

/// Operand encoded in the 3-bit register fields. `M` is the byte at (HL).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reg {
    B,
    C,
    D,
    E,
    H,
    L,
    M,
    A,
}

impl Reg {
    pub const fn from_bits(bits: u8) -> Reg {
        match bits & 0x07 {
            0 => Reg::B,
            1 => Reg::C,
            2 => Reg::D,
            3 => Reg::E,
            4 => Reg::H,
            5 => Reg::L,
            6 => Reg::M,
            _ => Reg::A,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Reg::B => "B",
            Reg::C => "C",
            Reg::D => "D",
            Reg::E => "E",
            Reg::H => "H",
            Reg::L => "L",
            Reg::M => "M",
            Reg::A => "A",
        }
    }
}

/// Register pair encoded in bits 4-5 of LXI/INX/DCX/DAD/LDAX/STAX.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegPair {
    BC,
    DE,
    HL,
    SP,
}

impl RegPair {
    pub const fn from_bits(bits: u8) -> RegPair {
        match (bits >> 4) & 0x03 {
            0 => RegPair::BC,
            1 => RegPair::DE,
            2 => RegPair::HL,
            _ => RegPair::SP,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            RegPair::BC => "B",
            RegPair::DE => "D",
            RegPair::HL => "H",
            RegPair::SP => "SP",
        }
    }
}

/// Register pair encoded in PUSH/POP, where the SP slot means PSW (A + flags).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StackPair {
    BC,
    DE,
    HL,
    PSW,
}

impl StackPair {
    pub const fn from_bits(bits: u8) -> StackPair {
        match (bits >> 4) & 0x03 {
            0 => StackPair::BC,
            1 => StackPair::DE,
            2 => StackPair::HL,
            _ => StackPair::PSW,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            StackPair::BC => "B",
            StackPair::DE => "D",
            StackPair::HL => "H",
            StackPair::PSW => "PSW",
        }
    }
}
