//! Sample programs selectable with AUX2-up (address toggles 0-7 pick the
//! number).

/// A machine code image loaded at `origin`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Program {
    pub name: &'static str,
    pub origin: u16,
    pub bytes: &'static [u8],
}

/// Kill the Bit (Dean McDaniel, 1975). Flip a sense toggle when the moving
/// light passes it to shoot it down.
pub const KILL_THE_BIT: Program = Program {
    name: "Kill the Bit",
    origin: 0x0000,
    bytes: &[
        0x21, 0x00, 0x00, // LXI H,0
        0x16, 0x80, //       MVI D,080h
        0x01, 0x0E, 0x00, // LXI B,00Eh    speed
        0x1A, //             LDAX D        lights
        0x1A, //             LDAX D
        0x1A, //             LDAX D
        0x1A, //             LDAX D
        0x09, //             DAD B
        0xD2, 0x08, 0x00, // JNC 0008h
        0xDB, 0xFF, //       IN 0FFh       sense toggles
        0xAA, //             XRA D
        0x0F, //             RRC
        0x57, //             MOV D,A
        0xC3, 0x08, 0x00, // JMP 0008h
    ],
};

/// Add the bytes at 0x10 and 0x11, store the sum at 0x12 and halt.
pub const ADD_AND_STORE: Program = Program {
    name: "Add and store",
    origin: 0x0000,
    bytes: &[
        0x3A, 0x10, 0x00, // LDA 0010h
        0x47, //             MOV B,A
        0x3A, 0x11, 0x00, // LDA 0011h
        0x80, //             ADD B
        0x32, 0x12, 0x00, // STA 0012h
        0x76, //             HLT
        0x00, 0x00, 0x00, 0x00, //
        0x05, 0x03, 0x00, // data: 5, 3, sum
    ],
};

/// Print a greeting on the serial console and halt.
pub const HELLO: Program = Program {
    name: "Hello",
    origin: 0x0000,
    bytes: &[
        0x21, 0x0F, 0x00, // LXI H,000Fh
        0x7E, //             MOV A,M
        0xB7, //             ORA A
        0xCA, 0x0E, 0x00, // JZ 000Eh
        0xD3, 0x11, //       OUT 11h
        0x23, //             INX H
        0xC3, 0x03, 0x00, // JMP 0003h
        0x76, //             HLT
        b'H', b'e', b'l', b'l', b'o', b'\r', b'\n', 0x00,
    ],
};

pub static PROGRAMS: [Program; 3] = [KILL_THE_BIT, ADD_AND_STORE, HELLO];

pub fn builtin(number: u8) -> Option<&'static Program> {
    PROGRAMS.get(usize::from(number))
}
