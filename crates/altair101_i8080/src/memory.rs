use anyhow::{ensure, Result};

/// Largest memory an 8080 can address.
pub const MAX_MEMORY_SIZE: usize = 0x10000;

/// Fixed-size byte store.
///
/// Boards ship with far less than 64 KiB, so every address is reduced
/// modulo the configured size instead of being bounds-checked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Memory {
    bytes: Vec<u8>,
}

impl Memory {
    pub fn new(size: usize) -> Result<Self> {
        ensure!(
            size > 0 && size <= MAX_MEMORY_SIZE,
            "memory size must be between 1 and {MAX_MEMORY_SIZE} bytes, got {size}"
        );
        Ok(Self {
            bytes: vec![0; size],
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Reduce an address into `[0, len)`.
    #[inline]
    pub fn wrap(&self, addr: u16) -> u16 {
        (addr as usize % self.bytes.len()) as u16
    }

    #[inline]
    pub fn read(&self, addr: u16) -> u8 {
        self.bytes[self.wrap(addr) as usize]
    }

    #[inline]
    pub fn write(&mut self, addr: u16, value: u8) {
        let index = self.wrap(addr) as usize;
        self.bytes[index] = value;
    }

    /// Copy `data` into memory starting at `origin`, wrapping at the end.
    pub fn load(&mut self, origin: u16, data: &[u8]) {
        let mut addr = origin;
        for &byte in data {
            self.write(addr, byte);
            addr = addr.wrapping_add(1);
        }
    }

    pub fn clear(&mut self) {
        self.bytes.fill(0);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
}
