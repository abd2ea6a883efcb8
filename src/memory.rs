use crate::cpu::{read_word, write_word, CpuBus};

pub const MEMORY_SIZE: usize = 0x10000;
pub const STACK_BASE: u16 = 0x0100;
pub const RESET_VECTOR: u16 = 0xFFFC;
pub const PROGRAM_START: u16 = 0x8000;

/// Flat 64KB address space. Every address is valid and nothing is mapped.
pub struct Memory {
    data: Box<[u8; MEMORY_SIZE]>,
}

impl Memory {
    pub fn new() -> Self {
        Self {
            data: Box::new([0; MEMORY_SIZE]),
        }
    }

    pub fn read(&self, addr: u16) -> u8 {
        self.data[addr as usize]
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        self.data[addr as usize] = value;
    }

    /// Little-endian word, wrapping at 0xFFFF like the bus does.
    pub fn read_u16(&self, addr: u16) -> u16 {
        read_word(addr, |a| self.read(a))
    }

    pub fn write_u16(&mut self, addr: u16, value: u16) {
        write_word(addr, value, |a, v| self.write(a, v));
    }

    /// Copy `bytes` starting at `start`, wrapping past 0xFFFF back to 0x0000.
    pub fn load(&mut self, start: u16, bytes: &[u8]) {
        for (offset, &byte) in bytes.iter().enumerate() {
            self.write(start.wrapping_add(offset as u16), byte);
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data[..]
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memory")
            .field("reset_vector", &format_args!("{:04X}", self.read_u16(RESET_VECTOR)))
            .finish_non_exhaustive()
    }
}

impl CpuBus for Memory {
    fn read(&mut self, addr: u16) -> u8 {
        Memory::read(self, addr)
    }

    fn write(&mut self, addr: u16, value: u8) {
        Memory::write(self, addr, value);
    }
}
