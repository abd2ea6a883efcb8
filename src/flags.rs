//! Processor status register (P).
//!
//! The register is stored as a single byte so it can be pushed and pulled
//! unchanged, but instruction code only touches it through the named
//! accessors below.

// Status flags
pub const FLAG_C: u8 = 0x01; // Carry
pub const FLAG_Z: u8 = 0x02; // Zero
pub const FLAG_I: u8 = 0x04; // Interrupt Disable
pub const FLAG_D: u8 = 0x08; // Decimal Mode (stored, not used by ADC/SBC)
pub const FLAG_B: u8 = 0x10; // Break
pub const FLAG_U: u8 = 0x20; // Break2 / unused
pub const FLAG_V: u8 = 0x40; // Overflow
pub const FLAG_N: u8 = 0x80; // Negative

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Status(u8);

impl Status {
    /// All flags clear, including the unused bit.
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Byte written by PHP: Break and Break2 always set.
    pub const fn to_stack_byte(self) -> u8 {
        self.0 | FLAG_B | FLAG_U
    }

    /// Status restored by PLP/RTI: Break cleared, Break2 set.
    pub const fn from_stack_byte(value: u8) -> Self {
        Self((value & !FLAG_B) | FLAG_U)
    }

    pub const fn is_set(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    pub fn set(&mut self, flag: u8, value: bool) {
        if value {
            self.0 |= flag;
        } else {
            self.0 &= !flag;
        }
    }

    pub const fn carry(self) -> bool {
        self.is_set(FLAG_C)
    }

    pub fn set_carry(&mut self, value: bool) {
        self.set(FLAG_C, value);
    }

    pub const fn zero(self) -> bool {
        self.is_set(FLAG_Z)
    }

    pub fn set_zero(&mut self, value: bool) {
        self.set(FLAG_Z, value);
    }

    pub const fn interrupt_disable(self) -> bool {
        self.is_set(FLAG_I)
    }

    pub fn set_interrupt_disable(&mut self, value: bool) {
        self.set(FLAG_I, value);
    }

    pub const fn decimal_mode(self) -> bool {
        self.is_set(FLAG_D)
    }

    pub fn set_decimal_mode(&mut self, value: bool) {
        self.set(FLAG_D, value);
    }

    pub const fn overflow(self) -> bool {
        self.is_set(FLAG_V)
    }

    pub fn set_overflow(&mut self, value: bool) {
        self.set(FLAG_V, value);
    }

    pub const fn negative(self) -> bool {
        self.is_set(FLAG_N)
    }

    pub fn set_negative(&mut self, value: bool) {
        self.set(FLAG_N, value);
    }

    /// Zero set iff `value == 0`, Negative copied from bit 7.
    pub fn update_zero_negative(&mut self, value: u8) {
        self.set_zero(value == 0);
        self.set_negative(value & 0x80 != 0);
    }
}

impl std::fmt::Display for Status {
    /// Renders as `NV-BDIZC`, upper case for set flags.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const NAMES: [(u8, char); 8] = [
            (FLAG_N, 'N'),
            (FLAG_V, 'V'),
            (FLAG_U, 'U'),
            (FLAG_B, 'B'),
            (FLAG_D, 'D'),
            (FLAG_I, 'I'),
            (FLAG_Z, 'Z'),
            (FLAG_C, 'C'),
        ];
        for (flag, name) in NAMES {
            let c = if self.is_set(flag) {
                name
            } else {
                name.to_ascii_lowercase()
            };
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}
