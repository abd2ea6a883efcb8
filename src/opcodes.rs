//! Opcode table
//!
//! Maps every documented NMOS 6502 opcode to its mnemonic, instruction length,
//! base cycle count and addressing mode. The 256-slot lookup table is built
//! once on first use and shared read-only afterwards; slots without a
//! documented instruction stay empty and halt the execution loop.

use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    IndirectX,
    IndirectY,
    /// Implied or accumulator operand; branches also use this and read
    /// their offset themselves.
    NoneAddressing,
}

#[rustfmt::skip]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mnemonic {
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs, Clc,
    Cld, Cli, Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx, Iny, Jmp,
    Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Php, Pla, Plp, Rol, Ror, Rti,
    Rts, Sbc, Sec, Sed, Sei, Sta, Stx, Sty, Tax, Tay, Tsx, Txa, Txs, Tya,
}

impl Mnemonic {
    #[rustfmt::skip]
    pub const fn as_str(self) -> &'static str {
        use Mnemonic::*;
        match self {
            Adc => "ADC", And => "AND", Asl => "ASL", Bcc => "BCC",
            Bcs => "BCS", Beq => "BEQ", Bit => "BIT", Bmi => "BMI",
            Bne => "BNE", Bpl => "BPL", Brk => "BRK", Bvc => "BVC",
            Bvs => "BVS", Clc => "CLC", Cld => "CLD", Cli => "CLI",
            Clv => "CLV", Cmp => "CMP", Cpx => "CPX", Cpy => "CPY",
            Dec => "DEC", Dex => "DEX", Dey => "DEY", Eor => "EOR",
            Inc => "INC", Inx => "INX", Iny => "INY", Jmp => "JMP",
            Jsr => "JSR", Lda => "LDA", Ldx => "LDX", Ldy => "LDY",
            Lsr => "LSR", Nop => "NOP", Ora => "ORA", Pha => "PHA",
            Php => "PHP", Pla => "PLA", Plp => "PLP", Rol => "ROL",
            Ror => "ROR", Rti => "RTI", Rts => "RTS", Sbc => "SBC",
            Sec => "SEC", Sed => "SED", Sei => "SEI", Sta => "STA",
            Stx => "STX", Sty => "STY", Tax => "TAX", Tay => "TAY",
            Tsx => "TSX", Txa => "TXA", Txs => "TXS", Tya => "TYA",
        }
    }

    pub const fn is_branch(self) -> bool {
        use Mnemonic::*;
        matches!(self, Bcc | Bcs | Beq | Bmi | Bne | Bpl | Bvc | Bvs)
    }

    /// Shifts and rotates that have an accumulator form.
    pub const fn is_shift(self) -> bool {
        use Mnemonic::*;
        matches!(self, Asl | Lsr | Rol | Ror)
    }
}

impl std::fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of one opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    pub code: u8,
    pub mnemonic: Mnemonic,
    /// Total length in bytes, opcode included (1-3).
    pub len: u8,
    /// Base cycle count, kept as metadata only.
    pub cycles: u8,
    pub mode: AddressingMode,
}

impl Opcode {
    pub const fn new(code: u8, mnemonic: Mnemonic, len: u8, cycles: u8, mode: AddressingMode) -> Self {
        Self { code, mnemonic, len, cycles, mode }
    }

    pub const fn name(&self) -> &'static str {
        self.mnemonic.as_str()
    }
}

use AddressingMode::*;
use Mnemonic::*;

#[rustfmt::skip]
const OPCODES: [Opcode; 151] = [
    Opcode::new(0x00, Brk, 1, 7, NoneAddressing),
    Opcode::new(0xEA, Nop, 1, 2, NoneAddressing),

    // Arithmetic
    Opcode::new(0x69, Adc, 2, 2, Immediate),
    Opcode::new(0x65, Adc, 2, 3, ZeroPage),
    Opcode::new(0x75, Adc, 2, 4, ZeroPageX),
    Opcode::new(0x6D, Adc, 3, 4, Absolute),
    Opcode::new(0x7D, Adc, 3, 4, AbsoluteX),
    Opcode::new(0x79, Adc, 3, 4, AbsoluteY),
    Opcode::new(0x61, Adc, 2, 6, IndirectX),
    Opcode::new(0x71, Adc, 2, 5, IndirectY),

    Opcode::new(0xE9, Sbc, 2, 2, Immediate),
    Opcode::new(0xE5, Sbc, 2, 3, ZeroPage),
    Opcode::new(0xF5, Sbc, 2, 4, ZeroPageX),
    Opcode::new(0xED, Sbc, 3, 4, Absolute),
    Opcode::new(0xFD, Sbc, 3, 4, AbsoluteX),
    Opcode::new(0xF9, Sbc, 3, 4, AbsoluteY),
    Opcode::new(0xE1, Sbc, 2, 6, IndirectX),
    Opcode::new(0xF1, Sbc, 2, 5, IndirectY),

    // Logical
    Opcode::new(0x29, And, 2, 2, Immediate),
    Opcode::new(0x25, And, 2, 3, ZeroPage),
    Opcode::new(0x35, And, 2, 4, ZeroPageX),
    Opcode::new(0x2D, And, 3, 4, Absolute),
    Opcode::new(0x3D, And, 3, 4, AbsoluteX),
    Opcode::new(0x39, And, 3, 4, AbsoluteY),
    Opcode::new(0x21, And, 2, 6, IndirectX),
    Opcode::new(0x31, And, 2, 5, IndirectY),

    Opcode::new(0x09, Ora, 2, 2, Immediate),
    Opcode::new(0x05, Ora, 2, 3, ZeroPage),
    Opcode::new(0x15, Ora, 2, 4, ZeroPageX),
    Opcode::new(0x0D, Ora, 3, 4, Absolute),
    Opcode::new(0x1D, Ora, 3, 4, AbsoluteX),
    Opcode::new(0x19, Ora, 3, 4, AbsoluteY),
    Opcode::new(0x01, Ora, 2, 6, IndirectX),
    Opcode::new(0x11, Ora, 2, 5, IndirectY),

    Opcode::new(0x49, Eor, 2, 2, Immediate),
    Opcode::new(0x45, Eor, 2, 3, ZeroPage),
    Opcode::new(0x55, Eor, 2, 4, ZeroPageX),
    Opcode::new(0x4D, Eor, 3, 4, Absolute),
    Opcode::new(0x5D, Eor, 3, 4, AbsoluteX),
    Opcode::new(0x59, Eor, 3, 4, AbsoluteY),
    Opcode::new(0x41, Eor, 2, 6, IndirectX),
    Opcode::new(0x51, Eor, 2, 5, IndirectY),

    Opcode::new(0x24, Bit, 2, 3, ZeroPage),
    Opcode::new(0x2C, Bit, 3, 4, Absolute),

    // Shifts and rotates
    Opcode::new(0x0A, Asl, 1, 2, NoneAddressing),
    Opcode::new(0x06, Asl, 2, 5, ZeroPage),
    Opcode::new(0x16, Asl, 2, 6, ZeroPageX),
    Opcode::new(0x0E, Asl, 3, 6, Absolute),
    Opcode::new(0x1E, Asl, 3, 7, AbsoluteX),

    Opcode::new(0x4A, Lsr, 1, 2, NoneAddressing),
    Opcode::new(0x46, Lsr, 2, 5, ZeroPage),
    Opcode::new(0x56, Lsr, 2, 6, ZeroPageX),
    Opcode::new(0x4E, Lsr, 3, 6, Absolute),
    Opcode::new(0x5E, Lsr, 3, 7, AbsoluteX),

    Opcode::new(0x2A, Rol, 1, 2, NoneAddressing),
    Opcode::new(0x26, Rol, 2, 5, ZeroPage),
    Opcode::new(0x36, Rol, 2, 6, ZeroPageX),
    Opcode::new(0x2E, Rol, 3, 6, Absolute),
    Opcode::new(0x3E, Rol, 3, 7, AbsoluteX),

    Opcode::new(0x6A, Ror, 1, 2, NoneAddressing),
    Opcode::new(0x66, Ror, 2, 5, ZeroPage),
    Opcode::new(0x76, Ror, 2, 6, ZeroPageX),
    Opcode::new(0x6E, Ror, 3, 6, Absolute),
    Opcode::new(0x7E, Ror, 3, 7, AbsoluteX),

    // Increment / decrement
    Opcode::new(0xE6, Inc, 2, 5, ZeroPage),
    Opcode::new(0xF6, Inc, 2, 6, ZeroPageX),
    Opcode::new(0xEE, Inc, 3, 6, Absolute),
    Opcode::new(0xFE, Inc, 3, 7, AbsoluteX),
    Opcode::new(0xE8, Inx, 1, 2, NoneAddressing),
    Opcode::new(0xC8, Iny, 1, 2, NoneAddressing),

    Opcode::new(0xC6, Dec, 2, 5, ZeroPage),
    Opcode::new(0xD6, Dec, 2, 6, ZeroPageX),
    Opcode::new(0xCE, Dec, 3, 6, Absolute),
    Opcode::new(0xDE, Dec, 3, 7, AbsoluteX),
    Opcode::new(0xCA, Dex, 1, 2, NoneAddressing),
    Opcode::new(0x88, Dey, 1, 2, NoneAddressing),

    // Compare
    Opcode::new(0xC9, Cmp, 2, 2, Immediate),
    Opcode::new(0xC5, Cmp, 2, 3, ZeroPage),
    Opcode::new(0xD5, Cmp, 2, 4, ZeroPageX),
    Opcode::new(0xCD, Cmp, 3, 4, Absolute),
    Opcode::new(0xDD, Cmp, 3, 4, AbsoluteX),
    Opcode::new(0xD9, Cmp, 3, 4, AbsoluteY),
    Opcode::new(0xC1, Cmp, 2, 6, IndirectX),
    Opcode::new(0xD1, Cmp, 2, 5, IndirectY),

    Opcode::new(0xE0, Cpx, 2, 2, Immediate),
    Opcode::new(0xE4, Cpx, 2, 3, ZeroPage),
    Opcode::new(0xEC, Cpx, 3, 4, Absolute),

    Opcode::new(0xC0, Cpy, 2, 2, Immediate),
    Opcode::new(0xC4, Cpy, 2, 3, ZeroPage),
    Opcode::new(0xCC, Cpy, 3, 4, Absolute),

    // Branches (relative offset read by the executor)
    Opcode::new(0x90, Bcc, 2, 2, NoneAddressing),
    Opcode::new(0xB0, Bcs, 2, 2, NoneAddressing),
    Opcode::new(0xF0, Beq, 2, 2, NoneAddressing),
    Opcode::new(0xD0, Bne, 2, 2, NoneAddressing),
    Opcode::new(0x30, Bmi, 2, 2, NoneAddressing),
    Opcode::new(0x10, Bpl, 2, 2, NoneAddressing),
    Opcode::new(0x50, Bvc, 2, 2, NoneAddressing),
    Opcode::new(0x70, Bvs, 2, 2, NoneAddressing),

    // Jumps and subroutines
    Opcode::new(0x4C, Jmp, 3, 3, Absolute),
    Opcode::new(0x6C, Jmp, 3, 5, Indirect),
    Opcode::new(0x20, Jsr, 3, 6, Absolute),
    Opcode::new(0x60, Rts, 1, 6, NoneAddressing),
    Opcode::new(0x40, Rti, 1, 6, NoneAddressing),

    // Flags
    Opcode::new(0x18, Clc, 1, 2, NoneAddressing),
    Opcode::new(0x38, Sec, 1, 2, NoneAddressing),
    Opcode::new(0x58, Cli, 1, 2, NoneAddressing),
    Opcode::new(0x78, Sei, 1, 2, NoneAddressing),
    Opcode::new(0xD8, Cld, 1, 2, NoneAddressing),
    Opcode::new(0xF8, Sed, 1, 2, NoneAddressing),
    Opcode::new(0xB8, Clv, 1, 2, NoneAddressing),

    // Loads
    Opcode::new(0xA9, Lda, 2, 2, Immediate),
    Opcode::new(0xA5, Lda, 2, 3, ZeroPage),
    Opcode::new(0xB5, Lda, 2, 4, ZeroPageX),
    Opcode::new(0xAD, Lda, 3, 4, Absolute),
    Opcode::new(0xBD, Lda, 3, 4, AbsoluteX),
    Opcode::new(0xB9, Lda, 3, 4, AbsoluteY),
    Opcode::new(0xA1, Lda, 2, 6, IndirectX),
    Opcode::new(0xB1, Lda, 2, 5, IndirectY),

    Opcode::new(0xA2, Ldx, 2, 2, Immediate),
    Opcode::new(0xA6, Ldx, 2, 3, ZeroPage),
    Opcode::new(0xB6, Ldx, 2, 4, ZeroPageY),
    Opcode::new(0xAE, Ldx, 3, 4, Absolute),
    Opcode::new(0xBE, Ldx, 3, 4, AbsoluteY),

    Opcode::new(0xA0, Ldy, 2, 2, Immediate),
    Opcode::new(0xA4, Ldy, 2, 3, ZeroPage),
    Opcode::new(0xB4, Ldy, 2, 4, ZeroPageX),
    Opcode::new(0xAC, Ldy, 3, 4, Absolute),
    Opcode::new(0xBC, Ldy, 3, 4, AbsoluteX),

    // Stores
    Opcode::new(0x85, Sta, 2, 3, ZeroPage),
    Opcode::new(0x95, Sta, 2, 4, ZeroPageX),
    Opcode::new(0x8D, Sta, 3, 4, Absolute),
    Opcode::new(0x9D, Sta, 3, 5, AbsoluteX),
    Opcode::new(0x99, Sta, 3, 5, AbsoluteY),
    Opcode::new(0x81, Sta, 2, 6, IndirectX),
    Opcode::new(0x91, Sta, 2, 6, IndirectY),

    Opcode::new(0x86, Stx, 2, 3, ZeroPage),
    Opcode::new(0x96, Stx, 2, 4, ZeroPageY),
    Opcode::new(0x8E, Stx, 3, 4, Absolute),

    Opcode::new(0x84, Sty, 2, 3, ZeroPage),
    Opcode::new(0x94, Sty, 2, 4, ZeroPageX),
    Opcode::new(0x8C, Sty, 3, 4, Absolute),

    // Transfers
    Opcode::new(0xAA, Tax, 1, 2, NoneAddressing),
    Opcode::new(0xA8, Tay, 1, 2, NoneAddressing),
    Opcode::new(0xBA, Tsx, 1, 2, NoneAddressing),
    Opcode::new(0x8A, Txa, 1, 2, NoneAddressing),
    Opcode::new(0x9A, Txs, 1, 2, NoneAddressing),
    Opcode::new(0x98, Tya, 1, 2, NoneAddressing),

    // Stack
    Opcode::new(0x48, Pha, 1, 3, NoneAddressing),
    Opcode::new(0x08, Php, 1, 3, NoneAddressing),
    Opcode::new(0x68, Pla, 1, 4, NoneAddressing),
    Opcode::new(0x28, Plp, 1, 4, NoneAddressing),
];

fn table() -> &'static [Option<Opcode>; 256] {
    static TABLE: OnceLock<[Option<Opcode>; 256]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [None; 256];
        for op in OPCODES {
            debug_assert!(table[op.code as usize].is_none(), "duplicate opcode {:02X}", op.code);
            table[op.code as usize] = Some(op);
        }
        log::debug!("Opcode table built with {} entries", OPCODES.len());
        table
    })
}

/// Descriptor for `code`, or `None` if it is not a documented opcode.
pub fn lookup(code: u8) -> Option<&'static Opcode> {
    table()[code as usize].as_ref()
}

/// Every documented opcode, in ascending opcode order.
pub fn iter() -> impl Iterator<Item = &'static Opcode> {
    table().iter().flatten()
}

#[cfg(test)]
mod tests {
    use super::AddressingMode::*;
    use super::Mnemonic::*;
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn covers_all_documented_opcodes() {
        assert_eq!(iter().count(), 151);
        let codes: HashSet<u8> = OPCODES.iter().map(|op| op.code).collect();
        assert_eq!(codes.len(), 151, "duplicate opcode in table");
    }

    #[test]
    fn lookup_returns_matching_code() {
        for op in iter() {
            assert_eq!(lookup(op.code), Some(op));
        }
    }

    #[test]
    fn lookup_is_stable_across_calls() {
        let first = lookup(0xA9).map(|op| op as *const Opcode);
        let second = lookup(0xA9).map(|op| op as *const Opcode);
        assert_eq!(first, second);
        assert!(std::ptr::eq(table(), table()));
    }

    #[test]
    fn undocumented_opcodes_are_absent() {
        for code in [0x02, 0x03, 0x1A, 0x80, 0xEB, 0xFF] {
            assert!(lookup(code).is_none(), "{:02X} should be empty", code);
        }
    }

    #[test]
    fn length_matches_addressing_mode() {
        for op in iter() {
            let expected = match op.mode {
                NoneAddressing if op.mnemonic.is_branch() => 2,
                NoneAddressing => 1,
                Immediate | ZeroPage | ZeroPageX | ZeroPageY | IndirectX | IndirectY => 2,
                Absolute | AbsoluteX | AbsoluteY | Indirect => 3,
            };
            assert_eq!(op.len, expected, "{} {:02X}", op.name(), op.code);
        }
    }

    #[test]
    fn required_instruction_families_present() {
        let mnemonics: HashSet<&str> = iter().map(|op| op.name()).collect();
        for name in [
            "LDA", "LDX", "LDY", "STA", "STX", "STY", "TAX", "TXA", "TAY", "TYA", "TSX", "TXS",
            "ADC", "SBC", "AND", "ORA", "EOR", "BIT", "ASL", "LSR", "ROL", "ROR", "INX", "INY",
            "DEX", "DEY", "INC", "DEC", "CMP", "CPX", "CPY", "BCC", "BCS", "BEQ", "BNE", "BMI",
            "BPL", "BVC", "BVS", "PHA", "PLA", "PHP", "PLP", "JMP", "JSR", "RTS", "RTI", "BRK",
            "NOP", "CLC", "SEC", "CLI", "SEI", "CLD", "SED", "CLV",
        ] {
            assert!(mnemonics.contains(name), "missing {}", name);
        }
    }

    #[test]
    fn shifts_have_accumulator_and_memory_forms() {
        for mnemonic in [Asl, Lsr, Rol, Ror] {
            let modes: Vec<AddressingMode> =
                iter().filter(|op| op.mnemonic == mnemonic).map(|op| op.mode).collect();
            assert!(modes.contains(&NoneAddressing));
            assert!(modes.contains(&ZeroPage));
            assert!(modes.contains(&AbsoluteX));
        }
    }

    #[test]
    fn jmp_indirect_entry() {
        let op = lookup(0x6C).expect("JMP indirect");
        assert_eq!(op.mnemonic, Jmp);
        assert_eq!(op.mode, Indirect);
        assert_eq!((op.len, op.cycles), (3, 5));
    }
}
