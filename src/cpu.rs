use log::{debug, trace, warn};

use crate::flags::Status;
use crate::memory::{RESET_VECTOR, STACK_BASE};
use crate::opcodes::{self, AddressingMode, Mnemonic, Opcode};
use crate::trace::{trace_line, TraceState};

/// Conventional stack pointer value after reset.
pub const STACK_RESET: u8 = 0xFD;

#[derive(Debug, Clone, Default)]
pub struct Cpu {
    pub pc: u16,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub status: Status,
    /// Sum of base cycle counts of executed instructions (metadata only).
    pub cycles: u64,
}

pub trait CpuBus {
    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, value: u8);

    fn read_u16(&mut self, addr: u16) -> u16 {
        read_word(addr, |a| self.read(a))
    }

    fn write_u16(&mut self, addr: u16, value: u16) {
        write_word(addr, value, |a, v| self.write(a, v));
    }
}

/// Little-endian word at `addr`. The high byte comes from `addr + 1`
/// wrapped to 16 bits, so a read at 0xFFFF takes its high byte from 0x0000.
pub(crate) fn read_word(addr: u16, mut read: impl FnMut(u16) -> u8) -> u16 {
    let low = read(addr) as u16;
    let high = read(addr.wrapping_add(1)) as u16;
    (high << 8) | low
}

/// Writes the low byte, then the high byte, with the same wraparound.
pub(crate) fn write_word(addr: u16, value: u16, mut write: impl FnMut(u16, u8)) {
    write(addr, value as u8);
    write(addr.wrapping_add(1), (value >> 8) as u8);
}

/// Why the execution loop stopped. Both are normal termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    /// `BRK` fetched at `address`.
    Break { address: u16 },
    /// `opcode` at `address` has no entry in the opcode table.
    UnimplementedOpcode { opcode: u8, address: u16 },
}

impl std::fmt::Display for HaltReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HaltReason::Break { address } => write!(f, "BRK at ${:04X}", address),
            HaltReason::UnimplementedOpcode { opcode, address } => {
                write!(f, "unimplemented opcode ${:02X} at ${:04X}", opcode, address)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Halted(HaltReason),
}

/// What an executed instruction did to control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// PC still points at the operand bytes; the loop skips them.
    Next,
    /// PC was set by the instruction.
    Jumped,
    Halt,
}

impl Cpu {
    /// All registers zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears registers and flags, sets SP to 0xFD and loads PC from the
    /// reset vector. Memory is left untouched.
    pub fn reset(&mut self, bus: &mut dyn CpuBus) {
        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.sp = STACK_RESET;
        self.status = Status::empty();
        self.cycles = 0;
        self.pc = bus.read_u16(RESET_VECTOR);
        debug!("CPU reset, PC={:04X}", self.pc);
    }

    /// Fetch, decode and execute one instruction.
    pub fn step(&mut self, bus: &mut dyn CpuBus, trace_state: &mut TraceState) -> Step {
        let pc_before = self.pc;
        let code = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);

        let Some(op) = opcodes::lookup(code) else {
            warn!("Unimplemented opcode: 0x{:02X} at PC 0x{:04X}", code, pc_before);
            return Step::Halted(HaltReason::UnimplementedOpcode {
                opcode: code,
                address: pc_before,
            });
        };

        if trace_state.enabled {
            let line = trace_line(self, pc_before, op, bus);
            trace_state.record(line);
        } else {
            trace!(
                "{:04X} {:02X} {} A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X}",
                pc_before,
                code,
                op.mnemonic,
                self.a,
                self.x,
                self.y,
                self.status.bits(),
                self.sp
            );
        }

        self.cycles += op.cycles as u64;
        match self.execute(op, bus) {
            Flow::Next => {
                self.pc = self.pc.wrapping_add(op.len as u16 - 1);
                Step::Continue
            }
            Flow::Jumped => Step::Continue,
            Flow::Halt => {
                debug!("BRK at {:04X}, halting", pc_before);
                Step::Halted(HaltReason::Break { address: pc_before })
            }
        }
    }

    fn execute(&mut self, op: &Opcode, bus: &mut dyn CpuBus) -> Flow {
        let mode = op.mode;
        match op.mnemonic {
            Mnemonic::Brk => return Flow::Halt,
            Mnemonic::Nop => {}

            // Loads and stores
            Mnemonic::Lda => {
                self.a = self.operand(mode, bus);
                self.status.update_zero_negative(self.a);
            }
            Mnemonic::Ldx => {
                self.x = self.operand(mode, bus);
                self.status.update_zero_negative(self.x);
            }
            Mnemonic::Ldy => {
                self.y = self.operand(mode, bus);
                self.status.update_zero_negative(self.y);
            }
            Mnemonic::Sta => {
                let addr = self.operand_address(mode, bus);
                bus.write(addr, self.a);
            }
            Mnemonic::Stx => {
                let addr = self.operand_address(mode, bus);
                bus.write(addr, self.x);
            }
            Mnemonic::Sty => {
                let addr = self.operand_address(mode, bus);
                bus.write(addr, self.y);
            }

            // Transfers
            Mnemonic::Tax => {
                self.x = self.a;
                self.status.update_zero_negative(self.x);
            }
            Mnemonic::Tay => {
                self.y = self.a;
                self.status.update_zero_negative(self.y);
            }
            Mnemonic::Txa => {
                self.a = self.x;
                self.status.update_zero_negative(self.a);
            }
            Mnemonic::Tya => {
                self.a = self.y;
                self.status.update_zero_negative(self.a);
            }
            Mnemonic::Tsx => {
                self.x = self.sp;
                self.status.update_zero_negative(self.x);
            }
            // TXS leaves the flags alone
            Mnemonic::Txs => self.sp = self.x,

            // Arithmetic and logic
            Mnemonic::Adc => {
                let value = self.operand(mode, bus);
                self.adc(value);
            }
            Mnemonic::Sbc => {
                let value = self.operand(mode, bus);
                self.sbc(value);
            }
            Mnemonic::And => {
                let value = self.operand(mode, bus);
                self.and(value);
            }
            Mnemonic::Ora => {
                let value = self.operand(mode, bus);
                self.ora(value);
            }
            Mnemonic::Eor => {
                let value = self.operand(mode, bus);
                self.eor(value);
            }
            Mnemonic::Bit => {
                let value = self.operand(mode, bus);
                self.bit(value);
            }

            // Shifts, rotates, memory increment/decrement
            Mnemonic::Asl => self.read_modify_write(mode, bus, Cpu::asl),
            Mnemonic::Lsr => self.read_modify_write(mode, bus, Cpu::lsr),
            Mnemonic::Rol => self.read_modify_write(mode, bus, Cpu::rol),
            Mnemonic::Ror => self.read_modify_write(mode, bus, Cpu::ror),
            Mnemonic::Inc => self.read_modify_write(mode, bus, Cpu::inc),
            Mnemonic::Dec => self.read_modify_write(mode, bus, Cpu::dec),

            Mnemonic::Inx => {
                self.x = self.x.wrapping_add(1);
                self.status.update_zero_negative(self.x);
            }
            Mnemonic::Iny => {
                self.y = self.y.wrapping_add(1);
                self.status.update_zero_negative(self.y);
            }
            Mnemonic::Dex => {
                self.x = self.x.wrapping_sub(1);
                self.status.update_zero_negative(self.x);
            }
            Mnemonic::Dey => {
                self.y = self.y.wrapping_sub(1);
                self.status.update_zero_negative(self.y);
            }

            // Compare
            Mnemonic::Cmp => {
                let value = self.operand(mode, bus);
                self.compare(self.a, value);
            }
            Mnemonic::Cpx => {
                let value = self.operand(mode, bus);
                self.compare(self.x, value);
            }
            Mnemonic::Cpy => {
                let value = self.operand(mode, bus);
                self.compare(self.y, value);
            }

            // Branches
            Mnemonic::Bcc => return self.branch(!self.status.carry(), bus),
            Mnemonic::Bcs => return self.branch(self.status.carry(), bus),
            Mnemonic::Bne => return self.branch(!self.status.zero(), bus),
            Mnemonic::Beq => return self.branch(self.status.zero(), bus),
            Mnemonic::Bpl => return self.branch(!self.status.negative(), bus),
            Mnemonic::Bmi => return self.branch(self.status.negative(), bus),
            Mnemonic::Bvc => return self.branch(!self.status.overflow(), bus),
            Mnemonic::Bvs => return self.branch(self.status.overflow(), bus),

            // Jumps and subroutines
            Mnemonic::Jmp => {
                self.pc = self.operand_address(mode, bus);
                return Flow::Jumped;
            }
            Mnemonic::Jsr => {
                let target = self.operand_address(mode, bus);
                // return address minus one: the last byte of the JSR operand
                self.push_word(self.pc.wrapping_add(1), bus);
                self.pc = target;
                return Flow::Jumped;
            }
            Mnemonic::Rts => {
                self.pc = self.pop_word(bus).wrapping_add(1);
                return Flow::Jumped;
            }
            Mnemonic::Rti => {
                self.status = Status::from_stack_byte(self.pop(bus));
                self.pc = self.pop_word(bus);
                return Flow::Jumped;
            }

            // Stack
            Mnemonic::Pha => self.push(self.a, bus),
            Mnemonic::Php => self.push(self.status.to_stack_byte(), bus),
            Mnemonic::Pla => {
                self.a = self.pop(bus);
                self.status.update_zero_negative(self.a);
            }
            Mnemonic::Plp => self.status = Status::from_stack_byte(self.pop(bus)),

            // Flags
            Mnemonic::Clc => self.status.set_carry(false),
            Mnemonic::Sec => self.status.set_carry(true),
            Mnemonic::Cli => self.status.set_interrupt_disable(false),
            Mnemonic::Sei => self.status.set_interrupt_disable(true),
            Mnemonic::Cld => self.status.set_decimal_mode(false),
            Mnemonic::Sed => self.status.set_decimal_mode(true),
            Mnemonic::Clv => self.status.set_overflow(false),
        }
        Flow::Next
    }

    /// Effective address for `mode`, reading operand bytes at PC without
    /// advancing it.
    ///
    /// Panics on `NoneAddressing`: an opcode without an operand reaching
    /// here means the opcode table is wrong.
    pub fn operand_address(&self, mode: AddressingMode, bus: &mut dyn CpuBus) -> u16 {
        match mode {
            AddressingMode::Immediate => self.pc,
            AddressingMode::ZeroPage => bus.read(self.pc) as u16,
            AddressingMode::ZeroPageX => bus.read(self.pc).wrapping_add(self.x) as u16,
            AddressingMode::ZeroPageY => bus.read(self.pc).wrapping_add(self.y) as u16,
            AddressingMode::Absolute => bus.read_u16(self.pc),
            AddressingMode::AbsoluteX => bus.read_u16(self.pc).wrapping_add(self.x as u16),
            AddressingMode::AbsoluteY => bus.read_u16(self.pc).wrapping_add(self.y as u16),
            AddressingMode::Indirect => {
                let ptr = bus.read_u16(self.pc);
                read_word_within_page(ptr, bus)
            }
            AddressingMode::IndirectX => {
                let ptr = bus.read(self.pc).wrapping_add(self.x);
                read_word_within_page(ptr as u16, bus)
            }
            AddressingMode::IndirectY => {
                let base = bus.read(self.pc);
                read_word_within_page(base as u16, bus).wrapping_add(self.y as u16)
            }
            AddressingMode::NoneAddressing => {
                panic!("addressing mode {:?} has no operand address", mode)
            }
        }
    }

    fn operand(&self, mode: AddressingMode, bus: &mut dyn CpuBus) -> u8 {
        let addr = self.operand_address(mode, bus);
        bus.read(addr)
    }

    /// Applies `f` to the accumulator for the implied form, or to the
    /// addressed byte otherwise.
    fn read_modify_write(&mut self, mode: AddressingMode, bus: &mut dyn CpuBus, f: fn(&mut Cpu, u8) -> u8) {
        if mode == AddressingMode::NoneAddressing {
            let value = self.a;
            self.a = f(self, value);
        } else {
            let addr = self.operand_address(mode, bus);
            let value = bus.read(addr);
            let result = f(self, value);
            bus.write(addr, result);
        }
    }

    // Stack operations
    pub fn push(&mut self, value: u8, bus: &mut dyn CpuBus) {
        bus.write(STACK_BASE + self.sp as u16, value);
        self.sp = self.sp.wrapping_sub(1);
    }

    pub fn pop(&mut self, bus: &mut dyn CpuBus) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        bus.read(STACK_BASE + self.sp as u16)
    }

    pub fn push_word(&mut self, value: u16, bus: &mut dyn CpuBus) {
        self.push((value >> 8) as u8, bus);
        self.push(value as u8, bus);
    }

    pub fn pop_word(&mut self, bus: &mut dyn CpuBus) -> u16 {
        let low = self.pop(bus) as u16;
        let high = self.pop(bus) as u16;
        (high << 8) | low
    }

    // Branch instructions
    fn branch(&mut self, condition: bool, bus: &mut dyn CpuBus) -> Flow {
        if !condition {
            return Flow::Next;
        }
        let offset = bus.read(self.pc) as i8;
        self.pc = self.pc.wrapping_add(1).wrapping_add(offset as u16);
        Flow::Jumped
    }

    // ALU operations
    fn ora(&mut self, value: u8) {
        self.a |= value;
        self.status.update_zero_negative(self.a);
    }

    fn and(&mut self, value: u8) {
        self.a &= value;
        self.status.update_zero_negative(self.a);
    }

    fn eor(&mut self, value: u8) {
        self.a ^= value;
        self.status.update_zero_negative(self.a);
    }

    fn adc(&mut self, value: u8) {
        let carry = self.status.carry() as u16;
        let sum = self.a as u16 + value as u16 + carry;
        let result = sum as u8;

        self.status.set_carry(sum > 0xFF);
        self.status.set_overflow((value ^ result) & (result ^ self.a) & 0x80 != 0);
        self.a = result;
        self.status.update_zero_negative(self.a);
    }

    /// A - M - (1 - C): ADC of the one's complement, with the carry-in
    /// supplying the +1 of the two's complement.
    fn sbc(&mut self, value: u8) {
        self.adc(!value);
    }

    fn compare(&mut self, register: u8, value: u8) {
        self.status.set_carry(register >= value);
        self.status.update_zero_negative(register.wrapping_sub(value));
    }

    fn bit(&mut self, value: u8) {
        self.status.set_zero(self.a & value == 0);
        self.status.set_negative(value & 0x80 != 0);
        self.status.set_overflow(value & 0x40 != 0);
    }

    fn asl(&mut self, value: u8) -> u8 {
        self.status.set_carry(value & 0x80 != 0);
        let result = value << 1;
        self.status.update_zero_negative(result);
        result
    }

    fn lsr(&mut self, value: u8) -> u8 {
        self.status.set_carry(value & 0x01 != 0);
        let result = value >> 1;
        self.status.update_zero_negative(result);
        result
    }

    fn rol(&mut self, value: u8) -> u8 {
        let carry = self.status.carry() as u8;
        self.status.set_carry(value & 0x80 != 0);
        let result = (value << 1) | carry;
        self.status.update_zero_negative(result);
        result
    }

    fn ror(&mut self, value: u8) -> u8 {
        let carry = if self.status.carry() { 0x80 } else { 0 };
        self.status.set_carry(value & 0x01 != 0);
        let result = (value >> 1) | carry;
        self.status.update_zero_negative(result);
        result
    }

    fn inc(&mut self, value: u8) -> u8 {
        let result = value.wrapping_add(1);
        self.status.update_zero_negative(result);
        result
    }

    fn dec(&mut self, value: u8) -> u8 {
        let result = value.wrapping_sub(1);
        self.status.update_zero_negative(result);
        result
    }
}

/// Little-endian word whose high byte is fetched from the same page as the
/// low byte. Covers zero-page pointers and the JMP ($xxFF) bug.
fn read_word_within_page(addr: u16, bus: &mut dyn CpuBus) -> u16 {
    let low = bus.read(addr) as u16;
    let high_addr = (addr & 0xFF00) | (addr as u8).wrapping_add(1) as u16;
    let high = bus.read(high_addr) as u16;
    (high << 8) | low
}
