// CPU instruction tracing and disassembly

use crate::cpu::{Cpu, CpuBus};
use crate::opcodes::{AddressingMode, Opcode};

/// Log target used for trace lines when tracing is enabled.
pub const TRACE_TARGET: &str = "nesium_cpu::trace";

pub struct TraceState {
    pub enabled: bool,
    captured: Option<Vec<String>>,
}

impl TraceState {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            captured: None,
        }
    }

    /// Enabled, and also keeps every line in memory.
    pub fn capturing() -> Self {
        Self {
            enabled: true,
            captured: Some(Vec::new()),
        }
    }

    pub fn record(&mut self, line: String) {
        log::info!(target: TRACE_TARGET, "{}", line);
        if let Some(lines) = self.captured.as_mut() {
            lines.push(line);
        }
    }

    pub fn lines(&self) -> &[String] {
        self.captured.as_deref().unwrap_or(&[])
    }
}

/// One trace line for the instruction at `pc`, with registers as they are
/// before it executes:
///
/// `8000  A9 05     LDA #$05      A:00 X:00 Y:00 P:00 SP:FD CYC:0`
pub fn trace_line(cpu: &Cpu, pc: u16, op: &Opcode, bus: &mut dyn CpuBus) -> String {
    let operand1 = (op.len > 1).then(|| bus.read(pc.wrapping_add(1)));
    let operand2 = (op.len > 2).then(|| bus.read(pc.wrapping_add(2)));

    let opcode_bytes = match (operand1, operand2) {
        (Some(b1), Some(b2)) => format!("{:02X} {:02X} {:02X}", op.code, b1, b2),
        (Some(b1), None) => format!("{:02X} {:02X}", op.code, b1),
        _ => format!("{:02X}", op.code),
    };
    let disasm = disassemble(op, pc, operand1, operand2);
    format!(
        "{:04X}  {:<8}  {:<12}  A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} CYC:{}",
        pc,
        opcode_bytes,
        disasm,
        cpu.a,
        cpu.x,
        cpu.y,
        cpu.status.bits(),
        cpu.sp,
        cpu.cycles
    )
}

// Instruction disassembly helper
pub fn disassemble(op: &Opcode, pc: u16, operand1: Option<u8>, operand2: Option<u8>) -> String {
    let mnemonic = op.name();
    let word = match (operand1, operand2) {
        (Some(lo), Some(hi)) => Some((hi as u16) << 8 | lo as u16),
        _ => None,
    };

    match op.mode {
        AddressingMode::NoneAddressing if op.mnemonic.is_branch() => match operand1 {
            Some(offset) => {
                let target = pc.wrapping_add(2).wrapping_add(offset as i8 as u16);
                format!("{} ${:04X}", mnemonic, target)
            }
            None => format!("{} $????", mnemonic),
        },
        AddressingMode::NoneAddressing if op.mnemonic.is_shift() => format!("{} A", mnemonic),
        AddressingMode::NoneAddressing => mnemonic.to_string(),
        AddressingMode::Immediate => match operand1 {
            Some(b) => format!("{} #${:02X}", mnemonic, b),
            None => format!("{} #$??", mnemonic),
        },
        AddressingMode::ZeroPage => match operand1 {
            Some(b) => format!("{} ${:02X}", mnemonic, b),
            None => format!("{} $??", mnemonic),
        },
        AddressingMode::ZeroPageX => match operand1 {
            Some(b) => format!("{} ${:02X},X", mnemonic, b),
            None => format!("{} $??,X", mnemonic),
        },
        AddressingMode::ZeroPageY => match operand1 {
            Some(b) => format!("{} ${:02X},Y", mnemonic, b),
            None => format!("{} $??,Y", mnemonic),
        },
        AddressingMode::Absolute => match word {
            Some(addr) => format!("{} ${:04X}", mnemonic, addr),
            None => format!("{} $????", mnemonic),
        },
        AddressingMode::AbsoluteX => match word {
            Some(addr) => format!("{} ${:04X},X", mnemonic, addr),
            None => format!("{} $????,X", mnemonic),
        },
        AddressingMode::AbsoluteY => match word {
            Some(addr) => format!("{} ${:04X},Y", mnemonic, addr),
            None => format!("{} $????,Y", mnemonic),
        },
        AddressingMode::Indirect => match word {
            Some(addr) => format!("{} (${:04X})", mnemonic, addr),
            None => format!("{} ($????)", mnemonic),
        },
        AddressingMode::IndirectX => match operand1 {
            Some(b) => format!("{} (${:02X},X)", mnemonic, b),
            None => format!("{} ($??,X)", mnemonic),
        },
        AddressingMode::IndirectY => match operand1 {
            Some(b) => format!("{} (${:02X}),Y", mnemonic, b),
            None => format!("{} ($??),Y", mnemonic),
        },
    }
}
