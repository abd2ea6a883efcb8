//! Nesium CPU core: a deterministic MOS 6502 instruction-set emulator.
//!
//! ```
//! use nesium_cpu::{Emulator, HaltReason};
//!
//! let mut emulator = Emulator::new();
//! // LDA #$C0 ; TAX ; INX ; BRK
//! let halt = emulator.load_and_run(&[0xA9, 0xC0, 0xAA, 0xE8, 0x00]).unwrap();
//! assert_eq!(halt, HaltReason::Break { address: 0x8004 });
//! assert_eq!(emulator.cpu().x, 0xC1);
//! ```

pub mod cpu;
pub mod emulator;
pub mod flags;
pub mod memory;
pub mod opcodes;
pub mod trace;

pub use cpu::{Cpu, CpuBus, HaltReason, Step};
pub use emulator::{Emulator, EmulatorError};
pub use flags::Status;
pub use memory::Memory;
pub use opcodes::{AddressingMode, Mnemonic, Opcode};
pub use trace::TraceState;
