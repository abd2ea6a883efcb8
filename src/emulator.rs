use log::{debug, info};
use thiserror::Error;

use crate::cpu::{Cpu, HaltReason, Step};
use crate::memory::{Memory, MEMORY_SIZE, PROGRAM_START, RESET_VECTOR};
use crate::trace::TraceState;

/// Largest image `load` accepts: everything from 0x8000 to the top of memory.
pub const MAX_PROGRAM_SIZE: usize = MEMORY_SIZE - PROGRAM_START as usize;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmulatorError {
    #[error("Program too large: {size} bytes (max {max})")]
    ProgramTooLarge { size: usize, max: usize },
    #[error("No halt after {steps} instructions (PC ${pc:04X})")]
    StepLimitExceeded { steps: u64, pc: u16 },
}

/// A CPU and its 64KB memory, driven to completion by the host.
pub struct Emulator {
    cpu: Cpu,
    memory: Memory,
    trace: TraceState,
    steps: u64,
}

impl Emulator {
    /// Zeroed registers and memory, tracing off.
    pub fn new() -> Self {
        Self::with_trace(TraceState::new(false))
    }

    pub fn with_trace(trace: TraceState) -> Self {
        Self {
            cpu: Cpu::new(),
            memory: Memory::new(),
            trace,
            steps: 0,
        }
    }

    /// Copies `program` to 0x8000 and points the reset vector at it.
    /// Registers are untouched.
    pub fn load(&mut self, program: &[u8]) -> Result<(), EmulatorError> {
        if program.len() > MAX_PROGRAM_SIZE {
            return Err(EmulatorError::ProgramTooLarge {
                size: program.len(),
                max: MAX_PROGRAM_SIZE,
            });
        }
        self.memory.load(PROGRAM_START, program);
        self.memory.write_u16(RESET_VECTOR, PROGRAM_START);
        debug!("Loaded {} bytes at {:04X}", program.len(), PROGRAM_START);
        Ok(())
    }

    pub fn reset(&mut self) {
        self.cpu.reset(&mut self.memory);
        self.steps = 0;
    }

    /// Executes a single instruction.
    pub fn step(&mut self) -> Step {
        let step = self.cpu.step(&mut self.memory, &mut self.trace);
        self.steps += 1;
        step
    }

    /// Runs until a halting opcode. A program that never halts never returns.
    pub fn run(&mut self) -> HaltReason {
        loop {
            if let Step::Halted(reason) = self.step() {
                return self.halted(reason);
            }
        }
    }

    /// Like `run`, but gives up after `max_steps` instructions.
    pub fn run_with_limit(&mut self, max_steps: u64) -> Result<HaltReason, EmulatorError> {
        for _ in 0..max_steps {
            if let Step::Halted(reason) = self.step() {
                return Ok(self.halted(reason));
            }
        }
        Err(EmulatorError::StepLimitExceeded {
            steps: max_steps,
            pc: self.cpu.pc,
        })
    }

    /// `load`, `reset`, then `run`.
    pub fn load_and_run(&mut self, program: &[u8]) -> Result<HaltReason, EmulatorError> {
        self.load(program)?;
        self.reset();
        Ok(self.run())
    }

    pub fn load_and_run_with_limit(
        &mut self,
        program: &[u8],
        max_steps: u64,
    ) -> Result<HaltReason, EmulatorError> {
        self.load(program)?;
        self.reset();
        self.run_with_limit(max_steps)
    }

    fn halted(&self, reason: HaltReason) -> HaltReason {
        info!(
            "Halted: {} after {} instructions ({} cycles)",
            reason, self.steps, self.cpu.cycles
        );
        reason
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// For preparing memory (data tables, vectors) before a run.
    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    pub fn trace(&self) -> &TraceState {
        &self.trace
    }

    /// Instructions executed since the last reset, halting opcode included.
    pub fn steps(&self) -> u64 {
        self.steps
    }
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new()
    }
}
