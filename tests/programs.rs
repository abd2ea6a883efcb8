//! End-to-end programs run through the public `Emulator` API.

use nesium_cpu::flags::{FLAG_N, FLAG_Z};
use nesium_cpu::{Emulator, EmulatorError, HaltReason, TraceState};

fn run(program: &[u8]) -> (Emulator, HaltReason) {
    let mut emulator = Emulator::new();
    let halt = emulator
        .load_and_run_with_limit(program, 10_000)
        .expect("program should halt");
    (emulator, halt)
}

#[test]
fn test_0xa9_lda_immediate_load_data() {
    let (emulator, halt) = run(&[0xA9, 0x05, 0x00]);
    assert_eq!(emulator.cpu().a, 0x05);
    assert_eq!(emulator.cpu().status.bits() & FLAG_Z, 0);
    assert_eq!(emulator.cpu().status.bits() & FLAG_N, 0);
    assert_eq!(halt, HaltReason::Break { address: 0x8002 });
}

#[test]
fn test_0xa9_lda_zero_flag() {
    let (emulator, _) = run(&[0xA9, 0x00, 0x00]);
    assert!(emulator.cpu().status.zero());
}

#[test]
fn test_0xa9_lda_negative_flag() {
    let (emulator, _) = run(&[0xA9, 0xF0, 0x00]);
    assert!(emulator.cpu().status.negative());
}

#[test]
fn test_lda_from_memory() {
    let mut emulator = Emulator::new();
    emulator.memory_mut().write(0x10, 0x55);
    // LDA $10
    emulator.load_and_run(&[0xA5, 0x10, 0x00]).unwrap();
    assert_eq!(emulator.cpu().a, 0x55);
}

#[test]
fn test_0xaa_tax_move_a_to_x() {
    let (emulator, _) = run(&[0xA9, 0x0A, 0xAA, 0x00]);
    assert_eq!(emulator.cpu().x, 10);
}

#[test]
fn test_5_ops_working_together() {
    // LDA #$C0 ; TAX ; INX ; BRK
    let (emulator, _) = run(&[0xA9, 0xC0, 0xAA, 0xE8, 0x00]);
    assert_eq!(emulator.cpu().x, 0xC1);
}

#[test]
fn test_inx_overflow() {
    let (emulator, _) = run(&[0xA9, 0xFF, 0xAA, 0xE8, 0xE8, 0x00]);
    assert_eq!(emulator.cpu().x, 0x01);
}

#[test]
fn test_sta_writes_memory() {
    // LDA #$42 ; STA $0200
    let (emulator, _) = run(&[0xA9, 0x42, 0x8D, 0x00, 0x02, 0x00]);
    assert_eq!(emulator.memory().read(0x0200), 0x42);
}

#[test]
fn test_unimplemented_opcode_is_reported() {
    let (emulator, halt) = run(&[0xA9, 0x01, 0xFF]);
    assert_eq!(halt, HaltReason::UnimplementedOpcode { opcode: 0xFF, address: 0x8002 });
    assert_ne!(halt, HaltReason::Break { address: 0x8002 });
    assert_eq!(emulator.cpu().a, 0x01);
}

#[test]
fn test_empty_memory_halts_on_brk() {
    // a zeroed image is all BRK
    let (_, halt) = run(&[]);
    assert_eq!(halt, HaltReason::Break { address: 0x8000 });
}

#[test]
fn test_multiply_by_repeated_addition() {
    // 7 * 6 into $00
    let program = [
        0xA9, 0x00, // LDA #0
        0xA2, 0x06, // LDX #6
        0x18, //       loop: CLC
        0x69, 0x07, //       ADC #7
        0xCA, //             DEX
        0xD0, 0xFA, //       BNE loop
        0x85, 0x00, // STA $00
        0x00,
    ];
    let (emulator, _) = run(&program);
    assert_eq!(emulator.memory().read(0x00), 42);
}

#[test]
fn test_16_bit_counter_with_carry() {
    // add 0x01FF + 0x0001 as two bytes at $10/$11
    let program = [
        0xA9, 0xFF, 0x85, 0x10, // LDA #$FF ; STA $10
        0xA9, 0x01, 0x85, 0x11, // LDA #$01 ; STA $11
        0x18, //                   CLC
        0xA5, 0x10, 0x69, 0x01, 0x85, 0x10, // LDA $10 ; ADC #1 ; STA $10
        0xA5, 0x11, 0x69, 0x00, 0x85, 0x11, // LDA $11 ; ADC #0 ; STA $11
        0x00,
    ];
    let (emulator, _) = run(&program);
    assert_eq!(emulator.memory().read_u16(0x10), 0x0200);
}

#[test]
fn test_nested_subroutines() {
    let program = [
        0x20, 0x09, 0x80, // $8000 JSR outer
        0xA0, 0x33, //       $8003 LDY #$33
        0x00, //             $8005 BRK
        0xEA, 0xEA, 0xEA, // $8006 padding
        0xA9, 0x11, //       $8009 outer: LDA #$11
        0x20, 0x0F, 0x80, // $800B JSR inner
        0x60, //             $800E RTS
        0xA2, 0x22, //       $800F inner: LDX #$22
        0x60, //             $8011 RTS
    ];
    let (emulator, halt) = run(&program);
    let cpu = emulator.cpu();
    assert_eq!((cpu.a, cpu.x, cpu.y), (0x11, 0x22, 0x33));
    assert_eq!(cpu.sp, 0xFD);
    assert_eq!(halt, HaltReason::Break { address: 0x8005 });
}

#[test]
fn test_copy_loop_with_indirect_y() {
    // copy 4 bytes from $0300 to $0400 through pointers at $20 and $22
    let mut emulator = Emulator::new();
    emulator.memory_mut().load(0x0300, &[1, 2, 3, 4]);
    emulator.memory_mut().write_u16(0x20, 0x0300);
    emulator.memory_mut().write_u16(0x22, 0x0400);
    let program = [
        0xA0, 0x00, //       LDY #0
        0xB1, 0x20, //       loop: LDA ($20),Y
        0x91, 0x22, //       STA ($22),Y
        0xC8, //             INY
        0xC0, 0x04, //       CPY #4
        0xD0, 0xF7, //       BNE loop
        0x00,
    ];
    emulator.load_and_run(&program).unwrap();
    assert_eq!(&emulator.memory().as_slice()[0x0400..0x0404], &[1, 2, 3, 4]);
}

#[test]
fn test_jmp_indirect_page_wrap_end_to_end() {
    let mut emulator = Emulator::new();
    emulator.memory_mut().write(0x10FF, 0x10);
    emulator.memory_mut().write(0x1000, 0x80);
    emulator.memory_mut().write(0x1100, 0x90);
    // $8000 JMP ($10FF) ; $8003 LDA #$01 ; BRK ; ... $8010 LDA #$02 ; BRK
    let mut program = vec![0x6C, 0xFF, 0x10, 0xA9, 0x01, 0x00];
    program.resize(0x10, 0xEA);
    program.extend_from_slice(&[0xA9, 0x02, 0x00]);
    emulator.load_and_run(&program).unwrap();
    assert_eq!(emulator.cpu().a, 0x02);
}

#[test]
fn test_rti_returns_to_pushed_address() {
    // push $8010 and a status, then RTI
    let mut program = vec![
        0xA9, 0x80, 0x48, // LDA #$80 ; PHA   (high)
        0xA9, 0x10, 0x48, // LDA #$10 ; PHA   (low)
        0xA9, 0xC3, 0x48, // LDA #$C3 ; PHA   (status)
        0x40, //             RTI
    ];
    program.resize(0x10, 0xEA);
    program.extend_from_slice(&[0xA2, 0x01, 0x00]); // $8010 LDX #1 ; BRK
    let (emulator, halt) = run(&program);
    assert_eq!(halt, HaltReason::Break { address: 0x8012 });
    // LDX #1 clears N and Z; C and V came from the pulled status
    assert!(emulator.cpu().status.carry());
    assert!(emulator.cpu().status.overflow());
    assert!(!emulator.cpu().status.negative());
}

#[test]
fn test_step_limit_reports_position() {
    let mut emulator = Emulator::new();
    // loop: INX ; JMP loop
    let err = emulator
        .load_and_run_with_limit(&[0xE8, 0x4C, 0x00, 0x80], 11)
        .unwrap_err();
    assert_eq!(err, EmulatorError::StepLimitExceeded { steps: 11, pc: 0x8001 });
    assert_eq!(emulator.cpu().x, 6);
}

#[test]
fn test_reload_keeps_registers_until_reset() {
    let mut emulator = Emulator::new();
    emulator.load_and_run(&[0xA9, 0x07, 0x00]).unwrap();
    emulator.load(&[0xA2, 0x01, 0x00]).unwrap();
    assert_eq!(emulator.cpu().a, 0x07);
    emulator.reset();
    assert_eq!(emulator.cpu().a, 0x00);
    emulator.run();
    assert_eq!(emulator.cpu().x, 0x01);
}

#[test]
fn test_runs_are_deterministic() {
    let program = [0xA2, 0x10, 0xCA, 0x8A, 0x9D, 0x00, 0x02, 0xD0, 0xF9, 0x00];
    let (first, _) = run(&program);
    let (second, _) = run(&program);
    assert_eq!(first.memory().as_slice(), second.memory().as_slice());
    assert_eq!(first.cpu().cycles, second.cpu().cycles);
    assert_eq!(first.steps(), second.steps());
}

#[test]
fn test_trace_captures_every_instruction() {
    let mut emulator = Emulator::with_trace(TraceState::capturing());
    emulator.load_and_run(&[0xA9, 0xC0, 0xAA, 0xE8, 0x00]).unwrap();
    let lines = emulator.trace().lines();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("8000  A9 C0     LDA #$C0"));
    assert!(lines[1].starts_with("8002  AA        TAX"));
    assert!(lines[1].contains("A:C0 X:00"));
    assert!(lines[3].starts_with("8004  00        BRK"));
    assert!(lines[3].contains("X:C1"));
}
