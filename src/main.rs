mod config;

use clap::Parser;
use serde::Serialize;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use config::{Config, ConfigSource};
use nesium_cpu::{Emulator, HaltReason, TraceState};

#[derive(Parser)]
#[command(name = "nesium-cpu")]
#[command(about = "Run a raw 6502 program image until it halts")]
struct Args {
    /// Path to the raw program image (loaded at $8000)
    program: PathBuf,

    /// Config file to use instead of the one in the user config directory
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Log one trace line per executed instruction
    #[arg(long)]
    trace: bool,

    /// Stop after this many instructions if the program has not halted
    #[arg(long, conflicts_with = "unbounded")]
    max_steps: Option<u64>,

    /// Run until the program halts, however long that takes
    #[arg(long)]
    unbounded: bool,

    /// Print the final machine state as JSON
    #[arg(long)]
    json: bool,

    /// Also write log output to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Save the effective settings to the default config file
    #[arg(long)]
    write_config: bool,
}

/// A writer that writes to both stderr and a file
struct DualWriter {
    file: File,
}

impl DualWriter {
    fn new(file: File) -> Self {
        Self { file }
    }
}

impl Write for DualWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

#[derive(Serialize)]
struct FinalState {
    halt: String,
    halt_address: u16,
    /// The undecodable byte, for `unimplemented_opcode` halts.
    opcode: Option<u8>,
    pc: u16,
    a: u8,
    x: u8,
    y: u8,
    sp: u8,
    status: u8,
    cycles: u64,
    steps: u64,
}

impl FinalState {
    fn new(emulator: &Emulator, halt: HaltReason) -> Self {
        let cpu = emulator.cpu();
        let (kind, address, opcode) = match halt {
            HaltReason::Break { address } => ("brk", address, None),
            HaltReason::UnimplementedOpcode { opcode, address } => {
                ("unimplemented_opcode", address, Some(opcode))
            }
        };
        Self {
            halt: kind.to_string(),
            halt_address: address,
            opcode,
            pc: cpu.pc,
            a: cpu.a,
            x: cpu.x,
            y: cpu.y,
            sp: cpu.sp,
            status: cpu.status.bits(),
            cycles: cpu.cycles,
            steps: emulator.steps(),
        }
    }
}

fn init_logging(level: log::LevelFilter, log_file: Option<&PathBuf>) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    // RUST_LOG, when set, wins over the level from flags and config
    builder.parse_default_env();

    if let Some(path) = log_file {
        match File::create(path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(DualWriter::new(file))));
            }
            Err(e) => eprintln!("Warning: Could not create log file {}: {}", path.display(), e),
        }
    }

    builder.init();
}

/// Reads the config file and applies command-line overrides. The source is
/// handed back so it can be reported once logging is initialized.
fn load_config(args: &Args) -> Result<(Config, ConfigSource), config::ConfigError> {
    let (mut config, source) = match &args.config {
        Some(path) => (Config::load_from(path)?, ConfigSource::File(path.clone())),
        None => Config::load(),
    };
    if args.trace {
        config.trace = true;
    }
    if args.debug {
        config.log_level = "debug".to_string();
    }
    if let Some(max_steps) = args.max_steps {
        config.max_steps = max_steps;
    }
    if args.unbounded {
        config.max_steps = 0;
    }
    Ok((config, source))
}

fn main() -> ExitCode {
    let args = Args::parse();

    let (config, source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_logging(config.log_filter(), args.log_file.as_ref());
    source.report();

    if args.write_config {
        if let Err(e) = config.save(&Config::config_path()) {
            eprintln!("Error saving config: {}", e);
            return ExitCode::FAILURE;
        }
    }

    let program = match std::fs::read(&args.program) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error reading {}: {}", args.program.display(), e);
            return ExitCode::FAILURE;
        }
    };
    log::info!("Loaded {} ({} bytes)", args.program.display(), program.len());

    let mut emulator = Emulator::with_trace(TraceState::new(config.trace));
    let result = if config.max_steps == 0 {
        emulator.load_and_run(&program)
    } else {
        emulator.load_and_run_with_limit(&program, config.max_steps)
    };
    let halt = match result {
        Ok(halt) => halt,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let state = FinalState::new(&emulator, halt);
    if args.json {
        match serde_json::to_string_pretty(&state) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error encoding state: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        let cpu = emulator.cpu();
        println!("Halted: {}", halt);
        println!(
            "PC:{:04X} A:{:02X} X:{:02X} Y:{:02X} SP:{:02X} P:{:02X} [{}]",
            cpu.pc,
            cpu.a,
            cpu.x,
            cpu.y,
            cpu.sp,
            cpu.status.bits(),
            cpu.status
        );
        println!("Instructions: {} | Cycles: {}", state.steps, state.cycles);
    }

    ExitCode::SUCCESS
}
