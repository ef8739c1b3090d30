//! DNN accelerator cycle-accurate simulator CLI.
//!
//! This binary provides a single entry point for all simulation modes. It performs:
//! 1. **Program run:** Load a JSON configuration and instruction stream, run to completion.
//! 2. **Demo:** Run the built-in full SB + NBin load on the default configuration.
//!
//! Verbosity is selected through `RUST_LOG`, e.g. `RUST_LOG=dnnsim_core=debug`.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing::info;

use dnnsim_core::common::SimResult;
use dnnsim_core::config::Config;
use dnnsim_core::core::control::Instruction;
use dnnsim_core::sim::{RunStatus, Simulator, loader};
use dnnsim_core::stats::STATS_SECTIONS;

#[derive(Parser, Debug)]
#[command(
    name = "dnnsim",
    author,
    version,
    about = "Cycle-accurate DianNao-style accelerator simulator",
    long_about = "Run an instruction stream through the NFU pipeline, SRAMs and DRAM model.\n\nExamples:\n  dnnsim demo\n  dnnsim run --config cfg.json --program prog.json --stats summary memory\n  RUST_LOG=dnnsim_core=trace dnnsim demo --dump"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run an instruction stream from a JSON file.
    Run {
        /// Configuration JSON; built-in defaults when omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Instruction stream JSON.
        #[arg(short, long)]
        program: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Run the built-in full-load program on the default configuration.
    Demo {
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(clap::Args, Debug)]
struct OutputArgs {
    /// Cycle limit; defaults to `general.max_cycles` from the configuration.
    #[arg(long)]
    max_cycles: Option<u64>,

    /// Statistics sections to print (summary, pipeline, memory, control); all when omitted.
    #[arg(long, num_args = 1..)]
    stats: Vec<String>,

    /// Print the final pipeline contents.
    #[arg(long)]
    dump: bool,
}

fn main() {
    // Select verbosity with env_var: e.g. `RUST_LOG=dnnsim_core=debug`
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .compact()
        .with_file(false)
        .with_line_number(false)
        .without_time()
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run {
            config,
            program,
            output,
        } => cmd_run(config, &program, &output),
        Commands::Demo { output } => simulate(Config::default(), loader::demo_program(), &output),
    };

    match result {
        Ok(RunStatus::Idle) => {}
        Ok(RunStatus::CycleLimit) => {
            eprintln!("\n[!] Cycle limit reached before the program finished");
            process::exit(2);
        }
        Err(e) => {
            eprintln!("\n[!] FATAL: {e}");
            process::exit(1);
        }
    }
}

/// Loads the configuration and program from disk and simulates them.
fn cmd_run(
    config: Option<PathBuf>,
    program: &Path,
    output: &OutputArgs,
) -> SimResult<RunStatus> {
    let config = match config {
        Some(path) => loader::load_config(&path)?,
        None => Config::default(),
    };
    let program = loader::load_program(program)?;
    simulate(config, program, output)
}

/// Issues every instruction, runs until idle or the cycle limit, and reports.
fn simulate(
    config: Config,
    program: Vec<Instruction>,
    output: &OutputArgs,
) -> SimResult<RunStatus> {
    if let Some(bad) = output
        .stats
        .iter()
        .find(|s| !STATS_SECTIONS.contains(&s.as_str()))
    {
        eprintln!(
            "[!] Unknown stats section '{bad}'; expected one of {}",
            STATS_SECTIONS.join(", ")
        );
        process::exit(1);
    }

    let max_cycles = output.max_cycles.unwrap_or(config.general.max_cycles);
    let mut sim = Simulator::new(config)?;
    info!(instructions = program.len(), max_cycles, "starting simulation");
    for inst in program {
        sim.issue(inst)?;
    }

    let status = sim.run_until_idle(max_cycles);
    if output.dump {
        print!("{}", sim.datapath().pipeline_dump());
    }
    sim.stats().print_sections(&output.stats);
    status
}
