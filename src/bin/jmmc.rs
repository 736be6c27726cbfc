use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use jmmc::config::Config;
use jmmc::error::JmmError;
use jmmc::Compiler;

#[derive(Parser)]
#[command(name = "jmmc")]
#[command(about = "Java-- compiler targeting Jasmin assembly")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a source file to a .j assembly file
    Compile {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Also write the intermediate representation (.ollir)
        #[arg(long)]
        emit_ir: bool,
    },

    /// Run semantic analysis and print diagnostics
    Check {
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Print the intermediate representation
    Ir {
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Assemble an intermediate representation file and print the Jasmin code
    Jasmin {
        #[arg(value_name = "IR_FILE")]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result = match &cli.command {
        Commands::Compile { input, output, emit_ir } => compile_file(input, output.as_deref(), *emit_ir),
        Commands::Check { input } => check_file(input),
        Commands::Ir { input } => print_ir(input),
        Commands::Jasmin { input } => assemble_file(input),
    };

    // 语义错误逐条打印后以非零状态退出
    if let Err(err) = &result {
        if let Some(JmmError::Semantic(reports)) = err.downcast_ref::<JmmError>() {
            for report in reports {
                eprintln!("{}", report);
            }
            process::exit(1);
        }
    }
    result
}

fn read_source(input: &Path) -> Result<String> {
    fs::read_to_string(input).with_context(|| format!("failed to read {}", input.display()))
}

fn compile_file(input: &Path, output: Option<&Path>, emit_ir: bool) -> Result<()> {
    let source = read_source(input)?;
    let output_dir = output.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
    let compiler = Compiler::new(Config::new(output_dir).with_emit_ir(emit_ir));

    let path = compiler.compile_to_files(&source)?;
    println!("{}", path.display());
    Ok(())
}

fn check_file(input: &Path) -> Result<()> {
    let source = read_source(input)?;
    let semantics = Compiler::default().analyze(&source)?;

    for report in &semantics.reports {
        println!("{}", report);
    }
    if semantics.has_errors() {
        process::exit(1);
    }
    Ok(())
}

fn print_ir(input: &Path) -> Result<()> {
    let source = read_source(input)?;
    print!("{}", Compiler::default().generate_ir(&source)?);
    Ok(())
}

fn assemble_file(input: &Path) -> Result<()> {
    let source = read_source(input)?;
    print!("{}", jmmc::assemble(&source)?);
    Ok(())
}
