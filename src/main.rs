use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use miette::{bail, IntoDiagnostic, Result};

use formic::{
    emit_program, Ant, AsmContext, AsmParser, Assembler, Map, MapEntity, OpExecutor, Status,
};

/// Formic is an assembler toolchain and clockwork execution engine for
/// programmable ants.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Quickly provide a `.ant` file to run
    path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a text `.ant` or binary `.antb` program on a demo burrow
    Run {
        /// `.ant` or `.antb` file to run
        name: PathBuf,
        /// Clock pulses to simulate before giving up on a looping program
        #[arg(short, long, default_value_t = 256)]
        pulses: u64,
        /// Produce minimal output, suited for blackbox tests
        #[arg(short, long)]
        minimal: bool,
    },
    /// Check a `.ant` file without running or outputting binary
    Check {
        /// File to check
        name: PathBuf,
    },
    /// Create a binary `.antb` file to run later or inspect
    Compile {
        /// `.ant` file to compile
        name: PathBuf,
        /// Destination to output the `.antb` file
        dest: Option<PathBuf>,
    },
}

fn main() -> miette::Result<()> {
    use MsgColor::*;
    let args = Args::parse();
    env_logger::init();

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new() //
                .context_lines(formic::DIAGNOSTIC_CONTEXT_LINES)
                .build(),
        )
    }))?;

    if let Some(command) = args.command {
        match command {
            Command::Run {
                name,
                pulses,
                minimal,
            } => run(&name, pulses, minimal),
            Command::Check { name } => {
                file_message(Green, "Checking", &name);
                let _ = assemble_file(&name)?;
                message(Green, "Success", "no errors found!");
                Ok(())
            }
            Command::Compile { name, dest } => {
                file_message(Green, "Assembling", &name);
                let contents = fs::read_to_string(&name).into_diagnostic()?;
                let stmts = AsmParser::new(&contents)?.parse()?;
                let bytes = emit_program(&stmts);

                // Still run the decoder so undeclared jump targets are
                // caught at compile time, not on load
                let mut status = Status::new();
                let _ = Assembler::new(&bytes, AsmContext::default()).assemble(&mut status);
                if status.has_error {
                    bail!("{}", status.message);
                }

                let out_file_name =
                    dest.unwrap_or(name.with_extension("antb").file_name().unwrap().into());
                let mut file = File::create(&out_file_name).into_diagnostic()?;
                file.write_all(&bytes).into_diagnostic()?;

                message(Green, "Finished", "emit byte program");
                file_message(Green, "Saved", &out_file_name);
                Ok(())
            }
        }
    } else if let Some(path) = args.path {
        run(&path, 256, false)
    } else {
        println!("\n~ formic v{VERSION} ~");
        println!("{}", LOGO.truecolor(140, 90, 60).bold());
        println!("{SHORT_INFO}");
        std::process::exit(0);
    }
}

#[allow(unused)]
enum MsgColor {
    Green,
    Cyan,
    Red,
}

fn file_message(color: MsgColor, left: &str, right: &PathBuf) {
    let right = format!("target {}", right.to_str().unwrap());
    message(color, left, &right);
}

fn message<S>(color: MsgColor, left: S, right: S)
where
    S: Colorize + std::fmt::Display,
{
    let left = match color {
        MsgColor::Green => left.green(),
        MsgColor::Cyan => left.cyan(),
        MsgColor::Red => left.red(),
    };
    println!("{left:>12} {right}");
}

/// Assembles a program file into an executor, from either surface format.
fn assemble_file(name: &PathBuf) -> Result<OpExecutor> {
    let Some(ext) = name.extension() else {
        bail!("File has no extension. Exiting...");
    };
    let bytes = match ext.to_str().unwrap() {
        "antb" => {
            let mut file = File::open(name).into_diagnostic()?;
            let mut buffer = Vec::new();
            file.read_to_end(&mut buffer).into_diagnostic()?;
            buffer
        }
        "ant" => {
            let contents = fs::read_to_string(name).into_diagnostic()?;
            let stmts = AsmParser::new(&contents)?.parse()?;
            emit_program(&stmts)
        }
        _ => bail!("File has unknown extension. Exiting..."),
    };

    let mut status = Status::new();
    let exec = Assembler::new(&bytes, AsmContext::default()).assemble(&mut status);
    if status.has_error {
        bail!("{}", status.message);
    }
    Ok(exec)
}

fn run(name: &PathBuf, pulses: u64, minimal: bool) -> Result<()> {
    if !minimal {
        file_message(MsgColor::Green, "Assembling", name);
    }
    let exec = assemble_file(name)?;

    // Demo burrow: open floor ringed by diggable dirt, ant in the middle
    let (width, height) = (11, 11);
    let mut map = Map::new(width, height);
    for x in 0..width {
        map.set_wall(x, 0);
        map.set_wall(x, height - 1);
    }
    for y in 0..height {
        map.set_wall(0, y);
        map.set_wall(width - 1, y);
    }
    let mut ant = Ant::new(width / 2, height / 2, exec);
    if !map.try_place(&mut ant.body, width / 2, height / 2) {
        bail!("could not place ant on the demo burrow");
    }

    if !minimal {
        message(MsgColor::Green, "Running", "assembled program");
    }
    let mut elapsed = 0;
    while elapsed < pulses && !ant.is_idle() {
        ant.pulse(&mut map);
        elapsed += 1;
    }

    let data = ant.body.data();
    if minimal {
        println!(
            "a={} b={} zero={} x={} y={} held={} pulses={} halted={}",
            ant.registers.a,
            ant.registers.b,
            ant.registers.zero_flag,
            data.x,
            data.y,
            ant.inventory.total(),
            elapsed,
            ant.is_idle(),
        );
        return Ok(());
    }

    file_message(MsgColor::Green, "Completed", name);
    println!(
        "{:>12} a={} b={} zero={}",
        "Registers".cyan(),
        ant.registers.a,
        ant.registers.b,
        ant.registers.zero_flag
    );
    println!("{:>12} ({}, {})", "Position".cyan(), data.x, data.y);
    println!(
        "{:>12} {}/{} units",
        "Inventory".cyan(),
        ant.inventory.total(),
        ant.inventory.capacity()
    );
    println!(
        "{:>12} {} pulses, {}",
        "Clock".cyan(),
        elapsed,
        if ant.is_idle() { "halted" } else { "still running" }
    );
    Ok(())
}

const LOGO: &str = r"
       .-.     .-.     .-.
      (   )---(   )---(   )
     __/ \__ __/ \__ __/ \__
     \\   // \\   // \\   //
      ^   ^   ^   ^   ^   ^";

const SHORT_INFO: &str = r"
Welcome to formic, an assembler toolchain and clockwork execution engine
for programmable ants. Write `.ant` programs, compile them to `.antb`
byte programs, and watch them march.
Please use `-h` or `--help` to access the usage instructions.
";

const VERSION: &str = env!("CARGO_PKG_VERSION");
