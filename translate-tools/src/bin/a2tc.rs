use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;

use translate_tools::discover::discover;
use translate_tools::listing::print_listing;
use translate_tools::loader::parse_dos33;
use translate_tools::simplec::emit_simple_c;

/// Apple II DOS 3.3 binary translator.
#[derive(Parser, Debug)]
#[command(name = "a2tc", version, about, long_about = None)]
struct Args {
    /// Input DOS 3.3 binary file.
    input: PathBuf,

    /// Generate an asm listing (the default).
    #[arg(long)]
    asm: bool,

    /// Generate simple C code.
    #[arg(long = "simple-c", conflicts_with = "asm")]
    simple_c: bool,

    /// Verbosity level for stderr logging.
    #[arg(short, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = err.print();
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            let _ = err.print();
            return ExitCode::from(1);
        }
    };

    if stderrlog::new().verbosity(args.verbose as usize).init().is_err() {
        return ExitCode::from(2);
    }

    let bytes = match std::fs::read(&args.input) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("*** FATAL: {}: {}", args.input.display(), err);
            return ExitCode::from(2);
        }
    };

    let (start, image) = match parse_dos33(&bytes) {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("{}: {}", args.input.display(), err);
            return ExitCode::from(3);
        }
    };

    match run(start, &image, args.simple_c) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("*** FATAL: {:#}", err);
            ExitCode::from(2)
        }
    }
}

fn run(start: u16, image: &[u8], simple_c: bool) -> anyhow::Result<()> {
    let disc = discover(start, image);

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    if simple_c {
        emit_simple_c(&mut out, image, &disc).context("emitting C")?;
    } else {
        print_listing(&mut out, image, &disc).context("printing listing")?;
    }
    out.flush()?;
    Ok(())
}
