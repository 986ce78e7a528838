//! Print the tag tree of a raw NBT file or a level.dat
//!
//! Run with: cargo run --bin nbt-dump -- level.dat --level

use std::path::PathBuf;

use clap::Parser;
use mcpe_viz::world::LevelInfo;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nbt-dump")]
#[command(about = "Dump little-endian NBT tag trees")]
struct Args {
    file: PathBuf,

    /// Input is a level.dat (or .mcworld) with the 8-byte header
    #[arg(long)]
    level: bool,

    /// Skip this many leading bytes before decoding
    #[arg(long, default_value = "0")]
    skip: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if args.level {
        let info = LevelInfo::load(&args.file)?;
        println!("format version: {}", info.format_version);
        print!("{}", mcpe_nbt::dump(&info.tags()));
        return Ok(());
    }

    let bytes = std::fs::read(&args.file)?;
    let body = bytes.get(args.skip..).ok_or("skip is past the end of the file")?;
    let decoded = mcpe_nbt::decode(body);
    print!("{}", mcpe_nbt::dump(&decoded.tags));
    if let Some(e) = decoded.error {
        eprintln!("Stopped after {} bytes: {e}", decoded.consumed);
    }
    Ok(())
}
