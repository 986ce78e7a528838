//! Render maps and a GeoJSON feature document from an MCPE world
//!
//! Run with: cargo run --bin mcpe-viz -- --store ~/games/com.mojang/minecraftWorlds/abc --out out/world

use std::path::PathBuf;

use clap::Parser;
use mcpe_viz::app::{self, VizConfig};
use mcpe_viz::renderer::CropRect;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mcpe-viz")]
#[command(about = "MCPE world save reader and map renderer")]
struct Args {
    /// World directory holding db/ and level.dat, or a record dump file
    #[arg(long, alias = "db")]
    store: PathBuf,

    /// level.dat, or a .mcworld archive containing one (default: the world's own)
    #[arg(long)]
    level: Option<PathBuf>,

    /// Base path for every output file
    #[arg(long)]
    out: String,

    /// JSON tables merged over the built-in ones
    #[arg(long)]
    schema: Option<PathBuf>,

    /// Draw chunk boundaries
    #[arg(long)]
    grid: bool,

    /// Overworld render mode; repeatable, or `all`
    #[arg(long = "mode", default_value = "terrain")]
    modes: Vec<String>,

    /// Nether render mode; repeatable, or `all`
    #[arg(long = "nether-mode", default_value = "terrain")]
    nether_modes: Vec<String>,

    /// Blocks never shown as the top block, as DIM:ID,...
    #[arg(long)]
    hide_top: Option<String>,

    /// Blocks always shown as the top block, as DIM:ID,...
    #[arg(long)]
    force_top: Option<String>,

    /// Render overworld layer slices and assemble a movie
    #[arg(long)]
    movie: bool,

    /// Same for the nether
    #[arg(long)]
    movie_nether: bool,

    /// Movie crop rectangle x,y,w,h in overworld pixels
    #[arg(long)]
    movie_dim: Option<CropRect>,

    /// Stop after N records
    #[arg(long, value_name = "N")]
    short_run: Option<usize>,

    #[arg(long)]
    no_geojson: bool,

    #[arg(short, long)]
    verbose: bool,

    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let default_level = if args.verbose {
        "debug"
    } else if args.quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let hide = args.hide_top.as_deref().map(app::parse_block_list).transpose()?.unwrap_or_default();
    let force = args.force_top.as_deref().map(app::parse_block_list).transpose()?.unwrap_or_default();

    let mut config = VizConfig::new(args.store, args.out);
    config.level = args.level;
    config.schema = args.schema;
    config.grid = args.grid;
    config.modes = app::parse_modes(&args.modes)?;
    config.nether_modes = app::parse_modes(&args.nether_modes)?;
    config.filters = app::block_filters(&hide, &force);
    config.movie = args.movie;
    config.movie_nether = args.movie_nether;
    config.movie_crop = args.movie_dim;
    config.limit = args.short_run;
    config.geojson = !args.no_geojson;

    let summary = app::run(&config)?;
    eprintln!(
        "Done: {} records, {} images, {} movies",
        summary.stats.records,
        summary.images.len(),
        summary.movies.len()
    );
    Ok(())
}
