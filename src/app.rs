//! End-to-end run: load, pre-scan, scan, render, write
//!
//! Output files share the base path given in [`VizConfig::out_base`]:
//! - `<base>.<dim><suffix>.png` per render mode
//! - `<base>.mcpe_viz_slice.<dim>.<NNN>.png` and `<base>.<dim>.mp4` for movies
//! - `<base>.geojson`

use std::path::PathBuf;

use crate::codec::BlockFilter;
use crate::error::{Error, Result};
use crate::features::{FeatureCollector, Projection};
use crate::renderer::{slice_pattern, write_png, Compositor, CropRect, RenderMode, SliceRenderer, VideoEncoder};
use crate::schema::Schema;
use crate::world::{default_level_path, open_store, scan, Dimension, LevelInfo, ScanOptions, ScanStats, WorldIndex, WorldStore};

#[derive(Debug, Clone)]
pub struct VizConfig {
    /// World directory, its `db/` directory, or a record dump file
    pub store: PathBuf,
    /// `level.dat` or a `.mcworld` archive; defaults to the one in the world directory
    pub level: Option<PathBuf>,
    pub out_base: String,
    /// Overlay on top of the built-in tables
    pub schema: Option<PathBuf>,
    pub grid: bool,
    pub modes: Vec<RenderMode>,
    pub nether_modes: Vec<RenderMode>,
    /// Extra top-block overrides, indexed by dimension
    pub filters: [BlockFilter; 2],
    pub movie: bool,
    pub movie_nether: bool,
    /// Movie crop in overworld pixels
    pub movie_crop: Option<CropRect>,
    /// Short run: stop after this many records
    pub limit: Option<usize>,
    pub geojson: bool,
}

impl VizConfig {
    pub fn new(store: impl Into<PathBuf>, out_base: impl Into<String>) -> Self {
        Self {
            store: store.into(),
            level: None,
            out_base: out_base.into(),
            schema: None,
            grid: false,
            modes: vec![RenderMode::Terrain],
            nether_modes: vec![RenderMode::Terrain],
            filters: Default::default(),
            movie: false,
            movie_nether: false,
            movie_crop: None,
            limit: None,
            geojson: true,
        }
    }

    fn modes(&self, dim: Dimension) -> &[RenderMode] {
        match dim {
            Dimension::Overworld => &self.modes,
            Dimension::Nether => &self.nether_modes,
        }
    }

    fn movie_enabled(&self, dim: Dimension) -> bool {
        match dim {
            Dimension::Overworld => self.movie,
            Dimension::Nether => self.movie_nether,
        }
    }
}

/// What a run produced
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub stats: ScanStats,
    pub images: Vec<PathBuf>,
    pub slices: Vec<PathBuf>,
    pub movies: Vec<PathBuf>,
    pub geojson: Option<PathBuf>,
}

pub fn image_path(base: &str, dim: Dimension, mode: RenderMode) -> PathBuf {
    PathBuf::from(format!("{base}.{dim}{}.png", mode.file_suffix()))
}

pub fn movie_path(base: &str, dim: Dimension) -> PathBuf {
    PathBuf::from(format!("{base}.{dim}.mp4"))
}

/// Parse render mode names; `all` expands to every mode
pub fn parse_modes<S: AsRef<str>>(names: &[S]) -> Result<Vec<RenderMode>> {
    let mut modes = Vec::new();
    for name in names {
        let name = name.as_ref().trim();
        if name.eq_ignore_ascii_case("all") {
            return Ok(RenderMode::ALL.to_vec());
        }
        let mode: RenderMode = name.parse()?;
        if !modes.contains(&mode) {
            modes.push(mode);
        }
    }
    Ok(modes)
}

/// Parse `DIM:ID,DIM:ID,...`; ids are decimal or `0x` hex
pub fn parse_block_list(s: &str) -> Result<Vec<(Dimension, u8)>> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|part| -> Result<(Dimension, u8)> {
            let (dim, id) = part
                .split_once(':')
                .ok_or_else(|| Error::InvalidArgument(format!("'{part}': expected DIM:ID")))?;
            let id = id.trim();
            let parsed = match id.strip_prefix("0x").or_else(|| id.strip_prefix("0X")) {
                Some(hex) => u8::from_str_radix(hex, 16),
                None => id.parse(),
            };
            let id = parsed.map_err(|_| Error::InvalidArgument(format!("'{part}': bad block id")))?;
            Ok((dim.parse()?, id))
        })
        .collect()
}

/// Per-dimension filters from parsed hide and force lists
pub fn block_filters(hide: &[(Dimension, u8)], force: &[(Dimension, u8)]) -> [BlockFilter; 2] {
    let mut filters: [BlockFilter; 2] = Default::default();
    for &(dim, id) in hide {
        filters[dim.index()].hide.push(id);
    }
    for &(dim, id) in force {
        filters[dim.index()].force.push(id);
    }
    filters
}

pub fn run(config: &VizConfig) -> Result<RunSummary> {
    let schema = Schema::load(config.schema.as_deref())?;
    let store = open_store(&config.store)?;
    let level_path = config.level.clone().or_else(|| default_level_path(&config.store));
    let level = level_path.as_deref().map(LevelInfo::load).transpose()?;
    run_with(config, &schema, store.as_ref(), level.as_ref())
}

/// Run against an already opened store
pub fn run_with(
    config: &VizConfig,
    schema: &Schema,
    store: &dyn WorldStore,
    level: Option<&LevelInfo>,
) -> Result<RunSummary> {
    let base = config.out_base.as_str();
    let mut summary = RunSummary::default();

    let mut index = WorldIndex::new(config.filters.clone());
    let bounds = index.calc_chunk_bounds(store, config.limit)?.clone();
    let projection = Projection::new(&bounds);
    log_landmarks(&projection, level);

    let mut features = FeatureCollector::new(projection);
    summary.stats = scan(store, schema, &mut index, &mut features, &ScanOptions { limit: config.limit })?;
    if let Some((ix, iy)) = features.player_position() {
        tracing::info!("Local player is at image ({ix}, {iy})");
    }

    for dim in Dimension::ALL {
        tracing::info!("{}", index.report(dim, schema));
    }

    let compositor = Compositor::new(schema, config.grid);
    for dim in Dimension::ALL {
        for &mode in config.modes(dim) {
            let Some(raster) = compositor.render(&index, &bounds, dim, mode) else {
                tracing::info!(dimension = %dim, mode = %mode, "No terrain, skipping image");
                continue;
            };
            let path = image_path(base, dim, mode);
            write_png(&raster, &path)?;
            tracing::info!(path = %path.display(), "Generate image");
            summary.images.push(path);
        }
    }

    let slicer = SliceRenderer::new(schema, config.grid);
    for dim in Dimension::ALL.into_iter().filter(|&d| config.movie_enabled(d)) {
        let files = slicer.write_slices(store, &index, &bounds, dim, config.movie_crop, base)?;
        if files.is_empty() {
            continue;
        }
        summary.slices.extend(files);
        let out = movie_path(base, dim);
        match VideoEncoder::ffmpeg().encode(&slice_pattern(base, dim), &out) {
            Ok(()) => summary.movies.push(out),
            Err(e) => tracing::error!("Failed to create movie: {e}"),
        }
    }

    if config.geojson {
        let path = PathBuf::from(format!("{base}.geojson"));
        features.write_geojson(&path)?;
        summary.geojson = Some(path);
    }

    tracing::info!(
        images = summary.images.len(),
        movies = summary.movies.len(),
        features = features.len(),
        "Done"
    );
    Ok(summary)
}

fn log_landmarks(projection: &Projection, level: Option<&LevelInfo>) {
    if projection.image_size(Dimension::Overworld).is_none() {
        return;
    }
    let (ix, iy) = projection.text_point(0, 0.0, 0.0);
    tracing::info!("World (0, 0) is at image ({ix}, {iy})");
    if let Some([x, _, z]) = level.and_then(LevelInfo::spawn) {
        let (ix, iy) = projection.text_point(0, x as f64, z as f64);
        tracing::info!("World Spawn ({x}, {z}) is at image ({ix}, {iy})");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::chunk::tests::TerrainBuilder;
    use crate::codec::{ChunkKey, CHUNK_TERRAIN};
    use crate::world::MemoryStore;
    use mcpe_nbt::{Compound, Tag, TagList};

    fn temp_base(name: &str) -> String {
        std::env::temp_dir()
            .join(format!("mcpe-viz-{}-{name}", std::process::id()))
            .to_string_lossy()
            .into_owned()
    }

    fn remove_outputs(summary: &RunSummary) {
        let files = summary
            .images
            .iter()
            .chain(&summary.slices)
            .chain(&summary.movies)
            .chain(&summary.geojson);
        for path in files {
            std::fs::remove_file(path).ok();
        }
    }

    fn world() -> MemoryStore {
        let mut store = MemoryStore::new();
        let terrain = TerrainBuilder::new().block(3, 3, 62, 2, 0).column(3, 3, 63, 0x1f953e_01).build();
        store.insert(ChunkKey::new(0, 0, 0, CHUNK_TERRAIN).encode(), terrain.clone());
        store.insert(ChunkKey::new(-1, 2, 0, CHUNK_TERRAIN).encode(), terrain);

        let player = Compound::new()
            .with("id", Tag::Int(63))
            .with(
                "Pos",
                Tag::List(TagList::from_items(vec![Tag::Float(5.5), Tag::Float(64.0), Tag::Float(7.0)]).unwrap()),
            );
        store.insert(b"~local_player".to_vec(), mcpe_nbt::encode_tag("", &Tag::Compound(player)).unwrap());
        store
    }

    #[test]
    fn test_full_run() {
        let schema = Schema::builtin().unwrap();
        let store = world();
        let mut config = VizConfig::new("unused.dump", temp_base("full"));
        config.modes = RenderMode::ALL.to_vec();
        config.nether_modes = vec![RenderMode::Terrain];
        config.grid = true;

        let summary = run_with(&config, &schema, &store, None).unwrap();
        let written: Vec<bool> = summary.images.iter().map(|p| p.exists()).collect();
        let geojson = summary.geojson.as_ref().map(std::fs::read_to_string);
        remove_outputs(&summary);

        // no nether terrain, so only the overworld images
        assert_eq!(summary.images.len(), RenderMode::ALL.len());
        assert!(written.iter().all(|&w| w));
        assert_eq!(summary.images[0], PathBuf::from(format!("{}.overworld.png", config.out_base)));
        assert_eq!(summary.stats.terrain_chunks, 2);

        let doc: serde_json::Value = serde_json::from_str(&geojson.unwrap().unwrap()).unwrap();
        assert_eq!(doc["type"], "FeatureCollection");
        assert_eq!(doc["features"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_movie_failure_is_not_fatal() {
        let schema = Schema::builtin().unwrap();
        let store = world();
        let mut config = VizConfig::new("unused.dump", temp_base("movie"));
        config.modes.clear();
        config.nether_modes.clear();
        config.geojson = false;
        config.movie = true;
        config.movie_nether = true;
        config.movie_crop = Some(CropRect { x: 0, y: 0, w: 16, h: 16 });

        let summary = run_with(&config, &schema, &store, None).unwrap();
        remove_outputs(&summary);
        // nether has no terrain; the encoder may or may not be installed
        assert_eq!(summary.slices.len(), 128);
        assert!(summary.movies.len() <= 1);
        assert!(summary.geojson.is_none());
    }

    #[test]
    fn test_short_run() {
        let schema = Schema::builtin().unwrap();
        let store = world();
        let mut config = VizConfig::new("unused.dump", temp_base("short"));
        config.modes.clear();
        config.nether_modes.clear();
        config.geojson = false;
        config.limit = Some(1);
        let summary = run_with(&config, &schema, &store, None).unwrap();
        assert_eq!(summary.stats.records, 1);
    }

    #[test]
    fn test_parse_modes() {
        assert_eq!(parse_modes(&["all"]).unwrap().len(), RenderMode::ALL.len());
        assert_eq!(
            parse_modes(&["biome", "terrain", "biome"]).unwrap(),
            vec![RenderMode::Biome, RenderMode::Terrain]
        );
        assert!(parse_modes(&["sepia"]).is_err());
    }

    #[test]
    fn test_parse_block_list() {
        let list = parse_block_list("1:0x57, 0:7,nether:10").unwrap();
        assert_eq!(
            list,
            vec![(Dimension::Nether, 0x57), (Dimension::Overworld, 7), (Dimension::Nether, 10)]
        );
        assert!(parse_block_list("").unwrap().is_empty());
        assert!(parse_block_list("7").is_err());
        assert!(parse_block_list("0:300").is_err());
        assert!(parse_block_list("5:1").is_err());
    }

    #[test]
    fn test_block_filters() {
        let filters = block_filters(&[(Dimension::Nether, 1)], &[(Dimension::Overworld, 0x34)]);
        assert_eq!(filters[1].hide, vec![1]);
        assert_eq!(filters[0].force, vec![0x34]);
        assert!(filters[0].hide.is_empty());
    }

    #[test]
    fn test_output_names() {
        assert_eq!(
            image_path("w", Dimension::Nether, RenderMode::HeightGray),
            PathBuf::from("w.nether.height_col_grayscale.png")
        );
        assert_eq!(movie_path("w", Dimension::Overworld), PathBuf::from("w.overworld.mp4"));
    }
}
