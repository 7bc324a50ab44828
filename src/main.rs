use anyhow::{anyhow, Context, Result};
use image::RgbaImage;
use log::{info, warn};
use std::path::{Path, PathBuf};

mod color;
mod crop;
mod error;
mod histogram;
mod mapper;
mod palette;
mod utils
{
	pub mod arg_utils;
	pub mod file_utils;
	pub mod time_utils;
}
use histogram::HistogramEntry;
use mapper::ColorCache;
use palette::Palette;
use utils::arg_utils::Args;
use utils::file_utils::{ensure_parent_dir, is_png_file, optimize_png_file, output_paths, OutputPaths};
use utils::time_utils::{format_duration, StageTimer};


/// Map pixel art onto a fixed bead palette and count the beads of each color.
fn main()
{
	if let Err(err) = run()
	{
		eprintln!("Error: {:#}", err);
		std::process::exit(1);
	}
}

fn run() -> Result<()>
{
	// Parse command line arguments.
	let args = Args::parse()?;

	// Raise the log level for --verbose; RUST_LOG still wins.
	let level = if args.verbose { "debug" } else { "warn" };
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(format!("warn,beadplan={}", level)))
		.format_timestamp(None)
		.init();

	let (input, palette_path, outputs) = resolve_paths(&args)?;

	// Print the processing settings with logical grouping.
	println!("Settings:");
	println!("----------------------------------------");

	// 1. Input/Output Parameters.
	println!("INPUT/OUTPUT:");
	println!("  - Input image: {}", input.display());
	println!("  - Palette: {} ({})", palette_path.display(), if palette_path.is_dir() { "swatch directory" } else { "table file" });
	println!("  - Output image: {}", outputs.image_path.display());
	println!("  - Bead report: {}", outputs.csv_path.display());

	// 2. Processing Parameters.
	println!("\nPROCESSING:");
	println!("  - Background crop: {}", if args.crop { "Yes (white border removed)" } else { "Off" });
	println!("  - PNG optimization: {}", if args.optimize { "Yes" } else { "Off" });
	println!("  - Threads: {}", if args.serial { "1 (serial)".to_string() } else { rayon::current_num_threads().to_string() });
	println!("----------------------------------------");
	println!();

	let options = ConvertOptions
	{
		crop: args.crop,
		optimize: args.optimize,
		parallel: !args.serial,
	};

	let mut timer = StageTimer::start();
	let report = convert(&input, &palette_path, &outputs, options, &mut timer)?;

	print_summary(&report, &outputs, &timer);

	Ok(())
}

/// Validate the arguments and resolve the input, palette and output paths.
fn resolve_paths(args: &Args) -> Result<(PathBuf, PathBuf, OutputPaths)>
{
	// Validate parameters using the centralized validation method.
	args.validate()?;

	let input = args.input.clone().ok_or_else(|| anyhow!("No input image given"))?;
	let palette_path = args.palette.clone().ok_or_else(|| anyhow!("No palette given"))?;
	let outputs = output_paths(&input, args.output.as_deref())?;

	Ok((input, palette_path, outputs))
}

/// Switches for one conversion.
#[derive(Debug, Clone, Copy)]
struct ConvertOptions
{
	crop: bool,
	optimize: bool,
	parallel: bool,
}

/// Everything the summary needs about a finished conversion.
#[derive(Debug)]
struct ConversionReport
{
	source_size: (u32, u32),
	output_size: (u32, u32),
	palette_len: usize,
	distinct_colors: usize,
	cache_hits: u64,
	cache_misses: u64,
	entries: Vec<HistogramEntry>,
	optimized: Option<(u64, u64)>,
}

/// Load, map, tally and write one image.
fn convert(input: &Path, palette_path: &Path, outputs: &OutputPaths, options: ConvertOptions, timer: &mut StageTimer) -> Result<ConversionReport>
{
	// Any palette failure aborts before the image is touched.
	let palette = Palette::load(palette_path)
		.with_context(|| format!("Failed to load palette '{}'", palette_path.display()))?;
	println!("Loaded palette: {} colors", palette.len());
	timer.lap("palette");

	let source = image::open(input)
		.with_context(|| format!("Failed to load image '{}'", input.display()))?
		.to_rgba8();
	let source_size = source.dimensions();
	println!("Loaded image: {}x{}", source_size.0, source_size.1);

	let mut image: RgbaImage = if options.crop { crop::crop_background(source) } else { source };
	let output_size = image.dimensions();
	if output_size != source_size
	{
		println!("Cropped background: {}x{} -> {}x{}", source_size.0, source_size.1, output_size.0, output_size.1);
	}
	timer.lap("load");

	let cache = if options.parallel
	{
		mapper::map_image_parallel(&mut image, &palette, ColorCache::new())?
	}
	else
	{
		mapper::map_image(&mut image, &palette, ColorCache::new())?
	};
	info!("Color cache: {} entries, {} hits, {} misses", cache.len(), cache.hits(), cache.misses());
	timer.lap("map");

	ensure_parent_dir(&outputs.image_path)?;
	save_image(&image, outputs)?;
	println!("Saved image: {}", outputs.image_path.display());

	let optimized = if options.optimize && is_png_file(&outputs.image_path)
	{
		Some(optimize_png_file(&outputs.image_path)?)
	}
	else
	{
		if options.optimize
		{
			warn!("--optimize only applies to PNG output, skipping {}", outputs.image_path.display());
		}
		None
	};
	timer.lap("save image");

	let entries = histogram::tally(&image);
	ensure_parent_dir(&outputs.csv_path)?;
	histogram::save_csv(&entries, &outputs.csv_path)
		.with_context(|| format!("Failed to write bead report '{}'", outputs.csv_path.display()))?;
	println!("Saved bead report: {}", outputs.csv_path.display());
	timer.lap("report");

	Ok(ConversionReport
	{
		source_size,
		output_size,
		palette_len: palette.len(),
		distinct_colors: cache.len(),
		cache_hits: cache.hits(),
		cache_misses: cache.misses(),
		entries,
		optimized,
	})
}

/// Write the mapped image in the resolved format.
fn save_image(image: &RgbaImage, outputs: &OutputPaths) -> Result<()>
{
	let path = &outputs.image_path;
	image.save_with_format(path, outputs.format)
		.map_err(|e| anyhow!("Failed to save image {}: {}", path.display(), e))
}

/// Print the bead table and run statistics.
fn print_summary(report: &ConversionReport, outputs: &OutputPaths, timer: &StageTimer)
{
	let total_beads = histogram::total_count(&report.entries);
	let total_pixels = report.output_size.0 as u64 * report.output_size.1 as u64;

	println!("\n========================================");
	println!("BEAD SUMMARY");
	println!("========================================");
	if report.entries.is_empty()
	{
		println!("No visible pixels: the image is fully transparent.");
	}
	else
	{
		println!("{:>10}  {:<8}  {}", "Beads", "Hex", "RGB");
		for entry in &report.entries
		{
			println!("{:>10}  {:<8}  ({}, {}, {})", entry.count, entry.color.to_hex(), entry.color.r, entry.color.g, entry.color.b);
		}
	}

	println!("\n----------------------------------------");
	println!("STATISTICS");
	println!("----------------------------------------");
	println!("Image size:           {}x{}", report.output_size.0, report.output_size.1);
	if report.output_size != report.source_size
	{
		println!("Original size:        {}x{}", report.source_size.0, report.source_size.1);
	}
	println!("Palette colors:       {}", report.palette_len);
	println!("Distinct input colors: {}", report.distinct_colors);
	println!("Colors used:          {}", report.entries.len());
	println!("Total beads:          {}", total_beads);
	println!("Transparent pixels:   {}", total_pixels - total_beads);
	info!("Cache hits/misses: {}/{}", report.cache_hits, report.cache_misses);

	if let Some((before, after)) = report.optimized
	{
		let saved_pct = if before > 0 { (1.0 - (after as f64 / before as f64)) * 100.0 } else { 0.0 };
		println!("PNG optimization:     {} -> {} ({:.1}% smaller)", format_bytes(before), format_bytes(after), saved_pct);
	}

	for (stage, elapsed) in timer.stages()
	{
		println!("  - {:<12} {}", stage, format_duration(*elapsed));
	}
	println!("Total time:           {}", format_duration(timer.total()));
	println!("Outputs:              {}, {}", outputs.image_path.display(), outputs.csv_path.display());
	println!("========================================");
}

/// Formats file size in human-readable format.
fn format_bytes(size: u64) -> String
{
	if size < 1024
	{
		format!("{} B", size)
	}
	else if size < 1024 * 1024
	{
		format!("{:.1} KB", size as f64 / 1024.0)
	}
	else
	{
		format!("{:.2} MB", size as f64 / (1024.0 * 1024.0))
	}
}
