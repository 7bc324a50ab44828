use anyhow::{anyhow, Result};
use image::ImageFormat;
use oxipng::{optimize_from_memory, Options as OxiOptions};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Extensions accepted as input images and palette swatches.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "tif", "tiff", "webp", "ico", "tga"];

/// Where the converted image and its bead report are written.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputPaths
{
	pub image_path: PathBuf,
	pub csv_path: PathBuf,
	pub format: ImageFormat,
}

/// Checks if a file is an image by its extension.
pub fn is_image_file(path: &Path) -> bool
{
	path.extension()
		.map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_string_lossy().to_lowercase().as_str()))
		.unwrap_or(false)
}

/// Checks if a file is a PNG file by its extension.
pub fn is_png_file(path: &Path) -> bool
{
	path.extension()
		.map(|ext| ext.to_string_lossy().to_lowercase() == "png")
		.unwrap_or(false)
}

/// Output format for an input: same family when it stores pixels exactly, PNG otherwise.
/// Lossy JPEG would bring back colors outside the palette and drop alpha.
fn output_format(input: &Path) -> (ImageFormat, &'static str)
{
	let extension: String = input.extension()
		.map(|ext| ext.to_string_lossy().to_lowercase())
		.unwrap_or_default();

	match extension.as_str()
	{
		"bmp" => (ImageFormat::Bmp, "bmp"),
		"tif" | "tiff" => (ImageFormat::Tiff, "tiff"),
		_ => (ImageFormat::Png, "png"),
	}
}

/// Append an extension without touching dots already in the stem.
fn with_suffix(stem: &Path, extension: &str) -> PathBuf
{
	let mut name: OsString = stem.as_os_str().to_owned();
	name.push(".");
	name.push(extension);
	PathBuf::from(name)
}

/// Resolve the output image and CSV paths for an input and an optional stem.
pub fn output_paths(input: &Path, stem: Option<&Path>) -> Result<OutputPaths>
{
	let stem: PathBuf = match stem
	{
		Some(stem) => stem.to_path_buf(),
		None =>
		{
			let file_stem = input.file_stem()
				.ok_or_else(|| anyhow!("Cannot derive an output name from '{}'", input.display()))?;
			let mut name: OsString = file_stem.to_owned();
			name.push("_beads");
			input.with_file_name(name)
		},
	};

	let (format, extension) = output_format(input);

	Ok(OutputPaths
	{
		image_path: with_suffix(&stem, extension),
		csv_path: with_suffix(&stem, "csv"),
		format,
	})
}

/// Create the parent directory of an output file if needed.
pub fn ensure_parent_dir(path: &Path) -> Result<()>
{
	if let Some(parent) = path.parent()
	{
		if !parent.as_os_str().is_empty() && !parent.is_dir()
		{
			fs::create_dir_all(parent)
				.map_err(|e| anyhow!("Failed to create directory {}: {}", parent.display(), e))?;
		}
	}

	Ok(())
}

/// Losslessly recompress a PNG file in place.
/// Returns (original size, new size); the file is only replaced when it shrinks.
pub fn optimize_png_file(path: &Path) -> Result<(u64, u64)>
{
	let source_data = fs::read(path)
		.map_err(|e| anyhow!("Failed to read {}: {}", path.display(), e))?;
	let original_size = source_data.len() as u64;

	let mut options = OxiOptions::from_preset(2);
	options.strip = oxipng::StripChunks::Safe;
	// Colors under alpha 0 are part of the mapped output and must survive.
	options.optimize_alpha = false;
	options.interlace = None;

	let optimized = optimize_from_memory(&source_data, &options)
		.map_err(|e| anyhow!("Failed to optimize PNG: {}", e))?;
	let new_size = optimized.len() as u64;

	if new_size < original_size
	{
		fs::write(path, &optimized)
			.map_err(|e| anyhow!("Failed to write optimized PNG {}: {}", path.display(), e))?;
		return Ok((original_size, new_size));
	}

	Ok((original_size, original_size))
}

/// Scratch directory removed on drop.
#[cfg(test)]
pub struct TempDir
{
	path: PathBuf,
}

#[cfg(test)]
impl TempDir
{
	pub fn new(label: &str) -> Result<Self>
	{
		use std::sync::atomic::{AtomicUsize, Ordering};
		static COUNTER: AtomicUsize = AtomicUsize::new(0);

		let unique = format!("beadplan_{}_{}_{}", label, std::process::id(), COUNTER.fetch_add(1, Ordering::SeqCst));
		let path = std::env::temp_dir().join(unique);
		fs::create_dir_all(&path)?;
		Ok(Self { path })
	}

	pub fn path(&self) -> &Path
	{
		&self.path
	}
}

#[cfg(test)]
impl Drop for TempDir
{
	fn drop(&mut self)
	{
		let _ = fs::remove_dir_all(&self.path);
	}
}
