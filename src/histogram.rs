use image::RgbaImage;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::color::Color;
use crate::error::{BeadError, Result};

/// Header row of the bead count report.
pub const CSV_HEADER: &str = "pixel count,r,g,b";

/// Number of visible pixels of one output color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistogramEntry
{
	pub count: u64,
	pub color: Color,
}

/// Count visible pixels per color. Pixels with alpha 0 are not beads and are skipped.
/// Rows are sorted by count descending, then by (r, g, b) ascending.
pub fn tally(image: &RgbaImage) -> Vec<HistogramEntry>
{
	let mut counts: HashMap<Color, u64> = HashMap::new();

	for pixel in image.pixels()
	{
		if pixel[3] == 0
		{
			continue;
		}

		*counts.entry(Color::from_rgba(pixel)).or_insert(0) += 1;
	}

	let mut entries: Vec<HistogramEntry> = counts.into_iter()
		.map(|(color, count)| HistogramEntry { count, color })
		.collect();

	entries.sort_by(|a, b| b.count.cmp(&a.count).then(a.color.cmp(&b.color)));
	entries
}

/// Sum of all counts.
pub fn total_count(entries: &[HistogramEntry]) -> u64
{
	entries.iter().map(|e| e.count).sum()
}

/// Write the report as `pixel count,r,g,b` rows.
pub fn write_csv<W: Write>(entries: &[HistogramEntry], writer: &mut W) -> std::io::Result<()>
{
	writeln!(writer, "{}", CSV_HEADER)?;
	for entry in entries
	{
		writeln!(writer, "{},{},{},{}", entry.count, entry.color.r, entry.color.g, entry.color.b)?;
	}

	Ok(())
}

/// Write the report to a file.
pub fn save_csv(entries: &[HistogramEntry], path: &Path) -> Result<()>
{
	let file: File = File::create(path).map_err(|e| BeadError::io(path, e))?;
	let mut writer: BufWriter<File> = BufWriter::new(file);

	write_csv(entries, &mut writer).map_err(|e| BeadError::io(path, e))?;
	writer.flush().map_err(|e| BeadError::io(path, e))?;

	Ok(())
}
