use log::{debug, info};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

use crate::color::{mean_color, Color};
use crate::error::{BeadError, Result};
use crate::utils::file_utils::is_image_file;

/// Ordered, non-empty set of allowed output colors.
/// Order decides ties in `nearest`: the earliest entry wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette
{
	colors: Vec<Color>,
}

impl Palette
{
	/// Create a palette. Duplicates are kept, an empty list is rejected.
	pub fn new(colors: Vec<Color>) -> Result<Self>
	{
		if colors.is_empty()
		{
			return Err(BeadError::invalid("palette must contain at least one color"));
		}

		Ok(Self { colors })
	}

	/// Load a palette from a table file or from a directory of swatch images.
	pub fn load(path: &Path) -> Result<Self>
	{
		if path.is_dir()
		{
			Self::from_directory(path)
		}
		else if path.is_file()
		{
			Self::from_table_file(path)
		}
		else
		{
			Err(BeadError::io(path, std::io::Error::new(std::io::ErrorKind::NotFound, "no such file or directory")))
		}
	}

	/// Read a delimited text table of `r,g,b` or `#rrggbb` records.
	pub fn from_table_file(path: &Path) -> Result<Self>
	{
		let text: String = fs::read_to_string(path).map_err(|e| BeadError::io(path, e))?;
		let palette: Palette = Self::from_table(&text)?;
		info!("Loaded {} palette colors from table '{}'", palette.len(), path.display());
		Ok(palette)
	}

	/// Parse the contents of a palette table.
	pub fn from_table(text: &str) -> Result<Self>
	{
		let mut colors: Vec<Color> = Vec::new();
		let mut seen_record: bool = false;

		for (index, raw_line) in text.lines().enumerate()
		{
			let line_number: usize = index + 1;
			let line: &str = raw_line.trim();

			if line.is_empty()
			{
				continue;
			}

			// A leading '#' is either a hex color or a comment ("# ..." never parses as hex).
			if line.starts_with('#')
			{
				if let Ok(color) = Color::from_hex(line)
				{
					colors.push(color);
					seen_record = true;
				}
				continue;
			}

			let fields: Vec<&str> = split_fields(line, line_number)?;

			// Header row such as "r,g,b" or "red;green;blue".
			if !seen_record && Color::from_hex(line).is_err() && fields.iter().all(|f| !f.bytes().any(|b| b.is_ascii_digit()))
			{
				debug!("Skipping palette header on line {}: {}", line_number, line);
				seen_record = true;
				continue;
			}
			seen_record = true;

			colors.push(parse_record(&fields, line_number)?);
		}

		if colors.is_empty()
		{
			return Err(BeadError::invalid("palette table contains no colors"));
		}

		Self::new(colors)
	}

	/// Average every image in a directory into one palette entry each.
	/// Entries are ordered by file name.
	pub fn from_directory(dir: &Path) -> Result<Self>
	{
		let mut swatches: Vec<PathBuf> = Vec::new();
		for entry in fs::read_dir(dir).map_err(|e| BeadError::io(dir, e))?
		{
			let path: PathBuf = entry.map_err(|e| BeadError::io(dir, e))?.path();
			if path.is_file() && is_image_file(&path)
			{
				swatches.push(path);
			}
			else
			{
				debug!("Ignoring non-image palette entry {}", path.display());
			}
		}

		if swatches.is_empty()
		{
			return Err(BeadError::invalid(format!("no swatch images found in '{}'", dir.display())));
		}

		swatches.sort();

		// Average swatches in parallel; collect keeps file name order.
		let colors: Vec<Color> = swatches.par_iter()
			.map(|path| swatch_color(path))
			.collect::<Result<Vec<Color>>>()?;

		info!("Averaged {} swatch images from '{}'", colors.len(), dir.display());
		Self::new(colors)
	}

	/// Closest palette color by Euclidean RGB distance, first entry on ties.
	pub fn nearest(&self, color: Color) -> Color
	{
		self.colors[self.nearest_index(color)]
	}

	/// Index of the closest palette color, first entry on ties.
	pub fn nearest_index(&self, color: Color) -> usize
	{
		let mut best_index: usize = 0;
		let mut best_distance: u32 = u32::MAX;

		for (index, &palette_color) in self.colors.iter().enumerate()
		{
			let distance: u32 = color.distance_squared(palette_color);

			// Strictly smaller only, so equal distances keep the earlier entry.
			if distance < best_distance
			{
				best_distance = distance;
				best_index = index;

				if distance == 0
				{
					break;
				}
			}
		}

		best_index
	}

	pub fn colors(&self) -> &[Color]
	{
		&self.colors
	}

	pub fn len(&self) -> usize
	{
		self.colors.len()
	}
}

/// Split a record on ',' or ';' when present, otherwise on runs of whitespace.
/// Separators must sit between non-empty fields.
fn split_fields(line: &str, line_number: usize) -> Result<Vec<&str>>
{
	if !line.contains(|c: char| c == ',' || c == ';')
	{
		return Ok(line.split_whitespace().collect());
	}

	let fields: Vec<&str> = line.split(|c: char| c == ',' || c == ';').map(str::trim).collect();
	if let Some(position) = fields.iter().position(|f| f.is_empty())
	{
		return Err(BeadError::PaletteFormat
		{
			line: line_number,
			reason: format!("field {} is empty", position + 1),
		});
	}

	Ok(fields)
}

/// Parse one `r g b` or `rrggbb` record.
fn parse_record(fields: &[&str], line: usize) -> Result<Color>
{
	if fields.len() == 1
	{
		return Color::from_hex(fields[0]).map_err(|_| BeadError::PaletteFormat
		{
			line,
			reason: format!("'{}' is neither an r,g,b record nor a hex color", fields[0]),
		});
	}

	if fields.len() != 3
	{
		return Err(BeadError::PaletteFormat
		{
			line,
			reason: format!("expected 3 channels, found {}", fields.len()),
		});
	}

	let mut channels: [u8; 3] = [0; 3];
	for (slot, field) in channels.iter_mut().zip(fields)
	{
		let not_integer = || BeadError::PaletteFormat
		{
			line,
			reason: format!("channel '{}' is not an integer", field),
		};

		if field.starts_with('+')
		{
			return Err(not_integer());
		}
		let value: i64 = field.parse::<i64>().map_err(|_| not_integer())?;

		*slot = u8::try_from(value).map_err(|_| BeadError::PaletteFormat
		{
			line,
			reason: format!("channel {} is outside 0-255", value),
		})?;
	}

	Ok(Color::new(channels[0], channels[1], channels[2]))
}

/// Mean RGB of every pixel of a swatch image.
fn swatch_color(path: &Path) -> Result<Color>
{
	let swatch = image::open(path).map_err(|e| BeadError::io(path, e))?.to_rgba8();
	let color: Color = mean_color(swatch.pixels().map(Color::from_rgba))
		.map_err(|_| BeadError::invalid(format!("swatch '{}' has no pixels", path.display())))?;

	debug!("Swatch {} -> {}", path.display(), color);
	Ok(color)
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::utils::file_utils::TempDir;

	fn palette(colors: &[(u8, u8, u8)]) -> Palette
	{
		Palette::new(colors.iter().map(|&(r, g, b)| Color::new(r, g, b)).collect()).unwrap()
	}

	#[test]
	fn empty_palette_is_rejected()
	{
		assert!(matches!(Palette::new(Vec::new()), Err(BeadError::InvalidArgument(_))));
	}

	#[test]
	fn nearest_picks_minimum_distance()
	{
		let p = palette(&[(0, 0, 0), (255, 255, 255), (255, 0, 0)]);
		assert_eq!(p.nearest(Color::new(10, 10, 10)), Color::new(0, 0, 0));
		assert_eq!(p.nearest(Color::new(250, 250, 250)), Color::new(255, 255, 255));
		assert_eq!(p.nearest(Color::new(200, 40, 30)), Color::new(255, 0, 0));
	}

	#[test]
	fn single_entry_palette_takes_everything()
	{
		let p = palette(&[(100, 100, 100)]);
		for probe in [Color::new(0, 0, 0), Color::new(255, 255, 255), Color::new(100, 100, 100)]
		{
			assert_eq!(p.nearest(probe), Color::new(100, 100, 100));
		}
	}

	#[test]
	fn ties_go_to_the_earlier_entry()
	{
		// (100,100,100) is exactly 10 away from both entries.
		let forward = palette(&[(90, 100, 100), (110, 100, 100)]);
		let backward = palette(&[(110, 100, 100), (90, 100, 100)]);
		let probe = Color::new(100, 100, 100);

		assert_eq!(forward.nearest(probe), Color::new(90, 100, 100));
		assert_eq!(backward.nearest(probe), Color::new(110, 100, 100));

		let duplicates = palette(&[(5, 5, 5), (0, 0, 0), (0, 0, 0)]);
		assert_eq!(duplicates.nearest_index(Color::new(0, 0, 0)), 1);
	}

	#[test]
	fn nearest_is_never_beaten()
	{
		let p = palette(&[(12, 200, 3), (90, 90, 90), (250, 10, 128), (0, 64, 255), (128, 128, 0)]);
		for r in (0..=255).step_by(17)
		{
			for g in (0..=255).step_by(51)
			{
				for b in (0..=255).step_by(85)
				{
					let probe = Color::new(r as u8, g as u8, b as u8);
					let chosen = p.nearest(probe);
					assert!(p.colors().iter().all(|&c| probe.distance(c) >= probe.distance(chosen)));
				}
			}
		}
	}

	#[test]
	fn table_accepts_mixed_delimiters_hex_and_comments()
	{
		let text = "r,g,b\n# bead kit\n0,0,0\n255;255;255\n\n12\t34 56\n#ff0000\nabcdef\n";
		let p = Palette::from_table(text).unwrap();
		assert_eq!(p.colors(), &[
			Color::new(0, 0, 0),
			Color::new(255, 255, 255),
			Color::new(12, 34, 56),
			Color::new(255, 0, 0),
			Color::new(171, 205, 239),
		]);
	}

	#[test]
	fn table_reports_the_bad_line()
	{
		let cases = [
			("0,0,0\n1,2\n", 2),
			("0,0,0\n0,0,0\n1,x,3\n", 3),
			("256,0,0\n", 1),
			("-1,0,0\n", 1),
			("0,0,0\nred,green,blue\n", 2),
			("0,0,0\n1,,2,3\n", 2),
			("1,2,3,\n", 1),
			("0,0,0\n,1,2,3\n", 2),
			("+1,2,3\n", 1),
			("0,0,0\n1 +2 3\n", 2),
			("0;0;0\n1;;3\n", 2),
		];

		for (text, expected_line) in cases
		{
			match Palette::from_table(text)
			{
				Err(BeadError::PaletteFormat { line, .. }) => assert_eq!(line, expected_line, "{:?}", text),
				other => panic!("expected a format error for {:?}, got {:?}", text, other),
			}
		}
	}

	#[test]
	fn spaced_hash_lines_are_always_comments()
	{
		let p = Palette::from_table("# facade\n#   c0ffee\n#facade\n1, 2 ,3\n").unwrap();
		assert_eq!(p.colors(), &[Color::new(250, 202, 222), Color::new(1, 2, 3)]);
	}

	#[test]
	fn table_without_records_is_invalid()
	{
		assert!(matches!(Palette::from_table("r,g,b\n# nothing here\n"), Err(BeadError::InvalidArgument(_))));
	}

	#[test]
	fn directory_averages_swatches_in_name_order()
	{
		let dir = TempDir::new("palette_dir").unwrap();

		let mut red = image::RgbaImage::from_pixel(2, 1, image::Rgba([200, 0, 0, 255]));
		red.put_pixel(1, 0, image::Rgba([101, 0, 0, 0]));
		red.save(dir.path().join("b_red.png")).unwrap();

		image::RgbaImage::from_pixel(3, 3, image::Rgba([0, 0, 90, 255]))
			.save(dir.path().join("a_blue.png"))
			.unwrap();

		fs::write(dir.path().join("notes.txt"), "not a swatch").unwrap();

		let p = Palette::load(dir.path()).unwrap();
		assert_eq!(p.colors(), &[Color::new(0, 0, 90), Color::new(150, 0, 0)]);
	}

	#[test]
	fn directory_without_images_is_invalid()
	{
		let dir = TempDir::new("palette_empty").unwrap();
		fs::write(dir.path().join("readme.md"), "empty").unwrap();
		assert!(matches!(Palette::from_directory(dir.path()), Err(BeadError::InvalidArgument(_))));
	}

	#[test]
	fn missing_path_is_an_io_failure()
	{
		let missing = std::env::temp_dir().join("beadplan_definitely_missing_palette.csv");
		assert!(matches!(Palette::load(&missing), Err(BeadError::Io { .. })));
	}
}
