use image::RgbaImage;
use log::{debug, trace};
use rayon::prelude::*;
use std::collections::HashMap;

use crate::color::Color;
use crate::error::{BeadError, Result};
use crate::palette::Palette;

/// Memo of original color -> nearest palette color for one palette.
/// Passed into the mapping functions and handed back, never shared globally.
#[derive(Debug, Default, Clone)]
pub struct ColorCache
{
	entries: HashMap<Color, Color>,
	palette: Vec<Color>,
	hits: u64,
	misses: u64,
}

impl ColorCache
{
	pub fn new() -> Self
	{
		Self::default()
	}

	/// Drop all entries and statistics when the cache was filled against another palette.
	fn bind(&mut self, palette: &Palette)
	{
		if self.palette.as_slice() != palette.colors()
		{
			if !self.entries.is_empty()
			{
				debug!("Palette changed, discarding {} cached colors", self.entries.len());
			}
			self.entries.clear();
			self.hits = 0;
			self.misses = 0;
			self.palette = palette.colors().to_vec();
		}
	}

	/// Cached nearest color, computed and stored on a miss.
	pub fn lookup(&mut self, color: Color, palette: &Palette) -> Color
	{
		if let Some(&mapped) = self.entries.get(&color)
		{
			self.hits += 1;
			return mapped;
		}

		self.misses += 1;
		let mapped: Color = palette.nearest(color);
		trace!("{} -> {} (distance {:.3})", color, mapped, color.distance(mapped));
		self.entries.insert(color, mapped);
		mapped
	}

	/// Cached nearest color without touching the statistics.
	pub fn get(&self, color: Color) -> Option<Color>
	{
		self.entries.get(&color).copied()
	}

	/// Number of distinct original colors seen.
	pub fn len(&self) -> usize
	{
		self.entries.len()
	}

	pub fn hits(&self) -> u64
	{
		self.hits
	}

	pub fn misses(&self) -> u64
	{
		self.misses
	}
}

fn check_dimensions(image: &RgbaImage) -> Result<()>
{
	let (width, height): (u32, u32) = image.dimensions();
	if width == 0 || height == 0
	{
		return Err(BeadError::invalid(format!("image dimensions cannot be zero ({}x{})", width, height)));
	}

	Ok(())
}

/// Replace every pixel's RGB with its nearest palette color, row by row.
/// Alpha is carried over untouched, transparent pixels are mapped like any other.
pub fn map_image(image: &mut RgbaImage, palette: &Palette, mut cache: ColorCache) -> Result<ColorCache>
{
	check_dimensions(image)?;
	cache.bind(palette);

	for pixel in image.pixels_mut()
	{
		let original: Color = Color::from_rgba(pixel);
		let mapped: Color = cache.lookup(original, palette);
		*pixel = mapped.with_alpha(pixel[3]);
	}

	debug!("Mapped {} pixels, {} distinct colors", image.width() as u64 * image.height() as u64, cache.len());
	Ok(cache)
}

/// Same result as `map_image`, with the pixel rewrite spread over the rayon pool.
/// The cache is filled from the distinct colors first so the parallel pass only reads it.
pub fn map_image_parallel(image: &mut RgbaImage, palette: &Palette, mut cache: ColorCache) -> Result<ColorCache>
{
	check_dimensions(image)?;
	cache.bind(palette);

	// Populate single-threaded.
	for pixel in image.pixels()
	{
		cache.lookup(Color::from_rgba(pixel), palette);
	}

	let row_len: usize = image.width() as usize * 4;
	let samples: &mut [u8] = &mut **image;
	let lookup: &ColorCache = &cache;

	samples.par_chunks_mut(row_len).for_each(|row|
	{
		for pixel in row.chunks_exact_mut(4)
		{
			let original: Color = Color::new(pixel[0], pixel[1], pixel[2]);
			let mapped: Color = lookup.get(original).unwrap_or_else(|| palette.nearest(original));
			pixel[0] = mapped.r;
			pixel[1] = mapped.g;
			pixel[2] = mapped.b;
		}
	});

	debug!("Mapped {} rows in parallel, {} distinct colors", image.height(), cache.len());
	Ok(cache)
}
