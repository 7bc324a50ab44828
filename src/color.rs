use std::fmt;
use std::str::FromStr;

use crate::error::{BeadError, Result};

/// RGB color representation. Alpha lives in the pixel buffer, never here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Color
{
	pub r: u8,
	pub g: u8,
	pub b: u8,
}

impl Color
{
	pub const fn new(r: u8, g: u8, b: u8) -> Self
	{
		Self { r, g, b }
	}

	/// Color of an RGBA pixel, alpha dropped.
	pub fn from_rgba(pixel: &image::Rgba<u8>) -> Self
	{
		Self::new(pixel[0], pixel[1], pixel[2])
	}

	/// Build an RGBA pixel from this color and the given alpha.
	pub fn with_alpha(self, alpha: u8) -> image::Rgba<u8>
	{
		image::Rgba([self.r, self.g, self.b, alpha])
	}

	/// Squared Euclidean distance over the three channels.
	pub fn distance_squared(self, other: Color) -> u32
	{
		let dr: i32 = self.r as i32 - other.r as i32;
		let dg: i32 = self.g as i32 - other.g as i32;
		let db: i32 = self.b as i32 - other.b as i32;

		(dr * dr + dg * dg + db * db) as u32
	}

	/// Euclidean distance over the three channels.
	pub fn distance(self, other: Color) -> f64
	{
		(self.distance_squared(other) as f64).sqrt()
	}

	/// Lowercase `#rrggbb` form.
	pub fn to_hex(self) -> String
	{
		format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
	}

	/// Parse exactly six hex digits, optionally preceded by `#`.
	pub fn from_hex(text: &str) -> Result<Self>
	{
		let trimmed: &str = text.trim();
		let digits: &str = trimmed.strip_prefix('#').unwrap_or(trimmed);

		if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit())
		{
			return Err(BeadError::Format(text.to_string()));
		}

		let channel = |start: usize| -> Result<u8>
		{
			u8::from_str_radix(&digits[start..start + 2], 16).map_err(|_| BeadError::Format(text.to_string()))
		};

		Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
	}
}

impl fmt::Display for Color
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
	{
		write!(f, "{}", self.to_hex())
	}
}

impl FromStr for Color
{
	type Err = BeadError;

	fn from_str(s: &str) -> Result<Self>
	{
		Self::from_hex(s)
	}
}

/// Per-channel arithmetic mean, truncated.
pub fn mean_color<I>(pixels: I) -> Result<Color>
where
	I: IntoIterator<Item = Color>,
{
	let mut sum_r: u64 = 0;
	let mut sum_g: u64 = 0;
	let mut sum_b: u64 = 0;
	let mut count: u64 = 0;

	for color in pixels
	{
		sum_r += color.r as u64;
		sum_g += color.g as u64;
		sum_b += color.b as u64;
		count += 1;
	}

	if count == 0
	{
		return Err(BeadError::invalid("cannot average an empty set of pixels"));
	}

	Ok(Color::new((sum_r / count) as u8, (sum_g / count) as u8, (sum_b / count) as u8))
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn distance_matches_hand_computed_norm()
	{
		let black = Color::new(0, 0, 0);
		let grey = Color::new(100, 100, 100);

		assert_eq!(black.distance_squared(grey), 30_000);
		assert!((black.distance(grey) - 173.205).abs() < 0.001);
		assert_eq!(grey.distance(grey), 0.0);
		assert_eq!(Color::new(0, 0, 0).distance_squared(Color::new(255, 255, 255)), 195_075);
	}

	#[test]
	fn hex_round_trip()
	{
		let lime = Color::new(137, 243, 54);
		assert_eq!(lime.to_hex(), "#89f336");
		assert_eq!(Color::from_hex("#89f336").unwrap(), lime);
		assert_eq!(Color::from_hex("89F336").unwrap(), lime);
		assert_eq!(" #000000 ".parse::<Color>().unwrap(), Color::new(0, 0, 0));
		assert_eq!(format!("{}", Color::new(255, 0, 16)), "#ff0010");
	}

	#[test]
	fn malformed_hex_is_rejected()
	{
		for bad in ["", "#", "#fff", "#12345", "#1234567", "##123456", "#12345g", "12 456"]
		{
			assert!(matches!(Color::from_hex(bad), Err(BeadError::Format(_))), "accepted {:?}", bad);
		}
	}

	#[test]
	fn mean_truncates_each_channel()
	{
		let pixels = vec![Color::new(0, 10, 255), Color::new(1, 11, 254), Color::new(1, 10, 254)];
		assert_eq!(mean_color(pixels).unwrap(), Color::new(0, 10, 254));
	}

	#[test]
	fn mean_of_nothing_is_invalid()
	{
		assert!(matches!(mean_color(Vec::new()), Err(BeadError::InvalidArgument(_))));
	}
}
