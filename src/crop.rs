use image::RgbaImage;
use log::debug;

use crate::color::Color;

/// Background assumed by the crop: plain white paper behind the sprite.
const BACKGROUND: Color = Color::new(255, 255, 255);

/// Bounding box `(x, y, width, height)` of every non-background pixel.
/// Alpha is ignored. `None` when the whole image is background.
pub fn content_bounds(image: &RgbaImage) -> Option<(u32, u32, u32, u32)>
{
	let mut min_x: u32 = u32::MAX;
	let mut min_y: u32 = u32::MAX;
	let mut max_x: u32 = 0;
	let mut max_y: u32 = 0;
	let mut found: bool = false;

	for (x, y, pixel) in image.enumerate_pixels()
	{
		if Color::from_rgba(pixel) == BACKGROUND
		{
			continue;
		}

		found = true;
		min_x = min_x.min(x);
		min_y = min_y.min(y);
		max_x = max_x.max(x);
		max_y = max_y.max(y);
	}

	found.then(|| (min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
}

/// Crop away the white border around the content. All-white images come back unchanged.
pub fn crop_background(image: RgbaImage) -> RgbaImage
{
	match content_bounds(&image)
	{
		Some((x, y, width, height)) =>
		{
			debug!("Cropping {}x{} to {}x{} at ({}, {})", image.width(), image.height(), width, height, x, y);
			image::imageops::crop_imm(&image, x, y, width, height).to_image()
		},
		None =>
		{
			debug!("Image is entirely background, not cropping");
			image
		},
	}
}

#[cfg(test)]
mod tests
{
	use super::*;
	use image::Rgba;

	#[test]
	fn crops_to_non_white_pixels()
	{
		let mut image = RgbaImage::from_pixel(6, 5, Rgba([255, 255, 255, 255]));
		image.put_pixel(1, 2, Rgba([10, 20, 30, 255]));
		image.put_pixel(3, 3, Rgba([255, 255, 254, 255]));

		assert_eq!(content_bounds(&image), Some((1, 2, 3, 2)));

		let cropped = crop_background(image);
		assert_eq!(cropped.dimensions(), (3, 2));
		assert_eq!(*cropped.get_pixel(0, 0), Rgba([10, 20, 30, 255]));
		assert_eq!(*cropped.get_pixel(2, 1), Rgba([255, 255, 254, 255]));
	}

	#[test]
	fn alpha_does_not_count_as_content()
	{
		let mut image = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 0]));
		image.put_pixel(2, 1, Rgba([0, 0, 0, 0]));
		assert_eq!(content_bounds(&image), Some((2, 1, 1, 1)));
	}

	#[test]
	fn all_white_is_left_alone()
	{
		let image = RgbaImage::from_pixel(3, 2, Rgba([255, 255, 255, 255]));
		assert_eq!(content_bounds(&image), None);
		assert_eq!(crop_background(image).dimensions(), (3, 2));
	}
}
