use std::path::PathBuf;
use std::env;
use anyhow::{anyhow, Result};

use crate::utils::file_utils::is_image_file;

#[derive(Debug)]
pub struct Args
{
	// 1. Input/Output Parameters.
	/// Source image to convert.
	pub input: Option<PathBuf>,

	/// Palette table file, or directory of swatch images averaged into one color each.
	pub palette: Option<PathBuf>,

	/// Output path stem. The image and the CSV report are written next to each other as
	/// `<stem>.<ext>` and `<stem>.csv`. Defaults to `<input stem>_beads` beside the input.
	pub output: Option<PathBuf>,

	// 2. Processing Parameters.
	/// Crop the white background around the sprite before mapping.
	pub crop: bool,

	/// Losslessly recompress a PNG output with oxipng.
	pub optimize: bool,

	/// Map pixels on the current thread only.
	pub serial: bool,

	// 3. Reporting Parameters.
	/// Print debug diagnostics.
	pub verbose: bool,

	// 4. Program Metadata.
	/// Program version info.
	pub version: String,

	/// Program author info.
	pub author: String,

	/// Program description.
	pub about: String,
}

impl Args
{
	/// Create a new Args instance with default values.
	pub fn new() -> Self
	{
		Args
		{
			input: None,
			palette: None,
			output: None,
			crop: false,
			optimize: false,
			serial: false,
			verbose: false,
			version: env!("CARGO_PKG_VERSION").to_string(),
			author: env!("CARGO_PKG_AUTHORS").to_string(),
			about: env!("CARGO_PKG_DESCRIPTION").to_string(),
		}
	}

	/// Parse command line arguments and return an Args struct.
	pub fn parse() -> Result<Self>
	{
		// Skip the program name (first argument).
		Self::parse_from(env::args().skip(1))
	}

	/// Parse an argument list that does not include the program name.
	pub fn parse_from<I>(arguments: I) -> Result<Self>
	where
		I: IntoIterator<Item = String>,
	{
		let mut args: Args = Args::new();
		let cli_args: Vec<String> = arguments.into_iter().collect();

		// Process arguments.
		let mut i: usize = 0;
		while i < cli_args.len()
		{
			let arg: &String = &cli_args[i];

			match arg.as_str()
			{
				// 1. Input/Output Parameters.
				"--input" | "-i" =>
				{
					args.input = Some(PathBuf::from(take_value(&cli_args, &mut i)?));
				}
				"--palette" | "-p" =>
				{
					args.palette = Some(PathBuf::from(take_value(&cli_args, &mut i)?));
				}
				"--output" | "-o" =>
				{
					args.output = Some(PathBuf::from(take_value(&cli_args, &mut i)?));
				}

				// 2. Processing Parameters.
				"--crop" | "-c" =>
				{
					args.crop = true;
				}
				"--optimize" | "-O" =>
				{
					args.optimize = true;
				}
				"--serial" =>
				{
					args.serial = true;
				}

				// 3. Reporting Parameters.
				"--verbose" | "-v" =>
				{
					args.verbose = true;
				}

				// 4. Program Information.
				"--help" | "-h" =>
				{
					args.print_help();
					std::process::exit(0);
				}
				"--version" | "-V" =>
				{
					println!("{} {}", env!("CARGO_PKG_NAME"), args.version);
					std::process::exit(0);
				}

				// A single bare argument is the input image.
				_ =>
				{
					if arg.starts_with('-')
					{
						return Err(anyhow!("Unknown option: {}", arg));
					}
					if args.input.is_some()
					{
						return Err(anyhow!("Unexpected argument: {} (input image already given)", arg));
					}
					args.input = Some(PathBuf::from(arg));
				}
			}

			i += 1;
		}

		Ok(args)
	}

	/// Print usage information.
	fn print_help(&self)
	{
		println!("{} - {}", self.about, self.version);
		println!("By {}", self.author);
		println!("\nUSAGE:");
		println!("    beadplan -p <PALETTE> [OPTIONS] <IMAGE>");
		println!("\nOPTIONS:");
		// Input/Output Parameters.
		println!("  INPUT/OUTPUT:");
		println!("    -i, --input <IMAGE>          Source image to convert");
		println!("    -p, --palette <PATH>         Palette table (r,g,b or #rrggbb per line) or swatch directory");
		println!("    -o, --output <STEM>          Output stem for <STEM>.<ext> and <STEM>.csv");
		println!("                                 Palette tables: one r,g,b or #rrggbb per line, '# ' starts a comment");
		println!("");
		// Processing Parameters.
		println!("  PROCESSING:");
		println!("    -c, --crop                   Crop the white background before mapping");
		println!("    -O, --optimize               Recompress PNG output losslessly");
		println!("        --serial                 Map pixels on a single thread");
		println!("");
		// General Options.
		println!("  GENERAL:");
		println!("    -v, --verbose                Print diagnostics");
		println!("    -h, --help                   Show help information");
		println!("    -V, --version                Display version information");
	}

	/// Validate parameter values and relationships.
	/// Returns Ok(()) if all parameters are valid, otherwise returns an error.
	pub fn validate(&self) -> Result<()>
	{
		// Validate the input image.
		let input = self.input.as_ref().ok_or_else(|| anyhow!("No input image given. Use --input <IMAGE> or see --help"))?;
		if !input.is_file()
		{
			return Err(anyhow!("Input '{}' is not a file.", input.display()));
		}
		if !is_image_file(input)
		{
			return Err(anyhow!("Input '{}' is not a supported image file.", input.display()));
		}

		// Validate the palette source.
		let palette = self.palette.as_ref().ok_or_else(|| anyhow!("No palette given. Use --palette <PATH> or see --help"))?;
		if !palette.exists()
		{
			return Err(anyhow!("Palette '{}' does not exist.", palette.display()));
		}

		// Validate the output stem.
		if let Some(output) = &self.output
		{
			if output.as_os_str().is_empty()
			{
				return Err(anyhow!("Output stem cannot be empty"));
			}
		}

		// All validations passed.
		Ok(())
	}
}

/// Consume the value following an option.
fn take_value(cli_args: &[String], i: &mut usize) -> Result<String>
{
	if *i + 1 < cli_args.len()
	{
		*i += 1;
		Ok(cli_args[*i].to_string())
	}
	else
	{
		Err(anyhow!("Missing value for {} argument", cli_args[*i]))
	}
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::utils::file_utils::TempDir;

	fn parse(list: &[&str]) -> Result<Args>
	{
		Args::parse_from(list.iter().map(|s| s.to_string()))
	}

	#[test]
	fn long_and_short_flags()
	{
		let args = parse(&["-i", "sprite.png", "--palette", "beads.csv", "-o", "out/kit", "-c", "-O", "--serial", "-v"]).unwrap();
		assert_eq!(args.input, Some(PathBuf::from("sprite.png")));
		assert_eq!(args.palette, Some(PathBuf::from("beads.csv")));
		assert_eq!(args.output, Some(PathBuf::from("out/kit")));
		assert!(args.crop && args.optimize && args.serial && args.verbose);
	}

	#[test]
	fn bare_argument_is_the_input()
	{
		let args = parse(&["-p", "beads", "sprite.png"]).unwrap();
		assert_eq!(args.input, Some(PathBuf::from("sprite.png")));
		assert!(!args.crop && !args.optimize && !args.serial && !args.verbose);
		assert!(parse(&["a.png", "b.png"]).is_err());
	}

	#[test]
	fn missing_values_and_unknown_flags_fail()
	{
		assert!(parse(&["--palette"]).is_err());
		assert!(parse(&["-i", "a.png", "--dither"]).is_err());
	}

	#[test]
	fn validate_rejects_missing_palette_path()
	{
		let dir = TempDir::new("args_validate").unwrap();
		let input = dir.path().join("sprite.png");
		image::RgbaImage::new(1, 1).save(&input).unwrap();

		let mut args = Args::new();
		args.input = Some(input.clone());
		assert!(args.validate().is_err());

		args.palette = Some(dir.path().join("missing.csv"));
		assert!(args.validate().is_err());

		args.palette = Some(dir.path().to_path_buf());
		assert!(args.validate().is_ok());

		args.input = Some(dir.path().join("nope.png"));
		assert!(args.validate().is_err());
	}
}
