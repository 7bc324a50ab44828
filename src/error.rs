use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for palette, mapping and report operations.
pub type Result<T> = std::result::Result<T, BeadError>;

/// Errors raised while loading palettes and mapping images onto them.
#[derive(Error, Debug)]
pub enum BeadError
{
	/// A caller broke a precondition (empty palette, zero-sized image, no swatches).
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),

	/// A palette table record could not be parsed.
	#[error("Palette format error on line {line}: {reason}")]
	PaletteFormat
	{
		line: usize,
		reason: String,
	},

	/// A file or directory could not be read, decoded or written.
	#[error("I/O failure on '{}': {source}", .path.display())]
	Io
	{
		path: PathBuf,
		#[source]
		source: Box<dyn std::error::Error + Send + Sync>,
	},

	/// A hex color string was malformed.
	#[error("Invalid hex color '{0}': expected 6 hex digits with an optional leading '#'")]
	Format(String),
}

impl BeadError
{
	/// Create an I/O failure for a path.
	pub fn io<E>(path: &Path, source: E) -> Self
	where
		E: std::error::Error + Send + Sync + 'static,
	{
		Self::Io
		{
			path: path.to_path_buf(),
			source: Box::new(source),
		}
	}

	/// Create an invalid argument error.
	pub fn invalid(message: impl Into<String>) -> Self
	{
		Self::InvalidArgument(message.into())
	}
}
