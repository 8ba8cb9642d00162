//! Courtroom Artwork
//!
//! The scale and the gavel can be drawn two ways:
//!
//! - [`SpriteArtwork`]: text-art frames loaded from the assets directory,
//!   picked by angle
//! - [`ProceduralArtwork`]: drawn from lines, circles and rectangles on a
//!   braille canvas, needs no files
//!
//! With [`ArtStyle::Auto`] a failed asset load falls back to shapes.

pub mod procedural;
pub mod sprites;

use std::path::Path;

use clap::ValueEnum;
use ratatui::layout::Rect;
use ratatui::Frame;
use tracing::{info, warn};

pub use procedural::ProceduralArtwork;
pub use sprites::{AssetError, SpriteArtwork};

/// Draws the two props
pub trait Artwork {
    /// Short name for logs and the status line
    fn name(&self) -> &'static str;

    /// Draw the scale with its beam tilted by `tilt_degrees`
    /// (positive leans towards "Guilty")
    fn draw_scale(&self, frame: &mut Frame, area: Rect, tilt_degrees: f64);

    /// Draw the gavel raised by `swing_degrees` (0 = resting)
    fn draw_hammer(&self, frame: &mut Frame, area: Rect, swing_degrees: f64);
}

/// Which artwork to use
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ArtStyle {
    /// Sprites if the assets load, shapes otherwise
    #[default]
    Auto,
    /// Sprites only; missing assets are an error
    Sprites,
    /// Shapes only
    Shapes,
}

/// Build the artwork for `style`
///
/// # Errors
///
/// Only [`ArtStyle::Sprites`] can fail, when the assets cannot be loaded.
pub fn select_artwork(style: ArtStyle, assets: &Path) -> Result<Box<dyn Artwork>, AssetError> {
    let artwork: Box<dyn Artwork> = match style {
        ArtStyle::Shapes => Box::new(ProceduralArtwork),
        ArtStyle::Sprites => Box::new(SpriteArtwork::load(assets)?),
        ArtStyle::Auto => match SpriteArtwork::load(assets) {
            Ok(sprites) => Box::new(sprites),
            Err(e) => {
                warn!(error = %e, "Sprite assets unavailable, drawing with shapes");
                Box::new(ProceduralArtwork)
            }
        },
    };
    info!(artwork = artwork.name(), "Artwork selected");
    Ok(artwork)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_auto_falls_back_to_shapes() {
        let dir = tempfile::tempdir().unwrap();
        let artwork = select_artwork(ArtStyle::Auto, &dir.path().join("missing")).unwrap();
        assert_eq!(artwork.name(), "shapes");
    }

    #[test]
    fn test_sprites_require_assets() {
        let dir = tempfile::tempdir().unwrap();
        let result = select_artwork(ArtStyle::Sprites, &dir.path().join("missing"));
        assert!(matches!(result, Err(AssetError::Read { .. })));
    }

    #[test]
    fn test_shapes_never_touch_disk() {
        let artwork = select_artwork(ArtStyle::Shapes, Path::new("/nonexistent")).unwrap();
        assert_eq!(artwork.name(), "shapes");
    }

    #[test]
    fn test_bundled_assets_load() {
        let assets = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets");
        let artwork = select_artwork(ArtStyle::Sprites, &assets).unwrap();
        assert_eq!(artwork.name(), "sprites");
    }
}
