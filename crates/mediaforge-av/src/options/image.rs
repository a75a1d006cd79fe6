//! Image conversion options.

use super::{choice, CropArea};
use serde::{Deserialize, Serialize};

choice! {
    /// Target image container.
    pub enum ImageFormat for "format" {
        Jpg => "jpg",
        Jpeg => "jpeg",
        Png => "png",
        Webp => "webp",
        Gif => "gif",
    }
}

impl ImageFormat {
    /// Output file extension.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpg | Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Gif => "gif",
        }
    }

    /// Formats whose encoders take a lossy quality setting.
    pub fn requires_quality(self) -> bool {
        matches!(self, Self::Jpg | Self::Jpeg | Self::Webp)
    }
}

choice! {
    /// Named pixel effect applied after crop and resize.
    #[derive(Default)]
    pub enum ImageFilter for "filter" {
        #[default]
        None => "none",
        Grayscale => "grayscale",
        Sepia => "sepia",
        Blur => "blur",
        Sharpen => "sharpen",
        Swirl => "swirl",
        BarrelDistortion => "barrel-distortion",
        OilPainting => "oil-painting",
        Vintage => "vintage",
        Emboss => "emboss",
        Charcoal => "charcoal",
        Sketch => "sketch",
        Rotate45 => "rotate-45º",
        Rotate90 => "rotate-90º",
        Rotate180 => "rotate-180º",
        Rotate270 => "rotate-270º",
    }
}

impl ImageFilter {
    /// Filters only ImageMagick can render.
    pub fn needs_imagemagick(self) -> bool {
        matches!(
            self,
            Self::Swirl
                | Self::BarrelDistortion
                | Self::OilPainting
                | Self::Vintage
                | Self::Emboss
                | Self::Charcoal
                | Self::Sketch
                | Self::Rotate45
        )
    }
}

/// Options for converting a still image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageOptions {
    pub format: ImageFormat,
    #[serde(default)]
    pub width: Option<i64>,
    #[serde(default)]
    pub height: Option<i64>,
    /// 1..=100, required for lossy formats.
    #[serde(default)]
    pub quality: Option<i64>,
    #[serde(default)]
    pub filter: ImageFilter,
    /// `#rrggbb` colour blended over the image.
    #[serde(default)]
    pub tint: Option<String>,
    #[serde(default)]
    pub crop: Option<CropArea>,
}

impl ImageOptions {
    /// The tint to apply, if any. Empty strings and pure black are no-ops.
    pub fn effective_tint(&self) -> Option<&str> {
        self.tint
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty() && !t.eq_ignore_ascii_case("#000000"))
    }

    /// Whether this job has to go through ImageMagick instead of ffmpeg.
    pub fn needs_imagemagick(&self) -> bool {
        self.filter.needs_imagemagick() || self.effective_tint().is_some()
    }
}
