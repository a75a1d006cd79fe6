//! Video conversion options.

use super::{choice, CropArea, TrimRange};
use serde::{Deserialize, Serialize};

choice! {
    /// Target video container or intermediate codec family.
    pub enum VideoFormat for "format" {
        Mp4 => "mp4",
        Webm => "webm",
        Avi => "avi",
        Mov => "mov",
        Mkv => "mkv",
        Flv => "flv",
        Wmv => "wmv",
        Prores => "prores",
        Dnxhd => "dnxhd",
    }
}

impl VideoFormat {
    /// Output file extension. Intermediate codecs are wrapped in QuickTime.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Webm => "webm",
            Self::Avi => "avi",
            Self::Mov | Self::Prores | Self::Dnxhd => "mov",
            Self::Mkv => "mkv",
            Self::Flv => "flv",
            Self::Wmv => "wmv",
        }
    }
}

choice! {
    /// Encoder quality tier.
    #[derive(Default)]
    pub enum VideoQuality for "quality" {
        Low => "low",
        #[default]
        Medium => "medium",
        High => "high",
    }
}

choice! {
    #[derive(Default)]
    pub enum NoiseType for "visualEffects.noise.type" {
        #[default]
        None => "none",
        FilmGrain => "film-grain",
        Digital => "digital",
        Vintage => "vintage",
    }
}

choice! {
    #[derive(Default)]
    pub enum ArtisticEffect for "visualEffects.artistic" {
        #[default]
        None => "none",
        OilPainting => "oil-painting",
        Watercolor => "watercolor",
        Sketch => "sketch",
        Emboss => "emboss",
        EdgeDetection => "edge-detection",
        Posterize => "posterize",
    }
}

choice! {
    #[derive(Default)]
    pub enum ToneMapping for "advanced.hdr.toneMapping" {
        #[default]
        None => "none",
        Hable => "hable",
        Reinhard => "reinhard",
        Mobius => "mobius",
    }
}

choice! {
    #[derive(Default)]
    pub enum ColorSpaceName for "advanced.colorSpace" {
        #[default]
        Auto => "auto",
        Rec709 => "rec709",
        Rec2020 => "rec2020",
        Srgb => "srgb",
        P3 => "p3",
    }
}

/// Options for converting a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoOptions {
    pub format: VideoFormat,
    #[serde(default)]
    pub width: Option<i64>,
    #[serde(default)]
    pub height: Option<i64>,
    #[serde(default)]
    pub preserve_aspect_ratio: bool,
    #[serde(default = "unit_speed")]
    pub speed: f64,
    #[serde(default)]
    pub quality: VideoQuality,
    #[serde(default)]
    pub trim: Option<TrimRange>,
    #[serde(default)]
    pub visual_effects: Option<VisualEffects>,
    #[serde(default)]
    pub transform: Option<Transform>,
    #[serde(default)]
    pub temporal: Option<Temporal>,
    #[serde(default)]
    pub advanced: Option<VideoAdvanced>,
}

pub(super) fn unit_speed() -> f64 {
    1.0
}

/// Colour grading and pixel effects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VisualEffects {
    pub brightness: Option<i64>,
    pub contrast: Option<i64>,
    pub saturation: Option<i64>,
    pub hue: Option<i64>,
    pub gamma: Option<f64>,
    pub exposure: Option<i64>,
    pub shadows: Option<i64>,
    pub highlights: Option<i64>,
    pub gaussian_blur: Option<f64>,
    pub motion_blur: Option<MotionBlur>,
    pub unsharp_mask: Option<UnsharpMask>,
    pub noise: Option<Noise>,
    pub artistic: Option<ArtisticEffect>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionBlur {
    pub distance: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnsharpMask {
    pub amount: f64,
    pub radius: f64,
    pub threshold: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Noise {
    #[serde(rename = "type")]
    pub kind: NoiseType,
    pub amount: f64,
}

/// Geometric transforms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Transform {
    /// Degrees, positive is clockwise.
    pub rotation: Option<f64>,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
    pub crop: Option<CropArea>,
}

/// Time-domain effects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Temporal {
    pub reverse: bool,
    pub frame_rate: Option<FrameRate>,
    pub stabilization: Option<Stabilization>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameRate {
    pub target: Option<i64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stabilization {
    pub enabled: bool,
    pub shakiness: i64,
    pub accuracy: i64,
}

/// HDR and colour management.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoAdvanced {
    pub hdr: Option<Hdr>,
    pub color_space: Option<ColorSpace>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Hdr {
    pub tone_mapping: ToneMapping,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorSpace {
    pub input: ColorSpaceName,
    pub output: ColorSpaceName,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let opts: VideoOptions = serde_json::from_value(json!({"format": "mkv"})).unwrap();
        assert_eq!(opts.speed, 1.0);
        assert_eq!(opts.quality, VideoQuality::Medium);
        assert!(!opts.preserve_aspect_ratio);
        assert!(opts.visual_effects.is_none());
    }

    #[test]
    fn test_nested_groups() {
        let opts: VideoOptions = serde_json::from_value(json!({
            "format": "webm",
            "visualEffects": {
                "brightness": 20,
                "noise": {"type": "film-grain", "amount": 30},
                "artistic": "sketch"
            },
            "transform": {"rotation": 90, "flipHorizontal": true},
            "temporal": {"frameRate": {"target": 30}},
            "advanced": {"hdr": {"toneMapping": "hable"}}
        }))
        .unwrap();

        let ve = opts.visual_effects.unwrap();
        assert_eq!(ve.brightness, Some(20));
        assert_eq!(ve.noise.unwrap().kind, NoiseType::FilmGrain);
        assert_eq!(ve.artistic, Some(ArtisticEffect::Sketch));
        let transform = opts.transform.unwrap();
        assert_eq!(transform.rotation, Some(90.0));
        assert!(transform.flip_horizontal);
        assert_eq!(opts.temporal.unwrap().frame_rate.unwrap().target, Some(30));
        assert_eq!(
            opts.advanced.unwrap().hdr.unwrap().tone_mapping,
            ToneMapping::Hable
        );
    }

    #[test]
    fn test_intermediate_codecs_use_mov() {
        assert_eq!(VideoFormat::Prores.extension(), "mov");
        assert_eq!(VideoFormat::Dnxhd.extension(), "mov");
        assert_eq!(VideoFormat::Webm.extension(), "webm");
    }
}
