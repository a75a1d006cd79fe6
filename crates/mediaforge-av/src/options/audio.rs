//! Audio conversion options.

use super::video::unit_speed;
use super::{choice, TrimRange};
use serde::{Deserialize, Serialize};

choice! {
    /// Target audio codec/container.
    pub enum AudioFormat for "format" {
        Mp3 => "mp3",
        Wav => "wav",
        Aac => "aac",
        Ogg => "ogg",
        Flac => "flac",
        Alac => "alac",
        Opus => "opus",
        Ac3 => "ac3",
        Dts => "dts",
    }
}

impl AudioFormat {
    /// Output file extension. ALAC lives in an MPEG-4 audio container.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Alac => "m4a",
            other => other.as_str(),
        }
    }

    /// Lossless formats ignore the bitrate setting.
    pub fn is_lossless(self) -> bool {
        matches!(self, Self::Wav | Self::Flac | Self::Alac)
    }

    /// ffmpeg encoder name.
    pub fn codec(self) -> &'static str {
        match self {
            Self::Mp3 => "libmp3lame",
            Self::Wav => "pcm_s16le",
            Self::Aac => "aac",
            Self::Ogg => "libvorbis",
            Self::Flac => "flac",
            Self::Alac => "alac",
            Self::Opus => "libopus",
            Self::Ac3 => "ac3",
            Self::Dts => "dca",
        }
    }
}

choice! {
    /// Target bitrate in kbit/s.
    pub enum Bitrate for "bitrate" {
        Kbps128 => "128",
        Kbps192 => "192",
        Kbps256 => "256",
        Kbps320 => "320",
        Kbps512 => "512",
        Kbps1024 => "1024",
    }
}

choice! {
    pub enum SampleRate for "sampleRate" {
        Hz22050 => "22050",
        Hz44100 => "44100",
        Hz48000 => "48000",
        Hz96000 => "96000",
        Hz192000 => "192000",
    }
}

choice! {
    pub enum ChannelLayout for "channels" {
        Mono => "mono",
        Stereo => "stereo",
        Surround51 => "5.1",
        Surround71 => "7.1",
    }
}

impl ChannelLayout {
    /// Channel count passed to `-ac`.
    pub fn count(self) -> u8 {
        match self {
            Self::Mono => 1,
            Self::Stereo => 2,
            Self::Surround51 => 6,
            Self::Surround71 => 8,
        }
    }
}

choice! {
    #[derive(Default)]
    pub enum EqPreset for "basicProcessing.equalizer.preset" {
        #[default]
        None => "none",
        BassBoost => "bass-boost",
        TrebleBoost => "treble-boost",
        Vocal => "vocal",
        Classical => "classical",
        Rock => "rock",
        Jazz => "jazz",
    }
}

choice! {
    #[derive(Default)]
    pub enum ReverbType for "timeBasedEffects.reverb.type" {
        #[default]
        None => "none",
        Room => "room",
        Hall => "hall",
        Plate => "plate",
        Spring => "spring",
    }
}

choice! {
    #[derive(Default)]
    pub enum DelayType for "timeBasedEffects.delay.type" {
        #[default]
        None => "none",
        Echo => "echo",
        MultiTap => "multi-tap",
        PingPong => "ping-pong",
    }
}

choice! {
    #[derive(Default)]
    pub enum ModulationType for "timeBasedEffects.modulation.type" {
        #[default]
        None => "none",
        Chorus => "chorus",
        Flanger => "flanger",
        Phaser => "phaser",
        Tremolo => "tremolo",
        Vibrato => "vibrato",
    }
}

choice! {
    #[derive(Default)]
    pub enum NoiseReductionType for "restoration.noiseReduction.type" {
        #[default]
        None => "none",
        Spectral => "spectral",
        Adaptive => "adaptive",
        Gate => "gate",
    }
}

choice! {
    #[derive(Default)]
    pub enum HumFrequency for "restoration.deHum.frequency" {
        Hz50 => "50hz",
        Hz60 => "60hz",
        #[default]
        Auto => "auto",
    }
}

choice! {
    #[derive(Default)]
    pub enum StretchAlgorithm for "advanced.timeStretch.algorithm" {
        Pitch => "pitch",
        #[default]
        Time => "time",
        Formant => "formant",
    }
}

choice! {
    #[derive(Default)]
    pub enum SpatialType for "advanced.spatialAudio.type" {
        #[default]
        None => "none",
        Binaural => "binaural",
        Surround => "surround",
        ThreeD => "3d",
    }
}

/// Options for converting an audio file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioOptions {
    pub format: AudioFormat,
    /// Required unless the format is lossless.
    #[serde(default)]
    pub bitrate: Option<Bitrate>,
    #[serde(default)]
    pub sample_rate: Option<SampleRate>,
    #[serde(default)]
    pub channels: Option<ChannelLayout>,
    #[serde(default = "unit_speed")]
    pub speed: f64,
    #[serde(default = "unit_volume")]
    pub volume: f64,
    #[serde(default)]
    pub trim: Option<TrimRange>,
    #[serde(default)]
    pub basic_processing: Option<BasicProcessing>,
    #[serde(default)]
    pub time_based_effects: Option<TimeBasedEffects>,
    #[serde(default)]
    pub restoration: Option<Restoration>,
    #[serde(default)]
    pub advanced: Option<AudioAdvanced>,
}

fn unit_volume() -> f64 {
    1.0
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BasicProcessing {
    pub normalize: bool,
    /// Gain in dB.
    pub amplify: Option<f64>,
    /// Seconds.
    pub fade_in: Option<f64>,
    /// Seconds.
    pub fade_out: Option<f64>,
    pub equalizer: Option<Equalizer>,
    pub stereo: Option<Stereo>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Equalizer {
    pub enabled: bool,
    pub preset: EqPreset,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Stereo {
    /// -100 (left) to 100 (right).
    pub pan: Option<f64>,
    /// Percent, 100 is unchanged.
    pub width: Option<f64>,
    pub mono_conversion: bool,
    pub channel_swap: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeBasedEffects {
    pub reverb: Option<Reverb>,
    pub delay: Option<Delay>,
    pub modulation: Option<Modulation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Reverb {
    pub enabled: bool,
    #[serde(rename = "type")]
    pub kind: ReverbType,
    /// Percent, 50 is the preset's natural size.
    pub room_size: f64,
}

impl Default for Reverb {
    fn default() -> Self {
        Self {
            enabled: false,
            kind: ReverbType::None,
            room_size: 50.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Delay {
    pub enabled: bool,
    #[serde(rename = "type")]
    pub kind: DelayType,
    /// Milliseconds.
    pub time: f64,
    /// Percent.
    pub feedback: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modulation {
    pub enabled: bool,
    #[serde(rename = "type")]
    pub kind: ModulationType,
    /// Hz.
    pub rate: f64,
    /// Percent.
    pub depth: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Restoration {
    pub noise_reduction: Option<NoiseReduction>,
    pub de_hum: Option<DeHum>,
    pub declip: Option<Declip>,
    pub silence_detection: Option<SilenceDetection>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseReduction {
    pub enabled: bool,
    #[serde(rename = "type")]
    pub kind: NoiseReductionType,
    pub strength: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeHum {
    pub enabled: bool,
    pub frequency: HumFrequency,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Declip {
    pub enabled: bool,
    pub threshold: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SilenceDetection {
    pub enabled: bool,
    pub threshold: f64,
    /// Seconds.
    pub min_duration: f64,
}

impl Default for SilenceDetection {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold: 0.0,
            min_duration: 0.5,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AudioAdvanced {
    pub pitch_shift: Option<PitchShift>,
    pub time_stretch: Option<TimeStretch>,
    pub spatial_audio: Option<SpatialAudio>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PitchShift {
    pub enabled: bool,
    pub semitones: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeStretch {
    pub enabled: bool,
    pub factor: f64,
    pub algorithm: StretchAlgorithm,
}

impl Default for TimeStretch {
    fn default() -> Self {
        Self {
            enabled: false,
            factor: 1.0,
            algorithm: StretchAlgorithm::Time,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialAudio {
    pub enabled: bool,
    #[serde(rename = "type")]
    pub kind: SpatialType,
}
