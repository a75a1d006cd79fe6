//! Typed conversion options.
//!
//! Clients submit a loosely-typed JSON payload; [`OptionSet::parse`] turns it
//! into the strict variant for the file's media category. Enumerated values
//! are closed Rust enums, so an unknown value is rejected while parsing and
//! the rejection names the field it came from. Numeric ranges are checked
//! separately by [`crate::validate`].

use crate::{Error, Result};
use mediaforge_common::MediaCategory;
use serde::{Deserialize, Serialize};

/// Raw text of an enumerated option. Accepts JSON strings and numbers so that
/// `"bitrate": 192` and `"bitrate": "192"` are equivalent.
#[doc(hidden)]
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ChoiceText {
    Text(String),
    Number(serde_json::Number),
}

impl From<ChoiceText> for String {
    fn from(value: ChoiceText) -> Self {
        match value {
            ChoiceText::Text(s) => s,
            ChoiceText::Number(n) => n.to_string(),
        }
    }
}

/// Declares a closed set of string values for one option field.
macro_rules! choice {
    (
        $(#[$meta:meta])*
        pub enum $name:ident for $field:literal {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(try_from = "crate::options::ChoiceText", into = "String")]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
        }

        impl $name {
            /// Option field this value belongs to.
            pub const FIELD: &'static str = $field;

            /// Every accepted spelling, in declaration order.
            pub const VALUES: &'static [&'static str] = &[$($text),+];

            /// The wire spelling of this value.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::Error;

            fn from_str(s: &str) -> crate::Result<Self> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(crate::Error::invalid_option(
                        $field,
                        format!(
                            "unsupported value `{}` (expected one of: {})",
                            other,
                            Self::VALUES.join(", ")
                        ),
                    )),
                }
            }
        }

        impl TryFrom<crate::options::ChoiceText> for $name {
            type Error = crate::Error;

            fn try_from(value: crate::options::ChoiceText) -> crate::Result<Self> {
                String::from(value).parse()
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.as_str().to_string()
            }
        }
    };
}

pub(crate) use choice;

mod audio;
mod image;
mod video;

pub use audio::*;
pub use image::*;
pub use video::*;

/// A `[start, end)` window in seconds, shared by video and audio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrimRange {
    pub start_time: f64,
    pub end_time: f64,
}

impl TrimRange {
    /// Length of the window in seconds.
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// A rectangle in source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropArea {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

/// Validated-shape options for one conversion, one variant per media category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "category", rename_all = "lowercase")]
pub enum OptionSet {
    Image(ImageOptions),
    Video(VideoOptions),
    Audio(AudioOptions),
}

impl OptionSet {
    /// Parse a raw payload into the variant for `category`.
    ///
    /// This only checks shape and enumerations; call [`crate::validate::validate`]
    /// (or use [`OptionSet::parse_and_validate`]) for numeric bounds.
    pub fn parse(category: MediaCategory, raw: &serde_json::Value) -> Result<Self> {
        match category {
            MediaCategory::Image => from_payload(raw).map(Self::Image),
            MediaCategory::Video => from_payload(raw).map(Self::Video),
            MediaCategory::Audio => from_payload(raw).map(Self::Audio),
            MediaCategory::Unknown => Err(Error::invalid_option(
                "type",
                "unsupported file type: only image, video and audio files can be converted",
            )),
        }
    }

    /// Parse and then check every bound.
    pub fn parse_and_validate(category: MediaCategory, raw: &serde_json::Value) -> Result<Self> {
        let options = Self::parse(category, raw)?;
        crate::validate::validate(&options)?;
        Ok(options)
    }

    /// Media category this option set applies to.
    pub fn category(&self) -> MediaCategory {
        match self {
            Self::Image(_) => MediaCategory::Image,
            Self::Video(_) => MediaCategory::Video,
            Self::Audio(_) => MediaCategory::Audio,
        }
    }

    /// File extension of the converted output.
    pub fn output_extension(&self) -> &'static str {
        match self {
            Self::Image(o) => o.format.extension(),
            Self::Video(o) => o.format.extension(),
            Self::Audio(o) => o.format.extension(),
        }
    }
}

fn from_payload<T: serde::de::DeserializeOwned>(raw: &serde_json::Value) -> Result<T> {
    serde_json::from_value(raw.clone()).map_err(|e| payload_error(&e.to_string()))
}

/// Recover the field name from a serde error message so callers always get
/// an [`Error::InvalidOption`] that points at something.
fn payload_error(message: &str) -> Error {
    // Errors raised by choice enums already carry their own field.
    if let Some(rest) = message.strip_prefix("invalid option `") {
        if let Some((field, detail)) = rest.split_once("`: ") {
            return Error::invalid_option(field, detail);
        }
    }
    for marker in ["missing field `", "unknown field `"] {
        if let Some(start) = message.find(marker) {
            let rest = &message[start + marker.len()..];
            if let Some(end) = rest.find('`') {
                return Error::invalid_option(&rest[..end], message);
            }
        }
    }
    Error::invalid_option("options", message)
}
