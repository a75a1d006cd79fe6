//! Numeric bounds and cross-field rules for option sets.
//!
//! Validation never corrects a value; the first violation found is returned
//! as [`Error::InvalidOption`] naming the field and the constraint.

use crate::options::{AudioOptions, CropArea, ImageOptions, OptionSet, TrimRange, VideoOptions};
use crate::{Error, Result};
use std::fmt::Display;

/// Largest accepted image edge in pixels.
pub const MAX_IMAGE_DIMENSION: i64 = 10_000;
/// Largest accepted video edge in pixels.
pub const MAX_VIDEO_DIMENSION: i64 = 4_096;
/// Shortest accepted trim window in seconds.
pub const MIN_TRIM_DURATION: f64 = 0.1;

/// Check every bound of an option set.
pub fn validate(options: &OptionSet) -> Result<()> {
    match options {
        OptionSet::Image(o) => validate_image(o),
        OptionSet::Video(o) => validate_video(o),
        OptionSet::Audio(o) => validate_audio(o),
    }
}

pub fn validate_image(o: &ImageOptions) -> Result<()> {
    dimension("width", o.width, MAX_IMAGE_DIMENSION)?;
    dimension("height", o.height, MAX_IMAGE_DIMENSION)?;

    match o.quality {
        Some(q) => range("quality", q, 1, 100)?,
        None if o.format.requires_quality() => {
            return Err(Error::invalid_option(
                "quality",
                format!("is required for {} output", o.format),
            ));
        }
        None => {}
    }

    if let Some(tint) = o.tint.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        if !is_hex_colour(tint) {
            return Err(Error::invalid_option(
                "tint",
                format!("must be a #rrggbb colour, got {:?}", tint),
            ));
        }
    }

    if let Some(crop) = &o.crop {
        crop_area("crop", crop, MAX_IMAGE_DIMENSION)?;
    }
    Ok(())
}

pub fn validate_video(o: &VideoOptions) -> Result<()> {
    dimension("width", o.width, MAX_VIDEO_DIMENSION)?;
    dimension("height", o.height, MAX_VIDEO_DIMENSION)?;
    range("speed", o.speed, 0.25, 4.0)?;
    if let Some(trim) = &o.trim {
        trim_range(trim)?;
    }

    if let Some(ve) = &o.visual_effects {
        opt_range("visualEffects.brightness", ve.brightness, -100, 100)?;
        opt_range("visualEffects.contrast", ve.contrast, -100, 100)?;
        opt_range("visualEffects.saturation", ve.saturation, -100, 100)?;
        opt_range("visualEffects.hue", ve.hue, -180, 180)?;
        opt_range("visualEffects.gamma", ve.gamma, 0.1, 3.0)?;
        opt_range("visualEffects.exposure", ve.exposure, -100, 100)?;
        opt_range("visualEffects.shadows", ve.shadows, -100, 100)?;
        opt_range("visualEffects.highlights", ve.highlights, -100, 100)?;
        opt_range("visualEffects.gaussianBlur", ve.gaussian_blur, 0.0, 50.0)?;
        if let Some(mb) = &ve.motion_blur {
            range("visualEffects.motionBlur.distance", mb.distance, 0.0, 100.0)?;
        }
        if let Some(um) = &ve.unsharp_mask {
            range("visualEffects.unsharpMask.amount", um.amount, 0.0, 500.0)?;
            range("visualEffects.unsharpMask.radius", um.radius, 0.0, 10.0)?;
            range("visualEffects.unsharpMask.threshold", um.threshold, 0.0, 255.0)?;
        }
        if let Some(noise) = &ve.noise {
            range("visualEffects.noise.amount", noise.amount, 0.0, 100.0)?;
        }
    }

    if let Some(t) = &o.transform {
        opt_range("transform.rotation", t.rotation, -360.0, 360.0)?;
        if let Some(crop) = &t.crop {
            crop_area("transform.crop", crop, MAX_VIDEO_DIMENSION)?;
        }
    }

    if let Some(te) = &o.temporal {
        if let Some(fr) = &te.frame_rate {
            opt_range("temporal.frameRate.target", fr.target, 1, 120)?;
        }
        if let Some(st) = te.stabilization.as_ref().filter(|s| s.enabled) {
            range("temporal.stabilization.shakiness", st.shakiness, 1, 10)?;
            range("temporal.stabilization.accuracy", st.accuracy, 1, 15)?;
        }
    }
    Ok(())
}

pub fn validate_audio(o: &AudioOptions) -> Result<()> {
    range("speed", o.speed, 0.25, 4.0)?;
    range("volume", o.volume, 0.1, 2.0)?;
    if o.bitrate.is_none() && !o.format.is_lossless() {
        return Err(Error::invalid_option(
            "bitrate",
            format!("is required for {} output", o.format),
        ));
    }
    if let Some(trim) = &o.trim {
        trim_range(trim)?;
    }

    if let Some(bp) = &o.basic_processing {
        opt_range("basicProcessing.amplify", bp.amplify, -60.0, 60.0)?;
        opt_range("basicProcessing.fadeIn", bp.fade_in, 0.0, 30.0)?;
        opt_range("basicProcessing.fadeOut", bp.fade_out, 0.0, 30.0)?;
        if let Some(st) = &bp.stereo {
            opt_range("basicProcessing.stereo.pan", st.pan, -100.0, 100.0)?;
            opt_range("basicProcessing.stereo.width", st.width, 0.0, 200.0)?;
        }
    }

    if let Some(tbe) = &o.time_based_effects {
        if let Some(r) = tbe.reverb.as_ref().filter(|r| r.enabled) {
            range("timeBasedEffects.reverb.roomSize", r.room_size, 0.0, 100.0)?;
        }
        if let Some(d) = tbe.delay.as_ref().filter(|d| d.enabled) {
            range("timeBasedEffects.delay.time", d.time, 0.0, 2000.0)?;
            range("timeBasedEffects.delay.feedback", d.feedback, 0.0, 95.0)?;
        }
        if let Some(m) = tbe.modulation.as_ref().filter(|m| m.enabled) {
            range("timeBasedEffects.modulation.rate", m.rate, 0.1, 20.0)?;
            range("timeBasedEffects.modulation.depth", m.depth, 0.0, 100.0)?;
        }
    }

    if let Some(rest) = &o.restoration {
        if let Some(nr) = rest.noise_reduction.as_ref().filter(|n| n.enabled) {
            range("restoration.noiseReduction.strength", nr.strength, 0.0, 100.0)?;
        }
        if let Some(dc) = rest.declip.as_ref().filter(|d| d.enabled) {
            range("restoration.declip.threshold", dc.threshold, 0.0, 100.0)?;
        }
        if let Some(sd) = rest.silence_detection.as_ref().filter(|s| s.enabled) {
            range("restoration.silenceDetection.threshold", sd.threshold, 0.0, 100.0)?;
            range(
                "restoration.silenceDetection.minDuration",
                sd.min_duration,
                0.1,
                10.0,
            )?;
        }
    }

    if let Some(adv) = &o.advanced {
        if let Some(ps) = adv.pitch_shift.as_ref().filter(|p| p.enabled) {
            range("advanced.pitchShift.semitones", ps.semitones, -24, 24)?;
        }
        if let Some(ts) = adv.time_stretch.as_ref().filter(|t| t.enabled) {
            range("advanced.timeStretch.factor", ts.factor, 0.25, 4.0)?;
        }
    }
    Ok(())
}

/// Inclusive range check. NaN never satisfies it.
fn range<T>(field: &str, value: T, min: T, max: T) -> Result<()>
where
    T: PartialOrd + Display + Copy,
{
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(Error::invalid_option(
            field,
            format!("must be between {} and {}, got {}", min, max, value),
        ))
    }
}

fn opt_range<T>(field: &str, value: Option<T>, min: T, max: T) -> Result<()>
where
    T: PartialOrd + Display + Copy,
{
    value.map_or(Ok(()), |v| range(field, v, min, max))
}

fn dimension(field: &str, value: Option<i64>, max: i64) -> Result<()> {
    match value {
        Some(v) if v <= 0 => Err(Error::invalid_option(
            field,
            format!("must be positive, got {}", v),
        )),
        Some(v) if v > max => Err(Error::invalid_option(
            field,
            format!("too large (max {}), got {}", max, v),
        )),
        _ => Ok(()),
    }
}

fn crop_area(field: &str, crop: &CropArea, max: i64) -> Result<()> {
    if crop.x < 0 || crop.y < 0 {
        return Err(Error::invalid_option(
            format!("{}.x", field),
            format!("crop position must be non-negative, got ({}, {})", crop.x, crop.y),
        ));
    }
    dimension(&format!("{}.width", field), Some(crop.width), max)?;
    dimension(&format!("{}.height", field), Some(crop.height), max)
}

fn trim_range(trim: &TrimRange) -> Result<()> {
    if trim.start_time.is_nan() || trim.start_time < 0.0 {
        return Err(Error::invalid_option(
            "trim.startTime",
            format!("must be non-negative, got {:.2}", trim.start_time),
        ));
    }
    if trim.end_time.is_nan() || trim.end_time <= trim.start_time {
        return Err(Error::invalid_option(
            "trim.endTime",
            format!(
                "end time ({:.2}) must be greater than start time ({:.2})",
                trim.end_time, trim.start_time
            ),
        ));
    }
    if trim.duration() < MIN_TRIM_DURATION {
        return Err(Error::invalid_option(
            "trim",
            format!(
                "duration must be at least {} seconds, got {:.2}",
                MIN_TRIM_DURATION,
                trim.duration()
            ),
        ));
    }
    Ok(())
}

fn is_hex_colour(s: &str) -> bool {
    s.len() == 7
        && s.starts_with('#')
        && s[1..].chars().all(|c| c.is_ascii_hexdigit())
}
