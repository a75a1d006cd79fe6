//! Still image commands.
//!
//! ffmpeg handles resizing, cropping, and the simple filters. Filters it has
//! no equivalent for, and tints, go through ImageMagick. ImageMagick output
//! destined for WebP is rendered to a lossless PNG first and handed to a
//! second ffmpeg pass.

use super::{Args, ArgumentSequence, ConversionPlan, Encoder, FilterChain, STAGING_FILE_NAME};
use crate::options::{ImageFilter, ImageFormat, ImageOptions};
use crate::Result;
use std::path::Path;

const SEPIA_MATRIX: &str =
    "colorchannelmixer=.393:.769:.189:0:.349:.686:.168:0:.272:.534:.131";

/// Build the plan for an image conversion.
pub fn build_image(
    options: &ImageOptions,
    input: &Path,
    output: &Path,
    staging_dir: &Path,
) -> Result<ConversionPlan> {
    if !options.needs_imagemagick() {
        return Ok(ConversionPlan::single(
            ffmpeg_pass(options, input, output),
            output,
        ));
    }

    if options.format == ImageFormat::Webp {
        let staging = staging_dir.join(STAGING_FILE_NAME);
        let first = magick_pass(options, input, &staging);
        let second = webp_transcode_pass(options, &staging, output);
        return Ok(ConversionPlan::staged(first, second, staging, output));
    }

    Ok(ConversionPlan::single(
        magick_pass(options, input, output),
        output,
    ))
}

fn ffmpeg_pass(options: &ImageOptions, input: &Path, output: &Path) -> ArgumentSequence {
    let mut args = Args::new();
    args.push("-i").path(input);

    let mut chain = FilterChain::new();
    // Crop is expressed in source pixels, so it runs before scaling.
    if let Some(crop) = &options.crop {
        chain.push(format!(
            "crop={}:{}:{}:{}",
            crop.width, crop.height, crop.x, crop.y
        ));
    }
    if let Some(scale) = scale_filter(options.width, options.height) {
        chain.push(scale);
    }
    match options.filter {
        ImageFilter::Grayscale => {
            chain.push("format=gray");
        }
        ImageFilter::Sepia => {
            chain.push(SEPIA_MATRIX);
        }
        ImageFilter::Blur => {
            chain.push("gblur=sigma=8");
        }
        ImageFilter::Sharpen => {
            chain.push("unsharp=5:5:1.0");
        }
        ImageFilter::Rotate90 => {
            chain.push("transpose=1");
        }
        ImageFilter::Rotate180 => {
            chain.extend(["hflip", "vflip"]);
        }
        ImageFilter::Rotate270 => {
            chain.push("transpose=2");
        }
        // ImageMagick-only filters never reach this pass.
        _ => {}
    }
    args.chain("-vf", &chain);

    push_ffmpeg_quality(&mut args, options.format, options.quality);
    if options.format != ImageFormat::Gif {
        args.pair("-frames:v", "1");
    }
    args.overwrite_output(output);
    args.finish(Encoder::Ffmpeg)
}

fn magick_pass(options: &ImageOptions, input: &Path, output: &Path) -> ArgumentSequence {
    let mut args = Args::new();
    args.path(input);

    if let Some(crop) = &options.crop {
        args.pair(
            "-crop",
            format!("{}x{}+{}+{}", crop.width, crop.height, crop.x, crop.y),
        )
        .push("+repage");
    }

    match (options.width, options.height) {
        (Some(w), Some(h)) => {
            args.pair("-resize", format!("{}x{}!", w, h));
        }
        (Some(w), None) => {
            args.pair("-resize", format!("{}x", w));
        }
        (None, Some(h)) => {
            args.pair("-resize", format!("x{}", h));
        }
        (None, None) => {}
    }

    match options.filter {
        ImageFilter::None => {}
        ImageFilter::Grayscale => {
            args.pair("-colorspace", "Gray");
        }
        ImageFilter::Sepia => {
            args.pair("-sepia-tone", "80%");
        }
        ImageFilter::Blur => {
            args.pair("-blur", "0x8");
        }
        ImageFilter::Sharpen => {
            args.pair("-sharpen", "0x1");
        }
        ImageFilter::Swirl => {
            args.pair("-swirl", "90");
        }
        ImageFilter::BarrelDistortion => {
            args.pair("-distort", "Barrel").push("0.1 0.0 0.0 1.0");
        }
        ImageFilter::OilPainting => {
            args.pair("-paint", "4");
        }
        ImageFilter::Vintage => {
            args.pair("-modulate", "120,50,100").pair("-colorize", "10,5,15");
        }
        ImageFilter::Emboss => {
            args.pair("-emboss", "2");
        }
        ImageFilter::Charcoal => {
            args.pair("-charcoal", "2");
        }
        ImageFilter::Sketch => {
            args.pair("-sketch", "0x20+120");
        }
        ImageFilter::Rotate45 => {
            args.pair("-rotate", "45");
        }
        ImageFilter::Rotate90 => {
            args.pair("-rotate", "90");
        }
        ImageFilter::Rotate180 => {
            args.pair("-rotate", "180");
        }
        ImageFilter::Rotate270 => {
            args.pair("-rotate", "270");
        }
    }

    if let Some(tint) = options.effective_tint() {
        args.pair("-fill", tint).pair("-tint", "30");
    }

    if matches!(options.format, ImageFormat::Jpg | ImageFormat::Jpeg) {
        if let Some(q) = options.quality {
            args.pair("-quality", q.to_string());
        }
    }

    args.path(output);
    args.finish(Encoder::ImageMagick)
}

fn webp_transcode_pass(options: &ImageOptions, staging: &Path, output: &Path) -> ArgumentSequence {
    let mut args = Args::new();
    args.push("-i").path(staging);
    push_ffmpeg_quality(&mut args, ImageFormat::Webp, options.quality);
    args.pair("-frames:v", "1");
    args.overwrite_output(output);
    args.finish(Encoder::Ffmpeg)
}

fn scale_filter(width: Option<i64>, height: Option<i64>) -> Option<String> {
    match (width, height) {
        (Some(w), Some(h)) => Some(format!("scale={}:{}", w, h)),
        (Some(w), None) => Some(format!("scale={}:-1", w)),
        (None, Some(h)) => Some(format!("scale=-1:{}", h)),
        (None, None) => None,
    }
}

fn push_ffmpeg_quality(args: &mut Args, format: ImageFormat, quality: Option<i64>) {
    let Some(q) = quality.map(|q| q.clamp(1, 100)) else {
        return;
    };
    match format {
        ImageFormat::Jpg | ImageFormat::Jpeg => {
            args.pair("-q:v", jpeg_quantizer(q).to_string());
        }
        ImageFormat::Webp => {
            args.pair("-quality", q.to_string())
                .pair("-compression_level", compression_level(q, 6).to_string());
        }
        ImageFormat::Png => {
            args.pair("-compression_level", compression_level(q, 9).to_string());
        }
        ImageFormat::Gif => {}
    }
}

/// Map 1..=100 onto ffmpeg's mjpeg quantizer, 31 (worst) to 2 (best).
fn jpeg_quantizer(quality: i64) -> i64 {
    2 + ((100 - quality) * 29 + 49) / 99
}

/// Higher requested quality means less compression effort, `0..=max`.
fn compression_level(quality: i64, max: i64) -> i64 {
    ((100 - quality) * max + 49) / 99
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    fn opts(raw: serde_json::Value) -> ImageOptions {
        serde_json::from_value(raw).unwrap()
    }

    fn plan(raw: serde_json::Value) -> ConversionPlan {
        build_image(
            &opts(raw),
            Path::new("/in/photo.jpg"),
            Path::new("/out/job_converted.png"),
            Path::new("/tmp/stage"),
        )
        .unwrap()
    }

    #[test]
    fn test_width_only_grayscale() {
        let plan = plan(json!({"format": "png", "width": 800, "filter": "grayscale"}));
        assert_eq!(plan.passes().len(), 1);
        let pass = &plan.passes()[0];
        assert_eq!(pass.encoder(), Encoder::Ffmpeg);
        assert_eq!(pass.value_of("-vf"), Some("scale=800:-1,format=gray"));
        assert_eq!(pass.args()[0..2], ["-i", "/in/photo.jpg"]);
        let n = pass.args().len();
        assert_eq!(pass.args()[n - 2..], ["-y", "/out/job_converted.png"]);
        assert!(plan.staging_file().is_none());
    }

    #[test]
    fn test_crop_precedes_resize_ffmpeg() {
        let plan = plan(json!({
            "format": "png", "width": 400, "height": 300,
            "crop": {"x": 10, "y": 20, "width": 640, "height": 480}
        }));
        let chain = plan.passes()[0].value_of("-vf").unwrap();
        assert_eq!(chain, "crop=640:480:10:20,scale=400:300");
    }

    #[test]
    fn test_crop_precedes_resize_imagemagick() {
        let plan = plan(json!({
            "format": "png", "width": 400, "filter": "swirl",
            "crop": {"x": 0, "y": 0, "width": 100, "height": 100}
        }));
        let pass = &plan.passes()[0];
        assert_eq!(pass.encoder(), Encoder::ImageMagick);
        let crop = pass.position("-crop").unwrap();
        let resize = pass.position("-resize").unwrap();
        let swirl = pass.position("-swirl").unwrap();
        assert!(crop < resize && resize < swirl);
        assert_eq!(pass.args().last().unwrap(), "/out/job_converted.png");
    }

    #[test]
    fn test_jpeg_quantizer_range() {
        assert_eq!(jpeg_quantizer(100), 2);
        assert_eq!(jpeg_quantizer(1), 31);
        let plan = plan(json!({"format": "jpg", "quality": 100}));
        assert_eq!(plan.passes()[0].value_of("-q:v"), Some("2"));
        assert!(plan.passes()[0].position("-frames:v").is_some());
    }

    #[test]
    fn test_png_compression_heuristic() {
        assert_eq!(compression_level(100, 9), 0);
        assert_eq!(compression_level(1, 9), 9);
        assert!(compression_level(90, 9) < compression_level(20, 9));
        let plan = plan(json!({"format": "png", "quality": 100}));
        assert_eq!(plan.passes()[0].value_of("-compression_level"), Some("0"));
    }

    #[test]
    fn test_gif_keeps_all_frames() {
        let plan = plan(json!({"format": "gif", "filter": "rotate-90º"}));
        let pass = &plan.passes()[0];
        assert_eq!(pass.value_of("-vf"), Some("transpose=1"));
        assert!(pass.position("-frames:v").is_none());
    }

    #[test]
    fn test_tint_routes_to_imagemagick() {
        let plan = plan(json!({"format": "jpg", "quality": 80, "tint": "#3366ff"}));
        let pass = &plan.passes()[0];
        assert_eq!(pass.encoder(), Encoder::ImageMagick);
        assert_eq!(pass.value_of("-fill"), Some("#3366ff"));
        assert_eq!(pass.value_of("-tint"), Some("30"));
        assert_eq!(pass.value_of("-quality"), Some("80"));
    }

    #[test]
    fn test_imagemagick_webp_uses_staging() {
        let plan = build_image(
            &opts(json!({"format": "webp", "quality": 75, "filter": "charcoal"})),
            Path::new("/in/a.png"),
            Path::new("/out/a.webp"),
            Path::new("/tmp/stage"),
        )
        .unwrap();
        let staging = PathBuf::from("/tmp/stage").join(STAGING_FILE_NAME);
        assert_eq!(plan.staging_file(), Some(staging.as_path()));
        assert_eq!(plan.passes().len(), 2);

        let first = &plan.passes()[0];
        assert_eq!(first.encoder(), Encoder::ImageMagick);
        assert_eq!(first.args().last().unwrap(), &staging.to_string_lossy());

        let second = &plan.passes()[1];
        assert_eq!(second.encoder(), Encoder::Ffmpeg);
        assert_eq!(second.value_of("-i"), Some(staging.to_str().unwrap()));
        assert_eq!(second.value_of("-quality"), Some("75"));
        assert_eq!(second.args().last().unwrap(), "/out/a.webp");
    }
}
