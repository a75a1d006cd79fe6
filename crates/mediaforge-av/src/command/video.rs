//! Video commands.

use super::{push_trim, tempo, Args, ArgumentSequence, Encoder, FilterChain};
use crate::options::{
    ArtisticEffect, ColorSpaceName, NoiseType, ToneMapping, VideoAdvanced, VideoFormat,
    VideoOptions, VideoQuality, VisualEffects,
};
use crate::{Error, Result};
use std::path::Path;

/// Build the ffmpeg invocation for a video conversion.
pub fn build_video(
    options: &VideoOptions,
    input: &Path,
    output: &Path,
) -> Result<ArgumentSequence> {
    if !(options.speed.is_finite() && options.speed > 0.0) {
        return Err(Error::inconsistency(format!(
            "video speed {} reached the command builder",
            options.speed
        )));
    }

    let mut args = Args::new();
    args.push("-i").path(input);
    push_trim(&mut args, options.trim.as_ref());

    let mut video = FilterChain::new();
    if let Some(scale) = scale_filter(options) {
        video.push(scale);
    }
    if let Some(adv) = &options.advanced {
        push_colour_management(&mut video, adv);
    }
    if let Some(ve) = &options.visual_effects {
        push_visual_effects(&mut video, ve);
    }
    if let Some(t) = &options.transform {
        if let Some(deg) = t.rotation.filter(|d| *d != 0.0) {
            video.push(format!("rotate={:.4}", deg.to_radians()));
        }
        if t.flip_horizontal {
            video.push("hflip");
        }
        if t.flip_vertical {
            video.push("vflip");
        }
        if let Some(crop) = &t.crop {
            video.push(format!(
                "crop={}:{}:{}:{}",
                crop.width, crop.height, crop.x, crop.y
            ));
        }
    }

    let mut audio = FilterChain::new();
    if let Some(te) = &options.temporal {
        if te.reverse {
            video.push("reverse");
            audio.push("areverse");
        }
        if let Some(fps) = te.frame_rate.and_then(|f| f.target) {
            video.push(format!("fps={}", fps));
        }
        if let Some(st) = te.stabilization.filter(|s| s.enabled) {
            let range = st.shakiness * 6;
            let search = if st.accuracy >= 8 { "exhaustive" } else { "less" };
            video.push(format!("deshake=rx={0}:ry={0}:search={1}", range, search));
        }
    }
    if options.speed != 1.0 {
        video.push(format!("setpts=PTS/{}", tempo::format_factor(options.speed)));
        audio.extend(tempo::atempo_filters(options.speed));
    }

    args.chain("-vf", &video);
    args.chain("-af", &audio);
    push_codecs(&mut args, options.format, options.quality);
    args.overwrite_output(output);
    Ok(args.finish(Encoder::Ffmpeg))
}

fn scale_filter(options: &VideoOptions) -> Option<String> {
    // -2 keeps the derived edge even, which the 4:2:0 encoders require.
    match (options.width, options.height) {
        (Some(w), Some(h)) if options.preserve_aspect_ratio => Some(format!(
            "scale={}:{}:force_original_aspect_ratio=decrease",
            w, h
        )),
        (Some(w), Some(h)) => Some(format!("scale={}:{}", w, h)),
        (Some(w), None) => Some(format!("scale={}:-2", w)),
        (None, Some(h)) => Some(format!("scale=-2:{}", h)),
        (None, None) => None,
    }
}

fn push_colour_management(chain: &mut FilterChain, adv: &VideoAdvanced) {
    if let Some(algorithm) = adv
        .hdr
        .map(|h| h.tone_mapping)
        .filter(|t| *t != ToneMapping::None)
    {
        chain.extend([
            "zscale=t=linear:npl=100".to_string(),
            "format=gbrpf32le".to_string(),
            "zscale=p=bt709".to_string(),
            format!("tonemap=tonemap={}:desat=0", algorithm),
            "zscale=t=bt709:m=bt709:r=tv".to_string(),
            "format=yuv420p".to_string(),
        ]);
    }

    if let Some(cs) = adv.color_space {
        if cs.output != ColorSpaceName::Auto {
            let mut filter = format!("colorspace=all={}", colour_standard(cs.output));
            if cs.output == ColorSpaceName::P3 {
                filter.push_str(":primaries=smpte432");
            }
            if cs.input != ColorSpaceName::Auto {
                filter.push_str(&format!(":iall={}", colour_standard(cs.input)));
            }
            chain.push(filter);
        }
    }
}

fn colour_standard(name: ColorSpaceName) -> &'static str {
    match name {
        ColorSpaceName::Rec2020 => "bt2020",
        // sRGB and Display P3 share BT.709 transfer and matrix.
        ColorSpaceName::Rec709
        | ColorSpaceName::Srgb
        | ColorSpaceName::P3
        | ColorSpaceName::Auto => {
            "bt709"
        }
    }
}

fn push_visual_effects(chain: &mut FilterChain, ve: &VisualEffects) {
    let mut eq = Vec::new();
    if let Some(b) = ve.brightness.filter(|v| *v != 0) {
        eq.push(format!("brightness={:.2}", b as f64 / 100.0));
    }
    if let Some(c) = ve.contrast.filter(|v| *v != 0) {
        eq.push(format!("contrast={:.2}", (1.0 + c as f64 / 100.0).max(0.0)));
    }
    if let Some(s) = ve.saturation.filter(|v| *v != 0) {
        eq.push(format!("saturation={:.2}", (1.0 + s as f64 / 100.0).max(0.0)));
    }
    if let Some(g) = ve.gamma.filter(|v| *v != 1.0) {
        eq.push(format!("gamma={:.2}", g));
    }
    if let Some(s) = ve.shadows.filter(|v| *v != 0) {
        eq.push(format!("gamma_b={:.2}", 1.0 - s as f64 / 100.0 * 0.3));
    }
    if let Some(h) = ve.highlights.filter(|v| *v != 0) {
        eq.push(format!("gamma_r={:.2}", 1.0 + h as f64 / 100.0 * 0.3));
    }
    if !eq.is_empty() {
        chain.push(format!("eq={}", eq.join(":")));
    }
    if let Some(h) = ve.hue.filter(|v| *v != 0) {
        chain.push(format!("hue=h={}", h));
    }
    if let Some(e) = ve.exposure.filter(|v| *v != 0) {
        // The exposure filter works in EV stops, -3..3.
        chain.push(format!("exposure=exposure={:.2}", e as f64 / 100.0 * 3.0));
    }

    if let Some(sigma) = ve.gaussian_blur.filter(|v| *v > 0.0) {
        chain.push(format!("gblur=sigma={}", tempo::format_factor(sigma)));
    }
    if ve.motion_blur.is_some_and(|m| m.distance > 0.0) {
        chain.push("minterpolate=fps=25:mc_mode=aobmc:me_mode=bidir:vsbmc=1");
    }
    if let Some(um) = ve.unsharp_mask.filter(|u| u.amount > 0.0) {
        let size = (um.radius.round() as i64 * 2 + 1).clamp(3, 23);
        chain.push(format!(
            "unsharp=luma_msize_x={0}:luma_msize_y={0}:luma_amount={1:.2}",
            size,
            (um.amount / 100.0).min(5.0)
        ));
    }
    if let Some(noise) = ve.noise.filter(|n| n.amount > 0.0) {
        let amount = noise.amount.round() as i64;
        match noise.kind {
            NoiseType::None => {}
            NoiseType::FilmGrain => {
                chain.push(format!("noise=alls={}:allf=t", amount));
            }
            NoiseType::Digital => {
                chain.push(format!("noise=alls={}:allf=u", amount));
            }
            NoiseType::Vintage => {
                chain.push(format!("noise=alls={}:allf=t", amount / 2));
            }
        }
    }
    if let Some(artistic) = ve.artistic {
        push_artistic(chain, artistic);
    }
}

fn push_artistic(chain: &mut FilterChain, effect: ArtisticEffect) {
    const EMBOSS_KERNEL: &str = "-2 -1 0 -1 1 1 0 1 2";
    match effect {
        ArtisticEffect::None => {}
        ArtisticEffect::OilPainting => {
            chain.push("median=radius=3");
        }
        ArtisticEffect::Watercolor => {
            chain.extend(["gblur=sigma=2", "edgedetect=low=0.1:high=0.4"]);
        }
        ArtisticEffect::Sketch => {
            chain.extend(["edgedetect=low=0.05:high=0.2", "negate"]);
        }
        ArtisticEffect::Emboss => {
            chain.push(format!(
                "convolution={0}:{0}:{0}:{0}",
                EMBOSS_KERNEL
            ));
        }
        ArtisticEffect::EdgeDetection => {
            chain.push("edgedetect=low=0.1:high=0.3");
        }
        ArtisticEffect::Posterize => {
            chain.push("elbg=codebook_length=16");
        }
    }
}

fn push_codecs(args: &mut Args, format: VideoFormat, quality: VideoQuality) {
    let tier = |low: &'static str, medium: &'static str, high: &'static str| match quality {
        VideoQuality::Low => low,
        VideoQuality::Medium => medium,
        VideoQuality::High => high,
    };

    match format {
        VideoFormat::Mp4
        | VideoFormat::Mov
        | VideoFormat::Mkv
        | VideoFormat::Avi
        | VideoFormat::Flv => {
            args.pair("-crf", tier("30", "23", "18"))
                .pair("-c:v", "libx264")
                .pair("-c:a", "aac");
        }
        VideoFormat::Webm => {
            args.pair("-crf", tier("40", "32", "24"))
                .pair("-b:v", "0")
                .pair("-c:v", "libvpx-vp9")
                .pair("-c:a", "libopus");
        }
        VideoFormat::Wmv => {
            args.pair("-q:v", tier("10", "5", "2"))
                .pair("-c:v", "wmv2")
                .pair("-c:a", "wmav2");
        }
        VideoFormat::Prores => {
            args.pair("-c:v", "prores_ks")
                .pair("-profile:v", "2")
                .pair("-c:a", "pcm_s16le");
        }
        VideoFormat::Dnxhd => {
            args.pair("-c:v", "dnxhd")
                .pair("-profile:v", tier("dnxhr_lq", "dnxhr_sq", "dnxhr_hq"))
                .pair("-pix_fmt", "yuv422p")
                .pair("-c:a", "pcm_s16le");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn build(raw: serde_json::Value) -> ArgumentSequence {
        let opts: VideoOptions = serde_json::from_value(raw).unwrap();
        build_video(&opts, Path::new("in.mov"), Path::new("out/job.mp4")).unwrap()
    }

    #[test]
    fn test_trim_follows_input() {
        let seq = build(json!({
            "format": "mp4", "width": 640,
            "trim": {"startTime": 5, "endTime": 12.5}
        }));
        assert_eq!(
            seq.args()[0..6],
            ["-i", "in.mov", "-ss", "5.00", "-t", "7.50"]
        );
        assert!(seq.position("-t").unwrap() < seq.position("-vf").unwrap());
    }

    #[test]
    fn test_scale_is_first_filter() {
        let seq = build(json!({
            "format": "mp4", "width": 1280, "height": 720, "preserveAspectRatio": true,
            "visualEffects": {"brightness": 10, "gaussianBlur": 2},
            "transform": {"flipVertical": true}
        }));
        let chain = seq.value_of("-vf").unwrap();
        assert!(chain.starts_with("scale=1280:720:force_original_aspect_ratio=decrease,"));
        assert_eq!(
            chain,
            "scale=1280:720:force_original_aspect_ratio=decrease,eq=brightness=0.10,gblur=sigma=2.0,vflip"
        );
    }

    #[test]
    fn test_speed_uses_setpts_and_tempo_chain() {
        let seq = build(json!({"format": "mkv", "speed": 4.0}));
        assert_eq!(seq.value_of("-vf"), Some("setpts=PTS/4.0"));
        assert_eq!(seq.value_of("-af"), Some("atempo=2.0,atempo=2.0"));
    }

    #[test]
    fn test_reverse_touches_both_chains() {
        let seq = build(json!({
            "format": "mp4",
            "temporal": {"reverse": true, "frameRate": {"target": 24}}
        }));
        assert_eq!(seq.value_of("-vf"), Some("reverse,fps=24"));
        assert_eq!(seq.value_of("-af"), Some("areverse"));
    }

    #[test]
    fn test_quality_then_codecs_then_output() {
        let seq = build(json!({"format": "mp4", "quality": "high"}));
        assert_eq!(
            seq.args()[2..],
            ["-crf", "18", "-c:v", "libx264", "-c:a", "aac", "-y", "out/job.mp4"]
        );
    }

    #[test]
    fn test_webm_and_wmv_quality() {
        let webm = build(json!({"format": "webm", "quality": "low"}));
        assert_eq!(webm.value_of("-crf"), Some("40"));
        assert_eq!(webm.value_of("-b:v"), Some("0"));
        assert_eq!(webm.value_of("-c:v"), Some("libvpx-vp9"));

        let wmv = build(json!({"format": "wmv", "quality": "medium"}));
        assert_eq!(wmv.value_of("-q:v"), Some("5"));
        assert!(wmv.position("-crf").is_none());
    }

    #[test]
    fn test_intermediate_codecs() {
        let prores = build(json!({"format": "prores"}));
        assert_eq!(prores.value_of("-c:v"), Some("prores_ks"));
        assert_eq!(prores.value_of("-profile:v"), Some("2"));

        let dnx = build(json!({"format": "dnxhd", "quality": "high"}));
        assert_eq!(dnx.value_of("-profile:v"), Some("dnxhr_hq"));
        assert_eq!(dnx.value_of("-c:a"), Some("pcm_s16le"));
    }

    #[test]
    fn test_unvalidated_speed_is_inconsistent() {
        let mut opts: VideoOptions = serde_json::from_value(json!({"format": "mp4"})).unwrap();
        opts.speed = 0.0;
        let err = build_video(&opts, Path::new("a"), Path::new("b")).unwrap_err();
        assert!(matches!(err, Error::InternalInconsistency(_)));
    }

    #[test]
    fn test_rotation_in_radians() {
        let seq = build(json!({"format": "mp4", "transform": {"rotation": 90}}));
        assert_eq!(seq.value_of("-vf"), Some("rotate=1.5708"));
    }

    #[test]
    fn test_hdr_tonemap_after_scale() {
        let seq = build(json!({
            "format": "mp4", "width": 1920,
            "advanced": {"hdr": {"toneMapping": "hable"}, "colorSpace": {"input": "rec2020", "output": "rec709"}}
        }));
        let chain = seq.value_of("-vf").unwrap();
        assert!(chain.starts_with("scale=1920:-2,zscale=t=linear"));
        assert!(chain.contains("tonemap=tonemap=hable:desat=0"));
        assert!(chain.ends_with("colorspace=all=bt709:iall=bt2020"));
    }
}
