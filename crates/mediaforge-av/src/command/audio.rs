//! Audio commands.

use super::{push_trim, tempo, Args, ArgumentSequence, Encoder, FilterChain};
use crate::options::{
    AudioAdvanced, AudioFormat, AudioOptions, BasicProcessing, DelayType, EqPreset,
    HumFrequency, ModulationType, NoiseReductionType, Restoration, ReverbType, SpatialType,
    StretchAlgorithm, TimeBasedEffects,
};
use crate::{Error, Result};
use std::path::Path;

/// Build the ffmpeg invocation for an audio conversion.
pub fn build_audio(
    options: &AudioOptions,
    input: &Path,
    output: &Path,
) -> Result<ArgumentSequence> {
    for (field, value) in [("speed", options.speed), ("volume", options.volume)] {
        if !(value.is_finite() && value > 0.0) {
            return Err(Error::inconsistency(format!(
                "audio {} {} reached the command builder",
                field, value
            )));
        }
    }
    if options.bitrate.is_none() && !options.format.is_lossless() {
        return Err(Error::inconsistency(format!(
            "no bitrate for lossy {} output",
            options.format
        )));
    }

    let mut args = Args::new();
    args.push("-i").path(input);
    push_trim(&mut args, options.trim.as_ref());

    let clip_length = options.trim.map(|t| t.duration());

    let mut chain = FilterChain::new();
    if options.volume != 1.0 {
        chain.push(format!("volume={:.2}", options.volume));
    }
    if let Some(bp) = &options.basic_processing {
        push_basic(&mut chain, bp, clip_length);
    }
    if let Some(tbe) = &options.time_based_effects {
        push_time_based(&mut chain, tbe);
    }
    if let Some(rest) = &options.restoration {
        push_restoration(&mut chain, rest);
    }
    if let Some(adv) = &options.advanced {
        push_advanced(&mut chain, adv);
    }
    if options.speed != 1.0 {
        chain.extend(tempo::atempo_filters(options.speed));
    }
    args.chain("-af", &chain);

    args.pair("-c:a", options.format.codec());
    if options.format == AudioFormat::Dts {
        // The native DTS encoder is still flagged experimental.
        args.pair("-strict", "-2");
    }
    if let Some(rate) = options.sample_rate {
        args.pair("-ar", rate.as_str());
    }
    if let Some(channels) = options.channels {
        args.pair("-ac", channels.count().to_string());
    }
    if !options.format.is_lossless() {
        if let Some(bitrate) = options.bitrate {
            args.pair("-b:a", format!("{}k", bitrate));
        }
    }
    args.overwrite_output(output);
    Ok(args.finish(Encoder::Ffmpeg))
}

fn push_basic(chain: &mut FilterChain, bp: &BasicProcessing, clip_length: Option<f64>) {
    if bp.normalize {
        chain.push("loudnorm");
    }
    if let Some(db) = bp.amplify.filter(|v| *v != 0.0) {
        chain.push(format!("volume={:.2}dB", db));
    }
    if let Some(d) = bp.fade_in.filter(|v| *v > 0.0) {
        chain.push(format!("afade=t=in:d={:.2}", d));
    }
    if let Some(d) = bp.fade_out.filter(|v| *v > 0.0) {
        match clip_length {
            Some(len) => {
                chain.push(format!("afade=t=out:st={:.2}:d={:.2}", (len - d).max(0.0), d));
            }
            // Without a known length, fade the reversed stream in instead.
            None => {
                chain.extend([
                    "areverse".to_string(),
                    format!("afade=t=in:d={:.2}", d),
                    "areverse".to_string(),
                ]);
            }
        }
    }

    if let Some(eq) = bp.equalizer.filter(|e| e.enabled) {
        chain.extend(
            equalizer_bands(eq.preset)
                .iter()
                .map(|(freq, gain)| {
                    format!("equalizer=f={}:width_type=o:width=2:g={}", freq, gain)
                }),
        );
    }

    if let Some(st) = &bp.stereo {
        if let Some(pan) = st.pan.filter(|v| *v != 0.0) {
            let p = pan / 100.0;
            let left = (1.0 - p).min(1.0);
            let right = (1.0 + p).min(1.0);
            chain.push(format!("pan=stereo|c0={:.2}*c0|c1={:.2}*c1", left, right));
        }
        if let Some(width) = st.width.filter(|v| *v != 100.0) {
            chain.push(format!("extrastereo=m={:.2}", width / 100.0));
        }
        if st.mono_conversion {
            chain.push("pan=mono|c0=0.5*c0+0.5*c1");
        }
        if st.channel_swap {
            chain.push("pan=stereo|c0=c1|c1=c0");
        }
    }
}

fn equalizer_bands(preset: EqPreset) -> &'static [(u32, i32)] {
    match preset {
        EqPreset::None => &[],
        EqPreset::BassBoost => &[(80, 6)],
        EqPreset::TrebleBoost => &[(10_000, 6)],
        EqPreset::Vocal => &[(1_000, 3), (3_000, 3)],
        EqPreset::Classical => &[(315, 2), (1_000, -2), (8_000, 4)],
        EqPreset::Rock => &[(80, 4), (250, -2), (1_000, 2), (4_000, 4)],
        EqPreset::Jazz => &[(125, 3), (500, -2), (2_000, 2), (8_000, 3)],
    }
}

fn push_time_based(chain: &mut FilterChain, tbe: &TimeBasedEffects) {
    if let Some(reverb) = tbe.reverb.filter(|r| r.enabled) {
        // Room size stretches the reflection delays, 50 leaves them as-is.
        let scale = 0.5 + reverb.room_size / 100.0;
        let ms = |base: f64| format!("{:.0}", (base * scale).max(1.0));
        match reverb.kind {
            ReverbType::None => {}
            ReverbType::Room => {
                chain.push(format!("aecho=0.8:0.88:{}:0.4", ms(60.0)));
            }
            ReverbType::Hall => {
                chain.extend([
                    format!("aecho=0.8:0.88:{}:0.4", ms(60.0)),
                    format!("aecho=0.8:0.88:{}:0.3", ms(40.0)),
                ]);
            }
            ReverbType::Plate => {
                chain.push(format!("aecho=0.8:0.7:{}:0.25", ms(40.0)));
            }
            ReverbType::Spring => {
                chain.push(format!("aecho=0.6:0.6:{}:0.5", ms(100.0)));
            }
        }
    }

    if let Some(delay) = tbe.delay.filter(|d| d.enabled && d.time > 0.0) {
        // aecho rejects a zero decay.
        let decay = (delay.feedback / 100.0).max(0.01);
        let t = delay.time;
        match delay.kind {
            DelayType::None => {}
            DelayType::Echo => {
                chain.push(format!("aecho=0.8:0.9:{:.0}:{:.2}", t, decay));
            }
            DelayType::MultiTap => {
                chain.push(format!(
                    "aecho=0.8:0.9:{:.0}|{:.0}|{:.0}:{:.2}|{:.2}|{:.2}",
                    t,
                    t * 1.5,
                    t * 2.0,
                    decay,
                    decay * 0.8,
                    decay * 0.6
                ));
            }
            DelayType::PingPong => {
                chain.push(format!(
                    "aecho=0.8:0.9:{:.0}|{:.0}:{:.2}|{:.2}",
                    t,
                    t * 2.0,
                    decay,
                    decay * 0.7
                ));
            }
        }
    }

    if let Some(m) = tbe.modulation.filter(|m| m.enabled) {
        let depth = m.depth / 100.0;
        match m.kind {
            ModulationType::None => {}
            ModulationType::Chorus => {
                chain.push("chorus=0.7:0.9:55:0.4:0.25:2");
            }
            ModulationType::Flanger => {
                chain.push(format!(
                    "flanger=speed={:.2}:depth={:.2}",
                    m.rate.clamp(0.1, 10.0),
                    depth * 10.0
                ));
            }
            ModulationType::Phaser => {
                chain.push(format!("aphaser=speed={:.2}", m.rate.clamp(0.1, 2.0)));
            }
            ModulationType::Tremolo => {
                chain.push(format!("tremolo=f={:.2}:d={:.2}", m.rate, depth));
            }
            ModulationType::Vibrato => {
                chain.push(format!("vibrato=f={:.2}:d={:.2}", m.rate, depth));
            }
        }
    }
}

fn push_restoration(chain: &mut FilterChain, rest: &Restoration) {
    if let Some(nr) = rest.noise_reduction.filter(|n| n.enabled) {
        match nr.kind {
            NoiseReductionType::None => {}
            NoiseReductionType::Spectral => {
                chain.push(format!("afftdn=nr={:.2}:nf=-50", (nr.strength * 0.4).max(0.01)));
            }
            NoiseReductionType::Adaptive => {
                chain.push(format!("anlmdn=s={:.2}", (nr.strength / 10.0).max(0.1)));
            }
            NoiseReductionType::Gate => {
                chain.push(format!(
                    "agate=threshold={:.1}dB:ratio=10",
                    -40.0 + nr.strength * 0.4
                ));
            }
        }
    }

    if let Some(dh) = rest.de_hum.filter(|d| d.enabled) {
        let notches: &[u32] = match dh.frequency {
            HumFrequency::Hz50 => &[50],
            HumFrequency::Hz60 => &[60],
            HumFrequency::Auto => &[50, 60],
        };
        chain.extend(
            notches
                .iter()
                .map(|f| format!("equalizer=f={}:width_type=q:width=0.5:g=-40", f)),
        );
    }

    if let Some(dc) = rest.declip.filter(|d| d.enabled) {
        chain.push(format!("adeclip=threshold={:.0}", dc.threshold.max(1.0)));
    }

    if let Some(sd) = rest.silence_detection.filter(|s| s.enabled) {
        chain.push(format!(
            "silenceremove=start_periods=1:start_threshold={:.1}dB:start_duration={:.2}",
            -50.0 + sd.threshold * 0.5,
            sd.min_duration
        ));
    }
}

fn push_advanced(chain: &mut FilterChain, adv: &AudioAdvanced) {
    // Pitch scale is independent of the source sample rate and keeps the duration.
    if let Some(ps) = adv.pitch_shift.filter(|p| p.enabled && p.semitones != 0) {
        let ratio = 2f64.powf(ps.semitones as f64 / 12.0);
        chain.push(format!("rubberband=pitch={}", tempo::format_factor(ratio)));
    }

    if let Some(ts) = adv.time_stretch.filter(|t| t.enabled && t.factor != 1.0) {
        let factor = tempo::format_factor(ts.factor);
        match ts.algorithm {
            StretchAlgorithm::Pitch => {
                chain.push(format!("rubberband=tempo={}", factor));
            }
            StretchAlgorithm::Time => {
                chain.extend(tempo::atempo_filters(ts.factor));
            }
            StretchAlgorithm::Formant => {
                chain.push(format!("rubberband=tempo={}:formant=preserved", factor));
            }
        }
    }

    if let Some(sp) = adv.spatial_audio.filter(|s| s.enabled) {
        match sp.kind {
            SpatialType::None => {}
            SpatialType::Binaural => {
                chain.push("crossfeed=strength=0.8:range=0.5");
            }
            SpatialType::Surround => {
                chain.push("surround");
            }
            SpatialType::ThreeD => {
                chain.extend(["apulsator=hz=0.125", "crossfeed=strength=0.6"]);
            }
        }
    }
}
