//! Translation of a render plan into one ffmpeg invocation.
//!
//! The whole program is expressed as a single filter graph: per-segment
//! trim/scale chains, an xfade-or-concat spine, drawtext overlays, and
//! an amix for audio. One invocation keeps the output reproducible for
//! a given plan and backend version.

use clipforge_core::RationalTime;
use clipforge_timeline::{TextAlignment, TextStyle};
use std::path::Path;

use crate::plan::{PlanStage, RenderPlan};

/// Build the full ffmpeg argument list for `plan`, writing to `output`.
pub fn build_ffmpeg_args(plan: &RenderPlan, output: &Path) -> Vec<String> {
    let s = &plan.settings;
    let fps = format!("{}/{}", s.frame_rate.numerator, s.frame_rate.denominator);

    let mut args: Vec<String> = vec!["-y".into(), "-hide_banner".into()];
    let mut filters: Vec<String> = Vec::new();

    // Inputs and per-segment preparation chains.
    let mut input_index = 0usize;
    let mut video_labels: Vec<String> = Vec::new();
    let mut pending_transition: Vec<Option<(String, f64, f64)>> = Vec::new();
    let mut audio_labels: Vec<String> = Vec::new();

    for stage in &plan.stages {
        match stage {
            PlanStage::VideoSegment { input, source, .. } => {
                args.push("-i".into());
                args.push(input.to_string_lossy().into_owned());
                let label = format!("v{}", video_labels.len());
                filters.push(format!(
                    "[{idx}:v]trim=start={start}:end={end},setpts=PTS-STARTPTS,\
                     scale={w}:{h}:force_original_aspect_ratio=decrease,\
                     pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1,fps={fps}[{label}]",
                    idx = input_index,
                    start = secs(source.start),
                    end = secs(source.end()),
                    w = s.width,
                    h = s.height,
                ));
                video_labels.push(label);
                pending_transition.push(None);
                input_index += 1;
            }
            PlanStage::ImageSegment { input, output, .. } => {
                args.push("-loop".into());
                args.push("1".into());
                args.push("-t".into());
                args.push(secs(output.duration));
                args.push("-i".into());
                args.push(input.to_string_lossy().into_owned());
                let label = format!("v{}", video_labels.len());
                filters.push(format!(
                    "[{idx}:v]scale={w}:{h}:force_original_aspect_ratio=decrease,\
                     pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1,fps={fps}[{label}]",
                    idx = input_index,
                    w = s.width,
                    h = s.height,
                ));
                video_labels.push(label);
                pending_transition.push(None);
                input_index += 1;
            }
            PlanStage::Transition {
                style,
                duration,
                offset,
                ..
            } => {
                // Attaches to the most recent video segment.
                if let Some(slot) = pending_transition.last_mut() {
                    *slot = Some((
                        clipforge_effects::xfade_name(*style).to_string(),
                        duration.to_seconds_f64(),
                        offset.to_seconds_f64(),
                    ));
                }
            }
            PlanStage::AudioSegment {
                input,
                source,
                at,
                volume,
                ..
            } => {
                args.push("-i".into());
                args.push(input.to_string_lossy().into_owned());
                let label = format!("a{}", audio_labels.len());
                let mut chain = format!(
                    "[{idx}:a]atrim=start={start}:end={end},asetpts=PTS-STARTPTS",
                    idx = input_index,
                    start = secs(source.start),
                    end = secs(source.end()),
                );
                if (*volume - 1.0).abs() > f64::EPSILON {
                    chain.push_str(&format!(",volume={volume:.3}"));
                }
                let delay_ms = (at.to_seconds_f64() * 1000.0).round() as i64;
                if delay_ms > 0 {
                    chain.push_str(&format!(",adelay={delay_ms}:all=1"));
                }
                filters.push(format!("{chain}[{label}]"));
                audio_labels.push(label);
                input_index += 1;
            }
            PlanStage::TextOverlay { .. } => {}
        }
    }

    // Video spine: xfade where a transition is attached, concat elsewhere.
    let mut video_out = if video_labels.is_empty() {
        args.push("-f".into());
        args.push("lavfi".into());
        args.push("-t".into());
        args.push(secs(plan.total_duration));
        args.push("-i".into());
        args.push(format!(
            "color=c=black:s={}x{}:r={fps}",
            s.width, s.height
        ));
        let label = "vbase".to_string();
        filters.push(format!("[{input_index}:v]setsar=1[{label}]"));
        label
    } else {
        let mut current = video_labels[0].clone();
        for k in 1..video_labels.len() {
            let next = &video_labels[k];
            let out = format!("vx{k}");
            match &pending_transition[k - 1] {
                Some((name, duration, offset)) => filters.push(format!(
                    "[{current}][{next}]xfade=transition={name}:duration={duration:.6}:offset={offset:.6}[{out}]"
                )),
                None => filters.push(format!(
                    "[{current}][{next}]concat=n=2:v=1:a=0[{out}]"
                )),
            }
            current = out;
        }
        current
    };

    // Text overlays drawn over the finished spine, in plan order.
    let mut overlay_count = 0usize;
    for stage in &plan.stages {
        if let PlanStage::TextOverlay {
            region,
            text,
            style,
            ..
        } = stage
        {
            let out = format!("vt{overlay_count}");
            filters.push(format!(
                "[{video_out}]{}[{out}]",
                drawtext_filter(text, style, region.start, region.end())
            ));
            video_out = out;
            overlay_count += 1;
        }
    }

    filters.push(format!("[{video_out}]null[vout]"));

    let has_audio = !audio_labels.is_empty();
    if audio_labels.len() == 1 {
        filters.push(format!("[{}]anull[aout]", audio_labels[0]));
    } else if audio_labels.len() > 1 {
        let joined: String = audio_labels.iter().map(|l| format!("[{l}]")).collect();
        filters.push(format!(
            "{joined}amix=inputs={}:duration=longest:normalize=0[aout]",
            audio_labels.len()
        ));
    }

    args.push("-filter_complex".into());
    args.push(filters.join(";"));

    args.push("-map".into());
    args.push("[vout]".into());
    if has_audio {
        args.push("-map".into());
        args.push("[aout]".into());
    } else {
        args.push("-an".into());
    }

    args.push("-c:v".into());
    args.push(s.video_codec.encoder().into());
    if let Some(kbps) = s.video_bitrate {
        args.push("-b:v".into());
        args.push(format!("{kbps}k"));
    } else if let Some(crf) = s.crf {
        args.push("-crf".into());
        args.push(crf.to_string());
    }
    args.push("-preset".into());
    args.push(s.speed.as_str().into());
    args.push("-pix_fmt".into());
    args.push("yuv420p".into());
    args.push("-r".into());
    args.push(fps);
    if has_audio {
        args.push("-c:a".into());
        args.push(s.audio_codec.encoder().into());
        args.push("-b:a".into());
        args.push(format!("{}k", s.audio_bitrate));
    }
    args.push("-t".into());
    args.push(secs(plan.total_duration));

    // Machine-readable progress on stdout; diagnostics stay on stderr.
    args.push("-progress".into());
    args.push("pipe:1".into());
    args.push("-nostats".into());
    args.push("-loglevel".into());
    args.push("error".into());

    args.push(output.to_string_lossy().into_owned());
    args
}

fn drawtext_filter(
    text: &str,
    style: &TextStyle,
    start: RationalTime,
    end: RationalTime,
) -> String {
    let (x, y) = style.position;
    let x_expr = match style.alignment {
        TextAlignment::Left => x.to_string(),
        TextAlignment::Center => format!("{x}-text_w/2"),
        TextAlignment::Right => format!("{x}-text_w"),
    };
    let mut filter = format!(
        "drawtext=text='{}':x={x_expr}:y={y}:fontsize={}:fontcolor={}:font='{}'",
        escape_drawtext(text),
        style.font_size,
        color_arg(&style.color),
        style.font_family,
    );
    if let Some(bg) = &style.background {
        filter.push_str(&format!(":box=1:boxcolor={}:boxborderw=8", color_arg(bg)));
    }
    let st = start.to_seconds_f64();
    let en = end.to_seconds_f64();
    if !style.fade_in.is_zero() || !style.fade_out.is_zero() {
        let fi = style.fade_in.to_seconds_f64().max(0.001);
        let fo = style.fade_out.to_seconds_f64().max(0.001);
        filter.push_str(&format!(
            ":alpha='if(lt(t,{st}+{fi}),(t-{st})/{fi},if(gt(t,{en}-{fo}),({en}-t)/{fo},1))'"
        ));
    }
    filter.push_str(&format!(":enable='between(t,{st:.6},{en:.6})'"));
    filter
}

/// ffmpeg's drawtext text argument needs backslash escaping for the
/// filter-graph metacharacters.
fn escape_drawtext(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            ':' => out.push_str("\\:"),
            ',' => out.push_str("\\,"),
            _ => out.push(c),
        }
    }
    out
}

/// "#RRGGBB" to ffmpeg's "0xRRGGBB"; named colors pass through.
fn color_arg(color: &str) -> String {
    match color.strip_prefix('#') {
        Some(hex) => format!("0x{hex}"),
        None => color.to_string(),
    }
}

fn secs(t: RationalTime) -> String {
    format!("{:.6}", t.to_seconds_f64())
}
