//! Argument builders for every external command the converter runs.
//!
//! These are pure functions; nothing here touches the filesystem.

use std::path::{Path, PathBuf};

use super::types::{Tool, ToolCommand};

/// File name pattern for frames extracted for gifski.
pub const FRAME_PATTERN: &str = "frame%05d.png";

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Query the first video stream's geometry, codec, rate and duration as JSON.
pub fn probe(ffprobe: &Path, input: &Path) -> ToolCommand {
    ToolCommand::new(Tool::Ffprobe, ffprobe).args([
        "-v".to_string(),
        "error".to_string(),
        "-select_streams".to_string(),
        "v:0".to_string(),
        "-show_entries".to_string(),
        "stream=width,height,codec_name,r_frame_rate,duration:format=duration".to_string(),
        "-of".to_string(),
        "json".to_string(),
        path_arg(input),
    ])
}

/// Assemble a numbered PNG sequence into a lossless H.264 video.
pub fn sequence_to_video(
    ffmpeg: &Path,
    pattern: &Path,
    start_number: u32,
    fps: u32,
    output: &Path,
) -> ToolCommand {
    ToolCommand::new(Tool::Ffmpeg, ffmpeg).args([
        "-y".to_string(),
        "-framerate".to_string(),
        fps.to_string(),
        "-start_number".to_string(),
        start_number.to_string(),
        "-i".to_string(),
        path_arg(pattern),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-crf".to_string(),
        "0".to_string(),
        "-vf".to_string(),
        format!("fps={}", fps),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-loglevel".to_string(),
        "warning".to_string(),
        path_arg(output),
    ])
}

/// Extract frames at `fps` into `dir/frame%05d.png`.
pub fn video_to_frames(ffmpeg: &Path, input: &Path, fps: u32, dir: &Path) -> ToolCommand {
    ToolCommand::new(Tool::Ffmpeg, ffmpeg).args([
        "-i".to_string(),
        path_arg(input),
        "-vf".to_string(),
        format!("fps={}", fps),
        "-loglevel".to_string(),
        "warning".to_string(),
        path_arg(&dir.join(FRAME_PATTERN)),
    ])
}

/// Crop a `w`×`h` window at (`x`, `y`) into a lossless, silent video.
pub fn crop(ffmpeg: &Path, input: &Path, w: u32, h: u32, x: u32, y: u32, output: &Path) -> ToolCommand {
    ToolCommand::new(Tool::Ffmpeg, ffmpeg).args([
        "-y".to_string(),
        "-i".to_string(),
        path_arg(input),
        "-filter:v".to_string(),
        format!("crop={}:{}:{}:{}", w, h, x, y),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-crf".to_string(),
        "0".to_string(),
        "-an".to_string(),
        "-loglevel".to_string(),
        "warning".to_string(),
        path_arg(output),
    ])
}

/// Single-pass palette GIF encode at the given frame size.
pub fn gif_palette(ffmpeg: &Path, input: &Path, w: u32, h: u32, fps: u32, output: &Path) -> ToolCommand {
    ToolCommand::new(Tool::Ffmpeg, ffmpeg).args([
        "-y".to_string(),
        "-i".to_string(),
        path_arg(input),
        "-filter_complex".to_string(),
        format!(
            "[0:v] fps={},scale={}:{} [a];[a] split [b][c];[b] palettegen [p];[c][p] paletteuse",
            fps, w, h
        ),
        "-loglevel".to_string(),
        "warning".to_string(),
        path_arg(output),
    ])
}

/// Looping APNG encode with a generated palette.
pub fn apng_palette(ffmpeg: &Path, input: &Path, w: u32, h: u32, fps: u32, output: &Path) -> ToolCommand {
    ToolCommand::new(Tool::Ffmpeg, ffmpeg).args([
        "-y".to_string(),
        "-i".to_string(),
        path_arg(input),
        "-f".to_string(),
        "apng".to_string(),
        "-plays".to_string(),
        "0".to_string(),
        "-vf".to_string(),
        format!(
            "fps={},scale={}:{}:flags=lanczos,split[s0][s1];[s0]palettegen[p];[s1][p]paletteuse",
            fps, w, h
        ),
        "-loglevel".to_string(),
        "warning".to_string(),
        path_arg(output),
    ])
}

/// Gifski encode over an explicit, ordered frame list.
pub fn gifski(gifski: &Path, frames: &[PathBuf], fps: u32, width: u32, output: &Path) -> ToolCommand {
    ToolCommand::new(Tool::Gifski, gifski)
        .args([
            "--fps".to_string(),
            fps.to_string(),
            "--width".to_string(),
            width.to_string(),
            "-o".to_string(),
            path_arg(output),
        ])
        .args(frames.iter().map(|f| path_arg(f)))
}

/// Looping silent playback of a file.
pub fn ffplay_preview(ffplay: &Path, input: &Path) -> ToolCommand {
    ToolCommand::new(Tool::Ffplay, ffplay).args([
        "-autoexit".to_string(),
        "-loop".to_string(),
        "0".to_string(),
        "-an".to_string(),
        "-loglevel".to_string(),
        "warning".to_string(),
        path_arg(input),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> PathBuf {
        PathBuf::from(s)
    }

    #[test]
    fn probe_args() {
        let cmd = probe(&p("ffprobe"), &p("clip.mp4"));
        assert_eq!(cmd.tool, Tool::Ffprobe);
        assert_eq!(cmd.value_of("-of"), Some("json"));
        assert_eq!(cmd.value_of("-select_streams"), Some("v:0"));
        assert_eq!(cmd.output_arg(), Some("clip.mp4"));
    }

    #[test]
    fn sequence_to_video_args() {
        let cmd = sequence_to_video(&p("ffmpeg"), &p("/x/frame%04d.png"), 7, 24, &p("/x/frame.mp4"));
        assert_eq!(
            cmd.args,
            vec![
                "-y", "-framerate", "24", "-start_number", "7", "-i", "/x/frame%04d.png", "-c:v",
                "libx264", "-crf", "0", "-vf", "fps=24", "-pix_fmt", "yuv420p", "-loglevel",
                "warning", "/x/frame.mp4",
            ]
        );
    }

    #[test]
    fn video_to_frames_args() {
        let cmd = video_to_frames(&p("ffmpeg"), &p("in.mp4"), 30, &p("/w/frames"));
        assert_eq!(cmd.value_of("-vf"), Some("fps=30"));
        assert_eq!(cmd.output_arg(), Some("/w/frames/frame%05d.png"));
    }

    #[test]
    fn crop_args() {
        let cmd = crop(&p("ffmpeg"), &p("in.mp4"), 720, 720, 280, 0, &p("out.mp4"));
        assert_eq!(cmd.value_of("-filter:v"), Some("crop=720:720:280:0"));
        assert!(cmd.args.contains(&"-an".to_string()));
        assert_eq!(cmd.args[0], "-y");
    }

    #[test]
    fn gif_palette_includes_fps_and_scale() {
        let cmd = gif_palette(&p("ffmpeg"), &p("in.mp4"), 110, 100, 20, &p("o.gif"));
        assert_eq!(
            cmd.value_of("-filter_complex"),
            Some("[0:v] fps=20,scale=110:100 [a];[a] split [b][c];[b] palettegen [p];[c][p] paletteuse")
        );
        assert_eq!(cmd.output_arg(), Some("o.gif"));
    }

    #[test]
    fn apng_palette_args() {
        let cmd = apng_palette(&p("ffmpeg"), &p("in.mp4"), 200, 200, 30, &p("o.png"));
        assert_eq!(cmd.value_of("-f"), Some("apng"));
        assert_eq!(cmd.value_of("-plays"), Some("0"));
        assert!(cmd
            .value_of("-vf")
            .is_some_and(|vf| vf.starts_with("fps=30,scale=200:200:flags=lanczos")));
    }

    #[test]
    fn gifski_lists_frames_explicitly() {
        let frames = vec![p("/w/frame00001.png"), p("/w/frame00002.png")];
        let cmd = gifski(&p("gifski"), &frames, 25, 480, &p("o.gif"));
        assert_eq!(
            cmd.args,
            vec![
                "--fps", "25", "--width", "480", "-o", "o.gif", "/w/frame00001.png",
                "/w/frame00002.png",
            ]
        );
        assert!(!cmd.to_string().contains('*'));
    }

    #[test]
    fn ffplay_args() {
        let cmd = ffplay_preview(&p("ffplay"), &p("c.mp4"));
        assert_eq!(cmd.args, vec!["-autoexit", "-loop", "0", "-an", "-loglevel", "warning", "c.mp4"]);
    }
}
