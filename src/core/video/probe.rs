//! ffprobe 元数据读取

use std::path::Path;
use std::process::{Command, Stdio};

use log::debug;
use serde::Deserialize;

use crate::core::error::{AnnotatorError, Result};

/// 视频流基本信息
#[derive(Debug, Clone, PartialEq)]
pub struct VideoProbe {
    pub width: u32,
    pub height: u32,
    /// 容器声明的帧数，缺失或为 0 时需要预扫描
    pub declared_frames: Option<u32>,
    pub fps: f32,
}

impl VideoProbe {
    pub fn run(ffprobe_path: &str, video_path: &Path) -> Result<Self> {
        if !video_path.is_file() {
            return Err(AnnotatorError::media_open(video_path, "file not found"));
        }

        let output = Command::new(ffprobe_path)
            .arg("-v")
            .arg("quiet")
            .arg("-print_format")
            .arg("json")
            .arg("-show_streams")
            .arg(video_path)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| AnnotatorError::media_open(video_path, format!("ffprobe: {}", e)))?;

        if !output.status.success() {
            return Err(AnnotatorError::media_open(video_path, "ffprobe failed"));
        }

        let probe = Self::parse(&output.stdout, video_path)?;
        debug!("ffprobe {:?}: {:?}", video_path, probe);
        Ok(probe)
    }

    pub fn parse(json: &[u8], video_path: &Path) -> Result<Self> {
        let probe: FfprobeOutput = serde_json::from_slice(json)?;

        let stream = probe
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
            .ok_or_else(|| AnnotatorError::media_open(video_path, "no video stream"))?;

        let (width, height) = match (stream.width, stream.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
            _ => return Err(AnnotatorError::media_open(video_path, "missing frame size")),
        };

        let declared_frames = stream
            .nb_frames
            .as_deref()
            .and_then(|n| n.parse::<u32>().ok())
            .filter(|&n| n > 0);

        // "30/1" 或 "30000/1001"
        let fps = stream
            .r_frame_rate
            .as_deref()
            .and_then(|r| match r.split_once('/') {
                Some((num, den)) => {
                    let num: f32 = num.parse().ok()?;
                    let den: f32 = den.parse().ok()?;
                    (den > 0.0).then(|| num / den)
                }
                None => r.parse().ok(),
            })
            .unwrap_or(30.0);

        Ok(Self {
            width,
            height,
            declared_frames,
            fps,
        })
    }

    pub fn frame_bytes(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    nb_frames: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_declared_frames() {
        let json = br#"{"streams":[
            {"codec_type":"audio","channels":2},
            {"codec_type":"video","width":640,"height":360,"r_frame_rate":"30000/1001","nb_frames":"250"}
        ]}"#;

        let probe = VideoProbe::parse(json, Path::new("clip.mp4")).unwrap();
        assert_eq!(probe.width, 640);
        assert_eq!(probe.height, 360);
        assert_eq!(probe.declared_frames, Some(250));
        assert!((probe.fps - 29.97).abs() < 0.01);
        assert_eq!(probe.frame_bytes(), 640 * 360 * 4);
    }

    #[test]
    fn test_parse_without_frame_count() {
        let json = br#"{"streams":[{"codec_type":"video","width":320,"height":240,"nb_frames":"N/A"}]}"#;

        let probe = VideoProbe::parse(json, Path::new("clip.mkv")).unwrap();
        assert_eq!(probe.declared_frames, None);
        assert_eq!(probe.fps, 30.0);
    }

    #[test]
    fn test_parse_audio_only_is_media_error() {
        let json = br#"{"streams":[{"codec_type":"audio"}]}"#;

        let err = VideoProbe::parse(json, Path::new("song.mp3")).unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_run_missing_file() {
        let err = VideoProbe::run("ffprobe", Path::new("/nonexistent/clip.avi")).unwrap_err();
        assert!(matches!(err, AnnotatorError::MediaOpen { .. }));
    }
}
