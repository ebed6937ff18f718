//! 片段导出（GIF），通过 ffmpeg 子进程完成

use std::cell::RefCell;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::{debug, info};

use crate::core::config::{CaptureConfig, FfmpegConfig};
use crate::core::error::{AnnotatorError, Result};

/// 导出选中的帧区间（闭区间，帧号从 1 开始）
pub trait SegmentExporter {
    fn export(
        &self,
        video_path: &Path,
        start_frame: u32,
        end_frame: u32,
        output_path: &Path,
    ) -> Result<()>;
}

/// `<export_dir>/<视频文件名>.gif`
pub fn gif_output_path(export_dir: &Path, video_path: &Path) -> PathBuf {
    let stem = video_path
        .file_stem()
        .map_or_else(|| "segment".into(), |s| s.to_string_lossy().to_string());
    export_dir.join(format!("{}.gif", stem))
}

#[derive(Debug, Clone)]
pub struct FfmpegGifExporter {
    ffmpeg_path: String,
    max_width: u32,
}

impl FfmpegGifExporter {
    pub fn new(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            max_width: 480,
        }
    }

    pub fn with_max_width(mut self, max_width: u32) -> Self {
        self.max_width = max_width.max(16);
        self
    }

    pub fn from_config(ffmpeg: &FfmpegConfig, capture: &CaptureConfig) -> Self {
        Self::new(ffmpeg.ffmpeg_path.clone()).with_max_width(capture.gif_max_width)
    }

    fn build_args(
        &self,
        video_path: &Path,
        start_frame: u32,
        end_frame: u32,
        output_path: &Path,
    ) -> Vec<OsString> {
        // ffmpeg 的 n 从 0 开始
        let first = start_frame.saturating_sub(1);
        let last = end_frame.saturating_sub(1);
        let filter = format!(
            "select='between(n,{},{})',setpts=N/FRAME_RATE/TB,scale='min({},iw)':-1:flags=lanczos",
            first, last, self.max_width
        );

        let mut args: Vec<OsString> = ["-v", "error", "-i"].iter().map(OsString::from).collect();
        args.push(video_path.as_os_str().to_owned());
        args.push("-vf".into());
        args.push(filter.into());
        for flag in ["-loop", "0", "-y"] {
            args.push(flag.into());
        }
        args.push(output_path.as_os_str().to_owned());
        args
    }
}

impl SegmentExporter for FfmpegGifExporter {
    fn export(
        &self,
        video_path: &Path,
        start_frame: u32,
        end_frame: u32,
        output_path: &Path,
    ) -> Result<()> {
        if start_frame >= end_frame {
            return Err(AnnotatorError::Ffmpeg(format!(
                "empty segment {}..{}",
                start_frame, end_frame
            )));
        }

        let args = self.build_args(video_path, start_frame, end_frame, output_path);
        debug!("ffmpeg {:?}", args);

        let output = Command::new(&self.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AnnotatorError::Ffmpeg(format!(
                "GIF export failed: {}",
                stderr.trim()
            )));
        }

        info!("🎞️ Exported frames {}..{} to {:?}", start_frame, end_frame, output_path);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportCall {
    pub video_path: PathBuf,
    pub start_frame: u32,
    pub end_frame: u32,
    pub output_path: PathBuf,
}

/// 只记录调用的导出器，可配置为总是失败
#[derive(Debug, Default)]
pub struct RecordingExporter {
    calls: RefCell<Vec<ExportCall>>,
    fail: bool,
}

impl RecordingExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<ExportCall> {
        self.calls.borrow().clone()
    }
}

impl SegmentExporter for RecordingExporter {
    fn export(
        &self,
        video_path: &Path,
        start_frame: u32,
        end_frame: u32,
        output_path: &Path,
    ) -> Result<()> {
        self.calls.borrow_mut().push(ExportCall {
            video_path: video_path.to_path_buf(),
            start_frame,
            end_frame,
            output_path: output_path.to_path_buf(),
        });
        if self.fail {
            return Err(AnnotatorError::Ffmpeg("export disabled".to_string()));
        }
        Ok(())
    }
}
