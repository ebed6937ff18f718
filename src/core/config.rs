//! 标注工具配置（TOML）

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::core::error::Result;

pub const DEFAULT_CONFIG_FILE: &str = "frame_annotator.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotatorConfig {
    pub dataset: DatasetConfig,
    pub annotation: AnnotationConfig,
    pub capture: CaptureConfig,
    pub playback: PlaybackConfig,
    pub overlay: OverlayConfig,
    pub ffmpeg: FfmpegConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// 任务中的视频路径相对于此目录
    pub base_path: PathBuf,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationConfig {
    pub task_list_path: PathBuf,
    pub annotations_path: PathBuf,
    pub progress_path: PathBuf,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            task_list_path: PathBuf::from("tasks.tsv"),
            annotations_path: PathBuf::from("annotations.tsv"),
            progress_path: PathBuf::from("progress.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub output_dir: PathBuf,
    /// 导出 GIF 的最大宽度，较宽的视频等比缩小
    pub gif_max_width: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./"),
            gif_max_width: 480,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// 每次刷新后等待输入的时间，33ms ≈ 30 FPS
    pub refresh_interval_ms: u64,
    /// 回退缓冲的内存上限
    pub rewind_memory_mb: u64,
    pub max_rewind_frames: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 33,
            rewind_memory_mb: 512,
            max_rewind_frames: 900,
        }
    }
}

impl PlaybackConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms.max(1))
    }

    pub fn rewind_memory_bytes(&self) -> usize {
        (self.rewind_memory_mb as usize).saturating_mul(1024 * 1024)
    }

    /// 低内存机器：更短的回退窗口
    pub fn for_low_memory() -> Self {
        Self {
            rewind_memory_mb: 128,
            max_rewind_frames: 300,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub font_path: Option<PathBuf>,
    pub font_size: f32,
    pub caption_line_len: usize,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            font_path: None,
            font_size: 16.0,
            caption_line_len: 80,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FfmpegConfig {
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
}

impl Default for FfmpegConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: locate_binary("ffmpeg"),
            ffprobe_path: locate_binary("ffprobe"),
        }
    }
}

fn locate_binary(name: &str) -> String {
    which::which(name).map_or_else(
        |_| name.to_string(),
        |p| p.to_string_lossy().to_string(),
    )
}

impl AnnotatorConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// 换成低内存回退窗口，保留已配置的刷新间隔
    pub fn use_low_memory_playback(&mut self) {
        let refresh_interval_ms = self.playback.refresh_interval_ms;
        self.playback = PlaybackConfig {
            refresh_interval_ms,
            ..PlaybackConfig::for_low_memory()
        };
        info!(
            "🪶 Low-memory playback: {} MB, at most {} frames of rewind",
            self.playback.rewind_memory_mb, self.playback.max_rewind_frames
        );
    }

    /// 读取配置文件；不存在时写出默认配置并返回默认值
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.is_file() {
            info!("⚙️ Loading config from {:?}", path);
            let text = fs::read_to_string(path)?;
            return Self::from_toml(&text);
        }

        warn!("⚙️ Config {:?} not found, writing defaults", path);
        let config = Self::default();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, config.to_toml()?)?;
        Ok(config)
    }
}
