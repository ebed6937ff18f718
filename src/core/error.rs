use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnnotatorError {
    /// 视频文件缺失或无法解码，调用方应跳过该视频而不是终止整个流程
    #[error("Cannot open media {path:?}: {reason}")]
    MediaOpen { path: PathBuf, reason: String },
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),
    #[error("Display error: {0}")]
    Display(String),
    #[error("Config error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("Config write error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl AnnotatorError {
    pub fn media_open(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        AnnotatorError::MediaOpen {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// 可恢复错误：驱动层记录为 FILE NOT FOUND 或询问操作员
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AnnotatorError::MediaOpen { .. })
    }
}

pub type Result<T> = std::result::Result<T, AnnotatorError>;
