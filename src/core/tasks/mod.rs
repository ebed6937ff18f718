//! 标注任务队列与进度记录（外部协作者接口）

pub mod annotation_log;
pub mod progress;
pub mod queue;

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::core::session::SegmentMarks;

pub use annotation_log::AnnotationLog;
pub use progress::{JsonProgressStore, MemoryProgressStore};
pub use queue::{parse_task_line, MemoryTaskQueue, TsvTaskQueue};

/// 无有效片段时上报的帧号
pub const NO_SEGMENT: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Ok,
    Skipped,
    FileNotFound,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Ok => "OK",
            TaskStatus::Skipped => "SKIPPED",
            TaskStatus::FileNotFound => "FILE_NOT_FOUND",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationTask {
    /// 相对数据集根目录的视频路径
    pub video_path: PathBuf,
    pub caption: String,
    pub action: String,
}

impl AnnotationTask {
    pub fn new(
        video_path: impl Into<PathBuf>,
        caption: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            video_path: video_path.into(),
            caption: caption.into(),
            action: action.into(),
        }
    }

    /// 进度记录使用的键
    pub fn id(&self) -> String {
        self.video_path.to_string_lossy().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationRecord {
    pub task: AnnotationTask,
    pub start_frame: i64,
    pub end_frame: i64,
    pub status: TaskStatus,
}

impl AnnotationRecord {
    pub fn annotated(task: AnnotationTask, marks: SegmentMarks) -> Self {
        Self {
            task,
            start_frame: marks.start_frame() as i64,
            end_frame: marks.end_frame() as i64,
            status: TaskStatus::Ok,
        }
    }

    /// SKIPPED / FILE_NOT_FOUND：片段记为 -1/-1
    pub fn without_segment(task: AnnotationTask, status: TaskStatus) -> Self {
        Self {
            task,
            start_frame: NO_SEGMENT,
            end_frame: NO_SEGMENT,
            status,
        }
    }
}

pub trait TaskQueue {
    fn next_task(&mut self) -> Result<Option<AnnotationTask>>;

    fn report(&mut self, record: &AnnotationRecord) -> Result<()>;
}

pub trait TaskProgressStore {
    fn is_done(&self, video_id: &str) -> bool;

    fn mark(&mut self, video_id: &str, status: TaskStatus) -> Result<()>;
}
