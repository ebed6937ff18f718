//! 追加写入的标注结果日志（TSV）

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::debug;

use crate::core::error::Result;
use crate::core::tasks::AnnotationRecord;

#[derive(Debug, Clone)]
pub struct AnnotationLog {
    path: PathBuf,
}

impl AnnotationLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 一行：`video \t start \t end \t status \t caption`
    pub fn format_line(record: &AnnotationRecord) -> String {
        let caption: String = record
            .task
            .caption
            .chars()
            .map(|c| if matches!(c, '\t' | '\n' | '\r') { ' ' } else { c })
            .collect();
        format!(
            "{}\t{}\t{}\t{}\t{}\n",
            record.task.video_path.display(),
            record.start_frame,
            record.end_frame,
            record.status,
            caption.trim()
        )
    }

    pub fn append(&self, record: &AnnotationRecord) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(Self::format_line(record).as_bytes())?;
        debug!("annotation appended to {:?}", self.path);
        Ok(())
    }
}
