use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use log::{info, warn};

use crate::core::error::Result;
use crate::core::tasks::annotation_log::AnnotationLog;
use crate::core::tasks::{AnnotationRecord, AnnotationTask, TaskQueue};

/// 解析任务行：`video \t caption \t action`，空行和 `#` 注释返回 None
pub fn parse_task_line(line: &str) -> Option<AnnotationTask> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() || line.trim_start().starts_with('#') {
        return None;
    }

    let mut fields = line.splitn(3, '\t');
    let video = fields.next()?.trim();
    if video.is_empty() {
        return None;
    }
    let caption = fields.next().unwrap_or("").trim();
    let action = fields.next().unwrap_or("").trim();
    Some(AnnotationTask::new(video, caption, action))
}

/// 从 TSV 任务列表读取任务，结果追加到标注日志
#[derive(Debug)]
pub struct TsvTaskQueue {
    pending: VecDeque<AnnotationTask>,
    log: AnnotationLog,
}

impl TsvTaskQueue {
    pub fn open(task_list: &Path, log: AnnotationLog) -> Result<Self> {
        let text = fs::read_to_string(task_list)?;
        let pending: VecDeque<AnnotationTask> = text.lines().filter_map(parse_task_line).collect();
        if pending.is_empty() {
            warn!("📋 Task list {:?} has no tasks", task_list);
        } else {
            info!("📋 Loaded {} tasks from {:?}", pending.len(), task_list);
        }
        Ok(Self { pending, log })
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl TaskQueue for TsvTaskQueue {
    fn next_task(&mut self) -> Result<Option<AnnotationTask>> {
        Ok(self.pending.pop_front())
    }

    fn report(&mut self, record: &AnnotationRecord) -> Result<()> {
        self.log.append(record)
    }
}

#[derive(Debug, Default)]
pub struct MemoryTaskQueue {
    pending: VecDeque<AnnotationTask>,
    reported: Vec<AnnotationRecord>,
}

impl MemoryTaskQueue {
    pub fn new(tasks: impl IntoIterator<Item = AnnotationTask>) -> Self {
        Self {
            pending: tasks.into_iter().collect(),
            reported: Vec::new(),
        }
    }

    pub fn reported(&self) -> &[AnnotationRecord] {
        &self.reported
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl TaskQueue for MemoryTaskQueue {
    fn next_task(&mut self) -> Result<Option<AnnotationTask>> {
        Ok(self.pending.pop_front())
    }

    fn report(&mut self, record: &AnnotationRecord) -> Result<()> {
        self.reported.push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tasks::TaskStatus;

    #[test]
    fn test_parse_task_line() {
        let task = parse_task_line("movie/clip.avi\tSomeone runs.\trun\r\n").unwrap();
        assert_eq!(task, AnnotationTask::new("movie/clip.avi", "Someone runs.", "run"));

        let bare = parse_task_line("movie/clip.avi").unwrap();
        assert!(bare.caption.is_empty() && bare.action.is_empty());

        assert!(parse_task_line("").is_none());
        assert!(parse_task_line("   ").is_none());
        assert!(parse_task_line("# header").is_none());
        assert!(parse_task_line("\tcaption only").is_none());
    }

    #[test]
    fn test_tsv_queue_reads_and_reports() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("tasks.tsv");
        fs::write(&list, "# video\tcaption\taction\na.avi\tA walks.\twalk\n\nb.avi\tB sits.\tsit\n")
            .unwrap();
        let log = AnnotationLog::new(dir.path().join("annotations.tsv"));

        let mut queue = TsvTaskQueue::open(&list, log.clone()).unwrap();
        assert_eq!(queue.remaining(), 2);

        let first = queue.next_task().unwrap().unwrap();
        assert_eq!(first.action, "walk");
        queue
            .report(&AnnotationRecord::without_segment(first, TaskStatus::Skipped))
            .unwrap();

        assert_eq!(queue.next_task().unwrap().unwrap().video_path, Path::new("b.avi"));
        assert!(queue.next_task().unwrap().is_none());

        let written = fs::read_to_string(log.path()).unwrap();
        assert_eq!(written, "a.avi\t-1\t-1\tSKIPPED\tA walks.\n");
    }

    #[test]
    fn test_missing_task_list() {
        let dir = tempfile::tempdir().unwrap();
        let log = AnnotationLog::new(dir.path().join("annotations.tsv"));
        assert!(TsvTaskQueue::open(&dir.path().join("none.tsv"), log).is_err());
    }
}
