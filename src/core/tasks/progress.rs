use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::core::error::Result;
use crate::core::tasks::{TaskProgressStore, TaskStatus};

/// 已处理视频索引，每次标记后写回 JSON 文件
#[derive(Debug)]
pub struct JsonProgressStore {
    path: PathBuf,
    entries: BTreeMap<String, TaskStatus>,
}

impl JsonProgressStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.is_file() {
            let text = fs::read_to_string(&path)?;
            serde_json::from_str(&text)?
        } else {
            BTreeMap::new()
        };
        info!("📒 Progress index {:?}: {} videos done", path, entries.len());
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn status(&self, video_id: &str) -> Option<TaskStatus> {
        self.entries.get(video_id).copied()
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(&self.entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl TaskProgressStore for JsonProgressStore {
    fn is_done(&self, video_id: &str) -> bool {
        self.entries.contains_key(video_id)
    }

    fn mark(&mut self, video_id: &str, status: TaskStatus) -> Result<()> {
        self.entries.insert(video_id.to_string(), status);
        self.persist()
    }
}

#[derive(Debug, Default)]
pub struct MemoryProgressStore {
    entries: HashMap<String, TaskStatus>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self, video_id: &str) -> Option<TaskStatus> {
        self.entries.get(video_id).copied()
    }
}

impl TaskProgressStore for MemoryProgressStore {
    fn is_done(&self, video_id: &str) -> bool {
        self.entries.contains_key(video_id)
    }

    fn mark(&mut self, video_id: &str, status: TaskStatus) -> Result<()> {
        self.entries.insert(video_id.to_string(), status);
        Ok(())
    }
}
