//! 显示表面抽象：呈现一帧 + 有界等待一次输入

use std::collections::VecDeque;
use std::time::Duration;

use image::RgbaImage;

use crate::core::error::Result;
use crate::core::session::input::InputEvent;

pub trait DisplaySurface {
    fn present(&mut self, image: &RgbaImage) -> Result<()>;

    /// 最多等待 `wait`，超时返回 `Ok(None)`
    fn poll_event(&mut self, wait: Duration) -> Result<Option<InputEvent>>;
}

/// 每个会话打开一个新的显示表面，会话结束时释放
pub trait DisplayFactory {
    fn open(&mut self, title: &str, width: u32, height: u32) -> Result<Box<dyn DisplaySurface>>;
}

/// 回放预设输入序列的显示表面；序列耗尽后返回 Quit
#[derive(Debug, Default)]
pub struct ScriptedDisplay {
    script: VecDeque<Option<InputEvent>>,
    presented: usize,
    last_size: Option<(u32, u32)>,
}

impl ScriptedDisplay {
    pub fn new(events: impl IntoIterator<Item = InputEvent>) -> Self {
        Self::with_timeouts(events.into_iter().map(Some))
    }

    /// `None` 表示该次轮询超时
    pub fn with_timeouts(script: impl IntoIterator<Item = Option<InputEvent>>) -> Self {
        Self {
            script: script.into_iter().collect(),
            presented: 0,
            last_size: None,
        }
    }

    pub fn presented(&self) -> usize {
        self.presented
    }

    pub fn last_size(&self) -> Option<(u32, u32)> {
        self.last_size
    }
}

impl DisplaySurface for ScriptedDisplay {
    fn present(&mut self, image: &RgbaImage) -> Result<()> {
        self.presented += 1;
        self.last_size = Some(image.dimensions());
        Ok(())
    }

    fn poll_event(&mut self, _wait: Duration) -> Result<Option<InputEvent>> {
        Ok(self.script.pop_front().unwrap_or(Some(InputEvent::Quit)))
    }
}

/// 按打开顺序分发脚本，并记录窗口标题
#[derive(Debug, Default)]
pub struct ScriptedDisplayFactory {
    scripts: VecDeque<Vec<InputEvent>>,
    opened: Vec<String>,
}

impl ScriptedDisplayFactory {
    pub fn new(scripts: impl IntoIterator<Item = Vec<InputEvent>>) -> Self {
        Self {
            scripts: scripts.into_iter().collect(),
            opened: Vec::new(),
        }
    }

    pub fn opened(&self) -> &[String] {
        &self.opened
    }
}

impl DisplayFactory for ScriptedDisplayFactory {
    fn open(&mut self, title: &str, _width: u32, _height: u32) -> Result<Box<dyn DisplaySurface>> {
        self.opened.push(title.to_string());
        let script = self.scripts.pop_front().unwrap_or_default();
        Ok(Box::new(ScriptedDisplay::new(script)))
    }
}
