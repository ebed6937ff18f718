use log::{debug, info};

use crate::core::error::{AnnotatorError, Result};
use crate::core::video::frame::Frame;
use crate::core::video::rewind::RewindBuffer;
use crate::core::video::source::FrameSource;

/// 单次移动的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// 从帧源解码了新帧
    Decoded,
    /// 在回退缓冲内移动，没有解码
    FromHistory,
    /// 帧源已耗尽，位置不变并暂停
    EndOfStream,
    Unchanged,
}

/// 播放头：在只能向前的帧源和回退缓冲之间调度
///
/// `rewind` 是相对缓冲尾部的后退步数，对外以非正数的 `buffer_cursor` 表示。
pub struct Playhead<S> {
    source: S,
    buffer: RewindBuffer,
    forward_position: u32,
    rewind: usize,
    paused: bool,
    end_of_stream: bool,
}

impl<S: FrameSource> Playhead<S> {
    pub fn new(source: S, rewind_capacity: usize) -> Self {
        Self {
            source,
            buffer: RewindBuffer::with_capacity(rewind_capacity),
            forward_position: 0,
            rewind: 0,
            paused: false,
            end_of_stream: false,
        }
    }

    /// 解码第一帧并进入暂停；空视频返回 false
    pub fn start(&mut self) -> Result<bool> {
        let step = self.advance()?;
        self.paused = true;
        Ok(step == Step::Decoded)
    }

    pub fn advance(&mut self) -> Result<Step> {
        if self.rewind > 0 {
            self.rewind -= 1;
            return Ok(Step::FromHistory);
        }
        if self.end_of_stream {
            self.paused = true;
            return Ok(Step::EndOfStream);
        }

        match self.source.next_frame()? {
            Some(frame) => {
                let expected = self.forward_position + 1;
                if frame.frame_number() != expected {
                    return Err(AnnotatorError::Decode(format!(
                        "expected frame {} but source produced {}",
                        expected,
                        frame.frame_number()
                    )));
                }
                if let Some(evicted) = self.buffer.push(frame).map_err(|f| {
                    AnnotatorError::Decode(format!("frame {} out of order", f.frame_number()))
                })? {
                    debug!("rewind buffer evicted frame {}", evicted);
                }
                self.forward_position = expected;
                Ok(Step::Decoded)
            }
            None => {
                info!("⏹️ End of stream at frame {}", self.forward_position);
                self.end_of_stream = true;
                self.paused = true;
                Ok(Step::EndOfStream)
            }
        }
    }

    /// 后退一帧，总是暂停；已在最旧的缓冲帧时不动
    pub fn retreat(&mut self) -> Step {
        self.paused = true;
        if self.rewind < self.buffer.max_rewind() {
            self.rewind += 1;
            Step::FromHistory
        } else {
            Step::Unchanged
        }
    }

    /// 自由播放的一次刷新
    pub fn tick(&mut self) -> Result<Step> {
        if self.paused {
            return Ok(Step::Unchanged);
        }
        self.advance()
    }

    pub fn current_frame(&self) -> Option<&Frame> {
        self.buffer.back(self.rewind)
    }

    /// 当前显示帧号（1 起），尚未解码时为 0
    pub fn position(&self) -> u32 {
        self.current_frame().map_or(0, Frame::frame_number)
    }

    pub fn forward_position(&self) -> u32 {
        self.forward_position
    }

    pub fn buffer_cursor(&self) -> i64 {
        -(self.rewind as i64)
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    pub fn is_at_end(&self) -> bool {
        self.end_of_stream && self.rewind == 0
    }

    pub fn buffer(&self) -> &RewindBuffer {
        &self.buffer
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.source.dimensions()
    }
}
