//! 固定容量的回退环形缓冲
//!
//! 保存最近解码的帧，用于在只能向前解码的帧源上实现后退浏览。
//! 帧号严格递增且不重复，满时淘汰最旧的一帧。

use crate::core::video::frame::Frame;

/// 内存紧张时至少保留的帧数
pub const MIN_REWIND_FRAMES: usize = 1;

#[derive(Debug)]
pub struct RewindBuffer {
    slots: Vec<Option<Frame>>,
    // 最旧一帧所在槽位
    head: usize,
    len: usize,
}

impl RewindBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(MIN_REWIND_FRAMES);
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
        }
    }

    /// 容量 = min(总帧数, 帧数上限, 内存预算 / 单帧字节数)
    pub fn capacity_for(
        total_frames: u32,
        frame_bytes: usize,
        memory_budget: usize,
        max_frames: usize,
    ) -> usize {
        let by_memory = memory_budget / frame_bytes.max(1);
        by_memory
            .min(max_frames)
            .min(total_frames as usize)
            .max(MIN_REWIND_FRAMES)
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// 追加新解码的帧；返回被淘汰的帧号
    ///
    /// 帧号必须大于当前最新帧号，否则拒绝写入并返回 `Err`。
    pub fn push(&mut self, frame: Frame) -> Result<Option<u32>, Frame> {
        if let Some(newest) = self.newest_index() {
            if frame.frame_number() <= newest {
                return Err(frame);
            }
        }

        let capacity = self.capacity();
        if self.len < capacity {
            let slot = (self.head + self.len) % capacity;
            self.slots[slot] = Some(frame);
            self.len += 1;
            return Ok(None);
        }

        let evicted = self.slots[self.head]
            .replace(frame)
            .map(|old| old.frame_number());
        self.head = (self.head + 1) % capacity;
        Ok(evicted)
    }

    /// 从最新一帧往回数第 `offset` 帧，0 为最新
    pub fn back(&self, offset: usize) -> Option<&Frame> {
        if offset >= self.len {
            return None;
        }
        let slot = (self.head + self.len - 1 - offset) % self.capacity();
        self.slots[slot].as_ref()
    }

    pub fn newest(&self) -> Option<&Frame> {
        self.back(0)
    }

    pub fn oldest(&self) -> Option<&Frame> {
        if self.len == 0 {
            None
        } else {
            self.slots[self.head].as_ref()
        }
    }

    pub fn newest_index(&self) -> Option<u32> {
        self.newest().map(Frame::frame_number)
    }

    pub fn oldest_index(&self) -> Option<u32> {
        self.oldest().map(Frame::frame_number)
    }

    /// 最多可后退的步数
    pub fn max_rewind(&self) -> usize {
        self.len.saturating_sub(1)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Frame> {
        (0..self.len).rev().filter_map(move |offset| self.back(offset))
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.head = 0;
        self.len = 0;
    }
}
