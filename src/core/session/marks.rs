use log::info;

/// 入点/出点（帧号从 1 开始），任何修改后都保持 start <= end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentMarks {
    start_frame: u32,
    end_frame: u32,
}

impl SegmentMarks {
    /// 默认覆盖整段视频
    pub fn new(total_frames: u32) -> Self {
        let last = total_frames.max(1);
        Self {
            start_frame: 1,
            end_frame: last,
        }
    }

    pub fn start_frame(&self) -> u32 {
        self.start_frame
    }

    pub fn end_frame(&self) -> u32 {
        self.end_frame
    }

    /// 设置入点；出点早于入点时抬高出点
    pub fn mark_start(&mut self, frame: u32) {
        self.start_frame = frame.max(1);
        if self.end_frame < self.start_frame {
            self.end_frame = self.start_frame;
        }
        self.log();
    }

    /// 设置出点；入点晚于出点时降低入点
    pub fn mark_end(&mut self, frame: u32) {
        self.end_frame = frame.max(1);
        if self.start_frame > self.end_frame {
            self.start_frame = self.end_frame;
        }
        self.log();
    }

    pub fn is_exportable(&self) -> bool {
        self.start_frame < self.end_frame
    }

    fn log(&self) {
        info!("IN: {}     OUT: {}", self.start_frame, self.end_frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_video() {
        let marks = SegmentMarks::new(250);
        assert_eq!((marks.start_frame(), marks.end_frame()), (1, 250));
        assert!(marks.is_exportable());
    }

    #[test]
    fn test_start_past_end_raises_end() {
        let mut marks = SegmentMarks::new(100);
        marks.mark_end(30);
        marks.mark_start(50);
        assert_eq!((marks.start_frame(), marks.end_frame()), (50, 50));
        assert!(!marks.is_exportable());
    }

    #[test]
    fn test_end_before_start_lowers_start() {
        let mut marks = SegmentMarks::new(100);
        marks.mark_start(70);
        marks.mark_end(40);
        assert_eq!((marks.start_frame(), marks.end_frame()), (40, 40));
    }

    #[test]
    fn test_ordering_holds_for_any_sequence() {
        for total in 1..=12u32 {
            let mut marks = SegmentMarks::new(total);
            for step in 0..40u32 {
                let frame = (step * 7 + total) % total + 1;
                if step % 3 == 0 {
                    marks.mark_end(frame);
                } else {
                    marks.mark_start(frame);
                }
                assert!(marks.start_frame() <= marks.end_frame());
            }
        }
    }
}
