//! 进度条分段计算

/// 进度条高度（像素）
pub const PLAYBAR_HEIGHT: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    Played,
    Unplayed,
    /// 标记区间内、已播放
    InPlayed,
    /// 标记区间内、未播放
    InUnplayed,
}

/// 半开区间 `[from, to)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub from: u32,
    pub to: u32,
    pub kind: SpanKind,
}

/// 帧号线性映射到像素：`frame / total * width`，向下取整
pub fn frame_to_pixel(frame: u32, total_frames: u32, width: u32) -> u32 {
    if total_frames == 0 {
        return 0;
    }
    ((frame as f64 / total_frames as f64) * width as f64) as u32
}

/// 计算进度条的分段，空区间被省略
///
/// `start`/`end` 为 `None` 时只区分已播放和未播放。
pub fn playbar_spans(
    width: u32,
    position: u32,
    start: Option<u32>,
    end: Option<u32>,
    total_frames: u32,
) -> Vec<Span> {
    use SpanKind::*;

    if position == 0 || total_frames == 0 {
        return collect(&[(0, width, Unplayed)]);
    }

    let cur = frame_to_pixel(position, total_frames, width).min(width);
    let start_px = start.map_or(cur, |s| frame_to_pixel(s, total_frames, width).min(width));
    let end_px = end.map_or(cur, |e| frame_to_pixel(e, total_frames, width).min(width));

    if start_px < end_px {
        if cur < start_px {
            collect(&[
                (0, cur, Played),
                (cur, start_px, Unplayed),
                (start_px, end_px, InUnplayed),
                (end_px, width, Unplayed),
            ])
        } else if cur < end_px {
            collect(&[
                (0, start_px, Played),
                (start_px, cur, InPlayed),
                (cur, end_px, InUnplayed),
                (end_px, width, Unplayed),
            ])
        } else {
            collect(&[
                (0, start_px, Played),
                (start_px, end_px, InPlayed),
                (end_px, cur, Played),
                (cur, width, Unplayed),
            ])
        }
    } else {
        collect(&[(0, cur, Played), (cur, width, Unplayed)])
    }
}

fn collect(parts: &[(u32, u32, SpanKind)]) -> Vec<Span> {
    parts
        .iter()
        .filter(|(from, to, _)| from < to)
        .map(|&(from, to, kind)| Span { from, to, kind })
        .collect()
}
