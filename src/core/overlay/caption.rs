//! 字幕折行

/// 默认每行字符数
pub const DEFAULT_LINE_LEN: usize = 80;

/// 计算折行位置（字节偏移，基于去除首尾空白后的字符串）
///
/// 每越过一个 `line_len` 边界，就在边界前最后一个空格处断行；
/// 最后一个元素总是字符串长度，因此结果长度等于行数。
pub fn line_breaks(text: &str, line_len: usize) -> Vec<usize> {
    let text = text.trim();
    let line_len = line_len.max(1);
    let spaces: Vec<usize> = text.match_indices(' ').map(|(i, _)| i).collect();

    let mut breaks: Vec<usize> = Vec::new();
    let mut seeking_line = 1;
    for (i, &pos) in spaces.iter().enumerate() {
        if pos > seeking_line * line_len {
            let at = if i == 0 { pos } else { spaces[i - 1] };
            if breaks.last() != Some(&at) {
                breaks.push(at);
            }
            seeking_line += 1;
        }
    }
    breaks.push(text.len());
    breaks
}

/// 折行后的各行文本；换行符先折叠成空格
pub fn wrap_caption(caption: &str, line_len: usize) -> Vec<String> {
    let normalized = caption.replace(['\n', '\r', '\t'], " ");
    let text = normalized.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let mut lines = Vec::new();
    let mut last_start = 0;
    for brk in line_breaks(text, line_len) {
        lines.push(text[last_start..brk].to_string());
        last_start = (brk + 1).min(text.len());
    }
    lines
}

/// 各行基线 y 坐标，自下而上排列，最后一行最靠近进度条
pub fn caption_baselines(image_height: u32, line_count: usize) -> Vec<i32> {
    let bottom = image_height as i32 - 15;
    (0..line_count)
        .map(|i| bottom - 20 * (line_count - i) as i32)
        .collect()
}
