//! 叠加层合成：进度条 + 计时器 + 字幕

use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};
use log::{info, warn};
use once_cell::sync::Lazy;
use rusttype::{point, Font, Scale};

use crate::core::config::OverlayConfig;
use crate::core::overlay::caption::{caption_baselines, wrap_caption};
use crate::core::overlay::playbar::{playbar_spans, SpanKind, PLAYBAR_HEIGHT};
use crate::core::video::Frame;

const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

static SYSTEM_FONT: Lazy<Option<PathBuf>> = Lazy::new(|| {
    SYSTEM_FONT_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
});

/// 叠加层配色（RGB）
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayStyle {
    pub played: Rgba<u8>,
    pub unplayed: Rgba<u8>,
    pub in_played: Rgba<u8>,
    pub in_unplayed: Rgba<u8>,
    pub caption: Rgba<u8>,
    pub timer: Rgba<u8>,
    pub font_size: f32,
    pub caption_line_len: usize,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            played: Rgba([230, 230, 230, 255]),
            unplayed: Rgba([128, 128, 128, 255]),
            in_played: Rgba([229, 45, 39, 255]),
            in_unplayed: Rgba([128, 18, 23, 255]),
            caption: Rgba([232, 232, 21, 255]),
            timer: Rgba([230, 230, 230, 255]),
            font_size: 16.0,
            caption_line_len: 80,
        }
    }
}

impl OverlayStyle {
    pub fn span_color(&self, kind: SpanKind) -> Rgba<u8> {
        match kind {
            SpanKind::Played => self.played,
            SpanKind::Unplayed => self.unplayed,
            SpanKind::InPlayed => self.in_played,
            SpanKind::InUnplayed => self.in_unplayed,
        }
    }
}

/// 单次渲染所需的播放状态
#[derive(Debug, Clone, Copy)]
pub struct OverlayParams<'a> {
    pub position: u32,
    pub start_frame: Option<u32>,
    pub end_frame: Option<u32>,
    pub total_frames: u32,
    pub caption: &'a str,
}

pub struct OverlayRenderer {
    font: Option<Font<'static>>,
    style: OverlayStyle,
}

impl OverlayRenderer {
    /// 不绘制文字，只画进度条
    pub fn without_text(style: OverlayStyle) -> Self {
        Self { font: None, style }
    }

    pub fn with_font(font: Font<'static>, style: OverlayStyle) -> Self {
        Self {
            font: Some(font),
            style,
        }
    }

    /// 按配置加载字体；找不到字体时退化为不绘制文字
    pub fn from_config(config: &OverlayConfig) -> Self {
        let style = OverlayStyle {
            font_size: config.font_size,
            caption_line_len: config.caption_line_len,
            ..Default::default()
        };

        let font_path = config.font_path.clone().or_else(|| SYSTEM_FONT.clone());
        match font_path.as_deref().map(load_font) {
            Some(Some(font)) => Self::with_font(font, style),
            _ => {
                warn!("🔤 No usable font found, timer and caption will not be drawn");
                Self::without_text(style)
            }
        }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    pub fn style(&self) -> &OverlayStyle {
        &self.style
    }

    /// 合成一帧显示图像，源帧不被修改
    pub fn render(&self, frame: &Frame, params: &OverlayParams<'_>) -> RgbaImage {
        let mut img = frame.to_image();
        self.draw_playbar(&mut img, params);

        if let Some(font) = &self.font {
            let scale = Scale::uniform(self.style.font_size);
            let timer = format!("{}/{}", params.position, params.total_frames);
            let x = img.width() as i32 - 100;
            draw_text(&mut img, font, scale, x, 20, &timer, self.style.timer);

            let lines = wrap_caption(params.caption, self.style.caption_line_len);
            let baselines = caption_baselines(img.height(), lines.len());
            for (line, y) in lines.iter().zip(baselines) {
                draw_text(&mut img, font, scale, 10, y, line, self.style.caption);
            }
        }
        img
    }

    fn draw_playbar(&self, img: &mut RgbaImage, params: &OverlayParams<'_>) {
        let (width, height) = img.dimensions();
        let top = height.saturating_sub(PLAYBAR_HEIGHT);
        let spans = playbar_spans(
            width,
            params.position,
            params.start_frame,
            params.end_frame,
            params.total_frames,
        );
        for span in spans {
            let color = self.style.span_color(span.kind);
            for y in top..height {
                for x in span.from..span.to.min(width) {
                    img.put_pixel(x, y, color);
                }
            }
        }
    }
}

fn load_font(path: &Path) -> Option<Font<'static>> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("🔤 Cannot read font {:?}: {}", path, e);
            return None;
        }
    };
    let font = Font::try_from_vec(bytes);
    match &font {
        Some(_) => info!("🔤 Loaded overlay font {:?}", path),
        None => warn!("🔤 Invalid font file {:?}", path),
    }
    font
}

/// 以 (x, baseline) 为原点绘制文字，按覆盖率做 alpha 混合
fn draw_text(
    img: &mut RgbaImage,
    font: &Font<'_>,
    scale: Scale,
    x: i32,
    baseline: i32,
    text: &str,
    color: Rgba<u8>,
) {
    let (w, h) = (img.width() as i32, img.height() as i32);
    let origin = point(x as f32, baseline as f32);

    for glyph in font.layout(text, scale, origin) {
        let Some(bb) = glyph.pixel_bounding_box() else {
            continue;
        };
        glyph.draw(|gx, gy, coverage| {
            let px = bb.min.x + gx as i32;
            let py = bb.min.y + gy as i32;
            if px < 0 || py < 0 || px >= w || py >= h {
                return;
            }
            let alpha = (coverage.clamp(0.0, 1.0) * 255.0) as u32;
            let inv = 255 - alpha;
            let dst = img.get_pixel_mut(px as u32, py as u32);
            for c in 0..3 {
                dst.0[c] = ((color.0[c] as u32 * alpha + dst.0[c] as u32 * inv) / 255) as u8;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(position: u32) -> OverlayParams<'static> {
        OverlayParams {
            position,
            start_frame: Some(20),
            end_frame: Some(60),
            total_frames: 100,
            caption: "Someone opens the fridge.",
        }
    }

    #[test]
    fn test_playbar_colors() {
        let renderer = OverlayRenderer::without_text(OverlayStyle::default());
        let frame = Frame::solid(1000, 20, [0, 0, 0, 255], 40);
        let img = renderer.render(&frame, &params(40));
        let style = renderer.style();

        let bar_y = 20 - 1;
        assert_eq!(*img.get_pixel(100, bar_y), style.played);
        assert_eq!(*img.get_pixel(300, bar_y), style.in_played);
        assert_eq!(*img.get_pixel(500, bar_y), style.in_unplayed);
        assert_eq!(*img.get_pixel(800, bar_y), style.unplayed);
        // 进度条上方保持原样
        assert_eq!(img.get_pixel(100, 20 - PLAYBAR_HEIGHT - 1).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_render_does_not_mutate_frame() {
        let renderer = OverlayRenderer::without_text(OverlayStyle::default());
        let frame = Frame::solid(64, 32, [9, 9, 9, 255], 1);
        let before = frame.clone();

        let first = renderer.render(&frame, &params(1));
        let second = renderer.render(&frame, &params(1));

        assert_eq!(frame, before);
        assert_eq!(first, second);
    }

    #[test]
    fn test_from_config_with_missing_font_falls_back() {
        let config = OverlayConfig {
            font_path: Some(PathBuf::from("/nonexistent/font.ttf")),
            ..Default::default()
        };
        let renderer = OverlayRenderer::from_config(&config);
        assert!(!renderer.has_font());
        assert_eq!(renderer.style().caption_line_len, 80);
    }

    #[test]
    fn test_text_drawn_when_font_available() {
        let Some(path) = SYSTEM_FONT.clone() else {
            return;
        };
        let config = OverlayConfig {
            font_path: Some(path),
            ..Default::default()
        };
        let renderer = OverlayRenderer::from_config(&config);
        let frame = Frame::solid(320, 120, [0, 0, 0, 255], 5);
        let img = renderer.render(&frame, &params(5));

        let timer_region_lit = (220..320)
            .flat_map(|x| (0..25).map(move |y| (x, y)))
            .any(|(x, y)| img.get_pixel(x, y).0[0] > 0);
        assert!(timer_region_lit);
    }
}
