//! 叠加层渲染 - 进度条、计时器和字幕
//!
//! 纯函数式：输入帧和播放状态，输出新图像，调用之间不保留状态。

pub mod caption;
pub mod playbar;
pub mod renderer;

pub use caption::{caption_baselines, line_breaks, wrap_caption};
pub use playbar::{frame_to_pixel, playbar_spans, Span, SpanKind, PLAYBAR_HEIGHT};
pub use renderer::{OverlayParams, OverlayRenderer, OverlayStyle};
