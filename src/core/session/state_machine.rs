//! 采集会话状态机
//!
//! 每次迭代：播放中则前进一帧 → 渲染叠加层并显示 → 有界等待一次输入 → 分发事件。
//! 直到进入 `Terminated`。

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use image::RgbaImage;
use log::{error, info, warn};

use crate::core::error::{AnnotatorError, Result};
use crate::core::export::{gif_output_path, SegmentExporter};
use crate::core::overlay::{OverlayParams, OverlayRenderer};
use crate::core::session::display::DisplaySurface;
use crate::core::session::input::{InputEvent, KEYBOARD_MANUAL};
use crate::core::session::marks::SegmentMarks;
use crate::core::video::{FrameSource, Playhead, Step};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// `file_name` 仅在请求保存当前帧且写入成功时存在
    Captured { file_name: Option<PathBuf> },
    Skipped,
    /// 导出过片段后跳到下一个视频
    Exported,
    /// 退出整个程序，而不仅是当前视频
    CancelledWithExit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureState {
    Playing,
    Paused,
    Terminated(CaptureOutcome),
}

/// 打开一个会话所需的外部信息
#[derive(Debug, Clone, Default)]
pub struct SessionRequest {
    pub video_path: PathBuf,
    pub caption: String,
    pub action: String,
    /// 设置后，采集时把当前帧保存为 PNG
    pub capture_dir: Option<PathBuf>,
    pub export_dir: PathBuf,
}

impl SessionRequest {
    pub fn new(video_path: impl Into<PathBuf>) -> Self {
        Self {
            video_path: video_path.into(),
            export_dir: PathBuf::from("."),
            ..Default::default()
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>, action: impl Into<String>) -> Self {
        self.caption = caption.into();
        self.action = action.into();
        self
    }

    pub fn with_capture_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.capture_dir = Some(dir.into());
        self
    }

    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }

    /// 窗口标题：视频文件名 + 动作标签
    pub fn window_title(&self) -> String {
        let name = self
            .video_path
            .file_stem()
            .map_or_else(String::new, |s| s.to_string_lossy().to_string());
        if self.action.is_empty() {
            name
        } else {
            format!("{} [{}]", name, self.action.to_uppercase())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionResult {
    pub outcome: CaptureOutcome,
    pub marks: SegmentMarks,
    pub position: u32,
    pub exports: Vec<PathBuf>,
}

/// `<视频文件名去掉扩展名>_<五位帧号>.png`
pub fn captured_frame_name(video_path: &Path, frame_number: u32) -> PathBuf {
    let mut name: OsString = video_path
        .file_stem()
        .map_or_else(|| OsString::from("frame"), OsString::from);
    name.push(format!("_{:05}.png", frame_number));
    PathBuf::from(name)
}

pub struct CaptureSession<'a, S> {
    playhead: Playhead<S>,
    total_frames: u32,
    marks: SegmentMarks,
    request: SessionRequest,
    exporter: &'a dyn SegmentExporter,
    exports: Vec<PathBuf>,
    outcome: Option<CaptureOutcome>,
}

impl<'a, S: FrameSource> CaptureSession<'a, S> {
    /// 解码第一帧后以暂停状态开始
    pub fn open(
        mut playhead: Playhead<S>,
        total_frames: u32,
        request: SessionRequest,
        exporter: &'a dyn SegmentExporter,
    ) -> Result<Self> {
        // 首帧都解不出来的文件按无法打开处理，驱动层可以跳过
        let started = playhead.start().map_err(|e| match e {
            AnnotatorError::Decode(reason) => AnnotatorError::media_open(&request.video_path, reason),
            other => other,
        })?;
        if !started {
            return Err(AnnotatorError::media_open(&request.video_path, "video has no frames"));
        }
        Ok(Self {
            playhead,
            total_frames,
            marks: SegmentMarks::new(total_frames),
            request,
            exporter,
            exports: Vec::new(),
            outcome: None,
        })
    }

    pub fn state(&self) -> CaptureState {
        match &self.outcome {
            Some(outcome) => CaptureState::Terminated(outcome.clone()),
            None if self.playhead.is_paused() => CaptureState::Paused,
            None => CaptureState::Playing,
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn marks(&self) -> SegmentMarks {
        self.marks
    }

    pub fn position(&self) -> u32 {
        self.playhead.position()
    }

    pub fn playhead(&self) -> &Playhead<S> {
        &self.playhead
    }

    pub fn request(&self) -> &SessionRequest {
        &self.request
    }

    /// 播放状态下的一次刷新
    pub fn tick(&mut self) -> Result<Step> {
        if self.is_terminated() {
            return Ok(Step::Unchanged);
        }
        self.playhead.tick()
    }

    pub fn render(&self, renderer: &OverlayRenderer) -> Option<RgbaImage> {
        let frame = self.playhead.current_frame()?;
        let params = OverlayParams {
            position: self.position(),
            start_frame: Some(self.marks.start_frame()),
            end_frame: Some(self.marks.end_frame()),
            total_frames: self.total_frames,
            caption: &self.request.caption,
        };
        Some(renderer.render(frame, &params))
    }

    pub fn dispatch(&mut self, event: InputEvent) -> Result<()> {
        if self.is_terminated() {
            return Ok(());
        }
        let position = self.position();
        match event {
            InputEvent::TogglePlay => self.on_toggle_play(),
            InputEvent::StepBackward => self.on_step_backward(),
            InputEvent::StepForward => self.on_step_forward()?,
            InputEvent::MarkStartHere => self.marks.mark_start(position),
            InputEvent::MarkStartAtFirst => self.marks.mark_start(1),
            InputEvent::MarkEndHere => self.marks.mark_end(position),
            InputEvent::MarkEndAtLast => self.marks.mark_end(self.total_frames),
            InputEvent::Capture => self.on_capture(),
            InputEvent::Export => self.on_export(),
            InputEvent::Skip => self.on_skip(),
            InputEvent::Quit => self.on_quit(),
            InputEvent::ShowHelp => info!("{}", KEYBOARD_MANUAL),
        }
        Ok(())
    }

    /// 运行到终止状态；显示表面由调用方在返回后释放
    pub fn run(
        &mut self,
        display: &mut dyn DisplaySurface,
        renderer: &OverlayRenderer,
        refresh: Duration,
    ) -> Result<SessionResult> {
        while !self.is_terminated() {
            self.tick()?;

            if let Some(image) = self.render(renderer) {
                display.present(&image)?;
            }

            if let Some(event) = display.poll_event(refresh)? {
                self.dispatch(event)?;
            }
        }
        self.result()
            .ok_or_else(|| AnnotatorError::Display("session ended without outcome".to_string()))
    }

    pub fn result(&self) -> Option<SessionResult> {
        self.outcome.clone().map(|outcome| SessionResult {
            outcome,
            marks: self.marks,
            position: self.position(),
            exports: self.exports.clone(),
        })
    }

    fn on_toggle_play(&mut self) {
        let paused = self.playhead.toggle_pause();
        if !paused && self.playhead.is_at_end() {
            // 已到结尾，下一次刷新会立即重新暂停
            info!("⏹️ Already at the last frame");
        }
    }

    fn on_step_backward(&mut self) {
        self.playhead.retreat();
    }

    fn on_step_forward(&mut self) -> Result<()> {
        self.playhead.set_paused(true);
        self.playhead.advance()?;
        Ok(())
    }

    fn on_capture(&mut self) {
        let position = self.position();
        let file_name = self.request.capture_dir.as_deref().and_then(|dir| {
            let path = dir.join(captured_frame_name(&self.request.video_path, position));
            info!("📸 Saving frame {:?}", path);
            let frame = self.playhead.current_frame()?;
            match frame.to_image().save(&path) {
                Ok(()) => Some(path),
                Err(e) => {
                    error!("❌ Failed to save frame {:?}: {}", path, e);
                    None
                }
            }
        });
        self.outcome = Some(CaptureOutcome::Captured { file_name });
    }

    fn on_export(&mut self) {
        if !self.marks.is_exportable() {
            warn!(
                "Export ignored: IN {} is not before OUT {}",
                self.marks.start_frame(),
                self.marks.end_frame()
            );
            return;
        }

        let output = gif_output_path(&self.request.export_dir, &self.request.video_path);
        info!("🎞️ Exporting to: {:?}", output);
        match self.exporter.export(
            &self.request.video_path,
            self.marks.start_frame(),
            self.marks.end_frame(),
            &output,
        ) {
            Ok(()) => self.exports.push(output),
            Err(e) => error!("❌ Export failed: {}", e),
        }
    }

    fn on_skip(&mut self) {
        self.outcome = Some(if self.exports.is_empty() {
            CaptureOutcome::Skipped
        } else {
            CaptureOutcome::Exported
        });
    }

    fn on_quit(&mut self) {
        info!("👋 Quit requested");
        self.outcome = Some(CaptureOutcome::CancelledWithExit);
    }
}
