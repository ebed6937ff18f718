//! 会话驱动：逐个打开视频、运行采集会话、回写标注结果

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info, warn};

use crate::core::config::{AnnotatorConfig, PlaybackConfig};
use crate::core::error::Result;
use crate::core::export::SegmentExporter;
use crate::core::overlay::OverlayRenderer;
use crate::core::session::{
    CaptureOutcome, CaptureSession, DisplayFactory, SessionRequest, SessionResult,
};
use crate::core::tasks::{AnnotationRecord, TaskProgressStore, TaskQueue, TaskStatus};
use crate::core::video::{MediaOpener, Playhead, RewindBuffer};

/// 操作员是/否确认
pub trait Prompt {
    fn confirm(&mut self, question: &str) -> Result<bool>;
}

/// 按顺序返回预设答案，答案用完后一律回答否
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<bool>,
    asked: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    pub fn asked(&self) -> &[String] {
        &self.asked
    }
}

impl Prompt for ScriptedPrompt {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        self.asked.push(question.to_string());
        Ok(self.answers.pop_front().unwrap_or(false))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DriverSettings {
    pub base_path: PathBuf,
    /// 导出 GIF 和保存帧的目录
    pub output_dir: PathBuf,
    pub playback: PlaybackConfig,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self::from(&AnnotatorConfig::default())
    }
}

impl From<&AnnotatorConfig> for DriverSettings {
    fn from(config: &AnnotatorConfig) -> Self {
        Self {
            base_path: config.dataset.base_path.clone(),
            output_dir: config.capture.output_dir.clone(),
            playback: config.playback.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverSummary {
    pub annotated: usize,
    pub skipped: usize,
    pub exported: usize,
    pub not_found: usize,
    /// 进度记录中已完成而跳过的任务
    pub already_done: usize,
    pub cancelled: bool,
}

pub struct SessionDriver<'a> {
    opener: &'a dyn MediaOpener,
    displays: &'a mut dyn DisplayFactory,
    exporter: &'a dyn SegmentExporter,
    renderer: &'a OverlayRenderer,
    prompt: &'a mut dyn Prompt,
    settings: DriverSettings,
}

impl<'a> SessionDriver<'a> {
    pub fn new(
        opener: &'a dyn MediaOpener,
        displays: &'a mut dyn DisplayFactory,
        exporter: &'a dyn SegmentExporter,
        renderer: &'a OverlayRenderer,
        prompt: &'a mut dyn Prompt,
        settings: DriverSettings,
    ) -> Self {
        Self {
            opener,
            displays,
            exporter,
            renderer,
            prompt,
            settings,
        }
    }

    pub fn settings(&self) -> &DriverSettings {
        &self.settings
    }

    /// 回看缓冲容量：受总帧数、帧数上限和内存预算共同约束
    pub fn rewind_capacity(&self, total_frames: u32, width: u32, height: u32) -> usize {
        let frame_bytes = width as usize * height as usize * 4;
        RewindBuffer::capacity_for(
            total_frames,
            frame_bytes,
            self.settings.playback.rewind_memory_bytes(),
            self.settings.playback.max_rewind_frames,
        )
    }

    /// 标注模式：依次处理任务队列直到耗尽或操作员退出
    pub fn run_tasks(
        &mut self,
        queue: &mut dyn TaskQueue,
        progress: &mut dyn TaskProgressStore,
    ) -> Result<DriverSummary> {
        let mut summary = DriverSummary::default();

        while let Some(task) = queue.next_task()? {
            let id = task.id();
            if progress.is_done(&id) {
                debug!("already annotated: {}", id);
                summary.already_done += 1;
                continue;
            }

            let video_path = resolve_video_path(&self.settings.base_path, &task.video_path);
            let request = SessionRequest::new(&video_path)
                .with_caption(task.caption.clone(), task.action.clone())
                .with_export_dir(self.settings.output_dir.clone());

            let result = match self.run_session(request) {
                Ok(result) => result,
                Err(e) if e.is_recoverable() => {
                    warn!("⚠️ {}", e);
                    let question = format!("{} not found. Store as FILE NOT FOUND?", video_path.display());
                    if !self.prompt.confirm(&question)? {
                        info!("🛑 Aborted by operator");
                        summary.cancelled = true;
                        break;
                    }
                    let record = AnnotationRecord::without_segment(task, TaskStatus::FileNotFound);
                    queue.report(&record)?;
                    progress.mark(&id, TaskStatus::FileNotFound)?;
                    summary.not_found += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            let record = match result.outcome {
                CaptureOutcome::Captured { .. } => {
                    summary.annotated += 1;
                    AnnotationRecord::annotated(task, result.marks)
                }
                CaptureOutcome::Skipped | CaptureOutcome::Exported => {
                    summary.skipped += 1;
                    AnnotationRecord::without_segment(task, TaskStatus::Skipped)
                }
                CaptureOutcome::CancelledWithExit => {
                    summary.cancelled = true;
                    break;
                }
            };

            info!(
                "📝 {} {} [{}, {}]",
                record.status, id, record.start_frame, record.end_frame
            );
            queue.report(&record)?;
            progress.mark(&id, record.status)?;
        }

        info!("✅ Annotation run finished: {:?}", summary);
        Ok(summary)
    }

    /// 导出模式：浏览给定视频，保存帧或导出 GIF，不写标注结果
    pub fn run_export(&mut self, videos: &[PathBuf]) -> Result<DriverSummary> {
        let mut summary = DriverSummary::default();

        for video in videos {
            let request = SessionRequest::new(video)
                .with_capture_dir(self.settings.output_dir.clone())
                .with_export_dir(self.settings.output_dir.clone());

            let result = match self.run_session(request) {
                Ok(result) => result,
                Err(e) if e.is_recoverable() => {
                    warn!("⚠️ Skipping {:?}: {}", video, e);
                    summary.not_found += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            match result.outcome {
                CaptureOutcome::Captured { file_name } => {
                    if let Some(name) = file_name {
                        info!("📸 Saved {:?}", name);
                    }
                    summary.annotated += 1;
                }
                CaptureOutcome::Exported => summary.exported += 1,
                CaptureOutcome::Skipped => summary.skipped += 1,
                CaptureOutcome::CancelledWithExit => {
                    summary.cancelled = true;
                    break;
                }
            }
        }

        info!("✅ Export run finished: {:?}", summary);
        Ok(summary)
    }

    /// 一个视频的完整会话；显示表面和回看缓冲在返回前释放
    fn run_session(&mut self, request: SessionRequest) -> Result<SessionResult> {
        let media = self.opener.open(&request.video_path)?;
        let (width, height) = media.source.dimensions();
        let capacity = self.rewind_capacity(media.total_frames, width, height);
        debug!(
            "rewind buffer for {:?}: {} of {} frames",
            request.video_path, capacity, media.total_frames
        );

        let title = request.window_title();
        let playhead = Playhead::new(media.source, capacity);
        let mut session = CaptureSession::open(playhead, media.total_frames, request, self.exporter)?;

        let mut display = self.displays.open(&title, width, height)?;
        let result = session.run(display.as_mut(), self.renderer, self.refresh_interval())?;
        drop(display);
        Ok(result)
    }

    fn refresh_interval(&self) -> Duration {
        self.settings.playback.refresh_interval()
    }
}

/// 相对路径按数据集根目录解析
pub fn resolve_video_path(base_path: &Path, video_path: &Path) -> PathBuf {
    base_path.join(video_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::export::RecordingExporter;
    use crate::core::overlay::OverlayStyle;
    use crate::core::session::{InputEvent, ScriptedDisplayFactory};
    use crate::core::tasks::{AnnotationTask, MemoryProgressStore, MemoryTaskQueue, NO_SEGMENT};
    use crate::core::error::AnnotatorError;
    use crate::core::video::{Frame, FrameSource, OpenedMedia, SyntheticMediaOpener};
    use InputEvent::*;

    /// 首帧解码失败的帧源，模拟 ffprobe 能读但 ffmpeg 解不出的文件
    struct CorruptFrameSource;

    impl FrameSource for CorruptFrameSource {
        fn dimensions(&self) -> (u32, u32) {
            (32, 24)
        }

        fn next_frame(&mut self) -> Result<Option<Frame>> {
            Err(AnnotatorError::Decode("ffmpeg exited with exit status: 1".to_string()))
        }
    }

    struct CorruptAwareOpener {
        corrupt: PathBuf,
        inner: SyntheticMediaOpener,
    }

    impl MediaOpener for CorruptAwareOpener {
        fn open(&self, video_path: &Path) -> Result<OpenedMedia> {
            if video_path == self.corrupt {
                return Ok(OpenedMedia {
                    source: Box::new(CorruptFrameSource),
                    total_frames: 10,
                });
            }
            self.inner.open(video_path)
        }
    }

    fn settings() -> DriverSettings {
        DriverSettings {
            base_path: PathBuf::from("/data"),
            output_dir: PathBuf::from("/out"),
            playback: PlaybackConfig {
                refresh_interval_ms: 1,
                ..PlaybackConfig::default()
            },
        }
    }

    fn tasks(names: &[&str]) -> MemoryTaskQueue {
        MemoryTaskQueue::new(
            names
                .iter()
                .map(|name| AnnotationTask::new(*name, format!("Caption for {}", name), "walk")),
        )
    }

    struct Harness {
        opener: SyntheticMediaOpener,
        displays: ScriptedDisplayFactory,
        exporter: RecordingExporter,
        renderer: OverlayRenderer,
        prompt: ScriptedPrompt,
    }

    impl Harness {
        fn new(opener: SyntheticMediaOpener, scripts: Vec<Vec<InputEvent>>, answers: Vec<bool>) -> Self {
            Self {
                opener,
                displays: ScriptedDisplayFactory::new(scripts),
                exporter: RecordingExporter::new(),
                renderer: OverlayRenderer::without_text(OverlayStyle::default()),
                prompt: ScriptedPrompt::new(answers),
            }
        }

        fn driver(&mut self) -> SessionDriver<'_> {
            SessionDriver::new(
                &self.opener,
                &mut self.displays,
                &self.exporter,
                &self.renderer,
                &mut self.prompt,
                settings(),
            )
        }
    }

    #[test]
    fn test_capture_and_skip_are_reported() {
        let opener = SyntheticMediaOpener::new()
            .with_video("/data/a.avi", 10)
            .with_video("/data/b.avi", 10);
        let scripts = vec![
            vec![StepForward, MarkStartHere, StepForward, StepForward, MarkEndHere, Capture],
            vec![Skip],
        ];
        let mut harness = Harness::new(opener, scripts, vec![]);
        let mut queue = tasks(&["a.avi", "b.avi"]);
        let mut progress = MemoryProgressStore::new();

        let summary = harness.driver().run_tasks(&mut queue, &mut progress).unwrap();

        assert_eq!(summary.annotated, 1);
        assert_eq!(summary.skipped, 1);
        assert!(!summary.cancelled);

        let reported = queue.reported();
        assert_eq!(reported.len(), 2);
        assert_eq!((reported[0].start_frame, reported[0].end_frame), (2, 4));
        assert_eq!(reported[0].status, TaskStatus::Ok);
        assert_eq!((reported[1].start_frame, reported[1].end_frame), (NO_SEGMENT, NO_SEGMENT));
        assert_eq!(reported[1].status, TaskStatus::Skipped);

        assert_eq!(progress.status("a.avi"), Some(TaskStatus::Ok));
        assert_eq!(progress.status("b.avi"), Some(TaskStatus::Skipped));
        assert_eq!(harness.displays.opened(), &["a [WALK]", "b [WALK]"]);
    }

    #[test]
    fn test_done_tasks_are_not_opened() {
        let opener = SyntheticMediaOpener::new()
            .with_video("/data/a.avi", 5)
            .with_video("/data/b.avi", 5);
        let mut harness = Harness::new(opener, vec![vec![Skip]], vec![]);
        let mut queue = tasks(&["a.avi", "b.avi"]);
        let mut progress = MemoryProgressStore::new();
        progress.mark("a.avi", TaskStatus::Ok).unwrap();

        let summary = harness.driver().run_tasks(&mut queue, &mut progress).unwrap();

        assert_eq!(summary.already_done, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(harness.displays.opened(), &["b [WALK]"]);
    }

    #[test]
    fn test_missing_file_recorded_when_confirmed() {
        let opener = SyntheticMediaOpener::new().with_video("/data/b.avi", 5);
        let mut harness = Harness::new(opener, vec![vec![Skip]], vec![true]);
        let mut queue = tasks(&["missing.avi", "b.avi"]);
        let mut progress = MemoryProgressStore::new();

        let summary = harness.driver().run_tasks(&mut queue, &mut progress).unwrap();

        assert_eq!(summary.not_found, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(queue.reported()[0].status, TaskStatus::FileNotFound);
        assert_eq!(queue.reported()[0].start_frame, NO_SEGMENT);
        assert_eq!(progress.status("missing.avi"), Some(TaskStatus::FileNotFound));
        assert_eq!(harness.prompt.asked().len(), 1);
        assert!(harness.prompt.asked()[0].contains("/data/missing.avi"));
    }

    #[test]
    fn test_missing_file_aborts_when_declined() {
        let opener = SyntheticMediaOpener::new().with_video("/data/b.avi", 5);
        let mut harness = Harness::new(opener, vec![vec![Skip]], vec![false]);
        let mut queue = tasks(&["missing.avi", "b.avi"]);
        let mut progress = MemoryProgressStore::new();

        let summary = harness.driver().run_tasks(&mut queue, &mut progress).unwrap();

        assert!(summary.cancelled);
        assert!(queue.reported().is_empty());
        assert_eq!(queue.remaining(), 1);
        assert!(harness.displays.opened().is_empty());
    }

    #[test]
    fn test_undecodable_video_offers_file_not_found() {
        let opener = CorruptAwareOpener {
            corrupt: PathBuf::from("/data/corrupt.avi"),
            inner: SyntheticMediaOpener::new().with_video("/data/ok.avi", 5),
        };
        let mut displays = ScriptedDisplayFactory::new(vec![vec![Skip]]);
        let exporter = RecordingExporter::new();
        let renderer = OverlayRenderer::without_text(OverlayStyle::default());
        let mut prompt = ScriptedPrompt::new([true]);
        let mut queue = tasks(&["corrupt.avi", "ok.avi"]);
        let mut progress = MemoryProgressStore::new();

        let summary = SessionDriver::new(
            &opener,
            &mut displays,
            &exporter,
            &renderer,
            &mut prompt,
            settings(),
        )
        .run_tasks(&mut queue, &mut progress)
        .unwrap();

        assert_eq!(summary.not_found, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(prompt.asked().len(), 1);
        assert_eq!(queue.reported()[0].status, TaskStatus::FileNotFound);
        assert_eq!(queue.reported()[1].status, TaskStatus::Skipped);
        assert_eq!(displays.opened(), &["ok [WALK]"]);
        assert_eq!(queue.remaining(), 0);
    }

    #[test]
    fn test_undecodable_video_skipped_in_export_mode() {
        let opener = CorruptAwareOpener {
            corrupt: PathBuf::from("/v/corrupt.avi"),
            inner: SyntheticMediaOpener::new().with_video("/v/ok.avi", 5),
        };
        let mut displays = ScriptedDisplayFactory::new(vec![vec![Skip]]);
        let exporter = RecordingExporter::new();
        let renderer = OverlayRenderer::without_text(OverlayStyle::default());
        let mut prompt = ScriptedPrompt::default();
        let videos = vec![PathBuf::from("/v/corrupt.avi"), PathBuf::from("/v/ok.avi")];

        let summary = SessionDriver::new(
            &opener,
            &mut displays,
            &exporter,
            &renderer,
            &mut prompt,
            settings(),
        )
        .run_export(&videos)
        .unwrap();

        assert_eq!(summary.not_found, 1);
        assert_eq!(summary.skipped, 1);
        assert!(!summary.cancelled);
    }

    #[test]
    fn test_quit_stops_without_reporting() {
        let opener = SyntheticMediaOpener::new()
            .with_video("/data/a.avi", 5)
            .with_video("/data/b.avi", 5);
        let mut harness = Harness::new(opener, vec![vec![StepForward, Quit]], vec![]);
        let mut queue = tasks(&["a.avi", "b.avi"]);
        let mut progress = MemoryProgressStore::new();

        let summary = harness.driver().run_tasks(&mut queue, &mut progress).unwrap();

        assert!(summary.cancelled);
        assert!(queue.reported().is_empty());
        assert!(!progress.is_done("a.avi"));
        assert_eq!(queue.remaining(), 1);
    }

    #[test]
    fn test_export_mode_counts_outcomes() {
        let opener = SyntheticMediaOpener::new()
            .with_video("/v/a.avi", 10)
            .with_video("/v/b.avi", 10);
        let scripts = vec![vec![StepForward, MarkStartHere, Export, Skip], vec![Skip]];
        let mut harness = Harness::new(opener, scripts, vec![]);
        let videos = vec![
            PathBuf::from("/v/a.avi"),
            PathBuf::from("/v/missing.avi"),
            PathBuf::from("/v/b.avi"),
        ];

        let summary = harness.driver().run_export(&videos).unwrap();

        assert_eq!(summary.exported, 1);
        assert_eq!(summary.not_found, 1);
        assert_eq!(summary.skipped, 1);
        let calls = harness.exporter.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!((calls[0].start_frame, calls[0].end_frame), (2, 10));
        assert_eq!(calls[0].output_path, PathBuf::from("/out/a.gif"));
        assert!(harness.prompt.asked().is_empty());
    }

    #[test]
    fn test_rewind_capacity_bounded_by_memory() {
        let mut harness = Harness::new(SyntheticMediaOpener::new(), vec![], vec![]);
        let driver = harness.driver();

        // 1920x1080 RGBA ≈ 7.9 MiB，512 MiB 预算约 64 帧
        assert_eq!(driver.rewind_capacity(10_000, 1920, 1080), 64);
        assert_eq!(driver.rewind_capacity(30, 1920, 1080), 30);
        assert_eq!(driver.rewind_capacity(10_000, 32, 24), 900);
    }

    #[test]
    fn test_resolve_video_path() {
        assert_eq!(
            resolve_video_path(Path::new("/data"), Path::new("movie/clip.avi")),
            PathBuf::from("/data/movie/clip.avi")
        );
    }
}
