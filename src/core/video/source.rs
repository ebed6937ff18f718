//! 顺序解码帧源（无随机访问）

use std::collections::HashMap;
use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread::{self, JoinHandle};

use log::{debug, info, warn};

use crate::core::error::{AnnotatorError, Result};
use crate::core::video::frame::Frame;
use crate::core::video::probe::VideoProbe;

/// 只能向前读取的帧源，`Ok(None)` 表示流结束
pub trait FrameSource {
    fn dimensions(&self) -> (u32, u32);

    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn dimensions(&self) -> (u32, u32) {
        (**self).dimensions()
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        (**self).next_frame()
    }
}

/// 预扫描：完整解码一遍以统计帧数
pub fn count_frames<S: FrameSource + ?Sized>(source: &mut S) -> Result<u32> {
    let mut total = 0u32;
    while source.next_frame()?.is_some() {
        total += 1;
    }
    Ok(total)
}

/// ffmpeg 管道解码器：rawvideo + rgba 输出到 stdout
pub struct FfmpegFrameSource {
    child: Child,
    reader: BufReader<ChildStdout>,
    stderr: Option<JoinHandle<String>>,
    video_path: PathBuf,
    width: u32,
    height: u32,
    decoded: u32,
    finished: bool,
}

impl FfmpegFrameSource {
    pub fn spawn(ffmpeg_path: &str, video_path: &Path, width: u32, height: u32) -> Result<Self> {
        let mut child = Command::new(ffmpeg_path)
            .arg("-v")
            .arg("error")
            .arg("-i")
            .arg(video_path)
            .args(["-f", "rawvideo", "-pix_fmt", "rgba", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AnnotatorError::media_open(video_path, format!("ffmpeg: {}", e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AnnotatorError::Ffmpeg("ffmpeg stdout not captured".to_string()))?;

        // stderr 单独排空，避免管道写满阻塞解码
        let stderr = child.stderr.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut bytes = Vec::new();
                let _ = pipe.read_to_end(&mut bytes);
                String::from_utf8_lossy(&bytes).trim().to_string()
            })
        });

        debug!("ffmpeg decoder spawned for {:?} ({}x{})", video_path, width, height);
        Ok(Self {
            child,
            reader: BufReader::new(stdout),
            stderr,
            video_path: video_path.to_path_buf(),
            width,
            height,
            decoded: 0,
            finished: false,
        })
    }

    /// 解码器退出：首帧之前失败视为无法打开的媒体
    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        let status = self.child.wait()?;
        let stderr = self
            .stderr
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();
        if status.success() {
            return Ok(());
        }

        let reason = if stderr.is_empty() {
            format!("ffmpeg exited with {}", status)
        } else {
            format!("ffmpeg exited with {}: {}", status, stderr)
        };
        warn!("⚠️ Decoding {:?} failed after {} frames: {}", self.video_path, self.decoded, reason);
        if self.decoded == 0 {
            return Err(AnnotatorError::media_open(&self.video_path, reason));
        }
        Ok(())
    }
}

impl FrameSource for FfmpegFrameSource {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.finished {
            return Ok(None);
        }

        let mut data = vec![0u8; self.width as usize * self.height as usize * 4];
        match self.reader.read_exact(&mut data) {
            Ok(()) => {
                self.decoded += 1;
                Ok(Some(Frame::new(self.width, self.height, data, self.decoded)))
            }
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                self.finish()?;
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for FfmpegFrameSource {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// 一次会话所需的帧源和总帧数
pub struct OpenedMedia {
    pub source: Box<dyn FrameSource>,
    pub total_frames: u32,
}

pub trait MediaOpener {
    fn open(&self, video_path: &Path) -> Result<OpenedMedia>;
}

pub struct FfmpegMediaOpener {
    ffmpeg_path: String,
    ffprobe_path: String,
}

impl FfmpegMediaOpener {
    pub fn new(ffmpeg_path: impl Into<String>, ffprobe_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ffprobe_path: ffprobe_path.into(),
        }
    }
}

impl MediaOpener for FfmpegMediaOpener {
    fn open(&self, video_path: &Path) -> Result<OpenedMedia> {
        let probe = VideoProbe::run(&self.ffprobe_path, video_path)?;

        let total_frames = match probe.declared_frames {
            Some(n) => n,
            None => {
                info!("🔢 No frame count in container, pre-scanning {:?}", video_path);
                let mut scan =
                    FfmpegFrameSource::spawn(&self.ffmpeg_path, video_path, probe.width, probe.height)?;
                count_frames(&mut scan)?
            }
        };

        if total_frames == 0 {
            return Err(AnnotatorError::media_open(video_path, "video has no frames"));
        }

        let source = FfmpegFrameSource::spawn(&self.ffmpeg_path, video_path, probe.width, probe.height)?;
        info!(
            "🎬 Opened {:?}: {}x{}, {} frames @ {:.2} fps",
            video_path, probe.width, probe.height, total_frames, probe.fps
        );
        Ok(OpenedMedia {
            source: Box::new(source),
            total_frames,
        })
    }
}

/// 生成纯色帧的帧源，每帧颜色由帧号决定
#[derive(Debug, Clone)]
pub struct SyntheticFrameSource {
    width: u32,
    height: u32,
    total: u32,
    decoded: u32,
}

impl SyntheticFrameSource {
    pub fn new(total: u32, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            total,
            decoded: 0,
        }
    }

    /// 已解码次数
    pub fn decoded(&self) -> u32 {
        self.decoded
    }

    pub fn fill_for(frame_number: u32) -> [u8; 4] {
        [(frame_number % 256) as u8, (frame_number / 256 % 256) as u8, 0, 255]
    }
}

impl FrameSource for SyntheticFrameSource {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.decoded >= self.total {
            return Ok(None);
        }
        self.decoded += 1;
        Ok(Some(Frame::solid(
            self.width,
            self.height,
            Self::fill_for(self.decoded),
            self.decoded,
        )))
    }
}

/// 按路径返回合成视频，未登记的路径视为打开失败
#[derive(Debug, Default)]
pub struct SyntheticMediaOpener {
    videos: HashMap<PathBuf, u32>,
}

impl SyntheticMediaOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_video(mut self, path: impl Into<PathBuf>, total_frames: u32) -> Self {
        self.videos.insert(path.into(), total_frames);
        self
    }
}

impl MediaOpener for SyntheticMediaOpener {
    fn open(&self, video_path: &Path) -> Result<OpenedMedia> {
        match self.videos.get(video_path) {
            Some(&total) if total > 0 => Ok(OpenedMedia {
                source: Box::new(SyntheticFrameSource::new(total, 32, 24)),
                total_frames: total,
            }),
            Some(_) => Err(AnnotatorError::media_open(video_path, "video has no frames")),
            None => {
                warn!("synthetic media not registered: {:?}", video_path);
                Err(AnnotatorError::media_open(video_path, "file not found"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_source_is_sequential() {
        let mut source = SyntheticFrameSource::new(3, 8, 8);

        let first = source.next_frame().unwrap().unwrap();
        let second = source.next_frame().unwrap().unwrap();
        assert_eq!(first.frame_number(), 1);
        assert_eq!(second.frame_number(), 2);
        assert_eq!(&second.data()[..4], &SyntheticFrameSource::fill_for(2));

        assert!(source.next_frame().unwrap().is_some());
        assert!(source.next_frame().unwrap().is_none());
        assert!(source.next_frame().unwrap().is_none());
        assert_eq!(source.decoded(), 3);
    }

    #[test]
    fn test_count_frames_drains_source() {
        let mut source = SyntheticFrameSource::new(42, 4, 4);
        assert_eq!(count_frames(&mut source).unwrap(), 42);
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_boxed_source_delegates() {
        let mut source: Box<dyn FrameSource> = Box::new(SyntheticFrameSource::new(2, 6, 4));
        assert_eq!(source.dimensions(), (6, 4));
        assert_eq!(count_frames(&mut source).unwrap(), 2);
    }

    #[test]
    fn test_synthetic_opener() {
        let opener = SyntheticMediaOpener::new()
            .with_video("/videos/a.avi", 10)
            .with_video("/videos/empty.avi", 0);

        let media = opener.open(Path::new("/videos/a.avi")).unwrap();
        assert_eq!(media.total_frames, 10);

        assert!(matches!(
            opener.open(Path::new("/videos/empty.avi")),
            Err(e) if e.is_recoverable()
        ));
        assert!(matches!(
            opener.open(Path::new("/videos/b.avi")),
            Err(e) if e.is_recoverable()
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_decoder_failing_before_first_frame_is_media_error() {
        // `false` 忽略参数、不输出任何帧并以非零状态退出
        let mut source = FfmpegFrameSource::spawn("false", Path::new("/videos/corrupt.avi"), 4, 4)
            .unwrap();
        match source.next_frame() {
            Err(AnnotatorError::MediaOpen { path, .. }) => {
                assert_eq!(path, PathBuf::from("/videos/corrupt.avi"));
            }
            other => panic!("expected media error, got {:?}", other.map(|f| f.is_some())),
        }
        assert!(source.next_frame().unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_pre_scan_of_undecodable_video_is_recoverable() {
        let mut source = FfmpegFrameSource::spawn("false", Path::new("corrupt.avi"), 4, 4).unwrap();
        assert!(matches!(count_frames(&mut source), Err(e) if e.is_recoverable()));
    }

    #[test]
    fn test_ffmpeg_opener_missing_file() {
        let opener = FfmpegMediaOpener::new("ffmpeg", "ffprobe");
        let result = opener.open(Path::new("/nonexistent/video.avi"));
        assert!(matches!(result, Err(AnnotatorError::MediaOpen { .. })));
    }
}
