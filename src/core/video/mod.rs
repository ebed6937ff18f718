pub mod frame;
pub mod playhead;
pub mod probe;
pub mod rewind;
pub mod source;

pub use frame::{rgba_to_argb_u32, Frame};
pub use playhead::{Playhead, Step};
pub use probe::VideoProbe;
pub use rewind::RewindBuffer;
pub use source::{
    count_frames, FfmpegFrameSource, FfmpegMediaOpener, FrameSource, MediaOpener, OpenedMedia,
    SyntheticFrameSource, SyntheticMediaOpener,
};
