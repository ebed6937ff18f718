//! 交互式帧浏览 + 片段采集会话

pub mod display;
pub mod input;
pub mod marks;
pub mod state_machine;

pub use display::{DisplayFactory, DisplaySurface, ScriptedDisplay, ScriptedDisplayFactory};
pub use input::{InputEvent, KEYBOARD_MANUAL, KEY_ESCAPE, KEY_SPACE};
pub use marks::SegmentMarks;
pub use state_machine::{
    captured_frame_name, CaptureOutcome, CaptureSession, CaptureState, SessionRequest,
    SessionResult,
};
