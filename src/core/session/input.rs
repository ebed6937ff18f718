//! 键盘输入映射

pub const KEY_SPACE: u32 = 32;
pub const KEY_ESCAPE: u32 = 27;

pub const KEYBOARD_MANUAL: &str = "
    The keyboard controls for the video annotation tool are:

    Space  - Play / Pause
    N      - Step backwards
    M      - Step forward
    .      - Annotate
    X      - Start point @ current frame
    C      - End point   @ current frame
    S      - Start point @ first frame
    F      - End point   @ last frame
    E      - Export selected segment to Animated GIF
    J      - Jump to next file
    H      - Show keyboard controls
    ESC, Q - Exit program
";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputEvent {
    TogglePlay,
    StepBackward,
    StepForward,
    Capture,
    MarkStartHere,
    MarkStartAtFirst,
    MarkEndHere,
    MarkEndAtLast,
    Export,
    Skip,
    Quit,
    ShowHelp,
}

impl InputEvent {
    /// 按键码（ASCII）转事件，未绑定的键返回 None
    pub fn from_key_code(code: u32) -> Option<Self> {
        match code {
            KEY_SPACE => Some(InputEvent::TogglePlay),
            KEY_ESCAPE => Some(InputEvent::Quit),
            _ => char::from_u32(code).and_then(Self::from_char),
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        let event = match c {
            ' ' => InputEvent::TogglePlay,
            'n' | 'N' => InputEvent::StepBackward,
            'm' | 'M' => InputEvent::StepForward,
            '.' => InputEvent::Capture,
            'x' | 'X' => InputEvent::MarkStartHere,
            's' | 'S' => InputEvent::MarkStartAtFirst,
            'c' | 'C' => InputEvent::MarkEndHere,
            'f' | 'F' => InputEvent::MarkEndAtLast,
            'e' | 'E' => InputEvent::Export,
            'j' | 'J' => InputEvent::Skip,
            'q' | 'Q' | '\u{1b}' => InputEvent::Quit,
            'h' | 'H' => InputEvent::ShowHelp,
            _ => return None,
        };
        Some(event)
    }
}
