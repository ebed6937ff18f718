//! minifb 窗口：显示叠加后的帧并采集按键

use std::time::{Duration, Instant};

use image::RgbaImage;
use log::debug;
use minifb::{Key, KeyRepeat, Window, WindowOptions};

use crate::core::error::{AnnotatorError, Result};
use crate::core::session::{DisplayFactory, DisplaySurface, InputEvent, KEY_ESCAPE, KEY_SPACE};
use crate::core::video::rgba_to_argb_u32;

/// 两次键盘轮询之间的休眠
const POLL_STEP: Duration = Duration::from_millis(2);

/// minifb 按键 → 键码（字母取小写 ASCII）
pub fn key_code(key: Key) -> Option<u32> {
    let code = match key {
        Key::Space => KEY_SPACE,
        Key::Escape => KEY_ESCAPE,
        Key::Period => '.' as u32,
        Key::C => 'c' as u32,
        Key::E => 'e' as u32,
        Key::F => 'f' as u32,
        Key::H => 'h' as u32,
        Key::J => 'j' as u32,
        Key::M => 'm' as u32,
        Key::N => 'n' as u32,
        Key::Q => 'q' as u32,
        Key::S => 's' as u32,
        Key::X => 'x' as u32,
        _ => return None,
    };
    Some(code)
}

pub struct MinifbDisplay {
    window: Window,
    buffer: Vec<u32>,
    width: usize,
    height: usize,
}

impl MinifbDisplay {
    pub fn open(title: &str, width: u32, height: u32) -> Result<Self> {
        let (width, height) = (width.max(1) as usize, height.max(1) as usize);
        let mut window = Window::new(title, width, height, WindowOptions::default())
            .map_err(|e| AnnotatorError::Display(e.to_string()))?;
        // 节奏由会话的输入等待控制
        window.limit_update_rate(None);
        debug!("window {:?} opened at {}x{}", title, width, height);
        Ok(Self {
            window,
            buffer: vec![0; width * height],
            width,
            height,
        })
    }
}

impl DisplaySurface for MinifbDisplay {
    fn present(&mut self, image: &RgbaImage) -> Result<()> {
        let (w, h) = image.dimensions();
        self.width = w as usize;
        self.height = h as usize;
        rgba_to_argb_u32(image.as_raw(), &mut self.buffer);
        self.window
            .update_with_buffer(&self.buffer, self.width, self.height)
            .map_err(|e| AnnotatorError::Display(e.to_string()))
    }

    fn poll_event(&mut self, wait: Duration) -> Result<Option<InputEvent>> {
        let deadline = Instant::now() + wait;
        loop {
            if !self.window.is_open() {
                return Ok(Some(InputEvent::Quit));
            }

            let event = self
                .window
                .get_keys_pressed(KeyRepeat::Yes)
                .into_iter()
                .filter_map(key_code)
                .find_map(InputEvent::from_key_code);
            if event.is_some() {
                return Ok(event);
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            std::thread::sleep(POLL_STEP.min(deadline - now));
            self.window.update();
        }
    }
}

#[derive(Debug, Default)]
pub struct MinifbDisplayFactory;

impl DisplayFactory for MinifbDisplayFactory {
    fn open(&mut self, title: &str, width: u32, height: u32) -> Result<Box<dyn DisplaySurface>> {
        Ok(Box::new(MinifbDisplay::open(title, width, height)?))
    }
}
