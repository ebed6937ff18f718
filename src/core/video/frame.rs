use image::RgbaImage;

/// 解码后的单帧（RGBA），创建后不可变
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    width: u32,
    height: u32,
    data: Vec<u8>,
    frame_number: u32,
}

impl Frame {
    /// `frame_number` 从 1 开始
    pub fn new(width: u32, height: u32, data: Vec<u8>, frame_number: u32) -> Self {
        debug_assert_eq!(data.len(), (width * height * 4) as usize);
        Self {
            width,
            height,
            data,
            frame_number,
        }
    }

    /// 纯色帧，测试和占位用
    pub fn solid(width: u32, height: u32, rgba: [u8; 4], frame_number: u32) -> Self {
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take((width * height * 4) as usize)
            .collect();
        Self::new(width, height, data, frame_number)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn frame_number(&self) -> u32 {
        self.frame_number
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel_count(&self) -> usize {
        (self.width * self.height) as usize
    }

    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// 拷贝为可绘制的图像，原帧保持不变
    pub fn to_image(&self) -> RgbaImage {
        RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .unwrap_or_else(|| RgbaImage::new(self.width, self.height))
    }
}

/// RGBA 字节转 0xFFRRGGBB，供窗口缓冲区使用
pub fn rgba_to_argb_u32(src: &[u8], dst: &mut Vec<u32>) {
    dst.clear();
    dst.extend(src.chunks_exact(4).map(|px| {
        let r = px[0] as u32;
        let g = px[1] as u32;
        let b = px[2] as u32;
        (0xFF << 24) | (r << 16) | (g << 8) | b
    }));
}
