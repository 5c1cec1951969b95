//! Frame representation
//!
//! RGBA pixel data plus the metadata the grid needs for display.

use std::time::Instant;

/// A captured or projected frame
#[derive(Debug, Clone)]
pub struct Frame {
    /// RGBA pixel data (4 bytes per pixel)
    pub data: Vec<u8>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Sequence number assigned by the producing session
    pub frame_number: u64,
    /// Capture timestamp
    pub timestamp: Instant,
}

impl Frame {
    /// Create a new RGBA frame
    pub fn new(data: Vec<u8>, width: u32, height: u32, frame_number: u64) -> Self {
        Self {
            data,
            width,
            height,
            frame_number,
            timestamp: Instant::now(),
        }
    }

    /// Create a frame filled with a single RGBA colour
    pub fn solid(width: u32, height: u32, rgba: [u8; 4], frame_number: u64) -> Self {
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take(Self::expected_size(width, height))
            .collect();
        Self::new(data, width, height, frame_number)
    }

    /// Expected data size for RGBA frame dimensions (width * height * 4)
    pub fn expected_size(width: u32, height: u32) -> usize {
        (width as usize) * (height as usize) * 4
    }

    /// Check that the pixel buffer matches the frame dimensions
    pub fn is_valid(&self) -> bool {
        self.data.len() == Self::expected_size(self.width, self.height)
    }

    /// Aspect ratio (width / height), 1.0 for degenerate frames
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    /// Height a frame scaled to `width` would have, keeping aspect ratio
    pub fn scaled_height(&self, width: u32) -> u32 {
        ((width as f32) / self.aspect_ratio()).round().max(1.0) as u32
    }

    /// Nearest-neighbour downscale, used for preview and tile display
    pub fn downscale(&self, target_width: u32, target_height: u32) -> Frame {
        if self.width == target_width && self.height == target_height {
            return self.clone();
        }

        let mut output = vec![0u8; Self::expected_size(target_width, target_height)];
        let x_ratio = self.width as f32 / target_width.max(1) as f32;
        let y_ratio = self.height as f32 / target_height.max(1) as f32;

        for y in 0..target_height {
            for x in 0..target_width {
                let src_x = (x as f32 * x_ratio) as u32;
                let src_y = (y as f32 * y_ratio) as u32;
                let src_idx = ((src_y * self.width + src_x) * 4) as usize;
                let dst_idx = ((y * target_width + x) * 4) as usize;

                if src_idx + 3 < self.data.len() && dst_idx + 3 < output.len() {
                    output[dst_idx..dst_idx + 4].copy_from_slice(&self.data[src_idx..src_idx + 4]);
                }
            }
        }

        Frame {
            data: output,
            width: target_width,
            height: target_height,
            frame_number: self.frame_number,
            timestamp: self.timestamp,
        }
    }

    /// Downscale to a display width, keeping aspect ratio
    pub fn fit_width(&self, width: u32) -> Frame {
        self.downscale(width, self.scaled_height(width))
    }
}
