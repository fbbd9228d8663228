use crate::frame::Frame;

/// Converts decoded frames into RGB24 texture data.
pub struct Renderer {
    texture: Vec<u8>,
}

fn channel_byte(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            texture: Vec::new(),
        }
    }

    pub fn render_texture(&mut self, frame: &Frame) -> &[u8] {
        self.texture.clear();
        self.texture.reserve(frame.pixels().len() * 3);
        for pixel in frame.pixels() {
            self.texture.push(channel_byte(pixel.r));
            self.texture.push(channel_byte(pixel.g));
            self.texture.push(channel_byte(pixel.b));
        }
        &self.texture
    }
}
