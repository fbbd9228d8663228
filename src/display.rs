use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc::Sender,
};
use std::thread;
use std::time::{Duration, Instant};

use eyre::Result;
use log::{info, warn};
use sdl2::{
    event::Event,
    keyboard::Keycode,
    pixels::PixelFormatEnum,
    render::{Canvas, TextureCreator},
    video::{Window, WindowContext},
    EventPump, Sdl,
};

use crate::frame::{Frame, FrameReader};
use crate::macros::fw_error;
use crate::renderer::Renderer;

const FRAME_INTERVAL: Duration = Duration::from_nanos(16_666_666);

/// SDL window showing the most recently published frame.
pub struct Display {
    _sdl: Sdl,
    event_pump: EventPump,
    canvas: Canvas<Window>,
    tex_creator: TextureCreator<WindowContext>,
    renderer: Renderer,
    next_render_time: Instant,
}

impl Display {
    pub fn new(width: usize, height: usize) -> Result<Self> {
        let sdl = fw_error!(sdl2::init());
        let video = fw_error!(sdl.video());
        let window = video
            .window("VGA Simulation", width as u32, height as u32)
            .position_centered()
            .build()?;
        let canvas = window.into_canvas().present_vsync().build()?;
        let tex_creator = canvas.texture_creator();
        let event_pump = fw_error!(sdl.event_pump());

        Ok(Self {
            _sdl: sdl,
            event_pump,
            canvas,
            tex_creator,
            renderer: Renderer::new(),
            next_render_time: Instant::now(),
        })
    }

    /// Returns false once the window should close.
    fn handle_input(&mut self) -> bool {
        for event in self.event_pump.poll_iter() {
            match event {
                Event::KeyDown {
                    keycode: Some(Keycode::Escape),
                    ..
                }
                | Event::Quit { .. } => return false,
                _ => { /* do nothing */ }
            }
        }
        true
    }

    fn render_screen(&mut self, frame: &Frame) -> Result<()> {
        let mut texture = self.tex_creator.create_texture_static(
            PixelFormatEnum::RGB24,
            frame.width() as u32,
            frame.height() as u32,
        )?;
        let data = self.renderer.render_texture(frame);
        texture.update(None, data, frame.width() * 3)?;

        self.canvas.clear();
        fw_error!(self.canvas.copy(&texture, None, None));
        self.canvas.present();
        Ok(())
    }

    fn wait_next_frame(&mut self) {
        let now = Instant::now();
        if now < self.next_render_time {
            thread::sleep(self.next_render_time - now);
        }
        self.next_render_time = Instant::now() + FRAME_INTERVAL;
    }

    /// Show frames until the window is closed or `stop` is raised elsewhere.
    pub fn run(
        &mut self,
        mut reader: FrameReader,
        ready: Sender<()>,
        stop: &AtomicBool,
    ) -> Result<()> {
        self.render_screen(&reader.latest())?;
        if ready.send(()).is_err() {
            warn!("Simulation exited before the display was ready");
        }

        while !stop.load(Ordering::Relaxed) {
            if !self.handle_input() {
                info!("Display closed");
                stop.store(true, Ordering::Relaxed);
                break;
            }
            if let Some(frame) = reader.poll() {
                self.render_screen(&frame)?;
            }
            self.wait_next_frame();
        }
        Ok(())
    }
}
