use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, PoisonError,
};

use crate::decoder::color::Pixel;

#[derive(Clone, PartialEq, Debug)]
pub struct Frame {
    width: usize,
    height: usize,
    pixels: Vec<Pixel>,
}

impl Frame {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Pixel::BLACK; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[cfg(test)]
    pub fn pixel(&self, x: usize, y: usize) -> Pixel {
        assert!(x < self.width && y < self.height, "({}, {}) outside frame", x, y);
        self.pixels[y * self.width + x]
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, pixel: Pixel) {
        assert!(x < self.width && y < self.height, "({}, {}) outside frame", x, y);
        self.pixels[y * self.width + x] = pixel;
    }

    /// Pixels in row-major order.
    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    pub fn clear(&mut self) {
        self.pixels.fill(Pixel::BLACK);
    }
}

/// Slot holding the most recently completed frame.
///
/// A published frame is never written again; the lock only guards the pointer swap.
pub struct FrameExchange {
    latest: Mutex<Arc<Frame>>,
    generation: AtomicU64,
}

impl FrameExchange {
    pub fn new(width: usize, height: usize) -> Arc<Self> {
        Arc::new(Self {
            latest: Mutex::new(Arc::new(Frame::new(width, height))),
            generation: AtomicU64::new(0),
        })
    }

    fn swap(&self, frame: Arc<Frame>) -> Arc<Frame> {
        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = std::mem::replace(&mut *latest, frame);
        self.generation.fetch_add(1, Ordering::Release);
        previous
    }

    pub fn latest(&self) -> Arc<Frame> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of frames published so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

/// Exclusive owner of the frame currently being filled.
pub struct FrameWriter {
    target: Frame,
    spare: Option<Frame>,
    exchange: Arc<FrameExchange>,
}

impl FrameWriter {
    pub fn new(exchange: Arc<FrameExchange>, width: usize, height: usize) -> Self {
        Self {
            target: Frame::new(width, height),
            spare: None,
            exchange,
        }
    }

    pub fn write(&mut self, x: usize, y: usize, pixel: Pixel) {
        self.target.set_pixel(x, y, pixel);
    }

    #[cfg(test)]
    pub fn target(&self) -> &Frame {
        &self.target
    }

    /// Hand the filled frame over to readers and start a blank one.
    pub fn publish(&mut self) {
        let next = match self.spare.take() {
            Some(frame) => frame,
            None => Frame::new(self.target.width, self.target.height),
        };
        let done = std::mem::replace(&mut self.target, next);
        let previous = self.exchange.swap(Arc::new(done));

        // Reuse the old frame unless a reader is still holding on to it
        self.spare = Arc::try_unwrap(previous).ok().map(|mut frame| {
            frame.clear();
            frame
        });
    }

    /// Drop the partially written frame without publishing it.
    pub fn discard(&mut self) {
        self.target.clear();
    }
}

pub struct FrameReader {
    exchange: Arc<FrameExchange>,
    seen: u64,
}

impl FrameReader {
    pub fn new(exchange: Arc<FrameExchange>) -> Self {
        Self { exchange, seen: 0 }
    }

    pub fn latest(&self) -> Arc<Frame> {
        self.exchange.latest()
    }

    /// The latest frame, if one was published since the previous poll.
    pub fn poll(&mut self) -> Option<Arc<Frame>> {
        let generation = self.exchange.generation();
        if generation == self.seen {
            return None;
        }
        self.seen = generation;
        Some(self.exchange.latest())
    }
}
