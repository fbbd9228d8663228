pub mod clock;
pub mod color;
pub mod raster;
mod sync;

use std::sync::Arc;

use log::debug;

use crate::config::Timing;
use crate::device::Signals;
use crate::frame::{FrameExchange, FrameWriter};
use clock::ClockDivider;
use raster::{RasterPosition, RasterTracker};
use sync::SyncMonitor;

/// Turns the sampled video port into frames.
pub struct Decoder {
    timing: Timing,
    divider: ClockDivider,
    raster: RasterTracker,
    monitor: SyncMonitor,
    writer: FrameWriter,
    pixels_written: u64,
    frames: u64,
}

impl Decoder {
    pub fn new(timing: Timing, clock_divisor: u32, exchange: Arc<FrameExchange>) -> Self {
        Self {
            timing,
            divider: ClockDivider::new(clock_divisor),
            raster: RasterTracker::new(&timing),
            monitor: SyncMonitor::new(),
            writer: FrameWriter::new(exchange, timing.active_width, timing.active_height),
            pixels_written: 0,
            frames: 0,
        }
    }

    /// Feed the port state after one driving clock cycle. Returns true when a frame was
    /// completed and published.
    pub fn clock(&mut self, signals: Signals) -> bool {
        if !self.divider.step() {
            return false;
        }

        let (pos, wrapped) = self.raster.advance();
        self.monitor.observe(signals.h_sync, signals.v_sync, pos);

        if self.timing.is_active(pos) {
            self.writer.write(pos.h, pos.v, signals.color.decode());
            self.pixels_written += 1;
        }

        if wrapped {
            self.writer.publish();
            self.frames += 1;
            debug!("Frame {} published", self.frames);
        }
        wrapped
    }

    pub fn reset(&mut self) {
        self.divider.reset();
        self.raster.reset();
        self.monitor.reset();
        self.writer.discard();
    }

    pub fn position(&self) -> RasterPosition {
        self.raster.position()
    }

    pub fn pixels_written(&self) -> u64 {
        self.pixels_written
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn sync_drifts(&self) -> u64 {
        self.monitor.drifts()
    }

    pub fn sync_lines(&self) -> u64 {
        self.monitor.lines()
    }
}
