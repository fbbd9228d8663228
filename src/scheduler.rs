use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc::Receiver,
    Arc,
};

use eyre::{eyre, Result};
use log::{info, trace, warn};

use crate::config::SimConfig;
use crate::decoder::Decoder;
use crate::device::{SignalSource, Signals};
use crate::frame::FrameExchange;

const PROGRESS_INTERVAL: u64 = 10_000_000;

#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct RunSummary {
    /// Driving clock cycles after reset release.
    pub cycles: u64,
    /// Cycles whose outputs went through the decoder.
    pub decoded_cycles: u64,
    pub frames: u64,
    pub pixels_written: u64,
    /// Horizontal sync pulses seen by the decoder.
    pub sync_lines: u64,
    pub sync_drifts: u64,
}

/// Raises the stop flag when dropped, including while unwinding from a panic.
pub struct StopOnExit(pub Arc<AtomicBool>);

impl Drop for StopOnExit {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// Clocks the device and feeds its video port into the decoder.
pub struct Scheduler<S: SignalSource> {
    device: S,
    decoder: Decoder,
    config: SimConfig,
    stop: Arc<AtomicBool>,
    cycles: u64,
    decoded_cycles: u64,
    skip_counter: u32,
}

impl<S: SignalSource> Scheduler<S> {
    pub fn new(
        device: S,
        config: SimConfig,
        exchange: Arc<FrameExchange>,
        stop: Arc<AtomicBool>,
    ) -> Result<Self> {
        config.validate()?;
        info!(
            "Raster {}x{} of {}x{}, {} pixel clocks per frame",
            config.timing.active_width,
            config.timing.active_height,
            config.timing.total_width,
            config.timing.total_height,
            config.timing.frame_len()
        );
        if config.decimation > 1 {
            warn!(
                "Decoding 1 of every {} cycles: raster position will not track the device",
                config.decimation
            );
        }
        Ok(Self {
            device,
            decoder: Decoder::new(config.timing, config.clock_divisor, exchange),
            config,
            stop,
            cycles: 0,
            decoded_cycles: 0,
            skip_counter: 0,
        })
    }

    /// One full driving clock cycle, low then high.
    fn clock_cycle(&mut self) -> Signals {
        self.device.set_clock(false);
        self.device.step();
        self.device.set_clock(true);
        self.device.step();
        self.device.signals()
    }

    /// Hold reset for the configured number of cycles. Port outputs seen meanwhile are
    /// dropped.
    pub fn reset(&mut self) {
        self.device.set_reset(true);
        for _ in 0..self.config.reset_cycles {
            self.clock_cycle();
        }
        self.device.set_reset(false);

        self.decoder.reset();
        self.cycles = 0;
        self.decoded_cycles = 0;
        self.skip_counter = 0;
        info!("Reset released after {} cycles", self.config.reset_cycles);
    }

    /// Run one cycle, returns true if a frame got published.
    pub fn tick(&mut self) -> bool {
        let signals = self.clock_cycle();
        self.cycles += 1;

        if self.cycles % PROGRESS_INTERVAL == 0 {
            info!(
                "Simulation at {} cycles, {} frames",
                self.cycles,
                self.decoder.frames()
            );
        }

        self.skip_counter += 1;
        if self.skip_counter < self.config.decimation {
            return false;
        }
        self.skip_counter = 0;
        self.decoded_cycles += 1;

        let published = self.decoder.clock(signals);
        if published {
            if let Some(probe) = self.device.probe() {
                trace!(
                    "Frame {}: ball at {:?}, paddle at {:?}, frame start {}",
                    self.decoder.frames(),
                    probe.ball,
                    probe.paddle,
                    probe.frame_start
                );
            }
        }
        published
    }

    fn should_stop(&self) -> bool {
        if self.stop.load(Ordering::Relaxed) || self.device.finished() {
            return true;
        }
        match self.config.frame_limit {
            Some(limit) => self.decoder.frames() >= limit,
            None => false,
        }
    }

    /// Wait for the display to come up, then simulate until stopped.
    pub fn run(&mut self, ready: Receiver<()>) -> Result<RunSummary> {
        ready
            .recv()
            .map_err(|_| eyre!("Display closed before it was ready"))?;

        info!("Simulation started");
        self.reset();

        while !self.should_stop() {
            self.tick();
        }
        self.stop.store(true, Ordering::Relaxed);

        let summary = self.summary();
        info!(
            "Simulation done after {} cycles, {} frames ({} sync drifts), raster at {:?}",
            summary.cycles,
            summary.frames,
            summary.sync_drifts,
            self.decoder.position()
        );
        Ok(summary)
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            cycles: self.cycles,
            decoded_cycles: self.decoded_cycles,
            frames: self.decoder.frames(),
            pixels_written: self.decoder.pixels_written(),
            sync_lines: self.decoder.sync_lines(),
            sync_drifts: self.decoder.sync_drifts(),
        }
    }

    #[cfg(test)]
    pub fn device(&self) -> &S {
        &self.device
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Timing;
    use crate::decoder::color::{ColorWord, Pixel};
    use crate::device::pong::PongDevice;
    use crate::frame::FrameReader;
    use std::sync::mpsc;

    /// Outputs a fixed colour once out of reset and stops after a set number of cycles.
    struct SolidDevice {
        clock: bool,
        prev_clock: bool,
        reset: bool,
        color: ColorWord,
        rising_edges: u64,
        reset_edges: u64,
        limit: u64,
        signals: Signals,
    }

    impl SolidDevice {
        fn new(color: u16, limit: u64) -> Self {
            Self {
                clock: false,
                prev_clock: false,
                reset: false,
                color: ColorWord(color),
                rising_edges: 0,
                reset_edges: 0,
                limit,
                signals: Signals {
                    h_sync: true,
                    v_sync: true,
                    color: ColorWord::BLACK,
                },
            }
        }
    }

    impl SignalSource for SolidDevice {
        fn set_clock(&mut self, level: bool) {
            self.clock = level;
        }

        fn set_reset(&mut self, level: bool) {
            self.reset = level;
        }

        fn step(&mut self) {
            let rising = self.clock && !self.prev_clock;
            self.prev_clock = self.clock;
            if !rising {
                return;
            }
            if self.reset {
                self.reset_edges += 1;
                self.signals.color = ColorWord::WHITE;
            } else {
                self.rising_edges += 1;
                self.signals.color = self.color;
            }
        }

        fn signals(&self) -> Signals {
            self.signals
        }

        fn finished(&self) -> bool {
            self.rising_edges >= self.limit
        }
    }

    fn ready() -> Receiver<()> {
        let (tx, rx) = mpsc::channel();
        tx.send(()).unwrap();
        rx
    }

    fn scheduler<S: SignalSource>(
        device: S,
        config: SimConfig,
    ) -> (Scheduler<S>, FrameReader, Arc<AtomicBool>) {
        let timing = config.timing;
        let exchange = FrameExchange::new(timing.active_width, timing.active_height);
        let stop = Arc::new(AtomicBool::new(false));
        let scheduler = Scheduler::new(device, config, exchange.clone(), stop.clone()).unwrap();
        (scheduler, FrameReader::new(exchange), stop)
    }

    #[test]
    fn test_reset_window_not_decoded() {
        let config = SimConfig {
            reset_cycles: 25,
            ..SimConfig::default()
        };
        let (mut scheduler, mut reader, _) = scheduler(SolidDevice::new(0x000, u64::MAX), config);
        scheduler.reset();
        assert_eq!(scheduler.device().reset_edges, 25);
        assert_eq!(scheduler.summary().pixels_written, 0);

        for _ in 0..2 * Timing::VGA_640X480.frame_len() {
            scheduler.tick();
        }
        let frame = reader.poll().unwrap();
        assert!(frame.pixels().iter().all(|p| *p == Pixel::BLACK));
    }

    #[test]
    fn test_runs_until_device_finishes() {
        let frame = 2 * Timing::VGA_640X480.frame_len();
        let (mut scheduler, mut reader, stop) =
            scheduler(SolidDevice::new(0xF0F, frame), SimConfig::default());

        let summary = scheduler.run(ready()).unwrap();
        assert_eq!(summary.cycles, frame);
        assert_eq!(summary.frames, 1);
        assert_eq!(summary.pixels_written, 640 * 480);
        assert!(stop.load(Ordering::Relaxed));

        let published = reader.poll().unwrap();
        let magenta = Pixel::new(1.0, 0.0, 1.0);
        assert!(published.pixels().iter().all(|p| *p == magenta));
    }

    #[test]
    fn test_frame_limit() {
        let config = SimConfig {
            frame_limit: Some(2),
            ..SimConfig::default()
        };
        let (mut scheduler, _, _) = scheduler(SolidDevice::new(0x00F, u64::MAX), config);
        let summary = scheduler.run(ready()).unwrap();
        assert_eq!(summary.frames, 2);
        assert_eq!(summary.cycles, 4 * Timing::VGA_640X480.frame_len());
    }

    #[test]
    fn test_stop_flag() {
        let (mut scheduler, _, stop) =
            scheduler(SolidDevice::new(0x00F, u64::MAX), SimConfig::default());
        stop.store(true, Ordering::Relaxed);
        let summary = scheduler.run(ready()).unwrap();
        assert_eq!(summary.cycles, 0);
    }

    #[test]
    fn test_waits_for_ready() {
        let (mut scheduler, _, _) =
            scheduler(SolidDevice::new(0x00F, 10), SimConfig::default());
        let (tx, rx) = mpsc::channel();
        let handle = std::thread::spawn(move || scheduler.run(rx).map(|s| s.cycles));
        tx.send(()).unwrap();
        assert_eq!(handle.join().unwrap().unwrap(), 10);
    }

    #[test]
    fn test_panicking_simulation_raises_stop() {
        let stop = Arc::new(AtomicBool::new(false));
        let guard = StopOnExit(stop.clone());
        let handle = std::thread::spawn(move || {
            let _guard = guard;
            panic!("simulation failed");
        });
        assert!(handle.join().is_err());
        assert!(stop.load(Ordering::Relaxed));
    }

    #[test]
    fn test_display_gone_before_ready() {
        let (mut scheduler, _, _) =
            scheduler(SolidDevice::new(0x00F, 10), SimConfig::default());
        let (tx, rx) = mpsc::channel::<()>();
        drop(tx);
        assert!(scheduler.run(rx).is_err());
        assert_eq!(scheduler.device().reset_edges, 0);
    }

    #[test]
    fn test_decimation() {
        let config = SimConfig {
            decimation: 8,
            ..SimConfig::default()
        };
        let (mut scheduler, _, _) = scheduler(SolidDevice::new(0x00F, 800), config);
        let summary = scheduler.run(ready()).unwrap();
        assert_eq!(summary.cycles, 800);
        assert_eq!(summary.decoded_cycles, 100);
        assert_eq!(summary.pixels_written, 50);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SimConfig {
            decimation: 0,
            ..SimConfig::default()
        };
        let exchange = FrameExchange::new(640, 480);
        let stop = Arc::new(AtomicBool::new(false));
        assert!(Scheduler::new(SolidDevice::new(0, 1), config, exchange, stop).is_err());
    }

    #[test]
    fn test_pong_frame() {
        let config = SimConfig {
            frame_limit: Some(1),
            ..SimConfig::default()
        };
        let (mut scheduler, mut reader, _) =
            scheduler(PongDevice::new(Timing::VGA_640X480, 0), config);
        let summary = scheduler.run(ready()).unwrap();
        assert_eq!(summary.frames, 1);
        assert_eq!(summary.sync_lines, 525);
        assert_eq!(summary.sync_drifts, 0);

        let frame = reader.poll().unwrap();
        let white = Pixel::new(1.0, 1.0, 1.0);
        let green = Pixel::new(0.0, 1.0, 0.0);
        assert_eq!(frame.pixel(320, 240), white);
        assert_eq!(frame.pixel(327, 247), white);
        assert_ne!(frame.pixel(328, 248), white);
        assert_eq!(frame.pixel(0, 240), green);
        assert_eq!(frame.pixel(7, 208), green);
    }

    #[test]
    fn test_pong_stays_in_sync() {
        let config = SimConfig {
            frame_limit: Some(3),
            ..SimConfig::default()
        };
        let (mut scheduler, _, _) = scheduler(PongDevice::new(Timing::VGA_640X480, 1), config);
        assert_eq!(scheduler.run(ready()).unwrap().sync_drifts, 0);
    }

    #[test]
    fn test_decimated_pong_drifts() {
        let config = SimConfig {
            decimation: 3,
            frame_limit: Some(1),
            ..SimConfig::default()
        };
        let (mut scheduler, _, _) = scheduler(PongDevice::new(Timing::VGA_640X480, 1), config);
        assert!(scheduler.run(ready()).unwrap().sync_drifts > 0);
    }
}
