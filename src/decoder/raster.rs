use crate::config::Timing;

#[derive(Copy, Clone, Default, PartialEq, Eq, Debug)]
pub struct RasterPosition {
    pub h: usize,
    pub v: usize,
}

impl RasterPosition {
    pub const ORIGIN: Self = Self::new(0, 0);

    pub const fn new(h: usize, v: usize) -> Self {
        Self { h, v }
    }
}

impl Timing {
    /// Visible part of the raster, porches and sync excluded.
    pub const fn is_active(&self, pos: RasterPosition) -> bool {
        pos.h < self.active_width && pos.v < self.active_height
    }
}

/// Horizontal and vertical raster counters, advanced once per pixel clock edge.
pub struct RasterTracker {
    total_width: usize,
    total_height: usize,
    pos: RasterPosition,
}

impl RasterTracker {
    pub fn new(timing: &Timing) -> Self {
        Self {
            total_width: timing.total_width,
            total_height: timing.total_height,
            pos: RasterPosition::ORIGIN,
        }
    }

    /// Returns the new position and whether the vertical counter wrapped.
    pub fn advance(&mut self) -> (RasterPosition, bool) {
        let mut wrapped = false;
        self.pos.h += 1;
        if self.pos.h >= self.total_width {
            self.pos.h = 0;
            self.pos.v += 1;
            if self.pos.v >= self.total_height {
                self.pos.v = 0;
                wrapped = true;
            }
        }
        (self.pos, wrapped)
    }

    pub fn position(&self) -> RasterPosition {
        self.pos
    }

    pub fn reset(&mut self) {
        self.pos = RasterPosition::ORIGIN;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn advance_n(tracker: &mut RasterTracker, n: u64) -> u64 {
        let mut wraps = 0;
        for _ in 0..n {
            if tracker.advance().1 {
                wraps += 1;
            }
        }
        wraps
    }

    #[test]
    fn test_mixed_radix_position() {
        let timing = Timing::VGA_640X480;
        for n in [0u64, 1, 639, 640, 799, 800, 801, 419_999, 420_000, 420_001, 1_234_567] {
            let mut tracker = RasterTracker::new(&timing);
            advance_n(&mut tracker, n);
            let expected = RasterPosition::new(
                (n % 800) as usize,
                ((n / 800) % 525) as usize,
            );
            assert_eq!(tracker.position(), expected, "after {} edges", n);
        }
    }

    #[test]
    fn test_wrap_once_per_frame() {
        let timing = Timing::VGA_640X480;
        let mut tracker = RasterTracker::new(&timing);
        assert_eq!(advance_n(&mut tracker, timing.frame_len() - 1), 0);
        assert_eq!(tracker.position(), RasterPosition::new(799, 524));
        let (pos, wrapped) = tracker.advance();
        assert!(wrapped);
        assert_eq!(pos, RasterPosition::ORIGIN);
        assert_eq!(advance_n(&mut tracker, 3 * timing.frame_len()), 3);
    }

    #[test]
    fn test_line_wrap_is_not_frame_wrap() {
        let mut tracker = RasterTracker::new(&Timing::VGA_640X480);
        advance_n(&mut tracker, 799);
        let (pos, wrapped) = tracker.advance();
        assert_eq!(pos, RasterPosition::new(0, 1));
        assert!(!wrapped);
    }

    #[test]
    fn test_active_area() {
        let timing = Timing::VGA_640X480;
        assert!(timing.is_active(RasterPosition::new(0, 0)));
        assert!(timing.is_active(RasterPosition::new(639, 479)));
        assert!(!timing.is_active(RasterPosition::new(640, 0)));
        assert!(!timing.is_active(RasterPosition::new(0, 480)));
        assert!(!timing.is_active(RasterPosition::new(799, 524)));

        for v in (0..525).step_by(7) {
            for h in (0..800).step_by(3) {
                assert_eq!(
                    timing.is_active(RasterPosition::new(h, v)),
                    h < 640 && v < 480
                );
            }
        }
    }
}
