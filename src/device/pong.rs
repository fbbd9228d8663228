use rand::{rngs::StdRng, Rng, SeedableRng};

use super::{Probe, SignalSource, Signals};
use crate::config::Timing;
use crate::decoder::color::ColorWord;

const BALL_SIZE: usize = 8;
const BALL_START: (usize, usize) = (320, 240);
const PADDLE_WIDTH: usize = 8;
const PADDLE_HEIGHT: usize = 64;
const NET_WIDTH: usize = 4;
const NET_DASH: usize = 16;

const BACKGROUND: ColorWord = ColorWord(0x001);
const NET: ColorWord = ColorWord(0x888);
const PADDLE: ColorWord = ColorWord(0x0F0);
const BALL: ColorWord = ColorWord::WHITE;

struct Ball {
    x: isize,
    y: isize,
    dx: isize,
    dy: isize,
}

/// Software stand-in for a pong design with a VGA port.
///
/// The driving clock is divided by two internally and the raster counters advance on
/// every other rising edge. Game state moves once per frame.
pub struct PongDevice {
    timing: Timing,

    clock: bool,
    prev_clock: bool,
    reset: bool,
    divider: bool,

    h: usize,
    v: usize,
    frame_start: bool,

    ball: Ball,
    start_velocity: (isize, isize),
    paddle_y: usize,

    signals: Signals,
}

impl PongDevice {
    pub fn new(timing: Timing, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let dx = if rng.gen::<bool>() { 2 } else { -2 };
        let dy = rng.gen_range(1..=3) * if rng.gen::<bool>() { 1 } else { -1 };

        let mut device = Self {
            timing,
            clock: false,
            prev_clock: false,
            reset: false,
            divider: false,
            h: 0,
            v: 0,
            frame_start: false,
            ball: Ball {
                x: 0,
                y: 0,
                dx: 0,
                dy: 0,
            },
            start_velocity: (dx, dy),
            paddle_y: 0,
            signals: Signals {
                h_sync: true,
                v_sync: true,
                color: BACKGROUND,
            },
        };
        device.restart();
        device
    }

    fn restart(&mut self) {
        self.divider = false;
        self.h = 0;
        self.v = 0;
        self.frame_start = false;
        self.ball = Ball {
            x: BALL_START.0 as isize,
            y: BALL_START.1 as isize,
            dx: self.start_velocity.0,
            dy: self.start_velocity.1,
        };
        self.paddle_y = BALL_START.1;
    }

    fn pixel_tick(&mut self) {
        self.h += 1;
        if self.h >= self.timing.total_width {
            self.h = 0;
            self.v += 1;
            if self.v >= self.timing.total_height {
                self.v = 0;
            }
        }

        self.frame_start = self.h == 0 && self.v == 0;
        if self.frame_start {
            self.move_objects();
        }
    }

    fn move_objects(&mut self) {
        let width = self.timing.active_width as isize;
        let height = self.timing.active_height as isize;
        let size = BALL_SIZE as isize;
        let ball = &mut self.ball;

        ball.x += ball.dx;
        ball.y += ball.dy;

        if ball.x <= PADDLE_WIDTH as isize {
            ball.x = PADDLE_WIDTH as isize;
            ball.dx = ball.dx.abs();
        } else if ball.x + size >= width {
            ball.x = width - size;
            ball.dx = -ball.dx.abs();
        }
        if ball.y <= 0 {
            ball.y = 0;
            ball.dy = ball.dy.abs();
        } else if ball.y + size >= height {
            ball.y = height - size;
            ball.dy = -ball.dy.abs();
        }

        let half = PADDLE_HEIGHT / 2;
        let center = (ball.y + size / 2) as usize;
        self.paddle_y = center.clamp(half, self.timing.active_height - half);
    }

    fn color_at(&self, h: usize, v: usize) -> ColorWord {
        let (bx, by) = (self.ball.x as usize, self.ball.y as usize);
        let half = PADDLE_HEIGHT / 2;
        let net_x = self.timing.active_width / 2 - NET_WIDTH / 2;

        if (bx..bx + BALL_SIZE).contains(&h) && (by..by + BALL_SIZE).contains(&v) {
            BALL
        } else if h < PADDLE_WIDTH && (self.paddle_y - half..self.paddle_y + half).contains(&v) {
            PADDLE
        } else if (net_x..net_x + NET_WIDTH).contains(&h) && (v / NET_DASH) % 2 == 0 {
            NET
        } else {
            BACKGROUND
        }
    }

    fn update_outputs(&mut self) {
        let active = self.h < self.timing.active_width && self.v < self.timing.active_height;
        self.signals = Signals {
            h_sync: !self.timing.in_h_sync(self.h),
            v_sync: !self.timing.in_v_sync(self.v),
            color: if active {
                self.color_at(self.h, self.v)
            } else {
                ColorWord::BLACK
            },
        };
    }
}

impl SignalSource for PongDevice {
    fn set_clock(&mut self, level: bool) {
        self.clock = level;
    }

    fn set_reset(&mut self, level: bool) {
        self.reset = level;
    }

    fn step(&mut self) {
        let rising = self.clock && !self.prev_clock;
        self.prev_clock = self.clock;

        if self.reset {
            self.restart();
            // Port is not driven properly until reset is released
            self.signals = Signals {
                h_sync: true,
                v_sync: true,
                color: ColorWord::WHITE,
            };
            return;
        }

        if rising {
            self.divider = !self.divider;
            if !self.divider {
                self.pixel_tick();
            }
        }
        self.update_outputs();
    }

    fn signals(&self) -> Signals {
        self.signals
    }

    fn probe(&self) -> Option<Probe> {
        Some(Probe {
            frame_start: self.frame_start,
            ball: (self.ball.x as usize, self.ball.y as usize),
            paddle: (0, self.paddle_y),
        })
    }
}
