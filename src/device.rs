pub mod pong;

use crate::decoder::color::ColorWord;

/// Video port outputs, sampled after a step. Sync lines are active low.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Signals {
    pub h_sync: bool,
    pub v_sync: bool,
    pub color: ColorWord,
}

/// Debug outputs some devices expose next to the video port.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Probe {
    pub frame_start: bool,
    pub ball: (usize, usize),
    pub paddle: (usize, usize),
}

/// A clocked device driving a video port.
///
/// Inputs are latched by `set_clock`/`set_reset` and take effect on the next `step`.
pub trait SignalSource {
    fn set_clock(&mut self, level: bool);
    fn set_reset(&mut self, level: bool);
    fn step(&mut self);
    fn signals(&self) -> Signals;

    fn finished(&self) -> bool {
        false
    }

    fn probe(&self) -> Option<Probe> {
        None
    }
}
