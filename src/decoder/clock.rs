/// Infers the pixel clock from the driving clock by counting rising edges.
///
/// The device divides its input clock internally and that divider is not visible from
/// outside, so an edge is assumed every `divisor` driving cycles. This only holds while
/// every driving cycle is counted: feeding the divider a decimated stream makes its
/// cadence drift away from the device's real position.
pub struct ClockDivider {
    divisor: u32,
    count: u32,
}

impl ClockDivider {
    pub fn new(divisor: u32) -> Self {
        assert!(divisor > 0, "clock divisor must be non-zero");
        Self { divisor, count: 0 }
    }

    /// Count one driving clock cycle, returns true on a derived pixel clock edge.
    pub fn step(&mut self) -> bool {
        self.count += 1;
        if self.count >= self.divisor {
            self.count = 0;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }
}
