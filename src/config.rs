use eyre::{bail, Result};

/// Raster geometry of one video mode, in pixel clocks and lines.
///
/// Horizontally a line is laid out as active area, right (front) porch, sync pulse and
/// left (back) porch. Vertically it is active lines, bottom porch, sync and top porch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timing {
    pub left_porch: usize,
    pub active_width: usize,
    pub right_porch: usize,
    pub horizontal_sync: usize,
    pub total_width: usize,

    pub top_porch: usize,
    pub active_height: usize,
    pub bottom_porch: usize,
    pub vertical_sync: usize,
    pub total_height: usize,
}

impl Timing {
    pub const VGA_640X480: Self = Self {
        left_porch: 48,
        active_width: 640,
        right_porch: 16,
        horizontal_sync: 96,
        total_width: 800,

        top_porch: 33,
        active_height: 480,
        bottom_porch: 10,
        vertical_sync: 2,
        total_height: 525,
    };

    pub fn validate(&self) -> Result<()> {
        let width = self.left_porch + self.active_width + self.right_porch + self.horizontal_sync;
        if width != self.total_width {
            bail!(
                "Horizontal timing adds up to {} but total width is {}",
                width,
                self.total_width
            );
        }
        let height = self.top_porch + self.active_height + self.bottom_porch + self.vertical_sync;
        if height != self.total_height {
            bail!(
                "Vertical timing adds up to {} but total height is {}",
                height,
                self.total_height
            );
        }
        if self.active_width == 0 || self.active_width > self.total_width {
            bail!(
                "Active width {} must be within 1..={}",
                self.active_width,
                self.total_width
            );
        }
        if self.active_height == 0 || self.active_height > self.total_height {
            bail!(
                "Active height {} must be within 1..={}",
                self.active_height,
                self.total_height
            );
        }
        Ok(())
    }

    /// Pixel clocks in one full raster scan, blanking included.
    pub const fn frame_len(&self) -> u64 {
        (self.total_width * self.total_height) as u64
    }

    pub const fn h_sync_start(&self) -> usize {
        self.active_width + self.right_porch
    }

    pub const fn v_sync_start(&self) -> usize {
        self.active_height + self.bottom_porch
    }

    pub const fn in_h_sync(&self, h: usize) -> bool {
        h >= self.h_sync_start() && h < self.h_sync_start() + self.horizontal_sync
    }

    pub const fn in_v_sync(&self, v: usize) -> bool {
        v >= self.v_sync_start() && v < self.v_sync_start() + self.vertical_sync
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self::VGA_640X480
    }
}

#[derive(Clone, Debug)]
pub struct SimConfig {
    pub timing: Timing,
    /// Driving clock cycles per derived pixel clock edge.
    pub clock_divisor: u32,
    /// Only every n:th driving clock cycle is fed to the decoder.
    pub decimation: u32,
    pub reset_cycles: u32,
    pub frame_limit: Option<u64>,
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            timing: Timing::VGA_640X480,
            clock_divisor: 2,
            decimation: 1,
            reset_cycles: 10,
            frame_limit: None,
            seed: 0,
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<()> {
        self.timing.validate()?;
        if self.clock_divisor == 0 {
            bail!("Clock divisor must be at least 1");
        }
        if self.decimation == 0 {
            bail!("Decimation factor must be at least 1");
        }
        if self.reset_cycles == 0 {
            bail!("Reset must be held for at least one cycle");
        }
        Ok(())
    }

    pub fn from_args(args: &[String]) -> Result<(Self, bool)> {
        let mut config = Self::default();
        let mut headless = false;

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--headless" => headless = true,
                "--decimate" => config.decimation = parse_value(arg, iter.next())?,
                "--frames" => config.frame_limit = Some(parse_value(arg, iter.next())?),
                "--seed" => config.seed = parse_value(arg, iter.next())?,
                _ => bail!("Unknown parameter {}", arg),
            }
        }

        config.validate()?;
        Ok((config, headless))
    }
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<&String>) -> Result<T> {
    match value.map(|v| v.parse::<T>()) {
        Some(Ok(val)) => Ok(val),
        Some(Err(_)) => bail!("Invalid value for {}", flag),
        None => bail!("Missing value for {}", flag),
    }
}
