use bitbash::bitfield;

/// Bits per colour channel on the bus.
pub const CHANNEL_BITS: u32 = 4;
const CHANNEL_MAX: u16 = (1 << CHANNEL_BITS) - 1;
const CHANNEL_MAX_F: f32 = CHANNEL_MAX as f32;

// 12-bit packed RGB444 word as driven on the colour bus
bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq, Debug)]
    pub struct ColorWord(pub u16);

    pub field blue:  u8 = [0..4];
    pub field green: u8 = [4..8];
    pub field red:   u8 = [8..12];
}

impl ColorWord {
    pub const BLACK: Self = Self(0x000);
    pub const WHITE: Self = Self(0xFFF);

    pub fn decode(self) -> Pixel {
        Pixel::new(
            f32::from(self.red()) / CHANNEL_MAX_F,
            f32::from(self.green()) / CHANNEL_MAX_F,
            f32::from(self.blue()) / CHANNEL_MAX_F,
        )
    }
}

/// Normalized colour intensities in `0.0..=1.0`.
#[derive(Copy, Clone, Default, PartialEq, Debug)]
pub struct Pixel {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Pixel {
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}
