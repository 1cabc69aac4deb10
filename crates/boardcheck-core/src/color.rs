//! HSV to RGB conversion for the LED animation

/// An 8-bit per channel RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const OFF: Self = Self::new(0, 0, 0);
    pub const RED: Self = Self::new(255, 0, 0);
    pub const GREEN: Self = Self::new(0, 255, 0);
    pub const BLUE: Self = Self::new(0, 0, 255);
    pub const WHITE: Self = Self::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Convert a hue (degrees, wrapped into `[0, 360)`), saturation and value
/// (both `0..=255`) to RGB using the six-sextant algorithm.
pub fn hsv_to_rgb(hue: u16, saturation: u8, value: u8) -> Rgb8 {
    let h = (hue % 360) as f32;
    let s = saturation as f32 / 255.0;
    let v = value as f32 / 255.0;

    let c = v * s;
    let sector = (h / 60.0) % 2.0 - 1.0;
    let x = c * (1.0 - abs(sector));
    let m = v - c;

    let (r, g, b) = match hue % 360 {
        0..60 => (c, x, 0.0),
        60..120 => (x, c, 0.0),
        120..180 => (0.0, c, x),
        180..240 => (0.0, x, c),
        240..300 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    Rgb8::new(to_channel(r + m), to_channel(g + m), to_channel(b + m))
}

fn abs(value: f32) -> f32 {
    if value < 0.0 { -value } else { value }
}

/// Scale a normalized channel to `0..=255`, rounding half up.
fn to_channel(value: f32) -> u8 {
    let scaled = value * 255.0 + 0.5;
    if scaled <= 0.0 {
        0
    } else if scaled >= 255.0 {
        255
    } else {
        scaled as u8
    }
}
