use fixed::types::I32F32;

/// Device-unit length (one unit is one output pixel at 1x).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Px(I32F32);

impl Px {
    pub const ZERO: Px = Px(I32F32::from_bits(0));
    pub const ONE: Px = Px(I32F32::from_bits(1 << 32));

    pub fn from_f32(value: f32) -> Px {
        if !value.is_finite() {
            return Px::ZERO;
        }
        let milli = (value as f64 * 1000.0).round();
        let milli = milli.clamp(i64::MIN as f64, i64::MAX as f64) as i64;
        Px::from_milli_i64(milli)
    }

    pub fn from_i32(value: i32) -> Px {
        Px::from_milli_i64((value as i64) * 1000)
    }

    pub fn to_f32(self) -> f32 {
        self.0.to_num()
    }

    pub fn to_milli_i64(self) -> i64 {
        let bits = self.0.to_bits() as i128;
        let denom = 1i128 << 32;
        let scaled = bits * 1000;
        let adj = if scaled >= 0 { denom / 2 } else { -denom / 2 };
        let milli = (scaled + adj) / denom;
        milli.clamp(i64::MIN as i128, i64::MAX as i128) as i64
    }

    pub fn max(self, other: Px) -> Px {
        if self >= other { self } else { other }
    }

    pub fn min(self, other: Px) -> Px {
        if self <= other { self } else { other }
    }

    pub fn mul_ratio(self, num: i32, denom: i32) -> Px {
        if denom == 0 {
            return Px::ZERO;
        }
        let milli = self.to_milli_i64() as i128;
        let value = div_round_i128(milli.saturating_mul(num as i128), denom as i128);
        Px::from_milli_i128(value)
    }

    pub fn from_milli_i64(milli: i64) -> Px {
        Px::from_milli_i128(milli as i128)
    }

    fn from_milli_i128(milli: i128) -> Px {
        let denom = 1i128 << 32;
        let adj = if milli >= 0 { 500 } else { -500 };
        let bits = (milli * denom + adj) / 1000;
        let bits = bits.clamp(i64::MIN as i128, i64::MAX as i128) as i64;
        Px(I32F32::from_bits(bits))
    }
}

impl std::fmt::Display for Px {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3}", self.to_f32())
    }
}

impl std::ops::Add for Px {
    type Output = Px;
    fn add(self, rhs: Px) -> Px {
        Px::from_milli_i128(self.to_milli_i64() as i128 + rhs.to_milli_i64() as i128)
    }
}

impl std::ops::AddAssign for Px {
    fn add_assign(&mut self, rhs: Px) {
        *self = *self + rhs;
    }
}

impl std::ops::Sub for Px {
    type Output = Px;
    fn sub(self, rhs: Px) -> Px {
        Px::from_milli_i128(self.to_milli_i64() as i128 - rhs.to_milli_i64() as i128)
    }
}

impl std::ops::SubAssign for Px {
    fn sub_assign(&mut self, rhs: Px) {
        *self = *self - rhs;
    }
}

impl std::ops::Mul<i32> for Px {
    type Output = Px;
    fn mul(self, rhs: i32) -> Px {
        let milli = self.to_milli_i64() as i128;
        Px::from_milli_i128(milli.saturating_mul(rhs as i128))
    }
}

impl std::ops::Div<i32> for Px {
    type Output = Px;
    fn div(self, rhs: i32) -> Px {
        if rhs == 0 {
            Px::ZERO
        } else {
            let milli = self.to_milli_i64() as i128;
            Px::from_milli_i128(div_round_i128(milli, rhs as i128))
        }
    }
}

impl std::ops::Mul<f32> for Px {
    type Output = Px;
    fn mul(self, rhs: f32) -> Px {
        if !rhs.is_finite() {
            return Px::ZERO;
        }
        Px::from_f32(self.to_f32() * rhs)
    }
}

impl std::ops::Div<f32> for Px {
    type Output = Px;
    fn div(self, rhs: f32) -> Px {
        if rhs == 0.0 || !rhs.is_finite() {
            Px::ZERO
        } else {
            Px::from_f32(self.to_f32() / rhs)
        }
    }
}

impl std::ops::Neg for Px {
    type Output = Px;
    fn neg(self) -> Px {
        Px::from_milli_i128(-(self.to_milli_i64() as i128))
    }
}

fn div_round_i128(num: i128, den: i128) -> i128 {
    if den == 0 {
        return 0;
    }
    let den_abs = den.abs();
    if num >= 0 {
        (num + (den_abs / 2)) / den
    } else {
        -(((-num) + (den_abs / 2)) / den)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: Px,
    pub height: Px,
}

impl Size {
    /// The fixed 1200x675 card surface.
    pub fn card() -> Self {
        Self {
            width: Px::from_i32(1200),
            height: Px::from_i32(675),
        }
    }

    pub fn aspect(self) -> f32 {
        let h = self.height.to_f32();
        if h <= 0.0 {
            return 0.0;
        }
        self.width.to_f32() / h
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: Px,
    pub y: Px,
    pub width: Px,
    pub height: Px,
}

impl Rect {
    pub fn new(x: Px, y: Px, width: Px, height: Px) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_size(size: Size) -> Self {
        Self::new(Px::ZERO, Px::ZERO, size.width, size.height)
    }

    pub fn right(&self) -> Px {
        self.x + self.width
    }

    pub fn bottom(&self) -> Px {
        self.y + self.height
    }
}

/// Straight (non-premultiplied) RGBA, components in 0..=1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn rgba8(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: a.clamp(0.0, 1.0),
        }
    }

    /// Parses `#rgb` or `#rrggbb` (leading `#` optional).
    pub fn from_hex(raw: &str) -> Option<Self> {
        let hex = raw.trim().trim_start_matches('#');
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => {
                let mut out = [0u8; 3];
                for (idx, ch) in hex.chars().enumerate() {
                    let v = ch.to_digit(16)? as u8;
                    out[idx] = v * 17;
                }
                Some(Color::rgba8(out[0], out[1], out[2], 1.0))
            }
            6 => Some(Color::rgba8(
                channel(hex.get(0..2)?)?,
                channel(hex.get(2..4)?)?,
                channel(hex.get(4..6)?)?,
                1.0,
            )),
            _ => None,
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.a <= 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub offset: f32, // 0..=1
    pub color: Color,
}

impl GradientStop {
    pub fn new(offset: f32, color: Color) -> Self {
        Self { offset, color }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn px_arithmetic_rounds_to_milli_units() {
        let a = Px::from_f32(432.0);
        let b = Px::from_f32(40.0) * 0.4;
        assert_eq!((a + b).to_milli_i64(), 448_000);
        assert_eq!((Px::from_i32(30) / 2).to_milli_i64(), 15_000);
        assert_eq!(Px::from_i32(10).mul_ratio(1, 3).to_milli_i64(), 3_333);
    }

    #[test]
    fn px_non_finite_input_is_zero() {
        assert_eq!(Px::from_f32(f32::NAN), Px::ZERO);
        assert_eq!(Px::from_i32(5) / 0.0, Px::ZERO);
    }

    #[test]
    fn color_from_hex_accepts_short_and_long_forms() {
        assert_eq!(Color::from_hex("#FFFFFF"), Some(Color::WHITE));
        assert_eq!(Color::from_hex("fff"), Some(Color::WHITE));
        let navy = Color::from_hex("#002040").unwrap();
        assert!((navy.b - 64.0 / 255.0).abs() < 1e-6);
        assert_eq!(Color::from_hex("#12345"), None);
        assert_eq!(Color::from_hex("#zzzzzz"), None);
    }
}
