//! Temperature colour ramp and radial wash rendering.

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn transparent() -> Self {
        Self { r: 0, g: 0, b: 0, a: 0 }
    }

    /// Same colour with alpha given as a fraction in [0, 1].
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            a: unit_to_u8(alpha),
            ..self
        }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_array(rgba: [u8; 4]) -> Self {
        Self::new(rgba[0], rgba[1], rgba[2], rgba[3])
    }
}

pub(crate) fn unit_to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Convert HSL (hue in degrees, saturation and lightness in [0, 1]) to RGB.
pub fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> (u8, u8, u8) {
    let h = hue.rem_euclid(360.0);
    let s = saturation.clamp(0.0, 1.0);
    let l = lightness.clamp(0.0, 1.0);

    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = match h {
        h if h < 60.0 => (c, x, 0.0),
        h if h < 120.0 => (x, c, 0.0),
        h if h < 180.0 => (0.0, c, x),
        h if h < 240.0 => (0.0, x, c),
        h if h < 300.0 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    (unit_to_u8(r + m), unit_to_u8(g + m), unit_to_u8(b + m))
}

/// The four hue bands of the temperature ramp, coldest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureBand {
    Blue,
    Cyan,
    Yellow,
    Red,
}

impl TemperatureBand {
    /// Band for a normalized ratio. Band edges are upper-inclusive.
    pub fn for_ratio(ratio: f32) -> Self {
        match ratio {
            r if r <= 0.25 => TemperatureBand::Blue,
            r if r <= 0.5 => TemperatureBand::Cyan,
            r if r <= 0.75 => TemperatureBand::Yellow,
            _ => TemperatureBand::Red,
        }
    }

    pub fn hue(&self) -> f32 {
        match self {
            TemperatureBand::Blue => 240.0,
            TemperatureBand::Cyan => 180.0,
            TemperatureBand::Yellow => 60.0,
            TemperatureBand::Red => 0.0,
        }
    }

    /// Ratio at which this band begins.
    pub fn start(&self) -> f32 {
        match self {
            TemperatureBand::Blue => 0.0,
            TemperatureBand::Cyan => 0.25,
            TemperatureBand::Yellow => 0.5,
            TemperatureBand::Red => 0.75,
        }
    }
}

/// Clamp-and-normalize ramp from °C to colour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureRamp {
    pub min_celsius: f32,
    pub max_celsius: f32,
}

impl Default for TemperatureRamp {
    fn default() -> Self {
        Self {
            min_celsius: -40.0,
            max_celsius: 60.0,
        }
    }
}

impl TemperatureRamp {
    pub fn clamp(&self, celsius: f32) -> f32 {
        if celsius.is_nan() {
            return self.min_celsius;
        }
        celsius.clamp(self.min_celsius, self.max_celsius)
    }

    /// Map a temperature to [0, 1] after clamping.
    pub fn normalize(&self, celsius: f32) -> f32 {
        let span = self.max_celsius - self.min_celsius;
        if span <= 0.0 {
            return 0.0;
        }
        (self.clamp(celsius) - self.min_celsius) / span
    }

    pub fn band(&self, celsius: f32) -> TemperatureBand {
        TemperatureBand::for_ratio(self.normalize(celsius))
    }

    /// Opaque ramp colour; lightness rises from 50% to 60% across each band.
    pub fn color(&self, celsius: f32) -> Color {
        let ratio = self.normalize(celsius);
        let band = TemperatureBand::for_ratio(ratio);
        let lightness = 0.5 + (ratio - band.start()) * 0.4;
        let (r, g, b) = hsl_to_rgb(band.hue(), 1.0, lightness);
        Color::new(r, g, b, 255)
    }
}

/// Radial opacity falloff from the tile centre.
///
/// Alpha is `center_alpha` at the centre, `center_alpha * mid_factor` at
/// `mid_offset` of the radius and zero at the radius. The radius is
/// `radius_factor` times the tile size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadialFade {
    pub center_alpha: f32,
    pub mid_offset: f32,
    pub mid_factor: f32,
    pub radius_factor: f32,
}

impl Default for RadialFade {
    fn default() -> Self {
        Self {
            center_alpha: 0.6,
            mid_offset: 0.7,
            mid_factor: 0.3,
            radius_factor: 0.7,
        }
    }
}

impl RadialFade {
    /// Alpha (0..=1) at the centre of pixel (x, y) in a square tile.
    pub fn alpha_at(&self, x: usize, y: usize, size: usize) -> f32 {
        let half = size as f32 / 2.0;
        let dx = x as f32 + 0.5 - half;
        let dy = y as f32 + 0.5 - half;
        let radius = self.radius_factor * size as f32;
        if radius <= 0.0 {
            return 0.0;
        }

        let t = ((dx * dx + dy * dy).sqrt() / radius).min(1.0);
        let mid_alpha = self.center_alpha * self.mid_factor;
        if t <= self.mid_offset {
            lerp(self.center_alpha, mid_alpha, t / self.mid_offset)
        } else {
            lerp(mid_alpha, 0.0, (t - self.mid_offset) / (1.0 - self.mid_offset))
        }
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t.clamp(0.0, 1.0)
}

/// Render a square tile of `color` whose alpha follows `fade`.
///
/// Returns RGBA pixel data (4 bytes per pixel).
pub fn render_radial_wash(color: Color, fade: &RadialFade, size: usize) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(size * size * 4);
    for y in 0..size {
        for x in 0..size {
            let alpha = unit_to_u8(fade.alpha_at(x, y, size));
            pixels.extend_from_slice(&[color.r, color.g, color.b, alpha]);
        }
    }
    pixels
}

/// Render a square tile filled with one colour.
pub fn render_solid(color: Color, size: usize) -> Vec<u8> {
    color.to_array().repeat(size * size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hsl_primaries() {
        assert_eq!(hsl_to_rgb(0.0, 1.0, 0.5), (255, 0, 0));
        assert_eq!(hsl_to_rgb(60.0, 1.0, 0.5), (255, 255, 0));
        assert_eq!(hsl_to_rgb(180.0, 1.0, 0.5), (0, 255, 255));
        assert_eq!(hsl_to_rgb(240.0, 1.0, 0.5), (0, 0, 255));
    }

    #[test]
    fn test_band_edges_are_upper_inclusive() {
        assert_eq!(TemperatureBand::for_ratio(0.25), TemperatureBand::Blue);
        assert_eq!(TemperatureBand::for_ratio(0.2501), TemperatureBand::Cyan);
        assert_eq!(TemperatureBand::for_ratio(0.75), TemperatureBand::Yellow);
        assert_eq!(TemperatureBand::for_ratio(0.76), TemperatureBand::Red);
    }

    #[test]
    fn test_nan_clamps_to_minimum() {
        let ramp = TemperatureRamp::default();
        assert_eq!(ramp.clamp(f32::NAN), -40.0);
    }

    #[test]
    fn test_fade_profile() {
        let fade = RadialFade::default();
        let centre = fade.alpha_at(128, 128, 256);
        let corner = fade.alpha_at(0, 0, 256);
        assert!((centre - 0.6).abs() < 0.01);
        assert_eq!(corner, 0.0);
    }
}
