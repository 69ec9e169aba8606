//! Wind arrow rendering for live wind tiles.
//!
//! A tile is a translucent wash in the speed colour with direction-rotated
//! arrows laid out on a fixed pixel lattice. Calm readings get the wash only.

use crate::error::RenderError;
use crate::gradient::{unit_to_u8, Color};
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Stroke, Transform};

/// Upper end of the speed scale in m/s; faster winds share the top band.
pub const MAX_WIND_SPEED: f32 = 50.0;

/// Colour bands of the wind scale, calm first: (r, g, b, alpha).
const WIND_BANDS: [(u8, u8, u8, f32); 5] = [
    (100, 255, 100, 0.4), // light green, calm
    (255, 255, 0, 0.5),   // yellow, light breeze
    (255, 165, 0, 0.6),   // orange, moderate
    (255, 0, 0, 0.7),     // red, strong
    (139, 0, 139, 0.8),   // purple, very strong
];

/// Configuration for wind arrow rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindStyle {
    /// Lattice spacing between arrow centres in pixels
    pub spacing: u32,
    /// Arrows are drawn only above this speed (m/s)
    pub arrow_threshold: f32,
    /// Wash alpha as a fraction of the band alpha
    pub wash_factor: f32,
    /// Arrow glyph size bounds in pixels
    pub min_arrow_size: f32,
    pub max_arrow_size: f32,
    /// Glyph pixels per m/s before clamping
    pub size_per_speed: f32,
    /// Outline width of each arrow
    pub outline_width: f32,
}

impl Default for WindStyle {
    fn default() -> Self {
        Self {
            spacing: 64,
            arrow_threshold: 5.0,
            wash_factor: 0.3,
            min_arrow_size: 20.0,
            max_arrow_size: 60.0,
            size_per_speed: 1.2,
            outline_width: 0.5,
        }
    }
}

impl WindStyle {
    pub fn clamp_speed(&self, speed: f32) -> f32 {
        if speed.is_nan() {
            return 0.0;
        }
        speed.clamp(0.0, MAX_WIND_SPEED)
    }

    /// Band colour (with band alpha) for a wind speed.
    pub fn color(&self, speed: f32) -> Color {
        let ratio = self.clamp_speed(speed) / MAX_WIND_SPEED;
        let band = match ratio {
            r if r < 0.2 => 0,
            r if r < 0.4 => 1,
            r if r < 0.6 => 2,
            r if r < 0.8 => 3,
            _ => 4,
        };
        let (r, g, b, a) = WIND_BANDS[band];
        Color::new(r, g, b, unit_to_u8(a))
    }

    pub fn arrow_size(&self, speed: f32) -> f32 {
        (self.clamp_speed(speed) * self.size_per_speed).clamp(self.min_arrow_size, self.max_arrow_size)
    }

    pub fn draws_arrows(&self, speed: f32) -> bool {
        self.clamp_speed(speed) > self.arrow_threshold
    }
}

/// Calculate arrow centres on a lattice, offset by half a cell.
pub fn calculate_arrow_positions(width: usize, height: usize, spacing: u32) -> Vec<(usize, usize)> {
    let mut positions = Vec::new();
    let spacing = spacing.max(1) as usize;
    let offset = spacing / 2;

    let mut y = offset;
    while y < height {
        let mut x = offset;
        while x < width {
            positions.push((x, y));
            x += spacing;
        }
        y += spacing;
    }

    positions
}

/// Render the wind field for a single reading.
///
/// `direction_deg` rotates each arrow clockwise from its upright pose.
/// Returns straight (non-premultiplied) RGBA pixel data.
pub fn render_wind_field(
    speed: f32,
    direction_deg: f32,
    width: usize,
    height: usize,
    style: &WindStyle,
) -> Result<Vec<u8>, RenderError> {
    let mut pixmap = Pixmap::new(width as u32, height as u32)
        .ok_or_else(|| RenderError::Canvas(format!("cannot allocate {}x{} pixmap", width, height)))?;

    let color = style.color(speed);
    let band_alpha = color.a as f32 / 255.0;

    let wash = color.with_alpha(band_alpha * style.wash_factor);
    pixmap.fill(tiny_skia::Color::from_rgba8(wash.r, wash.g, wash.b, wash.a));

    if style.draws_arrows(speed) {
        let size = style.arrow_size(speed);
        let path = arrow_path(size)
            .ok_or_else(|| RenderError::Canvas(format!("degenerate arrow of size {}", size)))?;

        let mut fill = Paint::default();
        fill.set_color_rgba8(color.r, color.g, color.b, color.a);
        fill.anti_alias = true;

        let mut outline = Paint::default();
        outline.set_color_rgba8(255, 255, 255, 255);
        outline.anti_alias = true;
        let stroke = Stroke {
            width: style.outline_width,
            ..Stroke::default()
        };

        let rotation = if direction_deg.is_finite() {
            direction_deg.rem_euclid(360.0)
        } else {
            0.0
        };

        for (x, y) in calculate_arrow_positions(width, height, style.spacing) {
            let transform = Transform::from_rotate(rotation).post_translate(x as f32, y as f32);
            pixmap.fill_path(&path, &fill, FillRule::Winding, transform, None);
            pixmap.stroke_path(&path, &outline, &stroke, transform, None);
        }
    }

    Ok(demultiply(&pixmap))
}

/// Kite-shaped arrow centred on the origin, pointing along +y.
fn arrow_path(size: f32) -> Option<tiny_skia::Path> {
    let long = size / 4.0;
    let short = size / 8.0;

    let mut pb = PathBuilder::new();
    pb.move_to(0.0, -long);
    pb.line_to(short, -short);
    pb.line_to(0.0, long);
    pb.line_to(-short, -short);
    pb.close();
    pb.finish()
}

fn demultiply(pixmap: &Pixmap) -> Vec<u8> {
    let mut out = Vec::with_capacity(pixmap.data().len());
    for px in pixmap.pixels() {
        let c = px.demultiply();
        out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    out
}
