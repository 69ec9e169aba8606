//! Live tile generation from a scalar weather reading.
//!
//! Rendering is a pure function of (kind, reading, coordinate): no clock, no
//! randomness, no network. The coordinate only selects the zoom-dependent
//! label, so every tile of a zoom level is identical for a given reading.

use crate::error::RenderError;
use crate::gradient::{render_radial_wash, render_solid, Color, RadialFade, TemperatureRamp};
use crate::numbers::{draw_label, format_temperature, format_wind_speed, LabelStyle};
use crate::png::create_png_auto;
use crate::wind::{render_wind_field, WindStyle};
use image::RgbaImage;
use overlay_common::{LayerKind, TileCoord, WeatherReading};
use tracing::debug;

/// Standard slippy-map tile edge in pixels.
pub const DEFAULT_TILE_SIZE: usize = 256;

/// An encoded tile plus what was drawn into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTile {
    pub png: Vec<u8>,
    pub width: usize,
    pub height: usize,
    /// Label text, when the zoom level was deep enough to draw one
    pub label: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct TemperatureStyle {
    pub ramp: TemperatureRamp,
    pub fade: RadialFade,
    /// Labels are drawn only when z is greater than this
    pub label_min_zoom: u32,
}

impl Default for TemperatureStyle {
    fn default() -> Self {
        Self {
            ramp: TemperatureRamp::default(),
            fade: RadialFade::default(),
            label_min_zoom: 3,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WindTileStyle {
    pub arrows: WindStyle,
    pub label_min_zoom: u32,
    /// Label font size in pixels
    pub label_size: f32,
}

impl Default for WindTileStyle {
    fn default() -> Self {
        Self {
            arrows: WindStyle::default(),
            label_min_zoom: 4,
            label_size: 14.0,
        }
    }
}

/// Renders temperature and wind tiles from a live reading.
#[derive(Debug, Clone)]
pub struct LiveTileGenerator {
    tile_size: usize,
    temperature: TemperatureStyle,
    wind: WindTileStyle,
}

impl Default for LiveTileGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveTileGenerator {
    pub fn new() -> Self {
        Self::with_tile_size(DEFAULT_TILE_SIZE)
    }

    pub fn with_tile_size(tile_size: usize) -> Self {
        Self {
            tile_size: tile_size.max(1),
            temperature: TemperatureStyle::default(),
            wind: WindTileStyle::default(),
        }
    }

    pub fn tile_size(&self) -> usize {
        self.tile_size
    }

    pub fn temperature_style(&self) -> &TemperatureStyle {
        &self.temperature
    }

    pub fn wind_style(&self) -> &WindTileStyle {
        &self.wind
    }

    /// Render a live tile for `kind`.
    ///
    /// Fails with `MissingReading` when the reading lacks the field the kind
    /// needs; the caller is expected to fall back to a static layer.
    pub fn render(
        &self,
        kind: LayerKind,
        reading: &WeatherReading,
        coord: TileCoord,
    ) -> Result<RenderedTile, RenderError> {
        coord
            .validate()
            .map_err(|e| RenderError::InvalidTile(e.to_string()))?;

        match kind {
            LayerKind::Temperature => {
                let celsius = reading
                    .temperature()
                    .ok_or(RenderError::MissingReading(kind))?;
                self.render_temperature(celsius, coord)
            }
            LayerKind::Wind => {
                let (speed, direction) = reading.wind().ok_or(RenderError::MissingReading(kind))?;
                self.render_wind(speed, direction, coord)
            }
            LayerKind::Precipitation => Err(RenderError::Unsupported(kind)),
        }
    }

    /// Temperature tile: ramp colour with a radial fade, labelled past the zoom threshold.
    pub fn render_temperature(&self, celsius: f32, coord: TileCoord) -> Result<RenderedTile, RenderError> {
        let style = &self.temperature;
        let size = self.tile_size;
        let clamped = style.ramp.clamp(celsius);

        let mut pixels = render_radial_wash(style.ramp.color(clamped), &style.fade, size);

        let label = (coord.z > style.label_min_zoom).then(|| format_temperature(clamped));
        if let Some(text) = &label {
            let label_style = LabelStyle {
                font_size: temperature_label_size(coord.z),
                ..LabelStyle::default()
            };
            let center = (size / 2) as i32;
            pixels = label_pixels(pixels, size, text, center, center, &label_style)?;
        }

        debug!(celsius = clamped, z = coord.z, labelled = label.is_some(), "Rendered temperature tile");
        self.encode(pixels, label)
    }

    /// Wind tile: colour wash with direction-rotated arrows above the calm threshold.
    pub fn render_wind(&self, speed: f32, direction: f32, coord: TileCoord) -> Result<RenderedTile, RenderError> {
        let style = &self.wind;
        let size = self.tile_size;
        let clamped = style.arrows.clamp_speed(speed);

        let mut pixels = render_wind_field(clamped, direction, size, size, &style.arrows)?;

        let label = (coord.z > style.label_min_zoom).then(|| format_wind_speed(clamped));
        if let Some(text) = &label {
            let label_style = LabelStyle {
                font_size: style.label_size,
                ..LabelStyle::default()
            };
            // Bottom band of the tile, clear of the centre arrow.
            let y = (size as f32 - style.label_size * 2.0).max(0.0) as i32;
            pixels = label_pixels(pixels, size, text, (size / 2) as i32, y, &label_style)?;
        }

        debug!(speed = clamped, direction, z = coord.z, "Rendered wind tile");
        self.encode(pixels, label)
    }

    /// A tile of one flat colour, used for fallback layers.
    pub fn render_solid(&self, rgba: [u8; 4]) -> Result<RenderedTile, RenderError> {
        let pixels = render_solid(Color::from_array(rgba), self.tile_size);
        self.encode(pixels, None)
    }

    fn encode(&self, pixels: Vec<u8>, label: Option<String>) -> Result<RenderedTile, RenderError> {
        let png = create_png_auto(&pixels, self.tile_size, self.tile_size)?;
        Ok(RenderedTile {
            png,
            width: self.tile_size,
            height: self.tile_size,
            label,
        })
    }
}

/// Temperature label font size; shrinks as zoom deepens, never below 12 px.
fn temperature_label_size(z: u32) -> f32 {
    24u32.saturating_sub(z).max(12) as f32
}

fn label_pixels(
    pixels: Vec<u8>,
    size: usize,
    text: &str,
    center_x: i32,
    center_y: i32,
    style: &LabelStyle,
) -> Result<Vec<u8>, RenderError> {
    let mut image = RgbaImage::from_raw(size as u32, size as u32, pixels)
        .ok_or_else(|| RenderError::Canvas("tile buffer does not match tile size".to_string()))?;
    draw_label(&mut image, text, center_x, center_y, style)?;
    Ok(image.into_raw())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_size_shrinks_with_zoom() {
        assert_eq!(temperature_label_size(4), 20.0);
        assert_eq!(temperature_label_size(12), 12.0);
        assert_eq!(temperature_label_size(22), 12.0);
    }

    #[test]
    fn test_precipitation_is_not_live() {
        let generator = LiveTileGenerator::with_tile_size(16);
        let reading = WeatherReading::default().with_precipitation(2.0);
        let result = generator.render(LayerKind::Precipitation, &reading, TileCoord::new(1, 0, 0));
        assert!(matches!(result, Err(RenderError::Unsupported(LayerKind::Precipitation))));
    }

    #[test]
    fn test_invalid_coordinate_is_rejected() {
        let generator = LiveTileGenerator::with_tile_size(16);
        let reading = WeatherReading::default().with_temperature(10.0);
        let result = generator.render(LayerKind::Temperature, &reading, TileCoord::new(2, 4, 0));
        assert!(matches!(result, Err(RenderError::InvalidTile(_))));
    }
}
