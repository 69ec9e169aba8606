//! Numeric labels drawn onto live tiles.

use crate::error::RenderError;
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;
use rusttype::{point, Font, Scale};
use std::sync::OnceLock;

/// Embedded font data - DejaVu Sans Mono
const FONT_DATA: &[u8] = include_bytes!("../assets/DejaVuSansMono.ttf");

fn label_font() -> Result<&'static Font<'static>, RenderError> {
    static FONT: OnceLock<Option<Font<'static>>> = OnceLock::new();
    FONT.get_or_init(|| Font::try_from_bytes(FONT_DATA))
        .as_ref()
        .ok_or_else(|| RenderError::Canvas("failed to load label font".to_string()))
}

/// Whether the label font has a glyph for every character of `text`.
pub fn is_renderable(text: &str) -> bool {
    match label_font() {
        Ok(font) => text.chars().all(|c| font.glyph(c).id().0 != 0),
        Err(_) => false,
    }
}

/// Temperature label, e.g. `35.0°C`.
pub fn format_temperature(celsius: f32) -> String {
    format!("{:.1}°C", celsius)
}

/// Wind speed label, e.g. `12.5 m/s`.
pub fn format_wind_speed(speed: f32) -> String {
    format!("{:.1} m/s", speed)
}

/// Inked pixel bounds of `text` relative to the `draw_text_mut` origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextBounds {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl TextBounds {
    pub fn width(&self) -> i32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> i32 {
        self.max_y - self.min_y
    }
}

/// Measure `text` laid out on the same baseline `draw_text_mut` uses.
///
/// Returns `None` when nothing would be inked (empty or all-space text).
pub fn text_bounds(text: &str, font_size: f32) -> Result<Option<TextBounds>, RenderError> {
    let font = label_font()?;
    let scale = Scale::uniform(font_size);
    let ascent = font.v_metrics(scale).ascent;

    let bounds = font
        .layout(text, scale, point(0.0, ascent))
        .filter_map(|g| g.pixel_bounding_box())
        .fold(None, |acc: Option<TextBounds>, bb| {
            Some(match acc {
                None => TextBounds {
                    min_x: bb.min.x,
                    min_y: bb.min.y,
                    max_x: bb.max.x,
                    max_y: bb.max.y,
                },
                Some(b) => TextBounds {
                    min_x: b.min_x.min(bb.min.x),
                    min_y: b.min_y.min(bb.min.y),
                    max_x: b.max_x.max(bb.max.x),
                    max_y: b.max_y.max(bb.max.y),
                },
            })
        });
    Ok(bounds)
}

/// Rendered width of `text` in pixels.
pub fn text_width(text: &str, font_size: f32) -> Result<u32, RenderError> {
    Ok(text_bounds(text, font_size)?.map_or(0, |b| b.width().max(0) as u32))
}

/// Style for a label drawn on a tile.
#[derive(Debug, Clone, Copy)]
pub struct LabelStyle {
    /// Font size in pixels
    pub font_size: f32,
    pub color: [u8; 4],
    /// Drop shadow colour, offset down-right
    pub shadow: Option<[u8; 4]>,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            font_size: 14.0,
            color: [255, 255, 255, 255],
            shadow: Some([0, 0, 0, 178]),
        }
    }
}

/// Draw `text` with its inked box centred on (`center_x`, `center_y`).
///
/// Glyph pixels outside the image are clipped.
pub fn draw_label(
    image: &mut RgbaImage,
    text: &str,
    center_x: i32,
    center_y: i32,
    style: &LabelStyle,
) -> Result<(), RenderError> {
    let font = label_font()?;
    let Some(bounds) = text_bounds(text, style.font_size)? else {
        return Ok(());
    };

    let scale = Scale::uniform(style.font_size);
    let x = center_x - (bounds.min_x + bounds.max_x) / 2;
    let y = center_y - (bounds.min_y + bounds.max_y) / 2;

    if let Some(shadow) = style.shadow {
        let offset = (style.font_size / 12.0).ceil().max(1.0) as i32;
        draw_text_mut(image, Rgba(shadow), x + offset, y + offset, scale, font, text);
    }
    draw_text_mut(image, Rgba(style.color), x, y, scale, font, text);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_labels() {
        assert_eq!(format_temperature(35.0), "35.0°C");
        assert_eq!(format_temperature(-12.34), "-12.3°C");
        assert_eq!(format_wind_speed(7.26), "7.3 m/s");
    }

    #[test]
    fn test_font_loads() {
        assert!(label_font().is_ok());
    }

    #[test]
    fn test_text_width_grows_with_length() {
        assert_eq!(text_width("", 14.0).unwrap(), 0);
        let one = text_width("1", 14.0).unwrap();
        let three = text_width("111", 14.0).unwrap();
        assert!(one > 0);
        assert!(three > 2 * one);
    }

    #[test]
    fn test_draw_label_clips_at_edges() {
        let mut image = RgbaImage::new(16, 16);
        let style = LabelStyle {
            font_size: 16.0,
            shadow: None,
            ..LabelStyle::default()
        };
        // Centred on the corner, most of the label falls outside.
        draw_label(&mut image, "88.8", 0, 0, &style).unwrap();
        assert!(image.pixels().any(|p| p.0[3] > 0));
    }
}
