//! Bar chart of per-bucket totals, rasterized to PNG.
//!
//! One bar per bucket in key order, scaled to the largest total. No text is
//! drawn; the JSON routes carry the numbers.

use costboard_common::BucketTotals;
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use thiserror::Error;

pub const WIDTH: u32 = 800;
pub const HEIGHT: u32 = 400;
const MARGIN: u32 = 24;
const GAP: u32 = 4;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([64, 64, 64]);
const BAR: Rgb<u8> = Rgb([58, 110, 165]);

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("png encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Render `totals` as a PNG. Negative and non-finite totals draw as empty bars.
pub fn render_bar_chart(totals: &BucketTotals) -> Result<Vec<u8>, ChartError> {
    let mut img = RgbImage::from_pixel(WIDTH, HEIGHT, BACKGROUND);

    let plot_left = MARGIN;
    let plot_right = WIDTH - MARGIN;
    let baseline = HEIGHT - MARGIN;
    let plot_height = baseline - MARGIN;

    let max = totals
        .values()
        .copied()
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);

    if !totals.is_empty() && max > 0.0 {
        let count = totals.len() as u32;
        let slot = ((plot_right - plot_left) / count).max(1);
        let bar_width = slot.saturating_sub(GAP).max(1);

        for (i, value) in totals.values().enumerate() {
            let height = bar_height(*value, max, plot_height);
            if height == 0 {
                continue;
            }
            let x0 = plot_left + i as u32 * slot + GAP / 2;
            fill_rect(&mut img, x0, baseline - height, bar_width, height, BAR);
        }
    }

    // Axes last so bars never cover them.
    fill_rect(&mut img, plot_left, MARGIN, 1, plot_height + 1, AXIS);
    fill_rect(&mut img, plot_left, baseline, plot_right - plot_left, 1, AXIS);

    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    tracing::debug!(bars = totals.len(), bytes = png.len(), "chart rendered");
    Ok(png)
}

fn bar_height(value: f64, max: f64, plot_height: u32) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let scaled = (value / max * f64::from(plot_height)).round();
    (scaled as u32).clamp(1, plot_height)
}

fn fill_rect(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
    let x_end = (x + w).min(img.width());
    let y_end = (y + h).min(img.height());
    for py in y..y_end {
        for px in x..x_end {
            img.put_pixel(px, py, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    fn totals(values: &[(&str, f64)]) -> BucketTotals {
        values.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn decode(png: &[u8]) -> RgbImage {
        image::load_from_memory_with_format(png, ImageFormat::Png)
            .unwrap()
            .to_rgb8()
    }

    #[test]
    fn renders_png_with_expected_size() {
        let png = render_bar_chart(&totals(&[("2024-01-01", 10.0), ("2024-02-01", 5.0)])).unwrap();
        assert_eq!(&png[..8], &PNG_SIGNATURE);
        let img = decode(&png);
        assert_eq!(img.dimensions(), (WIDTH, HEIGHT));
    }

    #[test]
    fn tallest_bar_reaches_top_of_plot() {
        let png = render_bar_chart(&totals(&[("a", 10.0), ("b", 5.0)])).unwrap();
        let img = decode(&png);
        let slot = (WIDTH - 2 * MARGIN) / 2;
        let first_bar_x = MARGIN + GAP / 2 + 2;
        let second_bar_x = MARGIN + slot + GAP / 2 + 2;

        assert_eq!(*img.get_pixel(first_bar_x, MARGIN + 1), BAR);
        assert_eq!(*img.get_pixel(second_bar_x, MARGIN + 1), BACKGROUND);
        assert_eq!(*img.get_pixel(second_bar_x, HEIGHT - MARGIN - 1), BAR);
    }

    #[test]
    fn empty_and_negative_totals_still_render() {
        let png = render_bar_chart(&BucketTotals::new()).unwrap();
        assert_eq!(&png[..8], &PNG_SIGNATURE);

        let png = render_bar_chart(&totals(&[("a", -3.0), ("b", f64::NAN)])).unwrap();
        let img = decode(&png);
        assert_eq!(*img.get_pixel(MARGIN + 10, HEIGHT - MARGIN - 1), BACKGROUND);
    }

    #[test]
    fn bar_height_clamps() {
        assert_eq!(bar_height(0.0, 10.0, 100), 0);
        assert_eq!(bar_height(-1.0, 10.0, 100), 0);
        assert_eq!(bar_height(0.0001, 10.0, 100), 1);
        assert_eq!(bar_height(10.0, 10.0, 100), 100);
    }
}
