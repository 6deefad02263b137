use crate::math::Point2;
use crate::overlay::Overlay;
use crate::projector::Canvas;

use image::{DynamicImage, GrayImage, Rgb, RgbImage, imageops::FilterType};
use imageproc::drawing::draw_line_segment_mut;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    pub fov: Rgb<u8>,
    pub highlighted_fov: Rgb<u8>,
    pub cross_reference: Rgb<u8>,
    /// Stroke width in output pixels.
    pub stroke_width: u32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            fov: Rgb([50, 205, 50]),
            highlighted_fov: Rgb([255, 0, 0]),
            cross_reference: Rgb([50, 205, 50]),
            stroke_width: 2,
        }
    }
}

pub struct OverlayRenderer;

impl OverlayRenderer {
    /// Draw `overlays` over the zoomed slice image of one viewer.
    ///
    /// `canvas` is the unzoomed canvas of the viewer and `overlays` must
    /// already be scaled by `zoom`. Without a base image the background is black.
    pub fn render(
        base: Option<&GrayImage>,
        canvas: &Canvas,
        overlays: &[Overlay],
        zoom: f64,
        style: &OverlayStyle,
    ) -> RgbImage {
        let zoomed = canvas.scaled(zoom);
        let width = (zoomed.width.round() as u32).max(1);
        let height = (zoomed.height.round() as u32).max(1);

        let mut output = match base {
            Some(image) => {
                let resized = image::imageops::resize(image, width, height, FilterType::Triangle);
                DynamicImage::ImageLuma8(resized).to_rgb8()
            }
            None => RgbImage::new(width, height),
        };

        for overlay in overlays {
            match overlay {
                Overlay::Fov(quad) => {
                    let color = if quad.highlighted {
                        style.highlighted_fov
                    } else {
                        style.fov
                    };
                    for i in 0..quad.corners.len() {
                        let next = (i + 1) % quad.corners.len();
                        Self::stroke(&mut output, quad.corners[i], quad.corners[next], color, style);
                    }
                }
                Overlay::CrossReference(line) => {
                    Self::stroke(&mut output, line.start, line.end, style.cross_reference, style);
                }
            }
        }

        output
    }

    fn stroke(image: &mut RgbImage, from: Point2, to: Point2, color: Rgb<u8>, style: &OverlayStyle) {
        let width = style.stroke_width.max(1) as i64;
        let shift = (width - 1) / 2;
        for dx in 0..width {
            for dy in 0..width {
                let offset = ((dx - shift) as f32, (dy - shift) as f32);
                draw_line_segment_mut(
                    image,
                    (from.x as f32 + offset.0, from.y as f32 + offset.1),
                    (to.x as f32 + offset.0, to.y as f32 + offset.1),
                    color,
                );
            }
        }
    }
}
