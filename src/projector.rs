use crate::math::{Point2, Point3, Vec3};
use crate::series::SeriesGeometry;

/// Drawable area of a viewer in unzoomed pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
}

impl Canvas {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    /// Clamp a point component-wise into `[0, width] x [0, height]`.
    ///
    /// NaN components stay NaN so callers can still reject degenerate results.
    pub fn clamp(&self, point: Point2) -> Point2 {
        Point2::new(
            clamp_keep_nan(point.x, self.width),
            clamp_keep_nan(point.y, self.height),
        )
    }

    pub fn scaled(&self, zoom: f64) -> Self {
        Self::new(self.width * zoom, self.height * zoom)
    }
}

#[inline]
fn clamp_keep_nan(value: f64, max: f64) -> f64 {
    if value.is_nan() {
        value
    } else {
        value.clamp(0.0, max)
    }
}

pub struct CoordinateProjector;

impl CoordinateProjector {
    /// Pixel coordinates of a patient-space point in `target`'s image plane.
    ///
    /// The first slice origin of `target` anchors the plane. The component of
    /// the offset along the slice normal is dropped without checking, so
    /// points off the plane should go through [`Self::project_onto_plane`]
    /// first.
    pub fn pixel_coordinates(point: &Point3, target: &SeriesGeometry) -> Point2 {
        let offset = point - target.first_origin();
        let (spacing_x, spacing_y) = target.pixel_spacing();
        Point2::new(
            offset.dot(&target.row_direction()) / spacing_x,
            offset.dot(&target.col_direction()) / spacing_y,
        )
    }

    /// [`Self::pixel_coordinates`] clamped to `canvas`.
    pub fn project_point(point: &Point3, target: &SeriesGeometry, canvas: &Canvas) -> Point2 {
        canvas.clamp(Self::pixel_coordinates(point, target))
    }

    /// Orthogonal projection of `point` onto the plane through `plane_origin`
    /// with normal `plane_normal`.
    ///
    /// `plane_normal` must be unit length; any other length silently yields
    /// a skewed result.
    pub fn project_onto_plane(point: &Point3, plane_origin: &Point3, plane_normal: &Vec3) -> Point3 {
        let distance = (point - plane_origin).dot(plane_normal);
        point - plane_normal * distance
    }
}
