use crate::math::{Point3, Vec3};
use crate::projector::Canvas;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("Series has no slice positions")]
    EmptySeries,

    #[error("Pixel spacing must be positive and finite, got ({0}, {1})")]
    InvalidSpacing(f64, f64),

    #[error("Pixel grid must not be empty, got {0}x{1}")]
    ZeroSizedGrid(u32, u32),

    #[error("Slice index {index} out of range for series with {len} slices")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Spatial frame of one image series in patient space.
///
/// All slices share the row/column axes, the pixel spacing and the pixel grid;
/// only the per-slice origin (the position of the top-left pixel) differs.
/// Nothing geometric changes after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesGeometry {
    series_id: String,
    row_direction: Vec3,
    col_direction: Vec3,
    pixel_spacing_x: f64,
    pixel_spacing_y: f64,
    width: u32,
    height: u32,
    slice_origins: Vec<Point3>,
    slice_thickness: f64,
    expanded: bool,
}

impl SeriesGeometry {
    /// Build the geometry of a series.
    ///
    /// # Arguments
    ///
    /// * `row_direction`, `col_direction` - Image axes in patient space, expected to be unit length
    /// * `pixel_spacing_x`, `pixel_spacing_y` - Millimetres per pixel along the row and column axes
    /// * `width`, `height` - Pixel grid size (columns, rows)
    /// * `slice_origins` - Patient-space position of each slice's first pixel, in slice order
    ///
    /// # Errors
    ///
    /// Returns error if there are no slices, the spacing is not strictly
    /// positive or the pixel grid is empty. The axes are not validated.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        series_id: impl Into<String>,
        row_direction: Vec3,
        col_direction: Vec3,
        pixel_spacing_x: f64,
        pixel_spacing_y: f64,
        width: u32,
        height: u32,
        slice_origins: Vec<Point3>,
    ) -> Result<Self, GeometryError> {
        if slice_origins.is_empty() {
            return Err(GeometryError::EmptySeries);
        }
        let valid_spacing = |s: f64| s.is_finite() && s > 0.0;
        if !valid_spacing(pixel_spacing_x) || !valid_spacing(pixel_spacing_y) {
            return Err(GeometryError::InvalidSpacing(pixel_spacing_x, pixel_spacing_y));
        }
        if width == 0 || height == 0 {
            return Err(GeometryError::ZeroSizedGrid(width, height));
        }

        Ok(Self {
            series_id: series_id.into(),
            row_direction,
            col_direction,
            pixel_spacing_x,
            pixel_spacing_y,
            width,
            height,
            slice_origins,
            slice_thickness: 1.0,
            expanded: false,
        })
    }

    /// Attach the nominal slice thickness in millimetres (display only).
    pub fn with_slice_thickness(mut self, thickness: f64) -> Self {
        self.slice_thickness = thickness;
        self
    }

    pub fn series_id(&self) -> &str {
        &self.series_id
    }

    pub fn row_direction(&self) -> Vec3 {
        self.row_direction
    }

    pub fn col_direction(&self) -> Vec3 {
        self.col_direction
    }

    pub fn pixel_spacing(&self) -> (f64, f64) {
        (self.pixel_spacing_x, self.pixel_spacing_y)
    }

    /// Get the pixel grid size (width, height)
    pub fn dim(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn slice_thickness(&self) -> f64 {
        self.slice_thickness
    }

    pub fn slice_count(&self) -> usize {
        self.slice_origins.len()
    }

    pub fn slice_origins(&self) -> &[Point3] {
        &self.slice_origins
    }

    /// Raw cross product of the row and column directions.
    ///
    /// Recomputed on every call; it is not renormalized.
    pub fn slice_normal(&self) -> Vec3 {
        self.row_direction.cross(&self.col_direction)
    }

    /// The slice normal scaled to unit length, `None` if the axes are parallel or zero.
    pub fn unit_normal(&self) -> Option<Vec3> {
        self.slice_normal().try_normalize(f64::EPSILON)
    }

    /// Origin of the slice at `index`.
    pub fn origin_of(&self, index: usize) -> Result<Point3, GeometryError> {
        self.slice_origins
            .get(index)
            .copied()
            .ok_or(GeometryError::IndexOutOfRange {
                index,
                len: self.slice_origins.len(),
            })
    }

    /// Origin of the first slice. Always present.
    pub fn first_origin(&self) -> Point3 {
        self.slice_origins[0]
    }

    /// Extent of one slice along the row and column axes, in patient space.
    fn extents(&self) -> (Vec3, Vec3) {
        (
            self.row_direction * (self.pixel_spacing_x * f64::from(self.width)),
            self.col_direction * (self.pixel_spacing_y * f64::from(self.height)),
        )
    }

    /// Patient-space corners of a slice, walking origin, along the row, across, back.
    pub fn slice_corners(&self, index: usize) -> Result<[Point3; 4], GeometryError> {
        let origin = self.origin_of(index)?;
        let (across_row, across_col) = self.extents();
        let c2 = origin + across_row;
        Ok([origin, c2, c2 + across_col, origin + across_col])
    }

    /// Patient-space centre of a slice.
    pub fn slice_center(&self, index: usize) -> Result<Point3, GeometryError> {
        let origin = self.origin_of(index)?;
        let (across_row, across_col) = self.extents();
        Ok(origin + across_row * 0.5 + across_col * 0.5)
    }

    /// The pixel canvas of this series, used as the default clamp bounds.
    pub fn canvas(&self) -> Canvas {
        Canvas::new(f64::from(self.width), f64::from(self.height))
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Toggle the thumbnail list of this series open or closed. No geometric effect.
    pub fn set_expanded(&mut self, expanded: bool) {
        self.expanded = expanded;
    }
}
