use crate::classifier::{RelationClassifier, RelationTolerances};
use crate::math::Point2;
use crate::projector::{Canvas, CoordinateProjector};
use crate::series::SeriesGeometry;

use log::debug;

/// Footprint of one source slice drawn on the target canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct FovQuad {
    pub slice_index: usize,
    pub corners: [Point2; 4],
    /// Set for the currently selected source slice. Display only.
    pub highlighted: bool,
}

impl FovQuad {
    pub fn scaled(&self, zoom: f64) -> Self {
        Self {
            corners: self.corners.map(|c| scale(c, zoom)),
            ..self.clone()
        }
    }
}

/// Where the selected source slice cuts the target plane.
///
/// Always a vertical segment at the projected x spanning the whole canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossReferenceLine {
    pub start: Point2,
    pub end: Point2,
    /// Projected centre of the source slice.
    pub anchor: Point2,
}

impl CrossReferenceLine {
    pub fn scaled(&self, zoom: f64) -> Self {
        Self {
            start: scale(self.start, zoom),
            end: scale(self.end, zoom),
            anchor: scale(self.anchor, zoom),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Overlay {
    Fov(FovQuad),
    CrossReference(CrossReferenceLine),
}

impl Overlay {
    pub fn scaled(&self, zoom: f64) -> Self {
        match self {
            Overlay::Fov(quad) => Overlay::Fov(quad.scaled(zoom)),
            Overlay::CrossReference(line) => Overlay::CrossReference(line.scaled(zoom)),
        }
    }
}

#[inline]
fn scale(point: Point2, zoom: f64) -> Point2 {
    Point2::new(point.x * zoom, point.y * zoom)
}

pub struct OverlayGeometryBuilder;

impl OverlayGeometryBuilder {
    /// One quad per slice of `source`, in slice order, projected into `target`.
    ///
    /// Corners are projected directly without a plane projection, which is
    /// only exact for orthogonal planes. `highlight_index` may be out of
    /// range, in which case nothing is highlighted. A slice whose corners do
    /// not project to finite coordinates is left out; `slice_index` still
    /// names the source slice of every remaining quad.
    pub fn build_fov_boxes(
        source: &SeriesGeometry,
        highlight_index: usize,
        target: &SeriesGeometry,
        canvas: &Canvas,
    ) -> Vec<FovQuad> {
        (0..source.slice_count())
            .filter_map(|index| {
                let corners = source
                    .slice_corners(index)
                    .ok()?
                    .map(|corner| CoordinateProjector::pixel_coordinates(&corner, target));
                if corners.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
                    debug!("No FOV box for slice {index}: degenerate projection {corners:?}");
                    return None;
                }
                Some(FovQuad {
                    slice_index: index,
                    corners: corners.map(|corner| canvas.clamp(corner)),
                    highlighted: index == highlight_index,
                })
            })
            .collect()
    }

    /// Cross-reference line of slice `source_index` of `source` on `target`.
    ///
    /// Returns `None` if the index is out of range, the two series share the
    /// same orientation, the target normal is degenerate, or the projection is
    /// not finite.
    pub fn build_cross_reference_line(
        source: &SeriesGeometry,
        source_index: usize,
        target: &SeriesGeometry,
        canvas: &Canvas,
    ) -> Option<CrossReferenceLine> {
        if target.slice_count() == 0 {
            return None;
        }
        let Ok(center) = source.slice_center(source_index) else {
            debug!(
                "No cross-reference line: slice {source_index} not in series {}",
                source.series_id()
            );
            return None;
        };
        let normal = target.unit_normal()?;
        if RelationClassifier::are_approximately_equal(
            &source.slice_normal(),
            &target.slice_normal(),
            RelationTolerances::default().equality,
        ) {
            debug!(
                "No cross-reference line: {} and {} are parallel",
                source.series_id(),
                target.series_id()
            );
            return None;
        }

        let on_plane =
            CoordinateProjector::project_onto_plane(&center, &target.first_origin(), &normal);
        let raw = CoordinateProjector::pixel_coordinates(&on_plane, target);
        if !raw.x.is_finite() || !raw.y.is_finite() {
            debug!("No cross-reference line: degenerate projection {raw:?}");
            return None;
        }

        let anchor = canvas.clamp(raw);
        Some(CrossReferenceLine {
            start: Point2::new(anchor.x, 0.0),
            end: Point2::new(anchor.x, canvas.height),
            anchor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Point3, Vec3};
    use crate::series::tests::axial;

    fn coronal(origin: Point3) -> SeriesGeometry {
        SeriesGeometry::new("cor", Vec3::x(), Vec3::z(), 1.0, 1.0, 256, 256, vec![origin]).unwrap()
    }

    fn sagittal(origins: Vec<Point3>) -> SeriesGeometry {
        SeriesGeometry::new("sag", Vec3::y(), Vec3::z(), 1.0, 1.0, 256, 256, origins).unwrap()
    }

    #[test]
    fn test_fov_boxes_one_per_slice_in_order() {
        let source = axial(
            "a",
            (0..5).map(|z| Point3::new(0.0, 0.0, z as f64 * 10.0)).collect(),
        );
        let target = coronal(Point3::new(0.0, 0.0, 0.0));
        let boxes = OverlayGeometryBuilder::build_fov_boxes(&source, 2, &target, &target.canvas());

        assert_eq!(boxes.len(), 5);
        for (i, quad) in boxes.iter().enumerate() {
            assert_eq!(quad.slice_index, i);
            assert_eq!(quad.highlighted, i == 2);
            // Axial slice at z = 10 i seen edge-on in the coronal plane.
            assert_eq!(quad.corners[0], Point2::new(0.0, i as f64 * 10.0));
            assert_eq!(quad.corners[1], Point2::new(256.0, i as f64 * 10.0));
        }
    }

    #[test]
    fn test_fov_boxes_count_independent_of_target() {
        let source = axial("a", vec![Point3::origin(); 3]);
        let same = axial("b", vec![Point3::origin()]);
        let other = sagittal(vec![Point3::new(40.0, 0.0, 0.0)]);

        for target in [&same, &other] {
            let boxes =
                OverlayGeometryBuilder::build_fov_boxes(&source, 7, target, &target.canvas());
            assert_eq!(boxes.len(), 3);
            assert!(boxes.iter().all(|quad| !quad.highlighted));
        }
    }

    #[test]
    fn test_fov_corners_clamped() {
        let source = axial("a", vec![Point3::new(-100.0, 0.0, 500.0)]);
        let target = coronal(Point3::origin());
        let boxes = OverlayGeometryBuilder::build_fov_boxes(&source, 0, &target, &target.canvas());
        for corner in boxes[0].corners {
            assert!((0.0..=256.0).contains(&corner.x));
            assert!((0.0..=256.0).contains(&corner.y));
        }
    }

    #[test]
    fn test_cross_reference_line_orthogonal() {
        let source = sagittal(vec![Point3::new(64.0, 0.0, 0.0)]);
        let target = axial("a", vec![Point3::origin()]);
        let line =
            OverlayGeometryBuilder::build_cross_reference_line(&source, 0, &target, &target.canvas())
                .unwrap();

        assert_eq!(line.start, Point2::new(64.0, 0.0));
        assert_eq!(line.end, Point2::new(64.0, 256.0));
        assert_eq!(line.anchor, Point2::new(64.0, 128.0));
    }

    #[test]
    fn test_cross_reference_line_parallel_series() {
        let source = axial("a", vec![Point3::origin()]);
        let target = axial("b", vec![Point3::new(0.0, 0.0, 20.0)]);
        assert!(
            OverlayGeometryBuilder::build_cross_reference_line(&source, 0, &target, &target.canvas())
                .is_none()
        );
    }

    #[test]
    fn test_fov_boxes_skip_non_finite_slice() {
        let source = axial(
            "a",
            vec![
                Point3::new(0.0, 0.0, 5.0),
                Point3::new(f64::NAN, 0.0, 0.0),
                Point3::new(0.0, 0.0, 15.0),
            ],
        );
        let target = coronal(Point3::origin());
        let boxes = OverlayGeometryBuilder::build_fov_boxes(&source, 1, &target, &target.canvas());

        let indices: Vec<_> = boxes.iter().map(|quad| quad.slice_index).collect();
        assert_eq!(indices, vec![0, 2]);
        assert!(boxes.iter().all(|quad| !quad.highlighted));
        for corner in boxes.iter().flat_map(|quad| quad.corners) {
            assert!(corner.x.is_finite() && corner.y.is_finite());
        }
    }

    #[test]
    fn test_cross_reference_line_out_of_range() {
        let source = sagittal(vec![Point3::origin()]);
        let target = axial("a", vec![Point3::origin()]);
        assert!(
            OverlayGeometryBuilder::build_cross_reference_line(&source, 1, &target, &target.canvas())
                .is_none()
        );
    }

    #[test]
    fn test_cross_reference_line_degenerate_target() {
        let source = sagittal(vec![Point3::origin()]);
        let flat = SeriesGeometry::new("flat", Vec3::x(), Vec3::x(), 1.0, 1.0, 8, 8, vec![
            Point3::origin(),
        ])
        .unwrap();
        assert!(
            OverlayGeometryBuilder::build_cross_reference_line(&source, 0, &flat, &flat.canvas())
                .is_none()
        );
    }

    #[test]
    fn test_cross_reference_line_non_finite_origin() {
        let source = sagittal(vec![Point3::new(f64::NAN, 0.0, 0.0)]);
        let target = axial("a", vec![Point3::origin()]);
        assert!(
            OverlayGeometryBuilder::build_cross_reference_line(&source, 0, &target, &target.canvas())
                .is_none()
        );
    }

    #[test]
    fn test_scaled_overlay() {
        let line = CrossReferenceLine {
            start: Point2::new(10.0, 0.0),
            end: Point2::new(10.0, 100.0),
            anchor: Point2::new(10.0, 50.0),
        };
        let Overlay::CrossReference(scaled) = Overlay::CrossReference(line).scaled(2.0) else {
            panic!("scaling changed the overlay kind");
        };
        assert_eq!(scaled.end, Point2::new(20.0, 200.0));
        assert_eq!(scaled.anchor, Point2::new(20.0, 100.0));
    }
}
