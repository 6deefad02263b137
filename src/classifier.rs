use crate::enums::PlaneRelation;
use crate::math::Vec3;

use log::debug;

/// Thresholds used to compare two slice normals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelationTolerances {
    /// Maximum euclidean distance for two normals to count as equal.
    pub equality: f64,
    /// Maximum absolute dot product for two normals to count as orthogonal.
    pub orthogonality: f64,
}

impl Default for RelationTolerances {
    fn default() -> Self {
        Self {
            equality: 0.01,
            orthogonality: 0.05,
        }
    }
}

/// Decides whether overlays between two series are meaningful.
///
/// Only orthogonal pairs get overlays: the cross-reference line is drawn as a
/// single vertical line, which is only exact when the planes are
/// perpendicular. Parallel and oblique pairs yield no overlay.
pub struct RelationClassifier;

impl RelationClassifier {
    /// True if the squared distance between `a` and `b` is below `tolerance²`.
    ///
    /// Antiparallel normals (`n` and `-n`) are not equal under this test.
    pub fn are_approximately_equal(a: &Vec3, b: &Vec3, tolerance: f64) -> bool {
        (a - b).norm_squared() < tolerance * tolerance
    }

    /// True if `|a · b|` is below `tolerance`.
    pub fn are_orthogonal(a: &Vec3, b: &Vec3, tolerance: f64) -> bool {
        a.dot(b).abs() < tolerance
    }

    pub fn classify(a: &Vec3, b: &Vec3, tolerances: &RelationTolerances) -> PlaneRelation {
        if Self::are_approximately_equal(a, b, tolerances.equality) {
            PlaneRelation::SameOrientation
        } else if Self::are_orthogonal(a, b, tolerances.orthogonality) {
            PlaneRelation::Orthogonal
        } else {
            PlaneRelation::Oblique
        }
    }

    /// Gate applied before any overlay is built.
    pub fn should_overlay(a: &Vec3, b: &Vec3, tolerances: &RelationTolerances) -> bool {
        let relation = Self::classify(a, b, tolerances);
        if relation != PlaneRelation::Orthogonal {
            debug!("Overlay suppressed, planes are {relation:?} ({a:?} vs {b:?})");
        }
        relation == PlaneRelation::Orthogonal
    }
}
