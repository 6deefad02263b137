//! Vector types shared by the geometry modules.
//!
//! Thin aliases over nalgebra so patient-space points, direction vectors and
//! canvas points read as what they are.

/// A point in 3D patient space, in millimetres.
pub type Point3 = nalgebra::Point3<f64>;

/// A direction or offset in 3D patient space.
pub type Vec3 = nalgebra::Vector3<f64>;

/// A point in 2D pixel (canvas) space.
pub type Point2 = nalgebra::Point2<f64>;
