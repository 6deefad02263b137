/// Which of the two side-by-side viewers an action refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Viewer {
    Left,
    Right,
}

impl Viewer {
    /// The viewer on the other side.
    pub fn opposite(self) -> Self {
        match self {
            Viewer::Left => Viewer::Right,
            Viewer::Right => Viewer::Left,
        }
    }
}

/// Overlay currently drawn on top of the viewers. At most one is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlayMode {
    #[default]
    Off,
    CrossReference,
    FieldOfView,
}

/// Geometric relationship between two image planes, judged from their normals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneRelation {
    /// Normals are (nearly) identical: the planes are parallel.
    SameOrientation,
    /// Normals are (nearly) perpendicular.
    Orthogonal,
    /// Anything else, including antiparallel normals.
    Oblique,
}

/// Order of the slices within a loaded series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    /// Distance of each slice origin along the series' slice normal.
    #[default]
    ImagePositionPatient,
    InstanceNumber,
    /// Keep the order in which files were found.
    None,
}
