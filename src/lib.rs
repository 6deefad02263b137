//! # DICOM cross-reference library
//!
//! This crate correlates two independently loaded DICOM series shown side by
//! side. Given the slice selected in one viewer it computes
//!  - the cross-reference line: where that slice's plane cuts the other
//!    viewer's image plane
//!  - the field-of-view boxes: the footprint of every slice of one series
//!    projected onto the other series' image plane
//!
//! Each series is described by a [`SeriesGeometry`] (row/column axes, pixel
//! spacing, pixel grid and one origin per slice, all in patient space). The
//! [`CoordinateProjector`] maps patient-space points into a series' pixel
//! space, the [`RelationClassifier`] decides whether two series are related
//! in a way the overlays can represent, and the [`OverlayGeometryBuilder`]
//! turns both into drawable primitives.
//!
//! Only orthogonal series pairs (axial, coronal and sagittal against each
//! other) produce overlays. Parallel and oblique pairs produce nothing.
//!
//! Series can be read from a folder of DICOM files with [`SeriesLoader`];
//! files are opened and decoded in parallel using rayon. Overlays are
//! recomputed from an immutable [`ViewState`] on every selection, zoom or
//! mode change and can be drawn with [`OverlayRenderer`].
//!
//! # Examples
//!
//! ## Cross-referencing a loaded folder
//!
//! Load every series below dicom/, select the middle slice of the first
//! series on the left and the first slice of the second series on the right,
//! then compute the cross-reference lines for both viewers.
//!
//! ```no_run
//! # use dicom_crossref::{SeriesLoader, LoadOptions, ViewState, Viewer, Selection, OverlayMode};
//! let series = SeriesLoader::load_from_directory("dicom", LoadOptions::default())
//!     .expect("should have loaded series from directory");
//! let geometries: Vec<_> = series.iter().map(|s| s.geometry.clone()).collect();
//! let state = ViewState::default()
//!     .with_selection(Viewer::Left, Selection::new(0, geometries[0].slice_count() / 2))
//!     .with_selection(Viewer::Right, Selection::new(1, 0))
//!     .with_mode(OverlayMode::CrossReference);
//! let frame = state.compute_overlays(&geometries);
//! println!("{} overlays on the right viewer", frame.right.len());
//! ```

pub mod classifier;
pub mod enums;
pub mod math;
pub mod overlay;
pub mod projector;
pub mod render;
pub mod series;
pub mod series_loader;
pub mod view_state;

pub use classifier::{RelationClassifier, RelationTolerances};
pub use enums::{OverlayMode, PlaneRelation, SortBy, Viewer};
pub use overlay::{CrossReferenceLine, FovQuad, Overlay, OverlayGeometryBuilder};
pub use projector::{Canvas, CoordinateProjector};
pub use render::{OverlayRenderer, OverlayStyle};
pub use series::{GeometryError, SeriesGeometry};
pub use series_loader::{LoadOptions, LoadedSeries, SeriesLoader, SeriesLoaderError, SliceEntry};
pub use view_state::{OverlayFrame, Selection, ViewState, ViewerState};
