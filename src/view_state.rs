//! Selection state of the two viewers and overlay recomputation.
//!
//! The state is an immutable value: every event produces a new [`ViewState`]
//! and overlays are recomputed from it in full, so there is never a window in
//! which a selection changed but the geometry read for it did not.

use crate::classifier::{RelationClassifier, RelationTolerances};
use crate::enums::{OverlayMode, Viewer};
use crate::overlay::{Overlay, OverlayGeometryBuilder};
use crate::series::SeriesGeometry;

use log::debug;

/// Zoom multiplier applied per mouse-wheel step.
pub const ZOOM_STEP: f64 = 1.2;

/// A slice of one loaded series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Position of the series in the loaded series list.
    pub series_index: usize,
    pub slice_index: usize,
}

impl Selection {
    pub fn new(series_index: usize, slice_index: usize) -> Self {
        Self {
            series_index,
            slice_index,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewerState {
    pub selection: Option<Selection>,
    pub zoom: f64,
}

impl Default for ViewerState {
    fn default() -> Self {
        Self {
            selection: None,
            zoom: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewState {
    pub left: ViewerState,
    pub right: ViewerState,
    pub mode: OverlayMode,
    pub tolerances: RelationTolerances,
}

/// Overlays to draw, grouped by the canvas they belong on.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OverlayFrame {
    pub left: Vec<Overlay>,
    pub right: Vec<Overlay>,
}

impl OverlayFrame {
    pub fn for_viewer(&self, viewer: Viewer) -> &[Overlay] {
        match viewer {
            Viewer::Left => &self.left,
            Viewer::Right => &self.right,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }

    fn for_viewer_mut(&mut self, viewer: Viewer) -> &mut Vec<Overlay> {
        match viewer {
            Viewer::Left => &mut self.left,
            Viewer::Right => &mut self.right,
        }
    }
}

impl ViewState {
    pub fn new(tolerances: RelationTolerances) -> Self {
        Self {
            tolerances,
            ..Default::default()
        }
    }

    pub fn viewer(&self, viewer: Viewer) -> &ViewerState {
        match viewer {
            Viewer::Left => &self.left,
            Viewer::Right => &self.right,
        }
    }

    fn map_viewer(mut self, viewer: Viewer, f: impl FnOnce(&mut ViewerState)) -> Self {
        match viewer {
            Viewer::Left => f(&mut self.left),
            Viewer::Right => f(&mut self.right),
        }
        self
    }

    pub fn with_selection(self, viewer: Viewer, selection: Selection) -> Self {
        self.map_viewer(viewer, |state| state.selection = Some(selection))
    }

    pub fn with_zoom(self, viewer: Viewer, zoom: f64) -> Self {
        self.map_viewer(viewer, |state| state.zoom = zoom)
    }

    /// Zoom in (positive) or out (negative) by whole wheel steps.
    pub fn with_zoom_steps(self, viewer: Viewer, steps: i32) -> Self {
        self.map_viewer(viewer, |state| state.zoom *= ZOOM_STEP.powi(steps))
    }

    pub fn with_mode(self, mode: OverlayMode) -> Self {
        Self { mode, ..self }
    }

    /// Switch `mode` on, or off if it is already active. Activating one mode
    /// deactivates the other.
    pub fn toggle_mode(self, mode: OverlayMode) -> Self {
        let mode = if self.mode == mode {
            OverlayMode::Off
        } else {
            mode
        };
        self.with_mode(mode)
    }

    /// State after a new folder was loaded: no selections, unit zoom, no overlay.
    pub fn reset(self) -> Self {
        Self::new(self.tolerances)
    }

    fn resolve<'a>(
        &self,
        viewer: Viewer,
        series: &'a [SeriesGeometry],
    ) -> Option<(&'a SeriesGeometry, usize)> {
        let selection = self.viewer(viewer).selection?;
        let geometry = series.get(selection.series_index)?;
        Some((geometry, selection.slice_index))
    }

    /// Recompute every overlay for the current state.
    ///
    /// Cross-reference mode draws each viewer's selected slice on the other
    /// viewer. Field-of-view mode draws every slice of the left series on the
    /// right viewer. Coordinates are scaled by the zoom of the viewer they are
    /// drawn on.
    pub fn compute_overlays(&self, series: &[SeriesGeometry]) -> OverlayFrame {
        let mut frame = OverlayFrame::default();
        if self.mode == OverlayMode::Off {
            return frame;
        }
        let (Some(left), Some(right)) = (
            self.resolve(Viewer::Left, series),
            self.resolve(Viewer::Right, series),
        ) else {
            debug!("Overlay skipped, both viewers need a selection");
            return frame;
        };

        if !RelationClassifier::should_overlay(
            &left.0.slice_normal(),
            &right.0.slice_normal(),
            &self.tolerances,
        ) {
            return frame;
        }

        match self.mode {
            OverlayMode::Off => {}
            OverlayMode::CrossReference => {
                let side = |viewer| match viewer {
                    Viewer::Left => left,
                    Viewer::Right => right,
                };
                for source_viewer in [Viewer::Left, Viewer::Right] {
                    let viewer = source_viewer.opposite();
                    let (source, index) = side(source_viewer);
                    let (target, _) = side(viewer);
                    let canvas = target.canvas();
                    if let Some(line) =
                        OverlayGeometryBuilder::build_cross_reference_line(source, index, target, &canvas)
                    {
                        let zoom = self.viewer(viewer).zoom;
                        frame
                            .for_viewer_mut(viewer)
                            .push(Overlay::CrossReference(line).scaled(zoom));
                    }
                }
            }
            OverlayMode::FieldOfView => {
                let (source, index) = left;
                let (target, _) = right;
                let zoom = self.right.zoom;
                frame.right = OverlayGeometryBuilder::build_fov_boxes(
                    source,
                    index,
                    target,
                    &target.canvas(),
                )
                .into_iter()
                .map(|quad| Overlay::Fov(quad.scaled(zoom)))
                .collect();
            }
        }

        frame
    }
}
