use dicom_crossref::{
    math::{Point2, Point3, Vec3},
    Canvas, CoordinateProjector, Overlay, OverlayGeometryBuilder, OverlayMode, RelationClassifier,
    RelationTolerances, Selection, SeriesGeometry, ViewState, Viewer,
};

/// Axial series A and coronal series B, 1 mm pixels on a 256x256 grid.
fn scenario() -> (SeriesGeometry, SeriesGeometry) {
    let a = SeriesGeometry::new(
        "A",
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        1.0,
        1.0,
        256,
        256,
        vec![Point3::new(0.0, 0.0, 0.0)],
    )
    .unwrap();
    let b = SeriesGeometry::new(
        "B",
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, 1.0),
        1.0,
        1.0,
        256,
        256,
        vec![Point3::new(0.0, -50.0, 0.0)],
    )
    .unwrap();
    (a, b)
}

#[test]
fn normals_are_orthogonal_and_distinct() {
    let (a, b) = scenario();
    assert_eq!(a.slice_normal(), Vec3::new(0.0, 0.0, 1.0));
    assert_eq!(b.slice_normal(), Vec3::new(0.0, -1.0, 0.0));
    assert!(RelationClassifier::should_overlay(
        &a.slice_normal(),
        &b.slice_normal(),
        &RelationTolerances::default()
    ));
}

#[test]
fn center_of_a_lands_on_top_edge_of_b() {
    let (a, b) = scenario();
    let center = a.slice_center(0).unwrap();
    assert_eq!(center, Point3::new(128.0, 128.0, 0.0));

    let on_b = CoordinateProjector::project_onto_plane(
        &center,
        &b.first_origin(),
        &b.unit_normal().unwrap(),
    );
    assert_eq!(on_b, Point3::new(128.0, -50.0, 0.0));
    assert_eq!(
        CoordinateProjector::pixel_coordinates(&on_b, &b),
        Point2::new(128.0, 0.0)
    );

    let line = OverlayGeometryBuilder::build_cross_reference_line(&a, 0, &b, &b.canvas()).unwrap();
    assert_eq!(line.start, Point2::new(128.0, 0.0));
    assert_eq!(line.end, Point2::new(128.0, 256.0));
}

#[test]
fn center_of_b_is_clamped_on_a() {
    let (a, b) = scenario();
    // B's centre (128, -50, 128) lands at y = -50 in A and is clamped to 0.
    let line = OverlayGeometryBuilder::build_cross_reference_line(&b, 0, &a, &a.canvas()).unwrap();
    assert_eq!(line.anchor, Point2::new(128.0, 0.0));
}

#[test]
fn results_are_deterministic() {
    let (a, b) = scenario();
    let first = OverlayGeometryBuilder::build_cross_reference_line(&a, 0, &b, &b.canvas());
    for _ in 0..10 {
        let (a, b) = scenario();
        assert_eq!(
            OverlayGeometryBuilder::build_cross_reference_line(&a, 0, &b, &b.canvas()),
            first
        );
    }
}

#[test]
fn parallel_series_get_no_line() {
    let (a, _) = scenario();
    let shifted = SeriesGeometry::new(
        "A2",
        Vec3::x(),
        Vec3::y(),
        1.0,
        1.0,
        256,
        256,
        vec![Point3::new(0.0, 0.0, 20.0)],
    )
    .unwrap();

    assert!(OverlayGeometryBuilder::build_cross_reference_line(&a, 0, &shifted, &shifted.canvas()).is_none());
    assert!(OverlayGeometryBuilder::build_cross_reference_line(&shifted, 0, &a, &a.canvas()).is_none());

    let state = ViewState::default()
        .with_selection(Viewer::Left, Selection::new(0, 0))
        .with_selection(Viewer::Right, Selection::new(1, 0))
        .with_mode(OverlayMode::CrossReference);
    assert!(state.compute_overlays(&[a, shifted]).is_empty());
}

#[test]
fn fov_boxes_stay_inside_canvas() {
    let (a, b) = scenario();
    let canvas = Canvas::new(128.0, 128.0);
    let boxes = OverlayGeometryBuilder::build_fov_boxes(&a, 0, &b, &canvas);
    assert_eq!(boxes.len(), 1);
    assert!(boxes[0].highlighted);
    for corner in boxes[0].corners {
        assert!((0.0..=128.0).contains(&corner.x));
        assert!((0.0..=128.0).contains(&corner.y));
    }
}

#[test]
fn view_state_draws_both_lines_with_target_zoom() {
    let (a, b) = scenario();
    let frame = ViewState::default()
        .with_selection(Viewer::Left, Selection::new(0, 0))
        .with_selection(Viewer::Right, Selection::new(1, 0))
        .with_mode(OverlayMode::CrossReference)
        .with_zoom_steps(Viewer::Right, 1)
        .compute_overlays(&[a, b]);

    let [Overlay::CrossReference(on_right)] = frame.right.as_slice() else {
        panic!("expected one line on the right viewer");
    };
    approx::assert_relative_eq!(on_right.start.x, 128.0 * 1.2);
    approx::assert_relative_eq!(on_right.end.y, 256.0 * 1.2);
    assert_eq!(frame.left.len(), 1);
}
