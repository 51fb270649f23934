use nalgebra::Point2;

use crate::tree::{Quadrant, Region};

#[test]
fn test_contains_is_half_open() {
    let region = Region::new(10.0, 20.0, 8.0);

    assert!(region.contains(&Point2::new(10.0, 20.0)));
    assert!(region.contains(&Point2::new(17.999, 27.999)));
    assert!(!region.contains(&Point2::new(18.0, 20.0)));
    assert!(!region.contains(&Point2::new(10.0, 28.0)));
    assert!(!region.contains(&Point2::new(f64::NAN, 21.0)));
}

#[test]
fn test_children_tile_parent() {
    let region = Region::new(0.0, 0.0, 16.0);

    assert_eq!(region.child(Quadrant::Nw), Region::new(0.0, 0.0, 8.0));
    assert_eq!(region.child(Quadrant::Ne), Region::new(8.0, 0.0, 8.0));
    assert_eq!(region.child(Quadrant::Se), Region::new(8.0, 8.0, 8.0));
    assert_eq!(region.child(Quadrant::Sw), Region::new(0.0, 8.0, 8.0));
}

#[test]
fn test_quadrant_agrees_with_child_containment() {
    let region = Region::new(3.0, 5.0, 10.0);
    let points = [
        Point2::new(3.0, 5.0),
        Point2::new(8.0, 5.0),
        Point2::new(7.999, 10.0),
        Point2::new(8.0, 10.0),
        Point2::new(12.9, 14.9),
        Point2::new(4.0, 14.0),
    ];

    for point in points {
        let quadrant = region.quadrant(&point);
        assert!(
            region.child(quadrant).contains(&point),
            "{point:?} routed to {quadrant:?}"
        );
    }
}

#[test]
fn test_midline_goes_east_and_south() {
    let region = Region::new(0.0, 0.0, 2.0);
    assert_eq!(region.quadrant(&Point2::new(1.0, 0.5)), Quadrant::Ne);
    assert_eq!(region.quadrant(&Point2::new(0.5, 1.0)), Quadrant::Sw);
    assert_eq!(region.quadrant(&Point2::new(1.0, 1.0)), Quadrant::Se);
}
