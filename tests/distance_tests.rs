use pedalhop::shared::geo::Coordinate;

#[test]
fn distance_test() {
    let coord_a = Coordinate {
        longitude: 2.3514350059357927,
        latitude: 48.85800943005911,
    };
    let coord_b = Coordinate {
        longitude: -0.12495407345099824,
        latitude: 51.5052389927712,
    };
    let d = coord_a.distance_to(&coord_b);
    assert!((d.as_kilometers() - 343.5).abs() < 2.0);
}

#[test]
fn distance_zero_for_identical_test() {
    let coords = [
        Coordinate::new(0.0, 0.0),
        Coordinate::new(121.5654, 25.033),
        Coordinate::new(-0.1249, 51.5052),
        Coordinate::new(179.9, -45.0),
    ];
    for coord in coords {
        let d = coord.distance_to(&coord);
        assert!(!d.as_meters().is_nan());
        assert!(d.as_meters().abs() < 1e-6);
    }
}

#[test]
fn distance_symmetry_test() {
    let pairs = [
        (Coordinate::new(121.56, 25.04), Coordinate::new(121.57, 25.05)),
        (Coordinate::new(2.3514, 48.858), Coordinate::new(-0.1249, 51.5052)),
        (Coordinate::new(0.0, 0.0), Coordinate::new(180.0, 0.0)),
    ];
    for (a, b) in pairs {
        assert_eq!(a.distance_to(&b).as_meters(), b.distance_to(&a).as_meters());
    }
}

#[test]
fn distance_never_nan_test() {
    let antipodal = Coordinate::new(180.0, 0.0);
    let origin = Coordinate::new(0.0, 0.0);
    assert!(!origin.distance_to(&antipodal).as_meters().is_nan());
    assert!(!origin.distance_to(&origin).as_meters().is_nan());
}
