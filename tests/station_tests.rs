use pedalhop::{
    shared::geo::{Coordinate, Distance},
    station::{Station, filter_nearby, nearest_station},
};

fn station(name: &str, coordinate: Coordinate, bikes: u32) -> Station {
    Station {
        name: name.into(),
        bikes_available: bikes,
        docks_available: 5,
        capacity: 10,
        coordinate,
    }
}

// One degree of latitude is ~111.2 km, so 0.0045 degrees is ~500 m.
const HALF_KM_DEG: f64 = 0.0045;

#[test]
fn filter_nearby_keeps_radius_test() {
    let center = Coordinate::new(0.0, 0.0);
    let near = station("near", Coordinate::new(0.0, HALF_KM_DEG), 1);
    let far = station("far", Coordinate::new(0.0, 3.0 * HALF_KM_DEG), 1);

    let kept = filter_nearby(
        &[near.clone(), far],
        &center,
        Distance::meters(1000.0),
    );
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].name, near.name);
}

#[test]
fn filter_nearby_matches_direct_distance_test() {
    let center = Coordinate::new(121.56, 25.04);
    let radius = Distance::meters(800.0);
    let stations: Vec<Station> = (0..20)
        .map(|i| {
            let offset = i as f64 * 0.001;
            station(
                &format!("s{i}"),
                Coordinate::new(121.56 + offset, 25.04),
                1,
            )
        })
        .collect();

    let kept = filter_nearby(&stations, &center, radius);
    for s in &stations {
        let within = s.coordinate.distance_to(&center) <= radius;
        assert_eq!(kept.iter().any(|k| k.name == s.name), within);
    }
}

#[test]
fn filter_nearby_empty_input_test() {
    let kept = filter_nearby(&[], &Coordinate::new(0.0, 0.0), Distance::meters(1000.0));
    assert!(kept.is_empty());
}

#[test]
fn nearest_skips_exhausted_stations_test() {
    let start = Coordinate::new(0.0, 0.0);
    let stations = [
        station("a", Coordinate::new(0.0, 0.0), 0),
        station("b", Coordinate::new(1.0, 1.0), 5),
    ];
    let nearest = nearest_station(&stations, &start).unwrap();
    assert_eq!(nearest.name.as_ref(), "b");
}

#[test]
fn nearest_falls_back_when_all_exhausted_test() {
    let start = Coordinate::new(0.0, 0.0);
    let stations = [
        station("a", Coordinate::new(0.0, 0.001), 0),
        station("b", Coordinate::new(1.0, 1.0), 0),
    ];
    let nearest = nearest_station(&stations, &start).unwrap();
    assert_eq!(nearest.name.as_ref(), "a");
}

#[test]
fn nearest_of_empty_collection_test() {
    assert!(nearest_station(&[], &Coordinate::new(0.0, 0.0)).is_none());
}

#[test]
fn nearest_tie_breaks_on_input_order_test() {
    let start = Coordinate::new(0.0, 0.0);
    let stations = [
        station("east", Coordinate::new(0.001, 0.0), 1),
        station("west", Coordinate::new(-0.001, 0.0), 1),
    ];
    let nearest = nearest_station(&stations, &start).unwrap();
    assert_eq!(nearest.name.as_ref(), "east");
}
