use buswatch::{
    Error,
    network::Network,
    shared::geo::{Coordinate, Distance},
    store::{RouteRecord, StopRecord},
};

fn route(number: &str, name: &str, stops: &[(&str, f64, f64)]) -> RouteRecord {
    RouteRecord {
        number: number.into(),
        name: name.into(),
        active: true,
        stops: stops
            .iter()
            .map(|(stop_name, lat, lon)| StopRecord {
                name: (*stop_name).into(),
                coordinate: Coordinate::new(*lat, *lon),
                arrival_label: None,
            })
            .collect(),
        path: Vec::new(),
    }
}

fn sample_network() -> Network {
    Network::from_records(vec![
        route("101", "City Center Loop", &[
            ("City Center", 26.8467, 80.9462),
            ("Hazratganj", 26.8560, 80.9442),
            ("University", 26.8689, 80.9322),
        ]),
        route("202", "Airport Express", &[
            ("Airport", 26.7606, 80.8892),
            ("Charbagh", 26.8307, 80.9126),
            ("Phoenix Mall", 26.8467, 80.9462),
        ]),
        route("303", "Old Town Circular", &[
            ("Hazratganj", 26.8560, 80.9442),
            ("Aminabad", 26.8501, 80.9167),
            ("Chowk", 26.8669, 80.9102),
        ]),
    ])
    .unwrap()
}

#[test]
fn text_search_matches_name_fragments_case_insensitively() {
    let network = sample_network();
    let matches = network.search_routes_by_text("AIRPORT", 10).unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].number.as_ref(), "202");
}

#[test]
fn text_search_matches_route_numbers() {
    let network = sample_network();
    let matches = network.search_routes_by_text("30", 10).unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].number.as_ref(), "303");
}

#[test]
fn empty_query_browses_all_routes_in_stable_order() {
    let network = sample_network();
    let browsed = network.search_routes_by_text("", 10).unwrap();
    let numbers: Vec<_> = browsed.iter().map(|route| route.number.as_ref()).collect();
    assert_eq!(numbers, vec!["101", "202", "303"]);

    let limited = network.search_routes_by_text("", 2).unwrap();
    assert_eq!(limited.len(), 2);
    assert_eq!(limited[0].number.as_ref(), "101");
    assert_eq!(limited[1].number.as_ref(), "202");
}

#[test]
fn zero_limit_is_invalid() {
    let network = sample_network();
    assert!(matches!(
        network.search_routes_by_text("", 0),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn stops_on_route_filters_by_substring() {
    let network = sample_network();
    let stops = network.stops_on_route("101", Some("ganj")).unwrap();
    assert_eq!(stops.len(), 1);
    assert_eq!(stops[0].name.as_ref(), "Hazratganj");

    let all = network.stops_on_route("101", None).unwrap();
    assert_eq!(all.len(), 3);
}

#[test]
fn stops_on_unknown_route_is_not_found() {
    let network = sample_network();
    assert!(matches!(
        network.stops_on_route("999", None),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn search_near_ranks_routes_by_closest_stop() {
    let network = sample_network();
    // Standing at Aminabad: route 303 stops there, 101 is about a
    // kilometer and a half out, 202 further still.
    let origin = Coordinate::new(26.8501, 80.9167);
    let nearby = network
        .search_near(&origin, Distance::from_kilometers(10.0), 10)
        .unwrap();
    let numbers: Vec<_> = nearby
        .iter()
        .map(|(route, _)| route.number.as_ref())
        .collect();
    assert_eq!(numbers[0], "303");
    assert!(nearby[0].1.as_meters() < 1.0);
    for pair in nearby.windows(2) {
        assert!(pair[0].1 <= pair[1].1);
    }
}

#[test]
fn search_near_breaks_distance_ties_by_route_number() {
    let network = sample_network();
    // City Center and Phoenix Mall share coordinates, so 101 and 202 tie.
    let origin = Coordinate::new(26.8467, 80.9462);
    let nearby = network
        .search_near(&origin, Distance::from_meters(200.0), 10)
        .unwrap();
    let numbers: Vec<_> = nearby
        .iter()
        .map(|(route, _)| route.number.as_ref())
        .collect();
    assert_eq!(numbers, vec!["101", "202"]);
}

#[test]
fn search_near_ranks_by_stop_distance_not_path_distance() {
    // Route 401's path runs through the origin but its only stop is about
    // 2.8km out; route 402 has a stop a kilometer away. The nearby stop
    // wins even though 401's geometry is closer.
    let mut brushing = route("401", "Ring Road Express", &[("University", 26.8689, 80.9322)]);
    brushing.path = vec![
        Coordinate::new(26.8467, 80.9462),
        Coordinate::new(26.8560, 80.9442),
    ];
    let network = Network::from_records(vec![
        brushing,
        route("402", "Hazratganj Shuttle", &[("Hazratganj", 26.8560, 80.9442)]),
    ])
    .unwrap();

    let origin = Coordinate::new(26.8467, 80.9462);
    let nearby = network
        .search_near(&origin, Distance::from_kilometers(5.0), 10)
        .unwrap();
    let numbers: Vec<_> = nearby
        .iter()
        .map(|(route, _)| route.number.as_ref())
        .collect();
    assert_eq!(numbers, vec!["402", "401"]);
    // 401 still matches through its path, ranked by its distant stop.
    assert!(nearby[1].1.as_kilometers() > 2.0);
}

#[test]
fn stopless_route_falls_back_to_path_distance() {
    let mut depot = route("501", "Depot Link", &[]);
    depot.path = vec![
        Coordinate::new(26.8467, 80.9462),
        Coordinate::new(26.8560, 80.9442),
    ];
    let network = Network::from_records(vec![depot]).unwrap();

    let nearby = network
        .search_near(
            &Coordinate::new(26.8467, 80.9462),
            Distance::from_meters(500.0),
            10,
        )
        .unwrap();
    assert_eq!(nearby.len(), 1);
    assert!(nearby[0].1.as_meters() < 1.0);
}

#[test]
fn search_near_respects_limit() {
    let network = sample_network();
    let origin = Coordinate::new(26.8467, 80.9462);
    let nearby = network
        .search_near(&origin, Distance::from_kilometers(20.0), 1)
        .unwrap();
    assert_eq!(nearby.len(), 1);
}

#[test]
fn out_of_range_radius_is_rejected_not_clamped() {
    let network = sample_network();
    let origin = Coordinate::new(26.8467, 80.9462);

    for radius in [
        Distance::from_meters(0.0),
        Distance::from_meters(-5.0),
        Distance::from_kilometers(50.001),
    ] {
        assert!(matches!(
            network.search_near(&origin, radius, 10),
            Err(Error::InvalidArgument(_))
        ));
    }

    // The cap itself is allowed.
    assert!(
        network
            .search_near(&origin, Distance::from_kilometers(50.0), 10)
            .is_ok()
    );
}

#[test]
fn out_of_range_origin_is_rejected() {
    let network = sample_network();
    assert!(matches!(
        network.search_near(
            &Coordinate::new(120.0, 80.9462),
            Distance::from_kilometers(5.0),
            10
        ),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn stops_near_pairs_stops_with_their_routes() {
    let network = sample_network();
    let origin = Coordinate::new(26.8560, 80.9442);
    let hits = network
        .stops_near(&origin, Distance::from_meters(100.0))
        .unwrap();
    // Hazratganj appears on 101 and 303.
    assert_eq!(hits.len(), 2);
    for (route, stop, distance) in &hits {
        assert_eq!(stop.name.as_ref(), "Hazratganj");
        assert!(distance.as_meters() < 1.0);
        assert!(route.number.as_ref() == "101" || route.number.as_ref() == "303");
    }
}
