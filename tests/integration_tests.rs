//! End-to-end tests for index construction, search, and batch dispatch.

use geo::Point;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rgeocoder::spatial::distance_between;
use rgeocoder::{
    Config, DistanceMetric, GeocoderBuilder, Location, QueryDispatcher, ReverseGeocoder,
    SpatialIndex,
};
use std::sync::Arc;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn random_points(rng: &mut StdRng, n: usize) -> Vec<Point> {
    (0..n)
        .map(|_| {
            Point::new(
                rng.gen_range(-180.0..=180.0),
                rng.gen_range(-90.0..=90.0),
            )
        })
        .collect()
}

fn brute_force_nearest(points: &[Point], query: &Point, metric: DistanceMetric) -> (f64, usize) {
    let mut best_distance = f64::INFINITY;
    let mut best_position = 0;
    for (i, p) in points.iter().enumerate() {
        let d = distance_between(query, p, metric);
        if d < best_distance {
            best_distance = d;
            best_position = i;
        }
    }
    (best_distance, best_position)
}

#[test]
fn index_matches_brute_force() {
    init_logging();
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for metric in [DistanceMetric::Haversine, DistanceMetric::Planar] {
        for size in [1, 2, 3, 17, 137, 500, 2000] {
            let points = random_points(&mut rng, size);
            let index = SpatialIndex::build(&points, metric);
            assert_eq!(index.len(), size);

            for _ in 0..25 {
                let query = Point::new(
                    rng.gen_range(-180.0..=180.0),
                    rng.gen_range(-90.0..=90.0),
                );
                let (want_distance, want_position) =
                    brute_force_nearest(&points, &query, metric);
                let got = index.nearest(&query);

                assert_eq!(
                    got.position, want_position as i64,
                    "size={} metric={:?} query={:?}",
                    size, metric, query
                );
                assert!(
                    (got.distance - want_distance).abs() < 1e-9,
                    "distance mismatch: got {} want {}",
                    got.distance,
                    want_distance
                );
            }
        }
    }
}

#[test]
fn index_matches_brute_force_at_poles_and_antimeridian() {
    init_logging();
    let mut rng = StdRng::seed_from_u64(0x9019);

    // Clustered where longitude pruning is weakest: high latitudes, where
    // meridians converge, and longitudes hugging the +-180 seam.
    let polar_point = |rng: &mut StdRng| {
        let lat: f64 = rng.gen_range(80.0..=90.0);
        let lat = if rng.gen_bool(0.5) { lat } else { -lat };
        let lon: f64 = rng.gen_range(170.0..=180.0);
        let lon = if rng.gen_bool(0.5) { lon } else { -lon };
        Point::new(lon, lat)
    };

    for size in [2, 9, 60, 400] {
        let points: Vec<Point> = (0..size).map(|_| polar_point(&mut rng)).collect();
        let index = SpatialIndex::build(&points, DistanceMetric::Haversine);

        for _ in 0..50 {
            let query = polar_point(&mut rng);
            let (want_distance, want_position) =
                brute_force_nearest(&points, &query, DistanceMetric::Haversine);
            let got = index.nearest(&query);

            assert_eq!(
                got.position, want_position as i64,
                "size={} query={:?}",
                size, query
            );
            assert!((got.distance - want_distance).abs() < 1e-9);
        }
    }
}

#[test]
fn dispatch_paths_agree() {
    let mut rng = StdRng::seed_from_u64(7);
    let points = random_points(&mut rng, 400);
    let queries = random_points(&mut rng, 64);

    let index = Arc::new(SpatialIndex::build(&points, DistanceMetric::Haversine));
    let pooled = QueryDispatcher::new(Arc::clone(&index), 4);
    let inline = QueryDispatcher::new(Arc::clone(&index), 1);

    let a = pooled.query(&queries, 1).unwrap();
    let b = inline.query(&queries, 1).unwrap();

    assert_eq!(a.len(), queries.len());
    assert_eq!(b.len(), queries.len());
    for (i, (x, y)) in a.iter().zip(&b).enumerate() {
        assert_eq!(x.position, y.position, "query {}", i);
        assert_eq!(x.distance, y.distance, "query {}", i);
    }

    // Each slot corresponds to its own query, not merely the same multiset.
    for (i, (query, result)) in queries.iter().zip(&a).enumerate() {
        let (_, want_position) = brute_force_nearest(&points, query, DistanceMetric::Haversine);
        assert_eq!(result.position, want_position as i64, "slot {}", i);
    }
}

#[test]
fn batch_of_one_agrees_with_pool() {
    let mut rng = StdRng::seed_from_u64(99);
    let points = random_points(&mut rng, 100);
    let index = Arc::new(SpatialIndex::build(&points, DistanceMetric::Haversine));
    let dispatcher = QueryDispatcher::new(index, 4);

    let queries = random_points(&mut rng, 16);
    let batched = dispatcher.query(&queries, 1).unwrap();

    for (query, want) in queries.iter().zip(&batched) {
        // A batch of one takes the inline path; it must return the same
        // position the pooled path produced.
        let single = dispatcher.query(std::slice::from_ref(query), 1).unwrap();
        assert_eq!(single[0].position, want.position);
    }
}

#[test]
fn sample_city_scenario() {
    let records = vec![Location::new(
        37.78674, -122.39222, "SampleCity", "Region", "Sub", "US",
    )];
    let geocoder = ReverseGeocoder::from_records(records, Config::default()).unwrap();

    let results = geocoder
        .nearest(&[Point::new(-122.39222, 37.78674)])
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].position, 0);
    assert!(results[0].distance.abs() < 1e-9);

    let hit = geocoder
        .query_one(Point::new(-122.39222, 37.78674))
        .unwrap()
        .unwrap();
    assert_eq!(hit.location.name, "SampleCity");
}

#[test]
fn three_city_batch_scenario() {
    let records = vec![
        Location::new(51.5214588, -0.1729636, "London", "England", "", "GB"),
        Location::new(9.936033, 76.259952, "Kochi", "Kerala", "Ernakulam", "IN"),
        Location::new(37.38605, -122.08385, "Mountain View", "California", "", "US"),
    ];
    let config = Config::default().with_worker_count(4);
    let geocoder = ReverseGeocoder::from_records(records, config).unwrap();

    let batch = vec![
        Point::new(-0.1729636, 51.5214588),
        Point::new(76.259952, 9.936033),
        Point::new(-122.08385, 37.38605),
    ];
    let results = geocoder.nearest(&batch).unwrap();

    assert_eq!(results.len(), 3);
    for (i, result) in results.iter().enumerate() {
        assert_eq!(result.position, i as i64);
        assert!(result.distance.abs() < 1e-9);
    }
}

#[test]
fn csv_stream_to_query() {
    init_logging();
    let csv = "lat,lon,name,admin1,admin2,cc\n\
        37.78674,-122.39222,SampleCity,Region,Sub,US\n";
    let geocoder = ReverseGeocoder::from_csv_reader(csv.as_bytes(), Config::default()).unwrap();
    assert_eq!(geocoder.len(), 1);

    let hit = geocoder
        .query_one(Point::new(-122.39222, 37.78674))
        .unwrap()
        .unwrap();
    assert_eq!(hit.location.name, "SampleCity");
    assert_eq!(hit.location.cc, "US");
}

#[test]
fn builder_loads_csv_file() {
    use std::io::Write;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "lat,lon,name,admin1,admin2,cc\n48.8566,2.3522,Paris,IDF,,FR\n"
    )
    .unwrap();

    let geocoder = GeocoderBuilder::new()
        .config(Config::default().with_worker_count(2))
        .csv_path(file.path())
        .build()
        .unwrap();

    let hit = geocoder
        .query_one(Point::new(2.3522, 48.8566))
        .unwrap()
        .unwrap();
    assert_eq!(hit.location.name, "Paris");
}

#[test]
fn concurrent_callers_share_one_geocoder() {
    use std::thread;

    let mut rng = StdRng::seed_from_u64(21);
    let records: Vec<Location> = random_points(&mut rng, 300)
        .iter()
        .enumerate()
        .map(|(i, p)| Location::new(p.y(), p.x(), format!("place_{}", i), "", "", "XX"))
        .collect();

    let geocoder = Arc::new(ReverseGeocoder::from_records(records, Config::default()).unwrap());
    let queries = Arc::new(random_points(&mut rng, 32));

    let baseline = geocoder.nearest(&queries).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let geocoder = Arc::clone(&geocoder);
            let queries = Arc::clone(&queries);
            thread::spawn(move || geocoder.nearest(&queries).unwrap())
        })
        .collect();

    for handle in handles {
        let results = handle.join().unwrap();
        for (got, want) in results.iter().zip(&baseline) {
            assert_eq!(got.position, want.position);
        }
    }
}
