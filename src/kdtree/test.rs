use crate::kdtree::{KdTree, KdTreeBuilder, SearchNode};
use crate::measure::{Metric, Point2};
use crate::test::{compare_with_brute_force, init_test_logger, random_points};
use crate::GeoKnnError;

fn node_points(node: &SearchNode<f64>, depth_left: i32, dst: &mut Vec<Point2<f64>>) {
    if depth_left < 0 {
        return;
    }
    dst.push(node.point());
    if let Some(left) = node.left() {
        node_points(left, depth_left - 1, dst);
    }
    if let Some(right) = node.right() {
        node_points(right, depth_left - 1, dst);
    }
}

mod build {
    use super::*;

    fn assert_partitioned(node: &SearchNode<f64>) {
        fn subtree_points(node: &SearchNode<f64>, dst: &mut Vec<Point2<f64>>) {
            dst.push(node.point());
            if let Some(left) = node.left() {
                subtree_points(left, dst);
            }
            if let Some(right) = node.right() {
                subtree_points(right, dst);
            }
        }

        let on_axis = |p: &Point2<f64>| if node.depth() % 2 == 0 { p.x } else { p.y };
        let split = on_axis(&node.point());

        if let Some(left) = node.left() {
            let mut points = vec![];
            subtree_points(left, &mut points);
            assert!(points.iter().all(|p| on_axis(p) <= split));
            assert_partitioned(left);
        }
        if let Some(right) = node.right() {
            let mut points = vec![];
            subtree_points(right, &mut points);
            assert!(points.iter().all(|p| on_axis(p) >= split));
            assert_partitioned(right);
        }
    }

    #[test]
    fn partition_invariant() {
        let points = random_points(1000, 11, 0.0..100.0, 0.0..100.0);
        let tree = KdTree::build(points).unwrap();
        assert_eq!(tree.num_items(), 1000);
        assert_partitioned(tree.root());
    }

    #[test]
    fn empty_input_fails() {
        let result = KdTree::<f64>::build(vec![]);
        assert!(matches!(result, Err(GeoKnnError::EmptyPointSet)));
    }

    #[test]
    fn builder_roundtrip() {
        let mut builder = KdTreeBuilder::new();
        assert_eq!(builder.add(54.0, 1.0), 0);
        assert_eq!(builder.add(97.0, 21.0), 1);
        assert_eq!(builder.add(65.0, 35.0), 2);
        let tree = builder.finish().unwrap();
        assert_eq!(tree.num_items(), 3);

        let empty = KdTreeBuilder::<f64>::new().finish();
        assert!(matches!(empty, Err(GeoKnnError::EmptyPointSet)));
    }

    #[test]
    fn duplicate_points_stay_distinct() {
        let points = vec![Point2::new(5.0, 5.0); 4];
        let tree = KdTree::build(points).unwrap();
        let result = tree
            .search_nearest(Point2::new(5.0, 5.0), 4, 0.0, Metric::Euclidean)
            .unwrap();
        assert_eq!(result.len(), 4);
        assert!(result.iter().all(|m| m.dist == 0.0));
    }

    #[test]
    fn release_detaches_all_descendants() {
        let points = random_points(100, 13, 0.0..100.0, 0.0..100.0);
        let mut tree = KdTree::build(points).unwrap();
        assert!(tree.root().left().is_some() || tree.root().right().is_some());
        tree.release();
        assert!(tree.root().left().is_none());
        assert!(tree.root().right().is_none());
    }
}

mod euclidean {
    use super::*;

    #[test]
    fn matches_brute_force() {
        init_test_logger();
        let points = random_points(1000, 42, 0.0..100.0, 0.0..100.0);
        let tree = KdTree::build(points.clone()).unwrap();
        let queries = random_points(50, 43, 0.0..100.0, 0.0..100.0);
        compare_with_brute_force(&tree, &points, &queries, Metric::Euclidean, 44);
    }

    #[test]
    fn matches_brute_force_on_indexed_points() {
        // Queries lying exactly on tree nodes exercise the zero-distance and tie paths.
        let points = random_points(1000, 42, 0.0..100.0, 0.0..100.0);
        let tree = KdTree::build(points.clone()).unwrap();
        let mut queries = vec![];
        node_points(tree.root(), 4, &mut queries);
        compare_with_brute_force(&tree, &points, &queries, Metric::Euclidean, 45);
    }

    #[test]
    fn unit_square_scenario() {
        let tree = KdTree::build(vec![
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 1.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
        ])
        .unwrap();
        let result = tree
            .search_nearest(Point2::new(0.1, 0.1), 1, 0.0, Metric::Euclidean)
            .unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].point(), Point2::new(0.0, 0.0));
        assert!((result[0].dist - 0.02_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn result_length_is_capped_by_point_count() {
        let points = random_points(5, 17, 0.0..100.0, 0.0..100.0);
        let tree = KdTree::build(points).unwrap();
        let result = tree
            .search_nearest(Point2::new(50.0, 50.0), 10, 0.0, Metric::Euclidean)
            .unwrap();
        assert_eq!(result.len(), 5);
        assert!(result.windows(2).all(|w| w[0].dist <= w[1].dist));
    }

    #[test]
    fn radius_extends_past_k() {
        let tree = KdTree::build(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(10.0, 0.0),
        ])
        .unwrap();
        let result = tree
            .search_nearest(Point2::new(0.0, 0.0), 1, 2.5, Metric::Euclidean)
            .unwrap();
        assert_eq!(result.len(), 3);
        assert!(result.iter().skip(1).all(|m| m.dist <= 2.5));
    }

    #[test]
    fn invalid_arguments_fail_fast() {
        let tree = KdTree::build(vec![Point2::new(0.0, 0.0)]).unwrap();
        let query = Point2::new(1.0, 1.0);
        assert!(matches!(
            tree.search_nearest(query, 0, 0.0, Metric::Euclidean),
            Err(GeoKnnError::ZeroNeighborCount)
        ));
        assert!(matches!(
            tree.search_nearest(query, 1, -1.0, Metric::Euclidean),
            Err(GeoKnnError::InvalidRadius(_))
        ));
        assert!(matches!(
            tree.search_nearest(query, 1, f64::NAN, Metric::Euclidean),
            Err(GeoKnnError::InvalidRadius(_))
        ));
    }
}

mod geodesic {
    use super::*;

    /// Query positions that stress the spherical pruning geometry: the antimeridian column,
    /// both poles, and plain mid-ocean positions.
    fn singular_queries() -> Vec<Point2<f64>> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(90.0, 0.0),
            Point2::new(130.0, 0.0),
            Point2::new(0.0, 90.0),
            Point2::new(0.0, -90.0),
            Point2::new(-180.0, 0.0),
            Point2::new(-180.0, 30.0),
            Point2::new(-180.0, 60.0),
            Point2::new(-180.0, -30.0),
            Point2::new(180.0, 0.0),
            Point2::new(180.0, 30.0),
            Point2::new(180.0, 60.0),
            Point2::new(180.0, -30.0),
        ]
    }

    #[test]
    fn matches_brute_force_globally() {
        init_test_logger();
        let points = random_points(1000, 42, -180.0..180.0, -90.0..90.0);
        let tree = KdTree::build(points.clone()).unwrap();
        let queries = random_points(50, 46, -180.0..180.0, -90.0..90.0);
        compare_with_brute_force(&tree, &points, &queries, Metric::Geodesic, 47);
    }

    #[test]
    fn matches_brute_force_on_clustered_points() {
        // A regional cluster plus one point on the far side of the antimeridian, so that
        // queries near +-180 must reach across the wraparound to find it.
        let mut points = random_points(1000, 48, -100.0..0.0, -10.0..70.0);
        points.push(Point2::new(170.0, 0.0));
        let tree = KdTree::build(points.clone()).unwrap();

        let queries = random_points(50, 49, -180.0..180.0, -90.0..90.0);
        compare_with_brute_force(&tree, &points, &queries, Metric::Geodesic, 50);
        compare_with_brute_force(&tree, &points, &singular_queries(), Metric::Geodesic, 51);
    }

    #[test]
    fn antimeridian_neighbors_beat_numeric_proximity() {
        let tree = KdTree::build(vec![
            Point2::<f64>::new(179.0, 0.0),
            Point2::new(-179.0, 0.0),
            Point2::new(0.0, 0.0),
        ])
        .unwrap();
        let result = tree
            .search_nearest(Point2::new(180.0, 0.0), 1, 0.0, Metric::Geodesic)
            .unwrap();
        assert_eq!(result.len(), 1);
        // Either side of the antimeridian ties at one degree of arc; the origin never wins.
        assert_eq!(result[0].x.abs(), 179.0);
        assert_eq!(result[0].y, 0.0);
        let one_degree = crate::measure::EARTH_RADIUS * 1.0_f64.to_radians();
        assert!((result[0].dist - one_degree).abs() < 0.5);
    }

    #[test]
    fn polar_query_ignores_longitude() {
        // From the north pole every longitude is equally meaningless; only latitude counts.
        let tree = KdTree::build(vec![
            Point2::new(-120.0, 85.0),
            Point2::new(30.0, 60.0),
            Point2::new(150.0, -40.0),
        ])
        .unwrap();
        let result = tree
            .search_nearest(Point2::new(0.0, 90.0), 3, 0.0, Metric::Geodesic)
            .unwrap();
        assert_eq!(result[0].point(), Point2::new(-120.0, 85.0));
        assert_eq!(result[1].point(), Point2::new(30.0, 60.0));
        assert_eq!(result[2].point(), Point2::new(150.0, -40.0));
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn batch_matches_sequential() {
        let points = random_points(500, 52, -180.0..180.0, -90.0..90.0);
        let tree = KdTree::build(points).unwrap();
        let queries = random_points(20, 53, -180.0..180.0, -90.0..90.0);
        let batch = tree
            .search_nearest_batch(&queries, 5, 0.0, Metric::Geodesic)
            .unwrap();
        for (query, result) in queries.iter().zip(batch) {
            let sequential = tree.search_nearest(*query, 5, 0.0, Metric::Geodesic).unwrap();
            assert_eq!(result, sequential);
        }
    }
}
