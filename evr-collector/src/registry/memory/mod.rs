mod route;
mod sample;

pub use route::InMemoryRouteRegistry;
pub use sample::InMemorySampleRegistry;

#[derive(Debug, thiserror::Error)]
pub enum InMemoryError {
    #[error("sample id space exhausted")]
    IdSpaceExhausted,
}

#[cfg(test)]
mod tests {
    use evr_core::{Location, NewRoute, NewSensorSample};
    use jiff::Timestamp;

    use crate::registry::{RouteRegistry, SampleRegistry};

    use super::{InMemoryRouteRegistry, InMemorySampleRegistry};

    fn sample_at(second: i64, accel_x: f64) -> NewSensorSample {
        NewSensorSample {
            timestamp: Timestamp::from_second(second).unwrap(),
            accel_x,
            accel_y: 0.0,
            accel_z: 1.0,
            latitude: None,
            longitude: None,
        }
    }

    fn route(name: &str) -> NewRoute {
        NewRoute {
            name: name.to_string(),
            route_points: vec![
                Location {
                    latitude: 13.75,
                    longitude: 100.5,
                },
                Location {
                    latitude: 13.8,
                    longitude: 100.55,
                },
            ],
        }
    }

    #[tokio::test]
    async fn test_batch_store_assigns_monotonic_ids() {
        let registry = InMemorySampleRegistry::new();

        let first = registry
            .batch_store(vec![sample_at(10, 0.0), sample_at(11, 0.0)])
            .await
            .unwrap();
        let second = registry.batch_store(vec![sample_at(12, 0.0)]).await.unwrap();

        assert_eq!((first, second), (2, 1));
        let ids: Vec<i64> = registry
            .latest(10)
            .await
            .unwrap()
            .iter()
            .map(|s| s.id.0)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_latest_returns_most_recent_oldest_first() {
        let registry = InMemorySampleRegistry::new();

        // stored out of timestamp order on purpose
        let batch = [5, 1, 9, 3, 7, 2, 10, 4, 8, 6]
            .into_iter()
            .map(|s| sample_at(1_700_000_000 + s, s as f64))
            .collect();
        registry.batch_store(batch).await.unwrap();

        let latest = registry.latest(3).await.unwrap();
        let xs: Vec<f64> = latest.iter().map(|s| s.accel_x).collect();
        assert_eq!(xs, vec![8.0, 9.0, 10.0]);
    }

    #[tokio::test]
    async fn test_latest_limit_edges() {
        let registry = InMemorySampleRegistry::new();
        registry
            .batch_store((0..4).map(|s| sample_at(s, 0.0)).collect())
            .await
            .unwrap();

        assert!(registry.latest(0).await.unwrap().is_empty());
        assert_eq!(registry.latest(100).await.unwrap().len(), 4);
        assert_eq!(registry.latest(-1).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_empty_store() {
        let registry = InMemorySampleRegistry::new();
        assert_eq!(registry.count().await.unwrap(), 0);
        assert!(registry.latest(500).await.unwrap().is_empty());
        assert_eq!(registry.batch_store(vec![]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_route_lifecycle() {
        let registry = InMemoryRouteRegistry::new();

        let created = registry.create(route("north loop")).await.unwrap();
        let fetched = registry.get(created.id).await.unwrap().expect("route should exist");
        assert_eq!(fetched, created);

        let replaced = registry
            .replace(
                created.id,
                NewRoute {
                    name: "south loop".into(),
                    route_points: vec![],
                },
            )
            .await
            .unwrap()
            .expect("route should exist");
        assert_eq!(replaced.id, created.id);
        assert_eq!(replaced.name, "south loop");
        assert!(replaced.route_points.is_empty());

        assert!(registry.delete(created.id).await.unwrap());
        assert!(registry.get(created.id).await.unwrap().is_none());
        assert!(!registry.delete(created.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_replace_unknown_route() {
        let registry = InMemoryRouteRegistry::new();
        let missing = evr_core::RouteId::generate();

        assert!(registry.replace(missing, route("ghost")).await.unwrap().is_none());
        assert!(registry.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_returns_every_route() {
        let registry = InMemoryRouteRegistry::new();
        let a = registry.create(route("a")).await.unwrap();
        let b = registry.create(route("b")).await.unwrap();

        let listed = registry.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.contains(&a));
        assert!(listed.contains(&b));
    }
}
