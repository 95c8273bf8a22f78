use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use evr_core::{NewRoute, Route, RouteId};
use tokio::sync::RwLock;

use crate::registry::RouteRegistry;

use super::InMemoryError;

/// Routes keyed by id. ObjectIds start with their creation time, so
/// iteration order follows insertion order.
#[derive(Clone, Default)]
pub struct InMemoryRouteRegistry {
    routes: Arc<RwLock<BTreeMap<RouteId, Route>>>,
}

impl InMemoryRouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RouteRegistry for InMemoryRouteRegistry {
    type Error = InMemoryError;

    async fn list(&self) -> Result<Vec<Route>, Self::Error> {
        let routes = self.routes.read().await;
        Ok(routes.values().cloned().collect())
    }

    async fn get(&self, id: RouteId) -> Result<Option<Route>, Self::Error> {
        let routes = self.routes.read().await;
        Ok(routes.get(&id).cloned())
    }

    async fn create(&self, route: NewRoute) -> Result<Route, Self::Error> {
        let route = route.into_route(RouteId::generate());
        let mut routes = self.routes.write().await;
        routes.insert(route.id, route.clone());
        Ok(route)
    }

    async fn replace(&self, id: RouteId, route: NewRoute) -> Result<Option<Route>, Self::Error> {
        let mut routes = self.routes.write().await;
        let Some(existing) = routes.get_mut(&id) else {
            return Ok(None);
        };

        *existing = route.into_route(id);
        Ok(Some(existing.clone()))
    }

    async fn delete(&self, id: RouteId) -> Result<bool, Self::Error> {
        let mut routes = self.routes.write().await;
        Ok(routes.remove(&id).is_some())
    }
}
