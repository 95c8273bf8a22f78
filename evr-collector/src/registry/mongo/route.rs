use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use evr_core::{Location, NewRoute, Route, RouteId};
use futures::TryStreamExt;
use mongodb::{Client, Collection};
use serde::{Deserialize, Deserializer, Serialize};

use super::MongoRouteError;
use crate::registry::RouteRegistry;

const COLLECTION: &str = "routes";

/// Stored shape of a route. Field keys match documents already written by
/// earlier collectors: `_id`, `name`, `routepoints`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RouteDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    #[serde(default)]
    name: String,
    #[serde(rename = "routepoints", default, deserialize_with = "null_as_empty")]
    route_points: Vec<Location>,
}

impl From<RouteDocument> for Route {
    fn from(document: RouteDocument) -> Self {
        Route {
            id: RouteId(document.id),
            name: document.name,
            route_points: document.route_points,
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Location>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Location>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Clone)]
pub struct MongoRouteRegistry {
    routes: Collection<RouteDocument>,
}

impl MongoRouteRegistry {
    /// Connects and pings the server so a bad URL fails at start-up.
    pub async fn new(url: &str, database: &str) -> Result<Self, MongoRouteError> {
        let client = Client::with_uri_str(url).await?;
        let database = client.database(database);
        database.run_command(doc! { "ping": 1 }).await?;

        Ok(Self {
            routes: database.collection(COLLECTION),
        })
    }
}

#[async_trait]
impl RouteRegistry for MongoRouteRegistry {
    type Error = MongoRouteError;

    async fn list(&self) -> Result<Vec<Route>, Self::Error> {
        let cursor = self.routes.find(doc! {}).await?;
        let documents: Vec<RouteDocument> = cursor.try_collect().await?;

        Ok(documents.into_iter().map(Route::from).collect())
    }

    async fn get(&self, id: RouteId) -> Result<Option<Route>, Self::Error> {
        let document = self.routes.find_one(doc! { "_id": id.0 }).await?;
        Ok(document.map(Route::from))
    }

    async fn create(&self, route: NewRoute) -> Result<Route, Self::Error> {
        let document = RouteDocument {
            id: ObjectId::new(),
            name: route.name,
            route_points: route.route_points,
        };
        self.routes.insert_one(&document).await?;

        Ok(document.into())
    }

    async fn replace(&self, id: RouteId, route: NewRoute) -> Result<Option<Route>, Self::Error> {
        let route_points = bson::to_bson(&route.route_points)?;
        let update = doc! {
            "$set": {
                "name": route.name.as_str(),
                "routepoints": route_points,
            }
        };

        let result = self.routes.update_one(doc! { "_id": id.0 }, update).await?;
        if result.matched_count == 0 {
            return Ok(None);
        }

        Ok(Some(route.into_route(id)))
    }

    async fn delete(&self, id: RouteId) -> Result<bool, Self::Error> {
        let result = self.routes.delete_one(doc! { "_id": id.0 }).await?;
        Ok(result.deleted_count > 0)
    }
}
