mod route;

pub use route::MongoRouteRegistry;

#[derive(Debug, thiserror::Error)]
pub enum MongoRouteError {
    #[error("mongodb error: {0}")]
    Driver(#[from] mongodb::error::Error),
    #[error("bson encoding error: {0}")]
    Encode(#[from] bson::ser::Error),
}
