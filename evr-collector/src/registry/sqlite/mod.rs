mod sample;

pub use sample::{SqliteSampleError, SqliteSampleRegistry};
