mod sample;

pub use sample::{PostgresSampleError, PostgresSampleRegistry};
