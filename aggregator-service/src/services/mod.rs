pub mod dispatcher;
pub mod metrics;
pub mod providers;
pub mod registry;

pub use dispatcher::{dispatch, DispatchError};
pub use registry::{ModelId, ModelRegistry};
