pub mod backend;
pub mod executor;
#[cfg(feature = "native")]
pub mod native;
pub mod types;

pub use backend::{BackendCall, InputBackend, MAX_MOCK_DIMENSION, MockBackend};
pub use executor::{Executor, ExecutorSettings, attempt};
#[cfg(feature = "native")]
pub use native::NativeBackend;
pub use types::{EngineError, EngineResult, ExecutionResult};
