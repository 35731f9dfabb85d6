//! The cluster event path: ingress gate, bounded queue, single dispatcher
//! worker and the subprocess handler executor.

pub mod dispatcher;
pub mod executor;
pub mod gate;

pub use dispatcher::{event_queue, EventBatch, EventDispatcher, HandlerRun};
pub use executor::HandlerExecutor;
pub use gate::{Admission, IngressGate};
