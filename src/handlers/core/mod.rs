//! Core handler infrastructure.
//!
//! Fundamental types for the module system: the module contract, the
//! registry, per-invocation context, output batching and response routing,
//! and the dispatcher tying them together.

pub mod context;
pub mod dispatch;
pub mod middleware;
pub mod output;
pub mod registry;
pub mod traits;

// Re-export commonly used types
pub use context::{Context, Services};
pub use dispatch::{DispatchOutcome, Dispatcher, PERMISSION_DENIED};
pub use middleware::{ResponseMiddleware, SendError};
pub use output::{LineKind, Outbound, OutputBatcher, OutputBuffer};
pub use registry::{ModuleDescriptor, Registry};
pub use traits::{Help, Module, ModuleConfig};
