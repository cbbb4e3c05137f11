//! Tool invocation subsystem: request normalization, content recovery,
//! validation, the allow-list gate, the registry, and the built-in
//! tools themselves.

pub mod allowlist;
pub mod builtin;
pub mod format;
pub mod normalize;
pub mod pipeline;
pub mod recovery;
pub mod registry;
pub mod types;
pub mod validation;

pub use pipeline::ToolPipeline;
pub use registry::{CallbackTool, Tool, ToolRegistry};
pub use types::{CanonicalRequest, ToolDefinition, ToolOutput, ToolResult};
