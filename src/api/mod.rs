// =============================================================================
// HTTP Tool Surface
// =============================================================================

pub mod rest;
pub mod tools;

pub use rest::router;
pub use tools::{invoke, ToolError, ToolSpec, TOOLS};
