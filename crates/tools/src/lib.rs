//! Built-in tools for toolweave.
//!
//! Ships the demo weather lookup and the `respond` terminal tool, plus
//! a helper that assembles them into the default registry.

use std::sync::Arc;

use toolweave_core::error::RegistryError;
use toolweave_core::tool::{Tool, ToolRegistry};

pub mod final_response;
pub mod weather_lookup;

pub use final_response::FinalResponseTool;
pub use weather_lookup::WeatherLookupTool;

/// The default registry: weather lookup plus `respond` in the terminal slot.
pub fn default_registry() -> Result<ToolRegistry, RegistryError> {
    registry_with(vec![Arc::new(WeatherLookupTool)])
}

/// Build a registry from the given tools with `respond` in the terminal slot.
pub fn registry_with(tools: Vec<Arc<dyn Tool>>) -> Result<ToolRegistry, RegistryError> {
    ToolRegistry::new(tools, Some(Arc::new(FinalResponseTool)))
}
