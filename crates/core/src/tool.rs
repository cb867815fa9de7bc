//! Tool trait and registry — the invocation contracts the model can call.
//!
//! Each registry entry wraps one capability behind a uniquely-named
//! contract: a name, a JSON-schema parameter description, and an async
//! `invoke`. The registry is fixed for the lifetime of an agent loop and
//! validated at construction: duplicate names are rejected before any
//! round can run.

use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::{RegistryError, ToolError};
use crate::transport::ToolDefinition;

/// The core Tool trait.
///
/// `invoke` receives arguments already decoded from the provider's raw
/// JSON string and returns a JSON value; the dispatcher stringifies it
/// into a tool-result turn. Deriving the parameter schema from a native
/// signature is deliberately out of scope: implementors declare the
/// schema explicitly, or use the [`FnTool`] / [`BlockingFnTool`] adapters.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g. "get_weather").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with decoded arguments.
    async fn invoke(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<serde_json::Value, ToolError>;

    /// Convert this tool into a ToolDefinition for the generation request.
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// A registry of available tools, plus an optional terminal entry.
///
/// The terminal entry lives in its own slot rather than the general
/// namespace: the dispatcher recognizes "this invocation ends the loop"
/// by consulting the slot, so a user-registered tool can never be
/// mistaken for it. Its name still participates in duplicate checking
/// and in the catalogue sent to the model.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    // Catalogue order is registration order, kept separately since the
    // map does not preserve it.
    order: Vec<String>,
    terminal: Option<Arc<dyn Tool>>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("order", &self.order)
            .field("terminal", &self.terminal.as_ref().map(|t| t.name()))
            .finish()
    }
}

impl ToolRegistry {
    /// Build a registry from general entries and an optional terminal entry.
    ///
    /// Fails with [`RegistryError::DuplicateName`] if any two entries
    /// (including the terminal one) share a name.
    pub fn new(
        tools: Vec<Arc<dyn Tool>>,
        terminal: Option<Arc<dyn Tool>>,
    ) -> std::result::Result<Self, RegistryError> {
        let mut map: HashMap<String, Arc<dyn Tool>> = HashMap::new();
        let mut order = Vec::with_capacity(tools.len());

        for tool in tools {
            let name = tool.name().to_string();
            if map.contains_key(&name) {
                return Err(RegistryError::DuplicateName(name));
            }
            order.push(name.clone());
            map.insert(name, tool);
        }

        if let Some(term) = &terminal
            && map.contains_key(term.name())
        {
            return Err(RegistryError::DuplicateName(term.name().to_string()));
        }

        Ok(Self {
            tools: map,
            order,
            terminal,
        })
    }

    /// Get a general (non-terminal) tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// The designated terminal entry, if one is configured.
    pub fn terminal(&self) -> Option<&dyn Tool> {
        self.terminal.as_deref()
    }

    /// Whether `name` addresses the terminal slot.
    pub fn is_terminal(&self, name: &str) -> bool {
        self.terminal.as_ref().is_some_and(|t| t.name() == name)
    }

    /// Whether `name` resolves at all (general entry or terminal slot).
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name) || self.is_terminal(name)
    }

    /// The full catalogue for the generation request, registration order
    /// first, terminal entry last.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self
            .order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|t| t.definition())
            .collect();
        if let Some(term) = &self.terminal {
            defs.push(term.definition());
        }
        defs
    }

    /// All registered names, catalogue order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.order.iter().map(|s| s.as_str()).collect();
        if let Some(term) = &self.terminal {
            names.push(term.name());
        }
        names
    }
}

type BoxedToolFuture =
    Pin<Box<dyn Future<Output = std::result::Result<serde_json::Value, ToolError>> + Send>>;

/// Adapter wrapping an async callable as a [`Tool`].
///
/// The invocation suspends the current round until the future resolves.
pub struct FnTool {
    name: String,
    description: String,
    schema: serde_json::Value,
    func: Box<dyn Fn(serde_json::Value) -> BoxedToolFuture + Send + Sync>,
}

impl FnTool {
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: serde_json::Value,
        func: F,
    ) -> Self
    where
        F: Fn(serde_json::Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<serde_json::Value, ToolError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            schema,
            func: Box::new(move |args| Box::pin(func(args))),
        }
    }
}

#[async_trait]
impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        self.schema.clone()
    }

    async fn invoke(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<serde_json::Value, ToolError> {
        (self.func)(arguments).await
    }
}

/// Adapter wrapping a blocking callable as a [`Tool`].
///
/// The callable runs on the blocking thread pool so it cannot stall the
/// loop's task while it waits on external I/O.
pub struct BlockingFnTool {
    name: String,
    description: String,
    schema: serde_json::Value,
    func: Arc<
        dyn Fn(serde_json::Value) -> std::result::Result<serde_json::Value, ToolError>
            + Send
            + Sync,
    >,
}

impl BlockingFnTool {
    pub fn new<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: serde_json::Value,
        func: F,
    ) -> Self
    where
        F: Fn(serde_json::Value) -> std::result::Result<serde_json::Value, ToolError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            schema,
            func: Arc::new(func),
        }
    }
}

#[async_trait]
impl Tool for BlockingFnTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        self.schema.clone()
    }

    async fn invoke(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<serde_json::Value, ToolError> {
        let func = Arc::clone(&self.func);
        tokio::task::spawn_blocking(move || func(arguments))
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name.clone(),
                reason: e.to_string(),
            })?
    }
}
