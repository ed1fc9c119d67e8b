//! The immutable table of tools addressable from the command line.

use ahash::AHashMap;

use crate::error::{AuthorAgeError, Result};

use super::tool::ToolDescriptor;

/// Ordered, immutable mapping from tool name to descriptor.
///
/// Built once with [`ToolRegistryBuilder`]; iteration order is registration
/// order. Nothing mutates a finished registry, so it can be shared freely.
#[derive(Debug)]
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
    index: AHashMap<String, usize>,
}

impl ToolRegistry {
    /// Start building a registry.
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    /// Find a tool by its canonical name.
    pub fn lookup(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&position| &self.tools[position])
    }

    /// Tool names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.iter().map(ToolDescriptor::name)
    }

    /// Descriptors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.iter()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// True when no tool is registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Collects descriptors and rejects duplicate names.
#[derive(Debug, Default)]
pub struct ToolRegistryBuilder {
    tools: Vec<ToolDescriptor>,
    index: AHashMap<String, usize>,
}

impl ToolRegistryBuilder {
    /// Add a tool; its name must not be registered yet.
    pub fn register(mut self, tool: ToolDescriptor) -> Result<Self> {
        if self.index.contains_key(tool.name()) {
            return Err(AuthorAgeError::invalid_argument(format!(
                "Tool {} is registered twice",
                tool.name()
            )));
        }
        self.index.insert(tool.name().to_string(), self.tools.len());
        self.tools.push(tool);
        Ok(self)
    }

    /// Freeze the registry.
    pub fn build(self) -> ToolRegistry {
        ToolRegistry {
            tools: self.tools,
            index: self.index,
        }
    }
}
