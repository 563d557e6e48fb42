//! Deployment target identity

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A (tenant, environment) deployment target
///
/// Identifies one durable queue on the orchestrator and one logical
/// deployment target on the agent side. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    tenant: String,
    environment: String,
}

impl Instance {
    pub fn new(tenant: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            tenant: tenant.into(),
            environment: environment.into(),
        }
    }

    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Parses the `tenant/environment` form used in configuration
    pub fn parse(value: &str) -> Option<Self> {
        let (tenant, environment) = value.trim().split_once('/')?;
        let (tenant, environment) = (tenant.trim(), environment.trim());

        if tenant.is_empty() || environment.is_empty() || environment.contains('/') {
            return None;
        }

        Some(Self::new(tenant, environment))
    }
}

// Hashed by the concatenation of both parts; equal instances always produce
// equal concatenations, so this stays consistent with the derived Eq.
impl Hash for Instance {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write(self.tenant.as_bytes());
        state.write(self.environment.as_bytes());
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.tenant, self.environment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_instance_equality() {
        assert_eq!(Instance::new("Some", "Prod"), Instance::new("Some", "Prod"));
        assert_ne!(Instance::new("Some", "Prod"), Instance::new("Some", "Dev"));
        assert_ne!(Instance::new("ab", "c"), Instance::new("a", "bc"));
    }

    #[test]
    fn test_instance_as_map_key() {
        let mut map = HashMap::new();
        map.insert(Instance::new("Some", "Prod"), 1);
        map.insert(Instance::new("Some", "Prod"), 2);
        map.insert(Instance::new("ab", "c"), 3);
        map.insert(Instance::new("a", "bc"), 4);

        assert_eq!(map.len(), 3);
        assert_eq!(map[&Instance::new("Some", "Prod")], 2);
        assert_eq!(map[&Instance::new("a", "bc")], 4);
    }

    #[test]
    fn test_instance_parse() {
        let instance = Instance::parse(" Some/Prod ").unwrap();
        assert_eq!(instance.tenant(), "Some");
        assert_eq!(instance.environment(), "Prod");
        assert_eq!(instance.to_string(), "Some/Prod");

        assert!(Instance::parse("Some").is_none());
        assert!(Instance::parse("/Prod").is_none());
        assert!(Instance::parse("Some/").is_none());
        assert!(Instance::parse("a/b/c").is_none());
    }

    #[test]
    fn test_instance_serialization() {
        let json = serde_json::to_value(Instance::new("Some", "Prod")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "tenant": "Some", "environment": "Prod" })
        );
    }
}
