//! Variable resolution and `{Key}` substitution
//!
//! Keys are matched case-insensitively. Substitution runs whole passes over
//! the text until nothing changes, so values may reference other variables.

use courier_core::domain::instance::Instance;
use courier_core::domain::variables::VariableSet;
use std::collections::HashMap;

pub const TENANT: &str = "Tenant";
pub const ENVIRONMENT: &str = "Environment";

/// Resolved variables of one execution
#[derive(Debug, Clone, Default)]
pub struct Variables {
    /// Keyed by lowercased name
    values: HashMap<String, String>,
}

impl Variables {
    /// Merges the variable set, the execution overrides and the builtins
    ///
    /// Later sources win: overrides replace set values, and `Tenant` /
    /// `Environment` replace both.
    pub fn resolve(
        set: Option<&VariableSet>,
        overrides: &HashMap<String, String>,
        instance: &Instance,
    ) -> Self {
        let mut variables = Self::default();

        if let Some(set) = set {
            for (key, value) in &set.values {
                variables.insert(key, value);
            }
        }

        for (key, value) in overrides {
            variables.insert(key, value);
        }

        variables.insert(TENANT, instance.tenant());
        variables.insert(ENVIRONMENT, instance.environment());

        variables
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_lowercase(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&key.to_lowercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Replaces every known `{Key}` until the text stops changing
    ///
    /// Fails when the text still changes after one pass per variable plus
    /// one, which only happens for self-referencing values.
    pub fn substitute(&self, text: &str) -> anyhow::Result<String> {
        let mut current = text.to_string();

        for _ in 0..=self.values.len() {
            let next = self.substitute_once(&current);
            if next == current {
                return Ok(current);
            }
            current = next;
        }

        anyhow::bail!("Variable substitution does not terminate (cyclic variables?) in: {}", text)
    }

    fn substitute_once(&self, text: &str) -> String {
        let mut output = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(start) = rest.find('{') {
            output.push_str(&rest[..start]);
            let after = &rest[start + 1..];

            if let Some(end) = after.find('}') {
                let key = &after[..end];
                if !key.contains('{') {
                    if let Some(value) = self.get(key) {
                        output.push_str(value);
                        rest = &after[end + 1..];
                        continue;
                    }
                }
            }

            output.push('{');
            rest = after;
        }

        output.push_str(rest);
        output
    }
}
