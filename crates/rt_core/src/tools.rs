use async_trait::async_trait;
use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;

use crate::Result;

#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Builds a definition whose parameter schema is derived from `P`.
    pub fn new<P: JsonSchema>(name: &str, description: &str) -> Result<Self> {
        let schema = schema_for!(P);
        let parameters = serde_json::to_value(&schema.schema)?;
        Ok(Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters,
        })
    }
}

/// Something an agent can call while working on a task.
#[async_trait]
pub trait Tool: Send + Sync {
    fn definition(&self) -> Result<ToolDefinition>;

    async fn invoke(&self, args: serde_json::Value) -> Result<String>;
}

pub fn parse_args<A: DeserializeOwned>(args: serde_json::Value) -> Result<A> {
    Ok(serde_json::from_value(args)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, JsonSchema)]
    #[allow(dead_code)]
    struct SearchArgs {
        search_query: String,
        website_url: Option<String>,
    }

    #[test]
    fn test_definition_schema() {
        let def = ToolDefinition::new::<SearchArgs>("search", "search a site").unwrap();
        assert_eq!(def.name, "search");
        assert_eq!(def.parameters["type"], "object");
        assert!(def.parameters["properties"]["search_query"].is_object());
        let required = def.parameters["required"].as_array().unwrap();
        assert!(required.iter().any(|r| r == "search_query"));
        assert!(!required.iter().any(|r| r == "website_url"));
    }

    #[test]
    fn test_parse_args() {
        let args: SearchArgs = parse_args(serde_json::json!({"search_query": "fines"})).unwrap();
        assert_eq!(args.search_query, "fines");
        assert!(args.website_url.is_none());
        assert!(parse_args::<SearchArgs>(serde_json::json!({})).is_err());
    }
}
