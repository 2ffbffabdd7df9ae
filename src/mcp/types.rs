//! Request types for MCP tools.

use rmcp::schemars::JsonSchema;
use serde::Deserialize;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FavoriteProductRequest {
    #[schemars(description = "The id of the product to favorite")]
    pub product_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct EvolveRequest {
    #[schemars(
        description = "Id of the product to evolve. Omit to evolve the current favorite leader"
    )]
    #[serde(default)]
    pub product_id: Option<String>,
    #[schemars(
        description = "Return the proposed next version without committing it. No counters or generation change"
    )]
    #[serde(default)]
    pub dry_run: bool,
    #[schemars(description = "Bypass the debounce window between evolutions")]
    #[serde(default)]
    pub force: bool,
}
