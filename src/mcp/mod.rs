//! MCP server exposing the store operations as tools.

mod types;

pub use types::*;

use std::sync::Arc;

use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};

use crate::engine::StoreEngine;
use crate::error::StoreError;
use crate::models::{EvolutionOutcome, FavoriteReceipt, StoreState, StoreView};

#[derive(Clone)]
pub struct McpServer {
    engine: Arc<StoreEngine>,
    tool_router: ToolRouter<Self>,
}

/// Caller mistakes and policy rejections become invalid-params; transient
/// generator/storage failures become internal errors (retryable).
fn map_error(e: StoreError) -> McpError {
    if e.is_retryable() {
        McpError::internal_error(e.to_string(), None)
    } else {
        McpError::invalid_params(e.to_string(), None)
    }
}

fn to_result<T: serde::Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

impl McpServer {
    pub fn new(engine: Arc<StoreEngine>) -> Self {
        Self {
            engine,
            tool_router: Self::tool_router(),
        }
    }

    // ============================================================
    // Test helpers - expose tool logic for testing
    // ============================================================

    pub async fn test_get_store_state(&self) -> Result<StoreView, McpError> {
        self.engine.view().await.map_err(map_error)
    }

    pub async fn test_favorite_product(
        &self,
        product_id: &str,
    ) -> Result<FavoriteReceipt, McpError> {
        self.engine.favorite(product_id).await.map_err(map_error)
    }

    pub async fn test_evolve(
        &self,
        product_id: Option<&str>,
        dry_run: bool,
        force: bool,
    ) -> Result<EvolutionOutcome, McpError> {
        self.engine
            .evolve(product_id, dry_run, force)
            .await
            .map_err(map_error)
    }

    pub async fn test_reset_store(&self) -> Result<StoreState, McpError> {
        self.engine.reset().await.map_err(map_error)
    }
}

#[tool_router]
impl McpServer {
    #[tool(
        description = "Get the full store state: every product with its favorite count and version, the evolution threshold and eligibility mode, the generation counter, and the last evolution time. Read-only."
    )]
    async fn get_store_state(&self) -> Result<CallToolResult, McpError> {
        let view = self.engine.view().await.map_err(map_error)?;
        to_result(&view)
    }

    #[tool(
        description = "Add one favorite to a product. Returns the updated product and whether the store is now ready to evolve. Each call counts as a distinct favorite. Side effect: increments the product's favorite count and persists."
    )]
    async fn favorite_product(
        &self,
        params: Parameters<FavoriteProductRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let receipt = self
            .engine
            .favorite(&req.product_id)
            .await
            .map_err(map_error)?;
        to_result(&receipt)
    }

    #[tool(
        description = "Evolve a product into its next version via the generator. Without a product_id the current favorite leader is chosen; it must satisfy the eligibility threshold. dry_run previews the candidate without committing; force bypasses the debounce window. Side effect (non-dry): replaces the slot at the same id with version+1, resets its favorites, increments the generation, persists."
    )]
    async fn evolve(
        &self,
        params: Parameters<EvolveRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let outcome = self
            .engine
            .evolve(req.product_id.as_deref(), req.dry_run, req.force)
            .await
            .map_err(map_error)?;
        to_result(&outcome)
    }

    #[tool(
        description = "Reset the store to the initial seed products. Zeroes every favorite counter, the versions, and the generation. Side effect: overwrites the persisted state."
    )]
    async fn reset_store(&self) -> Result<CallToolResult, McpError> {
        let state = self.engine.reset().await.map_err(map_error)?;
        to_result(&state)
    }
}

#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: rmcp::model::Implementation {
                name: "evomart".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: None,
                icons: None,
                website_url: None,
            },
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            instructions: Some(
                r#"An evolving product store where products compete for favorites.

Tools:
- get_store_state: Get all products and store state
- favorite_product: Add a favorite to a product
- evolve: Evolve a product into its next version (requires enough favorites)
- reset_store: Reset to the initial seed products

Favorites accumulate until the eligibility threshold is met; the winning
product is then transformed into an absurd next version by the generator.
The slot keeps its id and bumps its version. Evolutions are debounced;
pass force=true to bypass the window. Use dry_run=true to preview a
candidate without committing it."#
                    .into(),
            ),
            ..Default::default()
        }
    }
}

pub async fn run_stdio_server(engine: Arc<StoreEngine>) -> anyhow::Result<()> {
    use tokio::io::{stdin, stdout};

    tracing::info!("Starting MCP server via stdio");

    let service = McpServer::new(engine);
    let server = service.serve((stdin(), stdout())).await?;

    let quit_reason = server.waiting().await?;
    tracing::info!("MCP server stopped: {:?}", quit_reason);

    Ok(())
}
