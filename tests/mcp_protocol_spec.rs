//! MCP protocol integration tests.
//!
//! These tests spawn the actual `evomart mcp` process and communicate via
//! JSON-RPC over stdio, testing the complete MCP protocol flow.
//!
//! The rmcp library uses line-delimited JSON (each message is one line):
//! ```
//! {"jsonrpc":"2.0","id":1,"method":"initialize",...}\n
//! {"jsonrpc":"2.0","id":1,"result":{...}}\n
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, Command, Stdio};

/// JSON-RPC 2.0 request
#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: &'static str,
    id: u64,
    method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<Value>,
}

/// JSON-RPC 2.0 response
#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: Option<u64>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct JsonRpcError {
    code: i64,
    message: String,
    data: Option<Value>,
}

/// MCP test client that spawns and communicates with the server
struct McpTestClient {
    child: Child,
    request_id: u64,
    reader: BufReader<std::process::ChildStdout>,
}

impl McpTestClient {
    /// Spawn a new MCP server process with an isolated state file.
    ///
    /// The generator backend is pointed at an unroutable address; none of
    /// the tools exercised here reach it.
    fn spawn() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");

        let mut child = Command::new(env!("CARGO_BIN_EXE_evomart"))
            .arg("mcp")
            .env("EVOMART_STATE_PATH", temp_dir.path().join("store.json"))
            .env("EVOMART_GENERATOR_BACKEND", "openai")
            .env("EVOMART_GENERATOR_API_URL", "http://127.0.0.1:1/v1")
            .env("EVOMART_GENERATOR_API_KEY", "test-key")
            .env("EVOMART_GENERATOR_MODEL", "test-model")
            .env("EVOMART_GENERATOR_TIMEOUT_MS", "1000")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .expect("Failed to spawn evomart mcp");

        let stdout = child.stdout.take().expect("Failed to get stdout");
        let reader = BufReader::new(stdout);

        // Keep temp_dir alive by leaking it (tests are short-lived anyway)
        std::mem::forget(temp_dir);

        Self {
            child,
            request_id: 0,
            reader,
        }
    }

    /// Send a message as line-delimited JSON
    fn send_message(&mut self, content: &str) {
        let stdin = self.child.stdin.as_mut().expect("Failed to get stdin");
        writeln!(stdin, "{}", content).expect("Failed to write message");
        stdin.flush().expect("Failed to flush stdin");
    }

    /// Read a message as line-delimited JSON
    fn read_message(&mut self) -> String {
        let mut line = String::new();
        self.reader
            .read_line(&mut line)
            .expect("Failed to read line");
        line.trim().to_string()
    }

    /// Send a JSON-RPC request and get the response
    fn request(&mut self, method: &str, params: Option<Value>) -> JsonRpcResponse {
        self.request_id += 1;
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.request_id,
            method: method.to_string(),
            params,
        };

        let request_json = serde_json::to_string(&request).expect("Failed to serialize request");
        self.send_message(&request_json);

        let response_json = self.read_message();
        serde_json::from_str(&response_json).expect("Failed to parse response")
    }

    /// Send initialize request and initialized notification (required first messages)
    fn initialize(&mut self) -> JsonRpcResponse {
        let response = self.request(
            "initialize",
            Some(json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {
                    "name": "test-client",
                    "version": "1.0.0"
                }
            })),
        );

        // Send initialized notification (required by MCP protocol)
        let notification = json!({
            "jsonrpc": "2.0",
            "method": "notifications/initialized"
        });
        self.send_message(&notification.to_string());

        response
    }

    /// List available tools
    fn list_tools(&mut self) -> JsonRpcResponse {
        self.request("tools/list", None)
    }

    /// Call a tool with parameters
    fn call_tool(&mut self, name: &str, arguments: Value) -> JsonRpcResponse {
        self.request(
            "tools/call",
            Some(json!({
                "name": name,
                "arguments": arguments
            })),
        )
    }
}

impl Drop for McpTestClient {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

// ============================================================
// Protocol Tests
// ============================================================

mod protocol {
    use super::*;

    #[test]
    fn initialize_returns_server_info() {
        let mut client = McpTestClient::spawn();
        let response = client.initialize();

        assert!(response.error.is_none(), "Expected success, got error");
        let result = response.result.expect("Expected result");

        // Check server info
        assert!(result.get("serverInfo").is_some());
        assert!(result.get("capabilities").is_some());
    }

    #[test]
    fn tools_list_returns_all_tools() {
        let mut client = McpTestClient::spawn();
        client.initialize();

        let response = client.list_tools();
        assert!(response.error.is_none(), "Expected success, got error");

        let result = response.result.expect("Expected result");
        let tools = result.get("tools").expect("Expected tools array");
        let tools_array = tools.as_array().expect("Tools should be array");

        assert_eq!(
            tools_array.len(),
            4,
            "Expected 4 tools, got {}",
            tools_array.len()
        );

        let tool_names: Vec<&str> = tools_array
            .iter()
            .filter_map(|t| t.get("name").and_then(|n| n.as_str()))
            .collect();

        assert!(tool_names.contains(&"get_store_state"));
        assert!(tool_names.contains(&"favorite_product"));
        assert!(tool_names.contains(&"evolve"));
        assert!(tool_names.contains(&"reset_store"));
    }

    #[test]
    fn tools_have_descriptions_and_schemas() {
        let mut client = McpTestClient::spawn();
        client.initialize();

        let response = client.list_tools();
        let result = response.result.expect("Expected result");
        let tools = result
            .get("tools")
            .expect("Expected tools")
            .as_array()
            .expect("Tools should be array");

        for tool in tools {
            let name = tool.get("name").and_then(|n| n.as_str()).unwrap_or("?");
            assert!(
                tool.get("description").is_some(),
                "Tool {} missing description",
                name
            );
            assert!(
                tool.get("inputSchema").is_some(),
                "Tool {} missing inputSchema",
                name
            );
        }
    }
}

// ============================================================
// Tool Call Tests
// ============================================================

mod tool_calls {
    use super::*;

    #[test]
    fn get_store_state_returns_the_seed_catalog() {
        let mut client = McpTestClient::spawn();
        client.initialize();

        let response = client.call_tool("get_store_state", json!({}));
        assert!(response.error.is_none(), "Expected success, got error");

        let text = extract_text_content(&response);
        let view: Value = serde_json::from_str(&text).expect("Expected JSON in text");

        let products = view["products"].as_array().expect("Expected products");
        assert_eq!(products.len(), 6);
        assert_eq!(view["generation"].as_u64(), Some(0));
        assert!(view["favorites_to_evolve"].as_u64().is_some());
    }

    #[test]
    fn favorite_product_increments_the_counter() {
        let mut client = McpTestClient::spawn();
        client.initialize();

        let response =
            client.call_tool("favorite_product", json!({ "product_id": "prod_001" }));
        assert!(response.error.is_none(), "Expected success, got error");

        let text = extract_text_content(&response);
        let receipt: Value = serde_json::from_str(&text).expect("Expected JSON in text");
        assert_eq!(receipt["product"]["id"].as_str(), Some("prod_001"));
        assert_eq!(receipt["product"]["favorite_count"].as_u64(), Some(1));
        assert_eq!(receipt["ready_to_evolve"].as_bool(), Some(false));

        // The count is visible on the next state read
        let state_text = extract_text_content(&client.call_tool("get_store_state", json!({})));
        let view: Value = serde_json::from_str(&state_text).unwrap();
        let slot = view["products"]
            .as_array()
            .unwrap()
            .iter()
            .find(|p| p["id"].as_str() == Some("prod_001"))
            .expect("Expected prod_001");
        assert_eq!(slot["favorite_count"].as_u64(), Some(1));
    }

    #[test]
    fn reset_store_zeroes_every_counter() {
        let mut client = McpTestClient::spawn();
        client.initialize();

        client.call_tool("favorite_product", json!({ "product_id": "prod_002" }));
        client.call_tool("favorite_product", json!({ "product_id": "prod_002" }));

        let response = client.call_tool("reset_store", json!({}));
        assert!(response.error.is_none(), "Expected success, got error");

        let text = extract_text_content(&response);
        let state: Value = serde_json::from_str(&text).expect("Expected JSON in text");
        assert_eq!(state["generation"].as_u64(), Some(0));
        for product in state["products"].as_array().expect("Expected products") {
            assert_eq!(product["favorite_count"].as_u64(), Some(0));
            assert_eq!(product["version"].as_u64(), Some(1));
        }
    }

    /// Helper to extract text content from MCP tool response
    fn extract_text_content(response: &JsonRpcResponse) -> String {
        response
            .result
            .as_ref()
            .and_then(|r| r.get("content"))
            .and_then(|c| c.as_array())
            .and_then(|arr| arr.first())
            .and_then(|c| c.get("text"))
            .and_then(|t| t.as_str())
            .expect("Expected text content in response")
            .to_string()
    }
}

// ============================================================
// Error Handling Tests
// ============================================================

mod errors {
    use super::*;

    fn is_error(response: &JsonRpcResponse) -> bool {
        response.error.is_some() || {
            // Some implementations return error in result
            response
                .result
                .as_ref()
                .and_then(|r| r.get("isError"))
                .and_then(|e| e.as_bool())
                .unwrap_or(false)
        }
    }

    #[test]
    fn invalid_tool_name_returns_error() {
        let mut client = McpTestClient::spawn();
        client.initialize();

        let response = client.call_tool("nonexistent_tool", json!({}));

        assert!(response.error.is_some(), "Expected error for invalid tool");
    }

    #[test]
    fn unknown_product_returns_error() {
        let mut client = McpTestClient::spawn();
        client.initialize();

        let response =
            client.call_tool("favorite_product", json!({ "product_id": "prod_999" }));

        assert!(is_error(&response));
    }

    #[test]
    fn evolve_without_eligibility_returns_error() {
        let mut client = McpTestClient::spawn();
        client.initialize();

        // Fresh store, zero favorites: nothing qualifies, so the generator
        // is never reached.
        let response = client.call_tool("evolve", json!({}));

        assert!(is_error(&response));
    }

    #[test]
    fn missing_required_param_returns_error() {
        let mut client = McpTestClient::spawn();
        client.initialize();

        // favorite_product requires 'product_id'
        let response = client.call_tool("favorite_product", json!({}));

        assert!(is_error(&response));
    }
}
