//! Unit Helper MCP Server
//!
//! Line-delimited JSON-RPC 2.0 over stdio.
//!
//! Tools:
//! - call: Invoke a unit function, as a global or as a filter
//! - help: Get documentation for a function
//! - list_functions: List available functions
//!
//! Entity states come from the snapshot named by `UNIT_HELPER_STATES_PATH`
//! and from the optional `states` argument of each call.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::env;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use unit_helper::UnitHelper;
use unit_helper_core::{StateStore, TemplateState, Value};

const PROTOCOL_VERSION: &str = "2025-11-25";
const SERVER_NAME: &str = "unit-helper";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

const STATES_PATH_VAR: &str = "UNIT_HELPER_STATES_PATH";

// JSON-RPC error codes
const PARSE_ERROR: i32 = -32700;
const INVALID_REQUEST: i32 = -32600;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;

fn states_path() -> Option<PathBuf> {
    env::var_os(STATES_PATH_VAR).map(PathBuf::from)
}

/// Initial states; a missing or broken snapshot leaves the table empty
fn load_states() -> StateStore {
    let Some(path) = states_path() else {
        return StateStore::new();
    };
    let loaded = fs::read_to_string(&path)
        .map_err(|e| e.to_string())
        .and_then(|json| StateStore::from_json(&json).map_err(|e| e.to_string()));
    match loaded {
        Ok(store) => {
            info!(path = %path.display(), entities = store.len(), "loaded state snapshot");
            store
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not load state snapshot");
            StateStore::new()
        }
    }
}

// MCP Protocol types
#[derive(Debug, Deserialize)]
struct McpRequest {
    jsonrpc: String,
    id: Option<JsonValue>,
    method: String,
    #[serde(default)]
    params: Option<JsonValue>,
}

#[derive(Debug, Serialize)]
struct McpResponse {
    jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<McpError>,
}

#[derive(Debug, Serialize)]
struct McpError {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<JsonValue>,
}

impl McpError {
    fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), data: None }
    }

    fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS, message)
    }
}

impl McpResponse {
    fn reply(id: Option<JsonValue>, result: Result<JsonValue, McpError>) -> Self {
        let (result, error) = match result {
            Ok(r) => (Some(r), None),
            Err(e) => (None, Some(e)),
        };
        Self { jsonrpc: "2.0".to_string(), id, result, error }
    }
}

struct Server {
    helper: UnitHelper,
    states: StateStore,
}

impl Server {
    fn new(helper: UnitHelper, states: StateStore) -> Self {
        Self { helper, states }
    }

    /// Serve requests until EOF
    fn serve(&self, input: impl BufRead, mut output: impl Write) -> io::Result<()> {
        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            debug!(bytes = line.len(), "received");

            let request: McpRequest = match serde_json::from_str(line) {
                Ok(r) => r,
                Err(e) => {
                    warn!(error = %e, "unparseable request");
                    let error = McpError::new(PARSE_ERROR, format!("Parse error: {}", e));
                    write_response(&mut output, &McpResponse::reply(None, Err(error)))?;
                    continue;
                }
            };

            let response = self.handle_request(&request);

            // Notifications (no id) get no response
            if request.id.is_none() {
                debug!(method = %request.method, "notification processed");
                continue;
            }
            write_response(&mut output, &response)?;
        }
        info!("client disconnected");
        Ok(())
    }

    fn handle_request(&self, request: &McpRequest) -> McpResponse {
        debug!(method = %request.method, "processing");
        if request.jsonrpc != "2.0" {
            let error = McpError::new(INVALID_REQUEST, format!("Unsupported jsonrpc version: {}", request.jsonrpc));
            return McpResponse::reply(request.id.clone(), Err(error));
        }

        let result = match request.method.as_str() {
            "initialize" => handle_initialize(&request.params),
            "initialized" | "notifications/initialized" => Ok(json!({})),
            "ping" => Ok(json!({})),
            "tools/list" => handle_tools_list(),
            "tools/call" => self.handle_tool_call(&request.params),
            _ => Err(McpError::new(METHOD_NOT_FOUND, format!("Method not found: {}", request.method))),
        };

        McpResponse::reply(request.id.clone(), result)
    }

    fn handle_tool_call(&self, params: &Option<JsonValue>) -> Result<JsonValue, McpError> {
        let params = params.as_ref().ok_or_else(|| McpError::invalid_params("Missing params"))?;

        let name = params.get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| McpError::invalid_params("Missing tool name"))?;

        let args = params.get("arguments").cloned().unwrap_or(json!({}));

        match name {
            "call" => self.tool_call(&args),
            "help" => self.tool_help(&args),
            "list_functions" => self.tool_list_functions(&args),
            _ => Err(McpError::invalid_params(format!("Unknown tool: {}", name))),
        }
    }

    fn tool_call(&self, args: &JsonValue) -> Result<JsonValue, McpError> {
        let function = args.get("function")
            .and_then(|v| v.as_str())
            .ok_or_else(|| McpError::invalid_params("Missing function argument"))?;

        let call_args: Vec<Value> = match args.get("args") {
            None | Some(JsonValue::Null) => Vec::new(),
            Some(JsonValue::Array(items)) => items.iter().map(json_to_value).collect(),
            Some(_) => return Err(McpError::invalid_params("args must be an array")),
        };

        let states = Arc::new(self.call_states(args.get("states"))?);

        let result = match args.get("input") {
            Some(input) => self.helper.call_filter(function, json_to_value(input), &call_args, states),
            None => self.helper.call(function, &call_args, states),
        };

        Ok(json!({
            "content": [{ "type": "text", "text": result.to_string() }],
            "data": value_to_json(&result),
            "isError": result.is_error()
        }))
    }

    /// Snapshot states overlaid with the ones sent along with the call
    fn call_states(&self, extra: Option<&JsonValue>) -> Result<StateStore, McpError> {
        let mut states = self.states.clone();
        if let Some(extra) = extra.filter(|v| !v.is_null()) {
            let extra: Vec<TemplateState> = serde_json::from_value(extra.clone())
                .map_err(|e| McpError::invalid_params(format!("Invalid states: {}", e)))?;
            states.extend(extra);
        }
        Ok(states)
    }

    fn tool_help(&self, args: &JsonValue) -> Result<JsonValue, McpError> {
        let name = args.get("name").and_then(|v| v.as_str());
        let help = self.helper.help(name);

        Ok(json!({
            "content": [{ "type": "text", "text": format_help(&help) }],
            "data": value_to_json(&help)
        }))
    }

    fn tool_list_functions(&self, args: &JsonValue) -> Result<JsonValue, McpError> {
        let category = args.get("category").and_then(|v| v.as_str());
        let functions = self.helper.list_functions(category);
        Ok(json!({ "content": [{ "type": "text", "text": "Functions listed" }], "data": value_to_json(&functions) }))
    }
}

fn write_response(output: &mut impl Write, response: &McpResponse) -> io::Result<()> {
    serde_json::to_writer(&mut *output, response)?;
    output.write_all(b"\n")?;
    output.flush()
}

fn handle_initialize(params: &Option<JsonValue>) -> Result<JsonValue, McpError> {
    let client_info = params.as_ref()
        .and_then(|p| p.get("clientInfo"))
        .and_then(|c| c.get("name"))
        .and_then(|n| n.as_str())
        .unwrap_or("unknown");

    // Use client's protocol version for compatibility
    let client_protocol = params.as_ref()
        .and_then(|p| p.get("protocolVersion"))
        .and_then(|v| v.as_str())
        .unwrap_or(PROTOCOL_VERSION);

    info!(client = client_info, protocol = client_protocol, "client connected");

    Ok(json!({
        "protocolVersion": client_protocol,
        "serverInfo": {
            "name": SERVER_NAME,
            "version": SERVER_VERSION,
            "description": "Unit conversion helpers for home-automation templates"
        },
        "capabilities": {
            "tools": {
                "listChanged": false
            }
        },
        "instructions": "Use 'call' to run to_unit, from_unit, with_unit, quantity or without_unit. Values may be numbers, strings like '5 km', [value, unit] pairs, state objects or 'states.<entity_id>' references. Use 'help' for per-function documentation."
    }))
}

fn handle_tools_list() -> Result<JsonValue, McpError> {
    Ok(json!({
        "tools": [
            {
                "name": "call",
                "description": "Call a unit function. With 'input' the call is filter-style: input | function(args...).",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "function": {
                            "type": "string",
                            "description": "Function name, e.g. to_unit"
                        },
                        "args": {
                            "type": "array",
                            "description": "Positional arguments"
                        },
                        "input": {
                            "description": "Piped value for filter-style calls"
                        },
                        "states": {
                            "type": "array",
                            "description": "Entity states for this call: {entity_id, state, attributes}",
                            "items": { "type": "object" }
                        }
                    },
                    "required": ["function"]
                }
            },
            {
                "name": "help",
                "description": "Get documentation for a function, or general help.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "name": {
                            "type": "string",
                            "description": "Function name. Omit for general help."
                        }
                    }
                }
            },
            {
                "name": "list_functions",
                "description": "List all available functions, optionally by category.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "category": {
                            "type": "string",
                            "description": "Filter by category",
                            "enum": ["units"]
                        }
                    }
                }
            }
        ]
    }))
}

fn format_help(help: &Value) -> String {
    match help {
        Value::Object(map) => {
            let mut out = String::new();
            if let Some(Value::Text(n)) = map.get("name") { out.push_str(&format!("# {}\n\n", n)); }
            if let Some(Value::Text(d)) = map.get("description") { out.push_str(&format!("{}\n\n", d)); }
            if let Some(Value::Text(u)) = map.get("usage") { out.push_str(&format!("**Usage:** `{}`\n\n", u)); }
            if let Some(Value::List(examples)) = map.get("examples") {
                for example in examples {
                    out.push_str(&format!("- `{}`\n", example));
                }
            }
            out
        }
        Value::Error(e) => format!("Error: {}", e.message),
        other => other.to_string(),
    }
}

/// Objects shaped like `{entity_id, state, ...}` become sensor states
fn json_to_value(json: &JsonValue) -> Value {
    match json {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Number(n) => match n.as_f64() {
            Some(f) => Value::Number(f),
            None => Value::Text(n.to_string()),
        },
        JsonValue::String(s) => Value::Text(s.clone()),
        JsonValue::Array(arr) => Value::List(arr.iter().map(json_to_value).collect()),
        JsonValue::Object(obj) => {
            if obj.contains_key("entity_id") && obj.contains_key("state") {
                if let Ok(state) = serde_json::from_value::<TemplateState>(json.clone()) {
                    return Value::State(state);
                }
            }
            Value::Object(obj.iter().map(|(k, v)| (k.clone(), json_to_value(v))).collect())
        }
    }
}

fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Number(n) => json!(n),
        Value::Text(s) => JsonValue::String(s.clone()),
        Value::List(l) => JsonValue::Array(l.iter().map(value_to_json).collect()),
        Value::Object(o) => JsonValue::Object(o.iter().map(|(k, v)| (k.clone(), value_to_json(v))).collect()),
        Value::State(s) => json!({"entity_id": s.entity_id, "state": s.state, "attributes": s.attributes}),
        Value::Quantity(q) => json!({"magnitude": q.magnitude, "unit": q.unit.symbol}),
        Value::Error(e) => json!({"_error": e}),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();

    info!(version = SERVER_VERSION, protocol = PROTOCOL_VERSION, "unit helper MCP server started");

    let server = Server::new(UnitHelper::default(), load_states());

    let stdin = io::stdin();
    let stdout = io::stdout();
    if let Err(e) = server.serve(stdin.lock(), stdout.lock()) {
        warn!(error = %e, "i/o error, shutting down");
    }
    info!("server shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn server() -> Server {
        let states = StateStore::new()
            .with_state(TemplateState::new("sensor.outdoor", "21.5").with_unit("°C"));
        Server::new(UnitHelper::default(), states)
    }

    /// Feed request lines through the server, return the parsed responses
    fn exchange(server: &Server, requests: &[JsonValue]) -> Vec<JsonValue> {
        let input: String = requests.iter().map(|r| format!("{}\n", r)).collect();
        let mut output = Vec::new();
        server.serve(Cursor::new(input), &mut output).unwrap();
        String::from_utf8(output).unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    fn call(server: &Server, arguments: JsonValue) -> JsonValue {
        let request = json!({"jsonrpc": "2.0", "id": 1, "method": "tools/call",
            "params": {"name": "call", "arguments": arguments}});
        exchange(server, &[request]).remove(0)
    }

    #[test]
    fn test_initialize_and_notification() {
        let responses = exchange(&server(), &[
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize",
                "params": {"protocolVersion": "2025-06-18", "clientInfo": {"name": "test"}}}),
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
            json!({"jsonrpc": "2.0", "id": 2, "method": "ping"}),
        ]);
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["result"]["protocolVersion"], "2025-06-18");
        assert_eq!(responses[1]["id"], 2);
    }

    #[test]
    fn test_tools_list() {
        let responses = exchange(&server(), &[json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"})]);
        let names: Vec<&str> = responses[0]["result"]["tools"].as_array().unwrap()
            .iter().map(|t| t["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["call", "help", "list_functions"]);
    }

    #[test]
    fn test_call_with_snapshot_state() {
        let response = call(&server(), json!({"function": "to_unit", "args": ["states.sensor.outdoor", "degF"]}));
        let value = response["result"]["data"].as_f64().unwrap();
        assert!((value - 70.7).abs() < 1e-9);
        assert_eq!(response["result"]["isError"], false);
    }

    #[test]
    fn test_filter_call_with_per_call_states() {
        let response = call(&server(), json!({
            "function": "to_unit",
            "input": "states.sensor.energy",
            "args": ["Wh"],
            "states": [{"entity_id": "sensor.energy", "state": "1.5", "attributes": {"unit_of_measurement": "kWh"}}]
        }));
        assert_eq!(response["result"]["data"].as_f64(), Some(1500.0));
    }

    #[test]
    fn test_state_object_argument() {
        let response = call(&server(), json!({
            "function": "with_unit",
            "args": [{"entity_id": "sensor.p", "state": "800", "attributes": {"unit_of_measurement": "W"}}]
        }));
        assert_eq!(response["result"]["data"], json!({"magnitude": 800.0, "unit": "W"}));
    }

    #[test]
    fn test_template_errors_are_tool_errors() {
        let response = call(&server(), json!({"function": "with_unit", "args": [42]}));
        assert_eq!(response["result"]["isError"], true);
        assert_eq!(response["result"]["data"]["_error"]["code"], "MISSING_UNIT");
    }

    #[test]
    fn test_invalid_states_rejected() {
        let response = call(&server(), json!({"function": "to_unit", "args": [1, "W"], "states": [{"state": 3}]}));
        assert_eq!(response["error"]["code"], INVALID_PARAMS);
    }

    #[test]
    fn test_protocol_errors() {
        let mut output = Vec::new();
        server().serve(Cursor::new("{not json\n"), &mut output).unwrap();
        let response: JsonValue = serde_json::from_slice(&output).unwrap();
        assert_eq!(response["error"]["code"], PARSE_ERROR);

        let responses = exchange(&server(), &[json!({"jsonrpc": "2.0", "id": 5, "method": "resources/list"})]);
        assert_eq!(responses[0]["error"]["code"], METHOD_NOT_FOUND);
    }

    #[test]
    fn test_help_tool() {
        let responses = exchange(&server(), &[json!({"jsonrpc": "2.0", "id": 1, "method": "tools/call",
            "params": {"name": "help", "arguments": {"name": "to_unit"}}})]);
        let text = responses[0]["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("# to_unit"));
    }
}
