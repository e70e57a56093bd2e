//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use eas_toolkit::config::NetworkConfig;

/// Anvil account #0.
#[allow(dead_code)]
pub const TEST_PRIVATE_KEY: &str =
    "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
#[allow(dead_code)]
pub const TEST_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

/// Address nothing listens on; connections are refused immediately.
#[allow(dead_code)]
pub const DEAD_RPC: &str = "http://127.0.0.1:1";

/// Network config pointing at `rpc_url` with short timeouts.
#[allow(dead_code)]
pub fn network_config(rpc_url: &str) -> NetworkConfig {
    NetworkConfig {
        rpc_url: rpc_url.to_string(),
        rpc_timeout_secs: 2,
        confirmation_timeout_secs: 5,
        ..NetworkConfig::default()
    }
}

/// Fresh path under the system temp dir; the directory is not created.
#[allow(dead_code)]
pub fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("eas-toolkit-it-{}", uuid::Uuid::new_v4()))
        .join(name)
}

/// Start a mock JSON-RPC node. `handler` maps `(method, params)` to the
/// `result` value; `None` answers with a JSON-RPC error.
///
/// Returns the node's URL.
#[allow(dead_code)]
pub async fn start_mock_rpc<F>(handler: F) -> String
where
    F: Fn(&str, &Value) -> Option<Value> + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    let handler = Arc::new(handler);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let handler = handler.clone();
                    tokio::spawn(async move {
                        let Some(body) = read_request(&mut socket).await else {
                            return;
                        };
                        let request: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
                        let method = request["method"].as_str().unwrap_or_default();
                        let response = match handler(method, &request["params"]) {
                            Some(result) => json!({
                                "jsonrpc": "2.0",
                                "id": request["id"],
                                "result": result,
                            }),
                            None => json!({
                                "jsonrpc": "2.0",
                                "id": request["id"],
                                "error": { "code": -32601, "message": format!("unsupported: {}", method) },
                            }),
                        };
                        let body = response.to_string();
                        let response_str = format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    format!("http://{}", addr)
}

async fn read_request(socket: &mut TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);

        let Some(header_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
        let content_length: usize = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0);
        let body_start = header_end + 4;
        if buf.len() >= body_start + content_length {
            let body = &buf[body_start..body_start + content_length];
            return Some(String::from_utf8_lossy(body).into_owned());
        }
    }
}
