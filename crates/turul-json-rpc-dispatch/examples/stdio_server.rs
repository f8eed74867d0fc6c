//! Line-delimited JSON-RPC over stdio
//!
//! Reads one request document per line from stdin and writes each response
//! body to stdout. Logs go to stderr.
//!
//! ```text
//! $ echo '{"jsonrpc": "2.0", "method": "add", "params": [2, 3], "id": 1}' \
//!     | cargo run --example stdio_server
//! {"jsonrpc":"2.0","result":5.0,"id":1}
//! ```
//!
//! Set `JSONRPC_DEBUG=1` to include failure details in error responses.

use anyhow::anyhow;
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};
use turul_json_rpc_dispatch::prelude::*;

fn build_dispatcher(config: DispatcherConfig) -> JsonRpcDispatcher {
    let mut dispatcher = JsonRpcDispatcher::with_config(config);

    dispatcher
        .method_sync("ping", MethodSignature::new(), |_| Ok(json!("pong")))
        .method(
            "add",
            MethodSignature::new().required("a").required("b"),
            |params: BoundParams| async move {
                let a: f64 = params.get_as("a")?;
                let b: f64 = params.get_as("b")?;
                Ok::<_, anyhow::Error>(json!(a + b))
            },
        )
        .method_sync(
            "divide",
            MethodSignature::new().required("dividend").required("divisor"),
            |params| {
                let dividend: f64 = params.get_as("dividend")?;
                let divisor: f64 = params.get_as("divisor")?;
                if divisor == 0.0 {
                    let error = JsonRpcServerError::invalid_params("divisor must not be zero");
                    return Err(error.into());
                }
                Ok(json!(dividend / divisor))
            },
        )
        .method_sync(
            "greet",
            MethodSignature::new()
                .required("name")
                .with_default("greeting", json!("Hello"))
                .var_keyword("extra"),
            |params| {
                let name: String = params.get_as("name")?;
                let greeting: String = params.get_as("greeting")?;
                let mut reply = json!({ "message": format!("{}, {}!", greeting, name) });
                if !params.extra().is_empty() {
                    reply["ignored"] = Value::Object(params.extra().clone());
                }
                Ok(reply)
            },
        )
        .method_sync("fail", MethodSignature::new(), |_| {
            Err(anyhow!("this method always fails"))
        });

    dispatcher
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let debug_mode = std::env::var("JSONRPC_DEBUG").is_ok_and(|value| value == "1");
    let dispatcher = build_dispatcher(DispatcherConfig::default().with_debug(debug_mode));
    info!(
        methods = ?dispatcher.registered_methods(),
        debug = debug_mode,
        "Serving JSON-RPC on stdio"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let (body, status) = dispatcher.dispatch_str(&line).await;
        match body {
            Some(body) => {
                if !status.is_success() {
                    warn!(status = status.as_u16(), "Request failed");
                }
                stdout.write_all(body.to_string().as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
            None => info!(status = status.as_u16(), "Nothing to send"),
        }
    }

    Ok(())
}
