//! Serve command - run the HTTP API

use std::sync::Arc;

use anyhow::Result;

use super::{get_context, load_config, runtime};
use crate::output;

pub fn run(host: Option<String>, port: Option<u16>, demo: bool) -> Result<()> {
    let mut config = load_config()?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if demo {
        config.enable_demo_mode();
    }

    let host = config.server.host.clone();
    let port = config.server.port;
    let ctx = get_context(config)?;

    if ctx.config.demo_mode {
        output::warning("Demo mode: replies are canned, OpenAI is not called");
    }
    output::info(&format!(
        "Serving /ai-insight on http://{}:{} ({} via {})",
        host,
        port,
        ctx.config.llm.model,
        ctx.provider_name()
    ));

    runtime()?.block_on(finsight_api::run_server(Arc::new(ctx), &host, port))
}
