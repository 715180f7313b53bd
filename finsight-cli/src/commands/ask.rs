//! Ask command - run one insight or chat request from a file

use std::path::Path;

use anyhow::Result;
use finsight_core::Error;

use super::{get_context, load_config, read_request, runtime};
use crate::output;

pub fn run(file: &Path, period: Option<String>, query: Option<String>, demo: bool) -> Result<()> {
    let mut config = load_config()?;
    if demo {
        config.enable_demo_mode();
    }
    let ctx = get_context(config)?;

    let mut request = read_request(file)?;
    if period.is_some() {
        request.period = period;
    }
    if let Some(query) = query.filter(|q| !q.trim().is_empty()) {
        request.query = Some(query);
    }

    let reply = runtime()?.block_on(ctx.insight_service.handle(request));

    match reply {
        Ok(reply) => {
            println!("{}", serde_json::to_string_pretty(&reply)?);
            Ok(())
        }
        Err(Error::MalformedResponse { message, raw }) => {
            output::error("The model did not return valid JSON. Raw response:");
            eprintln!("{}", raw);
            anyhow::bail!("Malformed model response: {}", message)
        }
        Err(e) => Err(e.into()),
    }
}
