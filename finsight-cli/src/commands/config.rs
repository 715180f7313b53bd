//! Config command - show the effective configuration

use anyhow::Result;
use colored::Colorize;

use finsight_core::config::{mask_key, SETTINGS_FILE};

use super::{get_finsight_dir, load_config};
use crate::output;

pub fn run(json: bool) -> Result<()> {
    let finsight_dir = get_finsight_dir()?;
    let config = load_config()?;
    let validation = config.validate();

    if json {
        let mut value = serde_json::to_value(&config)?;
        if let Some(map) = value.as_object_mut() {
            map.insert(
                "settingsPath".to_string(),
                finsight_dir.join(SETTINGS_FILE).display().to_string().into(),
            );
            map.insert("valid".to_string(), validation.is_ok().into());
        }
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", "Finsight Configuration".bold());
    println!();

    let api_key = config
        .llm
        .api_key
        .as_deref()
        .map(mask_key)
        .unwrap_or_else(|| "(not set)".to_string());

    let mut table = output::create_table();
    table.add_row(vec!["Settings file".to_string(), finsight_dir.join(SETTINGS_FILE).display().to_string()]);
    table.add_row(vec!["API key".to_string(), api_key]);
    table.add_row(vec!["Model".to_string(), config.llm.model.clone()]);
    table.add_row(vec!["Base URL".to_string(), config.llm.base_url.clone()]);
    table.add_row(vec!["Temperature".to_string(), config.llm.temperature.to_string()]);
    table.add_row(vec!["Timeout".to_string(), format!("{}s", config.llm.timeout_secs)]);
    table.add_row(vec!["Listen".to_string(), config.bind_address()]);
    table.add_row(vec![
        "UTC offset".to_string(),
        format!("{} min", config.insights.utc_offset_minutes),
    ]);
    table.add_row(vec![
        "Prompt transaction cap".to_string(),
        config.insights.max_prompt_transactions.to_string(),
    ]);
    table.add_row(vec!["Demo mode".to_string(), config.demo_mode.to_string()]);
    println!("{}", table);
    println!();

    match validation {
        Ok(()) => output::success("Configuration is valid"),
        Err(e) => output::warning(&e.to_string()),
    }

    Ok(())
}
