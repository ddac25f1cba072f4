use ship_core::Document;

use crate::app::AppContext;
use crate::errors::CliError;

use super::secrets::print_document;

pub fn handle_config_get(ctx: &mut AppContext, key: Option<&str>) -> anyhow::Result<()> {
    let (store, session) = ctx.store_and_session()?;
    let config = store.load_config(session)?;

    let Some(key) = key else {
        return print_document(&config);
    };
    let value = config
        .as_mapping()
        .and_then(|entries| entries.get(key))
        .ok_or_else(|| {
            CliError::not_found(
                format!("No setting named '{}'.", key),
                "Hint: Run `ship config get` to see all settings.",
            )
        })?;
    print_document(value)
}

pub fn handle_config_set(ctx: &mut AppContext, key: &str, value: &str) -> anyhow::Result<()> {
    let quiet = ctx.quiet();
    let (store, session) = ctx.store_and_session()?;
    let mut config = store.load_config(session)?;

    let entries = config
        .as_mapping_mut()
        .ok_or_else(|| anyhow::anyhow!("Config document is not a mapping"))?;
    entries.insert(key.to_string(), parse_setting(value));
    store.save_config(session, &config)?;

    if !quiet {
        println!("Set {} = {}", key, value);
    }
    Ok(())
}

/// Numbers and JSON documents keep their type; anything else is text.
fn parse_setting(value: &str) -> Document {
    Document::from_json(value).unwrap_or_else(|_| Document::from(value))
}
