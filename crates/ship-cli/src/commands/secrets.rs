use std::io::{self, IsTerminal, Read};

use dialoguer::{Confirm, Password};

use ship_core::store::secrets;
use ship_core::{Document, Match, Node};

use crate::app::AppContext;
use crate::cli::{AddArgs, GetArgs, ListArgs, RemoveArgs};
use crate::errors::CliError;

pub fn handle_add(ctx: &mut AppContext, args: &AddArgs) -> anyhow::Result<()> {
    let value = read_value(args)?;
    let quiet = ctx.quiet();
    let (store, session) = ctx.store_and_session()?;

    let mut ship = store.load_ship(session)?;
    let replaced = secrets::insert(&mut ship, &args.id, value)?;
    store.save_ship(session, &ship)?;

    if !quiet {
        let verb = if replaced.is_some() { "Updated" } else { "Added" };
        println!("{} '{}'", verb, args.id);
    }
    Ok(())
}

pub fn handle_get(ctx: &mut AppContext, args: &GetArgs) -> anyhow::Result<()> {
    let quiet = ctx.quiet();
    let (store, session) = ctx.store_and_session()?;
    let (ship, settings) = store.load_ship_with_settings(session)?;
    let threshold = settings.match_threshold;

    let (found, value) = secrets::get(&ship, &args.id, threshold)?;
    report_match(quiet, &args.id, &found);

    if args.json {
        let output = serde_json::json!({ "id": found.id, "value": value });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_document(value)?;
    }
    Ok(())
}

pub fn handle_remove(ctx: &mut AppContext, args: &RemoveArgs) -> anyhow::Result<()> {
    let quiet = ctx.quiet();
    let (store, session) = ctx.store_and_session()?;
    let (mut ship, settings) = store.load_ship_with_settings(session)?;
    let threshold = settings.match_threshold;

    let (found, _) = secrets::remove(&mut ship, &args.id, threshold)?;
    report_match(quiet, &args.id, &found);

    if !args.force && !confirm_removal(&found.id)? {
        if !quiet {
            println!("Cancelled.");
        }
        return Ok(());
    }

    store.save_ship(session, &ship)?;
    if !quiet {
        println!("Removed '{}'", found.id);
    }
    Ok(())
}

pub fn handle_list(ctx: &mut AppContext, args: &ListArgs) -> anyhow::Result<()> {
    let quiet = ctx.quiet();
    let (store, session) = ctx.store_and_session()?;
    let ids = secrets::ids(&store.load_ship(session)?)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&ids)?);
        return Ok(());
    }
    if ids.is_empty() && !quiet {
        eprintln!("No secrets stored yet. Add one with `ship add <id>`.");
    }
    for id in ids {
        println!("{}", id);
    }
    Ok(())
}

/// Scalars print bare so they can be piped; anything nested prints as JSON.
pub(crate) fn print_document(document: &Document) -> anyhow::Result<()> {
    match document {
        Node::Scalar(scalar) => println!("{}", scalar),
        other => println!("{}", serde_json::to_string_pretty(other)?),
    }
    Ok(())
}

/// Goes to stderr so stdout only ever carries the secret.
fn report_match(quiet: bool, query: &str, found: &Match) {
    if !quiet && found.id != query {
        eprintln!("Matched '{}' (similarity {:.2})", found.id, found.score);
    }
}

fn confirm_removal(id: &str) -> anyhow::Result<bool> {
    if !io::stdin().is_terminal() {
        return Err(CliError::invalid_input(format!(
            "Refusing to remove '{}' without confirmation. Pass --force.",
            id
        ))
        .into());
    }
    let confirmed = Confirm::new()
        .with_prompt(format!("Remove '{}'?", id))
        .default(false)
        .interact()?;
    Ok(confirmed)
}

fn read_value(args: &AddArgs) -> anyhow::Result<Document> {
    if let Some(doc) = &args.json {
        return Ok(Document::from_json(doc)?);
    }
    if let Some(value) = &args.value {
        return text_value(value.clone());
    }

    if io::stdin().is_terminal() {
        let value = Password::new()
            .with_prompt(format!("Value for '{}'", args.id))
            .interact()?;
        return text_value(value);
    }

    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|e| anyhow::anyhow!("Failed to read stdin: {}", e))?;
    let trimmed = buffer.trim_end_matches(|c: char| c == '\n' || c == '\r');
    text_value(trimmed.to_string())
}

fn text_value(value: String) -> anyhow::Result<Document> {
    if value.is_empty() {
        return Err(CliError::invalid_input("Secret value cannot be empty").into());
    }
    Ok(Document::from(value))
}
