//! Store commands: get, watch, stores.

use futures_util::StreamExt;
use serde::Serialize;
use serde_json::Value;
use tabled::Tabled;

use cuelink_core::{CoreError, Player, Stores};

use crate::cli::{GetArgs, OutputFormat, WatchArgs};
use crate::commands::Context;
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct StoreInfo {
    name: &'static str,
    api: &'static str,
}

#[derive(Tabled)]
struct StoreRow {
    #[tabled(rename = "Store")]
    name: &'static str,
    #[tabled(rename = "API path")]
    api: String,
}

pub fn list(ctx: &Context) -> Result<(), CliError> {
    let stores: Vec<StoreInfo> = Stores::DESCRIPTORS
        .iter()
        .map(|d| StoreInfo {
            name: d.name,
            api: d.api,
        })
        .collect();

    let out = output::render_list(
        ctx.format,
        &stores,
        |s| StoreRow {
            name: s.name,
            api: format!("/api/{}", s.api),
        },
        |s| s.name.to_owned(),
    )?;
    output::print_output(&out, ctx.quiet);
    Ok(())
}

/// Add the list of valid names to an unknown-store error.
fn with_store_names(err: CoreError) -> CliError {
    match err {
        CoreError::StoreNotFound { name } => CliError::StoreNotFound {
            name,
            available: Stores::DESCRIPTORS
                .iter()
                .map(|d| d.name)
                .collect::<Vec<_>>()
                .join(", "),
        },
        other => other.into(),
    }
}

pub async fn get(player: &Player, args: GetArgs, ctx: &Context) -> Result<(), CliError> {
    let state = player.state();
    state.refresh_store(&args.store).await.map_err(with_store_names)?;
    let value = state
        .get(&args.store, args.field.as_deref())
        .map_err(with_store_names)?;

    let out = output::render_value(ctx.format, &value)?;
    output::print_output(&out, ctx.quiet);
    Ok(())
}

/// Print the store's value, then every change, until interrupted or
/// `--count` values have been printed.
pub async fn watch(player: &Player, args: WatchArgs, ctx: &Context) -> Result<(), CliError> {
    let state = player.state();
    state.refresh_store(&args.store).await.map_err(with_store_names)?;
    let mut values = state
        .select(&args.store, args.field.as_deref())
        .map_err(with_store_names)?;
    player.open().await?;

    // one value per line unless the user asked for something else
    let format = match ctx.format {
        OutputFormat::Json => OutputFormat::JsonCompact,
        other => other,
    };

    let mut printed = 0usize;
    let mut last: Option<Value> = None;
    loop {
        if args.count.is_some_and(|n| printed >= n) {
            break;
        }
        let value = tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => break,
            next = values.next() => match next {
                Some(value) => value,
                None => break,
            },
        };
        // whole-store streams repeat equal values on every refresh
        if last.as_ref() == Some(&value) {
            continue;
        }
        let out = output::render_value(format, &value)?;
        output::print_output(&out, ctx.quiet);
        last = Some(value);
        printed += 1;
    }
    Ok(())
}
