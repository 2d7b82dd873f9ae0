//! `snaplist prefs`: show or set display preferences.

use super::CmdContext;
use crate::output::{self, pretty_kv};
use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use snaplist_core::prefs::SHOW_FULL_JSON_METADATA;
use std::io::Write;

#[derive(Args, Debug)]
pub struct PrefsArgs {
    /// Collapse row metadata to a one-line summary.
    #[arg(long, value_name = "BOOL")]
    pub collapse_metadata: Option<bool>,
}

#[derive(Debug, Serialize)]
struct PrefsOutput {
    collapse_metadata: bool,
}

pub fn run_prefs(args: &PrefsArgs, ctx: &CmdContext) -> Result<()> {
    let mut prefs = ctx.preferences();
    if let Some(value) = args.collapse_metadata {
        prefs
            .set_bool(SHOW_FULL_JSON_METADATA, value)
            .context("failed to save preferences")?;
        tracing::info!(collapse_metadata = value, "updated preference");
    }

    let result = PrefsOutput {
        collapse_metadata: prefs.get_bool(SHOW_FULL_JSON_METADATA).unwrap_or(false),
    };
    output::render_mode(
        ctx.output,
        &result,
        |r, w| writeln!(w, "collapse_metadata\t{}", r.collapse_metadata),
        |r, w| pretty_kv(w, "Collapse", if r.collapse_metadata { "on" } else { "off" }),
    )
}
