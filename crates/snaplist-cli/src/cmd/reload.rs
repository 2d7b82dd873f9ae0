//! `snaplist reload`: re-read a collection through the submission path.

use super::{CmdContext, FilterArgs, TargetArgs, drain_submissions, open_session};
use crate::output;
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use snaplist_core::actions::SubmissionQueue;
use std::io::Write;

#[derive(Args, Debug)]
pub struct ReloadArgs {
    #[command(flatten)]
    pub target: TargetArgs,
}

#[derive(Debug, Serialize)]
struct ReloadOutput {
    project: String,
    kind: &'static str,
    count: usize,
    tags: Vec<String>,
}

pub fn run_reload(args: &ReloadArgs, ctx: &CmdContext) -> Result<()> {
    let mut session = open_session(ctx, &args.target, &FilterArgs::default())?;
    let mut queue = SubmissionQueue::new();
    session.controller.request_refresh(&mut queue)?;
    drain_submissions(&mut session, &mut queue)?;

    let controller = &session.controller;
    let result = ReloadOutput {
        project: controller.project_id().to_string(),
        kind: controller.kind().as_str(),
        count: controller.snapshots().len(),
        tags: controller.all_tags().to_vec(),
    };
    let label = controller.kind().refresh_label();
    output::render_mode(
        ctx.output,
        &result,
        |r, w| writeln!(w, "{}\t{}\t{}", r.project, r.kind, r.count),
        |r, w| writeln!(w, "✓ {label}: {} loaded for {}", r.count, r.project),
    )
}
