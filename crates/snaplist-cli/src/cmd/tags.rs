//! `snaplist tags`: print the tag vocabulary of a collection.

use super::{CmdContext, FilterArgs, TargetArgs, open_session};
use crate::output::{self, pretty_section};
use anyhow::Result;
use clap::Args;
use std::io::Write;

#[derive(Args, Debug)]
pub struct TagsArgs {
    #[command(flatten)]
    pub target: TargetArgs,
}

pub fn run_tags(args: &TagsArgs, ctx: &CmdContext) -> Result<()> {
    let session = open_session(ctx, &args.target, &FilterArgs::default())?;
    let tags = session.controller.all_tags();
    output::render_mode(
        ctx.output,
        tags,
        |tags, w| {
            for tag in tags {
                writeln!(w, "{tag}")?;
            }
            Ok(())
        },
        |tags, w| {
            pretty_section(w, &format!("Tags ({})", tags.len()))?;
            for tag in tags {
                writeln!(w, "  {tag}")?;
            }
            Ok(())
        },
    )
}
