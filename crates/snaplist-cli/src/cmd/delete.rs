//! `snaplist delete`: remove one snapshot after confirmation.

use super::{CmdContext, FilterArgs, TargetArgs, drain_submissions, open_session};
use crate::output;
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use snaplist_core::actions::{Dispatch, SubmissionQueue};
use std::io::{self, BufRead, Write};

#[derive(Args, Debug)]
pub struct DeleteArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Snapshot to delete.
    pub snapshot_id: String,

    /// Skip the confirmation prompt.
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Debug, Serialize)]
struct DeleteOutput {
    snapshot_id: String,
    deleted: bool,
    remaining: usize,
}

pub fn run_delete(args: &DeleteArgs, ctx: &CmdContext) -> Result<()> {
    let mut session = open_session(ctx, &args.target, &FilterArgs::default())?;
    let mut queue = SubmissionQueue::new();
    let mut confirm = |prompt: &str| args.yes || ask(prompt);

    let dispatch =
        session
            .controller
            .request_delete(&args.snapshot_id, &mut confirm, &mut queue)?;
    let deleted = match dispatch {
        Dispatch::Submitted(_) => {
            drain_submissions(&mut session, &mut queue)?;
            true
        }
        Dispatch::Cancelled => false,
    };

    let result = DeleteOutput {
        snapshot_id: args.snapshot_id.clone(),
        deleted,
        remaining: session.controller.snapshots().len(),
    };
    let noun = session.controller.kind().noun();
    output::render_mode(
        ctx.output,
        &result,
        |r, w| {
            writeln!(
                w,
                "{}\t{}",
                r.snapshot_id,
                if r.deleted { "deleted" } else { "cancelled" }
            )
        },
        |r, w| {
            if r.deleted {
                writeln!(w, "✓ deleted {} ({} {noun} remaining)", r.snapshot_id, r.remaining)
            } else {
                writeln!(w, "cancelled, {} was not deleted", r.snapshot_id)
            }
        },
    )
}

/// Ask on stderr, read the answer from stdin. Anything but y/yes declines,
/// and so does a prompt that cannot be written or read.
fn ask(prompt: &str) -> bool {
    let stdin = io::stdin();
    match ask_with(prompt, &mut stdin.lock(), &mut io::stderr()) {
        Ok(answer) => answer,
        Err(err) => {
            tracing::warn!("confirmation prompt failed: {err}");
            false
        }
    }
}

fn ask_with(prompt: &str, input: &mut dyn BufRead, output: &mut dyn Write) -> io::Result<bool> {
    write!(output, "{prompt} [y/N] ")?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_explicit_yes_confirms() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("n"));
        assert!(!is_yes("yep"));
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    #[test]
    fn prompt_reads_answer_after_writing_question() {
        let mut out = Vec::new();
        let confirmed = ask_with("Are you sure?", &mut "yes\n".as_bytes(), &mut out).expect("ask");
        assert!(confirmed);
        assert_eq!(String::from_utf8(out).expect("utf8"), "Are you sure? [y/N] ");
    }

    #[test]
    fn unflushable_prompt_is_an_error() {
        let err = ask_with("Are you sure?", &mut "y\n".as_bytes(), &mut BrokenPipe)
            .expect_err("flush fails");
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn delete_args_parse() {
        use clap::Parser;

        #[derive(Parser)]
        struct Wrapper {
            #[command(flatten)]
            args: DeleteArgs,
        }
        let w = Wrapper::parse_from(["test", "p1", "s1", "--yes", "-k", "test-suites"]);
        assert_eq!(w.args.target.project, "p1");
        assert_eq!(w.args.snapshot_id, "s1");
        assert!(w.args.yes);
    }
}
