//! `snaplist list`: show the filtered, ordered snapshot list.

use super::{CmdContext, FilterArgs, TargetArgs, display_location, open_session};
use crate::output::{self, pretty_kv, pretty_rule, pretty_section};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use snaplist_core::query::History;
use snaplist_core::slots::{DefaultSlots, RowAction};
use snaplist_core::view::{FilterControls, ListView, RowView};
use std::io::{self, Write};

#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    #[command(flatten)]
    pub filters: FilterArgs,
}

#[derive(Serialize)]
struct ListOutput<'a> {
    project: &'a str,
    kind: &'a str,
    location: String,
    list: ListView<'a>,
}

pub fn run_list(args: &ListArgs, ctx: &CmdContext) -> Result<()> {
    let session = open_session(ctx, &args.target, &args.filters)?;
    let controller = &session.controller;
    let result = ListOutput {
        project: controller.project_id(),
        kind: controller.kind().as_str(),
        location: display_location(session.history.location()),
        list: controller.view(&DefaultSlots),
    };

    output::render_mode(ctx.output, &result, render_text, render_pretty)
}

fn render_text(result: &ListOutput<'_>, w: &mut dyn Write) -> io::Result<()> {
    match &result.list {
        ListView::Nested => Ok(()),
        ListView::Empty(empty) => writeln!(w, "{}", empty.message),
        ListView::Table(table) => {
            writeln!(w, "{}\ttimestamp\ttags\tmetadata", table.id_header)?;
            for row in &table.rows {
                writeln!(
                    w,
                    "{}\t{}\t{}\t{}",
                    row.snapshot.id,
                    row.snapshot.timestamp,
                    row.snapshot.tags.join(","),
                    single_line(&row.metadata.text)
                )?;
            }
            Ok(())
        }
    }
}

fn render_pretty(result: &ListOutput<'_>, w: &mut dyn Write) -> io::Result<()> {
    match &result.list {
        ListView::Nested => Ok(()),
        ListView::Empty(empty) => {
            render_controls(w, &empty.controls, &result.location)?;
            writeln!(w)?;
            writeln!(w, "{}", empty.message)
        }
        ListView::Table(table) => {
            pretty_section(w, &format!("{} · {}", table.crumb.link_text, result.project))?;
            render_controls(w, &table.controls, &result.location)?;
            pretty_rule(w)?;
            writeln!(
                w,
                "{:<24} {:<24} {:<20} {}",
                table.id_header, "Timestamp", "Tags", "Metadata"
            )?;
            for row in &table.rows {
                render_row(w, row)?;
            }
            if let Some(hint) = table.hint {
                writeln!(w, "{hint}")?;
            }
            Ok(())
        }
    }
}

fn render_controls(w: &mut dyn Write, controls: &FilterControls, location: &str) -> io::Result<()> {
    let tags = if controls.selected_tags.is_empty() {
        "(any)".to_string()
    } else {
        controls.selected_tags.join(", ")
    };
    pretty_kv(w, "Tags", tags)?;
    if !controls.metadata_query.is_empty() {
        pretty_kv(w, "Search", &controls.metadata_query)?;
    }
    pretty_kv(w, "Sort", controls.sort.as_str())?;
    pretty_kv(w, "Location", location)
}

fn render_row(w: &mut dyn Write, row: &RowView<'_>) -> io::Result<()> {
    writeln!(
        w,
        "{:<24} {:<24} {:<20} {}",
        row.snapshot.id,
        row.timestamp,
        row.snapshot.tags.join(", "),
        single_line(&row.metadata.text)
    )?;
    let actions: Vec<String> = row
        .actions
        .iter()
        .map(|action| match action {
            RowAction::View { target, .. } => format!("view {target}"),
            RowAction::Download { link, .. } => format!("download {link}"),
            other => other.label().to_ascii_lowercase(),
        })
        .collect();
    writeln!(w, "{:<24} {}", "", actions.join("  "))
}

/// Collapse pretty JSON onto one line.
pub fn single_line(text: &str) -> String {
    text.lines().map(str::trim).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_args_defaults() {
        use clap::Parser;

        #[derive(Parser)]
        struct Wrapper {
            #[command(flatten)]
            args: ListArgs,
        }
        let w = Wrapper::parse_from(["test", "p1"]);
        assert_eq!(w.args.target.project, "p1");
        assert_eq!(
            w.args.target.kind,
            snaplist_core::model::SnapshotKind::Reports
        );
        assert!(w.args.filters.tags.is_empty());
        assert!(w.args.filters.sort.is_none());
    }

    #[test]
    fn list_args_parse_filters() {
        use clap::Parser;

        #[derive(Parser)]
        struct Wrapper {
            #[command(flatten)]
            args: ListArgs,
        }
        let w = Wrapper::parse_from([
            "test", "p1", "--kind", "test-suites", "-t", "prod", "-t", "gpu", "--sort", "asc",
            "-s", "nightly",
        ]);
        assert_eq!(
            w.args.target.kind,
            snaplist_core::model::SnapshotKind::TestSuites
        );
        assert_eq!(w.args.filters.tags, vec!["prod", "gpu"]);
        assert_eq!(w.args.filters.search.as_deref(), Some("nightly"));
        assert_eq!(
            w.args.filters.sort,
            Some(snaplist_core::sort::SortDirection::Ascending)
        );
    }

    #[test]
    fn single_line_joins_pretty_json() {
        assert_eq!(single_line("{\n  \"a\": 1\n}"), "{ \"a\": 1 }");
    }
}
