//! Template store handlers for CLI: list, show, search, stats, delete.

use anyhow::Result;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::cli::output::{
    output_json, output_json_list, print_header, print_hint, print_kv, print_success, print_table,
    OutputMode,
};
use crate::init::AppContext;
use crate::models::{Template, TemplateSummary};

/// Compact single-line preview of an action's parameter object.
fn params_preview(params: &Map<String, Value>) -> String {
    let json = serde_json::to_string(params).unwrap_or_default();
    if json.len() > 60 {
        format!("{}...", &json[..60])
    } else {
        json
    }
}

fn summary_row(summary: &TemplateSummary, with_archive: bool) -> Vec<String> {
    let mut row = vec![
        summary.name.clone(),
        summary.kind.as_str().to_string(),
        summary.tags.join(", "),
        summary.action_count.to_string(),
        summary.version.to_string(),
        summary.updated_at.format("%Y-%m-%d %H:%M").to_string(),
    ];
    if with_archive {
        row.push(match &summary.revisions {
            Some(revs) if !revs.is_empty() => revs
                .iter()
                .map(|r| format!("r{}", r.revision))
                .collect::<Vec<_>>()
                .join(" "),
            _ => "-".to_string(),
        });
    }
    row
}

fn render_template(template: &Template) {
    print_header(&template.name);
    print_kv("Kind", template.kind.as_str());
    print_kv("Tags", &template.tags.join(", "));
    print_kv("Description", &template.description);
    print_kv("Version", &template.version.to_string());
    print_kv(
        "Created",
        &template.created_at.format("%Y-%m-%d %H:%M").to_string(),
    );
    print_kv(
        "Updated",
        &template.updated_at.format("%Y-%m-%d %H:%M").to_string(),
    );
    println!();

    let rows: Vec<Vec<String>> = template
        .actions
        .iter()
        .enumerate()
        .map(|(i, action)| {
            vec![
                i.to_string(),
                action.tool.clone(),
                params_preview(&action.params),
            ]
        })
        .collect();
    print_table(&["#", "Tool", "Params"], rows);
}

pub async fn handle_list(ctx: &AppContext, versions: bool, mode: OutputMode) -> Result<()> {
    let summaries = ctx.store.list(versions).await?;

    if mode == OutputMode::Json {
        output_json_list(&summaries);
        return Ok(());
    }

    let mut headers = vec!["Name", "Kind", "Tags", "Actions", "Ver", "Updated"];
    if versions {
        headers.push("Archived");
    }
    let rows: Vec<Vec<String>> = summaries.iter().map(|s| summary_row(s, versions)).collect();
    print_table(&headers, rows);
    Ok(())
}

pub async fn handle_show(
    ctx: &AppContext,
    name: &str,
    revision: Option<u32>,
    mode: OutputMode,
) -> Result<()> {
    match revision {
        None => {
            let template = ctx.store.get(name).await?;
            if mode == OutputMode::Json {
                output_json(&template);
            } else {
                render_template(&template);
            }
        }
        Some(revision) => {
            let Some(archive) = ctx.store.archive() else {
                anyhow::bail!("the version archive is disabled (--no-history)");
            };
            let snapshot = archive.load(name, revision)?;
            if mode == OutputMode::Json {
                output_json(&snapshot);
            } else {
                print_hint(&format!(
                    "Revision {} saved {} ({})",
                    snapshot.revision,
                    snapshot.saved_at.format("%Y-%m-%d %H:%M"),
                    snapshot.reason
                ));
                render_template(&snapshot.template);
            }
        }
    }
    Ok(())
}

pub async fn handle_search(ctx: &AppContext, tags: &[String], mode: OutputMode) -> Result<()> {
    let matches = ctx.store.search(tags).await?;

    if mode == OutputMode::Json {
        output_json_list(&matches);
        return Ok(());
    }

    println!(
        "Search for tags [{}]: {} matches\n",
        tags.join(", "),
        matches.len()
    );

    let rows: Vec<Vec<String>> = matches
        .iter()
        .map(|t| summary_row(&TemplateSummary::from(t), false))
        .collect();
    print_table(&["Name", "Kind", "Tags", "Actions", "Ver", "Updated"], rows);
    Ok(())
}

pub async fn handle_stats(ctx: &AppContext, name: Option<&str>, mode: OutputMode) -> Result<()> {
    let stats = match name {
        Some(name) => {
            // Unknown templates are an error; unused ones show zeroes.
            ctx.store.get(name).await?;
            let record = ctx.store.analytics().get(name).unwrap_or_default();
            BTreeMap::from([(name.to_string(), record)])
        }
        None => ctx.store.analytics().all(),
    };

    if mode == OutputMode::Json {
        output_json(&stats);
        return Ok(());
    }

    let rows: Vec<Vec<String>> = stats
        .iter()
        .map(|(name, r)| {
            vec![
                name.clone(),
                r.uses.to_string(),
                r.successes.to_string(),
                r.failures.to_string(),
                format!("{:.0}%", r.success_rate * 100.0),
                format!("{:.1}", r.total_time),
            ]
        })
        .collect();
    print_table(
        &["Template", "Uses", "OK", "Failed", "Success", "Total s"],
        rows,
    );
    Ok(())
}

pub async fn handle_delete(ctx: &AppContext, name: &str, mode: OutputMode) -> Result<()> {
    let deleted = ctx.store.delete(name).await?;

    if mode == OutputMode::Json {
        output_json(&serde_json::json!({ "name": name, "deleted": deleted }));
        return Ok(());
    }

    if deleted {
        print_success(&format!("Deleted '{}'", name));
        if ctx.store.archive().is_some() {
            print_hint("Archived revisions survive; `show --revision` can still read them.");
        }
    } else {
        print_hint(&format!("Nothing stored under '{}'.", name));
    }
    Ok(())
}
