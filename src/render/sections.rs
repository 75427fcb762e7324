//! Per-section handlers.
//!
//! Sub-fields are always printed, defaulting to an empty string, so a list
//! item has the same shape whichever fields its source object happened to carry.

use super::blocks::{DisplayBlock, ListItem};
use crate::record::{as_items, field, text};
use serde_json::Value;

pub(super) const NO_BENCHMARK_DATASET: &str = "No benchmark dataset was used.";
const NO_EVIDENCE: &str = "No evidence provided.";
const UNNAMED: &str = "Unnamed";

/// `{answer, evidence}` sections.
pub(super) fn answer_evidence(content: &Value) -> Vec<DisplayBlock> {
    let mut blocks = vec![DisplayBlock::heading(4, "Answer")];
    blocks.push(match field(content, "answer") {
        Value::Array(items) => DisplayBlock::NumberedList {
            items: items.iter().map(|a| ListItem::plain(inline(a))).collect(),
        },
        other => DisplayBlock::paragraph(text(other)),
    });

    blocks.push(DisplayBlock::heading(4, "Evidence"));
    blocks.push(match field(content, "evidence") {
        Value::Array(items) => DisplayBlock::BulletList {
            items: items.iter().map(|e| ListItem::plain(inline(e))).collect(),
        },
        other => DisplayBlock::paragraph(text(other)),
    });
    blocks
}

/// `method`: steps, then the optional tool/dataset/metric groups.
pub(super) fn method(content: &Value) -> Vec<DisplayBlock> {
    let mut blocks = vec![
        DisplayBlock::heading(3, "Steps"),
        DisplayBlock::BulletList {
            items: as_items(field(content, "steps"))
                .into_iter()
                .map(step_item)
                .collect(),
        },
    ];
    push_group(&mut blocks, "Tools", field(content, "tools"), tool_item);
    push_group(
        &mut blocks,
        "Benchmark Datasets",
        field(content, "benchmark_datasets"),
        dataset_item,
    );
    push_group(
        &mut blocks,
        "Evaluation Metrics",
        field(content, "evaluation_metrics"),
        metric_item,
    );
    blocks
}

/// `method_type` / `subject_area`: a heading over the `name: description` list under `key`.
pub(super) fn named_list(content: &Value, key: &str, heading: &str) -> Vec<DisplayBlock> {
    vec![
        DisplayBlock::heading(3, heading),
        DisplayBlock::BulletList {
            items: as_items(field(content, key))
                .into_iter()
                .map(named_item)
                .collect(),
        },
    ]
}

/// `performance_summary`: up to four optional groups.
pub(super) fn performance_summary(content: &Value) -> Vec<DisplayBlock> {
    let mut blocks = Vec::new();
    push_group(
        &mut blocks,
        "Performance Summary",
        field(content, "performance_summary"),
        summary_item,
    );
    push_group(&mut blocks, "Baselines", field(content, "baselines"), named_item);
    push_group(
        &mut blocks,
        "Benchmark Datasets",
        field(content, "benchmark_datasets"),
        dataset_item,
    );
    push_group(
        &mut blocks,
        "Evaluation Metrics",
        field(content, "evaluation_metrics"),
        metric_item,
    );
    blocks
}

/// `limitations`: items keyed either `label`/`explanation` or `name`/`description`.
pub(super) fn limitations(content: &Value) -> Vec<DisplayBlock> {
    let items = as_items(field(content, "limitations"))
        .into_iter()
        .map(|item| match item {
            Value::Object(_) => ListItem::titled(
                first_present(item, &["label", "name"]).unwrap_or_else(|| UNNAMED.to_string()),
                first_present(item, &["explanation", "description"]).unwrap_or_default(),
            )
            .with_detail("Evidence", inline(field(item, "evidence"))),
            other => ListItem::plain(text(other)),
        })
        .collect();
    vec![DisplayBlock::BulletList { items }]
}

/// `future_directions`: one numbered entry per direction.
pub(super) fn future_directions(content: &Value) -> Vec<DisplayBlock> {
    let items = as_items(field(content, "future_directions"))
        .into_iter()
        .map(|item| {
            ListItem::titled(name_or_self(item, "name"), text(field(item, "description")))
                .with_detail("Evidence", inline(field(item, "evidence")))
        })
        .collect();
    vec![DisplayBlock::NumberedList { items }]
}

/// `resource_link`: each answer item is both link text and target.
pub(super) fn resource_link(content: &Value) -> Vec<DisplayBlock> {
    let mut blocks = vec![DisplayBlock::heading(3, "Resource Link")];

    for href in as_items(field(content, "answer")).into_iter().map(text) {
        if !href.trim().is_empty() {
            blocks.push(DisplayBlock::Link {
                text: href.clone(),
                href,
            });
        }
    }

    let evidence = match field(content, "evidence") {
        Value::Null => NO_EVIDENCE.to_string(),
        other => inline(other),
    };
    blocks.push(DisplayBlock::key_value("Evidence", evidence));
    blocks
}

/// Heading plus bullet list, only when `value` holds at least one item.
fn push_group(
    blocks: &mut Vec<DisplayBlock>,
    heading: &str,
    value: &Value,
    item: fn(&Value) -> ListItem,
) {
    let items = as_items(value);
    if items.is_empty() {
        return;
    }
    blocks.push(DisplayBlock::heading(3, heading));
    blocks.push(DisplayBlock::BulletList {
        items: items.into_iter().map(item).collect(),
    });
}

fn step_item(step: &Value) -> ListItem {
    ListItem::titled(name_or_self(step, "step"), "")
        .with_detail("Input", inline(field(step, "input")))
        .with_detail("Output", inline(field(step, "output")))
        .with_detail("Evidence", inline(field(step, "evidence")))
}

fn tool_item(tool: &Value) -> ListItem {
    match tool {
        Value::Object(_) => named_item(tool),
        other => ListItem::plain(text(other)),
    }
}

fn named_item(item: &Value) -> ListItem {
    match item {
        Value::Object(_) => {
            ListItem::titled(text(field(item, "name")), text(field(item, "description")))
                .with_detail("Evidence", inline(field(item, "evidence")))
        }
        other => ListItem::plain(text(other)),
    }
}

fn dataset_item(dataset: &Value) -> ListItem {
    match dataset {
        Value::Object(_) => ListItem::titled(text(field(dataset, "name")), "")
            .with_detail("Description", inline(field(dataset, "data_description")))
            .with_detail("Usage", inline(field(dataset, "usage")))
            .with_detail("Evidence", inline(field(dataset, "evidence"))),
        other => ListItem::plain(text(other)),
    }
}

fn metric_item(metric: &Value) -> ListItem {
    match metric {
        Value::Object(_) => {
            ListItem::titled(text(field(metric, "name")), text(field(metric, "description")))
                .with_detail("Purpose", inline(field(metric, "purpose")))
                .with_detail("Application", inline(field(metric, "application")))
                .with_detail("Evidence", inline(field(metric, "evidence")))
        }
        other => ListItem::plain(text(other)),
    }
}

fn summary_item(entry: &Value) -> ListItem {
    match entry {
        Value::Object(_) => ListItem::plain(text(field(entry, "summary")))
            .with_detail("Evidence", inline(field(entry, "evidence"))),
        other => ListItem::plain(text(other)),
    }
}

/// Objects use `key`; bare values name themselves.
fn name_or_self(item: &Value, key: &str) -> String {
    match item {
        Value::Object(_) => text(field(item, key)),
        other => text(other),
    }
}

/// First of `keys` holding a non-empty value.
fn first_present(item: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .map(|key| inline(field(item, key)))
        .find(|value| !value.trim().is_empty())
}

/// Single-line text; sequences of quotes are joined with `; `.
fn inline(value: &Value) -> String {
    match value {
        Value::Array(items) => items.iter().map(text).collect::<Vec<_>>().join("; "),
        other => text(other),
    }
}
