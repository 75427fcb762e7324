//! Markdown output for display blocks.

use super::blocks::{DisplayBlock, ListItem};
use std::fmt::Write;

/// Render blocks as a Markdown document, one block per paragraph.
pub fn to_markdown(blocks: &[DisplayBlock]) -> String {
    let mut out = String::new();
    for block in blocks {
        if !out.is_empty() {
            out.push('\n');
        }
        write_block(&mut out, block);
    }
    out
}

fn write_block(out: &mut String, block: &DisplayBlock) {
    // Writing into a String cannot fail.
    let _ = match block {
        DisplayBlock::Heading { level, text } => {
            let level = (*level).clamp(1, 6) as usize;
            writeln!(out, "{} {}", "#".repeat(level), text)
        }
        DisplayBlock::Paragraph { text } => writeln!(out, "{}", text),
        DisplayBlock::BulletList { items } => {
            for item in items {
                write_item(out, "-", item);
            }
            Ok(())
        }
        DisplayBlock::NumberedList { items } => {
            for (idx, item) in items.iter().enumerate() {
                write_item(out, &format!("{}.", idx + 1), item);
            }
            Ok(())
        }
        DisplayBlock::KeyValue { key, value } => writeln!(out, "**{}**: {}", key, value),
        DisplayBlock::Link { text, href } => writeln!(out, "[{}]({})", text, href),
        DisplayBlock::Warning { text } => writeln!(out, "> **Warning:** {}", text),
        DisplayBlock::RawDump { value } => {
            let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
            writeln!(
                out,
                "Unrecognized format. Raw content below:\n\n```json\n{}\n```",
                pretty
            )
        }
    };
}

fn write_item(out: &mut String, marker: &str, item: &ListItem) {
    let line = match (item.title.is_empty(), item.body.is_empty()) {
        (true, _) => item.body.clone(),
        (false, true) => format!("**{}**", item.title),
        (false, false) => format!("**{}**: {}", item.title, item.body),
    };
    let _ = writeln!(out, "{} {}", marker, line);

    let indent = " ".repeat(marker.len() + 1);
    for detail in &item.details {
        let _ = writeln!(out, "{}- {}: {}", indent, detail.label, detail.value);
    }
}
