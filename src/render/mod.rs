//! Tolerant record renderer.
//!
//! Maps one [`PaperRecord`] to an ordered sequence of [`DisplayBlock`]s. The
//! corpus was produced by several extraction passes whose schemas drifted, so
//! every handler accepts any JSON shape. `render` is total: it never fails and
//! always returns at least the title heading. Content no handler understands
//! is kept as a [`DisplayBlock::RawDump`].
//!
//! ## Dispatch
//!
//! Known section names are matched first; their handlers expect an object
//! (except `benchmark_dataset`, which expects a nullable scalar). Any other
//! section holding an object with an `answer` key uses the answer/evidence
//! layout. Everything else, including a known name with an unexpected shape,
//! falls through to the raw dump.

pub mod blocks;
pub mod markdown;
mod sections;

pub use blocks::{Detail, DisplayBlock, ListItem};
pub use markdown::to_markdown;

use crate::record::{PaperRecord, UNTITLED};
use serde_json::Value;
use tracing::trace;

/// Section names with a dedicated handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectionKind {
    Method,
    MethodType,
    SubjectArea,
    PerformanceSummary,
    Limitations,
    FutureDirections,
    ResourceLink,
    BenchmarkDataset,
    Other,
}

impl SectionKind {
    fn from_name(name: &str) -> Self {
        match name {
            "method" => Self::Method,
            "method_type" => Self::MethodType,
            "subject_area" => Self::SubjectArea,
            "performance_summary" => Self::PerformanceSummary,
            "limitations" => Self::Limitations,
            "future_directions" => Self::FutureDirections,
            "resource_link" => Self::ResourceLink,
            "benchmark_dataset" => Self::BenchmarkDataset,
            _ => Self::Other,
        }
    }

    /// Sub-keys a named handler reads; at least one must be present for it to run.
    fn keys(self) -> &'static [&'static str] {
        match self {
            Self::Method => &["steps", "tools", "benchmark_datasets", "evaluation_metrics"],
            Self::MethodType => &["methods"],
            Self::SubjectArea => &["areas"],
            Self::PerformanceSummary => &[
                "performance_summary",
                "baselines",
                "benchmark_datasets",
                "evaluation_metrics",
            ],
            Self::Limitations => &["limitations"],
            Self::FutureDirections => &["future_directions"],
            Self::ResourceLink | Self::BenchmarkDataset | Self::Other => &[],
        }
    }

    fn render_object(self, content: &Value) -> Option<Vec<DisplayBlock>> {
        match self {
            Self::Method => Some(sections::method(content)),
            Self::MethodType => Some(sections::named_list(content, "methods", "Method Types")),
            Self::SubjectArea => Some(sections::named_list(content, "areas", "Subject Areas")),
            Self::PerformanceSummary => Some(sections::performance_summary(content)),
            Self::Limitations => Some(sections::limitations(content)),
            Self::FutureDirections => Some(sections::future_directions(content)),
            Self::ResourceLink | Self::BenchmarkDataset | Self::Other => None,
        }
    }
}

/// Render a whole record: header block, then one group per section in document order.
pub fn render(record: &PaperRecord) -> Vec<DisplayBlock> {
    let mut blocks = header(record);
    for (name, content) in record.body_sections() {
        blocks.push(DisplayBlock::heading(2, section_title(name)));
        blocks.extend(render_section(name, content));
    }
    blocks
}

/// Render a record whose title falls back to `id` instead of the generic placeholder.
pub fn render_with_id(record: &PaperRecord, id: &str) -> Vec<DisplayBlock> {
    let mut blocks = render(record);
    if record.title().is_none() {
        if let Some(DisplayBlock::Heading { text, .. }) = blocks.first_mut() {
            *text = id.trim_end_matches(".json").to_string();
        }
    }
    blocks
}

/// Render the body of one section, without its heading.
pub fn render_section(name: &str, content: &Value) -> Vec<DisplayBlock> {
    let kind = SectionKind::from_name(name);
    let rendered = match (kind, content) {
        (SectionKind::ResourceLink, Value::Object(_)) => Some(sections::resource_link(content)),
        (SectionKind::BenchmarkDataset, Value::Null) => {
            Some(vec![DisplayBlock::warning(sections::NO_BENCHMARK_DATASET)])
        }
        (
            SectionKind::BenchmarkDataset,
            Value::String(_) | Value::Number(_) | Value::Bool(_),
        ) => Some(vec![DisplayBlock::paragraph(crate::record::text(content))]),
        (kind, Value::Object(map)) if kind.keys().iter().any(|k| map.contains_key(*k)) => {
            kind.render_object(content)
        }
        // Known names without their sub-keys still show an answer/evidence pair.
        (_, Value::Object(map)) if map.contains_key("answer") => {
            Some(sections::answer_evidence(content))
        }
        _ => None,
    };

    // A handler that found nothing to show must not swallow the section.
    rendered.filter(|blocks| !blocks.is_empty()).unwrap_or_else(|| {
        trace!(section = name, "No handler for section shape, dumping raw");
        vec![DisplayBlock::RawDump {
            value: content.clone(),
        }]
    })
}

/// Title heading plus the non-empty metadata fields.
fn header(record: &PaperRecord) -> Vec<DisplayBlock> {
    let mut blocks = vec![DisplayBlock::heading(
        1,
        record.title().unwrap_or_else(|| UNTITLED.to_string()),
    )];
    if let Some(authors) = record.authors() {
        blocks.push(DisplayBlock::key_value("Authors", authors));
    }
    if let Some(published) = record.published() {
        blocks.push(DisplayBlock::key_value("Published", published));
    }
    if let Some(link) = record.link() {
        blocks.push(DisplayBlock::Link {
            text: "Paper Link".to_string(),
            href: link,
        });
    }
    blocks
}

/// `performance_summary` -> `Performance Summary`
pub fn section_title(name: &str) -> String {
    name.split(|c: char| c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
