//! Rule-tuning aid: show what the heuristics recover from one text file

use std::fmt;
use std::path::Path;

use anyhow::Context;

use seolhwa_core::{DocumentId, Section};
use seolhwa_extractor::{StoryConverter, SubcategoryClassifier, TextAnalysis};

/// Human-readable report for `path`
pub fn inspect_file(converter: &StoryConverter, path: &Path) -> anyhow::Result<String> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let id = DocumentId::parse_or_unknown(&file_name);
    let analysis = converter.analyze(&text);
    let subcategory = converter
        .classifier()
        .classify(analysis.sections.text(Section::Content), id.category);

    let mut report = String::new();
    write_report(&mut report, &id, &subcategory, &analysis)
        .context("Failed to format inspection report")?;
    Ok(report)
}

fn write_report(
    out: &mut impl fmt::Write,
    id: &DocumentId,
    subcategory: &str,
    analysis: &TextAnalysis,
) -> fmt::Result {
    writeln!(out, "Identity:    {} ({})", id.source_id(), id.title)?;
    writeln!(out, "Category:    {} / {}", id.category.name_ko(), subcategory)?;
    writeln!(out, "Confidence:  {:.2}", analysis.confidence)?;

    writeln!(out, "\nSections:")?;
    for section in Section::ALL {
        if !analysis.sections.is_present(section) {
            continue;
        }
        let body = match section {
            Section::Keywords => analysis.sections.keywords().join(", "),
            _ => preview(analysis.sections.text(section)),
        };
        writeln!(out, "  {:<9} {}", section.as_str(), body)?;
    }

    writeln!(out, "\nCharacters:  {}", join(&analysis.characters))?;
    writeln!(out, "Locations:   {}", join(&analysis.locations))?;

    match &analysis.narrator {
        Some(narrator) => writeln!(
            out,
            "Narrator:    name={} gender={} age={} location={}",
            narrator.name.as_deref().unwrap_or("-"),
            narrator.gender.map(|g| g.as_str()).unwrap_or("-"),
            narrator.age.map(|a| a.to_string()).unwrap_or_else(|| "-".to_string()),
            narrator.location.as_deref().unwrap_or("-"),
        ),
        None => writeln!(out, "Narrator:    -"),
    }
}

fn preview(text: &str) -> String {
    const MAX_CHARS: usize = 60;
    let flat = text.replace('\n', " ");
    if flat.chars().count() > MAX_CHARS {
        format!("{}...", flat.chars().take(MAX_CHARS).collect::<String>())
    } else {
        flat
    }
}

fn join<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    let items: Vec<&str> = items.into_iter().map(String::as_str).collect();
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}
