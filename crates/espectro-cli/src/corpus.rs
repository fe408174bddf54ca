//! Input readers: labeled speech corpus CSV and per-portal text files.

use std::path::Path;

use anyhow::Context;

use espectro_core::Speech;

/// Read the enriched training corpus (columns `transcricao` and
/// `Espectro Político`; extra columns are ignored).
pub fn read_speeches(path: &Path) -> anyhow::Result<Vec<Speech>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening corpus {}", path.display()))?;
    let speeches = reader
        .deserialize()
        .collect::<Result<Vec<Speech>, csv::Error>>()
        .with_context(|| format!("parsing corpus {}", path.display()))?;
    Ok(speeches)
}

/// Read one portal's scraped texts: one document per line, trimmed.
///
/// Blank lines are kept — they fail prediction downstream and show up as
/// empty rows in the predictions file, preserving line correspondence with
/// the input.
pub fn read_portal_texts(path: &Path) -> anyhow::Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading portal texts {}", path.display()))?;
    Ok(raw.lines().map(|line| line.trim().to_string()).collect())
}
