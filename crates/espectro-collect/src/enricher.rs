//! Enrichment: join collected speeches to each party's spectrum label.
//!
//! Party metadata carries one spectrum label per acronym; the join attaches
//! it to every speech so the trainer sees `(transcript, spectrum)` pairs.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::CollectError;

/// One party row from `Partidos.csv`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartyRow {
    #[serde(rename = "Sigla")]
    pub acronym: String,
    #[serde(rename = "Espectro Político")]
    pub spectrum: String,
}

/// The speech columns the join needs; extra CSV columns are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSpeechRow {
    #[serde(rename = "nome")]
    pub deputy_name: String,
    #[serde(rename = "siglaPartido")]
    pub party_acronym: String,
    #[serde(rename = "transcricao")]
    pub transcript: String,
}

/// One enriched corpus row: speech plus its party's spectrum label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedSpeechRow {
    #[serde(rename = "nome")]
    pub deputy_name: String,
    #[serde(rename = "siglaPartido")]
    pub party_acronym: String,
    #[serde(rename = "transcricao")]
    pub transcript: String,
    #[serde(rename = "Espectro Político")]
    pub spectrum: String,
}

/// Per-spectrum corpus statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpectrumStats {
    pub speeches: usize,
    pub parties: usize,
    pub deputies: usize,
}

/// Joins speeches to party spectrum labels.
pub struct SpectrumEnricher {
    parties: Vec<PartyRow>,
    speeches: Vec<RawSpeechRow>,
}

impl SpectrumEnricher {
    /// Load and clean both CSV inputs.
    ///
    /// Party rows lacking an acronym or spectrum are dropped, and the known
    /// source typo `Extrema- direita` is normalised. Speech rows lacking a
    /// party acronym are dropped.
    pub fn load(parties_path: &Path, speeches_path: &Path) -> Result<Self, CollectError> {
        let mut parties: Vec<PartyRow> = read_csv(parties_path)?;
        for party in &mut parties {
            if party.spectrum == "Extrema- direita" {
                party.spectrum = "Extrema-direita".to_string();
            }
        }
        parties.retain(|p| !p.acronym.trim().is_empty() && !p.spectrum.trim().is_empty());

        let mut speeches: Vec<RawSpeechRow> = read_csv(speeches_path)?;
        speeches.retain(|s| !s.party_acronym.trim().is_empty());

        info!(
            parties = parties.len(),
            speeches = speeches.len(),
            "loaded enrichment inputs"
        );
        Ok(Self { parties, speeches })
    }

    /// Build directly from rows (tests, in-process pipelines).
    pub fn new(parties: Vec<PartyRow>, speeches: Vec<RawSpeechRow>) -> Self {
        Self { parties, speeches }
    }

    /// Inner-join speeches to parties on acronym.
    ///
    /// Speeches whose party has no spectrum label, or whose transcript is
    /// empty, are dropped.
    pub fn enrich(&self) -> Vec<EnrichedSpeechRow> {
        let spectrum_by_acronym: HashMap<&str, &str> = self
            .parties
            .iter()
            .map(|p| (p.acronym.as_str(), p.spectrum.as_str()))
            .collect();

        let enriched: Vec<EnrichedSpeechRow> = self
            .speeches
            .iter()
            .filter(|s| !s.transcript.trim().is_empty())
            .filter_map(|s| {
                spectrum_by_acronym
                    .get(s.party_acronym.as_str())
                    .map(|&spectrum| EnrichedSpeechRow {
                        deputy_name: s.deputy_name.clone(),
                        party_acronym: s.party_acronym.clone(),
                        transcript: s.transcript.clone(),
                        spectrum: spectrum.to_string(),
                    })
            })
            .collect();

        info!(rows = enriched.len(), "enriched speeches");
        enriched
    }

    /// Speeches, distinct parties and distinct deputies per spectrum label.
    pub fn spectrum_statistics(rows: &[EnrichedSpeechRow]) -> BTreeMap<String, SpectrumStats> {
        let mut grouped: BTreeMap<&str, (usize, HashSet<&str>, HashSet<&str>)> = BTreeMap::new();
        for row in rows {
            let entry = grouped.entry(&row.spectrum).or_default();
            entry.0 += 1;
            entry.1.insert(&row.party_acronym);
            entry.2.insert(&row.deputy_name);
        }

        grouped
            .into_iter()
            .map(|(spectrum, (speeches, parties, deputies))| {
                (
                    spectrum.to_string(),
                    SpectrumStats {
                        speeches,
                        parties: parties.len(),
                        deputies: deputies.len(),
                    },
                )
            })
            .collect()
    }

    /// Write enriched rows as the training corpus CSV.
    pub fn save_enriched(rows: &[EnrichedSpeechRow], path: &Path) -> Result<(), CollectError> {
        let mut writer = csv::Writer::from_path(path).map_err(|source| CollectError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        for row in rows {
            writer.serialize(row).map_err(|source| CollectError::Csv {
                path: path.to_path_buf(),
                source,
            })?;
        }
        writer.flush().map_err(|source| CollectError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), rows = rows.len(), "saved enriched corpus");
        Ok(())
    }
}

fn read_csv<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>, CollectError> {
    let mut reader = csv::Reader::from_path(path).map_err(|source| CollectError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    reader
        .deserialize()
        .collect::<Result<Vec<T>, csv::Error>>()
        .map_err(|source| CollectError::Csv {
            path: path.to_path_buf(),
            source,
        })
}
