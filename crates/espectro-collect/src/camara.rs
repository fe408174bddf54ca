//! HTTP client for the Câmara dos Deputados open-data API.
//!
//! Collects every deputy's plenary speeches between two dates. One deputy's
//! failure is logged and skipped so a long collection run survives transient
//! API errors.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::CollectError;

const ITEMS_PER_PAGE: usize = 100;

/// Envelope every API response wraps its payload in.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    dados: Vec<T>,
}

/// A deputy as returned by `/deputados`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deputy {
    pub id: u64,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "siglaPartido")]
    pub party_acronym: String,
    #[serde(rename = "siglaUf")]
    pub state: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// One speech as returned by `/deputados/{id}/discursos`.
#[derive(Debug, Clone, Deserialize)]
struct SpeechItem {
    #[serde(rename = "dataHoraInicio")]
    started_at: Option<String>,
    #[serde(rename = "tipoDiscurso")]
    speech_type: Option<String>,
    #[serde(rename = "sumario")]
    summary: Option<String>,
    #[serde(rename = "transcricao")]
    transcript: Option<String>,
}

/// Flattened deputy × speech row written to the corpus CSV.
///
/// Column names keep the API's field names so the enrichment join and the
/// training loader read them unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechRow {
    pub id: u64,
    #[serde(rename = "nome")]
    pub deputy_name: String,
    #[serde(rename = "siglaPartido")]
    pub party_acronym: String,
    #[serde(rename = "siglaUf")]
    pub state: String,
    #[serde(rename = "dataHoraInicio")]
    pub started_at: Option<String>,
    #[serde(rename = "tipoDiscurso")]
    pub speech_type: Option<String>,
    #[serde(rename = "sumario")]
    pub summary: Option<String>,
    #[serde(rename = "transcricao")]
    pub transcript: String,
}

/// Client for the Câmara dos Deputados speech endpoints.
pub struct DiscursosCollector {
    client: reqwest::Client,
    base_url: String,
}

impl DiscursosCollector {
    /// `base_url` like `https://dadosabertos.camara.leg.br/api/v2` (no
    /// trailing slash).
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// All current deputies, ordered by name.
    pub async fn deputies(&self) -> Result<Vec<Deputy>, CollectError> {
        let url = format!("{}/deputados?ordem=ASC&ordenarPor=nome", self.base_url);
        info!(url = %url, "fetching deputies");

        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CollectError::Server {
                status: status.as_u16(),
                url,
            });
        }

        let body: ApiResponse<Deputy> = resp.json().await?;
        info!(count = body.dados.len(), "fetched deputies");
        Ok(body.dados)
    }

    /// One deputy's speeches between two dates, following pagination until a
    /// short page.
    async fn deputy_speeches(
        &self,
        deputy_id: u64,
        start: &str,
        end: &str,
    ) -> Result<Vec<SpeechItem>, CollectError> {
        let mut speeches = Vec::new();
        let mut page = 1usize;

        loop {
            let url = format!("{}/deputados/{deputy_id}/discursos", self.base_url);
            let page_number = page.to_string();
            let page_size = ITEMS_PER_PAGE.to_string();
            let resp = self
                .client
                .get(&url)
                .query(&[
                    ("dataInicio", start),
                    ("dataFim", end),
                    ("ordenarPor", "dataHoraInicio"),
                    ("ordem", "DESC"),
                    ("pagina", page_number.as_str()),
                    ("itens", page_size.as_str()),
                ])
                .send()
                .await?;

            let status = resp.status();
            if !status.is_success() {
                return Err(CollectError::Server {
                    status: status.as_u16(),
                    url,
                });
            }

            let body: ApiResponse<SpeechItem> = resp.json().await?;
            let page_len = body.dados.len();
            speeches.extend(body.dados);

            if page_len < ITEMS_PER_PAGE {
                break;
            }
            page += 1;
        }

        Ok(speeches)
    }

    /// Collect every deputy's speeches in `[start, end]` into corpus rows.
    ///
    /// Dates must be `YYYY-MM-DD`. A deputy whose speech fetch fails is
    /// logged and skipped; speeches without a transcript are dropped.
    pub async fn collect(&self, start: &str, end: &str) -> Result<Vec<SpeechRow>, CollectError> {
        validate_date(start)?;
        validate_date(end)?;

        let deputies = self.deputies().await?;
        info!(deputies = deputies.len(), start, end, "collecting speeches");

        let mut rows = Vec::new();
        for deputy in &deputies {
            match self.deputy_speeches(deputy.id, start, end).await {
                Ok(speeches) => {
                    info!(
                        deputy = %deputy.name,
                        count = speeches.len(),
                        "collected speeches"
                    );
                    rows.extend(flatten_speeches(deputy, speeches));
                }
                Err(cause) => {
                    warn!(deputy = %deputy.name, %cause, "skipping deputy");
                }
            }
        }

        Ok(rows)
    }

    /// Write collected rows as CSV.
    pub fn save_rows(rows: &[SpeechRow], path: &std::path::Path) -> Result<(), CollectError> {
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
        info!(path = %path.display(), rows = rows.len(), "saved speech corpus");
        Ok(())
    }
}

/// Merge one deputy with their speech items, dropping transcript-less rows.
fn flatten_speeches(deputy: &Deputy, speeches: Vec<SpeechItem>) -> Vec<SpeechRow> {
    speeches
        .into_iter()
        .filter_map(|item| {
            let transcript = item.transcript.filter(|t| !t.trim().is_empty())?;
            Some(SpeechRow {
                id: deputy.id,
                deputy_name: deputy.name.clone(),
                party_acronym: deputy.party_acronym.clone(),
                state: deputy.state.clone(),
                started_at: item.started_at,
                speech_type: item.speech_type,
                summary: item.summary,
                transcript,
            })
        })
        .collect()
}

fn validate_date(value: &str) -> Result<(), CollectError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| CollectError::InvalidDate {
        value: value.to_string(),
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deputy_json_parses_api_field_names() {
        let json = r#"{
            "id": 204554,
            "nome": "Fulano de Tal",
            "siglaPartido": "PT",
            "siglaUf": "SP",
            "email": "dep.fulano@camara.leg.br",
            "urlFoto": "https://example.org/foto.jpg"
        }"#;
        let deputy: Deputy = serde_json::from_str(json).unwrap();
        assert_eq!(deputy.id, 204554);
        assert_eq!(deputy.party_acronym, "PT");
        assert_eq!(deputy.state, "SP");
    }

    #[test]
    fn response_envelope_unwraps_dados() {
        let json = r#"{"dados": [
            {"id": 1, "nome": "A", "siglaPartido": "PL", "siglaUf": "RJ"}
        ], "links": []}"#;
        let body: ApiResponse<Deputy> = serde_json::from_str(json).unwrap();
        assert_eq!(body.dados.len(), 1);
        assert!(body.dados[0].email.is_none());
    }

    #[test]
    fn flatten_drops_speeches_without_transcript() {
        let deputy = Deputy {
            id: 7,
            name: "Beltrana".into(),
            party_acronym: "MDB".into(),
            state: "MG".into(),
            email: None,
        };
        let speeches = vec![
            SpeechItem {
                started_at: Some("2023-03-01T10:00".into()),
                speech_type: Some("Breves Comunicações".into()),
                summary: None,
                transcript: Some("Sr. Presidente, ...".into()),
            },
            SpeechItem {
                started_at: None,
                speech_type: None,
                summary: None,
                transcript: None,
            },
            SpeechItem {
                started_at: None,
                speech_type: None,
                summary: None,
                transcript: Some("   ".into()),
            },
        ];

        let rows = flatten_speeches(&deputy, speeches);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].party_acronym, "MDB");
        assert_eq!(rows[0].transcript, "Sr. Presidente, ...");
    }

    #[test]
    fn date_validation() {
        assert!(validate_date("2023-01-01").is_ok());
        assert!(matches!(
            validate_date("01/01/2023"),
            Err(CollectError::InvalidDate { .. })
        ));
        assert!(validate_date("2023-13-40").is_err());
    }

    #[test]
    fn collector_trims_trailing_slash() {
        let collector = DiscursosCollector::new("https://dadosabertos.camara.leg.br/api/v2/".into());
        assert_eq!(collector.base_url, "https://dadosabertos.camara.leg.br/api/v2");
    }

    #[test]
    fn speech_rows_round_trip_csv() {
        let rows = vec![SpeechRow {
            id: 1,
            deputy_name: "Fulana".into(),
            party_acronym: "NOVO".into(),
            state: "SC".into(),
            started_at: Some("2023-05-02T14:00".into()),
            speech_type: None,
            summary: Some("sumário".into()),
            transcript: "transcrição completa".into(),
        }];

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Discursos.csv");
        DiscursosCollector::save_rows(&rows, &path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let parsed: Vec<SpeechRow> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].party_acronym, "NOVO");
        assert_eq!(parsed[0].transcript, "transcrição completa");
    }
}
