//! Corpus row types shared between the collector, trainer and inferencer.

use serde::{Deserialize, Serialize};

/// One labeled training example: a legislative speech transcript joined with
/// its party's spectrum label.
///
/// Serde renames keep the original CSV column names produced by the
/// enrichment step (`transcricao`, `Espectro Político`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Speech {
    #[serde(rename = "transcricao")]
    pub transcript: String,
    #[serde(rename = "Espectro Político")]
    pub spectrum: String,
}

/// One row of the predictions output file.
///
/// `prediction` is empty for texts whose inference failed; the row is still
/// written so output rows stay positionally aligned with input texts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRow {
    pub text: String,
    pub prediction: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speech_deserializes_original_column_names() {
        let json = r#"{"transcricao": "Sr. Presidente, ...", "Espectro Político": "Centro"}"#;
        let speech: Speech = serde_json::from_str(json).unwrap();
        assert_eq!(speech.transcript, "Sr. Presidente, ...");
        assert_eq!(speech.spectrum, "Centro");
    }

    #[test]
    fn prediction_row_none_serializes_null() {
        let row = PredictionRow {
            text: "texto".into(),
            prediction: None,
        };
        let json = serde_json::to_string(&row).unwrap();
        assert!(json.contains("null"));
    }
}
