//! Political orientation target classes and the spectrum→class mapping table.
//!
//! Parties carry one of seven fine-grained spectrum labels; the classifier
//! works on a collapsed 3-class target. The mapping table is configuration
//! data, not code — deployments can swap it without touching this module.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Collapsed 3-class political orientation target.
///
/// Integer codes are stable (`Center = 0`, `Right = 1`, `Left = 2`) and are
/// what the classifier emits; report names are the Portuguese data values
/// used across the corpus and output files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Orientation {
    Center,
    Right,
    Left,
}

impl Orientation {
    pub const ALL: [Orientation; 3] = [Orientation::Center, Orientation::Right, Orientation::Left];

    /// Stable integer code used for training targets and the mapping table.
    pub fn code(self) -> usize {
        match self {
            Orientation::Center => 0,
            Orientation::Right => 1,
            Orientation::Left => 2,
        }
    }

    /// Inverse of [`code`](Self::code). `None` for out-of-range codes.
    pub fn from_code(code: usize) -> Option<Self> {
        match code {
            0 => Some(Orientation::Center),
            1 => Some(Orientation::Right),
            2 => Some(Orientation::Left),
            _ => None,
        }
    }

    /// Name used in reports and prediction files.
    pub fn report_name(self) -> &'static str {
        match self {
            Orientation::Center => "Centro",
            Orientation::Right => "Direita",
            Orientation::Left => "Esquerda",
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.report_name())
    }
}

/// Many-to-one mapping from spectrum labels to orientation classes.
///
/// Labels absent from the table are *unmapped*: the row is dropped from the
/// training set entirely. Defaulting unmapped labels to any class would
/// corrupt the class balance, so `map` returns `Option` and callers filter.
#[derive(Debug, Clone)]
pub struct ClassMap {
    table: HashMap<String, Orientation>,
}

impl ClassMap {
    /// Build from a `label → class code` table (the configuration format).
    ///
    /// Fails if any code is outside `0..=2`.
    pub fn from_codes(codes: &HashMap<String, usize>) -> Result<Self, String> {
        let mut table = HashMap::with_capacity(codes.len());
        for (label, &code) in codes {
            let class = Orientation::from_code(code)
                .ok_or_else(|| format!("class code {code} for label {label:?} is not in 0..=2"))?;
            table.insert(label.clone(), class);
        }
        Ok(Self { table })
    }

    /// Map a spectrum label to its target class, or `None` if unmapped.
    pub fn map(&self, spectrum: &str) -> Option<Orientation> {
        self.table.get(spectrum).copied()
    }

    /// Number of labels in the table.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// The seven-label default table for the Brazilian party spectrum.
    pub fn default_codes() -> HashMap<String, usize> {
        [
            ("Centro", 0),
            ("Centro-direita", 1),
            ("Direita", 1),
            ("Extrema-direita", 1),
            ("Centro-esquerda", 2),
            ("Esquerda", 2),
            ("Extrema-esquerda", 2),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }
}

impl Default for ClassMap {
    fn default() -> Self {
        Self::from_codes(&Self::default_codes()).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for class in Orientation::ALL {
            assert_eq!(Orientation::from_code(class.code()), Some(class));
        }
        assert_eq!(Orientation::from_code(3), None);
    }

    #[test]
    fn default_table_covers_all_seven_labels() {
        let map = ClassMap::default();
        assert_eq!(map.len(), 7);
        assert_eq!(map.map("Centro"), Some(Orientation::Center));
        assert_eq!(map.map("Centro-direita"), Some(Orientation::Right));
        assert_eq!(map.map("Direita"), Some(Orientation::Right));
        assert_eq!(map.map("Extrema-direita"), Some(Orientation::Right));
        assert_eq!(map.map("Centro-esquerda"), Some(Orientation::Left));
        assert_eq!(map.map("Esquerda"), Some(Orientation::Left));
        assert_eq!(map.map("Extrema-esquerda"), Some(Orientation::Left));
    }

    #[test]
    fn unmapped_label_returns_none() {
        let map = ClassMap::default();
        assert_eq!(map.map("Desconhecido"), None);
        assert_eq!(map.map(""), None);
    }

    #[test]
    fn out_of_range_code_rejected() {
        let mut codes = HashMap::new();
        codes.insert("Centro".to_string(), 5usize);
        assert!(ClassMap::from_codes(&codes).is_err());
    }

    #[test]
    fn report_names_are_portuguese() {
        assert_eq!(Orientation::Center.report_name(), "Centro");
        assert_eq!(Orientation::Right.report_name(), "Direita");
        assert_eq!(Orientation::Left.report_name(), "Esquerda");
    }
}
