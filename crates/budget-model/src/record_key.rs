use crate::DataType;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("record file name must look like '<region>-<municipality>-<type>.json', got '{0}'")]
    Shape(String),

    #[error("unknown data type '{0}'")]
    UnknownType(String),
}

/// Identifies one persisted record: region × municipality × data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    pub region_id: u32,
    pub municipality_id: u32,
    pub data_type: DataType,
}

impl RecordKey {
    /// File name the record is stored under (e.g., `11-1101-recette.json`).
    pub fn file_name(&self) -> String {
        format!("{self}.json")
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}",
            self.region_id,
            self.municipality_id,
            self.data_type.slug()
        )
    }
}

impl FromStr for RecordKey {
    type Err = KeyError;

    /// Parse either a bare key (`11-1101-recette`) or a file name
    /// (`11-1101-recette.json`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stem = s.strip_suffix(".json").unwrap_or(s);
        let parts: Vec<&str> = stem.split('-').collect();
        let [region, municipality, slug] = parts.as_slice() else {
            return Err(KeyError::Shape(s.to_string()));
        };

        let region_id = region.parse().map_err(|_| KeyError::Shape(s.to_string()))?;
        let municipality_id = municipality
            .parse()
            .map_err(|_| KeyError::Shape(s.to_string()))?;
        let data_type =
            DataType::from_slug(slug).ok_or_else(|| KeyError::UnknownType(slug.to_string()))?;

        Ok(Self {
            region_id,
            municipality_id,
            data_type,
        })
    }
}
