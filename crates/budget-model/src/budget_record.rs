use serde::{Deserialize, Serialize};
use std::fmt;

/// A geographic/administrative area as listed by the finance site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: u32,
    pub label: String,
}

/// A municipality within a region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Municipality {
    pub id: u32,
    pub label: String,
}

/// Which side of the budget a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Revenue,
    Expense,
}

impl DataType {
    /// Both data types, in the order they are crawled.
    pub const ALL: [DataType; 2] = [DataType::Revenue, DataType::Expense];

    /// Name used by the source site in page URLs and by the record files.
    pub fn slug(self) -> &'static str {
        match self {
            DataType::Revenue => "recette",
            DataType::Expense => "depense",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.slug() == slug)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Full hierarchical budget for one region × municipality × data type.
///
/// This is the unit of persistence: one record is built per fetched page,
/// written once, and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetRecord {
    pub region: Region,
    pub municipality: Municipality,
    /// Page heading, trimmed.
    pub title: String,
    /// Publication date in year-month-day order (e.g., "2015-03-14").
    pub date: String,
    #[serde(rename = "type")]
    pub data_type: DataType,
    pub chapters: Vec<Chapter>,
}

/// Top-level budget heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,
    pub subchapters: Vec<SubChapter>,
}

/// Grouping of articles within a chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubChapter {
    pub title: String,
    pub articles: Vec<Article>,
}

/// A leaf budget line.
///
/// Amounts are kept exactly as the source printed them (thousands
/// separators included).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub predicted: String,
    pub current: String,
    pub done: String,
}

impl Chapter {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subchapters: Vec::new(),
        }
    }
}

impl SubChapter {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            articles: Vec::new(),
        }
    }
}

impl BudgetRecord {
    /// Key under which this record is persisted.
    pub fn key(&self) -> crate::RecordKey {
        crate::RecordKey {
            region_id: self.region.id,
            municipality_id: self.municipality.id,
            data_type: self.data_type,
        }
    }

    /// Total number of articles across all chapters.
    pub fn article_count(&self) -> usize {
        self.chapters
            .iter()
            .flat_map(|c| c.subchapters.iter())
            .map(|s| s.articles.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> BudgetRecord {
        BudgetRecord {
            region: Region { id: 11, label: "Tunis".into() },
            municipality: Municipality { id: 1101, label: "La Marsa".into() },
            title: "Budget des recettes".into(),
            date: "2015-03-14".into(),
            data_type: DataType::Revenue,
            chapters: vec![Chapter {
                title: "Recettes ordinaires".into(),
                subchapters: vec![
                    SubChapter {
                        title: "Impots directs".into(),
                        articles: vec![Article {
                            title: "Taxe sur les immeubles bâtis".into(),
                            predicted: "1 250 000".into(),
                            current: "1 250 000".into(),
                            done: "312 480,500".into(),
                        }],
                    },
                    SubChapter::new("Impots indirects"),
                ],
            }],
        }
    }

    #[test]
    fn test_slug_lookup() {
        assert_eq!(DataType::Revenue.slug(), "recette");
        assert_eq!(DataType::Expense.slug(), "depense");
        assert_eq!(DataType::from_slug("depense"), Some(DataType::Expense));
        assert_eq!(DataType::from_slug("autre"), None);
    }

    #[test]
    fn test_article_count_includes_empty_subchapters() {
        let record = sample_record();
        assert_eq!(record.article_count(), 1);
        assert_eq!(record.chapters[0].subchapters[1].articles.len(), 0);
    }

    #[test]
    fn test_json_field_names() {
        let record = sample_record();
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["type"], "revenue");
        assert_eq!(value["municipality"]["label"], "La Marsa");
        assert_eq!(
            value["chapters"][0]["subchapters"][0]["articles"][0]["done"],
            "312 480,500"
        );

        let parsed: BudgetRecord = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, record);
    }
}
