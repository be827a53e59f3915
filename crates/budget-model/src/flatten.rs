use crate::BudgetRecord;

/// Column names of the combined tabular output, in order.
pub const FLAT_HEADER: [&str; 11] = [
    "Date",
    "RegionId",
    "RegionLabel",
    "MunicipaliteId",
    "MunicipaliteLabel",
    "Chapter",
    "SubChapter",
    "Article",
    "Predicted",
    "Current",
    "Done",
];

/// One article with its full chapter/subchapter/record attribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatRow {
    pub date: String,
    pub region_id: u32,
    pub region_label: String,
    pub municipality_id: u32,
    pub municipality_label: String,
    pub chapter_title: String,
    pub subchapter_title: String,
    pub article_title: String,
    pub predicted: String,
    pub current: String,
    pub done: String,
}

impl FlatRow {
    /// Field values in `FLAT_HEADER` order.
    pub fn fields(&self) -> [String; 11] {
        [
            self.date.clone(),
            self.region_id.to_string(),
            self.region_label.clone(),
            self.municipality_id.to_string(),
            self.municipality_label.clone(),
            self.chapter_title.clone(),
            self.subchapter_title.clone(),
            self.article_title.clone(),
            self.predicted.clone(),
            self.current.clone(),
            self.done.clone(),
        ]
    }
}

/// Flatten records into one row per article.
///
/// Records are visited in input order and each level in stored order.
/// Nothing is sorted, merged, or dropped.
pub fn flatten(records: &[BudgetRecord]) -> Vec<FlatRow> {
    let mut rows = Vec::new();

    for record in records {
        for chapter in &record.chapters {
            for subchapter in &chapter.subchapters {
                for article in &subchapter.articles {
                    rows.push(FlatRow {
                        date: record.date.clone(),
                        region_id: record.region.id,
                        region_label: record.region.label.clone(),
                        municipality_id: record.municipality.id,
                        municipality_label: record.municipality.label.clone(),
                        chapter_title: chapter.title.clone(),
                        subchapter_title: subchapter.title.clone(),
                        article_title: article.title.clone(),
                        predicted: article.predicted.clone(),
                        current: article.current.clone(),
                        done: article.done.clone(),
                    });
                }
            }
        }
    }

    rows
}
