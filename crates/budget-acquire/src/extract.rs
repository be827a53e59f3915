use crate::error::{AcquireError, Result};
use budget_model::{Article, BudgetRecord, Chapter, DataType, Municipality, Region, SubChapter};
use scraper::{ElementRef, Html, Node, Selector};

const CHAPTER_COLOR: &str = "#d9edf7";
const SUBCHAPTER_COLOR: &str = "#00a300";
const ARTICLE_COLOR: &str = "#fafafa";

/// Width of the `DD-MM-YYYY` date at the end of the header block.
const DATE_WIDTH: usize = 10;

/// What a budget table row represents, decided by its `bgcolor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    ChapterMarker,
    SubChapterMarker,
    ArticleRow,
    Ignored,
}

/// Classify a row from its `bgcolor` attribute (empty when absent).
pub fn classify_row(bgcolor: &str) -> RowKind {
    let color = bgcolor.trim().to_ascii_lowercase();
    match color.as_str() {
        CHAPTER_COLOR => RowKind::ChapterMarker,
        SUBCHAPTER_COLOR => RowKind::SubChapterMarker,
        "" | ARTICLE_COLOR => RowKind::ArticleRow,
        _ => RowKind::Ignored,
    }
}

/// Parse a repaired budget page into a `BudgetRecord`.
///
/// The page layout is fixed by the source site: the title is the `<h2>`
/// directly under `<body>`, the date ends the second `<div>` under `<body>`,
/// and the budget lines are rows of the first `<table>` under `<body>`.
/// Any structural error discards the whole record.
pub fn extract(
    html: &str,
    region: &Region,
    municipality: &Municipality,
    data_type: DataType,
) -> Result<BudgetRecord> {
    let document = Html::parse_document(html);
    let body_sel = Selector::parse("body").expect("valid selector");
    let body = document
        .select(&body_sel)
        .next()
        .ok_or_else(|| AcquireError::MalformedDocument("no <body>".into()))?;

    let title = first_child(body, "h2")
        .map(text_of)
        .ok_or_else(|| AcquireError::MalformedDocument("no title heading".into()))?;

    let date_block = child_elements(*body)
        .filter(|e| e.value().name() == "div")
        .nth(1)
        .ok_or_else(|| AcquireError::MalformedDocument("no date header block".into()))?;
    let date = normalize_date(&text_of(date_block));
    if chrono::NaiveDate::parse_from_str(&date, "%Y-%m-%d").is_err() {
        tracing::warn!(date = %date, "Header date is not a calendar date, keeping it verbatim");
    }

    let table = first_child(body, "table")
        .ok_or_else(|| AcquireError::MalformedDocument("no budget table".into()))?;

    let chapters = extract_chapters(table)?;

    let record = BudgetRecord {
        region: region.clone(),
        municipality: municipality.clone(),
        title,
        date,
        data_type,
        chapters,
    };
    tracing::debug!(
        chapters = record.chapters.len(),
        articles = record.article_count(),
        "Extracted budget table"
    );

    Ok(record)
}

/// Take the last ten characters of the header text and flip the
/// day-first date into year-first order (`14-03-2015` → `2015-03-14`).
pub fn normalize_date(header: &str) -> String {
    let chars: Vec<char> = header.trim().chars().collect();
    let start = chars.len().saturating_sub(DATE_WIDTH);
    let tail: String = chars[start..].iter().collect();

    tail.split('-').rev().collect::<Vec<_>>().join("-")
}

/// Position of the traversal within the chapter/subchapter hierarchy.
///
/// The open chapter and subchapter are owned by the cursor until the next
/// marker (or the end of the table) closes them.
enum Cursor {
    NoChapter,
    InChapter(Chapter),
    InSubChapter(Chapter, SubChapter),
}

struct Outline {
    chapters: Vec<Chapter>,
    cursor: Cursor,
}

impl Outline {
    fn new() -> Self {
        Self {
            chapters: Vec::new(),
            cursor: Cursor::NoChapter,
        }
    }

    fn has_chapter(&self) -> bool {
        !matches!(self.cursor, Cursor::NoChapter)
    }

    fn open_chapter(&mut self, title: String) {
        self.close_chapter();
        self.cursor = Cursor::InChapter(Chapter::new(title));
    }

    /// Returns false when no chapter is open and the subchapter was dropped.
    fn open_subchapter(&mut self, title: String) -> bool {
        self.cursor = match std::mem::replace(&mut self.cursor, Cursor::NoChapter) {
            Cursor::NoChapter => return false,
            Cursor::InChapter(chapter) => Cursor::InSubChapter(chapter, SubChapter::new(title)),
            Cursor::InSubChapter(mut chapter, previous) => {
                chapter.subchapters.push(previous);
                Cursor::InSubChapter(chapter, SubChapter::new(title))
            }
        };
        true
    }

    fn push_article(&mut self, article: Article) -> std::result::Result<(), &'static str> {
        match &mut self.cursor {
            Cursor::InSubChapter(_, subchapter) => {
                subchapter.articles.push(article);
                Ok(())
            }
            Cursor::InChapter(_) => Err("article row before any subchapter of its chapter"),
            Cursor::NoChapter => Err("article row before any chapter"),
        }
    }

    fn close_chapter(&mut self) {
        match std::mem::replace(&mut self.cursor, Cursor::NoChapter) {
            Cursor::NoChapter => {}
            Cursor::InChapter(chapter) => self.chapters.push(chapter),
            Cursor::InSubChapter(mut chapter, subchapter) => {
                chapter.subchapters.push(subchapter);
                self.chapters.push(chapter);
            }
        }
    }

    fn finish(mut self) -> Vec<Chapter> {
        self.close_chapter();
        self.chapters
    }
}

fn extract_chapters(table: ElementRef) -> Result<Vec<Chapter>> {
    let mut outline = Outline::new();

    for (row, tr) in table_rows(table).into_iter().enumerate() {
        let bgcolor = tr.value().attr("bgcolor").unwrap_or("");

        match classify_row(bgcolor) {
            RowKind::ChapterMarker => {
                let title = child_path(tr, &["td", "div", "h3", "strong"])
                    .map(text_of)
                    .ok_or_else(|| malformed(row, "chapter row has no td/div/h3/strong title"))?;
                outline.open_chapter(title);
            }
            RowKind::SubChapterMarker => {
                let title = child_path(tr, &["td", "div", "strong"])
                    .map(text_of)
                    .ok_or_else(|| malformed(row, "subchapter row has no td/div/strong title"))?;
                if !outline.open_subchapter(title) {
                    tracing::warn!(row, "Subchapter row before any chapter, skipping");
                }
            }
            RowKind::ArticleRow => {
                if !outline.has_chapter() {
                    tracing::debug!(row, "Article row before any chapter, skipping");
                    continue;
                }
                let article = parse_article(tr, row)?;
                outline
                    .push_article(article)
                    .map_err(|reason| malformed(row, reason))?;
            }
            RowKind::Ignored => {
                tracing::trace!(row, bgcolor, "Ignoring row");
            }
        }
    }

    Ok(outline.finish())
}

fn parse_article(tr: ElementRef, row: usize) -> Result<Article> {
    let cells: Vec<ElementRef> = child_elements(*tr)
        .filter(|e| e.value().name() == "td")
        .collect();

    let [first, predicted, current, done, ..] = cells.as_slice() else {
        return Err(malformed(
            row,
            &format!("article row needs 4 cells, found {}", cells.len()),
        ));
    };

    let title = first_child(*first, "strong")
        .map(text_of)
        .ok_or_else(|| malformed(row, "article title cell has no <strong>"))?;

    Ok(Article {
        title,
        predicted: text_of(*predicted),
        current: text_of(*current),
        done: text_of(*done),
    })
}

fn malformed(row: usize, reason: &str) -> AcquireError {
    AcquireError::MalformedRow {
        row,
        reason: reason.to_string(),
    }
}

/// Rows that belong to this table: direct `<tr>` children and the rows of
/// its `thead`/`tbody`/`tfoot` groups. Rows of nested tables are excluded.
fn table_rows(table: ElementRef) -> Vec<ElementRef> {
    let mut rows = Vec::new();
    for child in child_elements(*table) {
        match child.value().name() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => rows.extend(
                child_elements(*child).filter(|e| e.value().name() == "tr"),
            ),
            _ => {}
        }
    }
    rows
}

fn child_elements<'a>(node: ego_tree::NodeRef<'a, Node>) -> impl Iterator<Item = ElementRef<'a>> {
    node.children().filter_map(ElementRef::wrap)
}

fn first_child<'a>(parent: ElementRef<'a>, name: &str) -> Option<ElementRef<'a>> {
    child_elements(*parent).find(|e| e.value().name() == name)
}

/// Follow the first matching child at each step of `path`.
fn child_path<'a>(start: ElementRef<'a>, path: &[&str]) -> Option<ElementRef<'a>> {
    path.iter().try_fold(start, |el, name| first_child(el, name))
}

fn text_of(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}
