//! Year / month / day index page for the HTML archive.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::info;

use super::html::escape_html;
use super::ArchiveLayout;

/// One mail listed in the index.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct IndexEntry {
    /// Link relative to the archive root.
    pub path: String,
    pub subject: String,
    pub id: u64,
}

type Days = BTreeMap<String, Vec<IndexEntry>>;
type Months = BTreeMap<String, Days>;

/// Archived mails grouped by zero-padded year, month and day.
#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct ArchiveIndex {
    years: BTreeMap<String, Months>,
}

impl ArchiveIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mail; an identical entry on the same day is kept once.
    pub fn insert(&mut self, year: &str, month: &str, day: &str, entry: IndexEntry) {
        let entries = self
            .years
            .entry(year.to_string())
            .or_default()
            .entry(month.to_string())
            .or_default()
            .entry(day.to_string())
            .or_default();
        if !entries.contains(&entry) {
            entries.push(entry);
        }
    }

    /// Total number of indexed mails.
    pub fn len(&self) -> usize {
        self.years
            .values()
            .flat_map(|m| m.values())
            .flat_map(|d| d.values())
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render the complete index page.
    pub fn render(&self) -> String {
        let mut html = String::new();
        html.push_str("<html>\n<head>\n<meta charset=\"utf-8\">\n");
        html.push_str("<link rel=\"stylesheet\" href=\"./static/css/custom.css\">\n</head>\n<body>\n");
        html.push_str("<h2>\nArchived mails\n</h2>\n");

        for (year, months) in &self.years {
            html.push_str(&format!("<details>\n<summary>{year}</summary>\n"));
            for (month, days) in months {
                html.push_str(&format!(
                    "<details>\n<summary>{}</summary>\n",
                    month_name(month)
                ));
                for (day, entries) in days {
                    html.push_str(&format!("<details>\n<summary>{day}</summary>\n"));
                    for e in entries {
                        html.push_str(&format!(
                            "<p>\n<a href='{}'>{}</a> - id: {}\n</p>\n",
                            escape_html(&e.path),
                            escape_html(&e.subject),
                            e.id
                        ));
                    }
                    html.push_str("</details>\n");
                }
                html.push_str("</details>\n");
            }
            html.push_str("</details>\n");
        }

        html.push_str("</body>\n</html>\n");
        html
    }

    /// Write `index.html` at the archive root.
    pub fn write(&self, layout: &ArchiveLayout) -> anyhow::Result<()> {
        let path = layout.index_path();
        info!(path = %path.display(), mails = self.len(), "Writing index");
        std::fs::create_dir_all(layout.root())?;
        std::fs::write(&path, self.render())?;
        Ok(())
    }
}

/// Full English month name for a `"01"`..`"12"` key; other keys are shown as-is.
fn month_name(month: &str) -> String {
    month
        .parse::<u32>()
        .ok()
        .and_then(|m| NaiveDate::from_ymd_opt(2000, m, 1))
        .map(|d| d.format("%B").to_string())
        .unwrap_or_else(|| month.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u64, subject: &str) -> IndexEntry {
        IndexEntry {
            path: ArchiveLayout::mail_link("2024", "02", "09", id),
            subject: subject.to_string(),
            id,
        }
    }

    #[test]
    fn test_insert_dedups() {
        let mut idx = ArchiveIndex::new();
        idx.insert("2024", "02", "09", entry(1, "a"));
        idx.insert("2024", "02", "09", entry(1, "a"));
        idx.insert("2024", "02", "09", entry(2, "b"));
        assert_eq!(idx.len(), 2);
    }

    #[test]
    fn test_render_sorted_with_month_names() {
        let mut idx = ArchiveIndex::new();
        idx.insert("2024", "02", "09", entry(2, "later"));
        idx.insert("2023", "11", "30", entry(1, "<earlier>"));
        let html = idx.render();

        let y2023 = html.find("<summary>2023</summary>").unwrap();
        let y2024 = html.find("<summary>2024</summary>").unwrap();
        assert!(y2023 < y2024);
        assert!(html.contains("<summary>November</summary>"));
        assert!(html.contains("<summary>February</summary>"));
        assert!(html.contains("&lt;earlier&gt;"));
        assert!(html.contains("href='Mails/2024/02/09/2.html'"));
    }

    #[test]
    fn test_month_name_fallback() {
        assert_eq!(month_name("07"), "July");
        assert_eq!(month_name("xx"), "xx");
    }
}
