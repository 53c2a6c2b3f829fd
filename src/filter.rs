//! URL set filtering for scraped post exports.
//!
//! Keeps the export rows whose URL appears in a target list, with a
//! substring fallback on post ids when no exact match survives.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::sheet::Table;

/// Host marker used to recognize target URLs in the list file.
const PLATFORM_HOST: &str = "instagram.com";

/// Post URLs embed their id after this segment.
const POST_SEGMENT: &str = "/p/";

/// Header names the URL column is usually exported under.
const URL_COLUMN_CANDIDATES: &[&str] = &[
    "url",
    "URL",
    "link",
    "Link",
    "post_url",
    "postUrl",
    "instagram_url",
    "ig_url",
];

/// How many leading values to sample when sniffing a column for URLs.
const CONTENT_SAMPLE: usize = 5;

/// Reads target URLs from a list file. Lines are either `<label>\t<url>`
/// pairs or bare text containing the URL; lines not mentioning the platform
/// host are ignored.
pub fn read_url_list(path: &Path) -> Result<Vec<String>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading url list {}", path.display()))?;

    let mut urls = Vec::new();
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() || !line.contains(PLATFORM_HOST) {
            continue;
        }

        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() > 1 {
            urls.push(parts[1].to_string());
        } else if let Some(start) = line.find("https://") {
            urls.push(line[start..].to_string());
        }
    }
    Ok(urls)
}

/// Locates the URL column: first by well-known header names, then by
/// sampling each column's leading values for platform URLs.
pub fn find_url_column(table: &Table) -> Option<usize> {
    for name in URL_COLUMN_CANDIDATES {
        if let Some(idx) = table.column(name) {
            info!(column = name, "url column found by name");
            return Some(idx);
        }
    }

    for idx in 0..table.headers.len() {
        let hit = table
            .rows
            .iter()
            .filter_map(|row| row.get(idx).and_then(|c| c.as_str()))
            .take(CONTENT_SAMPLE)
            .any(|value| value.to_lowercase().contains(PLATFORM_HOST));
        if hit {
            info!(column = %table.headers[idx], "url column found by content");
            return Some(idx);
        }
    }

    None
}

/// Extracts the trailing post id from each URL that carries one.
pub fn post_ids(urls: &[String]) -> HashSet<String> {
    urls.iter()
        .filter_map(|url| {
            let (_, rest) = url.split_once(POST_SEGMENT)?;
            let id = rest.trim_end_matches('/');
            (!id.is_empty()).then(|| id.to_string())
        })
        .collect()
}

/// Keeps rows whose URL cell is a member of the target set; when nothing
/// matches exactly, falls back to substring matching on extracted post ids.
pub fn filter_by_urls(table: &Table, url_column: usize, urls: &[String]) -> Table {
    let url_set: HashSet<&str> = urls.iter().map(String::as_str).collect();

    let mut rows: Vec<_> = table
        .rows
        .iter()
        .filter(|row| {
            row.get(url_column)
                .and_then(|c| c.as_str())
                .is_some_and(|value| url_set.contains(value.as_str()))
        })
        .cloned()
        .collect();

    info!(kept = rows.len(), total = table.len(), "exact url match");

    if rows.is_empty() {
        let ids = post_ids(urls);
        info!(
            post_ids = ids.len(),
            "no exact matches, falling back to post-id matching"
        );

        rows = table
            .rows
            .iter()
            .filter(|row| {
                row.get(url_column)
                    .and_then(|c| c.as_str())
                    .is_some_and(|value| ids.iter().any(|id| value.contains(id.as_str())))
            })
            .cloned()
            .collect();

        info!(kept = rows.len(), total = table.len(), "post-id match");
    }

    Table {
        headers: table.headers.clone(),
        rows,
    }
}

/// Filters a scraped export against a target URL list and writes the
/// surviving rows as CSV. A missing URL column is a diagnostic, not an
/// error: the output carries headers only.
pub fn run(urls_path: &Path, input: &Path, output: &Path) -> Result<()> {
    let urls = read_url_list(urls_path)?;
    info!(urls = urls.len(), list = %urls_path.display(), "target urls loaded");

    let table = Table::load(input, 0)?;
    info!(
        rows = table.len(),
        columns = table.headers.len(),
        source = %input.display(),
        "export loaded"
    );

    let filtered = match find_url_column(&table) {
        Some(idx) => filter_by_urls(&table, idx, &urls),
        None => {
            warn!(headers = ?table.headers, "no url column found, writing empty result");
            Table {
                headers: table.headers.clone(),
                rows: Vec::new(),
            }
        }
    };

    filtered.write_csv(output)?;
    info!(kept = filtered.len(), output = %output.display(), "filtered rows written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::Cell;
    use std::env;
    use std::fs;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(name)
    }

    fn url_row(url: &str) -> Vec<Cell> {
        vec![Cell::Text(url.into()), Cell::Text("x".into())]
    }

    fn url_table(urls: &[&str]) -> Table {
        Table {
            headers: vec!["url".into(), "caption".into()],
            rows: urls.iter().map(|u| url_row(u)).collect(),
        }
    }

    #[test]
    fn test_read_url_list_formats() {
        let path = temp_path("reel_metrics_filter_urls.txt");
        fs::write(
            &path,
            "1\thttps://www.instagram.com/p/AAA/\n\
             see https://www.instagram.com/p/BBB/\n\
             not a target line\n\
             https://example.com/p/CCC/\n",
        )
        .unwrap();

        let urls = read_url_list(&path).unwrap();
        assert_eq!(
            urls,
            vec![
                "https://www.instagram.com/p/AAA/",
                "https://www.instagram.com/p/BBB/",
            ]
        );

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_find_url_column_by_name() {
        let table = url_table(&[]);
        assert_eq!(find_url_column(&table), Some(0));
    }

    #[test]
    fn test_find_url_column_by_content() {
        let table = Table {
            headers: vec!["a".into(), "b".into()],
            rows: vec![vec![
                Cell::Text("x".into()),
                Cell::Text("https://www.Instagram.com/p/AAA/".into()),
            ]],
        };
        assert_eq!(find_url_column(&table), Some(1));
    }

    #[test]
    fn test_find_url_column_missing() {
        let table = Table {
            headers: vec!["a".into()],
            rows: vec![vec![Cell::Text("plain".into())]],
        };
        assert_eq!(find_url_column(&table), None);
    }

    #[test]
    fn test_post_ids() {
        let urls = vec![
            "https://www.instagram.com/p/AAA111/".to_string(),
            "https://www.instagram.com/reel/no-post-segment".to_string(),
        ];
        let ids = post_ids(&urls);
        assert_eq!(ids.len(), 1);
        assert!(ids.contains("AAA111"));
    }

    #[test]
    fn test_exact_match_filter() {
        let table = url_table(&[
            "https://www.instagram.com/p/AAA/",
            "https://www.instagram.com/p/BBB/",
        ]);
        let targets = vec!["https://www.instagram.com/p/AAA/".to_string()];

        let filtered = filter_by_urls(&table, 0, &targets);
        assert_eq!(filtered.len(), 1);
        assert_eq!(
            filtered.rows[0][0].as_str().as_deref(),
            Some("https://www.instagram.com/p/AAA/")
        );
    }

    #[test]
    fn test_fallback_post_id_substring() {
        // export URLs differ from targets (extra query string), so the exact
        // pass comes up empty and the post-id fallback has to find them
        let table = url_table(&[
            "https://www.instagram.com/p/AAA/?igshid=1",
            "https://www.instagram.com/p/BBB/?igshid=2",
            "https://www.instagram.com/p/CCC/?igshid=3",
        ]);
        let targets = vec![
            "https://www.instagram.com/p/AAA/".to_string(),
            "https://www.instagram.com/p/CCC/".to_string(),
        ];

        let filtered = filter_by_urls(&table, 0, &targets);
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_no_match_at_all_is_empty() {
        let table = url_table(&["https://www.instagram.com/p/XXX/"]);
        let targets = vec!["https://www.instagram.com/p/AAA/".to_string()];

        let filtered = filter_by_urls(&table, 0, &targets);
        assert!(filtered.is_empty());
    }
}
