//! Join of filtered post rows against profile rows.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::Result;
use tracing::{info, warn};

use crate::sheet::{Cell, Table};

/// Join flavors supported by the merge command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// Keep every post row; unmatched profile fields stay empty.
    Left,
    /// Keep only post rows with a matching profile.
    Inner,
}

/// Suffixes applied to column names present on both sides.
const LEFT_SUFFIX: &str = "_post";
const RIGHT_SUFFIX: &str = "_profile";

/// Joins posts against profiles on `left_key` = `right_key`.
///
/// Each post row appears at most once in the result: when several profile
/// rows share a key, the first one wins. Returns `None` (with diagnostics)
/// when either key column is missing.
pub fn join(
    posts: &Table,
    profiles: &Table,
    left_key: &str,
    right_key: &str,
    kind: JoinKind,
) -> Option<Table> {
    let Some(left_idx) = posts.column(left_key) else {
        warn!(key = left_key, headers = ?posts.headers, "join key missing from posts");
        return None;
    };
    let Some(right_idx) = profiles.column(right_key) else {
        warn!(key = right_key, headers = ?profiles.headers, "join key missing from profiles");
        return None;
    };

    let mut by_key: HashMap<String, &Vec<Cell>> = HashMap::new();
    for row in &profiles.rows {
        if let Some(key) = row.get(right_idx).and_then(|c| c.as_str()) {
            by_key.entry(key).or_insert(row);
        }
    }

    let headers = merged_headers(&posts.headers, &profiles.headers);

    let mut rows = Vec::new();
    let mut matched = 0usize;
    let mut unmatched = 0usize;

    for row in &posts.rows {
        let profile = row
            .get(left_idx)
            .and_then(|c| c.as_str())
            .and_then(|key| by_key.get(&key));

        match profile {
            Some(profile_row) => {
                matched += 1;
                let mut merged = row.clone();
                merged.extend(profile_row.iter().cloned());
                rows.push(merged);
            }
            None => {
                unmatched += 1;
                if kind == JoinKind::Left {
                    let mut merged = row.clone();
                    merged.extend(std::iter::repeat_n(Cell::Empty, profiles.headers.len()));
                    rows.push(merged);
                }
            }
        }
    }

    info!(matched, unmatched, rows = rows.len(), "join complete");
    Some(Table { headers, rows })
}

fn merged_headers(left: &[String], right: &[String]) -> Vec<String> {
    let collisions: HashSet<&str> = left
        .iter()
        .filter(|h| right.contains(h))
        .map(String::as_str)
        .collect();

    let mut headers: Vec<String> = left
        .iter()
        .map(|h| {
            if collisions.contains(h.as_str()) {
                format!("{h}{LEFT_SUFFIX}")
            } else {
                h.clone()
            }
        })
        .collect();
    headers.extend(right.iter().map(|h| {
        if collisions.contains(h.as_str()) {
            format!("{h}{RIGHT_SUFFIX}")
        } else {
            h.clone()
        }
    }));
    headers
}

/// Loads both tables, joins them, and writes the result as CSV. Missing join
/// keys produce an empty output rather than an error.
pub fn run(
    posts_path: &Path,
    profiles_path: &Path,
    left_key: &str,
    right_key: &str,
    kind: JoinKind,
    output: &Path,
) -> Result<()> {
    let posts = Table::load(posts_path, 0)?;
    info!(rows = posts.len(), source = %posts_path.display(), "posts loaded");

    let profiles = Table::load(profiles_path, 0)?;
    info!(rows = profiles.len(), source = %profiles_path.display(), "profiles loaded");

    let merged = join(&posts, &profiles, left_key, right_key, kind).unwrap_or(Table {
        headers: Vec::new(),
        rows: Vec::new(),
    });

    merged.write_csv(output)?;
    info!(rows = merged.len(), output = %output.display(), "merged rows written");
    Ok(())
}
