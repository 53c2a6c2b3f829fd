//! Spreadsheet-to-document conversion pipeline.

use std::path::Path;

use anyhow::{Result, bail};
use tracing::info;

use crate::document::{Document, SummarySection};
use crate::format::{format_count, percent};
use crate::record::{ColumnMap, InfluencerRecord, InfluencerType};
use crate::sheet::Table;
use crate::summary::{Summary, combine};

/// The exports carry one banner row above the header line.
pub const EXPORT_HEADER_ROW: usize = 1;

/// Records and summary loaded from one export file.
pub struct Dataset {
    pub records: Vec<InfluencerRecord>,
    pub summary: Summary,
}

impl Dataset {
    fn empty() -> Dataset {
        Dataset {
            records: Vec::new(),
            summary: Summary::default(),
        }
    }
}

/// Loads one export and maps every row through the shared column mapping.
pub fn load_dataset(path: &Path, kind: Option<InfluencerType>) -> Result<Dataset> {
    let table = Table::load(path, EXPORT_HEADER_ROW)?;
    let map = ColumnMap::resolve(&table);

    let records: Vec<InfluencerRecord> =
        table.rows.iter().map(|row| map.record(row, kind)).collect();
    let summary = Summary::from_records(&records);

    info!(
        source = %path.display(),
        records = records.len(),
        "export loaded"
    );

    Ok(Dataset { records, summary })
}

/// Converts a single export into a `{summary, data}` document.
pub fn convert_single(input: &Path, output: &Path) -> Result<()> {
    let dataset = load_dataset(input, None)?;
    log_totals(&dataset.summary);

    let document = Document {
        summary: SummarySection::Single(dataset.summary),
        data: dataset.records,
    };
    document.save(output)?;

    info!(
        records = document.data.len(),
        output = %output.display(),
        "document written"
    );
    Ok(())
}

/// Converts a regular and/or sales export into one document with per-type
/// summaries. Records are renumbered sequentially so identifiers stay unique
/// across sources; the source identifier is kept in `original_id`.
pub fn convert_combined(
    regular: Option<&Path>,
    sales: Option<&Path>,
    output: &Path,
) -> Result<()> {
    if regular.is_none() && sales.is_none() {
        bail!("at least one of the regular or sales exports is required");
    }

    let regular = match regular {
        Some(path) => load_dataset(path, Some(InfluencerType::Regular))?,
        None => Dataset::empty(),
    };
    let sales = match sales {
        Some(path) => load_dataset(path, Some(InfluencerType::Sales))?,
        None => Dataset::empty(),
    };

    let regular_count = regular.records.len();
    let sales_count = sales.records.len();

    let all = combine(&regular.summary, &sales.summary);
    log_totals(&all);

    let mut data = regular.records;
    data.extend(sales.records);
    for (i, record) in data.iter_mut().enumerate() {
        record.original_id = record.id;
        record.id = Some(i as u64 + 1);
    }

    let document = Document {
        summary: SummarySection::ByType {
            all,
            regular: regular.summary,
            sales: sales.summary,
        },
        data,
    };
    document.save(output)?;

    info!(
        records = document.data.len(),
        regular = regular_count,
        sales = sales_count,
        output = %output.display(),
        "combined document written"
    );
    Ok(())
}

fn log_totals(summary: &Summary) {
    info!(
        influencers = summary.total_influencers,
        views = %format_count(summary.total_views as f64).unwrap_or_default(),
        followers = %format_count(summary.total_followers as f64).unwrap_or_default(),
        engagement = %percent(summary.avg_engagement_rate),
        avg_cpm = %format!("${:.2}", summary.avg_cpm),
        "summary totals"
    );
}
