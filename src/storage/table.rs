//! Delimited-file I/O for input reviews and the wide analysis table.

use csv::{ByteRecord, ReaderBuilder, StringRecord, WriterBuilder};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::{coerce_rating, AnalysisRow, Aspect, Review};
use crate::taxonomy;

pub const JTBD_COLUMN: &str = "JTBD statements";

const REVIEW_COLUMNS: [&str; 6] = ["id", "source", "app_type", "timestamp", "comment", "rating"];

/// Column names in the fixed output order.
pub fn output_columns() -> Vec<&'static str> {
    let mut columns: Vec<&'static str> = REVIEW_COLUMNS.to_vec();
    columns.extend(Aspect::ALL.iter().map(Aspect::sentiment_column));
    columns.extend(Aspect::ALL.iter().map(Aspect::subcategory_column));
    columns.push(JTBD_COLUMN);
    columns
}

fn canonical_input_column(header: &str) -> String {
    let header = header.trim().to_lowercase();
    match header.as_str() {
        "date" => "timestamp".to_string(),
        "review" => "comment".to_string(),
        "platform" => "source".to_string(),
        "review_id" => "id".to_string(),
        _ => header,
    }
}

/// Header name → index. The first occurrence of a name wins.
struct ColumnIndex(BTreeMap<String, usize>);

impl ColumnIndex {
    fn new<'a>(headers: impl Iterator<Item = &'a str>, canonical: impl Fn(&str) -> String) -> Self {
        let mut map = BTreeMap::new();
        for (i, header) in headers.enumerate() {
            map.entry(canonical(header)).or_insert(i);
        }
        Self(map)
    }

    /// Cell value, or empty when the column is absent.
    fn cell<'r>(&self, record: &'r StringRecord, column: &str) -> &'r str {
        self.0
            .get(column)
            .and_then(|&i| record.get(i))
            .unwrap_or("")
    }

    fn missing<'c>(&self, columns: &[&'c str]) -> Vec<&'c str> {
        columns
            .iter()
            .filter(|c| !self.0.contains_key(**c))
            .copied()
            .collect()
    }
}

/// Platform label implied by a file name like `doordash_customer_reviews.csv`.
pub fn platform_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_lowercase();
    stem.trim_end_matches("_customer_reviews").to_string()
}

pub fn load_reviews<P: AsRef<Path>>(path: P, platform_override: Option<&str>) -> Result<Vec<Review>> {
    load_file(path.as_ref(), platform_override, 0)
}

/// Load several files into one table, in argument order. Generated ids are
/// numbered across the combined table.
pub fn load_all(paths: &[PathBuf], platform_override: Option<&str>) -> Result<Vec<Review>> {
    let mut reviews = Vec::new();
    for path in paths {
        let loaded = load_file(path, platform_override, reviews.len())?;
        reviews.extend(loaded);
    }
    Ok(reviews)
}

fn load_file(path: &Path, platform_override: Option<&str>, first_row: usize) -> Result<Vec<Review>> {
    let file = File::open(path)?;
    let reviews = parse_reviews(file, &platform_from_path(path), platform_override, first_row)?;
    tracing::info!("Loaded {} reviews from {}", reviews.len(), path.display());
    Ok(reviews)
}

/// Parse review rows. The source label is the override when given, else the
/// row's own `source` cell, else `fallback_platform`.
pub fn read_reviews<R: Read>(
    reader: R,
    fallback_platform: &str,
    platform_override: Option<&str>,
) -> Result<Vec<Review>> {
    parse_reviews(reader, fallback_platform, platform_override, 0)
}

/// Invalid UTF-8 is replaced rather than rejected.
fn lossy_record(record: &ByteRecord) -> StringRecord {
    record
        .iter()
        .map(|field| String::from_utf8_lossy(field).into_owned())
        .collect::<Vec<String>>()
        .into()
}

fn parse_reviews<R: Read>(
    reader: R,
    fallback_platform: &str,
    platform_override: Option<&str>,
    first_row: usize,
) -> Result<Vec<Review>> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = lossy_record(rdr.byte_headers()?);
    let columns = ColumnIndex::new(headers.iter(), canonical_input_column);

    let missing = columns.missing(&REVIEW_COLUMNS);
    if !missing.is_empty() {
        tracing::debug!("Input is missing columns {:?}; filling them empty", missing);
    }

    let mut reviews = Vec::new();
    for (i, raw) in rdr.byte_records().enumerate() {
        let raw = raw?;
        if std::str::from_utf8(raw.as_slice()).is_err() {
            tracing::warn!("Row {} has invalid UTF-8; replacing the bad bytes", first_row + i + 1);
        }
        let record = lossy_record(&raw);

        let source = match platform_override {
            Some(platform) => platform.to_string(),
            None => {
                let cell = columns.cell(&record, "source").trim();
                if cell.is_empty() {
                    fallback_platform.to_string()
                } else {
                    cell.to_string()
                }
            }
        };

        let id = columns.cell(&record, "id").trim();
        let id = if id.is_empty() {
            format!("{}-{}", source, first_row + i + 1)
        } else {
            id.to_string()
        };

        reviews.push(Review {
            id,
            source,
            app_type: columns.cell(&record, "app_type").to_string(),
            timestamp: columns.cell(&record, "timestamp").to_string(),
            comment: columns.cell(&record, "comment").to_string(),
            rating: coerce_rating(columns.cell(&record, "rating")),
        });
    }

    Ok(reviews)
}

fn row_record(row: &AnalysisRow) -> Vec<String> {
    let review = &row.review;
    let mut record = vec![
        review.id.clone(),
        review.source.clone(),
        review.app_type.clone(),
        review.timestamp.clone(),
        review.comment.clone(),
        review.rating.to_string(),
    ];
    record.extend(
        row.scores
            .iter()
            .map(|(_, score)| score.map(|s| s.to_string()).unwrap_or_default()),
    );
    record.extend(Aspect::ALL.iter().map(|&a| row.subcategory_cell(a)));
    record.push(row.jtbd.clone().unwrap_or_default());
    record
}

pub fn write_analysis_to<W: Write>(writer: W, rows: &[AnalysisRow]) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(writer);
    wtr.write_record(output_columns())?;
    for row in rows {
        wtr.write_record(row_record(row))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the table through a sibling temp file so a crash never leaves a
/// truncated file at `path`.
pub fn write_analysis<P: AsRef<Path>>(path: P, rows: &[AnalysisRow]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    write_analysis_to(File::create(&tmp)?, rows)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn read_analysis<P: AsRef<Path>>(path: P) -> Result<Vec<AnalysisRow>> {
    read_analysis_from(File::open(path)?)
}

/// Parse a wide table. Absent columns read as empty.
pub fn read_analysis_from<R: Read>(reader: R) -> Result<Vec<AnalysisRow>> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr.headers()?.clone();
    let columns = ColumnIndex::new(headers.iter(), |h| h.trim().to_string());

    let missing = columns.missing(&output_columns());
    if !missing.is_empty() {
        tracing::warn!("Analysis table is missing columns {:?}; treating them as empty", missing);
    }

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;

        let review = Review {
            id: columns.cell(&record, "id").to_string(),
            source: columns.cell(&record, "source").to_string(),
            app_type: columns.cell(&record, "app_type").to_string(),
            timestamp: columns.cell(&record, "timestamp").to_string(),
            comment: columns.cell(&record, "comment").to_string(),
            rating: coerce_rating(columns.cell(&record, "rating")),
        };
        let mut row = AnalysisRow::new(review);

        for aspect in Aspect::ALL {
            if let Ok(score) = columns.cell(&record, aspect.sentiment_column()).trim().parse::<f64>() {
                row.scores.set(aspect, score);
            }

            for tag in columns.cell(&record, aspect.subcategory_column()).split(',') {
                let tag = taxonomy::normalize_label(tag);
                if taxonomy::is_known(&tag) && !row.subcategories.contains(&tag) {
                    row.subcategories.push(tag);
                }
            }
        }

        let jtbd = columns.cell(&record, JTBD_COLUMN).trim();
        row.jtbd = (!jtbd.is_empty()).then(|| jtbd.to_string());

        rows.push(row);
    }

    Ok(rows)
}

fn file_safe(label: &str) -> String {
    let label: String = label
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if label.is_empty() {
        "unknown".to_string()
    } else {
        label
    }
}

/// Write one `<stem>_<platform>.csv` per platform next to `output`.
pub fn write_per_platform(output: &Path, rows: &[AnalysisRow]) -> Result<Vec<PathBuf>> {
    let stem = output
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("analysis");
    let dir = output.parent().unwrap_or_else(|| Path::new(""));

    let mut groups: BTreeMap<String, Vec<AnalysisRow>> = BTreeMap::new();
    for row in rows {
        groups
            .entry(file_safe(&row.review.source))
            .or_default()
            .push(row.clone());
    }

    let mut written = Vec::new();
    for (platform, group) in groups {
        let path = dir.join(format!("{}_{}.csv", stem, platform));
        write_analysis(&path, &group)?;
        tracing::info!("Saved {} {} rows to {}", group.len(), platform, path.display());
        written.push(path);
    }
    Ok(written)
}
