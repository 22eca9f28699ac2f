//! CSV catalog loading.
//!
//! Every row is parsed even after a failure so operators see all problems in
//! one pass. Missing required columns abort before any row is read.

use super::normalize::parse_tags;
use super::SongCatalog;
use crate::error::{KaraokeError, Result, SongValidationError};
use crate::models::{GenderAffinity, Song};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

pub const REQUIRED_COLUMNS: [&str; 6] = [
    "title",
    "artist",
    "year",
    "genre",
    "mood_tags",
    "situation_tags",
];

pub const GENDER_COLUMN: &str = "gender";

/// Header name -> column position
struct ColumnMap {
    positions: HashMap<String, usize>,
}

impl ColumnMap {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let positions: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim_start_matches('\u{feff}').trim().to_lowercase(), i))
            .collect();

        let mut missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|column| !positions.contains_key(**column))
            .map(|column| column.to_string())
            .collect();

        if !missing.is_empty() {
            missing.sort();
            return Err(KaraokeError::MissingColumns(missing));
        }

        Ok(Self { positions })
    }

    fn get<'r>(&self, record: &'r csv::StringRecord, column: &str) -> &'r str {
        self.positions
            .get(column)
            .and_then(|&i| record.get(i))
            .unwrap_or("")
    }

    fn has(&self, column: &str) -> bool {
        self.positions.contains_key(column)
    }
}

fn song_from_record(
    record: &csv::StringRecord,
    columns: &ColumnMap,
) -> std::result::Result<Song, SongValidationError> {
    let raw_year = columns.get(record, "year");
    let year: i32 = raw_year
        .trim()
        .parse()
        .map_err(|_| SongValidationError::new(format!("year must be integer: {raw_year}")))?;

    let gender_affinity = if columns.has(GENDER_COLUMN) {
        columns.get(record, GENDER_COLUMN).parse()?
    } else {
        GenderAffinity::Unisex
    };

    Song::new(
        columns.get(record, "title"),
        columns.get(record, "artist"),
        year,
        columns.get(record, "genre"),
        parse_tags(columns.get(record, "mood_tags")),
        parse_tags(columns.get(record, "situation_tags")),
        gender_affinity,
    )
}

/// 1-based file line a record starts on. Quoted fields may span lines, so
/// this can run ahead of the record count.
fn source_line(record: &std::result::Result<csv::StringRecord, csv::Error>) -> Option<usize> {
    let position = match record {
        Ok(record) => record.position(),
        Err(e) => e.position(),
    }?;
    usize::try_from(position.line()).ok()
}

impl SongCatalog {
    /// Load a catalog from CSV data, rejecting it wholesale if any row is invalid
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);

        let columns = ColumnMap::from_headers(csv_reader.headers()?)?;

        let mut songs = Vec::new();
        let mut errors = Vec::new();

        for (offset, record) in csv_reader.records().enumerate() {
            let row_index = source_line(&record).unwrap_or(offset + 2);
            let parsed = record
                .map_err(|e| SongValidationError::new(format!("malformed row: {e}")))
                .and_then(|record| song_from_record(&record, &columns));

            match parsed {
                Ok(song) => songs.push(song),
                Err(e) => {
                    debug!("Rejected catalog row {}: {}", row_index, e);
                    errors.push(e.at_row(row_index));
                }
            }
        }

        if !errors.is_empty() {
            warn!("Catalog load rejected: {} invalid row(s)", errors.len());
            return Err(KaraokeError::BulkLoad(errors));
        }

        let catalog = SongCatalog::new(songs);
        info!(
            "Loaded {} songs, decades={:?}",
            catalog.len(),
            catalog.decades()
        );
        Ok(catalog)
    }

    /// Load a catalog from a CSV file on disk
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading song catalog from {}", path.display());
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }
}
