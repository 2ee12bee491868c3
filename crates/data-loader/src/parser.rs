//! Parsers for the catalog and similarity artifacts.
//!
//! Two encodings are supported for each artifact, chosen by extension:
//! - catalog `.json`: record list `[{"movie_id": 1, "title": ".."}]` or
//!   column object `{"movie_id": [..], "title": [..]}` (columns may also be
//!   index-keyed maps, `{"0": .., "1": ..}`, as dataframe dumps produce)
//! - catalog `.dat`: `movieId::title`, one per line, Latin-1. Everything after
//!   the first `::` is the title, so three-field `id::title::genres` rows keep
//!   `title::genres` as the title; strip extra columns before exporting
//! - matrix `.json`: array of rows
//! - matrix `.dat`: one row per line, scores split on whitespace or commas

use crate::error::{DataLoadError, Result};
use crate::types::*;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Artifact encoding, derived from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Dat,
}

fn detect_format(path: &Path) -> Result<Format> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Format::Json),
        Some(ext) if ext.eq_ignore_ascii_case("dat") => Ok(Format::Dat),
        _ => Err(DataLoadError::UnsupportedFormat {
            path: path.display().to_string(),
        }),
    }
}

fn open(path: &Path) -> Result<File> {
    if !path.exists() {
        return Err(DataLoadError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    Ok(File::open(path)?)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Helper function to read a file with ISO-8859-1 encoding (Latin-1)
///
/// Each byte maps directly to the Unicode code point of the same value, so
/// this never fails on odd bytes in legacy catalog dumps.
fn read_lines_latin1(path: &Path) -> Result<Vec<String>> {
    let mut file = open(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    let content: String = bytes.iter().map(|&b| b as char).collect();

    Ok(content.lines().map(|s| s.to_string()).collect())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let reader = BufReader::new(open(path)?);
    serde_json::from_reader(reader).map_err(|source| DataLoadError::Json {
        file: file_name(path),
        source,
    })
}

// =============================================================================
// Catalog
// =============================================================================

/// Parse the movie catalog, in matrix order
pub fn parse_catalog(path: &Path) -> Result<Vec<Movie>> {
    match detect_format(path)? {
        Format::Json => parse_catalog_json(path),
        Format::Dat => parse_catalog_dat(path),
    }
}

/// One column of a column-oriented catalog
#[derive(Deserialize)]
#[serde(untagged)]
enum Column<T> {
    List(Vec<T>),
    Indexed(BTreeMap<String, T>),
}

impl<T> Column<T> {
    /// Flatten into `(row index, value)` pairs ordered by row index
    fn into_rows(self, field: &str) -> Result<Vec<(usize, T)>> {
        match self {
            Column::List(values) => Ok(values.into_iter().enumerate().collect()),
            Column::Indexed(map) => {
                let mut rows = Vec::with_capacity(map.len());
                for (key, value) in map {
                    let idx = key.parse::<usize>().map_err(|_| DataLoadError::InvalidValue {
                        field: format!("{} index", field),
                        value: key.clone(),
                    })?;
                    rows.push((idx, value));
                }
                rows.sort_by_key(|(idx, _)| *idx);
                Ok(rows)
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogJson {
    Records(Vec<Movie>),
    Columns {
        movie_id: Column<MovieId>,
        title: Column<String>,
    },
}

fn parse_catalog_json(path: &Path) -> Result<Vec<Movie>> {
    match read_json::<CatalogJson>(path)? {
        CatalogJson::Records(movies) => Ok(movies),
        CatalogJson::Columns { movie_id, title } => {
            let ids = movie_id.into_rows("movie_id")?;
            let titles = title.into_rows("title")?;

            if ids.len() != titles.len() {
                return Err(DataLoadError::DimensionMismatch {
                    what: "catalog columns (movie_id vs title)".to_string(),
                    expected: ids.len(),
                    found: titles.len(),
                });
            }

            ids.into_iter()
                .zip(titles)
                .map(|((id_row, id), (title_row, title))| {
                    if id_row != title_row {
                        return Err(DataLoadError::InvalidValue {
                            field: "catalog row index".to_string(),
                            value: format!("movie_id row {} vs title row {}", id_row, title_row),
                        });
                    }
                    Ok(Movie { id, title })
                })
                .collect()
        }
    }
}

/// Parse a `movieId::title` catalog
///
/// Titles may themselves contain `::`; only the first separator splits.
fn parse_catalog_dat(path: &Path) -> Result<Vec<Movie>> {
    let file = file_name(path);
    let lines = read_lines_latin1(path)?;
    let mut movies = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        let line_no = idx + 1;
        let line_trimmed = line.trim();
        if line_trimmed.is_empty() {
            continue;
        }

        let (movie_id, title) = line_trimmed.split_once("::").ok_or_else(|| {
            DataLoadError::ParseError {
                file: file.clone(),
                line: line_no,
                reason: "Missing title".to_string(),
            }
        })?;

        let movie = Movie {
            id: movie_id.trim().parse().map_err(|e| DataLoadError::ParseError {
                file: file.clone(),
                line: line_no,
                reason: format!("Invalid movieId: {}", e),
            })?,
            title: title.to_string(),
        };

        movies.push(movie);
    }

    Ok(movies)
}

// =============================================================================
// Similarity matrix
// =============================================================================

/// Parse the similarity matrix; rows must form a square
pub fn parse_similarity(path: &Path) -> Result<SimilarityMatrix> {
    let rows = match detect_format(path)? {
        Format::Json => read_json::<Vec<Vec<f32>>>(path)?,
        Format::Dat => parse_similarity_rows_dat(path)?,
    };
    SimilarityMatrix::from_rows(rows)
}

fn parse_similarity_rows_dat(path: &Path) -> Result<Vec<Vec<f32>>> {
    let file = file_name(path);
    let lines = read_lines_latin1(path)?;
    let mut rows = Vec::with_capacity(lines.len());

    for (idx, line) in lines.iter().enumerate() {
        let line_no = idx + 1;
        let line_trimmed = line.trim();
        if line_trimmed.is_empty() {
            continue;
        }

        let row = line_trimmed
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|field| !field.is_empty())
            .map(|field| {
                field.parse::<f32>().map_err(|e| DataLoadError::ParseError {
                    file: file.clone(),
                    line: line_no,
                    reason: format!("Invalid score {:?}: {}", field, e),
                })
            })
            .collect::<Result<Vec<f32>>>()?;

        rows.push(row);
    }

    Ok(rows)
}
