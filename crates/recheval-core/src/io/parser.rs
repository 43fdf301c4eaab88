//! Line-oriented rating parser.

use crate::error::ParseError;
use crate::model::{ItemId, Rating, RatingStore, UserId};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, warn};

/// What to do with a malformed line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParsePolicy {
    /// Stop at the first malformed line
    #[default]
    Abort,
    /// Log and drop malformed lines
    Skip,
}

/// Counts from one load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Ratings read, before duplicate pairs collapse
    pub ratings: usize,
    /// Malformed lines dropped under [`ParsePolicy::Skip`]
    pub skipped: usize,
}

/// Parses one line into its ratings.
///
/// Returns an empty vector for blank and comment lines. `line_number` is
/// 1-based and only used for error context.
pub fn parse_line(line: &str, line_number: usize) -> Result<Vec<Rating>, ParseError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(Vec::new());
    }

    let fields: Vec<&str> = trimmed.split('\t').map(str::trim).collect();
    if fields.len() < 2 {
        return Err(ParseError::malformed(
            line_number,
            line,
            format!("expected at least 2 tab-separated fields, got {}", fields.len()),
        ));
    }

    let user = UserId::from_u64(parse_id(fields[0], "user", line_number, line)?);

    if fields[1].starts_with('[') {
        return parse_bracket_list(user, fields[1], line_number, line);
    }

    if fields.len() < 3 {
        return Err(ParseError::malformed(
            line_number,
            line,
            format!("expected at least 3 tab-separated fields, got {}", fields.len()),
        ));
    }

    let item = ItemId::from_u64(parse_id(fields[1], "item", line_number, line)?);
    let value = parse_value(fields[2], line_number, line)?;
    Ok(vec![Rating::new(user, item, value)])
}

fn parse_bracket_list(
    user: UserId,
    list: &str,
    line_number: usize,
    line: &str,
) -> Result<Vec<Rating>, ParseError> {
    let inner = list
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| ParseError::malformed(line_number, line, "unterminated item list"))?;

    let mut ratings = Vec::new();
    for pair in inner.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (item, value) = pair.split_once(':').ok_or_else(|| {
            ParseError::malformed(line_number, line, format!("expected item:value, got '{pair}'"))
        })?;
        let item = ItemId::from_u64(parse_id(item.trim(), "item", line_number, line)?);
        let value = parse_value(value.trim(), line_number, line)?;
        ratings.push(Rating::new(user, item, value));
    }
    Ok(ratings)
}

fn parse_id(field: &str, what: &str, line_number: usize, line: &str) -> Result<u64, ParseError> {
    field
        .parse()
        .map_err(|_| ParseError::malformed(line_number, line, format!("invalid {what} id '{field}'")))
}

fn parse_value(field: &str, line_number: usize, line: &str) -> Result<f64, ParseError> {
    field
        .parse()
        .map_err(|_| ParseError::malformed(line_number, line, format!("invalid value '{field}'")))
}

/// Reads ratings from any buffered reader.
///
/// # Errors
///
/// I/O failures always abort. Malformed lines, including lines that are
/// not valid UTF-8, abort under
/// [`ParsePolicy::Abort`] and are counted in [`LoadSummary::skipped`] under
/// [`ParsePolicy::Skip`].
pub fn read_ratings<R: BufRead>(
    reader: R,
    policy: ParsePolicy,
) -> Result<(RatingStore, LoadSummary), ParseError> {
    let mut store = RatingStore::new();
    let mut summary = LoadSummary::default();

    for (index, raw) in reader.split(b'\n').enumerate() {
        let mut raw = raw?;
        if raw.last() == Some(&b'\r') {
            raw.pop();
        }
        let parsed = match String::from_utf8(raw) {
            Ok(line) => parse_line(&line, index + 1),
            Err(err) => Err(ParseError::malformed(
                index + 1,
                &String::from_utf8_lossy(err.as_bytes()),
                "invalid UTF-8",
            )),
        };
        match parsed {
            Ok(ratings) => {
                summary.ratings += ratings.len();
                store.extend(ratings);
            }
            Err(err) => match policy {
                ParsePolicy::Abort => return Err(err),
                ParsePolicy::Skip => {
                    warn!("Skipping malformed rating line: {}", err);
                    summary.skipped += 1;
                }
            },
        }
    }

    Ok((store, summary))
}

/// Loads a ratings file.
pub fn load_ratings(
    path: impl AsRef<Path>,
    policy: ParsePolicy,
) -> Result<(RatingStore, LoadSummary), ParseError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let (store, summary) = read_ratings(BufReader::new(file), policy)?;
    debug!(
        path = %path.display(),
        users = store.num_users(),
        ratings = summary.ratings,
        skipped = summary.skipped,
        "Loaded ratings"
    );
    Ok((store, summary))
}
