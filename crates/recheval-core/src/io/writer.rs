//! Writes stores as `user \t item \t value` lines.

use crate::model::RatingStore;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes every triple in ascending (user, item) order.
pub fn write_ratings<W: Write>(store: &RatingStore, mut writer: W) -> std::io::Result<()> {
    for rating in store.iter() {
        writeln!(writer, "{}\t{}\t{}", rating.user, rating.item, rating.value)?;
    }
    writer.flush()
}

/// Creates (or truncates) `path` and writes the store to it.
pub fn save_ratings(store: &RatingStore, path: impl AsRef<Path>) -> std::io::Result<()> {
    let file = File::create(path)?;
    write_ratings(store, BufWriter::new(file))
}
