//! Reading and writing rating files.
//!
//! Two line forms are understood:
//!
//! ```text
//! user \t item \t value [\t extra columns ignored]
//! user \t [item:value,item:value,...]
//! ```
//!
//! Both build the same [`RatingStore`](crate::model::RatingStore); a pair
//! seen twice keeps the last value. Blank lines and lines starting with `#`
//! are skipped. Files are always written in the first form.

pub mod parser;
pub mod writer;

pub use parser::{load_ratings, parse_line, read_ratings, LoadSummary, ParsePolicy};
pub use writer::{save_ratings, write_ratings};
