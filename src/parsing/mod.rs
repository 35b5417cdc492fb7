//! Building blocks of the export parser.
//!
//! Each stage is usable on its own; [`KakaoParser`](crate::parser::KakaoParser)
//! wires them together.
//!
//! - [`encoding`] - encoding detection and permissive decoding
//! - [`line`] - line classification and the date-context fold
//! - [`timestamp`] - time-token normalization
//! - [`tabular`] - delimited-table fallback

pub mod encoding;
pub mod line;
pub mod tabular;
pub mod timestamp;

pub use encoding::{DecodedText, decode, decode_strict, detect_encoding};
pub use line::{
    LineEvent, LineKind, LinePattern, RawRecord, ScanState, TimeToken, Tokenized, classify_line,
    scan_step, tokenize,
};
pub use tabular::{TabularRows, load_tabular};
pub use timestamp::{Confidence, NormalizedTimestamp, normalize_datetime, normalize_time};
