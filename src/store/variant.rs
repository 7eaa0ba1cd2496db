//! Variant identifiers and file naming
//!
//! On-disk layout:
//! - base document: `<name>.<ext>`
//! - variant: `<name>_<YYYYMMDD_HHMMSS>.<ext>` in local wall-clock time
//! - same-second variant: `<name>_<YYYYMMDD_HHMMSS>_<seq>.<ext>`, seq >= 1
//!
//! Variants order by `(created_at, sequence)`. Legacy entries without a
//! sequence suffix have sequence 0.

use std::fmt;
use std::sync::OnceLock;

use chrono::{NaiveDateTime, Timelike};
use regex::Regex;
use serde::Serialize;

use super::errors::{DocumentError, DocumentResult};

/// chrono format of the timestamp embedded in a variant identifier
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Identifier of a stored variant (its file stem)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct VariantId(String);

impl VariantId {
    /// The identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn compose(document: &str, created_at: NaiveDateTime, sequence: u32) -> Self {
        let stamp = created_at.format(TIMESTAMP_FORMAT);
        if sequence == 0 {
            VariantId(format!("{}_{}", document, stamp))
        } else {
            VariantId(format!("{}_{}_{}", document, stamp, sequence))
        }
    }
}

impl fmt::Display for VariantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Metadata of one immutable variant. Content is read on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Variant {
    id: VariantId,
    document: String,
    created_at: NaiveDateTime,
    sequence: u32,
    file_name: String,
}

impl Variant {
    /// Build the variant for `document` at `created_at` (truncated to seconds)
    pub fn new(document: &str, created_at: NaiveDateTime, sequence: u32, extension: &str) -> Self {
        let created_at = truncate_to_second(created_at);
        let id = VariantId::compose(document, created_at, sequence);
        let file_name = format!("{}.{}", id, extension);
        Self {
            id,
            document: document.to_string(),
            created_at,
            sequence,
            file_name,
        }
    }

    pub fn id(&self) -> &VariantId {
        &self.id
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// File name inside the variant root
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Total order among variants of one document
    pub fn ordering_key(&self) -> (NaiveDateTime, u32) {
        (self.created_at, self.sequence)
    }
}

/// Classification of a directory entry found in the variant root
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantEntry {
    /// A well-formed variant
    Valid(Variant),
    /// Revision-shaped but unusable; excluded from listings
    Malformed {
        document: Option<String>,
        reason: String,
    },
    /// Not a variant file at all (other extension, temp file, dotfile)
    Foreign,
}

fn variant_stem_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<doc>.+)_(?P<stamp>\d{8}_\d{6})(?:_(?P<seq>\d+))?$")
            .expect("variant stem pattern is valid")
    })
}

/// Classify a file name from the variant root
pub fn classify_entry(file_name: &str, extension: &str) -> VariantEntry {
    if file_name.starts_with('.') {
        return VariantEntry::Foreign;
    }
    let stem = match file_name
        .strip_suffix(extension)
        .and_then(|s| s.strip_suffix('.'))
    {
        Some(stem) => stem,
        None => return VariantEntry::Foreign,
    };

    let caps = match variant_stem_pattern().captures(stem) {
        Some(caps) => caps,
        None => {
            return VariantEntry::Malformed {
                document: stem.rsplit_once('_').map(|(doc, _)| doc.to_string()),
                reason: "missing timestamp suffix".to_string(),
            }
        }
    };

    let document = caps["doc"].to_string();
    let created_at = match NaiveDateTime::parse_from_str(&caps["stamp"], TIMESTAMP_FORMAT) {
        Ok(ts) => ts,
        Err(e) => {
            return VariantEntry::Malformed {
                document: Some(document),
                reason: format!("unparseable timestamp '{}': {}", &caps["stamp"], e),
            }
        }
    };

    let sequence = match caps.name("seq") {
        None => 0,
        Some(seq) => match seq.as_str().parse::<u32>() {
            Ok(n) if n >= 1 => n,
            _ => {
                return VariantEntry::Malformed {
                    document: Some(document),
                    reason: format!("invalid sequence '{}'", seq.as_str()),
                }
            }
        },
    };

    VariantEntry::Valid(Variant::new(&document, created_at, sequence, extension))
}

/// Reject names that cannot be mapped to a single file in a storage root
pub fn validate_document_name(name: &str) -> DocumentResult<()> {
    let reason = if name.is_empty() {
        Some("name is empty")
    } else if name.contains(['/', '\\']) {
        Some("contains a path separator")
    } else if name.contains('\0') {
        Some("contains a NUL byte")
    } else if name.starts_with('.') {
        Some("starts with '.'")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(DocumentError::InvalidName {
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// Drop sub-second precision
pub fn truncate_to_second(ts: NaiveDateTime) -> NaiveDateTime {
    ts.with_nanosecond(0).unwrap_or(ts)
}
