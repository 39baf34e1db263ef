// ABOUTME: Build identifiers of the form creator/app:version-Y-M-D-millisOfDay.
// ABOUTME: Parsing, version stamping, tuple matching and the two build orderings.

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

use super::names::{AppName, TenantName};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseBuildIdError {
    #[error("build identifier cannot be empty")]
    Empty,

    #[error("build identifier has no tag: {0}")]
    MissingTag(String),

    #[error("build identifier tag has no date/time suffix: {0}")]
    MissingTimestamp(String),

    #[error("invalid {field} in build identifier {input}")]
    InvalidField { field: &'static str, input: String },
}

/// How two builds of the same repository are ordered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildOrdering {
    /// `repo:version` as a string, then year, month, day and millis numerically.
    #[default]
    Chronological,
    /// String comparison of `repo:version-Y-M-D`, then millis numerically.
    /// Unpadded months and days sort wrongly ("10" < "9").
    Lexicographic,
}

impl BuildOrdering {
    pub fn compare(self, a: &BuildId, b: &BuildId) -> Ordering {
        let primary = match self {
            BuildOrdering::Chronological => a
                .family()
                .cmp(&b.family())
                .then(a.year.cmp(&b.year))
                .then(a.month.cmp(&b.month))
                .then(a.day.cmp(&b.day))
                .then(a.millis_of_day.cmp(&b.millis_of_day)),
            BuildOrdering::Lexicographic => a
                .day_key()
                .cmp(&b.day_key())
                .then(a.millis_of_day.cmp(&b.millis_of_day)),
        };
        // Identifiers differing only in zero padding are still distinct builds.
        primary.then_with(|| a.raw.cmp(&b.raw))
    }

    /// Sort builds ascending.
    pub fn sort(self, builds: &mut [BuildId]) {
        builds.sort_by(|a, b| self.compare(a, b));
    }
}

impl fmt::Display for BuildOrdering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildOrdering::Chronological => write!(f, "chronological"),
            BuildOrdering::Lexicographic => write!(f, "lexicographic"),
        }
    }
}

/// A parsed build identifier. Exactly one built image carries it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildId {
    raw: String,
    repository: String,
    version: String,
    year_text: String,
    month_text: String,
    day_text: String,
    year: u32,
    month: u32,
    day: u32,
    millis_of_day: u64,
}

impl BuildId {
    pub fn parse(input: &str) -> Result<Self, ParseBuildIdError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseBuildIdError::Empty);
        }

        // The tag follows the last colon; a colon before a slash is a registry port.
        let (repository, tag) = match input.rsplit_once(':') {
            Some((repository, tag)) if !tag.contains('/') && !repository.is_empty() => {
                (repository, tag)
            }
            _ => return Err(ParseBuildIdError::MissingTag(input.to_string())),
        };

        // Parse from the right so user versions may themselves contain hyphens.
        let mut fields = tag.rsplitn(5, '-');
        let (Some(millis), Some(day), Some(month), Some(year), Some(version)) = (
            fields.next(),
            fields.next(),
            fields.next(),
            fields.next(),
            fields.next(),
        ) else {
            return Err(ParseBuildIdError::MissingTimestamp(input.to_string()));
        };

        let numeric = |field: &'static str, text: &str| -> Result<u64, ParseBuildIdError> {
            if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
                return Err(ParseBuildIdError::InvalidField {
                    field,
                    input: input.to_string(),
                });
            }
            text.parse().map_err(|_| ParseBuildIdError::InvalidField {
                field,
                input: input.to_string(),
            })
        };

        let year_value = numeric("year", year)?;
        let month_value = numeric("month", month)?;
        let day_value = numeric("day", day)?;
        let millis_value = numeric("millis of day", millis)?;

        let narrow = |field: &'static str, value: u64| -> Result<u32, ParseBuildIdError> {
            u32::try_from(value).map_err(|_| ParseBuildIdError::InvalidField {
                field,
                input: input.to_string(),
            })
        };

        Ok(Self {
            raw: input.to_string(),
            repository: repository.to_string(),
            version: version.to_string(),
            year_text: year.to_string(),
            month_text: month.to_string(),
            day_text: day.to_string(),
            year: narrow("year", year_value)?,
            month: narrow("month", month_value)?,
            day: narrow("day", day_value)?,
            millis_of_day: millis_value,
        })
    }

    /// Repository part, e.g. `t1/a1`.
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// User-supplied version without the date/time suffix.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Everything after the last colon: `version-Y-M-D-millis`.
    pub fn tag(&self) -> &str {
        &self.raw[self.repository.len() + 1..]
    }

    pub fn date(&self) -> (u32, u32, u32) {
        (self.year, self.month, self.day)
    }

    pub fn millis_of_day(&self) -> u64 {
        self.millis_of_day
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    fn family(&self) -> String {
        format!("{}:{}", self.repository, self.version)
    }

    fn day_key(&self) -> String {
        format!(
            "{}:{}-{}-{}-{}",
            self.repository, self.version, self.year_text, self.month_text, self.day_text
        )
    }
}

impl fmt::Display for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Append `-Y-M-D-millisOfDay` to a user version. Fields are not zero padded.
pub fn make_version_tag(user_version: &str, at: NaiveDateTime) -> String {
    let millis = u64::from(at.num_seconds_from_midnight()) * 1000
        + u64::from((at.nanosecond() / 1_000_000).min(999));
    format!(
        "{}-{}-{}-{}-{}",
        user_version,
        at.year(),
        at.month(),
        at.day(),
        millis
    )
}

/// Image reference for a tenant's app at a version; an empty version means `latest`.
pub fn image_reference(tenant: &TenantName, app: &AppName, version: &str) -> String {
    if version.is_empty() {
        format!("{}/{}:latest", tenant, app)
    } else {
        format!("{}/{}:{}", tenant, app, version)
    }
}

/// Substring test against `tenant/app:version`.
pub fn matches_tuple(id: &str, tenant: &TenantName, app: &AppName, version: &str) -> bool {
    id.contains(&format!("{}/{}:{}", tenant, app, version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32, ms: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_milli_opt(h, min, s, ms)
            .unwrap()
    }

    #[test]
    fn version_tag_appends_unpadded_date_and_millis() {
        let tag = make_version_tag("1.0", at(2015, 7, 4, 0, 0, 1, 250));
        assert_eq!(tag, "1.0-2015-7-4-1250");
    }

    #[test]
    fn empty_version_references_latest() {
        let tenant = TenantName::new("t1").unwrap();
        let app = AppName::new("a1").unwrap();
        assert_eq!(image_reference(&tenant, &app, ""), "t1/a1:latest");
        assert_eq!(image_reference(&tenant, &app, "2.0"), "t1/a1:2.0");
    }

    #[test]
    fn parse_keeps_hyphenated_versions() {
        let id = BuildId::parse("t1/a1:1.0-rc1-2015-12-31-86399999").unwrap();
        assert_eq!(id.repository(), "t1/a1");
        assert_eq!(id.version(), "1.0-rc1");
        assert_eq!(id.date(), (2015, 12, 31));
        assert_eq!(id.millis_of_day(), 86_399_999);
    }

    #[test]
    fn stamped_empty_version_parses_with_empty_version() {
        let tag = make_version_tag("", at(2015, 3, 4, 10, 0, 0, 0));
        assert_eq!(tag, "-2015-3-4-36000000");

        let id = BuildId::parse(&format!("t1/a1:{}", tag)).unwrap();
        assert_eq!(id.version(), "");
        assert_eq!(id.tag(), tag);
    }

    #[test]
    fn zero_padded_fields_do_not_compare_equal() {
        let padded = BuildId::parse("t1/a1:1.0-2015-03-09-5").unwrap();
        let plain = BuildId::parse("t1/a1:1.0-2015-3-9-5").unwrap();

        for ordering in [BuildOrdering::Chronological, BuildOrdering::Lexicographic] {
            assert_ne!(ordering.compare(&padded, &plain), Ordering::Equal);
            assert_eq!(
                ordering.compare(&padded, &plain),
                ordering.compare(&plain, &padded).reverse()
            );
        }
    }

    #[test]
    fn parse_rejects_tagless_reference() {
        assert!(matches!(
            BuildId::parse("registry:5000/t1/a1"),
            Err(ParseBuildIdError::MissingTag(_))
        ));
    }
}
