//! Release database model.
//!
//! A release packages a set of studies and is driven through the task
//! services. Its version is bumped exactly once, when publishing completes.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::FromRow;

use crate::engine::state::{Lifecycle, ReleaseState};
use crate::error::AppError;
use crate::ids;

/// Semantic version of a release, rendered `major.minor.patch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// The version a release is published under.
    ///
    /// A major bump resets minor and patch; a minor bump resets patch.
    /// Components saturate at `u32::MAX`.
    pub fn bump(self, is_major: bool) -> Self {
        if is_major {
            Self::new(self.major.saturating_add(1), 0, 0)
        } else {
            Self::new(self.major, self.minor.saturating_add(1), 0)
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        let [major, minor, patch] = parts.as_slice() else {
            return Err(format!("Invalid version: {}", s));
        };
        let parse = |part: &str| {
            part.parse::<u32>()
                .map_err(|_| format!("Invalid version: {}", s))
        };
        Ok(Self::new(parse(major)?, parse(minor)?, parse(patch)?))
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A release.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Release {
    /// Release ID (`RE_` prefix)
    pub id: String,

    /// The user who created the release
    pub author: String,

    /// Release name
    pub name: String,

    /// Release notes
    pub description: String,

    /// Current lifecycle state
    pub state: ReleaseState,

    /// Tags to group the release by, in insertion order
    pub tags: Vec<String>,

    /// Version the release carries; bumped on publish
    pub version: Version,

    /// Whether publishing bumps the major version
    pub is_major: bool,

    /// Study IDs in this release
    pub studies: Vec<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Release {
    /// Build a waiting release from a creation request. The request must
    /// already have been validated.
    pub fn from_request(request: NewRelease) -> Self {
        let mut studies = request.studies;
        studies.sort();
        studies.dedup();

        Self {
            id: ids::release_id(),
            author: request.author,
            name: request.name,
            description: request.description,
            state: ReleaseState::Waiting,
            tags: request.tags,
            version: request.version.unwrap_or_default(),
            is_major: request.is_major,
            studies,
            created_at: Utc::now(),
        }
    }
}

/// Request to create a release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRelease {
    /// Release name
    pub name: String,

    /// Release notes
    #[serde(default)]
    pub description: String,

    /// Creating user
    #[serde(default = "default_author")]
    pub author: String,

    /// Tags
    #[serde(default)]
    pub tags: Vec<String>,

    /// Study IDs
    pub studies: Vec<String>,

    /// Bump the major version on publish
    #[serde(default)]
    pub is_major: bool,

    /// Starting version (defaults to 0.0.0)
    #[serde(default)]
    pub version: Option<Version>,
}

fn default_author() -> String {
    "admin".to_string()
}

impl NewRelease {
    pub fn new(name: impl Into<String>, studies: Vec<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            author: default_author(),
            tags: Vec::new(),
            studies,
            is_major: false,
            version: None,
        }
    }

    /// Check the request before it is persisted.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("release name is required".into()));
        }
        if self.name.len() > 100 {
            return Err(AppError::Validation(
                "release name must be at most 100 characters".into(),
            ));
        }
        if self.description.len() > 500 {
            return Err(AppError::Validation(
                "release description must be at most 500 characters".into(),
            ));
        }
        if let Some(tag) = self.tags.iter().find(|t| t.len() > 50) {
            return Err(AppError::Validation(format!(
                "tag '{}' is longer than 50 characters",
                tag
            )));
        }
        if let Some(study) = self
            .studies
            .iter()
            .find(|s| !ids::is_valid(s, ids::STUDY_PREFIX))
        {
            return Err(AppError::Validation(format!(
                "{} is not a valid study id",
                study
            )));
        }
        Ok(())
    }
}

/// Filter for listing releases.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReleaseFilter {
    /// Only releases in one of these states
    #[serde(default)]
    pub states: Option<Vec<ReleaseState>>,

    /// Only releases containing this study
    #[serde(default)]
    pub study: Option<String>,

    /// Only releases carrying this tag
    #[serde(default)]
    pub tag: Option<String>,
}

impl ReleaseFilter {
    /// Releases that have not reached a terminal state.
    pub fn active() -> Self {
        Self {
            states: Some(
                ReleaseState::ALL
                    .into_iter()
                    .filter(|s| !s.is_terminal())
                    .collect(),
            ),
            ..Default::default()
        }
    }

    pub fn matches(&self, release: &Release) -> bool {
        if let Some(states) = &self.states {
            if !states.contains(&release.state) {
                return false;
            }
        }
        if let Some(study) = &self.study {
            if !release.studies.contains(study) {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !release.tags.contains(tag) {
                return false;
            }
        }
        true
    }

    pub(crate) fn state_names(&self) -> Option<Vec<String>> {
        self.states
            .as_ref()
            .map(|states| states.iter().map(|s| s.as_str().to_string()).collect())
    }
}

/// Row as stored in `coordinator.release`.
#[derive(Debug, Clone, FromRow)]
pub struct ReleaseRow {
    pub id: String,
    pub author: String,
    pub name: String,
    pub description: String,
    pub state: String,
    pub tags: Vec<String>,
    pub version: String,
    pub is_major: bool,
    pub studies: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ReleaseRow> for Release {
    type Error = AppError;

    fn try_from(row: ReleaseRow) -> Result<Self, Self::Error> {
        Ok(Self {
            state: row.state.parse().map_err(AppError::Internal)?,
            version: row.version.parse().map_err(AppError::Internal)?,
            id: row.id,
            author: row.author,
            name: row.name,
            description: row.description,
            tags: row.tags,
            is_major: row.is_major,
            studies: row.studies,
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_bump() {
        let v = Version::default();
        assert_eq!(v.bump(false), Version::new(0, 1, 0));
        assert_eq!(v.bump(true), Version::new(1, 0, 0));
        assert_eq!(Version::new(1, 4, 2).bump(false).to_string(), "1.5.0");
        assert_eq!(Version::new(1, 4, 2).bump(true).to_string(), "2.0.0");
    }

    #[test]
    fn test_version_bump_saturates() {
        let top = Version::new(u32::MAX, u32::MAX, 7);
        assert_eq!(top.bump(false), Version::new(u32::MAX, u32::MAX, 0));
        assert_eq!(top.bump(true), Version::new(u32::MAX, 0, 0));
    }

    #[test]
    fn test_version_parse() {
        assert_eq!("2.10.3".parse::<Version>(), Ok(Version::new(2, 10, 3)));
        assert!("2.10".parse::<Version>().is_err());
        assert!("a.b.c".parse::<Version>().is_err());
    }

    #[test]
    fn test_version_serializes_as_string() {
        let json = serde_json::to_value(Version::new(0, 1, 0)).unwrap();
        assert_eq!(json, serde_json::json!("0.1.0"));
        let back: Version = serde_json::from_value(json).unwrap();
        assert_eq!(back, Version::new(0, 1, 0));
    }

    #[test]
    fn test_new_release_validation() {
        let ok = NewRelease::new("Fall release", vec!["SD_ME0WME0W".into()]);
        assert!(ok.validate().is_ok());

        let bad_study = NewRelease::new("Fall release", vec!["SD_1".into()]);
        let err = bad_study.validate().unwrap_err();
        assert!(err.to_string().contains("SD_1 is not a valid study id"));

        let no_name = NewRelease::new("  ", vec![]);
        assert!(no_name.validate().is_err());
    }

    #[test]
    fn test_from_request_defaults() {
        let mut request = NewRelease::new(
            "Fall release",
            vec!["SD_BBBBBBBB".into(), "SD_AAAAAAAA".into(), "SD_AAAAAAAA".into()],
        );
        request.tags = vec!["fall".into(), "data".into()];
        let release = Release::from_request(request);

        assert_eq!(release.state, ReleaseState::Waiting);
        assert_eq!(release.version, Version::new(0, 0, 0));
        assert_eq!(release.author, "admin");
        assert_eq!(release.studies, vec!["SD_AAAAAAAA", "SD_BBBBBBBB"]);
        assert_eq!(release.tags, vec!["fall", "data"]);
        assert!(ids::is_valid(&release.id, ids::RELEASE_PREFIX));
    }

    #[test]
    fn test_filter_matches() {
        let release = Release::from_request(NewRelease::new(
            "r",
            vec!["SD_AAAAAAAA".into()],
        ));
        assert!(ReleaseFilter::active().matches(&release));
        let filter = ReleaseFilter {
            study: Some("SD_BBBBBBBB".into()),
            ..Default::default()
        };
        assert!(!filter.matches(&release));
    }
}
