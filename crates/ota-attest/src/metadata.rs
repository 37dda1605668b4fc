//! Legacy `metadata.json` import and export.
//!
//! The legacy format is a JSON object keyed by build id:
//!
//! ```json
//! {
//!   "build-1001": {
//!     "version": "1.0.1",
//!     "filename": "ota-build-1001.zip",
//!     "release_date": "2024-01-15",
//!     "timestamp": "2024-01-15T10:30:00",
//!     "package_url": "/packages/ota-build-1001.zip",
//!     "checksum": "…",
//!     "patch_notes": "…"
//!   }
//! }
//! ```
//!
//! Every field but `version` may be missing. Import fills the gaps, attests
//! each artifact found in the artifact store and stores the rest as bare
//! builds.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use ota_attest_core::{Build, BuildId, Checksum, Release};
use ota_attest_store::{ArtifactStore, Store, StoreError};

use crate::engine::{Engine, NewRelease};
use crate::error::{EngineError, Result};

/// Fields a fully migrated entry carries besides `version`.
pub const FILLED_FIELDS: [&str; 4] = ["timestamp", "package_url", "checksum", "patch_notes"];

/// One build in the legacy file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl LegacyEntry {
    /// Version string, `unknown` when absent.
    pub fn version(&self) -> &str {
        self.version.as_deref().unwrap_or("unknown")
    }

    /// Artifact file name, `ota-{build_id}.zip` when absent.
    pub fn filename(&self, build_id: &str) -> String {
        match &self.filename {
            Some(f) if !f.is_empty() => f.clone(),
            _ => default_filename(build_id),
        }
    }

    /// Patch notes, `Update to version {version}` when absent.
    pub fn patch_notes(&self) -> String {
        match &self.patch_notes {
            Some(n) => n.clone(),
            None => format!("Update to version {}", self.version()),
        }
    }

    /// Ordering key in Unix milliseconds.
    ///
    /// `timestamp` wins over `release_date`; `now` is used only when neither
    /// is present. A present but unparseable date is an error.
    pub fn created_at(&self, now: i64) -> std::result::Result<i64, String> {
        if let Some(ts) = &self.timestamp {
            return parse_timestamp(ts).ok_or_else(|| format!("unparseable timestamp {:?}", ts));
        }
        if let Some(date) = &self.release_date {
            return parse_release_date(date)
                .ok_or_else(|| format!("unparseable release_date {:?}", date));
        }
        Ok(now)
    }

    /// Which of [`FILLED_FIELDS`] an import would fill in.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let present = [
            self.timestamp.is_some(),
            self.package_url.is_some(),
            self.checksum.is_some(),
            self.patch_notes.is_some(),
        ];
        FILLED_FIELDS
            .iter()
            .zip(present)
            .filter(|(_, p)| !p)
            .map(|(f, _)| *f)
            .collect()
    }
}

/// A parsed legacy file, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyMetadata {
    pub entries: Vec<(String, LegacyEntry)>,
}

impl LegacyMetadata {
    /// Parse a legacy document.
    pub fn parse(text: &str) -> Result<Self> {
        let map: Map<String, Value> =
            serde_json::from_str(text).map_err(|e| EngineError::Metadata(e.to_string()))?;

        let mut entries = Vec::with_capacity(map.len());
        for (build_id, value) in map {
            let entry: LegacyEntry = serde_json::from_value(value)
                .map_err(|e| EngineError::Metadata(format!("{}: {}", build_id, e)))?;
            entries.push((build_id, entry));
        }
        Ok(Self { entries })
    }

    /// Render as a pretty-printed legacy document.
    pub fn to_json_pretty(&self) -> Result<String> {
        let mut map = Map::new();
        for (build_id, entry) in &self.entries {
            let value =
                serde_json::to_value(entry).map_err(|e| EngineError::Metadata(e.to_string()))?;
            map.insert(build_id.clone(), value);
        }
        serde_json::to_string_pretty(&Value::Object(map))
            .map_err(|e| EngineError::Metadata(e.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// What an import would do to one build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewEntry {
    pub build_id: String,
    pub current_fields: Vec<String>,
    pub will_add: Vec<&'static str>,
}

/// Describe the fields an import would fill, without touching anything.
pub fn preview(metadata: &LegacyMetadata) -> Vec<PreviewEntry> {
    metadata
        .entries
        .iter()
        .map(|(build_id, entry)| PreviewEntry {
            build_id: build_id.clone(),
            current_fields: present_fields(entry),
            will_add: entry.missing_fields(),
        })
        .collect()
}

fn present_fields(entry: &LegacyEntry) -> Vec<String> {
    match serde_json::to_value(entry) {
        Ok(Value::Object(map)) => map.keys().cloned().collect(),
        _ => Vec::new(),
    }
}

/// Outcome of an import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Builds registered with an attested package.
    pub registered: Vec<String>,
    /// Builds stored without a package because the artifact was missing.
    pub bare: Vec<String>,
    /// Entries not imported, with the reason.
    pub skipped: Vec<(String, String)>,
    /// Non-fatal findings.
    pub warnings: Vec<String>,
}

impl<S: Store, A: ArtifactStore> Engine<S, A> {
    /// Import a legacy document.
    ///
    /// `now` (Unix milliseconds) orders entries that carry no date.
    pub async fn import_metadata(&self, metadata: &LegacyMetadata, now: i64) -> Result<ImportReport> {
        let mut report = ImportReport::default();

        for (raw_id, entry) in &metadata.entries {
            let build_id = match BuildId::new(raw_id.as_str()) {
                Ok(id) => id,
                Err(e) => {
                    report.skipped.push((raw_id.clone(), e.to_string()));
                    continue;
                }
            };
            let created_at = match entry.created_at(now) {
                Ok(t) => t,
                Err(reason) => {
                    tracing::warn!(build_id = %build_id, %reason, "skipping legacy entry");
                    report.skipped.push((raw_id.clone(), reason));
                    continue;
                }
            };

            let filename = entry.filename(raw_id);
            let found = match self.artifacts().has_artifact(&filename).await {
                Ok(found) => found,
                Err(StoreError::InvalidArtifactRef(r)) => {
                    tracing::warn!(build_id = %build_id, artifact = %r, "skipping legacy entry");
                    report
                        .skipped
                        .push((raw_id.clone(), format!("invalid artifact reference {:?}", r)));
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            if !found {
                // A registered package is only replaced by a readable artifact.
                let existing = self.get_build(raw_id).await?;
                if existing.is_some_and(|r| r.package.is_some()) {
                    tracing::warn!(build_id = %build_id, artifact = %filename, "keeping registered package");
                    report.skipped.push((
                        raw_id.clone(),
                        format!("package file {} not found; registered package kept", filename),
                    ));
                    continue;
                }

                let message = format!("package file {} not found for build {}", filename, raw_id);
                tracing::warn!(build_id = %build_id, artifact = %filename, "importing bare build");
                self.put_bare_build(Build::new(build_id, entry.version(), created_at))
                    .await?;
                report.warnings.push(message);
                report.bare.push(raw_id.clone());
                continue;
            }

            let release = self
                .register(NewRelease {
                    build_id,
                    version: entry.version().to_string(),
                    created_at,
                    artifact_ref: filename,
                    patch_notes: entry.patch_notes(),
                })
                .await?;

            if let (Some(old), Some(package)) = (&entry.checksum, &release.package) {
                if !old.is_empty() && Checksum::from_hex(old.trim()).ok() != Some(package.checksum) {
                    report
                        .warnings
                        .push(format!("checksum for build {} changed on import", raw_id));
                }
            }
            report.registered.push(raw_id.clone());
        }

        tracing::info!(
            registered = report.registered.len(),
            bare = report.bare.len(),
            skipped = report.skipped.len(),
            "legacy metadata imported"
        );
        Ok(report)
    }

    /// Render the ledger as a legacy document, in ledger order.
    pub async fn export_metadata(&self) -> Result<LegacyMetadata> {
        let ledger = self.ledger().await?;
        let entries = ledger
            .iter()
            .map(|release| {
                (
                    release.build.build_id.as_str().to_string(),
                    self.export_entry(release),
                )
            })
            .collect();
        Ok(LegacyMetadata { entries })
    }

    fn export_entry(&self, release: &Release) -> LegacyEntry {
        let when = DateTime::<Utc>::from_timestamp_millis(release.build.created_at);
        let mut entry = LegacyEntry {
            version: Some(release.build.version.clone()),
            release_date: when.map(|t| t.format("%Y-%m-%d").to_string()),
            timestamp: when.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ..LegacyEntry::default()
        };
        if let Some(package) = &release.package {
            entry.filename = Some(package.artifact_ref.clone());
            entry.package_url = Some(self.config().package_url(&package.artifact_ref));
            entry.checksum = Some(package.checksum.to_hex());
            entry.signature = Some(package.signature.to_hex());
            entry.patch_notes = Some(package.patch_notes.clone());
        }
        entry
    }
}

/// `ota-{build_id}.zip`
pub fn default_filename(build_id: &str) -> String {
    format!("ota-{}.zip", build_id)
}

/// Parse an RFC 3339 timestamp, a zone-less ISO-8601 timestamp (taken as
/// UTC) or a `YYYY-MM-DD` date into Unix milliseconds.
pub fn parse_date(s: &str) -> Option<i64> {
    parse_timestamp(s).or_else(|| parse_release_date(s))
}

fn parse_timestamp(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.timestamp_millis());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|t| t.and_utc().timestamp_millis())
}

fn parse_release_date(s: &str) -> Option<i64> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .ok()?
        .and_hms_opt(0, 0, 0)
        .map(|t| t.and_utc().timestamp_millis())
}
