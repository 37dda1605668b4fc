//! JSON request and response shapes.
//!
//! Two presentations of the same [`UpdateCheck`]: the legacy device protocol
//! and the versioned API. Both are pure conversions; no decision is made
//! here.

use serde::{Deserialize, Serialize};

use ota_attest_core::{Attestation, ChecksumValidation};

use crate::engine::{AvailableUpdate, UpdateCheck};

/// Message sent with a legacy `device-not-found` response.
pub const DEVICE_NOT_FOUND_MESSAGE: &str = "Current build ID not found";

/// Message sent with an API `build-not-found` response.
pub const BUILD_NOT_FOUND_MESSAGE: &str = "Build ID not found";

/// Update check request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckUpdateRequest {
    /// Reported by legacy devices, not used for the decision.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    pub build_id: String,
}

/// Checksum validation request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateChecksumRequest {
    pub build_id: String,
    pub checksum: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Update check
// ─────────────────────────────────────────────────────────────────────────────

/// Legacy update check response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum LegacyCheckResponse {
    UpdateAvailable {
        version: String,
        build_id: String,
        url: String,
        checksum: String,
        signature: String,
    },
    UpToDate,
    DeviceNotFound { message: String },
}

impl From<UpdateCheck> for LegacyCheckResponse {
    fn from(check: UpdateCheck) -> Self {
        match check {
            UpdateCheck::Available(AvailableUpdate {
                build,
                package,
                package_url,
            }) => LegacyCheckResponse::UpdateAvailable {
                version: build.version,
                build_id: build.build_id.into_string(),
                url: package_url,
                checksum: package.checksum.to_hex(),
                signature: package.signature.to_hex(),
            },
            UpdateCheck::UpToDate => LegacyCheckResponse::UpToDate,
            UpdateCheck::UnknownBuild => LegacyCheckResponse::DeviceNotFound {
                message: DEVICE_NOT_FOUND_MESSAGE.to_string(),
            },
        }
    }
}

/// Versioned API update check response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum ApiCheckResponse {
    UpdateAvailable {
        build_id: String,
        version: String,
        package_url: String,
        checksum: String,
        signature: String,
        patch_notes: String,
    },
    UpToDate,
    BuildNotFound { message: String },
}

impl From<UpdateCheck> for ApiCheckResponse {
    fn from(check: UpdateCheck) -> Self {
        match check {
            UpdateCheck::Available(AvailableUpdate {
                build,
                package,
                package_url,
            }) => ApiCheckResponse::UpdateAvailable {
                build_id: build.build_id.into_string(),
                version: build.version,
                package_url,
                checksum: package.checksum.to_hex(),
                signature: package.signature.to_hex(),
                patch_notes: package.patch_notes,
            },
            UpdateCheck::UpToDate => ApiCheckResponse::UpToDate,
            UpdateCheck::UnknownBuild => ApiCheckResponse::BuildNotFound {
                message: BUILD_NOT_FOUND_MESSAGE.to_string(),
            },
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Checksum validation
// ─────────────────────────────────────────────────────────────────────────────

/// Checksum validation response.
///
/// `{"build_id": ..., "valid": bool}` for a known build with a package,
/// otherwise `{"status": "build-not-found", "message": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValidateChecksumResponse {
    Checked { build_id: String, valid: bool },
    NotFound(BuildNotFound),
}

impl ValidateChecksumResponse {
    pub fn new(build_id: impl Into<String>, result: ChecksumValidation) -> Self {
        let build_id = build_id.into();
        match result {
            ChecksumValidation::Valid => Self::Checked { build_id, valid: true },
            ChecksumValidation::Invalid => Self::Checked { build_id, valid: false },
            ChecksumValidation::NotFound => Self::NotFound(BuildNotFound::default()),
        }
    }
}

/// `{"status": "build-not-found", "message": ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename = "build-not-found")]
pub struct BuildNotFound {
    pub message: String,
}

impl Default for BuildNotFound {
    fn default() -> Self {
        Self {
            message: BUILD_NOT_FOUND_MESSAGE.to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Artifact attestation
// ─────────────────────────────────────────────────────────────────────────────

/// Response for attesting a named artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactChecksumResponse {
    pub filename: String,
    pub checksum: String,
    pub signature: String,
}

impl ArtifactChecksumResponse {
    pub fn new(filename: impl Into<String>, attestation: &Attestation) -> Self {
        Self {
            filename: filename.into(),
            checksum: attestation.checksum.to_hex(),
            signature: attestation.signature.to_hex(),
        }
    }
}
