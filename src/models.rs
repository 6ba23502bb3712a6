//! Data models for Google Analytics and Google Drive API responses.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// An unsampled report as returned by the Management API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRecord {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub download_type: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default)]
    pub self_link: Option<String>,
    #[serde(default)]
    pub drive_download_details: Option<DriveDownloadDetails>,
    #[serde(default)]
    pub cloud_storage_download_details: Option<CloudStorageDownloadDetails>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveDownloadDetails {
    pub document_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudStorageDownloadDetails {
    pub bucket_id: Option<String>,
    pub object_id: Option<String>,
}

/// Where the finished report content is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalStorageRef {
    Drive { document_id: String },
    CloudStorage { bucket_id: String, object_id: String },
}

impl ReportRecord {
    pub fn external_storage(&self) -> Option<ExternalStorageRef> {
        if let Some(document_id) = self
            .drive_download_details
            .as_ref()
            .and_then(|d| d.document_id.clone())
        {
            return Some(ExternalStorageRef::Drive { document_id });
        }

        let cloud = self.cloud_storage_download_details.as_ref()?;
        match (&cloud.bucket_id, &cloud.object_id) {
            (Some(bucket_id), Some(object_id)) => Some(ExternalStorageRef::CloudStorage {
                bucket_id: bucket_id.clone(),
                object_id: object_id.clone(),
            }),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReportRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            ">> [ {} ] => {} / {} / {} / {}",
            self.id,
            self.title.as_deref().unwrap_or("-"),
            self.status.as_deref().unwrap_or("-"),
            self.created.as_deref().unwrap_or("-"),
            self.updated.as_deref().unwrap_or("-"),
        )
    }
}

/// An account, web property or view (profile).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyEntry {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A page of a Management API collection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", bound = "T: DeserializeOwned")]
pub struct ItemList<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total_results: Option<u64>,
}

/// Raw Core Reporting API response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GaDataResponse {
    #[serde(default)]
    pub profile_info: Option<ProfileInfo>,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileInfo {
    #[serde(default)]
    pub profile_name: Option<String>,
}

/// Metric query result for one view.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionsSummary {
    pub profile_name: String,
    pub rows: Vec<Vec<f64>>,
}

/// Metadata for a file in Google Drive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default, deserialize_with = "deserialize_size")]
    pub size: Option<u64>,
}

fn deserialize_size<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt {
        Some(s) => s.parse::<u64>().map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

impl std::fmt::Display for FileDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let size_str = self
            .size
            .map(format_size)
            .unwrap_or_else(|| "-".to_string());
        write!(f, "{}\t{}\t{}\t{}", self.id, size_str, self.mime_type, self.name)
    }
}

/// Format bytes into human-readable size.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Response from the Drive files.list endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileListResponse {
    #[serde(default)]
    pub files: Vec<FileDescriptor>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Google API error response.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    pub code: u16,
    pub message: String,
}

/// Discovery document, reduced to what is needed to address the API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryDocument {
    pub root_url: String,
    pub service_path: String,
}

/// Discovery directory listing.
#[derive(Debug, Deserialize)]
pub struct DiscoveryDirectory {
    #[serde(default)]
    pub items: Vec<DiscoveryDirectoryItem>,
}

#[derive(Debug, Deserialize)]
pub struct DiscoveryDirectoryItem {
    pub name: String,
    pub version: String,
}

/// Service account key file.
#[derive(Debug, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(default)]
    pub client_email: Option<String>,
    pub private_key: String,
    #[serde(default)]
    pub token_uri: Option<String>,
}

/// OAuth client secret file for installed applications.
#[derive(Debug, Deserialize)]
pub struct ClientSecretFile {
    #[serde(alias = "web")]
    pub installed: InstalledApp,
}

#[derive(Debug, Deserialize)]
pub struct InstalledApp {
    pub client_id: String,
    pub client_secret: String,
    pub auth_uri: String,
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

/// OAuth2 token response.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// OAuth2 token endpoint error.
#[derive(Debug, Deserialize)]
pub struct TokenErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}
