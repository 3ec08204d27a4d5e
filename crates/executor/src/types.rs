//! Supporting types for management commands and outputs.
//!
//! These types are used in command parameters and output values.
//! All types are serializable so they can cross language boundaries.

use serde::{Deserialize, Serialize};

use cbbridge_core::{AnalyticsEncryptionLevel, AnalyticsLinkType};

// =============================================================================
// Datasets and Indexes
// =============================================================================

/// An analytics dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsDataset {
    /// Dataset name
    pub dataset_name: String,
    /// Dataverse holding the dataset
    pub dataverse_name: String,
    /// Link the dataset ingests through
    pub link_name: String,
    /// Source bucket
    pub bucket_name: String,
}

/// An analytics index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsIndex {
    /// Index name
    pub name: String,
    /// Dataset the index covers
    pub dataset_name: String,
    /// Dataverse of the dataset
    pub dataverse_name: String,
    /// Whether this is the primary index
    #[serde(default)]
    pub is_primary: bool,
}

// =============================================================================
// Links
// =============================================================================

/// Link to a remote cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouchbaseRemoteLink {
    /// Dataverse holding the link
    pub dataverse: String,
    /// Link name
    pub name: String,
    /// Remote cluster address
    pub hostname: String,
    /// Transport security level
    #[serde(default)]
    pub encryption: AnalyticsEncryptionLevel,
    /// Remote cluster CA certificate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<String>,
    /// Client certificate for certificate auth
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_certificate: Option<String>,
    /// Client key for certificate auth
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_key: Option<String>,
    /// Username for password auth
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Password for password auth
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// External link to an S3 bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3ExternalLink {
    /// Dataverse holding the link
    pub dataverse: String,
    /// Link name
    pub name: String,
    /// AWS access key id
    pub access_key_id: String,
    /// AWS secret access key
    pub secret_access_key: String,
    /// AWS region
    pub region: String,
    /// Temporary session token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
    /// Custom S3 endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_endpoint: Option<String>,
}

/// External link to Azure blob storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AzureBlobExternalLink {
    /// Dataverse holding the link
    pub dataverse: String,
    /// Link name
    pub name: String,
    /// Full connection string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<String>,
    /// Storage account name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
    /// Storage account key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_key: Option<String>,
    /// Shared access signature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_access_signature: Option<String>,
    /// Blob service endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_endpoint: Option<String>,
    /// Endpoint suffix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_suffix: Option<String>,
}

/// An analytics link of any type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AnalyticsLink {
    /// Remote Couchbase cluster
    #[serde(rename = "couchbase")]
    CouchbaseRemote(CouchbaseRemoteLink),
    /// Amazon S3
    #[serde(rename = "s3")]
    S3External(S3ExternalLink),
    /// Azure blob storage
    #[serde(rename = "azureblob")]
    AzureBlobExternal(AzureBlobExternalLink),
}

impl AnalyticsLink {
    /// Link type.
    pub fn link_type(&self) -> AnalyticsLinkType {
        match self {
            AnalyticsLink::CouchbaseRemote(_) => AnalyticsLinkType::CouchbaseRemote,
            AnalyticsLink::S3External(_) => AnalyticsLinkType::S3External,
            AnalyticsLink::AzureBlobExternal(_) => AnalyticsLinkType::AzureBlobExternal,
        }
    }

    /// Dataverse the link lives in.
    pub fn dataverse(&self) -> &str {
        match self {
            AnalyticsLink::CouchbaseRemote(l) => &l.dataverse,
            AnalyticsLink::S3External(l) => &l.dataverse,
            AnalyticsLink::AzureBlobExternal(l) => &l.dataverse,
        }
    }

    /// Link name.
    pub fn name(&self) -> &str {
        match self {
            AnalyticsLink::CouchbaseRemote(l) => &l.name,
            AnalyticsLink::S3External(l) => &l.name,
            AnalyticsLink::AzureBlobExternal(l) => &l.name,
        }
    }

    /// Check that the link carries everything its type requires.
    ///
    /// Returns a reason string on failure.
    pub fn validate(&self) -> Result<(), String> {
        require("dataverse", self.dataverse())?;
        require("name", self.name())?;
        match self {
            AnalyticsLink::CouchbaseRemote(l) => {
                require("hostname", &l.hostname)?;
                let has_password = present(&l.username) && present(&l.password);
                match l.encryption {
                    AnalyticsEncryptionLevel::None | AnalyticsEncryptionLevel::Half => {
                        if !has_password {
                            return Err(format!(
                                "encryption level `{}` requires username and password",
                                l.encryption
                            ));
                        }
                    }
                    AnalyticsEncryptionLevel::Full => {
                        if !present(&l.certificate) {
                            return Err("encryption level `full` requires a certificate".into());
                        }
                        let has_client_cert =
                            present(&l.client_certificate) && present(&l.client_key);
                        if has_password == has_client_cert {
                            return Err("encryption level `full` requires either username and password or client certificate and key".into());
                        }
                    }
                }
                Ok(())
            }
            AnalyticsLink::S3External(l) => {
                require("access_key_id", &l.access_key_id)?;
                require("secret_access_key", &l.secret_access_key)?;
                require("region", &l.region)
            }
            AnalyticsLink::AzureBlobExternal(l) => {
                if present(&l.connection_string) {
                    return Ok(());
                }
                if present(&l.account_name)
                    && (present(&l.account_key) || present(&l.shared_access_signature))
                {
                    return Ok(());
                }
                Err("azure blob link requires a connection string, or an account name with an account key or shared access signature".into())
            }
        }
    }
}

fn require(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("`{}` must not be empty", field))
    } else {
        Ok(())
    }
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().map_or(false, |v| !v.is_empty())
}
