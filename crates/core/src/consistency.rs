//! Canonical string enums.
//!
//! Every enum here has a fixed, case-sensitive canonical string per variant.
//! Translation is total in the enum → string direction and validated in the
//! string → enum direction, so `parse(as_str(e)) == e` and
//! `as_str(parse(s)) == s` hold for every variant and every valid string.
//!
//! | Enum | Canonical strings |
//! |------|-------------------|
//! | [`ScanConsistency`] | `not_bounded`, `request_plus` |
//! | [`ProfileMode`] | `off`, `phases`, `timings` |
//! | [`QueryStatus`] | `running`, `success`, `errors`, `completed`, `stopped`, `timeout`, `closed`, `fatal`, `aborted`, `unknown` |
//! | [`AnalyticsLinkType`] | `couchbase`, `s3`, `azureblob` |
//! | [`AnalyticsEncryptionLevel`] | `none`, `half`, `full` |

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

macro_rules! canonical_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[ $( $name::$variant ),+ ];

            /// Name used in error messages.
            pub const KIND: &'static str = $kind;

            /// Canonical string form.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }

            /// Parse the canonical string form.
            ///
            /// # Errors
            ///
            /// Returns [`Error::InvalidEnumString`] carrying the offending
            /// string if it is not exactly one of the canonical strings.
            pub fn parse(s: &str) -> Result<Self> {
                match s {
                    $( $text => Ok($name::$variant), )+
                    other => Err(Error::InvalidEnumString {
                        kind: $kind.to_string(),
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                $name::parse(s)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                $name::parse(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

canonical_enum! {
    /// Scan consistency requested for a query.
    ///
    /// `NotBounded` returns whatever the index currently holds; `RequestPlus`
    /// waits for the index to catch up with every mutation made before the
    /// request.
    ScanConsistency, "scan consistency" {
        /// No consistency constraint
        NotBounded => "not_bounded",
        /// Wait for all prior mutations to be indexed
        RequestPlus => "request_plus",
    }
}

impl Default for ScanConsistency {
    fn default() -> Self {
        ScanConsistency::NotBounded
    }
}

canonical_enum! {
    /// Profiling detail the query service attaches to the trailing metadata.
    ProfileMode, "profile mode" {
        /// No profiling information
        Off => "off",
        /// Per-phase timing summary
        Phases => "phases",
        /// Full operator timings
        Timings => "timings",
    }
}

impl Default for ProfileMode {
    fn default() -> Self {
        ProfileMode::Off
    }
}

canonical_enum! {
    /// Final status the query service reports in the trailing metadata.
    QueryStatus, "query status" {
        /// Still executing
        Running => "running",
        /// Completed without errors
        Success => "success",
        /// Completed with errors
        Errors => "errors",
        /// Completed
        Completed => "completed",
        /// Stopped by the client
        Stopped => "stopped",
        /// Timed out server side
        Timeout => "timeout",
        /// Connection closed
        Closed => "closed",
        /// Fatal server error
        Fatal => "fatal",
        /// Aborted
        Aborted => "aborted",
        /// Status string not recognised
        Unknown => "unknown",
    }
}

impl QueryStatus {
    /// Translate an engine-reported status.
    ///
    /// Unlike [`QueryStatus::parse`] this never fails: the string comes from
    /// the server, so anything unrecognised becomes [`QueryStatus::Unknown`].
    pub fn from_engine(s: &str) -> Self {
        QueryStatus::parse(s).unwrap_or(QueryStatus::Unknown)
    }
}

canonical_enum! {
    /// Kind of analytics link.
    AnalyticsLinkType, "analytics link" {
        /// Link to a remote cluster
        CouchbaseRemote => "couchbase",
        /// External link to an S3 bucket
        S3External => "s3",
        /// External link to Azure blob storage
        AzureBlobExternal => "azureblob",
    }
}

canonical_enum! {
    /// Encryption used by a remote couchbase link.
    AnalyticsEncryptionLevel, "analytics encryption level" {
        /// Plain connection
        None => "none",
        /// Credentials encrypted, data in the clear
        Half => "half",
        /// TLS for everything
        Full => "full",
    }
}

impl Default for AnalyticsEncryptionLevel {
    fn default() -> Self {
        AnalyticsEncryptionLevel::None
    }
}
