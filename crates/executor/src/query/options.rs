//! Query options.
//!
//! [`QueryOptions`] is the typed form used internally. [`RawQueryOptions`]
//! is the caller-native form, with enum choices as strings and mutation
//! tokens as JSON objects; converting it runs the enum translation and the
//! mutation state translator, so every validation error surfaces before the
//! query is submitted.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use cbbridge_core::{Error, MutationState, ProfileMode, Result, ScanConsistency};

/// Typed query options.
///
/// Setting a `not_bounded` scan consistency together with a non-empty
/// `consistent_with` is allowed; both are forwarded and the engine decides.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions {
    /// `None` leaves the choice to the service
    pub scan_consistency: Option<ScanConsistency>,
    /// Mutations the query must observe
    pub consistent_with: MutationState,
    /// `None` means no profiling
    pub profile: Option<ProfileMode>,
    /// `None` uses the configured query timeout
    pub timeout: Option<Duration>,
    /// Whether the statement is one-off (not prepared)
    pub adhoc: bool,
    /// Generated when unset
    pub client_context_id: Option<String>,
    /// Reject statements that mutate data
    pub read_only: bool,
    /// Collect execution metrics
    pub metrics: bool,
    /// Allow full-text indexes to serve the query
    pub flex_index: bool,
    /// Maximum index parallelism
    pub max_parallelism: Option<u32>,
    /// Maximum index scan buffer
    pub scan_cap: Option<u32>,
    /// Maximum time to wait for an index to catch up
    pub scan_wait: Option<Duration>,
    /// Items read per batch
    pub pipeline_batch: Option<u32>,
    /// Maximum items buffered per request
    pub pipeline_cap: Option<u32>,
    /// Scope the statement runs against
    pub query_context: Option<String>,
    /// `$1`, `$2`, ... parameter values
    pub positional_parameters: Vec<JsonValue>,
    /// Named parameter values; a missing `$` is added
    pub named_parameters: BTreeMap<String, JsonValue>,
    /// Extra parameters passed through to the query service untouched
    pub raw: BTreeMap<String, JsonValue>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        QueryOptions {
            scan_consistency: None,
            consistent_with: MutationState::new(),
            profile: None,
            timeout: None,
            adhoc: true,
            client_context_id: None,
            read_only: false,
            metrics: false,
            flex_index: false,
            max_parallelism: None,
            scan_cap: None,
            scan_wait: None,
            pipeline_batch: None,
            pipeline_cap: None,
            query_context: None,
            positional_parameters: Vec::new(),
            named_parameters: BTreeMap::new(),
            raw: BTreeMap::new(),
        }
    }
}

impl QueryOptions {
    /// Options with every field at its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the scan consistency.
    pub fn scan_consistency(mut self, consistency: ScanConsistency) -> Self {
        self.scan_consistency = Some(consistency);
        self
    }

    /// Require consistency with the given mutations.
    pub fn consistent_with(mut self, state: MutationState) -> Self {
        self.consistent_with = state;
        self
    }

    /// Set the profile mode.
    pub fn profile(mut self, profile: ProfileMode) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Set the timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the client context id.
    pub fn client_context_id(mut self, id: impl Into<String>) -> Self {
        self.client_context_id = Some(id.into());
        self
    }

    /// Request execution metrics in the trailing metadata.
    pub fn metrics(mut self, enabled: bool) -> Self {
        self.metrics = enabled;
        self
    }

    /// Forbid the statement from modifying data.
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Append a positional parameter.
    pub fn positional_parameter(mut self, value: JsonValue) -> Self {
        self.positional_parameters.push(value);
        self
    }

    /// Set a named parameter. A leading `$` is added when missing.
    pub fn named_parameter(mut self, name: impl Into<String>, value: JsonValue) -> Self {
        self.named_parameters.insert(dollar_prefixed(name.into()), value);
        self
    }

    /// Set a raw pass-through parameter.
    pub fn raw(mut self, name: impl Into<String>, value: JsonValue) -> Self {
        self.raw.insert(name.into(), value);
        self
    }
}

pub(crate) fn dollar_prefixed(name: String) -> String {
    if name.starts_with('$') {
        name
    } else {
        format!("${}", name)
    }
}

/// Caller-native query options.
///
/// Enum choices are canonical strings and mutation tokens are JSON objects
/// with `partition_id`, `partition_uuid`, `sequence_number` and
/// `bucket_name`. Durations are in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawQueryOptions {
    /// `not_bounded` or `request_plus`
    #[serde(default)]
    pub scan_consistency: Option<String>,
    /// Mutation tokens as JSON objects
    #[serde(default)]
    pub consistent_with: Vec<JsonValue>,
    /// `off`, `phases` or `timings`
    #[serde(default)]
    pub profile: Option<String>,
    /// Timeout in milliseconds
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// Defaults to `true`
    #[serde(default)]
    pub adhoc: Option<bool>,
    /// Generated when unset
    #[serde(default)]
    pub client_context_id: Option<String>,
    /// Reject statements that mutate data
    #[serde(default)]
    pub read_only: Option<bool>,
    /// Collect execution metrics
    #[serde(default)]
    pub metrics: Option<bool>,
    /// Allow full-text indexes to serve the query
    #[serde(default)]
    pub flex_index: Option<bool>,
    /// Maximum index parallelism
    #[serde(default)]
    pub max_parallelism: Option<u32>,
    /// Maximum index scan buffer
    #[serde(default)]
    pub scan_cap: Option<u32>,
    /// Index wait in milliseconds
    #[serde(default)]
    pub scan_wait_ms: Option<u64>,
    /// Items read per batch
    #[serde(default)]
    pub pipeline_batch: Option<u32>,
    /// Maximum items buffered per request
    #[serde(default)]
    pub pipeline_cap: Option<u32>,
    /// Scope the statement runs against
    #[serde(default)]
    pub query_context: Option<String>,
    /// `$1`, `$2`, ... parameter values
    #[serde(default)]
    pub positional_parameters: Vec<JsonValue>,
    /// Named parameter values
    #[serde(default)]
    pub named_parameters: BTreeMap<String, JsonValue>,
    /// Extra parameters passed through untouched
    #[serde(default)]
    pub raw: BTreeMap<String, JsonValue>,
}

impl TryFrom<RawQueryOptions> for QueryOptions {
    type Error = Error;

    fn try_from(raw: RawQueryOptions) -> Result<Self> {
        let scan_consistency = raw
            .scan_consistency
            .as_deref()
            .map(ScanConsistency::parse)
            .transpose()?;
        let profile = raw.profile.as_deref().map(ProfileMode::parse).transpose()?;
        let consistent_with = MutationState::from_tokens(&raw.consistent_with)?;

        Ok(QueryOptions {
            scan_consistency,
            consistent_with,
            profile,
            timeout: raw.timeout_ms.map(Duration::from_millis),
            adhoc: raw.adhoc.unwrap_or(true),
            client_context_id: raw.client_context_id,
            read_only: raw.read_only.unwrap_or(false),
            metrics: raw.metrics.unwrap_or(false),
            flex_index: raw.flex_index.unwrap_or(false),
            max_parallelism: raw.max_parallelism,
            scan_cap: raw.scan_cap,
            scan_wait: raw.scan_wait_ms.map(Duration::from_millis),
            pipeline_batch: raw.pipeline_batch,
            pipeline_cap: raw.pipeline_cap,
            query_context: raw.query_context,
            positional_parameters: raw.positional_parameters,
            named_parameters: raw
                .named_parameters
                .into_iter()
                .map(|(k, v)| (dollar_prefixed(k), v))
                .collect(),
            raw: raw.raw,
        })
    }
}
