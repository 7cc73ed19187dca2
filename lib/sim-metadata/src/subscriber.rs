//! Subscriber resource model.

use std::collections::HashMap;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of the calling subscriber, as returned by the metadata service.
///
/// Every read or update returns a fresh snapshot; nothing is cached or shared
/// between calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    /// Throughput tier, e.g. `s1.standard`.
    pub speed_class: String,
    /// Whether the subscriber can be terminated.
    pub termination_enabled: bool,
    /// Expiry time, at millisecond precision. `None` when no expiry is set.
    #[serde(default, with = "epoch_millis", skip_serializing_if = "Option::is_none")]
    pub expired_at: Option<DateTime<Utc>>,
    /// Group the subscriber belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    /// User defined tags, by name.
    #[serde(default)]
    pub tags: HashMap<String, String>,

    /// IMSI of the SIM.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imsi: Option<String>,
    /// MSISDN of the SIM.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msisdn: Option<String>,
    /// IP address of the current session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Access point name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apn: Option<String>,
    /// Lifecycle status (`active`, `inactive`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// SIM form factor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_type: Option<String>,
    /// Billing plan identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<u32>,
    /// Owning operator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator_id: Option<String>,
    /// Creation time.
    #[serde(default, with = "epoch_millis", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last modification time.
    #[serde(default, with = "epoch_millis", skip_serializing_if = "Option::is_none")]
    pub last_modified_at: Option<DateTime<Utc>>,
}

impl Subscriber {
    /// Creates a snapshot with only the mutable attributes set.
    #[must_use]
    pub fn new(speed_class: impl Into<String>) -> Self {
        Self {
            speed_class: speed_class.into(),
            termination_enabled: false,
            expired_at: None,
            group_id: None,
            tags: HashMap::new(),
            imsi: None,
            msisdn: None,
            ip_address: None,
            apn: None,
            status: None,
            module_type: None,
            plan: None,
            operator_id: None,
            created_at: None,
            last_modified_at: None,
        }
    }

    /// Value of the tag `name`, if present.
    #[must_use]
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags.get(name).map(String::as_str)
    }
}

/// A tag name/value pair, as sent to the service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    /// Tag name; any Unicode text.
    pub tag_name: String,
    /// Tag value.
    pub tag_value: String,
}

impl Tag {
    /// Creates a tag.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            tag_name: name.into(),
            tag_value: value.into(),
        }
    }
}

impl<N: Into<String>, V: Into<String>> From<(N, V)> for Tag {
    fn from((name, value): (N, V)) -> Self {
        Self::new(name, value)
    }
}

/// Drops sub-millisecond precision, which the service does not keep.
#[must_use]
pub fn truncate_to_millis(time: DateTime<Utc>) -> DateTime<Utc> {
    time.trunc_subsecs(3)
}

/// Optional timestamps: epoch milliseconds on the wire, RFC 3339 accepted on input.
pub(crate) mod epoch_millis {
    use chrono::{DateTime, Utc};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        Millis(i64),
        Text(String),
    }

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(time) => serializer.serialize_some(&time.timestamp_millis()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<Wire>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Wire::Millis(millis)) => DateTime::from_timestamp_millis(millis)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {millis}"))),
            Some(Wire::Text(text)) => DateTime::parse_from_rfc3339(&text)
                .map(|time| Some(time.with_timezone(&Utc)))
                .map_err(D::Error::custom),
        }
    }
}
