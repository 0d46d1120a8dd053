use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// The `{id, name}` shape shared by invigilators and venues.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct NamedRecord {
    pub id: i64,
    pub name: String,
}

#[derive(Serialize)]
pub(crate) struct NamePayload<'a> {
    pub name: &'a str,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Invigilators,
    Venues,
}

impl ResourceKind {
    pub const ALL: [Self; 2] = [Self::Invigilators, Self::Venues];

    /// Path segment below `/api/` on the reference data backend.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Invigilators => "invigilators",
            Self::Venues => "venues",
        }
    }

    #[must_use]
    pub const fn singular(self) -> &'static str {
        match self {
            Self::Invigilators => "invigilator",
            Self::Venues => "venue",
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Invigilators => "Invigilators",
            Self::Venues => "Venues",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unknown resource kind {0:?}")]
pub struct UnknownResourceKind(pub String);

impl FromStr for ResourceKind {
    type Err = UnknownResourceKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "invigilators" => Ok(Self::Invigilators),
            "venues" => Ok(Self::Venues),
            other => Err(UnknownResourceKind(other.to_owned())),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ErrorMessage {
    pub msg: String,
}

/// `{ "detail": [{ "msg": "..." }] }`, the error shape used by the proxy and the
/// scheduling backend.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ErrorBody {
    pub detail: Vec<ErrorMessage>,
}

impl ErrorBody {
    pub fn message(msg: impl Into<String>) -> Self {
        Self {
            detail: vec![ErrorMessage { msg: msg.into() }],
        }
    }
}

/// `detail[0].msg` of an arbitrary JSON error body, if it has that shape.
#[must_use]
pub fn first_message(body: &serde_json::Value) -> Option<&str> {
    body.get("detail")?.get(0)?.get("msg")?.as_str()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn resource_kind_round_trips_through_path() {
        for kind in ResourceKind::ALL {
            assert_eq!(kind.path().parse::<ResourceKind>(), Ok(kind));
        }
        assert_eq!(
            "exams".parse::<ResourceKind>(),
            Err(UnknownResourceKind("exams".to_owned()))
        );
    }

    #[test]
    fn error_body_serializes_to_detail_list() {
        let body = serde_json::to_value(ErrorBody::message("DOCX file is required")).unwrap();
        assert_eq!(body, json!({ "detail": [{ "msg": "DOCX file is required" }] }));
    }

    #[test]
    fn first_message_requires_expected_shape() {
        assert_eq!(
            first_message(&json!({ "detail": [{ "msg": "bad sheet" }, { "msg": "other" }] })),
            Some("bad sheet")
        );
        assert_eq!(first_message(&json!({ "detail": [] })), None);
        assert_eq!(first_message(&json!({ "detail": "nope" })), None);
        assert_eq!(first_message(&json!({ "error": "x" })), None);
        assert_eq!(first_message(&json!([1, 2])), None);
    }
}
