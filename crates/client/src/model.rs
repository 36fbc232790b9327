use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ClientError, Operation};

// ---------------------------------------------------------------------------
// Wire types (list response)
// ---------------------------------------------------------------------------

/// One page of `GET /records`.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordPage {
    pub records: Vec<RawRecord>,
    pub meta: PageMeta,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageMeta {
    pub has_more: bool,
    #[serde(default)]
    pub after_cursor: Option<String>,
    #[serde(default)]
    pub before_cursor: Option<String>,
}

/// A list entry as the server sends it.
///
/// Only the fields below are read; anything else the server includes
/// (timestamps, source, user segment) is ignored. Entries of unrelated record
/// types share the endpoint, so only `id` and `type` are required here.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(rename = "type")]
    pub record_type: TypeRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypeRef {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Ids arrive as strings from this API, but numeric ids are accepted too.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Str(String),
        Num(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Str(s) => s,
        Id::Num(n) => n.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Domain types
// ---------------------------------------------------------------------------

/// A remote record of the managed type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteRecord {
    pub id: String,
    pub external_id: String,
    pub title: String,
    pub body: String,
    pub url: String,
    pub type_id: String,
}

impl TryFrom<RawRecord> for RemoteRecord {
    type Error = ClientError;

    fn try_from(raw: RawRecord) -> Result<Self, Self::Error> {
        let external_id = raw.external_id.ok_or_else(|| ClientError::Decode {
            operation: Operation::List,
            message: format!("record {} has no external_id", raw.id),
        })?;

        Ok(Self {
            id: raw.id,
            external_id,
            title: raw.title.unwrap_or_default(),
            body: raw.body.unwrap_or_default(),
            url: raw.url.unwrap_or_default(),
            type_id: raw.record_type.id,
        })
    }
}

/// Body of a create or update call, sent as `{"record": payload}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordPayload {
    pub external_id: String,
    pub url: String,
    pub title: String,
    pub body: String,
    pub type_id: String,
    pub source_id: String,
    pub locale: String,
    /// Always sent; `null` makes the record visible to everyone.
    pub user_segment_id: Option<String>,
}

#[derive(Serialize)]
pub(crate) struct RecordEnvelope<'a> {
    pub record: &'a RecordPayload,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_ignores_unknown_keys() {
        let json = serde_json::json!({
            "records": [{
                "id": "01HX",
                "external_id": "abc",
                "title": "T",
                "body": "B",
                "url": "https://x.test/a.html",
                "locale": "en-us",
                "created_at": "2024-01-01T00:00:00Z",
                "source": {"id": "S1", "name": "Docs"},
                "type": {"id": "T1", "name": "Article"}
            }],
            "meta": {"has_more": false, "after_cursor": null, "before_cursor": null},
            "links": {"next": null}
        });

        let page: RecordPage = serde_json::from_value(json).unwrap();
        assert_eq!(page.records.len(), 1);
        assert!(!page.meta.has_more);

        let record = RemoteRecord::try_from(page.records[0].clone()).unwrap();
        assert_eq!(record.id, "01HX");
        assert_eq!(record.external_id, "abc");
        assert_eq!(record.type_id, "T1");
    }

    #[test]
    fn test_numeric_ids_are_accepted() {
        let raw: RawRecord = serde_json::from_value(serde_json::json!({
            "id": 42,
            "external_id": "x",
            "type": {"id": 7}
        }))
        .unwrap();
        assert_eq!(raw.id, "42");
        assert_eq!(raw.record_type.id, "7");
    }

    #[test]
    fn test_missing_type_is_rejected() {
        let result: Result<RawRecord, _> =
            serde_json::from_value(serde_json::json!({"id": "1", "external_id": "x"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_external_id_fails_conversion() {
        let raw: RawRecord = serde_json::from_value(serde_json::json!({
            "id": "1",
            "type": {"id": "T1"}
        }))
        .unwrap();
        let err = RemoteRecord::try_from(raw).unwrap_err();
        assert!(err.to_string().contains("no external_id"));
    }

    #[test]
    fn test_payload_serializes_null_segment() {
        let payload = RecordPayload {
            external_id: "e".into(),
            url: "u".into(),
            title: "t".into(),
            body: "b".into(),
            type_id: "T".into(),
            source_id: "S".into(),
            locale: "en-us".into(),
            user_segment_id: None,
        };
        let json = serde_json::to_value(RecordEnvelope { record: &payload }).unwrap();
        assert!(json["record"]["user_segment_id"].is_null());
        assert!(json["record"].as_object().unwrap().contains_key("user_segment_id"));
        assert_eq!(json["record"]["locale"], "en-us");
    }
}
