//! Firestore REST adapter for the note collection.
//!
//! Documents live under
//! `projects/{project}/databases/(default)/documents/notes` and use the
//! store's native typed-value encoding; field keys match the note model
//! exactly. Requests carry the session id token. There is no retry and
//! no pagination: a failure is the caller's to handle, and the note set
//! is assumed to fit one page.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::config::BackendConfig;
use crate::error::{Error, Result};
use crate::models::{Coordinates, Note, NoteFields, NoteId, NotePatch};
use crate::store::NoteStore;
use crate::util::{compact_text, unix_timestamp_millis_now};

const COLLECTION: &str = "notes";
const LIST_PAGE_SIZE: u32 = 300;

pub struct FirestoreNoteStore {
    client: reqwest::Client,
    collection_url: String,
    id_token: String,
}

impl FirestoreNoteStore {
    #[must_use]
    pub fn new(config: &BackendConfig, id_token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            collection_url: format!("{}/{}", config.documents_url(), COLLECTION),
            id_token: id_token.into(),
        }
    }

    fn document_url(&self, id: &NoteId) -> String {
        format!("{}/{}", self.collection_url, id.as_str())
    }

    async fn reject(response: reqwest::Response) -> Error {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Error::Backend(format!("HTTP {}: {}", status.as_u16(), compact_text(&body)))
    }
}

#[async_trait]
impl NoteStore for FirestoreNoteStore {
    async fn list(&self) -> Result<Vec<Note>> {
        let response = self
            .client
            .get(&self.collection_url)
            .query(&[("pageSize", LIST_PAGE_SIZE.to_string())])
            .bearer_auth(&self.id_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }

        let payload = response.json::<ListDocumentsResponse>().await?;
        let mut notes = payload
            .documents
            .unwrap_or_default()
            .into_iter()
            .map(decode_document)
            .collect::<Result<Vec<_>>>()?;

        // The REST list endpoint orders by document name; re-establish
        // insertion order via the creation stamp.
        notes.sort_by_key(|note| note.created_at);
        Ok(notes)
    }

    async fn get(&self, id: &NoteId) -> Result<Option<Note>> {
        let response = self
            .client
            .get(self.document_url(id))
            .bearer_auth(&self.id_token)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }

        let document = response.json::<Document>().await?;
        decode_document(document).map(Some)
    }

    async fn create(&self, fields: &NoteFields) -> Result<Note> {
        let now = unix_timestamp_millis_now();
        let body = serde_json::json!({ "fields": encode_fields(fields, now, now) });

        let response = self
            .client
            .post(&self.collection_url)
            .bearer_auth(&self.id_token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }

        let document = response.json::<Document>().await?;
        decode_document(document)
    }

    async fn update(&self, id: &NoteId, patch: &NotePatch) -> Result<()> {
        let now = unix_timestamp_millis_now();
        let (fields, mask) = encode_patch(patch, now);
        let body = serde_json::json!({ "fields": fields });

        let mut query: Vec<(&str, String)> = mask
            .into_iter()
            .map(|path| ("updateMask.fieldPaths", path.to_string()))
            .collect();
        // Without the precondition a patch upserts; the contract is an
        // update of an existing note.
        query.push(("currentDocument.exists", "true".to_string()));

        let response = self
            .client
            .patch(self.document_url(id))
            .query(&query)
            .bearer_auth(&self.id_token)
            .json(&body)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound(id.to_string()));
        }
        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }

        Ok(())
    }

    async fn delete(&self, id: &NoteId) -> Result<()> {
        let response = self
            .client
            .delete(self.document_url(id))
            .bearer_auth(&self.id_token)
            .send()
            .await?;

        // The backend reports success for a missing document too.
        if response.status() == reqwest::StatusCode::NOT_FOUND || response.status().is_success() {
            return Ok(());
        }
        Err(Self::reject(response).await)
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ListDocumentsResponse {
    documents: Option<Vec<Document>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Document {
    /// Full resource name; the id is its last path segment.
    name: Option<String>,
    fields: Option<BTreeMap<String, DocumentValue>>,
}

/// The subset of Firestore's typed values the note schema uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
enum DocumentValue {
    StringValue(String),
    DoubleValue(f64),
    /// 64-bit integers travel as decimal strings.
    IntegerValue(String),
    /// RFC 3339 text.
    TimestampValue(String),
    MapValue(MapFields),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct MapFields {
    fields: BTreeMap<String, DocumentValue>,
}

fn encode_fields(
    fields: &NoteFields,
    created_at: i64,
    updated_at: i64,
) -> BTreeMap<String, DocumentValue> {
    let mut encoded = encode_patch(&NotePatch::from_fields(fields), updated_at).0;
    encoded.insert(
        "createdAt".to_string(),
        DocumentValue::IntegerValue(created_at.to_string()),
    );
    encoded
}

fn encode_patch(
    patch: &NotePatch,
    updated_at: i64,
) -> (BTreeMap<String, DocumentValue>, Vec<&'static str>) {
    let mut fields = BTreeMap::new();
    let mut mask = Vec::new();

    if let Some(title) = &patch.title {
        fields.insert(
            "title".to_string(),
            DocumentValue::StringValue(title.clone()),
        );
        mask.push("title");
    }
    if let Some(content) = &patch.content {
        fields.insert(
            "content".to_string(),
            DocumentValue::StringValue(content.clone()),
        );
        mask.push("content");
    }
    if let Some(image_url) = &patch.image_url {
        fields.insert(
            "imageUrl".to_string(),
            DocumentValue::StringValue(image_url.clone()),
        );
        mask.push("imageUrl");
    }
    if let Some(coordinates) = patch.coordinates {
        fields.insert(
            "coordinates".to_string(),
            encode_coordinates(coordinates),
        );
        mask.push("coordinates");
    }
    if let Some(date) = patch.date {
        fields.insert("date".to_string(), encode_timestamp(date));
        mask.push("date");
    }

    fields.insert(
        "updatedAt".to_string(),
        DocumentValue::IntegerValue(updated_at.to_string()),
    );
    mask.push("updatedAt");

    (fields, mask)
}

fn encode_coordinates(coordinates: Coordinates) -> DocumentValue {
    let mut fields = BTreeMap::new();
    fields.insert(
        "latitude".to_string(),
        DocumentValue::DoubleValue(coordinates.latitude),
    );
    fields.insert(
        "longitude".to_string(),
        DocumentValue::DoubleValue(coordinates.longitude),
    );
    DocumentValue::MapValue(MapFields { fields })
}

fn encode_timestamp(value: DateTime<Utc>) -> DocumentValue {
    DocumentValue::TimestampValue(value.to_rfc3339_opts(SecondsFormat::Secs, true))
}

fn decode_document(document: Document) -> Result<Note> {
    let name = document
        .name
        .ok_or_else(|| Error::InvalidDocument("document without a resource name".to_string()))?;
    let id = name
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .ok_or_else(|| Error::InvalidDocument(format!("unparseable resource name: {name}")))?;

    let fields = document.fields.unwrap_or_default();

    Ok(Note {
        id: NoteId::new(id),
        fields: NoteFields {
            title: string_field(&fields, "title"),
            content: string_field(&fields, "content"),
            image_url: string_field(&fields, "imageUrl"),
            coordinates: coordinates_field(&fields)?,
            date: timestamp_field(&fields, "date")?,
        },
        created_at: integer_field(&fields, "createdAt"),
        updated_at: integer_field(&fields, "updatedAt"),
    })
}

fn string_field(fields: &BTreeMap<String, DocumentValue>, key: &str) -> String {
    match fields.get(key) {
        Some(DocumentValue::StringValue(value)) => value.clone(),
        _ => String::new(),
    }
}

fn integer_field(fields: &BTreeMap<String, DocumentValue>, key: &str) -> i64 {
    match fields.get(key) {
        Some(DocumentValue::IntegerValue(value)) => value.parse().unwrap_or(0),
        _ => 0,
    }
}

fn number_value(value: &DocumentValue) -> Option<f64> {
    match value {
        DocumentValue::DoubleValue(number) => Some(*number),
        DocumentValue::IntegerValue(raw) => raw.parse().ok(),
        _ => None,
    }
}

fn coordinates_field(fields: &BTreeMap<String, DocumentValue>) -> Result<Coordinates> {
    let Some(DocumentValue::MapValue(map)) = fields.get("coordinates") else {
        return Ok(Coordinates::default());
    };

    let component = |key: &str| -> Result<f64> {
        match map.fields.get(key) {
            Some(value) => number_value(value).ok_or_else(|| {
                Error::InvalidDocument(format!("coordinate component {key} is not a number"))
            }),
            None => Ok(0.0),
        }
    };

    Ok(Coordinates::new(
        component("latitude")?,
        component("longitude")?,
    ))
}

fn timestamp_field(
    fields: &BTreeMap<String, DocumentValue>,
    key: &str,
) -> Result<DateTime<Utc>> {
    match fields.get(key) {
        Some(DocumentValue::TimestampValue(raw)) => DateTime::parse_from_rfc3339(raw)
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(|error| Error::InvalidDocument(format!("bad timestamp {key}: {error}"))),
        _ => Ok(DateTime::<Utc>::UNIX_EPOCH),
    }
}
