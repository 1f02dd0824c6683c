use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use worker::D1Database;
use worker::wasm_bindgen::JsValue;

use super::{
    DocumentFields, DocumentRecord, DocumentStore, DraftInput, DraftRecord, StoreError,
};
use crate::schema::Collection;

const UNIQUE_VIOLATION: &str = "UNIQUE constraint failed";

const DOCUMENT_COLUMNS: &str = "id, body, created_at, updated_at";
const DRAFT_COLUMNS: &str = "id, name, data, current_step, created_at, updated_at";

#[derive(Debug, Deserialize)]
struct DocumentRow {
    id: i64,
    body: String,
    created_at: String,
    updated_at: String,
}

impl DocumentRow {
    fn into_record(self) -> Result<DocumentRecord, StoreError> {
        Ok(DocumentRecord {
            id: self.id,
            fields: serde_json::from_str(&self.body)?,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct DraftRow {
    id: i64,
    name: String,
    data: String,
    current_step: i64,
    created_at: String,
    updated_at: String,
}

impl DraftRow {
    fn into_record(self) -> Result<DraftRecord, StoreError> {
        Ok(DraftRecord {
            id: self.id,
            name: self.name,
            data: serde_json::from_str(&self.data)?,
            current_step: usize::try_from(self.current_step).unwrap_or_default(),
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct IdRow {
    #[allow(dead_code)]
    id: i64,
}

#[derive(Debug, Deserialize)]
struct NumberRow {
    number: String,
}

/// Store backed by the D1 binding; schema in `migrations/`.
pub struct D1Store {
    db: D1Database,
}

impl D1Store {
    pub fn new(db: D1Database) -> Self {
        Self { db }
    }
}

fn timestamp(value: DateTime<Utc>) -> String {
    // Fixed width so text ordering matches time ordering.
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}

#[allow(clippy::cast_precision_loss)]
fn id_value(id: i64) -> JsValue {
    JsValue::from_f64(id as f64)
}

#[allow(clippy::cast_precision_loss)]
fn step_value(step: usize) -> JsValue {
    JsValue::from_f64(step as f64)
}

fn backend(error: &worker::Error) -> StoreError {
    StoreError::Backend(error.to_string())
}

fn write_error(error: &worker::Error, fields: &DocumentFields) -> StoreError {
    if error.to_string().contains(UNIQUE_VIOLATION) {
        StoreError::DuplicateNumber {
            collection: fields.collection,
            number: fields.number.clone(),
        }
    } else {
        backend(error)
    }
}

impl DocumentStore for D1Store {
    async fn insert_document(
        &self,
        fields: &DocumentFields,
        now: DateTime<Utc>,
    ) -> Result<DocumentRecord, StoreError> {
        let body = serde_json::to_string(fields)?;
        let stamp = timestamp(now);
        let row = self
            .db
            .prepare(format!(
                "INSERT INTO documents (collection, number, document_type, body, total_amount, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6) RETURNING {DOCUMENT_COLUMNS}"
            ))
            .bind(&[
                JsValue::from_str(fields.collection.as_str()),
                JsValue::from_str(&fields.number),
                JsValue::from_str(fields.document_type.as_str()),
                JsValue::from_str(&body),
                JsValue::from_f64(fields.total_amount),
                JsValue::from_str(&stamp),
            ])
            .map_err(|error| backend(&error))?
            .first::<DocumentRow>(None)
            .await
            .map_err(|error| write_error(&error, fields))?
            .ok_or_else(|| StoreError::Backend("insert returned no row".to_string()))?;
        row.into_record()
    }

    async fn update_document(
        &self,
        id: i64,
        fields: &DocumentFields,
        now: DateTime<Utc>,
    ) -> Result<DocumentRecord, StoreError> {
        let body = serde_json::to_string(fields)?;
        let row = self
            .db
            .prepare(format!(
                "UPDATE documents SET collection = ?1, number = ?2, document_type = ?3, body = ?4, \
                 total_amount = ?5, updated_at = ?6 WHERE id = ?7 RETURNING {DOCUMENT_COLUMNS}"
            ))
            .bind(&[
                JsValue::from_str(fields.collection.as_str()),
                JsValue::from_str(&fields.number),
                JsValue::from_str(fields.document_type.as_str()),
                JsValue::from_str(&body),
                JsValue::from_f64(fields.total_amount),
                JsValue::from_str(&timestamp(now)),
                id_value(id),
            ])
            .map_err(|error| backend(&error))?
            .first::<DocumentRow>(None)
            .await
            .map_err(|error| write_error(&error, fields))?
            .ok_or(StoreError::NotFound)?;
        row.into_record()
    }

    async fn delete_document(&self, id: i64) -> Result<(), StoreError> {
        self.db
            .prepare("DELETE FROM documents WHERE id = ?1 RETURNING id")
            .bind(&[id_value(id)])
            .map_err(|error| backend(&error))?
            .first::<IdRow>(None)
            .await
            .map_err(|error| backend(&error))?
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn get_document(&self, id: i64) -> Result<Option<DocumentRecord>, StoreError> {
        self.db
            .prepare(format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ?1"))
            .bind(&[id_value(id)])
            .map_err(|error| backend(&error))?
            .first::<DocumentRow>(None)
            .await
            .map_err(|error| backend(&error))?
            .map(DocumentRow::into_record)
            .transpose()
    }

    async fn list_documents(
        &self,
        collection: Collection,
    ) -> Result<Vec<DocumentRecord>, StoreError> {
        self.db
            .prepare(format!(
                "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE collection = ?1 \
                 ORDER BY created_at DESC, id DESC"
            ))
            .bind(&[JsValue::from_str(collection.as_str())])
            .map_err(|error| backend(&error))?
            .all()
            .await
            .map_err(|error| backend(&error))?
            .results::<DocumentRow>()
            .map_err(|error| backend(&error))?
            .into_iter()
            .map(DocumentRow::into_record)
            .collect()
    }

    async fn latest_number(&self, collection: Collection) -> Result<Option<String>, StoreError> {
        let row = self
            .db
            .prepare(
                "SELECT number FROM documents WHERE collection = ?1 \
                 ORDER BY created_at DESC, id DESC LIMIT 1",
            )
            .bind(&[JsValue::from_str(collection.as_str())])
            .map_err(|error| backend(&error))?
            .first::<NumberRow>(None)
            .await
            .map_err(|error| backend(&error))?;
        Ok(row.map(|row| row.number))
    }

    async fn save_draft(
        &self,
        id: Option<i64>,
        draft: &DraftInput,
        now: DateTime<Utc>,
    ) -> Result<DraftRecord, StoreError> {
        let data = serde_json::to_string(&draft.data)?;
        let stamp = timestamp(now);
        let statement = match id {
            Some(id) => self
                .db
                .prepare(format!(
                    "UPDATE drafts SET name = ?1, data = ?2, current_step = ?3, updated_at = ?4 \
                     WHERE id = ?5 RETURNING {DRAFT_COLUMNS}"
                ))
                .bind(&[
                    JsValue::from_str(&draft.name),
                    JsValue::from_str(&data),
                    step_value(draft.current_step),
                    JsValue::from_str(&stamp),
                    id_value(id),
                ]),
            None => self
                .db
                .prepare(format!(
                    "INSERT INTO drafts (name, data, current_step, created_at, updated_at) \
                     VALUES (?1, ?2, ?3, ?4, ?4) RETURNING {DRAFT_COLUMNS}"
                ))
                .bind(&[
                    JsValue::from_str(&draft.name),
                    JsValue::from_str(&data),
                    step_value(draft.current_step),
                    JsValue::from_str(&stamp),
                ]),
        };

        statement
            .map_err(|error| backend(&error))?
            .first::<DraftRow>(None)
            .await
            .map_err(|error| backend(&error))?
            .ok_or(StoreError::NotFound)?
            .into_record()
    }

    async fn list_drafts(&self) -> Result<Vec<DraftRecord>, StoreError> {
        self.db
            .prepare(format!(
                "SELECT {DRAFT_COLUMNS} FROM drafts ORDER BY updated_at DESC, id DESC"
            ))
            .all()
            .await
            .map_err(|error| backend(&error))?
            .results::<DraftRow>()
            .map_err(|error| backend(&error))?
            .into_iter()
            .map(DraftRow::into_record)
            .collect()
    }

    async fn get_draft(&self, id: i64) -> Result<Option<DraftRecord>, StoreError> {
        self.db
            .prepare(format!("SELECT {DRAFT_COLUMNS} FROM drafts WHERE id = ?1"))
            .bind(&[id_value(id)])
            .map_err(|error| backend(&error))?
            .first::<DraftRow>(None)
            .await
            .map_err(|error| backend(&error))?
            .map(DraftRow::into_record)
            .transpose()
    }

    async fn delete_draft(&self, id: i64) -> Result<(), StoreError> {
        self.db
            .prepare("DELETE FROM drafts WHERE id = ?1 RETURNING id")
            .bind(&[id_value(id)])
            .map_err(|error| backend(&error))?
            .first::<IdRow>(None)
            .await
            .map_err(|error| backend(&error))?
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}
