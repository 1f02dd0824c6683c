//! Persistence seam for documents and drafts.
//!
//! Document numbers are unique per collection and that uniqueness belongs
//! to the backend: an insert or update that would collide fails with
//! [`StoreError::DuplicateNumber`] instead of being pre-checked by callers.

pub mod d1;
pub mod memory;

use std::fmt::{Display, Formatter};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::{
    ClientInfo, Collection, DocumentForm, DocumentStatus, DocumentType, LineItem, Sender, Settings,
};
use crate::totals;

pub use d1::D1Store;
pub use memory::MemoryStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    DuplicateNumber {
        collection: Collection,
        number: String,
    },
    NotFound,
    Corrupt(String),
    Backend(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateNumber { collection, number } => {
                write!(f, "duplicate {} number: {number}", collection.as_str())
            }
            Self::NotFound => write!(f, "record not found"),
            Self::Corrupt(message) => write!(f, "corrupt record: {message}"),
            Self::Backend(message) => write!(f, "storage backend error: {message}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<serde_json::Error> for StoreError {
    fn from(error: serde_json::Error) -> Self {
        Self::Corrupt(error.to_string())
    }
}

impl From<chrono::ParseError> for StoreError {
    fn from(error: chrono::ParseError) -> Self {
        Self::Corrupt(error.to_string())
    }
}

/// Everything a stored document carries apart from its id and timestamps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentFields {
    pub collection: Collection,
    pub number: String,
    pub document_type: DocumentType,
    pub date: NaiveDate,
    pub due_date: NaiveDate,
    pub tax_rate: f64,
    pub discount: f64,
    pub payment_terms: String,
    pub notes: String,
    pub status: DocumentStatus,
    pub is_paid: bool,
    #[serde(default)]
    pub is_converted_to_invoice: bool,
    pub sender: Sender,
    pub client: ClientInfo,
    pub items: Vec<LineItem>,
    pub total_amount: f64,
}

impl DocumentFields {
    /// Builds the stored shape of a validated form; the total is computed
    /// here and never taken from the client.
    pub fn from_form(form: &DocumentForm) -> Self {
        let settings = &form.settings;
        Self {
            collection: form.document_type.collection(),
            number: settings.invoice_number.trim().to_string(),
            document_type: form.document_type,
            date: settings.date,
            due_date: settings.due_date,
            tax_rate: settings.tax_rate,
            discount: settings.discount,
            payment_terms: settings.payment_terms.clone(),
            notes: settings.notes.clone(),
            status: settings.status,
            is_paid: settings.is_paid,
            is_converted_to_invoice: false,
            sender: form.sender.clone(),
            client: form.client.clone(),
            items: form.items.clone(),
            total_amount: totals::subtotal(&form.items),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub id: i64,
    #[serde(flatten)]
    pub fields: DocumentFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentRecord {
    /// Form view of a stored record, used to re-render or re-export it.
    pub fn to_form(&self) -> DocumentForm {
        let fields = &self.fields;
        DocumentForm {
            document_type: fields.document_type,
            sender: fields.sender.clone(),
            saved_senders: Vec::new(),
            selected_sender: None,
            client: fields.client.clone(),
            items: fields.items.clone(),
            settings: Settings {
                invoice_number: fields.number.clone(),
                date: fields.date,
                due_date: fields.due_date,
                tax_rate: fields.tax_rate,
                discount: fields.discount,
                payment_terms: fields.payment_terms.clone(),
                notes: fields.notes.clone(),
                status: fields.status,
                is_paid: fields.is_paid,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DraftInput {
    pub name: String,
    pub data: serde_json::Value,
    pub current_step: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DraftRecord {
    pub id: i64,
    pub name: String,
    pub data: serde_json::Value,
    pub current_step: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Worker futures are not `Send`, so the trait is only used generically.
#[allow(async_fn_in_trait)]
pub trait DocumentStore {
    async fn insert_document(
        &self,
        fields: &DocumentFields,
        now: DateTime<Utc>,
    ) -> Result<DocumentRecord, StoreError>;

    async fn update_document(
        &self,
        id: i64,
        fields: &DocumentFields,
        now: DateTime<Utc>,
    ) -> Result<DocumentRecord, StoreError>;

    async fn delete_document(&self, id: i64) -> Result<(), StoreError>;

    async fn get_document(&self, id: i64) -> Result<Option<DocumentRecord>, StoreError>;

    /// Newest first.
    async fn list_documents(&self, collection: Collection)
    -> Result<Vec<DocumentRecord>, StoreError>;

    /// Number of the most recently created record in `collection`.
    async fn latest_number(&self, collection: Collection) -> Result<Option<String>, StoreError>;

    /// Inserts when `id` is `None`, otherwise overwrites the draft.
    async fn save_draft(
        &self,
        id: Option<i64>,
        draft: &DraftInput,
        now: DateTime<Utc>,
    ) -> Result<DraftRecord, StoreError>;

    /// Most recently updated first.
    async fn list_drafts(&self) -> Result<Vec<DraftRecord>, StoreError>;

    async fn get_draft(&self, id: i64) -> Result<Option<DraftRecord>, StoreError>;

    async fn delete_draft(&self, id: i64) -> Result<(), StoreError>;
}
