use std::cell::RefCell;

use chrono::{DateTime, Utc};

use super::{
    DocumentFields, DocumentRecord, DocumentStore, DraftInput, DraftRecord, StoreError,
};
use crate::schema::Collection;

#[derive(Debug, Default)]
struct MemoryState {
    documents: Vec<DocumentRecord>,
    drafts: Vec<DraftRecord>,
    next_id: i64,
}

impl MemoryState {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn ensure_unique(&self, fields: &DocumentFields, except: Option<i64>) -> Result<(), StoreError> {
        let taken = self.documents.iter().any(|record| {
            Some(record.id) != except
                && record.fields.collection == fields.collection
                && record.fields.number == fields.number
        });
        if taken {
            return Err(StoreError::DuplicateNumber {
                collection: fields.collection,
                number: fields.number.clone(),
            });
        }
        Ok(())
    }
}

/// In-process store with the same uniqueness rules as the D1 schema.
///
/// Test-only; routes always use [`super::D1Store`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RefCell<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document_count(&self) -> usize {
        self.state.borrow().documents.len()
    }
}

impl DocumentStore for MemoryStore {
    async fn insert_document(
        &self,
        fields: &DocumentFields,
        now: DateTime<Utc>,
    ) -> Result<DocumentRecord, StoreError> {
        let mut state = self.state.borrow_mut();
        state.ensure_unique(fields, None)?;
        let record = DocumentRecord {
            id: state.allocate_id(),
            fields: fields.clone(),
            created_at: now,
            updated_at: now,
        };
        state.documents.push(record.clone());
        Ok(record)
    }

    async fn update_document(
        &self,
        id: i64,
        fields: &DocumentFields,
        now: DateTime<Utc>,
    ) -> Result<DocumentRecord, StoreError> {
        let mut state = self.state.borrow_mut();
        let position = state
            .documents
            .iter()
            .position(|record| record.id == id)
            .ok_or(StoreError::NotFound)?;
        state.ensure_unique(fields, Some(id))?;
        let record = &mut state.documents[position];
        record.fields = fields.clone();
        record.updated_at = now;
        Ok(record.clone())
    }

    async fn delete_document(&self, id: i64) -> Result<(), StoreError> {
        let mut state = self.state.borrow_mut();
        let before = state.documents.len();
        state.documents.retain(|record| record.id != id);
        if state.documents.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn get_document(&self, id: i64) -> Result<Option<DocumentRecord>, StoreError> {
        let state = self.state.borrow();
        Ok(state.documents.iter().find(|record| record.id == id).cloned())
    }

    async fn list_documents(
        &self,
        collection: Collection,
    ) -> Result<Vec<DocumentRecord>, StoreError> {
        let state = self.state.borrow();
        let mut records = state
            .documents
            .iter()
            .filter(|record| record.fields.collection == collection)
            .cloned()
            .collect::<Vec<_>>();
        records.sort_by(|left, right| {
            (right.created_at, right.id).cmp(&(left.created_at, left.id))
        });
        Ok(records)
    }

    async fn latest_number(&self, collection: Collection) -> Result<Option<String>, StoreError> {
        let state = self.state.borrow();
        Ok(state
            .documents
            .iter()
            .filter(|record| record.fields.collection == collection)
            .max_by_key(|record| (record.created_at, record.id))
            .map(|record| record.fields.number.clone()))
    }

    async fn save_draft(
        &self,
        id: Option<i64>,
        draft: &DraftInput,
        now: DateTime<Utc>,
    ) -> Result<DraftRecord, StoreError> {
        let mut state = self.state.borrow_mut();
        if let Some(id) = id {
            let record = state
                .drafts
                .iter_mut()
                .find(|record| record.id == id)
                .ok_or(StoreError::NotFound)?;
            record.name.clone_from(&draft.name);
            record.data = draft.data.clone();
            record.current_step = draft.current_step;
            record.updated_at = now;
            return Ok(record.clone());
        }

        let record = DraftRecord {
            id: state.allocate_id(),
            name: draft.name.clone(),
            data: draft.data.clone(),
            current_step: draft.current_step,
            created_at: now,
            updated_at: now,
        };
        state.drafts.push(record.clone());
        Ok(record)
    }

    async fn list_drafts(&self) -> Result<Vec<DraftRecord>, StoreError> {
        let state = self.state.borrow();
        let mut drafts = state.drafts.clone();
        drafts.sort_by(|left, right| {
            (right.updated_at, right.id).cmp(&(left.updated_at, left.id))
        });
        Ok(drafts)
    }

    async fn get_draft(&self, id: i64) -> Result<Option<DraftRecord>, StoreError> {
        let state = self.state.borrow();
        Ok(state.drafts.iter().find(|record| record.id == id).cloned())
    }

    async fn delete_draft(&self, id: i64) -> Result<(), StoreError> {
        let mut state = self.state.borrow_mut();
        let before = state.drafts.len();
        state.drafts.retain(|record| record.id != id);
        if state.drafts.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
