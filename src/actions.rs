//! Validated persistence operations behind the HTTP routes.

use chrono::{DateTime, Utc};

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::models::{
    DEFAULT_DRAFT_NAME, PreviewRequest, PreviewResponse, WizardAction, WizardRequest,
    WizardResponse,
};
use crate::numbering;
use crate::pagination;
use crate::schema::{Collection, DocumentForm, DocumentType};
use crate::store::{DocumentFields, DocumentRecord, DocumentStore, DraftInput, DraftRecord};
use crate::totals::Totals;
use crate::wizard::Wizard;

/// Applies one navigation request; a blocked move returns the field errors.
pub fn navigate(request: &WizardRequest) -> Result<WizardResponse, ApiError> {
    let mut wizard = Wizard::resume(request.form.document_type, request.current_step);
    let step = match request.action {
        WizardAction::Next => wizard.next(&request.form)?,
        WizardAction::Back => wizard.back(),
        WizardAction::Jump(index) => wizard.jump_to(index, &request.form)?,
    };

    Ok(WizardResponse {
        current_step: wizard.current_index(),
        step,
        steps: wizard.steps().to_vec(),
        progress_percent: wizard.progress_percent(),
        is_last_step: wizard.is_last_step(),
    })
}

pub fn preview(request: &PreviewRequest) -> PreviewResponse {
    let pagination = pagination::paginate(request.form.items.len(), &request.measurements);
    PreviewResponse {
        page_count: pagination.page_count(),
        pagination,
        totals: Totals::compute(&request.form),
    }
}

pub async fn create_document<S>(
    store: &S,
    form: &DocumentForm,
    now: DateTime<Utc>,
) -> Result<DocumentRecord, ApiError>
where
    S: DocumentStore,
{
    form.validate()?;
    let fields = DocumentFields::from_form(form);
    Ok(store.insert_document(&fields, now).await?)
}

pub async fn update_document<S>(
    store: &S,
    id: i64,
    form: &DocumentForm,
    now: DateTime<Utc>,
) -> Result<DocumentRecord, ApiError>
where
    S: DocumentStore,
{
    form.validate()?;
    let existing = find_document(store, id).await?;
    let mut fields = DocumentFields::from_form(form);
    fields.is_converted_to_invoice = existing.fields.is_converted_to_invoice;
    Ok(store.update_document(id, &fields, now).await?)
}

pub async fn delete_document<S>(store: &S, id: i64) -> Result<(), ApiError>
where
    S: DocumentStore,
{
    store.delete_document(id).await?;
    Ok(())
}

pub async fn find_document<S>(store: &S, id: i64) -> Result<DocumentRecord, ApiError>
where
    S: DocumentStore,
{
    store
        .get_document(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("document {id} not found")))
}

pub async fn list_documents<S>(
    store: &S,
    collection: Collection,
) -> Result<Vec<DocumentRecord>, ApiError>
where
    S: DocumentStore,
{
    Ok(store.list_documents(collection).await?)
}

pub async fn next_number<S>(
    store: &S,
    config: &AppConfig,
    document_type: DocumentType,
) -> Result<String, ApiError>
where
    S: DocumentStore,
{
    let latest = store.latest_number(document_type.collection()).await?;
    Ok(numbering::next_document_number(
        config.number_prefix(document_type),
        latest.as_deref(),
    ))
}

/// Last write wins: saving with an id overwrites that draft wholesale.
pub async fn save_draft<S>(
    store: &S,
    id: Option<i64>,
    name: Option<&str>,
    data: serde_json::Value,
    current_step: usize,
    now: DateTime<Utc>,
) -> Result<DraftRecord, ApiError>
where
    S: DocumentStore,
{
    if !data.is_object() {
        return Err(ApiError::BadRequest(
            "draft data must be a JSON object".to_string(),
        ));
    }

    let name = name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_DRAFT_NAME)
        .to_string();
    let draft = DraftInput {
        name,
        data,
        current_step,
    };
    Ok(store.save_draft(id, &draft, now).await?)
}

pub async fn list_drafts<S>(store: &S) -> Result<Vec<DraftRecord>, ApiError>
where
    S: DocumentStore,
{
    Ok(store.list_drafts().await?)
}

pub async fn find_draft<S>(store: &S, id: i64) -> Result<DraftRecord, ApiError>
where
    S: DocumentStore,
{
    store
        .get_draft(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("draft {id} not found")))
}

pub async fn delete_draft<S>(store: &S, id: i64) -> Result<(), ApiError>
where
    S: DocumentStore,
{
    store.delete_draft(id).await?;
    Ok(())
}
