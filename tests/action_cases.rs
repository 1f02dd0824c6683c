mod common;

use chrono::{DateTime, Duration, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;

use bizdoc_worker::actions;
use bizdoc_worker::config::AppConfig;
use bizdoc_worker::error::ApiError;
use bizdoc_worker::schema::{Collection, DocumentType};
use bizdoc_worker::store::{DocumentStore, MemoryStore};

use common::sample_form;

fn at(minutes: i64) -> DateTime<Utc> {
    let start: DateTime<Utc> = "2025-06-01T09:00:00Z".parse().expect("valid datetime");
    start + Duration::minutes(minutes)
}

#[tokio::test]
async fn duplicate_number_is_rejected_without_second_record() {
    let store = MemoryStore::new();
    actions::create_document(&store, &sample_form("INV-007"), at(0))
        .await
        .expect("first insert");

    let error = actions::create_document(&store, &sample_form("INV-007"), at(1))
        .await
        .expect_err("duplicate must fail");

    assert_eq!(error.status_code(), 409);
    assert_eq!(error.message(), "Invoice number already exists. Please change it.");
    assert_eq!(store.document_count(), 1);
}

#[tokio::test]
async fn same_number_is_allowed_in_the_other_collection() {
    let store = MemoryStore::new();
    let mut quotation = sample_form("DOC-001");
    quotation.document_type = DocumentType::Quotation;
    actions::create_document(&store, &sample_form("DOC-001"), at(0))
        .await
        .expect("invoice");
    actions::create_document(&store, &quotation, at(1))
        .await
        .expect("quotation");

    let mut proposal = sample_form("DOC-001");
    proposal.document_type = DocumentType::Proposal;
    let error = actions::create_document(&store, &proposal, at(2))
        .await
        .expect_err("proposals share the quotation collection");
    assert_eq!(error.message(), "Quotation number already exists. Please change it.");
    assert_eq!(store.document_count(), 2);
}

#[tokio::test]
async fn create_validates_and_stores_subtotal() {
    let store = MemoryStore::new();
    let mut invalid = sample_form("INV-001");
    invalid.items.clear();
    match actions::create_document(&store, &invalid, at(0)).await {
        Err(ApiError::Validation(errors)) => assert_eq!(errors[0].path, "items"),
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(store.document_count(), 0);

    let record = actions::create_document(&store, &sample_form(" INV-001 "), at(0))
        .await
        .expect("valid form");
    assert_eq!(record.fields.number, "INV-001");
    assert_eq!(record.fields.collection, Collection::Invoice);
    assert_eq!(record.fields.total_amount, 1500.0);
    assert_eq!(record.created_at, at(0));
}

#[tokio::test]
async fn overflowing_total_is_never_stored() {
    let store = MemoryStore::new();
    let mut form = sample_form("INV-001");
    form.items[0].quantity = 1e200;
    form.items[0].price = 1e200;

    let result = actions::create_document(&store, &form, at(0)).await;
    assert!(matches!(result, Err(ApiError::Validation(_))));
    assert_eq!(store.document_count(), 0);
}

#[tokio::test]
async fn update_replaces_fields_and_keeps_conversion_flag() {
    let store = MemoryStore::new();
    let first = actions::create_document(&store, &sample_form("INV-001"), at(0))
        .await
        .expect("insert");
    actions::create_document(&store, &sample_form("INV-002"), at(1))
        .await
        .expect("insert");

    let mut edited = sample_form("INV-001");
    edited.items.truncate(1);
    let updated = actions::update_document(&store, first.id, &edited, at(5))
        .await
        .expect("update");
    assert_eq!(updated.fields.total_amount, 1200.0);
    assert_eq!(updated.created_at, at(0));
    assert_eq!(updated.updated_at, at(5));

    let clash = actions::update_document(&store, first.id, &sample_form("INV-002"), at(6)).await;
    assert!(matches!(clash, Err(ApiError::Conflict(_))));

    let missing = actions::update_document(&store, 999, &edited, at(6)).await;
    assert!(matches!(missing, Err(ApiError::NotFound(_))));
}

#[tokio::test]
async fn delete_and_find() {
    let store = MemoryStore::new();
    let record = actions::create_document(&store, &sample_form("INV-001"), at(0))
        .await
        .expect("insert");

    let found = actions::find_document(&store, record.id).await.expect("stored");
    assert_eq!(found.to_form().settings.invoice_number, "INV-001");

    actions::delete_document(&store, record.id).await.expect("delete");
    assert!(matches!(
        actions::find_document(&store, record.id).await,
        Err(ApiError::NotFound(_))
    ));
    assert!(matches!(
        actions::delete_document(&store, record.id).await,
        Err(ApiError::NotFound(_))
    ));
}

#[tokio::test]
async fn documents_list_newest_first_per_collection() {
    let store = MemoryStore::new();
    for (minute, number) in [(0, "INV-001"), (10, "INV-002"), (5, "INV-003")] {
        actions::create_document(&store, &sample_form(number), at(minute))
            .await
            .expect("insert");
    }

    let numbers = actions::list_documents(&store, Collection::Invoice)
        .await
        .expect("list")
        .into_iter()
        .map(|record| record.fields.number)
        .collect::<Vec<_>>();
    assert_eq!(numbers, vec!["INV-002", "INV-003", "INV-001"]);
    assert!(
        actions::list_documents(&store, Collection::Quotation)
            .await
            .expect("list")
            .is_empty()
    );
}

#[tokio::test]
async fn next_number_follows_latest_created_record() {
    let store = MemoryStore::new();
    let config = AppConfig::default();

    assert_eq!(
        actions::next_number(&store, &config, DocumentType::Invoice)
            .await
            .expect("number"),
        "INV- 25/26-001"
    );

    actions::create_document(&store, &sample_form("INV- 25/26-099"), at(0))
        .await
        .expect("insert");
    assert_eq!(
        actions::next_number(&store, &config, DocumentType::Invoice)
            .await
            .expect("number"),
        "INV- 25/26-100"
    );
    assert_eq!(
        actions::next_number(&store, &config, DocumentType::Proposal)
            .await
            .expect("number"),
        "QTN-- 25/26-001"
    );

    let latest = store
        .latest_number(Collection::Invoice)
        .await
        .expect("latest");
    assert_eq!(latest.as_deref(), Some("INV- 25/26-099"));
}

#[tokio::test]
async fn drafts_are_last_write_wins() {
    let store = MemoryStore::new();
    let draft = actions::save_draft(&store, None, None, json!({ "client": {} }), 0, at(0))
        .await
        .expect("insert");
    assert_eq!(draft.name, "Untitled Draft");

    let other = actions::save_draft(&store, None, Some("Acme"), json!({}), 1, at(1))
        .await
        .expect("insert");

    let saved = actions::save_draft(
        &store,
        Some(draft.id),
        Some("  Retainer  "),
        json!({ "items": [1, 2] }),
        3,
        at(2),
    )
    .await
    .expect("overwrite");
    assert_eq!(saved.id, draft.id);
    assert_eq!(saved.name, "Retainer");
    assert_eq!(saved.data, json!({ "items": [1, 2] }));
    assert_eq!(saved.current_step, 3);
    assert_eq!(saved.created_at, at(0));

    let order = actions::list_drafts(&store)
        .await
        .expect("list")
        .into_iter()
        .map(|draft| draft.id)
        .collect::<Vec<_>>();
    assert_eq!(order, vec![draft.id, other.id]);

    assert!(matches!(
        actions::save_draft(&store, None, None, json!([1]), 0, at(3)).await,
        Err(ApiError::BadRequest(_))
    ));
    assert!(matches!(
        actions::save_draft(&store, Some(404), None, json!({}), 0, at(3)).await,
        Err(ApiError::NotFound(_))
    ));

    actions::delete_draft(&store, other.id).await.expect("delete");
    assert!(matches!(
        actions::find_draft(&store, other.id).await,
        Err(ApiError::NotFound(_))
    ));
    assert_eq!(
        actions::find_draft(&store, draft.id)
            .await
            .expect("kept")
            .name,
        "Retainer"
    );
}
