mod common;

use pretty_assertions::assert_eq;

use bizdoc_worker::actions::navigate;
use bizdoc_worker::error::ApiError;
use bizdoc_worker::models::{WizardAction, WizardRequest};
use bizdoc_worker::schema::DocumentType;
use bizdoc_worker::wizard::{Step, Wizard, steps_for};

use common::sample_form;

#[test]
fn step_sequences_per_document_type() {
    assert_eq!(
        steps_for(DocumentType::Invoice),
        &[
            Step::Company,
            Step::Type,
            Step::Client,
            Step::Services,
            Step::Payment,
            Step::Preview
        ]
    );
    assert_eq!(steps_for(DocumentType::Quotation), steps_for(DocumentType::Invoice));
    assert_eq!(
        steps_for(DocumentType::Proposal),
        &[
            Step::Company,
            Step::Type,
            Step::Upload,
            Step::Client,
            Step::Details,
            Step::Preview
        ]
    );
}

#[test]
fn next_is_blocked_by_current_step_errors() {
    let mut form = sample_form("INV-001");
    form.sender.name = "X".to_string();

    let mut wizard = Wizard::new(DocumentType::Invoice);
    let errors = wizard.next(&form).expect_err("company step must block");
    assert_eq!(errors[0].path, "sender.name");
    assert_eq!(wizard.current_step(), Step::Company);

    form.sender.name = "Northwind".to_string();
    assert_eq!(wizard.next(&form), Ok(Step::Type));
}

#[test]
fn only_the_current_step_gate_applies() {
    // Items are invalid, but the client step does not own them.
    let mut form = sample_form("INV-001");
    form.items.clear();

    let mut wizard = Wizard::resume(DocumentType::Invoice, 2);
    assert_eq!(wizard.next(&form), Ok(Step::Services));
    assert!(wizard.next(&form).is_err());
}

#[test]
fn back_and_jump_rules() {
    let mut form = sample_form("INV-001");
    let mut wizard = Wizard::resume(DocumentType::Invoice, 3);

    assert_eq!(wizard.back(), Step::Client);
    assert_eq!(wizard.jump_to(0, &form), Ok(Step::Company));
    assert_eq!(wizard.back(), Step::Company);

    form.sender.email = "not-an-email".to_string();
    assert!(wizard.jump_to(4, &form).is_err());
    assert_eq!(wizard.current_index(), 0);

    form.sender.email = "ok@example.com".to_string();
    assert_eq!(wizard.jump_to(99, &form), Ok(Step::Preview));
    assert!(wizard.is_last_step());
    assert_eq!(wizard.next(&form), Ok(Step::Preview));
}

#[test]
fn jumping_to_the_current_step_still_validates_it() {
    let mut form = sample_form("INV-001");
    form.client.name = String::new();
    let mut wizard = Wizard::resume(DocumentType::Invoice, 2);

    let errors = wizard.jump_to(2, &form).expect_err("client step is invalid");
    assert_eq!(errors[0].path, "client.name");
    assert_eq!(wizard.jump_to(1, &form), Ok(Step::Type));
}

#[test]
fn changing_type_clamps_and_keeps_progress_consistent() {
    let mut wizard = Wizard::resume(DocumentType::Invoice, 40);
    assert_eq!(wizard.current_index(), 5);
    assert_eq!(wizard.progress_percent(), 100);

    wizard.set_document_type(DocumentType::Proposal);
    assert_eq!(wizard.current_step(), Step::Preview);

    let wizard = Wizard::resume(DocumentType::Proposal, 2);
    assert_eq!(wizard.current_step(), Step::Upload);
    assert_eq!(wizard.progress_percent(), 40);
    assert_eq!(Wizard::new(DocumentType::Invoice).progress_percent(), 0);
}

#[test]
fn navigate_reports_field_errors() {
    let mut form = sample_form("INV-001");
    form.client.name = String::new();
    let request = WizardRequest {
        form,
        current_step: 2,
        action: WizardAction::Next,
    };

    match navigate(&request) {
        Err(ApiError::Validation(errors)) => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].message, "Name is too short");
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn navigate_request_from_json() {
    let form = serde_json::to_value(sample_form("INV-001")).expect("serializable");
    let request: WizardRequest = serde_json::from_value(serde_json::json!({
        "form": form,
        "currentStep": 1,
        "action": "next",
    }))
    .expect("valid request");

    let response = navigate(&request).expect("type step has no gate");
    assert_eq!(response.current_step, 2);
    assert_eq!(response.step, Step::Client);
    assert_eq!(response.progress_percent, 40);
    assert!(!response.is_last_step);

    let jump: WizardRequest = serde_json::from_value(serde_json::json!({
        "form": serde_json::to_value(sample_form("INV-001")).expect("serializable"),
        "currentStep": 4,
        "action": { "jump": 1 },
    }))
    .expect("valid request");
    assert_eq!(navigate(&jump).expect("backward jump").step, Step::Type);
}
