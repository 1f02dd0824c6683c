use serde::{Deserialize, Serialize};

use crate::pagination::{Measurements, Pagination};
use crate::schema::{DocumentForm, FieldError};
use crate::totals::Totals;
use crate::wizard::Step;

pub const D1_BINDING: &str = "DB";
pub const DEFAULT_COOKIE_NAME: &str = "admin_session";
pub const DEFAULT_INVOICE_PREFIX: &str = "INV- 25/26-";
pub const DEFAULT_QUOTATION_PREFIX: &str = "QTN-- 25/26-";
pub const DEFAULT_DRAFT_NAME: &str = "Untitled Draft";
pub const SESSION_MAX_AGE_SECONDS: u32 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub field_errors: Vec<FieldError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionResponse {
    pub authenticated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NextNumberResponse {
    pub next_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreatedResponse {
    pub success: bool,
    pub id: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum WizardAction {
    Next,
    Back,
    Jump(usize),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardRequest {
    pub form: DocumentForm,
    #[serde(default)]
    pub current_step: usize,
    pub action: WizardAction,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WizardResponse {
    pub current_step: usize,
    pub step: Step,
    pub steps: Vec<Step>,
    pub progress_percent: u8,
    pub is_last_step: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    pub form: DocumentForm,
    #[serde(default)]
    pub measurements: Measurements,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    pub page_count: usize,
    #[serde(flatten)]
    pub pagination: Pagination,
    pub totals: Totals,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDraftRequest {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    pub data: serde_json::Value,
    #[serde(default)]
    pub current_step: usize,
}
