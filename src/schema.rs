//! Document shape shared by the wizard, the preview and persistence.
//!
//! Wire format uses camelCase keys so the browser form can post its state
//! as-is. Validation never fails fast: every section reports all of its
//! field errors so the UI can render them inline.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CURRENCY: &str = "USD";

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("hardcoded email regex is valid")
});

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Proposal,
    Quotation,
    #[default]
    Invoice,
}

impl DocumentType {
    /// Parses the `type` query value. Unknown values are rejected rather
    /// than silently treated as invoices.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "invoice" => Some(Self::Invoice),
            "quotation" => Some(Self::Quotation),
            "proposal" => Some(Self::Proposal),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Invoice => "invoice",
            Self::Quotation => "quotation",
            Self::Proposal => "proposal",
        }
    }

    pub const fn collection(self) -> Collection {
        match self {
            Self::Invoice => Collection::Invoice,
            Self::Quotation | Self::Proposal => Collection::Quotation,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Invoice => "Invoice",
            Self::Quotation => "Quotation",
            Self::Proposal => "Proposal",
        }
    }
}

/// Storage partition. Proposals are kept alongside quotations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Invoice,
    Quotation,
}

impl Collection {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "invoice" | "invoices" => Some(Self::Invoice),
            "quotation" | "quotations" | "proposal" | "proposals" => Some(Self::Quotation),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Invoice => "invoice",
            Self::Quotation => "quotation",
        }
    }

    pub const fn noun(self) -> &'static str {
        match self {
            Self::Invoice => "Invoice",
            Self::Quotation => "Quotation",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum DocumentStatus {
    #[default]
    Draft,
    Sent,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientInfo {
    pub name: String,
    pub organization_name: String,
    pub gst_vat_id: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
}

impl ClientInfo {
    /// Address parts joined the way the preview prints them.
    pub fn postal_address(&self) -> String {
        [&self.address, &self.city, &self.state, &self.zip, &self.country]
            .into_iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct BankDetails {
    pub account_name: String,
    pub bank_name: String,
    pub bank_address: String,
    pub account_number: String,
    pub ifsc_code: String,
    pub swift_code: String,
}

impl BankDetails {
    pub fn is_empty(&self) -> bool {
        [
            &self.account_name,
            &self.bank_name,
            &self.bank_address,
            &self.account_number,
            &self.ifsc_code,
            &self.swift_code,
        ]
        .iter()
        .all(|value| value.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Sender {
    pub name: String,
    pub email: String,
    pub address: String,
    pub phone: String,
    pub gst_vat_id: String,
    /// URL or data URI.
    pub logo: String,
    pub stamp: String,
    pub bank_details: Option<BankDetails>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceCategory {
    WebDevelopment,
    MobileDevelopment,
    Blockchain,
    ArtificialIntelligence,
    Saas,
    Other,
}

impl ServiceCategory {
    pub const fn label(self) -> &'static str {
        match self {
            Self::WebDevelopment => "Web & Software Dev",
            Self::MobileDevelopment => "Mobile App Dev",
            Self::Blockchain => "Blockchain & Web3",
            Self::ArtificialIntelligence => "AI-driven Solutions",
            Self::Saas => "SaaS Development",
            Self::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ApplicationType {
    #[default]
    Static,
    Dynamic,
    #[serde(rename = "Web App")]
    WebApp,
    Enterprise,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TargetPlatform {
    Android,
    #[serde(rename = "iOS")]
    Ios,
    #[default]
    Both,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum BuildApproach {
    #[default]
    Native,
    #[serde(rename = "Cross-platform")]
    CrossPlatform,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum AiDiscipline {
    #[default]
    #[serde(rename = "ML")]
    MachineLearning,
    #[serde(rename = "NLP")]
    LanguageProcessing,
    #[serde(rename = "Computer Vision")]
    ComputerVision,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ModelComplexity {
    #[default]
    Low,
    Mid,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ProcessingType {
    #[default]
    #[serde(rename = "Real-time")]
    RealTime,
    Batch,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct WebDevDetails {
    pub application_type: ApplicationType,
    pub pages_modules: u32,
    pub auth_requirements: bool,
    pub admin_dashboard: bool,
    pub third_party_integration: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct MobileDevDetails {
    pub target_platform: TargetPlatform,
    pub approach: BuildApproach,
    pub features: Vec<String>,
    pub offline_support: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockchainDetails {
    pub platform: String,
    pub smart_contract: bool,
    pub wallet_integration: bool,
    pub token_nft_dev: bool,
    pub security_audit: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AiDetails {
    pub discipline: AiDiscipline,
    pub dataset_availability: String,
    pub model_complexity: ModelComplexity,
    pub processing_type: ProcessingType,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SaasDetails {
    pub user_roles: String,
    pub subscription_model: String,
    pub multi_tenancy: bool,
    pub analytics: bool,
    pub payment_gateway: bool,
}

/// Category-specific fields of a line item, tagged by the category label.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "category")]
pub enum ServiceDetails {
    #[serde(rename = "Web & Software Dev")]
    WebDevelopment(WebDevDetails),
    #[serde(rename = "Mobile App Dev")]
    MobileDevelopment(MobileDevDetails),
    #[serde(rename = "Blockchain & Web3")]
    Blockchain(BlockchainDetails),
    #[serde(rename = "AI-driven Solutions")]
    ArtificialIntelligence(AiDetails),
    #[serde(rename = "SaaS Development")]
    Saas(SaasDetails),
    #[default]
    Other,
}

impl ServiceDetails {
    pub const fn category(&self) -> ServiceCategory {
        match self {
            Self::WebDevelopment(_) => ServiceCategory::WebDevelopment,
            Self::MobileDevelopment(_) => ServiceCategory::MobileDevelopment,
            Self::Blockchain(_) => ServiceCategory::Blockchain,
            Self::ArtificialIntelligence(_) => ServiceCategory::ArtificialIntelligence,
            Self::Saas(_) => ServiceCategory::Saas,
            Self::Other => ServiceCategory::Other,
        }
    }

    fn validate(&self, path: &str, errors: &mut Vec<FieldError>) {
        match self {
            Self::WebDevelopment(details) if details.pages_modules < 1 => {
                errors.push(FieldError::new(
                    format!("{path}.pagesModules"),
                    "At least 1 page/module required",
                ));
            }
            Self::Blockchain(details) if details.platform.trim().is_empty() => {
                errors.push(FieldError::new(format!("{path}.platform"), "Platform required"));
            }
            _ => {}
        }
    }
}

fn default_quantity() -> f64 {
    1.0
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(default)]
    pub service: ServiceDetails,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_quantity")]
    pub quantity: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub price: f64,
}

impl LineItem {
    pub fn amount(&self) -> f64 {
        self.quantity * self.price
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub invoice_number: String,
    /// Issue date; [`default_issue_date`] supplies today when it is omitted.
    pub date: NaiveDate,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub tax_rate: f64,
    #[serde(default)]
    pub discount: f64,
    #[serde(default)]
    pub payment_terms: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub status: DocumentStatus,
    #[serde(default)]
    pub is_paid: bool,
}

/// Fills a missing or null `settings.date` of a posted form with `today`.
pub fn default_issue_date(form: &mut serde_json::Value, today: NaiveDate) {
    let Some(settings) = form
        .get_mut("settings")
        .and_then(serde_json::Value::as_object_mut)
    else {
        return;
    };
    if settings.get("date").is_none_or(serde_json::Value::is_null) {
        settings.insert(
            "date".to_string(),
            serde_json::Value::String(today.format("%Y-%m-%d").to_string()),
        );
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentForm {
    #[serde(default)]
    pub document_type: DocumentType,
    #[serde(default)]
    pub sender: Sender,
    #[serde(default)]
    pub saved_senders: Vec<Sender>,
    /// Index into `saved_senders` the current sender block came from.
    #[serde(default)]
    pub selected_sender: Option<usize>,
    #[serde(default)]
    pub client: ClientInfo,
    #[serde(default)]
    pub items: Vec<LineItem>,
    pub settings: Settings,
}

/// Validation subsets, one per wizard gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Sender,
    SavedSenders,
    Client,
    Items,
    Settings,
}

impl Section {
    pub const ALL: [Self; 5] = [
        Self::Sender,
        Self::SavedSenders,
        Self::Client,
        Self::Items,
        Self::Settings,
    ];
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

impl FieldError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl DocumentForm {
    /// Copies a saved sender into the sender block and remembers its index.
    pub fn select_sender(&mut self, index: usize) -> bool {
        let Some(sender) = self.saved_senders.get(index) else {
            return false;
        };
        self.sender = sender.clone();
        self.selected_sender = Some(index);
        true
    }

    pub fn selected_saved_sender(&self) -> Option<&Sender> {
        self.selected_sender
            .and_then(|index| self.saved_senders.get(index))
    }

    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let errors = Section::ALL
            .iter()
            .flat_map(|section| self.validate_section(*section))
            .collect::<Vec<_>>();
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    pub fn validate_section(&self, section: Section) -> Vec<FieldError> {
        let mut errors = Vec::new();
        match section {
            Section::Sender => validate_sender(&self.sender, "sender", &mut errors),
            Section::SavedSenders => {
                for (index, sender) in self.saved_senders.iter().enumerate() {
                    validate_sender(sender, &format!("savedSenders.{index}"), &mut errors);
                }
                if let Some(index) = self.selected_sender {
                    if index >= self.saved_senders.len() {
                        errors.push(FieldError::new(
                            "selectedSender",
                            "Selected sender does not exist",
                        ));
                    }
                }
            }
            Section::Client => validate_client(&self.client, &mut errors),
            Section::Items => validate_items(&self.items, &mut errors),
            Section::Settings => validate_settings(&self.settings, &mut errors),
        }
        errors
    }
}

fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value.trim())
}

fn char_len(value: &str) -> usize {
    value.trim().chars().count()
}

fn validate_sender(sender: &Sender, path: &str, errors: &mut Vec<FieldError>) {
    if char_len(&sender.name) < 2 {
        errors.push(FieldError::new(format!("{path}.name"), "Company Name is required"));
    }
    if !is_valid_email(&sender.email) {
        errors.push(FieldError::new(format!("{path}.email"), "Invalid email"));
    }
    if char_len(&sender.address) < 5 {
        errors.push(FieldError::new(format!("{path}.address"), "Address is required"));
    }
}

fn validate_client(client: &ClientInfo, errors: &mut Vec<FieldError>) {
    if char_len(&client.name) < 2 {
        errors.push(FieldError::new("client.name", "Name is too short"));
    }
    if !client.email.trim().is_empty() && !is_valid_email(&client.email) {
        errors.push(FieldError::new("client.email", "Invalid email address"));
    }
}

fn validate_items(items: &[LineItem], errors: &mut Vec<FieldError>) {
    if items.is_empty() {
        errors.push(FieldError::new("items", "Add at least one item"));
        return;
    }

    for (index, item) in items.iter().enumerate() {
        let path = format!("items.{index}");
        if !item.quantity.is_finite() || item.quantity < 1.0 {
            errors.push(FieldError::new(
                format!("{path}.quantity"),
                "Quantity must be at least 1",
            ));
        }
        if !item.price.is_finite() {
            errors.push(FieldError::new(format!("{path}.price"), "Price must be a number"));
        } else if item.price < 0.0 {
            errors.push(FieldError::new(format!("{path}.price"), "Price cannot be negative"));
        }
        if item.currency.trim().is_empty() {
            errors.push(FieldError::new(format!("{path}.currency"), "Currency is required"));
        }
        if item.quantity.is_finite() && item.price.is_finite() && !item.amount().is_finite() {
            errors.push(FieldError::new(format!("{path}.price"), "Amount is too large"));
        }
        item.service.validate(&format!("{path}.service"), errors);
    }

    // Each amount can be finite while their sum is not.
    let amounts_finite = items.iter().all(|item| item.amount().is_finite());
    if amounts_finite && !crate::totals::subtotal(items).is_finite() {
        errors.push(FieldError::new("items", "Total is too large"));
    }
}

fn validate_settings(settings: &Settings, errors: &mut Vec<FieldError>) {
    if settings.invoice_number.trim().is_empty() {
        errors.push(FieldError::new(
            "settings.invoiceNumber",
            "Invoice number required",
        ));
    }
    if !(0.0..=100.0).contains(&settings.tax_rate) {
        errors.push(FieldError::new(
            "settings.taxRate",
            "Tax rate must be between 0 and 100",
        ));
    }
    if !settings.discount.is_finite() || settings.discount < 0.0 {
        errors.push(FieldError::new(
            "settings.discount",
            "Discount cannot be negative",
        ));
    }
}
