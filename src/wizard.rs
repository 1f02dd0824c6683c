use serde::{Deserialize, Serialize};

use crate::schema::{DocumentForm, DocumentType, FieldError, Section};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Step {
    Company,
    Type,
    Upload,
    Client,
    Services,
    Details,
    Payment,
    Preview,
}

const PRICED_STEPS: [Step; 6] = [
    Step::Company,
    Step::Type,
    Step::Client,
    Step::Services,
    Step::Payment,
    Step::Preview,
];

const PROPOSAL_STEPS: [Step; 6] = [
    Step::Company,
    Step::Type,
    Step::Upload,
    Step::Client,
    Step::Details,
    Step::Preview,
];

impl Step {
    /// Sections that must validate before leaving this step forward.
    pub const fn gate(self) -> &'static [Section] {
        match self {
            Self::Company => &[Section::SavedSenders, Section::Sender],
            Self::Client => &[Section::Client],
            Self::Services => &[Section::Items],
            Self::Payment => &[Section::Settings],
            Self::Type | Self::Upload | Self::Details | Self::Preview => &[],
        }
    }
}

pub const fn steps_for(document_type: DocumentType) -> &'static [Step] {
    match document_type {
        DocumentType::Invoice | DocumentType::Quotation => &PRICED_STEPS,
        DocumentType::Proposal => &PROPOSAL_STEPS,
    }
}

/// Position in the step sequence of one document type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wizard {
    document_type: DocumentType,
    current: usize,
}

impl Wizard {
    pub fn new(document_type: DocumentType) -> Self {
        Self::resume(document_type, 0)
    }

    /// Restores a saved position, clamped into the sequence.
    pub fn resume(document_type: DocumentType, step: usize) -> Self {
        let mut wizard = Self {
            document_type,
            current: step,
        };
        wizard.clamp();
        wizard
    }

    pub fn steps(&self) -> &'static [Step] {
        steps_for(self.document_type)
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_step(&self) -> Step {
        self.steps()[self.current]
    }

    pub fn document_type(&self) -> DocumentType {
        self.document_type
    }

    pub fn is_last_step(&self) -> bool {
        self.current + 1 == self.steps().len()
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn progress_percent(&self) -> u8 {
        let last = self.steps().len().saturating_sub(1);
        if last == 0 {
            return 100;
        }
        ((self.current as f64 / last as f64) * 100.0).round() as u8
    }

    pub fn set_document_type(&mut self, document_type: DocumentType) {
        self.document_type = document_type;
        self.clamp();
    }

    pub fn validate_current(&self, form: &DocumentForm) -> Vec<FieldError> {
        self.current_step()
            .gate()
            .iter()
            .flat_map(|section| form.validate_section(*section))
            .collect()
    }

    pub fn next(&mut self, form: &DocumentForm) -> Result<Step, Vec<FieldError>> {
        self.ensure_current_valid(form)?;
        self.current = (self.current + 1).min(self.steps().len() - 1);
        Ok(self.current_step())
    }

    pub fn back(&mut self) -> Step {
        self.current = self.current.saturating_sub(1);
        self.current_step()
    }

    /// Backward jumps are free; staying or moving forward needs the current
    /// step to pass.
    pub fn jump_to(&mut self, index: usize, form: &DocumentForm) -> Result<Step, Vec<FieldError>> {
        let target = index.min(self.steps().len() - 1);
        if target >= self.current {
            self.ensure_current_valid(form)?;
        }
        self.current = target;
        Ok(self.current_step())
    }

    fn ensure_current_valid(&self, form: &DocumentForm) -> Result<(), Vec<FieldError>> {
        let errors = self.validate_current(form);
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    fn clamp(&mut self) {
        self.current = self.current.min(self.steps().len() - 1);
    }
}
