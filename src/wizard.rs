//! Four-step intake wizard in front of report generation.

use log::{debug, info};
use thiserror::Error;

use crate::client::{ApiClient, ClientError, IntakeFields, MetadataFile};
use crate::report::ReportView;

pub const STEPS: [&str; 4] = ["General", "Model Meta", "Risk Notes", "Result"];
pub const RESULT_STEP: usize = STEPS.len() - 1;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("required field(s) missing: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
}

impl ValidationError {
    pub fn fields(&self) -> &[&'static str] {
        match self {
            ValidationError::Missing(f) => f,
        }
    }
}

/// Required general fields, trimmed.
pub fn validate(form: &IntakeFields) -> Result<(), ValidationError> {
    let missing: Vec<&'static str> = [
        ("system_name", &form.system_name),
        ("intended_purpose", &form.intended_purpose),
        ("use_case", &form.use_case),
    ]
    .into_iter()
    .filter(|(_, v)| v.trim().is_empty())
    .map(|(name, _)| name)
    .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Missing(missing))
    }
}

#[derive(Debug, Default)]
pub struct Wizard {
    step: usize,
    pub form: IntakeFields,
    pub file: Option<MetadataFile>,
    pub view: ReportView,
}

impl Wizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> usize {
        self.step
    }

    /// `Step 2 of 4: Model Meta`
    pub fn step_label(&self) -> String {
        format!("Step {} of {}: {}", self.step + 1, STEPS.len(), STEPS[self.step])
    }

    pub fn at_result(&self) -> bool {
        self.step == RESULT_STEP
    }

    /// Move forward one step. Leaving the first step requires the general
    /// fields to be filled in.
    pub fn next(&mut self) -> Result<usize, ValidationError> {
        if self.step == 0 {
            validate(&self.form)?;
        }
        self.step = (self.step + 1).min(RESULT_STEP);
        debug!("wizard step -> {}", self.step_label());
        Ok(self.step)
    }

    pub fn back(&mut self) -> usize {
        self.step = self.step.saturating_sub(1);
        self.step
    }

    /// Replace the form with pre-filled values. Any attached file is dropped
    /// and the wizard returns to the first step.
    pub fn prefill(&mut self, fields: IntakeFields) {
        info!("wizard pre-filled for {:?}", fields.system_name);
        self.form = fields;
        self.file = None;
        self.step = 0;
    }

    pub async fn load_demo(&mut self, client: &ApiClient) -> Result<(), ClientError> {
        let fields = client.demo_config().await?;
        self.prefill(fields);
        Ok(())
    }

    /// Generate from the current form, with the metadata file if attached.
    /// The outcome lands in [`Wizard::view`].
    pub async fn generate(&mut self, client: &ApiClient) -> &ReportView {
        let result = match &self.file {
            Some(file) => client.generate_with_file(&self.form, file).await,
            None => client.generate(&self.form).await,
        };
        self.view.apply(result);
        &self.view
    }

    pub fn share_link(&self, client: &ApiClient) -> Option<String> {
        let id = self.view.report.as_ref()?.project_id?;
        Some(client.share_url(id))
    }
}
