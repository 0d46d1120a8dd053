//! The three step timetable form: upload the schedule, choose invigilators,
//! choose venues, then generate.
//!
//! Moving forward, whether with "next" or by picking a tab directly, always
//! requires every earlier step to be complete. Moving back is always allowed.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::model::NamedRecord;
use crate::names::{self, NameList};
use crate::proxy::{GenerateTimetable, GenerationError};
use crate::timetable::{DocxFile, GeneratedArtifact, UploadRequest};

pub const MIN_INVIGILATORS: usize = 2;
pub const MIN_VENUES: usize = 1;

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Upload,
    Invigilators,
    Venues,
    Done,
}

impl Step {
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Invigilators => "invigilators",
            Self::Venues => "venues",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unknown step {0:?}")]
pub struct UnknownStep(pub String);

impl FromStr for Step {
    type Err = UnknownStep;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "upload" => Ok(Self::Upload),
            "invigilators" => Ok(Self::Invigilators),
            "venues" => Ok(Self::Venues),
            "done" => Ok(Self::Done),
            other => Err(UnknownStep(other.to_owned())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowVariant {
    WithVenues,
    InvigilatorsOnly,
}

impl FlowVariant {
    #[must_use]
    pub const fn from_require_venues(require_venues: bool) -> Self {
        if require_venues {
            Self::WithVenues
        } else {
            Self::InvigilatorsOnly
        }
    }

    #[must_use]
    pub const fn collects_venues(self) -> bool {
        matches!(self, Self::WithVenues)
    }

    /// The steps that take input, in order.
    #[must_use]
    pub const fn input_steps(self) -> &'static [Step] {
        match self {
            Self::WithVenues => &[Step::Upload, Step::Invigilators, Step::Venues],
            Self::InvigilatorsOnly => &[Step::Upload, Step::Invigilators],
        }
    }

    #[must_use]
    pub fn contains(self, step: Step) -> bool {
        step == Step::Done || self.input_steps().contains(&step)
    }
}

/// Names either typed as a comma separated list or picked from the reference
/// records.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NameInput {
    Text(String),
    Records(Vec<NamedRecord>),
}

impl Default for NameInput {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl NameInput {
    /// The value sent in the multipart field.
    #[must_use]
    pub fn field_value(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Records(records) => names::join(records.iter().map(|record| record.name.as_str())),
        }
    }

    /// Picked records count one each, even when a name contains a comma.
    #[must_use]
    pub fn count(&self) -> usize {
        match self {
            Self::Text(text) => NameList::parse(text).count(),
            Self::Records(records) => records
                .iter()
                .filter(|record| !record.name.trim().is_empty())
                .count(),
        }
    }

    #[must_use]
    pub fn selected_ids(&self) -> Vec<i64> {
        match self {
            Self::Text(_) => Vec::new(),
            Self::Records(records) => records.iter().map(|record| record.id).collect(),
        }
    }
}

#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum WizardError {
    #[error("Only .docx documents can be uploaded")]
    NotDocx,
    #[error("Please upload a DOCX file containing the exam schedule")]
    MissingFile,
    #[error("Please enter at least two invigilators")]
    NotEnoughInvigilators,
    #[error("Please enter at least one venue")]
    NotEnoughVenues,
    #[error("Complete the earlier steps before opening {0}")]
    StepLocked(Step),
    #[error("The {0} step is not part of this form")]
    NotInFlow(Step),
    #[error("A timetable has already been generated, start over to create another one")]
    AlreadyDone,
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

#[derive(Clone, Debug)]
pub struct Wizard {
    variant: FlowVariant,
    step: Step,
    file: Option<DocxFile>,
    invigilators: NameInput,
    venues: NameInput,
    artifact: Option<GeneratedArtifact>,
    error: Option<String>,
}

impl Wizard {
    #[must_use]
    pub fn new(variant: FlowVariant) -> Self {
        Self {
            variant,
            step: Step::Upload,
            file: None,
            invigilators: NameInput::default(),
            venues: NameInput::default(),
            artifact: None,
            error: None,
        }
    }

    #[must_use]
    pub const fn variant(&self) -> FlowVariant {
        self.variant
    }

    #[must_use]
    pub const fn step(&self) -> Step {
        self.step
    }

    #[must_use]
    pub const fn file(&self) -> Option<&DocxFile> {
        self.file.as_ref()
    }

    #[must_use]
    pub const fn invigilators(&self) -> &NameInput {
        &self.invigilators
    }

    #[must_use]
    pub const fn venues(&self) -> &NameInput {
        &self.venues
    }

    #[must_use]
    pub const fn artifact(&self) -> Option<&GeneratedArtifact> {
        self.artifact.as_ref()
    }

    /// The last problem to show next to the form, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Shows a problem that happened outside the form, like the reference
    /// records failing to load.
    pub fn report(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    fn fail<T>(&mut self, error: WizardError) -> Result<T, WizardError> {
        self.error = Some(error.to_string());
        Err(error)
    }

    fn ensure_editable(&mut self) -> Result<(), WizardError> {
        if self.artifact.is_some() {
            return self.fail(WizardError::AlreadyDone);
        }
        Ok(())
    }

    pub fn choose_file(&mut self, file: DocxFile) -> Result<(), WizardError> {
        self.ensure_editable()?;
        if !file.is_docx() {
            return self.fail(WizardError::NotDocx);
        }
        debug!(file_name = %file.file_name, size = file.size(), "schedule document chosen");
        self.file = Some(file);
        self.error = None;
        Ok(())
    }

    pub fn remove_file(&mut self) -> Result<(), WizardError> {
        self.ensure_editable()?;
        self.file = None;
        Ok(())
    }

    pub fn set_invigilators(&mut self, input: NameInput) -> Result<(), WizardError> {
        self.ensure_editable()?;
        self.invigilators = input;
        Ok(())
    }

    pub fn set_venues(&mut self, input: NameInput) -> Result<(), WizardError> {
        self.ensure_editable()?;
        if !self.variant.collects_venues() {
            return self.fail(WizardError::NotInFlow(Step::Venues));
        }
        self.venues = input;
        Ok(())
    }

    fn step_requirement(&self, step: Step) -> Result<(), WizardError> {
        match step {
            Step::Upload if self.file.is_none() => Err(WizardError::MissingFile),
            Step::Invigilators if self.invigilators.count() < MIN_INVIGILATORS => {
                Err(WizardError::NotEnoughInvigilators)
            }
            Step::Venues
                if self.variant.collects_venues() && self.venues.count() < MIN_VENUES =>
            {
                Err(WizardError::NotEnoughVenues)
            }
            Step::Done if self.artifact.is_none() => Err(WizardError::StepLocked(Step::Done)),
            _ => Ok(()),
        }
    }

    #[must_use]
    pub fn is_step_complete(&self, step: Step) -> bool {
        self.step_requirement(step).is_ok()
    }

    /// Whether every step before `step` is complete.
    #[must_use]
    pub fn can_enter(&self, step: Step) -> bool {
        if !self.variant.contains(step) {
            return false;
        }
        if step == Step::Done {
            return self.artifact.is_some();
        }
        self.variant
            .input_steps()
            .iter()
            .take_while(|earlier| **earlier != step)
            .all(|earlier| self.is_step_complete(*earlier))
    }

    fn following(&self) -> Option<Step> {
        let steps = self.variant.input_steps();
        let position = steps.iter().position(|step| *step == self.step)?;
        steps.get(position + 1).copied()
    }

    /// Moves to the following step if the current one is complete. The last
    /// input step has no following step; it is left by submitting.
    pub fn next(&mut self) -> Result<Step, WizardError> {
        self.ensure_editable()?;
        if let Err(error) = self.step_requirement(self.step) {
            return self.fail(error);
        }
        if let Some(following) = self.following() {
            self.step = following;
            self.error = None;
        }
        Ok(self.step)
    }

    /// Opens a tab directly. Forward jumps need the same completeness as
    /// [`Wizard::next`].
    pub fn select_tab(&mut self, step: Step) -> Result<(), WizardError> {
        if !self.variant.contains(step) {
            return self.fail(WizardError::NotInFlow(step));
        }
        if step != Step::Done {
            self.ensure_editable()?;
        }
        if !self.can_enter(step) {
            return self.fail(WizardError::StepLocked(step));
        }
        self.step = step;
        self.error = None;
        Ok(())
    }

    /// Checks the local preconditions and builds the request the proxy expects.
    pub fn build_request(&self) -> Result<UploadRequest, WizardError> {
        let file = self.file.clone().ok_or(WizardError::MissingFile)?;
        self.step_requirement(Step::Invigilators)?;
        self.step_requirement(Step::Venues)?;
        Ok(UploadRequest {
            file,
            invigilators: self.invigilators.field_value(),
            venues: self
                .variant
                .collects_venues()
                .then(|| self.venues.field_value()),
        })
    }

    /// Sends the form. Success moves to [`Step::Done`] holding the artifact;
    /// failure keeps the current step and records the message.
    pub async fn submit<G>(&mut self, generator: &G) -> Result<&GeneratedArtifact, WizardError>
    where
        G: GenerateTimetable + ?Sized,
    {
        self.ensure_editable()?;
        let request = match self.build_request() {
            Ok(request) => request,
            Err(error) => return self.fail(error),
        };
        self.error = None;
        match generator.generate(request).await {
            Ok(artifact) => {
                info!(size = artifact.bytes.len(), "timetable generated");
                self.step = Step::Done;
                Ok(self.artifact.insert(artifact))
            }
            Err(error) => {
                info!(message = %error, "timetable generation failed");
                self.fail(error.into())
            }
        }
    }

    /// Drops the artifact and every selection and starts over at the upload step.
    pub fn reset(&mut self) {
        *self = Self::new(self.variant);
    }
}
