//! Talking to the scheduling backend and driving the timetable form.
//!
//! [`reference`] manages the invigilator and venue lists, [`timetable`] sends
//! generation requests to the scheduling backend, [`proxy`] calls the upload
//! proxy like the browser form does and [`wizard`] holds the form state.

pub mod model;
pub mod names;
pub mod proxy;
pub mod reference;
pub mod timetable;
pub mod wizard;

pub use model::{ErrorBody, NamedRecord, ResourceKind};
pub use proxy::{GenerateTimetable, GenerationError, ProxyClient};
pub use reference::{ReferenceDataClient, ReferenceDataError};
pub use timetable::{BackendReply, DocxFile, GeneratedArtifact, TimetableBackend, UploadRequest};
pub use wizard::{FlowVariant, NameInput, Step, Wizard, WizardError};
