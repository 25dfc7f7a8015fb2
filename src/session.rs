//! Edit session controller.
//!
//! A per-session state machine around the edit client. The session owns the
//! original and edited images; the client owns nothing. States are a tagged
//! union so combinations like "loading with an error set" cannot exist.
//!
//! In-flight results are matched against a generation counter: a reset or a
//! new original while a request is outstanding bumps the counter, and the
//! stale resolution is dropped instead of clobbering the fresh state.

use crate::client::{EditClient, EditRequest};
use crate::encoded::EncodedImage;
use crate::error::Result;

/// Shown when the user submits a blank instruction.
pub const VALIDATION_MESSAGE: &str = "Please enter a description of what you'd like to change.";

/// Status message while an edit is in flight.
pub const LOADING_MESSAGE: &str = "Rubbing the magic lamp... Gemini is working!";

/// Status message after a successful edit.
pub const SUCCESS_MESSAGE: &str = "Magic complete!";

/// Failure text of last resort, when an error renders to nothing.
const FALLBACK_FAILURE: &str = "Something went wrong. The magic fizzled out.";

/// Observable session state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionStatus {
    /// No edit attempted since the original was (re)set.
    #[default]
    Idle,
    /// An edit request is in flight.
    Loading {
        /// Progress text for the presentation layer.
        message: String,
    },
    /// The last edit produced an image.
    Succeeded {
        /// Completion text for the presentation layer.
        message: String,
    },
    /// The last edit failed.
    Failed {
        /// User-facing failure text.
        error: String,
    },
}

impl SessionStatus {
    /// True while an edit request is outstanding.
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    /// The failure text, when in the failed state.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed { error } => Some(error),
            _ => None,
        }
    }
}

/// Reasons a submission is rejected before any request is issued.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    /// Instruction was empty or whitespace after trimming.
    #[error("Please enter a description of what you'd like to change.")]
    EmptyInstruction,
    /// A previous edit is still in flight (concurrent submissions are
    /// rejected, not queued).
    #[error("an edit is already in progress")]
    EditInFlight,
    /// No original image has been loaded.
    #[error("no image has been uploaded")]
    NoImage,
}

/// Token handed out by [`EditSession::begin`], pairing the request inputs
/// with the generation they were issued under.
#[derive(Debug, Clone, PartialEq)]
pub struct EditTicket {
    generation: u64,
    image: EncodedImage,
    instruction: String,
}

impl EditTicket {
    /// The image to edit (always the session's original).
    pub fn image(&self) -> &EncodedImage {
        &self.image
    }

    /// The trimmed instruction.
    pub fn instruction(&self) -> &str {
        &self.instruction
    }
}

/// Per-session controller for the edit cycle.
#[derive(Debug, Default)]
pub struct EditSession {
    original: Option<EncodedImage>,
    edited: Option<EncodedImage>,
    status: SessionStatus,
    generation: u64,
    validation_error: Option<String>,
}

impl EditSession {
    /// Creates an idle session with no image loaded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a new original image, discarding any previous edit.
    pub fn set_original(&mut self, image: EncodedImage) {
        self.generation += 1;
        self.original = Some(image);
        self.edited = None;
        self.status = SessionStatus::Idle;
        self.validation_error = None;
    }

    /// Drops both images and returns to idle, regardless of current phase.
    /// An in-flight request is not cancelled; its late result is dropped by
    /// the generation check in [`resolve`](Self::resolve).
    pub fn reset(&mut self) {
        self.generation += 1;
        self.original = None;
        self.edited = None;
        self.status = SessionStatus::Idle;
        self.validation_error = None;
    }

    /// The current original image.
    pub fn original(&self) -> Option<&EncodedImage> {
        self.original.as_ref()
    }

    /// The most recent successful edit.
    pub fn edited(&self) -> Option<&EncodedImage> {
        self.edited.as_ref()
    }

    /// The current status.
    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    /// The pending blank-instruction message, if the last submission was
    /// rejected for being empty. Held outside [`SessionStatus`] because that
    /// rejection does not transition the phase.
    pub fn validation_error(&self) -> Option<&str> {
        self.validation_error.as_deref()
    }

    /// Starts an edit: validates the instruction, moves to loading and hands
    /// back the ticket to run the request under.
    ///
    /// Each ticket carries the session's **original** image; edits are never
    /// chained on top of a previous result.
    pub fn begin(&mut self, instruction: &str) -> std::result::Result<EditTicket, SubmitError> {
        let instruction = instruction.trim();
        if instruction.is_empty() {
            // No phase transition, just the hint.
            self.validation_error = Some(VALIDATION_MESSAGE.to_string());
            return Err(SubmitError::EmptyInstruction);
        }
        if self.status.is_loading() {
            return Err(SubmitError::EditInFlight);
        }
        let image = self.original.clone().ok_or(SubmitError::NoImage)?;

        self.validation_error = None;
        self.status = SessionStatus::Loading {
            message: LOADING_MESSAGE.to_string(),
        };
        Ok(EditTicket {
            generation: self.generation,
            image,
            instruction: instruction.to_string(),
        })
    }

    /// Applies the outcome of the request started by `ticket`.
    ///
    /// A ticket from a stale generation (reset or new original since) is
    /// ignored so a late resolution cannot overwrite fresh state.
    pub fn resolve(&mut self, ticket: EditTicket, outcome: Result<EncodedImage>) {
        if ticket.generation != self.generation {
            tracing::debug!(
                ticket_generation = ticket.generation,
                session_generation = self.generation,
                "dropping stale edit result"
            );
            return;
        }

        match outcome {
            Ok(edited) => {
                self.edited = Some(edited);
                self.status = SessionStatus::Succeeded {
                    message: SUCCESS_MESSAGE.to_string(),
                };
            }
            Err(err) => {
                self.edited = None;
                let mut error = err.user_message();
                if error.is_empty() {
                    error = FALLBACK_FAILURE.to_string();
                }
                self.status = SessionStatus::Failed { error };
            }
        }
    }
}

/// Runs one full edit cycle against a shared session.
///
/// The lock is released while the request is in flight, so the session stays
/// observable (and resettable) mid-edit; the ticket's generation check keeps
/// a reset from being overwritten when the call finally lands.
pub async fn edit_with<C>(
    session: &tokio::sync::Mutex<EditSession>,
    client: &C,
    instruction: &str,
) -> std::result::Result<(), SubmitError>
where
    C: EditClient + ?Sized,
{
    let ticket = session.lock().await.begin(instruction)?;

    let request = EditRequest::new(ticket.image().clone(), ticket.instruction());
    let outcome = client.edit(&request).await;

    session.lock().await.resolve(ticket, outcome);
    Ok(())
}
