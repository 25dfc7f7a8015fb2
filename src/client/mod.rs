//! Edit request client.

mod gemini;

pub use gemini::{GeminiEditClient, GeminiEditClientBuilder, GeminiModel};

use crate::encoded::EncodedImage;
use crate::error::Result;
use async_trait::async_trait;

/// A single edit request: the base image plus the user's instruction.
///
/// Constructed transiently per submission and never persisted. The session
/// guarantees the instruction is non-empty after trimming before a client
/// ever sees it.
#[derive(Debug, Clone)]
pub struct EditRequest {
    /// The image to edit.
    pub image: EncodedImage,
    /// Free-text description of the desired change.
    pub instruction: String,
}

impl EditRequest {
    /// Creates a new edit request.
    pub fn new(image: EncodedImage, instruction: impl Into<String>) -> Self {
        Self {
            image,
            instruction: instruction.into(),
        }
    }
}

/// Trait for remote image-edit services.
///
/// Implementations are stateless across calls; the session owns all images.
#[async_trait]
pub trait EditClient: Send + Sync {
    /// Sends exactly one edit request and returns the edited image.
    ///
    /// No retries, no queuing: one invocation is one attempt, and every
    /// failure path is side-effect free for the caller.
    async fn edit(&self, request: &EditRequest) -> Result<EncodedImage>;

    /// Returns the model identifier requests are sent to.
    fn model(&self) -> &str;
}
