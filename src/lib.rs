#![warn(missing_docs)]
//! PixelWand - AI-assisted photo editing via the Gemini image model.
//!
//! A user-supplied photo plus a natural-language instruction goes out as a
//! single `generateContent` call; the edited image comes back as a data-URI
//! payload. The crate has three parts: file [ingestion](ingest), the
//! [edit client](client) and the per-session [state machine](session).
//!
//! # Quick Start
//!
//! ```no_run
//! use pixelwand::{edit_with, EditSession, GeminiEditClient};
//! use tokio::sync::Mutex;
//!
//! #[tokio::main]
//! async fn main() -> pixelwand::Result<()> {
//!     let client = GeminiEditClient::builder().build();
//!     let session = Mutex::new(EditSession::new());
//!
//!     let photo = pixelwand::ingest("photo.jpg").await?;
//!     session.lock().await.set_original(photo);
//!
//!     let _ = edit_with(&session, &client, "Make it look like a sunset").await;
//!     if let Some(edited) = session.lock().await.edited() {
//!         edited.save("edited-magic.png")?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
mod encoded;
mod error;
mod ingest;
pub mod session;

pub use client::{EditClient, EditRequest, GeminiEditClient, GeminiEditClientBuilder, GeminiModel};
pub use encoded::{EncodedImage, ImageFormat, DOWNLOAD_FILE_NAME};
pub use error::{EditError, Result};
pub use ingest::{ingest, ingest_bytes};
pub use session::{edit_with, EditSession, EditTicket, SessionStatus, SubmitError};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::client::{EditClient, EditRequest, GeminiEditClient};
    pub use crate::encoded::EncodedImage;
    pub use crate::error::{EditError, Result};
    pub use crate::session::{edit_with, EditSession, SessionStatus};
}
