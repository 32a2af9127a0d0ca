//! # hr-letter-forge – template-driven HR letters → PDF
//!
//! This crate turns letter templates with `{{name}}` placeholders into
//! paginated business letters. The pipeline stages are:
//!
//! 1. **Classify** – extract placeholders and sort them into system, custom
//!    and unknown variables ([`variables`], [`catalog`])
//! 2. **Substitute** – format and insert values, highlighting custom ones
//!    ([`substitute`], [`profile`])
//! 3. **Parse** – letter markup → blocks of styled segments ([`markup`])
//! 4. **Assemble** – wrap the body in the French letter skeleton
//!    ([`assembler`])
//! 5. **Layout** – word-wrap and paginate onto fixed pages ([`layout`])
//! 6. **Render** – encode the page model as PDF via printpdf ([`render`])
//!
//! A C-compatible FFI surface is exposed via the [`ffi`] module.

pub mod assembler;
pub mod catalog;
pub mod error;
pub mod ffi;
pub mod fonts;
pub mod layout;
pub mod layout_config;
pub mod markup;
pub mod model;
pub mod pipeline;
pub mod profile;
pub mod render;
pub mod substitute;
pub mod templates;
pub mod variables;

// Re-exports for convenience
pub use error::Error;
pub use model::GeneratedDocument;
pub use pipeline::{build_document, generate_pdf, generate_pdf_from_json, GenerationRequest};
