//! Prompt templating and context-row rendering.
//!
//! This crate turns a user prompt plus tagged context columns into the final
//! text and media payload handed to a provider adapter: section templates
//! with placeholder substitution, tuple serialization (json/markdown/csv),
//! audio transcription through a secondary model, and image source
//! resolution.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod media;
mod render;
mod template;
mod tuples_text;

pub use media::MediaResolver;
pub use render::{ContextRenderer, RenderedBatch};
pub use template::{prompt_template, replace_section, Section};
pub use tuples_text::render_tuples;
