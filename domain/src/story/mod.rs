//! Story domain module
//!
//! The [`Document`] is the record an authoring session builds: a title,
//! free-form research notes, an ordered list of [`Segment`]s and the
//! citations gathered along the way.
//!
//! ```text
//! Document (location: StoryLocation)
//!   ├─ title
//!   ├─ research_notes
//!   ├─ segments[]  ── Segment { title, text, images[] }
//!   └─ citations[]       (in memory only, not serialized)
//! ```
//!
//! Segment fields change only through [`SectionWrite`] commands, so append
//! and replace semantics are explicit at every call site.

pub mod document;
pub mod location;
pub mod section;

pub use document::{Document, DocumentRecord, Segment};
pub use location::StoryLocation;
pub use section::SectionWrite;
