//! PowerPoint (.pptx) presentation support.
//!
//! Provides the document model the merge engine operates on: a validated
//! package wrapper (`Presentation`), a mutable slide element tree, and
//! helpers for shapes, text bodies, paragraphs, runs and picture elements.

pub mod dom;
pub mod error;
pub mod format;
pub mod package;
pub mod picture;
pub mod slide;

pub use dom::{XmlElement, XmlNode};
pub use error::{PptxError, Result, TemplateInvalid};
pub use format::ImageFormat;
pub use package::{OpenLimits, Presentation};
pub use slide::{Slide, Transform};
