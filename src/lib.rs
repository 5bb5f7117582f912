//! Longan - a PowerPoint template merge engine
//!
//! Longan merges contact records into a .pptx template and packages the
//! generated presentations into a single archive. Placeholder tokens such
//! as `{name}` or `{email}` inside run text are substituted per record,
//! contact lines whose backing data is absent are removed, the `{qr}` token
//! shape is replaced by a generated picture, and name boxes are widened for
//! long names.
//!
//! # Example
//!
//! ```no_run
//! use longan::{generate_batch, BatchOptions, Record};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let template = std::fs::read("card_template.pptx")?;
//!
//! let mut record = Record::named("김철수");
//! record.organization = "한빛전자".to_string();
//! record.email = "kim@hanbit.example".to_string();
//!
//! let result = generate_batch(
//!     &[record],
//!     &template,
//!     std::path::Path::new("out"),
//!     &BatchOptions::default(),
//!     None,
//!     None,
//! )?;
//! println!("{} generated, archive at {}", result.generated, result.archive_path.display());
//! # Ok(())
//! # }
//! ```
//!
//! The per-record work is embarrassingly parallel and runs on a rayon pool;
//! the only cross-record state is the atomic shape-identifier allocator.

pub mod common;
pub mod merge;
pub mod opc;
pub mod pptx;

#[cfg(test)]
pub(crate) mod test_util;

pub use merge::{
    generate_batch, BatchError, BatchOptions, BatchResult, ContactFormatPolicy, ImageError,
    ImageGenerator, LineRemovalPolicy, MergePolicies, ProgressSink, Record, RecordError,
    RoleDictionary, ShapeIdAllocator, IMAGE_TOKEN,
};
pub use pptx::{ImageFormat, OpenLimits, Presentation, PptxError, TemplateInvalid};
