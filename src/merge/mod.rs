//! The template merge engine.
//!
//! Takes a presentation template and a batch of contact records, substitutes
//! placeholder tokens per record, removes contact lines whose data is absent,
//! replaces the image token with an embedded picture, widens name shapes for
//! long names, and packages the generated documents into one archive.

pub mod batch;
pub mod image;
pub mod layout;
pub mod lines;
pub mod record;
pub mod resolver;
pub mod roles;
pub mod substitute;


pub use batch::{generate_batch, BatchError, BatchOptions, BatchResult, ProgressSink, RecordError};
pub use image::{ImageError, ImageGenerator, ShapeIdAllocator};
pub use lines::LineRemovalPolicy;
pub use record::Record;
pub use resolver::{ContactFormatPolicy, IMAGE_TOKEN};
pub use roles::RoleDictionary;

/// Policy bundle consulted throughout a merge.
///
/// All of it is configuration data with working defaults; the convention-
/// specific pieces (role dictionary, number formats, line labels) can be
/// swapped without touching the engine.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct MergePolicies {
    /// Role-to-English dictionary
    pub roles: RoleDictionary,

    /// Contact-number formatting conventions
    pub contact: ContactFormatPolicy,

    /// Labels that tie paragraphs to optional contact fields
    pub lines: LineRemovalPolicy,
}
