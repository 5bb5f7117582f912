//! Open Packaging Conventions (OPC) support.
//!
//! A .pptx file is a ZIP archive of XML parts plus binary media, tied together
//! by `[Content_Types].xml` and `.rels` relationship parts. This module
//! provides the container layer: part naming, relationship collections,
//! content-type mapping, and order-preserving ZIP decode/encode.

pub mod constants;
pub mod content_types;
pub mod error;
pub mod package;
pub mod packuri;
pub mod rel;

pub use content_types::ContentTypes;
pub use error::{OpcError, Result};
pub use package::{OpcPackage, OpcPart};
pub use packuri::PackURI;
pub use rel::{Relationship, Relationships};
