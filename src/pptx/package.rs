/// The presentation package: validated open, slide access, media embedding,
/// and save.
use crate::opc::constants::{content_type, relationship_type};
use crate::opc::packuri::{CONTENT_TYPES_URI, PACKAGE_URI};
use crate::opc::{ContentTypes, OpcPackage, PackURI, Relationships};
use crate::pptx::dom::XmlElement;
use crate::pptx::error::{PptxError, Result, TemplateInvalid};
use crate::pptx::format::ImageFormat;
use crate::pptx::slide::Slide;

/// ZIP local-file-header signature every OPC package must start with.
const ZIP_SIGNATURE: &[u8; 4] = b"PK\x03\x04";

/// Limits applied before a package is decoded.
#[derive(Debug, Clone, Copy)]
pub struct OpenLimits {
    /// Maximum package size in bytes
    pub max_package_bytes: u64,
}

impl Default for OpenLimits {
    fn default() -> Self {
        Self {
            // 50 MiB is far beyond any sane slide template
            max_package_bytes: 50 * 1024 * 1024,
        }
    }
}

/// Validate the cheap container invariants without decoding anything.
///
/// Classified fail-fast checks: empty input, ZIP signature, size ceiling.
/// Only the slice length and the first four bytes are inspected.
pub fn validate_container(bytes: &[u8], limits: &OpenLimits) -> std::result::Result<(), TemplateInvalid> {
    if bytes.is_empty() {
        return Err(TemplateInvalid::Empty);
    }
    if bytes.len() < ZIP_SIGNATURE.len() || &bytes[..ZIP_SIGNATURE.len()] != ZIP_SIGNATURE {
        return Err(TemplateInvalid::InvalidFormat);
    }
    if bytes.len() as u64 > limits.max_package_bytes {
        return Err(TemplateInvalid::TooLarge {
            size: bytes.len() as u64,
            limit: limits.max_package_bytes,
        });
    }
    Ok(())
}

/// A presentation package with its slides parsed into mutable trees.
///
/// Parts other than slides, slide relationships and `[Content_Types].xml`
/// round-trip untouched through `save`.
#[derive(Debug)]
pub struct Presentation {
    package: OpcPackage,
    content_types: ContentTypes,
    content_types_dirty: bool,
    slides: Vec<Slide>,
}

impl Presentation {
    /// Open a presentation from package bytes with default limits.
    pub fn open(bytes: &[u8]) -> Result<Self> {
        Self::open_with_limits(bytes, &OpenLimits::default())
    }

    /// Open a presentation from package bytes.
    ///
    /// Runs `validate_container` first, then decodes the package and parses
    /// the slide parts in presentation order.
    pub fn open_with_limits(bytes: &[u8], limits: &OpenLimits) -> Result<Self> {
        validate_container(bytes, limits)?;

        let package = OpcPackage::from_bytes(bytes)
            .map_err(|e| TemplateInvalid::Corrupted(e.to_string()))?;

        let ct_xml = package
            .part(CONTENT_TYPES_URI)
            .ok_or_else(|| TemplateInvalid::Corrupted("missing [Content_Types].xml".to_string()))?;
        let content_types = ContentTypes::from_xml(ct_xml)
            .map_err(|e| TemplateInvalid::Corrupted(e.to_string()))?;

        let mut slides = Vec::new();
        for partname in slide_partnames(&package, &content_types)? {
            let xml = package
                .part(partname.as_str())
                .ok_or_else(|| PptxError::PartNotFound(partname.as_str().to_string()))?;
            slides.push(Slide::parse(partname.clone(), xml)?);
        }

        Ok(Self {
            package,
            content_types,
            content_types_dirty: false,
            slides,
        })
    }

    /// Number of slides.
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Slides in presentation order.
    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    /// A slide by index, mutably.
    pub fn slide_mut(&mut self, index: usize) -> Option<&mut Slide> {
        self.slides.get_mut(index)
    }

    /// Embed image bytes as a media part and relate it to a slide.
    ///
    /// Adds `/ppt/media/imageN.<ext>`, ensures the content-type default for
    /// the extension, and adds (or reuses) an image relationship on the
    /// slide's `.rels` part. Returns the relationship ID for use in a
    /// `p:pic` element.
    pub fn add_slide_image(
        &mut self,
        slide_index: usize,
        bytes: Vec<u8>,
        format: ImageFormat,
    ) -> Result<String> {
        let slide_partname = self
            .slides
            .get(slide_index)
            .map(|s| s.partname().clone())
            .ok_or_else(|| PptxError::PartNotFound(format!("slide index {}", slide_index)))?;

        let media_partname = self
            .package
            .next_partname(&format!("/ppt/media/image%d.{}", format.extension()))?;
        self.package.add_part(media_partname.clone(), bytes)?;

        if self.content_types.ensure_default(format.extension(), format.mime_type()) {
            self.content_types_dirty = true;
        }

        let rels_uri = slide_partname
            .rels_uri()
            .map_err(crate::opc::OpcError::InvalidPackUri)?;
        let mut rels = match self.package.part(rels_uri.as_str()) {
            Some(xml) => Relationships::from_xml(slide_partname.base_uri(), xml)?,
            None => Relationships::new(slide_partname.base_uri()),
        };

        let target = relative_ref(slide_partname.base_uri(), &media_partname);
        let r_id = rels.get_or_add(relationship_type::IMAGE, &target).r_id().to_string();
        self.package.put_part(rels_uri, rels.to_xml().into_bytes());

        Ok(r_id)
    }

    /// Serialize the presentation back to package bytes.
    ///
    /// Modified slide trees and the content-type stream (when new media
    /// extensions were registered) are re-encoded; everything else is
    /// written back byte-identically.
    pub fn save(&mut self) -> Result<Vec<u8>> {
        for slide in &self.slides {
            if slide.is_modified() {
                self.package
                    .set_part(slide.partname().as_str(), slide.to_xml().into_bytes())?;
            }
        }
        if self.content_types_dirty {
            self.package
                .set_part(CONTENT_TYPES_URI, self.content_types.to_xml().into_bytes())?;
            self.content_types_dirty = false;
        }
        Ok(self.package.to_bytes()?)
    }
}

/// Compute the relative reference from a base directory URI to a target part.
fn relative_ref(base_uri: &str, target: &PackURI) -> String {
    let base: Vec<&str> = base_uri.split('/').filter(|s| !s.is_empty()).collect();
    let target_segs: Vec<&str> = target.as_str().split('/').filter(|s| !s.is_empty()).collect();

    let common = base
        .iter()
        .zip(target_segs.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut out: Vec<&str> = Vec::new();
    for _ in common..base.len() {
        out.push("..");
    }
    out.extend(&target_segs[common..]);
    out.join("/")
}

/// Determine the slide partnames in presentation order.
///
/// Follows `p:sldIdLst` in the presentation part, resolving each `r:id`
/// through the presentation's relationships. Packages without an id list
/// fall back to slide parts in numeric partname order.
fn slide_partnames(package: &OpcPackage, content_types: &ContentTypes) -> Result<Vec<PackURI>> {
    let pres_partname = presentation_partname(package)?;

    let mut ordered = Vec::new();
    if let Some(pres_xml) = package.part(pres_partname.as_str()) {
        let root = XmlElement::parse(pres_xml)?;
        let rels = match package
            .part(pres_partname.rels_uri().map_err(crate::opc::OpcError::InvalidPackUri)?.as_str())
        {
            Some(xml) => Relationships::from_xml(pres_partname.base_uri(), xml)?,
            None => Relationships::new(pres_partname.base_uri()),
        };

        if let Some(id_list) = root.child("sldIdLst") {
            for sld_id in id_list.elements().filter(|el| el.is("sldId")) {
                let Some(r_id) = sld_id.attr("r:id") else { continue };
                if let Some(rel) = rels.get(r_id) {
                    ordered.push(rel.target_partname()?);
                }
            }
        }
    }

    if ordered.is_empty() {
        // No usable id list; take slide overrides in numeric order.
        let mut fallback: Vec<PackURI> = content_types
            .overrides_with_type(content_type::PML_SLIDE)
            .filter_map(|p| PackURI::new(p).ok())
            .collect();
        fallback.sort_by_key(|p| p.idx().unwrap_or(u32::MAX));
        ordered = fallback;
    }

    Ok(ordered)
}

/// Resolve the main presentation part through the package relationships.
fn presentation_partname(package: &OpcPackage) -> Result<PackURI> {
    let pkg_uri = PackURI::new(PACKAGE_URI).map_err(crate::opc::OpcError::InvalidPackUri)?;
    let rels_uri = pkg_uri.rels_uri().map_err(crate::opc::OpcError::InvalidPackUri)?;
    if let Some(xml) = package.part(rels_uri.as_str()) {
        let rels = Relationships::from_xml("/", xml)?;
        if let Ok(rel) = rels.rel_with_reltype(relationship_type::OFFICE_DOCUMENT) {
            return Ok(rel.target_partname()?);
        }
    }
    PackURI::new("/ppt/presentation.xml").map_err(|e| crate::opc::OpcError::InvalidPackUri(e).into())
}
