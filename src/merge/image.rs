/// Image generation interface and picture-shape replacement.
use crate::merge::record::Record;
use crate::pptx::dom::XmlNode;
use crate::pptx::picture::picture_shape;
use crate::pptx::slide::{transform, Transform, EMU_PER_INCH};
use crate::pptx::{ImageFormat, Presentation};
use log::warn;
use std::sync::atomic::{AtomicU32, Ordering};
use thiserror::Error;

/// Error raised by an image generator.
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("image generation failed: {0}")]
    Failed(String),
}

/// External collaborator that turns a record into raster image bytes.
///
/// Failures are non-fatal per shape: the merge logs them and leaves the
/// record's document otherwise intact.
pub trait ImageGenerator: Sync {
    fn generate(&self, record: &Record) -> Result<Vec<u8>, ImageError>;
}

impl<F> ImageGenerator for F
where
    F: Fn(&Record) -> Result<Vec<u8>, ImageError> + Sync,
{
    fn generate(&self, record: &Record) -> Result<Vec<u8>, ImageError> {
        self(record)
    }
}

/// Atomically-incrementing allocator for new shape identifiers.
///
/// One allocator is shared by every record of a batch so that identifiers
/// stay unique no matter how records are scheduled across workers;
/// uniqueness is all that matters, not ordering.
#[derive(Debug)]
pub struct ShapeIdAllocator {
    next: AtomicU32,
}

impl ShapeIdAllocator {
    /// Allocator starting well above any identifier a template ships with.
    pub fn new() -> Self {
        Self::starting_at(10_000)
    }

    /// Allocator with an explicit starting identifier.
    pub fn starting_at(first: u32) -> Self {
        Self {
            next: AtomicU32::new(first),
        }
    }

    /// Claim the next identifier.
    pub fn next_id(&self) -> u32 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for ShapeIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Replace the shape at `shape_pos` with a picture generated for `record`.
///
/// Structural replacement: a new `p:pic` is spliced in immediately after the
/// target shape and the target is removed, so the child-list position stays
/// valid for the caller. The picture is forced square, sized to the smaller
/// of the original extents. Any internal failure is logged and swallowed.
pub fn replace_with_picture(
    presentation: &mut Presentation,
    slide_index: usize,
    shape_pos: usize,
    record: &Record,
    generator: &dyn ImageGenerator,
    ids: &ShapeIdAllocator,
) {
    if let Err(reason) = try_replace(presentation, slide_index, shape_pos, record, generator, ids) {
        warn!(
            "skipping picture for '{}' on slide {}: {}",
            record.name, slide_index, reason
        );
    }
}

fn try_replace(
    presentation: &mut Presentation,
    slide_index: usize,
    shape_pos: usize,
    record: &Record,
    generator: &dyn ImageGenerator,
    ids: &ShapeIdAllocator,
) -> Result<(), String> {
    let bytes = generator.generate(record).map_err(|e| e.to_string())?;
    if bytes.is_empty() {
        return Err("generator returned no image data".to_string());
    }
    let format = ImageFormat::detect_from_bytes(&bytes).unwrap_or(ImageFormat::Png);
    let r_id = presentation
        .add_slide_image(slide_index, bytes, format)
        .map_err(|e| e.to_string())?;

    let slide = presentation
        .slide_mut(slide_index)
        .ok_or_else(|| format!("slide index {} out of range", slide_index))?;
    let target = slide
        .shape_at(shape_pos)
        .ok_or_else(|| format!("shape position {} out of range", shape_pos))?;

    let original = transform(target).unwrap_or(Transform {
        x: 0,
        y: 0,
        cx: EMU_PER_INCH,
        cy: EMU_PER_INCH,
    });
    let side = original.cx.min(original.cy);
    let square = Transform {
        cx: side,
        cy: side,
        ..original
    };

    let shape_id = ids.next_id();
    let pic = picture_shape(shape_id, &format!("Picture {}", shape_id), &r_id, square);

    let tree = slide
        .shape_tree_mut()
        .ok_or_else(|| "slide has no shape tree".to_string())?;
    tree.children_mut().insert(shape_pos + 1, XmlNode::Element(pic));
    tree.children_mut().remove(shape_pos);
    slide.mark_modified();
    Ok(())
}
