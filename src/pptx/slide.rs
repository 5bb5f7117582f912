/// Slide model and shape/text helpers.
///
/// A `Slide` owns the parsed element tree of one slide part. Shapes are the
/// element children of `p:cSld/p:spTree`; helpers here read and mutate the
/// pieces the merge engine cares about: shape geometry, text bodies,
/// paragraphs and runs.
use crate::opc::PackURI;
use crate::pptx::dom::{XmlElement, XmlNode};
use crate::pptx::error::{PptxError, Result};

/// Shape position and extents in EMUs (914400 EMU = 1 inch).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transform {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

/// One EMU-denominated inch, the default square for placeholder geometry.
pub const EMU_PER_INCH: i64 = 914400;

/// Element local names that count as shapes in a shape tree.
const SHAPE_NAMES: [&str; 5] = ["sp", "pic", "grpSp", "graphicFrame", "cxnSp"];

/// A slide part parsed into a mutable element tree.
#[derive(Debug, Clone)]
pub struct Slide {
    /// Partname of the backing slide part
    partname: PackURI,

    /// Root `p:sld` element
    root: XmlElement,

    /// Whether the tree has been mutated since parse
    modified: bool,
}

impl Slide {
    /// Parse a slide part.
    pub(crate) fn parse(partname: PackURI, xml: &[u8]) -> Result<Self> {
        let root = XmlElement::parse(xml)?;
        if !root.is("sld") {
            return Err(PptxError::Xml(format!(
                "expected p:sld root in {}, got {}",
                partname,
                root.name()
            )));
        }
        Ok(Self {
            partname,
            root,
            modified: false,
        })
    }

    /// Partname of the backing part.
    #[inline]
    pub fn partname(&self) -> &PackURI {
        &self.partname
    }

    /// Whether the slide tree has been mutated.
    #[inline]
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Record that the tree has been mutated.
    #[inline]
    pub fn mark_modified(&mut self) {
        self.modified = true;
    }

    /// The `p:spTree` element.
    pub fn shape_tree(&self) -> Option<&XmlElement> {
        self.root.find(&["cSld", "spTree"])
    }

    /// The `p:spTree` element, mutably. Does not mark the slide modified.
    pub fn shape_tree_mut(&mut self) -> Option<&mut XmlElement> {
        self.root.find_mut(&["cSld", "spTree"])
    }

    /// Indices into the shape tree's child list that hold shapes.
    pub fn shape_positions(&self) -> Vec<usize> {
        let Some(tree) = self.shape_tree() else {
            return Vec::new();
        };
        tree.children()
            .iter()
            .enumerate()
            .filter_map(|(i, node)| {
                let el = node.as_element()?;
                SHAPE_NAMES.contains(&el.local_name()).then_some(i)
            })
            .collect()
    }

    /// Shape element at a child-list position.
    pub fn shape_at(&self, pos: usize) -> Option<&XmlElement> {
        self.shape_tree()?.children().get(pos)?.as_element()
    }

    /// Shape element at a child-list position, mutably.
    pub fn shape_at_mut(&mut self, pos: usize) -> Option<&mut XmlElement> {
        self.shape_tree_mut()?.children_mut().get_mut(pos)?.as_element_mut()
    }

    /// All visible text on the slide, concatenated run by run.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for pos in self.shape_positions() {
            if let Some(body) = self.shape_at(pos).and_then(text_body) {
                for para in paragraphs(body) {
                    out.push_str(&paragraph_text(para));
                    out.push('\n');
                }
            }
        }
        out
    }

    /// Serialize the tree back to slide part XML.
    pub fn to_xml(&self) -> String {
        self.root.to_document_xml()
    }
}

/// The shape's `p:txBody`, if it has one.
pub fn text_body(shape: &XmlElement) -> Option<&XmlElement> {
    shape.child("txBody")
}

/// The shape's `p:txBody`, mutably.
pub fn text_body_mut(shape: &mut XmlElement) -> Option<&mut XmlElement> {
    shape.child_mut("txBody")
}

/// Paragraph elements (`a:p`) of a text body, in order.
pub fn paragraphs(body: &XmlElement) -> Vec<&XmlElement> {
    body.elements().filter(|el| el.is("p")).collect()
}

/// Concatenated run text of one paragraph.
///
/// Joins the `a:t` content of every `a:r` child in order; break and field
/// elements contribute nothing.
pub fn paragraph_text(para: &XmlElement) -> String {
    let mut out = String::new();
    for run in para.elements().filter(|el| el.is("r")) {
        if let Some(t) = run.child("t") {
            out.push_str(&t.text());
        }
    }
    out
}

/// Replace a paragraph's runs with a single run carrying `new_text`.
///
/// The first original run's properties (`a:rPr`) are kept so the substituted
/// text renders with the template's formatting. The new run lands just
/// before `a:endParaRPr` when the paragraph has one, otherwise at the end.
pub fn rewrite_paragraph_text(para: &mut XmlElement, new_text: &str) {
    let first_rpr = para
        .elements()
        .find(|el| el.is("r"))
        .and_then(|run| run.child("rPr"))
        .cloned();

    para.children_mut().retain(|node| {
        node.as_element().map(|el| !el.is("r")).unwrap_or(true)
    });

    let mut run = XmlElement::new("a:r");
    if let Some(rpr) = first_rpr {
        run.push_element(rpr);
    }
    run.push_element(XmlElement::new("a:t").with_text(new_text));

    let at = para.position_of("endParaRPr").unwrap_or(para.children().len());
    para.children_mut().insert(at, XmlNode::Element(run));
}

/// Read a shape's offset and extents from `p:spPr/a:xfrm`.
pub fn transform(shape: &XmlElement) -> Option<Transform> {
    let xfrm = shape.find(&["spPr", "xfrm"])?;
    let off = xfrm.child("off")?;
    let ext = xfrm.child("ext")?;
    Some(Transform {
        x: off.attr("x")?.parse().ok()?,
        y: off.attr("y")?.parse().ok()?,
        cx: ext.attr("cx")?.parse().ok()?,
        cy: ext.attr("cy")?.parse().ok()?,
    })
}

/// Write a shape's offset and extents into an existing `p:spPr/a:xfrm`.
///
/// Returns false when the shape carries no transform to update.
pub fn set_transform(shape: &mut XmlElement, t: Transform) -> bool {
    let Some(xfrm) = shape.find_mut(&["spPr", "xfrm"]) else {
        return false;
    };
    if let Some(off) = xfrm.child_mut("off") {
        off.set_attr("x", t.x.to_string());
        off.set_attr("y", t.y.to_string());
    } else {
        return false;
    }
    if let Some(ext) = xfrm.child_mut("ext") {
        ext.set_attr("cx", t.cx.to_string());
        ext.set_attr("cy", t.cy.to_string());
    } else {
        return false;
    }
    true
}

/// Set the text body's wrap behavior to "none".
///
/// `a:bodyPr` is the required first child of a text body; if the template
/// omitted it, one is inserted at the front.
pub fn set_no_wrap(body: &mut XmlElement) {
    if let Some(body_pr) = body.child_mut("bodyPr") {
        body_pr.set_attr("wrap", "none");
        return;
    }
    let body_pr = XmlElement::new("a:bodyPr").with_attr("wrap", "none");
    body.children_mut().insert(0, XmlNode::Element(body_pr));
}
