/// Construction of picture shapes (`p:pic`).
use crate::pptx::dom::XmlElement;
use crate::pptx::slide::Transform;

/// Build a `p:pic` element referencing an embedded image.
///
/// The picture fills its frame (`a:stretch`/`a:fillRect`) and uses plain
/// rectangular geometry; `rel_id` must name an image relationship on the
/// owning slide part.
pub fn picture_shape(shape_id: u32, name: &str, rel_id: &str, t: Transform) -> XmlElement {
    let nv_pic_pr = XmlElement::new("p:nvPicPr")
        .with_child(
            XmlElement::new("p:cNvPr")
                .with_attr("id", shape_id.to_string())
                .with_attr("name", name),
        )
        .with_child(
            XmlElement::new("p:cNvPicPr")
                .with_child(XmlElement::new("a:picLocks").with_attr("noChangeAspect", "1")),
        )
        .with_child(XmlElement::new("p:nvPr"));

    let blip_fill = XmlElement::new("p:blipFill")
        .with_child(XmlElement::new("a:blip").with_attr("r:embed", rel_id))
        .with_child(XmlElement::new("a:stretch").with_child(XmlElement::new("a:fillRect")));

    let sp_pr = XmlElement::new("p:spPr")
        .with_child(
            XmlElement::new("a:xfrm")
                .with_child(
                    XmlElement::new("a:off")
                        .with_attr("x", t.x.to_string())
                        .with_attr("y", t.y.to_string()),
                )
                .with_child(
                    XmlElement::new("a:ext")
                        .with_attr("cx", t.cx.to_string())
                        .with_attr("cy", t.cy.to_string()),
                ),
        )
        .with_child(
            XmlElement::new("a:prstGeom")
                .with_attr("prst", "rect")
                .with_child(XmlElement::new("a:avLst")),
        );

    XmlElement::new("p:pic")
        .with_child(nv_pic_pr)
        .with_child(blip_fill)
        .with_child(sp_pr)
}
