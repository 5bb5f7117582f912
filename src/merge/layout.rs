/// Cosmetic layout adjustment for long names.
///
/// Long names overflow the template's name box. The box is widened in
/// proportion to the name length and told not to wrap; if an English-name
/// shape sits to its right, it is pushed right by the same delta so the two
/// never overlap. Everything here is best-effort: a failure is logged and
/// the document stays usable without the refinement.
use crate::pptx::slide::{
    paragraph_text, paragraphs, set_no_wrap, set_transform, text_body, text_body_mut, transform,
    Slide, Transform,
};
use log::debug;

/// Token marking the auxiliary English-name shape.
const SIBLING_TOKEN: &str = "{name_en}";

/// Widen the name shape at `shape_pos` for a resolved name of `name_len`
/// characters, shifting the first English-name sibling that starts to its
/// right.
pub fn widen_name_shape(slide: &mut Slide, shape_pos: usize, name_len: usize) {
    if let Err(reason) = try_widen(slide, shape_pos, name_len) {
        debug!("name shape not widened: {}", reason);
    }
}

fn try_widen(slide: &mut Slide, shape_pos: usize, name_len: usize) -> Result<(), String> {
    let factor = match name_len {
        0..=3 => return Ok(()),
        4 => 1.25,
        _ => 1.40,
    };

    let shape = slide
        .shape_at(shape_pos)
        .ok_or_else(|| format!("shape position {} out of range", shape_pos))?;
    if text_body(shape).is_none() {
        return Err("name shape has no text body".to_string());
    }
    let original = transform(shape).ok_or_else(|| "name shape has no geometry".to_string())?;

    let widened_cx = (original.cx as f64 * factor).round() as i64;
    let delta = widened_cx - original.cx;

    let shape = slide
        .shape_at_mut(shape_pos)
        .ok_or_else(|| "name shape vanished".to_string())?;
    if !set_transform(shape, Transform { cx: widened_cx, ..original }) {
        return Err("name shape geometry could not be updated".to_string());
    }
    if let Some(body) = text_body_mut(shape) {
        set_no_wrap(body);
    }
    slide.mark_modified();

    shift_english_sibling(slide, shape_pos, original.x, delta);
    Ok(())
}

/// Shift the first sibling whose text carries the English-name token and
/// whose offset is strictly right of the name shape.
fn shift_english_sibling(slide: &mut Slide, name_pos: usize, name_x: i64, delta: i64) {
    let mut found: Option<(usize, Transform)> = None;
    for pos in slide.shape_positions() {
        if pos == name_pos {
            continue;
        }
        let Some(shape) = slide.shape_at(pos) else { continue };
        let Some(body) = text_body(shape) else { continue };
        let has_token = paragraphs(body)
            .iter()
            .any(|p| paragraph_text(p).to_lowercase().contains(SIBLING_TOKEN));
        if !has_token {
            continue;
        }
        if let Some(t) = transform(shape) {
            if t.x > name_x {
                found = Some((pos, t));
            }
        }
        // only the first token-bearing sibling is considered
        break;
    }

    if let Some((pos, t)) = found {
        if let Some(shape) = slide.shape_at_mut(pos) {
            set_transform(shape, Transform { x: t.x + delta, ..t });
            slide.mark_modified();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opc::PackURI;

    fn two_shape_slide(name_en_x: i64) -> Slide {
        let xml = format!(
            r#"<p:sld xmlns:p="p" xmlns:a="a"><p:cSld><p:spTree>
<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>
<p:sp><p:nvSpPr><p:cNvPr id="2" name="Name"/></p:nvSpPr><p:spPr><a:xfrm><a:off x="914400" y="914400"/><a:ext cx="1828800" cy="457200"/></a:xfrm></p:spPr><p:txBody><a:bodyPr/><a:p><a:r><a:t>김철수씨</a:t></a:r></a:p></p:txBody></p:sp>
<p:sp><p:nvSpPr><p:cNvPr id="3" name="NameEn"/></p:nvSpPr><p:spPr><a:xfrm><a:off x="{}" y="914400"/><a:ext cx="1828800" cy="457200"/></a:xfrm></p:spPr><p:txBody><a:bodyPr/><a:p><a:r><a:t>{{name_en}}</a:t></a:r></a:p></p:txBody></p:sp>
</p:spTree></p:cSld></p:sld>"#,
            name_en_x
        );
        Slide::parse(PackURI::new("/ppt/slides/slide1.xml").unwrap(), xml.as_bytes()).unwrap()
    }

    #[test]
    fn four_char_name_widens_by_quarter() {
        let mut slide = two_shape_slide(3657600);
        let name_pos = slide.shape_positions()[0];
        widen_name_shape(&mut slide, name_pos, 4);
        let t = transform(slide.shape_at(name_pos).unwrap()).unwrap();
        assert_eq!(t.cx, 2286000); // 1828800 * 1.25
    }

    #[test]
    fn longer_name_widens_by_forty_percent_and_disables_wrap() {
        let mut slide = two_shape_slide(3657600);
        let name_pos = slide.shape_positions()[0];
        widen_name_shape(&mut slide, name_pos, 6);
        let shape = slide.shape_at(name_pos).unwrap();
        assert_eq!(transform(shape).unwrap().cx, 2560320); // 1828800 * 1.40
        assert_eq!(
            text_body(shape).unwrap().child("bodyPr").unwrap().attr("wrap"),
            Some("none")
        );
    }

    #[test]
    fn sibling_right_of_name_moves_by_the_delta() {
        let mut slide = two_shape_slide(3657600);
        let name_pos = slide.shape_positions()[0];
        widen_name_shape(&mut slide, name_pos, 4);
        let sibling_pos = slide.shape_positions()[1];
        let t = transform(slide.shape_at(sibling_pos).unwrap()).unwrap();
        assert_eq!(t.x, 3657600 + 457200); // delta = 1828800 * 0.25
    }

    #[test]
    fn sibling_left_of_name_stays_put() {
        let mut slide = two_shape_slide(457200);
        let name_pos = slide.shape_positions()[0];
        widen_name_shape(&mut slide, name_pos, 5);
        let sibling_pos = slide.shape_positions()[1];
        assert_eq!(transform(slide.shape_at(sibling_pos).unwrap()).unwrap().x, 457200);
    }

    #[test]
    fn short_names_change_nothing() {
        let mut slide = two_shape_slide(3657600);
        let name_pos = slide.shape_positions()[0];
        widen_name_shape(&mut slide, name_pos, 3);
        assert_eq!(transform(slide.shape_at(name_pos).unwrap()).unwrap().cx, 1828800);
        assert!(!slide.is_modified());
    }
}
