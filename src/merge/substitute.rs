/// The per-document substitution engine.
///
/// Walks every shape of every slide, merges run text paragraph by
/// paragraph, and drives the other merge components: line removal, picture
/// replacement and name-shape widening. Paragraph deletion rebuilds the
/// text body's child list after the paragraph loop, so no mutation happens
/// mid-traversal.
use crate::merge::image::{replace_with_picture, ImageGenerator, ShapeIdAllocator};
use crate::merge::record::Record;
use crate::merge::resolver::{substitute_tokens, IMAGE_TOKEN};
use crate::merge::{layout, lines, MergePolicies};
use crate::pptx::slide::{paragraph_text, rewrite_paragraph_text, text_body_mut};
use crate::pptx::Presentation;

/// Token that routes a paragraph to §4.4's name-widening trigger.
const NAME_TOKEN: &str = "{name}";

/// Merge one record into every slide of a presentation.
///
/// Returns the number of replacements performed (text rewrites, removed
/// lines and picture insertions), for diagnostics only.
pub fn merge_document(
    presentation: &mut Presentation,
    record: &Record,
    policies: &MergePolicies,
    generator: Option<&dyn ImageGenerator>,
    ids: &ShapeIdAllocator,
) -> usize {
    let mut replacements = 0;
    for slide_index in 0..presentation.slide_count() {
        replacements += merge_slide(presentation, slide_index, record, policies, generator, ids);
    }
    replacements
}

/// Merge one record into a single slide.
pub fn merge_slide(
    presentation: &mut Presentation,
    slide_index: usize,
    record: &Record,
    policies: &MergePolicies,
    generator: Option<&dyn ImageGenerator>,
    ids: &ShapeIdAllocator,
) -> usize {
    let image_token = format!("{{{}}}", IMAGE_TOKEN);
    let name_len = record.name.trim().chars().count();

    let Some(slide) = presentation.slide_mut(slide_index) else {
        return 0;
    };

    let mut replacements = 0;
    let mut picture_targets: Vec<usize> = Vec::new();

    for pos in slide.shape_positions() {
        let mut widen = false;
        let mut is_picture_target = false;
        let mut changed = false;

        if let Some(body) = slide.shape_at_mut(pos).and_then(text_body_mut) {
            let paragraph_positions: Vec<usize> = body
                .children()
                .iter()
                .enumerate()
                .filter(|(_, node)| {
                    node.as_element().map(|el| el.is("p")).unwrap_or(false)
                })
                .map(|(i, _)| i)
                .collect();

            let mut removed: Vec<usize> = Vec::new();
            for ppos in paragraph_positions {
                let original = body.children()[ppos]
                    .as_element()
                    .map(paragraph_text)
                    .unwrap_or_default();
                let lowered = original.to_lowercase();

                if lowered.contains(image_token.as_str()) {
                    replacements += 1;
                    if generator.is_some() {
                        // the whole shape becomes a picture; no text handling
                        is_picture_target = true;
                    } else {
                        removed.push(ppos);
                        changed = true;
                    }
                } else if lines::should_remove(&original, record, policies) {
                    removed.push(ppos);
                    replacements += 1;
                    changed = true;
                } else {
                    let substituted = substitute_tokens(&original, record, policies);
                    if substituted != original {
                        if let Some(para) = body.children_mut()[ppos].as_element_mut() {
                            rewrite_paragraph_text(para, &substituted);
                            replacements += 1;
                            changed = true;
                        }
                    }
                }

                if !widen && name_len >= 4 && lowered.contains(NAME_TOKEN) {
                    widen = true;
                }
            }

            if !removed.is_empty() {
                let mut index = 0usize;
                body.children_mut().retain(|_| {
                    let keep = !removed.contains(&index);
                    index += 1;
                    keep
                });
            }
        }

        if changed {
            slide.mark_modified();
        }
        if is_picture_target {
            picture_targets.push(pos);
        } else if widen {
            // at most once per shape, regardless of paragraph count
            layout::widen_name_shape(slide, pos, name_len);
        }
    }

    if let Some(generator) = generator {
        for pos in picture_targets {
            replace_with_picture(presentation, slide_index, pos, record, generator, ids);
        }
    }

    replacements
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::image::ImageError;
    use crate::test_util::{fake_png, minimal_presentation, CARD_SLIDE, SIMPLE_SLIDE};

    fn generator(_: &Record) -> Result<Vec<u8>, ImageError> {
        Ok(fake_png())
    }

    fn full_record() -> Record {
        let mut record = Record::named("김철수");
        record.name_en = "Kim Cheolsu".to_string();
        record.organization = "한빛전자".to_string();
        record.role = "과장".to_string();
        record.email = "kim@hanbit.example".to_string();
        record.phone = "02-1234-5678".to_string();
        record.mobile = "01012345678".to_string();
        record.extension = "15881234".to_string();
        record.fax = "02-1234-5679".to_string();
        record.extra.insert("team".to_string(), "플랫폼팀".to_string());
        record
    }

    #[test]
    fn replaces_every_token_on_simple_slide() {
        let bytes = minimal_presentation(&[SIMPLE_SLIDE]);
        let mut pres = Presentation::open(&bytes).unwrap();
        let ids = ShapeIdAllocator::new();
        let policies = MergePolicies::default();

        let count = merge_document(&mut pres, &full_record(), &policies, None, &ids);
        assert_eq!(count, 1);
        let text = pres.slides()[0].text();
        assert!(text.contains("Hello 김철수"));
        assert!(!text.contains('{'));
    }

    #[test]
    fn card_slide_merges_all_paths() {
        let bytes = minimal_presentation(&[CARD_SLIDE]);
        let mut pres = Presentation::open(&bytes).unwrap();
        let ids = ShapeIdAllocator::new();
        let policies = MergePolicies::default();

        merge_document(&mut pres, &full_record(), &policies, Some(&generator), &ids);
        let text = pres.slides()[0].text();
        assert!(text.contains("김철수"));
        assert!(text.contains("Kim Cheolsu"));
        assert!(text.contains("과장 / Manager"));
        assert!(text.contains("Tel: 02.1234.5678"));
        assert!(text.contains("내선: 1588.1234"));
        assert!(text.contains("Mobile: 10.1234.5678"));
        assert!(text.contains("Team: 플랫폼팀"));
        assert!(!text.contains('{'), "unresolved token left in: {}", text);
    }

    #[test]
    fn empty_optional_fields_remove_their_lines() {
        let bytes = minimal_presentation(&[CARD_SLIDE]);
        let mut pres = Presentation::open(&bytes).unwrap();
        let ids = ShapeIdAllocator::new();
        let policies = MergePolicies::default();

        let mut record = full_record();
        record.fax = "-".to_string();
        merge_document(&mut pres, &record, &policies, Some(&generator), &ids);

        let text = pres.slides()[0].text();
        assert!(!text.contains("Fax"));
        assert!(text.contains("Mobile: 10.1234.5678"));

        // exactly one paragraph less than a fully-populated record yields
        let bytes2 = minimal_presentation(&[CARD_SLIDE]);
        let mut pres_full = Presentation::open(&bytes2).unwrap();
        merge_document(&mut pres_full, &full_record(), &policies, Some(&generator), &ids);
        let full_lines = pres_full.slides()[0].text().lines().count();
        assert_eq!(text.lines().count(), full_lines - 1);
    }

    #[test]
    fn image_token_without_generator_removes_paragraph() {
        let bytes = minimal_presentation(&[CARD_SLIDE]);
        let mut pres = Presentation::open(&bytes).unwrap();
        let ids = ShapeIdAllocator::new();
        let policies = MergePolicies::default();

        merge_document(&mut pres, &full_record(), &policies, None, &ids);
        let slide = &pres.slides()[0];
        assert!(!slide.text().contains("{qr}"));
        // no picture was inserted
        let has_pic = slide
            .shape_positions()
            .into_iter()
            .any(|p| slide.shape_at(p).map(|s| s.is("pic")).unwrap_or(false));
        assert!(!has_pic);
    }

    #[test]
    fn widening_applies_once_per_shape() {
        let bytes = minimal_presentation(&[CARD_SLIDE]);
        let mut pres = Presentation::open(&bytes).unwrap();
        let ids = ShapeIdAllocator::new();
        let policies = MergePolicies::default();

        let mut record = full_record();
        record.name = "남궁민수".to_string(); // 4 chars -> 1.25x
        merge_document(&mut pres, &record, &policies, Some(&generator), &ids);

        let slide = &pres.slides()[0];
        let name_pos = slide.shape_positions()[0];
        let t = crate::pptx::slide::transform(slide.shape_at(name_pos).unwrap()).unwrap();
        assert_eq!(t.cx, 2286000); // 1828800 * 1.25, not applied twice
    }

    #[test]
    fn short_name_leaves_geometry_alone() {
        let bytes = minimal_presentation(&[CARD_SLIDE]);
        let mut pres = Presentation::open(&bytes).unwrap();
        let ids = ShapeIdAllocator::new();
        let policies = MergePolicies::default();

        merge_document(&mut pres, &full_record(), &policies, Some(&generator), &ids);
        let slide = &pres.slides()[0];
        let name_pos = slide.shape_positions()[0];
        let t = crate::pptx::slide::transform(slide.shape_at(name_pos).unwrap()).unwrap();
        assert_eq!(t.cx, 1828800); // 김철수 is 3 chars
    }

    #[test]
    fn merged_document_survives_save_and_reopen() {
        let bytes = minimal_presentation(&[CARD_SLIDE]);
        let mut pres = Presentation::open(&bytes).unwrap();
        let ids = ShapeIdAllocator::new();
        let policies = MergePolicies::default();

        merge_document(&mut pres, &full_record(), &policies, Some(&generator), &ids);
        let saved = pres.save().unwrap();
        let reopened = Presentation::open(&saved).unwrap();
        let text = reopened.slides()[0].text();
        assert!(text.contains("김철수"));
        assert!(!text.contains('{'));
    }
}
