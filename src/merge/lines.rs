/// Removal policy for optional contact lines.
///
/// Templates carry label lines like "Fax: {fax}". When the backing field is
/// empty the whole paragraph must go, or generated cards would show bare
/// labels. Only the three optional contact fields participate; no other
/// paragraph is ever removed by this policy.
use crate::merge::record::Record;
use crate::merge::resolver::{format_contact_number, format_extension};
use crate::merge::MergePolicies;
use serde::{Deserialize, Serialize};

/// Label fragments that tie a paragraph to an optional contact field.
///
/// A paragraph references a field when it contains the field's token or any
/// of these fragments, compared case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineRemovalPolicy {
    pub extension_labels: Vec<String>,
    pub mobile_labels: Vec<String>,
    pub fax_labels: Vec<String>,
}

impl Default for LineRemovalPolicy {
    fn default() -> Self {
        Self {
            extension_labels: vec![
                "{extension}".to_string(),
                "내선".to_string(),
                "Ext.".to_string(),
            ],
            mobile_labels: vec![
                "{mobile}".to_string(),
                "휴대폰".to_string(),
                "핸드폰".to_string(),
                "Mobile".to_string(),
                "H.P".to_string(),
            ],
            fax_labels: vec!["{fax}".to_string(), "팩스".to_string(), "Fax".to_string()],
        }
    }
}

fn references(text_lower: &str, labels: &[String]) -> bool {
    labels
        .iter()
        .any(|label| text_lower.contains(label.to_lowercase().as_str()))
}

/// Decide whether a paragraph must be deleted entirely.
///
/// True when the text references extension, mobile or fax and that field's
/// formatted value is empty for this record.
pub fn should_remove(paragraph_text: &str, record: &Record, policies: &MergePolicies) -> bool {
    let text_lower = paragraph_text.to_lowercase();
    let lines = &policies.lines;

    if references(&text_lower, &lines.extension_labels)
        && format_extension(&record.extension, &policies.contact).is_empty()
    {
        return true;
    }
    if references(&text_lower, &lines.mobile_labels)
        && format_contact_number(&record.mobile, &policies.contact).is_empty()
    {
        return true;
    }
    if references(&text_lower, &lines.fax_labels)
        && format_contact_number(&record.fax, &policies.contact).is_empty()
    {
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_without_fax() -> Record {
        let mut record = Record::named("김철수");
        record.mobile = "01012345678".to_string();
        record.extension = "15881234".to_string();
        record.fax = "-".to_string();
        record
    }

    #[test]
    fn removes_label_line_for_empty_field() {
        let policies = MergePolicies::default();
        let record = record_without_fax();
        assert!(should_remove("Fax: {fax}", &record, &policies));
        assert!(should_remove("팩스 02-123-4567", &record, &policies));
    }

    #[test]
    fn keeps_lines_for_populated_fields() {
        let policies = MergePolicies::default();
        let record = record_without_fax();
        assert!(!should_remove("Mobile: {mobile}", &record, &policies));
        assert!(!should_remove("내선 {extension}", &record, &policies));
    }

    #[test]
    fn never_touches_unrelated_paragraphs() {
        let policies = MergePolicies::default();
        let record = Record::named("김철수"); // every optional field empty
        assert!(!should_remove("{name} / {organization}", &record, &policies));
        assert!(!should_remove("Email: {email}", &record, &policies));
        assert!(!should_remove("", &record, &policies));
    }

    #[test]
    fn label_matching_ignores_case() {
        let policies = MergePolicies::default();
        let record = record_without_fax();
        assert!(should_remove("FAX: 02.123.4567", &record, &policies));
    }
}
