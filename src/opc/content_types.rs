/// The `[Content_Types].xml` stream of an OPC package.
///
/// Maps file extensions (Default entries) and individual partnames (Override
/// entries) to content types. Entry order is preserved so an untouched
/// package round-trips with the same stream layout.
use crate::common::xml::escape_xml;
use crate::opc::constants::namespace;
use crate::opc::error::{OpcError, Result};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::fmt::Write as FmtWrite;

#[derive(Debug, Clone, Default)]
pub struct ContentTypes {
    /// Extension (without period, lowercase) to content type
    defaults: Vec<(String, String)>,

    /// Partname to content type
    overrides: Vec<(String, String)>,
}

impl ContentTypes {
    /// Parse the `[Content_Types].xml` stream.
    pub fn from_xml(xml: &[u8]) -> Result<Self> {
        let mut ct = Self::default();
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                    b"Default" => {
                        let mut ext = String::new();
                        let mut ctype = String::new();
                        for attr in e.attributes() {
                            let attr = attr?;
                            let value = attr
                                .unescape_value()
                                .map_err(|e| OpcError::XmlError(e.to_string()))?
                                .into_owned();
                            match attr.key.as_ref() {
                                b"Extension" => ext = value.to_ascii_lowercase(),
                                b"ContentType" => ctype = value,
                                _ => {},
                            }
                        }
                        ct.defaults.push((ext, ctype));
                    },
                    b"Override" => {
                        let mut partname = String::new();
                        let mut ctype = String::new();
                        for attr in e.attributes() {
                            let attr = attr?;
                            let value = attr
                                .unescape_value()
                                .map_err(|e| OpcError::XmlError(e.to_string()))?
                                .into_owned();
                            match attr.key.as_ref() {
                                b"PartName" => partname = value,
                                b"ContentType" => ctype = value,
                                _ => {},
                            }
                        }
                        ct.overrides.push((partname, ctype));
                    },
                    _ => {},
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(OpcError::XmlError(e.to_string())),
                _ => {},
            }
            buf.clear();
        }

        Ok(ct)
    }

    /// Look up the content type for a partname.
    ///
    /// Override entries take precedence over extension defaults.
    pub fn content_type_for(&self, partname: &str) -> Option<&str> {
        if let Some((_, ctype)) = self.overrides.iter().find(|(p, _)| p.as_str() == partname) {
            return Some(ctype);
        }
        let ext = partname.rsplit('.').next()?.to_ascii_lowercase();
        self.defaults
            .iter()
            .find(|(e, _)| *e == ext)
            .map(|(_, ctype)| ctype.as_str())
    }

    /// Ensure a Default entry exists for the given extension.
    ///
    /// Returns true if an entry was added.
    pub fn ensure_default(&mut self, ext: &str, content_type: &str) -> bool {
        let ext = ext.to_ascii_lowercase();
        if self.defaults.iter().any(|(e, _)| *e == ext) {
            return false;
        }
        self.defaults.push((ext, content_type.to_string()));
        true
    }

    /// Ensure an Override entry exists for the given partname.
    pub fn ensure_override(&mut self, partname: &str, content_type: &str) -> bool {
        if self.overrides.iter().any(|(p, _)| p.as_str() == partname) {
            return false;
        }
        self.overrides.push((partname.to_string(), content_type.to_string()));
        true
    }

    /// Partnames of all Override entries with the given content type.
    pub fn overrides_with_type<'a>(&'a self, content_type: &'a str) -> impl Iterator<Item = &'a str> {
        self.overrides
            .iter()
            .filter(move |(_, c)| c.as_str() == content_type)
            .map(|(p, _)| p.as_str())
    }

    /// Serialize back to `[Content_Types].xml` form.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(256 + (self.defaults.len() + self.overrides.len()) * 96);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        let _ = write!(xml, r#"<Types xmlns="{}">"#, namespace::CONTENT_TYPES);
        for (ext, ctype) in &self.defaults {
            let _ = write!(
                xml,
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                escape_xml(ext),
                escape_xml(ctype)
            );
        }
        for (partname, ctype) in &self.overrides {
            let _ = write!(
                xml,
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                escape_xml(partname),
                escape_xml(ctype)
            );
        }
        xml.push_str("</Types>");
        xml
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opc::constants::content_type;

    const TYPES: &[u8] = br#"<?xml version="1.0"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>
<Override PartName="/ppt/slides/slide1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>
</Types>"#;

    #[test]
    fn override_wins_over_default() {
        let ct = ContentTypes::from_xml(TYPES).unwrap();
        assert_eq!(
            ct.content_type_for("/ppt/presentation.xml"),
            Some(content_type::PML_PRESENTATION_MAIN)
        );
        assert_eq!(ct.content_type_for("/_rels/.rels"), Some(content_type::OPC_RELATIONSHIPS));
    }

    #[test]
    fn ensure_default_is_idempotent() {
        let mut ct = ContentTypes::from_xml(TYPES).unwrap();
        assert!(ct.ensure_default("png", content_type::PNG));
        assert!(!ct.ensure_default("png", content_type::PNG));
        assert_eq!(ct.content_type_for("/ppt/media/image1.png"), Some(content_type::PNG));
    }

    #[test]
    fn round_trips() {
        let ct = ContentTypes::from_xml(TYPES).unwrap();
        let reparsed = ContentTypes::from_xml(ct.to_xml().as_bytes()).unwrap();
        assert_eq!(
            reparsed.content_type_for("/ppt/slides/slide1.xml"),
            Some(content_type::PML_SLIDE)
        );
    }

    #[test]
    fn finds_overrides_by_type() {
        let ct = ContentTypes::from_xml(TYPES).unwrap();
        let slides: Vec<&str> = ct.overrides_with_type(content_type::PML_SLIDE).collect();
        assert_eq!(slides, vec!["/ppt/slides/slide1.xml"]);
    }
}
