/// Relationship-related objects for OPC packages.
///
/// Types for managing relationships between parts in an OPC package,
/// including parsing and serializing `.rels` parts.
use crate::common::xml::escape_xml;
use crate::opc::constants::{namespace, target_mode};
use crate::opc::error::{OpcError, Result};
use crate::opc::packuri::PackURI;
use quick_xml::Reader;
use quick_xml::events::Event;
use smallvec::SmallVec;
use std::fmt::Write as FmtWrite;

/// A single relationship from a source part to a target.
///
/// Identified by an rId (relationship ID). Can be either internal (pointing
/// to another part) or external (pointing to an external URL).
#[derive(Debug, Clone)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1", "rId2")
    r_id: String,

    /// Relationship type URI
    reltype: String,

    /// Target reference - either a relative part reference or external URL
    target_ref: String,

    /// Base URI for resolving relative references
    base_uri: String,

    /// Whether this is an external relationship
    is_external: bool,
}

impl Relationship {
    /// Get the relationship ID.
    #[inline]
    pub fn r_id(&self) -> &str {
        &self.r_id
    }

    /// Get the relationship type.
    #[inline]
    pub fn reltype(&self) -> &str {
        &self.reltype
    }

    /// Get the target reference.
    ///
    /// For internal relationships, this is a relative part reference.
    /// For external relationships, this is an absolute URL.
    #[inline]
    pub fn target_ref(&self) -> &str {
        &self.target_ref
    }

    /// Check if this is an external relationship.
    #[inline]
    pub fn is_external(&self) -> bool {
        self.is_external
    }

    /// Get the absolute target partname for internal relationships.
    ///
    /// Returns an error if this is an external relationship.
    pub fn target_partname(&self) -> Result<PackURI> {
        if self.is_external {
            return Err(OpcError::InvalidRelationship(
                "Cannot get target_partname for external relationship".to_string(),
            ));
        }
        PackURI::from_rel_ref(&self.base_uri, &self.target_ref).map_err(OpcError::InvalidPackUri)
    }
}

/// Collection of relationships from a single source part (or the package).
#[derive(Debug, Clone)]
pub struct Relationships {
    /// Base URI for resolving relative references
    base_uri: String,

    /// Relationships in document order; collections are typically small
    rels: SmallVec<[Relationship; 8]>,
}

impl Relationships {
    /// Create a new empty relationships collection.
    pub fn new<S: Into<String>>(base_uri: S) -> Self {
        Self {
            base_uri: base_uri.into(),
            rels: SmallVec::new(),
        }
    }

    /// Parse a relationships collection from the XML of a `.rels` part.
    ///
    /// # Arguments
    /// * `base_uri` - Base URI of the source part, for target resolution
    /// * `xml` - Raw bytes of the `.rels` part
    pub fn from_xml<S: Into<String>>(base_uri: S, xml: &[u8]) -> Result<Self> {
        let mut rels = Self::new(base_uri);
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                    if e.local_name().as_ref() == b"Relationship" {
                        let mut r_id = String::new();
                        let mut reltype = String::new();
                        let mut target = String::new();
                        let mut mode = target_mode::INTERNAL.to_string();
                        for attr in e.attributes() {
                            let attr = attr?;
                            let value = attr
                                .unescape_value()
                                .map_err(|e| OpcError::XmlError(e.to_string()))?
                                .into_owned();
                            match attr.key.as_ref() {
                                b"Id" => r_id = value,
                                b"Type" => reltype = value,
                                b"Target" => target = value,
                                b"TargetMode" => mode = value,
                                _ => {},
                            }
                        }
                        if r_id.is_empty() || target.is_empty() {
                            return Err(OpcError::InvalidRelationship(
                                "Relationship element missing Id or Target".to_string(),
                            ));
                        }
                        rels.add_relationship(reltype, target, r_id, mode == target_mode::EXTERNAL);
                    }
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(OpcError::XmlError(e.to_string())),
                _ => {},
            }
            buf.clear();
        }

        Ok(rels)
    }

    /// Get a relationship by its ID.
    pub fn get(&self, r_id: &str) -> Option<&Relationship> {
        self.rels.iter().find(|r| r.r_id == r_id)
    }

    /// Get the first relationship of the given type.
    pub fn rel_with_reltype(&self, reltype: &str) -> Result<&Relationship> {
        self.rels
            .iter()
            .find(|r| r.reltype == reltype)
            .ok_or_else(|| OpcError::InvalidRelationship(format!("no relationship of type {}", reltype)))
    }

    /// Add a relationship with an explicit ID.
    pub fn add_relationship(
        &mut self,
        reltype: String,
        target_ref: String,
        r_id: String,
        is_external: bool,
    ) {
        self.rels.push(Relationship {
            r_id,
            reltype,
            target_ref,
            base_uri: self.base_uri.clone(),
            is_external,
        });
    }

    /// Add or get an internal relationship to the given target.
    ///
    /// If a relationship of the given type to the target already exists,
    /// returns its index; otherwise creates one with the next free rId.
    pub fn get_or_add(&mut self, reltype: &str, target_ref: &str) -> &Relationship {
        if let Some(pos) = self
            .rels
            .iter()
            .position(|r| r.reltype == reltype && r.target_ref == target_ref && !r.is_external)
        {
            return &self.rels[pos];
        }
        let r_id = self.next_r_id();
        self.add_relationship(reltype.to_string(), target_ref.to_string(), r_id, false);
        self.rels.last().unwrap()
    }

    /// Compute the next unused relationship ID ("rId1", "rId2", ...).
    pub fn next_r_id(&self) -> String {
        let max = self
            .rels
            .iter()
            .filter_map(|r| r.r_id.strip_prefix("rId"))
            .filter_map(|n| n.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        format!("rId{}", max + 1)
    }

    /// Iterate over relationships in document order.
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.rels.iter()
    }

    /// Get the number of relationships.
    pub fn len(&self) -> usize {
        self.rels.len()
    }

    /// Check if there are no relationships.
    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }

    /// Serialize to `.rels` XML.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(256 + self.rels.len() * 128);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        let _ = write!(xml, r#"<Relationships xmlns="{}">"#, namespace::RELATIONSHIPS);
        for rel in &self.rels {
            let _ = write!(
                xml,
                r#"<Relationship Id="{}" Type="{}" Target="{}""#,
                escape_xml(&rel.r_id),
                escape_xml(&rel.reltype),
                escape_xml(&rel.target_ref),
            );
            if rel.is_external {
                let _ = write!(xml, r#" TargetMode="{}""#, target_mode::EXTERNAL);
            }
            xml.push_str("/>");
        }
        xml.push_str("</Relationships>");
        xml
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opc::constants::relationship_type;

    const SLIDE_RELS: &[u8] = br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/image1.png"/>
</Relationships>"#;

    #[test]
    fn parses_rels_and_resolves_targets() {
        let rels = Relationships::from_xml("/ppt/slides", SLIDE_RELS).unwrap();
        assert_eq!(rels.len(), 2);
        let image = rels.get("rId2").unwrap();
        assert_eq!(image.target_partname().unwrap().as_str(), "/ppt/media/image1.png");
    }

    #[test]
    fn get_or_add_reuses_existing() {
        let mut rels = Relationships::from_xml("/ppt/slides", SLIDE_RELS).unwrap();
        let r_id = rels
            .get_or_add(relationship_type::IMAGE, "../media/image1.png")
            .r_id()
            .to_string();
        assert_eq!(r_id, "rId2");
        assert_eq!(rels.len(), 2);
    }

    #[test]
    fn get_or_add_allocates_next_id() {
        let mut rels = Relationships::from_xml("/ppt/slides", SLIDE_RELS).unwrap();
        let r_id = rels
            .get_or_add(relationship_type::IMAGE, "../media/image2.png")
            .r_id()
            .to_string();
        assert_eq!(r_id, "rId3");
        assert_eq!(rels.len(), 3);
    }

    #[test]
    fn round_trips_through_xml() {
        let rels = Relationships::from_xml("/ppt/slides", SLIDE_RELS).unwrap();
        let reparsed = Relationships::from_xml("/ppt/slides", rels.to_xml().as_bytes()).unwrap();
        assert_eq!(reparsed.len(), 2);
        assert_eq!(reparsed.get("rId1").unwrap().target_ref(), "../slideLayouts/slideLayout1.xml");
    }
}
