/// Objects that implement reading and writing OPC packages.
///
/// `OpcPackage` keeps every part of the ZIP container in archive order and
/// round-trips untouched parts byte-identically; only parts the caller
/// replaces are re-encoded. This keeps generated documents acceptable to
/// standard readers of the format.
use crate::opc::error::{OpcError, Result};
use crate::opc::packuri::PackURI;
use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// A part (ZIP member) of an OPC package.
#[derive(Debug, Clone)]
pub struct OpcPart {
    /// The partname (URI) of this part
    partname: PackURI,

    /// The binary content of this part
    blob: Vec<u8>,
}

impl OpcPart {
    /// Get the partname of this part.
    #[inline]
    pub fn partname(&self) -> &PackURI {
        &self.partname
    }

    /// Get the binary content of this part.
    #[inline]
    pub fn blob(&self) -> &[u8] {
        &self.blob
    }
}

/// An OPC package held in memory as an ordered list of parts.
#[derive(Debug)]
pub struct OpcPackage {
    /// Parts in archive order
    parts: Vec<OpcPart>,

    /// Partname string to index into `parts`
    index: HashMap<String, usize>,
}

impl OpcPackage {
    /// Decode a package from ZIP archive bytes.
    ///
    /// Directory entries are skipped; file entry order is preserved.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(data))?;
        let mut parts = Vec::with_capacity(archive.len());
        let mut index = HashMap::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let partname = PackURI::new(format!("/{}", entry.name()))
                .map_err(OpcError::InvalidPackUri)?;
            let mut blob = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut blob)?;
            index.insert(partname.as_str().to_string(), parts.len());
            parts.push(OpcPart { partname, blob });
        }

        Ok(Self { parts, index })
    }

    /// Get a part's content by partname.
    pub fn part(&self, partname: &str) -> Option<&[u8]> {
        self.index.get(partname).map(|&i| self.parts[i].blob.as_slice())
    }

    /// Check if a part exists in the package.
    pub fn contains(&self, partname: &str) -> bool {
        self.index.contains_key(partname)
    }

    /// Replace the content of an existing part.
    pub fn set_part(&mut self, partname: &str, blob: Vec<u8>) -> Result<()> {
        let i = *self
            .index
            .get(partname)
            .ok_or_else(|| OpcError::PartNotFound(partname.to_string()))?;
        self.parts[i].blob = blob;
        Ok(())
    }

    /// Replace a part's content, or append the part if it does not exist yet.
    pub fn put_part(&mut self, partname: PackURI, blob: Vec<u8>) {
        match self.index.get(partname.as_str()) {
            Some(&i) => self.parts[i].blob = blob,
            None => {
                self.index.insert(partname.as_str().to_string(), self.parts.len());
                self.parts.push(OpcPart { partname, blob });
            },
        }
    }

    /// Append a new part to the package.
    ///
    /// Fails if a part with the same partname already exists.
    pub fn add_part(&mut self, partname: PackURI, blob: Vec<u8>) -> Result<()> {
        if self.index.contains_key(partname.as_str()) {
            return Err(OpcError::DuplicatePart(partname.as_str().to_string()));
        }
        self.index.insert(partname.as_str().to_string(), self.parts.len());
        self.parts.push(OpcPart { partname, blob });
        Ok(())
    }

    /// Find the next available partname for a numbered part template.
    ///
    /// The template must contain a `%d` placeholder, e.g.
    /// `/ppt/media/image%d.png`.
    pub fn next_partname(&self, template: &str) -> Result<PackURI> {
        let mut n = 1u32;
        loop {
            let candidate = template.replace("%d", &n.to_string());
            if !self.index.contains_key(&candidate) {
                return PackURI::new(candidate).map_err(OpcError::InvalidPackUri);
            }
            n += 1;
            if n > 10000 {
                // Safety limit to prevent infinite loops
                return Err(OpcError::InvalidPackUri(
                    "Too many parts, cannot find next partname".to_string(),
                ));
            }
        }
    }

    /// Iterate over parts in archive order.
    pub fn iter_parts(&self) -> impl Iterator<Item = &OpcPart> {
        self.parts.iter()
    }

    /// Get the number of parts in the package.
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Encode the package back into ZIP archive bytes.
    ///
    /// Media parts are stored uncompressed (they are already compressed
    /// formats) and all other parts deflated, matching the layout office
    /// readers expect.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        for part in &self.parts {
            let membername = part.partname.membername();
            let options = if membername.starts_with("ppt/media/") {
                stored
            } else {
                deflated
            };
            writer.start_file(membername, options)?;
            writer.write_all(&part.blob)?;
        }

        Ok(writer.finish()?.into_inner())
    }
}
