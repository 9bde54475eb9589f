//! Decoded document model
//!
//! A [`Document`] owns a flat arena of [`Element`]s. An element's identity is
//! its index in that arena; element-reference attributes store indices, so
//! the graph can contain forward references, cycles, and self-references
//! without ownership cycles.

use crate::attribute::{AttributeValue, NULL_ELEMENT};
use crate::version::PcfVersion;
use crate::{Error, Result, reader, writer};

/// A named attribute attached to an element
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// Attribute name, unique within its element
    pub name: String,
    /// Typed value
    pub value: AttributeValue,
}

/// A named, typed node in the document graph
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    type_name: String,
    name: String,
    signature: [u8; 16],
    attributes: Vec<Attribute>,
}

impl Element {
    /// Create an element with a zeroed data signature
    pub fn new<T: Into<String>, N: Into<String>>(type_name: T, name: N) -> Self {
        Self::with_signature(type_name, name, [0; 16])
    }

    /// Create an element with an explicit 16-byte data signature
    pub fn with_signature<T: Into<String>, N: Into<String>>(
        type_name: T,
        name: N,
        signature: [u8; 16],
    ) -> Self {
        Self {
            type_name: type_name.into(),
            name: name.into(),
            signature,
            attributes: Vec::new(),
        }
    }

    /// Type name, e.g. `DmeParticleSystemDefinition`
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Element name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the element
    pub fn set_name<N: Into<String>>(&mut self, name: N) {
        self.name = name.into();
    }

    /// The 16-byte data signature carried through decode/encode
    pub fn signature(&self) -> &[u8; 16] {
        &self.signature
    }

    /// Attributes in insertion order
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Look up an attribute value by name
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| &a.value)
    }

    /// Set an attribute, replacing any existing value under the same name
    ///
    /// Replacement keeps the attribute's original position so re-encoding
    /// stays deterministic; a new name is appended.
    pub fn set_attribute<N: Into<String>>(&mut self, name: N, value: AttributeValue) {
        let name = name.into();
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.value = value,
            None => self.attributes.push(Attribute { name, value }),
        }
    }

    /// Remove an attribute by name, returning its value if present
    pub fn remove_attribute(&mut self, name: &str) -> Option<AttributeValue> {
        let index = self.attributes.iter().position(|a| a.name == name)?;
        Some(self.attributes.remove(index).value)
    }
}

/// Root of a decoded PCF file
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    version: PcfVersion,
    elements: Vec<Element>,
}

impl Document {
    /// Create an empty document tagged with the given version
    pub fn new(version: PcfVersion) -> Self {
        Self {
            version,
            elements: Vec::new(),
        }
    }

    /// Decode a document from raw bytes
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        reader::decode(bytes)
    }

    /// Encode the document back to bytes
    ///
    /// Encoding is structurally deterministic: element order, attribute
    /// insertion order, and string-dictionary build order are all fixed by
    /// the document, so the same document always yields identical bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        writer::encode(self)
    }

    /// The format version this document was tagged with
    pub fn version(&self) -> PcfVersion {
        self.version
    }

    /// Re-tag the document with another recognized version
    pub fn set_version(&mut self, version: PcfVersion) {
        self.version = version;
    }

    /// Elements in declaration order
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Mutable access to the element arena
    pub fn elements_mut(&mut self) -> &mut [Element] {
        &mut self.elements
    }

    /// Element by arena index
    pub fn element(&self, index: u32) -> Option<&Element> {
        self.elements.get(index as usize)
    }

    /// Mutable element by arena index
    pub fn element_mut(&mut self, index: u32) -> Option<&mut Element> {
        self.elements.get_mut(index as usize)
    }

    /// Append an element and return its arena index
    pub fn push_element(&mut self, element: Element) -> u32 {
        self.elements.push(element);
        (self.elements.len() - 1) as u32
    }

    /// Number of elements in the arena
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Verify that every element reference lands inside the arena
    ///
    /// Decode performs this check on the fly; call it again after mutating
    /// a document by hand before encoding.
    pub fn validate_references(&self) -> Result<()> {
        let count = self.elements.len();
        for element in &self.elements {
            for attribute in element.attributes() {
                for &index in attribute.value.referenced_elements() {
                    if index != NULL_ELEMENT && index as usize >= count {
                        return Err(Error::DanglingReference {
                            index,
                            element_count: count,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_attribute_replaces_in_place() {
        let mut element = Element::new("DmElement", "root");
        element.set_attribute("first", AttributeValue::Integer(1));
        element.set_attribute("second", AttributeValue::Integer(2));
        element.set_attribute("first", AttributeValue::Integer(10));

        let names: Vec<_> = element.attributes().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["first", "second"]);
        assert_eq!(element.attribute("first"), Some(&AttributeValue::Integer(10)));
    }

    #[test]
    fn test_remove_attribute() {
        let mut element = Element::new("DmElement", "root");
        element.set_attribute("gone", AttributeValue::Boolean(true));
        assert_eq!(
            element.remove_attribute("gone"),
            Some(AttributeValue::Boolean(true))
        );
        assert_eq!(element.remove_attribute("gone"), None);
    }

    #[test]
    fn test_reference_validation() {
        let mut doc = Document::new(PcfVersion::Binary2Pcf1);
        let idx = doc.push_element(Element::new("DmElement", "only"));

        doc.element_mut(idx)
            .unwrap()
            .set_attribute("me", AttributeValue::Element(idx));
        assert!(doc.validate_references().is_ok());

        doc.element_mut(idx)
            .unwrap()
            .set_attribute("nobody", AttributeValue::Element(NULL_ELEMENT));
        assert!(doc.validate_references().is_ok());

        doc.element_mut(idx)
            .unwrap()
            .set_attribute("bad", AttributeValue::Element(7));
        assert!(matches!(
            doc.validate_references(),
            Err(Error::DanglingReference { index: 7, .. })
        ));
    }
}
