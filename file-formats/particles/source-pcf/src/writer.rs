//! Binary DMX encoding
//!
//! The writer is the deterministic inverse of the reader: the string
//! dictionary is rebuilt in first-use order (element type names in
//! declaration order, then attribute names in insertion order), and every
//! section is emitted in document order. Encoding the same document twice
//! yields byte-identical output.

use std::collections::HashMap;

use crate::attribute::{AttributeValue, Time};
use crate::document::Document;
use crate::io::WriteExt;
use crate::version::PcfVersion;
use crate::{Error, Result};

/// Encode a document to raw bytes
pub(crate) fn encode(document: &Document) -> Result<Vec<u8>> {
    document.validate_references()?;

    let version = document.version();
    let dictionary = StringDictionary::build(document);

    let mut out = Vec::new();
    out.extend_from_slice(version.header().as_bytes());
    out.push(b'\n');
    out.push(0);

    dictionary.write_table(&mut out, version)?;

    out.write_u32_le(document.element_count() as u32)?;
    for element in document.elements() {
        dictionary.write_index(&mut out, version, element.type_name())?;
        write_cstring(&mut out, element.name())?;
        out.extend_from_slice(element.signature());
    }

    for element in document.elements() {
        out.write_u32_le(element.attributes().len() as u32)?;
        for attribute in element.attributes() {
            dictionary.write_index(&mut out, version, &attribute.name)?;
            out.write_u8(attribute.value.attribute_type().tag())?;
            write_value(&mut out, &attribute.value)?;
        }
    }

    Ok(out)
}

/// Deduplicated string table in first-use order
struct StringDictionary {
    strings: Vec<String>,
    indices: HashMap<String, usize>,
}

impl StringDictionary {
    fn build(document: &Document) -> Self {
        let mut dictionary = Self {
            strings: Vec::new(),
            indices: HashMap::new(),
        };
        for element in document.elements() {
            dictionary.add(element.type_name());
            for attribute in element.attributes() {
                dictionary.add(&attribute.name);
            }
        }
        dictionary
    }

    fn add(&mut self, s: &str) {
        if !self.indices.contains_key(s) {
            self.indices.insert(s.to_string(), self.strings.len());
            self.strings.push(s.to_string());
        }
    }

    fn write_table(&self, out: &mut Vec<u8>, version: PcfVersion) -> Result<()> {
        if version.wide_dictionary() {
            out.write_u32_le(self.strings.len() as u32)?;
        } else {
            let count = u16::try_from(self.strings.len())
                .map_err(|_| Error::malformed("string dictionary overflow"))?;
            out.write_u16_le(count)?;
        }
        for s in &self.strings {
            write_cstring(out, s)?;
        }
        Ok(())
    }

    fn write_index(&self, out: &mut Vec<u8>, version: PcfVersion, s: &str) -> Result<()> {
        // Build order guarantees presence; a miss means internal corruption
        let index = *self
            .indices
            .get(s)
            .ok_or_else(|| Error::malformed("string missing from dictionary"))?;
        if version.wide_dictionary() {
            out.write_u32_le(index as u32)?;
        } else {
            let narrow = u16::try_from(index)
                .map_err(|_| Error::malformed("string dictionary overflow"))?;
            out.write_u16_le(narrow)?;
        }
        Ok(())
    }
}

fn write_cstring(out: &mut Vec<u8>, s: &str) -> Result<()> {
    if s.as_bytes().contains(&0) {
        return Err(Error::malformed("embedded NUL in string data"));
    }
    out.extend_from_slice(s.as_bytes());
    out.push(0);
    Ok(())
}

fn write_length_prefixed_string(out: &mut Vec<u8>, s: &str) -> Result<()> {
    let len = u16::try_from(s.len())
        .map_err(|_| Error::malformed("string attribute longer than 65535 bytes"))?;
    out.write_u16_le(len)?;
    out.extend_from_slice(s.as_bytes());
    Ok(())
}

fn write_floats(out: &mut Vec<u8>, values: &[f32]) -> Result<()> {
    for &v in values {
        out.write_f32_le(v)?;
    }
    Ok(())
}

fn write_array<T, F>(out: &mut Vec<u8>, items: &[T], mut write_one: F) -> Result<()>
where
    F: FnMut(&mut Vec<u8>, &T) -> Result<()>,
{
    out.write_u32_le(items.len() as u32)?;
    for item in items {
        write_one(out, item)?;
    }
    Ok(())
}

fn write_value(out: &mut Vec<u8>, value: &AttributeValue) -> Result<()> {
    match value {
        AttributeValue::Element(index) => out.write_u32_le(*index)?,
        AttributeValue::Integer(n) => out.write_i32_le(*n)?,
        AttributeValue::Float(f) => out.write_f32_le(*f)?,
        AttributeValue::Boolean(b) => out.write_u8(u8::from(*b))?,
        AttributeValue::String(s) => write_length_prefixed_string(out, s)?,
        AttributeValue::Binary(bytes) => {
            out.write_u32_le(bytes.len() as u32)?;
            out.extend_from_slice(bytes);
        }
        AttributeValue::Time(t) => out.write_i32_le(t.ticks())?,
        AttributeValue::Color(rgba) => out.extend_from_slice(rgba),
        AttributeValue::Vector2(v) => write_floats(out, v)?,
        AttributeValue::Vector3(v) => write_floats(out, v)?,
        AttributeValue::Vector4(v) => write_floats(out, v)?,
        AttributeValue::QAngle(v) => write_floats(out, v)?,
        AttributeValue::Quaternion(v) => write_floats(out, v)?,
        AttributeValue::Matrix(m) => write_floats(out, m)?,
        AttributeValue::ElementArray(items) => {
            write_array(out, items, |o, i| Ok(o.write_u32_le(*i)?))?;
        }
        AttributeValue::IntegerArray(items) => {
            write_array(out, items, |o, n| Ok(o.write_i32_le(*n)?))?;
        }
        AttributeValue::FloatArray(items) => {
            write_array(out, items, |o, f| Ok(o.write_f32_le(*f)?))?;
        }
        AttributeValue::BooleanArray(items) => {
            write_array(out, items, |o, b| Ok(o.write_u8(u8::from(*b))?))?;
        }
        AttributeValue::StringArray(items) => {
            write_array(out, items, |o, s| write_length_prefixed_string(o, s))?;
        }
        AttributeValue::BinaryArray(items) => {
            write_array(out, items, |o, bytes: &Vec<u8>| {
                o.write_u32_le(bytes.len() as u32)?;
                o.extend_from_slice(bytes);
                Ok(())
            })?;
        }
        AttributeValue::TimeArray(items) => {
            write_array(out, items, |o, t: &Time| Ok(o.write_i32_le(t.ticks())?))?;
        }
        AttributeValue::ColorArray(items) => {
            write_array(out, items, |o, rgba: &[u8; 4]| {
                o.extend_from_slice(rgba);
                Ok(())
            })?;
        }
        AttributeValue::Vector2Array(items) => {
            write_array(out, items, |o, v| write_floats(o, v))?;
        }
        AttributeValue::Vector3Array(items) => {
            write_array(out, items, |o, v| write_floats(o, v))?;
        }
        AttributeValue::Vector4Array(items) => {
            write_array(out, items, |o, v| write_floats(o, v))?;
        }
        AttributeValue::QAngleArray(items) => {
            write_array(out, items, |o, v| write_floats(o, v))?;
        }
        AttributeValue::QuaternionArray(items) => {
            write_array(out, items, |o, v| write_floats(o, v))?;
        }
        AttributeValue::MatrixArray(items) => {
            write_array(out, items, |o, m| write_floats(o, m))?;
        }
    }
    Ok(())
}
