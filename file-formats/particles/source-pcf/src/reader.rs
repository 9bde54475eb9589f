//! Binary DMX decoding
//!
//! Decoding walks the stream in three sections: the string dictionary,
//! the element declarations, then one attribute stream per element.
//! Element references are validated against the declared element count as
//! they are read, so cyclic and self-referencing graphs decode without any
//! recursive resolution.

use std::io::{Cursor, Read};

use crate::attribute::{AttributeType, AttributeValue, NULL_ELEMENT, Time};
use crate::document::{Document, Element};
use crate::io::ReadExt;
use crate::version::PcfVersion;
use crate::{Error, Result};

/// Upper bound on the header line, NUL included
const MAX_HEADER_LEN: usize = 128;

/// Decode a complete document from raw bytes
pub(crate) fn decode(bytes: &[u8]) -> Result<Document> {
    let (version, body_start) = read_header(bytes)?;
    let mut reader = PcfReader {
        cursor: Cursor::new(&bytes[body_start..]),
        version,
        dictionary: Vec::new(),
    };

    reader.read_dictionary()?;
    let mut elements = reader.read_element_declarations()?;
    let element_count = elements.len();
    for element in &mut elements {
        reader.read_attribute_stream(element, element_count)?;
    }

    let mut document = Document::new(version);
    for element in elements {
        document.push_element(element);
    }
    Ok(document)
}

/// Parse the ASCII header line and return the version plus the body offset
fn read_header(bytes: &[u8]) -> Result<(PcfVersion, usize)> {
    let window = &bytes[..bytes.len().min(MAX_HEADER_LEN)];
    let nul = window
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| Error::malformed("missing header terminator"))?;

    let line = std::str::from_utf8(&window[..nul])
        .map_err(|_| Error::malformed("header is not valid ASCII"))?;
    let marker = line
        .strip_suffix('\n')
        .ok_or_else(|| Error::malformed("header line missing trailing newline"))?;

    match PcfVersion::from_header(marker) {
        Some(version) => Ok((version, nul + 1)),
        None => Err(Error::UnsupportedVersion(marker.to_string())),
    }
}

struct PcfReader<'a> {
    cursor: Cursor<&'a [u8]>,
    version: PcfVersion,
    dictionary: Vec<String>,
}

impl PcfReader<'_> {
    fn truncated() -> Error {
        Error::malformed("unexpected end of stream")
    }

    fn remaining(&self) -> usize {
        let len = self.cursor.get_ref().len() as u64;
        len.saturating_sub(self.cursor.position()) as usize
    }

    fn read_u8(&mut self) -> Result<u8> {
        self.cursor.read_u8().map_err(|_| Self::truncated())
    }

    fn read_u16(&mut self) -> Result<u16> {
        self.cursor.read_u16_le().map_err(|_| Self::truncated())
    }

    fn read_u32(&mut self) -> Result<u32> {
        self.cursor.read_u32_le().map_err(|_| Self::truncated())
    }

    fn read_i32(&mut self) -> Result<i32> {
        self.cursor.read_i32_le().map_err(|_| Self::truncated())
    }

    fn read_f32(&mut self) -> Result<f32> {
        self.cursor.read_f32_le().map_err(|_| Self::truncated())
    }

    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        if self.remaining() < len {
            return Err(Self::truncated());
        }
        let mut buf = vec![0u8; len];
        self.cursor
            .read_exact(&mut buf)
            .map_err(|_| Self::truncated())?;
        Ok(buf)
    }

    /// Read a NUL-terminated string
    fn read_cstring(&mut self) -> Result<String> {
        let mut bytes = Vec::new();
        loop {
            match self.read_u8()? {
                0 => break,
                b => bytes.push(b),
            }
        }
        String::from_utf8(bytes).map_err(|_| Error::malformed("invalid UTF-8 in string data"))
    }

    /// Dictionary count and index width depend on the encoding revision
    fn read_dictionary_index(&mut self) -> Result<usize> {
        let index = if self.version.wide_dictionary() {
            self.read_u32()? as usize
        } else {
            self.read_u16()? as usize
        };
        if index >= self.dictionary.len() {
            return Err(Error::malformed(format!(
                "string dictionary index {index} out of range ({} entries)",
                self.dictionary.len()
            )));
        }
        Ok(index)
    }

    fn dictionary_string(&self, index: usize) -> String {
        self.dictionary[index].clone()
    }

    fn read_dictionary(&mut self) -> Result<()> {
        let count = if self.version.wide_dictionary() {
            self.read_u32()? as usize
        } else {
            self.read_u16()? as usize
        };
        // Every entry takes at least its NUL terminator
        if count > self.remaining() {
            return Err(Error::malformed("string dictionary count exceeds stream"));
        }
        self.dictionary.reserve(count);
        for _ in 0..count {
            let entry = self.read_cstring()?;
            self.dictionary.push(entry);
        }
        Ok(())
    }

    fn read_element_declarations(&mut self) -> Result<Vec<Element>> {
        let count = self.read_u32()? as usize;
        // Minimum declaration: dictionary index + empty name NUL + signature
        let min_decl = if self.version.wide_dictionary() { 21 } else { 19 };
        if count > self.remaining() / min_decl {
            return Err(Error::malformed("element count exceeds stream size"));
        }

        let mut elements = Vec::with_capacity(count);
        for _ in 0..count {
            let type_index = self.read_dictionary_index()?;
            let type_name = self.dictionary_string(type_index);
            let name = self.read_cstring()?;
            let mut signature = [0u8; 16];
            let bytes = self.read_bytes(16)?;
            signature.copy_from_slice(&bytes);
            elements.push(Element::with_signature(type_name, name, signature));
        }
        Ok(elements)
    }

    fn read_attribute_stream(&mut self, element: &mut Element, element_count: usize) -> Result<()> {
        let count = self.read_u32()? as usize;
        // Minimum attribute: dictionary index + tag + one payload byte
        let min_attr = if self.version.wide_dictionary() { 6 } else { 4 };
        if count > self.remaining() / min_attr {
            return Err(Error::malformed("attribute count exceeds stream size"));
        }

        for _ in 0..count {
            let name_index = self.read_dictionary_index()?;
            let name = self.dictionary_string(name_index);
            let tag = self.read_u8()?;
            let attribute_type = AttributeType::from_tag(tag)?;
            let value = self.read_value(attribute_type, element_count)?;
            element.set_attribute(name, value);
        }
        Ok(())
    }

    fn read_element_reference(&mut self, element_count: usize) -> Result<u32> {
        let index = self.read_u32()?;
        if index != NULL_ELEMENT && index as usize >= element_count {
            return Err(Error::DanglingReference {
                index,
                element_count,
            });
        }
        Ok(index)
    }

    fn read_length_prefixed_string(&mut self) -> Result<String> {
        let len = self.read_u16()? as usize;
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes).map_err(|_| Error::malformed("invalid UTF-8 in string data"))
    }

    fn read_color(&mut self) -> Result<[u8; 4]> {
        let bytes = self.read_bytes(4)?;
        Ok([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    fn read_floats<const N: usize>(&mut self) -> Result<[f32; N]> {
        let mut out = [0f32; N];
        for slot in &mut out {
            *slot = self.read_f32()?;
        }
        Ok(out)
    }

    /// Array payloads are a u32 count followed by that many scalar encodings
    fn read_array_count(&mut self, scalar_min_size: usize) -> Result<usize> {
        let count = self.read_u32()? as usize;
        if count > self.remaining() / scalar_min_size {
            return Err(Error::malformed("array count exceeds stream size"));
        }
        Ok(count)
    }

    fn read_array<T, F>(&mut self, scalar_min_size: usize, mut read_one: F) -> Result<Vec<T>>
    where
        F: FnMut(&mut Self) -> Result<T>,
    {
        let count = self.read_array_count(scalar_min_size)?;
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(read_one(self)?);
        }
        Ok(items)
    }

    fn read_value(
        &mut self,
        attribute_type: AttributeType,
        element_count: usize,
    ) -> Result<AttributeValue> {
        Ok(match attribute_type {
            AttributeType::Element => {
                AttributeValue::Element(self.read_element_reference(element_count)?)
            }
            AttributeType::Integer => AttributeValue::Integer(self.read_i32()?),
            AttributeType::Float => AttributeValue::Float(self.read_f32()?),
            AttributeType::Boolean => AttributeValue::Boolean(self.read_u8()? != 0),
            AttributeType::String => {
                AttributeValue::String(self.read_length_prefixed_string()?)
            }
            AttributeType::Binary => {
                let len = self.read_u32()? as usize;
                AttributeValue::Binary(self.read_bytes(len)?)
            }
            AttributeType::Time => AttributeValue::Time(Time::from_ticks(self.read_i32()?)),
            AttributeType::Color => AttributeValue::Color(self.read_color()?),
            AttributeType::Vector2 => AttributeValue::Vector2(self.read_floats()?),
            AttributeType::Vector3 => AttributeValue::Vector3(self.read_floats()?),
            AttributeType::Vector4 => AttributeValue::Vector4(self.read_floats()?),
            AttributeType::QAngle => AttributeValue::QAngle(self.read_floats()?),
            AttributeType::Quaternion => AttributeValue::Quaternion(self.read_floats()?),
            AttributeType::Matrix => AttributeValue::Matrix(self.read_floats()?),
            AttributeType::ElementArray => AttributeValue::ElementArray(
                self.read_array(4, |r| r.read_element_reference(element_count))?,
            ),
            AttributeType::IntegerArray => {
                AttributeValue::IntegerArray(self.read_array(4, Self::read_i32)?)
            }
            AttributeType::FloatArray => {
                AttributeValue::FloatArray(self.read_array(4, Self::read_f32)?)
            }
            AttributeType::BooleanArray => {
                AttributeValue::BooleanArray(self.read_array(1, |r| Ok(r.read_u8()? != 0))?)
            }
            AttributeType::StringArray => AttributeValue::StringArray(
                self.read_array(2, Self::read_length_prefixed_string)?,
            ),
            AttributeType::BinaryArray => {
                AttributeValue::BinaryArray(self.read_array(4, |r| {
                    let len = r.read_u32()? as usize;
                    r.read_bytes(len)
                })?)
            }
            AttributeType::TimeArray => AttributeValue::TimeArray(
                self.read_array(4, |r| Ok(Time::from_ticks(r.read_i32()?)))?,
            ),
            AttributeType::ColorArray => {
                AttributeValue::ColorArray(self.read_array(4, Self::read_color)?)
            }
            AttributeType::Vector2Array => {
                AttributeValue::Vector2Array(self.read_array(8, Self::read_floats)?)
            }
            AttributeType::Vector3Array => {
                AttributeValue::Vector3Array(self.read_array(12, Self::read_floats)?)
            }
            AttributeType::Vector4Array => {
                AttributeValue::Vector4Array(self.read_array(16, Self::read_floats)?)
            }
            AttributeType::QAngleArray => {
                AttributeValue::QAngleArray(self.read_array(12, Self::read_floats)?)
            }
            AttributeType::QuaternionArray => {
                AttributeValue::QuaternionArray(self.read_array(16, Self::read_floats)?)
            }
            AttributeType::MatrixArray => {
                AttributeValue::MatrixArray(self.read_array(64, Self::read_floats)?)
            }
        })
    }
}
