//! Attribute type table and typed attribute values
//!
//! Binary DMX tags every attribute with a one-byte type. Twelve scalar kinds
//! and their twelve array counterparts are defined, plus the element
//! reference and its array, for 28 tags total (0x01-0x1C).

use crate::{Error, Result};

/// Sentinel index for a null element reference
pub const NULL_ELEMENT: u32 = 0xFFFF_FFFF;

/// One-byte attribute type tags, as stored in the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AttributeType {
    /// Index of another element in the document
    Element = 0x01,
    /// 32-bit signed integer
    Integer = 0x02,
    /// 32-bit IEEE-754 float
    Float = 0x03,
    /// Single byte, zero or one
    Boolean = 0x04,
    /// Length-prefixed byte string
    String = 0x05,
    /// Length-prefixed binary blob
    Binary = 0x06,
    /// Fixed-point time value
    Time = 0x07,
    /// RGBA color, one byte per channel
    Color = 0x08,
    /// Two packed floats
    Vector2 = 0x09,
    /// Three packed floats
    Vector3 = 0x0A,
    /// Four packed floats
    Vector4 = 0x0B,
    /// Euler angle triple
    QAngle = 0x0C,
    /// Quaternion, four packed floats
    Quaternion = 0x0D,
    /// 4x4 matrix, sixteen packed floats
    Matrix = 0x0E,
    /// Array of element indices
    ElementArray = 0x0F,
    /// Array of integers
    IntegerArray = 0x10,
    /// Array of floats
    FloatArray = 0x11,
    /// Array of booleans
    BooleanArray = 0x12,
    /// Array of strings
    StringArray = 0x13,
    /// Array of binary blobs
    BinaryArray = 0x14,
    /// Array of time values
    TimeArray = 0x15,
    /// Array of colors
    ColorArray = 0x16,
    /// Array of 2-vectors
    Vector2Array = 0x17,
    /// Array of 3-vectors
    Vector3Array = 0x18,
    /// Array of 4-vectors
    Vector4Array = 0x19,
    /// Array of angle triples
    QAngleArray = 0x1A,
    /// Array of quaternions
    QuaternionArray = 0x1B,
    /// Array of matrices
    MatrixArray = 0x1C,
}

impl AttributeType {
    /// Look up a type by its stream tag
    pub fn from_tag(tag: u8) -> Result<Self> {
        Ok(match tag {
            0x01 => AttributeType::Element,
            0x02 => AttributeType::Integer,
            0x03 => AttributeType::Float,
            0x04 => AttributeType::Boolean,
            0x05 => AttributeType::String,
            0x06 => AttributeType::Binary,
            0x07 => AttributeType::Time,
            0x08 => AttributeType::Color,
            0x09 => AttributeType::Vector2,
            0x0A => AttributeType::Vector3,
            0x0B => AttributeType::Vector4,
            0x0C => AttributeType::QAngle,
            0x0D => AttributeType::Quaternion,
            0x0E => AttributeType::Matrix,
            0x0F => AttributeType::ElementArray,
            0x10 => AttributeType::IntegerArray,
            0x11 => AttributeType::FloatArray,
            0x12 => AttributeType::BooleanArray,
            0x13 => AttributeType::StringArray,
            0x14 => AttributeType::BinaryArray,
            0x15 => AttributeType::TimeArray,
            0x16 => AttributeType::ColorArray,
            0x17 => AttributeType::Vector2Array,
            0x18 => AttributeType::Vector3Array,
            0x19 => AttributeType::Vector4Array,
            0x1A => AttributeType::QAngleArray,
            0x1B => AttributeType::QuaternionArray,
            0x1C => AttributeType::MatrixArray,
            other => return Err(Error::UnknownAttributeType(other)),
        })
    }

    /// The one-byte tag written to the stream
    pub fn tag(&self) -> u8 {
        *self as u8
    }

    /// Whether this is one of the twelve array kinds
    pub fn is_array(&self) -> bool {
        self.tag() >= AttributeType::ElementArray.tag()
    }
}

/// Fixed-point time value, stored as a tick count of 1/10000 second
///
/// The raw tick count is kept so re-encoding never loses precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Time {
    ticks: i32,
}

impl Time {
    /// Ticks per second in the wire representation
    pub const TICKS_PER_SECOND: i32 = 10_000;

    /// Construct from a raw tick count
    pub fn from_ticks(ticks: i32) -> Self {
        Self { ticks }
    }

    /// Construct from seconds, rounding to the nearest tick
    pub fn from_seconds(seconds: f32) -> Self {
        Self {
            ticks: (seconds * Self::TICKS_PER_SECOND as f32).round() as i32,
        }
    }

    /// Raw tick count
    pub fn ticks(&self) -> i32 {
        self.ticks
    }

    /// Value in seconds
    pub fn seconds(&self) -> f32 {
        self.ticks as f32 / Self::TICKS_PER_SECOND as f32
    }
}

/// A typed attribute value
///
/// Element references hold the index of another element in the same
/// document (or [`NULL_ELEMENT`]), never an owning link, so documents can
/// express self-references and cycles freely.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// Element reference by index
    Element(u32),
    /// Signed integer
    Integer(i32),
    /// Float
    Float(f32),
    /// Boolean
    Boolean(bool),
    /// Text string
    String(String),
    /// Binary blob
    Binary(Vec<u8>),
    /// Time value
    Time(Time),
    /// RGBA color
    Color([u8; 4]),
    /// 2-vector
    Vector2([f32; 2]),
    /// 3-vector
    Vector3([f32; 3]),
    /// 4-vector
    Vector4([f32; 4]),
    /// Angle triple
    QAngle([f32; 3]),
    /// Quaternion
    Quaternion([f32; 4]),
    /// 4x4 matrix in row order
    Matrix([f32; 16]),
    /// Array of element references
    ElementArray(Vec<u32>),
    /// Array of integers
    IntegerArray(Vec<i32>),
    /// Array of floats
    FloatArray(Vec<f32>),
    /// Array of booleans
    BooleanArray(Vec<bool>),
    /// Array of strings
    StringArray(Vec<String>),
    /// Array of binary blobs
    BinaryArray(Vec<Vec<u8>>),
    /// Array of time values
    TimeArray(Vec<Time>),
    /// Array of colors
    ColorArray(Vec<[u8; 4]>),
    /// Array of 2-vectors
    Vector2Array(Vec<[f32; 2]>),
    /// Array of 3-vectors
    Vector3Array(Vec<[f32; 3]>),
    /// Array of 4-vectors
    Vector4Array(Vec<[f32; 4]>),
    /// Array of angle triples
    QAngleArray(Vec<[f32; 3]>),
    /// Array of quaternions
    QuaternionArray(Vec<[f32; 4]>),
    /// Array of matrices
    MatrixArray(Vec<[f32; 16]>),
}

impl AttributeValue {
    /// The type tag this value encodes as
    pub fn attribute_type(&self) -> AttributeType {
        match self {
            AttributeValue::Element(_) => AttributeType::Element,
            AttributeValue::Integer(_) => AttributeType::Integer,
            AttributeValue::Float(_) => AttributeType::Float,
            AttributeValue::Boolean(_) => AttributeType::Boolean,
            AttributeValue::String(_) => AttributeType::String,
            AttributeValue::Binary(_) => AttributeType::Binary,
            AttributeValue::Time(_) => AttributeType::Time,
            AttributeValue::Color(_) => AttributeType::Color,
            AttributeValue::Vector2(_) => AttributeType::Vector2,
            AttributeValue::Vector3(_) => AttributeType::Vector3,
            AttributeValue::Vector4(_) => AttributeType::Vector4,
            AttributeValue::QAngle(_) => AttributeType::QAngle,
            AttributeValue::Quaternion(_) => AttributeType::Quaternion,
            AttributeValue::Matrix(_) => AttributeType::Matrix,
            AttributeValue::ElementArray(_) => AttributeType::ElementArray,
            AttributeValue::IntegerArray(_) => AttributeType::IntegerArray,
            AttributeValue::FloatArray(_) => AttributeType::FloatArray,
            AttributeValue::BooleanArray(_) => AttributeType::BooleanArray,
            AttributeValue::StringArray(_) => AttributeType::StringArray,
            AttributeValue::BinaryArray(_) => AttributeType::BinaryArray,
            AttributeValue::TimeArray(_) => AttributeType::TimeArray,
            AttributeValue::ColorArray(_) => AttributeType::ColorArray,
            AttributeValue::Vector2Array(_) => AttributeType::Vector2Array,
            AttributeValue::Vector3Array(_) => AttributeType::Vector3Array,
            AttributeValue::Vector4Array(_) => AttributeType::Vector4Array,
            AttributeValue::QAngleArray(_) => AttributeType::QAngleArray,
            AttributeValue::QuaternionArray(_) => AttributeType::QuaternionArray,
            AttributeValue::MatrixArray(_) => AttributeType::MatrixArray,
        }
    }

    /// Element indices referenced by this value, if it is a reference kind
    pub fn referenced_elements(&self) -> &[u32] {
        match self {
            AttributeValue::Element(index) => std::slice::from_ref(index),
            AttributeValue::ElementArray(indices) => indices,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_round_trip() {
        for tag in 0x01..=0x1C {
            let ty = AttributeType::from_tag(tag).unwrap();
            assert_eq!(ty.tag(), tag);
        }
    }

    #[test]
    fn test_unknown_tags_rejected() {
        assert!(matches!(
            AttributeType::from_tag(0x00),
            Err(Error::UnknownAttributeType(0x00))
        ));
        assert!(matches!(
            AttributeType::from_tag(0x1D),
            Err(Error::UnknownAttributeType(0x1D))
        ));
        assert!(AttributeType::from_tag(0xFF).is_err());
    }

    #[test]
    fn test_array_classification() {
        assert!(!AttributeType::Element.is_array());
        assert!(!AttributeType::Matrix.is_array());
        assert!(AttributeType::ElementArray.is_array());
        assert!(AttributeType::MatrixArray.is_array());
    }

    #[test]
    fn test_time_conversion() {
        let t = Time::from_seconds(1.5);
        assert_eq!(t.ticks(), 15_000);
        assert_eq!(t.seconds(), 1.5);

        // Raw ticks survive conversion untouched
        let t = Time::from_ticks(12_345);
        assert_eq!(Time::from_ticks(t.ticks()), t);
    }

    #[test]
    fn test_referenced_elements() {
        assert_eq!(AttributeValue::Element(3).referenced_elements(), &[3]);
        assert_eq!(
            AttributeValue::ElementArray(vec![0, 1, 2]).referenced_elements(),
            &[0, 1, 2]
        );
        assert!(AttributeValue::Integer(7).referenced_elements().is_empty());
    }
}
