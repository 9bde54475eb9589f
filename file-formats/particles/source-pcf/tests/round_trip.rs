//! Decode/encode round-trip coverage
//!
//! The codec's contract is that `decode(encode(d))` is structurally equal
//! to `d` for every recognized version, and that encoding is deterministic.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use source_pcf::{AttributeValue, Document, Element, NULL_ELEMENT, PcfVersion, Time};

/// A document exercising every scalar and array attribute kind
fn full_coverage_document(version: PcfVersion) -> Document {
    let mut doc = Document::new(version);

    let mut system = Element::with_signature(
        "DmeParticleSystemDefinition",
        "fire_large",
        *b"0123456789abcdef",
    );
    system.set_attribute("owner", AttributeValue::Element(1));
    system.set_attribute("max_particles", AttributeValue::Integer(2048));
    system.set_attribute("radius", AttributeValue::Float(12.5));
    system.set_attribute("sort", AttributeValue::Boolean(true));
    system.set_attribute("material", AttributeValue::String("effects/fire".into()));
    system.set_attribute("raw", AttributeValue::Binary(vec![0xDE, 0xAD, 0xBE, 0xEF]));
    system.set_attribute("lifetime", AttributeValue::Time(Time::from_ticks(25_000)));
    system.set_attribute("color", AttributeValue::Color([255, 128, 0, 255]));
    system.set_attribute("uv", AttributeValue::Vector2([0.25, 0.75]));
    system.set_attribute("origin", AttributeValue::Vector3([1.0, -2.0, 3.5]));
    system.set_attribute("bounds", AttributeValue::Vector4([0.0, 1.0, 2.0, 3.0]));
    system.set_attribute("angles", AttributeValue::QAngle([0.0, 90.0, -45.0]));
    system.set_attribute("spin", AttributeValue::Quaternion([0.0, 0.0, 0.0, 1.0]));
    system.set_attribute(
        "transform",
        AttributeValue::Matrix([
            1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
        ]),
    );
    doc.push_element(system);

    let mut children = Element::new("DmeParticleChild", "children");
    children.set_attribute(
        "refs",
        AttributeValue::ElementArray(vec![0, 1, NULL_ELEMENT]),
    );
    children.set_attribute("ints", AttributeValue::IntegerArray(vec![-1, 0, 1]));
    children.set_attribute("floats", AttributeValue::FloatArray(vec![0.5, 1.5]));
    children.set_attribute("flags", AttributeValue::BooleanArray(vec![true, false]));
    children.set_attribute(
        "names",
        AttributeValue::StringArray(vec!["a".into(), String::new(), "long name".into()]),
    );
    children.set_attribute(
        "blobs",
        AttributeValue::BinaryArray(vec![vec![], vec![1, 2, 3]]),
    );
    children.set_attribute(
        "times",
        AttributeValue::TimeArray(vec![Time::from_ticks(0), Time::from_ticks(-10)]),
    );
    children.set_attribute(
        "palette",
        AttributeValue::ColorArray(vec![[0, 0, 0, 0], [255, 255, 255, 255]]),
    );
    children.set_attribute("uvs", AttributeValue::Vector2Array(vec![[0.0, 1.0]]));
    children.set_attribute("points", AttributeValue::Vector3Array(vec![[1.0, 2.0, 3.0]]));
    children.set_attribute(
        "planes",
        AttributeValue::Vector4Array(vec![[0.0, 0.0, 1.0, -4.0]]),
    );
    children.set_attribute("rotations", AttributeValue::QAngleArray(vec![[0.0, 0.0, 0.0]]));
    children.set_attribute(
        "orientations",
        AttributeValue::QuaternionArray(vec![[0.0, 0.0, 0.0, 1.0]]),
    );
    children.set_attribute(
        "bones",
        AttributeValue::MatrixArray(vec![[
            2.0, 0.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 0.0, 1.0,
        ]]),
    );
    doc.push_element(children);

    doc
}

#[test]
fn round_trip_all_versions() {
    for version in PcfVersion::ALL {
        let doc = full_coverage_document(version);
        let bytes = doc.encode().unwrap();
        let decoded = Document::decode(&bytes).unwrap();
        assert_eq!(decoded, doc, "round-trip mismatch for {version}");
    }
}

#[test]
fn encode_twice_is_byte_identical() {
    for version in PcfVersion::ALL {
        let doc = full_coverage_document(version);
        assert_eq!(doc.encode().unwrap(), doc.encode().unwrap());
    }
}

#[test]
fn self_reference_survives_round_trip() {
    let mut doc = Document::new(PcfVersion::Binary2Pcf1);
    let index = doc.push_element(Element::new("DmElement", "ouroboros"));
    doc.element_mut(index)
        .unwrap()
        .set_attribute("self", AttributeValue::Element(index));

    let bytes = doc.encode().unwrap();
    let decoded = Document::decode(&bytes).unwrap();
    assert_eq!(
        decoded.element(index).unwrap().attribute("self"),
        Some(&AttributeValue::Element(index))
    );
}

#[test]
fn mutual_cycle_survives_round_trip() {
    let mut doc = Document::new(PcfVersion::Binary5Pcf2);
    let a = doc.push_element(Element::new("DmElement", "a"));
    let b = doc.push_element(Element::new("DmElement", "b"));
    doc.element_mut(a)
        .unwrap()
        .set_attribute("peer", AttributeValue::Element(b));
    doc.element_mut(b)
        .unwrap()
        .set_attribute("peer", AttributeValue::Element(a));

    let decoded = Document::decode(&doc.encode().unwrap()).unwrap();
    assert_eq!(decoded, doc);
}

#[test]
fn forward_reference_is_legal() {
    let mut doc = Document::new(PcfVersion::Binary4Pcf2);
    let first = doc.push_element(Element::new("DmElement", "first"));
    // References an element declared after this one
    doc.element_mut(first)
        .unwrap()
        .set_attribute("next", AttributeValue::Element(1));
    doc.push_element(Element::new("DmElement", "second"));

    let decoded = Document::decode(&doc.encode().unwrap()).unwrap();
    assert_eq!(decoded, doc);
}

#[test]
fn dangling_reference_rejected_at_decode() {
    // Encode a valid two-element document, then corrupt the reference index
    let mut doc = Document::new(PcfVersion::Binary2Pcf1);
    doc.push_element(Element::new("DmElement", "first"));
    let second = doc.push_element(Element::new("DmElement", "second"));
    doc.element_mut(second)
        .unwrap()
        .set_attribute("prev", AttributeValue::Element(0));

    let mut bytes = doc.encode().unwrap();
    // The last element's reference payload is the final four bytes
    let len = bytes.len();
    bytes[len - 4..].copy_from_slice(&99u32.to_le_bytes());

    assert!(matches!(
        Document::decode(&bytes),
        Err(source_pcf::Error::DanglingReference { index: 99, .. })
    ));
}

fn arb_scalar() -> impl Strategy<Value = AttributeValue> {
    let f = -1.0e6f32..1.0e6f32;
    prop_oneof![
        any::<i32>().prop_map(AttributeValue::Integer),
        f.clone().prop_map(AttributeValue::Float),
        any::<bool>().prop_map(AttributeValue::Boolean),
        "[a-z0-9/_ ]{0,24}".prop_map(AttributeValue::String),
        proptest::collection::vec(any::<u8>(), 0..32).prop_map(AttributeValue::Binary),
        any::<i32>().prop_map(|t| AttributeValue::Time(Time::from_ticks(t))),
        any::<[u8; 4]>().prop_map(AttributeValue::Color),
        [f.clone(), f.clone()].prop_map(AttributeValue::Vector2),
        [f.clone(), f.clone(), f.clone()].prop_map(AttributeValue::Vector3),
        proptest::collection::vec(any::<i32>(), 0..8).prop_map(AttributeValue::IntegerArray),
        proptest::collection::vec(f, 0..8).prop_map(AttributeValue::FloatArray),
        proptest::collection::vec("[a-z]{0,8}", 0..4).prop_map(AttributeValue::StringArray),
    ]
}

prop_compose! {
    fn arb_document()(
        version in proptest::sample::select(PcfVersion::ALL.to_vec()),
        specs in proptest::collection::vec(
            (
                "[A-Za-z]{1,12}",
                "[a-z0-9_]{0,16}",
                proptest::collection::vec(("[a-z_]{1,10}", arb_scalar()), 0..6),
            ),
            0..6,
        ),
    ) -> Document {
        let mut doc = Document::new(version);
        for (type_name, name, attributes) in specs {
            let mut element = Element::new(type_name, name);
            for (attr_name, value) in attributes {
                element.set_attribute(attr_name, value);
            }
            doc.push_element(element);
        }
        doc
    }
}

proptest! {
    #[test]
    fn prop_round_trip(doc in arb_document()) {
        let bytes = doc.encode().unwrap();
        let decoded = Document::decode(&bytes).unwrap();
        prop_assert_eq!(decoded, doc);
    }
}
