/// serde adapter tests: how Rust shapes map onto plist elements, and which
/// shapes are rejected.
use std::collections::BTreeMap;

use num_bigint::BigInt;
use plist_xml::{to_string, to_vec, to_writer, Dict, Integer, Plist, PlistError, Real};
use serde::{Serialize, Serializer};

/// Serialize and decode back into a tree.
fn tree_of<T: Serialize>(value: &T) -> Plist {
    let xml = to_string(value).unwrap();
    xml.parse().unwrap()
}

fn dict(entries: Vec<(&str, Plist)>) -> Plist {
    Plist::Dict(
        entries
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect::<Dict>(),
    )
}

fn int(v: i64) -> Plist {
    Plist::Integer(Integer::Signed(v))
}

/// Bytes serialized through `serialize_bytes`.
struct Blob(&'static [u8]);

impl Serialize for Blob {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(self.0)
    }
}

#[derive(Serialize)]
struct Hobbit {
    name: String,
    #[serde(rename = "Age")]
    age: u32,
    friends: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nickname: Option<String>,
    home: Home,
}

#[derive(Serialize)]
struct Home {
    hole: bool,
    rooms: u8,
}

#[derive(Serialize)]
struct Meters(f64);

#[derive(Serialize)]
struct Point(i32, i32);

#[derive(Serialize)]
enum Mood {
    Content,
}

// ============================================================================
// Structs and maps
// ============================================================================

#[test]
fn serialize_struct_as_dict() {
    let bilbo = Hobbit {
        name: "Bilbo Baggins".into(),
        age: 111,
        friends: vec!["Gandalf the Grey".into()],
        nickname: None,
        home: Home {
            hole: true,
            rooms: 12,
        },
    };
    assert_eq!(
        tree_of(&bilbo),
        dict(vec![
            ("name", Plist::String("Bilbo Baggins".into())),
            ("Age", int(111)),
            (
                "friends",
                Plist::Array(vec![Plist::String("Gandalf the Grey".into())])
            ),
            (
                "home",
                dict(vec![("hole", Plist::Bool(true)), ("rooms", int(12))])
            ),
        ])
    );
}

#[test]
fn serialize_some_writes_inner_value() {
    let bilbo = Hobbit {
        name: "Bilbo".into(),
        age: 50,
        friends: vec![],
        nickname: Some("Mad Baggins".into()),
        home: Home {
            hole: true,
            rooms: 1,
        },
    };
    let tree = tree_of(&bilbo);
    let nickname = tree.as_dict().and_then(|d| d.get("nickname"));
    assert_eq!(nickname, Some(&Plist::String("Mad Baggins".into())));
}

#[test]
fn serialize_struct_field_order_is_declaration_order() {
    let xml = to_string(&Home {
        hole: false,
        rooms: 3,
    })
    .unwrap();
    let hole = xml.find("<key>hole</key>").unwrap();
    let rooms = xml.find("<key>rooms</key>").unwrap();
    assert!(hole < rooms);
}

#[test]
fn serialize_map_with_string_keys() {
    let mut map = BTreeMap::new();
    map.insert("b", 2);
    map.insert("a", 1);
    assert_eq!(tree_of(&map), dict(vec![("a", int(1)), ("b", int(2))]));
}

#[test]
fn serialize_map_with_char_keys() {
    let mut map = BTreeMap::new();
    map.insert('x', true);
    assert_eq!(tree_of(&map), dict(vec![("x", Plist::Bool(true))]));
}

#[test]
fn serialize_empty_containers() {
    let empty: Vec<i32> = Vec::new();
    let xml = to_string(&empty).unwrap();
    assert!(xml.contains("\t<array/>"), "{xml}");
    let map: BTreeMap<String, i32> = BTreeMap::new();
    let xml = to_string(&map).unwrap();
    assert!(xml.contains("\t<dict/>"), "{xml}");
}

// ============================================================================
// Sequences and scalars
// ============================================================================

#[test]
fn serialize_sequences_and_tuples_as_arrays() {
    let value = (vec![1u8, 2], ("x", 'y'), Point(-1, 1));
    assert_eq!(
        tree_of(&value),
        Plist::Array(vec![
            Plist::Array(vec![int(1), int(2)]),
            Plist::Array(vec![
                Plist::String("x".into()),
                Plist::String("y".into())
            ]),
            Plist::Array(vec![int(-1), int(1)]),
        ])
    );
}

#[test]
fn serialize_newtype_is_transparent() {
    assert_eq!(
        tree_of(&vec![Meters(1.5)]),
        Plist::Array(vec![Plist::Real(Real::Double(1.5))])
    );
}

#[test]
fn serialize_bytes_as_data() {
    let xml = to_string(&vec![Blob(b"hello")]).unwrap();
    assert!(xml.contains("<data>aGVsbG8=</data>"), "{xml}");
}

#[test]
fn serialize_integer_widths() {
    let value = (
        i8::MIN,
        u16::MAX,
        u64::MAX,
        i128::MIN,
        u128::from(u32::MAX),
    );
    let big: BigInt = i128::MIN.into();
    assert_eq!(
        tree_of(&value),
        Plist::Array(vec![
            int(-128),
            int(65535),
            Plist::Integer(Integer::Unsigned(u64::MAX)),
            Plist::Integer(Integer::Big(big)),
            int(4_294_967_295),
        ])
    );
}

#[test]
fn serialize_floats() {
    let value = (0.5f32, -2.25f64);
    assert_eq!(
        tree_of(&value),
        Plist::Array(vec![
            Plist::Real(Real::Double(0.5)),
            Plist::Real(Real::Double(-2.25)),
        ])
    );
}

#[test]
fn serialize_to_writer_and_to_vec_agree() {
    let value = vec!["a", "b"];
    let through_writer = to_writer(Vec::new(), &value).unwrap();
    assert_eq!(through_writer, to_vec(&value).unwrap());
}

// ============================================================================
// Rejected shapes
// ============================================================================

#[test]
fn reject_scalar_root() {
    let err = to_string(&42).unwrap_err();
    assert!(matches!(err, PlistError::Unsupported(_)), "{err:?}");
}

#[test]
fn reject_none() {
    let err = to_string(&vec![None::<i32>]).unwrap_err();
    assert!(matches!(err, PlistError::Unsupported(_)), "{err:?}");
}

#[test]
fn reject_unit() {
    let err = to_string(&vec![()]).unwrap_err();
    assert!(matches!(err, PlistError::Unsupported(_)), "{err:?}");
}

#[test]
fn reject_enum_variant() {
    let err = to_string(&vec![Mood::Content]).unwrap_err();
    assert!(matches!(err, PlistError::Unsupported(_)), "{err:?}");
}

#[test]
fn reject_non_string_map_key() {
    let mut map = BTreeMap::new();
    map.insert(1, "one");
    let err = to_string(&map).unwrap_err();
    assert!(err.is_misuse(), "{err:?}");
}

#[test]
fn rejected_value_leaves_no_document() {
    let mut out = Vec::new();
    let err = to_writer(&mut out, &vec![Some(1), None]).unwrap_err();
    assert!(matches!(err, PlistError::Unsupported(_)), "{err:?}");
    let partial = String::from_utf8(out).unwrap();
    assert!(!partial.contains("</plist>"), "{partial}");
}
