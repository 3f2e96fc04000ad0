/// Wire-format compliance tests for XML property lists.
///
/// Golden documents are checked byte for byte in the encode direction and
/// value for value in the decode direction. Documents written by Apple's own
/// tooling (comments, line-wrapped data, long-form booleans, offsets on dates)
/// must decode as well.
use chrono::{TimeZone, Utc};
use plist_xml::{
    encode_array_plist, encode_dict_plist, to_string, Integer, Plist, PlistDecoder, PlistError,
    Real, Value,
};
use serde::Serialize;

const BILBO: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>
<!DOCTYPE plist PUBLIC \"-//Apple Computer//DTD PLIST 1.0//EN\" \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">
<plist version=\"1.0\">
\t<dict>
\t\t<key>name</key>
\t\t<string>Bilbo Baggins</string>
\t\t<key>age</key>
\t\t<integer>111</integer>
\t</dict>
</plist>";

const APPLE_STYLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<!-- written by hand -->
<dict>
	<key>CFBundleIdentifier</key>
	<string>org.example.shire</string>
	<key>LSRequiresIPhoneOS</key>
	<true/>
	<key>UIRequiredDeviceCapabilities</key>
	<array>
		<string>armv7</string>
	</array>
	<key>Icon</key>
	<data>
	aGVs
	bG8=
	</data>
	<key>Created</key>
	<date>2015-08-01T04:03:04+02:00</date>
	<key>Ratio</key>
	<real>0.75</real>
	<key>Hidden</key>
	<false></false>
</dict>
</plist>
"#;

/// Assert that encoding produces the exact expected document.
fn assert_encode(actual: Vec<u8>, expected: &str) {
    let actual = String::from_utf8(actual).unwrap();
    assert_eq!(
        actual, expected,
        "Encode mismatch:\n  got:\n{actual}\n  expected:\n{expected}"
    );
}

/// Assert invariants every encoded document must satisfy.
fn assert_document_invariants(xml: &str) {
    let lines: Vec<&str> = xml.lines().collect();
    assert!(lines.len() >= 5, "too short: {xml:?}");
    assert_eq!(lines[0], "<?xml version=\"1.0\" encoding=\"UTF-8\"?>");
    assert!(lines[1].starts_with("<!DOCTYPE plist PUBLIC"));
    assert_eq!(lines[2], "<plist version=\"1.0\">");
    assert_eq!(lines[lines.len() - 1], "</plist>");
    for (i, line) in lines.iter().enumerate().skip(3).take(lines.len() - 4) {
        assert!(line.starts_with('\t'), "line {i} is not indented: {line:?}");
        assert!(!line.ends_with(' '), "line {i} has trailing space: {line:?}");
        assert!(!line.trim_start_matches('\t').starts_with(' '), "line {i}: {line:?}");
    }
}

fn entry(key: &str, value: Value) -> Value {
    Value::DictEntry {
        key: key.to_string(),
        value: Box::new(value),
    }
}

// ============================================================================
// Golden documents
// ============================================================================

#[test]
fn golden_bilbo_encode() {
    let out = encode_dict_plist(Vec::new(), |d| {
        d.write_string("name", "Bilbo Baggins")?;
        d.write_int("age", 111)
    })
    .unwrap();
    assert_encode(out, BILBO);
}

#[test]
fn golden_bilbo_serde() {
    #[derive(Serialize)]
    struct Hobbit<'a> {
        name: &'a str,
        age: u16,
    }
    let xml = to_string(&Hobbit {
        name: "Bilbo Baggins",
        age: 111,
    })
    .unwrap();
    assert_eq!(xml, BILBO);
}

#[test]
fn golden_bilbo_tree() {
    let plist: Plist = BILBO.parse().unwrap();
    assert_eq!(plist.to_xml_string().unwrap(), BILBO);
}

#[test]
fn golden_bilbo_decode() {
    let events: Vec<Value> = PlistDecoder::new(BILBO.as_bytes())
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(
        events,
        vec![
            Value::DictStart,
            entry("name", Value::String("Bilbo Baggins".into())),
            entry("age", Value::Integer(Integer::Signed(111))),
            Value::ContainerEnd,
        ]
    );
}

#[test]
fn golden_nested_document_invariants() {
    let out = encode_array_plist(Vec::new(), |a| {
        a.write_dict(|d| {
            d.write_array("levels", |inner| {
                inner.write_array(|deepest| deepest.write_bool(true))?;
                inner.write_array(|_| Ok(()))
            })
        })?;
        a.write_string("tail")
    })
    .unwrap();
    let xml = String::from_utf8(out).unwrap();
    assert_document_invariants(&xml);
    assert!(xml.contains("\n\t\t\t\t\t<true/>\n"), "{xml}");
    assert!(xml.contains("\n\t\t\t\t<array/>\n"), "{xml}");
}

// ============================================================================
// Header idempotence
// ============================================================================

#[test]
fn header_identical_for_array_and_dict() {
    let array = String::from_utf8(encode_array_plist(Vec::new(), |_| Ok(())).unwrap()).unwrap();
    let dict = String::from_utf8(encode_dict_plist(Vec::new(), |_| Ok(())).unwrap()).unwrap();

    let array_lines: Vec<&str> = array.lines().collect();
    let dict_lines: Vec<&str> = dict.lines().collect();
    assert_eq!(array_lines.len(), 5);
    assert_eq!(dict_lines.len(), 5);
    assert_eq!(array_lines[..3], dict_lines[..3]);
    assert_eq!(array_lines[3], "\t<array/>");
    assert_eq!(dict_lines[3], "\t<dict/>");
    assert_eq!(array_lines[4], "</plist>");
    assert_eq!(dict_lines[4], "</plist>");
}

// ============================================================================
// Stack discipline and pairing
// ============================================================================

#[test]
fn nested_arrays_stack_discipline() {
    let events: Vec<Value> = PlistDecoder::new("<array><array></array></array>".as_bytes())
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(
        events,
        vec![
            Value::ArrayStart,
            Value::ArrayStart,
            Value::ContainerEnd,
            Value::ContainerEnd
        ]
    );
}

#[test]
fn closing_more_than_opened_is_format_error() {
    let err = PlistDecoder::new("<array><array></array></array></array>".as_bytes())
        .collect::<Result<Vec<_>, _>>()
        .unwrap_err();
    assert!(matches!(err, PlistError::Format(_)), "{err:?}");
}

#[test]
fn dict_pairing() {
    let events: Vec<Value> =
        PlistDecoder::new("<dict><key>foo</key><string>bar</string></dict>".as_bytes())
            .collect::<Result<_, _>>()
            .unwrap();
    assert_eq!(
        events,
        vec![
            Value::DictStart,
            entry("foo", Value::String("bar".into())),
            Value::ContainerEnd
        ]
    );
}

#[test]
fn dict_first_child_must_be_key() {
    let err = PlistDecoder::new("<dict><string>bar</string></dict>".as_bytes())
        .collect::<Result<Vec<_>, _>>()
        .unwrap_err();
    assert!(matches!(err, PlistError::Format(_)), "{err:?}");
}

// ============================================================================
// Apple-style input
// ============================================================================

#[test]
fn decode_apple_style_document() {
    let plist: Plist = APPLE_STYLE.parse().unwrap();
    let dict = plist.as_dict().unwrap();
    assert_eq!(
        dict.keys().collect::<Vec<_>>(),
        [
            "CFBundleIdentifier",
            "LSRequiresIPhoneOS",
            "UIRequiredDeviceCapabilities",
            "Icon",
            "Created",
            "Ratio",
            "Hidden"
        ]
    );
    assert_eq!(
        dict.get("CFBundleIdentifier").and_then(Plist::as_str),
        Some("org.example.shire")
    );
    assert_eq!(dict.get("LSRequiresIPhoneOS").and_then(Plist::as_bool), Some(true));
    assert_eq!(dict.get("Hidden").and_then(Plist::as_bool), Some(false));
    assert_eq!(dict.get("Icon"), Some(&Plist::Data(b"hello".to_vec())));
    assert_eq!(
        dict.get("Created"),
        Some(&Plist::Date(Utc.with_ymd_and_hms(2015, 8, 1, 2, 3, 4).unwrap()))
    );
    assert_eq!(dict.get("Ratio"), Some(&Plist::Real(Real::Double(0.75))));
}

#[test]
fn reencode_apple_style_document_is_canonical() {
    let plist: Plist = APPLE_STYLE.parse().unwrap();
    let xml = plist.to_xml_string().unwrap();
    assert_document_invariants(&xml);
    assert!(xml.contains("\t\t<data>aGVsbG8=</data>\n"), "{xml}");
    assert!(xml.contains("\t\t<date>2015-08-01T02:03:04Z</date>\n"), "{xml}");
    assert!(xml.contains("\t\t<false/>\n"), "{xml}");
    assert!(!xml.contains("<!--"), "{xml}");
    let again: Plist = xml.parse().unwrap();
    assert_eq!(again, plist);
}

// ============================================================================
// Base64
// ============================================================================

#[test]
fn base64_hello() {
    let out = encode_array_plist(Vec::new(), |a| a.write_data(&[104, 101, 108, 108, 111])).unwrap();
    let xml = String::from_utf8(out).unwrap();
    assert!(xml.contains("<data>aGVsbG8=</data>"), "{xml}");

    let events: Vec<Value> = PlistDecoder::new(xml.as_bytes())
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(events[1], Value::Data(vec![104, 101, 108, 108, 111]));
}
