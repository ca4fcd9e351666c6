use portal_gate::codec::{MARKER, decode, encode, is_encoded};

#[test]
fn test_encode_prefixes_marker_and_hides_plaintext() {
    let encoded = encode("hello");
    assert_eq!(encoded, "sc_aGVsbG8=");
    assert!(is_encoded(&encoded));
    assert!(!encoded.contains("hello"));
}

#[test]
fn test_round_trip_printable_and_unicode() {
    let samples = [
        "",
        "validtoken123",
        "Jane O'Neil",
        "a/b+c?d=e&f",
        "??>>??",
        "committeeoftrustees",
        "नमस्ते ✓ 🚀",
        "  padded  ",
    ];
    for s in samples {
        assert_eq!(decode(&encode(s)), s, "round trip failed for {s:?}");
    }
}

#[test]
fn test_encoded_output_is_url_safe() {
    // "??>>??" produces '+' and '/' in standard base64.
    let encoded = encode("??>>??");
    assert!(!encoded.contains('+'));
    assert!(!encoded.contains('/'));
}

#[test]
fn test_legacy_plaintext_is_returned_verbatim() {
    for legacy in ["admin", "eyJhbGciOiJIUzI1NiJ9.payload.sig", "", "SC_uppercase"] {
        assert_eq!(decode(legacy), legacy);
    }
}

#[test]
fn test_malformed_payload_returns_original() {
    let bad_base64 = format!("{MARKER}!!not-base64!!");
    assert_eq!(decode(&bad_base64), bad_base64);

    // Valid base64 of the bytes [0xff, 0xfe], which are not UTF-8.
    let not_utf8 = format!("{MARKER}__4=");
    assert_eq!(decode(&not_utf8), not_utf8);
}
