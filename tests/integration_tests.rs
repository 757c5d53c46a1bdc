use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use serde_jkr::{
    from_reader, from_slice, from_slice_with_options, table, to_bytes, to_writer, DecodeOptions,
    Function, Table, Value,
};
use std::io::{self, Cursor, Read, Write};

fn inflate(bytes: &[u8]) -> String {
    let mut text = String::new();
    DeflateDecoder::new(bytes)
        .read_to_string(&mut text)
        .unwrap();
    text
}

fn deflate(text: &str, level: Compression) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), level);
    encoder.write_all(text.as_bytes()).unwrap();
    encoder.finish().unwrap()
}

fn assert_encodes_to_one_of(table: &Table, expected: &[&str]) {
    let text = inflate(&to_bytes(table).unwrap());
    assert!(
        expected.contains(&text.as_str()),
        "unexpected literal {:?}, wanted one of {:?}",
        text,
        expected
    );
}

#[test]
fn test_encode_empty_table() {
    assert_encodes_to_one_of(&Table::new(), &["return {}"]);
}

#[test]
fn test_encode_string_value() {
    assert_encodes_to_one_of(&table!({ "foo": "bar" }), &[r#"return {["foo"]="bar",}"#]);
}

#[test]
fn test_encode_number_key_and_value() {
    assert_encodes_to_one_of(&table!({ 1: 42 }), &["return {[1]=42,}"]);
}

#[test]
fn test_encode_boolean_values() {
    let table = Table::new();
    table.insert("foo", true);
    table.insert("bar", false);
    assert_encodes_to_one_of(
        &table,
        &[
            r#"return {["foo"]=true,["bar"]=false,}"#,
            r#"return {["bar"]=false,["foo"]=true,}"#,
        ],
    );
}

#[test]
fn test_encode_nested_table() {
    let table = table!({ "nested": { "a": 1, "b": 2 } });
    assert_encodes_to_one_of(
        &table,
        &[
            r#"return {["nested"]={["a"]=1,["b"]=2,},}"#,
            r#"return {["nested"]={["b"]=2,["a"]=1,},}"#,
        ],
    );
}

#[test]
fn test_encode_circular_reference() {
    let table = Table::new();
    table.insert("foo", "bar");
    table.insert("self", table.clone());

    let err = to_bytes(&table).unwrap_err();
    assert!(err.is_cyclic_reference());
    assert!(err.to_string().contains(r#"["self"]"#));

    table.remove("self");
}

#[test]
fn test_encode_transitive_cycle_reports_path() {
    let a = Table::new();
    let b = Table::new();
    let c = Table::new();
    a.insert("b", b.clone());
    b.insert("c", c.clone());
    c.insert("a", a.clone());

    let err = to_bytes(&a).unwrap_err();
    assert!(err.is_cyclic_reference());
    assert!(err.to_string().contains(r#"["b"]["c"]["a"]"#));

    c.remove("a");
}

#[test]
fn test_encode_invalid_key_type() {
    let table = Table::new();
    table.insert(true, "invalid");
    assert!(to_bytes(&table).unwrap_err().is_invalid_key_type());

    let table = Table::new();
    table.insert(Table::new(), 1);
    assert!(to_bytes(&table).unwrap_err().is_invalid_key_type());

    let table = Table::new();
    table.insert(f64::NAN, 1);
    assert!(to_bytes(&table).unwrap_err().is_invalid_key_type());
}

#[test]
fn test_encode_object_placeholder() {
    let object = Table::new();
    object.insert("is", Function::new("Object:is"));
    object.insert("ability", table!({ "extra": 5 }));
    let table = Table::new();
    table.insert("foo", object);

    let bytes = to_bytes(&table).unwrap();
    assert_eq!(inflate(&bytes), r#"return {["foo"]="MANUAL_REPLACE",}"#);
    assert_eq!(
        from_slice(&bytes).unwrap().get("foo"),
        Some(Value::from("MANUAL_REPLACE"))
    );
}

#[test]
fn test_encode_unsupported_value_type() {
    let table = Table::new();
    table.insert("foo", Function::new("callback"));
    let err = to_bytes(&table).unwrap_err();
    assert!(err.is_unsupported_value_type());
    assert!(err.to_string().contains("function"));

    let table = Table::new();
    table.insert("gone", Value::Nil);
    assert!(to_bytes(&table).unwrap_err().is_unsupported_value_type());
}

#[test]
fn test_decode_reader_cases() {
    let cases = [
        ("return {}", Table::new()),
        (r#"return {['foo']="bar",}"#, table!({ "foo": "bar" })),
        ("return {[1]=42,}", table!({ 1: 42 })),
        ("return {['flag']=true,}", table!({ "flag": true })),
        (
            "return {['nested']={['a']=1,['b']=2,},}",
            table!({ "nested": { "a": 1, "b": 2 } }),
        ),
    ];

    for (input, expected) in cases {
        let table = from_slice(&deflate(input, Compression::fast())).unwrap();
        assert_eq!(table, expected, "decoding {:?}", input);
    }
}

#[test]
fn test_decode_any_compression_level() {
    let text = r#"return {["deck"]={[1]="Ace",[2]="King",},["money"]=4,}"#;
    let expected = table!({ "deck": { 1: "Ace", 2: "King" }, "money": 4 });
    for level in [
        Compression::none(),
        Compression::fast(),
        Compression::default(),
        Compression::best(),
    ] {
        assert_eq!(from_slice(&deflate(text, level)).unwrap(), expected);
    }
}

#[test]
fn test_decode_invalid_lua() {
    let err = from_slice(&deflate("not a valid lua", Compression::fast())).unwrap_err();
    assert!(err.is_malformed_literal());
    assert_eq!(err.offset(), Some(0));
}

#[test]
fn test_decode_not_a_table() {
    for input in [r#"return "foo""#, "return 1", "return true"] {
        let err = from_slice(&deflate(input, Compression::fast())).unwrap_err();
        assert!(err.is_not_a_table(), "decoding {:?}", input);
    }
}

#[test]
fn test_decode_corrupt_stream() {
    let err = from_slice(&[0xff, 0xff, 0xff, 0xff]).unwrap_err();
    assert!(err.is_framing());
}

#[test]
fn test_decode_truncated_stream() {
    let table = table!({
        "nested": { "a": 1, "b": 2 },
        "deck": { 1: "Ace", 2: "King", 3: "Queen" },
        "seed": "7LB2WVPK",
    });
    let bytes = to_bytes(&table).unwrap();
    assert_eq!(from_slice(&bytes).unwrap(), table);

    for len in 1..bytes.len() {
        let err = from_slice(&bytes[..len]).unwrap_err();
        assert!(err.is_framing(), "prefix of {} bytes gave {}", len, err);
    }
}

struct FailingWriter;

impl Write for FailingWriter {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::Other, "disk full"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Other, "disk full"))
    }
}

#[test]
fn test_encode_write_failure() {
    let err = to_writer(FailingWriter, &table!({ "foo": "bar" })).unwrap_err();
    assert!(err.is_framing());
    assert!(err.to_string().contains("disk full"));
}

#[test]
fn test_decode_size_limit() {
    let long = "x".repeat(10_000);
    let bytes = to_bytes(&table!({ "long": long })).unwrap();

    let bounded = DecodeOptions::new().with_max_decompressed_size(1_000);
    assert!(from_slice_with_options(&bytes, &bounded)
        .unwrap_err()
        .is_framing());

    let roomy = DecodeOptions::new().with_max_decompressed_size(20_000);
    assert_eq!(
        from_slice_with_options(&bytes, &roomy)
            .unwrap()
            .get("long")
            .and_then(|v| v.as_str().map(str::len)),
        Some(10_000)
    );
}

#[test]
fn test_stream_round_trip() {
    let table = table!({
        "STATE": 5,
        "GAME": {
            "round_resets": { "ante": 2, "blind_ante": 2 },
            "dollars": (-3),
            "interest_cap": 25,
            "probabilities": { "normal": 1 },
            "pseudorandom": { "seed": "7LB2WVPK", "hashed_seed": 0.39014827468 },
        },
        "cardAreas": {
            "jokers": {
                "cards": {
                    1: { "label": "Blueprint", "sell_cost": 5, "debuff": false },
                    2: { "label": "Brainstorm", "sell_cost": 5, "debuff": false },
                },
            },
        },
        "VERSION": "1.0.1o-FULL",
    });

    let mut buffer = Vec::new();
    to_writer(&mut buffer, &table).unwrap();
    let back = from_reader(Cursor::new(&buffer)).unwrap();
    assert_eq!(back, table);

    // Re-encoding the decoded table reproduces the same bytes.
    assert_eq!(to_bytes(&back).unwrap(), buffer);
}

#[test]
fn test_round_trip_binary_strings() {
    let table = Table::new();
    table.insert("raw", (0u8..=255).collect::<Vec<u8>>());
    table.insert("utf8", "Jöker ♠ 🃏");
    table.insert(b"\xff\x00key".to_vec(), "binary key");

    let bytes = to_bytes(&table).unwrap();
    assert!(inflate(&bytes).is_ascii());
    assert_eq!(from_slice(&bytes).unwrap(), table);
}

#[test]
fn test_round_trip_numbers() {
    let table = Table::new();
    let numbers = [
        0.0,
        -1.0,
        0.1,
        1.0 / 3.0,
        1e-7,
        123_456_789.125,
        -9.5e20,
        f64::MAX,
        f64::MIN_POSITIVE,
        f64::INFINITY,
        f64::NEG_INFINITY,
    ];
    for (i, n) in numbers.iter().enumerate() {
        table.insert(i + 1, *n);
        table.insert(*n, "key");
    }

    let back = from_slice(&to_bytes(&table).unwrap()).unwrap();
    for (i, n) in numbers.iter().enumerate() {
        assert_eq!(back.get(i + 1), Some(Value::Number(*n)));
        assert!(back.contains_key(*n));
    }
}

#[test]
fn test_shared_table_is_not_a_cycle() {
    let shared = table!({ "x": 1 });
    let table = Table::new();
    table.insert("left", shared.clone());
    table.insert("right", shared);

    let back = from_slice(&to_bytes(&table).unwrap()).unwrap();
    let left = back.get("left").unwrap();
    let right = back.get("right").unwrap();
    assert_eq!(left, right);
    assert!(!left.as_table().unwrap().ptr_eq(right.as_table().unwrap()));
}
