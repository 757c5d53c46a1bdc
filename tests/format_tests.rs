//! Literal text compatibility: what the writer emits and what the reader
//! accepts from other producers.

use serde_jkr::{from_str, table, to_string, Table, Value};

fn single(value: impl Into<Value>) -> String {
    let table = Table::new();
    table.insert(1, value);
    to_string(&table).unwrap()
}

fn read_single(value_text: &str) -> Value {
    from_str(&format!("return {{[1]={},}}", value_text))
        .unwrap()
        .get(1)
        .unwrap()
}

#[test]
fn test_number_text() {
    let cases: &[(f64, &str)] = &[
        (0.0, "0"),
        (-0.0, "0"),
        (42.0, "42"),
        (-7.0, "-7"),
        (0.5, "0.5"),
        (0.1, "0.1"),
        (0.0001, "0.0001"),
        (0.00001, "1e-05"),
        (123_456.5, "123456.5"),
        (1_234_567.5, "1.2345675e+06"),
        (1e19, "1e+19"),
        (1e100, "1e+100"),
        (2.5e-300, "2.5e-300"),
        (f64::INFINITY, "1e999"),
        (f64::NEG_INFINITY, "-1e999"),
    ];
    for (n, text) in cases {
        assert_eq!(single(*n), format!("return {{[1]={},}}", text), "{}", n);
    }
}

#[test]
fn test_number_keys() {
    let table = table!({ 1.5: 1, -2: 2, 1e20: 3 });
    assert_eq!(
        to_string(&table).unwrap(),
        "return {[1.5]=1,[-2]=2,[1e+20]=3,}"
    );
}

#[test]
fn test_string_escapes() {
    let cases: &[(&[u8], &str)] = &[
        (b"plain text", r#""plain text""#),
        (b"quote\"back\\slash", r#""quote\"back\\slash""#),
        (b"'single'", r#""'single'""#),
        (b"tab\tnewline\ncr\r", r#""tab\tnewline\ncr\r""#),
        (b"\x07\x08\x0b\x0c", r#""\a\b\v\f""#),
        (b"\x00\x01\x1b\x7f", r#""\x00\x01\x1b\x7f""#),
        ("Café".as_bytes(), r#""Caf\xc3\xa9""#),
    ];
    for (bytes, text) in cases {
        assert_eq!(single(bytes.to_vec()), format!("return {{[1]={},}}", text));
    }
}

#[test]
fn test_reads_numbers() {
    assert_eq!(read_single("1e999"), Value::Number(f64::INFINITY));
    assert_eq!(read_single("-1e999"), Value::Number(f64::NEG_INFINITY));
    assert_eq!(read_single("1E5"), Value::Number(100_000.0));
    assert_eq!(read_single("2.5e+3"), Value::Number(2_500.0));
    assert_eq!(read_single("007"), Value::Number(7.0));
    assert_eq!(read_single("-0"), Value::Number(0.0));
}

#[test]
fn test_reads_lua_escapes() {
    assert_eq!(read_single(r#""\65\066\0671""#), Value::from("ABC1"));
    assert_eq!(read_single(r#""\x41\x62""#), Value::from("Ab"));
    assert_eq!(read_single(r#""\u{1F0CF}""#), Value::from("🃏"));
    assert_eq!(read_single(r#"'it\'s'"#), Value::from("it's"));
    assert_eq!(read_single("\"two\\\nlines\""), Value::from("two\nlines"));
    assert_eq!(read_single("\"skip\\z   \n   ws\""), Value::from("skipws"));
}

#[test]
fn test_reads_raw_non_utf8_bytes() {
    let mut literal = b"return {[1]=\"".to_vec();
    literal.extend_from_slice(&[0xff, 0xfe, b'x']);
    literal.extend_from_slice(b"\",}");
    let table = serde_jkr::from_literal(&literal).unwrap();
    assert_eq!(table.get(1), Some(Value::String(vec![0xff, 0xfe, b'x'])));
}

#[test]
fn test_reads_alternative_layouts() {
    let expected = table!({ "a": 1, "b": { 1: true } });
    let layouts = [
        r#"return {["a"]=1,["b"]={[1]=true,},}"#,
        r#"return {["a"]=1,["b"]={[1]=true}}"#,
        r#"return {['a']=1;['b']={[1]=true;};}"#,
        "return {\n\t[\"a\"] = 1,\n\t[\"b\"] = {\n\t\t[1] = true,\n\t},\n}\n",
        r#"{["a"]=1,["b"]={[1]=true,},}"#,
        "  return{[\"a\"]=1,[\"b\"]={[1]=true,},}  ",
    ];
    for layout in layouts {
        assert_eq!(from_str(layout).unwrap(), expected, "reading {:?}", layout);
    }
}

#[test]
fn test_reads_duplicate_keys_last_wins() {
    let table = from_str(r#"return {["a"]=1,["a"]=2,[1]=3,[1.0]=4,}"#).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.get("a"), Some(Value::Number(2.0)));
    assert_eq!(table.get(1), Some(Value::Number(4.0)));
}

#[test]
fn test_rejects_code() {
    let inputs = [
        "return {[1]=nil,}",
        "return {[1]=os.exit(),}",
        "return {[1]=1+1,}",
        "return {[1]=x,}",
        "return {a=1,}",
        "return {1,2,3}",
        "return {} -- trailing comment",
        "return {[1]=\"unterminated}",
        "return {[1]=\"bad\\q\",}",
        "return {[1]=\"line\nbreak\",}",
        "print('hi')",
    ];
    for input in inputs {
        let err = from_str(input).unwrap_err();
        assert!(err.is_malformed_literal(), "{:?} gave {}", input, err);
    }
}

#[test]
fn test_error_message_points_at_problem() {
    let err = from_str("return {[\"deck\"]={[1]=\"Ace\",[2]=King,},}").unwrap_err();
    let text = err.to_string();
    assert!(text.contains("line 1, column 33"), "{}", text);
    assert!(text.contains("unexpected name 'King'"), "{}", text);
    let caret = format!("{}^", " ".repeat(32));
    assert!(text.ends_with(&format!("[2]=King,}},}}\n{}", caret)), "{}", text);
}
