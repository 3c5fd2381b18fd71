use bitscope::{
    BitCursor, BitSource, Decoder, Definition, Error, FieldList, Param, Registry, Schema, TypeRef,
    Value,
};

fn point() -> FieldList {
    FieldList::new().field("x", "int32be").field("y", "int32be")
}

fn record(fields: &[(&str, Value)]) -> Value {
    Value::Record(fields.iter().cloned().collect())
}

#[test]
fn test_point() {
    let schema = Schema::compile(&Definition::new().record("Point", point())).unwrap();

    let mut cursor = BitCursor::from_bytes([0x00, 0x00, 0x00, 0x2A, 0x00, 0x00, 0x00, 0xFF]);
    let value = schema.parse_from(&mut cursor, "Point").unwrap();

    assert_eq!(value, record(&[("x", Value::Int(42)), ("y", Value::Int(255))]));
    assert!(cursor.is_end_reached());
}

#[test]
fn test_header_bounds_body() {
    let definition = Definition::new().record("Point", point()).record(
        "Header",
        FieldList::new().field("length", "uint8").field(
            "body",
            TypeRef::call(
                "Point",
                [Param::derived(|ctx| Ok((ctx.int("length")? * 8).into()))],
            ),
        ),
    );
    let schema = Schema::compile(&definition).unwrap();

    let mut cursor = BitCursor::new();
    cursor.append([0x08]);
    cursor.append([0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x02]);
    cursor.append([0xDE, 0xAD]);

    let value = schema.parse_from(&mut cursor, "Header").unwrap();
    assert_eq!(value.get("length"), Some(&Value::Int(8)));
    assert_eq!(
        value.get("body"),
        Some(&record(&[("x", Value::Int(1)), ("y", Value::Int(2))]))
    );
    assert_eq!(cursor.read_bits(16).unwrap(), 0xDEAD);
}

#[test]
fn test_budget_larger_than_body_is_skipped() {
    let definition = Definition::new()
        .record("Small", FieldList::new().field("a", "uint8"))
        .record(
            "Outer",
            FieldList::new()
                .field("inner", TypeRef::call("Small", [Param::from(32u64)]))
                .field("after", "uint8"),
        );
    let schema = Schema::compile(&definition).unwrap();

    let value = schema.parse_bytes(&[0x01, 0xFF, 0xFF, 0xFF, 0x07], "Outer").unwrap();
    assert_eq!(value.get("inner").and_then(|v| v.get("a")), Some(&Value::Int(1)));
    assert_eq!(value.get("after"), Some(&Value::Int(7)));
}

#[test]
fn test_body_overrunning_budget_fails() {
    let definition = Definition::new().record("Point", point()).record(
        "Header",
        FieldList::new().field("body", TypeRef::call("Point", [Param::from(40u64)])),
    );
    let schema = Schema::compile(&definition).unwrap();

    let error = schema.parse_bytes(&[0; 16], "Header").unwrap_err();
    assert!(error.is_stream_exhausted());
    assert_eq!(error.path(), vec!["body", "y"]);
}

fn message_schema() -> Schema {
    let definition = Definition::new().record(
        "Msg",
        FieldList::new().field("tag", "uint8").field(
            "payload",
            TypeRef::dynamic(|ctx| {
                let name = if ctx.int("tag")? == 1 { "int32be" } else { "uint8" };
                Ok(name.into())
            }),
        ),
    );
    Schema::compile(&definition).unwrap()
}

#[test]
fn test_tag_driven_union() {
    let schema = message_schema();

    let wide = schema.parse_bytes(&[0x01, 0x00, 0x00, 0x01, 0x00], "Msg").unwrap();
    assert_eq!(wide.get("payload"), Some(&Value::Int(256)));

    let narrow = schema.parse_bytes(&[0x00, 0x63], "Msg").unwrap();
    assert_eq!(narrow.get("payload"), Some(&Value::Int(0x63)));
}

#[test]
fn test_exhaustion_and_exact_reads() {
    let mut cursor = BitCursor::from_bytes([0x01, 0x02, 0x03]);
    assert!(matches!(
        cursor.read_bytes(4),
        Err(bitscope::ReadError::StreamExhausted { requested: 32, available: 24 })
    ));
    assert_eq!(cursor.read_bits(4).unwrap(), 0x0);
    assert!(cursor.read_bits(24).is_err());
    assert_eq!(cursor.read_bits(20).unwrap(), 0x10203);
    assert!(cursor.is_end_reached());

    let schema = message_schema();
    let error = schema.parse_bytes(&[0x01, 0x00], "Msg").unwrap_err();
    assert!(error.is_stream_exhausted());
    assert_eq!(error.path(), vec!["payload"]);
}

#[test]
fn test_arrays_of_zero_and_unbounded_length() {
    let definition = Definition::new().record(
        "List",
        FieldList::new()
            .field("count", "uint8")
            .field(
                "fixed",
                TypeRef::call(
                    "array",
                    [
                        Param::from("uint16"),
                        Param::derived(|ctx| Ok(ctx.int("count")?.into())),
                    ],
                ),
            )
            .field("rest", TypeRef::call("array", [Param::from("uint8")])),
    );
    let schema = Schema::compile(&definition).unwrap();

    let mut cursor = BitCursor::from_bytes([0x00, 0x0A, 0x0B, 0x0C]);
    let value = schema.parse_from(&mut cursor, "List").unwrap();
    assert_eq!(value.get("fixed"), Some(&Value::Array(vec![])));
    assert_eq!(
        value.get("rest"),
        Some(&Value::Array(vec![Value::Int(10), Value::Int(11), Value::Int(12)]))
    );
    assert!(cursor.is_end_reached());
}

#[test]
fn test_unbounded_array_stops_at_scope_end() {
    let definition = Definition::new()
        .record(
            "Block",
            FieldList::new().field("items", TypeRef::call("array", [Param::from("uint8")])),
        )
        .record(
            "Frame",
            FieldList::new()
                .field("block", TypeRef::call("Block", [Param::from(16u64)]))
                .field("trailer", "uint8"),
        );
    let schema = Schema::compile(&definition).unwrap();

    let value = schema.parse_bytes(&[1, 2, 3], "Frame").unwrap();
    assert_eq!(
        value.get("block").and_then(|b| b.get("items")),
        Some(&Value::Array(vec![Value::Int(1), Value::Int(2)]))
    );
    assert_eq!(value.get("trailer"), Some(&Value::Int(3)));
}

#[test]
fn test_null_terminated_string() {
    let definition = Definition::new().record(
        "Entry",
        FieldList::new().field("name", "utf8CString").field("id", "uint8"),
    );
    let schema = Schema::compile(&definition).unwrap();

    let value = schema.parse_bytes(b"caf\xC3\xA9\0\x05", "Entry").unwrap();
    assert_eq!(value.get("name"), Some(&Value::from("café")));
    assert_eq!(value.get("id"), Some(&Value::Int(5)));

    let error = schema.parse_bytes(b"abc", "Entry").unwrap_err();
    assert!(error.is_stream_exhausted());
}

#[test]
fn test_recursive_type() {
    // Node: value, has_next, then another Node if has_next is set
    let definition = Definition::new().record(
        "Node",
        FieldList::new()
            .field("value", "uint8")
            .field("has_next", 8u64)
            .field(
                "next",
                TypeRef::dynamic(|ctx| {
                    Ok(if ctx.int("has_next")? != 0 {
                        TypeRef::from("Node").into()
                    } else {
                        TypeRef::call("fixed", [Param::null()]).into()
                    })
                }),
            ),
    );
    let schema = Schema::compile(&definition).unwrap();

    let value = schema.parse_bytes(&[1, 1, 2, 1, 3, 0], "Node").unwrap();
    let mut values = Vec::new();
    let mut node = &value;
    while let Some(Value::Int(n)) = node.get("value") {
        values.push(*n);
        match node.get("next") {
            Some(next @ Value::Record(_)) => node = next,
            _ => break,
        }
    }
    assert_eq!(values, vec![1, 2, 3]);
}

fn linked_list() -> Schema {
    let definition = Definition::new().record(
        "Node",
        FieldList::new().field("has_next", "uint8").field(
            "next",
            TypeRef::dynamic(|ctx| {
                Ok(if ctx.int("has_next")? != 0 {
                    TypeRef::from("Node").into()
                } else {
                    TypeRef::call("fixed", [Param::null()]).into()
                })
            }),
        ),
    );
    Schema::compile(&definition).unwrap()
}

fn list_length(mut node: &Value) -> usize {
    let mut length = 1;
    while let Some(next @ Value::Record(_)) = node.get("next") {
        length += 1;
        node = next;
    }
    length
}

#[test]
fn test_deep_recursion_is_an_error() {
    let schema = linked_list();

    let mut data = vec![1u8; 40];
    data.push(0);
    let value = schema.parse_bytes(&data, "Node").unwrap();
    assert_eq!(list_length(&value), 41);

    let mut data = vec![1u8; 5000];
    data.push(0);
    let error = schema.parse_bytes(&data, "Node").unwrap_err();
    assert_eq!(error.cause(), &Error::DepthExceeded(schema.max_depth()));
    assert!(error.path().iter().all(|field| *field == "next"));

    let error = schema.with_max_depth(16).parse_bytes(&data, "Node").unwrap_err();
    assert_eq!(error.cause(), &Error::DepthExceeded(16));
}

#[test]
fn test_mutually_recursive_types_in_either_order() {
    // A holds a B; B holds another A while `more` is set
    let a = FieldList::new().field("n", "uint8").field("b", "B");
    let b = FieldList::new().field("more", "uint8").field(
        "a",
        TypeRef::dynamic(|ctx| {
            Ok(if ctx.int("more")? != 0 {
                TypeRef::from("A").into()
            } else {
                TypeRef::call("fixed", [Param::null()]).into()
            })
        }),
    );

    let forward = Definition::new().record("A", a.clone()).record("B", b.clone());
    let backward = Definition::new().record("B", b).record("A", a);

    for definition in [forward, backward] {
        let schema = Schema::compile(&definition).unwrap();
        let value = schema.parse_bytes(&[1, 1, 2, 1, 3, 0], "A").unwrap();

        let mut ns = Vec::new();
        let mut node = &value;
        loop {
            let Some(Value::Int(n)) = node.get("n") else { break };
            ns.push(*n);
            match node.get("b").and_then(|b| b.get("a")) {
                Some(next @ Value::Record(_)) => node = next,
                other => {
                    assert_eq!(other, Some(&Value::Null));
                    break;
                }
            }
        }
        assert_eq!(ns, vec![1, 2, 3]);

        let error = schema.parse_bytes(&[1, 1, 2], "A").unwrap_err();
        assert!(error.is_stream_exhausted());
        assert_eq!(error.path(), vec!["b", "a", "b", "more"]);
    }
}

#[test]
fn test_parent_lookup_from_nested_record() {
    let definition = Definition::new()
        .record(
            "Item",
            FieldList::new().field(
                "data",
                TypeRef::call(
                    "buffer",
                    [Param::derived(|ctx| {
                        let width = ctx.lookup("width").cloned().ok_or_else(|| {
                            Error::UnknownField("width".to_string())
                        })?;
                        Ok(width.into())
                    })],
                ),
            ),
        )
        .record(
            "Table",
            FieldList::new()
                .field("width", "uint8")
                .field("rows", TypeRef::call("array", [Param::from("Item"), Param::from(2u64)])),
        );
    let schema = Schema::compile(&definition).unwrap();

    let value = schema.parse_bytes(&[2, 0xA, 0xB, 0xC, 0xD], "Table").unwrap();
    let rows = value.get("rows").and_then(Value::as_array).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(
        rows[1].get("data").and_then(Value::as_bytes).map(|b| b.to_vec()),
        Some(vec![0xC, 0xD])
    );
    // the parent link is not part of the output
    assert_eq!(rows[0].as_record().map(|r| r.len()), Some(1));
}

#[test]
fn test_unknown_field_in_expression() {
    let definition = Definition::new().record(
        "T",
        FieldList::new().field(
            "data",
            TypeRef::call("buffer", [Param::derived(|ctx| Ok(ctx.int("len")?.into()))]),
        ),
    );
    let schema = Schema::compile(&definition).unwrap();

    let error = schema.parse_bytes(&[0], "T").unwrap_err();
    assert_eq!(error.cause(), &Error::UnknownField("len".to_string()));
}

#[test]
fn test_custom_decoder_override() {
    let registry = Registry::default().with(
        "uint8",
        Decoder::new(|frame, _| {
            let raw = frame.cursor().read_bits(8)?;
            Ok(Value::Int(raw as i64 * 10))
        }),
    );
    let definition = Definition::new().record("T", FieldList::new().field("a", "uint8"));
    let schema = Schema::compile_with(&definition, registry).unwrap();

    let value = schema.parse_bytes(&[4], "T").unwrap();
    assert_eq!(value.get("a"), Some(&Value::Int(40)));
}

#[test]
fn test_inline_record_and_shorthand() {
    let definition = Definition::new().record(
        "Flags",
        FieldList::new()
            .field("version", 3u64)
            .field("kind", TypeRef::call(5u64, [Param::from("be"), Param::from(true)]))
            .field(
                "extra",
                FieldList::new().field("a", 4u64).field("b", 4u64),
            ),
    );
    let schema = Schema::compile(&definition).unwrap();

    let value = schema.parse_bytes(&[0b101_11111, 0x3C], "Flags").unwrap();
    assert_eq!(value.get("version"), Some(&Value::Int(5)));
    assert_eq!(value.get("kind"), Some(&Value::Int(-1)));
    assert_eq!(value.get("extra").and_then(|e| e.get("b")), Some(&Value::Int(0xC)));
}

#[test]
fn test_bad_length_parameter() {
    let definition = Definition::new().record(
        "T",
        FieldList::new().field("data", TypeRef::call("buffer", [Param::from(-3i64)])),
    );
    let schema = Schema::compile(&definition).unwrap();

    let error = schema.parse_bytes(&[0; 4], "T").unwrap_err();
    assert!(matches!(error.cause(), Error::BadParameter { name: "length", .. }));
}
