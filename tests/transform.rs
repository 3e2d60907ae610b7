#[cfg(test)]
mod tests {
    use keel::{Cipher, ColumnType, TransformOptions, Value, ValueTransformer};
    use serde_json::json;
    use uuid::Uuid;

    fn transformer(disable_salts: bool) -> ValueTransformer {
        ValueTransformer::new(TransformOptions {
            secret: "correct horse battery staple".into(),
            disable_salts,
        })
    }

    #[test]
    fn boolean_encoding() {
        let t = transformer(false);
        for (input, expected) in [
            (Value::Boolean(true), true),
            (Value::Boolean(false), false),
            (Value::Int64(1), true),
            (Value::Int64(0), false),
            (Value::Int64(-3), true),
            (Value::Float64(2.0), true),
            (Value::Null, false),
        ] {
            assert_eq!(
                t.encode(&input, ColumnType::Boolean).expect("Boolean"),
                Value::Boolean(expected),
                "Encoding {:?}",
                input
            );
        }
        for input in [
            Value::Varchar("true".into()),
            Value::Float64(0.5),
            Value::Json(json!({})),
        ] {
            let error = t
                .encode(&input, ColumnType::LegacyBoolean)
                .expect_err("Not a boolean");
            assert!(error.to_string().contains("is not a boolean"));
        }
    }

    #[test]
    fn boolean_decoding() {
        let t = transformer(false);
        for (input, expected) in [
            (Value::Boolean(true), true),
            (Value::Int64(0), false),
            (Value::Int64(7), true),
            (Value::Varchar("".into()), false),
            (Value::Varchar("false".into()), false),
            (Value::Varchar("yes".into()), true),
            (Value::Null, false),
        ] {
            assert_eq!(
                t.decode(input, ColumnType::LegacyBoolean),
                Value::Boolean(expected)
            );
        }
    }

    #[test]
    fn numbers() {
        let t = transformer(false);
        assert_eq!(
            t.encode(&Value::Float64(3.9), ColumnType::Number).expect("Number"),
            Value::Int64(3)
        );
        assert_eq!(
            t.encode(&Value::Float64(-3.9), ColumnType::LegacyInt).expect("Number"),
            Value::Int64(-3)
        );
        assert_eq!(
            t.encode(&Value::Varchar(" 42abc".into()), ColumnType::Number)
                .expect("Number"),
            Value::Int64(42)
        );
        assert_eq!(
            t.encode(&Value::Float64(f64::NAN), ColumnType::Number).expect("Number"),
            Value::Null
        );
        assert_eq!(
            t.encode(&Value::Varchar("abc".into()), ColumnType::Number)
                .expect("Number"),
            Value::Null
        );
        assert_eq!(
            t.decode(Value::Varchar("2.5".into()), ColumnType::Number),
            Value::Float64(2.5)
        );
        assert_eq!(
            t.decode(Value::Varchar("nope".into()), ColumnType::Number),
            Value::Null
        );
        assert!(t.encode(&Value::Int64(1), ColumnType::Counter).is_err());
        assert!(t.encode(&Value::Blob(vec![1u8].into()), ColumnType::Blob).is_err());
    }

    #[test]
    fn timestamps() {
        let t = transformer(false);
        assert_eq!(
            t.encode(&Value::Int64(1_700_000_000_000), ColumnType::Timestamp)
                .expect("Timestamp"),
            Value::Int64(1_700_000_000_000)
        );
        assert_eq!(
            t.decode(
                Value::Varchar("2023-11-14T22:13:20Z".into()),
                ColumnType::Timestamp
            ),
            Value::Int64(1_700_000_000_000)
        );
        assert_eq!(
            t.decode(Value::Varchar("1700000000000".into()), ColumnType::Timestamp),
            Value::Int64(1_700_000_000_000)
        );
    }

    #[test]
    fn strings_json_and_uuids() {
        let t = transformer(false);
        assert_eq!(
            t.encode(&Value::Null, ColumnType::String).expect("String"),
            Value::Varchar("".into())
        );
        assert_eq!(
            t.encode(&Value::Int64(5), ColumnType::String).expect("String"),
            Value::Varchar("5".into())
        );
        assert_eq!(
            t.encode(&Value::Null, ColumnType::Json).expect("Json"),
            Value::Varchar("".into())
        );
        assert_eq!(
            t.encode(&Value::Json(json!([1, "a"])), ColumnType::Json)
                .expect("Json"),
            Value::Varchar(r#"[1,"a"]"#.into())
        );
        assert_eq!(
            t.decode(Value::Varchar(r#"{"a":null}"#.into()), ColumnType::Json),
            Value::Json(json!({ "a": null }))
        );
        assert_eq!(
            t.decode(Value::Varchar("{broken".into()), ColumnType::Json),
            Value::Null
        );

        let id = Uuid::new_v4();
        assert_eq!(
            t.encode(&Value::Uuid(id), ColumnType::Uuid).expect("Uuid"),
            Value::Uuid(id)
        );
        assert_eq!(
            t.decode(Value::Varchar(id.to_string()), ColumnType::TimeUuid),
            Value::Uuid(id)
        );
        assert_eq!(
            t.decode(Value::Varchar("".into()), ColumnType::Uuid),
            Value::Null
        );
    }

    #[test]
    fn encrypted_round_trip() {
        let t = transformer(false);
        let stored = t
            .encode(&Value::Varchar("top secret".into()), ColumnType::EncodedString)
            .expect("Encrypt");
        let Value::Varchar(text) = &stored else {
            panic!("Encrypted values are stored as text");
        };
        assert!(!text.contains("top secret"));
        assert_eq!(
            t.decode(stored.clone(), ColumnType::EncodedString),
            Value::Varchar("top secret".into())
        );

        // Salted encryption differs at every call
        let again = t
            .encode(&Value::Varchar("top secret".into()), ColumnType::EncodedString)
            .expect("Encrypt");
        assert_ne!(stored, again);

        let document = json!({ "roles": ["admin"], "level": 3 });
        let stored = t
            .encode(&Value::Json(document.clone()), ColumnType::EncodedJson)
            .expect("Encrypt");
        assert_eq!(
            t.decode(stored, ColumnType::EncodedJson),
            Value::Json(document)
        );
        assert_eq!(
            t.encode(&Value::Null, ColumnType::EncodedString).expect("Null"),
            Value::Null
        );
    }

    #[test]
    fn deterministic_encryption() {
        let t = transformer(true);
        let first = t
            .encode(&Value::Varchar("same".into()), ColumnType::EncodedString)
            .expect("Encrypt");
        let second = t
            .encode(&Value::Varchar("same".into()), ColumnType::EncodedString)
            .expect("Encrypt");
        assert_eq!(first, second);
        assert_eq!(
            transformer(false).decode(first, ColumnType::EncodedString),
            Value::Varchar("same".into())
        );
    }

    #[test]
    fn undecryptable_values_are_kept() {
        let t = transformer(false);
        let stored = t
            .encode(&Value::Varchar("hidden".into()), ColumnType::EncodedString)
            .expect("Encrypt");
        let other = ValueTransformer::new(TransformOptions {
            secret: "another secret".into(),
            disable_salts: false,
        });
        assert_eq!(other.decode(stored.clone(), ColumnType::EncodedString), stored);
        assert_eq!(
            t.decode(Value::Varchar("plain text".into()), ColumnType::EncodedString),
            Value::Varchar("plain text".into())
        );
        assert_eq!(
            t.decode(Value::Varchar("  ".into()), ColumnType::EncodedJson),
            Value::Varchar("  ".into())
        );
    }

    #[test]
    fn cipher() {
        let cipher = Cipher::new("key", false);
        let stored = cipher.encrypt("it's").expect("Encrypt");
        assert_eq!(cipher.decrypt(&stored).expect("Decrypt"), "it's");
        assert!(Cipher::new("other", false).decrypt(&stored).is_err());
        assert!(cipher.decrypt("not base64 at all!").is_err());
        assert!(format!("{:?}", cipher).contains("<redacted>"));
    }
}
