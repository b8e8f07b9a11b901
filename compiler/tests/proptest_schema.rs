use proptest::prelude::*;
use pierogi_compiler::{
    parser::SchemaParser,
    types::{Schema, TypeBase, BASE_TYPES},
    PierogiError,
};

fn evaluate(text: &str) -> Result<Schema, PierogiError> {
    SchemaParser::from_textual_schema(text, "Prop").evaluate()
}

/// Strategy for generating definition names that cannot collide with keywords or base types.
fn definition_name() -> impl Strategy<Value = String> {
    "[A-Z][a-zA-Z0-9]{0,10}"
}

/// Strategy for generating field names that are not grammar keywords.
fn field_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,10}".prop_filter("not a keyword", |s| {
        !matches!(s.as_str(), "enum" | "struct" | "message" | "map" | "array" | "readonly")
    })
}

fn base_type() -> impl Strategy<Value = &'static str> {
    prop::sample::select(BASE_TYPES.iter().map(|(name, _)| *name).collect::<Vec<_>>())
}

proptest! {
    /// Parsing the same text with two fresh parsers yields identical schemas.
    #[test]
    fn parsing_is_deterministic(
        name in definition_name(),
        fields in prop::collection::vec((field_name(), base_type()), 0..6),
    ) {
        let body: String = fields
            .iter()
            .enumerate()
            .map(|(i, (f, t))| format!("{} -> {}[] {};\n", i + 1, t, f))
            .collect();
        let source = format!("[opcode({})] message {} {{\n{}}}", fields.len(), name, body);
        let first = evaluate(&source);
        let second = evaluate(&source);
        prop_assert!(first.is_ok(), "Failed to parse: {}", source);
        prop_assert_eq!(first.unwrap(), second.unwrap());
    }

    /// `T[]` and `array[T]` describe the same type.
    #[test]
    fn postfix_and_prefix_arrays_agree(t in base_type(), depth in 1usize..4) {
        let postfix = format!("{}{}", t, "[]".repeat(depth));
        let prefix = (0..depth).fold(t.to_string(), |inner, _| format!("array[{}]", inner));
        let a = evaluate(&format!("struct A {{ {} x; }}", postfix)).unwrap();
        let b = evaluate(&format!("struct A {{ {} x; }}", prefix)).unwrap();
        let ta = &a.definition("A").unwrap().fields[0].type_;
        let tb = &b.definition("A").unwrap().fields[0].type_;
        prop_assert!(ta.same_shape(tb));
        prop_assert_eq!(ta.display(), tb.display());

        let mut layers = 0;
        let mut current = ta;
        while let TypeBase::Array { element, .. } = current {
            layers += 1;
            current = element.as_ref();
        }
        prop_assert_eq!(layers, depth);
    }

    /// Every defined type in a successfully parsed schema names a definition.
    #[test]
    fn defined_types_always_resolve(names in prop::collection::hash_set(definition_name(), 1..6)) {
        let names: Vec<String> = names.into_iter().collect();
        // Each struct references the next one, the last references the first.
        let source: String = names
            .iter()
            .enumerate()
            .map(|(i, n)| format!("struct {} {{ {} next; }}\n", n, names[(i + 1) % names.len()]))
            .collect();
        let schema = evaluate(&source).unwrap();
        for def in schema.definitions.values() {
            for field in &def.fields {
                for referenced in field.type_.defined_names() {
                    prop_assert!(schema.definitions.contains_key(referenced));
                }
            }
        }
    }

    /// Dropping a referenced definition turns the reference into an error.
    #[test]
    fn removing_a_target_is_unrecognized(a in definition_name(), b in definition_name()) {
        prop_assume!(a != b);
        let with_b = format!("struct {} {{ {} b; }} struct {} {{ }}", a, b, b);
        prop_assert!(evaluate(&with_b).is_ok());
        match evaluate(&format!("struct {} {{ {} b; }}", a, b)) {
            Err(PierogiError::UnrecognizedType { name, used_in, .. }) => {
                prop_assert_eq!(name, b);
                prop_assert_eq!(used_in, a);
            }
            other => prop_assert!(false, "expected UnrecognizedType, got {:?}", other),
        }
    }

    /// A repeated name fails wherever the repeat sits.
    #[test]
    fn duplicates_fail_anywhere(name in definition_name(), before in 0usize..3, after in 0usize..3) {
        let filler = |prefix: &str, n: usize| -> String {
            (0..n).map(|i| format!("enum {}{} {{ V = {}; }}\n", prefix, i, i)).collect()
        };
        let source = format!(
            "{}struct {} {{ }}\n{}message {} {{ }}\n",
            filler("Before", before),
            name,
            filler("After", after),
            name
        );
        prop_assume!(!name.starts_with("Before") && !name.starts_with("After"));
        match evaluate(&source) {
            Err(PierogiError::MultipleDefinitions { name: dup, .. }) => prop_assert_eq!(dup, name),
            other => prop_assert!(false, "expected MultipleDefinitions, got {:?}", other),
        }
    }

    /// Message indices are wire tags: duplicates and any order are accepted as written.
    #[test]
    fn message_indices_are_not_validated(indices in prop::collection::vec(0i32..1000, 1..8)) {
        let body: String = indices
            .iter()
            .enumerate()
            .map(|(i, idx)| format!("{} -> int32 f{};", idx, i))
            .collect();
        let schema = evaluate(&format!("message M {{ {} }}", body)).unwrap();
        let parsed: Vec<i32> = schema.definition("M").unwrap().fields.iter().map(|f| f.index_or_value).collect();
        prop_assert_eq!(parsed, indices);
    }
}
