use crate::{
    db::codec::{encode_value, encode_value_desc, encode_values, prefix_successor},
    value::{Value, canonical_cmp, canonical_cmp_slices},
};
use proptest::prelude::*;

fn asc(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    encode_value(&mut out, value);
    out
}

fn desc(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    encode_value_desc(&mut out, value);
    out
}

fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        any::<u64>().prop_map(Value::Uint),
        "[a-c\\x00]{0,4}".prop_map(Value::Text),
        proptest::collection::vec(any::<u8>(), 0..4).prop_map(Value::Blob),
    ]
}

proptest! {
    #[test]
    fn ascending_bytes_follow_canonical_order(a in value_strategy(), b in value_strategy()) {
        prop_assert_eq!(asc(&a).cmp(&asc(&b)), canonical_cmp(&a, &b));
    }

    #[test]
    fn descending_bytes_reverse_canonical_order(a in value_strategy(), b in value_strategy()) {
        prop_assert_eq!(desc(&a).cmp(&desc(&b)), canonical_cmp(&b, &a));
    }

    #[test]
    fn tuple_bytes_follow_slice_order(
        a in proptest::collection::vec(value_strategy(), 0..3),
        b in proptest::collection::vec(value_strategy(), 0..3),
    ) {
        prop_assert_eq!(encode_values(&a).cmp(&encode_values(&b)), canonical_cmp_slices(&a, &b));
    }
}

#[test]
fn embedded_zero_bytes_keep_text_order() {
    let plain = Value::from("a");
    let with_zero = Value::Text("a\u{0}".to_string());

    assert!(asc(&plain) < asc(&with_zero));
    assert!(desc(&plain) > desc(&with_zero));
}

#[test]
fn prefix_successor_bounds_every_extension() {
    let prefix = encode_values(&[Value::Int(1)]);
    let extended = encode_values(&[Value::Int(1), Value::Text("zzz".to_string())]);
    let next = encode_values(&[Value::Int(2)]);
    let successor = prefix_successor(&prefix);

    assert!(extended < successor);
    assert!(successor < next);
}
