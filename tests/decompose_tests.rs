use urlscope::decompose::{decompose, normalize_key, pack, InvalidUrl};

#[test]
fn splits_path_into_segments() {
    let (shape, pieces) = decompose("http://example.com/a/b/c").unwrap();
    assert_eq!(shape.path_depth(), 3);
    assert_eq!(shape.query_depth(), 0);
    assert!(!shape.has_fragment());
    assert_eq!(pieces, vec!["a", "b", "c"]);
}

#[test]
fn empty_segments_are_discarded() {
    let (shape, pieces) = decompose("http://example.com/a//b/").unwrap();
    assert_eq!(shape.path_depth(), 2);
    assert_eq!(pieces, vec!["a", "b"]);
}

#[test]
fn url_without_path_fails() {
    assert!(matches!(
        decompose("http://example.com"),
        Err(InvalidUrl::EmptyPath)
    ));
    assert!(matches!(
        decompose("http://example.com/"),
        Err(InvalidUrl::EmptyPath)
    ));
}

#[test]
fn bare_question_mark_is_a_present_empty_query() {
    let (with_query, pieces) = decompose("http://example.com/a?").unwrap();
    let (without, _) = decompose("http://example.com/a").unwrap();
    assert_eq!(with_query.query_depth(), 1);
    assert_eq!(with_query.query_keys(), &[String::new()]);
    assert_eq!(pieces, vec!["a", ""]);
    assert_eq!(without.query_depth(), 0);
    assert_ne!(with_query, without);
}

#[test]
fn bare_hash_is_a_present_empty_fragment() {
    let (with_frag, pieces) = decompose("http://example.com/a#").unwrap();
    let (without, _) = decompose("http://example.com/a").unwrap();
    assert!(with_frag.has_fragment());
    assert_eq!(pieces, vec!["a", ""]);
    assert_ne!(with_frag, without);
}

#[test]
fn question_mark_inside_fragment_is_not_a_query() {
    let (shape, pieces) = decompose("http://example.com/a#x?y").unwrap();
    assert_eq!(shape.query_depth(), 0);
    assert!(shape.has_fragment());
    assert_eq!(pieces, vec!["a", "x?y"]);
}

#[test]
fn trailing_ampersand_fails() {
    assert!(matches!(
        decompose("http://example.com/a?x=1&"),
        Err(InvalidUrl::MalformedQuery)
    ));
}

#[test]
fn doubled_ampersand_fails() {
    assert!(matches!(
        decompose("http://example.com/a?x=1&&y=2"),
        Err(InvalidUrl::MalformedQuery)
    ));
}

#[test]
fn leading_ampersand_fails() {
    assert!(matches!(
        decompose("http://example.com/a?&x=1"),
        Err(InvalidUrl::MalformedQuery)
    ));
}

#[test]
fn lone_value_only_query_becomes_key_less() {
    let (shape, pieces) = decompose("http://example.com/a?token123").unwrap();
    assert_eq!(shape.query_keys(), &[String::new()]);
    assert_eq!(pieces, vec!["a", "token123"]);
}

#[test]
fn value_less_key_stays_distinct_from_empty_value() {
    // "a" carries no '=': its normalized key lacks the literal '='
    let (shape, pieces) = decompose("http://example.com/p?a&b=1").unwrap();
    assert_eq!(shape.query_keys(), &["[a-z]".to_string(), "[a-z]=".to_string()]);
    assert_eq!(pieces, vec!["p", "", "1"]);

    let (empty_value, _) = decompose("http://example.com/p?a=&b=1").unwrap();
    assert_ne!(shape, empty_value);
}

#[test]
fn equals_inside_value_is_literal() {
    let (shape, pieces) = decompose("http://example.com/p?a=b=c").unwrap();
    assert_eq!(shape.query_keys(), &["[a-z]=".to_string()]);
    assert_eq!(pieces, vec!["p", "b=c"]);
}

#[test]
fn structurally_equal_keys_share_a_shape() {
    let (a, _) = decompose("http://example.com/p?ab=1").unwrap();
    let (b, _) = decompose("http://example.com/p?xy=2").unwrap();
    assert_eq!(a, b);
    let (longer, _) = decompose("http://example.com/p?abc=1").unwrap();
    assert_ne!(a, longer);
}

#[test]
fn digits_stay_literal_in_normalized_keys() {
    assert_eq!(normalize_key("a1="), "[a-z]1=");
    assert_eq!(normalize_key("utm="), "[a-z][a-z][a-z]=");
    assert_eq!(normalize_key("aab="), "[a-z]{2}[a-z]=");
    assert_eq!(normalize_key(""), "");
}

#[test]
fn url_without_scheme_is_path_only() {
    let (shape, pieces) = decompose("example.com/x").unwrap();
    assert_eq!(shape.path_depth(), 2);
    assert_eq!(pieces, vec!["example.com", "x"]);
}

#[test]
fn protocol_relative_url_skips_authority() {
    let (shape, pieces) = decompose("//cdn.example.com/assets/app").unwrap();
    assert_eq!(shape.path_depth(), 2);
    assert_eq!(pieces, vec!["assets", "app"]);
}

#[test]
fn shape_canonical_marks_query_and_fragment() {
    let (shape, _) = decompose("http://example.com/a/b?k=v#f").unwrap();
    assert_eq!(shape.canonical(), "2?[a-z]=#");
    let (plain, _) = decompose("http://example.com/a/b").unwrap();
    assert_eq!(plain.canonical(), "2");
}

#[test]
fn pack_reassembles_a_pattern_string() {
    let (shape, _) = decompose("http://example.com/a/b?k=v#f").unwrap();
    let packed = pack(&shape, &["a", "b", "v", "f"]);
    assert_eq!(packed, "/a/b[\\?][a-z]=v#f");
}

#[test]
fn pack_without_query_or_fragment_is_path_only() {
    let (shape, _) = decompose("http://example.com/a/b").unwrap();
    assert_eq!(pack(&shape, &["a", "[0-9]{3}"]), "/a/[0-9]{3}");
}
