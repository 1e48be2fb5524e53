use super::*;

#[test]
fn sequence_is_spreadsheet_style() {
    assert_eq!(sequence_prefix(0), "a_");
    assert_eq!(sequence_prefix(1), "b_");
    assert_eq!(sequence_prefix(25), "z_");
    assert_eq!(sequence_prefix(26), "aa_");
    assert_eq!(sequence_prefix(27), "ab_");
    assert_eq!(sequence_prefix(26 + 26 * 26), "aaa_");
}

#[test]
fn sequence_is_injective_over_a_range() {
    let all = (0..5000).map(sequence_prefix).collect::<BTreeSet<_>>();
    assert_eq!(all.len(), 5000);
}

#[test]
fn content_prefix_is_deterministic_and_bounded() {
    let a = content_prefix("<svg/>", 2);
    assert_eq!(a, content_prefix("<svg/>", 2));
    assert_eq!(a.len(), 3);
    assert!(a.ends_with('_'));
    assert!(
        a[..2]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
    );
    let longer = content_prefix("<svg/>", 6);
    assert!(longer.starts_with(&a[..2]));
}

#[test]
fn check_prefix_rejects_empty_and_ambiguous() {
    let declared = BTreeSet::from(["x", "p_x"]);
    assert!(check_prefix("", &declared).is_err());
    let err = check_prefix("p_", &declared).unwrap_err();
    assert!(err.to_string().contains("ambiguous"));
    assert!(check_prefix("q_", &declared).is_ok());
    assert!(check_prefix("q\"", &declared).is_err());
}

#[test]
fn already_prefixed_documents_are_not_ambiguous() {
    let declared = BTreeSet::from(["p_x", "p_y"]);
    assert!(check_prefix("p_", &declared).is_ok());
}

#[test]
fn policy_resolution() {
    let declared = BTreeSet::from(["a"]);
    assert_eq!(
        PrefixPolicy::Sequence { index: 2 }
            .resolve("", &declared)
            .unwrap(),
        "c_"
    );
    assert_eq!(
        PrefixPolicy::Explicit("emb_".into())
            .resolve("", &declared)
            .unwrap(),
        "emb_"
    );
    assert!(
        PrefixPolicy::ContentHash { len: 0 }
            .resolve("", &declared)
            .is_err()
    );
    let p = PrefixPolicy::default().resolve("<svg/>", &declared).unwrap();
    assert_eq!(p, content_prefix("<svg/>", DEFAULT_CONTENT_PREFIX_LEN));
}

#[test]
fn content_policy_grows_past_ambiguity() {
    let text = "<svg/>";
    let short = content_prefix(text, 2);
    let bait = format!("{short}x");
    let declared = BTreeSet::from(["x", bait.as_str()]);
    let p = PrefixPolicy::default().resolve(text, &declared).unwrap();
    assert_eq!(p, content_prefix(text, 3));
}

#[test]
fn allocator_detects_collisions_and_overlaps() {
    let mut alloc = PrefixAllocator::new();
    alloc.reserve("bg_", "background").unwrap();
    let err = alloc.reserve("bg_", "other").unwrap_err();
    assert!(matches!(err, SvgnsError::Collision(_)));
    let err = alloc.reserve("bg_x_", "nested").unwrap_err();
    assert!(matches!(err, SvgnsError::Collision(_)));
    assert!(alloc.reserve("zz_", "background").is_err());
}

#[test]
fn allocator_sequence_skips_reserved() {
    let mut alloc = PrefixAllocator::new();
    alloc.reserve("b_", "pinned").unwrap();
    assert_eq!(alloc.next_sequence("one").unwrap(), "a_");
    assert_eq!(alloc.next_sequence("two").unwrap(), "c_");
    assert_eq!(alloc.prefix_of("two"), Some("c_"));
    let map = alloc.into_assignments();
    assert_eq!(map.len(), 3);
    assert_eq!(map["pinned"], "b_");
}

#[test]
fn excluded_prefix_has_no_owner_but_blocks_sequence() {
    let mut alloc = PrefixAllocator::new();
    alloc.exclude("a_").unwrap();
    assert!(alloc.exclude("a_b_").is_err());
    assert_eq!(alloc.next_sequence("background").unwrap(), "b_");
    assert_eq!(alloc.prefix_of("background"), Some("b_"));
    assert_eq!(alloc.into_assignments().len(), 1);
}
