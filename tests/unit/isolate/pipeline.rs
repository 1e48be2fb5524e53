use super::*;

const DOC: &str = r##"<svg><defs><linearGradient id="g"/></defs><rect id="r" fill="url(#g)"/><use href="#r"/></svg>"##;

const DEFAULT_PREFIX_TOTAL_LEN: usize = crate::ids::prefix::DEFAULT_CONTENT_PREFIX_LEN + 1;

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "svgns_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

#[test]
fn explicit_prefix_renames_declarations_and_references() {
    let out = isolate(DOC, &IsolateOptions::with_prefix("p_")).unwrap();
    assert_eq!(
        out.content,
        r##"<svg><defs><linearGradient id="p_g"/></defs><rect id="p_r" fill="url(#p_g)"/><use href="#p_r"/></svg>"##
    );
    assert_eq!(out.prefix, "p_");
    assert_eq!(out.stats.ids_found, 2);
    assert_eq!(out.stats.references_updated, 4);
    assert_eq!(out.stats.per_surface[&Surface::Declaration], 2);
    assert_eq!(out.stats.per_surface[&Surface::Functional], 1);
    assert_eq!(out.stats.per_surface[&Surface::LocalFragment], 1);
    assert!(out.errors.is_empty());
    assert!(!out.is_unchanged());
}

#[test]
fn second_pass_with_same_prefix_is_a_no_op() {
    let opts = IsolateOptions::with_prefix("p_");
    let first = isolate(DOC, &opts).unwrap().into_owned();
    let second = isolate(&first.content, &opts).unwrap();
    assert!(second.is_unchanged());
    assert_eq!(second.content, first.content);
    assert_eq!(second.stats.ids_found, 2);
    assert_eq!(second.stats.references_updated, 0);
}

#[test]
fn default_options_use_a_short_content_prefix() {
    let out = isolate(DOC, &IsolateOptions::default()).unwrap();
    assert_eq!(out.prefix.len(), DEFAULT_PREFIX_TOTAL_LEN);
    assert!(out.prefix.ends_with('_'));
    assert!(out.content.contains(&format!(r#"id="{}g""#, out.prefix)));
    let again = isolate(DOC, &IsolateOptions::default()).unwrap();
    assert_eq!(again.prefix, out.prefix);
}

#[test]
fn ambiguous_explicit_prefix_is_rejected() {
    let opts = IsolateOptions::with_prefix("p_");
    let err = isolate(r#"<g id="a"/><g id="p_a"/>"#, &opts).unwrap_err();
    assert!(matches!(err, SvgnsError::Validation(_)));
}

#[test]
fn document_without_ids_is_returned_borrowed() {
    let text = r#"<svg><rect width="1" height="1"/></svg>"#;
    let out = isolate(text, &IsolateOptions::with_prefix("p_")).unwrap();
    assert!(out.is_unchanged());
    assert_eq!(out.report(), VerificationReport::default());
}

#[test]
fn batch_assigns_sequence_prefixes_in_input_order() {
    let text = r##"<g id="x"/><use href="#x"/>"##;
    let docs = [
        BatchDocument { name: "one", text },
        BatchDocument { name: "two", text },
    ];
    let out = isolate_batch(&docs, BatchPrefixes::Sequence, VerifyMode::Exhaustive).unwrap();
    assert_eq!(out.documents.len(), 2);
    assert_eq!(out.documents[0].content, r##"<g id="a_x"/><use href="#a_x"/>"##);
    assert_eq!(out.documents[1].content, r##"<g id="b_x"/><use href="#b_x"/>"##);
    assert_eq!(out.prefixes["one"], "a_");
    assert_eq!(out.prefixes["two"], "b_");
}

#[test]
fn batch_rejects_identical_content_prefixes() {
    let docs = [
        BatchDocument {
            name: "left",
            text: DOC,
        },
        BatchDocument {
            name: "right",
            text: DOC,
        },
    ];
    let err = isolate_batch(
        &docs,
        BatchPrefixes::ContentHash { len: 2 },
        VerifyMode::Sampled,
    )
    .unwrap_err();
    assert!(matches!(err, SvgnsError::Collision(_)));
}

#[test]
fn batch_rejects_duplicate_names() {
    let docs = [
        BatchDocument {
            name: "same",
            text: DOC,
        },
        BatchDocument {
            name: "same",
            text: DOC,
        },
    ];
    let err = isolate_batch(&docs, BatchPrefixes::Sequence, VerifyMode::Off).unwrap_err();
    assert!(matches!(err, SvgnsError::Validation(_)));
}

#[test]
fn planned_renamed_only_maps_declared_ids() {
    let plan = Planned::new(DOC, "a_".to_owned()).unwrap();
    assert_eq!(plan.renamed("g"), "a_g");
    assert_eq!(plan.renamed("missing"), "missing");
}

#[test]
fn require_clean_turns_errors_into_verification_failure() {
    let mut out = isolate(DOC, &IsolateOptions::with_prefix("p_")).unwrap();
    assert!(require_clean("doc", &out).is_ok());
    out.errors.push("Unprefixed ID declaration remains: g".to_owned());
    let err = require_clean("doc", &out).unwrap_err();
    assert!(err.to_string().contains("prefixing failed for 'doc'"));
}

#[test]
fn isolate_file_writes_output_and_reports_paths() {
    let dir = temp_dir("isolate_file");
    fs::create_dir_all(&dir).unwrap();
    let input = dir.join("in.svg");
    let output = dir.join("out.svg");
    fs::write(&input, DOC).unwrap();

    let opts = IsolateOptions::with_prefix("p_");
    let res = isolate_file(&input, Some(output.as_path()), &opts).unwrap();
    assert_eq!(res.input_path, input);
    assert_eq!(res.output_path, output);
    assert_eq!(res.stats.ids_found, 2);
    assert!(fs::read_to_string(&output).unwrap().contains(r#"id="p_r""#));
    assert_eq!(fs::read_to_string(&input).unwrap(), DOC);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn isolate_file_missing_input_is_an_error() {
    let dir = temp_dir("isolate_missing");
    let err = isolate_file(dir.join("nope.svg"), None, &IsolateOptions::default()).unwrap_err();
    assert!(err.to_string().contains("nope.svg"));
}
