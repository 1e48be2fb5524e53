use super::*;

#[test]
fn collects_both_quote_styles() {
    let svg = r#"<svg><rect id="a"/><circle id='b'/><g
        id = "c"></g></svg>"#;
    let ids = declared_ids(svg);
    assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec!["a", "b", "c"]);
}

#[test]
fn ignores_attributes_that_merely_end_in_id() {
    let svg = r#"<g data-id="x" xml:id="y" grid="z" valid='w' id="real"/>"#;
    let ids = declared_ids(svg);
    assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec!["real"]);
}

#[test]
fn tolerates_broken_script_blocks() {
    let svg = r#"<svg id="root"><script>if (a < b && c > "d" { </script><path id="p"/></svg>"#;
    let ids = declared_ids(svg);
    assert!(ids.contains("root"));
    assert!(ids.contains("p"));
}

#[test]
fn table_skips_already_prefixed_ids() {
    let svg = r#"<rect id="q_r1"/><rect id="r2"/>"#;
    let table = IdTable::build(svg, "q_");
    assert_eq!(table.ids_found(), 2);
    assert_eq!(table.len(), 1);
    assert_eq!(table.get("r2"), Some("q_r2"));
    assert!(!table.contains("q_r1"));
    assert_eq!(table.prefix(), "q_");
}

#[test]
fn duplicate_declarations_count_once() {
    let svg = r#"<rect id="a"/><rect id="a"/>"#;
    let table = IdTable::build(svg, "p_");
    assert_eq!(table.ids_found(), 1);
    assert_eq!(table.iter().collect::<Vec<_>>(), vec![("a", "p_a")]);
}
