use super::*;

fn tile(name: &str, vb: &str) -> GridTile {
    GridTile::new(
        format!(r##"<svg viewBox="{vb}"><circle id="c" r="1"/><use href="#c"/></svg>"##),
        name,
    )
}

fn two_wide() -> Vec<GridTile> {
    vec![tile("left", "0 0 1920 1080"), tile("right", "0 0 1920 1080")]
}

#[test]
fn two_columns_split_the_container() {
    let cfg = GridConfig {
        columns: 2,
        ..GridConfig::default()
    };
    let out = compose_grid(&two_wide(), None, &cfg).unwrap();
    assert_eq!((out.width, out.height), (1920.0, 1080.0));
    assert_eq!(out.placed.len(), 2);
    assert_eq!(out.placed[0].cell, Rect::new(20.0, 20.0, 950.0, 1060.0));
    assert_eq!(out.placed[1].cell, Rect::new(970.0, 20.0, 1900.0, 1060.0));
    assert_eq!(out.placed[0].frame.width(), 930.0);
    assert!(out.diagnostics.is_empty());
    assert!(out.content.starts_with("<?xml"));
    assert!(out.content.contains(r##"fill="#ffffff""##));
}

#[test]
fn tiles_are_isolated_and_clipped() {
    let out = compose_grid(&two_wide(), None, &GridConfig::default()).unwrap();
    assert!(out.content.contains(r#"<circle id="a_c""#));
    assert!(out.content.contains(r##"<use href="#b_c"/>"##));
    assert!(!out.content.contains(r#"id="c""#));
    assert!(out.content.contains(r#"<clipPath id="grid-clip-0">"#));
    assert!(out.content.contains(r##"<g clip-path="url(#grid-clip-1)">"##));
    assert!(out.content.contains(r#"viewBox="0 0 1920 1080" overflow="hidden">"#));
    assert_eq!(out.prefixes["left"], "a_");
    assert_eq!(out.prefixes["right"], "b_");
}

#[test]
fn stretch_mode_disables_aspect_preservation() {
    let cfg = GridConfig {
        preserve_aspect_ratio: false,
        ..GridConfig::default()
    };
    let out = compose_grid(&two_wide(), None, &cfg).unwrap();
    assert!(out.content.contains(r#"preserveAspectRatio="none""#));
    assert_eq!(out.placed[0].frame, out.placed[0].cell);
}

#[test]
fn overflowing_tiles_are_skipped_with_a_diagnostic() {
    let cfg = GridConfig {
        columns: 2,
        rows: Some(1),
        ..GridConfig::default()
    };
    let mut tiles = two_wide();
    tiles.push(tile("extra", "0 0 10 10"));
    let out = compose_grid(&tiles, None, &cfg).unwrap();
    assert_eq!(out.placed.len(), 2);
    assert_eq!(out.prefixes.len(), 3);
    assert_eq!(out.diagnostics.len(), 1);
    assert!(out.diagnostics[0].contains("'extra' exceeds grid capacity"));
    assert!(!out.content.contains("Tile: extra"));
}

#[test]
fn background_anchor_receives_tiles() {
    let bg = r#"<svg viewBox="0 0 800 600"><g id="STAGE_BACKGROUND"><rect id="floor"/></g></svg>"#;
    let out = compose_grid(&two_wide(), Some(bg), &GridConfig::default()).unwrap();
    assert_eq!((out.width, out.height), (800.0, 600.0));
    assert!(out.content.contains("<g id=\"bg_STAGE_BACKGROUND\">\n  <!-- Tile: left -->"));
    assert!(out.content.contains(r#"<rect id="bg_floor"/>"#));
    assert!(!out.content.contains("<?xml"));
}

#[test]
fn background_without_anchor_appends_before_close() {
    let bg = r#"<svg width="640" height="480"><rect id="floor"/></svg>"#;
    let out = compose_grid(&two_wide(), Some(bg), &GridConfig::default()).unwrap();
    assert_eq!(out.view_box, ViewBox::from_size(640.0, 480.0).unwrap());
    let tiles_at = out.content.find("<!-- Grid Tiles -->").unwrap();
    assert!(out.content[tiles_at..].ends_with("</svg>"));
    assert!(out.content.starts_with(r#"<svg width="640" height="480"><rect id="bg_floor"/>"#));
}

#[test]
fn labels_are_escaped_and_placed_below_cells() {
    let cfg = GridConfig {
        columns: 1,
        show_labels: true,
        label_color: "#123456".to_owned(),
        ..GridConfig::default()
    };
    let tiles = vec![tile("a&b", "0 0 10 10")];
    let out = compose_grid(&tiles, None, &cfg).unwrap();
    assert!(out.content.contains(r##"fill="#123456">a&amp;b</text>"##));
    assert!(out.content.contains("<!-- Tile: a&b -->"));
}

#[test]
fn scale_multiplies_container() {
    let cfg = GridConfig {
        scale: 2.0,
        ..GridConfig::default()
    };
    let out = compose_grid(&two_wide(), None, &cfg).unwrap();
    assert_eq!(out.width, 3840.0);
    assert!(out.content.contains(r#"width="3840" height="2160""#));
    assert!(GridConfig { scale: 0.0, ..GridConfig::default() }.scaled().is_err());
}

#[test]
fn empty_and_duplicate_tiles_are_rejected() {
    let cfg = GridConfig::default();
    assert!(matches!(
        compose_grid(&[], None, &cfg).unwrap_err(),
        SvgnsError::Validation(_)
    ));
    let dup = vec![tile("x", "0 0 1 1"), tile("x", "0 0 1 1")];
    let err = compose_grid(&dup, None, &cfg).unwrap_err();
    assert!(err.to_string().contains("duplicate tile name 'x'"));
}

#[test]
fn config_loads_from_partial_json() {
    let json = r#"{ "columns": 2, "show_labels": true, "verify": "exhaustive" }"#;
    let cfg = GridConfig::from_reader(json.as_bytes()).unwrap();
    assert_eq!(cfg.columns, 2);
    assert!(cfg.show_labels);
    assert_eq!(cfg.verify, VerifyMode::Exhaustive);
    assert_eq!(cfg.margin, 20.0);
    assert!(matches!(
        GridConfig::from_reader("{ \"columns\": \"two\" }".as_bytes()).unwrap_err(),
        SvgnsError::Serde(_)
    ));
}

#[test]
fn empty_anchor_group_is_opened_for_tiles() {
    let bg = r#"<svg viewBox="0 0 800 600"><g id="STAGE_BACKGROUND"/><rect id="floor"/></svg>"#;
    let out = compose_grid(&two_wide(), Some(bg), &GridConfig::default()).unwrap();
    assert!(out.content.contains("<g id=\"bg_STAGE_BACKGROUND\">\n  <!-- Tile: left -->"));
    assert!(out.content.contains("</g><rect id=\"bg_floor\"/></svg>"));
    assert!(!out.content.contains("bg_STAGE_BACKGROUND\"/>"));
}

#[test]
fn background_origin_offsets_cells() {
    let bg = r#"<svg viewBox="-50 -50 100 100"><g id="STAGE_BACKGROUND"></g></svg>"#;
    let tiles = vec![tile("only", "0 0 10 10")];
    let out = compose_grid(&tiles, Some(bg), &GridConfig::default()).unwrap();
    let visible = out.view_box.rect();
    let cell = out.placed[0].cell;
    assert_eq!((cell.x0, cell.y0), (-30.0, -30.0));
    assert_eq!(cell.union(visible), visible);
    assert_eq!(out.placed[0].frame.union(visible), visible);
}
