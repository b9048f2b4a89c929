use std::error::Error;
use std::path::Path;

use serde_json::{json, Value};

use filemill::engine::sourcemap::{map_path_for, source_mapping_url_comment, SourceMap};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn relocate_points_map_at_destination() -> TestResult {
    let mut map = SourceMap::parse(r#"{"version":3,"file":"stdin","sources":["stdin"],"mappings":";AAAA"}"#)?;

    map.relocate(Path::new("/p/src/lib/a.ts"), Path::new("/p/dist/lib/a.js"));

    assert_eq!(map.file.as_deref(), Some("a.js"));
    assert_eq!(map.sources, vec![Some("../../src/lib/a.ts".to_string())]);
    assert_eq!(map.mappings, ";AAAA");
    Ok(())
}

#[test]
fn unknown_fields_survive_a_rewrite() -> TestResult {
    let raw = r#"{"version":3,"sources":["a"],"mappings":"","x_google_ignoreList":[0]}"#;
    let map = SourceMap::parse(raw)?;

    let written: Value = serde_json::from_str(&map.to_json()?)?;
    assert_eq!(written["x_google_ignoreList"], json!([0]));
    assert_eq!(written["version"], json!(3));
    assert_eq!(written["sources"], json!(["a"]));
    Ok(())
}

#[test]
fn missing_version_defaults_to_three() -> TestResult {
    let map = SourceMap::parse(r#"{"mappings":"AAAA"}"#)?;
    assert_eq!(map.version, 3);
    Ok(())
}

#[test]
fn null_fields_and_entries_are_accepted() -> TestResult {
    let map = SourceMap::parse(
        r#"{"version":null,"file":null,"sourceRoot":null,"sources":[null,"b.ts"],
            "sourcesContent":null,"names":[null],"mappings":null}"#,
    )?;

    assert_eq!(map.version, 3);
    assert_eq!(map.file, None);
    assert_eq!(map.source_root, None);
    assert_eq!(map.sources, vec![None, Some("b.ts".to_string())]);
    assert!(map.sources_content.is_empty());
    assert_eq!(map.names, vec![None]);
    assert_eq!(map.mappings, "");

    let written: Value = serde_json::from_str(&map.to_json()?)?;
    assert_eq!(written["sources"], json!([null, "b.ts"]));
    assert!(written.get("sourceRoot").is_none());
    Ok(())
}

#[test]
fn non_json_is_rejected() {
    assert!(SourceMap::parse("//# not a map").is_err());
}

#[test]
fn identity_map_has_one_segment_per_line() {
    let map = SourceMap::identity("a\nb\nc\n", Path::new("/p/src/x.ts"));

    assert_eq!(map.mappings, "AAAA;AACA;AACA");
    assert_eq!(map.sources, vec![Some("x.ts".to_string())]);
    assert_eq!(map.sources_content, vec![Some("a\nb\nc\n".to_string())]);

    let empty = SourceMap::identity("", Path::new("/p/src/x.ts"));
    assert_eq!(empty.mappings, "AAAA");
}

#[test]
fn trailer_and_map_path_use_destination_name() {
    let dest = Path::new("/p/dist/main.js");
    assert_eq!(source_mapping_url_comment(dest), "\n//# sourceMappingURL=main.js.map");
    assert_eq!(map_path_for(dest), Path::new("/p/dist/main.js.map"));
}
