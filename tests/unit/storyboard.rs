use super::*;
use serde_json::json;

#[test]
fn numeric_durations_are_milliseconds() {
    assert_eq!(
        resolve_duration(Some(&json!(1500))),
        Duration::from_millis(1500)
    );
    assert_eq!(
        resolve_duration(Some(&json!(1500.9))),
        Duration::from_millis(1500)
    );
    assert_eq!(
        resolve_duration(Some(&json!(" 750 "))),
        Duration::from_millis(750)
    );
}

#[test]
fn unusable_durations_fall_back_to_default() {
    for cell in [
        None,
        Some(json!(null)),
        Some(json!("")),
        Some(json!("soon")),
        Some(json!(0)),
        Some(json!(-20)),
        Some(json!(0.5)),
        Some(json!(true)),
        Some(json!([1000])),
    ] {
        assert_eq!(resolve_duration(cell.as_ref()), DEFAULT_ITEM_DURATION);
    }
}

#[test]
fn spreadsheet_headers_are_accepted() {
    let sb = Storyboard::from_json_str(
        r#"[
            {"镜号": 1, "景别": "close", "机位": "A", "运镜": "pan", "镜头分析": "opening", "时长": 1200},
            {"shot": "2", "duration": "oops"}
        ]"#,
    )
    .unwrap();

    assert_eq!(sb.len(), 2);
    assert_eq!(sb.rows[0].shot, "1");
    assert_eq!(sb.rows[0].angle, "close");
    assert_eq!(sb.rows[0].script, "opening");

    let items = sb.items();
    assert_eq!(items[0].duration_millis(), 1200);
    assert_eq!(items[1].duration_millis(), 2000);
    assert_eq!(items[1].sequence_index, 1);
}

#[test]
fn empty_image_cells_are_ignored() {
    let row = StoryboardRow {
        image: Some("  ".to_string()),
        ..StoryboardRow::default()
    };
    assert!(row.image_path().is_none());

    let row = StoryboardRow {
        image: Some("shots/01.png".to_string()),
        ..StoryboardRow::default()
    };
    assert_eq!(row.image_path(), Some(Path::new("shots/01.png")));
}

#[test]
fn malformed_json_is_a_serde_error() {
    let err = Storyboard::from_json_str("{not json").unwrap_err();
    assert!(matches!(err, ReelError::Serde(_)));
}

#[test]
fn load_reads_rows_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rows.json");
    std::fs::write(&path, r#"[{"duration": 300}, {}]"#).unwrap();

    let sb = Storyboard::load(&path).unwrap();
    let millis: Vec<u64> = sb.items().iter().map(|i| i.duration_millis()).collect();
    assert_eq!(millis, vec![300, 2000]);

    assert!(Storyboard::load(&dir.path().join("missing.json")).is_err());
}
