use super::*;

#[test]
fn empty_object_yields_defaults() {
    let cfg = CaptureConfig::from_json_str("{}").unwrap();
    assert_eq!(cfg, CaptureConfig::default());
    assert_eq!(cfg.ffmpeg.program, PathBuf::from("ffmpeg"));
    assert_eq!(cfg.ffmpeg.preset, "ultrafast");
}

#[test]
fn partial_sections_keep_other_defaults() {
    let cfg = CaptureConfig::from_json_str(
        r#"{"ffmpeg": {"preset": "veryfast"}, "viewport": {"row_height": 40}, "output_dir": "renders"}"#,
    )
    .unwrap();
    assert_eq!(cfg.ffmpeg.preset, "veryfast");
    assert_eq!(cfg.ffmpeg.program, PathBuf::from("ffmpeg"));
    assert_eq!(cfg.viewport.row_height, 40);
    assert_eq!(cfg.viewport.width, StripLayout::default().width);
    assert_eq!(cfg.output_dir, PathBuf::from("renders"));
}

#[test]
fn unknown_fields_are_rejected() {
    let err = CaptureConfig::from_json_str(r#"{"sample_rate": 30}"#).unwrap_err();
    assert!(matches!(err, ReelError::Serde(_)));
}

#[test]
fn invalid_values_fail_validation() {
    let err = CaptureConfig::from_json_str(r#"{"viewport": {"height": 10, "header_height": 32}}"#)
        .unwrap_err();
    assert!(matches!(err, ReelError::Validation(_)));
}

#[test]
fn load_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cfg.json");
    std::fs::write(&path, r#"{"output_dir": "out"}"#).unwrap();
    assert_eq!(
        CaptureConfig::load(&path).unwrap().output_dir,
        PathBuf::from("out")
    );
}
