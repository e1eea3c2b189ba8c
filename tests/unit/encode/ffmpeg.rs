use super::*;

fn invocation(workdir: PathBuf) -> EncoderInvocation {
    EncoderInvocation {
        workdir,
        input_pattern: "frame%d.jpg".to_string(),
        frame_count: 12,
        frame_rate_hz: 10,
        output: "out.mp4".to_string(),
    }
}

#[test]
fn command_line_is_fixed_h264_mp4() {
    let enc = FfmpegEncoder::default();
    let args: Vec<String> = enc
        .args(&invocation(PathBuf::from("/tmp/x")))
        .into_iter()
        .map(|a| a.to_string_lossy().to_string())
        .collect();

    let pos = |flag: &str| args.iter().position(|a| a == flag).unwrap();
    assert_eq!(args[pos("-framerate") + 1], "10");
    assert_eq!(args[pos("-i") + 1], "frame%d.jpg");
    assert_eq!(args[pos("-vf") + 1], "scale=trunc(iw/2)*2:trunc(ih/2)*2");
    assert_eq!(args[pos("-c:v") + 1], "libx264");
    assert_eq!(args[pos("-preset") + 1], "ultrafast");
    assert_eq!(args[pos("-pix_fmt") + 1], "yuv420p");
    assert_eq!(args.last().map(String::as_str), Some("out.mp4"));
    // Input options must precede the input.
    assert!(pos("-framerate") < pos("-i"));
}

#[test]
fn opts_validation_catches_bad_values() {
    assert!(FfmpegOpts::default().validate().is_ok());
    assert!(
        FfmpegOpts {
            program: PathBuf::new(),
            ..FfmpegOpts::default()
        }
        .validate()
        .is_err()
    );
    assert!(
        FfmpegOpts {
            preset: " ".to_string(),
            ..FfmpegOpts::default()
        }
        .validate()
        .is_err()
    );
}

#[tokio::test]
async fn missing_binary_is_an_encode_error() {
    let dir = tempfile::tempdir().unwrap();
    let enc = FfmpegEncoder::new(FfmpegOpts {
        program: PathBuf::from("definitely-not-ffmpeg-storyreel"),
        ..FfmpegOpts::default()
    });
    let err = enc
        .encode(&invocation(dir.path().to_path_buf()))
        .await
        .unwrap_err();
    assert!(matches!(err, ReelError::Encode(_)));
    assert!(err.to_string().contains("spawn"));
}

#[test]
fn missing_binary_is_not_on_path() {
    assert!(!is_ffmpeg_on_path(Path::new("definitely-not-ffmpeg-storyreel")));
}
