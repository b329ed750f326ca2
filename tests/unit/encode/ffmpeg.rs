use super::*;

fn png_sequence(dir: &Path, count: usize, width: u32, height: u32) -> AttributeSequence {
    std::fs::create_dir_all(dir).unwrap();
    let mut frames = Vec::new();
    for i in 0..count {
        let path = dir.join(format!("frame_{i:05}.png"));
        image::RgbaImage::from_pixel(width, height, image::Rgba([200, 10, 10, 128]))
            .save(&path)
            .unwrap();
        frames.push(path);
    }
    AttributeSequence {
        attribute: "means_l".to_string(),
        dir: dir.to_path_buf(),
        ext: "png".to_string(),
        frames,
    }
}

fn args_of(cmd: &Command) -> Vec<String> {
    cmd.get_args()
        .map(|a| a.to_string_lossy().into_owned())
        .collect()
}

#[test]
fn canvas_is_probed_from_frames_and_rounded_to_even() {
    let tmp = tempfile::tempdir().unwrap();
    let seq = png_sequence(tmp.path(), 2, 5, 3);
    let canvas = FfmpegEncoder::canvas_for(&seq, &EncodeSettings::default()).unwrap();
    assert_eq!(
        canvas,
        Canvas {
            width: 6,
            height: 4
        }
    );
}

#[test]
fn canvas_covers_the_largest_frame_not_just_the_first() {
    let tmp = tempfile::tempdir().unwrap();
    let seq = png_sequence(tmp.path(), 3, 4, 4);
    image::RgbaImage::from_pixel(8, 5, image::Rgba([0, 0, 0, 255]))
        .save(&seq.frames[1])
        .unwrap();
    image::RgbaImage::from_pixel(3, 6, image::Rgba([0, 0, 0, 255]))
        .save(&seq.frames[2])
        .unwrap();

    let canvas = FfmpegEncoder::canvas_for(&seq, &EncodeSettings::default()).unwrap();
    assert_eq!(
        canvas,
        Canvas {
            width: 8,
            height: 6
        }
    );
}

#[test]
fn unreadable_later_frame_is_an_encode_error() {
    let tmp = tempfile::tempdir().unwrap();
    let seq = png_sequence(tmp.path(), 2, 4, 4);
    std::fs::write(&seq.frames[1], b"not an image").unwrap();
    let err = FfmpegEncoder::canvas_for(&seq, &EncodeSettings::default()).unwrap_err();
    assert!(matches!(err, SplatSeqError::Encode { ref attribute, .. } if attribute == "means_l"));
    assert!(err.to_string().contains("frame_00001.png"));
}

#[test]
fn forced_frame_size_wins_over_probe() {
    let tmp = tempfile::tempdir().unwrap();
    let seq = png_sequence(tmp.path(), 1, 5, 3);
    let settings = EncodeSettings {
        frame_size: Some(Canvas {
            width: 127,
            height: 64,
        }),
        ..EncodeSettings::default()
    };
    let canvas = FfmpegEncoder::canvas_for(&seq, &settings).unwrap();
    assert_eq!(
        canvas,
        Canvas {
            width: 128,
            height: 64
        }
    );
}

#[test]
fn unreadable_first_frame_is_an_encode_error() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("frame_00000.webp");
    std::fs::write(&path, b"not an image").unwrap();
    let seq = AttributeSequence {
        attribute: "quats".to_string(),
        dir: tmp.path().to_path_buf(),
        ext: "webp".to_string(),
        frames: vec![path],
    };
    let err = FfmpegEncoder::canvas_for(&seq, &EncodeSettings::default()).unwrap_err();
    assert!(matches!(err, SplatSeqError::Encode { .. }));
}

#[test]
fn command_carries_rate_quality_keyint_and_backdrop() {
    let tmp = tempfile::tempdir().unwrap();
    let seq = png_sequence(tmp.path(), 3, 4, 4);
    let settings = EncodeSettings {
        fps: 24,
        quality: 12,
        keyframe_interval: 48,
        ..EncodeSettings::default()
    };
    let out = tmp.path().join("videos/means_l.mp4");
    let cmd = FfmpegEncoder::new().with_threads(Some(2)).command(
        &seq,
        Canvas {
            width: 4,
            height: 4,
        },
        &out,
        &settings,
    );
    let args = args_of(&cmd);

    let after = |flag: &str| {
        let i = args.iter().position(|a| a == flag).unwrap();
        args[i + 1].clone()
    };
    assert_eq!(after("-framerate"), "24");
    assert_eq!(after("-start_number"), "0");
    assert_eq!(after("-crf"), "12");
    assert_eq!(after("-g"), "48");
    assert_eq!(after("-frames:v"), "3");
    assert_eq!(after("-threads"), "2");
    assert_eq!(after("-pix_fmt"), "yuv420p");
    assert!(args.contains(&"color=c=0x000000:s=4x4:r=24".to_string()));
    assert!(args.iter().any(|a| a.ends_with("frame_%05d.png")));
    assert!(after("-filter_complex").contains("overlay=0:0"));
    assert!(!after("-filter_complex").contains("scale="));
    assert_eq!(args.last().unwrap(), &out.to_string_lossy().into_owned());
}

#[test]
fn forced_size_adds_nearest_neighbour_scale() {
    let tmp = tempfile::tempdir().unwrap();
    let seq = png_sequence(tmp.path(), 1, 3, 3);
    let settings = EncodeSettings {
        frame_size: Some(Canvas {
            width: 8,
            height: 8,
        }),
        ..EncodeSettings::default()
    };
    let cmd = FfmpegEncoder::new().command(
        &seq,
        Canvas {
            width: 8,
            height: 8,
        },
        Path::new("out.mp4"),
        &settings,
    );
    let args = args_of(&cmd);
    assert!(
        args.iter()
            .any(|a| a.contains("scale=8:8:flags=neighbor"))
    );
    assert!(!args.contains(&"-threads".to_string()));
}

#[test]
fn missing_ffmpeg_binary_fails_the_encode() {
    let tmp = tempfile::tempdir().unwrap();
    let seq = png_sequence(&tmp.path().join("seq"), 1, 2, 2);
    let enc = FfmpegEncoder::new().with_program(tmp.path().join("no-ffmpeg-here"));
    let err = enc
        .encode(&seq, &tmp.path().join("out.mp4"), &EncodeSettings::default())
        .unwrap_err();
    assert!(err.to_string().contains("failed to spawn ffmpeg"));
}
