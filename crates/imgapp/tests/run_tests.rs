use imgapp::*;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;

const GREEN: [u8; 4] = [0, 255, 0, 255];

fn green_raw(width: u32, height: u32) -> Vec<u8> {
    GREEN.repeat((width * height) as usize)
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[test]
fn test_decode_png_to_raw() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("green.png");
    let output = dir.path().join("green.rgba");

    let grid = PixelGrid::filled(10, 10, GREEN).unwrap();
    let png = ImageCodec
        .encode(&grid, CompressFormat::Png, Quality::default())
        .unwrap();
    fs::write(&input, png).unwrap();

    let params = ParameterSet::from_pairs([
        ("decode", "a".to_string()),
        ("input", path_str(&input)),
        ("output", path_str(&output)),
    ]);
    let outcome = run(&params, &ImageCodec).unwrap();

    assert_eq!(outcome.mode, Mode::Decode);
    assert_eq!((outcome.width, outcome.height), (10, 10));
    assert_eq!(outcome.bytes_written, 400);
    assert_eq!(fs::read(&output).unwrap(), green_raw(10, 10));
}

#[test]
fn test_encode_raw_to_png_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("green.rgba");
    let output = dir.path().join("green.png");
    fs::write(&input, green_raw(10, 10)).unwrap();

    let params = ParameterSet::from_pairs([
        ("encode", "a".to_string()),
        ("input", path_str(&input)),
        ("output", path_str(&output)),
        ("width", "10".to_string()),
        ("height", "10".to_string()),
    ]);
    let outcome = run(&params, &ImageCodec).unwrap();
    assert_eq!(outcome.mode, Mode::Encode);

    let encoded = fs::read(&output).unwrap();
    assert_eq!(encoded.len(), outcome.bytes_written);
    assert_eq!(&encoded[..8], b"\x89PNG\r\n\x1a\n");

    let decoded = ImageCodec.decode(&encoded, None).unwrap();
    assert_eq!(decoded.to_rgba_bytes(), green_raw(10, 10));
}

#[test]
fn test_encode_jpeg_with_quality() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("green.rgba");
    let output = dir.path().join("green.jpg");
    fs::write(&input, green_raw(16, 8)).unwrap();

    let params = ParameterSet::from_pairs([
        ("encode", "a".to_string()),
        ("input", path_str(&input)),
        ("output", path_str(&output)),
        ("width", "16".to_string()),
        ("height", "8".to_string()),
        ("compressFormat", "JPEG".to_string()),
        ("compressQuality", "90".to_string()),
    ]);
    run(&params, &ImageCodec).unwrap();

    let encoded = fs::read(&output).unwrap();
    assert_eq!(&encoded[..2], &[0xFF, 0xD8]);
    let decoded = ImageCodec.decode(&encoded, None).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (16, 8));
}

#[test]
fn test_encode_webp_lossy() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("green.rgba");
    let output = dir.path().join("green.webp");
    fs::write(&input, green_raw(4, 4)).unwrap();

    let params = ParameterSet::from_pairs([
        ("encode", "a".to_string()),
        ("input", path_str(&input)),
        ("output", path_str(&output)),
        ("width", "4".to_string()),
        ("height", "4".to_string()),
        ("compressFormat", "WEBP_LOSSY".to_string()),
        ("compressQuality", "75".to_string()),
    ]);
    run(&params, &ImageCodec).unwrap();

    let encoded = fs::read(&output).unwrap();
    assert_eq!(&encoded[..4], b"RIFF");
    assert_eq!(&encoded[8..12], b"WEBP");
    // written lossless, so pixels survive exactly
    let decoded = ImageCodec.decode(&encoded, None).unwrap();
    assert_eq!(decoded.to_rgba_bytes(), green_raw(4, 4));
}

#[test]
fn test_decode_rejects_bad_encode_options() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.png");
    let output = dir.path().join("out.rgba");

    let params = ParameterSet::from_pairs([
        ("decode", "a".to_string()),
        ("input", path_str(&input)),
        ("output", path_str(&output)),
        ("compressFormat", "GIF".to_string()),
    ]);
    assert!(matches!(
        run(&params, &ImageCodec),
        Err(ImgError::InvalidParameter {
            key: "compressFormat",
            ..
        })
    ));

    let params = ParameterSet::from_pairs([
        ("decode", "a".to_string()),
        ("input", path_str(&input)),
        ("output", path_str(&output)),
        ("width", "-3".to_string()),
    ]);
    assert!(matches!(
        run(&params, &ImageCodec),
        Err(ImgError::InvalidParameter { key: "width", .. })
    ));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_decode_extended_color_spaces() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("orange.png");
    let grid = PixelGrid::filled(3, 2, [255, 128, 0, 77]).unwrap();
    let png = ImageCodec
        .encode(&grid, CompressFormat::Png, Quality::default())
        .unwrap();
    fs::write(&input, png).unwrap();

    let cases = [
        ("EXTENDED_SRGB", [255, 128, 0, 77]),
        ("LINEAR_EXTENDED_SRGB", [255, 55, 0, 77]),
    ];
    for (space, expected) in cases {
        let output = dir.path().join(format!("{space}.rgba"));
        let params = ParameterSet::from_pairs([
            ("decode", "a".to_string()),
            ("input", path_str(&input)),
            ("output", path_str(&output)),
            ("inPreferredColorSpace", space.to_string()),
        ]);
        run(&params, &ImageCodec).unwrap();
        assert_eq!(fs::read(&output).unwrap(), expected.repeat(6), "{space}");
    }
}

#[test]
fn test_quality_out_of_range_touches_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("green.rgba");
    let output = dir.path().join("green.jpg");

    let params = ParameterSet::from_pairs([
        ("encode", "a".to_string()),
        ("input", path_str(&input)),
        ("output", path_str(&output)),
        ("width", "10".to_string()),
        ("height", "10".to_string()),
        ("compressFormat", "JPEG".to_string()),
        ("compressQuality", "150".to_string()),
    ]);
    let result = run(&params, &ImageCodec);

    assert!(matches!(
        result,
        Err(ImgError::InvalidParameter {
            key: "compressQuality",
            ..
        })
    ));
    assert!(!output.exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_missing_input_leaves_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.png");

    let params = ParameterSet::from_pairs([
        ("encode", "a".to_string()),
        ("input", path_str(&dir.path().join("absent.rgba"))),
        ("output", path_str(&output)),
        ("width", "10".to_string()),
        ("height", "10".to_string()),
    ]);

    assert!(matches!(
        run(&params, &ImageCodec),
        Err(ImgError::Io { .. })
    ));
    assert!(!output.exists());
}

#[test]
fn test_truncated_raw_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("short.rgba");
    let output = dir.path().join("short.png");
    fs::write(&input, vec![0u8; 100]).unwrap();

    let params = ParameterSet::from_pairs([
        ("encode", "a".to_string()),
        ("input", path_str(&input)),
        ("output", path_str(&output)),
        ("width", "10".to_string()),
        ("height", "10".to_string()),
    ]);

    assert!(matches!(
        run(&params, &ImageCodec),
        Err(ImgError::TruncatedInput {
            expected: 400,
            actual: 100
        })
    ));
    assert!(!output.exists());
}

#[test]
fn test_decode_corrupt_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("broken.heic");
    let output = dir.path().join("broken.rgba");
    fs::write(&input, b"\x00\x00\x00\x18ftypheic not really").unwrap();

    let params = ParameterSet::from_pairs([
        ("decode", "a".to_string()),
        ("input", path_str(&input)),
        ("output", path_str(&output)),
    ]);

    assert!(matches!(
        run(&params, &ImageCodec),
        Err(ImgError::DecodeFailure(_))
    ));
    assert!(!output.exists());
}

#[test]
fn test_workdir_resolves_relative_paths() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("in.rgba"), green_raw(2, 2)).unwrap();

    let params = ParameterSet::from_pairs([
        ("encode", "a".to_string()),
        ("input", "in.rgba".to_string()),
        ("output", "out.webp".to_string()),
        ("width", "2".to_string()),
        ("height", "2".to_string()),
        ("compressFormat", "WEBP_LOSSLESS".to_string()),
        ("workdir", path_str(dir.path())),
    ]);
    let outcome = run(&params, &ImageCodec).unwrap();

    assert_eq!(outcome.output, dir.path().join("out.webp"));
    let decoded = ImageCodec
        .decode(&fs::read(&outcome.output).unwrap(), None)
        .unwrap();
    assert_eq!(decoded.to_rgba_bytes(), green_raw(2, 2));
}

#[test]
fn test_validation_rejections() {
    let cases: Vec<(ParameterSet, &str)> = vec![
        (
            ParameterSet::from_pairs([
                ("encode", ""),
                ("decode", ""),
                ("input", "a"),
                ("output", "b"),
            ]),
            "both modes",
        ),
        (
            ParameterSet::from_pairs([("input", "a"), ("output", "b")]),
            "no mode",
        ),
        (
            ParameterSet::from_pairs([
                ("encode", ""),
                ("input", "a"),
                ("output", "b"),
                ("height", "4"),
            ]),
            "missing width",
        ),
        (
            ParameterSet::from_pairs([
                ("encode", ""),
                ("input", "a"),
                ("output", "b"),
                ("width", "4"),
                ("height", "4"),
                ("compressQuality", "abc"),
            ]),
            "non-numeric quality",
        ),
        (
            ParameterSet::from_pairs([
                ("encode", ""),
                ("input", "a"),
                ("output", "b"),
                ("width", "4"),
                ("height", "4"),
                ("compressFormat", "GIF"),
            ]),
            "unknown format",
        ),
        (
            ParameterSet::from_pairs([
                ("decode", ""),
                ("input", "a"),
                ("output", "b"),
                ("inPreferredColorSpace", "RAINBOW"),
            ]),
            "unknown color space",
        ),
    ];

    for (params, label) in cases {
        assert!(validate(&params).is_err(), "{label} should be rejected");
    }

    let missing_width = ParameterSet::from_pairs([
        ("encode", ""),
        ("input", "a"),
        ("output", "b"),
        ("height", "4"),
    ]);
    assert!(matches!(
        validate(&missing_width),
        Err(ImgError::MissingParameter("width"))
    ));
}
