use imgapp::*;
use pretty_assertions::assert_eq;
use std::fs;

fn pattern(width: u32, height: u32) -> Vec<u8> {
    (0..width * height * 4)
        .map(|i| (i.wrapping_mul(37) ^ (i >> 3)) as u8)
        .collect()
}

#[test]
fn test_round_trip_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();

    for (width, height) in [(1, 1), (10, 10), (7, 3), (1, 64), (33, 1)] {
        let input = dir.path().join(format!("in_{width}x{height}.rgba"));
        let output = dir.path().join(format!("out_{width}x{height}.rgba"));
        let bytes = pattern(width, height);
        fs::write(&input, &bytes).unwrap();

        let grid = read_raw(&input, width, height).unwrap();
        assert_eq!(grid.len(), (width * height) as usize);
        write_raw(&grid, &output).unwrap();

        assert_eq!(
            fs::read(&output).unwrap(),
            bytes,
            "round trip mismatch for {width}x{height}"
        );
    }
}

#[test]
fn test_read_raw_truncated_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("short.rgba");
    fs::write(&input, vec![0u8; 399]).unwrap();

    let result = read_raw(&input, 10, 10);
    assert!(
        matches!(
            result,
            Err(ImgError::TruncatedInput {
                expected: 400,
                actual: 399
            })
        ),
        "got {result:?}"
    );
}

#[test]
fn test_read_raw_trailing_bytes_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("long.rgba");
    let mut bytes = pattern(4, 4);
    bytes.extend_from_slice(b"trailer");
    fs::write(&input, &bytes).unwrap();

    let grid = read_raw(&input, 4, 4).unwrap();
    assert_eq!(grid.to_rgba_bytes(), bytes[..64].to_vec());
}

#[test]
fn test_read_raw_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("missing.rgba");

    match read_raw(&input, 2, 2) {
        Err(ImgError::Io { path, .. }) => assert_eq!(path, input),
        other => panic!("expected I/O error, got {other:?}"),
    }
}

#[test]
fn test_write_raw_into_missing_directory_leaves_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("no_such_dir").join("out.rgba");
    let grid = PixelGrid::filled(2, 2, [1, 2, 3, 4]).unwrap();

    match write_raw(&grid, &output) {
        Err(ImgError::Io { path, .. }) => assert_eq!(path, output),
        other => panic!("expected an Io error, got {other:?}"),
    }
    assert!(!output.exists());
}

#[test]
fn test_write_raw_replaces_existing_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.rgba");
    fs::write(&output, b"stale contents that are longer than the grid").unwrap();

    let grid = PixelGrid::filled(1, 2, [9, 8, 7, 6]).unwrap();
    write_raw(&grid, &output).unwrap();

    assert_eq!(fs::read(&output).unwrap(), vec![9, 8, 7, 6, 9, 8, 7, 6]);
    // only the output remains, no temporary siblings
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_every_channel_in_range() {
    let bytes = pattern(5, 5);
    let grid = read_raw_from(bytes.as_slice(), 5, 5).unwrap();
    assert_eq!(grid.pixels().len(), 25);
    for (i, px) in grid.pixels().iter().enumerate() {
        assert_eq!(px.as_slice(), &bytes[i * 4..i * 4 + 4]);
    }
}
