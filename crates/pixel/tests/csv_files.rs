//! On-disk loading tests for both CSV representations.

use std::fs;
use std::io::Write;

use renderflow_pixel::{CsvFormat, Pixel, PixelBuffer, PixelCsvError};

fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = fs::File::create(&path).expect("create csv");
    file.write_all(content.as_bytes()).expect("write csv");
    path
}

#[test]
fn standard_format_round_trips_written_pixels() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut content = String::from("x,y,r,g,b,a\n");
    for y in 0..4u32 {
        for x in 0..4u32 {
            content.push_str(&format!("{x},{y},{},{},{},255\n", x * 10, y * 10, 128));
        }
    }
    let path = write_file(&dir, "frame.csv", &content);

    let buffer = PixelBuffer::load(&path).expect("load standard csv");
    assert_eq!(buffer.format(), CsvFormat::Standard);
    assert!(buffer.verify_dimensions(4, 4));
    assert_eq!(buffer.pixel(2, 3), Some(Pixel::rgba(20, 30, 128, 255)));
    assert_eq!(buffer.pixel(4, 0), None);
}

#[test]
fn standard_format_defaults_missing_alpha_to_opaque() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_file(&dir, "frame.csv", "x,y,r,g,b\n0,0,10,20,30\n");

    let buffer = PixelBuffer::load(&path).expect("load");
    assert_eq!(buffer.pixel(0, 0), Some(Pixel::rgba(10, 20, 30, 255)));
}

#[test]
fn row_major_format_parses_both_token_styles() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_file(&dir, "frame.csv", "R255G128B000,#1f1f1f\nR000G000B000,#ff8000\n");

    let buffer = PixelBuffer::load(&path).expect("load row-major csv");
    assert_eq!(buffer.format(), CsvFormat::RowMajor);
    assert!(buffer.verify_dimensions(2, 2));
    assert_eq!(buffer.pixel(0, 0), Some(Pixel::rgb(255, 128, 0)));
    assert_eq!(buffer.pixel(1, 0), Some(Pixel::rgb(31, 31, 31)));
    assert_eq!(buffer.pixel(1, 1), Some(Pixel::rgb(255, 128, 0)));
}

#[test]
fn comment_lines_and_blanks_are_skipped() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_file(&dir, "frame.csv", "# capture metadata\n\nx,y,r,g,b\n0,0,1,2,3\n");

    let buffer = PixelBuffer::load(&path).expect("load");
    assert_eq!(buffer.pixel_count(), 1);
}

#[test]
fn empty_and_unrecognized_files_are_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");

    let empty = write_file(&dir, "empty.csv", "# nothing here\n");
    assert!(matches!(PixelBuffer::load(&empty), Err(PixelCsvError::Empty(_))));

    let garbage = write_file(&dir, "garbage.csv", "not a pixel file\n");
    assert!(matches!(PixelBuffer::load(&garbage), Err(PixelCsvError::UnrecognizedFormat(_))));

    let missing = dir.path().join("missing.csv");
    assert!(matches!(PixelBuffer::load(&missing), Err(PixelCsvError::Io { .. })));
}

#[test]
fn malformed_rows_name_the_line() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_file(&dir, "frame.csv", "x,y,r,g,b\n0,0,10,20\n");

    match PixelBuffer::load(&path) {
        Err(PixelCsvError::MalformedRow { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected malformed row error, got {other:?}"),
    }
}

#[test]
fn is_mostly_empty_holds_exactly_at_ninety_percent() {
    let dir = tempfile::tempdir().expect("tempdir");

    // 10x1 grid: 9 black pixels, 1 bright pixel => exactly 90% dark.
    let mut at_boundary = String::from("x,y,r,g,b\n");
    for x in 0..9u32 {
        at_boundary.push_str(&format!("{x},0,0,0,0\n"));
    }
    at_boundary.push_str("9,0,200,200,200\n");
    let path = write_file(&dir, "boundary.csv", &at_boundary);
    let buffer = PixelBuffer::load(&path).expect("load");
    assert!(buffer.is_mostly_empty(30));

    // 10x1 grid: 8 black pixels, 2 bright => 80% dark, not mostly empty.
    let mut below = String::from("x,y,r,g,b\n");
    for x in 0..8u32 {
        below.push_str(&format!("{x},0,0,0,0\n"));
    }
    below.push_str("8,0,200,200,200\n9,0,200,200,200\n");
    let path = write_file(&dir, "below.csv", &below);
    let buffer = PixelBuffer::load(&path).expect("load");
    assert!(!buffer.is_mostly_empty(30));
}

#[test]
fn analysis_queries_agree_with_the_written_scene() {
    let dir = tempfile::tempdir().expect("tempdir");

    // 4x4 grid: a 2x2 orange block in the corner, dark grey elsewhere.
    let mut content = String::from("x,y,r,g,b,a\n");
    for y in 0..4u32 {
        for x in 0..4u32 {
            if x < 2 && y < 2 {
                content.push_str(&format!("{x},{y},255,128,0,255\n"));
            } else {
                content.push_str(&format!("{x},{y},45,45,45,255\n"));
            }
        }
    }
    let path = write_file(&dir, "scene.csv", &content);
    let buffer = PixelBuffer::load(&path).expect("load");

    assert_eq!(buffer.count_pixels(Pixel::rgb(255, 128, 0)), 4);
    assert_eq!(buffer.count_pixels_with_tolerance(Pixel::rgb(250, 130, 2), 5), 4);
    assert_eq!(buffer.count_non_black(50), 4);
    assert_eq!(buffer.average_color(0, 0, 2, 2), Pixel::rgb(255, 128, 0));
    assert_eq!(buffer.color_histogram().len(), 2);
    assert!(buffer.has_significant_variation(50));
    assert!((buffer.opacity_percentage() - 100.0).abs() < f64::EPSILON);
    assert!(buffer.validate());

    let stats = buffer.brightness_stats();
    assert_eq!(stats.min, Pixel::rgb(45, 45, 45).luminance());
    assert_eq!(stats.max, Pixel::rgb(255, 128, 0).luminance());
}
