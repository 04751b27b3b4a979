use super::reader::{read_from, read_path};
use super::record::RawField;
use std::io::Write;
use tempfile::NamedTempFile;

pub(crate) const NORMAL_ROW: &str = "0,tcp,ftp_data,SF,491,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,2,2,0.00,0.00,0.00,0.00,1.00,0.00,0.00,150,25,0.17,0.03,0.17,0.00,0.00,0.00,0.05,0.00,normal,20";
pub(crate) const NEPTUNE_ROW: &str = "0,tcp,private,S0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,123,6,1.00,1.00,0.00,0.00,0.05,0.07,0.00,255,26,0.10,0.05,0.00,0.00,1.00,1.00,0.00,0.00,neptune,19";
pub(crate) const UDP_ROW: &str = "0,udp,other,SF,146,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,13,1,0.00,0.00,0.00,0.00,0.08,0.15,0.00,255,1,0.00,0.60,0.88,0.00,0.00,0.00,0.00,0.00,normal,15";

#[test]
fn test_read_complete_rows() {
    let input = format!("{}\n{}\n{}\n", NORMAL_ROW, NEPTUNE_ROW, UDP_ROW);
    let read = read_from(input.as_bytes());

    assert_eq!(read.records.len(), 3);
    assert!(read.rejected.is_empty());

    let first = &read.records[0];
    assert_eq!(first.line, 1);
    assert_eq!(first.fields.len(), 41);
    assert_eq!(first.fields[0], RawField::Number(0.0));
    assert_eq!(first.category(1), Some("tcp"));
    assert_eq!(first.category_by_name("service"), Some("ftp_data"));
    assert_eq!(first.fields[4], RawField::Number(491.0));
    assert_eq!(first.label, "normal");
    assert_eq!(first.difficulty, 20);

    assert_eq!(read.records[1].label, "neptune");
    assert_eq!(read.records[2].line, 3);
}

#[test]
fn test_malformed_rows_are_isolated() {
    let short_row = "0,tcp,http,SF,1,2";
    let bad_number = NORMAL_ROW.replacen("491", "lots", 1);
    let nan_row = NORMAL_ROW.replacen("491", "NaN", 1);
    let input = format!(
        "{}\n{}\n{}\n{}\n{}\n",
        NORMAL_ROW, short_row, bad_number, nan_row, NEPTUNE_ROW
    );

    let read = read_from(input.as_bytes());

    assert_eq!(read.records.len(), 2);
    assert_eq!(read.rejected.len(), 3);
    assert_eq!(read.total_lines(), 5);

    assert_eq!(read.rejected[0].line, 2);
    assert!(read.rejected[0].reason.contains("expected 43 fields"));
    assert_eq!(read.rejected[1].line, 3);
    assert!(read.rejected[1].reason.contains("src_bytes"));
    assert_eq!(read.rejected[2].line, 4);

    // Order of accepted rows preserved
    assert_eq!(read.records[0].label, "normal");
    assert_eq!(read.records[1].label, "neptune");
    assert_eq!(read.records[1].line, 5);
}

#[test]
fn test_bad_difficulty_rejected() {
    let row = NORMAL_ROW.replace(",normal,20", ",normal,hard");
    let read = read_from(row.as_bytes());
    assert!(read.records.is_empty());
    assert!(read.rejected[0].reason.contains("difficulty"));
}

#[test]
fn test_read_path() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", NORMAL_ROW).unwrap();
    writeln!(file, "{}", NEPTUNE_ROW).unwrap();

    let read = read_path(file.path()).unwrap();
    assert_eq!(read.records.len(), 2);

    assert!(read_path(std::path::Path::new("/definitely/not/here.txt")).is_err());
}

#[test]
fn test_padding_kept_on_labels_and_categories() {
    use crate::logic::features::layout::binarize_label;

    let row = NORMAL_ROW
        .replacen(",tcp,", ", tcp ,", 1)
        .replacen(",normal,", ", normal ,", 1)
        .replacen(",491,", ", 491 ,", 1);
    let read = read_from(row.as_bytes());
    assert!(read.rejected.is_empty());

    let record = &read.records[0];
    assert_eq!(record.category_by_name("protocol_type"), Some(" tcp "));
    assert_eq!(record.label, " normal ");
    assert_eq!(binarize_label(&record.label), 1);
    // numeric padding is harmless
    assert_eq!(record.fields[4], RawField::Number(491.0));
}
