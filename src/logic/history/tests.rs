use super::*;
use crate::logic::context::{ScanLabel, ScanReport};
use crate::logic::features::Protocol;
use chrono::Utc;
use tempfile::tempdir;

fn report(probability: f64, protocol: Protocol) -> ScanReport {
    ScanReport {
        id: uuid::Uuid::new_v4().to_string(),
        label: if probability > 0.5 { ScanLabel::Malicious } else { ScanLabel::Normal },
        probability,
        timestamp: Utc::now(),
        protocol,
        total_bytes: 1200.0,
        unknown_categories: Vec::new(),
        degraded_columns: Vec::new(),
    }
}

#[test]
fn test_newest_first_and_bounded() {
    let mut history = ScanHistory::new(3);
    for p in [0.1, 0.2, 0.3, 0.4] {
        history.record(report(p, Protocol::Tcp));
    }

    assert_eq!(history.len(), 3);
    let probs: Vec<f64> = history.iter().map(|r| r.probability).collect();
    assert_eq!(probs, vec![0.4, 0.3, 0.2]);
    assert_eq!(history.recent(1)[0].probability, 0.4);
}

#[test]
fn test_empty_summary() {
    let summary = ScanHistory::new(10).summary();
    assert_eq!(summary.total_scans, 0);
    assert_eq!(summary.malicious, 0);
    assert_eq!(summary.last_risk, 0.0);
    assert_eq!(summary.risk_label, RiskLabel::Safe);
    assert!(summary.status_distribution.is_empty());
}

#[test]
fn test_summary_counts_and_risk() {
    let mut history = ScanHistory::new(10);
    history.record(report(0.03, Protocol::Http));
    history.record(report(0.95, Protocol::Tcp));
    history.record(report(0.97, Protocol::Tcp));

    let summary = history.summary();
    assert_eq!(summary.total_scans, 3);
    assert_eq!(summary.malicious, 2);
    assert_eq!(summary.last_risk, 0.97);
    assert_eq!(summary.risk_label, RiskLabel::Critical);
    assert_eq!(summary.status_distribution["MALICIOUS"], 2);
    assert_eq!(summary.status_distribution["NORMAL"], 1);
    assert_eq!(summary.protocol_distribution["tcp"], 2);
    assert_eq!(summary.protocol_distribution["http"], 1);

    history.record(report(0.5, Protocol::Udp));
    // exactly 50% is not above the line
    assert_eq!(history.summary().risk_label, RiskLabel::Safe);
}

#[test]
fn test_writer_roundtrip_and_reopen() {
    let dir = tempdir().unwrap();
    let first = report(0.9, Protocol::Tcp);
    let second = report(0.1, Protocol::Icmp);

    {
        let writer = HistoryWriter::new(dir.path()).unwrap();
        writer.append(&first).unwrap();
    }
    // A new writer continues the latest segment
    let writer = HistoryWriter::new(dir.path()).unwrap();
    writer.append(&second).unwrap();

    let ids: Vec<String> = writer.load_all().unwrap().into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);

    let (segments, _, latest) = writer.get_stats().unwrap();
    assert_eq!(segments, 1);
    assert!(latest.starts_with("scans-"));
}

#[test]
fn test_writer_rotates_by_size() {
    let dir = tempdir().unwrap();
    let writer = HistoryWriter::with_max_size(dir.path(), 1).unwrap();

    let written: Vec<ScanReport> = [0.1, 0.2, 0.3].iter().map(|p| report(*p, Protocol::Udp)).collect();
    for r in &written {
        writer.append(r).unwrap();
    }

    let (segments, _, _) = writer.get_stats().unwrap();
    assert_eq!(segments, 3);

    let ids: Vec<String> = writer.load_all().unwrap().into_iter().map(|r| r.id).collect();
    let expected: Vec<String> = written.into_iter().map(|r| r.id).collect();
    assert_eq!(ids, expected);
}

#[test]
fn test_writer_skips_garbage_lines() {
    let dir = tempdir().unwrap();
    let writer = HistoryWriter::new(dir.path()).unwrap();
    writer.append(&report(0.2, Protocol::Tcp)).unwrap();

    let (_, _, latest) = writer.get_stats().unwrap();
    let path = dir.path().join(latest);
    let mut contents = std::fs::read_to_string(&path).unwrap();
    contents.push_str("{not json\n\n");
    std::fs::write(&path, contents).unwrap();

    assert_eq!(writer.load_all().unwrap().len(), 1);
}
