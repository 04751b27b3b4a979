use super::store::{artifact_path, EncoderStore};
use super::Encoded;
use crate::error::NidsError;
use std::fs;
use tempfile::tempdir;

fn fitted_store(dir: &std::path::Path) -> EncoderStore {
    let mut store = EncoderStore::new(dir);
    store.fit("protocol_type", ["tcp", "udp", "icmp"]).unwrap();
    store.fit("service", ["http", "private", "ftp_data"]).unwrap();
    store.fit("flag", ["SF", "S0", "REJ"]).unwrap();
    store
}

#[test]
fn test_fit_persists_and_reloads() {
    let dir = tempdir().unwrap();
    let store = fitted_store(dir.path());

    assert!(store.exists("protocol_type"));
    assert!(artifact_path(dir.path(), "flag").is_file());

    // A second process sees the same codes
    let reopened = EncoderStore::open(dir.path()).unwrap();
    for value in ["tcp", "udp", "icmp"] {
        assert_eq!(
            store.transform("protocol_type", value).unwrap(),
            reopened.transform("protocol_type", value).unwrap()
        );
    }
    assert_eq!(reopened.transform("flag", "SF").unwrap(), Encoded::Known(2));
}

#[test]
fn test_unseen_value_is_unknown_not_error() {
    let dir = tempdir().unwrap();
    let store = fitted_store(dir.path());

    assert_eq!(store.transform("protocol_type", "http").unwrap(), Encoded::Unknown);
    assert_eq!(store.transform("flag", "RSTR").unwrap(), Encoded::Unknown);
}

#[test]
fn test_missing_encoder_is_fatal() {
    let dir = tempdir().unwrap();
    let mut store = EncoderStore::new(dir.path());
    store.fit("protocol_type", ["tcp"]).unwrap();

    let err = EncoderStore::open(dir.path()).unwrap_err();
    assert!(err.is_unavailable());
    assert!(matches!(err, NidsError::MissingArtifact { .. }));

    // Transform against an attribute that was never loaded
    let err = store.transform("service", "http").unwrap_err();
    assert!(matches!(err, NidsError::MissingArtifact { .. }));
}

#[test]
fn test_open_partial_reports_missing() {
    let dir = tempdir().unwrap();
    let mut store = EncoderStore::new(dir.path());
    store.fit("protocol_type", ["tcp"]).unwrap();
    store.fit("flag", ["SF"]).unwrap();

    let (partial, missing) = EncoderStore::open_partial(dir.path()).unwrap();
    assert_eq!(missing, vec!["service"]);
    assert!(!partial.is_complete());
    assert!(partial.get("flag").is_some());
}

#[test]
fn test_refit_overwrites_mapping() {
    let dir = tempdir().unwrap();
    let mut store = fitted_store(dir.path());
    assert_eq!(store.transform("flag", "S0").unwrap(), Encoded::Known(1));

    store.fit("flag", ["S0", "OTH"]).unwrap();
    assert_eq!(store.transform("flag", "S0").unwrap(), Encoded::Known(1));
    assert_eq!(store.transform("flag", "SF").unwrap(), Encoded::Unknown);

    let reopened = EncoderStore::open(dir.path()).unwrap();
    assert_eq!(reopened.get("flag").unwrap().classes(), &["OTH", "S0"]);
}

#[test]
fn test_no_temp_file_left_behind() {
    let dir = tempdir().unwrap();
    fitted_store(dir.path());

    let leftovers: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().map_or(false, |e| e == "tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn test_numeric_attribute_rejected() {
    let dir = tempdir().unwrap();
    let mut store = EncoderStore::new(dir.path());
    let err = store.fit("duration", ["0"]).unwrap_err();
    assert!(matches!(err, NidsError::UnknownAttribute(_)));
}

#[test]
fn test_tampered_artifact_rejected() {
    let dir = tempdir().unwrap();
    fitted_store(dir.path());

    let path = artifact_path(dir.path(), "service");
    let text = fs::read_to_string(&path).unwrap();
    fs::write(&path, text.replace("private", "privat3")).unwrap();

    let err = EncoderStore::open(dir.path()).unwrap_err();
    assert!(matches!(err, NidsError::InvalidArtifact { .. }));
}

#[test]
fn test_artifact_for_wrong_attribute_rejected() {
    let dir = tempdir().unwrap();
    fitted_store(dir.path());

    fs::copy(
        artifact_path(dir.path(), "flag"),
        artifact_path(dir.path(), "service"),
    )
    .unwrap();

    let mut store = EncoderStore::new(dir.path());
    assert!(store.load("service").is_err());
}
