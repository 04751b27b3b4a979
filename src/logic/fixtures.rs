//! Shared test fixtures: a small training file, fitted encoders and a
//! hand-built forest that behaves like a model trained on NSL-KDD.

use std::path::Path;

use crate::logic::dataset::{read_from, RawRecord};
use crate::logic::encoder::EncoderStore;
use crate::logic::features::normalizer::fit_encoders;
use crate::logic::features::layout::feature_index;
use crate::logic::model::forest::{ForestModel, Tree};

pub const TRAIN_ROWS: &str = "\
0,tcp,ftp_data,SF,491,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,2,2,0.00,0.00,0.00,0.00,1.00,0.00,0.00,150,25,0.17,0.03,0.17,0.00,0.00,0.00,0.05,0.00,normal,20
0,udp,other,SF,146,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,13,1,0.00,0.00,0.00,0.00,0.08,0.15,0.00,255,1,0.00,0.60,0.88,0.00,0.00,0.00,0.00,0.00,normal,15
0,tcp,private,S0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,123,6,1.00,1.00,0.00,0.00,0.05,0.07,0.00,255,26,0.10,0.05,0.00,0.00,1.00,1.00,0.00,0.00,neptune,19
0,tcp,http,SF,232,8153,0,0,0,0,0,1,0,0,0,0,0,0,0,0,0,0,5,5,0.20,0.20,0.00,0.00,1.00,0.00,0.00,30,255,1.00,0.00,0.03,0.04,0.03,0.01,0.00,0.01,normal,21
0,icmp,eco_i,REJ,18,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,1,1,0.00,0.00,1.00,1.00,1.00,0.00,0.00,1,9,1.00,0.00,1.00,0.11,0.00,0.00,0.00,0.00,ipsweep,18
";

pub fn train_records() -> Vec<RawRecord> {
    read_from(TRAIN_ROWS.as_bytes()).records
}

/// Encoders fitted on `TRAIN_ROWS` and persisted into `dir`
pub fn fitted_store(dir: &Path) -> EncoderStore {
    let mut store = EncoderStore::new(dir);
    fit_encoders(&mut store, &train_records()).unwrap();
    store
}

fn idx(name: &str) -> i32 {
    feature_index(name).unwrap() as i32
}

/// Leaf marker used by the flat tree arrays
const LEAF: i32 = -1;

/// Three stumps over the SYN-error / service-rate columns.
///
/// SYN-flood vectors (serror_rate 1.0, srv_serror_rate 1.0, same_srv_rate 0)
/// land on attack leaves; well-behaved flows on normal leaves.
pub fn syn_flood_forest() -> ForestModel {
    let stump = |feature: i32, threshold: f64, low: f64, high: f64| Tree {
        children_left: vec![1, LEAF, LEAF],
        children_right: vec![2, LEAF, LEAF],
        feature: vec![feature, LEAF, LEAF],
        threshold: vec![threshold, 0.0, 0.0],
        value: vec![0.5, low, high],
    };

    ForestModel::new(vec![
        stump(idx("serror_rate"), 0.5, 0.02, 0.97),
        stump(idx("srv_serror_rate"), 0.5, 0.05, 0.99),
        // same_srv_rate high → normal
        stump(idx("same_srv_rate"), 0.5, 0.9, 0.03),
    ])
    .unwrap()
}
