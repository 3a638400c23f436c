//! End-to-end preprocessing: impute, split, scale, oversample.

use diabrisk_prep::{SmoteConfig, StandardScaler, StratifiedSplit, TrainTestSplit, fill_with_column_means};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn raw_dataset() -> (Vec<Vec<Option<f64>>>, Vec<usize>) {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let mut rows = Vec::new();
    let mut labels = Vec::new();
    for i in 0..250 {
        let label = usize::from(i % 5 == 0);
        let row = (0..4)
            .map(|c| {
                if rng.gen_bool(0.05) {
                    None
                } else {
                    Some(rng.r#gen::<f64>() * 10.0 + (label * c) as f64)
                }
            })
            .collect();
        rows.push(row);
        labels.push(label);
    }
    (rows, labels)
}

#[test]
fn training_side_is_balanced_and_test_side_untouched() {
    let (raw, labels) = raw_dataset();
    let (features, _) = fill_with_column_means(&raw).unwrap();
    assert!(features.iter().flatten().all(|v| v.is_finite()));

    let split = StratifiedSplit::new(0.2).unwrap().split(&labels).unwrap();
    assert_eq!(split.test.len(), 50);

    let x_train = TrainTestSplit::select(&features, &split.train);
    let y_train = TrainTestSplit::select(&labels, &split.train);
    let y_test = TrainTestSplit::select(&labels, &split.test);
    assert_eq!(y_test.iter().filter(|&&l| l == 1).count(), 10);

    let names: Vec<String> = (0..4).map(|c| format!("c{c}")).collect();
    let scaler = StandardScaler::fit(&x_train, &names).unwrap();
    let x_train = scaler.transform(&x_train).unwrap();

    let balanced = SmoteConfig::default().fit_resample(&x_train, &y_train).unwrap();
    let negatives = balanced.labels.iter().filter(|&&l| l == 0).count();
    let positives = balanced.labels.iter().filter(|&&l| l == 1).count();
    assert_eq!(negatives, 160);
    assert_eq!(positives, 160);
    assert_eq!(balanced.n_synthetic, 160 - 40);
}
