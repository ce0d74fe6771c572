use gauge_reader::classify::DigitPrediction;
use gauge_reader::reading::{assemble, validate, ValidateOptions};
use gauge_reader::state::LastKnownGoodStore;
use gauge_reader::Verdict;

fn confident(digits: &[u8]) -> Vec<DigitPrediction> {
    digits
        .iter()
        .map(|&d| DigitPrediction {
            digit: d,
            confidence: 1.0,
        })
        .collect()
}

#[test]
fn accepted_values_gate_the_next_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let store = LastKnownGoodStore::new(dir.path().join("last_known_good.json"));
    assert_eq!(store.load().unwrap(), None);

    // first cycle: nothing on record, any confident value passes
    let first = assemble(confident(&[0, 0, 7, 4, 5, 2, 3]), 2);
    let verdict = validate(&first, store.load().unwrap(), &ValidateOptions::default(), false);
    let Verdict::Accepted { value } = verdict else {
        panic!("first cycle should be accepted, got {verdict:?}");
    };
    store.save(value).unwrap();

    // a decreased reading next poll is rejected, the store keeps the old value
    let decreased = assemble(confident(&[0, 0, 7, 4, 5, 2, 2]), 2);
    let verdict = validate(
        &decreased,
        store.load().unwrap(),
        &ValidateOptions::default(),
        false,
    );
    assert!(!verdict.is_accepted());
    assert_eq!(store.load().unwrap(), Some(745.23));

    // a plausible increment is accepted and replaces it
    let increased = assemble(confident(&[0, 0, 7, 4, 6, 9, 9]), 2);
    let verdict = validate(
        &increased,
        store.load().unwrap(),
        &ValidateOptions::default(),
        false,
    );
    let Verdict::Accepted { value } = verdict else {
        panic!("plausible increment should be accepted, got {verdict:?}");
    };
    store.save(value).unwrap();
    assert_eq!(store.load().unwrap(), Some(746.99));
}
