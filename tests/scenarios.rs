//! End-to-end selection of hand-written events, loaded from JSON

use hhww_select::{
    channel::{FhslOptions, FhslTagger, SemileptonicOptions, SemileptonicTagger},
    cutflow::CutFlow,
    numeric::{is_dummy, DUMMY_VALUE},
    EventTable, Tagger,
};
use serde_json::json;
use std::fs;

/// Diphoton candidate whose photons both pass identification
fn diphoton(pt: f64) -> serde_json::Value {
    json!({
        "pt": pt, "eta": 0.0, "phi": 0.0, "mass": 125.0,
        "LeadPhoton": {"pt": 90.0, "eta": 0.2, "phi": 0.1, "mvaID": 0.9},
        "SubleadPhoton": {"pt": 50.0, "eta": -0.2, "phi": -0.1, "mvaID": 0.7}
    })
}

fn load(events: serde_json::Value) -> EventTable {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.json");
    fs::write(&path, events.to_string()).unwrap();
    EventTable::from_json_file(&path).unwrap()
}

#[test]
fn resolved_semileptonic_event_with_boosted_diphoton() {
    let events = load(json!([{
        "event": 100,
        "electrons": [{
            "pt": 35.0, "eta": 1.0, "phi": 2.5, "dxy": 0.01, "dz": 0.02,
            "mvaFall17V2Iso_WP80": false, "mvaFall17V2Iso_WP90": true
        }],
        "jets": [
            {"pt": 45.0, "eta": -1.2, "phi": -2.0, "jetId": 6},
            {"pt": 38.0, "eta": -0.4, "phi": 2.9, "jetId": 2},
            {"pt": 60.0, "eta": 0.1, "phi": 0.1, "jetId": 6}
        ],
        "fatjets": [
            {"pt": 250.0, "eta": -1.0, "phi": -2.5, "deepTagMD_WvsQCD": 0.1}
        ],
        "diphoton": diphoton(150.0)
    }]));

    let mut cutflow = CutFlow::new();
    let tagger = SemileptonicTagger::new(SemileptonicOptions::default(), false).unwrap();
    let tagged = tagger.select(events, &mut cutflow).unwrap();

    assert_eq!(tagged.category, vec![2]);
    assert_eq!(tagged.pass, vec![true]);
    let events = &tagged.events;
    // The third jet overlaps with the photons
    assert_eq!(events.field("nGoodAK4jets").unwrap().as_int().unwrap(), &[2]);
    assert_eq!(events.field("jet_1_pt").unwrap().as_float().unwrap(), &[45.]);
    assert_eq!(events.field("jet_2_pt").unwrap().as_float().unwrap(), &[38.]);
    assert!(is_dummy(events.field("jet_3_pt").unwrap().as_float().unwrap()[0]));
    // The fat jet is selected but not W-tagged
    assert_eq!(
        events.collection("SelectedFatJet_from_event").unwrap().counts(),
        vec![1]
    );
    assert_eq!(
        events.field("fatjet_W_1_pt").unwrap().as_float().unwrap(),
        &[DUMMY_VALUE]
    );
    assert_eq!(
        events.field("electron_1_pt").unwrap().as_float().unwrap(),
        &[35.]
    );
    assert_eq!(
        cutflow.get("SelectedJet_from_event_dr_photons").unwrap().num_passed,
        2
    );
}

#[test]
fn boosted_rule_wins_over_resolved_rule() {
    let jet = |phi: f64| json!({"pt": 40.0, "eta": 1.8, "phi": phi, "jetId": 6});
    let events = load(json!([{
        "event": 200,
        "jets": [jet(-2.0), jet(-1.2), jet(2.0), jet(2.8)],
        "fatjets": [{
            "pt": 420.0, "eta": -1.5, "phi": 3.0,
            "inclParTMDV1_HWW4q3qvsQCD": 0.35
        }],
        "diphoton": diphoton(120.0)
    }]));

    let tagger = FhslTagger::new(FhslOptions::default(), false).unwrap();
    let tagged = tagger.select(events, &mut CutFlow::new()).unwrap();

    let masks: Vec<_> = tagged.rule_masks.iter().map(|r| r.mask[0]).collect();
    assert_eq!(masks, vec![false, true, true]);
    assert_eq!(tagged.category, vec![1]);
    let events = &tagged.events;
    assert_eq!(
        events.field("nGood_H_fatjets").unwrap().as_int().unwrap(),
        &[1]
    );
    assert_eq!(events.field("nGoodAK4jets").unwrap().as_int().unwrap(), &[4]);
}

#[test]
fn event_without_any_jet() {
    let events = load(json!([{ "event": 300, "diphoton": diphoton(80.0) }]));

    for tagger in [
        Box::new(SemileptonicTagger::new(SemileptonicOptions::default(), false).unwrap())
            as Box<dyn Tagger>,
        Box::new(FhslTagger::new(FhslOptions::default(), false).unwrap()),
    ] {
        let tagged = tagger.select(events.clone(), &mut CutFlow::new()).unwrap();
        let events = &tagged.events;
        assert_eq!(tagged.category, vec![0], "{}", tagger.name());
        assert_eq!(events.field("nGoodAK4jets").unwrap().as_int().unwrap(), &[0]);
        let jet_fields: Vec<_> = events
            .field_names()
            .filter(|name| name.starts_with("jet_"))
            .collect();
        // Semileptonic jets also carry their distance to both photons
        let num_attributes = if tagger.name() == "semileptonic" { 8 } else { 6 };
        assert_eq!(jet_fields.len(), 7 * num_attributes);
        for name in jet_fields {
            let values = events.field(name).unwrap().as_float().unwrap();
            assert!(values.iter().all(|&x| is_dummy(x)), "{name}");
        }
        assert!(tagged
            .degenerate
            .iter()
            .any(|report| report.collection.starts_with("SelectedJet")));
    }
}
