//! Whole-run properties of the chunked selection driver

use hhww_select::{
    channel::{FhslOptions, FhslTagger, SemileptonicOptions, SemileptonicTagger},
    cutflow::NoCutFlow,
    evgen::EventGenerator,
    run_selection,
    truth::GenInfo,
    EventTable, SelectionError, Tagger,
};

fn signal_events(seed: u64, num_events: usize) -> EventTable {
    let records = EventGenerator::new(seed).with_truth(true).generate(num_events);
    EventTable::from_records(&records)
}

fn signal_taggers() -> Vec<Box<dyn Tagger>> {
    let gen_info = GenInfo { is_signal: true };
    vec![
        Box::new(
            SemileptonicTagger::new(
                SemileptonicOptions {
                    gen_info,
                    ..Default::default()
                },
                false,
            )
            .unwrap(),
        ),
        Box::new(
            FhslTagger::new(
                FhslOptions {
                    gen_info,
                    ..Default::default()
                },
                false,
            )
            .unwrap(),
        ),
    ]
}

#[test]
fn chunk_size_does_not_matter() {
    let events = signal_events(2024, 101);
    for tagger in signal_taggers() {
        let whole = run_selection(tagger.as_ref(), events.clone(), 1000).unwrap();
        for chunk_size in [1, 7, 50] {
            let chunked = run_selection(tagger.as_ref(), events.clone(), chunk_size).unwrap();
            let name = tagger.name();
            assert_eq!(chunked.tagged.events, whole.tagged.events, "{name}");
            assert_eq!(chunked.tagged.category, whole.tagged.category, "{name}");
            assert_eq!(chunked.tagged.pass, whole.tagged.pass, "{name}");
            assert_eq!(chunked.tagged.partition, whole.tagged.partition, "{name}");
            assert_eq!(chunked.tagged.degenerate, whole.tagged.degenerate, "{name}");
            assert_eq!(chunked.cutflow, whole.cutflow, "{name}");
            for (mode, subset) in &whole.tagged.subsets {
                let other = &chunked.tagged.subsets[mode];
                assert_eq!(other.event_ids(), subset.event_ids(), "{name}");
            }
        }
    }
}

#[test]
fn selecting_twice_gives_the_same_answer() {
    for tagger in signal_taggers() {
        let first = tagger
            .select(signal_events(77, 40), &mut NoCutFlow)
            .unwrap();
        let names: Vec<String> = first.events.field_names().map(str::to_owned).collect();
        let second = tagger.select(first.events.clone(), &mut NoCutFlow).unwrap();
        assert_eq!(second.category, first.category);
        assert_eq!(second.pass, first.pass);
        let renamed: Vec<String> = second.events.field_names().map(str::to_owned).collect();
        assert_eq!(renamed, names);
        assert_eq!(second.events, first.events);
    }
}

#[test]
fn prefixed_channels_share_one_table() {
    let fhsl = FhslTagger::new(
        FhslOptions {
            field_prefix: "fhsl_".to_owned(),
            ..Default::default()
        },
        false,
    )
    .unwrap();
    let semileptonic = SemileptonicTagger::new(SemileptonicOptions::default(), false).unwrap();

    let events = EventTable::from_records(&EventGenerator::new(5).generate(30));
    let alone = semileptonic.select(events.clone(), &mut NoCutFlow).unwrap();
    let first = fhsl.select(events, &mut NoCutFlow).unwrap();
    let both = semileptonic.select(first.events, &mut NoCutFlow).unwrap();

    assert_eq!(both.category, alone.category);
    assert_eq!(
        both.events.field("category").unwrap(),
        alone.events.field("category").unwrap()
    );
    assert_eq!(
        both.events.field("fhsl_category").unwrap().as_int().unwrap(),
        &first.category[..]
    );
}

#[test]
fn channels_with_the_same_prefix_do_not_overwrite_each_other() {
    let semileptonic = SemileptonicTagger::new(SemileptonicOptions::default(), false).unwrap();
    let fhsl = FhslTagger::new(FhslOptions::default(), false).unwrap();
    let events = EventTable::from_records(&EventGenerator::new(11).generate(25));

    let first = semileptonic.select(events, &mut NoCutFlow).unwrap();
    let category = first.events.field("category").unwrap().clone();
    match fhsl.select(first.events.clone(), &mut NoCutFlow) {
        Err(SelectionError::NameCollision { owner, writer, .. }) => {
            assert_eq!(owner, "semileptonic");
            assert_eq!(writer, "fhsl");
        }
        other => panic!("Expected a name collision, got {:?}", other.map(|t| t.category)),
    }
    assert_eq!(first.events.field("category").unwrap(), &category);
    assert_eq!(first.events.writer_of("jet_1_deltaR_pho1"), Some("semileptonic"));
}

#[test]
fn missing_input_collection_fails_the_run() {
    let records = EventGenerator::new(8).generate(12);
    let events = EventTable::from_records(&records);
    // Signal taggers need the generator record, which this table lacks
    for tagger in signal_taggers() {
        assert!(run_selection(tagger.as_ref(), events.clone(), 5).is_err());
    }
}
