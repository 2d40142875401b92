//! End-to-end test of the curation sequence over a realistic mixed batch:
//! JSON records in, ranked collapsed rows out.

use chrono::{DateTime, Duration, TimeZone, Utc};

use radar_core::domain::{NormalizedEvent, Window};
use radar_curator::pipeline::curation_config::CurationConfig;
use radar_curator::pipeline::processing::rerank::RankSelection;
use radar_curator::EventCurator;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap()
}

fn iso(days_out: i64) -> String {
    (now() + Duration::days(days_out)).to_rfc3339()
}

fn batch() -> Vec<NormalizedEvent> {
    let records = serde_json::json!([
        // Three-night arena run, fetched out of date order.
        {
            "id": "tm-arena-2", "name": "Pop Star Live", "primary_artist": "Pop Star",
            "venue_name": "Chase Center", "city": "San Francisco", "state": "CA", "country": "US",
            "start_date_time": iso(61), "genre_primary": "Pop", "window": "short_term"
        },
        {
            "id": "tm-arena-1", "name": "Pop Star Live", "primary_artist": "Pop Star",
            "venue_name": "Chase Center", "city": "San Francisco", "state": "CA", "country": "US",
            "start_date_time": iso(60), "genre_primary": "Pop", "window": "short_term"
        },
        {
            "id": "tm-arena-3", "name": "Pop Star Live", "primary_artist": "Pop Star",
            "venue_name": "Chase Center", "city": "San Francisco", "state": "CA", "country": "US",
            "start_date_time": iso(62), "genre_primary": "Pop", "window": "short_term"
        },
        // The same club date fetched twice via overlapping city queries.
        {
            "id": "tm-club-1", "name": "Indie Band", "primary_artist": "Indie Band",
            "venue_name": "The Independent", "city": "San Francisco", "state": "CA", "country": "US",
            "start_date_time": iso(40), "genre_primary": "Indie", "window": "short_term"
        },
        {
            "id": "tm-club-1", "name": "Indie Band", "primary_artist": "Indie Band",
            "venue_name": "The Independent", "city": "San Francisco", "state": "CA", "country": "US",
            "start_date_time": iso(40), "genre_primary": "Indie", "window": "short_term"
        },
        // A small-room show with a garbage timestamp: kept, date treated absent.
        {
            "id": "tm-small-1", "name": "Quiet Act", "primary_artist": "Quiet Act",
            "venue_name": "Someone's Garage", "city": "Santa Cruz", "state": "CA", "country": "US",
            "start_date_time": "TBD", "genre_primary": "Folk", "window": "short_term"
        },
        // A far-out stadium announcement; must never mix with short_term.
        {
            "id": "tm-far-1", "name": "Legacy Act Farewell Tour", "primary_artist": "Legacy Act",
            "venue_name": "Oakland Arena", "city": "Oakland", "state": "CA", "country": "US",
            "start_date_time": iso(150), "genre_primary": "Rock", "window": "far_out"
        }
    ]);

    records
        .as_array()
        .unwrap()
        .iter()
        .map(|r| NormalizedEvent::from_json(r.clone()).unwrap())
        .collect()
}

#[test]
fn full_pipeline_collapses_ranks_and_partitions() {
    let curator = EventCurator::new();
    let events = batch();

    let selections = RankSelection::parse_batch(
        r#"[
            {"id": "tm-club-1", "keep": true, "priority": 9, "reason": "buzzy local release show"},
            {"id": "tm-arena-1", "keep": true, "priority": 7, "reason": "biggest pop tour of the spring"},
            {"id": "tm-small-1", "keep": false}
        ]"#,
    )
    .unwrap();

    let short = curator.curate_window(Window::ShortTerm, &events, &selections, now());

    // The duplicate club fetch merged, the run collapsed, the dropped show gone.
    assert_eq!(short.len(), 2);

    let club = &short[0];
    assert_eq!(club.representative.event.id, "tm-club-1");
    assert_eq!(club.priority, Some(9));
    assert!(!club.multi_night);
    assert_eq!(club.change_key(), "tm-club-1");

    let run = &short[1];
    assert_eq!(run.priority, Some(7));
    assert_eq!(run.night_count, 3);
    assert!(run.multi_night);
    assert_eq!(
        run.member_ids,
        vec!["tm-arena-1", "tm-arena-2", "tm-arena-3"]
    );
    // Representative is the earliest night, range spans the run.
    assert_eq!(run.representative.event.id, "tm-arena-1");
    assert_eq!(run.date_start, Some(now() + Duration::days(60)));
    assert_eq!(run.date_end, Some(now() + Duration::days(62)));
    assert_eq!(run.change_key(), "tm-arena-1|tm-arena-2|tm-arena-3");

    // Group ids are deterministic across runs of the pipeline.
    let again = curator.curate_window(Window::ShortTerm, &events, &selections, now());
    assert_eq!(run.group_id(), again[1].group_id());
}

#[test]
fn far_out_window_falls_back_to_heuristic_order() {
    let curator = EventCurator::new();
    let events = batch();

    let far = curator.curate_window(Window::FarOut, &events, &[], now());
    assert_eq!(far.len(), 1);
    assert_eq!(far[0].representative.event.id, "tm-far-1");
    assert_eq!(far[0].priority, None);
    // Scores stay clamped to the unit interval.
    assert!((0.0..=1.0).contains(&far[0].score()));
}

#[test]
fn garbage_timestamp_degrades_without_losing_the_record() {
    let events = batch();
    let small = events.iter().find(|e| e.id == "tm-small-1").unwrap();
    assert_eq!(small.start_date_time, None);

    // With no external verdict the show still competes heuristically.
    let curator = EventCurator::new();
    let short = curator.curate_window(Window::ShortTerm, &events, &[], now());
    assert!(short
        .iter()
        .any(|c| c.representative.event.id == "tm-small-1"));
}

#[test]
fn tuned_config_flows_through_the_pipeline() {
    let config = CurationConfig::from_toml_str(
        r#"
        top_k = 1

        [[scoring.venue_tiers]]
        keyword = "someone's garage"
        weight = 0.99
        "#,
    )
    .unwrap();
    let curator = EventCurator::with_config(config);

    let events = batch();
    let short = curator.curate_window(Window::ShortTerm, &events, &[], now());
    assert_eq!(short.len(), 1);
}
