use std::sync::{Arc, Mutex};

use viper_core::search::find_matches;
use viper_core::{EditorEvent, EventBus, LatestJob, SearchOptions, SearchResult, TextCore};

#[test]
fn test_search_job_result_is_applied_on_owner_thread() {
    let mut bus = EventBus::new();
    let notices = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&notices);
    bus.subscribe(move |event| {
        if let EditorEvent::SearchFinished { matches } = event {
            sink.lock().unwrap().push(*matches);
        }
    });

    let mut core = TextCore::new("fn a() {}\nfn b() {}\n");
    let mut job = LatestJob::new("search");

    // A superseded query never reaches the core.
    let snapshot = core.text();
    job.spawn(move || find_matches(&snapshot, "zzz", SearchOptions::default()))
        .unwrap();
    let snapshot = core.text();
    let sender = bus.sender();
    job.spawn(move || {
        let matches = find_matches(&snapshot, "fn", SearchOptions::default());
        sender.send(EditorEvent::SearchFinished {
            matches: matches.len(),
        });
        matches
    })
    .unwrap();

    let matches = job.wait().unwrap();
    let result = SearchResult::new(matches, "fn", None, false);
    core.select_current(&result);
    assert_eq!(core.selection().range(), 0..2);

    bus.dispatch();
    assert_eq!(*notices.lock().unwrap(), vec![2]);
}
