//! History store integration tests, run against a real sqlite file in a
//! temp dir so transactions and eviction behave exactly as in production.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use clipd_core::classify::{classify, Captured};
use clipd_core::escape;
use clipd_core::policy::{Blacklist, MatchRule};
use clipd_core::snapshot::{RawContent, Snapshot};
use clipd_infra::{HistoryStore, ImageCache};

const NO_LIMIT: u64 = u64::MAX;

struct TestStore {
    store: HistoryStore,
    image_dir: PathBuf,
    // Held for its Drop: removes the database and cache files.
    _dir: TempDir,
}

fn open_store(max_entries: i64, blacklist: &[&str]) -> TestStore {
    let dir = tempfile::tempdir().expect("creating temp dir");
    let db_path = dir.path().join("history.db");
    let image_dir = dir.path().join("images");
    let patterns: Vec<String> = blacklist.iter().map(|s| s.to_string()).collect();

    let store = HistoryStore::open_at(
        &db_path.to_string_lossy(),
        ImageCache::new(image_dir.clone()),
        max_entries,
        Blacklist::new(&patterns, MatchRule::Exact),
    )
    .expect("opening test store");

    TestStore {
        store,
        image_dir,
        _dir: dir,
    }
}

fn text(payload: &str) -> Captured {
    classify(Snapshot::text(payload), NO_LIMIT).expect("text should classify")
}

fn text_from(payload: &str, source_app: &str) -> Captured {
    let snapshot = Snapshot::text(payload).with_source(Some(source_app.to_string()));
    classify(snapshot, NO_LIMIT).expect("text should classify")
}

fn image(bytes: &[u8]) -> Captured {
    let snapshot = Snapshot {
        content: RawContent::ImagePng(bytes.to_vec()),
        source_app: None,
    };
    classify(snapshot, NO_LIMIT).expect("image should classify")
}

fn payloads(store: &HistoryStore) -> Vec<String> {
    store
        .list(None)
        .expect("listing entries")
        .into_iter()
        .map(|e| e.payload)
        .collect()
}

#[test]
fn identical_recapture_is_a_noop() {
    let t = open_store(100, &[]);

    assert!(t.store.insert(&text("hello")).unwrap());
    assert!(!t.store.insert(&text("hello")).unwrap());
    assert_eq!(payloads(&t.store), vec!["hello"]);

    assert!(t.store.insert(&text("world")).unwrap());
    assert_eq!(payloads(&t.store), vec!["world", "hello"]);
}

#[test]
fn dedup_is_adjacency_only() {
    let t = open_store(100, &[]);

    t.store.insert(&text("a")).unwrap();
    t.store.insert(&text("b")).unwrap();
    // "a" was seen before but is no longer the most recent entry, so
    // re-capturing it creates a new row.
    assert!(t.store.insert(&text("a")).unwrap());
    assert_eq!(payloads(&t.store), vec!["a", "b", "a"]);
}

#[test]
fn no_two_adjacent_entries_are_identical() {
    let t = open_store(100, &[]);
    for payload in ["x", "x", "y", "y", "x", "x", "x"] {
        t.store.insert(&text(payload)).unwrap();
    }

    let entries = t.store.list(None).unwrap();
    for pair in entries.windows(2) {
        assert!(
            pair[0].payload != pair[1].payload || pair[0].content_type != pair[1].content_type,
            "adjacent duplicates in {:?}",
            payloads(&t.store)
        );
    }
}

#[test]
fn blacklisted_source_is_never_persisted() {
    let t = open_store(100, &["KeePassXC"]);

    assert!(!t.store.insert(&text_from("secret", "keepassxc")).unwrap());
    assert!(t.store.insert(&text_from("fine", "firefox")).unwrap());
    assert_eq!(payloads(&t.store), vec!["fine"]);
}

#[test]
fn capacity_evicts_oldest_first() {
    let t = open_store(2, &[]);

    t.store.insert(&text("a")).unwrap();
    t.store.insert(&text("b")).unwrap();
    t.store.insert(&text("c")).unwrap();

    assert_eq!(payloads(&t.store), vec!["c", "b"]);
    assert_eq!(t.store.count().unwrap(), 2);
}

#[test]
fn count_never_exceeds_capacity() {
    let t = open_store(3, &[]);
    for i in 0..10 {
        t.store.insert(&text(&format!("clip {i}"))).unwrap();
        assert!(t.store.count().unwrap() <= 3);
    }
    assert_eq!(payloads(&t.store), vec!["clip 9", "clip 8", "clip 7"]);
}

#[test]
fn entries_are_listed_most_recent_first() {
    let t = open_store(100, &[]);
    for payload in ["one", "two", "three"] {
        t.store.insert(&text(payload)).unwrap();
    }

    let entries = t.store.list(None).unwrap();
    assert_eq!(payloads(&t.store), vec!["three", "two", "one"]);
    for pair in entries.windows(2) {
        assert!(
            (pair[0].created_at, pair[0].id) > (pair[1].created_at, pair[1].id),
            "recency order violated"
        );
    }
}

#[test]
fn list_limit_returns_newest() {
    let t = open_store(100, &[]);
    for payload in ["one", "two", "three"] {
        t.store.insert(&text(payload)).unwrap();
    }
    let limited = t.store.list(Some(2)).unwrap();
    assert_eq!(limited.len(), 2);
    assert_eq!(limited[0].payload, "three");
}

#[test]
fn single_line_round_trip_resolves_multiline_payload() {
    let t = open_store(100, &[]);
    let payload = "line one\nline two\nwith a literal \\n token";
    t.store.insert(&text(payload)).unwrap();

    // What a picker sees: the encoded single line. It pipes it back
    // verbatim; the store decodes during resolution.
    let line = escape::encode(payload);
    assert!(!line.contains('\n'));

    let entry = t.store.get_by_payload(&line).unwrap().expect("must resolve");
    assert_eq!(entry.payload, payload);
}

#[test]
fn selection_with_trailing_newline_resolves() {
    let t = open_store(100, &[]);
    t.store.insert(&text("hello")).unwrap();

    let entry = t.store.get_by_payload("hello\n").unwrap();
    assert_eq!(entry.expect("must resolve").payload, "hello");
}

#[test]
fn whitespace_padded_selection_resolves() {
    let t = open_store(100, &[]);
    t.store.insert(&text("hello")).unwrap();

    // Pickers and shell pipelines routinely pad the selected line.
    let entry = t.store.get_by_payload("  hello  ").unwrap();
    assert_eq!(entry.expect("must resolve").payload, "hello");

    let entry = t.store.get_by_payload("\thello\n").unwrap();
    assert_eq!(entry.expect("must resolve").payload, "hello");
}

#[test]
fn default_format_line_resolves_by_id_prefix() {
    let t = open_store(100, &[]);
    t.store.insert(&text("alpha")).unwrap();
    t.store.insert(&text("beta")).unwrap();

    let id = t.store.list(None).unwrap()[1].id;
    // What `list` prints without --simple: "{id} [T] {payload}".
    let line = format!("{id} [T] alpha\n");
    let entry = t.store.get_by_payload(&line).unwrap();
    assert_eq!(entry.expect("must resolve").id, id);

    assert!(t.store.delete_by_payload(&line).unwrap());
    assert_eq!(payloads(&t.store), vec!["beta"]);
}

#[test]
fn bare_number_selection_is_not_treated_as_an_id() {
    let t = open_store(100, &[]);
    t.store.insert(&text("entry one")).unwrap();

    // A plain numeric payload selection must only match a stored payload,
    // never fall through to id lookup.
    assert!(t.store.get_by_payload("1").unwrap().is_none());
    t.store.insert(&text("1")).unwrap();
    assert_eq!(t.store.get_by_payload("1").unwrap().unwrap().payload, "1");
}

#[test]
fn delete_then_lookup_misses() {
    let t = open_store(100, &[]);
    t.store.insert(&text("doomed")).unwrap();

    assert!(t.store.delete_by_payload("doomed").unwrap());
    assert!(t.store.get_by_payload("doomed").unwrap().is_none());
    // Deleting again is a no-op, not an error.
    assert!(!t.store.delete_by_payload("doomed").unwrap());
}

#[test]
fn delete_by_id_removes_exactly_one() {
    let t = open_store(100, &[]);
    t.store.insert(&text("a")).unwrap();
    t.store.insert(&text("b")).unwrap();

    let id = t.store.list(None).unwrap()[1].id;
    assert!(t.store.delete_by_id(id).unwrap());
    assert_eq!(payloads(&t.store), vec!["b"]);
    assert!(!t.store.delete_by_id(id).unwrap());
}

#[test]
fn clear_empties_store_and_cache() {
    let t = open_store(100, &[]);
    t.store.insert(&text("some text")).unwrap();
    t.store.insert(&image(b"png bytes here")).unwrap();
    assert!(cache_file_count(&t.image_dir) > 0);

    t.store.clear().unwrap();

    assert!(t.store.list(None).unwrap().is_empty());
    assert_eq!(cache_file_count(&t.image_dir), 0);
}

#[test]
fn pattern_clear_removes_only_matches() {
    let t = open_store(100, &[]);
    for payload in ["alpha one", "beta", "alpha two"] {
        t.store.insert(&text(payload)).unwrap();
    }

    assert_eq!(t.store.clear_matching("alpha").unwrap(), 2);
    assert_eq!(payloads(&t.store), vec!["beta"]);
    // No match is a counted no-op.
    assert_eq!(t.store.clear_matching("alpha").unwrap(), 0);
}

#[test]
fn pattern_clear_frees_matched_image_files() {
    let t = open_store(100, &[]);
    t.store.insert(&image(b"png bytes")).unwrap();
    t.store.insert(&text("kept text")).unwrap();
    assert_eq!(cache_file_count(&t.image_dir), 1);

    // Image payloads are cache paths ending in .png, so the pattern hits
    // the image entry only.
    assert_eq!(t.store.clear_matching(".png").unwrap(), 1);
    assert_eq!(payloads(&t.store), vec!["kept text"]);
    assert_eq!(cache_file_count(&t.image_dir), 0);
}

#[test]
fn evicted_image_entry_frees_its_cache_file() {
    let t = open_store(1, &[]);
    t.store.insert(&image(b"first image")).unwrap();
    assert_eq!(cache_file_count(&t.image_dir), 1);

    // Pushing a text entry in evicts the image and its cache file.
    t.store.insert(&text("newer")).unwrap();
    assert_eq!(payloads(&t.store), vec!["newer"]);
    assert_eq!(cache_file_count(&t.image_dir), 0);
}

#[test]
fn shared_cache_file_survives_until_last_reference_is_gone() {
    let t = open_store(100, &[]);
    t.store.insert(&image(b"shared bytes")).unwrap();
    t.store.insert(&text("separator")).unwrap();
    // Same image copied again later: same content-addressed file, two rows.
    t.store.insert(&image(b"shared bytes")).unwrap();
    assert_eq!(cache_file_count(&t.image_dir), 1);

    let entries = t.store.list(None).unwrap();
    let newest_image_id = entries[0].id;
    assert!(t.store.delete_by_id(newest_image_id).unwrap());
    // The older entry still references the file.
    assert_eq!(cache_file_count(&t.image_dir), 1);

    let oldest_image_id = t.store.list(None).unwrap()[1].id;
    assert!(t.store.delete_by_id(oldest_image_id).unwrap());
    assert_eq!(cache_file_count(&t.image_dir), 0);
}

#[test]
fn image_entry_payload_is_cache_path() {
    let t = open_store(100, &[]);
    t.store.insert(&image(b"some png")).unwrap();

    let entry = &t.store.list(None).unwrap()[0];
    assert!(entry.is_image());
    assert!(entry.payload.ends_with(".png"));
    let on_disk = fs::read(&entry.payload).expect("cache file readable");
    assert_eq!(on_disk, b"some png");
}

#[test]
fn created_at_is_non_decreasing() {
    let t = open_store(100, &[]);
    for i in 0..5 {
        t.store.insert(&text(&format!("clip {i}"))).unwrap();
    }
    let mut stamps: Vec<i64> = t.store.list(None).unwrap().iter().map(|e| e.created_at).collect();
    stamps.reverse(); // oldest first
    assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
}

fn cache_file_count(dir: &PathBuf) -> usize {
    match fs::read_dir(dir) {
        Ok(read) => read.count(),
        Err(_) => 0,
    }
}
