use chrono::{Duration, TimeZone, Utc};
use serde_json::json;

use album_reports::config::PreviewConfig;
use album_reports::storage::models::AlbumValues;
use album_reports::storage::{Database, NewReportRequest, SweepPolicy, SweepStats};

fn test_db() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("data")).unwrap();
    (dir, db)
}

fn sample_album(name: &str, year: Option<i32>) -> AlbumValues {
    AlbumValues {
        name: name.to_string(),
        artist: "Test Artist".to_string(),
        year,
        best_of_compilation: false,
    }
}

fn policy() -> SweepPolicy {
    SweepPolicy {
        retention: Duration::minutes(3),
        pressure_retention: Duration::seconds(10),
        max_cache_size: 1000,
    }
}

fn put_request(db: &Database, key: &str, size: usize, created_on: chrono::DateTime<Utc>) {
    let pdf = vec![b'x'; size];
    db.insert_report_request(NewReportRequest {
        key,
        report_definition: "{}".to_string(),
        data: "{}".to_string(),
        is_test_data: true,
        pdf_file: Some(pdf.as_slice()),
        created_on,
    })
    .unwrap();
}

// ============================================================================
// Albums
// ============================================================================

#[test]
fn test_insert_and_get_album() {
    let (_dir, db) = test_db();

    let album = db.insert_album(sample_album("Low", Some(1977))).unwrap();
    assert_eq!(album.id, 1);

    let retrieved = db.get_album(album.id).unwrap().expect("album should exist");
    assert_eq!(retrieved, album);
    assert_eq!(retrieved.year, Some(1977));
    assert!(!retrieved.best_of_compilation);
}

#[test]
fn test_album_ids_are_sequential() {
    let (_dir, db) = test_db();
    let first = db.insert_album(sample_album("A", None)).unwrap();
    let second = db.insert_album(sample_album("B", None)).unwrap();
    assert_eq!(second.id, first.id + 1);
}

#[test]
fn test_get_album_not_found() {
    let (_dir, db) = test_db();
    assert!(db.get_album(42).unwrap().is_none());
}

#[test]
fn test_update_album() {
    let (_dir, db) = test_db();
    let album = db.insert_album(sample_album("Heroes", None)).unwrap();

    let mut values = sample_album("\"Heroes\"", Some(1977));
    values.best_of_compilation = true;
    assert!(db.update_album(album.id, values).unwrap());

    let album = db.get_album(album.id).unwrap().unwrap();
    assert_eq!(album.name, "\"Heroes\"");
    assert_eq!(album.year, Some(1977));
    assert!(album.best_of_compilation);
}

#[test]
fn test_update_album_not_found() {
    let (_dir, db) = test_db();
    assert!(!db.update_album(7, sample_album("Ghost", None)).unwrap());
    assert!(db.list_albums(None).unwrap().is_empty());
}

#[test]
fn test_list_albums_ordered_by_name() {
    let (_dir, db) = test_db();
    db.insert_album(sample_album("Lodger", Some(1979))).unwrap();
    db.insert_album(sample_album("Blackstar", Some(2016))).unwrap();
    db.insert_album(sample_album("Hunky Dory", Some(1971))).unwrap();

    let names: Vec<String> = db
        .list_albums(None)
        .unwrap()
        .into_iter()
        .map(|a| a.name)
        .collect();
    assert_eq!(names, vec!["Blackstar", "Hunky Dory", "Lodger"]);
}

#[test]
fn test_list_albums_by_year() {
    let (_dir, db) = test_db();
    db.insert_album(sample_album("Station to Station", Some(1976)))
        .unwrap();
    db.insert_album(sample_album("Low", Some(1977))).unwrap();
    db.insert_album(sample_album("Heroes", Some(1977))).unwrap();
    db.insert_album(sample_album("Unknown", None)).unwrap();

    let albums = db.list_albums(Some(1977)).unwrap();
    assert_eq!(albums.len(), 2);
    assert!(albums.iter().all(|a| a.year == Some(1977)));

    assert!(db.list_albums(Some(1800)).unwrap().is_empty());
    assert_eq!(db.list_albums(None).unwrap().len(), 4);
}

// ============================================================================
// Report definitions
// ============================================================================

#[test]
fn test_save_report_definition_upserts() {
    let (_dir, db) = test_db();
    let first_saved = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    let second_saved = first_saved + Duration::hours(1);

    let created = db
        .save_report_definition("albums_report", json!({"version": 1}), first_saved)
        .unwrap();
    let updated = db
        .save_report_definition("albums_report", json!({"version": 2}), second_saved)
        .unwrap();

    assert_eq!(created.id, updated.id);
    let stored = db.get_report_definition("albums_report").unwrap().unwrap();
    assert_eq!(stored.report_definition, json!({"version": 2}));
    assert_eq!(stored.last_modified_at, second_saved);
}

#[test]
fn test_report_definitions_are_per_type() {
    let (_dir, db) = test_db();
    let now = Utc::now();
    db.save_report_definition("a", json!({"name": "a"}), now)
        .unwrap();
    db.save_report_definition("b", json!({"name": "b"}), now)
        .unwrap();

    assert_eq!(
        db.get_report_definition("a").unwrap().unwrap().report_definition,
        json!({"name": "a"})
    );
    assert!(db.get_report_definition("c").unwrap().is_none());
}

#[test]
fn test_ensure_report_definition_only_seeds_once() {
    let (_dir, db) = test_db();
    let now = Utc::now();

    assert!(db
        .ensure_report_definition("albums_report", &json!({"seed": true}), now)
        .unwrap());
    db.save_report_definition("albums_report", json!({"edited": true}), now)
        .unwrap();
    assert!(!db
        .ensure_report_definition("albums_report", &json!({"seed": true}), now)
        .unwrap());

    let stored = db.get_report_definition("albums_report").unwrap().unwrap();
    assert_eq!(stored.report_definition, json!({"edited": true}));
}

#[test]
fn test_report_definition_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let db = Database::open(dir.path().join("data")).unwrap();
        db.save_report_definition("albums_report", json!({"kept": 1}), Utc::now())
            .unwrap();
    }
    let db = Database::open(dir.path().join("data")).unwrap();
    let stored = db.get_report_definition("albums_report").unwrap().unwrap();
    assert_eq!(stored.report_definition, json!({"kept": 1}));
}

// ============================================================================
// Preview cache rows
// ============================================================================

#[test]
fn test_insert_and_get_report_request() {
    let (_dir, db) = test_db();
    let now = Utc::now();
    put_request(&db, "key-1", 12, now);

    let cached = db.get_report_request("key-1").unwrap().expect("row exists");
    assert_eq!(cached.request.key, "key-1");
    assert_eq!(cached.request.pdf_file_size, 12);
    assert!(cached.request.is_test_data);
    assert_eq!(cached.pdf_file, Some(vec![b'x'; 12]));
    assert_eq!(db.report_cache_size().unwrap(), 12);
}

#[test]
fn test_report_request_without_pdf() {
    let (_dir, db) = test_db();
    db.insert_report_request(NewReportRequest {
        key: "no-pdf",
        report_definition: "{}".to_string(),
        data: "{}".to_string(),
        is_test_data: false,
        pdf_file: None,
        created_on: Utc::now(),
    })
    .unwrap();

    let cached = db.get_report_request("no-pdf").unwrap().unwrap();
    assert_eq!(cached.request.pdf_file_size, 0);
    assert!(cached.pdf_file.is_none());
}

#[test]
fn test_sweep_removes_expired_rows() {
    let (_dir, db) = test_db();
    let now = Utc::now();
    put_request(&db, "old", 10, now - Duration::minutes(4));
    put_request(&db, "recent", 10, now - Duration::minutes(1));

    let stats = db.sweep_report_requests(now, &policy()).unwrap();
    assert_eq!(
        stats,
        SweepStats {
            expired: 1,
            evicted: 0
        }
    );
    assert!(db.get_report_request("old").unwrap().is_none());
    assert!(db.get_report_request("recent").unwrap().is_some());
    assert_eq!(db.report_cache_size().unwrap(), 10);
}

#[test]
fn test_sweep_under_size_pressure() {
    let (_dir, db) = test_db();
    let now = Utc::now();
    put_request(&db, "a", 600, now - Duration::seconds(60));
    put_request(&db, "b", 600, now - Duration::seconds(30));
    put_request(&db, "c", 100, now - Duration::seconds(5));

    let stats = db.sweep_report_requests(now, &policy()).unwrap();
    assert_eq!(
        stats,
        SweepStats {
            expired: 0,
            evicted: 2
        }
    );
    assert_eq!(db.count_report_requests().unwrap(), 1);
    assert!(db.get_report_request("c").unwrap().is_some());
}

#[test]
fn test_sweep_at_ceiling_keeps_rows() {
    let (_dir, db) = test_db();
    let now = Utc::now();
    put_request(&db, "a", 500, now - Duration::seconds(60));
    put_request(&db, "b", 500, now - Duration::seconds(30));

    let stats = db.sweep_report_requests(now, &policy()).unwrap();
    assert_eq!(stats, SweepStats::default());
    assert_eq!(db.count_report_requests().unwrap(), 2);
}

#[test]
fn test_sweep_counts_size_after_expiry() {
    let (_dir, db) = test_db();
    let now = Utc::now();
    // Only the expired row pushes the total over the ceiling
    put_request(&db, "expired", 900, now - Duration::minutes(10));
    put_request(&db, "kept", 600, now - Duration::seconds(30));

    let stats = db.sweep_report_requests(now, &policy()).unwrap();
    assert_eq!(
        stats,
        SweepStats {
            expired: 1,
            evicted: 0
        }
    );
    assert!(db.get_report_request("kept").unwrap().is_some());
}

#[test]
fn test_oversized_retention_keeps_rows() {
    let (_dir, db) = test_db();
    let now = Utc::now();
    put_request(&db, "a", 600, now - Duration::days(30));
    put_request(&db, "b", 600, now - Duration::seconds(5));

    let policy = SweepPolicy::from(&PreviewConfig {
        retention_seconds: u64::MAX,
        pressure_retention_seconds: u64::MAX,
        max_cache_size: 1000,
    });
    assert!(policy.retention > Duration::zero());
    assert!(policy.pressure_retention > Duration::zero());

    let stats = db.sweep_report_requests(now, &policy).unwrap();
    assert_eq!(stats, SweepStats::default());
    assert_eq!(db.count_report_requests().unwrap(), 2);
}
