use std::sync::Arc;

use chrono::NaiveDate;
use storage::mapping::{REVIEWS_PATH, SUBJECT_COLUMNS, SUBJECTS_PATH};
use storage::{CsvTable, InMemoryFileStore, TableStore, WriteOutcome};
use study_core::model::{ReviewLog, ReviewRecord, SubjectName, SubjectTable, Weight};

fn subjects() -> SubjectTable {
    let mut table = SubjectTable::new();
    let math = table.add(SubjectName::new("Math").unwrap(), Weight::new(4).unwrap());
    table.add(SubjectName::new("History").unwrap(), Weight::new(2).unwrap());
    table.add(SubjectName::new("Math").unwrap(), Weight::new(1).unwrap());
    table.accrue_minutes(math, 25).unwrap();
    table
}

#[tokio::test]
async fn saved_tables_read_back_identically() {
    let files = InMemoryFileStore::new();
    let store = TableStore::new(Arc::new(files.clone()));

    let subjects = subjects();
    let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    let reviews = ReviewLog::from_records(vec![
        ReviewRecord::scheduled(day, "Math", "Integrals, part 1"),
        ReviewRecord::scheduled(day, "General", ""),
    ]);

    assert_eq!(
        store.save_subjects(&subjects, "save").await.unwrap(),
        WriteOutcome::Created
    );
    assert_eq!(
        store.save_reviews(&reviews, "save").await.unwrap(),
        WriteOutcome::Created
    );

    assert_eq!(store.load_subjects().await, subjects);
    assert_eq!(store.load_reviews().await, reviews);

    assert_eq!(
        store.save_subjects(&subjects, "again").await.unwrap(),
        WriteOutcome::Updated
    );
    assert_eq!(store.load_subjects().await, subjects);
    assert!(files.content(REVIEWS_PATH).is_some());
}

#[tokio::test]
async fn generic_table_roundtrip_preserves_row_order() {
    let files = InMemoryFileStore::new();
    let store = TableStore::new(Arc::new(files));

    let rows: Vec<Vec<String>> = (0..20)
        .map(|i| vec![format!("S{i}"), ((i % 5) + 1).to_string(), format!("{i}.5")])
        .collect();
    let table = CsvTable::new(
        SUBJECT_COLUMNS.iter().map(|c| (*c).to_owned()).collect(),
        rows,
    )
    .unwrap();

    store.write_table(SUBJECTS_PATH, &table, "m").await.unwrap();
    let back = store.read_table(SUBJECTS_PATH, &SUBJECT_COLUMNS).await;
    assert_eq!(back, table);
}

#[tokio::test]
async fn reads_tables_written_by_other_tools() {
    let files = InMemoryFileStore::new();
    files
        .insert(
            SUBJECTS_PATH,
            "Subject,Weight,StudiedHours\nMath,4,0.0\nPhysics,3,1.25\n",
        )
        .unwrap();
    let store = TableStore::new(Arc::new(files));

    let subjects = store.load_subjects().await;
    assert_eq!(subjects.len(), 2);
    assert_eq!(subjects.rows()[1].name().as_str(), "Physics");
    assert!((subjects.rows()[1].studied_hours() - 1.25).abs() < f64::EPSILON);
    assert!(store.load_reviews().await.is_empty());
}
