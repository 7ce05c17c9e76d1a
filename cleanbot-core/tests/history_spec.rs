use std::fs;
use std::thread;

use cleanbot_core::models::*;
use cleanbot_core::simulation::run;
use cleanbot_core::store::{tabular, HistoryStore, StoreError};
use speculate2::speculate;

fn sample_run(steps: u32) -> (PlanSummary, CleaningResult) {
    let grid = Grid::open(4, 4);
    let plan = [Move::new(Direction::East, steps)];
    let result = run(&grid, Position::new(0, 0), &plan, false).expect("Run failed");
    (PlanSummary::new(Position::new(0, 0), &plan, false), result)
}

speculate! {
    describe "in-memory store" {
        before {
            let store = HistoryStore::open_memory();
        }

        it "starts empty with a header-only export" {
            assert!(store.list_all().is_empty());
            assert!(store.is_empty());
            assert_eq!(store.export_tabular(), format!("{}\n", tabular::HEADER));
        }

        it "assigns increasing ids starting at one" {
            let (plan, result) = sample_run(1);
            let first = store.record(plan, &result).expect("Failed to record");
            let second = store.record(plan, &result).expect("Failed to record");

            assert_eq!(first.id, 1);
            assert_eq!(second.id, 2);
            assert!(second.timestamp >= first.timestamp);
        }

        it "summarizes the run in the record" {
            let (plan, result) = sample_run(5);
            let record = store.record(plan, &result).expect("Failed to record");

            assert_eq!(record.status, CleaningStatus::AbortedOutOfBounds);
            assert_eq!(record.cells_cleaned, 4);
            assert_eq!(record.steps_taken, 3);
            assert_eq!(record.final_position, Position::new(3, 0));
            assert_eq!(record.plan.requested_steps, 5);
            assert_eq!(record.plan.actions_count, 1);
        }

        it "lists records in insertion order and exports one row each" {
            for steps in 1..=3 {
                let (plan, result) = sample_run(steps);
                store.record(plan, &result).expect("Failed to record");
            }

            let records = store.list_all();
            let ids: Vec<u64> = records.iter().map(|r| r.id).collect();
            assert_eq!(ids, vec![1, 2, 3]);

            let export = store.export_tabular();
            let lines: Vec<&str> = export.lines().collect();
            assert_eq!(lines.len(), records.len() + 1);
            assert_eq!(lines[0], tabular::HEADER);
            assert!(lines[1].starts_with("1,"));
            assert!(lines[3].starts_with("3,"));
        }

        it "finds records by id" {
            let (plan, result) = sample_run(2);
            store.record(plan, &result).expect("Failed to record");

            assert_eq!(store.get(1).map(|r| r.steps_taken), Some(2));
            assert!(store.get(2).is_none());
        }

        it "keeps ids unique and gapless under concurrent appends" {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let store = store.clone();
                    thread::spawn(move || {
                        for _ in 0..25 {
                            let (plan, result) = sample_run(1);
                            store.record(plan, &result).expect("Failed to record");
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().expect("writer panicked");
            }

            let ids: Vec<u64> = store.list_all().iter().map(|r| r.id).collect();
            assert_eq!(ids, (1..=200).collect::<Vec<u64>>());
        }
    }

    describe "file-backed store" {
        before {
            let dir = tempfile::tempdir().expect("Failed to create temp dir");
            let path = dir.path().join("history").join("session_history.csv");
        }

        it "creates the file with a header" {
            let store = HistoryStore::open(&path).expect("Failed to open");

            assert!(store.is_empty());
            assert_eq!(fs::read_to_string(&path).unwrap(), format!("{}\n", tabular::HEADER));
        }

        it "appends one row per session" {
            let store = HistoryStore::open(&path).expect("Failed to open");
            let (plan, result) = sample_run(2);
            store.record(plan, &result).expect("Failed to record");
            store.record(plan, &result).expect("Failed to record");

            let content = fs::read_to_string(&path).unwrap();
            assert_eq!(content, store.export_tabular());
            assert_eq!(content.lines().count(), 3);
        }

        it "reloads records and continues the id sequence" {
            let (plan, result) = sample_run(2);
            let written = {
                let store = HistoryStore::open(&path).expect("Failed to open");
                store.record(plan, &result).expect("Failed to record");
                store.record(plan, &result).expect("Failed to record");
                store.list_all()
            };

            let reopened = HistoryStore::open(&path).expect("Failed to reopen");
            assert_eq!(reopened.list_all(), written);

            let next = reopened.record(plan, &result).expect("Failed to record");
            assert_eq!(next.id, 3);
        }

        it "drops an incomplete final row and truncates the file" {
            let (plan, result) = sample_run(1);
            {
                let store = HistoryStore::open(&path).expect("Failed to open");
                store.record(plan, &result).expect("Failed to record");
            }
            let intact = fs::read_to_string(&path).unwrap();
            fs::write(&path, format!("{}2,2026-01-01T00:00", intact)).unwrap();

            let store = HistoryStore::open(&path).expect("Failed to reopen");
            assert_eq!(store.len(), 1);
            assert_eq!(fs::read_to_string(&path).unwrap(), intact);

            let next = store.record(plan, &result).expect("Failed to record");
            assert_eq!(next.id, 2);
            assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 3);
        }

        it "records nothing and keeps the id when the append fails" {
            let store = HistoryStore::open(&path).expect("Failed to open");
            let (plan, result) = sample_run(1);
            store.record(plan, &result).expect("Failed to record");
            let committed = fs::read_to_string(&path).unwrap();
            fs::remove_file(&path).unwrap();

            let err = store.record(plan, &result).err().expect("Append should fail");
            assert!(matches!(err, StoreError::Io { .. }));
            assert_eq!(store.len(), 1);
            assert_eq!(store.export_tabular(), committed);

            fs::write(&path, &committed).unwrap();
            let next = store.record(plan, &result).expect("Failed to record");
            assert_eq!(next.id, 2);
            assert_eq!(fs::read_to_string(&path).unwrap(), store.export_tabular());
        }

        it "rejects a file with a foreign header" {
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "id,start_time,end_time\n1,a,b\n").unwrap();

            let err = HistoryStore::open(&path).err().expect("Open should fail");
            assert!(matches!(err, StoreError::HeaderMismatch { .. }));
        }

        it "rejects a malformed row in the middle of the file" {
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, format!("{}\nnot,a,row\n", tabular::HEADER)).unwrap();

            let err = HistoryStore::open(&path).err().expect("Open should fail");
            assert!(matches!(err, StoreError::MalformedRow { line: 2, .. }));
        }
    }
}
