//! End-to-end pairing scenarios against real PDF files.

use std::time::{Duration, Instant};

use pdfcollate::collate::{Outcome, State};

use crate::common::{Workspace, collator, page_markers};

#[test]
fn test_duplex_pair_is_collated() {
    let ws = Workspace::new();
    let collator = collator(ws.config());
    let t0 = Instant::now();

    let front = ws.scan("scan_0001.pdf", &["1", "3", "5"]);
    let back = ws.scan("scan_0002.pdf", &["6", "4", "2"]);

    collator.on_file_created(&front, t0);
    collator.on_file_completed(&front, t0 + Duration::from_secs(20));
    collator.on_file_created(&back, t0 + Duration::from_secs(60));
    let outcome = collator.on_file_completed(&back, t0 + Duration::from_secs(80));

    let output = ws.output("scan_0001-collated.pdf");
    match outcome {
        Outcome::Merged {
            report,
            inputs_deleted,
        } => {
            assert_eq!(report.output_path, output);
            assert_eq!(report.total_pages, 6);
            assert!(inputs_deleted);
        }
        other => panic!("expected a merge, got {other:?}"),
    }

    assert_eq!(page_markers(&output), vec!["1", "2", "3", "4", "5", "6"]);
    assert!(!front.exists());
    assert!(!back.exists());
    assert_eq!(collator.state(), State::WaitingForFirst);
}

#[test]
fn test_inputs_kept_when_deletion_disabled() {
    let ws = Workspace::new();
    let config = pdfcollate::Config {
        delete_old_files: false,
        ..ws.config()
    };
    let collator = collator(config);
    let now = Instant::now();

    let front = ws.scan("a.pdf", &["1"]);
    let back = ws.scan("b.pdf", &["2"]);

    for path in [&front, &back] {
        collator.on_file_created(path, now);
        collator.on_file_completed(path, now);
    }

    assert!(ws.output("a-collated.pdf").exists());
    assert!(front.exists());
    assert!(back.exists());
}

#[test]
fn test_failed_write_keeps_inputs() {
    let ws = Workspace::new();
    let collator = collator(ws.config());
    let now = Instant::now();

    // A directory where the merged file should go makes the final rename fail.
    std::fs::create_dir_all(ws.output("a-collated.pdf").join("taken")).unwrap();

    let front = ws.scan("a.pdf", &["1"]);
    let back = ws.scan("b.pdf", &["2"]);

    collator.on_file_created(&front, now);
    collator.on_file_completed(&front, now);
    collator.on_file_created(&back, now);
    let outcome = collator.on_file_completed(&back, now);

    assert!(matches!(outcome, Outcome::MergeFailure(_)), "got {outcome:?}");
    assert!(front.exists());
    assert!(back.exists());
    assert!(!ws.output("a-collated.pdf.tmp").exists());
    assert_eq!(collator.state(), State::WaitingForFirst);
}

#[test]
fn test_page_count_mismatch_promotes_second() {
    let ws = Workspace::new();
    let collator = collator(ws.config());
    let now = Instant::now();

    let stray = ws.scan("stray.pdf", &["x1", "x2", "x3"]);
    let front = ws.scan("front.pdf", &["1", "3"]);
    let back = ws.scan("back.pdf", &["4", "2"]);

    collator.on_file_created(&stray, now);
    collator.on_file_completed(&stray, now);
    collator.on_file_created(&front, now);
    assert!(matches!(
        collator.on_file_completed(&front, now),
        Outcome::IncompatiblePair { .. }
    ));
    assert_eq!(collator.state(), State::WaitingForSecond);

    collator.on_file_created(&back, now);
    assert!(matches!(
        collator.on_file_completed(&back, now),
        Outcome::Merged { .. }
    ));

    assert_eq!(
        page_markers(&ws.output("front-collated.pdf")),
        vec!["1", "2", "3", "4"]
    );
    assert!(!ws.output("stray-collated.pdf").exists());
    // The discarded file is left alone.
    assert!(stray.exists());
}

#[test]
fn test_corrupt_second_scan_is_not_merged() {
    let ws = Workspace::new();
    let collator = collator(ws.config());
    let now = Instant::now();

    let front = ws.scan("front.pdf", &["1"]);
    let broken = ws.source.join("broken.pdf");
    std::fs::write(&broken, b"%PDF-1.4 truncated").unwrap();

    collator.on_file_created(&front, now);
    collator.on_file_completed(&front, now);
    collator.on_file_created(&broken, now);

    assert!(matches!(
        collator.on_file_completed(&broken, now),
        Outcome::IncompatiblePair { .. }
    ));
    assert_eq!(
        collator.snapshot().first().map(|file| file.path.clone()),
        Some(broken)
    );
    assert!(!ws.destination.exists() || std::fs::read_dir(&ws.destination).unwrap().next().is_none());
}

#[test]
fn test_collate_timeout_starts_new_pair() {
    let ws = Workspace::new();
    let collator = collator(ws.config());
    let t0 = Instant::now();

    let abandoned = ws.scan("monday.pdf", &["m1"]);
    let front = ws.scan("tuesday.pdf", &["1", "3"]);
    let back = ws.scan("tuesday_back.pdf", &["4", "2"]);

    collator.on_file_created(&abandoned, t0);
    collator.on_file_completed(&abandoned, t0);

    let later = t0 + Duration::from_secs(601);
    assert!(matches!(
        collator.on_file_created(&front, later)[..],
        [Outcome::CollateTimeout { .. }]
    ));
    assert_eq!(collator.state(), State::ReceivingFirst);
    collator.on_file_completed(&front, later);
    collator.on_file_created(&back, later);
    collator.on_file_completed(&back, later);

    assert_eq!(
        page_markers(&ws.output("tuesday-collated.pdf")),
        vec!["1", "2", "3", "4"]
    );
    assert!(abandoned.exists());
}

#[test]
fn test_non_pdf_files_are_ignored() {
    let ws = Workspace::new();
    let collator = collator(ws.config());
    let now = Instant::now();

    let notes = ws.source.join("notes.txt");
    std::fs::write(&notes, "hello").unwrap();

    assert!(matches!(
        collator.on_file_created(&notes, now)[..],
        [Outcome::NotAPdf]
    ));
    assert!(matches!(collator.on_file_completed(&notes, now), Outcome::NotAPdf));
    assert_eq!(collator.state(), State::WaitingForFirst);
}

#[test]
fn test_output_copies_mode_of_first_scan() {
    let ws = Workspace::new();
    let collator = collator(pdfcollate::Config {
        delete_old_files: false,
        ..ws.config()
    });
    let now = Instant::now();

    let front = ws.scan("a.pdf", &["1"]);
    let back = ws.scan("b.pdf", &["2"]);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&front, std::fs::Permissions::from_mode(0o600)).unwrap();
    }

    for path in [&front, &back] {
        collator.on_file_created(path, now);
        collator.on_file_completed(path, now);
    }

    let output = ws.output("a-collated.pdf");
    assert!(output.exists());

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&output).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
