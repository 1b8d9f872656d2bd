#![no_main]

use libfuzzer_sys::fuzz_target;
use pdfcollate::collate::{PairingStateMachine, State};
use pdfcollate::io::PdfReader;
use pdfcollate::merge::InterleavingMerger;
use pdfcollate::Config;
use std::path::PathBuf;
use std::time::{Duration, Instant};

// Each byte is one event: bit 7 picks created/completed, bits 4-6 advance the
// clock, bits 0-3 pick one of a few paths. None of the paths exist, so every
// pair is incompatible and nothing touches the disk.
fuzz_target!(|data: &[u8]| {
    let config = Config {
        collate_timeout: Duration::from_secs(5),
        delete_old_files: false,
        ..Config::default()
    };
    let mut machine = PairingStateMachine::new(config, PdfReader::new(), InterleavingMerger::new());
    let mut now = Instant::now();

    for byte in data {
        now += Duration::from_secs(u64::from((byte >> 4) & 0x7));
        let path = match byte & 0x0f {
            0 => PathBuf::from("/nonexistent/notes.txt"),
            n => PathBuf::from(format!("/nonexistent/scan_{n}.pdf")),
        };

        if byte & 0x80 == 0 {
            machine.on_file_created(&path, now);
        } else {
            machine.on_file_completed(&path, now);
        }

        let session = machine.session();
        assert_ne!(session.state(), State::Processing);
        if let Some(second) = session.second() {
            let first = session.first().expect("second without first");
            assert!(first.is_finished());
            assert_ne!(first.path, second.path);
        }
        match session.state() {
            State::WaitingForFirst => assert!(session.first().is_none()),
            State::ReceivingFirst => assert!(session.first().is_some_and(|f| !f.is_finished())),
            State::WaitingForSecond => {
                assert!(session.first().is_some_and(|f| f.is_finished()));
                assert!(session.second().is_none());
            }
            State::ReceivingSecond => assert!(session.second().is_some_and(|s| !s.is_finished())),
            State::Processing => unreachable!(),
        }
    }
});
