//! The loader must reject arbitrary bytes without panicking, and any
//! document it accepts must carry the battery to completion.
#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(snapshot) = ashlar_dbcheck::Snapshot::from_slice(data) {
        let _ = ashlar_dbcheck::check_snapshot(&snapshot);
    }
});
