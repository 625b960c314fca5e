//! Process-wide progress slot behavior.
//!
//! Kept as a single test in its own binary: the slot is shared state and
//! concurrent tests beginning operations would interleave with the
//! assertions below.

use rastermill::{Progress, ProgressHandle};

fn drive(handle: &ProgressHandle, rows: usize) {
    for _ in 0..rows {
        handle.row_done();
    }
}

#[test]
fn global_slot_tracks_newest_operation() {
    assert_eq!(Progress::current(), None);

    let first = Progress::begin(4);
    drive(&first, 1);
    assert_eq!(Progress::current(), Some(25));

    // A newer operation takes over the global slot; the old handle still
    // reads its own counter.
    let second = Progress::begin(2);
    drive(&second, 1);
    assert_eq!(Progress::current(), Some(50));
    assert_eq!(first.percent(), Some(25));

    // Finishing the stale handle must not knock out the newer operation.
    first.finish();
    assert_eq!(Progress::current(), Some(50));

    second.finish();
    assert_eq!(Progress::current(), None);
}
