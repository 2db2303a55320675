use jiff::{SignedDuration, Timestamp};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use uidflake_core::{
    AllocatorSettings, BitLayout, LayoutSettings, StaticWorkerIdAssigner, Uid, UidAllocator,
    UidGenerator,
};

const SIZE: usize = 7_000;
const WORKER_ID: u64 = 5;

fn layout() -> BitLayout {
    BitLayout::new(
        LayoutSettings::builder()
            .timestamp_bits(28)
            .worker_id_bits(22)
            .sequence_bits(13)
            .epoch(Timestamp::now() - SignedDuration::from_hours(24))
            .build(),
    )
    .expect("valid layout")
}

fn allocator() -> UidAllocator {
    UidAllocator::from_assigner(layout(), &StaticWorkerIdAssigner::new(WORKER_ID))
        .expect("allocator")
}

fn assert_well_formed(allocator: &UidAllocator, uid: Uid) {
    assert!(uid.as_u64() > 0);
    assert_eq!(uid.as_u64() >> 63, 0);
    let decoded = allocator.decode(uid);
    assert_eq!(decoded.worker_id, WORKER_ID);
    assert!(!allocator.parse_uid(uid).is_empty());
}

#[test]
fn serial_allocation_is_unique_and_increasing() {
    let allocator = allocator();
    let mut seen = HashSet::with_capacity(SIZE);
    let mut previous = None;

    for _ in 0..SIZE {
        let uid = allocator.allocate().expect("allocate");
        assert_well_formed(&allocator, uid);
        assert!(previous < Some(uid));
        previous = Some(uid);
        seen.insert(uid);
    }

    assert_eq!(seen.len(), SIZE);
}

#[test]
fn parallel_allocation_is_unique() {
    let allocator = allocator();
    let threads = num_cpus::get() * 2;
    let control = AtomicUsize::new(0);
    let seen = Mutex::new(HashSet::with_capacity(SIZE));

    std::thread::scope(|scope| {
        for _ in 0..threads {
            scope.spawn(|| {
                let mut local: Vec<Uid> = Vec::new();
                while control.fetch_add(1, Ordering::SeqCst) < SIZE {
                    let uid = allocator.allocate().expect("allocate");
                    assert_well_formed(&allocator, uid);
                    local.push(uid);
                }
                // calls from one thread are lock-ordered
                assert!(local.windows(2).all(|pair| pair[0] < pair[1]));
                seen.lock().expect("set lock").extend(local);
            });
        }
    });

    assert_eq!(seen.into_inner().expect("set lock").len(), SIZE);
}

#[test]
fn decoded_time_matches_issuance() {
    let layout = layout();
    let settings = AllocatorSettings::builder().worker_id(WORKER_ID).build();
    let allocator = UidAllocator::new(layout, settings).expect("allocator");

    let before = Timestamp::now();
    let uid = allocator.allocate().expect("allocate");
    let after = Timestamp::now();

    let decoded = allocator.codec().decode(uid);
    // issuance is rounded down to a whole unit counted from the epoch
    assert!(decoded.timestamp <= after);
    assert!(decoded.timestamp > before - SignedDuration::from_secs(1));
    assert_eq!(
        decoded.timestamp,
        layout.epoch() + SignedDuration::from_secs(decoded.delta as i64)
    );
}

#[test]
fn decoded_uid_renders_as_json() {
    let allocator = allocator();
    let uid = allocator.allocate().expect("allocate");

    let json = serde_json::to_value(allocator.decode(uid)).expect("json");

    assert_eq!(json["uid"], uid.as_u64());
    assert_eq!(json["workerId"], WORKER_ID);
    assert!(json["timestamp"].is_string());
}
