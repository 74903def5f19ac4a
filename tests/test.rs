use {
    dc_snowflake::{
        parse_id, AddressField, Layout, LayoutOptions, ParsedId, ParsedIdStrings, Snowflake, SnowflakeError,
        TimeSource, DEFAULT_EPOCH,
    },
    std::{
        collections::HashSet,
        sync::{
            atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering},
            Arc,
        },
        thread,
    },
};

const T0: i64 = DEFAULT_EPOCH + 1_000;

/// Reads `now`; after `reads_until_tick` more reads the clock moves forward
/// by one millisecond and freezes again.
struct MockClock {
    now: AtomicI64,
    reads_until_tick: AtomicUsize,
}

impl MockClock {
    fn frozen_at(now: i64) -> Arc<Self> {
        Arc::new(Self {
            now: AtomicI64::new(now),
            reads_until_tick: AtomicUsize::new(0),
        })
    }

    fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    fn tick_after(&self, reads: usize) {
        self.reads_until_tick.store(reads, Ordering::SeqCst);
    }
}

impl TimeSource for MockClock {
    fn current_millis(&self) -> i64 {
        let previous = self
            .reads_until_tick
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if previous == Ok(1) {
            self.now.fetch_add(1, Ordering::SeqCst) + 1
        } else {
            self.now.load(Ordering::SeqCst)
        }
    }
}

fn mock_snowflake(clock: &Arc<MockClock>, options: LayoutOptions) -> Snowflake<Arc<MockClock>> {
    Snowflake::with_clock(1, 1, options, Arc::clone(clock)).unwrap()
}

#[test]
fn test_new() {
    let snowflake = Snowflake::new(1, 1);
    assert!(snowflake.is_ok());
}

#[test]
fn test_address_round_trip() {
    for worker_id in 0 ..= 31 {
        for datacenter_id in 0 ..= 31 {
            let snowflake = Snowflake::new(worker_id, datacenter_id).unwrap();
            assert_eq!(snowflake.worker_id(), worker_id);
            assert_eq!(snowflake.datacenter_id(), datacenter_id);
        }
    }
}

#[test]
fn test_invalid_worker_id() {
    let snowflake = Snowflake::new(32, 1);
    assert_eq!(
        snowflake.err(),
        Some(SnowflakeError::InvalidAddress {
            field: AddressField::Worker,
            value: 32,
            max: 31,
        })
    );
}

#[test]
fn test_invalid_datacenter_id() {
    let snowflake = Snowflake::new(1, 32);
    assert_eq!(
        snowflake.err(),
        Some(SnowflakeError::InvalidAddress {
            field: AddressField::Datacenter,
            value: 32,
            max: 31,
        })
    );
}

#[test]
fn test_invalid_address_custom_layout() {
    let options = LayoutOptions::default().with_worker_id_bits(3).with_datacenter_id_bits(0);
    assert!(Snowflake::with_options(7, 0, options).is_ok());
    assert!(matches!(
        Snowflake::with_options(8, 0, options).err(),
        Some(SnowflakeError::InvalidAddress { field: AddressField::Worker, .. })
    ));
    assert!(matches!(
        Snowflake::with_options(0, 1, options).err(),
        Some(SnowflakeError::InvalidAddress { field: AddressField::Datacenter, .. })
    ));
}

#[test]
fn test_invalid_address_message() {
    let err = Snowflake::new(32, 1).unwrap_err();
    assert_eq!(err.to_string(), "invalid worker id(=32), expected worker id ∈ [0,31]");
}

#[test]
fn test_invalid_layout() {
    let options = LayoutOptions::default().with_sequence_bits(60);
    let snowflake = Snowflake::with_options(1, 1, options);
    assert!(matches!(snowflake.err(), Some(SnowflakeError::InvalidLayout(..))));
}

#[test]
fn test_invalid_epoch() {
    let options = LayoutOptions::default().with_epoch(1_000_000_000_000_000);
    let snowflake = Snowflake::with_options(1, 1, options);
    assert!(matches!(snowflake.err(), Some(SnowflakeError::InvalidEpoch { .. })));
}

#[test]
fn test_state_before_first_id() {
    let snowflake = Snowflake::new(1, 1).unwrap();
    assert_eq!(snowflake.last_timestamp(), -1);
    assert_eq!(snowflake.current_sequence(), 0);
}

#[test]
fn test_generate() {
    let snowflake = Snowflake::new(1, 1).unwrap();
    let sfid = snowflake.next_id();
    assert!(sfid.is_ok());
    assert!(snowflake.last_timestamp() > 0);
    assert!(snowflake.current_sequence() <= 4095);
}

#[test]
fn test_id_unique() {
    let snowflake = Snowflake::new(1, 1).unwrap();
    let sfid1 = snowflake.next_id().unwrap();
    let sfid2 = snowflake.next_id().unwrap();
    assert_ne!(sfid1, sfid2);
}

#[test]
fn test_id_order() {
    let snowflake = Snowflake::new(1, 1).unwrap();
    let mut last = snowflake.next_id().unwrap();
    for _ in 0 .. 100_000 {
        let sfid = snowflake.next_id().unwrap();
        assert!(sfid > last);
        last = sfid;
    }
}

#[test]
fn test_round_trip() {
    let layouts = [
        LayoutOptions::default(),
        LayoutOptions::default().with_epoch(0),
        LayoutOptions::default().with_worker_id_bits(8).with_datacenter_id_bits(2).with_sequence_bits(10),
        LayoutOptions::default().with_worker_id_bits(1).with_datacenter_id_bits(1).with_sequence_bits(0),
    ];

    for options in layouts {
        let layout = options.build().unwrap();
        let worker_id = layout.max_worker_id();
        let datacenter_id = layout.max_datacenter_id();
        let snowflake = Snowflake::with_options(worker_id, datacenter_id, options).unwrap();

        for _ in 0 .. 100 {
            let parsed = parse_id(snowflake.next_id().unwrap(), &layout);
            assert_eq!(parsed.worker_id, worker_id);
            assert_eq!(parsed.datacenter_id, datacenter_id);
            assert_eq!(parsed.timestamp, snowflake.last_timestamp());
            assert_eq!(parsed.sequence, snowflake.current_sequence());
        }
    }
}

#[test]
fn test_sequence_within_same_millisecond() {
    let clock = MockClock::frozen_at(T0);
    let snowflake = mock_snowflake(&clock, LayoutOptions::default());

    for expected in 0 .. 3 {
        let parsed = snowflake.parse(snowflake.next_id().unwrap());
        assert_eq!(parsed.timestamp, T0);
        assert_eq!(parsed.sequence, expected);
        assert_eq!(snowflake.current_sequence(), expected);
    }

    clock.set(T0 + 5);
    let parsed = snowflake.parse(snowflake.next_id().unwrap());
    assert_eq!(parsed.timestamp, T0 + 5);
    assert_eq!(parsed.sequence, 0);
}

#[test]
fn test_sequence_exhausted_waits_for_next_millisecond() {
    let clock = MockClock::frozen_at(T0);
    let snowflake = mock_snowflake(&clock, LayoutOptions::default());
    let max_sequence = snowflake.layout().sequence_mask();

    let mut ids = Vec::new();
    for _ in 0 ..= max_sequence {
        ids.push(snowflake.next_id().unwrap());
    }
    assert_eq!(snowflake.current_sequence(), max_sequence);

    // First read still sees T0, the spin reads T0 once more, then the clock ticks.
    clock.tick_after(3);
    ids.push(snowflake.next_id().unwrap());

    assert_eq!(clock.reads_until_tick.load(Ordering::SeqCst), 0);
    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));

    let parsed = snowflake.parse(*ids.last().unwrap());
    assert_eq!(parsed.timestamp, T0 + 1);
    assert_eq!(parsed.sequence, 0);
    assert_eq!(snowflake.last_timestamp(), T0 + 1);
}

#[test]
fn test_clock_regression() {
    let clock = MockClock::frozen_at(T0);
    let snowflake = mock_snowflake(&clock, LayoutOptions::default());
    snowflake.next_id().unwrap();
    let last = snowflake.next_id().unwrap();

    clock.set(T0 - 1);
    assert_eq!(
        snowflake.next_id(),
        Err(SnowflakeError::ClockRegression {
            now: T0 - 1,
            last_timestamp: T0,
        })
    );
    assert_eq!(snowflake.last_timestamp(), T0);
    assert_eq!(snowflake.current_sequence(), 1);

    clock.set(T0);
    let next = snowflake.next_id().unwrap();
    assert!(next > last);
    assert_eq!(snowflake.parse(next).sequence, 2);
}

#[test]
fn test_clock_before_epoch() {
    let clock = MockClock::frozen_at(T0);
    let snowflake = mock_snowflake(&clock, LayoutOptions::default());

    clock.set(DEFAULT_EPOCH - 1);
    assert!(matches!(snowflake.next_id(), Err(SnowflakeError::InvalidEpoch { .. })));
    assert_eq!(snowflake.last_timestamp(), -1);
}

#[test]
fn test_timestamp_overflow() {
    let options = LayoutOptions::default()
        .with_epoch(0)
        .with_worker_id_bits(20)
        .with_datacenter_id_bits(20)
        .with_sequence_bits(22);
    let clock = MockClock::frozen_at(1);
    let snowflake = mock_snowflake(&clock, options);
    assert!(snowflake.next_id().is_ok());

    clock.set(2);
    assert_eq!(
        snowflake.next_id(),
        Err(SnowflakeError::TimestampOverflow { delta: 2, max: 1 })
    );
    assert_eq!(snowflake.last_timestamp(), 1);
}

#[test]
fn test_parse_id() {
    let timestamp: i64 = 1609459200000;
    let id = (((timestamp - 1609459200000) as u64) << 22) | (1 << 17) | (1 << 12) | 1;
    let parsed = parse_id(id, &Layout::default());

    assert_eq!(
        parsed,
        ParsedId {
            timestamp: 1609459200000,
            datacenter_id: 1,
            worker_id: 1,
            sequence: 1,
        }
    );
}

#[test]
fn test_parse_id_strings() {
    let id = (1 << 17) | (1 << 12) | 1;
    let parsed = parse_id(id, &Layout::default());

    assert_eq!(
        parsed.to_strings(),
        ParsedIdStrings {
            timestamp: "1609459200000".to_string(),
            datacenter_id: "1".to_string(),
            worker_id: "1".to_string(),
            sequence: "1".to_string(),
        }
    );
}

#[test]
fn test_builder() {
    let clock = MockClock::frozen_at(T0);
    let snowflake = Snowflake::builder()
        .with_worker_id(3)
        .with_datacenter_id(2)
        .with_worker_id_bits(4)
        .with_sequence_bits(8)
        .with_clock(Arc::clone(&clock))
        .build()
        .unwrap();

    let expected = LayoutOptions::default().with_worker_id_bits(4).with_sequence_bits(8);
    assert_eq!(snowflake.layout(), &expected.build().unwrap());

    let parsed = snowflake.parse(snowflake.next_id().unwrap());
    assert_eq!((parsed.worker_id, parsed.datacenter_id, parsed.timestamp), (3, 2, T0));
}

#[test]
fn test_multi_thread_unique() {
    const THREADS: usize = 8;
    const IDS_PER_THREAD: usize = 20_000;

    let snowflake = Arc::new(Snowflake::new(1, 1).unwrap());
    let handles: Vec<_> = (0 .. THREADS)
        .map(|_| {
            let snowflake = Arc::clone(&snowflake);
            thread::spawn(move || {
                let mut ids = Vec::with_capacity(IDS_PER_THREAD);
                for _ in 0 .. IDS_PER_THREAD {
                    ids.push(snowflake.next_id().unwrap());
                }
                ids
            })
        })
        .collect();

    let mut seen = HashSet::with_capacity(THREADS * IDS_PER_THREAD);
    for handle in handles {
        let ids = handle.join().unwrap();
        // Each thread observes its own IDs in issue order.
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
        for id in ids {
            assert!(seen.insert(id));
        }
    }
    assert_eq!(seen.len(), THREADS * IDS_PER_THREAD);
}

#[test]
fn test_lock_poisoned() {
    struct PanickingClock(AtomicBool);

    impl TimeSource for PanickingClock {
        fn current_millis(&self) -> i64 {
            assert!(!self.0.load(Ordering::SeqCst), "clock failure");
            T0
        }
    }

    let clock = Arc::new(PanickingClock(AtomicBool::new(false)));
    let snowflake = Arc::new(Snowflake::with_clock(1, 1, LayoutOptions::default(), Arc::clone(&clock)).unwrap());
    snowflake.next_id().unwrap();

    clock.0.store(true, Ordering::SeqCst);
    let poisoner = Arc::clone(&snowflake);
    assert!(thread::spawn(move || poisoner.next_id()).join().is_err());

    clock.0.store(false, Ordering::SeqCst);
    assert_eq!(snowflake.next_id(), Err(SnowflakeError::LockPoisoned));
    assert_eq!(snowflake.last_timestamp(), T0);
    assert_eq!(snowflake.current_sequence(), 0);
}

#[cfg(feature = "serde")]
#[test]
fn test_serde_options() {
    let options: LayoutOptions = serde_json::from_str(r#"{"worker_id_bits": 8}"#).unwrap();
    assert_eq!(options, LayoutOptions::default().with_worker_id_bits(8));

    let parsed = parse_id((1 << 17) | (1 << 12) | 1, &Layout::default());
    let json = serde_json::to_string(&parsed).unwrap();
    assert_eq!(
        json,
        r#"{"timestamp":1609459200000,"datacenter_id":1,"worker_id":1,"sequence":1}"#
    );
}
