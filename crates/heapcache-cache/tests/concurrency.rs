//! Best-effort concurrency test: spawns reader and writer threads against
//! one shared `Cache` and asserts no reader ever observes a torn payload.
//! Not a proof of linearizability, matching how the allocator workspace's
//! own `arena/thread_safe.rs` is tested (spawn N threads, assert
//! non-overlapping results) rather than attempting an exhaustive model
//! check.

use std::sync::Arc;
use std::thread;

use heapcache_cache::Cache;

const PAYLOAD_LEN: usize = 4_096;

fn pattern(byte: u8) -> Vec<u8> {
    vec![byte; PAYLOAD_LEN]
}

#[test]
fn concurrent_readers_never_observe_a_torn_payload() {
    let cache = Arc::new(Cache::init(1_000_000, PAYLOAD_LEN * 2));
    cache.write("h", "/torn", &pattern(0xAA)).unwrap();

    let writers: Vec<_> = (0..4)
        .map(|i| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                let byte = 0xB0 + i as u8;
                for _ in 0..50 {
                    cache.write("h", "/torn", &pattern(byte)).unwrap();
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..8)
        .map(|_| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                let mut buf = Vec::new();
                for _ in 0..200 {
                    if let Some(len) = cache.read("h", "/torn", &mut buf) {
                        assert_eq!(len, PAYLOAD_LEN);
                        let first = buf[0];
                        assert!(
                            buf.iter().all(|&b| b == first),
                            "observed a torn payload: mixed bytes in one read"
                        );
                    }
                }
            })
        })
        .collect();

    for w in writers {
        w.join().unwrap();
    }
    for r in readers {
        r.join().unwrap();
    }
}

#[test]
fn concurrent_writes_to_distinct_keys_all_land() {
    let cache = Arc::new(Cache::init(1_000_000, PAYLOAD_LEN));

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                let uri = format!("/item-{i}");
                cache.write("h", &uri, &pattern(i as u8)).unwrap();
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    for i in 0..16u8 {
        let uri = format!("/item-{i}");
        let mut buf = Vec::new();
        let len = cache.read("h", &uri, &mut buf).expect("entry should be present");
        assert_eq!(len, PAYLOAD_LEN);
        assert!(buf.iter().all(|&b| b == i));
    }
}
