//! End-to-end read/write/eviction scenarios.

use heapcache_cache::Cache;

#[test]
fn cache_hit_promotes_entry_to_mru() {
    let cache = Cache::init(1_049_000, 102_400);
    cache.write("h", "/u", b"hello").unwrap();

    let mut buf = Vec::new();
    let len = cache.read("h", "/u", &mut buf).unwrap();
    assert_eq!(len, 5);
    assert_eq!(buf, b"hello");

    cache.write("x", "/y", b"X").unwrap();

    // ("h", "/u") was read after ("x", "/y") was written, so the second
    // write should not have displaced it.
    let mut buf2 = Vec::new();
    assert_eq!(cache.read("h", "/u", &mut buf2).unwrap(), 5);
    assert_eq!(buf2, b"hello");
}

#[test]
fn lru_eviction_removes_oldest_unread_entry() {
    // Four 3-byte writes exactly fill a 12-byte cache; a fifth write must
    // evict exactly one entry.
    let cache = Cache::init(12, 10);
    cache.write("a", "/", b"AAA").unwrap();
    cache.write("b", "/", b"BBB").unwrap();
    cache.write("c", "/", b"CCC").unwrap();
    cache.write("d", "/", b"DDD").unwrap();

    let mut buf = Vec::new();
    assert_eq!(cache.read("a", "/", &mut buf).unwrap(), 3);

    // "a" is now MRU, so "b" (never read) is the oldest entry and the
    // eviction victim when "e" needs room.
    cache.write("e", "/", b"EEE").unwrap();

    let mut buf = Vec::new();
    assert!(
        cache.read("b", "/", &mut buf).is_none(),
        "b should have been evicted"
    );
    assert!(cache.read("a", "/", &mut buf).is_some());
    assert!(cache.read("c", "/", &mut buf).is_some());
    assert!(cache.read("d", "/", &mut buf).is_some());
    assert!(cache.read("e", "/", &mut buf).is_some());
}
