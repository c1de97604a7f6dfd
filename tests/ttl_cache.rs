mod test_support;

use edutracker::cache::{FileStore, Lookup, ManualClock, MemoryStore, TtlCache};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use test_support::temp_dir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Summary {
    courses: u32,
    label: String,
}

fn summary(n: u32) -> Summary {
    Summary {
        courses: n,
        label: format!("{n} courses"),
    }
}

const TTL: Duration = Duration::from_secs(300);
const REFRESH: Duration = Duration::from_secs(180);

#[test]
fn entries_age_from_fresh_to_stale_to_gone() {
    let clock = ManualClock::starting_at(1_000_000);
    let mut cache: TtlCache<Summary, _, _> =
        TtlCache::new("dash", MemoryStore::new(), clock.clone(), TTL, REFRESH);

    assert_eq!(cache.get("u1").unwrap(), Lookup::Miss);
    cache.put("u1", &summary(3)).unwrap();
    assert_eq!(cache.get("u1").unwrap(), Lookup::Fresh(summary(3)));

    clock.advance(REFRESH);
    assert_eq!(cache.get("u1").unwrap(), Lookup::Fresh(summary(3)));

    clock.advance(Duration::from_secs(1));
    match cache.get("u1").unwrap() {
        Lookup::Stale { value, age } => {
            assert_eq!(value, summary(3));
            assert_eq!(age, REFRESH + Duration::from_secs(1));
        }
        other => panic!("expected stale, got {other:?}"),
    }

    clock.advance(TTL - REFRESH);
    assert_eq!(cache.get("u1").unwrap(), Lookup::Miss);
}

#[test]
fn put_resets_the_age() {
    let clock = ManualClock::starting_at(0);
    let mut cache: TtlCache<Summary, _, _> =
        TtlCache::new("dash", MemoryStore::new(), clock.clone(), TTL, REFRESH);
    cache.put("u1", &summary(1)).unwrap();
    clock.advance(Duration::from_secs(250));
    assert!(matches!(cache.get("u1").unwrap(), Lookup::Stale { .. }));

    cache.put("u1", &summary(2)).unwrap();
    assert_eq!(cache.get("u1").unwrap(), Lookup::Fresh(summary(2)));
}

#[test]
fn invalidate_only_drops_its_key() {
    let clock = ManualClock::starting_at(0);
    let mut cache: TtlCache<Summary, _, _> =
        TtlCache::new("dash", MemoryStore::new(), clock, TTL, REFRESH);
    cache.put("u1", &summary(1)).unwrap();
    cache.put("u2", &summary(2)).unwrap();
    cache.invalidate("u1").unwrap();
    // Removing a missing key is not an error.
    cache.invalidate("u1").unwrap();

    assert_eq!(cache.get("u1").unwrap(), Lookup::Miss);
    assert_eq!(cache.get("u2").unwrap(), Lookup::Fresh(summary(2)));
    assert_eq!(cache.store().len(), 1);
}

#[test]
fn namespaces_share_a_store_without_colliding() {
    let dir = temp_dir("edutracker-cache-ns");
    let clock = ManualClock::starting_at(0);
    let mut a: TtlCache<Summary, _, _> =
        TtlCache::new("a", FileStore::new(&dir), clock.clone(), TTL, REFRESH);
    let b: TtlCache<Summary, _, _> = TtlCache::new("b", FileStore::new(&dir), clock, TTL, REFRESH);
    a.put("k", &summary(1)).unwrap();
    assert_eq!(b.get("k").unwrap(), Lookup::Miss);
}

#[test]
fn file_store_survives_reopen() {
    let dir = temp_dir("edutracker-cache-file");
    let clock = ManualClock::starting_at(5_000);
    {
        let mut cache: TtlCache<Summary, _, _> =
            TtlCache::new("dash", FileStore::new(&dir), clock.clone(), TTL, REFRESH);
        cache.put("user/with odd:chars", &summary(7)).unwrap();
    }
    let cache: TtlCache<Summary, _, _> =
        TtlCache::new("dash", FileStore::new(&dir), clock.clone(), TTL, REFRESH);
    assert_eq!(
        cache.get("user/with odd:chars").unwrap(),
        Lookup::Fresh(summary(7))
    );

    clock.advance(TTL);
    assert_eq!(cache.get("user/with odd:chars").unwrap(), Lookup::Miss);
}

#[test]
fn unreadable_cache_file_is_a_miss() {
    let dir = temp_dir("edutracker-cache-corrupt");
    let clock = ManualClock::starting_at(0);
    let mut cache: TtlCache<Summary, _, _> =
        TtlCache::new("dash", FileStore::new(&dir), clock, TTL, REFRESH);
    cache.put("u1", &summary(1)).unwrap();
    for entry in std::fs::read_dir(&dir).unwrap() {
        std::fs::write(entry.unwrap().path(), "{ not json").unwrap();
    }
    assert_eq!(cache.get("u1").unwrap(), Lookup::Miss);
}

#[test]
fn payload_of_another_shape_is_a_miss() {
    let dir = temp_dir("edutracker-cache-shape");
    let clock = ManualClock::starting_at(0);
    let mut numbers: TtlCache<u64, _, _> =
        TtlCache::new("dash", FileStore::new(&dir), clock.clone(), TTL, REFRESH);
    numbers.put("u1", &42).unwrap();
    let cache: TtlCache<Summary, _, _> =
        TtlCache::new("dash", FileStore::new(&dir), clock, TTL, REFRESH);
    assert_eq!(cache.get("u1").unwrap(), Lookup::Miss);
}

#[test]
fn refresh_age_is_clamped_to_ttl() {
    let clock = ManualClock::starting_at(0);
    let mut cache: TtlCache<Summary, _, _> = TtlCache::new(
        "dash",
        MemoryStore::new(),
        clock.clone(),
        Duration::from_secs(10),
        Duration::from_secs(60),
    );
    cache.put("u1", &summary(1)).unwrap();
    clock.advance(Duration::from_secs(9));
    assert_eq!(cache.get("u1").unwrap(), Lookup::Fresh(summary(1)));
    clock.advance(Duration::from_secs(1));
    assert_eq!(cache.get("u1").unwrap(), Lookup::Miss);
}
