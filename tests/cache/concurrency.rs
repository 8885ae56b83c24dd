//! Lookups running while the set is rebuilt or reloaded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crate::common::{completion, make_map, memory_cache, numbered_map};
use vlpset::Completion;

const ROUNDS: usize = 200;
const READERS: usize = 4;

#[test]
fn readers_see_old_or_new_set_never_a_mix() {
    let (cache, _) = memory_cache();
    cache.build(&mut make_map(&[("alph", 4)]));

    let alph = completion("alph");
    let beta = completion("beta");
    let done = AtomicBool::new(false);

    thread::scope(|s| {
        for _ in 0..READERS {
            s.spawn(|| {
                while !done.load(Ordering::Acquire) {
                    let set = cache.snapshot();
                    let a = set.matches(&alph).is_some();
                    let b = set.matches(&beta).is_some();
                    assert!(a != b, "snapshot holds alph={} beta={}", a, b);
                    assert_eq!(set.prefix_count(), 1);
                }
            });
        }

        for round in 0..ROUNDS {
            let fragment = if round % 2 == 0 { "beta" } else { "alph" };
            cache.build(&mut make_map(&[(fragment, 4)]));
        }
        done.store(true, Ordering::Release);
    });

    // ROUNDS is even, so the last build put alph back.
    assert!(cache.has(&alph).has);
    assert!(!cache.has(&beta).has);
}

#[test]
fn lookups_during_reload_are_consistent() {
    let (cache, _store) = memory_cache();
    cache.build(&mut numbered_map(500, 4));
    cache.write_file().unwrap();

    let queries: Vec<Completion> = (0..500)
        .map(|i| completion(&format!("host{}.example/", i)))
        .collect();
    let done = AtomicBool::new(false);

    thread::scope(|s| {
        for _ in 0..READERS {
            s.spawn(|| {
                while !done.load(Ordering::Acquire) {
                    let set = cache.snapshot();
                    let hits = queries.iter().filter(|p| set.matches(p).is_some()).count();
                    assert!(hits == 0 || hits == queries.len(), "partial set: {}", hits);
                }
            });
        }

        for round in 0..ROUNDS / 4 {
            if round % 2 == 0 {
                cache.clear_all();
            } else {
                cache.load_file().unwrap();
            }
        }
        done.store(true, Ordering::Release);
    });
}
