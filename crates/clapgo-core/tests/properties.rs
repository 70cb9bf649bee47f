use std::collections::HashSet;

use clapgo_core::{
    Event, EventBridge, EventHandle, EventPool, ManagerConfig, NoteEvent, ParameterInfo,
    ParameterManager, PoolConfig, SetOutcome,
};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum PoolOp {
    Acquire,
    Release { hint: u8 },
    Reset,
}

fn pool_op_strategy() -> impl Strategy<Value = PoolOp> {
    prop_oneof![
        4 => Just(PoolOp::Acquire),
        2 => any::<u8>().prop_map(|hint| PoolOp::Release { hint }),
        1 => Just(PoolOp::Reset),
    ]
}

fn range_strategy() -> impl Strategy<Value = (f64, f64, f64)> {
    (-1000.0f64..1000.0, 0.0f64..1000.0, 0.0f64..=1.0)
        .prop_map(|(min, span, t)| (min, min + span, min + span * t))
}

proptest! {
    #[test]
    fn test_live_handles_never_alias(
        capacity in 1usize..24,
        ops in prop::collection::vec(pool_op_strategy(), 1..200),
    ) {
        let mut pool = EventPool::new(capacity).unwrap();
        let mut live: Vec<EventHandle> = Vec::new();
        let mut expected_drops = 0u64;

        for op in ops {
            match op {
                PoolOp::Acquire => match pool.acquire() {
                    Some(handle) => live.push(handle),
                    None => {
                        prop_assert_eq!(live.len(), capacity);
                        expected_drops += 1;
                    }
                },
                PoolOp::Release { hint } => {
                    if !live.is_empty() {
                        let handle = live.swap_remove(hint as usize % live.len());
                        prop_assert!(pool.release(handle));
                    }
                }
                PoolOp::Reset => {
                    pool.reset();
                    for handle in &live {
                        prop_assert!(!pool.is_live(handle));
                    }
                    live.clear();
                }
            }

            let indices: HashSet<usize> = live.iter().map(EventHandle::index).collect();
            prop_assert_eq!(indices.len(), live.len());
            prop_assert!(live.len() <= capacity);
            prop_assert_eq!(pool.in_use(), live.len());
            for handle in &live {
                prop_assert!(pool.is_live(handle));
            }
        }

        prop_assert_eq!(pool.dropped(), expected_drops);
    }

    #[test]
    fn test_capacity_is_a_hard_ceiling(capacity in 1usize..64, extra in 1usize..16) {
        let mut pool = EventPool::new(capacity).unwrap();
        let mut held = Vec::new();

        for key in 0..capacity + extra {
            let note = NoteEvent::new(0, 0, (key % 128) as i16, 1.0);
            if let Some(handle) = pool.stage(Event::note_on(key as u32, note)) {
                held.push(handle);
            }
        }

        prop_assert_eq!(held.len(), capacity);
        prop_assert_eq!(pool.dropped(), extra as u64);
        for (key, handle) in held.iter().enumerate() {
            prop_assert_eq!(pool.get(handle).map(Event::time), Some(key as u32));
        }
    }

    #[test]
    fn test_clamping_is_idempotent((min, max, default) in range_strategy(), value in -5000.0f64..5000.0) {
        let mut params = ParameterManager::new(ManagerConfig::default()).unwrap();
        params.register(ParameterInfo::new(7, "P", min, max, default)).unwrap();

        params.set_value(7, value).unwrap();
        let stored = params.value(7).unwrap();
        prop_assert_eq!(stored, value.clamp(min, max));

        prop_assert_eq!(params.set_value(7, stored).unwrap(), SetOutcome::Unchanged);
        prop_assert_eq!(params.value(7).unwrap(), stored);
    }

    #[test]
    fn test_every_out_of_range_set_reports_clamp(
        (min, max, default) in range_strategy(),
        excess in 1.0f64..5000.0,
        repeats in 1usize..5,
    ) {
        let mut params = ParameterManager::new(ManagerConfig::default()).unwrap();
        params.register(ParameterInfo::new(7, "P", min, max, default)).unwrap();

        let requested = max + excess;
        for _ in 0..repeats {
            prop_assert_eq!(
                params.set_value(7, requested).unwrap(),
                SetOutcome::Clamped { requested, stored: max }
            );
        }
        prop_assert_eq!(params.clamp_count(), repeats as u64);
        prop_assert_eq!(params.value(7).unwrap(), max);
    }

    #[test]
    fn test_registration_order_is_enumeration_order(ids in prop::collection::hash_set(any::<u32>(), 1..48)) {
        let ids: Vec<u32> = ids.into_iter().collect();

        for _ in 0..2 {
            let mut params = ParameterManager::new(ManagerConfig::default()).unwrap();
            params
                .register_all(ids.iter().map(|&id| ParameterInfo::new(id, "P", 0.0, 1.0, 0.5)))
                .unwrap();

            prop_assert_eq!(params.count(), ids.len());
            for (index, &id) in ids.iter().enumerate() {
                prop_assert_eq!(params.info_by_index(index).map(|info| info.id), Some(id));
            }
            prop_assert!(params.info_by_index(ids.len()).is_none());
        }
    }

    #[test]
    fn test_dispatch_order_is_stable_by_time(times in prop::collection::vec(0u32..32, 1..64)) {
        let mut bridge = EventBridge::new(&PoolConfig::new().with_capacity(64)).unwrap();
        bridge.begin_block(32);

        for (key, &time) in times.iter().enumerate() {
            let note = NoteEvent::new(0, 0, key as i16, 1.0);
            prop_assert!(bridge.push_input(Event::note_on(time, note)));
        }

        let mut expected: Vec<(u32, i16)> = times
            .iter()
            .enumerate()
            .map(|(key, &time)| (time, key as i16))
            .collect();
        expected.sort_by_key(|&(time, _)| time);

        let actual: Vec<(u32, i16)> = bridge
            .events()
            .map(|event| match event.body {
                clapgo_core::EventBody::NoteOn(note) => (event.time(), note.key),
                _ => (u32::MAX, -1),
            })
            .collect();
        prop_assert_eq!(actual, expected);
    }
}
