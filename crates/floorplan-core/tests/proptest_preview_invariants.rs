//! Property-based invariant tests for candidate diff and merge.
//!
//! 1. A diff row exists for a candidate entry iff a department of that name
//!    exists and its position differs.
//! 2. After apply, `locked` and `kind` of every surviving name equal their
//!    pre-apply values; new names are unlocked `dept` entries.
//! 3. Applying the same candidate twice yields the same roster.
//! 4. Ids in the merged roster are unique.

use std::collections::{HashMap, HashSet};

use floorplan_core::department::{DepartmentStore, DeptKind, NewDepartment};
use floorplan_core::geometry::GridRect;
use floorplan_core::preview::{OptimizationPreview, OptimizationResult, Placement, diff};
use proptest::prelude::*;

// ── Strategies ──────────────────────────────────────────────────────────

const NAMES: [&str; 6] = ["Press", "Weld", "Paint", "Assembly", "Ship", "QA"];

#[derive(Debug, Clone)]
struct Seed {
    name: usize,
    rect: GridRect,
    locked: bool,
    void: bool,
}

fn rect_strategy() -> impl Strategy<Value = GridRect> {
    (1u32..=5, 1u32..=5).prop_flat_map(|(w, h)| {
        (0u32..=30 - w, 0u32..=30 - h).prop_map(move |(x, y)| GridRect::new(x, y, w, h))
    })
}

fn seed_strategy() -> impl Strategy<Value = Seed> {
    (0..NAMES.len(), rect_strategy(), any::<bool>(), any::<bool>()).prop_map(
        |(name, rect, locked, void)| Seed {
            name,
            rect,
            locked,
            void,
        },
    )
}

fn placement_strategy() -> impl Strategy<Value = Placement> {
    (0..NAMES.len(), rect_strategy()).prop_map(|(name, rect)| Placement {
        name: NAMES[name].to_string(),
        x: rect.x,
        y: rect.y,
        width: rect.width,
        height: rect.height,
    })
}

fn build_store(seeds: &[Seed]) -> DepartmentStore {
    let mut store = DepartmentStore::new();
    for seed in seeds {
        let kind = if seed.void {
            DeptKind::Void
        } else {
            DeptKind::Dept
        };
        let id = store
            .add(
                NewDepartment {
                    name: NAMES[seed.name].to_string(),
                    kind,
                    rect: seed.rect,
                },
                30,
            )
            .unwrap()
            .id
            .clone();
        if seed.locked {
            store.toggle_lock(&id).unwrap();
        }
    }
    store
}

// ═══════════════════════════════════════════════════════════════════════
// 1. Diff rows
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn diff_row_iff_position_changed(
        seeds in proptest::collection::vec(seed_strategy(), 0..8),
        placements in proptest::collection::vec(placement_strategy(), 0..8),
    ) {
        let store = build_store(&seeds);
        let candidate = OptimizationResult { placements: placements.clone(), score: None };

        let rows = diff(&store, &candidate);

        let expected: Vec<_> = placements
            .iter()
            .filter(|p| {
                store
                    .find_by_name(&p.name)
                    .is_some_and(|d| d.x != p.x || d.y != p.y)
            })
            .map(|p| p.name.clone())
            .collect();
        let actual: Vec<_> = rows.iter().map(|r| r.name.clone()).collect();
        prop_assert_eq!(actual, expected);
        for row in &rows {
            prop_assert_ne!(row.from, row.to);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 2-4. Apply
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn apply_preserves_lock_and_kind_by_name(
        seeds in proptest::collection::vec(seed_strategy(), 0..8),
        placements in proptest::collection::vec(placement_strategy(), 0..8),
    ) {
        let mut store = build_store(&seeds);
        let before: HashMap<String, (bool, DeptKind)> = {
            let mut map = HashMap::new();
            for dept in store.iter() {
                map.entry(dept.name.clone()).or_insert((dept.locked, dept.kind));
            }
            map
        };

        let mut preview = OptimizationPreview::new();
        preview.set(OptimizationResult { placements: placements.clone(), score: None });
        let count = preview.apply(&mut store, 30).unwrap();

        prop_assert_eq!(count, placements.len());
        prop_assert!(!preview.is_pending());
        for (dept, placement) in store.iter().zip(&placements) {
            prop_assert_eq!(&dept.name, &placement.name);
            prop_assert_eq!((dept.x, dept.y), (placement.x, placement.y));
            prop_assert_eq!(dept.grid_size, 30);
            match before.get(&dept.name) {
                Some(&(locked, kind)) => {
                    prop_assert_eq!(dept.locked, locked);
                    prop_assert_eq!(dept.kind, kind);
                }
                None => {
                    prop_assert!(!dept.locked);
                    prop_assert_eq!(dept.kind, DeptKind::Dept);
                }
            }
        }
        let ids: HashSet<_> = store.iter().map(|d| d.id.clone()).collect();
        prop_assert_eq!(ids.len(), store.len());
    }

    #[test]
    fn applying_twice_is_idempotent_for_attributes(
        seeds in proptest::collection::vec(seed_strategy(), 0..8),
        placements in proptest::collection::vec(placement_strategy(), 0..8),
    ) {
        let mut store = build_store(&seeds);
        let candidate = OptimizationResult { placements, score: None };

        let mut preview = OptimizationPreview::new();
        preview.set(candidate.clone());
        preview.apply(&mut store, 30).unwrap();
        let first: Vec<_> = store
            .iter()
            .map(|d| (d.name.clone(), d.rect(), d.locked, d.kind))
            .collect();

        preview.set(candidate);
        preview.apply(&mut store, 30).unwrap();
        let second: Vec<_> = store
            .iter()
            .map(|d| (d.name.clone(), d.rect(), d.locked, d.kind))
            .collect();

        prop_assert_eq!(first, second);
    }

    #[test]
    fn discard_never_touches_roster(
        seeds in proptest::collection::vec(seed_strategy(), 0..8),
        placements in proptest::collection::vec(placement_strategy(), 0..8),
    ) {
        let store = build_store(&seeds);
        let snapshot = store.as_slice().to_vec();
        let mut preview = OptimizationPreview::new();
        preview.set(OptimizationResult { placements, score: None });
        preview.discard();
        prop_assert!(!preview.is_pending());
        prop_assert_eq!(store.as_slice(), snapshot.as_slice());
    }
}
