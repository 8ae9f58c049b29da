//! Item graph helpers.
//!
//! Pure functions over the template catalog and inventory item lists:
//! ancestry classification, stack sizes, subtree extraction and stash
//! bin-packing.

use std::collections::HashSet;

use tracing::error;

use crate::db::profile::PmcProfile;
use crate::db::template::ItemTemplate;
use crate::db::{GridLocation, Item, ItemLocation, Rotation, Templates};
use crate::ids;
use crate::reference::{AMMO_BOX_PARENT, AMMO_PARENT, MEDICAL_PARENT, MONEY, POCKETS_BASE};

/// Upper bound on parent hops when walking template ancestry.
pub const MAX_ANCESTRY_HOPS: usize = 12;

/// Stash width in cells.
pub const STASH_COLUMNS: usize = 10;

fn template<'a>(templates: &'a Templates, tpl: &str) -> Option<&'a ItemTemplate> {
    if !ids::is_valid(tpl) {
        return None;
    }
    templates.item(tpl)
}

/// Whether `parent_id` appears in the ancestry of `item` within the hop bound.
///
/// The template itself is not its own ancestor.
pub fn has_parent(templates: &Templates, item: &ItemTemplate, parent_id: &str) -> bool {
    let mut current = item;
    for _ in 0..MAX_ANCESTRY_HOPS {
        let parent = current.parent.as_str();
        if parent.is_empty() {
            return false;
        }
        if ids::same(parent, parent_id) {
            return true;
        }
        match template(templates, parent) {
            Some(next) => current = next,
            None => return false,
        }
    }
    false
}

fn descends_from(templates: &Templates, tpl: &str, parent_id: &str) -> bool {
    template(templates, tpl).is_some_and(|item| has_parent(templates, item, parent_id))
}

pub fn is_ammo_box(templates: &Templates, tpl: &str) -> bool {
    descends_from(templates, tpl, AMMO_BOX_PARENT)
}

/// Loose rounds. An ammo box is never ammo.
pub fn is_ammo(templates: &Templates, tpl: &str) -> bool {
    template(templates, tpl).is_some_and(|item| {
        !has_parent(templates, item, AMMO_BOX_PARENT) && has_parent(templates, item, AMMO_PARENT)
    })
}

pub fn is_medical(templates: &Templates, tpl: &str) -> bool {
    descends_from(templates, tpl, MEDICAL_PARENT)
}

pub fn is_money(tpl: &str) -> bool {
    MONEY.iter().any(|m| *m == tpl)
}

/// Pockets templates: the pockets base itself or anything descending from it
pub fn is_pockets_template(templates: &Templates, tpl: &str) -> bool {
    ids::same(tpl, POCKETS_BASE) || descends_from(templates, tpl, POCKETS_BASE)
}

/// Declared max stack, or `fallback` when unknown or below 1
pub fn stack_max_size(templates: &Templates, tpl: &str, fallback: i64) -> i64 {
    template(templates, tpl)
        .and_then(|item| item.props.stack_max_size)
        .filter(|max| *max >= 1)
        .unwrap_or(fallback)
}

pub fn is_stackable(templates: &Templates, tpl: &str) -> bool {
    template(templates, tpl)
        .and_then(|item| item.props.stack_max_size)
        .is_some_and(|max| max > 1)
}

/// Collect `root` and every item transitively parented to it.
///
/// Root first, then discovery order. Terminates on cycles and dangling
/// parents because the id set only grows.
pub fn item_tree<'a>(items: &'a [Item], root: &'a Item) -> Vec<&'a Item> {
    let mut result = vec![root];
    let mut seen: HashSet<String> = HashSet::from([root.id.to_ascii_lowercase()]);

    loop {
        let before = seen.len();
        for item in items {
            let id = item.id.to_ascii_lowercase();
            if seen.contains(&id) {
                continue;
            }
            let parent_seen = item
                .parent_id
                .as_deref()
                .is_some_and(|p| seen.contains(&p.to_ascii_lowercase()));
            if parent_seen {
                seen.insert(id);
                result.push(item);
            }
        }
        if seen.len() == before {
            break;
        }
    }

    result
}

/// Lowercased ids of `root_id` and its descendants
pub fn item_tree_ids(items: &[Item], root_id: &str) -> HashSet<String> {
    match items.iter().find(|i| ids::same(&i.id, root_id)) {
        Some(root) => item_tree(items, root)
            .into_iter()
            .map(|i| i.id.to_ascii_lowercase())
            .collect(),
        None => HashSet::new(),
    }
}

/// Stash rows granted by the profile's stash size bonuses.
pub fn stash_rows(profile: &PmcProfile) -> usize {
    let Some(bonuses) = &profile.bonuses else {
        return 70;
    };
    match bonuses.iter().filter(|b| b.kind == "StashSize").count() {
        1 => 30,
        2 => 40,
        3 => 50,
        _ => 70,
    }
}

/// Split `total` into stacks of at most `batch`: full stacks first, then the remainder
pub fn split_stacks(total: i64, batch: i64) -> Vec<i64> {
    if total <= 0 || batch <= 0 {
        return Vec::new();
    }
    let mut stacks = vec![batch; (total / batch) as usize];
    if total % batch > 0 {
        stacks.push(total % batch);
    }
    stacks
}

/// Row-major occupancy map of a stash.
#[derive(Debug, Clone)]
pub struct StashGrid {
    cells: Vec<[bool; STASH_COLUMNS]>,
}

impl StashGrid {
    pub fn new(rows: usize) -> Self {
        StashGrid {
            cells: vec![[false; STASH_COLUMNS]; rows],
        }
    }

    pub fn rows(&self) -> usize {
        self.cells.len()
    }

    pub fn is_occupied(&self, x: usize, y: usize) -> bool {
        self.cells.get(y).is_some_and(|row| x < STASH_COLUMNS && row[x])
    }

    /// Cells covered by a footprint, clipped to the grid
    fn rect(&self, x: i64, y: i64, width: i64, height: i64, rotation: Rotation) -> Vec<(usize, usize)> {
        let (span_w, span_h) = match rotation {
            Rotation::Horizontal => (width, height),
            Rotation::Vertical => (height, width),
        };
        let mut cells = Vec::new();
        for iy in y..y + span_h {
            for ix in x..x + span_w {
                if iy < 0 || ix < 0 || iy as usize >= self.rows() || ix as usize >= STASH_COLUMNS {
                    continue;
                }
                cells.push((ix as usize, iy as usize));
            }
        }
        cells
    }

    pub fn mark(&mut self, x: i64, y: i64, width: i64, height: i64, rotation: Rotation) {
        for (ix, iy) in self.rect(x, y, width, height, rotation) {
            self.cells[iy][ix] = true;
        }
    }

    /// First free top-left cell for an unrotated footprint, scanning rows then columns
    pub fn find_free(&self, width: i64, height: i64) -> Option<(i64, i64)> {
        let width = width.max(1);
        let height = height.max(1);
        for r in 0..self.rows() {
            for c in 0..STASH_COLUMNS {
                if self.cells[r][c] || width > (STASH_COLUMNS - c) as i64 {
                    continue;
                }
                if height > (self.rows() - r) as i64 {
                    continue;
                }
                let fits = self
                    .rect(c as i64, r as i64, width, height, Rotation::Horizontal)
                    .into_iter()
                    .all(|(ix, iy)| !self.cells[iy][ix]);
                if fits {
                    return Some((c as i64, r as i64));
                }
            }
        }
        None
    }
}

/// Place every unplaced stash item into the first free cell.
///
/// Items that already have a grid location are kept where they are. Returns
/// the number of items that could not be placed; those stay without a
/// location.
pub fn fill_locations(profile: &mut PmcProfile, templates: &Templates) -> usize {
    let mut grid = StashGrid::new(stash_rows(profile));
    let Some(stash_id) = profile.stash_id().map(str::to_string) else {
        return 0;
    };
    let items = &mut profile.inventory.items;

    for item in items.iter().filter(|i| i.parent_is(&stash_id)) {
        let Some(ItemLocation::Grid(location)) = &item.location else {
            continue;
        };
        let Some(tpl) = templates.item(&item.tpl) else {
            continue;
        };
        grid.mark(location.x, location.y, tpl.width(), tpl.height(), location.r);
    }

    let mut unplaced = 0;
    for item in items.iter_mut().filter(|i| i.parent_is(&stash_id)) {
        if item.location.is_some() {
            continue;
        }
        let Some(tpl) = templates.item(&item.tpl) else {
            continue;
        };

        let Some((x, y)) = grid.find_free(tpl.width(), tpl.height()) else {
            error!(item = %item.id, template = %item.tpl, "could not place item in stash");
            unplaced += 1;
            continue;
        };

        grid.mark(x, y, tpl.width(), tpl.height(), Rotation::Horizontal);
        item.location = Some(ItemLocation::Grid(GridLocation {
            x,
            y,
            r: Rotation::Horizontal,
            is_searched: Some(true),
        }));
    }

    unplaced
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::profile::Bonus;
    use serde_json::json;

    pub(crate) fn tpl(id: &str, parent: &str, props: serde_json::Value) -> ItemTemplate {
        serde_json::from_value(json!({ "_id": id, "_parent": parent, "_props": props })).unwrap()
    }

    fn catalog() -> Templates {
        let mut t = Templates::default();
        for item in [
            tpl(AMMO_PARENT, "54009119af1c881c07000029", json!({})),
            tpl(AMMO_BOX_PARENT, "54009119af1c881c07000029", json!({})),
            tpl(MEDICAL_PARENT, "54009119af1c881c07000029", json!({})),
            tpl("000000000000000000000a01", AMMO_PARENT, json!({ "StackMaxSize": 60 })),
            tpl("000000000000000000000b01", AMMO_BOX_PARENT, json!({ "StackMaxSize": 1 })),
            tpl("000000000000000000000c01", MEDICAL_PARENT, json!({ "StackMaxSize": 0 })),
            tpl("000000000000000000000d01", "000000000000000000000d02", json!({})),
            tpl("000000000000000000000d02", "000000000000000000000d01", json!({})),
            tpl("000000000000000000000e01", "", json!({ "Width": 2, "Height": 2 })),
            tpl("000000000000000000000e02", "", json!({ "Width": 10, "Height": 1 })),
        ] {
            t.items.insert(item.id.clone(), item);
        }
        t
    }

    #[test]
    fn test_classification() {
        let t = catalog();
        assert!(is_ammo(&t, "000000000000000000000a01"));
        assert!(!is_ammo(&t, "000000000000000000000b01"));
        assert!(is_ammo_box(&t, "000000000000000000000b01"));
        assert!(is_medical(&t, "000000000000000000000c01"));
        assert!(!is_medical(&t, "000000000000000000000a01"));
    }

    #[test]
    fn test_classification_of_missing_or_invalid() {
        let t = catalog();
        assert!(!is_ammo(&t, "not-an-id"));
        assert!(!is_ammo(&t, "ffffffffffffffffffffffff"));
        assert!(!is_medical(&t, ""));
    }

    #[test]
    fn test_cyclic_ancestry_terminates() {
        let t = catalog();
        assert!(!is_ammo(&t, "000000000000000000000d01"));
        assert!(!is_ammo_box(&t, "000000000000000000000d02"));
    }

    #[test]
    fn test_stack_sizes() {
        let t = catalog();
        assert_eq!(stack_max_size(&t, "000000000000000000000a01", 30), 60);
        assert_eq!(stack_max_size(&t, "000000000000000000000c01", 30), 30);
        assert_eq!(stack_max_size(&t, "ffffffffffffffffffffffff", 7), 7);
        assert!(is_stackable(&t, "000000000000000000000a01"));
        assert!(!is_stackable(&t, "000000000000000000000b01"));
    }

    #[test]
    fn test_is_money() {
        assert!(is_money("5449016a4bdc2d6f028b456f"));
        assert!(!is_money("000000000000000000000a01"));
    }

    #[test]
    fn test_item_tree_closure() {
        // Shuffled order, a cycle between x and y, a dangling parent
        let items = vec![
            Item::new("c", "t").with_parent("b", "s"),
            Item::new("x", "t").with_parent("y", "s"),
            Item::new("b", "t").with_parent("a", "s"),
            Item::new("y", "t").with_parent("x", "s"),
            Item::new("a", "t").with_parent("root", "s"),
            Item::new("z", "t").with_parent("ghost", "s"),
            Item::new("d", "t").with_parent("A", "s"),
        ];
        let root = &items[4];
        let tree: Vec<&str> = item_tree(&items, root).iter().map(|i| i.id.as_str()).collect();
        assert_eq!(tree[0], "a");
        let mut sorted = tree.clone();
        sorted.sort();
        assert_eq!(sorted, vec!["a", "b", "c", "d"]);

        let set: HashSet<&str> = tree.iter().copied().collect();
        for item in &items {
            let parent_in = item
                .parent_id
                .as_deref()
                .is_some_and(|p| set.contains(p.to_ascii_lowercase().as_str()));
            if parent_in {
                assert!(set.contains(item.id.as_str()));
            }
        }
    }

    #[test]
    fn test_stash_rows() {
        let mut profile = PmcProfile::default();
        assert_eq!(stash_rows(&profile), 70);
        let bonus = |k: &str| Bonus {
            kind: k.to_string(),
            ..Default::default()
        };
        profile.bonuses = Some(vec![]);
        assert_eq!(stash_rows(&profile), 70);
        profile.bonuses = Some(vec![bonus("StashSize"), bonus("Other")]);
        assert_eq!(stash_rows(&profile), 30);
        profile.bonuses = Some(vec![bonus("StashSize"); 3]);
        assert_eq!(stash_rows(&profile), 50);
        profile.bonuses = Some(vec![bonus("StashSize"); 4]);
        assert_eq!(stash_rows(&profile), 70);
    }

    #[test]
    fn test_split_stacks() {
        assert_eq!(split_stacks(90, 30), vec![30, 30, 30]);
        assert_eq!(split_stacks(65, 30), vec![30, 30, 5]);
        assert_eq!(split_stacks(7, 30), vec![7]);
        assert!(split_stacks(0, 30).is_empty());
        for total in 1..200 {
            for batch in 1..40 {
                let stacks = split_stacks(total, batch);
                assert_eq!(stacks.iter().sum::<i64>(), total);
                assert!(stacks.iter().all(|s| *s <= batch && *s > 0));
                assert_eq!(stacks.len() as i64, (total + batch - 1) / batch);
            }
        }
    }

    fn stash_profile(rows_bonus: usize) -> PmcProfile {
        let mut profile = PmcProfile::default();
        profile.inventory.stash = Some("stash".into());
        profile.bonuses = Some(vec![
            Bonus {
                kind: "StashSize".into(),
                ..Default::default()
            };
            rows_bonus
        ]);
        profile
    }

    fn footprint(item: &Item, t: &Templates) -> (i64, i64, i64, i64) {
        let g = item.location.as_ref().and_then(|l| l.grid()).unwrap();
        let tpl = t.item(&item.tpl).unwrap();
        let (w, h) = match g.r {
            Rotation::Horizontal => (tpl.width(), tpl.height()),
            Rotation::Vertical => (tpl.height(), tpl.width()),
        };
        (g.x, g.y, w, h)
    }

    #[test]
    fn test_fill_locations_non_overlap() {
        let t = catalog();
        let mut profile = stash_profile(1);
        let mut existing = Item::new("fixed", "000000000000000000000e01").with_parent("stash", "hideout");
        existing.location = Some(ItemLocation::Grid(GridLocation {
            x: 0,
            y: 0,
            r: Rotation::Vertical,
            is_searched: None,
        }));
        profile.inventory.items.push(existing);
        for i in 0..20 {
            let tpl_id = if i % 3 == 0 {
                "000000000000000000000e01"
            } else {
                "000000000000000000000a01"
            };
            profile
                .inventory
                .items
                .push(Item::new(format!("i{i}"), tpl_id).with_parent("stash", "hideout"));
        }
        profile
            .inventory
            .items
            .push(Item::new("wide", "000000000000000000000e02").with_parent("stash", "hideout"));

        assert_eq!(fill_locations(&mut profile, &t), 0);

        let placed: Vec<_> = profile.inventory.items.iter().map(|i| footprint(i, &t)).collect();
        for (i, a) in placed.iter().enumerate() {
            assert!(a.0 >= 0 && a.1 >= 0);
            assert!(a.0 + a.2 <= STASH_COLUMNS as i64);
            assert!(a.1 + a.3 <= 30);
            for b in placed.iter().skip(i + 1) {
                let overlap = a.0 < b.0 + b.2 && b.0 < a.0 + a.2 && a.1 < b.1 + b.3 && b.1 < a.1 + a.3;
                assert!(!overlap, "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn test_fill_locations_reports_unplaced() {
        let t = catalog();
        let mut profile = stash_profile(1);
        for i in 0..31 {
            profile
                .inventory
                .items
                .push(Item::new(format!("w{i}"), "000000000000000000000e02").with_parent("stash", "hideout"));
        }
        assert_eq!(fill_locations(&mut profile, &t), 1);
        assert!(profile.inventory.items[30].location.is_none());
    }

    #[test]
    fn test_height_bound_is_enforced() {
        let mut grid = StashGrid::new(3);
        grid.mark(0, 0, 10, 2, Rotation::Horizontal);
        assert_eq!(grid.find_free(2, 2), None);
        assert_eq!(grid.find_free(2, 1), Some((0, 2)));
        assert!(grid.is_occupied(9, 1));
        assert!(!grid.is_occupied(0, 2));
    }

    #[test]
    fn test_cells_past_last_column_are_free() {
        let mut grid = StashGrid::new(1);
        grid.mark(0, 0, STASH_COLUMNS as i64, 1, Rotation::Horizontal);
        assert!(grid.is_occupied(STASH_COLUMNS - 1, 0));
        assert!(!grid.is_occupied(STASH_COLUMNS, 0));
        assert!(!grid.is_occupied(0, 1));
    }
}
