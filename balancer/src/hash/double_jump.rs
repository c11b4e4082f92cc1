use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use rand::Rng;

use super::jump::jump_index;

/// Decorrelates the compact lookup from the loose lookup for the same key.
pub(super) const COMPACT_KEY_MULTIPLIER: u64 = 0xc6a4a7935bd1e995;

/// Slot array that never moves a member once placed.
///
/// Removal leaves a hole that is recycled by the next add, so the slot count
/// (and therefore the jump hash bucket count) only changes on growth or
/// `shrink`.
struct LooseHolder<T> {
    slots: Vec<Option<T>>,
    index: HashMap<T, usize>,
    free: Vec<usize>,
}

impl<T: Eq + Hash + Clone> LooseHolder<T> {
    fn new() -> Self {
        Self {
            slots: Vec::new(),
            index: HashMap::new(),
            free: Vec::new(),
        }
    }

    fn add(&mut self, member: &T) {
        if self.index.contains_key(member) {
            return;
        }

        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(member.clone());
                slot
            }
            None => {
                self.slots.push(Some(member.clone()));
                self.slots.len() - 1
            }
        };
        self.index.insert(member.clone(), slot);
    }

    fn remove(&mut self, member: &T) -> bool {
        match self.index.remove(member) {
            Some(slot) => {
                self.slots[slot] = None;
                self.free.push(slot);
                true
            }
            None => false,
        }
    }

    fn get(&self, key: u64) -> Option<&T> {
        if self.slots.is_empty() {
            return None;
        }
        self.slots[jump_index(key, self.slots.len())].as_ref()
    }

    fn shrink(&mut self) {
        if self.free.is_empty() {
            return;
        }

        self.slots.retain(Option::is_some);
        for (slot, member) in self.slots.iter().enumerate() {
            if let Some(position) = member.as_ref().and_then(|m| self.index.get_mut(m)) {
                *position = slot;
            }
        }
        self.free.clear();
    }
}

/// Dense member array used when the loose lookup lands on a hole.
struct CompactHolder<T> {
    members: Vec<T>,
    index: HashMap<T, usize>,
}

impl<T: Eq + Hash + Clone> CompactHolder<T> {
    fn new() -> Self {
        Self {
            members: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn add(&mut self, member: &T) {
        if self.index.contains_key(member) {
            return;
        }

        self.members.push(member.clone());
        self.index.insert(member.clone(), self.members.len() - 1);
    }

    fn remove(&mut self, member: &T) {
        if let Some(slot) = self.index.remove(member) {
            self.members.swap_remove(slot);
            if let Some(moved) = self.members.get(slot) {
                if let Some(position) = self.index.get_mut(moved) {
                    *position = slot;
                }
            }
        }
    }

    fn get(&self, key: u64) -> Option<&T> {
        if self.members.is_empty() {
            return None;
        }
        let slot = jump_index(key.wrapping_mul(COMPACT_KEY_MULTIPLIER), self.members.len());
        self.members.get(slot)
    }

    /// Rebuilds the dense array in the given order. `order` must hold exactly
    /// the current members.
    fn realign<'a>(&mut self, order: impl Iterator<Item = &'a T>)
    where
        T: 'a,
    {
        self.members.clear();
        self.members.extend(order.cloned());
        for (slot, member) in self.members.iter().enumerate() {
            if let Some(position) = self.index.get_mut(member) {
                *position = slot;
            }
        }
    }
}

/// Jump consistent hash that supports removing members.
///
/// Plain jump hash can only grow or shrink from the end. This table keeps two
/// views of the same members:
///
/// - a loose holder whose slots never move, so removing a member only remaps
///   the keys that landed on that member;
/// - a compact holder with no holes, consulted when the loose lookup lands on
///   a vacated slot.
///
/// Add, remove and lookup are O(1). The table is not synchronized; owners wrap
/// it in their own lock.
pub struct DoubleJumpHash<T> {
    loose: LooseHolder<T>,
    compact: CompactHolder<T>,
}

impl<T: Eq + Hash + Clone> DoubleJumpHash<T> {
    pub fn new() -> Self {
        Self {
            loose: LooseHolder::new(),
            compact: CompactHolder::new(),
        }
    }

    /// Adds a member. Adding a member that is already present is a no-op.
    pub fn add(&mut self, member: T) {
        self.loose.add(&member);
        self.compact.add(&member);
    }

    /// Removes a member, returning whether it was present.
    pub fn remove(&mut self, member: &T) -> bool {
        let removed = self.loose.remove(member);
        self.compact.remove(member);
        removed
    }

    pub fn contains(&self, member: &T) -> bool {
        self.compact.index.contains_key(member)
    }

    /// Number of live members.
    pub fn len(&self) -> usize {
        self.compact.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compact.members.is_empty()
    }

    /// Size of the loose holder, holes included.
    pub fn loose_len(&self) -> usize {
        self.loose.slots.len()
    }

    /// Drops every hole from the loose holder.
    ///
    /// Keys that resolved through the loose holder may move afterwards, so this
    /// is maintenance to run after heavy churn rather than on every removal.
    pub fn shrink(&mut self) {
        self.loose.shrink();
        self.compact.realign(self.loose.slots.iter().flatten());
    }

    /// Member responsible for `key`, or `None` when the table is empty.
    pub fn get(&self, key: u64) -> Option<&T> {
        self.loose.get(key).or_else(|| self.compact.get(key))
    }

    /// Copy of every member, in compact order.
    pub fn all(&self) -> Vec<T> {
        self.compact.members.clone()
    }

    /// A uniformly random member.
    pub fn random(&self) -> Option<&T> {
        if self.compact.members.is_empty() {
            return None;
        }
        let slot = rand::thread_rng().gen_range(0..self.compact.members.len());
        self.compact.members.get(slot)
    }
}

impl<T: Eq + Hash + Clone> Default for DoubleJumpHash<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for DoubleJumpHash<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DoubleJumpHash")
            .field("members", &self.compact.members)
            .field("loose_len", &self.loose.slots.len())
            .field("holes", &self.loose.free.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn table(members: &[&str]) -> DoubleJumpHash<String> {
        let mut hash = DoubleJumpHash::new();
        for member in members {
            hash.add(member.to_string());
        }
        hash
    }

    #[test]
    fn empty_table_selects_nothing() {
        let hash: DoubleJumpHash<String> = DoubleJumpHash::new();
        assert!(hash.is_empty());
        assert_eq!(hash.get(42), None);
        assert_eq!(hash.random(), None);
        assert!(hash.all().is_empty());
    }

    #[test]
    fn duplicate_add_is_ignored() {
        let hash = table(&["a", "b", "a"]);
        assert_eq!(hash.len(), 2);
        assert_eq!(hash.loose_len(), 2);
    }

    #[test]
    fn remove_absent_member() {
        let mut hash = table(&["a"]);
        assert!(!hash.remove(&"z".to_string()));
        assert_eq!(hash.len(), 1);
    }

    #[test]
    fn remove_leaves_hole_in_loose_holder() {
        let mut hash = table(&["a", "b", "c", "d"]);
        assert!(hash.remove(&"b".to_string()));

        assert_eq!(hash.len(), 3);
        assert_eq!(hash.loose_len(), 4);
        assert!(!hash.contains(&"b".to_string()));
        // swap-remove moves the last member into the vacated compact slot
        assert_eq!(hash.all(), vec!["a", "d", "c"]);
    }

    #[test]
    fn lookups_on_holes_fall_back_to_compact() {
        let mut hash = table(&["a", "b", "c"]);
        hash.remove(&"b".to_string());

        for key in 0..10_000u64 {
            let member = hash.get(key).expect("non-empty table always resolves");
            assert_ne!(member, "b", "key {key} resolved to removed member");
        }
    }

    #[test]
    fn removal_only_moves_keys_of_removed_member() {
        let members: Vec<String> = (0..10).map(|i| format!("node-{i}")).collect();
        let mut hash = DoubleJumpHash::new();
        for member in &members {
            hash.add(member.clone());
        }

        let before: Vec<String> = (0..10_000u64)
            .map(|key| hash.get(key).cloned().unwrap_or_default())
            .collect();

        let removed = "node-3".to_string();
        hash.remove(&removed);

        for (key, owner) in before.iter().enumerate() {
            if *owner == removed {
                continue;
            }
            assert_eq!(
                hash.get(key as u64),
                Some(owner),
                "key {key} moved although its owner survived"
            );
        }
    }

    #[test]
    fn freed_slot_is_reused() {
        let mut hash = table(&["a", "b", "c"]);
        let owned_by_b: Vec<u64> = (0..5_000u64)
            .filter(|key| hash.get(*key).map(String::as_str) == Some("b"))
            .collect();
        assert!(!owned_by_b.is_empty());

        hash.remove(&"b".to_string());
        hash.add("d".to_string());
        assert_eq!(hash.loose_len(), 3);

        for key in owned_by_b {
            assert_eq!(hash.get(key).map(String::as_str), Some("d"));
        }
    }

    #[test]
    fn shrink_compacts_loose_holder() {
        let mut hash = table(&["a", "b", "c", "d"]);
        hash.remove(&"b".to_string());
        hash.shrink();

        assert_eq!(hash.loose_len(), 3);
        assert_eq!(hash.len(), 3);
        assert_eq!(hash.all(), vec!["a", "c", "d"]);

        // indices must survive the rebuild
        hash.remove(&"d".to_string());
        assert_eq!(hash.all(), vec!["a", "c"]);
        for key in 0..1_000u64 {
            assert_ne!(hash.get(key).map(String::as_str), Some("d"));
        }
    }

    #[test]
    fn shrink_without_holes_is_noop() {
        let mut hash = table(&["a", "b"]);
        let before: Vec<Option<String>> = (0..100u64).map(|k| hash.get(k).cloned()).collect();
        hash.shrink();
        let after: Vec<Option<String>> = (0..100u64).map(|k| hash.get(k).cloned()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn random_returns_members() {
        let hash = table(&["a", "b", "c"]);
        let seen: HashSet<String> = (0..500).filter_map(|_| hash.random().cloned()).collect();
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn lookup_is_deterministic() {
        let first = table(&["a", "b", "c", "d"]);
        let second = table(&["a", "b", "c", "d"]);
        for key in 0..1_000u64 {
            assert_eq!(first.get(key), second.get(key));
        }
    }
}
