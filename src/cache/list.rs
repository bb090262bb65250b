//! Entry List Module
//!
//! Arena-backed doubly linked list that keeps entries in recency order.

// == Handle ==
/// Stable reference to a node in an [`EntryList`].
///
/// The version is bumped every time a slot is vacated, so a handle to a
/// removed node never resolves to whatever reuses its slot later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: usize,
    version: u64,
}

#[derive(Debug)]
struct Slot<T> {
    value: Option<T>,
    version: u64,
    prev: Option<usize>,
    next: Option<usize>,
}

// == Entry List ==
/// Doubly linked list stored in a growable slot table.
///
/// - Head = Most recently used
/// - Tail = Least recently used
///
/// Links are slot indices, so append, removal and move-to-front are O(1)
/// and never search.
#[derive(Debug)]
pub struct EntryList<T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<T> Default for EntryList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EntryList<T> {
    // == Constructor ==
    /// Creates a new empty list.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty list with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    // == Append ==
    /// Inserts a value at the tail and returns its handle.
    pub fn append(&mut self, value: T) -> Handle {
        let index = self.alloc(value);
        self.link_back(index);
        self.len += 1;
        Handle {
            index,
            version: self.slots[index].version,
        }
    }

    // == Move To Front ==
    /// Moves an existing node to the head.
    ///
    /// Returns `false` if the handle is stale.
    pub fn move_to_front(&mut self, handle: Handle) -> bool {
        let Some(index) = self.resolve(handle) else {
            return false;
        };
        if self.head != Some(index) {
            self.unlink(index);
            self.link_front(index);
        }
        true
    }

    // == Remove ==
    /// Detaches a node by handle and returns its value.
    ///
    /// Returns `None` if the handle is stale.
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        let index = self.resolve(handle)?;
        self.unlink(index);
        let slot = &mut self.slots[index];
        slot.version += 1;
        self.free.push(index);
        self.len -= 1;
        slot.value.take()
    }

    // == Clear ==
    /// Removes every node. All outstanding handles become stale.
    pub fn clear(&mut self) {
        self.free.clear();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.value.take().is_some() {
                slot.version += 1;
            }
            slot.prev = None;
            slot.next = None;
            self.free.push(index);
        }
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    // == Accessors ==
    /// Handle of the least recently used node.
    pub fn last(&self) -> Option<Handle> {
        self.tail.map(|index| self.handle_at(index))
    }

    /// Handle of the most recently used node.
    pub fn first(&self) -> Option<Handle> {
        self.head.map(|index| self.handle_at(index))
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        let index = self.resolve(handle)?;
        self.slots[index].value.as_ref()
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        let index = self.resolve(handle)?;
        self.slots[index].value.as_mut()
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.resolve(handle).is_some()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates values from head (most recent) to tail (least recent).
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.head,
            remaining: self.len,
        }
    }

    // == Internals ==
    fn resolve(&self, handle: Handle) -> Option<usize> {
        let slot = self.slots.get(handle.index)?;
        (slot.version == handle.version && slot.value.is_some()).then_some(handle.index)
    }

    fn handle_at(&self, index: usize) -> Handle {
        Handle {
            index,
            version: self.slots[index].version,
        }
    }

    fn alloc(&mut self, value: T) -> usize {
        if let Some(index) = self.free.pop() {
            self.slots[index].value = Some(value);
            index
        } else {
            self.slots.push(Slot {
                value: Some(value),
                version: 0,
                prev: None,
                next: None,
            });
            self.slots.len() - 1
        }
    }

    fn unlink(&mut self, index: usize) {
        let prev = self.slots[index].prev.take();
        let next = self.slots[index].next.take();

        match prev {
            Some(prev) => self.slots[prev].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.slots[next].prev = prev,
            None => self.tail = prev,
        }
    }

    fn link_front(&mut self, index: usize) {
        self.slots[index].prev = None;
        self.slots[index].next = self.head;
        match self.head {
            Some(head) => self.slots[head].prev = Some(index),
            None => self.tail = Some(index),
        }
        self.head = Some(index);
    }

    fn link_back(&mut self, index: usize) {
        self.slots[index].next = None;
        self.slots[index].prev = self.tail;
        match self.tail {
            Some(tail) => self.slots[tail].next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
    }
}

// == Iterator ==
/// Head-to-tail iterator over an [`EntryList`].
pub struct Iter<'a, T> {
    list: &'a EntryList<T>,
    cursor: Option<usize>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.cursor?;
        let slot = &self.list.slots[index];
        self.cursor = slot.next;
        self.remaining -= 1;
        slot.value.as_ref()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn values(list: &EntryList<&'static str>) -> Vec<&'static str> {
        list.iter().copied().collect()
    }

    #[test]
    fn test_list_new() {
        let list: EntryList<u32> = EntryList::new();
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
        assert!(list.first().is_none());
        assert!(list.last().is_none());
    }

    #[test]
    fn test_append_keeps_insertion_order() {
        let mut list = EntryList::new();
        let a = list.append("a");
        list.append("b");
        let c = list.append("c");

        assert_eq!(list.len(), 3);
        assert_eq!(values(&list), vec!["a", "b", "c"]);
        assert_eq!(list.first(), Some(a));
        assert_eq!(list.last(), Some(c));
    }

    #[test]
    fn test_move_to_front() {
        let mut list = EntryList::new();
        list.append("a");
        let b = list.append("b");
        let c = list.append("c");

        assert!(list.move_to_front(c));
        assert_eq!(values(&list), vec!["c", "a", "b"]);
        assert_eq!(list.last(), Some(b));

        assert!(list.move_to_front(b));
        assert_eq!(values(&list), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_move_to_front_when_already_head() {
        let mut list = EntryList::new();
        let a = list.append("a");
        list.append("b");

        assert!(list.move_to_front(a));
        assert_eq!(values(&list), vec!["a", "b"]);
    }

    #[test]
    fn test_remove_middle_head_and_tail() {
        let mut list = EntryList::new();
        let a = list.append("a");
        let b = list.append("b");
        let c = list.append("c");
        let d = list.append("d");

        assert_eq!(list.remove(b), Some("b"));
        assert_eq!(values(&list), vec!["a", "c", "d"]);

        assert_eq!(list.remove(a), Some("a"));
        assert_eq!(list.first(), Some(c));

        assert_eq!(list.remove(d), Some("d"));
        assert_eq!(list.last(), Some(c));
        assert_eq!(list.len(), 1);

        assert_eq!(list.remove(c), Some("c"));
        assert!(list.is_empty());
        assert!(list.first().is_none());
        assert!(list.last().is_none());
    }

    #[test]
    fn test_stale_handle_is_rejected() {
        let mut list = EntryList::new();
        let a = list.append("a");
        list.remove(a);

        assert_eq!(list.remove(a), None);
        assert!(!list.move_to_front(a));
        assert!(list.get(a).is_none());

        // The freed slot is reused but the old handle must not see it.
        let b = list.append("b");
        assert!(list.get(a).is_none());
        assert_eq!(list.get(b), Some(&"b"));
    }

    #[test]
    fn test_handles_survive_other_operations() {
        let mut list = EntryList::new();
        let a = list.append("a");
        let b = list.append("b");
        let c = list.append("c");

        list.move_to_front(c);
        list.remove(a);
        let d = list.append("d");
        list.move_to_front(d);

        assert_eq!(list.get(b), Some(&"b"));
        assert_eq!(list.get(c), Some(&"c"));
        assert_eq!(values(&list), vec!["d", "c", "b"]);
    }

    #[test]
    fn test_clear_invalidates_handles() {
        let mut list = EntryList::new();
        let a = list.append("a");
        let b = list.append("b");

        list.clear();
        assert!(list.is_empty());
        assert!(list.get(a).is_none());
        assert!(list.get(b).is_none());

        let c = list.append("c");
        assert!(!list.contains(a));
        assert!(!list.contains(b));
        assert_eq!(values(&list), vec!["c"]);
        assert_eq!(list.first(), Some(c));
        assert_eq!(list.last(), Some(c));
    }

    #[test]
    fn test_get_mut_updates_in_place() {
        let mut list = EntryList::new();
        let a = list.append(1);
        if let Some(value) = list.get_mut(a) {
            *value = 10;
        }
        assert_eq!(list.get(a), Some(&10));
    }
}
