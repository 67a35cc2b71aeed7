//! Binary min-heap with in-place repositioning.
//!
//! The heap is a dense `Vec<T>`: children of slot `i` live at `2i + 1` and
//! `2i + 2`, the parent at `(i - 1) / 2`. Between calls every non-root slot
//! satisfies `heap[parent] <= heap[child]`.
//!
//! Unlike [`std::collections::BinaryHeap`] the queue can re-sort a single
//! element after its key changed. It keeps no identity index, so locating the
//! element is a linear scan over [`HeapIdentity::identity`]; callers are
//! expected to hold tens of elements, not thousands.
//!
//! Equal keys are not stabilised: elements comparing equal may come out in any
//! order.

/// Stable identity used to find an element after its sort key changed.
///
/// The identity must not be derived from the fields that drive ordering.
pub trait HeapIdentity {
    type Id: PartialEq;

    fn identity(&self) -> Self::Id;
}

#[derive(Clone, Debug)]
pub struct PriorityQueue<T> {
    heap: Vec<T>,
}

impl<T> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self { heap: Vec::new() }
    }
}

impl<T: Ord> PriorityQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }

    /// Adds an element, sifting it upward while its parent is greater. O(log n).
    pub fn insert(&mut self, element: T) {
        self.heap.push(element);
        let last = self.heap.len() - 1;
        self.sift_up(last);
    }

    /// Removes and returns the smallest element, or `None` when empty. O(log n).
    pub fn pop_min(&mut self) -> Option<T> {
        if self.heap.is_empty() {
            return None;
        }

        let top = self.heap.swap_remove(0);
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
        Some(top)
    }

    /// Returns the smallest element without removing it. O(1).
    pub fn peek_min(&self) -> Option<&T> {
        self.heap.first()
    }

    /// Empties the queue, returning the elements in heap (not sorted) order.
    pub fn drain(&mut self) -> Vec<T> {
        std::mem::take(&mut self.heap)
    }

    /// Iterates the elements in heap order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.heap.iter()
    }

    /// Checks the parent/child ordering of every slot.
    pub fn is_heap_ordered(&self) -> bool {
        (1..self.heap.len()).all(|i| self.heap[(i - 1) / 2] <= self.heap[i])
    }

    /// Moves the element at `index` toward the root. Returns its final slot.
    fn sift_up(&mut self, mut index: usize) -> usize {
        while index > 0 {
            let parent = (index - 1) / 2;
            if self.heap[index] >= self.heap[parent] {
                break;
            }
            self.heap.swap(index, parent);
            index = parent;
        }
        index
    }

    /// Moves the element at `index` toward the leaves, always following the
    /// smaller child (left on ties). Returns its final slot.
    fn sift_down(&mut self, mut index: usize) -> usize {
        let len = self.heap.len();
        loop {
            let left = 2 * index + 1;
            if left >= len {
                break;
            }

            let right = left + 1;
            let smaller = if right < len && self.heap[right] < self.heap[left] {
                right
            } else {
                left
            };

            if self.heap[smaller] >= self.heap[index] {
                break;
            }
            self.heap.swap(index, smaller);
            index = smaller;
        }
        index
    }

    /// Restores ordering for a single changed slot. Upward and downward moves
    /// are exclusive: an element that rose is never also sunk.
    fn restore(&mut self, index: usize) {
        if self.sift_up(index) == index {
            self.sift_down(index);
        }
    }
}

impl<T: Ord + HeapIdentity> PriorityQueue<T> {
    fn position_of(&self, id: &T::Id) -> Option<usize> {
        self.heap.iter().position(|element| element.identity() == *id)
    }

    pub fn contains(&self, id: &T::Id) -> bool {
        self.position_of(id).is_some()
    }

    pub fn get(&self, id: &T::Id) -> Option<&T> {
        self.position_of(id).map(|index| &self.heap[index])
    }

    /// Replaces the element sharing `updated`'s identity and re-sorts it.
    ///
    /// Returns `false` (and drops `updated`) when no such element is queued.
    /// O(n) search plus O(log n) fix-up.
    pub fn reposition(&mut self, updated: T) -> bool {
        let Some(index) = self.position_of(&updated.identity()) else {
            return false;
        };
        self.heap[index] = updated;
        self.restore(index);
        true
    }

    /// Mutates the element with identity `id` in place, then re-sorts it.
    pub fn update<F>(&mut self, id: &T::Id, mutate: F) -> bool
    where
        F: FnOnce(&mut T),
    {
        let Some(index) = self.position_of(id) else {
            return false;
        };
        mutate(&mut self.heap[index]);
        self.restore(index);
        true
    }

    /// Removes the element with identity `id`, if queued.
    pub fn remove(&mut self, id: &T::Id) -> Option<T> {
        let index = self.position_of(id)?;
        let removed = self.heap.swap_remove(index);
        if index < self.heap.len() {
            self.restore(index);
        }
        Some(removed)
    }
}
