use std::cmp::Ordering;

use nonmax::NonMaxUsize;

#[derive(Debug, Clone, Copy)]
struct HeapEntry<P> {
    item: usize,
    priority: P,
}

/// Binary min-heap over dense item identifiers with a position map, such that the priority of a
/// queued item can be changed in O(log n).
///
/// Items with equal priority are popped in unspecified order.
#[derive(Debug, Clone)]
pub struct IndexedHeap<P> {
    heap: Vec<HeapEntry<P>>,
    positions: Vec<Option<NonMaxUsize>>,

    num_pushed: usize,
    max_len: usize,
}

impl<P> IndexedHeap<P>
where
    P: Ord + Copy,
{
    /// Create a heap for item identifiers in `0..num_items`
    pub fn new(num_items: usize) -> Self {
        Self {
            heap: Vec::new(),
            positions: vec![None; num_items],
            num_pushed: 0,
            max_len: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    #[inline]
    pub fn contains(&self, item: usize) -> bool {
        self.positions[item].is_some()
    }

    pub fn priority(&self, item: usize) -> Option<P> {
        self.positions[item].map(|pos| self.heap[pos.get()].priority)
    }

    /// Total number of items ever pushed
    pub fn num_pushed(&self) -> usize {
        self.num_pushed
    }

    /// Largest number of items simultaneously queued
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Queue an item. If the item is already queued, its priority is changed instead.
    pub fn push(&mut self, item: usize, priority: P) {
        if self.change_priority(item, priority) {
            return;
        }

        self.heap.push(HeapEntry { item, priority });
        let pos = self.heap.len() - 1;
        self.set_position(pos);
        self.sift_up(pos);

        self.num_pushed += 1;
        self.max_len = self.max_len.max(self.heap.len());
    }

    /// Remove and return the item with the lowest priority
    pub fn pop(&mut self) -> Option<(usize, P)> {
        if self.heap.is_empty() {
            return None;
        }

        let last = self.heap.len() - 1;
        self.heap.swap(0, last);
        let HeapEntry { item, priority } = self.heap.pop()?;
        self.positions[item] = None;

        if !self.heap.is_empty() {
            self.set_position(0);
            self.sift_down(0);
        }

        Some((item, priority))
    }

    /// Change the priority of a queued item, moving it up or down as required. Returns false if
    /// the item is not queued.
    pub fn change_priority(&mut self, item: usize, priority: P) -> bool {
        let Some(pos) = self.positions[item].map(|p| p.get()) else {
            return false;
        };

        let old = self.heap[pos].priority;
        self.heap[pos].priority = priority;

        match priority.cmp(&old) {
            Ordering::Less => self.sift_up(pos),
            Ordering::Greater => self.sift_down(pos),
            Ordering::Equal => (),
        }

        true
    }

    #[inline]
    fn less(&self, a: usize, b: usize) -> bool {
        self.heap[a].priority < self.heap[b].priority
    }

    #[inline]
    fn set_position(&mut self, pos: usize) {
        self.positions[self.heap[pos].item] = NonMaxUsize::new(pos);
    }

    fn swap_entries(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.set_position(a);
        self.set_position(b);
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if !self.less(pos, parent) {
                break;
            }

            self.swap_entries(pos, parent);
            pos = parent;
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        loop {
            let left = 2 * pos + 1;
            let right = left + 1;
            let mut smallest = pos;

            if left < self.heap.len() && self.less(left, smallest) {
                smallest = left;
            }

            if right < self.heap.len() && self.less(right, smallest) {
                smallest = right;
            }

            if smallest == pos {
                break;
            }

            self.swap_entries(pos, smallest);
            pos = smallest;
        }
    }
}


#[cfg(test)]
mod tests {
    use super::IndexedHeap;

    #[test]
    fn test_pop_order() {
        let mut heap = IndexedHeap::new(10);
        for (item, prio) in [(3, 12u32), (1, 6), (7, 1), (2, 32), (9, 6)] {
            heap.push(item, prio);
        }

        assert_eq!(heap.len(), 5);
        assert_eq!(heap.pop(), Some((7, 1)));

        let (a, _) = heap.pop().unwrap();
        let (b, _) = heap.pop().unwrap();
        let mut tied = [a, b];
        tied.sort();
        assert_eq!(tied, [1, 9]);

        assert_eq!(heap.pop(), Some((3, 12)));
        assert_eq!(heap.pop(), Some((2, 32)));
        assert_eq!(heap.pop(), None);

        assert_eq!(heap.num_pushed(), 5);
        assert_eq!(heap.max_len(), 5);
    }

    #[test]
    fn test_change_priority() {
        let mut heap = IndexedHeap::new(5);
        heap.push(0, 5i32);
        heap.push(1, 4);
        heap.push(2, 3);

        // Decrease key
        assert!(heap.change_priority(0, 1));
        assert_eq!(heap.priority(0), Some(1));

        // Increase key
        assert!(heap.change_priority(2, 10));

        // Pushing an already queued item changes its priority
        heap.push(1, -1);
        assert_eq!(heap.len(), 3);

        assert!(!heap.change_priority(4, 1));
        assert!(!heap.contains(4));

        assert_eq!(heap.pop(), Some((1, -1)));
        assert_eq!(heap.pop(), Some((0, 1)));
        assert_eq!(heap.pop(), Some((2, 10)));
        assert!(heap.is_empty());
        assert!(!heap.contains(2));
    }

    #[test]
    fn test_sorts_many_items() {
        let mut heap = IndexedHeap::new(100);
        for item in 0..100 {
            heap.push(item, ((item * 37) % 100) as i64);
        }
        for item in (0..100).step_by(3) {
            heap.change_priority(item, -(item as i64));
        }

        let mut last = i64::MIN;
        while let Some((_, prio)) = heap.pop() {
            assert!(prio >= last);
            last = prio;
        }
    }
}
