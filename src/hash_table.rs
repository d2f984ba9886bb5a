use alloc::alloc::handle_alloc_error;
use alloc::vec::Vec;
use core::alloc::Layout;
use core::fmt;
use core::fmt::Debug;
use core::iter::FusedIterator;
use core::marker::PhantomData;

/// Smallest primary region a table is ever built with.
pub(crate) const MIN_PRIMARY_CAPACITY: usize = 7;

/// Maximum load factor, in percent of the primary region.
const MAX_LOAD_PERCENT: u128 = 85;

/// Cellar size relative to the primary region, in units of 1/10000.
///
/// With an 85% load factor this leaves enough overflow room that chains
/// rarely need to spill into the primary region under uniform hashing.
const CELLAR_RATIO: u128 = 1628;

cfg_if::cfg_if! {
    if #[cfg(feature = "strict-cellar")] {
        const GROW_ON_EXHAUSTION: bool = false;
    } else {
        const GROW_ON_EXHAUSTION: bool = true;
    }
}

#[inline(always)]
fn target_load_factor(primary: usize) -> usize {
    ((primary as u128 * MAX_LOAD_PERCENT) / 100) as usize
}

#[inline(always)]
fn target_load_factor_inverse(len: usize) -> usize {
    usize::try_from((len as u128 * 100).div_ceil(MAX_LOAD_PERCENT)).unwrap_or(usize::MAX)
}

#[inline(always)]
fn cellar_for(primary: usize) -> usize {
    ((primary as u128 * CELLAR_RATIO) / 10_000) as usize
}

/// The error type for [`HashTable::try_reserve`] and
/// [`HashSet::try_reserve`](crate::HashSet::try_reserve).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TryReserveError {
    /// The computed slot count overflowed `usize` or the maximum allocation
    /// size.
    CapacityOverflow,
    /// The allocator reported a failure for the given layout.
    AllocError {
        /// The layout of the slot array that failed to allocate.
        layout: Layout,
    },
}

impl fmt::Display for TryReserveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TryReserveError::CapacityOverflow => {
                f.write_str("capacity overflow while sizing the slot array")
            }
            TryReserveError::AllocError { layout } => write!(
                f,
                "memory allocation of {} bytes failed for the slot array",
                layout.size()
            ),
        }
    }
}

impl core::error::Error for TryReserveError {}

/// Whether a sizing failure is reported to the caller or is fatal.
#[derive(Clone, Copy)]
enum Fallibility {
    Fallible,
    Infallible,
}

impl Fallibility {
    #[cold]
    fn capacity_overflow(self) -> TryReserveError {
        match self {
            Fallibility::Fallible => TryReserveError::CapacityOverflow,
            Fallibility::Infallible => panic!("hash table capacity overflow"),
        }
    }

    #[cold]
    fn alloc_err(self, layout: Layout) -> TryReserveError {
        match self {
            Fallibility::Fallible => TryReserveError::AllocError { layout },
            Fallibility::Infallible => handle_alloc_error(layout),
        }
    }
}

#[inline]
fn infallible<T>(result: Result<T, TryReserveError>) -> T {
    match result {
        Ok(value) => value,
        Err(_) => unreachable!("infallible sizing reported an error"),
    }
}

/// Lifecycle of a single slot.
enum SlotState<V> {
    /// Never written since the last rehash, or evicted during chain repair.
    Free,
    Occupied(V),
    /// Held a value that was removed. Always detached from every chain.
    TombstonedOverflow,
    /// One past the last usable slot. Never written by key operations.
    Sentinel,
}

struct Slot<V> {
    state: SlotState<V>,
    hash: u64,
    next: Option<usize>,
    prev: Option<usize>,
}

impl<V> Slot<V> {
    const fn free() -> Self {
        Slot {
            state: SlotState::Free,
            hash: 0,
            next: None,
            prev: None,
        }
    }

    const fn sentinel() -> Self {
        Slot {
            state: SlotState::Sentinel,
            hash: 0,
            next: None,
            prev: None,
        }
    }

    #[inline(always)]
    fn is_occupied(&self) -> bool {
        matches!(self.state, SlotState::Occupied(_))
    }

    #[inline(always)]
    fn is_vacant(&self) -> bool {
        matches!(self.state, SlotState::Free | SlotState::TombstonedOverflow)
    }
}

impl<V> Debug for Slot<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.state, self.next) {
            (SlotState::Occupied(_), Some(next)) => write!(f, "{:016x}->{next}", self.hash),
            (SlotState::Occupied(_), None) => write!(f, "{:016x}", self.hash),
            (SlotState::Free, _) => f.write_str(".."),
            (SlotState::TombstonedOverflow, _) => f.write_str("xx"),
            (SlotState::Sentinel, _) => f.write_str("END"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Capacity {
    primary: usize,
    cellar: usize,
}

impl Capacity {
    /// Sizes a table around `primary` home buckets, or `None` if the slot count
    /// (including the sentinel) does not fit in `usize`.
    fn new(primary: usize) -> Option<Self> {
        let cellar = cellar_for(primary);
        primary.checked_add(cellar)?.checked_add(1)?;
        Some(Capacity { primary, cellar })
    }

    /// Index of the sentinel slot, which is also the number of usable slots.
    #[inline(always)]
    fn whole(self) -> usize {
        self.primary + self.cellar
    }

    #[inline(always)]
    fn max_pop(self) -> usize {
        target_load_factor(self.primary)
    }
}

fn allocate_slots<V>(
    capacity: Capacity,
    fallibility: Fallibility,
) -> Result<Vec<Slot<V>>, TryReserveError> {
    let len = capacity.whole() + 1;
    let layout = Layout::array::<Slot<V>>(len).map_err(|_| fallibility.capacity_overflow())?;

    let mut slots = Vec::new();
    slots
        .try_reserve_exact(len)
        .map_err(|_| fallibility.alloc_err(layout))?;
    slots.extend((0..capacity.whole()).map(|_| Slot::free()));
    slots.push(Slot::sentinel());

    Ok(slots)
}

/// Debug statistics for hash table analysis.
#[cfg(feature = "stats")]
#[derive(Debug, Clone)]
pub struct DebugStats {
    /// Number of elements currently in the table
    pub populated: usize,
    /// Maximum population before the next rehash
    pub capacity: usize,
    /// Number of home buckets
    pub primary_capacity: usize,
    /// Number of overflow slots after the primary region
    pub cellar_capacity: usize,
    /// Occupied slots inside the cellar
    pub cellar_occupied: usize,
    /// Occupied slots that are not at their value's home bucket
    pub displaced: usize,
    /// Slots currently marked as tombstones
    pub tombstones: usize,
    /// Longest chain reachable from any home bucket, in slots
    pub longest_chain: usize,
    /// Load factor (populated / primary_capacity)
    pub load_factor: f64,
    /// Total memory in bytes used by the slot array
    pub total_bytes: usize,
}

#[cfg(feature = "stats")]
impl DebugStats {
    /// Pretty-print the debug statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Hash Table Debug Statistics ===");
        println!(
            "Population: {}/{} ({:.2}% load factor)",
            self.populated,
            self.capacity,
            self.load_factor * 100.0
        );
        println!(
            "Layout: {} primary + {} cellar slots",
            self.primary_capacity, self.cellar_capacity
        );
        println!(
            "Cellar: {}/{} occupied, {} displaced entries, {} tombstones",
            self.cellar_occupied, self.cellar_capacity, self.displaced, self.tombstones
        );
        println!("Longest chain: {} slots", self.longest_chain);
        println!("Total Allocated: {} bytes", self.total_bytes);
    }
}

/// Counts of entries by probe length: index `n` holds the number of entries
/// that `find` reaches after visiting `n + 1` slots of their chain.
#[cfg(feature = "stats")]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeHistogram(pub Vec<usize>);

#[cfg(feature = "stats")]
impl ProbeHistogram {
    /// Pretty-prints the histogram horizontally using stdout.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        let max = self.0.iter().copied().max().unwrap_or(0);
        if max == 0 {
            println!("probe histogram: empty");
            return;
        }

        let max_bar = 60usize;
        println!(
            "probe histogram ({} entries):",
            self.0.iter().sum::<usize>()
        );
        for (i, &count) in self.0.iter().enumerate() {
            let width = (count * max_bar).div_ceil(max);
            println!("{:>3} | {} ({})", i + 1, "█".repeat(width), count);
        }
    }
}

/// A hash table storing its chains inside one slot array.
///
/// The array has three parts: a *primary region* of home buckets addressed by
/// `hash % primary_capacity`, a *cellar* of overflow slots appended after it
/// (about 16% of the primary region), and one sentinel slot marking the end.
/// Colliding values are linked into a chain that starts at their home bucket.
/// New chain links are taken from the highest free slot, so the cellar fills
/// first and only then do chains borrow free primary slots.
///
/// Like the raw tables it is modelled on, `HashTable<V>` does not hash
/// anything itself: every operation takes the value's `u64` hash and an
/// equality predicate. The hash is stored next to each value, so growth and
/// chain repair never need to hash again.
///
/// Removing a value turns its slot into a tombstone, cuts the chain there and
/// reinserts every value that followed it. Removal therefore costs time
/// proportional to the rest of the chain, and may move unrelated values to
/// other slots.
///
/// ## Example
///
/// ```rust
/// use cellar_hash::HashTable;
/// use cellar_hash::hash_table::Entry;
///
/// let mut table: HashTable<u64> = HashTable::new();
///
/// // Identity hashing: 3, 10 and 17 share home bucket 3 of 7.
/// for key in [3u64, 10, 17] {
///     match table.entry(key, |&v| v == key) {
///         Entry::Vacant(entry) => {
///             entry.insert(key);
///         }
///         Entry::Occupied(_) => unreachable!(),
///     }
/// }
///
/// assert_eq!(table.primary_capacity(), 7);
/// assert_eq!(table.len(), 3);
/// assert_eq!(table.find(10, |&v| v == 10), Some(&10));
/// ```
pub struct HashTable<V> {
    slots: Vec<Slot<V>>,
    capacity: Capacity,
    populated: usize,
    /// Every slot above this index is occupied.
    next_free: usize,
}

impl<V> Debug for HashTable<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashTable")
            .field("populated", &self.populated)
            .field("capacity", &self.capacity.max_pop())
            .field("primary_capacity", &self.capacity.primary)
            .field("cellar_capacity", &self.capacity.cellar)
            .field("next_free", &self.next_free)
            .field("slots", &self.slots)
            .finish()
    }
}

impl<V> Clone for HashTable<V>
where
    V: Clone,
{
    /// Builds a fresh table of the same primary capacity and reinserts a clone
    /// of every value, so the copy never shares chain layout with `self`.
    fn clone(&self) -> Self {
        let mut table = Self::with_primary_capacity(self.capacity.primary);
        for slot in &self.slots {
            if let SlotState::Occupied(value) = &slot.state {
                table.add(slot.hash, value.clone());
            }
        }

        debug_assert_eq!(table.populated, self.populated);
        table
    }
}

impl<V> Default for HashTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> HashTable<V> {
    /// Creates an empty table with the minimum primary capacity of 7 buckets.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use cellar_hash::HashTable;
    /// #
    /// let table: HashTable<u64> = HashTable::new();
    /// assert_eq!(table.primary_capacity(), 7);
    /// assert_eq!(table.cellar_capacity(), 1);
    /// ```
    pub fn new() -> Self {
        Self::with_primary_capacity(MIN_PRIMARY_CAPACITY)
    }

    /// Creates a table that can hold at least `capacity` values before it
    /// has to grow.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use cellar_hash::HashTable;
    /// #
    /// let table: HashTable<String> = HashTable::with_capacity(100);
    /// assert!(table.capacity() >= 100);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_primary_capacity(target_load_factor_inverse(capacity))
    }

    fn with_primary_capacity(primary_hint: usize) -> Self {
        let primary = primary_hint.max(MIN_PRIMARY_CAPACITY);
        infallible(Self::try_with_primary_capacity(
            primary,
            Fallibility::Infallible,
        ))
    }

    fn try_with_primary_capacity(
        primary: usize,
        fallibility: Fallibility,
    ) -> Result<Self, TryReserveError> {
        let capacity = Capacity::new(primary).ok_or_else(|| fallibility.capacity_overflow())?;
        let slots = allocate_slots(capacity, fallibility)?;

        Ok(Self {
            slots,
            capacity,
            populated: 0,
            next_free: capacity.whole() - 1,
        })
    }

    /// Returns the number of values in the table.
    pub fn len(&self) -> usize {
        self.populated
    }

    /// Returns `true` if the table contains no values.
    pub fn is_empty(&self) -> bool {
        self.populated == 0
    }

    /// Returns how many values the table holds before its next rehash.
    ///
    /// This is 85% of [`primary_capacity`](Self::primary_capacity), rounded
    /// down.
    pub fn capacity(&self) -> usize {
        self.capacity.max_pop()
    }

    /// Returns the number of home buckets.
    pub fn primary_capacity(&self) -> usize {
        self.capacity.primary
    }

    /// Returns the number of overflow slots appended after the home buckets.
    pub fn cellar_capacity(&self) -> usize {
        self.capacity.cellar
    }

    #[inline(always)]
    fn home(&self, hash: u64) -> usize {
        (hash % self.capacity.primary as u64) as usize
    }

    #[inline]
    fn chain_tail(&self, mut index: usize) -> usize {
        while let Some(next) = self.slots[index].next {
            index = next;
        }
        index
    }

    fn occupied(&self, index: usize) -> &V {
        match &self.slots[index].state {
            SlotState::Occupied(value) => value,
            _ => unreachable!("slot {index} is not occupied"),
        }
    }

    /// Follows the chain rooted at the home bucket of `hash` and returns the
    /// index of the slot holding a value accepted by `eq`.
    ///
    /// # Panics
    ///
    /// Panics if the chain runs into the sentinel slot, which can only happen
    /// if the table is corrupted.
    fn locate(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<usize> {
        let mut index = self.home(hash);
        loop {
            let slot = &self.slots[index];
            match &slot.state {
                SlotState::Free => return None,
                SlotState::Occupied(value) => {
                    if slot.hash == hash && eq(value) {
                        return Some(index);
                    }
                }
                SlotState::TombstonedOverflow => {}
                SlotState::Sentinel => self.corrupted(index),
            }
            index = slot.next?;
        }
    }

    #[cold]
    #[inline(never)]
    fn corrupted(&self, index: usize) -> ! {
        log_error!(
            index,
            primary_capacity = self.capacity.primary,
            cellar_capacity = self.capacity.cellar,
            "chain reached the sentinel slot"
        );
        panic!("hash table corrupted: a chain reached the sentinel slot at index {index}");
    }

    /// Appends `value` to the chain of its home bucket. The caller guarantees
    /// the value is absent and that the population stays within capacity.
    fn add(&mut self, hash: u64, value: V) -> usize {
        let tail = self.chain_tail(self.home(hash));

        let index = if self.slots[tail].is_occupied() {
            if self.slots[self.next_free].is_occupied() {
                self.grow_exhausted();
                return self.add(hash, value);
            }

            let index = self.next_free;
            self.slots[index] = Slot {
                state: SlotState::Occupied(value),
                hash,
                next: None,
                prev: Some(tail),
            };
            self.slots[tail].next = Some(index);
            index
        } else {
            self.slots[tail] = Slot {
                state: SlotState::Occupied(value),
                hash,
                next: None,
                prev: None,
            };
            tail
        };

        self.populated += 1;
        self.retreat_free_cursor();
        debug_assert!(self.populated <= self.capacity.whole());

        index
    }

    /// Moves the free cursor down past occupied slots. Stops at index 0 when
    /// every slot is taken; `add` treats an occupied cursor slot as exhausted.
    #[inline]
    fn retreat_free_cursor(&mut self) {
        while self.next_free > 0 && self.slots[self.next_free].is_occupied() {
            self.next_free -= 1;
        }
    }

    #[cold]
    #[inline(never)]
    fn grow_exhausted(&mut self) {
        if !GROW_ON_EXHAUSTION {
            panic!(
                "hash table has no free slot left for a chain ({} of {} slots occupied)",
                self.populated,
                self.capacity.whole()
            );
        }

        log_warn!(
            populated = self.populated,
            primary_capacity = self.capacity.primary,
            "no free slot left for a chain, growing"
        );
        let primary = self
            .capacity
            .primary
            .checked_mul(2)
            .unwrap_or_else(|| panic!("hash table capacity overflow"));
        infallible(self.rehash_impl(primary, Fallibility::Infallible));
    }

    /// Returns a reference to the value matching `hash` and `eq`, if any.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use cellar_hash::HashTable;
    /// #
    /// let mut table: HashTable<u64> = HashTable::new();
    /// table.entry(42, |&v: &u64| v == 42).or_insert(42);
    ///
    /// assert_eq!(table.find(42, |&v| v == 42), Some(&42));
    /// assert_eq!(table.find(7, |&v| v == 7), None);
    /// ```
    pub fn find(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<&V> {
        self.locate(hash, eq).map(|index| self.occupied(index))
    }

    /// Returns a cursor positioned on the value matching `hash` and `eq`, or
    /// the end cursor if there is none.
    pub fn find_cursor(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Cursor<'_, V> {
        match self.locate(hash, eq) {
            Some(index) => Cursor { table: self, index },
            None => self.cursor_end(),
        }
    }

    /// Gets an entry for the given hash and equality predicate.
    ///
    /// If the value is absent the table first makes room for one more value,
    /// so inserting through the returned [`VacantEntry`] never rehashes.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use cellar_hash::HashTable;
    /// # use cellar_hash::hash_table::Entry;
    /// #
    /// let mut table: HashTable<u64> = HashTable::new();
    ///
    /// match table.entry(5, |&v: &u64| v == 5) {
    ///     Entry::Vacant(entry) => {
    ///         entry.insert(5);
    ///     }
    ///     Entry::Occupied(_) => unreachable!(),
    /// }
    ///
    /// assert!(matches!(table.entry(5, |&v| v == 5), Entry::Occupied(_)));
    /// ```
    pub fn entry(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Entry<'_, V> {
        match self.locate(hash, eq) {
            Some(index) => Entry::Occupied(OccupiedEntry { table: self, index }),
            None => {
                self.reserve(1);
                Entry::Vacant(VacantEntry { table: self, hash })
            }
        }
    }

    /// Removes and returns the value matching `hash` and `eq`.
    ///
    /// The slot becomes a tombstone and every value chained after it is
    /// reinserted, possibly into different slots.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use cellar_hash::HashTable;
    /// #
    /// let mut table: HashTable<u64> = HashTable::new();
    /// for key in [3u64, 10, 17] {
    ///     table.entry(key, |&v| v == key).or_insert(key);
    /// }
    ///
    /// assert_eq!(table.remove(3, |&v| v == 3), Some(3));
    /// assert_eq!(table.remove(3, |&v| v == 3), None);
    /// assert_eq!(table.find(17, |&v| v == 17), Some(&17));
    /// ```
    pub fn remove(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<V> {
        if !self.slots[self.home(hash)].is_occupied() {
            return None;
        }

        let index = self.locate(hash, eq)?;
        Some(self.erase_at(index))
    }

    fn erase_at(&mut self, index: usize) -> V {
        let slot = &mut self.slots[index];
        let value = match core::mem::replace(&mut slot.state, SlotState::TombstonedOverflow) {
            SlotState::Occupied(value) => value,
            _ => unreachable!("erasing slot {index} which is not occupied"),
        };
        let prev = slot.prev.take();
        let mut next = slot.next.take();

        if let Some(prev) = prev {
            self.slots[prev].next = None;
        }
        self.populated -= 1;
        self.next_free = self.next_free.max(index);

        // Cut the rest of the chain loose and put it back through `add`.
        let mut evicted = Vec::new();
        while let Some(current) = next {
            let slot = &mut self.slots[current];
            next = slot.next.take();
            slot.prev = None;
            if let SlotState::Occupied(value) =
                core::mem::replace(&mut slot.state, SlotState::Free)
            {
                evicted.push((slot.hash, value));
                self.populated -= 1;
            }
            self.next_free = self.next_free.max(current);
        }

        for (hash, value) in evicted {
            self.add(hash, value);
        }

        value
    }

    /// Reserves capacity for at least `additional` more values.
    ///
    /// The primary region is doubled until 85% of it covers
    /// `self.len() + additional`, then the table is rebuilt. Does nothing if
    /// capacity is already sufficient.
    ///
    /// # Panics
    ///
    /// Panics if the new slot count overflows `usize`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use cellar_hash::HashTable;
    /// #
    /// let mut table: HashTable<u64> = HashTable::new();
    /// table.reserve(50);
    /// assert!(table.capacity() >= 50);
    /// assert_eq!(table.primary_capacity(), 112);
    /// ```
    pub fn reserve(&mut self, additional: usize) {
        let target = self
            .populated
            .checked_add(additional)
            .unwrap_or_else(|| panic!("hash table capacity overflow"));
        infallible(self.reserve_total(target, Fallibility::Infallible));
    }

    /// Tries to reserve capacity for at least `additional` more values.
    ///
    /// # Errors
    ///
    /// Returns [`TryReserveError::CapacityOverflow`] if the slot count would
    /// overflow, or [`TryReserveError::AllocError`] if the allocator fails.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use cellar_hash::HashTable;
    /// # use cellar_hash::TryReserveError;
    /// #
    /// let mut table: HashTable<u64> = HashTable::new();
    /// assert_eq!(table.try_reserve(10), Ok(()));
    /// assert_eq!(
    ///     table.try_reserve(usize::MAX),
    ///     Err(TryReserveError::CapacityOverflow)
    /// );
    /// ```
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        let target = self
            .populated
            .checked_add(additional)
            .ok_or(TryReserveError::CapacityOverflow)?;
        self.reserve_total(target, Fallibility::Fallible)
    }

    fn reserve_total(
        &mut self,
        target: usize,
        fallibility: Fallibility,
    ) -> Result<(), TryReserveError> {
        if self.capacity.max_pop() >= target {
            return Ok(());
        }

        let mut primary = self.capacity.primary;
        while target_load_factor(primary) < target {
            primary = primary
                .checked_mul(2)
                .ok_or_else(|| fallibility.capacity_overflow())?;
        }

        self.rehash_impl(primary, fallibility)
    }

    /// Rebuilds the table with at least `primary_hint` home buckets.
    ///
    /// The new primary capacity is the largest of 7, `primary_hint`, and the
    /// smallest size that keeps the current values under the load factor.
    /// Values are reinserted in the physical order of the old slot array.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use cellar_hash::HashTable;
    /// #
    /// let mut table: HashTable<u64> = HashTable::new();
    /// table.entry(1, |&v: &u64| v == 1).or_insert(1);
    ///
    /// table.rehash(101);
    /// assert_eq!(table.primary_capacity(), 101);
    /// assert_eq!(table.cellar_capacity(), 16);
    /// assert_eq!(table.find(1, |&v| v == 1), Some(&1));
    /// ```
    pub fn rehash(&mut self, primary_hint: usize) {
        infallible(self.rehash_impl(primary_hint, Fallibility::Infallible));
    }

    /// Shrinks the table to the smallest capacity that holds its values.
    pub fn shrink_to_fit(&mut self) {
        self.rehash(0);
    }

    fn rehash_impl(
        &mut self,
        primary_hint: usize,
        fallibility: Fallibility,
    ) -> Result<(), TryReserveError> {
        let primary = MIN_PRIMARY_CAPACITY
            .max(primary_hint)
            .max(target_load_factor_inverse(self.populated));
        let fresh = Self::try_with_primary_capacity(primary, fallibility)?;

        log_debug!(
            old_primary = self.capacity.primary,
            new_primary = fresh.capacity.primary,
            populated = self.populated,
            "rehashing"
        );

        let old = core::mem::replace(self, fresh);
        for slot in old.slots {
            if let SlotState::Occupied(value) = slot.state {
                self.add(slot.hash, value);
            }
        }

        Ok(())
    }

    /// Removes all values and shrinks the table back to the minimum capacity.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use cellar_hash::HashTable;
    /// #
    /// let mut table: HashTable<u64> = HashTable::with_capacity(1000);
    /// table.entry(1, |&v: &u64| v == 1).or_insert(1);
    ///
    /// table.clear();
    /// assert!(table.is_empty());
    /// assert_eq!(table.primary_capacity(), 7);
    /// ```
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Returns a cursor on the first occupied slot, or the end cursor if the
    /// table is empty.
    pub fn cursor_begin(&self) -> Cursor<'_, V> {
        Cursor::new(self, 0)
    }

    /// Returns the cursor on the sentinel slot.
    pub fn cursor_end(&self) -> Cursor<'_, V> {
        Cursor {
            table: self,
            index: self.capacity.whole(),
        }
    }

    /// Returns an iterator over all values in physical slot order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use cellar_hash::HashTable;
    /// #
    /// let mut table: HashTable<u64> = HashTable::new();
    /// for key in [3u64, 10, 17] {
    ///     table.entry(key, |&v| v == key).or_insert(key);
    /// }
    ///
    /// let mut values: Vec<u64> = table.iter().copied().collect();
    /// values.sort();
    /// assert_eq!(values, [3, 10, 17]);
    /// ```
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            cursor: self.cursor_begin(),
            remaining: self.populated,
        }
    }

    /// Keeps only the values for which `f` returns `true`.
    ///
    /// Removing values one by one would reshuffle chains under the
    /// iteration, so the survivors are instead reinserted into a fresh array
    /// of the same primary capacity.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use cellar_hash::HashTable;
    /// #
    /// let mut table: HashTable<u64> = HashTable::new();
    /// for key in 0..10u64 {
    ///     table.entry(key, |&v| v == key).or_insert(key);
    /// }
    ///
    /// table.retain(|&v| v % 2 == 0);
    /// assert_eq!(table.len(), 5);
    /// assert!(table.find(3, |&v| v == 3).is_none());
    /// ```
    pub fn retain(&mut self, mut f: impl FnMut(&V) -> bool) {
        let fresh = Self::with_primary_capacity(self.capacity.primary);
        let old = core::mem::replace(self, fresh);
        for slot in old.slots {
            if let SlotState::Occupied(value) = slot.state {
                if f(&value) {
                    self.add(slot.hash, value);
                }
            }
        }
    }

    /// Removes and yields every value. The table keeps its primary capacity.
    pub fn drain(&mut self) -> Drain<'_, V> {
        let fresh = Self::with_primary_capacity(self.capacity.primary);
        let old = core::mem::replace(self, fresh);
        Drain {
            inner: old.into_iter(),
            _marker: PhantomData,
        }
    }

    /// Returns a printable listing of every slot: its state, its value if
    /// occupied, and the index of its chain successor if any.
    ///
    /// The format is meant for debugging and is not stable.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use cellar_hash::HashTable;
    /// #
    /// let mut table: HashTable<u64> = HashTable::new();
    /// table.entry(3, |&v: &u64| v == 3).or_insert(3);
    /// table.entry(10, |&v: &u64| v == 10).or_insert(10);
    ///
    /// let dump = table.dump().to_string();
    /// assert!(dump.contains("3: 3 USED NEXT: 7"));
    /// assert!(dump.contains("7: 10 USED"));
    /// assert!(dump.contains("8: END"));
    /// ```
    pub fn dump(&self) -> Dump<'_, V> {
        Dump { table: self }
    }

    /// Returns detailed utilization statistics for debugging.
    #[cfg(feature = "stats")]
    pub fn debug_stats(&self) -> DebugStats {
        let mut cellar_occupied = 0;
        let mut displaced = 0;
        let mut tombstones = 0;

        for (index, slot) in self.slots.iter().enumerate() {
            match slot.state {
                SlotState::Occupied(_) => {
                    if index >= self.capacity.primary {
                        cellar_occupied += 1;
                    }
                    if self.home(slot.hash) != index {
                        displaced += 1;
                    }
                }
                SlotState::TombstonedOverflow => tombstones += 1,
                SlotState::Free | SlotState::Sentinel => {}
            }
        }

        let longest_chain = (0..self.capacity.primary)
            .map(|bucket| {
                let mut len = 0;
                let mut index = Some(bucket);
                while let Some(current) = index {
                    if !self.slots[current].is_occupied() {
                        break;
                    }
                    len += 1;
                    index = self.slots[current].next;
                }
                len
            })
            .max()
            .unwrap_or(0);

        DebugStats {
            populated: self.populated,
            capacity: self.capacity.max_pop(),
            primary_capacity: self.capacity.primary,
            cellar_capacity: self.capacity.cellar,
            cellar_occupied,
            displaced,
            tombstones,
            longest_chain,
            load_factor: self.populated as f64 / self.capacity.primary as f64,
            total_bytes: self.slots.len() * core::mem::size_of::<Slot<V>>(),
        }
    }

    /// Computes how many slots `find` visits to reach each value.
    #[cfg(feature = "stats")]
    pub fn probe_histogram(&self) -> ProbeHistogram {
        let mut hist = Vec::new();

        for bucket in 0..self.capacity.primary {
            let mut depth = 0;
            let mut index = Some(bucket);
            while let Some(current) = index {
                let slot = &self.slots[current];
                if slot.is_occupied() && self.home(slot.hash) == bucket {
                    if hist.len() <= depth {
                        hist.resize(depth + 1, 0);
                    }
                    hist[depth] += 1;
                }
                depth += 1;
                index = slot.next;
            }
        }

        ProbeHistogram(hist)
    }

    /// Indices of the slots chained from `bucket`, head first.
    #[cfg(test)]
    fn chain(&self, bucket: usize) -> Vec<usize> {
        let mut chain = Vec::new();
        let mut index = Some(bucket);
        while let Some(current) = index {
            chain.push(current);
            index = self.slots[current].next;
        }
        chain
    }

    /// Asserts every structural invariant of the slot array.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        let whole = self.capacity.whole();
        assert_eq!(self.slots.len(), whole + 1);
        assert!(matches!(self.slots[whole].state, SlotState::Sentinel));
        assert_eq!(
            self.slots.iter().filter(|slot| slot.is_occupied()).count(),
            self.populated
        );
        assert!(self.populated <= self.capacity.max_pop());

        for index in self.next_free + 1..whole {
            assert!(
                self.slots[index].is_occupied(),
                "slot {index} above the free cursor is vacant"
            );
        }

        for (index, slot) in self.slots[..whole].iter().enumerate() {
            if !slot.is_occupied() {
                assert!(slot.next.is_none(), "vacant slot {index} has a successor");
                continue;
            }
            if let Some(next) = slot.next {
                assert_eq!(self.slots[next].prev, Some(index));
            }
            assert!(
                self.chain(self.home(slot.hash)).contains(&index),
                "slot {index} is unreachable from its home bucket"
            );
        }
    }
}

impl<V> IntoIterator for HashTable<V> {
    type IntoIter = IntoIter<V>;
    type Item = V;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            remaining: self.populated,
            slots: self.slots.into_iter(),
        }
    }
}

impl<'a, V> IntoIterator for &'a HashTable<V> {
    type IntoIter = Iter<'a, V>;
    type Item = &'a V;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A view into a single entry in the hash table, which may be vacant or
/// occupied.
///
/// This enum is constructed from the [`entry`] method on [`HashTable`].
///
/// [`entry`]: HashTable::entry
pub enum Entry<'a, V> {
    /// A vacant entry - the value is not present in the table
    Vacant(VacantEntry<'a, V>),
    /// An occupied entry - the value is present in the table
    Occupied(OccupiedEntry<'a, V>),
}

impl<'a, V> Entry<'a, V> {
    /// Inserts `default` if the entry is vacant and returns a reference to
    /// the stored value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use cellar_hash::HashTable;
    /// #
    /// let mut table: HashTable<u64> = HashTable::new();
    /// assert_eq!(*table.entry(9, |&v: &u64| v == 9).or_insert(9), 9);
    /// assert_eq!(*table.entry(9, |&v: &u64| v == 9).or_insert(9), 9);
    /// assert_eq!(table.len(), 1);
    /// ```
    pub fn or_insert(self, default: V) -> &'a V {
        match self {
            Entry::Occupied(entry) => entry.into_ref(),
            Entry::Vacant(entry) => entry.insert(default).into_ref(),
        }
    }

    /// Inserts the result of `default` if the entry is vacant and returns a
    /// reference to the stored value.
    pub fn or_insert_with(self, default: impl FnOnce() -> V) -> &'a V {
        match self {
            Entry::Occupied(entry) => entry.into_ref(),
            Entry::Vacant(entry) => entry.insert(default()).into_ref(),
        }
    }
}

/// A view into a vacant entry in a [`HashTable`].
pub struct VacantEntry<'a, V> {
    table: &'a mut HashTable<V>,
    hash: u64,
}

impl<'a, V> VacantEntry<'a, V> {
    /// Inserts `value` at the tail of its home bucket's chain.
    pub fn insert(self, value: V) -> OccupiedEntry<'a, V> {
        let index = self.table.add(self.hash, value);
        OccupiedEntry {
            table: self.table,
            index,
        }
    }
}

/// A view into an occupied entry in a [`HashTable`].
pub struct OccupiedEntry<'a, V> {
    table: &'a mut HashTable<V>,
    index: usize,
}

impl<'a, V> OccupiedEntry<'a, V> {
    /// Returns a reference to the stored value.
    pub fn get(&self) -> &V {
        self.table.occupied(self.index)
    }

    /// Converts the entry into a reference bound to the table's lifetime.
    pub fn into_ref(self) -> &'a V {
        let table: &'a HashTable<V> = self.table;
        table.occupied(self.index)
    }

    /// Converts the entry into a cursor on its slot.
    pub fn into_cursor(self) -> Cursor<'a, V> {
        Cursor {
            table: self.table,
            index: self.index,
        }
    }

    /// Returns the physical slot index of the entry.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Removes the value from the table, repairing its chain.
    pub fn remove(self) -> V {
        self.table.erase_at(self.index)
    }
}

/// A read-only position in the physical slot array of a [`HashTable`].
///
/// A cursor always rests on an occupied slot or on the sentinel slot that
/// marks the end. Two cursors are equal when they point at the same slot of
/// the same table.
pub struct Cursor<'a, V> {
    table: &'a HashTable<V>,
    index: usize,
}

impl<V> Clone for Cursor<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for Cursor<'_, V> {}

impl<V> PartialEq for Cursor<'_, V> {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.table, other.table) && self.index == other.index
    }
}

impl<V> Eq for Cursor<'_, V> {}

impl<V> Debug for Cursor<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("index", &self.index)
            .field("end", &self.is_end())
            .finish()
    }
}

impl<'a, V> Cursor<'a, V> {
    fn new(table: &'a HashTable<V>, index: usize) -> Self {
        let mut cursor = Cursor { table, index };
        cursor.skip_vacant();
        cursor
    }

    #[inline]
    fn skip_vacant(&mut self) {
        while self.table.slots[self.index].is_vacant() {
            self.index += 1;
        }
    }

    /// Returns the value under the cursor, or `None` at the end.
    pub fn get(&self) -> Option<&'a V> {
        match &self.table.slots[self.index].state {
            SlotState::Occupied(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the physical slot index the cursor points at.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns `true` if the cursor is on the sentinel slot.
    pub fn is_end(&self) -> bool {
        matches!(self.table.slots[self.index].state, SlotState::Sentinel)
    }

    /// Advances to the next occupied slot, or to the end. Does nothing once
    /// the end is reached.
    pub fn move_next(&mut self) {
        if !self.is_end() {
            self.index += 1;
            self.skip_vacant();
        }
    }
}

/// An iterator over the values of a [`HashTable`] in physical slot order.
///
/// This struct is created by the [`iter`] method on [`HashTable`].
///
/// [`iter`]: HashTable::iter
pub struct Iter<'a, V> {
    cursor: Cursor<'a, V>,
    remaining: usize,
}

impl<V> Clone for Iter<'_, V> {
    fn clone(&self) -> Self {
        Iter {
            cursor: self.cursor,
            remaining: self.remaining,
        }
    }
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        let value = self.cursor.get()?;
        self.cursor.move_next();
        self.remaining -= 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

impl<V> FusedIterator for Iter<'_, V> {}

/// An owning iterator over the values of a [`HashTable`].
pub struct IntoIter<V> {
    slots: alloc::vec::IntoIter<Slot<V>>,
    remaining: usize,
}

impl<V> Iterator for IntoIter<V> {
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        for slot in self.slots.by_ref() {
            if let SlotState::Occupied(value) = slot.state {
                self.remaining -= 1;
                return Some(value);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for IntoIter<V> {}

impl<V> FusedIterator for IntoIter<V> {}

/// A draining iterator over the values of a [`HashTable`].
///
/// This struct is created by the [`drain`] method on [`HashTable`]. The table
/// is already empty when the iterator is returned.
///
/// [`drain`]: HashTable::drain
pub struct Drain<'a, V> {
    inner: IntoIter<V>,
    _marker: PhantomData<&'a mut HashTable<V>>,
}

impl<V> Iterator for Drain<'_, V> {
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<V> ExactSizeIterator for Drain<'_, V> {}

impl<V> FusedIterator for Drain<'_, V> {}

/// Slot-by-slot listing of a [`HashTable`], created by [`HashTable::dump`].
pub struct Dump<'a, V> {
    table: &'a HashTable<V>,
}

impl<V: Debug> fmt::Display for Dump<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.table;
        writeln!(
            f,
            "primary_capacity = {}, cellar_capacity = {}, whole_size = {}, len = {}",
            table.capacity.primary,
            table.capacity.cellar,
            table.capacity.whole(),
            table.populated
        )?;

        for (index, slot) in table.slots.iter().enumerate() {
            write!(f, "{index}: ")?;
            match &slot.state {
                SlotState::Free => f.write_str("FREE")?,
                SlotState::Occupied(value) => {
                    write!(f, "{value:?} USED")?;
                    if let Some(next) = slot.next {
                        write!(f, " NEXT: {next}")?;
                    }
                }
                SlotState::TombstonedOverflow => f.write_str("TOMBSTONE")?,
                SlotState::Sentinel => f.write_str("END")?,
            }
            writeln!(f)?;
        }

        Ok(())
    }
}
