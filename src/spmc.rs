use crate::{
    QueueError,
    traits::{QueueConsumer, QueueFactory, QueueProducer},
};
use crossbeam_utils::{Backoff, CachePadded};
use portable_atomic::{AtomicBool, AtomicPtr, AtomicU64};
use std::{
    cell::{Cell, UnsafeCell},
    fmt,
    marker::PhantomData,
    mem::{MaybeUninit, size_of},
    ptr,
    sync::{
        Arc,
        atomic::{Ordering, fence},
    },
};

/// Smallest block the queue ever allocates, unless a maximum capacity
/// rounds to something smaller.
pub const MIN_BLOCK_CAPACITY: usize = 64;

/// Max attempts a blocking push makes while the queue reports full
const MAX_ATTEMPTS: usize = if cfg!(test) { 1000 } else { u16::MAX as usize };

/// Outcome of a single queue operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueState {
    /// The item was pushed or popped.
    Ok,
    /// There was nothing to pop.
    Empty,
    /// The queue hit its maximum capacity or a new block could not be
    /// allocated.
    Full,
    /// Another consumer claimed the same slot first. Only produced by
    /// [`SpmcQueue::pop_weak`].
    FailedRace,
}

/// State of an operation together with the indices observed *before* it
/// ran.
///
/// For pushes `tail` may be the producer's cached estimate; for pops `head`
/// may be the consumers' cached estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueueResult {
    /// Head index seen by the operation.
    pub head: u64,
    /// Tail index seen by the operation.
    pub tail: u64,
    /// What happened.
    pub state: QueueState,
}

impl QueueResult {
    /// `true` when the operation went through.
    pub const fn is_ok(&self) -> bool {
        matches!(self.state, QueueState::Ok)
    }

    /// Converts the state into a `Result`, keeping the indices on success.
    pub const fn into_result(self) -> Result<Self, QueueError> {
        match self.state {
            QueueState::Ok => Ok(self),
            QueueState::Empty => Err(QueueError::Empty),
            QueueState::Full => Err(QueueError::Full),
            QueueState::FailedRace => Err(QueueError::FailedRace),
        }
    }
}

/// Result of a pop: the operation outcome and, on success, the item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Popped<T> {
    /// Outcome and observed indices.
    pub result: QueueResult,
    /// The popped item, present iff `result.state == QueueState::Ok`.
    pub item: Option<T>,
}

impl<T> Popped<T> {
    /// Returns the item with the index it occupied in the queue.
    pub fn into_result(self) -> Result<(T, u64), QueueError> {
        let result = self.result.into_result()?;
        self.item
            .map(|item| (item, result.tail))
            .ok_or(QueueError::Empty)
    }
}

/// Power-of-two ring of slots. Blocks are chained through `next` to the
/// block they replaced so that all of them can be released on drop.
struct Block<T> {
    next: *mut Block<T>,
    mask: u64,
    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,
}

impl<T> Block<T> {
    /// Allocates a block of `capacity` slots, or `None` if the allocator
    /// refuses.
    fn allocate(capacity: usize, next: *mut Self) -> Option<*mut Self> {
        debug_assert!(capacity.is_power_of_two());

        let mut slots = Vec::new();
        slots.try_reserve_exact(capacity).ok()?;
        slots.resize_with(capacity, || UnsafeCell::new(MaybeUninit::uninit()));

        let block = Box::new(Self {
            next,
            mask: capacity as u64 - 1,
            slots: slots.into_boxed_slice(),
        });
        Some(Box::into_raw(block))
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    fn slot(&self, index: u64) -> *mut MaybeUninit<T> {
        // the masked index is always below `slots.len()`
        self.slots[(index & self.mask) as usize].get()
    }

    #[inline]
    fn has_room(block: Option<&Self>, head: u64, tail: u64) -> bool {
        block.is_some_and(|block| signed_distance(head, tail) <= block.mask as i64)
    }
}

/// Fields written only by the producer.
struct ProducerSide<T> {
    block: UnsafeCell<*mut Block<T>>,
    estimate_tail: UnsafeCell<u64>,
    head: AtomicU64,
    max_capacity: Option<usize>,
}

/// Fields shared by all consumers.
struct ConsumerSide<T> {
    block: AtomicPtr<Block<T>>,
    tail: AtomicU64,
    estimate_head: AtomicU64,
}

/// Growable single-producer multi-consumer FIFO queue for `Copy` items.
///
/// The producer pushes without touching consumer state in the common case:
/// it keeps a private estimate of the tail and only reloads the real one
/// when the queue looks full. Consumers do the same with a shared estimate
/// of the head and only race each other on the final compare-and-swap of
/// the tail.
///
/// When the ring fills up the producer allocates a block of twice the size,
/// copies the live items over and publishes it. Old blocks stay allocated
/// until the queue is dropped, so a consumer still holding one keeps
/// reading valid memory.
///
/// Most code should go through the role handles returned by [`queue`]:
/// [`Producer`], [`Consumer`] and [`SoloConsumer`]. The raw operations are
/// exposed for building other structures on top of the queue.
///
/// # Memory Layout
///
/// The producer and consumer fields live on separate cache lines so that
/// pushing and popping do not invalidate each other's lines.
pub struct SpmcQueue<T> {
    consumer: CachePadded<ConsumerSide<T>>,
    producer: CachePadded<ProducerSide<T>>,
    producer_taken: AtomicBool,
}

impl<T> fmt::Debug for SpmcQueue<T>
where
    T: Copy + Send,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpmcQueue")
            .field("capacity", &self.capacity())
            .field("max_capacity", &self.producer.max_capacity)
            .field("count", &self.count())
            .finish_non_exhaustive()
    }
}

/// Builder for SPMC queues.
///
/// # Examples
///
/// ```
/// use skein::{
///     spmc::queue,
///     traits::{QueueConsumer, QueueProducer},
/// };
///
/// # fn main() -> Result<(), skein::QueueError> {
/// let (producer, consumer) = queue::<u32>().reserve(128).channels()?;
///
/// producer.push(7)?;
/// assert_eq!(consumer.pop()?, 7);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct QueueBuilder<T> {
    max_capacity: Option<usize>,
    reserve: usize,
    _phantom: PhantomData<T>,
}

impl<T> Default for QueueBuilder<T>
where
    T: Copy + Send,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> QueueBuilder<T>
where
    T: Copy + Send,
{
    /// Create a builder for an unbounded queue with no block allocated
    pub const fn new() -> Self {
        Self {
            max_capacity: None,
            reserve: 0,
            _phantom: PhantomData,
        }
    }

    /// Never grow past the smallest power of two that holds `max` items
    #[must_use]
    pub const fn max_capacity(mut self, max: usize) -> Self {
        self.max_capacity = Some(max);
        self
    }

    /// Allocate room for `count` items up front
    #[must_use]
    pub const fn reserve(mut self, count: usize) -> Self {
        self.reserve = count;
        self
    }

    /// Build the shared queue
    pub fn build(self) -> Result<Arc<SpmcQueue<T>>, QueueError> {
        let size = size_of::<T>();
        if size == 0 {
            return Err(QueueError::InvalidItemSize { size });
        }
        if self.max_capacity == Some(0) {
            return Err(QueueError::InvalidCapacity);
        }

        let queue = SpmcQueue::new(self.max_capacity);
        // SAFETY: nobody else can see the queue yet.
        unsafe { queue.reserve(self.reserve) };
        Ok(Arc::new(queue))
    }

    /// Create the producer and a cloneable consumer
    pub fn channels(self) -> Result<(Producer<T>, Consumer<T>), QueueError> {
        let queue = self.build()?;
        let producer = queue.producer()?;
        Ok((producer, queue.consumer()))
    }

    /// Create the producer and the one and only consumer
    pub fn solo_channels(self) -> Result<(Producer<T>, SoloConsumer<T>), QueueError> {
        let queue = self.build()?;
        let producer = queue.producer()?;
        Ok((
            producer,
            SoloConsumer {
                queue,
                _not_sync: PhantomData,
            },
        ))
    }
}

/// Entry point for creating SPMC queues.
///
/// # Examples
///
/// ```
/// use skein::{spmc::queue, traits::QueueProducer, QueueError};
///
/// let (producer, _consumer) = queue::<u64>().max_capacity(4).channels()?;
///
/// for i in 0..4 {
///     producer.try_push(i).map_err(|(_, e)| e)?;
/// }
/// assert_eq!(producer.try_push(4), Err((4, QueueError::Full)));
/// # Ok::<(), QueueError>(())
/// ```
pub const fn queue<T>() -> QueueBuilder<T>
where
    T: Copy + Send,
{
    QueueBuilder::new()
}

impl<T> SpmcQueue<T>
where
    T: Copy + Send,
{
    fn new(max_capacity: Option<usize>) -> Self {
        Self {
            consumer: CachePadded::new(ConsumerSide {
                block: AtomicPtr::new(ptr::null_mut()),
                tail: AtomicU64::new(0),
                estimate_head: AtomicU64::new(0),
            }),
            producer: CachePadded::new(ProducerSide {
                block: UnsafeCell::new(ptr::null_mut()),
                estimate_tail: UnsafeCell::new(0),
                head: AtomicU64::new(0),
                max_capacity,
            }),
            producer_taken: AtomicBool::new(false),
        }
    }

    /// Upper bound on block size, if any.
    pub fn max_capacity(&self) -> Option<usize> {
        self.producer.max_capacity
    }

    /// Grows the queue so it holds at least `to_size` items, unless that
    /// would exceed the maximum capacity. Returns the capacity afterwards.
    ///
    /// # Safety
    ///
    /// Must only be called by the single producer.
    pub unsafe fn reserve(&self, to_size: usize) -> usize {
        let block = unsafe { self.grow(to_size) };
        unsafe { block.as_ref() }.map_or(0, Block::capacity)
    }

    /// Moves the live items into a larger block and publishes it. Returns
    /// the block that is current afterwards, which is the old one if no
    /// growth was needed, allowed or possible.
    #[cold]
    #[inline(never)]
    unsafe fn grow(&self, to_size: usize) -> *mut Block<T> {
        let producer = &*self.producer;
        // SAFETY: the producer is the only one touching its block cell.
        let old = unsafe { *producer.block.get() };
        let old_capacity = unsafe { old.as_ref() }.map_or(0, Block::capacity);
        let limit = producer.max_capacity.unwrap_or(usize::MAX);

        if to_size <= old_capacity || to_size > limit {
            return old;
        }

        let Some(mut capacity) = to_size.max(MIN_BLOCK_CAPACITY).checked_next_power_of_two()
        else {
            return old;
        };
        if let Some(bound) = producer
            .max_capacity
            .and_then(usize::checked_next_power_of_two)
        {
            capacity = capacity.min(bound);
        }

        let Some(new) = Block::allocate(capacity, old) else {
            return old;
        };

        if let Some(old_block) = unsafe { old.as_ref() } {
            let tail = self.consumer.tail.load(Ordering::Acquire);
            let head = producer.head.load(Ordering::Relaxed);
            // SAFETY: `new` is not published yet and slots in [tail, head)
            // were fully written before `head` moved past them.
            let new_block = unsafe { &*new };
            let mut index = tail;
            while signed_distance(head, index) > 0 {
                unsafe { ptr::copy_nonoverlapping(old_block.slot(index), new_block.slot(index), 1) };
                index = index.wrapping_add(1);
            }
        }

        unsafe { *producer.block.get() = new };
        // Pairs with the SeqCst load in `pop_impl`: a consumer must never see
        // the new head together with the old block.
        self.consumer.block.store(new, Ordering::SeqCst);
        new
    }

    /// Pushes one item.
    ///
    /// Returns [`QueueState::Full`] only when the queue would have to grow
    /// past its maximum capacity or the allocation failed.
    ///
    /// # Safety
    ///
    /// Must only be called by the single producer.
    #[inline]
    pub unsafe fn push_st(&self, item: T) -> QueueResult {
        let producer = &*self.producer;
        // SAFETY: producer-private cells, see the method contract.
        let mut block = unsafe { *producer.block.get() };
        let head = producer.head.load(Ordering::Relaxed);
        let mut tail = unsafe { *producer.estimate_tail.get() };

        if !Block::has_room(unsafe { block.as_ref() }, head, tail) {
            tail = self.consumer.tail.load(Ordering::Acquire);
            unsafe { *producer.estimate_tail.get() = tail };

            if !Block::has_room(unsafe { block.as_ref() }, head, tail) {
                let required = usize::try_from(head.wrapping_sub(tail))
                    .unwrap_or(usize::MAX)
                    .saturating_add(1);
                let grown = unsafe { self.grow(required) };
                if grown == block {
                    return QueueResult {
                        head,
                        tail,
                        state: QueueState::Full,
                    };
                }
                block = grown;
            }
        }

        // SAFETY: the slot at `head` is outside [tail, head) so no consumer
        // reads it until the release store below.
        unsafe { (*block).slot(head).write(MaybeUninit::new(item)) };
        producer.head.store(head.wrapping_add(1), Ordering::Release);

        QueueResult {
            head,
            tail,
            state: QueueState::Ok,
        }
    }

    /// Pops one item assuming no other consumer runs concurrently.
    ///
    /// # Safety
    ///
    /// The caller must be the only thread popping from the queue.
    #[inline]
    pub unsafe fn pop_st(&self) -> Popped<T> {
        self.pop_into(true)
    }

    /// Pops one item, or reports [`QueueState::FailedRace`] if another
    /// consumer took the slot first.
    #[inline]
    pub fn pop_weak(&self) -> Popped<T> {
        self.pop_into(false)
    }

    /// Pops one item, retrying internally until no other consumer
    /// interferes. Only returns [`QueueState::Ok`] or [`QueueState::Empty`].
    pub fn pop(&self) -> Popped<T> {
        let backoff = Backoff::new();
        loop {
            let popped = self.pop_weak();
            if popped.result.state != QueueState::FailedRace {
                return popped;
            }
            backoff.spin();
        }
    }

    /// Pops one item without copying it out.
    pub fn skip(&self) -> QueueResult {
        let backoff = Backoff::new();
        loop {
            let result = self.pop_impl(None, false);
            if result.state != QueueState::FailedRace {
                return result;
            }
            backoff.spin();
        }
    }

    #[inline]
    fn pop_into(&self, exclusive: bool) -> Popped<T> {
        let mut slot = MaybeUninit::uninit();
        let result = self.pop_impl(Some(&mut slot), exclusive);
        // SAFETY: a successful pop copied a slot the producer had published.
        let item = result.is_ok().then(|| unsafe { slot.assume_init() });
        Popped { result, item }
    }

    #[inline]
    fn pop_impl(&self, out: Option<&mut MaybeUninit<T>>, exclusive: bool) -> QueueResult {
        let consumer = &*self.consumer;
        let tail = consumer.tail.load(Ordering::Relaxed);
        let mut head = consumer.estimate_head.load(Ordering::Acquire);

        if signed_distance(head, tail) <= 0 {
            head = self.producer.head.load(Ordering::Acquire);
            consumer.estimate_head.store(head, Ordering::Release);
            if signed_distance(head, tail) <= 0 {
                return QueueResult {
                    head,
                    tail,
                    state: QueueState::Empty,
                };
            }
        }

        let block = consumer.block.load(Ordering::SeqCst);
        debug_assert!(!block.is_null(), "non-empty queue without a block");

        if let Some(out) = out {
            // SAFETY: blocks are never freed while the queue is alive, so the
            // slot pointer is valid. The read itself may race: a consumer
            // holding a stale `tail` can copy a slot the producer is already
            // rewriting after lapping it. That consumer's CAS on `tail` then
            // fails, because another consumer advanced `tail` past this slot
            // before the producer could reuse it, and the torn copy is
            // dropped as `FailedRace` without being handed out. `T: Copy`
            // means no drop glue ever runs on it. In exclusive mode nobody
            // else moves `tail` and the producer never reuses an unread slot,
            // so the read does not race at all.
            *out = unsafe { ptr::read_volatile((*block).slot(tail)) };
        }

        let state = if exclusive {
            consumer.tail.store(tail.wrapping_add(1), Ordering::Release);
            QueueState::Ok
        } else {
            match consumer.tail.compare_exchange(
                tail,
                tail.wrapping_add(1),
                Ordering::SeqCst,
                Ordering::Relaxed,
            ) {
                Ok(_) => QueueState::Ok,
                Err(_) => QueueState::FailedRace,
            }
        };

        QueueResult { head, tail, state }
    }

    /// Number of slots in the current block, zero before the first push.
    pub fn capacity(&self) -> usize {
        let block = self.consumer.block.load(Ordering::Acquire);
        // SAFETY: blocks are never freed while the queue is alive.
        unsafe { block.as_ref() }.map_or(0, Block::capacity)
    }

    /// Number of items the queue held at some instant during the call.
    pub fn count(&self) -> usize {
        let mut previous = self.consumer.tail.load(Ordering::Relaxed);
        loop {
            let head = self.producer.head.load(Ordering::Acquire);
            let tail = self.consumer.tail.load(Ordering::Acquire);

            // tail did not move between the two samples, so there was a
            // moment where both values held at once
            if tail == previous {
                return clamped_distance(head, tail);
            }
            previous = tail;
        }
    }

    /// Count that is never lower than the real one. Exact when called by
    /// the producer while no consumer is popping.
    pub fn count_upper(&self) -> usize {
        let tail = self.consumer.tail.load(Ordering::Relaxed);
        fence(Ordering::Acquire);
        let head = self.producer.head.load(Ordering::Relaxed);
        clamped_distance(head, tail)
    }

    /// Count that is never higher than the real one. Exact when called by
    /// the producer while no consumer is popping.
    pub fn count_lower(&self) -> usize {
        let head = self.producer.head.load(Ordering::Relaxed);
        fence(Ordering::Acquire);
        let tail = self.consumer.tail.load(Ordering::Relaxed);
        clamped_distance(head, tail)
    }

    /// `true` if the queue looked empty at some instant during the call.
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

impl<T> Drop for SpmcQueue<T> {
    fn drop(&mut self) {
        let mut current = *self.producer.block.get_mut();
        while !current.is_null() {
            // SAFETY: every block in the chain came from `Box::into_raw` and
            // `&mut self` rules out concurrent readers.
            let block = unsafe { Box::from_raw(current) };
            current = block.next;
        }
    }
}

#[inline]
const fn signed_distance(head: u64, tail: u64) -> i64 {
    head.wrapping_sub(tail) as i64
}

#[inline]
fn clamped_distance(head: u64, tail: u64) -> usize {
    usize::try_from(signed_distance(head, tail)).unwrap_or(0)
}

// Safety: producer-side cells are only touched through `unsafe` methods
// whose contract pins them to one thread; everything shared is atomic.
unsafe impl<T: Copy + Send> Send for SpmcQueue<T> {}
unsafe impl<T: Copy + Send> Sync for SpmcQueue<T> {}

/// The pushing end of a queue.
///
/// There is exactly one per queue. It can be moved to another thread but
/// neither cloned nor shared, which is what makes its pushes sound.
pub struct Producer<T> {
    queue: Arc<SpmcQueue<T>>,
    _not_sync: PhantomData<Cell<()>>,
}

impl<T> fmt::Debug for Producer<T>
where
    T: Copy + Send,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("queue", &self.queue)
            .finish()
    }
}

impl<T> Producer<T>
where
    T: Copy + Send,
{
    /// Grow the queue ahead of time. Returns the capacity afterwards.
    pub fn reserve(&self, count: usize) -> usize {
        // SAFETY: `Producer` is unique and `!Sync`.
        unsafe { self.queue.reserve(count) }
    }

    /// Current block capacity
    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Number of items the queue held at some instant during the call
    pub fn count(&self) -> usize {
        self.queue.count()
    }

    /// Item count bounds `(lower, upper)`; equal unless consumers are popping
    pub fn count_bounds(&self) -> (usize, usize) {
        // upper first: only the tail moves while the producer samples
        let upper = self.queue.count_upper();
        (self.queue.count_lower(), upper)
    }
}

impl<T> QueueProducer<T> for Producer<T>
where
    T: Copy + Send,
{
    fn try_push(&self, value: T) -> Result<(), (T, QueueError)> {
        match self.push_result(value).into_result() {
            Ok(_) => Ok(()),
            Err(e) => Err((value, e)),
        }
    }

    fn push(&self, value: T) -> Result<(), QueueError> {
        let backoff = Backoff::new();
        for _ in 0..MAX_ATTEMPTS {
            if self.push_result(value).is_ok() {
                return Ok(());
            }
            backoff.snooze();
        }
        Err(QueueError::Full)
    }

    fn push_result(&self, value: T) -> QueueResult {
        // SAFETY: `Producer` is unique and `!Sync`.
        unsafe { self.queue.push_st(value) }
    }
}

/// A popping end that may be cloned and shared across threads.
pub struct Consumer<T> {
    queue: Arc<SpmcQueue<T>>,
}

impl<T> Clone for Consumer<T> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
        }
    }
}

impl<T> fmt::Debug for Consumer<T>
where
    T: Copy + Send,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("queue", &self.queue)
            .finish()
    }
}

impl<T> Consumer<T>
where
    T: Copy + Send,
{
    /// Borrow the underlying queue
    pub fn queue(&self) -> &SpmcQueue<T> {
        &self.queue
    }
}

impl<T> QueueConsumer<T> for Consumer<T>
where
    T: Copy + Send,
{
    fn try_pop(&self) -> Result<T, QueueError> {
        self.queue.pop_weak().into_result().map(|(item, _)| item)
    }

    fn pop(&self) -> Result<T, QueueError> {
        self.queue.pop().into_result().map(|(item, _)| item)
    }

    fn pop_with_seq(&self) -> Result<(T, u64), QueueError> {
        self.queue.pop().into_result()
    }

    fn pop_result(&self) -> Popped<T> {
        self.queue.pop()
    }

    fn skip(&self) -> Result<(), QueueError> {
        self.queue.skip().into_result().map(|_| ())
    }

    fn len(&self) -> usize {
        self.queue.count()
    }
}

/// The only popping end of a queue built with
/// [`QueueBuilder::solo_channels`].
///
/// Pops skip the compare-and-swap on the tail, which is only sound because
/// this handle can be neither cloned nor shared.
pub struct SoloConsumer<T> {
    queue: Arc<SpmcQueue<T>>,
    _not_sync: PhantomData<Cell<()>>,
}

impl<T> fmt::Debug for SoloConsumer<T>
where
    T: Copy + Send,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoloConsumer")
            .field("queue", &self.queue)
            .finish()
    }
}

impl<T> QueueConsumer<T> for SoloConsumer<T>
where
    T: Copy + Send,
{
    fn try_pop(&self) -> Result<T, QueueError> {
        self.pop()
    }

    fn pop(&self) -> Result<T, QueueError> {
        self.pop_result().into_result().map(|(item, _)| item)
    }

    fn pop_with_seq(&self) -> Result<(T, u64), QueueError> {
        self.pop_result().into_result()
    }

    fn pop_result(&self) -> Popped<T> {
        // SAFETY: `SoloConsumer` is unique and `!Sync`.
        unsafe { self.queue.pop_st() }
    }

    fn skip(&self) -> Result<(), QueueError> {
        self.pop_result().into_result().map(|_| ())
    }

    fn len(&self) -> usize {
        self.queue.count()
    }
}

impl<T> QueueFactory<T> for Arc<SpmcQueue<T>>
where
    T: Copy + Send,
{
    type Producer = Producer<T>;
    type Consumer = Consumer<T>;

    fn producer(&self) -> Result<Self::Producer, QueueError> {
        if self.producer_taken.swap(true, Ordering::AcqRel) {
            return Err(QueueError::ProducerTaken);
        }
        Ok(Producer {
            queue: self.clone(),
            _not_sync: PhantomData,
        })
    }

    fn consumer(&self) -> Self::Consumer {
        Consumer {
            queue: self.clone(),
        }
    }
}
