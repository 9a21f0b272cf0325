use crate::{
    QueueError,
    spmc::{Popped, QueueResult},
};

/// Trait for the pushing end of a queue.
///
/// Implementors are the single producer of their queue, so pushes never
/// race each other.
pub trait QueueProducer<T> {
    /// Push a value without waiting for room.
    ///
    /// # Arguments
    /// * `value` - The value to push
    ///
    /// # Returns
    /// `Ok(())` on success, or the value back together with the error
    fn try_push(&self, value: T) -> Result<(), (T, QueueError)>;

    /// Push a value, backing off and retrying while a bounded queue is full.
    ///
    /// # Arguments
    /// * `value` - The value to push
    ///
    /// # Returns
    /// `Ok(())` on success, or `QueueError::Full` once the retry budget is
    /// spent
    fn push(&self, value: T) -> Result<(), QueueError>;

    /// Push a value and report the raw outcome with the indices observed.
    fn push_result(&self, value: T) -> QueueResult;
}

/// Trait for the popping ends of a queue.
pub trait QueueConsumer<T> {
    /// Make a single attempt at popping a value.
    ///
    /// # Returns
    /// The popped value, `QueueError::Empty`, or `QueueError::FailedRace`
    /// when another consumer took the slot first
    fn try_pop(&self) -> Result<T, QueueError>;

    /// Pop a value, retrying internally when other consumers interfere.
    ///
    /// # Returns
    /// The popped value, or `QueueError::Empty` if the queue is empty
    fn pop(&self) -> Result<T, QueueError>;

    /// Pop a value together with the queue index it occupied.
    ///
    /// # Returns
    /// The value and its index, or `QueueError::Empty` if empty
    fn pop_with_seq(&self) -> Result<(T, u64), QueueError>;

    /// Pop a value and report the raw outcome with the indices observed.
    fn pop_result(&self) -> Popped<T>;

    /// Drop the front value without copying it out.
    fn skip(&self) -> Result<(), QueueError>;

    /// Consume elements with a closure until the queue is empty or the
    /// closure returns `true` to stop.
    ///
    /// # Arguments
    /// * `consumer` - Function receiving each value and its index
    ///
    /// # Returns
    /// Number of elements consumed
    fn consume<F>(&self, mut consumer: F) -> usize
    where
        F: FnMut(T, u64) -> bool,
    {
        let mut count = 0;
        while let Ok((value, seq)) = self.pop_with_seq() {
            count += 1;
            if consumer(value, seq) {
                break;
            }
        }
        count
    }

    /// Number of items the queue held at some instant during the call.
    fn len(&self) -> usize;

    /// Check if the queue appears empty.
    /// Note: In concurrent scenarios, this may race with other operations.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Trait for queues that can hand out their role handles.
pub trait QueueFactory<T> {
    /// The type of producer this queue creates
    type Producer: QueueProducer<T>;

    /// The type of consumers this queue creates
    type Consumer: QueueConsumer<T>;

    /// Create the producer and a consumer in one call.
    ///
    /// # Returns
    /// A tuple containing `(producer, consumer)`, or
    /// `QueueError::ProducerTaken` if the producer was already handed out
    fn channel(&self) -> Result<(Self::Producer, Self::Consumer), QueueError> {
        Ok((self.producer()?, self.consumer()))
    }

    /// Take the producer. Succeeds at most once per queue.
    fn producer(&self) -> Result<Self::Producer, QueueError>;

    /// Create a new consumer handle for this queue.
    fn consumer(&self) -> Self::Consumer;
}
