//! # Skein: Growable SPMC Queues and a Recoverable Binary Format
//!
//! Skein bundles two building blocks for pipelines that hand data from one
//! thread to many and persist it in a form that survives damage:
//!
//! - [`spmc`]: a lock-free single-producer / multi-consumer queue whose
//!   ring storage grows on demand
//! - [`tbsf`]: a tagged, self-describing binary serialization format whose
//!   readers can resynchronise after corrupted bytes
//!
//! ## Features
//!
//! - **Lock-free consumers**: any number of consumers pop concurrently with
//!   a single compare-and-swap per item
//! - **Wait-free producer**: pushes never race anything and only allocate
//!   when the ring has to grow
//! - **Growth without pauses**: old blocks stay readable until the queue is
//!   dropped, so consumers never wait for a resize
//! - **Optional bounds**: cap the capacity and get `QueueError::Full` back
//!   instead of growing
//! - **Zero-copy decoding**: strings and blobs are borrowed straight from
//!   the input
//! - **Corruption recovery**: marker-tagged aggregates let readers skip
//!   damaged records and carry on
//!
//! ## Queues
//!
//! The builder hands out one [`Producer`](spmc::Producer) and any number of
//! [`Consumer`](spmc::Consumer)s:
//!
//! ```rust
//! use skein::{
//!     spmc::queue,
//!     traits::{QueueConsumer, QueueProducer},
//! };
//!
//! # fn main() -> Result<(), skein::QueueError> {
//! let (producer, consumer) = queue::<u64>().channels()?;
//!
//! producer.push(42)?;
//! assert_eq!(consumer.pop()?, 42);
//! assert_eq!(consumer.pop(), Err(skein::QueueError::Empty));
//! # Ok(())
//! # }
//! ```
//!
//! ### Index Numbers
//! Every item is tagged with its position in the push order:
//!
//! ```rust
//! use skein::{
//!     spmc::queue,
//!     traits::{QueueConsumer, QueueProducer},
//! };
//!
//! # fn main() -> Result<(), skein::QueueError> {
//! let (producer, consumer) = queue::<u8>().reserve(64).channels()?;
//!
//! producer.push(12)?;
//! producer.push(13)?;
//! assert_eq!(consumer.pop_with_seq()?, (12, 0));
//! assert_eq!(consumer.pop_with_seq()?, (13, 1));
//! # Ok(())
//! # }
//! ```
//!
//! ### Bounded Queues
//! A maximum capacity is rounded up to a power of two and never exceeded:
//!
//! ```rust
//! use skein::{
//!     spmc::queue,
//!     traits::{QueueConsumer, QueueProducer},
//!     QueueError,
//! };
//!
//! # fn main() -> Result<(), QueueError> {
//! let (producer, consumer) = queue::<i32>().max_capacity(4).channels()?;
//!
//! for i in 0..4 {
//!     producer.push(i)?;
//! }
//! assert_eq!(producer.try_push(4), Err((4, QueueError::Full)));
//!
//! assert_eq!(consumer.pop()?, 0);
//! producer.push(4)?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Bulk Processing
//! Consume elements until the queue runs dry or the closure asks to stop:
//!
//! ```rust
//! use skein::{
//!     spmc::queue,
//!     traits::{QueueConsumer, QueueProducer},
//! };
//!
//! # fn main() -> Result<(), skein::QueueError> {
//! let (producer, consumer) = queue::<u32>().channels()?;
//!
//! for i in 0..5 {
//!     producer.push(i)?;
//! }
//!
//! let mut sum = 0;
//! let count = consumer.consume(|value, _seq| {
//!     sum += value;
//!     value >= 3 // Stop after processing value 3
//! });
//!
//! assert_eq!((count, sum), (4, 6));
//! # Ok(())
//! # }
//! ```
//!
//! ## Thread Safety
//!
//! The producer may move to another thread but cannot be cloned; consumers
//! are cloned freely:
//!
//! ```rust
//! use skein::{
//!     spmc::queue,
//!     traits::{QueueConsumer, QueueProducer},
//! };
//! use std::thread;
//!
//! # fn main() -> Result<(), skein::QueueError> {
//! let (producer, consumer) = queue::<usize>().channels()?;
//!
//! let producer_handle = thread::spawn(move || {
//!     for i in 0..100 {
//!         producer.push(i).unwrap();
//!     }
//! });
//!
//! let consumer_handles: Vec<_> = (0..2)
//!     .map(|_| {
//!         let consumer = consumer.clone();
//!         thread::spawn(move || {
//!             let mut last = None;
//!             let mut taken = 0;
//!             while taken < 50 {
//!                 if let Ok((_, seq)) = consumer.pop_with_seq() {
//!                     assert!(last.is_none_or(|l| l < seq));
//!                     last = Some(seq);
//!                     taken += 1;
//!                 }
//!             }
//!         })
//!     })
//!     .collect();
//!
//! producer_handle.join().unwrap();
//! for handle in consumer_handles {
//!     handle.join().unwrap();
//! }
//! assert!(consumer.is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! ## Serialization
//!
//! Writers append records to any [`ByteSink`](tbsf::ByteSink); readers walk
//! them back with iterators or convert them with
//! [`Deserialize`](tbsf::Deserialize):
//!
//! ```rust
//! use skein::tbsf::{Reader, Tag, Writer};
//!
//! # fn main() -> Result<(), skein::tbsf::EncodeError> {
//! let mut writer = Writer::new(Vec::new());
//! writer.begin_recovery_object("Point:Magic")?;
//! writer.string("pos")?;
//! writer.f32v3([1.0, 2.0, 3.0])?;
//! writer.string("label")?;
//! writer.string("origin")?;
//! writer.end_recovery_object("Point:Magic")?;
//! let bytes = writer.into_inner();
//!
//! let mut reader = Reader::new(&bytes);
//! let point = reader.value();
//! assert_eq!(point.tag(), Tag::RECOVERY_OBJECT);
//!
//! while let Some((key, value)) = reader.iterate_object(&point) {
//!     match key.as_str() {
//!         Some("pos") => assert_eq!(value.as_f32s(), Some(&[1.0, 2.0, 3.0][..])),
//!         Some("label") => assert_eq!(value.as_str(), Some("origin")),
//!         _ => unreachable!(),
//!     }
//! }
//! assert!(reader.is_eof());
//! # Ok(())
//! # }
//! ```
//!
//! ## Memory Layout
//!
//! - Producer and consumer state live on separate cache lines
//! - Ring blocks have power-of-two capacities for mask-based indexing
//! - Retired blocks are chained behind the live one and freed on drop
//!
//! ## Error Handling
//!
//! Queue operations return `Result` types with descriptive errors:
//! - `QueueError::Full` - Bounded queue at capacity, or growth failed
//! - `QueueError::Empty` - No elements available
//! - `QueueError::FailedRace` - Another consumer took the element first
//! - `QueueError::InvalidCapacity` - Invalid configuration
//!
//! The TBSF reader never fails outright: malformed records come back as
//! ERROR values carrying a [`DecodeError`](tbsf::DecodeError), and are
//! logged through `tracing`.
//!
//! ## Minimum Supported Rust Version (MSRV)
//!
//! Skein requires Rust 1.88 or later.
#![deny(
    missing_docs,
    unused_imports,
    unused_variables,
    dead_code,
    unreachable_code,
    unused_must_use
)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::cast_precision_loss,
    clippy::type_complexity
)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// Byte search and stack scratch buffers shared by the codecs.
pub mod scan;

/// Growable lock-free single-producer / multi-consumer queue.
///
/// This module provides [`SpmcQueue`] together with its builder, the role
/// handles [`Producer`], [`Consumer`] and [`SoloConsumer`], and the raw
/// result types the unchecked operations report.
///
/// [`SpmcQueue`]: spmc::SpmcQueue
/// [`Producer`]: spmc::Producer
/// [`Consumer`]: spmc::Consumer
/// [`SoloConsumer`]: spmc::SoloConsumer
pub mod spmc;

pub mod tbsf;

/// Common traits for queue producers, consumers, and factories.
///
/// This module defines the role abstractions shared by the queue handles:
/// [`QueueProducer`], [`QueueConsumer`], and [`QueueFactory`].
///
/// [`QueueProducer`]: traits::QueueProducer
/// [`QueueConsumer`]: traits::QueueConsumer
/// [`QueueFactory`]: traits::QueueFactory
pub mod traits;

use thiserror::Error;

/// Errors that can occur during queue operations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// The queue cannot take another element.
    ///
    /// Returned when a bounded queue is at its maximum capacity, or when
    /// growing the ring failed to allocate.
    #[error("queue is full")]
    Full,

    /// The queue contains no elements to consume.
    #[error("queue is empty")]
    Empty,

    /// Another consumer claimed the element this one was about to take.
    ///
    /// Only single-attempt pops report this; retrying is always safe.
    #[error("lost the race for an element to another consumer")]
    FailedRace,

    /// The specified capacity is invalid.
    ///
    /// A maximum capacity must be at least 1.
    #[error("invalid capacity: a maximum capacity must be at least 1")]
    InvalidCapacity,

    /// The element type cannot be stored.
    ///
    /// Zero-sized types carry no data and are rejected.
    #[error("element size {size} is not supported")]
    InvalidItemSize {
        /// Size of the rejected element type.
        size: usize,
    },

    /// The queue's producer has already been handed out.
    #[error("the producer for this queue was already taken")]
    ProducerTaken,
}

pub use spmc::{Consumer, Producer, QueueBuilder, SoloConsumer, SpmcQueue, queue};
pub use tbsf::{Reader, Tag, Value, Writer};
