use core::sync::atomic::{AtomicBool, AtomicU16, Ordering};

use heapless::spsc::{Consumer, Producer, Queue};

/// Receive conditions shared between the interrupt handler and the consumer.
///
/// Only the producer writes, so plain load/store is enough for the counter.
struct Status {
    overflow: AtomicBool,
    framing_errors: AtomicU16,
}

/// Bounded single-producer/single-consumer byte queue between the receive
/// interrupt and task level code.
///
/// Built on [`heapless::spsc::Queue`]: the producer only advances the head,
/// the consumer only advances the tail, and a full queue is detected as
/// `(head + 1) % N == tail`, so it stores at most `N - 1` bytes. Bytes are
/// never overwritten; a byte arriving at a full queue is dropped and the
/// sticky overflow flag is raised.
///
/// ```
/// use soft_uart::ByteQueue;
///
/// let mut queue: ByteQueue<4> = ByteQueue::new();
/// let (mut producer, mut consumer) = queue.split();
///
/// assert!(producer.push(b'A'));
/// assert_eq!(consumer.pop(), Some(b'A'));
/// assert_eq!(consumer.pop(), None);
/// ```
pub struct ByteQueue<const N: usize> {
    queue: Queue<u8, N>,
    status: Status,
}

impl<const N: usize> Default for ByteQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ByteQueue<N> {
    pub const fn new() -> Self {
        Self {
            queue: Queue::new(),
            status: Status {
                overflow: AtomicBool::new(false),
                framing_errors: AtomicU16::new(0),
            },
        }
    }

    /// Split into the interrupt side and the task side of the queue.
    pub fn split(&mut self) -> (ByteProducer<'_, N>, ByteConsumer<'_, N>) {
        let (producer, consumer) = self.queue.split();
        let status = &self.status;
        (
            ByteProducer {
                inner: producer,
                status,
            },
            ByteConsumer {
                inner: consumer,
                status,
            },
        )
    }
}

/// Interrupt side of a [`ByteQueue`].
pub struct ByteProducer<'a, const N: usize> {
    inner: Producer<'a, u8, N>,
    status: &'a Status,
}

impl<const N: usize> ByteProducer<'_, N> {
    /// Append a byte. Returns `false` if the queue is full, in which case the
    /// caller raises the overflow flag; interrupt context cannot wait.
    pub fn push(&mut self, byte: u8) -> bool {
        self.inner.enqueue(byte).is_ok()
    }

    /// Whether there is room for another byte
    pub fn ready(&self) -> bool {
        self.inner.ready()
    }

    /// Raise the sticky overflow flag
    pub fn set_overflow(&self) {
        self.status.overflow.store(true, Ordering::Release);
    }

    /// Count one frame whose stop bit was sampled low
    pub fn record_framing_error(&self) {
        let count = self.status.framing_errors.load(Ordering::Relaxed);
        self.status
            .framing_errors
            .store(count.wrapping_add(1), Ordering::Release);
    }
}

/// Task side of a [`ByteQueue`].
pub struct ByteConsumer<'a, const N: usize> {
    inner: Consumer<'a, u8, N>,
    status: &'a Status,
}

impl<const N: usize> ByteConsumer<'_, N> {
    /// Oldest pending byte, if any. Never blocks.
    pub fn pop(&mut self) -> Option<u8> {
        self.inner.dequeue()
    }

    /// Read and clear the overflow flag.
    ///
    /// Popping bytes does not clear the flag; only this does.
    pub fn take_overflow(&self) -> bool {
        critical_section::with(|_| {
            let overflow = self.status.overflow.load(Ordering::Acquire);
            self.status.overflow.store(false, Ordering::Release);
            overflow
        })
    }

    /// Read the overflow flag without clearing it
    pub fn overflow(&self) -> bool {
        self.status.overflow.load(Ordering::Acquire)
    }

    /// Frames received with a low stop bit since start-up (wrapping)
    pub fn framing_errors(&self) -> u16 {
        self.status.framing_errors.load(Ordering::Acquire)
    }

    /// Number of bytes waiting to be popped
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether no byte is pending
    pub fn is_empty(&self) -> bool {
        !self.inner.ready()
    }

    /// Maximum number of bytes the queue holds
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }
}

impl<const N: usize> Iterator for ByteConsumer<'_, N> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        self.pop()
    }
}
