//! Bounded per-channel packet queues.
//!
//! Each channel has one producer (the receive thread) and one consumer (the
//! game loop). When a queue is full the oldest packet is evicted to admit the
//! new one, so a slow consumer sees current state rather than a backlog.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use gamelink_frame::{Channel, Packet};

use crate::error::{Result, SessionError};

/// Bounded FIFO of packets for one channel, with drop-oldest overflow.
#[derive(Debug)]
pub struct PacketQueue {
    inner: Mutex<VecDeque<Packet>>,
    capacity: usize,
    evicted: AtomicU64,
}

impl PacketQueue {
    /// Create a queue holding at most `capacity` packets (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
            evicted: AtomicU64::new(0),
        }
    }

    /// Append a packet. Returns the evicted oldest packet if the queue was full.
    pub fn push(&self, packet: Packet) -> Option<Packet> {
        let mut queue = self.lock();
        let evicted = if queue.len() >= self.capacity {
            self.evicted.fetch_add(1, Ordering::Relaxed);
            queue.pop_front()
        } else {
            None
        };
        queue.push_back(packet);
        evicted
    }

    /// Copy the oldest packet's wire bytes into `buf` and remove it.
    ///
    /// Returns `Ok(0)` if the queue is empty. If `buf` is too small the
    /// packet stays queued and `BufferTooSmall` reports the size needed.
    pub fn dequeue_into(&self, buf: &mut [u8]) -> Result<usize> {
        let mut queue = self.lock();
        let Some(next) = queue.front() else {
            return Ok(0);
        };

        let required = next.wire_size();
        if required > buf.len() {
            return Err(SessionError::BufferTooSmall {
                required,
                capacity: buf.len(),
            });
        }

        buf[..required].copy_from_slice(next.wire());
        queue.pop_front();
        Ok(required)
    }

    /// Remove and return the oldest packet.
    pub fn pop(&self) -> Option<Packet> {
        self.lock().pop_front()
    }

    /// Wire size of the oldest packet, if any.
    pub fn next_size(&self) -> Option<usize> {
        self.lock().front().map(Packet::wire_size)
    }

    /// Number of queued packets.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True if no packets are queued.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Maximum number of queued packets.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total packets evicted because the queue was full.
    pub fn evicted(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }

    /// Drop every queued packet.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Packet>> {
        // A panic while holding the lock cannot leave the deque half-updated.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The game and system queues of one session.
#[derive(Debug)]
pub struct DualQueue {
    game: PacketQueue,
    system: PacketQueue,
}

impl DualQueue {
    /// Create both queues with their capacities.
    pub fn new(game_capacity: usize, system_capacity: usize) -> Self {
        Self {
            game: PacketQueue::new(game_capacity),
            system: PacketQueue::new(system_capacity),
        }
    }

    /// The queue for a channel.
    pub fn queue(&self, channel: Channel) -> &PacketQueue {
        match channel {
            Channel::Game => &self.game,
            Channel::System => &self.system,
        }
    }

    /// Append a packet to a channel's queue. Returns the evicted packet, if any.
    pub fn enqueue(&self, channel: Channel, packet: Packet) -> Option<Packet> {
        self.queue(channel).push(packet)
    }

    /// Copy the next packet of a channel into `buf`; see [`PacketQueue::dequeue_into`].
    pub fn dequeue(&self, channel: Channel, buf: &mut [u8]) -> Result<usize> {
        self.queue(channel).dequeue_into(buf)
    }

    /// Remove and return the next packet of a channel.
    pub fn try_recv(&self, channel: Channel) -> Option<Packet> {
        self.queue(channel).pop()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use gamelink_frame::PacketLength;

    use super::*;

    fn packet(type_id: u8, payload: &[u8]) -> Packet {
        Packet::encode(PacketLength::Prefixed, type_id, payload).unwrap()
    }

    #[test]
    fn fifo_order() {
        let queue = PacketQueue::new(8);
        queue.push(packet(1, b"a"));
        queue.push(packet(2, b"b"));
        queue.push(packet(3, b"c"));

        let order: Vec<u8> = std::iter::from_fn(|| queue.pop())
            .map(|p| p.type_id())
            .collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn empty_dequeue_returns_zero() {
        let queue = PacketQueue::new(4);
        let mut buf = [0u8; 16];
        assert_eq!(queue.dequeue_into(&mut buf).unwrap(), 0);
        assert!(queue.pop().is_none());
    }

    #[test]
    fn dequeue_copies_whole_wire_packet() {
        let queue = PacketQueue::new(4);
        queue.push(packet(0x01, &[0xAA, 0xBB, 0xCC, 0xDD]));

        let mut buf = [0u8; 16];
        let n = queue.dequeue_into(&mut buf).unwrap();
        assert_eq!(n, 7);
        assert_eq!(&buf[..n], &[0x01, 0x00, 0x04, 0xAA, 0xBB, 0xCC, 0xDD]);
        assert!(queue.is_empty());
    }

    #[test]
    fn exact_size_buffer_is_enough() {
        let queue = PacketQueue::new(4);
        queue.push(packet(0x01, b"abcd"));

        let mut buf = [0u8; 7];
        assert_eq!(queue.dequeue_into(&mut buf).unwrap(), 7);
    }

    #[test]
    fn small_buffer_leaves_packet_queued() {
        let queue = PacketQueue::new(4);
        queue.push(packet(0x01, &[0xAA, 0xBB, 0xCC, 0xDD]));

        let mut small = [0u8; 2];
        let err = queue.dequeue_into(&mut small).unwrap_err();
        assert!(matches!(
            err,
            SessionError::BufferTooSmall {
                required: 7,
                capacity: 2
            }
        ));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.next_size(), Some(7));

        let mut big = [0u8; 16];
        assert_eq!(queue.dequeue_into(&mut big).unwrap(), 7);
        assert!(queue.is_empty());
    }

    #[test]
    fn overflow_evicts_oldest() {
        let queue = PacketQueue::new(3);
        for type_id in 1..=3 {
            assert!(queue.push(packet(type_id, b"")).is_none());
        }

        let evicted = queue.push(packet(4, b"")).expect("oldest should be evicted");
        assert_eq!(evicted.type_id(), 1);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.evicted(), 1);

        let survivors: Vec<u8> = std::iter::from_fn(|| queue.pop())
            .map(|p| p.type_id())
            .collect();
        assert_eq!(survivors, vec![2, 3, 4]);
    }

    #[test]
    fn zero_capacity_is_clamped_to_one() {
        let queue = PacketQueue::new(0);
        assert_eq!(queue.capacity(), 1);
        queue.push(packet(1, b""));
        queue.push(packet(2, b""));
        assert_eq!(queue.pop().map(|p| p.type_id()), Some(2));
    }

    #[test]
    fn channels_are_independent() {
        let queues = DualQueue::new(4, 4);
        queues.enqueue(Channel::Game, packet(1, b"game"));
        queues.enqueue(Channel::System, packet(0x8F, b"sys"));

        assert_eq!(queues.queue(Channel::Game).len(), 1);
        assert_eq!(queues.queue(Channel::System).len(), 1);

        let sys = queues.try_recv(Channel::System).unwrap();
        assert_eq!(sys.type_id(), 0x8F);
        assert!(queues.try_recv(Channel::System).is_none());

        let mut buf = [0u8; 16];
        assert_eq!(queues.dequeue(Channel::Game, &mut buf).unwrap(), 7);
        assert_eq!(queues.dequeue(Channel::Game, &mut buf).unwrap(), 0);
    }

    #[test]
    fn clear_empties_queue_but_keeps_counters() {
        let queue = PacketQueue::new(1);
        queue.push(packet(1, b""));
        queue.push(packet(2, b""));
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.evicted(), 1);
    }

    #[test]
    fn producer_consumer_threads_preserve_order() {
        let queue = Arc::new(PacketQueue::new(10_000));
        let producer = {
            let queue = Arc::clone(&queue);
            std::thread::spawn(move || {
                for i in 0..5_000u32 {
                    queue.push(packet(1, &i.to_be_bytes()));
                }
            })
        };

        let mut next = 0u32;
        let mut buf = [0u8; 16];
        while next < 5_000 {
            let n = queue.dequeue_into(&mut buf).unwrap();
            if n == 0 {
                std::thread::yield_now();
                continue;
            }
            assert_eq!(n, 7);
            let value = u32::from_be_bytes([buf[3], buf[4], buf[5], buf[6]]);
            assert_eq!(value, next);
            next += 1;
        }

        producer.join().unwrap();
        assert!(queue.is_empty());
    }
}
