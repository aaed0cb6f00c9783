//! # Job Queues
//!
//! The two rendezvous points between the main thread and the chunk worker.
//! Each direction gets the discipline its consumer needs:
//!
//! * **Request queue** (main -> worker): blocking. The worker sleeps in
//!   `pop` while idle instead of polling, and `close` is the shutdown
//!   signal -- pending items are drained first, then `pop` reports
//!   end-of-stream.
//! * **Result queue** (worker -> main): non-blocking. The frame loop drains
//!   whatever is ready via `try_pop` and never waits on background work.
//!
//! Both are FIFO and unbounded; backpressure comes from the streaming
//! manager never re-requesting a chunk while its job is outstanding. Built
//! over `std::sync::mpsc`, which gives exactly these semantics: a blocking
//! `recv` that drains the channel after all senders are gone, and a
//! non-blocking `try_recv`.

use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};

/// Creates a connected request queue pair.
pub fn request_queue<T>() -> (RequestQueue<T>, JobReceiver<T>) {
    let (tx, rx) = channel();
    (RequestQueue { sender: Some(tx) }, JobReceiver { receiver: rx })
}

/// Creates a connected result queue pair.
pub fn result_queue<T>() -> (ResultSender<T>, ResultQueue<T>) {
    let (tx, rx) = channel();
    (ResultSender { sender: tx }, ResultQueue { receiver: rx })
}

/// Producer end of the blocking request queue. Owned by the streaming
/// manager; closing it is the worker's only termination signal.
pub struct RequestQueue<T> {
    sender: Option<Sender<T>>,
}

impl<T> RequestQueue<T> {
    /// Enqueues an item and wakes the consumer. Silently ignored after
    /// `close`, matching the queue's close-then-drain contract.
    pub fn push(&self, item: T) {
        if let Some(sender) = &self.sender {
            // The worker dropping its receiver mid-send only happens during
            // teardown; the item is discarded either way.
            let _ = sender.send(item);
        }
    }

    /// Closes the queue. Idempotent. Blocked and future `pop`s drain any
    /// remaining items, then report end-of-stream.
    pub fn close(&mut self) {
        self.sender.take();
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.sender.is_none()
    }
}

/// Consumer end of the blocking request queue. Moved into the worker thread.
pub struct JobReceiver<T> {
    receiver: Receiver<T>,
}

impl<T> JobReceiver<T> {
    /// Blocks until an item is available, returning `None` only once the
    /// queue is closed and fully drained.
    pub fn pop(&self) -> Option<T> {
        self.receiver.recv().ok()
    }
}

/// Producer end of the non-blocking result queue. Owned by the worker.
pub struct ResultSender<T> {
    sender: Sender<T>,
}

impl<T> ResultSender<T> {
    /// Publishes a completed item. If the consumer is already gone (engine
    /// teardown) the item is dropped, which releases any resources it owns.
    pub fn push(&self, item: T) {
        let _ = self.sender.send(item);
    }
}

/// Consumer end of the non-blocking result queue. Polled once per frame by
/// the streaming manager.
pub struct ResultQueue<T> {
    receiver: Receiver<T>,
}

impl<T> ResultQueue<T> {
    /// Returns the next completed item without waiting, or `None` when
    /// nothing is ready.
    pub fn try_pop(&self) -> Option<T> {
        match self.receiver.try_recv() {
            Ok(item) => Some(item),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn request_queue_is_fifo() {
        let (queue, receiver) = request_queue();
        for i in 0..10 {
            queue.push(i);
        }
        for i in 0..10 {
            assert_eq!(receiver.pop(), Some(i));
        }
    }

    #[test]
    fn close_drains_pending_items_before_end_of_stream() {
        let (mut queue, receiver) = request_queue();
        queue.push(1);
        queue.push(2);
        queue.close();

        assert_eq!(receiver.pop(), Some(1));
        assert_eq!(receiver.pop(), Some(2));
        assert_eq!(receiver.pop(), None);
    }

    #[test]
    fn close_is_idempotent_and_push_after_close_is_ignored() {
        let (mut queue, receiver) = request_queue::<u32>();
        queue.close();
        queue.close();
        assert!(queue.is_closed());
        queue.push(7);
        assert_eq!(receiver.pop(), None);
    }

    #[test]
    fn result_queue_never_blocks() {
        let (sender, queue) = result_queue();
        assert_eq!(queue.try_pop(), None);
        sender.push(42);
        assert_eq!(queue.try_pop(), Some(42));
        assert_eq!(queue.try_pop(), None);
    }

    /// Round-trips 100 distinct jobs through a background consumer, the way
    /// the chunk worker consumes them: block-pop until end-of-stream, push
    /// one result per job. All jobs must come back exactly once, in
    /// submission order.
    #[test]
    fn hundred_jobs_complete_in_order_with_no_drops() {
        let (mut requests, job_receiver) = request_queue();
        let (result_sender, results) = result_queue();

        let worker = thread::spawn(move || {
            while let Some(job) = job_receiver.pop() {
                result_sender.push(job);
            }
        });

        for key in 0..100u32 {
            requests.push(key);
        }
        requests.close();
        worker.join().unwrap();

        let mut seen = Vec::new();
        while let Some(key) = results.try_pop() {
            seen.push(key);
        }
        assert_eq!(seen, (0..100).collect::<Vec<_>>());
    }
}
