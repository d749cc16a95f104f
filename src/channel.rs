use crate::error::Full;
use crate::loom_exports::sync::Arc;
use crate::queue::Queue;

/// Producer handle onto a shared [`Queue`].
pub struct Sender<T> {
    queue: Arc<Queue<T>>,
}

/// Consumer handle onto a shared [`Queue`].
pub struct Receiver<T> {
    queue: Arc<Queue<T>>,
}

/// Create a queue of `capacity` cells and return a producer and a consumer handle to it.
///
/// Both handles can be cloned freely to get any number of producers and consumers. The queue
/// lives until the last handle is dropped; dropping every sender does not close it.
///
/// # Panics
///
/// If `capacity` is less than 2 or not a power of two.
pub fn mpmc<T>(capacity: usize) -> (Sender<T>, Receiver<T>) {
    let queue = Arc::new(Queue::new(capacity));

    let producer = Sender { queue: queue.clone() };
    let consumer = Receiver { queue };

    (producer, consumer)
}

impl<T> Sender<T> {
    #[inline(always)]
    pub fn try_send(&self, value: T) -> Result<(), Full<T>> {
        self.queue.try_push(value)
    }

    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }
}

impl<T> Clone for Sender<T> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
        }
    }
}

impl<T> Receiver<T> {
    #[inline(always)]
    pub fn try_recv(&self) -> Option<T> {
        self.queue.try_pop()
    }

    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }
}

impl<T> Clone for Receiver<T> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[cfg(not(loom))]
    #[test]
    fn test_handles_share_one_ring() {
        let (tx, rx) = mpmc::<u32>(4);
        let tx2 = tx.clone();
        let rx2 = rx.clone();

        assert_eq!(tx.capacity(), 4);
        assert_eq!(rx2.capacity(), 4);

        tx.try_send(1).unwrap();
        tx2.try_send(2).unwrap();
        tx.try_send(3).unwrap();
        tx2.try_send(4).unwrap();
        assert_eq!(tx.try_send(5).map_err(Full::into_inner), Err(5));

        assert_eq!(rx2.try_recv(), Some(1));
        assert_eq!(rx.try_recv(), Some(2));
        assert_eq!(rx2.try_recv(), Some(3));
        assert_eq!(rx.try_recv(), Some(4));
        assert_eq!(rx.try_recv(), None);
    }

    #[cfg(not(loom))]
    #[test]
    fn test_queue_outlives_senders() {
        let (tx, rx) = mpmc::<&'static str>(2);
        tx.try_send("kept").unwrap();
        drop(tx);

        assert_eq!(rx.try_recv(), Some("kept"));
        assert_eq!(rx.try_recv(), None);
    }

    #[cfg(not(loom))]
    #[test]
    fn test_pipeline_stage_threads() {
        use std::thread;

        const ITEMS: u64 = 10_000;

        let (tx, rx) = mpmc::<u64>(128);

        let workers: Vec<_> = (0..3).map(|_| {
            let rx = rx.clone();
            thread::spawn(move || {
                let mut sum: u64 = 0;
                let mut count: u64 = 0;
                loop {
                    match rx.try_recv() {
                        Some(u64::MAX) => break,
                        Some(value) => {
                            sum += value;
                            count += 1;
                        }
                        None => thread::yield_now(),
                    }
                }
                (sum, count)
            })
        })
        .collect();

        // Jobs first, then one stop marker per worker; markers queue behind every job.
        for value in (0..ITEMS).chain(core::iter::repeat(u64::MAX).take(3)) {
            let mut value = value;
            while let Err(Full(rejected)) = tx.try_send(value) {
                value = rejected;
                thread::yield_now();
            }
        }

        let (sum, count) = workers
            .into_iter()
            .map(|w| w.join().unwrap())
            .fold((0, 0), |(s, c), (ws, wc)| (s + ws, c + wc));

        assert_eq!(count, ITEMS);
        assert_eq!(sum, ITEMS * (ITEMS - 1) / 2);
    }
}
