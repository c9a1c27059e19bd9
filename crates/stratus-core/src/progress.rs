//! Per-page progress reporting.

use tokio::sync::mpsc;

/// Receives each page's items as soon as that page has been fetched.
///
/// Reports are delivered synchronously from the fetching task, once per page
/// and before the next page is requested. A sink shared between concurrent
/// aggregations sees their reports interleaved.
pub trait Progress<T>: Send + Sync {
    /// Called with the items of one freshly fetched page.
    fn report(&self, page: &[T]);
}

impl<T, F> Progress<T> for F
where
    F: Fn(&[T]) + Send + Sync,
{
    #[inline]
    fn report(&self, page: &[T]) {
        self(page)
    }
}

/// Progress sink that forwards owned copies of each page over a channel.
///
/// Reports are dropped silently once the receiver is gone.
#[derive(Debug, Clone)]
pub struct ProgressChannel<T> {
    sender: mpsc::UnboundedSender<Vec<T>>,
}

impl<T> ProgressChannel<T> {
    /// Creates a new sink together with the receiving half.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Vec<T>>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl<T> Progress<T> for ProgressChannel<T>
where
    T: Clone + Send,
{
    fn report(&self, page: &[T]) {
        let _ = self.sender.send(page.to_vec());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn closure_sink_receives_pages() {
        let seen = Mutex::new(Vec::new());
        let sink = |page: &[u32]| seen.lock().unwrap().push(page.to_vec());

        sink.report(&[1, 2]);
        sink.report(&[]);

        assert_eq!(*seen.lock().unwrap(), vec![vec![1, 2], vec![]]);
    }

    #[test]
    fn channel_sink_forwards_copies() {
        let (sink, mut receiver) = ProgressChannel::new();

        sink.report(&["a", "b"]);
        sink.report(&["c"]);

        assert_eq!(receiver.try_recv().unwrap(), vec!["a", "b"]);
        assert_eq!(receiver.try_recv().unwrap(), vec!["c"]);
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn channel_sink_ignores_closed_receiver() {
        let (sink, receiver) = ProgressChannel::<u8>::new();
        drop(receiver);

        sink.report(&[1]);
    }
}
