use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// "Some switch moved" flag shared between an input source and the main
/// loop.
///
/// The input side only ever sets it; the loop reads and clears it in one
/// step, so a change raised while the loop is busy is seen on the next
/// check.
#[derive(Clone, Debug, Default)]
pub struct ChangeNotifier {
    flag: Arc<AtomicBool>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Read and clear.
    pub fn take(&self) -> bool {
        self.flag.swap(false, Ordering::AcqRel)
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::ChangeNotifier;

    #[test]
    fn take_clears_the_flag() {
        let notifier = ChangeNotifier::new();
        let input_side = notifier.clone();
        assert!(!notifier.take());
        input_side.notify();
        assert!(notifier.is_set());
        assert!(notifier.take());
        assert!(!notifier.take());
    }

    #[test]
    fn notify_from_another_thread() {
        let notifier = ChangeNotifier::new();
        let input_side = notifier.clone();
        std::thread::spawn(move || input_side.notify())
            .join()
            .unwrap();
        assert!(notifier.take());
    }
}
