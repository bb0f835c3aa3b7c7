use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// One-shot timer slot. Arming a new generation supersedes the pending one,
/// so at most the latest generation ever fires.
pub struct SuccessTimer {
    current: Arc<AtomicU64>,
    on_fire: Arc<dyn Fn(u64) + Send + Sync>,
}

impl SuccessTimer {
    pub fn new(on_fire: impl Fn(u64) + Send + Sync + 'static) -> Self {
        Self {
            current: Arc::new(AtomicU64::new(0)),
            on_fire: Arc::new(on_fire),
        }
    }

    pub fn arm(&self, generation: u64, delay: Duration) {
        self.current.store(generation, Ordering::SeqCst);
        let current = self.current.clone();
        let on_fire = self.on_fire.clone();
        thread::spawn(move || {
            thread::sleep(delay);
            if current.load(Ordering::SeqCst) == generation {
                on_fire(generation);
            }
        });
    }
}
