use std::time::Duration;

use tokio::time::Instant;

/// Single-shot timer that every trigger pushes back.
///
/// It only holds a deadline. The owner awaits [`Debouncer::elapsed`] inside
/// its select loop and reads whatever state is current when it fires.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Restart the quiet period from now
    pub fn trigger(&mut self) {
        self.deadline = Some(Instant::now() + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    #[cfg(test)]
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Resolves once the deadline passes, never while disarmed.
    /// The caller disarms with [`Debouncer::cancel`] after it fires.
    pub async fn elapsed(&self) {
        match self.deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }
}
