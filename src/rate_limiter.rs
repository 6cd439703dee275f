use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use crate::errors::ApiError;

/// Unit of time whose length becomes the limiter window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Millisecond,
    Second,
    Minute,
    Hour,
    Day,
}

impl TimeUnit {
    pub fn as_duration(self) -> Duration {
        match self {
            TimeUnit::Millisecond => Duration::from_millis(1),
            TimeUnit::Second => Duration::from_secs(1),
            TimeUnit::Minute => Duration::from_secs(60),
            TimeUnit::Hour => Duration::from_secs(60 * 60),
            TimeUnit::Day => Duration::from_secs(24 * 60 * 60),
        }
    }
}

#[derive(Debug)]
struct Window {
    available_tokens: u32,
    window_end: Instant,
}

impl Window {
    /// Snaps the bucket back to full once the current window has elapsed.
    /// Returns true when a reset happened.
    fn refill(&mut self, now: Instant, capacity: u32, window: Duration) -> bool {
        if now >= self.window_end {
            self.available_tokens = capacity;
            self.window_end = now + window;
            true
        } else {
            false
        }
    }
}

/// Fixed-window admission gate shared by every submitting task.
///
/// At most `capacity` admissions are granted per window. The window restarts
/// at the instant of the first refill check after it expires, so a burst of up
/// to `2 * capacity` can straddle a boundary.
#[derive(Debug)]
pub struct RateLimiter {
    capacity: u32,
    window: Duration,
    state: Mutex<Window>,
}

impl RateLimiter {
    pub fn new(window: Duration, capacity: u32) -> Result<Self, ApiError> {
        if capacity == 0 {
            return Err(ApiError::InvalidArgument(
                "Request limit must be positive".to_string(),
            ));
        }
        if window.is_zero() {
            return Err(ApiError::InvalidArgument(
                "Rate limit window must be positive".to_string(),
            ));
        }

        Ok(Self {
            capacity,
            window,
            state: Mutex::new(Window {
                available_tokens: capacity,
                window_end: Instant::now() + window,
            }),
        })
    }

    /// `capacity` requests per one `unit` of time.
    pub fn per_unit(unit: TimeUnit, capacity: u32) -> Result<Self, ApiError> {
        Self::new(unit.as_duration(), capacity)
    }

    pub fn per_second(capacity: u32) -> Result<Self, ApiError> {
        Self::per_unit(TimeUnit::Second, capacity)
    }

    pub fn per_minute(capacity: u32) -> Result<Self, ApiError> {
        Self::per_unit(TimeUnit::Minute, capacity)
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Tokens left in the current window, as last recorded.
    pub fn available_tokens(&self) -> u32 {
        self.lock().available_tokens
    }

    pub fn window_end(&self) -> Instant {
        self.lock().window_end
    }

    /// Takes a token if one is available right now, never waits.
    pub fn try_acquire(&self) -> bool {
        self.try_admit(Instant::now()).is_ok()
    }

    /// Waits until a token is reserved for the caller.
    ///
    /// Dropping the returned future before it completes consumes nothing.
    pub async fn acquire(&self) {
        loop {
            match self.try_admit(Instant::now()) {
                Ok(()) => return,
                Err(deadline) => {
                    if deadline > Instant::now() {
                        sleep_until(deadline).await;
                    }
                }
            }
        }
    }

    /// Like [`acquire`](Self::acquire), but gives up with
    /// [`ApiError::Interrupted`] once `cancel` fires. A cancelled caller never
    /// holds a token.
    pub async fn acquire_with_cancel(&self, cancel: &CancellationToken) -> Result<(), ApiError> {
        loop {
            if cancel.is_cancelled() {
                return Err(ApiError::Interrupted);
            }

            match self.try_admit(Instant::now()) {
                Ok(()) => return Ok(()),
                Err(deadline) => {
                    if deadline <= Instant::now() {
                        continue;
                    }
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(ApiError::Interrupted),
                        _ = sleep_until(deadline) => {}
                    }
                }
            }
        }
    }

    /// Single check-and-decrement under the lock. On exhaustion returns the
    /// instant the current window ends; the lock is released before returning.
    fn try_admit(&self, now: Instant) -> Result<(), Instant> {
        let mut state = self.lock();
        state.refill(now, self.capacity, self.window);

        if state.available_tokens > 0 {
            state.available_tokens -= 1;
            Ok(())
        } else {
            Err(state.window_end)
        }
    }

    // The critical section cannot panic midway, so a poisoned state is still consistent.
    fn lock(&self) -> MutexGuard<'_, Window> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
