use async_trait::async_trait;
use chatdesk_session::Sleeper;
use gloo_timers::future::TimeoutFuture;
use std::time::Duration;

/// Debounce clock on top of `setTimeout`
#[derive(Debug, Default, Clone, Copy)]
pub struct GlooSleeper;

#[async_trait(?Send)]
impl Sleeper for GlooSleeper {
    async fn sleep(&self, duration: Duration) {
        let millis = u32::try_from(duration.as_millis()).unwrap_or(u32::MAX);
        TimeoutFuture::new(millis).await;
    }
}
