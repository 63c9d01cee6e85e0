use async_trait::async_trait;
use chatdesk_session::Sleeper;
use std::time::Duration;

/// Debounce clock for the terminal client
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait(?Send)]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
