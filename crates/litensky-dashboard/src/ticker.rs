//! Periodic day-period recompute for one city.

use std::time::Duration;

use chrono::Utc;
use litensky_weather::{classify, City, DayPeriod};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(60);

/// Publishes the city's day period on a watch channel until stopped or dropped.
pub struct DayPeriodTicker {
    receiver: watch::Receiver<DayPeriod>,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl DayPeriodTicker {
    /// Must be called inside a tokio runtime.
    pub fn spawn(city: &City, interval: Duration) -> Self {
        let (latitude, longitude) = (city.latitude, city.longitude);
        let (sender, receiver) = watch::channel(classify(latitude, longitude, Utc::now()));
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let name = city.name.clone();

        let handle = tokio::spawn(async move {
            let mut ticks = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticks.tick() => {
                        let period = classify(latitude, longitude, Utc::now());
                        sender.send_if_modified(|current| {
                            if *current == period {
                                return false;
                            }
                            tracing::debug!("{} is now {}", name, period);
                            *current = period;
                            true
                        });
                    }
                }
            }
            tracing::debug!("Day period ticker for {} stopped", name);
        });

        Self {
            receiver,
            cancel,
            handle,
        }
    }

    pub fn period(&self) -> DayPeriod {
        *self.receiver.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<DayPeriod> {
        self.receiver.clone()
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for DayPeriodTicker {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
