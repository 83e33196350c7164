use super::handle::OverlayHandle;
use super::models::OverlayView;
use super::presenter::Presenter;
use super::render::render;
use chrono::{Local, Utc};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

/// Start the refresh timer and the display tick
pub fn start_scheduler<P>(
    handle: OverlayHandle,
    presenter: P,
    refresh_interval: Duration,
    tick: Duration,
) -> Vec<JoinHandle<()>>
where
    P: Presenter + 'static,
{
    // The first refresh happens at startup
    let refresh_handle = handle.clone();
    let refresh_task = tokio::spawn(async move {
        let mut timer = interval_at(Instant::now() + refresh_interval, refresh_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            timer.tick().await;
            match refresh_handle.refresh().await {
                Ok(outcome) => debug!("Periodic refresh: {:?}", outcome),
                Err(e) => error!("Failed to refresh events: {}", e),
            }
        }
    });

    let display_task = tokio::spawn(async move {
        let mut presenter = presenter;
        let mut feed_rx = handle.subscribe();
        let mut ticker = interval(tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = feed_rx.changed() => {
                    if changed.is_err() {
                        info!("Event feed closed, stopping display");
                        break;
                    }
                }
            }

            let feed = feed_rx.borrow_and_update().clone();
            let view = OverlayView::compute(&feed, Utc::now());
            if !view.timeline.skipped.is_empty() {
                debug!("{} events skipped on this tick", view.timeline.skipped.len());
            }

            if let Err(e) = presenter.present(&render(&view, &Local)) {
                error!("Failed to draw overlay: {}", e);
            }
        }
    });

    vec![refresh_task, display_task]
}
