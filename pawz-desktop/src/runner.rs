//! The host loop: tokio timers drive a [`PetApp`] until shutdown.

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use tokio::time::{Instant, MissedTickBehavior, interval, interval_at};
use tracing::{error, info};

use pawz_chat::ChatBackend;

use crate::app::PetApp;
use crate::error::Result;

const HOUR: Duration = Duration::from_secs(3600);
const DAY_CHECK: Duration = Duration::from_secs(60);

/// Run frame, autosave, hourly and day-rollover ticks until `shutdown`
/// resolves, then flush chats and save.
///
/// `shutdown` is polled across every loop iteration; it is created once by
/// the caller, so a signal that arrives between two ticks is not lost.
///
/// # Errors
/// A frame tick error means a pet record is corrupt. The loop stops at once
/// and nothing is saved, so the last good save survives.
pub async fn run<B, F>(app: &mut PetApp<B>, shutdown: F) -> Result<()>
where
    B: ChatBackend,
    F: Future<Output = ()>,
{
    let frame_period = Duration::from_secs_f64(1.0 / f64::from(app.config().general.frame_rate_hz));
    let autosave_period = Duration::from_secs(app.config().persistence.autosave_interval_seconds);

    let mut frames = interval(frame_period);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut autosave = interval_at(Instant::now() + autosave_period, autosave_period);
    let mut hourly = interval_at(Instant::now() + HOUR, HOUR);
    let mut day_check = interval_at(Instant::now() + DAY_CHECK, DAY_CHECK);

    let mut last_frame = Instant::now();
    let mut today = Utc::now().date_naive();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => {
                info!("Shutdown requested");
                break;
            }
            _ = frames.tick() => {
                let now = Instant::now();
                let dt = now.duration_since(last_frame).as_secs_f32();
                last_frame = now;

                if let Err(e) = app.on_frame_tick(dt) {
                    error!(error = %e, "Pet state corrupted; exiting without saving");
                    return Err(e);
                }
                for delivered in app.take_replies() {
                    let label = app.pet(delivered.pet).map(|p| p.label()).unwrap_or_default();
                    info!(pet = %delivered.pet, label = %label, source = ?delivered.reply.source, reply = %delivered.reply.text, "Pet replied");
                }
            }
            _ = autosave.tick() => {
                app.advance_clock(Utc::now());
                if let Some(report) = app.on_minute_tick() {
                    info!(pets = report.pets, bytes = report.bytes, "Autosaved");
                }
            }
            _ = hourly.tick() => {
                app.advance_clock(Utc::now());
                app.on_hour_tick();
            }
            _ = day_check.tick() => {
                let now = Utc::now();
                let date = now.date_naive();
                if date != today {
                    info!(day = %date, "New day");
                    today = date;
                    app.advance_clock(now);
                    app.on_day_rollover();
                }
            }
        }
    }

    app.shutdown();
    Ok(())
}
