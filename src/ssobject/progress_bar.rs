//! Progress display of the object loop (feature `progress`).
//!
//! * [`object_progress_bar`] – the `indicatif` bar drawn while objects are aggregated.
//! * [`IterTimer`] – per-object wall time, smoothed by an exponential moving average
//!   `ema ← α·dt + (1 − α)·ema`, the first sample initializing the average.
//! * [`fmt_dur`] – compact rendering of a [`Duration`] (`"253µs"`, `"42ms"`, `"3.14s"`).
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str =
    "{bar:40.cyan/blue} {pos}/{len} objects ({percent:>3}%) | {per_sec} | ETA {eta_precise} | {msg}";

pub(crate) fn object_progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total.max(1) as u64);
    let style =
        ProgressStyle::with_template(TEMPLATE).unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb.enable_steady_tick(Duration::from_millis(200));
    pb
}

#[cfg_attr(feature = "parallel", allow(dead_code))]
pub(crate) struct IterTimer {
    last: Instant,
    alpha: f64,
    ema_ns: Option<f64>,
}

#[cfg_attr(feature = "parallel", allow(dead_code))]
impl IterTimer {
    pub(crate) fn new(alpha: f64) -> Self {
        Self {
            last: Instant::now(),
            alpha,
            ema_ns: None,
        }
    }

    /// Close the current iteration and return its duration.
    pub(crate) fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let dt = now.duration_since(self.last);
        self.last = now;

        let dt_ns = dt.as_nanos() as f64;
        self.ema_ns = Some(match self.ema_ns {
            None => dt_ns,
            Some(ema) => self.alpha * dt_ns + (1.0 - self.alpha) * ema,
        });
        dt
    }

    pub(crate) fn avg(&self) -> Duration {
        Duration::from_nanos(self.ema_ns.unwrap_or(0.0) as u64)
    }
}

#[cfg_attr(feature = "parallel", allow(dead_code))]
pub(crate) fn fmt_dur(d: Duration) -> String {
    match d.as_micros() {
        us if us < 1_000 => format!("{us}µs"),
        us if us < 1_000_000 => format!("{}ms", us / 1_000),
        _ => format!("{:.2}s", d.as_secs_f32()),
    }
}

#[cfg(test)]
mod progress_bar_test {
    use super::*;

    #[test]
    fn test_fmt_dur() {
        assert_eq!(fmt_dur(Duration::from_micros(253)), "253µs");
        assert_eq!(fmt_dur(Duration::from_millis(42)), "42ms");
        assert_eq!(fmt_dur(Duration::from_millis(3140)), "3.14s");
    }

    #[test]
    fn test_timer_average() {
        let mut timer = IterTimer::new(0.5);
        assert_eq!(timer.avg(), Duration::ZERO);
        let dt = timer.tick();
        assert_eq!(timer.avg().as_nanos(), dt.as_nanos());
    }
}
