use std::time::Instant;

/// Wall-clock transport: a position in seconds that advances while playing.
///
/// All methods take the current instant explicitly so the clock can be driven from a
/// frame loop and stepped in tests.
#[derive(Clone, Copy, Debug)]
pub struct PlaybackClock {
    position: f64,
    started_at: Option<Instant>,
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self {
            position: 0.0,
            started_at: None,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn current_time_at(&self, now: Instant) -> f64 {
        match self.started_at {
            Some(start) => self.position + now.saturating_duration_since(start).as_secs_f64(),
            None => self.position,
        }
    }

    pub fn play(&mut self, now: Instant) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }

    pub fn pause(&mut self, now: Instant) {
        self.position = self.current_time_at(now);
        self.started_at = None;
    }

    pub fn toggle(&mut self, now: Instant) {
        if self.is_playing() {
            self.pause(now);
        } else {
            self.play(now);
        }
    }

    /// Jumps to `seconds` (clamped at 0) without changing play/pause state.
    pub fn seek(&mut self, seconds: f64, now: Instant) {
        self.position = seconds.max(0.0);
        if self.started_at.is_some() {
            self.started_at = Some(now);
        }
    }

    pub fn seek_by(&mut self, delta: f64, now: Instant) {
        let t = self.current_time_at(now);
        self.seek(t + delta, now);
    }
}

/// `m:ss`, floored to whole seconds. Negative and non-finite values show as `0:00`.
pub fn format_clock(seconds: f64) -> String {
    // The cast saturates, so absurdly long songs still print.
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_clock(0.0), "0:00");
        assert_eq!(format_clock(5.9), "0:05");
        assert_eq!(format_clock(65.0), "1:05");
        assert_eq!(format_clock(600.5), "10:00");
        assert_eq!(format_clock(-3.0), "0:00");
        assert_eq!(format_clock(f64::NAN), "0:00");
    }

    #[test]
    fn huge_durations_do_not_overflow() {
        let max = u64::MAX;
        assert_eq!(format_clock(1e20), format!("{}:{:02}", max / 60, max % 60));
        assert_eq!(format_clock(f64::INFINITY), "0:00");
    }

    #[test]
    fn advances_only_while_playing() {
        let t0 = Instant::now();
        let mut clock = PlaybackClock::new();
        assert_eq!(clock.current_time_at(t0 + Duration::from_secs(2)), 0.0);

        clock.play(t0);
        assert_eq!(clock.current_time_at(t0 + Duration::from_secs(2)), 2.0);

        clock.pause(t0 + Duration::from_secs(2));
        assert!(!clock.is_playing());
        assert_eq!(clock.current_time_at(t0 + Duration::from_secs(10)), 2.0);
    }

    #[test]
    fn seek_keeps_play_state() {
        let t0 = Instant::now();
        let mut clock = PlaybackClock::new();
        clock.toggle(t0);
        clock.seek(30.0, t0 + Duration::from_secs(1));
        assert!(clock.is_playing());
        assert_eq!(clock.current_time_at(t0 + Duration::from_secs(2)), 31.0);

        clock.seek_by(-100.0, t0 + Duration::from_secs(2));
        assert_eq!(clock.current_time_at(t0 + Duration::from_secs(2)), 0.0);

        clock.toggle(t0 + Duration::from_secs(3));
        assert_eq!(clock.current_time_at(t0 + Duration::from_secs(9)), 1.0);
    }
}
