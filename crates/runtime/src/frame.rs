use foundation::time::Time;

/// Nominal frame delta used before a second host timestamp is known.
pub const NOMINAL_DT_S: f64 = 1.0 / 60.0;

/// Upper bound on a single frame delta. Long stalls (background tabs,
/// debugger pauses) must not turn into one huge damping step.
pub const MAX_DT_S: f64 = 0.1;

/// Per-frame metadata handed to every frame target.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Delta time since the previous frame (seconds).
    pub dt_s: f64,
    /// Host time at the start of the frame.
    pub time: Time,
}

impl Frame {
    pub fn new(index: u64, dt_s: f64, time: Time) -> Self {
        Self { index, dt_s, time }
    }
}

/// Turns host frame timestamps (e.g. the `requestAnimationFrame` argument)
/// into a sequence of [`Frame`]s.
#[derive(Debug, Default, Clone)]
pub struct FrameClock {
    next_index: u64,
    last: Option<Time>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_elapsed(&self) -> u64 {
        self.next_index
    }

    pub fn advance(&mut self, now: Time) -> Frame {
        let dt_s = match self.last {
            Some(prev) => (now - prev).clamp(0.0, MAX_DT_S),
            None => NOMINAL_DT_S,
        };
        let frame = Frame::new(self.next_index, dt_s, now);
        self.next_index = self.next_index.wrapping_add(1);
        self.last = Some(now);
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_uses_nominal_dt() {
        let mut clock = FrameClock::new();
        let f0 = clock.advance(Time::from_millis(1234.0));
        assert_eq!(f0.index, 0);
        assert_eq!(f0.dt_s, NOMINAL_DT_S);
    }

    #[test]
    fn dt_follows_host_timestamps() {
        let mut clock = FrameClock::new();
        clock.advance(Time::from_millis(1000.0));
        let f1 = clock.advance(Time::from_millis(1020.0));
        assert_eq!(f1.index, 1);
        assert!((f1.dt_s - 0.02).abs() < 1e-12);
        assert_eq!(clock.frames_elapsed(), 2);
    }

    #[test]
    fn dt_is_clamped() {
        let mut clock = FrameClock::new();
        clock.advance(Time::from_millis(0.0));
        assert_eq!(clock.advance(Time::from_millis(5000.0)).dt_s, MAX_DT_S);
        // Timestamps going backwards never produce a negative step.
        assert_eq!(clock.advance(Time::from_millis(4000.0)).dt_s, 0.0);
    }
}
