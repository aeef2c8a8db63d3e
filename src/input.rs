use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Motion requested since the last simulation step. Deltas are summed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PendingMotion {
    pub forward: f64, // rate, scaled by move speed and dt
    pub strafe: f64,  // rate, positive is right
    pub turn: f64,    // rate, positive is counter-clockwise
    pub turn_angle: f64, // radians, applied as is
}

impl PendingMotion {
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.forward == 0.0 && self.strafe == 0.0 && self.turn == 0.0 && self.turn_angle == 0.0
    }
}

/// Cloneable handle to the engine's input accumulator. Any thread may add to
/// it; only the engine drains it, once per step.
#[derive(Debug, Clone, Default)]
pub struct MotionHandle {
    pending: Arc<Mutex<PendingMotion>>,
}

impl MotionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_motion(&self, forward: f64, strafe: f64, turn: f64) {
        let mut pending = self.lock();
        pending.forward += forward;
        pending.strafe += strafe;
        pending.turn += turn;
    }

    pub fn apply_turn_angle(&self, radians: f64) {
        self.lock().turn_angle += radians;
    }

    /// Read-and-reset.
    pub(crate) fn drain(&self) -> PendingMotion {
        std::mem::take(&mut *self.lock())
    }

    // The accumulator is plain data, so a panic elsewhere cannot leave it torn.
    fn lock(&self) -> MutexGuard<'_, PendingMotion> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn deltas_sum_until_drained() {
        let handle = MotionHandle::new();
        handle.apply_motion(1.0, 0.0, 0.5);
        handle.apply_motion(1.0, -1.0, 0.0);
        handle.apply_turn_angle(0.25);

        let drained = handle.drain();
        assert_eq!(
            drained,
            PendingMotion {
                forward: 2.0,
                strafe: -1.0,
                turn: 0.5,
                turn_angle: 0.25
            }
        );
        assert!(handle.drain().is_idle());
    }

    #[test]
    fn clones_share_the_accumulator() {
        let handle = MotionHandle::new();
        let remote = handle.clone();
        thread::spawn(move || {
            for _ in 0..100 {
                remote.apply_motion(0.0, 0.0, 0.01);
            }
        })
        .join()
        .unwrap();
        assert!((handle.drain().turn - 1.0).abs() < 1e-9);
    }
}
