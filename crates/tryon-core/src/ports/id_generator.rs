//! IdGenerator port - creation-timestamp ids.
//!
//! Ids are milliseconds since the epoch taken from a `Clock`. Two ids minted
//! in the same millisecond would collide and make deletion ambiguous, so the
//! generator never hands out the same value twice: it returns
//! `max(now, last + 1)`.

use std::sync::atomic::{AtomicI64, Ordering};

use crate::domain::{GarmentId, LookId, MeasurementId};
use crate::ports::Clock;

pub trait IdGenerator: Send + Sync {
    fn generate_look_id(&self) -> LookId;

    fn generate_measurement_id(&self) -> MeasurementId;

    fn generate_garment_id(&self) -> GarmentId;
}

/// Timestamp ids, strictly increasing across all id types.
pub struct TimestampIdGenerator<C> {
    clock: C,
    last: AtomicI64,
}

impl<C: Clock> TimestampIdGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            last: AtomicI64::new(i64::MIN),
        }
    }

    fn next_value(&self) -> i64 {
        let now = self.clock.now().timestamp_millis();
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let next = now.max(last.saturating_add(1));
            match self
                .last
                .compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(actual) => last = actual,
            }
        }
    }
}

impl<C: Clock> IdGenerator for TimestampIdGenerator<C> {
    fn generate_look_id(&self) -> LookId {
        LookId::new(self.next_value())
    }

    fn generate_measurement_id(&self) -> MeasurementId {
        MeasurementId::new(self.next_value())
    }

    fn generate_garment_id(&self) -> GarmentId {
        GarmentId::new(self.next_value())
    }
}
