//! Wall-clock access, injectable so trip timing is deterministic in tests.

use jiff::Timestamp;

pub trait Clock {
    fn now(&self) -> Timestamp;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

#[cfg(test)]
pub mod testing {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    /// A clock that only moves when told to. Clones share the time.
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        now_ms: Rc<Cell<i64>>,
    }

    impl ManualClock {
        pub fn at(now_ms: i64) -> Self {
            Self {
                now_ms: Rc::new(Cell::new(now_ms)),
            }
        }

        pub fn set(&self, now_ms: i64) {
            self.now_ms.set(now_ms);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Timestamp {
            Timestamp::from_millisecond(self.now_ms.get()).expect("test clock in range")
        }
    }
}
