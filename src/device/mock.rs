//! Mock gamma device for testing.

use std::sync::Mutex;

use super::GammaDevice;
use crate::error::GammaError;
use crate::ramp::Ramp;

#[derive(Debug)]
struct MockState {
    live: Ramp,
    writes: Vec<Ramp>,
    reads: usize,
    fail_reads: bool,
    fail_writes: bool,
    clamp_floor: Option<u8>,
}

/// In-memory display that records every ramp written to it
///
/// Without hardware attached this stands in for [`GammaDevice`]; it can also
/// refuse reads or writes, or silently clamp dim ramps the way some drivers do.
#[derive(Debug)]
pub struct MockDevice {
    state: Mutex<MockState>,
}

impl MockDevice {
    /// A display currently showing `live`
    pub fn new(live: Ramp) -> Self {
        Self {
            state: Mutex::new(MockState {
                live,
                writes: Vec::new(),
                reads: 0,
                fail_reads: false,
                fail_writes: false,
                clamp_floor: None,
            }),
        }
    }

    /// Make every read fail with `DeviceUnavailable`
    pub fn failing_reads(self) -> Self {
        self.state.lock().unwrap().fail_reads = true;
        self
    }

    /// Make every write fail with `DeviceUnavailable`
    pub fn set_fail_writes(&self, fail: bool) {
        self.state.lock().unwrap().fail_writes = fail;
    }

    /// Accept writes but apply the identity ramp scaled to `floor` whenever a
    /// darker top entry is requested
    pub fn clamping_below(self, floor: u8) -> Self {
        self.state.lock().unwrap().clamp_floor = Some(floor);
        self
    }

    pub fn live(&self) -> Ramp {
        self.state.lock().unwrap().live.clone()
    }

    pub fn writes(&self) -> Vec<Ramp> {
        self.state.lock().unwrap().writes.clone()
    }

    pub fn last_write(&self) -> Option<Ramp> {
        self.state.lock().unwrap().writes.last().cloned()
    }

    pub fn reads(&self) -> usize {
        self.state.lock().unwrap().reads
    }
}

impl GammaDevice for MockDevice {
    fn read(&self) -> Result<Ramp, GammaError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_reads {
            return Err(GammaError::DeviceUnavailable("mock read failure".to_string()));
        }
        state.reads += 1;
        Ok(state.live.clone())
    }

    fn write(&self, ramp: &Ramp) -> Result<(), GammaError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_writes {
            return Err(GammaError::DeviceUnavailable("mock write rejected".to_string()));
        }
        state.writes.push(ramp.clone());
        state.live = match state.clamp_floor {
            Some(floor) => {
                let floor_ramp = Ramp::identity().scale(floor)?;
                if ramp.red()[255] < floor_ramp.red()[255] {
                    floor_ramp
                } else {
                    ramp.clone()
                }
            }
            None => ramp.clone(),
        };
        Ok(())
    }
}
