//! Kamikaze / safe trajectory data records: the unit of Fréchet scoring.

use crate::error::{Result, SkdError};
use crate::types::Trajectory;

/// One simulated pedestrian path, the vehicle path it was run against, and
/// the safe reference it is compared to.
///
/// The pedestrian and vehicle paths are time-aligned and must have the same
/// length; the safe reference may be of any length.
#[derive(Clone, Debug, PartialEq)]
pub struct DataRecord {
    kamikaze_ped: Trajectory,
    kamikaze_veh: Trajectory,
    safe: Trajectory,
}

impl DataRecord {
    pub fn new(kamikaze_ped: Trajectory, kamikaze_veh: Trajectory, safe: Trajectory) -> Result<Self> {
        if kamikaze_ped.len() != kamikaze_veh.len() {
            return Err(SkdError::LengthMismatch {
                left: kamikaze_ped.len(),
                right: kamikaze_veh.len(),
            });
        }
        Ok(Self {
            kamikaze_ped,
            kamikaze_veh,
            safe,
        })
    }

    pub fn kamikaze_ped(&self) -> &Trajectory {
        &self.kamikaze_ped
    }

    pub fn kamikaze_veh(&self) -> &Trajectory {
        &self.kamikaze_veh
    }

    pub fn safe(&self) -> &Trajectory {
        &self.safe
    }
}
