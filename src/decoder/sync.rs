use log::{debug, warn};

use super::raster::RasterPosition;

/// Checks the counted raster position against the device's vertical sync.
///
/// Position is tracked by counting, not by decoding sync. The sync pulses are still
/// useful as a reference: a free-running device starts its vertical sync at the same
/// raster position every frame, so if the counted position at sync onset moves, the
/// counter has slipped relative to the device.
pub struct SyncMonitor {
    prev_h_sync: bool,
    prev_v_sync: bool,
    onset: Option<RasterPosition>,
    lines: u64,
    drifts: u64,
}

impl SyncMonitor {
    pub fn new() -> Self {
        Self {
            prev_h_sync: true,
            prev_v_sync: true,
            onset: None,
            lines: 0,
            drifts: 0,
        }
    }

    /// Sync lines are active low.
    pub fn observe(&mut self, h_sync: bool, v_sync: bool, pos: RasterPosition) {
        if self.prev_h_sync && !h_sync {
            self.lines += 1;
        }
        if self.prev_v_sync && !v_sync {
            self.vsync_onset(pos);
        }
        self.prev_h_sync = h_sync;
        self.prev_v_sync = v_sync;
    }

    fn vsync_onset(&mut self, pos: RasterPosition) {
        match self.onset {
            Some(prev) if prev != pos => {
                self.drifts += 1;
                if self.drifts == 1 {
                    warn!(
                        "Raster position drifted from device sync: vsync seen at {:?}, previously at {:?}",
                        pos, prev
                    );
                } else {
                    debug!("Vsync seen at {:?}, previously at {:?}", pos, prev);
                }
            }
            _ => (),
        }
        self.onset = Some(pos);
    }

    pub fn drifts(&self) -> u64 {
        self.drifts
    }

    pub fn lines(&self) -> u64 {
        self.lines
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
