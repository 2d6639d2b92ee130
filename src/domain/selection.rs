// Chart selection domain model
use super::bus::{BUS_COUNT, BusId};
use super::telemetry::WINDOW_OPTIONS;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("bus {0} is not one of the monitored buses (1..=13)")]
    InvalidBus(u32),
    #[error("{0} minutes is not a supported window")]
    InvalidWindow(u32),
}

/// Which bus and look-back window the chart view shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub bus: BusId,
    pub minutes: u32,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            bus: BusId::all()[0],
            minutes: WINDOW_OPTIONS[0],
        }
    }
}

impl Selection {
    pub fn new(bus: u32, minutes: u32) -> Result<Self, SelectionError> {
        let bus = BusId::new(bus).ok_or(SelectionError::InvalidBus(bus))?;
        if !WINDOW_OPTIONS.contains(&minutes) {
            return Err(SelectionError::InvalidWindow(minutes));
        }
        Ok(Self { bus, minutes })
    }

    /// Move to a neighbouring bus, clamped at both ends
    pub fn step_bus(self, delta: i32) -> Self {
        let next = (self.bus.get() as i64 + delta as i64).clamp(1, BUS_COUNT as i64) as u32;
        Self {
            bus: BusId::new(next).unwrap_or(self.bus),
            ..self
        }
    }

    /// Move to a neighbouring window option, clamped at both ends
    pub fn step_window(self, delta: i32) -> Self {
        let idx = WINDOW_OPTIONS
            .iter()
            .position(|m| *m == self.minutes)
            .unwrap_or(0) as i64;
        let next = (idx + delta as i64).clamp(0, WINDOW_OPTIONS.len() as i64 - 1) as usize;
        Self {
            minutes: WINDOW_OPTIONS[next],
            ..self
        }
    }
}
