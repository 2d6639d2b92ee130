// Bus domain model
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of buses wired into the LabREI schematic
pub const BUS_COUNT: u32 = 13;

/// Identifier of one monitored bus (1..=13)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct BusId(u32);

impl BusId {
    pub fn new(id: u32) -> Option<Self> {
        (1..=BUS_COUNT).contains(&id).then_some(Self(id))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// All buses in canonical (ascending) order
    pub fn all() -> Vec<BusId> {
        (1..=BUS_COUNT).map(Self).collect()
    }
}

impl fmt::Display for BusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "B{}", self.0)
    }
}

/// Every measurement field reported by the collector, in wire naming
pub const MEASUREMENT_FIELDS: [&str; 33] = [
    "freq_a", "freq_b", "freq_c",
    "va_rms", "vb_rms", "vc_rms",
    "ia_rms", "ib_rms", "ic_rms",
    "pa", "pb", "pc",
    "sa", "sb", "sc",
    "qa", "qb", "qc",
    "pfa", "pfb", "pfc",
    "va_p", "vb_p", "vc_p",
    "va_th", "vb_th", "vc_th",
    "ia_p", "ib_p", "ic_p",
    "ia_th", "ib_th", "ic_th",
];

/// One reading of all measurement fields. `None` means the value is unknown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Measurements {
    pub freq_a: Option<f64>,
    pub freq_b: Option<f64>,
    pub freq_c: Option<f64>,
    pub va_rms: Option<f64>,
    pub vb_rms: Option<f64>,
    pub vc_rms: Option<f64>,
    pub ia_rms: Option<f64>,
    pub ib_rms: Option<f64>,
    pub ic_rms: Option<f64>,
    pub pa: Option<f64>,
    pub pb: Option<f64>,
    pub pc: Option<f64>,
    pub sa: Option<f64>,
    pub sb: Option<f64>,
    pub sc: Option<f64>,
    pub qa: Option<f64>,
    pub qb: Option<f64>,
    pub qc: Option<f64>,
    pub pfa: Option<f64>,
    pub pfb: Option<f64>,
    pub pfc: Option<f64>,
    pub va_p: Option<f64>,
    pub vb_p: Option<f64>,
    pub vc_p: Option<f64>,
    pub va_th: Option<f64>,
    pub vb_th: Option<f64>,
    pub vc_th: Option<f64>,
    pub ia_p: Option<f64>,
    pub ib_p: Option<f64>,
    pub ic_p: Option<f64>,
    pub ia_th: Option<f64>,
    pub ib_th: Option<f64>,
    pub ic_th: Option<f64>,
}

impl Measurements {
    /// Look up a field by its wire name. Unknown names yield `None`.
    pub fn field(&self, name: &str) -> Option<f64> {
        match name {
            "freq_a" => self.freq_a,
            "freq_b" => self.freq_b,
            "freq_c" => self.freq_c,
            "va_rms" => self.va_rms,
            "vb_rms" => self.vb_rms,
            "vc_rms" => self.vc_rms,
            "ia_rms" => self.ia_rms,
            "ib_rms" => self.ib_rms,
            "ic_rms" => self.ic_rms,
            "pa" => self.pa,
            "pb" => self.pb,
            "pc" => self.pc,
            "sa" => self.sa,
            "sb" => self.sb,
            "sc" => self.sc,
            "qa" => self.qa,
            "qb" => self.qb,
            "qc" => self.qc,
            "pfa" => self.pfa,
            "pfb" => self.pfb,
            "pfc" => self.pfc,
            "va_p" => self.va_p,
            "vb_p" => self.vb_p,
            "vc_p" => self.vc_p,
            "va_th" => self.va_th,
            "vb_th" => self.vb_th,
            "vc_th" => self.vc_th,
            "ia_p" => self.ia_p,
            "ib_p" => self.ib_p,
            "ic_p" => self.ic_p,
            "ia_th" => self.ia_th,
            "ib_th" => self.ib_th,
            "ic_th" => self.ic_th,
            _ => None,
        }
    }

    pub fn is_all_unknown(&self) -> bool {
        MEASUREMENT_FIELDS.iter().all(|name| self.field(name).is_none())
    }
}

/// Latest reading of one bus
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusSnapshot {
    pub bus_id: BusId,
    #[serde(flatten)]
    pub measurements: Measurements,
}

impl BusSnapshot {
    pub fn new(bus_id: BusId, measurements: Measurements) -> Self {
        Self {
            bus_id,
            measurements,
        }
    }

    /// Snapshot shown when a bus could not be read
    pub fn placeholder(bus_id: BusId) -> Self {
        Self::new(bus_id, Measurements::default())
    }
}

/// Render a measurement for display, `-` when unknown
pub fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "-".to_string(),
    }
}
