//! Core identifier and geometry types shared across the simulator.
//!
//! Entities are referenced through stable integer identities everywhere:
//! relation tables (connections, data rates, scheduler state) are keyed by
//! these ids, never by entity references.

use serde::{Deserialize, Serialize};

/// Base station identifier. Unique and immutable for a simulation's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BsId(pub u32);

/// User equipment identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UeId(pub u32);

/// Sensor identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SensorId(pub u32);

/// Job identifier, unique within an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JobId(pub u64);

impl std::fmt::Display for BsId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BS#{}", self.0)
    }
}

impl std::fmt::Display for UeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UE#{}", self.0)
    }
}

impl std::fmt::Display for SensorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sensor#{}", self.0)
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Job#{}", self.0)
    }
}

/// The kind of device that owns a job or a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DeviceKind {
    /// Mobile user equipment.
    Ue,
    /// Fixed sensor.
    Sensor,
}

/// A device identity tagged by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DeviceId {
    /// A user equipment.
    Ue(UeId),
    /// A sensor.
    Sensor(SensorId),
}

impl DeviceId {
    /// Returns the kind of the referenced device.
    pub fn kind(&self) -> DeviceKind {
        match self {
            DeviceId::Ue(_) => DeviceKind::Ue,
            DeviceId::Sensor(_) => DeviceKind::Sensor,
        }
    }

    /// Returns the raw integer identity.
    pub fn raw(&self) -> u32 {
        match self {
            DeviceId::Ue(id) => id.0,
            DeviceId::Sensor(id) => id.0,
        }
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceId::Ue(id) => write!(f, "{id}"),
            DeviceId::Sensor(id) => write!(f, "{id}"),
        }
    }
}

/// Resource pool at a base station: either the UE group or the sensor group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Pool {
    /// User-equipment pool.
    Ue,
    /// Sensor pool.
    Sensor,
}

impl std::fmt::Display for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Pool::Ue => write!(f, "ue"),
            Pool::Sensor => write!(f, "sensor"),
        }
    }
}

/// Planar position in meters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// X coordinate (meters)
    pub x: f64,
    /// Y coordinate (meters)
    pub y: f64,
}

impl Position {
    /// Creates a new position.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}
