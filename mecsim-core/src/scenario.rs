//! Named scenario presets.
//!
//! A scenario fixes the playground size and the station, UE and sensor
//! populations; device parameters still come from the configuration. Station
//! and sensor placements are deterministic, UE placement is left to the
//! movement model at reset.

use std::str::FromStr;

use mecsim_common::{BsId, Error, Position, Result, SensorId, SimConfig, UeId};

use crate::entities::{BaseStation, Sensor, UserEquipment};

/// Bundled scenario presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// Single station, a handful of UEs and sensors
    Small,
    /// Three stations on a 300 m square
    Medium,
    /// Seven stations on a 400 m square
    Large,
    /// Dense sensor grid with four stations
    SmartCity,
}

/// Deterministic placement produced by a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioLayout {
    /// Playground width in meters
    pub width: f64,
    /// Playground height in meters
    pub height: f64,
    /// Station positions, in id order
    pub stations: Vec<Position>,
    /// Number of UEs; initial positions come from the movement model
    pub num_ues: u32,
    /// Sensor positions, in id order
    pub sensors: Vec<Position>,
}

impl Scenario {
    /// All bundled presets.
    pub const ALL: [Scenario; 4] = [
        Scenario::Small,
        Scenario::Medium,
        Scenario::Large,
        Scenario::SmartCity,
    ];

    /// The preset's registry name.
    pub fn name(&self) -> &'static str {
        match self {
            Scenario::Small => "small",
            Scenario::Medium => "medium",
            Scenario::Large => "large",
            Scenario::SmartCity => "smart_city",
        }
    }

    /// The preset's placement.
    pub fn layout(&self) -> ScenarioLayout {
        match self {
            Scenario::Small => ScenarioLayout {
                width: 200.0,
                height: 200.0,
                stations: vec![Position::new(100.0, 100.0)],
                num_ues: 5,
                sensors: grid(2, 200.0, 200.0),
            },
            Scenario::Medium => ScenarioLayout {
                width: 300.0,
                height: 300.0,
                stations: vec![
                    Position::new(75.0, 75.0),
                    Position::new(150.0, 225.0),
                    Position::new(225.0, 75.0),
                ],
                num_ues: 12,
                sensors: grid(3, 300.0, 300.0),
            },
            Scenario::Large => ScenarioLayout {
                width: 400.0,
                height: 400.0,
                stations: vec![
                    Position::new(100.0, 100.0),
                    Position::new(100.0, 300.0),
                    Position::new(200.0, 200.0),
                    Position::new(300.0, 100.0),
                    Position::new(300.0, 300.0),
                    Position::new(50.0, 200.0),
                    Position::new(350.0, 200.0),
                ],
                num_ues: 30,
                sensors: grid(4, 400.0, 400.0),
            },
            Scenario::SmartCity => ScenarioLayout {
                width: 200.0,
                height: 200.0,
                stations: vec![
                    Position::new(50.0, 50.0),
                    Position::new(50.0, 150.0),
                    Position::new(150.0, 50.0),
                    Position::new(150.0, 150.0),
                ],
                num_ues: 20,
                sensors: grid(5, 200.0, 200.0),
            },
        }
    }

    /// Builds the scenario's entity populations from the configuration.
    pub fn populate(
        &self,
        config: &SimConfig,
    ) -> (Vec<BaseStation>, Vec<UserEquipment>, Vec<Sensor>) {
        let layout = self.layout();
        let stations = layout
            .stations
            .iter()
            .enumerate()
            .map(|(i, pos)| BaseStation::new(BsId(i as u32), *pos, &config.bs))
            .collect();
        let ues = (0..layout.num_ues)
            .map(|i| UserEquipment::new(UeId(i), &config.ue))
            .collect();
        let sensors = layout
            .sensors
            .iter()
            .enumerate()
            .map(|(i, pos)| Sensor::new(SensorId(i as u32), *pos, &config.sensor))
            .collect();
        (stations, ues, sensors)
    }
}

impl FromStr for Scenario {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "small" => Ok(Scenario::Small),
            "medium" => Ok(Scenario::Medium),
            "large" => Ok(Scenario::Large),
            "smart_city" | "smart-city" => Ok(Scenario::SmartCity),
            other => Err(Error::Config(format!("unknown scenario: {other}"))),
        }
    }
}

/// Cell-centered `n x n` grid of positions.
fn grid(n: u32, width: f64, height: f64) -> Vec<Position> {
    let mut positions = Vec::with_capacity((n * n) as usize);
    for row in 0..n {
        for col in 0..n {
            positions.push(Position::new(
                (col as f64 + 0.5) * width / n as f64,
                (row as f64 + 0.5) * height / n as f64,
            ));
        }
    }
    positions
}
