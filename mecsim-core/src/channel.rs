//! Wireless channel model.
//!
//! Computes a signal-to-noise ratio from an Okumura-Hata path-loss model and
//! maps allocated bandwidth to an achievable Shannon-style data rate. The
//! model is deterministic given positions: no fading, interference or MIMO.

use mecsim_common::{Error, Result};

use crate::entities::{BaseStation, RadioDevice};

/// Closed set of channel models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelModel {
    /// Okumura-Hata urban propagation model.
    #[default]
    OkumuraHata,
}

impl ChannelModel {
    /// Path loss in dB between a station and a device position.
    ///
    /// Log-distance model parameterized by carrier frequency (MHz), station
    /// antenna height and device height; distance is planar.
    pub fn path_loss_db(&self, bs: &BaseStation, device: &dyn RadioDevice) -> f64 {
        match self {
            ChannelModel::OkumuraHata => {
                let distance = bs.position.distance_to(&device.position());
                let freq = bs.frequency;

                let ch = 0.8 + (1.1 * freq.log10() - 0.7) * device.height()
                    - 1.56 * freq.log10();
                let fixed = 69.55 - ch + 26.16 * freq.log10() - 13.82 * bs.height.log10();
                let slope = 44.9 - 6.55 * bs.height.log10();

                // epsilon keeps log10 finite at zero distance
                fixed + slope * (distance / 1000.0 + 1e-9).log10()
            }
        }
    }

    /// Signal-to-noise ratio (linear) between a station and a device.
    ///
    /// Deterministic given positions; no side effects.
    pub fn snr(&self, bs: &BaseStation, device: &dyn RadioDevice) -> f64 {
        let loss_db = self.path_loss_db(bs, device);
        let rx_power = 10f64.powf((bs.tx_power - loss_db) / 10.0);
        rx_power / device.noise()
    }

    /// Achievable data rate for an allocated bandwidth share at a given SNR.
    ///
    /// Shannon-capacity mapping `bw * log2(1 + snr)`, clamped to zero for a
    /// zero bandwidth share. Negative bandwidth is an invalid parameter.
    pub fn data_rate(&self, allocated_bandwidth: f64, snr: f64) -> Result<f64> {
        if allocated_bandwidth < 0.0 {
            return Err(Error::InvalidParameter(format!(
                "allocated bandwidth must be non-negative, got {allocated_bandwidth}"
            )));
        }
        if allocated_bandwidth == 0.0 {
            return Ok(0.0);
        }
        Ok(allocated_bandwidth * (1.0 + snr).log2())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mecsim_common::{BsId, Position, SensorId, SensorParams, StationParams, UeId, UeParams};

    use crate::entities::{Sensor, UserEquipment};

    fn station(x: f64, y: f64) -> BaseStation {
        BaseStation::new(BsId(0), Position::new(x, y), &StationParams::default())
    }

    fn ue_at(x: f64, y: f64) -> UserEquipment {
        let mut ue = UserEquipment::new(UeId(0), &UeParams::default());
        ue.position = Position::new(x, y);
        ue
    }

    #[test]
    fn test_snr_decreases_with_distance() {
        let channel = ChannelModel::OkumuraHata;
        let bs = station(0.0, 0.0);

        let near = channel.snr(&bs, &ue_at(10.0, 0.0));
        let far = channel.snr(&bs, &ue_at(500.0, 0.0));

        assert!(near > far);
        assert!(far > 0.0);
    }

    #[test]
    fn test_snr_deterministic() {
        let channel = ChannelModel::OkumuraHata;
        let bs = station(50.0, 50.0);
        let ue = ue_at(80.0, 90.0);

        assert_eq!(channel.snr(&bs, &ue), channel.snr(&bs, &ue));
    }

    #[test]
    fn test_snr_same_for_equal_device_geometry() {
        // a sensor with the same position, height and noise sees the same SNR
        let channel = ChannelModel::OkumuraHata;
        let bs = station(0.0, 0.0);
        let ue = ue_at(100.0, 0.0);
        let sensor = Sensor::new(
            SensorId(0),
            Position::new(100.0, 0.0),
            &SensorParams::default(),
        );

        let snr_ue = channel.snr(&bs, &ue);
        let snr_sensor = channel.snr(&bs, &sensor);
        assert!((snr_ue - snr_sensor).abs() < 1e-12);
    }

    #[test]
    fn test_data_rate_shannon() {
        let channel = ChannelModel::OkumuraHata;
        // log2(1 + 3) = 2
        assert_eq!(channel.data_rate(10.0, 3.0).unwrap(), 20.0);
    }

    #[test]
    fn test_data_rate_zero_bandwidth() {
        let channel = ChannelModel::OkumuraHata;
        assert_eq!(channel.data_rate(0.0, 100.0).unwrap(), 0.0);
    }

    #[test]
    fn test_data_rate_negative_bandwidth_rejected() {
        let channel = ChannelModel::OkumuraHata;
        assert!(matches!(
            channel.data_rate(-1.0, 1.0),
            Err(Error::InvalidParameter(_))
        ));
    }
}
