//! Connectivity management: nearest-station assignment and SNR pruning.
//!
//! Connections are relation tables keyed by stable ids. Each step, every
//! active device is attached to its nearest station first; afterwards every
//! existing link whose SNR is at or below the device's threshold is removed.
//! The order matters: a device that drifted out of its old station's coverage
//! but into a new station's coverage is migrated within a single update.

use std::collections::{BTreeMap, BTreeSet};

use tracing::trace;

use mecsim_common::BsId;

use crate::channel::ChannelModel;
use crate::entities::{BaseStation, RadioDevice};

/// Connection table for one device pool (UE or sensor).
///
/// The engine rewrites membership once per step through [`update_pool`];
/// iteration order is ascending by station id, then device id.
#[derive(Debug, Clone, Default)]
pub struct PoolConnections<I: Copy + Ord> {
    links: BTreeMap<BsId, BTreeSet<I>>,
}

impl<I: Copy + Ord> PoolConnections<I> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            links: BTreeMap::new(),
        }
    }

    /// Removes all links.
    pub fn clear(&mut self) {
        self.links.clear();
    }

    /// Adds a link; idempotent.
    pub fn attach(&mut self, bs: BsId, device: I) {
        self.links.entry(bs).or_default().insert(device);
    }

    /// Removes a single device from every station.
    pub fn detach_device(&mut self, device: I) {
        for devices in self.links.values_mut() {
            devices.remove(&device);
        }
    }

    /// Returns true if the link exists.
    pub fn contains(&self, bs: BsId, device: I) -> bool {
        self.links.get(&bs).is_some_and(|set| set.contains(&device))
    }

    /// Connected devices of a station in ascending id order.
    pub fn devices_of(&self, bs: BsId) -> Vec<I> {
        self.links
            .get(&bs)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Total number of links in the table.
    pub fn link_count(&self) -> usize {
        self.links.values().map(|set| set.len()).sum()
    }

    /// Iterates `(station, devices)` pairs in ascending station order.
    pub fn iter(&self) -> impl Iterator<Item = (BsId, &BTreeSet<I>)> {
        self.links.iter().map(|(bs, set)| (*bs, set))
    }

    /// Keeps only links for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(BsId, I) -> bool) {
        for (bs, devices) in self.links.iter_mut() {
            devices.retain(|device| keep(*bs, *device));
        }
        self.links.retain(|_, devices| !devices.is_empty());
    }
}

/// Per-connection instantaneous data rates, recomputed every step.
///
/// Values are invalid before scheduling has run for the current step; the
/// simulation clears the table at the start of the scheduling stage.
#[derive(Debug, Clone, Default)]
pub struct RateTable<I: Copy + Ord> {
    rates: BTreeMap<(BsId, I), f64>,
}

impl<I: Copy + Ord> RateTable<I> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            rates: BTreeMap::new(),
        }
    }

    /// Drops all rates; called before each scheduling stage.
    pub fn clear(&mut self) {
        self.rates.clear();
    }

    /// Records the rate of a connection.
    pub fn set(&mut self, bs: BsId, device: I, rate: f64) {
        self.rates.insert((bs, device), rate);
    }

    /// Rate of a connection; zero when the link does not exist.
    pub fn get(&self, bs: BsId, device: I) -> f64 {
        self.rates.get(&(bs, device)).copied().unwrap_or(0.0)
    }

    /// Iterates `((station, device), rate)` entries.
    pub fn iter(&self) -> impl Iterator<Item = (&(BsId, I), &f64)> {
        self.rates.iter()
    }

    /// Aggregated per-device data rate over all of its connections.
    ///
    /// A small positive epsilon is added per connection so a device with an
    /// existing but numerically zero-rate link still appears in the result.
    pub fn macro_rates(&self) -> BTreeMap<I, f64> {
        const EPSILON: f64 = 1e-10;
        let mut macro_rates: BTreeMap<I, f64> = BTreeMap::new();
        for ((_, device), rate) in self.rates.iter() {
            *macro_rates.entry(*device).or_insert(0.0) += rate + EPSILON;
        }
        macro_rates
    }
}

/// Finds the station closest to a position; lowest id wins ties.
pub fn nearest_station(
    stations: &BTreeMap<BsId, BaseStation>,
    device: &dyn RadioDevice,
) -> Option<BsId> {
    let mut closest: Option<(BsId, f64)> = None;
    for (id, bs) in stations.iter() {
        let distance = bs.position.distance_to(&device.position());
        if closest.map_or(true, |(_, best)| distance < best) {
            closest = Some((*id, distance));
        }
    }
    closest.map(|(id, _)| id)
}

/// Applies one connectivity update to a pool's connection table.
///
/// Attaches every given device to its nearest station, then removes every
/// link whose SNR does not exceed the device's threshold. A device with no
/// station above threshold ends up with no connection and receives zero data
/// rate for the step.
pub fn update_pool<I, D>(
    connections: &mut PoolConnections<I>,
    channel: &ChannelModel,
    stations: &BTreeMap<BsId, BaseStation>,
    devices: &BTreeMap<I, D>,
    active: impl Iterator<Item = I>,
) where
    I: Copy + Ord + std::fmt::Debug,
    D: RadioDevice,
{
    for id in active {
        if let Some(device) = devices.get(&id) {
            if let Some(bs) = nearest_station(stations, device) {
                connections.attach(bs, id);
            }
        }
    }

    connections.retain(|bs_id, device_id| {
        let (Some(bs), Some(device)) = (stations.get(&bs_id), devices.get(&device_id)) else {
            return false;
        };
        let snr = channel.snr(bs, device);
        let keep = snr > device.snr_threshold();
        if !keep {
            trace!(?device_id, %bs_id, snr, "link dropped below SNR threshold");
        }
        keep
    });
}
