//! Job generation.
//!
//! UEs generate a job per step with a configured Bernoulli probability;
//! sensors generate one deterministically every step. Demand sizes are drawn
//! from exponential distributions with configured means.

use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Bernoulli, Distribution, Exp};
use tracing::trace;

use mecsim_common::{DeviceId, Error, JobId, Result, SensorJobParams, UeJobParams};

use crate::entities::{Sensor, UserEquipment};
use crate::job::Job;

/// Generates jobs and assigns episode-unique job ids.
#[derive(Debug)]
pub struct JobGenerator {
    counter: u64,
    ue_gate: Bernoulli,
    ue_comm: Exp<f64>,
    ue_comp: Exp<f64>,
    sensor_comm: Exp<f64>,
    sensor_comp: Exp<f64>,
    e2e_delay_threshold: f64,
}

impl JobGenerator {
    /// Creates a generator from the configured job profiles.
    pub fn new(
        ue_job: &UeJobParams,
        sensor_job: &SensorJobParams,
        e2e_delay_threshold: f64,
    ) -> Result<Self> {
        let invalid = |what: &str| Error::InvalidParameter(format!("{what} must be positive"));

        Ok(Self {
            counter: 0,
            ue_gate: Bernoulli::new(ue_job.generation_probability).map_err(|_| {
                Error::InvalidParameter(format!(
                    "generation probability must lie in [0, 1], got {}",
                    ue_job.generation_probability
                ))
            })?,
            // Exp is parameterized by rate; the config gives the mean
            ue_comm: Exp::new(1.0 / ue_job.communication_demand_mean)
                .map_err(|_| invalid("ue communication demand mean"))?,
            ue_comp: Exp::new(1.0 / ue_job.computation_demand_mean)
                .map_err(|_| invalid("ue computation demand mean"))?,
            sensor_comm: Exp::new(1.0 / sensor_job.communication_demand_mean)
                .map_err(|_| invalid("sensor communication demand mean"))?,
            sensor_comp: Exp::new(1.0 / sensor_job.computation_demand_mean)
                .map_err(|_| invalid("sensor computation demand mean"))?,
            e2e_delay_threshold,
        })
    }

    /// Number of jobs generated so far this episode.
    pub fn generated(&self) -> u64 {
        self.counter
    }

    /// Resets the job counter at episode start.
    pub fn reset(&mut self) {
        self.counter = 0;
    }

    /// Runs the per-step Bernoulli trial for a UE and, on success, appends a
    /// new job to its uplink buffer.
    pub fn generate_ue_job(
        &mut self,
        rng: &mut StdRng,
        ue: &mut UserEquipment,
        now: u64,
    ) -> Result<Option<JobId>> {
        if !rng.sample(self.ue_gate) {
            return Ok(None);
        }
        let comm = self.ue_comm.sample(rng);
        let comp = self.ue_comp.sample(rng);
        let id = self.next_id();
        let job = Job::new(id, DeviceId::Ue(ue.id), now, comm, comp, self.e2e_delay_threshold)?;
        trace!(%id, owner = %ue.id, comm, comp, "generated UE job");
        ue.uplink_buffer.push(job);
        Ok(Some(id))
    }

    /// Appends this step's job to a sensor's uplink buffer. Sensors have no
    /// Bernoulli gate: one job every step.
    pub fn generate_sensor_job(
        &mut self,
        rng: &mut StdRng,
        sensor: &mut Sensor,
        now: u64,
    ) -> Result<JobId> {
        let comm = self.sensor_comm.sample(rng);
        let comp = self.sensor_comp.sample(rng);
        let id = self.next_id();
        let job = Job::new(
            id,
            DeviceId::Sensor(sensor.id),
            now,
            comm,
            comp,
            self.e2e_delay_threshold,
        )?;
        trace!(%id, owner = %sensor.id, comm, comp, "generated sensor job");
        sensor.uplink_buffer.push(job);
        Ok(id)
    }

    fn next_id(&mut self) -> JobId {
        let id = JobId(self.counter);
        self.counter += 1;
        id
    }
}
