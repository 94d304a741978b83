use super::catalog::{pick, Catalog};
use super::fingerprint::generate_fingerprint;
use crate::core::config::DatasetConfig;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

/// Device numbers for unregistered devices are drawn from this range, which
/// never overlaps the registered devices' numbers.
const UNKNOWN_DEVICE_NUMBERS: std::ops::RangeInclusive<u32> = 100..=9999;

/// A simulated portal user.
#[derive(Debug, Clone)]
pub struct User {
    pub id: u32,
    pub city: String,
    pub age: u8,
    /// Registered device fingerprints (1 to 3).
    pub known_devices: Vec<String>,
}

impl User {
    /// Samples home city, age, and the registered device set.
    pub fn sample<R: Rng + ?Sized>(
        rng: &mut R,
        id: u32,
        catalog: &Catalog,
        dataset: &DatasetConfig,
    ) -> Self {
        let city = pick(rng, &catalog.cities).to_string();
        let age = rng.gen_range(dataset.min_age..=dataset.max_age);
        let upper = rng.gen_range(2..=4);
        let known_devices = (1..upper)
            .map(|device_number| generate_fingerprint(rng, &catalog.devices, id, device_number))
            .collect();
        Self {
            id,
            city,
            age,
            known_devices,
        }
    }

    /// Picks a registered device with probability `known_probability`,
    /// otherwise derives a fresh unregistered one.
    pub fn pick_device<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        catalog: &Catalog,
        known_probability: f64,
    ) -> String {
        if rng.gen_bool(known_probability) {
            if let Some(device) = self.known_devices.choose(rng) {
                return device.clone();
            }
        }
        let device_number = rng.gen_range(UNKNOWN_DEVICE_NUMBERS);
        generate_fingerprint(rng, &catalog.devices, self.id, device_number)
    }

    /// Membership is checked on the fingerprint itself, so a truncated-hash
    /// collision can flip either branch of `pick_device`.
    pub fn is_known(&self, device: &str) -> bool {
        self.known_devices.iter().any(|known| known == device)
    }
}

/// Tracks which services a user has already used in this run.
#[derive(Debug, Default)]
pub struct ServiceHistory {
    used: HashSet<String>,
}

impl ServiceHistory {
    /// Records `service` and returns whether this was its first use.
    pub fn record(&mut self, service: &str) -> bool {
        if self.used.contains(service) {
            return false;
        }
        self.used.insert(service.to_string());
        true
    }
}
