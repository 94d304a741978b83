use super::catalog::{pick, Catalog, CatalogError};
use super::model::{ServiceHistory, User};
use super::risk::{calculate_risk, classify_risk, RiskSignals};
use crate::core::config::{ConfigError, DatasetConfig};
use crate::core::event::{Event, IpRisk, KnownDevice, LOGIN_SERVICE};
use crate::core::traits::EventSource;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use tracing::debug;

#[derive(Debug)]
pub enum GeneratorError {
    Config(ConfigError),
    Catalog(CatalogError),
}

impl std::fmt::Display for GeneratorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeneratorError::Config(err) => write!(f, "generator config error: {err}"),
            GeneratorError::Catalog(err) => write!(f, "generator catalog error: {err}"),
        }
    }
}

impl std::error::Error for GeneratorError {}

impl From<ConfigError> for GeneratorError {
    fn from(err: ConfigError) -> Self {
        GeneratorError::Config(err)
    }
}

impl From<CatalogError> for GeneratorError {
    fn from(err: CatalogError) -> Self {
        GeneratorError::Catalog(err)
    }
}

/// Portal activity source: one login plus several service events per user.
///
/// Users are produced in ascending id order and each user's block is emitted
/// in full before the next user is sampled.
pub struct AbsherGenerator {
    rng: StdRng,
    catalog: Catalog,
    dataset: DatasetConfig,
    next_user_id: u32,
    end_user_id: u32,
    pending: VecDeque<Event>,
}

impl AbsherGenerator {
    pub fn from_config(
        dataset: &DatasetConfig,
        catalog: Catalog,
        seed: Option<u64>,
    ) -> Result<Self, GeneratorError> {
        dataset.validate()?;
        if catalog.cities.is_empty() {
            return Err(CatalogError::EmptyCatalog("cities").into());
        }
        if catalog.services.is_empty() {
            return Err(CatalogError::EmptyCatalog("services").into());
        }
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let end_user_id = dataset.first_user_id.saturating_add(dataset.users);
        debug!(
            first_user_id = dataset.first_user_id,
            end_user_id,
            seeded = seed.is_some(),
            "absher generator ready"
        );
        Ok(Self {
            rng,
            catalog,
            dataset: dataset.clone(),
            next_user_id: dataset.first_user_id,
            end_user_id,
            pending: VecDeque::new(),
        })
    }

    /// Users not yet sampled.
    pub fn remaining_users(&self) -> u32 {
        self.end_user_id - self.next_user_id
    }

    fn fill_next_user(&mut self) -> bool {
        if self.next_user_id >= self.end_user_id {
            return false;
        }
        let user = User::sample(
            &mut self.rng,
            self.next_user_id,
            &self.catalog,
            &self.dataset,
        );
        self.next_user_id += 1;
        let block = user_block(&mut self.rng, &user, &self.catalog, &self.dataset);
        self.pending.extend(block);
        true
    }
}

impl EventSource for AbsherGenerator {
    fn next_event(&mut self) -> Option<Event> {
        while self.pending.is_empty() {
            if !self.fill_next_user() {
                return None;
            }
        }
        self.pending.pop_front()
    }
}

/// Generates the login event followed by the user's service events.
pub fn user_block<R: Rng + ?Sized>(
    rng: &mut R,
    user: &User,
    catalog: &Catalog,
    dataset: &DatasetConfig,
) -> Vec<Event> {
    let service_events = rng.gen_range(dataset.min_logs..=dataset.max_logs);
    let mut events = Vec::with_capacity(service_events as usize + 1);

    let device = user.pick_device(rng, catalog, dataset.login_known_device_probability);
    let time = random_time(rng);
    let ip_risk = catalog.ip_risk.choose(rng);
    let location = catalog.pick_location(rng, &user.city, dataset.home_location_probability);
    events.push(build_event(
        user,
        device,
        LOGIN_SERVICE.to_string(),
        time,
        ip_risk,
        location,
        false,
    ));

    let mut history = ServiceHistory::default();
    for _ in 0..service_events {
        let service = pick(rng, &catalog.services).to_string();
        let first_time = history.record(&service);
        let device = user.pick_device(rng, catalog, dataset.service_known_device_probability);
        let time = random_time(rng);
        let location = catalog.pick_location(rng, &user.city, dataset.home_location_probability);
        let ip_risk = catalog.ip_risk.choose(rng);
        events.push(build_event(user, device, service, time, ip_risk, location, first_time));
    }

    events
}

fn build_event(
    user: &User,
    device_id: String,
    service: String,
    time: String,
    ip_risk: IpRisk,
    location: String,
    first_time_service: bool,
) -> Event {
    let is_known_device = KnownDevice::from(user.is_known(&device_id));
    let risk_score = calculate_risk(&RiskSignals {
        is_known: is_known_device,
        time: &time,
        home_city: &user.city,
        location: &location,
        ip_risk,
        first_time_service,
    });
    let (risk_level, action) = classify_risk(risk_score);
    Event {
        user_id: user.id,
        city: user.city.clone(),
        age: user.age,
        device_id,
        service,
        time,
        ip_risk,
        location,
        is_known_device,
        risk_score,
        risk_level,
        action,
    }
}

/// Uniform time of day as `HH:MM`.
fn random_time<R: Rng + ?Sized>(rng: &mut R) -> String {
    let hour: u32 = rng.gen_range(0..24);
    let minute: u32 = rng.gen_range(0..60);
    format!("{hour:02}:{minute:02}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::CatalogConfig;
    use crate::core::event::RiskLevel;
    use crate::sources::absher::fingerprint::is_fingerprint;
    use std::collections::HashSet;

    fn assert_share(name: &str, hits: usize, total: usize, expected: f64) {
        let share = hits as f64 / total as f64;
        assert!(
            (share - expected).abs() < 0.01,
            "{name} share {share} too far from {expected}"
        );
    }

    fn generator(users: u32, seed: u64) -> AbsherGenerator {
        let dataset = DatasetConfig {
            users,
            ..DatasetConfig::default()
        };
        let catalog = Catalog::from_config(&CatalogConfig::default()).expect("catalog");
        AbsherGenerator::from_config(&dataset, catalog, Some(seed)).expect("generator")
    }

    fn drain(mut source: impl EventSource) -> Vec<Event> {
        std::iter::from_fn(|| source.next_event()).collect()
    }

    fn blocks(events: &[Event]) -> Vec<&[Event]> {
        let mut blocks = Vec::new();
        let mut start = 0;
        for idx in 1..=events.len() {
            if idx == events.len() || events[idx].user_id != events[start].user_id {
                blocks.push(&events[start..idx]);
                start = idx;
            }
        }
        blocks
    }

    #[test]
    fn every_block_starts_with_login() {
        let events = drain(generator(300, 1));
        let blocks = blocks(&events);
        assert_eq!(blocks.len(), 300);
        for block in blocks {
            assert!(block[0].is_login());
            assert!(block[1..].iter().all(|event| !event.is_login()));
            assert!((4..=9).contains(&block.len()), "block size {}", block.len());
        }
    }

    #[test]
    fn users_are_sequential_from_first_id() {
        let events = drain(generator(50, 2));
        let ids: Vec<u32> = blocks(&events).iter().map(|block| block[0].user_id).collect();
        let expected: Vec<u32> = (1001..1051).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn user_attributes_are_constant_within_block() {
        let events = drain(generator(100, 3));
        for block in blocks(&events) {
            assert!(block.iter().all(|event| event.city == block[0].city));
            assert!(block.iter().all(|event| event.age == block[0].age));
        }
    }

    #[test]
    fn scores_match_row_fields() {
        let events = drain(generator(200, 4));
        for block in blocks(&events) {
            let mut seen = HashSet::new();
            for event in block {
                let first_time = !event.is_login() && seen.insert(event.service.clone());
                let score = calculate_risk(&RiskSignals {
                    is_known: event.is_known_device,
                    time: &event.time,
                    home_city: &event.city,
                    location: &event.location,
                    ip_risk: event.ip_risk,
                    first_time_service: first_time,
                });
                assert_eq!(event.risk_score, score);
                assert_eq!((event.risk_level, event.action), classify_risk(score));
            }
        }
    }

    #[test]
    fn rows_are_well_formed() {
        let catalog = Catalog::from_config(&CatalogConfig::default()).expect("catalog");
        for event in drain(generator(100, 5)) {
            assert!(is_fingerprint(&event.device_id));
            assert!(catalog.cities.contains(&event.location));
            assert!(event.is_login() || catalog.services.contains(&event.service));
            let (hour, minute) = event.time.split_once(':').expect("time");
            assert_eq!(hour.len(), 2);
            assert!(hour.parse::<u32>().expect("hour") < 24);
            assert!(minute.parse::<u32>().expect("minute") < 60);
        }
    }

    #[test]
    fn same_seed_same_dataset() {
        assert_eq!(drain(generator(40, 6)), drain(generator(40, 6)));
    }

    #[test]
    fn zero_users_yields_nothing() {
        let mut source = generator(0, 7);
        assert_eq!(source.remaining_users(), 0);
        assert!(source.next_event().is_none());
    }

    #[test]
    fn always_unknown_devices_are_flagged() {
        let dataset = DatasetConfig {
            users: 20,
            login_known_device_probability: 0.0,
            service_known_device_probability: 0.0,
            ..DatasetConfig::default()
        };
        let catalog = Catalog::from_config(&CatalogConfig::default()).expect("catalog");
        let source = AbsherGenerator::from_config(&dataset, catalog, Some(8)).expect("generator");
        for event in drain(source) {
            assert_eq!(event.is_known_device, KnownDevice::No);
            assert!(event.risk_score >= 40);
            assert_ne!(event.risk_level, RiskLevel::Low);
        }
    }

    #[test]
    fn fixed_log_count() {
        let dataset = DatasetConfig {
            users: 10,
            min_logs: 5,
            max_logs: 5,
            ..DatasetConfig::default()
        };
        let catalog = Catalog::from_config(&CatalogConfig::default()).expect("catalog");
        let source = AbsherGenerator::from_config(&dataset, catalog, Some(9)).expect("generator");
        assert_eq!(drain(source).len(), 60);
    }

    #[test]
    fn rejects_inverted_log_range() {
        let dataset = DatasetConfig {
            min_logs: 9,
            max_logs: 2,
            ..DatasetConfig::default()
        };
        let catalog = Catalog::from_config(&CatalogConfig::default()).expect("catalog");
        let err = AbsherGenerator::from_config(&dataset, catalog, Some(1))
            .err()
            .expect("inverted range rejected");
        assert!(matches!(err, GeneratorError::Config(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_out_of_range_probability() {
        let dataset = DatasetConfig {
            login_known_device_probability: 1.2,
            ..DatasetConfig::default()
        };
        let catalog = Catalog::from_config(&CatalogConfig::default()).expect("catalog");
        assert!(AbsherGenerator::from_config(&dataset, catalog, Some(1)).is_err());
    }

    #[test]
    fn rejects_empty_service_list() {
        let mut catalog = Catalog::from_config(&CatalogConfig::default()).expect("catalog");
        catalog.services.clear();
        let err = AbsherGenerator::from_config(&DatasetConfig::default(), catalog, Some(1))
            .err()
            .expect("empty services rejected");
        assert!(matches!(
            err,
            GeneratorError::Catalog(CatalogError::EmptyCatalog("services"))
        ));
    }

    #[test]
    fn device_and_location_shares_follow_probabilities() {
        let events = drain(generator(20_000, 12));
        let logins: Vec<&Event> = events.iter().filter(|event| event.is_login()).collect();
        let services: Vec<&Event> = events.iter().filter(|event| !event.is_login()).collect();
        let known = |rows: &[&Event]| {
            rows.iter()
                .filter(|event| event.is_known_device == KnownDevice::Yes)
                .count()
        };
        let home = events
            .iter()
            .filter(|event| event.location == event.city)
            .count();

        assert_eq!(logins.len(), 20_000);
        assert_share("login known device", known(&logins[..]), logins.len(), 0.8);
        assert_share("service known device", known(&services[..]), services.len(), 0.75);
        assert_share("home location", home, events.len(), 0.8);
    }
}
