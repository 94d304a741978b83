use crate::core::config::CatalogConfig;
use crate::core::event::IpRisk;
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;

const CITIES: [&str; 8] = [
    "Riyadh", "Jeddah", "Dammam", "Medina", "Taif", "Khobar", "Jizan", "Tabuk",
];

const SERVICES: [&str; 7] = [
    "Renew_ID",
    "Car_Sale",
    "Transfer_Owner",
    "Passport_Renew",
    "Absher_Activation",
    "License_Renew",
    "Cancel_Report",
];

const BROWSERS: [&str; 4] = ["Chrome", "Safari", "Firefox", "Edge"];
const OSES: [&str; 4] = ["Windows", "iOS", "Android", "MacOS"];
const LOCALES: [&str; 2] = ["ar-SA", "en-US"];
const SCREEN_RESOLUTIONS: [&str; 3] = ["1920x1080", "1366x768", "1280x720"];

const IP_RISK_WEIGHTS: [f64; 3] = [0.65, 0.25, 0.10];

#[derive(Debug)]
pub enum CatalogError {
    EmptyCatalog(&'static str),
    InvalidWeight { tier: IpRisk, weight: f64 },
    WeightedIndex(rand::distributions::WeightedError),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::EmptyCatalog(name) => write!(f, "catalog list {name} is empty"),
            CatalogError::InvalidWeight { tier, weight } => {
                write!(f, "invalid weight for {tier:?}: {weight}")
            }
            CatalogError::WeightedIndex(err) => write!(f, "invalid ip risk weights: {err}"),
        }
    }
}

impl std::error::Error for CatalogError {}

/// Weighted table over the IP risk tiers.
#[derive(Debug, Clone)]
pub struct IpRiskSelector {
    index: WeightedIndex<f64>,
}

impl IpRiskSelector {
    pub fn new(weights: [f64; 3]) -> Result<Self, CatalogError> {
        for (tier, weight) in IpRisk::ALL.iter().zip(weights) {
            if !weight.is_finite() || weight < 0.0 {
                return Err(CatalogError::InvalidWeight {
                    tier: *tier,
                    weight,
                });
            }
        }
        let index = WeightedIndex::new(weights).map_err(CatalogError::WeightedIndex)?;
        Ok(Self { index })
    }

    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> IpRisk {
        IpRisk::ALL[self.index.sample(rng)]
    }
}

/// Browser/OS/locale/screen pools used to derive device fingerprints.
#[derive(Debug, Clone)]
pub struct DeviceTraits {
    pub browsers: Vec<String>,
    pub oses: Vec<String>,
    pub locales: Vec<String>,
    pub screen_resolutions: Vec<String>,
}

/// Resolved categorical tables for the sampler.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub cities: Vec<String>,
    pub services: Vec<String>,
    pub devices: DeviceTraits,
    pub ip_risk: IpRiskSelector,
}

impl Catalog {
    /// Builds the catalog from config overrides, falling back to the built-in tables.
    pub fn from_config(config: &CatalogConfig) -> Result<Self, CatalogError> {
        Ok(Self {
            cities: resolve_list("cities", config.cities.as_ref(), &CITIES)?,
            services: resolve_list("services", config.services.as_ref(), &SERVICES)?,
            devices: DeviceTraits {
                browsers: resolve_list("browsers", config.browsers.as_ref(), &BROWSERS)?,
                oses: resolve_list("oses", config.oses.as_ref(), &OSES)?,
                locales: resolve_list("locales", config.locales.as_ref(), &LOCALES)?,
                screen_resolutions: resolve_list(
                    "screen_resolutions",
                    config.screen_resolutions.as_ref(),
                    &SCREEN_RESOLUTIONS,
                )?,
            },
            ip_risk: IpRiskSelector::new(config.ip_risk_weights.unwrap_or(IP_RISK_WEIGHTS))?,
        })
    }

    /// Picks the event location: home with probability `home_probability`,
    /// otherwise one of the other cities.
    pub fn pick_location<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        home: &str,
        home_probability: f64,
    ) -> String {
        if rng.gen_bool(home_probability) {
            return home.to_string();
        }
        let others: Vec<&String> = self.cities.iter().filter(|city| *city != home).collect();
        others
            .choose(rng)
            .map(|city| city.to_string())
            .unwrap_or_else(|| home.to_string())
    }
}

/// Picks one entry uniformly; lists are checked non-empty when the catalog is built.
pub fn pick<'a, R: Rng + ?Sized>(rng: &mut R, values: &'a [String]) -> &'a str {
    values.choose(rng).map(String::as_str).unwrap_or_default()
}

fn resolve_list(
    name: &'static str,
    configured: Option<&Vec<String>>,
    builtin: &[&str],
) -> Result<Vec<String>, CatalogError> {
    let values = match configured {
        Some(values) => values.clone(),
        None => to_owned(builtin),
    };
    if values.is_empty() {
        return Err(CatalogError::EmptyCatalog(name));
    }
    Ok(values)
}

fn to_owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn builtin() -> Catalog {
        Catalog::from_config(&CatalogConfig::default()).expect("catalog")
    }

    #[test]
    fn builtin_tables() {
        let catalog = builtin();
        assert_eq!(catalog.cities.len(), 8);
        assert_eq!(catalog.services.len(), 7);
        assert_eq!(catalog.devices.browsers.len(), 4);
        assert_eq!(catalog.devices.oses.len(), 4);
        assert_eq!(catalog.devices.locales.len(), 2);
        assert_eq!(catalog.devices.screen_resolutions.len(), 3);
        assert!(!catalog.services.iter().any(|service| service == "Login"));
    }

    #[test]
    fn rejects_empty_override() {
        let config = CatalogConfig {
            cities: Some(Vec::new()),
            ..CatalogConfig::default()
        };
        let err = Catalog::from_config(&config).expect_err("empty cities");
        assert!(matches!(err, CatalogError::EmptyCatalog("cities")));
    }

    #[test]
    fn rejects_negative_weight() {
        let err = IpRiskSelector::new([0.5, -0.1, 0.2]).expect_err("negative weight");
        assert!(matches!(
            err,
            CatalogError::InvalidWeight {
                tier: IpRisk::Medium,
                ..
            }
        ));
    }

    #[test]
    fn ip_risk_follows_weights() {
        let selector = IpRiskSelector::new(IP_RISK_WEIGHTS).expect("selector");
        let mut rng = StdRng::seed_from_u64(42);
        let draws = 100_000;
        let mut counts = [0_u32; 3];
        for _ in 0..draws {
            let tier = selector.choose(&mut rng);
            let idx = IpRisk::ALL.iter().position(|t| *t == tier).expect("tier");
            counts[idx] += 1;
        }
        for (count, expected) in counts.iter().zip(IP_RISK_WEIGHTS) {
            let share = *count as f64 / draws as f64;
            assert!(
                (share - expected).abs() < 0.01,
                "share {share} too far from {expected}"
            );
        }
    }

    #[test]
    fn away_location_never_matches_home() {
        let catalog = builtin();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..500 {
            let location = catalog.pick_location(&mut rng, "Riyadh", 0.0);
            assert_ne!(location, "Riyadh");
            assert!(catalog.cities.contains(&location));
        }
    }

    #[test]
    fn single_city_falls_back_to_home() {
        let catalog = Catalog {
            cities: vec!["Taif".to_string()],
            ..builtin()
        };
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(catalog.pick_location(&mut rng, "Taif", 0.0), "Taif");
    }
}
