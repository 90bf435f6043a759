//! Synthetic customer datasets with a controlled share of duplicates
//!
//! Every generated CPF carries valid check digits and is rendered in the
//! formatted `XXX.XXX.XXX-XX` style, so the dedup path always exercises key
//! normalization. Duplicates reuse the CPF of an existing customer with a
//! `Duplicata_` name prefix.

use crate::key::check_digit;
use crate::record::Customer;
use crate::{Error, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::info;

/// Cities assigned to generated customers
pub const CITIES: [&str; 4] = ["São Paulo", "Rio de Janeiro", "Belo Horizonte", "Porto Alegre"];

/// Parameters for dataset synthesis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Total number of records, duplicates included
    pub records: usize,
    /// Share of records that repeat an earlier CPF, in `[0, 1)`
    pub duplicate_ratio: f64,
    /// Fixed seed for reproducible output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            records: 10_000,
            duplicate_ratio: 0.1,
            seed: None,
        }
    }
}

impl DatasetConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.duplicate_ratio) {
            return Err(Error::InvalidConfig(format!(
                "duplicate_ratio must be in [0, 1), got {}",
                self.duplicate_ratio
            )));
        }
        Ok(())
    }

    /// How many distinct customers the dataset holds
    pub fn unique_target(&self) -> usize {
        let unique = (self.records as f64 * (1.0 - self.duplicate_ratio)) as usize;
        // Duplicates need at least one customer to copy
        if self.records > 0 {
            unique.max(1)
        } else {
            0
        }
    }
}

/// Generate a random CPF with valid check digits, formatted `XXX.XXX.XXX-XX`
pub fn generate_cpf<G: Rng + ?Sized>(rng: &mut G) -> String {
    let mut digits: Vec<u8> = (0..9).map(|_| rng.gen_range(0..10)).collect();
    digits.push(check_digit(&digits));
    digits.push(check_digit(&digits));

    let d: String = digits.iter().map(|&d| char::from(b'0' + d)).collect();
    format!("{}.{}.{}-{}", &d[0..3], &d[3..6], &d[6..9], &d[9..11])
}

fn generate_customer<G: Rng + ?Sized>(rng: &mut G, cpf: String) -> Customer {
    let city = CITIES.choose(rng).copied().unwrap_or(CITIES[0]);
    Customer::new(
        cpf,
        format!("Cliente_{}", rng.gen_range(1..=100_000)),
        rng.gen_range(18..=90),
        city,
    )
}

/// Build a shuffled dataset according to `config`
pub fn create_dataset(config: &DatasetConfig) -> Result<Vec<Customer>> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    create_dataset_with_rng(config, &mut rng)
}

/// Build a shuffled dataset drawing randomness from `rng`
pub fn create_dataset_with_rng<G: Rng + ?Sized>(config: &DatasetConfig, rng: &mut G) -> Result<Vec<Customer>> {
    config.validate()?;

    let unique_target = config.unique_target();
    info!(
        "Generating {} records ({} unique, ratio {:.2})",
        config.records, unique_target, config.duplicate_ratio
    );

    let mut seen = HashSet::with_capacity(unique_target);
    let mut dataset = Vec::with_capacity(config.records);
    while dataset.len() < unique_target {
        let cpf = generate_cpf(rng);
        if seen.insert(cpf.clone()) {
            dataset.push(generate_customer(rng, cpf));
        }
    }

    for _ in unique_target..config.records {
        let original = &dataset[rng.gen_range(0..unique_target)];
        let mut copy = original.clone();
        copy.name = format!("Duplicata_{}", copy.name);
        dataset.push(copy);
    }

    dataset.shuffle(rng);
    Ok(dataset)
}
