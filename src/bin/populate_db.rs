//! Seed a running patients server with randomized demo patients.
//!
//! Posts through the public HTTP API so the same validation and merge
//! paths are exercised as for real clients.

use clap::Parser;
use hospital_api::logging;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde_json::json;

const FAMILY_NAMES: &[&str] = &[
    "Smith", "Jones", "Taylor", "Brown", "Williams", "Wilson", "Johnson", "Davies", "Robinson",
    "Wright", "Thompson", "Evans", "Walker", "White", "Roberts", "Green", "Hall", "Wood", "Clarke",
    "Harris",
];

const GIVEN_NAMES: &[&str] = &[
    "Ann", "Ivan", "Maria", "John", "Elena", "Peter", "Olga", "James", "Nina", "Paul",
];

const GENDERS: &[&str] = &["male", "female", "other", "unknown"];

const NAME_USES: &[&str] = &["usual", "official", "nickname", "maiden"];

#[derive(Parser, Debug)]
#[command(name = "populate-db", about = "Seed the patients API with demo data")]
struct Args {
    /// Base URL of a running patients server
    #[arg(long, default_value = "http://localhost:8000")]
    url: String,

    /// Number of patients to create
    #[arg(long, default_value_t = 100)]
    count: usize,

    /// RNG seed, fixed for reproducible data sets
    #[arg(long, default_value_t = 13131313)]
    seed: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_simple_logging();

    let args = Args::parse();
    let client = reqwest::Client::new();
    let mut rng = StdRng::seed_from_u64(args.seed);

    let endpoint = format!("{}/api/v1/patients", args.url.trim_end_matches('/'));
    let mut created = 0usize;

    for _ in 0..args.count {
        let body = random_patient(&mut rng);
        let response = client.post(&endpoint).json(&body).send().await?;
        let status = response.status();
        if status.is_success() {
            created += 1;
        } else {
            tracing::warn!(status = %status, "Create request rejected");
        }
    }

    tracing::info!(created, requested = args.count, "Seeding finished");
    Ok(())
}

fn random_patient(rng: &mut StdRng) -> serde_json::Value {
    let year = rng.gen_range(1900..2000);
    let month = rng.gen_range(1..=12);
    let day = rng.gen_range(1..=28);
    let hour = rng.gen_range(0..24);
    let minute = rng.gen_range(0..60);
    let second = rng.gen_range(0..60);

    let given: Vec<&str> = (0..rng.gen_range(1..=2))
        .map(|_| GIVEN_NAMES[rng.gen_range(0..GIVEN_NAMES.len())])
        .collect();

    json!({
        "name": {
            "use": NAME_USES[rng.gen_range(0..NAME_USES.len())],
            "family": FAMILY_NAMES[rng.gen_range(0..FAMILY_NAMES.len())],
            "given": given,
        },
        "gender": GENDERS[rng.gen_range(0..GENDERS.len())],
        "birthDate": format!("{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02}"),
        "active": true,
    })
}
