//! Connector test modules

pub mod funding_test;
pub mod manager_test;
pub mod network_test;

/// Initialize logger for tests and load environment configuration
///
/// Sets up env_logger at DEBUG so funding attempts and ledger writes show
/// up with `--nocapture`. Also loads `.env` from the crate root so
/// `RUST_LOG` and friends can be set there.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init_test_logger() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();

    let mut path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push(".env");
    dotenv::from_path(&path).ok();
}
