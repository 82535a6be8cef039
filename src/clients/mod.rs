pub mod sac_client;

pub use sac_client::SacClient;
