pub mod news;

pub use news::{load_config_default, load_config_from, NewsConfig, ProviderEndpoints, ProviderKeys};
