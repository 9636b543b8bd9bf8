//! Relay configuration: BaseConfig (session, bridge, logging) + EndpointConfig (downstream HTTP).

mod base;
mod endpoints;
mod relay_config;


pub use base::BaseConfig;
pub use endpoints::EndpointConfig;
pub use relay_config::RelayConfig;
