pub mod configuration;
mod http;
pub mod keywords;
pub mod modules;
pub mod pusher;
pub mod target;

pub use configuration::{ConfigurationProvider, HttpConfigurationSource};
pub use http::DEFAULT_HTTP_TIMEOUT;
pub use keywords::RandomKeywordSelector;
pub use modules::{JsonFeedModule, builtin_registry};
pub use pusher::HttpPusher;
pub use target::{DiscoveryTargetResolver, EnvTargetResolver, TargetProvider};
