pub use gateway_config::{
    AuthConfig,
    CorsConfig,
    GatewayConfig,
    ServerConfig,
    UpstreamConfig,
};

mod gateway_config;
