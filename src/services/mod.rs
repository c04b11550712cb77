// Services module - cross-cutting services shared by the route modules

pub mod rate_limit;
pub mod settings;

pub use rate_limit::RateLimitService;
pub use settings::SettingsService;
