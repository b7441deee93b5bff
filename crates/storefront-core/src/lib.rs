pub mod app_config;
pub mod cart;
pub mod config;
pub mod order;

pub use app_config::{AppConfig, Environment};
pub use cart::{CartData, WishlistData};
pub use config::{load_app_config, load_app_config_from_env, ConfigError};
pub use order::{
    transition, OrderAddress, OrderItem, OrderStatus, PaymentMethod, Role, TransitionError,
};
