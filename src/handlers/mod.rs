mod actuators;
mod health;
mod proxy;
mod sensors;
mod token;

pub use actuators::{get_actuator, list_actuators, set_actuator};
pub use health::{health_check, home, readiness_check};
pub use sensors::{list_sensors, query_sensor_samples};
pub use token::fetch_token;
