pub mod json_input;

pub use json_input::{
    load_activities, load_forecasts, load_overrides, parse_activities, parse_forecasts,
    parse_overrides,
};
