pub mod activity;
pub mod advisory;
pub mod forecast;
pub mod manifest;
pub mod plot_profile;
pub mod report;

pub use activity::*;
pub use advisory::*;
pub use forecast::*;
pub use manifest::*;
pub use plot_profile::*;
pub use report::*;
