pub mod aggregator;
pub mod calculations;
pub mod clock;
pub mod context;
pub mod enrichment;
pub mod manifest;
pub mod report;
pub mod rules;

pub use aggregator::Aggregator;
pub use clock::{Clock, FixedClock, SystemClock};
pub use context::{PlotResolver, ProfileTable};
pub use manifest::ManifestAssembler;
pub use report::{InsightEngine, ReportRequest};
pub use rules::RulesEngine;
