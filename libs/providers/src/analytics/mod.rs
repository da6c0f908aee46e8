mod sink;
mod tinybird;

pub use sink::{AnalyticsEvent, AnalyticsInteraction, AnalyticsSink};
pub use tinybird::{EVENTS_DATASOURCE, INTERACTIONS_DATASOURCE, TinybirdConfig, TinybirdSink};

#[cfg(any(test, feature = "mock"))]
pub use sink::MockAnalyticsSink;
