mod flow_record;
mod ranking;

pub use flow_record::{DailyRecord, RawFlowRecord};
pub use ranking::{AbsorptionEntry, RankingReport, WindowAggregate};
