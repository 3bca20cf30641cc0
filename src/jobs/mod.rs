//! Batch jobs
//!
//! Each job performs one complete unit of work against the store and its
//! external collaborators and then returns. Triggering (cron, CI schedule,
//! systemd timer) lives outside this binary.
//!
//! # Available Jobs
//!
//! - `daily_flow_job` - Ingests today's institutional flows, ranks the
//!   trailing absorption ratio and posts the result

pub mod daily_flow_job;
