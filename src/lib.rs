//! mirrorctl - mirror rebuild helpers for Greenplum segments
//!
//! - `slot`: replication slot existence checks, drops and creates on a primary
//! - `backup`: pg_basebackup command construction with slot recreation
//! - `walsender`: parallel termination of stale walsenders
//!
//! Supporting layers: `connector` (SQL sessions), `remote` (ssh),
//! `pool` (bounded worker threads), `observability` (structured logs),
//! `config` and `cli`.

pub mod backup;
pub mod cli;
pub mod config;
pub mod connector;
pub mod observability;
pub mod pool;
pub mod remote;
pub mod slot;
pub mod walsender;
