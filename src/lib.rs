//! Roster - balanced course registration with GitHub team provisioning
//!
//! Students register for one of a fixed set of topics over HTTP. Enrollment
//! is balanced across topics, every three students in a topic form a numbered
//! team, and each position in a team maps to a fixed sub-project. A sync job
//! provisions matching GitHub org teams, memberships, and repository access.

pub mod engine;
