//! Integration test modules.

mod achievement_claim_test;
mod completion_flow_test;
mod concurrency_test;
mod friends_leaderboard_test;
