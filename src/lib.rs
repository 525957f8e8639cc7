pub mod config;
pub mod domain;
pub mod intake;
pub mod routes;
pub mod self_test_client;
pub mod startup;
pub mod storage;
pub mod store;
pub mod telemetry;
