//! Reconciles Parcoursup program labels with panier (CPGE type) labels and
//! scores a student's admission likelihood per program.

pub mod audit;
pub mod catalog;
pub mod config;
pub mod output;
pub mod reconcile;
pub mod scoring;
pub mod watch;
