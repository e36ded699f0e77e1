//! Use cases: the operations named by each core component (spec.md §4).

pub mod coverage_engine;
pub mod coverage_service;
pub mod job_orchestrator;
pub mod pdf_chunker;
pub mod retry_engine;
pub mod word_list_ingestion;
