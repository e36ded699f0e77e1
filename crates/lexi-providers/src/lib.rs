//! Concrete adapters for the domain's external-collaborator ports
//! (spec.md §1 Non-goals: "deliberately out of scope" — these are the
//! boundary implementations the core treats as black boxes).

pub mod auth;
pub mod export;
pub mod llm;
pub mod pdf;
