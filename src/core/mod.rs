//! Application-facing service layer over the store, the evaluator, and the
//! notification seam.

pub mod services;
