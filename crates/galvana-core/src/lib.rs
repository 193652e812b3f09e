//! # Galvana Core
//!
//! The numerical backbone of the Galvana field-transfer pipeline. This crate
//! couples a finite-element electromagnetic solve to a compartmental neuron
//! model: it interpolates the solver's scattered potential export at the
//! model's compartment anchors and converts the potentials to per-compartment
//! transfer resistances.
//!
//! ## Architecture
//!
//! The neuron-model side is abstracted behind [`snapshot::GeometryProvider`]
//! (ordered compartment extraction) and [`snapshot::ResistanceSink`] (value
//! write-back); everything in between is pure: build a
//! [`interp::FieldInterpolant`] from a [`types::FieldSampleSet`], then
//! produce a [`transfer::TransferMap`] with
//! [`transfer::map_transfer_resistances`].
//!
//! ## Modules
//!
//! - [`types`] — Field samples and bounding volumes.
//! - [`snapshot`] — Ordered compartment snapshots and the model seams.
//! - [`interp`] — Piecewise-linear interpolation over the sample hull.
//! - [`transfer`] — Potential-to-resistance mapping with domain policies.
//! - [`slice`] — Planar field sampling for inspection exports.
//! - [`pointsource`] — Analytic monopole reference for validation.

pub mod interp;
pub mod pointsource;
pub mod slice;
pub mod snapshot;
pub mod transfer;
pub mod types;
