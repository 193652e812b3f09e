//! # Galvana Model
//!
//! Compartmental cable geometry for the simulator side of the coupling
//! bridge. The crate provides the [`section::CableModel`] stand-in used by
//! the CLI and by tests, the [`transform::Frame`] affine map that moves it
//! into the field frame, and a [`builder`] for the straight benchmark
//! fibre. A live simulator binding would implement the same
//! `GeometryProvider` and `ResistanceSink` seams from `galvana-core`
//! instead.
//!
//! ## Modules
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`section`] | `Section`, `CableModel` and the provider/sink impls |
//! | [`builder`] | Straight-fibre construction |
//! | [`transform`] | Affine frame changes (`Frame`) |

pub mod builder;
pub mod section;
pub mod transform;
