//! # Galvana IO
//!
//! File formats at the bridge boundary: the exported field profiles the
//! EM side produces, the transfer-resistance stores the simulator side
//! consumes, and section-list files describing rig geometry. All three
//! are line-oriented plain text with 1-based line numbers in every
//! parse error.
//!
//! ## Modules
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`profile`] | `x y z V` field-profile parsing |
//! | [`store`] | Positional and keyed resistance stores |
//! | [`sections`] | Section-list files for rig geometry |

pub mod profile;
pub mod sections;
pub mod store;
