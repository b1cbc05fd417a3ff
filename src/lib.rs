// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Acceptance checks for storage appliances leaving the factory floor.
//!
//! [`suite`] gathers a snapshot of the unit through its administrative tools
//! and evaluates every check in [`checks`] against it.

pub mod checks;
pub mod schema;
pub mod suite;
