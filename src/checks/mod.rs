// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The acceptance checks run against every unit.

mod counters;
mod drives;
mod enclosure;
mod logs;
mod platform;
mod sed;
mod services;
mod system;

use crate::suite::{Expectations, Registry};

/// Builds the full, ordered set of acceptance checks.
///
/// Per-service and per-counter checks are generated from `expectations`, so
/// the registry has to be rebuilt when they change.
pub fn standard(expectations: &Expectations) -> Registry {
    let mut registry = Registry::new();
    platform::register(&mut registry);
    enclosure::register(&mut registry);
    drives::register(&mut registry);
    counters::register(&mut registry);
    sed::register(&mut registry);
    services::register(&mut registry, expectations);
    system::register(&mut registry);
    logs::register(&mut registry);
    registry
}
