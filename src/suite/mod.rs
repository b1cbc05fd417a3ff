// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

pub mod chassis;
mod check;
mod command;
mod config;
pub mod context;
mod emitter;
mod error;
pub mod inventory;
pub mod probe;
pub mod reference;
pub mod render;
mod run;
mod snapshot;
pub mod writer;

pub use check::*;
pub use command::*;
pub use config::*;
pub use context::Context;
pub use emitter::*;
pub use error::*;
pub use probe::Probe;
pub use run::*;
pub use snapshot::*;
