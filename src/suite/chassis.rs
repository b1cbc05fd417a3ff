// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Parser for the `key : value` listing printed by `ipmitool chassis status`.

use std::collections::BTreeMap;

/// Parses one `key : value` pair per line.
///
/// All whitespace is removed from both sides, so `Front-Panel Lockout` becomes
/// `Front-PanelLockout`. Lines without a colon are ignored; a repeated key
/// keeps its last value.
pub fn parse(output: &str) -> BTreeMap<String, String> {
    output
        .lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (squash(key), squash(value)))
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

fn squash(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}
