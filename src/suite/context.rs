// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::collections::BTreeSet;

use crate::suite::reference;
use crate::suite::snapshot::Snapshot;

/// Physical drive technology as reported by the inventory service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveKind {
    SolidState,
    Mechanical,
}

impl DriveKind {
    pub fn classify(drive_type: &str) -> Option<DriveKind> {
        match drive_type.to_lowercase().as_str() {
            "ssd" => Some(DriveKind::SolidState),
            "hdd" => Some(DriveKind::Mechanical),
            _ => None,
        }
    }

    pub fn expected_rpm(&self) -> i64 {
        match self {
            DriveKind::SolidState => reference::SSD_RPM,
            DriveKind::Mechanical => reference::HDD_NOMINAL_RPM,
        }
    }
}

/// Run-time facts derived once from the snapshot.
///
/// All predicates are pure; nothing here talks to the system again.
#[derive(Debug, Clone)]
pub struct Context {
    virtual_machine: bool,
    boot_pool_serials: BTreeSet<String>,
}

impl Context {
    pub fn new(snapshot: &Snapshot) -> Self {
        let boot_pool_serials = snapshot
            .security
            .pools
            .iter()
            .flat_map(|pool| pool.drive_serials.iter().cloned())
            .collect();

        Context {
            virtual_machine: snapshot.platform.is_vm,
            boot_pool_serials,
        }
    }

    pub fn is_virtual_machine(&self) -> bool {
        self.virtual_machine
    }

    pub fn is_known_vendor(&self, make: &str) -> bool {
        let make = make.to_lowercase();
        reference::KNOWN_VENDORS.contains(&make.as_str())
    }

    pub fn should_skip_vendor(&self, make: &str) -> bool {
        let make = make.to_lowercase();
        reference::SKIP_VENDORS.iter().any(|s| make.contains(s))
    }

    /// Unknown models are never ok, whatever the count.
    pub fn enclosure_bay_count_ok(&self, model: &str, observed: usize) -> bool {
        reference::expected_bay_count(model) == Some(observed)
    }

    pub fn drive_belongs_to_boot_pool(&self, serial: &str) -> bool {
        self.boot_pool_serials.contains(serial)
    }
}
