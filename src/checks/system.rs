// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Operating system, licensing and boot pool checks.

use serde::Deserialize;
use serde_json::Value;

use crate::suite::reference::UNLICENSED_HOST;
use crate::suite::{Check, CheckInput, Findings, Probe, Registry, Verdict};

pub(super) fn register(registry: &mut Registry) {
    registry
        .add(Check::new(
            "boot_pool_mirrored",
            "Boot pool is a two-way mirror",
            boot_pool_mirrored,
        ))
        .add(Check::new(
            "storage_profiles",
            "Core OS filesystems have the correct profiles",
            storage_profiles,
        ))
        .add(Check::new(
            "license_installed",
            "Host license is present",
            license_installed,
        ))
        .add(Check::new(
            "domain_name_present",
            "Domain name is set",
            domain_name_present,
        ))
        .add(Check::new(
            "single_os_image",
            "Only a single OS image is installed",
            single_os_image,
        ))
        .add(Check::new(
            "os_version",
            "Expected OS version is booted",
            os_version,
        ));
}

fn boot_pool_mirrored(input: &CheckInput<'_>) -> Verdict {
    // zpool exits non-zero on a degraded pool but still prints its layout
    let output = input.probe(&Probe::BootPoolStatus)?;
    let mirrors = output
        .text()
        .lines()
        .filter(|line| line.find("mirror").is_some_and(|pos| pos > 0))
        .count();

    if mirrors != 1 {
        return Err(format!(
            "expected {} to be mirrored, found {} mirror vdevs",
            input.expectations.boot_pool, mirrors
        )
        .into());
    }
    Ok(())
}

fn storage_profiles(input: &CheckInput<'_>) -> Verdict {
    let mut findings = Findings::new();
    for expected in &input.expectations.storage_profiles {
        match input.probe_ok(&Probe::StorageProfile(expected.dataset.clone())) {
            Ok(output) => findings.ensure_eq(
                format!("profile of {}", expected.dataset),
                expected.profile.as_str(),
                output.trimmed().as_str(),
            ),
            Err(failure) => findings.push(failure.0),
        }
    }
    findings.finish()
}

#[derive(Deserialize)]
struct License {
    #[serde(rename = "Host")]
    host: String,
}

fn license_installed(input: &CheckInput<'_>) -> Verdict {
    let license: License = input.probe_json(&Probe::LicenseHost)?;
    if license.host == UNLICENSED_HOST {
        return Err(format!("expected a host license, got '{}'", license.host).into());
    }
    Ok(())
}

#[derive(Deserialize)]
struct Domain {
    result: String,
}

fn domain_name_present(input: &CheckInput<'_>) -> Verdict {
    let domain: Domain = input.probe_json(&Probe::DomainName)?;
    if domain.result.is_empty() {
        return Err("expected a domain name, got ''".into());
    }
    Ok(())
}

fn single_os_image(input: &CheckInput<'_>) -> Verdict {
    let images: Vec<Value> = input.probe_json(&Probe::OsImages)?;
    if images.len() != 1 {
        return Err(format!(
            "expected to find only a single OS image, instead found {} images",
            images.len()
        )
        .into());
    }
    Ok(())
}

#[derive(Deserialize)]
struct OsInfo {
    #[serde(rename = "BootGuid")]
    boot_guid: String,
}

fn os_version(input: &CheckInput<'_>) -> Verdict {
    let os: OsInfo = input.probe_json(&Probe::OsVersion)?;
    let mut findings = Findings::new();
    findings.ensure_eq(
        "BootGuid",
        input.expectations.os_boot_guid.as_str(),
        os.boot_guid.as_str(),
    );
    findings.finish()
}
