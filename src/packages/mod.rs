// src/packages/mod.rs

//! Package list reconciliation
//!
//! Package lists are plain ordered name sequences. A name carrying the `-`
//! prefix means "remove this package" instead of "install it". Layers
//! (image defaults, a flavor overlay) are concatenated and reconciled into
//! the net install list sent with a build request.
//!
//! # Algorithm
//!
//! Reconciliation is two-pass, not a linear scan:
//!
//! 1. Partition the input into `removals` (prefix stripped) and `installs`,
//!    each preserving relative order.
//! 2. For every removal, drop the *first* matching entry from `installs`.
//!    Removals matching nothing are ignored.
//!
//! Because removals are applied against the whole partition, `["-x", "x"]`
//! reconciles to `[]` as well as `["x", "-x"]`. Duplicate installs are not
//! collapsed: `["x", "x", "-x"]` keeps one `x`.

use tracing::debug;

/// Prefix marking a removal entry
pub const REMOVAL_PREFIX: char = '-';

/// Name of an installable unit, or a `-`-prefixed removal
pub type PackageName = String;

/// Ordered list of package names
pub type PackageList = Vec<PackageName>;

/// Returns the package a removal entry targets, or `None` for a plain install
pub fn removal_target(name: &str) -> Option<&str> {
    name.strip_prefix(REMOVAL_PREFIX)
}

/// Returns true if the entry is a removal
pub fn is_removal(name: &str) -> bool {
    removal_target(name).is_some()
}

/// Reconcile a flattened layer list into the net install list
///
/// The output never contains removal entries.
pub fn reconcile<S: AsRef<str>>(layers: &[S]) -> PackageList {
    let mut removals: Vec<&str> = Vec::new();
    let mut installs: PackageList = Vec::with_capacity(layers.len());

    for entry in layers {
        let entry = entry.as_ref();
        match removal_target(entry) {
            Some(target) => removals.push(target),
            None => installs.push(entry.to_string()),
        }
    }

    for target in removals {
        match installs.iter().position(|name| name == target) {
            Some(index) => {
                installs.remove(index);
            }
            None => debug!("Removal of '{}' matched no package, ignoring", target),
        }
    }

    installs
}

/// Compute the effective package list for a build request
///
/// `user_edits` is `None` until the user starts editing the list by hand.
/// Once present it is authoritative and used as-is, bypassing the flavor
/// merge entirely.
pub fn apply_flavor_and_edits(
    base: &[PackageName],
    flavor: &[PackageName],
    user_edits: Option<&[PackageName]>,
) -> PackageList {
    if let Some(edits) = user_edits {
        debug!("Using {} manually edited packages", edits.len());
        return parse_package_lines(edits);
    }

    let base = reconcile(base);
    if flavor.is_empty() {
        return base;
    }

    let layered: Vec<&str> = base
        .iter()
        .chain(flavor.iter())
        .map(String::as_str)
        .collect();
    reconcile(&layered)
}

/// Parse the edit-box text form: one name per line, trimmed, blanks dropped
pub fn parse_package_text(text: &str) -> PackageList {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Render a package list in the edit-box text form
pub fn format_package_text(packages: &[PackageName]) -> String {
    packages.join("\n")
}

fn parse_package_lines(lines: &[PackageName]) -> PackageList {
    lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn list(items: &[&str]) -> PackageList {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_reconcile_empty() {
        let empty: [&str; 0] = [];
        assert!(reconcile(&empty).is_empty());
    }

    #[test]
    fn test_reconcile_install_then_remove() {
        assert!(reconcile(&["x", "-x"]).is_empty());
    }

    #[test]
    fn test_reconcile_remove_before_install() {
        // Removals apply to the whole install partition, not only earlier entries
        assert!(reconcile(&["-x", "x"]).is_empty());
    }

    #[test]
    fn test_reconcile_removes_first_match_only() {
        assert_eq!(reconcile(&["x", "x", "-x"]), list(&["x"]));
    }

    #[test]
    fn test_reconcile_unmatched_removals_dropped() {
        assert!(reconcile(&["-a", "-b"]).is_empty());
        assert_eq!(reconcile(&["a", "-b"]), list(&["a"]));
    }

    #[test]
    fn test_reconcile_preserves_order() {
        assert_eq!(
            reconcile(&["base-files", "uhttpd", "dnsmasq", "-uhttpd", "luci"]),
            list(&["base-files", "dnsmasq", "luci"])
        );
    }

    #[test]
    fn test_reconcile_bare_prefix() {
        assert_eq!(reconcile(&["a", "-"]), list(&["a"]));
    }

    #[test]
    fn test_flavor_scenario() {
        let base = list(&["a", "b"]);
        let flavor = list(&["-b", "c"]);
        assert_eq!(apply_flavor_and_edits(&base, &flavor, None), list(&["a", "c"]));
    }

    #[test]
    fn test_no_flavor_reconciles_base() {
        let base = list(&["a", "-ppp", "ppp", "b"]);
        assert_eq!(apply_flavor_and_edits(&base, &[], None), list(&["a", "b"]));
    }

    #[test]
    fn test_flavor_applies_to_reconciled_base() {
        // base removals settle before the flavor layer is added
        let base = list(&["-x", "a"]);
        let flavor = list(&["x"]);
        assert_eq!(apply_flavor_and_edits(&base, &flavor, None), list(&["a", "x"]));
    }

    #[test]
    fn test_user_edits_are_authoritative() {
        let base = list(&["a", "b"]);
        let flavor = list(&["-b", "c"]);
        let edits = list(&["  b ", "", "-z", "d"]);
        assert_eq!(
            apply_flavor_and_edits(&base, &flavor, Some(&edits)),
            list(&["b", "-z", "d"])
        );
    }

    #[test]
    fn test_parse_package_text() {
        let text = "luci\n  vim \n\n\t\nhtop\n";
        assert_eq!(parse_package_text(text), list(&["luci", "vim", "htop"]));
        assert!(parse_package_text("").is_empty());
    }

    #[test]
    fn test_format_package_text() {
        let packages = list(&["a", "b"]);
        assert_eq!(format_package_text(&packages), "a\nb");
        assert_eq!(parse_package_text(&format_package_text(&packages)), packages);
    }

    #[test]
    fn test_removal_target() {
        assert_eq!(removal_target("-ppp"), Some("ppp"));
        assert_eq!(removal_target("ppp"), None);
        assert!(is_removal("-x"));
        assert!(!is_removal("x-y"));
    }

    fn name_strategy() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{0,7}"
    }

    fn entry_strategy() -> impl Strategy<Value = String> {
        (any::<bool>(), name_strategy())
            .prop_map(|(remove, name)| if remove { format!("-{name}") } else { name })
    }

    proptest! {
        #[test]
        fn prop_identity_without_removals(names in prop::collection::vec(name_strategy(), 0..20)) {
            prop_assert_eq!(reconcile(&names), names);
        }

        #[test]
        fn prop_output_has_no_removals(entries in prop::collection::vec(entry_strategy(), 0..30)) {
            let out = reconcile(&entries);
            prop_assert!(out.iter().all(|name| !is_removal(name)));
        }

        #[test]
        fn prop_install_remove_pair_cancels(name in name_strategy()) {
            let removal = format!("-{name}");
            prop_assert!(reconcile(&[name.clone(), removal.clone()]).is_empty());
            prop_assert!(reconcile(&[removal, name]).is_empty());
        }

        #[test]
        fn prop_output_never_longer_than_installs(entries in prop::collection::vec(entry_strategy(), 0..30)) {
            let installs = entries.iter().filter(|e| !is_removal(e)).count();
            prop_assert!(reconcile(&entries).len() <= installs);
        }
    }
}
