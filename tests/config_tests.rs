// tests/config_tests.rs

use ros_diff::cli::{self, DiffOptions};
use ros_diff::{Config, DiffError, Policy, Section};

fn diff(new: &str, old: &str) -> String {
    Config::parse(new)
        .unwrap()
        .diff(&Config::parse(old).unwrap(), None, &Policy::default())
        .unwrap()
        .to_string()
}

#[test]
fn test_full_migration() {
    let old = "\
# jun/25/2021 01:07:55 by RouterOS 6.47.9
/system identity
set name=old-router
/routing ospf instance
set [ find default=yes ] router-id=10.127.0.1
/ip address
add address=10.0.0.1/24 interface=ether1 network=10.0.0.0
add address=10.9.9.9/32 interface=loop0
/ip firewall nat
add chain=a comment=\"[ ID:1 ]\"
add chain=b comment=\"[ ID:2 ]\"
/ip service
set telnet disabled=yes
";
    let new = "\
/system identity
set name=new-router
/routing ospf instance
set [ find default=yes ] router-id=10.127.0.99
/ip address
add address=10.0.0.1/24 interface=ether1 network=10.0.0.0
/ip firewall nat
add chain=c comment=\"[ ID:3 ]\"
/ip service
set telnet disabled=no
";

    assert_eq!(
        diff(new, old),
        "\
/system identity
set name=new-router

/routing ospf instance
set [ find default=yes ] router-id=10.127.0.99

/ip address
remove [ find address=\"10.9.9.9/32\" ]

/ip firewall nat
remove [ find where comment~\"ID:1\" ]
remove [ find where comment~\"ID:2\" ]
add chain=c comment=\"[ ID:3 ]\"

/ip service
set telnet disabled=no
"
    );
}

#[test]
fn test_identical_configs_render_empty() {
    let source = "\
/system identity
set name=core
/routing ospf instance
add name=core router-id=10.127.0.1
";
    assert_eq!(diff(source, source), "");
}

#[test]
fn test_new_sections_first_then_old_only() {
    let old = "/ip pool\nadd name=dhcp ranges=10.0.0.10-10.0.0.99\n";
    let new = "/ppp secret\nadd name=alice service=pppoe\n";
    assert_eq!(
        diff(new, old),
        "/ppp secret\nadd name=alice service=pppoe\n\n/ip pool\nremove [ find name=dhcp ]\n"
    );
}

#[test]
fn test_duplicate_sections_rejected() {
    let duplicated = Config {
        timestamp: None,
        version: None,
        sections: vec![
            Section::parse("/ip address\nadd address=10.0.0.1/24\n").unwrap(),
            Section::parse("/ip address\nadd address=10.0.1.1/24\n").unwrap(),
        ],
    };
    let target = Config::parse("/ip address\nadd address=10.0.0.1/24\n").unwrap();
    let err = target
        .diff(&duplicated, None, &Policy::default())
        .unwrap_err();
    assert!(matches!(err, DiffError::DuplicateSections(_)));
}

#[test]
fn test_verbose_export_suppresses_known_values() {
    let old = "/snmp\nset enabled=yes\n";
    let verbose = "/snmp\nset enabled=yes trap-version=1\n";
    let new = "/snmp\nset enabled=yes trap-version=1\n";

    let diffed = Config::parse(new)
        .unwrap()
        .diff(
            &Config::parse(old).unwrap(),
            Some(&Config::parse(verbose).unwrap()),
            &Policy::default(),
        )
        .unwrap();
    assert_eq!(diffed.to_string(), "");
}

#[test]
fn test_render_skips_empty_sections() {
    let config = Config::parse("/ip address\n").unwrap();
    assert_eq!(config.to_string(), "");
}

#[test]
fn test_diff_output_carries_no_header() {
    let old = "# jun/25/2021 01:07:55 by RouterOS 6.47.9\n/system identity\nset name=a\n";
    let new = "# jul/01/2021 09:00:00 by RouterOS 6.48.1\n/system identity\nset name=b\n";
    let diffed = Config::parse(new)
        .unwrap()
        .diff(&Config::parse(old).unwrap(), None, &Policy::default())
        .unwrap();
    assert_eq!(diffed.timestamp, None);
    assert_eq!(diffed.version, None);
}

// ============================================================================
// CLI entry points
// ============================================================================

#[test]
fn test_execute_diff() {
    let options = DiffOptions {
        old: "/system identity\nset name=old-router\n".to_string(),
        new: "/system identity\nset name=new-router\n".to_string(),
        verbose: None,
    };
    let patch = cli::execute_diff(&options, &Policy::default()).unwrap();
    assert_eq!(patch, "/system identity\nset name=new-router\n");
}

#[test]
fn test_execute_prettify() {
    let rendered = cli::execute_prettify(
        "# jun/25/2021 01:07:55 by RouterOS 6.47.9\n\
         /ip firewall nat\n\
         add action=masquerade chain=srcnat \\\n    out-interface=edge\n",
    )
    .unwrap();
    assert_eq!(
        rendered,
        "/ip firewall nat\nadd action=masquerade chain=srcnat out-interface=edge\n"
    );
}
