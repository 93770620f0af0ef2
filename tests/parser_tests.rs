// tests/parser_tests.rs

use ros_diff::{Config, Expression, ParseError, Policy, Section};

fn parse_section(source: &str) -> Section {
    Section::parse(source).unwrap()
}

// ============================================================================
// Config headers
// ============================================================================

#[test]
fn test_header_timestamp_and_version() {
    let config = Config::parse(
        "# jun/25/2021 01:07:55 by RouterOS 6.47.9\n\
         /ip address\n\
         add address=10.0.0.1/24 interface=ether1\n",
    )
    .unwrap();
    assert_eq!(config.version, Some((6, 47, 9)));
    let timestamp = config.timestamp.unwrap();
    assert_eq!(timestamp.format("%Y-%m-%d %H:%M:%S").to_string(), "2021-06-25 01:07:55");
}

#[test]
fn test_header_absent() {
    let config = Config::parse("/ip address\nadd address=10.0.0.1/24\n").unwrap();
    assert_eq!(config.timestamp, None);
    assert_eq!(config.version, None);
}

#[test]
fn test_header_invalid() {
    let err = Config::parse("# yesterday by RouterOS whatever\n/ip address\n").unwrap_err();
    assert!(matches!(err, ParseError::InvalidHeader(_)));
}

#[test]
fn test_leading_banner_comment_ignored() {
    let config = Config::parse("# exported by a human\n/ip address\nadd address=10.0.0.1/24\n")
        .unwrap();
    assert_eq!(config.timestamp, None);
    assert_eq!(config.sections.len(), 1);
}

// ============================================================================
// Sections and expressions
// ============================================================================

#[test]
fn test_duplicate_section_paths_merge() {
    let config = Config::parse(
        "/ip address\n\
         add address=10.0.0.1/24\n\
         /ip route\n\
         add gateway=10.0.0.254\n\
         /ip address\n\
         add address=10.0.1.1/24\n",
    )
    .unwrap();
    assert_eq!(config.sections.len(), 2);
    assert_eq!(config.section("/ip address").unwrap().expressions.len(), 2);
}

#[test]
fn test_crlf_input() {
    let config =
        Config::parse("/ip address\r\nadd address=10.0.0.1/24 interface=ether1\r\n").unwrap();
    assert_eq!(
        config.to_string(),
        "/ip address\nadd address=\"10.0.0.1/24\" interface=ether1\n"
    );
}

#[test]
fn test_find_clause() {
    let expression =
        Expression::parse("set [ find default-name=ether1 ] name=core", "/interface ethernet")
            .unwrap();
    let find = expression.find.unwrap();
    assert_eq!(find.command, "find");
    assert_eq!(
        find.args.value_of("default-name").unwrap().to_string(),
        "ether1"
    );
    assert_eq!(expression.args.to_string(), "name=core");
}

#[test]
fn test_bracket_group_must_be_find() {
    let err = Expression::parse("set [ default=yes ] x=1", "/routing ospf instance").unwrap_err();
    assert!(matches!(err, ParseError::NotAFindGroup(_)));
}

#[test]
fn test_quoted_value_keeps_spaces() {
    let section = parse_section("/ip firewall nat\nadd chain=a comment=\"to the core\"\n");
    assert_eq!(
        section.expressions[0]
            .args
            .value_of("comment")
            .unwrap()
            .to_string(),
        "to the core"
    );
}

#[test]
fn test_continuations_and_round_trip() {
    let section = parse_section(
        "/ip firewall nat\n\
         add action=masquerade chain=srcnat \\\n    out-interface=edge \\\n    to-addresses=100.64.0.1\n",
    );
    assert_eq!(
        section.to_string(),
        "/ip firewall nat\n\
         add action=masquerade chain=srcnat out-interface=edge to-addresses=100.64.0.1\n"
    );
}

#[test]
fn test_reparse_of_rendered_output_is_fixed_point() {
    let source = "\
# jun/25/2021 01:07:55 by RouterOS 6.47.9
/interface ethernet
set [ find default-name=ether1 ] name=core-uplink
/ip firewall nat
add action=masquerade chain=srcnat \\
    out-interface=edge comment=\"to the core [ ID:nat-1 ]\"
/ip service
set telnet disabled=yes
";
    let parsed = Config::parse(source).unwrap();
    let rendered = parsed.to_string();
    let reparsed = Config::parse(&rendered).unwrap();

    assert_eq!(parsed.sections, reparsed.sections);
    assert_eq!(reparsed.to_string(), rendered);
}

#[test]
fn test_render_quotes_specials() {
    let section = parse_section("/ip address\nadd address=10.0.0.1/24 interface=ether1\n");
    assert_eq!(
        section.expressions[0].to_string(),
        "add address=\"10.0.0.1/24\" interface=ether1"
    );
}

// ============================================================================
// Natural identities
// ============================================================================

#[test]
fn test_identity_from_comment_id() {
    let policy = Policy::default();
    let expression = Expression::parse(
        "add chain=a comment=\"Core rule [ ID:core-nat ]\"",
        "/ip firewall nat",
    )
    .unwrap();
    assert_eq!(
        expression.natural_key_and_id(&policy),
        (
            Some("comment-id".to_string()),
            Some("core-nat".to_string())
        )
    );
}

#[test]
fn test_identity_from_natural_key() {
    let policy = Policy::default();
    let expression =
        Expression::parse("add name=core router-id=10.127.0.1", "/routing ospf instance").unwrap();
    assert_eq!(
        expression.natural_key_and_id(&policy),
        (Some("name".to_string()), Some("core".to_string()))
    );
}

#[test]
fn test_identity_from_find_clause() {
    let policy = Policy::default();
    let expression = Expression::parse(
        "set [ find default-name=ether1 ] name=core",
        "/interface ethernet",
    )
    .unwrap();
    assert_eq!(
        expression.natural_key_and_id(&policy),
        (
            Some("default-name".to_string()),
            Some("ether1".to_string())
        )
    );
}

#[test]
fn test_identity_positional() {
    let policy = Policy::default();
    let expression = Expression::parse("set telnet disabled=yes", "/ip service").unwrap();
    assert_eq!(
        expression.natural_key_and_id(&policy),
        (None, Some("telnet".to_string()))
    );
}

#[test]
fn test_identity_bare_ip_gets_host_prefix() {
    let policy = Policy::default();
    let expression =
        Expression::parse("add address=10.9.9.9 interface=loop0", "/ip address").unwrap();
    assert_eq!(
        expression.natural_key_and_id(&policy),
        (
            Some("address".to_string()),
            Some("10.9.9.9/32".to_string())
        )
    );
}
