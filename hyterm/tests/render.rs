use hyterm::prelude::*;
use strum::IntoEnumIterator;

fn int() -> Expr {
    type_term(builtin::I32.clone())
}

#[test]
fn minimum_mode_hides_higher_orders() {
    assert_eq!(constant(3).pretty_string(PrettyMode::Minimum), "3");
    assert_eq!(function(int(), int()).pretty_string(PrettyMode::Minimum), "i32 -> i32");
    assert_eq!(
        and(int(), or(type_term(builtin::STRING.clone()), type_term(builtin::BOOL.clone())))
            .pretty_string(PrettyMode::Minimum),
        "i32 && (string || bool)"
    );
    assert_eq!(
        lambda(bound("x"), apply(variable("f"), variable("x"))).pretty_string(PrettyMode::Minimum),
        "x -> f x"
    );
}

#[test]
fn readable_mode_shows_types() {
    assert_eq!(constant(3).pretty_string(PrettyMode::Readable), "3:i32");
    assert_eq!(int().pretty_string(PrettyMode::Readable), "i32:*");
    assert_eq!(type_kind().pretty_string(PrettyMode::Readable), "*");
    assert_eq!(type_kind().pretty_string(PrettyMode::ReadableAll), "*:#");
    assert_eq!(variable("x").pretty_string(PrettyMode::Readable), "x");
    assert_eq!(constant(3).to_string(), "3:i32");
}

#[test]
fn strict_mode_tags_variants() {
    assert_eq!(
        variable("x").pretty_string(PrettyMode::Strict),
        "Variable x:_"
    );
    assert!(
        apply(variable("f"), constant(1))
            .pretty_string(PrettyMode::Strict)
            .starts_with("(Apply ")
    );
}

#[test]
fn every_mode_renders_a_placeholder_the_same() {
    let env = Environment::new();
    let placeholder = env.create_placeholder(PlaceholderOrderHint::Fourth);
    let index = placeholder.as_placeholder().unwrap();
    for mode in PrettyMode::iter() {
        assert_eq!(placeholder.pretty_string(mode), index.to_string(), "{mode}");
    }
}

#[test]
fn xml_projection_carries_payload_and_types() {
    let xml = constant(3).to_xml();
    assert_eq!(xml.name, "Constant");
    assert_eq!(xml.get_attribute("value"), Some("3"));
    assert_eq!(xml.get_attribute("type"), Some("i32"));
    assert_eq!(xml.get_attribute("higherOrder"), Some("i32"));
    assert_eq!(
        xml.to_string(),
        "<Constant value=\"3\" type=\"i32\" higherOrder=\"i32\" />\n"
    );

    let lambda_xml = lambda(bound("x"), variable("x")).to_xml();
    assert_eq!(lambda_xml.name, "Lambda");
    assert_eq!(lambda_xml.children.len(), 2);
    assert_eq!(lambda_xml.children[0].name, "BoundVariable");
    assert_eq!(lambda_xml.children[0].get_attribute("symbol"), Some("x"));

    let typed = variable("f").with_higher_order(function(int(), int()));
    let typed_xml = typed.to_xml();
    assert!(typed_xml.get_attribute("higherOrder").is_none());
    assert_eq!(typed_xml.children[0].name, "HigherOrder");
    assert_eq!(typed_xml.children[0].children[0].name, "Function");
}

#[test]
fn xml_escapes_attribute_values() {
    let xml = constant("<a & \"b\">").to_xml();
    let text = xml.to_string();
    assert!(text.contains("&lt;a &amp; \\&quot;b\\&quot;&gt;"), "{text}");
}

#[test]
fn configuration_reads_toml() {
    let config = EnvironmentConfig::from_toml_str(
        r#"
        pretty_width = 100
        error_mode = "readable"
        "#,
    )
    .unwrap();
    assert_eq!(config.pretty_width, 100);
    assert_eq!(config.error_mode, PrettyMode::Readable);
    assert!(config.retain_topology);
    assert!(!config.trace_phases);

    assert_eq!(
        EnvironmentConfig::from_toml_str("").unwrap(),
        EnvironmentConfig::default()
    );
}

#[test]
fn configuration_errors_are_reported() {
    let err = EnvironmentConfig::from_toml_str("pretty_width = \"wide\"").unwrap_err();
    assert!(matches!(err, TermError::ConfigParse(_)), "{err}");

    let missing = std::path::Path::new("/nonexistent/hyterm.toml");
    let err = EnvironmentConfig::load_from_toml(missing).unwrap_err();
    assert!(matches!(err, TermError::Io(_)), "{err}");
}

#[test]
fn error_mode_controls_diagnostics() {
    let env = Environment::with_config(
        EnvironmentConfig::default().with_error_mode(PrettyMode::Strict),
    );
    let err = env.reduce(&apply(constant(1), constant(2))).unwrap_err();
    assert!(err.to_string().contains("Function"), "{err}");
}

#[test]
fn topology_renders_as_text_and_dot() {
    let env = Environment::new();
    env.reduce(&apply(lambda(bound("x"), variable("x")), constant(3)))
        .unwrap();
    let topology = env.last_topology().unwrap();

    let text = topology.to_string();
    assert_eq!(text.lines().count(), topology.len());
    assert!(text.lines().all(|line| line.starts_with('\'') && line.contains(" := ")));

    let graph = topology.to_graph();
    assert!(graph.node_count() >= topology.len());
    assert!(topology.to_dot().starts_with("digraph"));
}
