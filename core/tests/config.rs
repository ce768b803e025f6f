use funnel_core::{
    config::{FunnelConfig, RevenueBasis},
    funnel::FunnelTemplate,
    projection::project,
};

fn data_dir() -> String {
    format!("{}/../data", env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn shipped_data_matches_builtin_defaults() {
    let loaded = FunnelConfig::load(&data_dir()).expect("data/ should load");
    let builtin = FunnelConfig::default();

    assert_eq!(loaded.default_inputs, builtin.default_inputs);
    assert_eq!(loaded.templates, builtin.templates);
    assert_eq!(loaded.active_template, builtin.active_template);
    assert_eq!(loaded.settings, builtin.settings);
    assert_eq!(loaded.settings.revenue_basis, RevenueBasis::Gross);
}

#[test]
fn missing_data_dir_is_an_error() {
    let err = FunnelConfig::load("/nonexistent/funnel-data").unwrap_err();
    assert!(err.to_string().contains("Cannot read"), "got: {err}");
}

#[test]
fn active_template_can_be_switched() {
    let config = FunnelConfig::default()
        .with_active_template(FunnelTemplate::DIRECT)
        .unwrap();
    let m = project(&config.default_inputs, &config).unwrap();

    assert_eq!(m.proposals_sent, None);
    assert_eq!(m.discovery_calls, None);

    assert!(FunnelConfig::default().with_active_template("missing").is_err());
}

#[test]
fn malformed_template_fails_config_check() {
    let mut config = FunnelConfig::default();
    config.templates.push(FunnelTemplate {
        id:     "too_short".into(),
        label:  "Too short".into(),
        stages: FunnelTemplate::direct().stages[..2].to_vec(),
    });
    assert!(config.check().is_err());
}
