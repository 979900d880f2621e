use rstest::rstest;
use winch_config::load_toml;

const VALID: &str = r#"
[control]
period_ms = 100

[persistence]
idle_ms = 5000
path = "winch_position.bin"

[[channels]]
name = "left"
driver_channel = 1
pin_a = 17
pin_b = 27
duty = 0.5
travel_mm = 25.0
spool_diameter_mm = 7.0
encoder_resolution = 525.0

[[channels]]
name = "right"
driver_channel = 2
pin_a = 23
pin_b = 24
duty = 0.5
travel_mm = 25.0
spool_diameter_mm = 7.0
encoder_resolution = 525.0
"#;

#[test]
fn accepts_a_complete_config() {
    let cfg = load_toml(VALID).expect("parse TOML");
    cfg.validate().expect("valid config");
    assert_eq!(cfg.channels.len(), 2);
    assert_eq!(cfg.control.period_ms, 100);
    assert_eq!(cfg.persistence.idle_ms, 5000);
}

#[test]
fn defaults_fill_missing_sections() {
    let toml = r#"
[[channels]]
name = "solo"
driver_channel = 1
pin_a = 17
pin_b = 27
travel_mm = 25.0
spool_diameter_mm = 7.0
encoder_resolution = 525.0
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("valid config");
    assert_eq!(cfg.control.period_ms, 100);
    assert_eq!(cfg.persistence.idle_ms, 5000);
    assert!(cfg.channels[0].pull_up);
    assert!((cfg.channels[0].duty - 0.5).abs() < f32::EPSILON);
}

#[test]
fn rejects_empty_channel_list() {
    let cfg = load_toml("channels = []").expect("parse TOML");
    let err = cfg.validate().expect_err("should reject empty channels");
    assert!(format!("{err}").contains("at least one"));
}

#[rstest]
#[case("period_ms = 100", "period_ms = 0", "period_ms must be >= 1")]
#[case("idle_ms = 5000", "idle_ms = 0", "idle_ms must be >= 1")]
#[case("duty = 0.5", "duty = 0.0", "duty must be in")]
#[case("duty = 0.5", "duty = 1.5", "duty must be in")]
#[case("travel_mm = 25.0", "travel_mm = -1.0", "travel_mm must be finite")]
#[case(
    "spool_diameter_mm = 7.0",
    "spool_diameter_mm = 0.0",
    "spool_diameter_mm must be > 0"
)]
#[case(
    "encoder_resolution = 525.0",
    "encoder_resolution = -525.0",
    "encoder_resolution must be > 0"
)]
fn rejects_out_of_range_fields(
    #[case] original: &str,
    #[case] broken: &str,
    #[case] needle: &str,
) {
    let toml = VALID.replacen(original, broken, 1);
    let cfg = load_toml(&toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject");
    assert!(
        format!("{err}").contains(needle),
        "error {err} missing {needle:?}"
    );
}

#[test]
fn rejects_duplicate_driver_channels() {
    let toml = VALID.replacen("driver_channel = 2", "driver_channel = 1", 1);
    let cfg = load_toml(&toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject duplicate terminal");
    assert!(format!("{err}").contains("used by more than one channel"));
}

#[test]
fn rejects_shared_encoder_pins() {
    let toml = VALID.replacen("pin_a = 23", "pin_a = 17", 1);
    let cfg = load_toml(&toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject shared pin");
    assert!(format!("{err}").contains("used by more than one channel"));
}

#[test]
fn rejects_equal_a_and_b_pins() {
    let toml = VALID.replacen("pin_b = 27", "pin_b = 17", 1);
    let cfg = load_toml(&toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject pin_a == pin_b");
    assert!(format!("{err}").contains("must differ"));
}

#[test]
fn zero_travel_is_accepted_but_degenerate() {
    // A zero travel target is a documented degenerate configuration, not a
    // validation failure.
    let toml = VALID.replacen("travel_mm = 25.0", "travel_mm = 0.0", 1);
    let cfg = load_toml(&toml).expect("parse TOML");
    cfg.validate().expect("accepted");
}
