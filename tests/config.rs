mod tests {
    use std::{collections::BTreeMap, io::Write};

    use embassy_time::Duration;
    use lumen_composer::{
        ChannelKey, Config, ConfigError, Direction, EffectId, OperatingEvent, parse_effect_spec,
        color::parse_color, telemetry::HeaterKind,
    };

    const PRINTER: &str = r#"
[settings]
max_brightness = 0.5
bored_timeout = 120

[effects.disco]
min_sparkle = 2
max_sparkle = 4

[[chase_rings]]
name = "case"
members = ["left", "right"]
speed = 12

[groups.left]
driver = "sidecar"
gpio_pin = 18
index_start = 1
index_end = 18
on.idle = "solid white"
on.heating = "thermal tool steel red 1.5"
on.printing = "progress"
on.bored = "disco"

[groups.right]
channel = "sidecar"
gpio_pin = 18
index_start = 19
index_end = 35
direction = "reverse"
on.idle = { effect = "pulse", color = "cyan", speed = 0.5, max_brightness = 0.8 }

[groups.toolhead]
driver = "klipper"
neopixel = "sb_leds"
index_start = 1
index_end = 3
on.printing = "solid:white"

[groups.enclosure]
driver = "pwm"
pin_name = "caselight"
scale = 0.8
on.idle = "solid"
"#;

    fn expect_err(source: &str) -> ConfigError {
        match Config::from_toml_str(source) {
            Ok(_) => panic!("accepted invalid config:\n{source}"),
            Err(err) => err,
        }
    }

    #[test]
    fn test_full_config_resolves() {
        let config = Config::from_toml_str(PRINTER).unwrap();
        assert_eq!(config.groups.len(), 4);
        assert!((config.settings.max_brightness - 0.5).abs() < f32::EPSILON);
        assert_eq!(config.classifier().bored_timeout, Duration::from_secs(120));

        let left = config.group("left").unwrap();
        assert_eq!(left.channel, ChannelKey::Sidecar { gpio_pin: 18 });
        assert_eq!(left.pixel_count(), 18);
        let heating = left.effect_for(OperatingEvent::Heating).unwrap();
        assert_eq!(heating.effect, EffectId::Thermal);
        assert_eq!(heating.params.temp_source, HeaterKind::Tool);
        assert_eq!(heating.params.end_color, parse_color("red").unwrap());
        assert!((heating.params.gradient_curve - 1.5).abs() < f32::EPSILON);

        let bored = left.effect_for(OperatingEvent::Bored).unwrap();
        assert_eq!((bored.params.min_sparkle, bored.params.max_sparkle), (2, 4));

        let right = config.group("right").unwrap();
        assert_eq!(right.direction, Direction::Reverse);
        let idle = right.effect_for(OperatingEvent::Idle).unwrap();
        assert_eq!(idle.effect, EffectId::Pulse);
        assert_eq!(idle.color, parse_color("cyan").unwrap());
        assert!((idle.params.speed - 0.5).abs() < f32::EPSILON);
        assert!((idle.params.max_brightness - 0.8).abs() < f32::EPSILON);

        let toolhead = config.group("toolhead").unwrap();
        assert_eq!(
            toolhead.channel,
            ChannelKey::Firmware {
                neopixel: "sb_leds".to_owned()
            }
        );
        assert_eq!(
            toolhead.effect_for(OperatingEvent::Printing).unwrap().color,
            parse_color("white").unwrap()
        );

        let enclosure = config.group("enclosure").unwrap();
        assert_eq!(enclosure.pixel_count(), 1);
        assert!((enclosure.pwm_scale - 0.8).abs() < f32::EPSILON);

        assert_eq!(config.rings.len(), 1);
        assert_eq!(config.rings[0].members, vec!["left", "right"]);
        assert!((config.rings[0].tuning.speed - 12.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(PRINTER.as_bytes()).unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config, Config::from_toml_str(PRINTER).unwrap());

        let missing = Config::load("/nonexistent/lumen.toml").unwrap_err();
        assert_eq!(missing.as_label(), "config_io");
    }

    #[test]
    fn test_inline_spec_forms() {
        let defaults = BTreeMap::new();
        let spec = parse_effect_spec("test", "solid:red", &defaults).unwrap();
        assert_eq!((spec.effect, spec.color), (EffectId::Solid, parse_color("red").unwrap()));

        let spec = parse_effect_spec("test", "  comet   blue ", &defaults).unwrap();
        assert_eq!((spec.effect, spec.color), (EffectId::Comet, parse_color("blue").unwrap()));

        let spec = parse_effect_spec("test", "thermal bed", &defaults).unwrap();
        assert_eq!(spec.params.temp_source, HeaterKind::Bed);

        // Missing source keeps the default heater and reads colors instead
        let spec = parse_effect_spec("test", "thermal blue red", &defaults).unwrap();
        assert_eq!(spec.params.temp_source, HeaterKind::Tool);
        assert_eq!(spec.params.start_color, parse_color("blue").unwrap());
        assert_eq!(spec.params.end_color, parse_color("red").unwrap());

        assert!(matches!(
            parse_effect_spec("test", "   ", &defaults),
            Err(ConfigError::EmptySpec { .. })
        ));
        assert!(matches!(
            parse_effect_spec("test", "progress white black fast", &defaults),
            Err(ConfigError::OutOfRange { field: "gradient_curve", .. })
        ));
    }

    #[test]
    fn test_rejects_out_of_range_brightness() {
        let err = expect_err(
            r#"
[groups.a]
gpio_pin = 1
on.idle = { effect = "pulse", max_brightness = 1.5 }
"#,
        );
        assert!(matches!(err, ConfigError::OutOfRange { field: "max_brightness", .. }), "{err}");
    }

    #[test]
    fn test_rejects_inverted_sparkle() {
        let err = expect_err(
            r#"
[effects.disco]
min_sparkle = 6
max_sparkle = 2
"#,
        );
        assert!(matches!(err, ConfigError::InvertedBounds { .. }), "{err}");
    }

    #[test]
    fn test_rejects_unknown_names() {
        let err = expect_err(
            r#"
[groups.a]
gpio_pin = 1
on.idle = "solid chartreuse-ish"
"#,
        );
        assert!(matches!(err, ConfigError::UnknownColor { .. }), "{err}");

        let err = expect_err(
            r#"
[groups.a]
gpio_pin = 1
on.idle = "strobe"
"#,
        );
        assert!(matches!(err, ConfigError::UnknownEffect { .. }), "{err}");

        let err = expect_err(
            r#"
[groups.a]
gpio_pin = 1
on.homing = "solid"
"#,
        );
        assert!(matches!(err, ConfigError::UnknownEvent { .. }), "{err}");
        assert_eq!(err.as_label(), "config_unknown_event");
    }

    #[test]
    fn test_rejects_bad_group_wiring() {
        let err = expect_err(
            r#"
[groups.a]
gpio_pin = 1
index_start = 10
index_end = 4
"#,
        );
        assert!(matches!(err, ConfigError::InvalidRange { start: 10, end: 4, .. }), "{err}");

        let err = expect_err(
            r#"
[groups.a]
driver = "sidecar"
"#,
        );
        assert!(
            matches!(err, ConfigError::MissingField { field: "gpio_pin", .. }),
            "{err}"
        );

        let err = expect_err(
            r#"
[groups.lamp]
driver = "binary"
pin_name = "caselight"
on.idle = "rainbow"
"#,
        );
        assert!(
            matches!(err, ConfigError::UnsupportedEffect { effect: "rainbow", .. }),
            "{err}"
        );
    }

    #[test]
    fn test_rejects_bad_rings() {
        let base = r#"
[groups.a]
gpio_pin = 1
[groups.b]
gpio_pin = 1
index_start = 2
"#;
        let err = expect_err(&format!(
            "{base}\n[[chase_rings]]\nname = \"r\"\nmembers = [\"a\", \"ghost\"]\n"
        ));
        assert!(matches!(err, ConfigError::UnknownRingMember { .. }), "{err}");

        let err = expect_err(&format!(
            "{base}\n[[chase_rings]]\nname = \"r1\"\nmembers = [\"a\"]\n\
             [[chase_rings]]\nname = \"r2\"\nmembers = [\"b\", \"a\"]\n"
        ));
        assert!(matches!(err, ConfigError::DuplicateRingMember { .. }), "{err}");

        let err = expect_err(&format!("{base}\n[[chase_rings]]\nname = \"r\"\n"));
        assert!(matches!(err, ConfigError::EmptyRing { .. }), "{err}");
    }

    #[test]
    fn test_rejects_degenerate_output_settings() {
        for (source, field) in [
            ("[dispatch]\nfailure_threshold = 0\n", "failure_threshold"),
            ("[dispatch]\nsend_timeout_ms = 0\n", "send_timeout_ms"),
            ("[dispatch]\nprobe_factor = 0.5\n", "probe_factor"),
            ("[dispatch]\nprobe_factor = nan\n", "probe_factor"),
            ("[sidecar]\ntimeout_ms = 0\n", "timeout_ms"),
            ("[sidecar]\nattempts = 0\n", "attempts"),
            ("[firmware]\ntimeout_ms = 0\n", "timeout_ms"),
        ] {
            let err = expect_err(source);
            assert!(
                matches!(&err, ConfigError::OutOfRange { field: got, .. } if *got == field),
                "{source}: {err}"
            );
        }

        let err = expect_err("[dispatch]\nprobe_first_ms = 5000\nprobe_max_ms = 1000\n");
        assert!(matches!(err, ConfigError::InvertedBounds { field: "probe_ms", .. }), "{err}");

        let config = Config::from_toml_str("[dispatch]\nfailure_threshold = 1\n").unwrap();
        assert_eq!(config.dispatch.failure_threshold, 1);
        assert_eq!(config.dispatch.send_timeout_ms, config.sidecar.timeout_ms);
    }

    #[test]
    fn test_rejects_unknown_settings_key() {
        let err = expect_err("[settings]\nmax_brightnes = 0.3\n");
        assert!(matches!(err, ConfigError::Parse(_)), "{err}");
    }

    #[test]
    fn test_scheduler_intervals_from_settings() {
        let config = Config::from_toml_str("[settings]\ndirect_fps = 50\nupdate_rate = 0.2\n").unwrap();
        let scheduler = config.scheduler();
        assert_eq!(scheduler.direct_interval, Duration::from_millis(20));
        assert_eq!(scheduler.firmware_interval, Duration::from_millis(200));
        assert_eq!(scheduler.min_sleep, Duration::from_millis(5));
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(2));
    }
}
