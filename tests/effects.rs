mod tests {
    use embassy_time::{Duration, Instant};
    use lumen_composer::{
        Direction, EffectId, EffectSpec, EffectState, GroupRuntime, OperatingEvent, RenderContext,
        Rgb, TelemetrySnapshot,
        color::{BLACK, WHITE, parse_color},
        effect::{DiscoEffect, EffectComplexity, EffectParams, HeartbeatEffect, ThermalEffect},
        telemetry::HeaterKind,
    };
    use proptest::prelude::*;

    const RED: Rgb = Rgb { r: 255, g: 0, b: 0 };

    fn state(spec: &EffectSpec, direction: Direction) -> EffectState {
        EffectState::new(spec, direction, Instant::from_millis(0))
    }

    #[test]
    fn test_effect_names() {
        for id in EffectId::ALL {
            assert_eq!(EffectId::parse_from_str(id.as_str()), Some(id));
            assert_eq!(id.to_slot().id(), id);
        }
        assert_eq!(EffectId::parse_from_str("strobe"), None);
    }

    #[test]
    fn test_effect_complexity() {
        assert_eq!(EffectId::Solid.complexity(), EffectComplexity::Static);
        assert_eq!(EffectId::Thermal.complexity(), EffectComplexity::Reactive);
        assert_eq!(EffectId::Progress.complexity(), EffectComplexity::Reactive);
        assert_eq!(EffectId::Fire.complexity(), EffectComplexity::Animated);
        assert_eq!(EffectId::Off.complexity(), EffectComplexity::Off);
    }

    #[test]
    fn test_solid_reports_change_once() {
        let spec = EffectSpec::new(EffectId::Solid, RED);
        let state = state(&spec, Direction::Standard);
        let telemetry = TelemetrySnapshot::default();
        let ctx = RenderContext::new(&telemetry);
        let mut slot = EffectId::Solid.to_slot();

        let first = slot.calculate(&state, Instant::from_millis(0), 4, &ctx).unwrap();
        assert!(first.changed);
        assert_eq!(first.colors, vec![Some(RED); 4]);

        let second = slot.calculate(&state, Instant::from_millis(16), 4, &ctx).unwrap();
        assert!(!second.changed);
        assert_eq!(second.colors, vec![Some(RED); 4]);

        slot.reset();
        let third = slot.calculate(&state, Instant::from_millis(32), 4, &ctx).unwrap();
        assert!(third.changed);
    }

    #[test]
    fn test_off_is_explicit_black() {
        let spec = EffectSpec::new(EffectId::Off, WHITE);
        let state = state(&spec, Direction::Standard);
        let telemetry = TelemetrySnapshot::default();
        let ctx = RenderContext::new(&telemetry);
        let mut slot = EffectId::Off.to_slot();

        let first = slot.calculate(&state, Instant::from_millis(0), 3, &ctx).unwrap();
        assert!(first.changed);
        assert_eq!(first.colors, vec![Some(BLACK); 3]);
        let second = slot.calculate(&state, Instant::from_millis(100), 3, &ctx).unwrap();
        assert!(!second.changed);
    }

    #[test]
    fn test_thermal_without_range_shows_start_color() {
        let spec = EffectSpec::new(EffectId::Thermal, WHITE);
        let state = state(&spec, Direction::Standard);
        // Target equals the 25 degree ambient floor
        let telemetry = TelemetrySnapshot::default().with_tool(25.0, 25.0);
        let ctx = RenderContext::new(&telemetry);
        let mut slot = EffectId::Thermal.to_slot();

        let frame = slot.calculate(&state, Instant::from_millis(0), 8, &ctx).unwrap();
        assert_eq!(frame.colors, vec![Some(spec.params.start_color); 8]);

        let missing = TelemetrySnapshot::default();
        let ctx = RenderContext::new(&missing);
        let frame = slot.calculate(&state, Instant::from_millis(10), 8, &ctx).unwrap();
        assert_eq!(frame.colors, vec![Some(spec.params.start_color); 8]);
    }

    #[test]
    fn test_thermal_fill_follows_heater() {
        assert_eq!(ThermalEffect::fill_fraction(25.0, 25.0, 25.0), None);
        assert_eq!(ThermalEffect::fill_fraction(100.0, 0.0, 25.0), None);
        assert_eq!(ThermalEffect::fill_fraction(f32::NAN, 200.0, 25.0), None);
        assert_eq!(ThermalEffect::fill_fraction(125.0, 225.0, 25.0), Some(0.5));

        let mut params = EffectParams::defaults_for(EffectId::Thermal);
        params.temp_source = HeaterKind::Bed;
        let spec = EffectSpec::new(EffectId::Thermal, WHITE).with_params(params);
        let state = state(&spec, Direction::Standard);
        let telemetry = TelemetrySnapshot::default().with_bed(65.0, 65.0);
        let ctx = RenderContext::new(&telemetry);
        let frame = EffectId::Thermal
            .to_slot()
            .calculate(&state, Instant::from_millis(0), 10, &ctx)
            .unwrap();
        assert!(frame.colors.iter().all(Option::is_some));
        assert_eq!(frame.colors[9], Some(params.end_color));
    }

    #[test]
    fn test_progress_reverse_fills_from_far_end() {
        let spec = EffectSpec::new(EffectId::Progress, WHITE);
        let mut telemetry = TelemetrySnapshot::default();
        telemetry.progress = 0.5;
        let ctx = RenderContext::new(&telemetry);

        let forward = EffectId::Progress
            .to_slot()
            .calculate(&state(&spec, Direction::Standard), Instant::from_millis(0), 10, &ctx)
            .unwrap();
        let reverse = EffectId::Progress
            .to_slot()
            .calculate(&state(&spec, Direction::Reverse), Instant::from_millis(0), 10, &ctx)
            .unwrap();

        assert!(forward.colors[0].is_some());
        assert!(forward.colors[9].is_none());
        let mut mirrored = forward.colors.clone();
        mirrored.reverse();
        assert_eq!(reverse.colors, mirrored);
    }

    #[test]
    fn test_disco_inverted_bounds_self_correct() {
        assert_eq!(DiscoEffect::sparkle_range(5, 2, 30), (2, 2));
        assert_eq!(DiscoEffect::sparkle_range(5, 2, 1), (1, 1));
        assert_eq!(DiscoEffect::sparkle_range(1, 4, 3), (1, 3));

        let mut params = EffectParams::defaults_for(EffectId::Disco);
        params.min_sparkle = 5;
        params.max_sparkle = 2;
        let spec = EffectSpec::new(EffectId::Disco, WHITE).with_params(params);
        let state = state(&spec, Direction::Standard);
        let telemetry = TelemetrySnapshot::default();
        let ctx = RenderContext::new(&telemetry);
        let mut slot = EffectId::Disco.to_slot();

        for tick in 0..40_u64 {
            // Five updates per second by default
            let now = Instant::from_millis(tick * 200);
            let frame = slot.calculate(&state, now, 20, &ctx).unwrap();
            assert!(frame.changed);
            let lit = frame.colors.iter().filter(|c| c.is_some()).count();
            assert_eq!(lit, 2, "tick {tick}: max_sparkle is an upper bound");
        }
    }

    #[test]
    fn test_disco_throttles_between_ticks() {
        let spec = EffectSpec::new(EffectId::Disco, WHITE);
        let state = state(&spec, Direction::Standard);
        let telemetry = TelemetrySnapshot::default();
        let ctx = RenderContext::new(&telemetry);
        let mut slot = EffectId::Disco.to_slot();
        let mut leds = vec![None; 10];

        assert!(slot.render(&state, Instant::from_millis(0), &ctx, &mut leds).unwrap());
        let snapshot = leds.clone();
        assert!(!slot.render(&state, Instant::from_millis(50), &ctx, &mut leds).unwrap());
        assert_eq!(leds, snapshot);
    }

    #[test]
    fn test_fire_rejects_bad_cooling() {
        let mut params = EffectParams::defaults_for(EffectId::Fire);
        params.cooling = 1.5;
        let spec = EffectSpec::new(EffectId::Fire, RED).with_params(params);
        let state = state(&spec, Direction::Standard);
        let telemetry = TelemetrySnapshot::default();
        let ctx = RenderContext::new(&telemetry);
        let result = EffectId::Fire
            .to_slot()
            .calculate(&state, Instant::from_millis(0), 5, &ctx);
        assert!(result.is_err());
    }

    #[test]
    fn test_comet_honours_direction() {
        let spec = EffectSpec::new(EffectId::Comet, RED);
        let telemetry = TelemetrySnapshot::default();
        let ctx = RenderContext::new(&telemetry);
        let now = Instant::from_millis(700);

        let forward = EffectId::Comet
            .to_slot()
            .calculate(&state(&spec, Direction::Standard), now, 20, &ctx)
            .unwrap();
        let reverse = EffectId::Comet
            .to_slot()
            .calculate(&state(&spec, Direction::Reverse), now, 20, &ctx)
            .unwrap();
        let mut mirrored = forward.colors.clone();
        mirrored.reverse();
        assert_eq!(reverse.colors, mirrored);
        assert!(forward.colors.iter().any(Option::is_some));
    }

    #[test]
    fn test_effect_state_persists_until_event_changes() {
        let fire = EffectSpec::new(EffectId::Fire, RED);
        let pulse = EffectSpec::new(EffectId::Pulse, parse_color("blue").unwrap());
        let telemetry = TelemetrySnapshot::default();
        let ctx = RenderContext::new(&telemetry);
        let mut runtime = GroupRuntime::new(12);

        assert!(runtime.sync(OperatingEvent::Idle, &fire, Direction::Standard, Instant::from_millis(0)));
        let start = runtime.effect_state().unwrap().start;

        for frame in 1..=10_u64 {
            let now = Instant::from_millis(frame * 50);
            assert!(!runtime.sync(OperatingEvent::Idle, &fire, Direction::Standard, now));
            runtime.render(now, &ctx).unwrap();
            assert_eq!(runtime.effect_state().unwrap().start, start);
        }
        assert_eq!(
            runtime.effect_state().unwrap().last_update,
            Some(Instant::from_millis(500))
        );

        let switch = Instant::from_millis(550);
        assert!(runtime.sync(OperatingEvent::Heating, &pulse, Direction::Standard, switch));
        let state = runtime.effect_state().unwrap();
        assert_eq!(state.effect, EffectId::Pulse);
        assert_eq!(state.start, switch);
        assert_eq!(state.last_update, None);
        assert_eq!(runtime.event(), Some(OperatingEvent::Heating));
    }

    #[test]
    fn test_pulse_stays_within_bounds() {
        let mut params = EffectParams::defaults_for(EffectId::Pulse);
        params.min_brightness = 0.5;
        params.max_brightness = 1.0;
        let spec = EffectSpec::new(EffectId::Pulse, WHITE).with_params(params);
        let state = state(&spec, Direction::Standard);
        let telemetry = TelemetrySnapshot::default();
        let ctx = RenderContext::new(&telemetry);
        let mut slot = EffectId::Pulse.to_slot();

        for step in 0..100_u64 {
            let now = Instant::from_millis(0) + Duration::from_millis(step * 37);
            let frame = slot.calculate(&state, now, 1, &ctx).unwrap();
            let level = frame.colors[0].unwrap().r;
            assert!((127..=255).contains(&level), "step {step}: {level}");
        }
    }

    proptest! {
        #[test]
        fn test_heartbeat_envelope_is_unit(phase in 0.0_f32..1.0) {
            let value = HeartbeatEffect::envelope(phase);
            prop_assert!((0.0..=1.0).contains(&value));
        }
    }

    #[test]
    fn test_heartbeat_second_beat_is_weaker() {
        let first = HeartbeatEffect::envelope(0.149);
        let second = HeartbeatEffect::envelope(0.249);
        assert!(first > 0.95);
        assert!(second > 0.45 && second < 0.55);
        assert!(HeartbeatEffect::envelope(0.8).abs() < f32::EPSILON);
    }
}
