mod tests {
    use embassy_time::{Duration, Instant};
    use lumen_composer::{
        ChannelKey, EffectId, EffectSpec, GroupConfig, OperatingEvent, RenderScheduler, Rgb,
        SchedulerConfig, TelemetrySnapshot,
        chase::ChaseTuning,
        color::{BLACK, WHITE},
        config::RingConfig,
        effect::EffectParams,
        telemetry::BlockingOperation,
    };

    const RED: Rgb = Rgb { r: 255, g: 0, b: 0 };

    fn sidecar() -> ChannelKey {
        ChannelKey::Sidecar { gpio_pin: 18 }
    }

    fn firmware() -> ChannelKey {
        ChannelKey::Firmware {
            neopixel: "toolhead".to_owned(),
        }
    }

    fn solid(name: &str, channel: ChannelKey) -> GroupConfig {
        GroupConfig::new(name, channel, 1, 4)
            .with_effect(OperatingEvent::Idle, EffectSpec::new(EffectId::Solid, WHITE))
    }

    fn always(_: &ChannelKey) -> bool {
        true
    }

    fn ms(millis: u64) -> Instant {
        Instant::from_millis(millis)
    }

    #[test]
    fn test_off_is_sent_once_then_parked() {
        let group = GroupConfig::new("off", sidecar(), 1, 3)
            .with_effect(OperatingEvent::Idle, EffectSpec::new(EffectId::Off, WHITE));
        let mut scheduler = RenderScheduler::new(SchedulerConfig::default(), vec![group], vec![]);
        let telemetry = TelemetrySnapshot::default();

        let first = scheduler.cycle(ms(0), &telemetry, OperatingEvent::Idle, &always);
        assert_eq!(first.batches.len(), 1);
        assert_eq!(first.batches[0].updates[0].colors, vec![Some(BLACK); 3]);
        assert!(scheduler.runtime("off").unwrap().is_parked());

        for step in 1..20 {
            let cycle = scheduler.cycle(ms(step * 100), &telemetry, OperatingEvent::Idle, &always);
            assert!(cycle.batches.is_empty());
            assert_eq!(cycle.sleep, Duration::from_millis(250));
        }
        assert!(scheduler.status()[0].parked);
    }

    #[test]
    fn test_brightness_pass_scales_frame() {
        let group = solid("case", sidecar()).with_brightness(0.5);
        let mut scheduler = RenderScheduler::new(SchedulerConfig::default(), vec![group], vec![]);
        let cycle = scheduler.cycle(ms(0), &TelemetrySnapshot::default(), OperatingEvent::Idle, &always);

        let expected = Rgb { r: 51, g: 51, b: 51 };
        assert_eq!(cycle.batches[0].updates[0].colors, vec![Some(expected); 4]);
        // The runtime keeps the undimmed frame
        assert_eq!(scheduler.runtime("case").unwrap().frame()[0], Some(WHITE));
    }

    #[test]
    fn test_static_effect_refreshes() {
        let mut scheduler =
            RenderScheduler::new(SchedulerConfig::default(), vec![solid("case", sidecar())], vec![]);
        let telemetry = TelemetrySnapshot::default();

        let first = scheduler.cycle(ms(0), &telemetry, OperatingEvent::Idle, &always);
        assert_eq!(first.batches.len(), 1);
        assert_eq!(first.sleep, Duration::from_millis(250));

        let idle = scheduler.cycle(ms(1_000), &telemetry, OperatingEvent::Idle, &always);
        assert!(idle.batches.is_empty());

        let refresh = scheduler.cycle(ms(5_000), &telemetry, OperatingEvent::Idle, &always);
        assert_eq!(refresh.batches.len(), 1);
    }

    #[test]
    fn test_blocking_operation_holds_queued_channels() {
        let groups = vec![solid("case", sidecar()), solid("toolhead", firmware())];
        let mut scheduler = RenderScheduler::new(SchedulerConfig::default(), groups, vec![]);

        let mut telemetry = TelemetrySnapshot::default();
        telemetry.blocking_operation = Some(BlockingOperation::Homing);
        let held = scheduler.cycle(ms(0), &telemetry, OperatingEvent::Idle, &always);
        assert_eq!(held.batches.len(), 1);
        assert_eq!(held.batches[0].channel, sidecar());

        telemetry.blocking_operation = None;
        let released = scheduler.cycle(ms(50), &telemetry, OperatingEvent::Idle, &always);
        assert_eq!(released.batches.len(), 1);
        assert_eq!(released.batches[0].channel, firmware());
    }

    #[test]
    fn test_unready_channel_is_not_rendered() {
        let mut scheduler =
            RenderScheduler::new(SchedulerConfig::default(), vec![solid("case", sidecar())], vec![]);
        let telemetry = TelemetrySnapshot::default();

        let closed = scheduler.cycle(ms(0), &telemetry, OperatingEvent::Idle, &|_: &ChannelKey| false);
        assert!(closed.batches.is_empty());
        assert!(scheduler.runtime("case").unwrap().effect_state().unwrap().last_update.is_none());

        let open = scheduler.cycle(ms(10), &telemetry, OperatingEvent::Idle, &always);
        assert_eq!(open.batches.len(), 1);
    }

    #[test]
    fn test_sleep_is_clamped() {
        let rainbow = GroupConfig::new("strip", sidecar(), 1, 10)
            .with_effect(OperatingEvent::Idle, EffectSpec::new(EffectId::Rainbow, WHITE));
        let config = SchedulerConfig {
            direct_interval: Duration::from_millis(1),
            ..SchedulerConfig::default()
        };
        let mut scheduler = RenderScheduler::new(config, vec![rainbow], vec![]);
        let cycle = scheduler.cycle(ms(0), &TelemetrySnapshot::default(), OperatingEvent::Idle, &always);
        assert_eq!(cycle.sleep, Duration::from_millis(5));

        let mut empty = RenderScheduler::new(SchedulerConfig::default(), vec![], vec![]);
        let cycle = empty.cycle(ms(0), &TelemetrySnapshot::default(), OperatingEvent::Idle, &always);
        assert!(cycle.batches.is_empty());
        assert_eq!(cycle.sleep, Duration::from_millis(250));
    }

    #[test]
    fn test_failed_effect_falls_back_to_base_color() {
        let mut params = EffectParams::defaults_for(EffectId::Fire);
        params.cooling = 1.5;
        let group = GroupConfig::new("fire", sidecar(), 1, 2).with_effect(
            OperatingEvent::Idle,
            EffectSpec::new(EffectId::Fire, RED).with_params(params),
        );
        let mut scheduler = RenderScheduler::new(SchedulerConfig::default(), vec![group], vec![]);
        let cycle = scheduler.cycle(ms(0), &TelemetrySnapshot::default(), OperatingEvent::Idle, &always);

        let dimmed = Rgb { r: 102, g: 0, b: 0 };
        assert_eq!(cycle.batches[0].updates[0].colors, vec![Some(dimmed); 2]);
    }

    #[test]
    fn test_unmapped_event_keeps_current_effect() {
        let mut scheduler =
            RenderScheduler::new(SchedulerConfig::default(), vec![solid("case", sidecar())], vec![]);
        let telemetry = TelemetrySnapshot::default();
        scheduler.cycle(ms(0), &telemetry, OperatingEvent::Idle, &always);
        scheduler.cycle(ms(100), &telemetry, OperatingEvent::Heating, &always);

        let runtime = scheduler.runtime("case").unwrap();
        assert_eq!(runtime.effect(), Some(EffectId::Solid));
        assert_eq!(runtime.event(), Some(OperatingEvent::Idle));
    }

    #[test]
    fn test_chase_ring_lifecycle() {
        let chase = EffectSpec::new(EffectId::Chase, WHITE);
        let idle = EffectSpec::new(EffectId::Solid, WHITE);
        let groups = vec![
            GroupConfig::new("left", sidecar(), 1, 18)
                .with_effect(OperatingEvent::Bored, chase.clone())
                .with_effect(OperatingEvent::Idle, idle.clone()),
            GroupConfig::new("right", sidecar(), 19, 35)
                .with_effect(OperatingEvent::Bored, chase)
                .with_effect(OperatingEvent::Idle, idle),
        ];
        let ring = RingConfig {
            name: "case".to_owned(),
            members: vec!["left".to_owned(), "right".to_owned()],
            tuning: ChaseTuning::default(),
        };
        let mut scheduler = RenderScheduler::new(SchedulerConfig::default(), groups, vec![ring]);
        let telemetry = TelemetrySnapshot::default();

        scheduler.cycle(ms(0), &telemetry, OperatingEvent::Idle, &always);
        assert!(scheduler.coordinator("case").is_none());

        let cycle = scheduler.cycle(ms(100), &telemetry, OperatingEvent::Bored, &always);
        let coordinator = scheduler.coordinator("case").unwrap();
        assert_eq!(coordinator.ring().len(), 35);
        assert_eq!(cycle.batches.len(), 1);
        assert_eq!(cycle.batches[0].updates.len(), 2);
        assert_eq!(scheduler.chase_status()[0].roles.len(), 2);

        scheduler.cycle(ms(200), &telemetry, OperatingEvent::Bored, &always);
        assert!(scheduler.coordinator("case").is_some());

        scheduler.cycle(ms(300), &telemetry, OperatingEvent::Idle, &always);
        assert!(scheduler.coordinator("case").is_none());
        assert!(scheduler.chase_status().is_empty());
    }

    #[test]
    fn test_all_off_covers_every_group() {
        let groups = vec![solid("a", sidecar()), solid("b", sidecar()), solid("c", firmware())];
        let scheduler = RenderScheduler::new(SchedulerConfig::default(), groups, vec![]);
        let batches = scheduler.all_off();
        assert_eq!(batches.len(), 2);
        let updates: usize = batches.iter().map(|batch| batch.updates.len()).sum();
        assert_eq!(updates, 3);
        assert!(
            batches
                .iter()
                .flat_map(|batch| &batch.updates)
                .all(|update| update.uniform_color() == Some(None))
        );
    }

    #[test]
    fn test_off_batches_only_selected_groups() {
        let groups = vec![solid("a", sidecar()), solid("b", sidecar()), solid("c", firmware())];
        let scheduler = RenderScheduler::new(SchedulerConfig::default(), groups, vec![]);
        let batches = scheduler.off_batches(|group| group.name != "a");
        let mut names: Vec<&str> = batches
            .iter()
            .flat_map(|batch| &batch.updates)
            .map(|update| update.group.as_str())
            .collect();
        names.sort_unstable();
        assert_eq!(names, vec!["b", "c"]);
        assert!(scheduler.off_batches(|_| false).is_empty());
    }
}
