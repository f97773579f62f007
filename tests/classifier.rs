mod tests {
    use embassy_time::{Duration, Instant};
    use lumen_composer::{
        ClassifierConfig, OperatingEvent, StateClassifier, TelemetrySnapshot, classify,
        classifier::EventTimers,
        telemetry::{FirmwareState, JobState},
    };
    use proptest::prelude::*;

    fn at(secs: u64) -> Instant {
        Instant::from_secs(secs)
    }

    fn ambient() -> TelemetrySnapshot {
        TelemetrySnapshot::default()
            .with_tool(22.0, 0.0)
            .with_bed(22.0, 0.0)
    }

    fn job_state() -> impl Strategy<Value = JobState> {
        prop::sample::select(vec![
            JobState::Standby,
            JobState::Printing,
            JobState::Paused,
            JobState::Complete,
            JobState::Cancelled,
            JobState::Error,
        ])
    }

    fn event() -> impl Strategy<Value = OperatingEvent> {
        prop::sample::select(OperatingEvent::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn test_firmware_error_always_wins(
            tool in any::<f32>(),
            tool_target in any::<f32>(),
            bed in -50.0_f32..150.0,
            job in job_state(),
            previous in event(),
            firmware in prop::sample::select(vec![FirmwareState::Shutdown, FirmwareState::Error]),
        ) {
            let telemetry = TelemetrySnapshot::default()
                .with_tool(tool, tool_target)
                .with_bed(bed, 60.0)
                .with_job(job)
                .with_firmware(firmware);
            let timers = EventTimers { entered_at: at(0) };
            let event = classify(&telemetry, previous, &timers, at(10_000), &ClassifierConfig::default());
            prop_assert_eq!(event, OperatingEvent::Error);
        }

        #[test]
        fn test_classify_never_panics_on_bad_readings(
            tool in any::<f32>(),
            tool_target in any::<f32>(),
            bed in any::<f32>(),
            bed_target in any::<f32>(),
            progress in any::<f32>(),
            job in job_state(),
            previous in event(),
            elapsed in 0_u64..2_000,
        ) {
            let mut telemetry = TelemetrySnapshot::default()
                .with_tool(tool, tool_target)
                .with_bed(bed, bed_target)
                .with_job(job);
            telemetry.progress = progress;
            let timers = EventTimers { entered_at: at(0) };
            let event = classify(&telemetry, previous, &timers, at(elapsed), &ClassifierConfig::default());
            prop_assert!(OperatingEvent::ALL.contains(&event));
        }
    }

    #[test]
    fn test_idle_state_error_string() {
        let mut telemetry = ambient();
        telemetry.idle_state = Some("Error".to_owned());
        let timers = EventTimers { entered_at: at(0) };
        let event = classify(
            &telemetry,
            OperatingEvent::Printing,
            &timers,
            at(1),
            &ClassifierConfig::default(),
        );
        assert_eq!(event, OperatingEvent::Error);
    }

    #[test]
    fn test_idle_heating_printing_sequence() {
        let mut classifier = StateClassifier::new(ClassifierConfig::default(), at(0));
        assert_eq!(classifier.update(ambient(), at(1)), OperatingEvent::Idle);

        let heating = TelemetrySnapshot::default()
            .with_tool(30.0, 210.0)
            .with_bed(25.0, 60.0);
        assert_eq!(classifier.update(heating, at(2)), OperatingEvent::Heating);

        // Job started but the nozzle is still below the print floor
        let warming = TelemetrySnapshot::default()
            .with_tool(150.0, 210.0)
            .with_bed(60.0, 60.0)
            .with_job(JobState::Printing);
        assert_eq!(classifier.update(warming, at(3)), OperatingEvent::Heating);

        let printing = TelemetrySnapshot::default()
            .with_tool(205.0, 210.0)
            .with_bed(59.0, 60.0)
            .with_job(JobState::Printing);
        assert_eq!(classifier.update(printing, at(4)), OperatingEvent::Printing);
        assert_eq!(classifier.previous(), Some(OperatingEvent::Heating));
    }

    #[test]
    fn test_low_target_material_reaches_printing() {
        let telemetry = TelemetrySnapshot::default()
            .with_tool(185.0, 190.0)
            .with_bed(60.0, 60.0)
            .with_job(JobState::Printing);
        let timers = EventTimers { entered_at: at(0) };
        let event = classify(
            &telemetry,
            OperatingEvent::Heating,
            &timers,
            at(1),
            &ClassifierConfig::default(),
        );
        assert_eq!(event, OperatingEvent::Printing);
    }

    #[test]
    fn test_paused_job_stays_printing() {
        let telemetry = TelemetrySnapshot::default()
            .with_tool(210.0, 210.0)
            .with_job(JobState::Paused);
        let timers = EventTimers { entered_at: at(0) };
        let event = classify(
            &telemetry,
            OperatingEvent::Printing,
            &timers,
            at(1),
            &ClassifierConfig::default(),
        );
        assert_eq!(event, OperatingEvent::Printing);
    }

    #[test]
    fn test_cooldown_after_print() {
        let telemetry = TelemetrySnapshot::default()
            .with_tool(120.0, 0.0)
            .with_bed(50.0, 0.0)
            .with_job(JobState::Complete);
        let timers = EventTimers { entered_at: at(0) };
        let event = classify(
            &telemetry,
            OperatingEvent::Printing,
            &timers,
            at(1),
            &ClassifierConfig::default(),
        );
        assert_eq!(event, OperatingEvent::Cooldown);
    }

    #[test]
    fn test_bored_is_sticky_across_noisy_samples() {
        let mut classifier = StateClassifier::new(ClassifierConfig::default(), at(0));
        assert_eq!(classifier.tick(at(300)), OperatingEvent::Bored);

        for i in 0..50_u64 {
            let noise = (i % 7) as f32 * 3.0;
            // Warm, targetless heaters would read as cooldown from idle
            let telemetry = TelemetrySnapshot::default()
                .with_tool(40.0 + noise, 0.0)
                .with_bed(30.0 + noise / 2.0, 0.0)
                .with_job(if i % 2 == 0 {
                    JobState::Complete
                } else {
                    JobState::Standby
                });
            assert_eq!(
                classifier.update(telemetry, at(301 + i)),
                OperatingEvent::Bored,
                "sample {i}"
            );
        }

        let heating = TelemetrySnapshot::default().with_tool(40.0, 200.0);
        assert_eq!(classifier.update(heating, at(400)), OperatingEvent::Heating);
    }

    #[test]
    fn test_bored_turns_to_sleep() {
        let config = ClassifierConfig {
            bored_timeout: Duration::from_secs(10),
            sleep_timeout: Duration::from_secs(20),
            ..ClassifierConfig::default()
        };
        let mut classifier = StateClassifier::new(config, at(0));
        classifier.update(ambient(), at(1));
        assert_eq!(classifier.tick(at(9)), OperatingEvent::Idle);
        assert_eq!(classifier.tick(at(10)), OperatingEvent::Bored);
        assert_eq!(classifier.tick(at(29)), OperatingEvent::Bored);
        assert_eq!(classifier.tick(at(30)), OperatingEvent::Sleep);
        assert_eq!(classifier.tick(at(5_000)), OperatingEvent::Sleep);

        classifier.reset(at(5_001));
        assert_eq!(classifier.current(), OperatingEvent::Idle);
        assert_eq!(classifier.tick(at(5_002)), OperatingEvent::Idle);
    }

    #[test]
    fn test_force_event_restarts_timer() {
        let mut classifier = StateClassifier::new(ClassifierConfig::default(), at(0));
        classifier.force(OperatingEvent::Bored, at(50));
        assert_eq!(classifier.current(), OperatingEvent::Bored);
        assert_eq!(classifier.time_in_state(at(60)), Duration::from_secs(10));
    }
}
