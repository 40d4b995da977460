//! End-to-End Controller Tests
//!
//! Drive the controller with TCode text and a simulated actuator, checking
//! what goes out over the link.

use std::sync::Arc;

use nimble_control::{ControlConfig, ControlResult, NimbleController, RingLed};
use nimble_link::{
    CommandFrame, FRAME_LEN, IDLE_FORCE, LinkTransport, QueueTransport, SimulatedActuator,
    decode_frame,
};
use nimble_tcode::{ManualClock, MemoryCalibrationStore, MessageLog};

struct Harness<T: LinkTransport> {
    controller: NimbleController<T>,
    clock: ManualClock,
    log: MessageLog,
}

fn harness<T: LinkTransport>(transport: T, config: ControlConfig) -> ControlResult<Harness<T>> {
    let clock = ManualClock::new(10_000);
    let log = MessageLog::new();
    let mut controller = NimbleController::new(
        config,
        Arc::new(clock.clone()),
        Box::new(log.clone()),
        Box::new(MemoryCalibrationStore::new()),
        transport,
    )?;
    controller.init()?;
    // Let the start-up ramps finish.
    clock.advance(200);
    Ok(Harness {
        controller,
        clock,
        log,
    })
}

impl<T: LinkTransport> Harness<T> {
    fn run_ticks(&mut self, count: usize) -> ControlResult<Vec<CommandFrame>> {
        let mut sent = Vec::with_capacity(count);
        for _ in 0..count {
            self.clock.advance(2);
            sent.push(self.controller.tick()?.sent);
        }
        Ok(sent)
    }
}

mod motion {
    use super::*;

    #[test]
    fn test_stroke_command_ramps_out_through_slew() -> ControlResult<()> {
        let mut h = harness(SimulatedActuator::new(1000), ControlConfig::default())?;
        h.controller.input_line("L00000I100");
        let sent = h.run_ticks(60)?;

        for pair in sent.windows(2) {
            if let [a, b] = pair {
                assert!((a.position - b.position).abs() <= 50);
            }
        }
        assert_eq!(sent.last().map(|f| f.position), Some(-1000));
        assert_eq!(h.controller.frame_state().target, -1000);
        Ok(())
    }

    #[test]
    fn test_vibration_overlays_held_stroke() -> ControlResult<()> {
        let mut h = harness(SimulatedActuator::new(1000), ControlConfig::default())?;
        h.controller.input_line("V09999");
        h.clock.advance(200);
        let sent = h.run_ticks(25)?;

        let min = sent.iter().map(|f| f.position).min();
        let max = sent.iter().map(|f| f.position).max();
        assert_eq!(min, Some(-25));
        assert_eq!(max, Some(25));
        Ok(())
    }

    #[test]
    fn test_air_and_force_axes() -> ControlResult<()> {
        let mut h = harness(QueueTransport::new(), ControlConfig::default())?;
        h.controller.input_line("A09999 A10000");
        h.clock.advance(200);
        let sent = h.run_ticks(1)?;
        assert_eq!(sent.first().map(|f| (f.air_in, f.air_out, f.force)), Some((true, false, 0)));

        h.controller.input_line("A00000");
        h.clock.advance(200);
        let sent = h.run_ticks(1)?;
        assert_eq!(sent.first().map(|f| (f.air_in, f.air_out)), Some((false, true)));
        Ok(())
    }
}

mod run_state {
    use super::*;

    #[test]
    fn test_device_stop_token_freezes_but_keeps_running() -> ControlResult<()> {
        let mut h = harness(QueueTransport::new(), ControlConfig::default())?;
        h.controller.input_line("L09999I1000");
        h.clock.advance(500);
        h.controller.input_line("DS");
        let frozen = h.controller.sample_axes().stroke;
        h.clock.advance(1000);
        assert_eq!(h.controller.sample_axes().stroke, frozen);
        assert!(h.controller.is_running());
        Ok(())
    }

    #[test]
    fn test_stop_sends_idle_frames_at_last_position() -> ControlResult<()> {
        let mut h = harness(QueueTransport::new(), ControlConfig::default())?;
        h.controller.input_line("L09999");
        h.clock.advance(200);
        let running = h.run_ticks(4)?;
        h.controller.stop();
        let stopped = h.run_ticks(3)?;

        let held = running.last().map(|f| f.position);
        for frame in stopped {
            assert_eq!(Some(frame.position), held);
            assert_eq!(frame.force, IDLE_FORCE);
            assert!(!frame.air_in && !frame.air_out);
        }
        Ok(())
    }

    #[test]
    fn test_wire_bytes_match_sent_frame() -> ControlResult<()> {
        let mut h = harness(QueueTransport::new(), ControlConfig::default())?;
        let sent = h.run_ticks(1)?;
        let bytes = h.controller.transport_mut().take_outbound();
        let window: [u8; FRAME_LEN] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| nimble_link::LinkError::Transport("short frame".into()))?;
        let raw = decode_frame(&window)?;
        assert_eq!(sent.first(), Some(&CommandFrame::from_raw(&raw)));
        Ok(())
    }
}

mod link {
    use super::*;

    #[test]
    fn test_silent_actuator_drops_presence() -> ControlResult<()> {
        let mut h = harness(SimulatedActuator::default(), ControlConfig::default())?;
        h.run_ticks(5)?;
        assert!(h.controller.actuator().is_present());
        assert_eq!(h.controller.indicators(true, false).actuator_link, 50);

        h.controller.transport_mut().set_silent(true);
        h.run_ticks(26)?;
        assert!(!h.controller.actuator().is_present());
        assert_eq!(h.controller.indicators(true, false).actuator_link, 0);

        h.controller.transport_mut().set_silent(false);
        let report = h.controller.tick()?;
        assert!(report.link_present);
        Ok(())
    }

    #[test]
    fn test_ring_shows_stroke_direction() -> ControlResult<()> {
        let mut h = harness(SimulatedActuator::new(1000), ControlConfig::default())?;
        h.controller.input_line("L00000");
        h.clock.advance(200);
        h.run_ticks(30)?;
        let leds = h.controller.indicators(true, false);
        assert_eq!(leds.ring_duty(RingLed::N), 75);
        assert_eq!(leds.ring_duty(RingLed::NE), 0);
        Ok(())
    }

    #[test]
    fn test_device_info_reaches_sink() -> ControlResult<()> {
        let mut h = harness(QueueTransport::new(), ControlConfig::default())?;
        h.controller.input_line("D0 D2");
        assert_eq!(
            h.log.joined(),
            "NimbleStroker_TCode_Serial_POC\n\
             L0 0 9999 Up\n\
             V0 0 9999 Vibe\n\
             A0 0 9999 Air\n\
             A1 0 9999 Force\n\
             A2 0 9999 VibeSpeed\n"
        );
        Ok(())
    }
}
