use tracing::{debug, info, instrument};

use crate::acquisition::common::error::Result;
use crate::acquisition::driver::{CameraDriver, SessionHandle, TriggerMode, registers};
use crate::acquisition::trigger::poll::{CancellationToken, PollPolicy, TriggerCondition};

/// Software trigger source number.
const SOFTWARE_SOURCE: u32 = 7;
/// GPIO0 input.
const HARDWARE_SOURCE: u32 = 0;
const RISING_EDGE: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    Software,
    Hardware,
}

impl TriggerKind {
    pub fn mode(self) -> TriggerMode {
        match self {
            TriggerKind::Software => TriggerMode {
                on_off: true,
                polarity: 0,
                source: SOFTWARE_SOURCE,
                mode: 0,
                parameter: 0,
            },
            TriggerKind::Hardware => TriggerMode {
                on_off: true,
                polarity: RISING_EDGE,
                source: HARDWARE_SOURCE,
                mode: 0,
                parameter: 0,
            },
        }
    }
}

/// Handshake between trigger requests and the camera's readiness register.
///
/// Each `fire_software` call requests exactly one exposure; nothing is queued here.
#[derive(Debug, Clone, Default)]
pub struct TriggerSynchronizer {
    policy: PollPolicy,
    cancel: Option<CancellationToken>,
    kind: Option<TriggerKind>,
}

impl TriggerSynchronizer {
    pub fn new(policy: PollPolicy) -> Self {
        Self {
            policy,
            cancel: None,
            kind: None,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn set_cancellation(&mut self, token: Option<CancellationToken>) {
        self.cancel = token;
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: PollPolicy) {
        self.policy = policy;
    }

    /// Trigger mode last pushed to the camera.
    pub fn kind(&self) -> Option<TriggerKind> {
        self.kind
    }

    pub fn enable_software<D: CameraDriver>(
        &mut self,
        driver: &mut D,
        session: SessionHandle,
    ) -> Result<()> {
        self.enable(driver, session, TriggerKind::Software)
    }

    pub fn enable_hardware<D: CameraDriver>(
        &mut self,
        driver: &mut D,
        session: SessionHandle,
    ) -> Result<()> {
        self.enable(driver, session, TriggerKind::Hardware)
    }

    pub fn enable<D: CameraDriver>(
        &mut self,
        driver: &mut D,
        session: SessionHandle,
        kind: TriggerKind,
    ) -> Result<()> {
        driver.set_trigger_mode(session, &kind.mode())?;
        info!(?kind, "Trigger mode enabled");
        self.kind = Some(kind);
        Ok(())
    }

    /// Waits for the busy bit to clear, then fires one software trigger.
    #[instrument(skip_all)]
    pub fn fire_software<D: CameraDriver>(
        &self,
        driver: &mut D,
        session: SessionHandle,
    ) -> Result<()> {
        let polls = self.policy.wait_until(
            TriggerCondition::SoftwareTriggerReady,
            self.cancel.as_ref(),
            || {
                let status = driver.read_register(session, registers::SOFTWARE_TRIGGER)?;
                Ok(status & registers::TRIGGER_BUSY == 0)
            },
        )?;
        driver.fire_software_trigger(session)?;
        debug!(polls, "Software trigger fired");
        Ok(())
    }

    /// Blocks until the camera reports it will accept an external trigger pulse.
    #[instrument(skip_all)]
    pub fn wait_hardware_armed<D: CameraDriver>(
        &self,
        driver: &mut D,
        session: SessionHandle,
    ) -> Result<()> {
        let polls = self.policy.wait_until(
            TriggerCondition::HardwareArmed,
            self.cancel.as_ref(),
            || {
                let status = driver.read_register(session, registers::SOFTWARE_TRIGGER)?;
                Ok(status & registers::TRIGGER_ARMED != 0)
            },
        )?;
        debug!(polls, "Camera armed for hardware trigger");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::acquisition::common::error::CameraError;
    use crate::acquisition::driver::SimulatedCamera;

    fn connected_camera() -> (SimulatedCamera, SessionHandle) {
        let mut camera = SimulatedCamera::new();
        let session = camera.create_session().unwrap();
        camera.connect(session, 0).unwrap();
        (camera, session)
    }

    fn short_policy() -> PollPolicy {
        PollPolicy::new(Duration::from_millis(30), Duration::from_millis(1))
    }

    #[test]
    fn test_modes_are_mutually_exclusive() {
        let (mut camera, session) = connected_camera();
        let mut sync = TriggerSynchronizer::default();

        sync.enable_software(&mut camera, session).unwrap();
        assert_eq!(camera.trigger_mode().map(|m| m.source), Some(SOFTWARE_SOURCE));

        sync.enable_hardware(&mut camera, session).unwrap();
        assert_eq!(sync.kind(), Some(TriggerKind::Hardware));
        assert_eq!(camera.trigger_mode().map(|m| m.source), Some(HARDWARE_SOURCE));
    }

    #[test]
    fn test_fire_waits_for_busy_bit() {
        let (mut camera, session) = connected_camera();
        camera.set_busy_reads(4);
        let sync = TriggerSynchronizer::default();

        sync.fire_software(&mut camera, session).unwrap();
        sync.fire_software(&mut camera, session).unwrap();

        assert_eq!(camera.triggers_fired(), 2);
        // each fire after the first had to wait out the busy window
        assert!(camera.trigger_status_reads() >= 5);
    }

    #[test]
    fn test_stuck_busy_bit_times_out_without_firing() {
        let (mut camera, session) = connected_camera();
        camera.set_trigger_stuck_busy(true);
        let sync = TriggerSynchronizer::new(short_policy());

        let result = sync.fire_software(&mut camera, session);

        assert!(matches!(
            result,
            Err(CameraError::TriggerTimeout {
                condition: TriggerCondition::SoftwareTriggerReady,
                ..
            })
        ));
        assert_eq!(camera.triggers_fired(), 0);
    }

    #[test]
    fn test_hardware_armed_after_delay() {
        let (mut camera, session) = connected_camera();
        camera.set_armed_after_reads(3);
        let mut sync = TriggerSynchronizer::new(short_policy());
        sync.enable_hardware(&mut camera, session).unwrap();

        sync.wait_hardware_armed(&mut camera, session).unwrap();
    }

    #[test]
    fn test_hardware_never_armed_times_out() {
        let (mut camera, session) = connected_camera();
        camera.set_armed_after_reads(u32::MAX);
        let sync = TriggerSynchronizer::new(short_policy());

        let result = sync.wait_hardware_armed(&mut camera, session);

        assert!(matches!(
            result,
            Err(CameraError::TriggerTimeout {
                condition: TriggerCondition::HardwareArmed,
                ..
            })
        ));
    }

    #[test]
    fn test_cancelled_token_aborts_fire() {
        let (mut camera, session) = connected_camera();
        let token = CancellationToken::new();
        token.cancel();
        let sync = TriggerSynchronizer::default().with_cancellation(token);

        let result = sync.fire_software(&mut camera, session);

        assert!(matches!(result, Err(CameraError::Cancelled { .. })));
        assert_eq!(camera.triggers_fired(), 0);
    }
}
