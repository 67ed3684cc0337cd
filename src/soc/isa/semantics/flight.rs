//! Flight-domain instructions. These operate on whichever registers their
//! operands name; [`roles`] records the conventional assignment programs use.

use std::fmt;

use super::{ExecutionContext, Flow, SemanticResult};

/// Conventional register roles for flight programs.
pub mod roles {
    pub const ALTITUDE: u8 = 1;
    pub const VELOCITY: u8 = 2;
    pub const OXIDIZER: u8 = 3;
    pub const FUEL: u8 = 4;
    pub const STATUS: u8 = 5;
}

/// Status codes written to the status register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum FlightStatus {
    #[default]
    Idle = 0,
    Ignited = 1,
    Launched = 2,
    ParachuteDeployed = 3,
    Landed = 4,
    Aborted = 5,
}

impl FlightStatus {
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl TryFrom<i32> for FlightStatus {
    type Error = i32;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(FlightStatus::Idle),
            1 => Ok(FlightStatus::Ignited),
            2 => Ok(FlightStatus::Launched),
            3 => Ok(FlightStatus::ParachuteDeployed),
            4 => Ok(FlightStatus::Landed),
            5 => Ok(FlightStatus::Aborted),
            other => Err(other),
        }
    }
}

impl fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FlightStatus::Idle => "idle",
            FlightStatus::Ignited => "ignited",
            FlightStatus::Launched => "launched",
            FlightStatus::ParachuteDeployed => "parachute deployed",
            FlightStatus::Landed => "landed",
            FlightStatus::Aborted => "aborted",
        };
        f.write_str(label)
    }
}

/// `IGNITE $rt`
pub fn ignite(ctx: &mut ExecutionContext<'_>) -> SemanticResult {
    ctx.write_operand(0, FlightStatus::Ignited.code());
    ctx.notify("Rocket ignited. STATUS set to 1");
    Ok(Flow::Continue)
}

/// `THRUST $status,$alt,$fuel`: altitude grows by fuel only while ignited.
pub fn thrust(ctx: &mut ExecutionContext<'_>) -> SemanticResult {
    if ctx.read_operand(0) != FlightStatus::Ignited.code() {
        return Ok(Flow::Continue);
    }
    let altitude = ctx.read_operand(1);
    let fuel = ctx.read_operand(2);
    let raised = ctx.add(altitude, fuel).value;
    ctx.write_operand(1, raised);
    ctx.notify(&format!("Thrust applied. ALTITUDE increased to {raised}"));
    Ok(Flow::Continue)
}

/// `LAUNCH $rt`: ignited rockets move to launched, anything else is untouched.
pub fn launch(ctx: &mut ExecutionContext<'_>) -> SemanticResult {
    if ctx.read_operand(0) != FlightStatus::Ignited.code() {
        return Ok(Flow::Continue);
    }
    ctx.write_operand(0, FlightStatus::Launched.code());
    ctx.notify("Rocket launched. STATUS set to 2");
    Ok(Flow::Continue)
}

/// `PARACHUTE $status,$vel`: velocity becomes `-(|vel| / 4)`.
///
/// Status is written before velocity is read, so naming the same register
/// twice yields a velocity of zero.
pub fn parachute(ctx: &mut ExecutionContext<'_>) -> SemanticResult {
    ctx.write_operand(0, FlightStatus::ParachuteDeployed.code());
    let velocity = ctx.read_operand(1);
    let reduced = (velocity.wrapping_abs() / 4).wrapping_neg();
    ctx.write_operand(1, reduced);
    ctx.notify(&format!("Parachute deployed. Velocity reduced to {reduced}"));
    Ok(Flow::Continue)
}

/// `LAND $status,$alt,$vel`
pub fn land(ctx: &mut ExecutionContext<'_>) -> SemanticResult {
    ctx.write_operand(0, FlightStatus::Landed.code());
    ctx.write_operand(2, 0);
    ctx.write_operand(1, 0);
    ctx.notify("Rocket landed. Status set to 4, velocity and altitude are 0.");
    Ok(Flow::Continue)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::Fixture;
    use super::roles::{ALTITUDE, FUEL, STATUS, VELOCITY};
    use super::*;
    use crate::soc::isa::machine::Opcode;

    const S: i32 = STATUS as i32;
    const A: i32 = ALTITUDE as i32;
    const V: i32 = VELOCITY as i32;
    const F: i32 = FUEL as i32;

    #[test]
    fn ignite_sets_status_and_notifies() {
        let mut fx = Fixture::new();
        assert_eq!(fx.run(Opcode::Ignite, &[S]), Ok(Flow::Continue));
        assert_eq!(fx.registers.read(STATUS), 1);
        assert_eq!(fx.lines(), vec!["Rocket ignited. STATUS set to 1"]);
    }

    #[test]
    fn ignite_overwrites_any_prior_status() {
        for prior in [4, 5, -1, 1] {
            let mut fx = Fixture::new();
            fx.registers.write(STATUS, prior);
            assert_eq!(fx.run(Opcode::Ignite, &[S]), Ok(Flow::Continue));
            assert_eq!(fx.registers.read(STATUS), 1, "from {prior}");
            assert_eq!(fx.lines(), vec!["Rocket ignited. STATUS set to 1"]);
        }
    }

    #[test]
    fn thrust_requires_ignition() {
        let mut fx = Fixture::new();
        fx.registers.write(ALTITUDE, 100);
        fx.registers.write(FUEL, 25);
        assert_eq!(fx.run(Opcode::Thrust, &[S, A, F]), Ok(Flow::Continue));
        assert_eq!(fx.registers.read(ALTITUDE), 100, "idle rocket stays put");
        assert!(fx.lines().is_empty(), "no-op is silent");

        fx.registers.write(STATUS, 1);
        assert_eq!(fx.run(Opcode::Thrust, &[S, A, F]), Ok(Flow::Continue));
        assert_eq!(fx.registers.read(ALTITUDE), 125);
        assert_eq!(fx.registers.read(FUEL), 25, "fuel is not consumed");
        assert_eq!(fx.lines(), vec!["Thrust applied. ALTITUDE increased to 125"]);
    }

    #[test]
    fn thrust_wraps_altitude() {
        let mut fx = Fixture::new();
        fx.registers.write(STATUS, 1);
        fx.registers.write(ALTITUDE, i32::MAX);
        fx.registers.write(FUEL, 1);
        assert_eq!(fx.run(Opcode::Thrust, &[S, A, F]), Ok(Flow::Continue));
        assert_eq!(fx.registers.read(ALTITUDE), i32::MIN);
    }

    #[test]
    fn launch_only_from_ignited() {
        let mut fx = Fixture::new();
        for status in [0, 2, 3, 4, 5, -1] {
            fx.registers.write(STATUS, status);
            assert_eq!(fx.run(Opcode::Launch, &[S]), Ok(Flow::Continue));
            assert_eq!(fx.registers.read(STATUS), status, "status {status} unchanged");
        }
        assert!(fx.lines().is_empty());

        fx.registers.write(STATUS, 1);
        assert_eq!(fx.run(Opcode::Launch, &[S]), Ok(Flow::Continue));
        assert_eq!(fx.registers.flight_status(STATUS), Some(FlightStatus::Launched));
        assert_eq!(fx.lines(), vec!["Rocket launched. STATUS set to 2"]);
    }

    #[test]
    fn parachute_reduces_velocity_magnitude() {
        let mut fx = Fixture::new();
        for (velocity, reduced) in [(100, -25), (-100, -25), (3, 0), (-7, -1)] {
            fx.registers.write(VELOCITY, velocity);
            assert_eq!(fx.run(Opcode::Parachute, &[S, V]), Ok(Flow::Continue));
            assert_eq!(fx.registers.read(VELOCITY), reduced, "from {velocity}");
            assert_eq!(fx.registers.read(STATUS), 3);
        }
        assert_eq!(
            fx.lines().first().map(String::as_str),
            Some("Parachute deployed. Velocity reduced to -25")
        );
    }

    #[test]
    fn parachute_handles_extreme_velocity() {
        let mut fx = Fixture::new();
        fx.registers.write(VELOCITY, i32::MIN);
        assert_eq!(fx.run(Opcode::Parachute, &[S, V]), Ok(Flow::Continue));
        assert_eq!(fx.registers.read(VELOCITY), 536_870_912);
    }

    #[test]
    fn parachute_on_shared_register_sees_new_status() {
        let mut fx = Fixture::new();
        fx.registers.write(STATUS, 400);
        assert_eq!(fx.run(Opcode::Parachute, &[S, S]), Ok(Flow::Continue));
        assert_eq!(fx.registers.read(STATUS), 0, "-(3 / 4)");
    }

    #[test]
    fn land_zeroes_motion() {
        let mut fx = Fixture::new();
        fx.registers.write(STATUS, 3);
        fx.registers.write(ALTITUDE, 900);
        fx.registers.write(VELOCITY, -25);
        assert_eq!(fx.run(Opcode::Land, &[S, A, V]), Ok(Flow::Continue));
        assert_eq!(fx.registers.read(STATUS), 4);
        assert_eq!(fx.registers.read(ALTITUDE), 0);
        assert_eq!(fx.registers.read(VELOCITY), 0);
        assert_eq!(
            fx.lines(),
            vec!["Rocket landed. Status set to 4, velocity and altitude are 0."]
        );
    }

    #[test]
    fn status_codes_round_trip() {
        assert_eq!(FlightStatus::try_from(3), Ok(FlightStatus::ParachuteDeployed));
        assert_eq!(FlightStatus::try_from(5), Ok(FlightStatus::Aborted));
        assert_eq!(FlightStatus::try_from(9), Err(9));
        assert_eq!(FlightStatus::default().code(), 0);
        assert_eq!(FlightStatus::Landed.to_string(), "landed");
    }
}
