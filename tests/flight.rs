use hex_literal::hex;

use rocketemu::soc::core::{DATA_BASE, ExecutionHarness, StopReason, TEXT_BASE};
use rocketemu::soc::isa::{BufferedSink, FaultKind, FlightStatus, roles};

// Little-endian words:
//   COMBUST   $4,$0,50
//   IGNITE    $5
//   THRUST    $5,$1,$4
//   LAUNCH    $5
//   COMBUST   $2,$0,-40
//   PARACHUTE $5,$2
//   STOREFUEL $1,4($28)
//   LAND      $5,$1,$2
//   LOADFUEL  $6,4($28)
const MISSION: [u8; 36] = hex!(
    "32000420 0128007c 0220a17c 0328007c d8ff0220"
    "0400a27c 040081af 0510a17c 0400868f"
);

fn mission_harness() -> (ExecutionHarness, BufferedSink) {
    let sink = BufferedSink::new();
    let mut harness = ExecutionHarness::rocket(Box::new(sink.clone())).expect("construct harness");
    harness
        .write("$28", DATA_BASE as i32)
        .expect("seed data pointer");
    harness.load_image(&MISSION).expect("load mission image");
    (harness, sink)
}

#[test]
fn full_mission_runs_to_landing() {
    let (mut harness, sink) = mission_harness();
    let summary = harness.run(64);
    assert!(summary.completed(), "mission stopped early: {:?}", summary.stop);
    assert_eq!(summary.steps, 9);
    assert_eq!(harness.pc(), TEXT_BASE + 36);

    assert_eq!(
        sink.lines(),
        vec![
            "Rocket ignited. STATUS set to 1",
            "Thrust applied. ALTITUDE increased to 50",
            "Rocket launched. STATUS set to 2",
            "Parachute deployed. Velocity reduced to -10",
            "Rocket landed. Status set to 4, velocity and altitude are 0.",
        ]
    );

    let registers = harness.state().registers();
    assert_eq!(
        registers.flight_status(roles::STATUS),
        Some(FlightStatus::Landed)
    );
    assert_eq!(registers.read(roles::ALTITUDE), 0);
    assert_eq!(registers.read(roles::VELOCITY), 0);
    assert_eq!(registers.read(roles::FUEL), 50, "fuel is never consumed");
    assert_eq!(registers.read(6), 50, "altitude logged before landing");
    assert_eq!(
        harness
            .state()
            .memory()
            .load_word(DATA_BASE + 4)
            .expect("telemetry word"),
        50
    );
}

#[test]
fn stepping_reports_each_statement() {
    let (mut harness, _) = mission_harness();
    let first = harness.step().expect("first step");
    assert_eq!(first.address, TEXT_BASE);
    assert_eq!(first.word, 0x2004_0032);
    assert_eq!(first.mnemonic, "COMBUST");
    assert_eq!(first.statement, "COMBUST $4,$0,50");

    let second = harness.step().expect("second step");
    assert_eq!(second.statement, "IGNITE $5");
    assert_eq!(harness.read("$stat").expect("status"), 1);
}

#[test]
fn telemetry_store_faults_without_data_pointer() {
    let sink = BufferedSink::new();
    let mut harness = ExecutionHarness::rocket(Box::new(sink.clone())).expect("construct harness");
    harness.load_image(&MISSION).expect("load mission image");
    let summary = harness.run(64);
    assert_eq!(summary.steps, 6, "faults on the seventh statement");
    let fault = summary.fault().expect("address fault");
    assert!(matches!(fault.kind, FaultKind::Address(_)), "{fault}");
    assert_eq!(fault.cause_code(), 4);
    assert_eq!(fault.statement, "STOREFUEL $1,4($28)");
    assert_eq!(harness.pc(), TEXT_BASE + 24);
    assert_eq!(sink.len(), 4, "notifications before the fault are kept");
}

#[test]
fn independent_harnesses_do_not_share_state() {
    let (mut first, first_sink) = mission_harness();
    let (second, second_sink) = mission_harness();
    assert!(first.run(64).completed());
    assert_eq!(first_sink.len(), 5);
    assert!(second_sink.is_empty());
    assert_eq!(second.read("$fuel").expect("fuel"), 0);
    assert!(
        matches!(
            second.state().memory().load_word(DATA_BASE + 4),
            Ok(0)
        ),
        "memory is per instance"
    );
}

#[test]
fn step_budget_is_respected() {
    let (mut harness, _) = mission_harness();
    let summary = harness.run(3);
    assert!(matches!(summary.stop, StopReason::StepLimit));
    assert_eq!(summary.steps, 3);
    assert_eq!(harness.read("$alt").expect("alt"), 50);
    assert_eq!(harness.read("$stat").expect("status"), 1, "not yet launched");
}
