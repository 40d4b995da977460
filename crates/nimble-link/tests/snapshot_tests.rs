//! Snapshot tests for link frame wire bytes.

use insta::assert_snapshot;
use nimble_link::{CommandFrame, FeedbackFrame};

#[test]
fn test_snapshot_air_in_at_full_extension() {
    let frame = CommandFrame {
        position: 1000,
        force: 0,
        activated: false,
        air_out: false,
        air_in: true,
    };
    assert_snapshot!(format!("{:02X?}", frame.encode()), @"[84, E8, 03, 00, 00, 6F, 01]");
}

#[test]
fn test_snapshot_idle_command() {
    assert_snapshot!(format!("{:02X?}", CommandFrame::idle().encode()), @"[80, 00, 00, C8, 00, 48, 01]");
}

#[test]
fn test_snapshot_full_retraction_max_force() {
    let frame = CommandFrame {
        position: -1000,
        force: 1023,
        activated: true,
        air_out: true,
        air_in: false,
    };
    assert_snapshot!(format!("{:02X?}", frame.encode()), @"[83, E8, 07, FF, 03, 74, 02]");
}

#[test]
fn test_snapshot_feedback_temp_limiting() {
    let frame = FeedbackFrame {
        position: -1,
        force: -1,
        activated: true,
        sensor_fault: false,
        temp_limiting: true,
    };
    assert_snapshot!(format!("{:02X?}", frame.encode()), @"[85, 01, 04, 01, 04, 8F, 00]");
}
