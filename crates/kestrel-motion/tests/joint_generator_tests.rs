//! 关节生成器生命周期集成测试
//!
//! 用"回声"模拟驱动层：每周期把上一条指令原样作为实测状态喂回，
//! 模拟完美跟踪的机器人。

use std::time::Duration;

use kestrel_motion::generator::{
    GeneratorPhase, JointGeneratorConfig, JointMotionGenerator, JointWaypoint, MotionGenerator,
};
use kestrel_motion::limits::{AxisLimits, JointLimits, SpeedFactor, SpeedOverride};
use kestrel_motion::types::{
    AbortReason, CartesianPose, Joint, JointArray, MotionError, Rad, RobotState,
};

const CYCLE: Duration = Duration::from_millis(1);

fn test_limits() -> JointLimits {
    JointLimits::uniform(AxisLimits::new(1.0, 2.0, 50.0).unwrap()).unwrap()
}

/// 回声驱动：实测状态 = 上一条指令
struct EchoRobot {
    state: RobotState,
}

impl EchoRobot {
    fn at(pos: JointArray<Rad>) -> Self {
        EchoRobot {
            state: RobotState::at_rest(pos, CartesianPose::IDENTITY),
        }
    }

    fn apply(&mut self, command: &kestrel_motion::generator::JointCommand) {
        self.state.joint_pos = command.position;
        self.state.joint_vel = command.velocity;
    }
}

fn target_j1(value: f64) -> JointArray<Rad> {
    let mut target = JointArray::splat(Rad::ZERO);
    target[Joint::J1] = Rad(value);
    target
}

#[test]
fn worked_example_single_joint() {
    // 基准算例：J1 从 0 到 0.5 rad，vmax=1，amax=2，周期 1ms
    let mut generator =
        JointMotionGenerator::to_target(target_j1(0.5), test_limits(), SpeedFactor::FULL).unwrap();
    let mut robot = EchoRobot::at(JointArray::splat(Rad::ZERO));

    generator.start(&robot.state).unwrap();
    let duration = generator.planned_duration();
    assert!(duration > 0.5 && duration < 2.0, "T = {duration}");

    let expected_steps = (duration / 0.001).ceil() as usize;

    let first = generator.step(CYCLE, &robot.state).unwrap();
    assert!(!first.finished);
    // t ≈ 0 时位置 ≈ 0
    assert!(first.command.position[Joint::J1].0.abs() < 1e-6);
    robot.apply(&first.command);

    let mut finished_at = 1;
    for i in 2..=expected_steps + 2 {
        let step = generator.step(CYCLE, &robot.state).unwrap();
        robot.apply(&step.command);
        if step.finished {
            finished_at = i;
            // 终点位置误差 < 1e-4
            assert!((step.command.position[Joint::J1].0 - 0.5).abs() < 1e-4);
            assert!(step.command.velocity[Joint::J1].abs() < 1e-6);
            break;
        }
    }

    // finished 恰好在第 ⌈T/cycle⌉ 步出现
    assert_eq!(finished_at, expected_steps);
    assert_eq!(generator.phase(), GeneratorPhase::Finished);
}

#[test]
fn finished_exactly_once_then_step_fails() {
    let mut generator =
        JointMotionGenerator::to_target(target_j1(0.1), test_limits(), SpeedFactor::FULL).unwrap();
    let mut robot = EchoRobot::at(JointArray::splat(Rad::ZERO));
    generator.start(&robot.state).unwrap();

    loop {
        let step = generator.step(CYCLE, &robot.state).unwrap();
        robot.apply(&step.command);
        if step.finished {
            break;
        }
    }

    let err = generator.step(CYCLE, &robot.state).unwrap_err();
    assert!(matches!(err, MotionError::TerminatedGenerator { .. }));
}

#[test]
fn multi_joint_synchronized_completion() {
    // 各关节位移差异很大，但必须同时完成
    let mut target = JointArray::splat(Rad::ZERO);
    target[Joint::J1] = Rad(1.2);
    target[Joint::J2] = Rad(-0.05);
    target[Joint::J4] = Rad(0.3);
    // J3/J5/J6/J7 零位移

    let mut generator =
        JointMotionGenerator::to_target(target, test_limits(), SpeedFactor::FULL).unwrap();
    let mut robot = EchoRobot::at(JointArray::splat(Rad::ZERO));
    generator.start(&robot.state).unwrap();

    let mut last = None;
    loop {
        let step = generator.step(CYCLE, &robot.state).unwrap();
        robot.apply(&step.command);
        let done = step.finished;
        last = Some(step);
        if done {
            break;
        }
    }

    // 完成那一步所有关节同时到位
    let last = last.unwrap();
    for joint in Joint::ALL {
        assert!(
            (last.command.position[joint] - target[joint]).abs().0 < 1e-6,
            "{joint} not at target on the finishing step"
        );
        assert!(last.command.velocity[joint].abs() < 1e-6);
    }
}

#[test]
fn commands_respect_limits_every_cycle() {
    let limits = test_limits();
    let mut target = JointArray::splat(Rad(0.4));
    target[Joint::J1] = Rad(-0.9);
    let mut generator =
        JointMotionGenerator::to_target(target, limits, SpeedFactor::new(0.5).unwrap()).unwrap();
    let mut robot = EchoRobot::at(JointArray::splat(Rad::ZERO));
    generator.start(&robot.state).unwrap();

    // speed_factor = 0.5：有效限速 0.5 rad/s、限加速度 1 rad/s²
    let dt = 0.001;
    let mut prev_vel = JointArray::splat(0.0f64);
    loop {
        let step = generator.step(CYCLE, &robot.state).unwrap();
        robot.apply(&step.command);
        for joint in Joint::ALL {
            let v = step.command.velocity[joint];
            assert!(v.abs() <= 0.5 * (1.0 + 1e-6), "velocity {v} over limit");
            let a = (v - prev_vel[joint]) / dt;
            assert!(a.abs() <= 1.0 * 1.05, "acceleration {a} over limit");
            prev_vel[joint] = v;
        }
        if step.finished {
            break;
        }
    }
}

#[test]
fn abort_produces_single_hold_then_fails() {
    let mut generator =
        JointMotionGenerator::to_target(target_j1(0.5), test_limits(), SpeedFactor::FULL).unwrap();
    let mut robot = EchoRobot::at(JointArray::splat(Rad::ZERO));
    generator.start(&robot.state).unwrap();

    // 运动一段时间后外部终止
    let mut last_position = JointArray::splat(Rad::ZERO);
    for _ in 0..200 {
        let step = generator.step(CYCLE, &robot.state).unwrap();
        last_position = step.command.position;
        robot.apply(&step.command);
    }
    generator.abort("safety reflex");
    assert_eq!(generator.phase(), GeneratorPhase::Aborted);

    // 恰好一条零速保持指令，位置为最后一条指令位置
    let hold = generator.step(CYCLE, &robot.state).unwrap();
    assert!(hold.finished);
    for joint in Joint::ALL {
        assert_eq!(hold.command.position[joint], last_position[joint]);
        assert_eq!(hold.command.velocity[joint], 0.0);
    }
    assert!(matches!(
        generator.abort_reason(),
        Some(AbortReason::External { .. })
    ));

    // 之后的 step() 一律报错
    let err = generator.step(CYCLE, &robot.state).unwrap_err();
    assert!(matches!(err, MotionError::TerminatedGenerator { .. }));
}

#[test]
fn divergence_aborts_with_hold() {
    let mut generator =
        JointMotionGenerator::to_target(target_j1(0.5), test_limits(), SpeedFactor::FULL).unwrap();
    let mut robot = EchoRobot::at(JointArray::splat(Rad::ZERO));
    generator.start(&robot.state).unwrap();

    for _ in 0..50 {
        let step = generator.step(CYCLE, &robot.state).unwrap();
        robot.apply(&step.command);
    }

    // 实测状态突然大幅偏离指令（如碰撞被挡住）
    robot.state.joint_pos[Joint::J1] += Rad(0.2);
    let step = generator.step(CYCLE, &robot.state).unwrap();
    assert!(step.finished);
    for joint in Joint::ALL {
        assert_eq!(step.command.velocity[joint], 0.0);
    }
    assert_eq!(generator.phase(), GeneratorPhase::Aborted);
    assert!(matches!(
        generator.abort_reason(),
        Some(AbortReason::Diverged { .. })
    ));
    assert!(generator.step(CYCLE, &robot.state).is_err());
}

#[test]
fn retarget_keeps_velocity_continuous() {
    let mut generator =
        JointMotionGenerator::to_target(target_j1(0.8), test_limits(), SpeedFactor::FULL).unwrap();
    let mut robot = EchoRobot::at(JointArray::splat(Rad::ZERO));
    generator.start(&robot.state).unwrap();

    let mut before = None;
    for _ in 0..300 {
        let step = generator.step(CYCLE, &robot.state).unwrap();
        robot.apply(&step.command);
        before = Some(step.command);
    }
    let before = before.unwrap();
    assert!(before.velocity[Joint::J1].abs() > 0.1, "should be moving");

    // 运行中改目标（包括反向目标）
    generator
        .retarget(vec![JointWaypoint::new(target_j1(-0.3))])
        .unwrap();

    let after = generator.step(CYCLE, &robot.state).unwrap();
    // 拼接点速度连续：一个周期内的变化不超过 amax·dt（含数值余量）
    let dv = (after.command.velocity[Joint::J1] - before.velocity[Joint::J1]).abs();
    assert!(dv <= 2.0 * 0.001 * 1.5 + 1e-9, "velocity jump {dv}");
    robot.apply(&after.command);

    // 新目标最终到达
    loop {
        let step = generator.step(CYCLE, &robot.state).unwrap();
        robot.apply(&step.command);
        if step.finished {
            assert!((step.command.position[Joint::J1].0 + 0.3).abs() < 1e-4);
            break;
        }
    }
}

#[test]
fn waypoint_queue_with_blend_velocity() {
    let mut blend = JointArray::splat(0.0f64);
    blend[Joint::J1] = 0.3;
    let waypoints = vec![
        JointWaypoint::new(target_j1(0.4)).with_blend_velocity(blend),
        JointWaypoint::new(target_j1(0.9)),
    ];
    let mut generator = JointMotionGenerator::new(
        waypoints,
        test_limits(),
        SpeedFactor::FULL,
        JointGeneratorConfig::default(),
    )
    .unwrap();
    let mut robot = EchoRobot::at(JointArray::splat(Rad::ZERO));
    generator.start(&robot.state).unwrap();

    let mut max_vel_at_waypoint: f64 = 0.0;
    let mut passed_waypoint = false;
    loop {
        let step = generator.step(CYCLE, &robot.state).unwrap();
        robot.apply(&step.command);
        let q = step.command.position[Joint::J1].0;
        if (q - 0.4).abs() < 5e-3 {
            passed_waypoint = true;
            max_vel_at_waypoint = max_vel_at_waypoint.max(step.command.velocity[Joint::J1]);
        }
        if step.finished {
            assert!((q - 0.9).abs() < 1e-4);
            break;
        }
    }
    assert!(passed_waypoint);
    // 混合速度生效：经过途经点时没有停稳
    assert!(
        max_vel_at_waypoint > 0.2,
        "blend velocity not honored: {max_vel_at_waypoint}"
    );
}

#[test]
fn per_waypoint_speed_override_slows_leg() {
    let full = JointMotionGenerator::new(
        vec![JointWaypoint::new(target_j1(0.5))],
        test_limits(),
        SpeedFactor::FULL,
        JointGeneratorConfig::default(),
    )
    .unwrap();
    let slow = JointMotionGenerator::new(
        vec![JointWaypoint::new(target_j1(0.5)).with_speed(SpeedOverride::uniform(0.3).unwrap())],
        test_limits(),
        SpeedFactor::FULL,
        JointGeneratorConfig::default(),
    )
    .unwrap();

    let robot = EchoRobot::at(JointArray::splat(Rad::ZERO));
    let mut full = full;
    let mut slow = slow;
    full.start(&robot.state).unwrap();
    slow.start(&robot.state).unwrap();
    assert!(slow.planned_duration() > full.planned_duration() * 1.5);
}

#[test]
fn retarget_rejected_when_not_running() {
    let mut generator =
        JointMotionGenerator::to_target(target_j1(0.2), test_limits(), SpeedFactor::FULL).unwrap();
    let err = generator
        .retarget(vec![JointWaypoint::new(target_j1(0.1))])
        .unwrap_err();
    assert!(matches!(err, MotionError::NotRunning { .. }));
}
