//! 关节空间运动生成器
//!
//! 每个关节一条双 S 轨迹，7 个关节同步到公共完成时刻。
//! 支持途经点队列（带混合速度）与运行中重定目标。
//!
//! # 每周期流程
//!
//! 1. 推进内部时钟一个周期
//! 2. 偏离检测：实测位置对比上周期指令，超差则自动转 Aborted
//! 3. 采样各关节轨迹，叠加有界的漂移补偿项
//! 4. 到达规划终点后做实测收敛检查，宽限期内未收敛亦转 Aborted
//!
//! 所有规划（含全部途经点分段）在 `start()` 时一次完成，
//! 稳态 `step()` 不分配内存。

use std::time::Duration;

use crate::limits::{JointLimits, SpeedFactor, SpeedOverride};
use crate::profile::{DofProfile, map_plan_error, synchronize};
use crate::types::joint::DOF;
use crate::types::{
    AbortReason, Joint, JointArray, JointPositions, MotionError, Rad, RobotState,
};

use super::{GeneratorPhase, Lifecycle, MotionGenerator, START_REST_TOLERANCE, Step};

/// 关节空间途经点
///
/// 进入运行中的规划后不可变更。
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JointWaypoint {
    /// 目标关节位置
    pub target: JointPositions,
    /// 经过该点时的混合速度（rad/s）；`None` 表示到点停稳
    pub blend_velocity: Option<JointArray<f64>>,
    /// 该段的限制覆盖因子
    pub speed: SpeedOverride,
}

impl JointWaypoint {
    /// 到点停稳的普通途经点
    pub fn new(target: JointPositions) -> Self {
        JointWaypoint {
            target,
            blend_velocity: None,
            speed: SpeedOverride::default(),
        }
    }

    /// 设置混合速度（不停稳，以给定速度穿过该点）
    pub fn with_blend_velocity(mut self, velocity: JointArray<f64>) -> Self {
        self.blend_velocity = Some(velocity);
        self
    }

    /// 设置该段的限制覆盖因子
    pub fn with_speed(mut self, speed: SpeedOverride) -> Self {
        self.speed = speed;
        self
    }
}

/// 关节生成器配置
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JointGeneratorConfig {
    /// 偏离容差（rad）：实测与指令偏差超过此值即终止
    pub divergence_tolerance: f64,
    /// 收敛容差（rad）：到达终点后实测误差须小于此值才算完成
    pub settle_tolerance: f64,
    /// 收敛宽限期（周期数）：超过仍未收敛则按偏离终止
    pub settle_grace_cycles: u32,
    /// 漂移补偿增益（每周期向实测位置靠拢的比例，0 关闭）
    pub drift_gain: f64,
    /// 单周期漂移补偿上限（rad）
    pub max_drift_correction: f64,
}

impl Default for JointGeneratorConfig {
    fn default() -> Self {
        JointGeneratorConfig {
            divergence_tolerance: 0.05,
            settle_tolerance: 1e-3,
            settle_grace_cycles: 100,
            drift_gain: 0.1,
            max_drift_correction: 1e-3,
        }
    }
}

/// 关节指令（每周期下发）
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JointCommand {
    /// 指令位置
    pub position: JointPositions,
    /// 指令速度（rad/s）
    pub velocity: JointArray<f64>,
}

impl JointCommand {
    /// 在给定位置的零速保持指令
    fn hold_at(position: JointPositions) -> Self {
        JointCommand {
            position,
            velocity: JointArray::splat(0.0),
        }
    }
}

/// 一段同步轨迹（两个途经点之间）
#[derive(Debug, Clone)]
struct Leg {
    profiles: Vec<DofProfile>,
    /// 在整条运动上的起始时刻
    t_start: f64,
    duration: f64,
}

impl Leg {
    fn end_boundary(&self) -> ([f64; DOF], [f64; DOF]) {
        let mut pos = [0.0; DOF];
        let mut vel = [0.0; DOF];
        for i in 0..DOF {
            pos[i] = self.profiles[i].end_position();
            vel[i] = self.profiles[i].end_velocity();
        }
        (pos, vel)
    }
}

/// 关节空间运动生成器
///
/// 生命周期见 [`super`] 模块文档；实例单次使用。
#[derive(Debug)]
pub struct JointMotionGenerator {
    waypoints: Vec<JointWaypoint>,
    limits: JointLimits,
    speed_factor: SpeedFactor,
    config: JointGeneratorConfig,

    lifecycle: Lifecycle,
    legs: Vec<Leg>,
    current_leg: usize,
    /// start() 时捕获的锚点状态
    anchor: Option<RobotState>,
    /// 最后一段的终点（整条运动的目标）
    final_target: JointPositions,
    /// 上周期指令（偏离检测基准 + 保持指令锚点）
    last_command: JointCommand,
    settle_count: u32,
}

impl JointMotionGenerator {
    /// 创建生成器（构造即校验途经点）
    ///
    /// # 错误
    ///
    /// - [`MotionError::InvalidTarget`]：途经点为空或包含非有限值
    pub fn new(
        waypoints: Vec<JointWaypoint>,
        limits: JointLimits,
        speed_factor: SpeedFactor,
        config: JointGeneratorConfig,
    ) -> Result<Self, MotionError> {
        if waypoints.is_empty() {
            return Err(MotionError::InvalidTarget {
                reason: "waypoint list is empty".to_string(),
            });
        }
        for (index, wp) in waypoints.iter().enumerate() {
            if wp.target.iter().any(|r| !r.is_finite()) {
                return Err(MotionError::InvalidTarget {
                    reason: format!("waypoint {index} contains non-finite joint position"),
                });
            }
            if let Some(blend) = &wp.blend_velocity {
                if blend.iter().any(|v| !v.is_finite()) {
                    return Err(MotionError::InvalidTarget {
                        reason: format!("waypoint {index} contains non-finite blend velocity"),
                    });
                }
            }
        }

        let final_target = waypoints.last().expect("non-empty").target;
        Ok(JointMotionGenerator {
            waypoints,
            limits,
            speed_factor,
            config,
            lifecycle: Lifecycle::new(),
            legs: Vec::new(),
            current_leg: 0,
            anchor: None,
            final_target,
            last_command: JointCommand::hold_at(JointArray::splat(Rad::ZERO)),
            settle_count: 0,
        })
    }

    /// 单目标运动的便捷构造
    pub fn to_target(
        target: JointPositions,
        limits: JointLimits,
        speed_factor: SpeedFactor,
    ) -> Result<Self, MotionError> {
        JointMotionGenerator::new(
            vec![JointWaypoint::new(target)],
            limits,
            speed_factor,
            JointGeneratorConfig::default(),
        )
    }

    /// 规划整条运动的分段轨迹，段间边界速度接续
    fn plan_legs(
        &self,
        mut from_pos: [f64; DOF],
        mut from_vel: [f64; DOF],
        t0: f64,
        waypoints: &[JointWaypoint],
    ) -> Result<Vec<Leg>, MotionError> {
        let mut legs = Vec::with_capacity(waypoints.len());
        let mut t_start = t0;

        for wp in waypoints {
            let mut profiles = Vec::with_capacity(DOF);
            let mut leg_limits = Vec::with_capacity(DOF);
            for joint in Joint::ALL {
                let i = joint.index();
                let lim = self
                    .limits
                    .joint(joint)
                    .scaled(self.speed_factor.value())
                    .scaled_by(wp.speed);
                let blend = wp.blend_velocity.as_ref().map_or(0.0, |b| b[i]);
                let profile =
                    DofProfile::plan(from_pos[i], wp.target[i].0, from_vel[i], blend, &lim)
                        .map_err(|e| map_plan_error(e, joint.name()))?;
                profiles.push(profile);
                leg_limits.push(lim);
            }
            let duration = synchronize(&mut profiles, &leg_limits);

            let leg = Leg {
                profiles,
                t_start,
                duration,
            };
            let (pos, vel) = leg.end_boundary();
            from_pos = pos;
            from_vel = vel;
            t_start += duration;
            legs.push(leg);
        }

        Ok(legs)
    }

    /// 运行中替换剩余途经点（在线重规划）
    ///
    /// 新轨迹以当前采样到的位置与速度为边界条件，
    /// 拼接点速度连续。规划失败时旧轨迹原样保留。
    pub fn retarget(&mut self, waypoints: Vec<JointWaypoint>) -> Result<(), MotionError> {
        if self.lifecycle.phase() != GeneratorPhase::Running {
            return Err(MotionError::NotRunning {
                phase: self.lifecycle.phase().name().to_string(),
            });
        }
        if waypoints.is_empty() {
            return Err(MotionError::InvalidTarget {
                reason: "waypoint list is empty".to_string(),
            });
        }

        let t = self.lifecycle.elapsed();
        let (pos, vel) = self.sample_boundary(t);
        let legs = self.plan_legs(pos, vel, t, &waypoints)?;

        // 原子替换：失败在此之前已经返回
        self.final_target = waypoints.last().expect("non-empty").target;
        self.waypoints = waypoints;
        self.legs = legs;
        self.current_leg = 0;
        self.settle_count = 0;
        tracing::debug!(elapsed = t, "joint motion re-planned in flight");
        Ok(())
    }

    /// start() 时捕获的锚点状态
    pub fn anchor(&self) -> Option<&RobotState> {
        self.anchor.as_ref()
    }

    /// 总规划时长（秒）；start() 之前为 0
    pub fn planned_duration(&self) -> f64 {
        self.legs
            .last()
            .map(|l| l.t_start + l.duration)
            .unwrap_or(0.0)
    }

    /// 当前轨迹在时刻 t 的 (位置, 速度) 边界
    fn sample_boundary(&self, t: f64) -> ([f64; DOF], [f64; DOF]) {
        let mut pos = [0.0; DOF];
        let mut vel = [0.0; DOF];
        let leg = self.leg_at(t);
        let t_local = t - leg.t_start;
        for i in 0..DOF {
            let s = leg.profiles[i].sample(t_local);
            pos[i] = s.position;
            vel[i] = s.velocity;
        }
        (pos, vel)
    }

    fn leg_at(&self, t: f64) -> &Leg {
        let mut index = self.current_leg;
        while index + 1 < self.legs.len()
            && t >= self.legs[index].t_start + self.legs[index].duration
        {
            index += 1;
        }
        &self.legs[index]
    }

    /// 偏离检测：返回超差最大的关节
    fn check_divergence(&self, robot_state: &RobotState) -> Option<(Joint, f64)> {
        let mut worst: Option<(Joint, f64)> = None;
        for joint in Joint::ALL {
            let err = (robot_state.joint_pos[joint] - self.last_command.position[joint])
                .abs()
                .0;
            if err > self.config.divergence_tolerance
                && worst.map_or(true, |(_, w)| err > w)
            {
                worst = Some((joint, err));
            }
        }
        worst
    }

    /// 终止并产出欠发的保持指令（偏离路径）
    fn abort_with_hold(&mut self, reason: AbortReason) -> Step<JointCommand> {
        self.lifecycle.abort(reason);
        // 本周期返回的保持指令即为欠发的那一条
        self.lifecycle.take_pending_hold();
        Step {
            command: JointCommand::hold_at(self.last_command.position),
            finished: true,
        }
    }
}

impl MotionGenerator for JointMotionGenerator {
    type Command = JointCommand;

    fn start(&mut self, robot_state: &RobotState) -> Result<(), MotionError> {
        if self.lifecycle.phase() != GeneratorPhase::Idle {
            return Err(MotionError::AlreadyStarted {
                phase: self.lifecycle.phase().name().to_string(),
            });
        }
        if robot_state.joint_pos.iter().any(|r| !r.is_finite()) {
            return Err(MotionError::InvalidTarget {
                reason: "measured joint positions contain non-finite values".to_string(),
            });
        }
        if robot_state
            .joint_vel
            .iter()
            .any(|v| v.abs() > START_REST_TOLERANCE)
        {
            return Err(MotionError::InvalidTarget {
                reason: "robot is not at rest at start()".to_string(),
            });
        }

        let mut pos = [0.0; DOF];
        for i in 0..DOF {
            pos[i] = robot_state.joint_pos[i].0;
        }
        let legs = self.plan_legs(pos, [0.0; DOF], 0.0, &self.waypoints)?;

        self.legs = legs;
        self.current_leg = 0;
        self.anchor = Some(*robot_state);
        self.last_command = JointCommand::hold_at(robot_state.joint_pos);
        self.lifecycle.begin()?;
        tracing::debug!(
            duration = self.planned_duration(),
            legs = self.legs.len(),
            "joint motion started"
        );
        Ok(())
    }

    fn step(
        &mut self,
        period: Duration,
        robot_state: &RobotState,
    ) -> Result<Step<JointCommand>, MotionError> {
        let phase = self.lifecycle.phase();
        if phase != GeneratorPhase::Running {
            // abort 后欠发的唯一一条零速保持指令
            if phase == GeneratorPhase::Aborted && self.lifecycle.take_pending_hold() {
                return Ok(Step {
                    command: JointCommand::hold_at(self.last_command.position),
                    finished: true,
                });
            }
            return Err(self.lifecycle.step_rejection());
        }

        let t = self.lifecycle.advance(period.as_secs_f64());

        // 偏离检测（对比上周期指令）
        if let Some((joint, err)) = self.check_divergence(robot_state) {
            return Ok(self.abort_with_hold(AbortReason::Diverged {
                axis: joint.name().to_string(),
                error: err,
                tolerance: self.config.divergence_tolerance,
            }));
        }

        // 途经点推进
        while self.current_leg + 1 < self.legs.len() {
            let leg = &self.legs[self.current_leg];
            if t < leg.t_start + leg.duration {
                break;
            }
            self.current_leg += 1;
        }

        let total = self.planned_duration();
        if t >= total {
            // 规划终点：实测收敛检查（宽限期内保持在目标上）
            let settled = Joint::ALL.iter().all(|&j| {
                (robot_state.joint_pos[j] - self.final_target[j]).abs().0
                    <= self.config.settle_tolerance
            });
            let command = JointCommand::hold_at(self.final_target);

            if settled {
                self.lifecycle.finish();
                self.last_command = command;
                tracing::debug!(elapsed = t, "joint motion finished");
                return Ok(Step {
                    command,
                    finished: true,
                });
            }

            self.settle_count += 1;
            if self.settle_count > self.config.settle_grace_cycles {
                let (joint, err) = Joint::ALL
                    .iter()
                    .map(|&j| {
                        (j, (robot_state.joint_pos[j] - self.final_target[j]).abs().0)
                    })
                    .max_by(|a, b| a.1.total_cmp(&b.1))
                    .expect("seven joints");
                return Ok(self.abort_with_hold(AbortReason::Diverged {
                    axis: joint.name().to_string(),
                    error: err,
                    tolerance: self.config.settle_tolerance,
                }));
            }

            self.last_command = command;
            return Ok(Step {
                command,
                finished: false,
            });
        }

        // 轨迹采样 + 有界漂移补偿
        let leg = &self.legs[self.current_leg];
        let t_local = t - leg.t_start;
        let mut position = JointArray::splat(Rad::ZERO);
        let mut velocity = JointArray::splat(0.0);
        for joint in Joint::ALL {
            let i = joint.index();
            let s = leg.profiles[i].sample(t_local);
            let drift = robot_state.joint_pos[joint].0 - s.position;
            let correction = (drift * self.config.drift_gain).clamp(
                -self.config.max_drift_correction,
                self.config.max_drift_correction,
            );
            position[joint] = Rad(s.position + correction);
            velocity[joint] = s.velocity;
        }

        let command = JointCommand { position, velocity };
        self.last_command = command;
        Ok(Step {
            command,
            finished: false,
        })
    }

    fn abort(&mut self, reason: &str) {
        self.lifecycle.abort(AbortReason::External {
            reason: reason.to_string(),
        });
    }

    fn phase(&self) -> GeneratorPhase {
        self.lifecycle.phase()
    }

    fn abort_reason(&self) -> Option<&AbortReason> {
        self.lifecycle.abort_reason()
    }
}
