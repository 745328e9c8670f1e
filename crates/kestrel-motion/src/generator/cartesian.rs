//! 笛卡尔空间运动生成器
//!
//! 6 自由度位姿目标：平移沿规划时刻固定的方向轴走标量双 S 规律，
//! 姿态用同一归一化时间规律做球面插值（slerp，最短弧 ≤180°），
//! 两者没有独立时钟，必然同时完成。
//!
//! # 限制折算
//!
//! 旋转限制折算进主轨迹：有效限速 = min(平移限速, 旋转限速·d/θ)，
//! 加速度、加加速度同理。由此一条标量规律同时满足平移与旋转限制。
//! 纯旋转目标（d ≈ 0）直接以旋转角为主轴、用旋转限制规划。
//!
//! # 途经点与相对目标
//!
//! 目标可以是绝对位姿，也可以相对上一段终点位姿表达
//! （"在当前末端坐标系下前移 5cm"）。混合速度沿主轴给定，
//! 段间线速度投影接续。肘部冗余提示原样透传给指令。

use std::time::Duration;

use crate::limits::{AxisLimits, CartesianLimits, SpeedFactor, SpeedOverride};
use crate::profile::{DofProfile, EPS_VEL, map_plan_error};
use crate::types::{
    AbortReason, CartesianPose, CartesianVelocity, MotionError, Position3D, Rad, RobotState,
};

use super::{GeneratorPhase, Lifecycle, MotionGenerator, START_REST_TOLERANCE, Step};

/// 低于此平移距离（米）视为纯旋转目标
const TRANSLATION_EPS: f64 = 1e-9;
/// 低于此旋转角（弧度）视为纯平移目标
const ROTATION_EPS: f64 = 1e-9;

/// 位姿目标
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PoseTarget {
    /// 基座坐标系下的绝对位姿
    Absolute(CartesianPose),
    /// 相对上一段终点（规划时刻指令位姿）的偏移
    Relative(CartesianPose),
}

/// 笛卡尔空间途经点
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CartesianWaypoint {
    /// 目标位姿
    pub target: PoseTarget,
    /// 经过该点时沿主轴的混合速度（m/s，纯旋转段为 rad/s）；
    /// `None` 表示到点停稳
    pub blend_speed: Option<f64>,
    /// 该段的限制覆盖因子
    pub speed: SpeedOverride,
}

impl CartesianWaypoint {
    /// 到点停稳的绝对位姿途经点
    pub fn new(target: CartesianPose) -> Self {
        CartesianWaypoint {
            target: PoseTarget::Absolute(target),
            blend_speed: None,
            speed: SpeedOverride::default(),
        }
    }

    /// 相对上一段终点的途经点
    pub fn relative(offset: CartesianPose) -> Self {
        CartesianWaypoint {
            target: PoseTarget::Relative(offset),
            blend_speed: None,
            speed: SpeedOverride::default(),
        }
    }

    /// 设置混合速度
    pub fn with_blend_speed(mut self, speed: f64) -> Self {
        self.blend_speed = Some(speed);
        self
    }

    /// 设置该段的限制覆盖因子
    pub fn with_speed(mut self, speed: SpeedOverride) -> Self {
        self.speed = speed;
        self
    }
}

/// 肘部冗余自由度提示
///
/// 本生成器不求解冗余构型，仅把提示透传给下游执行器；
/// 不支持的执行器可以忽略。
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElbowState {
    /// 肘部关节角
    pub position: Rad,
    /// 构型分支（肘上/肘下）
    pub flip: bool,
}

/// 笛卡尔生成器配置
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CartesianGeneratorConfig {
    /// 平移偏离容差（米）
    pub translation_divergence: f64,
    /// 旋转偏离容差（弧度）
    pub rotation_divergence: f64,
    /// 平移收敛容差（米）
    pub translation_settle: f64,
    /// 旋转收敛容差（弧度）
    pub rotation_settle: f64,
    /// 收敛宽限期（周期数）
    pub settle_grace_cycles: u32,
    /// 肘部提示（透传）
    pub elbow: Option<ElbowState>,
}

impl Default for CartesianGeneratorConfig {
    fn default() -> Self {
        CartesianGeneratorConfig {
            translation_divergence: 0.05,
            rotation_divergence: 0.1,
            translation_settle: 1e-4,
            rotation_settle: 1e-3,
            settle_grace_cycles: 100,
            elbow: None,
        }
    }
}

/// 位姿指令（每周期下发）
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CartesianCommand {
    /// 指令位姿
    pub pose: CartesianPose,
    /// 指令速度（线速度 + 角速度）
    pub twist: CartesianVelocity,
    /// 肘部提示（透传）
    pub elbow: Option<ElbowState>,
}

/// 主轴选择：标量规律跑在平移距离上还是旋转角上
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MasterAxis {
    /// s ∈ [0, 距离]，旋转限制折算进主轨迹
    Translation,
    /// s ∈ [0, 旋转角]（纯旋转段）
    Rotation,
}

/// 一段位姿轨迹
#[derive(Debug, Clone)]
struct CartesianLeg {
    start_pose: CartesianPose,
    target_pose: CartesianPose,
    master: MasterAxis,
    /// 平移方向（单位向量；纯旋转段为零向量）
    unit_dir: Position3D,
    /// 旋转轴（世界系单位向量）
    rot_axis: Position3D,
    /// 旋转总角（弧度，≤ π）
    rot_angle: f64,
    /// 主轴标量规律（s ∈ [0, s_total]）
    profile: DofProfile,
    /// 主轴总长（距离或旋转角）
    s_total: f64,
    t_start: f64,
    duration: f64,
}

impl CartesianLeg {
    /// 在段内时刻采样位姿与速度
    ///
    /// 复合段（先停车折返）会让 s 短暂越出 [0, s_total]：
    /// 平移如实跟随 s，姿态插值参数钳位在 [0, 1] 且越界期间
    /// 角速度指令为零，保证姿态指令无跳变。
    fn sample(&self, t_local: f64) -> (CartesianPose, CartesianVelocity) {
        let s = self.profile.sample(t_local);
        let (frac, frac_rate) = if self.s_total > 0.0 {
            (s.position / self.s_total, s.velocity / self.s_total)
        } else {
            (1.0, 0.0)
        };
        let in_range = (0.0..=1.0).contains(&frac);
        let orientation = self
            .start_pose
            .orientation
            .slerp(&self.target_pose.orientation, frac.clamp(0.0, 1.0));

        match self.master {
            MasterAxis::Translation => {
                let pose = CartesianPose {
                    position: self.start_pose.position + self.unit_dir * s.position,
                    orientation,
                };
                let twist = CartesianVelocity {
                    linear: self.unit_dir * s.velocity,
                    angular: if in_range {
                        self.rot_axis * (self.rot_angle * frac_rate)
                    } else {
                        Position3D::ZERO
                    },
                };
                (pose, twist)
            }
            MasterAxis::Rotation => {
                let pose = CartesianPose {
                    position: self.start_pose.position,
                    orientation,
                };
                let twist = CartesianVelocity {
                    linear: Position3D::ZERO,
                    angular: self.rot_axis * s.velocity,
                };
                (pose, twist)
            }
        }
    }
}

/// 笛卡尔空间运动生成器
///
/// 生命周期见 [`super`] 模块文档；实例单次使用。
#[derive(Debug)]
pub struct CartesianMotionGenerator {
    waypoints: Vec<CartesianWaypoint>,
    limits: CartesianLimits,
    speed_factor: SpeedFactor,
    config: CartesianGeneratorConfig,

    lifecycle: Lifecycle,
    legs: Vec<CartesianLeg>,
    current_leg: usize,
    /// start() 时捕获的锚点状态
    anchor: Option<RobotState>,
    final_target: CartesianPose,
    last_command: CartesianCommand,
    settle_count: u32,
}

/// 旋转限制折算进平移主轴
///
/// 角速度 = (θ/d)·ṡ，因此 ṡ ≤ 旋转限速·d/θ；加速度、加加速度同理。
fn folded_limits(translation: &AxisLimits, rotation: &AxisLimits, d: f64, theta: f64) -> AxisLimits {
    if theta < ROTATION_EPS {
        return *translation;
    }
    let ratio = d / theta;
    AxisLimits {
        max_velocity: translation.max_velocity.min(rotation.max_velocity * ratio),
        max_acceleration: translation
            .max_acceleration
            .min(rotation.max_acceleration * ratio),
        max_jerk: translation.max_jerk.min(rotation.max_jerk * ratio),
    }
}

impl CartesianMotionGenerator {
    /// 创建生成器（构造即校验途经点）
    pub fn new(
        waypoints: Vec<CartesianWaypoint>,
        limits: CartesianLimits,
        speed_factor: SpeedFactor,
        config: CartesianGeneratorConfig,
    ) -> Result<Self, MotionError> {
        if waypoints.is_empty() {
            return Err(MotionError::InvalidTarget {
                reason: "waypoint list is empty".to_string(),
            });
        }
        for (index, wp) in waypoints.iter().enumerate() {
            let pose = match &wp.target {
                PoseTarget::Absolute(p) | PoseTarget::Relative(p) => p,
            };
            if !pose.is_finite() {
                return Err(MotionError::InvalidTarget {
                    reason: format!("waypoint {index} contains non-finite pose"),
                });
            }
            if let Some(blend) = wp.blend_speed {
                if !blend.is_finite() {
                    return Err(MotionError::InvalidTarget {
                        reason: format!("waypoint {index} contains non-finite blend speed"),
                    });
                }
            }
        }

        Ok(CartesianMotionGenerator {
            waypoints,
            limits,
            speed_factor,
            config,
            lifecycle: Lifecycle::new(),
            legs: Vec::new(),
            current_leg: 0,
            anchor: None,
            final_target: CartesianPose::IDENTITY,
            last_command: CartesianCommand {
                pose: CartesianPose::IDENTITY,
                twist: CartesianVelocity::ZERO,
                elbow: config.elbow,
            },
            settle_count: 0,
        })
    }

    /// 单目标运动的便捷构造
    pub fn to_pose(
        target: CartesianPose,
        limits: CartesianLimits,
        speed_factor: SpeedFactor,
    ) -> Result<Self, MotionError> {
        CartesianMotionGenerator::new(
            vec![CartesianWaypoint::new(target)],
            limits,
            speed_factor,
            CartesianGeneratorConfig::default(),
        )
    }

    /// 规划一段位姿轨迹
    ///
    /// 边界速度取向：平移主轴投影线速度，旋转主轴投影角速度。
    /// 主轴之外的残余速度分量无法由单标量规律延续，在拼接点截断，
    /// 其幅值受偏离容差约束。
    fn plan_leg(
        &self,
        from_pose: &CartesianPose,
        from_velocity: Position3D,
        from_angular: Position3D,
        wp: &CartesianWaypoint,
        t_start: f64,
    ) -> Result<CartesianLeg, MotionError> {
        let target_pose = match &wp.target {
            PoseTarget::Absolute(p) => *p,
            PoseTarget::Relative(offset) => from_pose.compose(offset),
        };
        if !target_pose.is_finite() {
            return Err(MotionError::InvalidTarget {
                reason: "resolved target pose is non-finite".to_string(),
            });
        }

        let delta = target_pose.position - from_pose.position;
        let distance = delta.norm();
        let (rot_axis, rot_angle) = from_pose.orientation.rotation_to(&target_pose.orientation);
        let rot_angle = rot_angle.0;

        let translation = self
            .limits
            .translation
            .scaled(self.speed_factor.value())
            .scaled_by(wp.speed);
        let rotation = self
            .limits
            .rotation
            .scaled(self.speed_factor.value())
            .scaled_by(wp.speed);

        // 主轴选择：平移优先，纯旋转段退化到旋转角
        let (master, unit_dir, s_total, effective, axis_name) = if distance >= TRANSLATION_EPS {
            (
                MasterAxis::Translation,
                delta.normalize(),
                distance,
                folded_limits(&translation, &rotation, distance, rot_angle),
                "translation",
            )
        } else if rot_angle >= ROTATION_EPS {
            (
                MasterAxis::Rotation,
                Position3D::ZERO,
                rot_angle,
                rotation,
                "rotation",
            )
        } else if from_velocity.norm() > EPS_VEL {
            // 目标即当前位姿但仍有残余速度：沿速度方向停车折返
            (
                MasterAxis::Translation,
                from_velocity.normalize(),
                0.0,
                translation,
                "translation",
            )
        } else {
            // 零运动段
            (
                MasterAxis::Translation,
                Position3D::ZERO,
                0.0,
                translation,
                "translation",
            )
        };

        let v0 = match master {
            MasterAxis::Translation => from_velocity.dot(&unit_dir),
            MasterAxis::Rotation => from_angular.dot(&rot_axis),
        };
        let blend = wp.blend_speed.unwrap_or(0.0);
        let profile = DofProfile::plan(0.0, s_total, v0, blend, &effective)
            .map_err(|e| map_plan_error(e, axis_name))?;
        let duration = profile.duration();

        Ok(CartesianLeg {
            start_pose: *from_pose,
            target_pose,
            master,
            unit_dir,
            rot_axis,
            rot_angle,
            profile,
            s_total,
            t_start,
            duration,
        })
    }

    /// 规划整条运动（段间边界速度接续）
    fn plan_legs(
        &self,
        from_pose: CartesianPose,
        from_velocity: Position3D,
        from_angular: Position3D,
        t0: f64,
        waypoints: &[CartesianWaypoint],
    ) -> Result<Vec<CartesianLeg>, MotionError> {
        let mut legs = Vec::with_capacity(waypoints.len());
        let mut pose = from_pose;
        let mut velocity = from_velocity;
        let mut angular = from_angular;
        let mut t_start = t0;

        for wp in waypoints {
            let leg = self.plan_leg(&pose, velocity, angular, wp, t_start)?;
            let (_, end_twist) = leg.sample(leg.duration);
            pose = leg.target_pose;
            velocity = end_twist.linear;
            angular = end_twist.angular;
            t_start += leg.duration;
            legs.push(leg);
        }
        Ok(legs)
    }

    /// 运行中替换剩余途经点（在线重规划）
    ///
    /// 新轨迹以当前指令位姿与线速度（向新方向投影）为边界条件。
    /// 规划失败时旧轨迹原样保留。
    pub fn retarget(&mut self, waypoints: Vec<CartesianWaypoint>) -> Result<(), MotionError> {
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
        let (pose, twist) = self.sample_at(t);
        let legs = self.plan_legs(pose, twist.linear, twist.angular, t, &waypoints)?;

        self.final_target = legs.last().expect("non-empty").target_pose;
        self.waypoints = waypoints;
        self.legs = legs;
        self.current_leg = 0;
        self.settle_count = 0;
        tracing::debug!(elapsed = t, "cartesian motion re-planned in flight");
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

    fn sample_at(&self, t: f64) -> (CartesianPose, CartesianVelocity) {
        let mut index = self.current_leg;
        while index + 1 < self.legs.len()
            && t >= self.legs[index].t_start + self.legs[index].duration
        {
            index += 1;
        }
        let leg = &self.legs[index];
        leg.sample(t - leg.t_start)
    }

    /// 位姿误差：(平移, 旋转角)
    fn pose_error(a: &CartesianPose, b: &CartesianPose) -> (f64, f64) {
        let translation = (a.position - b.position).norm();
        let (_, angle) = a.orientation.rotation_to(&b.orientation);
        (translation, angle.0)
    }

    /// 偏离检测（实测位姿对比上周期指令）
    fn check_divergence(&self, robot_state: &RobotState) -> Option<AbortReason> {
        let (trans_err, rot_err) =
            Self::pose_error(&robot_state.end_pose, &self.last_command.pose);
        if trans_err > self.config.translation_divergence {
            return Some(AbortReason::Diverged {
                axis: "translation".to_string(),
                error: trans_err,
                tolerance: self.config.translation_divergence,
            });
        }
        if rot_err > self.config.rotation_divergence {
            return Some(AbortReason::Diverged {
                axis: "rotation".to_string(),
                error: rot_err,
                tolerance: self.config.rotation_divergence,
            });
        }
        None
    }

    fn hold_command(&self) -> CartesianCommand {
        CartesianCommand {
            pose: self.last_command.pose,
            twist: CartesianVelocity::ZERO,
            elbow: self.config.elbow,
        }
    }

    fn abort_with_hold(&mut self, reason: AbortReason) -> Step<CartesianCommand> {
        self.lifecycle.abort(reason);
        self.lifecycle.take_pending_hold();
        Step {
            command: self.hold_command(),
            finished: true,
        }
    }
}

impl MotionGenerator for CartesianMotionGenerator {
    type Command = CartesianCommand;

    fn start(&mut self, robot_state: &RobotState) -> Result<(), MotionError> {
        if self.lifecycle.phase() != GeneratorPhase::Idle {
            return Err(MotionError::AlreadyStarted {
                phase: self.lifecycle.phase().name().to_string(),
            });
        }
        if !robot_state.end_pose.is_finite() {
            return Err(MotionError::InvalidTarget {
                reason: "measured end-effector pose contains non-finite values".to_string(),
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

        let anchor = CartesianPose {
            position: robot_state.end_pose.position,
            orientation: robot_state.end_pose.orientation.normalize(),
        };
        let legs =
            self.plan_legs(anchor, Position3D::ZERO, Position3D::ZERO, 0.0, &self.waypoints)?;

        self.final_target = legs.last().expect("non-empty").target_pose;
        self.legs = legs;
        self.current_leg = 0;
        self.anchor = Some(*robot_state);
        self.last_command = CartesianCommand {
            pose: anchor,
            twist: CartesianVelocity::ZERO,
            elbow: self.config.elbow,
        };
        self.lifecycle.begin()?;
        tracing::debug!(
            duration = self.planned_duration(),
            legs = self.legs.len(),
            "cartesian motion started"
        );
        Ok(())
    }

    fn step(
        &mut self,
        period: Duration,
        robot_state: &RobotState,
    ) -> Result<Step<CartesianCommand>, MotionError> {
        let phase = self.lifecycle.phase();
        if phase != GeneratorPhase::Running {
            // abort 后欠发的唯一一条零速保持指令
            if phase == GeneratorPhase::Aborted && self.lifecycle.take_pending_hold() {
                return Ok(Step {
                    command: self.hold_command(),
                    finished: true,
                });
            }
            return Err(self.lifecycle.step_rejection());
        }

        let t = self.lifecycle.advance(period.as_secs_f64());

        if let Some(reason) = self.check_divergence(robot_state) {
            return Ok(self.abort_with_hold(reason));
        }

        while self.current_leg + 1 < self.legs.len() {
            let leg = &self.legs[self.current_leg];
            if t < leg.t_start + leg.duration {
                break;
            }
            self.current_leg += 1;
        }

        let total = self.planned_duration();
        if t >= total {
            // 规划终点：实测位姿收敛检查
            let (trans_err, rot_err) =
                Self::pose_error(&robot_state.end_pose, &self.final_target);
            let settled = trans_err <= self.config.translation_settle
                && rot_err <= self.config.rotation_settle;
            let command = CartesianCommand {
                pose: self.final_target,
                twist: CartesianVelocity::ZERO,
                elbow: self.config.elbow,
            };

            if settled {
                self.lifecycle.finish();
                self.last_command = command;
                tracing::debug!(elapsed = t, "cartesian motion finished");
                return Ok(Step {
                    command,
                    finished: true,
                });
            }

            self.settle_count += 1;
            if self.settle_count > self.config.settle_grace_cycles {
                let (axis, error, tolerance) = if trans_err > self.config.translation_settle {
                    ("translation", trans_err, self.config.translation_settle)
                } else {
                    ("rotation", rot_err, self.config.rotation_settle)
                };
                return Ok(self.abort_with_hold(AbortReason::Diverged {
                    axis: axis.to_string(),
                    error,
                    tolerance,
                }));
            }

            self.last_command = command;
            return Ok(Step {
                command,
                finished: false,
            });
        }

        let leg = &self.legs[self.current_leg];
        let (pose, twist) = leg.sample(t - leg.t_start);
        let command = CartesianCommand {
            pose,
            twist,
            elbow: self.config.elbow,
        };
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{JointArray, Quaternion, Rad};

    fn pose(x: f64, y: f64, z: f64, yaw: f64) -> CartesianPose {
        CartesianPose::from_position_euler(x, y, z, Rad(0.0), Rad(0.0), Rad(yaw))
    }

    fn state_at(end_pose: CartesianPose) -> RobotState {
        RobotState::at_rest(JointArray::splat(Rad::ZERO), end_pose)
    }

    #[test]
    fn test_folded_limits_bound_rotation() {
        let trans = AxisLimits::new(1.0, 10.0, 100.0).unwrap();
        let rot = AxisLimits::new(2.0, 20.0, 200.0).unwrap();
        // d = 0.1m, θ = 1 rad：旋转限速折算后 0.2 m/s 更严
        let eff = folded_limits(&trans, &rot, 0.1, 1.0);
        assert!((eff.max_velocity - 0.2).abs() < 1e-12);
        // θ ≈ 0 时平移限制原样生效
        let eff = folded_limits(&trans, &rot, 0.1, 0.0);
        assert_eq!(eff, trans);
    }

    #[test]
    fn test_rejects_empty_waypoints() {
        let err = CartesianMotionGenerator::new(
            vec![],
            CartesianLimits::default(),
            SpeedFactor::FULL,
            CartesianGeneratorConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, MotionError::InvalidTarget { .. }));
    }

    #[test]
    fn test_zero_motion_finishes_immediately() {
        let here = pose(0.4, 0.0, 0.3, 0.0);
        let mut generator =
            CartesianMotionGenerator::to_pose(here, CartesianLimits::default(), SpeedFactor::FULL)
                .unwrap();
        generator.start(&state_at(here)).unwrap();
        let step = generator
            .step(Duration::from_millis(1), &state_at(here))
            .unwrap();
        assert!(step.finished);
        assert_eq!(generator.phase(), GeneratorPhase::Finished);
    }

    #[test]
    fn test_pure_rotation_target_plans() {
        let start = pose(0.4, 0.0, 0.3, 0.0);
        let goal = pose(0.4, 0.0, 0.3, 1.0);
        let mut generator =
            CartesianMotionGenerator::to_pose(goal, CartesianLimits::default(), SpeedFactor::FULL)
                .unwrap();
        generator.start(&state_at(start)).unwrap();
        assert!(generator.planned_duration() > 0.0);
    }

    #[test]
    fn test_relative_target_resolution() {
        let start = pose(0.4, 0.0, 0.3, 0.0);
        let offset = CartesianPose::from_position_quaternion(
            Position3D::new(0.1, 0.0, 0.0),
            Quaternion::IDENTITY,
        );
        let mut generator = CartesianMotionGenerator::new(
            vec![CartesianWaypoint::relative(offset)],
            CartesianLimits::default(),
            SpeedFactor::FULL,
            CartesianGeneratorConfig::default(),
        )
        .unwrap();
        generator.start(&state_at(start)).unwrap();
        let leg = &generator.legs[0];
        assert!((leg.target_pose.position.x - 0.5).abs() < 1e-12);
    }
}
