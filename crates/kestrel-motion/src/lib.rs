//! Kestrel 机械臂运动生成核心
//!
//! 本 crate 为 7 自由度 Kestrel 机械臂提供实时控制循环使用的
//! 运动生成器：
//!
//! - **关节空间生成器**: 7 个关节各一条 jerk 受限双 S 轨迹，
//!   同步到公共完成时刻
//! - **笛卡尔空间生成器**: 平移沿固定方向轴走标量规律，
//!   姿态用同一归一化时间规律做最短弧 slerp
//! - **统一步进契约**: Idle → Running → {Finished, Aborted}，
//!   外部控制循环每周期调用一次 `step()`
//!
//! 机器人通信、逆运动学与顶层执行器属于外部协作方，
//! 不在本 crate 范围内。
//!
//! # 使用场景
//!
//! 外部执行器以固定实时周期（典型 1kHz）驱动生成器：
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use kestrel_motion::generator::{JointMotionGenerator, MotionGenerator};
//! use kestrel_motion::limits::{JointLimits, SpeedFactor};
//! use kestrel_motion::types::{JointArray, Rad, RobotState};
//!
//! # fn read_robot_state() -> RobotState { RobotState::default() }
//! # fn apply_to_hardware(_c: &kestrel_motion::generator::JointCommand) {}
//! # fn main() -> Result<(), kestrel_motion::types::MotionError> {
//! let mut target = JointArray::splat(Rad::ZERO);
//! target[0] = Rad(0.5);
//!
//! let mut generator = JointMotionGenerator::to_target(
//!     target,
//!     JointLimits::default(),
//!     SpeedFactor::new(0.2)?,
//! )?;
//!
//! generator.start(&read_robot_state())?;
//! loop {
//!     let state = read_robot_state();
//!     let step = generator.step(Duration::from_millis(1), &state)?;
//!     apply_to_hardware(&step.command);
//!     if step.finished {
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # 实时安全
//!
//! 所有轨迹缓冲在 `start()`（或 `retarget()`）时一次分配；
//! 稳态 `step()` 有界时间、无分配、无锁。运行期故障（偏离、
//! 外部终止）通过状态机上报，从不在热路径上抛错误。

pub mod generator;
pub mod limits;
pub mod profile;
pub mod types;

// 重新导出常用类型
pub use generator::{
    CartesianCommand, CartesianGeneratorConfig, CartesianMotionGenerator, CartesianWaypoint,
    Command, ElbowState, Generator, GeneratorPhase, JointCommand, JointGeneratorConfig,
    JointMotionGenerator, JointWaypoint, MotionGenerator, PoseTarget, Step,
};
pub use limits::{AxisLimits, CartesianLimits, JointLimits, SpeedFactor, SpeedOverride};
pub use profile::{Sample, TrajectoryProfile};
pub use types::{
    AbortReason, CartesianPose, CartesianVelocity, Joint, JointArray, JointPositions,
    MotionError, Position3D, Quaternion, Rad, RobotState,
};
