//! 生成器状态机与统一步进契约
//!
//! 两种生成器（关节空间 / 笛卡尔空间）共享同一生命周期：
//!
//! ```text
//! Idle ──start()──▶ Running ──┬──▶ Finished   （到达目标且实测收敛）
//!                             └──▶ Aborted    （偏离超差 / 外部终止）
//! ```
//!
//! # 设计理念
//!
//! - **Tick 模式**: 控制循环归外部执行器所有，生成器只负责计算；
//!   `step()` 显式传入周期时长，便于单元测试
//! - **闭集派发**: 生成器种类是小而封闭的集合，用 [`Generator`]
//!   枚举做静态派发，实时路径上没有运行期类型发现
//! - **实时安全**: `step()` 有界时间、无分配、无锁；运行期故障
//!   （偏离、外部终止）通过状态转移上报，从不在热路径上抛错误
//!
//! # 终止语义
//!
//! `abort()` 之后生成器再产出**恰好一条**零速保持指令（绝不瞬间
//! 清零指令值，那等价于命令无穷减速），此后任何 `step()` 都返回
//! [`MotionError::TerminatedGenerator`]。`Finished`/`Aborted` 是终态，
//! 实例不可复用：新运动构造新实例。

pub mod cartesian;
pub mod joint;

use std::fmt;
use std::time::Duration;

use crate::types::{AbortReason, MotionError, RobotState};

pub use cartesian::{
    CartesianCommand, CartesianGeneratorConfig, CartesianMotionGenerator, CartesianWaypoint,
    ElbowState, PoseTarget,
};
pub use joint::{JointCommand, JointGeneratorConfig, JointMotionGenerator, JointWaypoint};

/// 生成器启动时允许的最大实测关节/末端速度（rad/s 或 m/s）
///
/// 轨迹从静止锚点规划；机器人仍在明显运动时启动会在拼接处
/// 产生速度跳变，直接拒绝。
pub(crate) const START_REST_TOLERANCE: f64 = 1e-2;

/// 生成器生命周期阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GeneratorPhase {
    /// 初始状态，尚未规划
    Idle,
    /// 正在执行，每周期产出一条指令
    Running,
    /// 正常完成（终态）
    Finished,
    /// 已终止（终态）
    Aborted,
}

impl GeneratorPhase {
    /// 阶段名称
    pub const fn name(self) -> &'static str {
        match self {
            GeneratorPhase::Idle => "Idle",
            GeneratorPhase::Running => "Running",
            GeneratorPhase::Finished => "Finished",
            GeneratorPhase::Aborted => "Aborted",
        }
    }

    /// 是否为终态
    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, GeneratorPhase::Finished | GeneratorPhase::Aborted)
    }
}

impl fmt::Display for GeneratorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 单周期步进输出
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step<C> {
    /// 本周期下发给硬件的指令
    pub command: C,
    /// 运动是否在本周期结束（`true` 恰好出现一次）
    pub finished: bool,
}

/// 生成器通用接口
///
/// 由外部控制循环消费：每个固定周期先取实测状态，调用一次
/// `step()`，再把返回的指令下发硬件。实例被控制循环线程独占；
/// 构造线程到控制循环线程的所有权转移（Rust move）即为可见性屏障。
pub trait MotionGenerator {
    /// 指令类型（关节指令或位姿指令）
    type Command;

    /// Idle → Running：捕获锚点状态并构建轨迹
    ///
    /// 规划失败（目标不可达、限制违例）同步返回错误，
    /// 不消耗任何控制周期。
    fn start(&mut self, robot_state: &RobotState) -> Result<(), MotionError>;

    /// 推进一个控制周期
    ///
    /// 仅在 Running（以及 abort 后的单条保持指令）有效。
    /// `period` 为自上次调用以来的周期时长。
    fn step(
        &mut self,
        period: Duration,
        robot_state: &RobotState,
    ) -> Result<Step<Self::Command>, MotionError>;

    /// 外部终止（如硬件反射、用户取消）
    ///
    /// Running → Aborted；下一次 `step()` 返回唯一一条零速保持指令。
    /// 在 Idle/终态上调用是无害的空操作。
    fn abort(&mut self, reason: &str);

    /// 当前阶段
    fn phase(&self) -> GeneratorPhase;

    /// 终止原因（仅 Aborted 后为 `Some`）
    fn abort_reason(&self) -> Option<&AbortReason>;
}

/// 共享生命周期状态（两种生成器内部复用）
#[derive(Debug, Clone)]
pub(crate) struct Lifecycle {
    phase: GeneratorPhase,
    /// 运行期累计时间（秒），Running 期间单调不减
    elapsed: f64,
    abort_reason: Option<AbortReason>,
    /// abort 后欠发的那条保持指令
    hold_pending: bool,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Lifecycle {
            phase: GeneratorPhase::Idle,
            elapsed: 0.0,
            abort_reason: None,
            hold_pending: false,
        }
    }

    #[inline]
    pub(crate) fn phase(&self) -> GeneratorPhase {
        self.phase
    }

    #[inline]
    pub(crate) fn elapsed(&self) -> f64 {
        self.elapsed
    }

    #[inline]
    pub(crate) fn abort_reason(&self) -> Option<&AbortReason> {
        self.abort_reason.as_ref()
    }

    /// Idle → Running
    pub(crate) fn begin(&mut self) -> Result<(), MotionError> {
        match self.phase {
            GeneratorPhase::Idle => {
                self.phase = GeneratorPhase::Running;
                Ok(())
            }
            phase => Err(MotionError::AlreadyStarted {
                phase: phase.name().to_string(),
            }),
        }
    }

    /// 推进内部时钟，返回新的累计时间
    pub(crate) fn advance(&mut self, period: f64) -> f64 {
        debug_assert!(period >= 0.0);
        self.elapsed += period;
        self.elapsed
    }

    /// Running → Finished
    pub(crate) fn finish(&mut self) {
        debug_assert_eq!(self.phase, GeneratorPhase::Running);
        self.phase = GeneratorPhase::Finished;
    }

    /// → Aborted，登记欠发的保持指令
    ///
    /// Idle 下终止不欠保持指令（从未产出过指令）；
    /// 终态下是空操作。
    pub(crate) fn abort(&mut self, reason: AbortReason) {
        match self.phase {
            GeneratorPhase::Running => {
                tracing::warn!(%reason, "motion generator aborted");
                self.phase = GeneratorPhase::Aborted;
                self.abort_reason = Some(reason);
                self.hold_pending = true;
            }
            GeneratorPhase::Idle => {
                tracing::warn!(%reason, "motion generator aborted before start");
                self.phase = GeneratorPhase::Aborted;
                self.abort_reason = Some(reason);
            }
            _ => {
                tracing::debug!(%reason, phase = %self.phase, "abort ignored in terminal phase");
            }
        }
    }

    /// 取走欠发的保持指令（至多一次返回 true）
    pub(crate) fn take_pending_hold(&mut self) -> bool {
        std::mem::replace(&mut self.hold_pending, false)
    }

    /// 非 Running 阶段调用 step() 的错误映射
    pub(crate) fn step_rejection(&self) -> MotionError {
        match self.phase {
            GeneratorPhase::Idle => MotionError::NotStarted,
            phase => MotionError::TerminatedGenerator {
                phase: phase.name().to_string(),
            },
        }
    }
}

/// 闭集生成器（供执行器统一持有与派发）
///
/// 生成器种类小而封闭，静态派发在实时路径上既安全又快。
#[derive(Debug)]
pub enum Generator {
    /// 关节空间生成器
    Joint(JointMotionGenerator),
    /// 笛卡尔空间生成器
    Cartesian(CartesianMotionGenerator),
}

/// 闭集指令（与 [`Generator`] 变体一一对应）
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// 关节指令
    Joint(JointCommand),
    /// 位姿指令
    Cartesian(CartesianCommand),
}

impl Generator {
    /// 启动（派发到具体变体）
    pub fn start(&mut self, robot_state: &RobotState) -> Result<(), MotionError> {
        match self {
            Generator::Joint(g) => g.start(robot_state),
            Generator::Cartesian(g) => g.start(robot_state),
        }
    }

    /// 步进（派发到具体变体）
    pub fn step(
        &mut self,
        period: Duration,
        robot_state: &RobotState,
    ) -> Result<Step<Command>, MotionError> {
        match self {
            Generator::Joint(g) => g.step(period, robot_state).map(|s| Step {
                command: Command::Joint(s.command),
                finished: s.finished,
            }),
            Generator::Cartesian(g) => g.step(period, robot_state).map(|s| Step {
                command: Command::Cartesian(s.command),
                finished: s.finished,
            }),
        }
    }

    /// 终止（派发到具体变体）
    pub fn abort(&mut self, reason: &str) {
        match self {
            Generator::Joint(g) => g.abort(reason),
            Generator::Cartesian(g) => g.abort(reason),
        }
    }

    /// 当前阶段
    pub fn phase(&self) -> GeneratorPhase {
        match self {
            Generator::Joint(g) => g.phase(),
            Generator::Cartesian(g) => g.phase(),
        }
    }

    /// 终止原因
    pub fn abort_reason(&self) -> Option<&AbortReason> {
        match self {
            Generator::Joint(g) => g.abort_reason(),
            Generator::Cartesian(g) => g.abort_reason(),
        }
    }
}

impl From<JointMotionGenerator> for Generator {
    fn from(g: JointMotionGenerator) -> Self {
        Generator::Joint(g)
    }
}

impl From<CartesianMotionGenerator> for Generator {
    fn from(g: CartesianMotionGenerator) -> Self {
        Generator::Cartesian(g)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_transitions() {
        let mut lc = Lifecycle::new();
        assert_eq!(lc.phase(), GeneratorPhase::Idle);
        lc.begin().unwrap();
        assert_eq!(lc.phase(), GeneratorPhase::Running);
        assert!(lc.begin().is_err());
        lc.finish();
        assert!(lc.phase().is_terminal());
    }

    #[test]
    fn test_lifecycle_abort_owes_single_hold() {
        let mut lc = Lifecycle::new();
        lc.begin().unwrap();
        lc.abort(AbortReason::External {
            reason: "test".to_string(),
        });
        assert_eq!(lc.phase(), GeneratorPhase::Aborted);
        assert!(lc.take_pending_hold());
        // 只欠一条
        assert!(!lc.take_pending_hold());
    }

    #[test]
    fn test_lifecycle_abort_in_terminal_is_noop() {
        let mut lc = Lifecycle::new();
        lc.begin().unwrap();
        lc.finish();
        lc.abort(AbortReason::External {
            reason: "late".to_string(),
        });
        assert_eq!(lc.phase(), GeneratorPhase::Finished);
        assert!(lc.abort_reason().is_none());
    }

    #[test]
    fn test_elapsed_monotonic() {
        let mut lc = Lifecycle::new();
        lc.begin().unwrap();
        let a = lc.advance(0.001);
        let b = lc.advance(0.001);
        assert!(b > a);
        assert!((b - 0.002).abs() < 1e-15);
    }
}
