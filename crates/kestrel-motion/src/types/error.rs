//! 错误类型体系
//!
//! 区分**规划期错误**（同步返回 `Result`，发生在实时路径之外）和
//! **运行期故障**（不走 `Err`，通过状态机转入 `Aborted` 并由
//! `outcome()` 上报，实时路径内永不展开栈、永不分配）。
//!
//! # 示例
//!
//! ```rust
//! use kestrel_motion::types::MotionError;
//!
//! fn handle(err: MotionError) {
//!     match err {
//!         MotionError::InvalidTarget { .. } | MotionError::LimitViolation { .. } => {
//!             // 规划被拒绝，机械臂未消耗任何控制周期
//!         }
//!         MotionError::TerminatedGenerator { .. } => {
//!             // 编程契约违规：对已结束的生成器调用了 step()
//!         }
//!         _ => {}
//!     }
//! }
//! ```

use thiserror::Error;

/// 运动生成错误类型
#[derive(Debug, Error)]
pub enum MotionError {
    // ==================== 规划期错误（实时路径之外） ====================
    /// 目标不可达或数值非法
    #[error("Invalid target: {reason}")]
    InvalidTarget {
        /// 拒绝原因
        reason: String,
    },

    /// 构造出的轨迹将超出运动学限制（防御性检查）
    #[error("Limit violation on {axis}: {value:.4} (limit: {limit:.4})")]
    LimitViolation {
        /// 轴名称（如 "J3"、"translation"）
        axis: String,
        /// 实际值
        value: f64,
        /// 限制值
        limit: f64,
    },

    /// 限制参数本身非法（非正值或 NaN）
    #[error("Invalid limits for {axis}: {field} = {value} (must be finite and > 0)")]
    InvalidLimits {
        /// 轴名称（如 "J3"、"rotation"）
        axis: String,
        /// 字段名（max_velocity / max_acceleration / max_jerk）
        field: &'static str,
        /// 实际值
        value: f64,
    },

    /// 速度因子超出 (0, 1] 范围
    #[error("Invalid speed factor: {value} (must be in (0, 1])")]
    InvalidSpeedFactor {
        /// 实际值
        value: f64,
    },

    // ==================== 契约违规（同步上报） ====================
    /// 生成器尚未 start() 就调用了 step()
    #[error("Generator not started: call start() before step()")]
    NotStarted,

    /// 对同一生成器实例重复调用 start()
    #[error("Generator already started (phase: {phase})")]
    AlreadyStarted {
        /// 当前阶段
        phase: String,
    },

    /// 对 Finished/Aborted 的生成器调用了 step()
    #[error("Generator terminated (phase: {phase}): construct a new instance for a new motion")]
    TerminatedGenerator {
        /// 终止时的阶段
        phase: String,
    },

    /// retarget() 在非 Running 阶段被调用
    #[error("Retarget rejected: generator is not running (phase: {phase})")]
    NotRunning {
        /// 当前阶段
        phase: String,
    },
}

/// 终止原因
///
/// 生成器转入 `Aborted` 后通过 `outcome()` 读取；
/// 实时路径内不会以 `Err` 形式抛出。
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AbortReason {
    /// 实测状态偏离指令轨迹超出容差
    Diverged {
        /// 偏离的轴名称（如 "J5"、"rotation"）
        axis: String,
        /// 实测偏差
        error: f64,
        /// 容差
        tolerance: f64,
    },
    /// 外部触发的终止（如硬件反射、用户取消）
    External {
        /// 终止原因描述
        reason: String,
    },
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AbortReason::Diverged {
                axis,
                error,
                tolerance,
            } => write!(
                f,
                "diverged on {axis}: error {error:.5} exceeds tolerance {tolerance:.5}"
            ),
            AbortReason::External { reason } => write!(f, "external abort: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 测试错误消息的 Display 实现
    #[test]
    fn test_error_display() {
        let err = MotionError::LimitViolation {
            axis: "J3".to_string(),
            value: 3.0,
            limit: 2.5,
        };
        let msg = format!("{err}");
        assert!(msg.contains("J3"));
        assert!(msg.contains("3.0"));
    }

    #[test]
    fn test_abort_reason_display() {
        let reason = AbortReason::Diverged {
            axis: "translation".to_string(),
            error: 0.08,
            tolerance: 0.05,
        };
        assert!(format!("{reason}").contains("translation"));
    }
}
