//! 轨迹规律（Trajectory Profile）
//!
//! 限制感知的标量时间参数化规律与多自由度时间同步。
//! 生成器内部使用 [`DofProfile`]；对外暴露 [`TrajectoryProfile`]
//! 作为单自由度规划的公共入口（例如离线验证、上层调参）。
//!
//! # 示例
//!
//! ```rust
//! use kestrel_motion::limits::AxisLimits;
//! use kestrel_motion::profile::TrajectoryProfile;
//!
//! let limits = AxisLimits::new(1.0, 2.0, 50.0).unwrap();
//! let profile = TrajectoryProfile::plan(0.0, 0.5, 0.0, 0.0, &limits).unwrap();
//!
//! let end = profile.sample(profile.duration());
//! assert!((end.position - 0.5).abs() < 1e-9);
//! assert!(end.velocity.abs() < 1e-9);
//! ```

mod double_s;
mod sync;

pub use double_s::Sample;

pub(crate) use double_s::{EPS_VEL, PlanError};
pub(crate) use sync::{DofProfile, synchronize};

use crate::limits::AxisLimits;
use crate::types::MotionError;

/// 把内部规划错误映射为对外错误类型
pub(crate) fn map_plan_error(err: PlanError, axis: &str) -> MotionError {
    match err {
        PlanError::NeedsStop => MotionError::InvalidTarget {
            reason: format!("{axis}: target unreachable under current limits from the given boundary state"),
        },
        PlanError::InvalidBlend { value, limit } => MotionError::LimitViolation {
            axis: axis.to_string(),
            value,
            limit,
        },
    }
}

/// 单自由度轨迹规律（公共入口）
///
/// 双 S 速度规律：速度、加速度连续，jerk 有界。
/// 规划在构造时完成；采样为闭式求值，无分配。
#[derive(Debug, Clone)]
pub struct TrajectoryProfile {
    inner: DofProfile,
}

impl TrajectoryProfile {
    /// 规划从 `(start, start_velocity)` 到 `(target, end_velocity)` 的最短时间规律
    ///
    /// # 错误
    ///
    /// - [`MotionError::InvalidTarget`]：边界条件下目标不可达
    /// - [`MotionError::LimitViolation`]：混合速度超出限速
    pub fn plan(
        start: f64,
        target: f64,
        start_velocity: f64,
        end_velocity: f64,
        limits: &AxisLimits,
    ) -> Result<Self, MotionError> {
        if !start.is_finite() || !target.is_finite() {
            return Err(MotionError::InvalidTarget {
                reason: format!("non-finite boundary: start={start}, target={target}"),
            });
        }
        let inner = DofProfile::plan(start, target, start_velocity, end_velocity, limits)
            .map_err(|e| map_plan_error(e, "axis"))?;
        Ok(TrajectoryProfile { inner })
    }

    /// 总时长（秒）
    #[inline]
    pub fn duration(&self) -> f64 {
        self.inner.duration()
    }

    /// 在时刻 t 采样；t ≥ duration 时返回终点状态
    #[inline]
    pub fn sample(&self, t: f64) -> Sample {
        self.inner.sample(t)
    }

    /// 把一组规律同步到公共完成时刻，返回公共时长
    ///
    /// 同步算法见 [`sync`](self) 模块文档：静止起步时间膨胀，
    /// 非零边界速度限制缩放二分，零距离自由度静止保持。
    pub fn synchronize(profiles: &mut [TrajectoryProfile], limits: &[AxisLimits]) -> f64 {
        let t = profiles
            .iter()
            .map(|p| p.duration())
            .fold(0.0f64, f64::max);
        for (profile, lim) in profiles.iter_mut().zip(limits) {
            profile.inner.stretch_to(t, lim);
        }
        t
    }
}
