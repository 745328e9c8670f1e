//! 运动学限制
//!
//! 每个自由度的最大速度/加速度/加加速度，以及统一的速度因子。
//!
//! # 设计目标
//!
//! - **构造即校验**: 非正值或 NaN 在构造时被拒绝，运行期不再检查
//! - **统一缩放**: `SpeedFactor` 同时缩放三项限制，保持轨迹形状
//! - **按途经点覆盖**: `SpeedOverride` 允许单个途经点进一步降速
//!
//! # 示例
//!
//! ```rust
//! use kestrel_motion::limits::{JointLimits, SpeedFactor};
//!
//! let limits = JointLimits::default();
//! let factor = SpeedFactor::new(0.2).unwrap();
//! let slow = limits.scaled(factor);
//! assert!(slow.axis(0).max_velocity < limits.axis(0).max_velocity);
//! ```

use crate::types::joint::{DOF, Joint, JointArray};
use crate::types::MotionError;

/// 单个自由度的运动学限制
///
/// 不变式：三项均为有限正值（构造时校验）。
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AxisLimits {
    /// 最大速度（rad/s 或 m/s）
    pub max_velocity: f64,
    /// 最大加速度（rad/s² 或 m/s²）
    pub max_acceleration: f64,
    /// 最大加加速度（rad/s³ 或 m/s³）
    pub max_jerk: f64,
}

impl AxisLimits {
    /// 创建并校验
    pub fn new(max_velocity: f64, max_acceleration: f64, max_jerk: f64) -> Result<Self, MotionError> {
        let limits = AxisLimits {
            max_velocity,
            max_acceleration,
            max_jerk,
        };
        limits.validate("axis")?;
        Ok(limits)
    }

    /// 不经校验地创建（仅限 crate 内部在已校验数据上使用）
    pub(crate) const fn new_unchecked(
        max_velocity: f64,
        max_acceleration: f64,
        max_jerk: f64,
    ) -> Self {
        AxisLimits {
            max_velocity,
            max_acceleration,
            max_jerk,
        }
    }

    /// 校验三项限制均为有限正值
    pub fn validate(&self, axis: &str) -> Result<(), MotionError> {
        for (field, value) in [
            ("max_velocity", self.max_velocity),
            ("max_acceleration", self.max_acceleration),
            ("max_jerk", self.max_jerk),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(MotionError::InvalidLimits {
                    axis: axis.to_string(),
                    field,
                    value,
                });
            }
        }
        Ok(())
    }

    /// 按统一因子缩放三项限制
    #[inline]
    pub fn scaled(&self, factor: f64) -> AxisLimits {
        AxisLimits {
            max_velocity: self.max_velocity * factor,
            max_acceleration: self.max_acceleration * factor,
            max_jerk: self.max_jerk * factor,
        }
    }

    /// 按速度/加速度/加加速度各自的因子缩放
    #[inline]
    pub fn scaled_by(&self, overrides: SpeedOverride) -> AxisLimits {
        AxisLimits {
            max_velocity: self.max_velocity * overrides.velocity_rel,
            max_acceleration: self.max_acceleration * overrides.acceleration_rel,
            max_jerk: self.max_jerk * overrides.jerk_rel,
        }
    }
}

/// 关节空间限制（每关节独立）
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JointLimits {
    per_joint: JointArray<AxisLimits>,
}

impl JointLimits {
    /// 从每关节限制创建并校验
    pub fn new(per_joint: JointArray<AxisLimits>) -> Result<Self, MotionError> {
        for joint in Joint::ALL {
            per_joint[joint].validate(joint.name())?;
        }
        Ok(JointLimits { per_joint })
    }

    /// 所有关节使用相同限制
    pub fn uniform(limits: AxisLimits) -> Result<Self, MotionError> {
        limits.validate("joint")?;
        Ok(JointLimits {
            per_joint: JointArray::splat(limits),
        })
    }

    /// 获取某个关节的限制
    #[inline]
    pub fn joint(&self, joint: Joint) -> AxisLimits {
        self.per_joint[joint]
    }

    /// 按索引获取限制
    #[inline]
    pub fn axis(&self, index: usize) -> AxisLimits {
        self.per_joint[index]
    }

    /// 按统一因子缩放所有关节限制
    pub fn scaled(&self, factor: SpeedFactor) -> JointLimits {
        JointLimits {
            per_joint: self.per_joint.map(|l| l.scaled(factor.value())),
        }
    }
}

impl Default for JointLimits {
    /// Kestrel 臂的额定关节限制
    fn default() -> Self {
        // [J1..J7]：近端关节行程大、限速低；腕部关节限速高
        const V: [f64; DOF] = [2.15, 2.15, 2.15, 2.15, 2.6, 2.6, 2.6];
        const A: [f64; DOF] = [15.0, 7.5, 10.0, 12.5, 15.0, 20.0, 20.0];
        const J: [f64; DOF] = [7500.0, 3750.0, 5000.0, 6250.0, 7500.0, 10000.0, 10000.0];

        let mut per_joint = JointArray::splat(AxisLimits::new_unchecked(1.0, 1.0, 1.0));
        for i in 0..DOF {
            per_joint[i] = AxisLimits::new_unchecked(V[i], A[i], J[i]);
        }
        JointLimits { per_joint }
    }
}

/// 笛卡尔空间限制（平移 + 旋转）
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CartesianLimits {
    /// 平移限制（m/s, m/s², m/s³）
    pub translation: AxisLimits,
    /// 旋转限制（rad/s, rad/s², rad/s³）
    pub rotation: AxisLimits,
}

impl CartesianLimits {
    /// 创建并校验
    pub fn new(translation: AxisLimits, rotation: AxisLimits) -> Result<Self, MotionError> {
        translation.validate("translation")?;
        rotation.validate("rotation")?;
        Ok(CartesianLimits {
            translation,
            rotation,
        })
    }

    /// 按统一因子缩放
    pub fn scaled(&self, factor: SpeedFactor) -> CartesianLimits {
        CartesianLimits {
            translation: self.translation.scaled(factor.value()),
            rotation: self.rotation.scaled(factor.value()),
        }
    }
}

impl Default for CartesianLimits {
    /// Kestrel 臂的额定末端限制
    fn default() -> Self {
        CartesianLimits {
            translation: AxisLimits::new_unchecked(1.7, 13.0, 6500.0),
            rotation: AxisLimits::new_unchecked(2.5, 25.0, 12500.0),
        }
    }
}

/// 速度因子
///
/// 统一缩放速度/加速度/加加速度限制，范围 (0, 1]。
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpeedFactor(f64);

impl SpeedFactor {
    /// 全速
    pub const FULL: Self = SpeedFactor(1.0);

    /// 创建并校验（0 < f ≤ 1）
    pub fn new(value: f64) -> Result<Self, MotionError> {
        if !value.is_finite() || value <= 0.0 || value > 1.0 {
            return Err(MotionError::InvalidSpeedFactor { value });
        }
        Ok(SpeedFactor(value))
    }

    /// 获取原始值
    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for SpeedFactor {
    fn default() -> Self {
        SpeedFactor::FULL
    }
}

/// 单个途经点的限制覆盖因子
///
/// 三项各自独立，范围 (0, 1]，默认全 1（不降速）。
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpeedOverride {
    /// 速度因子
    pub velocity_rel: f64,
    /// 加速度因子
    pub acceleration_rel: f64,
    /// 加加速度因子
    pub jerk_rel: f64,
}

impl SpeedOverride {
    /// 创建并校验（每项 0 < f ≤ 1）
    pub fn new(
        velocity_rel: f64,
        acceleration_rel: f64,
        jerk_rel: f64,
    ) -> Result<Self, MotionError> {
        for value in [velocity_rel, acceleration_rel, jerk_rel] {
            if !value.is_finite() || value <= 0.0 || value > 1.0 {
                return Err(MotionError::InvalidSpeedFactor { value });
            }
        }
        Ok(SpeedOverride {
            velocity_rel,
            acceleration_rel,
            jerk_rel,
        })
    }

    /// 统一的单因子覆盖
    pub fn uniform(factor: f64) -> Result<Self, MotionError> {
        SpeedOverride::new(factor, factor, factor)
    }
}

impl Default for SpeedOverride {
    fn default() -> Self {
        SpeedOverride {
            velocity_rel: 1.0,
            acceleration_rel: 1.0,
            jerk_rel: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_limits_reject_nonpositive() {
        assert!(AxisLimits::new(0.0, 1.0, 1.0).is_err());
        assert!(AxisLimits::new(1.0, -2.0, 1.0).is_err());
        assert!(AxisLimits::new(1.0, 1.0, f64::NAN).is_err());
        assert!(AxisLimits::new(1.0, 1.0, 1.0).is_ok());
    }

    #[test]
    fn test_speed_factor_range() {
        assert!(SpeedFactor::new(0.0).is_err());
        assert!(SpeedFactor::new(1.5).is_err());
        assert!(SpeedFactor::new(f64::INFINITY).is_err());
        assert!(SpeedFactor::new(1.0).is_ok());
        assert!(SpeedFactor::new(0.05).is_ok());
    }

    #[test]
    fn test_joint_limits_scaled() {
        let limits = JointLimits::default();
        let half = limits.scaled(SpeedFactor::new(0.5).unwrap());
        for joint in Joint::ALL {
            let full = limits.joint(joint);
            let scaled = half.joint(joint);
            assert!((scaled.max_velocity - full.max_velocity * 0.5).abs() < 1e-12);
            assert!((scaled.max_jerk - full.max_jerk * 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_default_limits_valid() {
        let joint = JointLimits::default();
        for j in Joint::ALL {
            assert!(joint.joint(j).validate(j.name()).is_ok());
        }
        let cart = CartesianLimits::default();
        assert!(cart.translation.validate("translation").is_ok());
        assert!(cart.rotation.validate("rotation").is_ok());
    }

    #[test]
    fn test_speed_override_default_is_identity() {
        let limits = AxisLimits::new(2.0, 4.0, 8.0).unwrap();
        let same = limits.scaled_by(SpeedOverride::default());
        assert_eq!(limits, same);
    }
}
