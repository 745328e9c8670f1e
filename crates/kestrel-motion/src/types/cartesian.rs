//! 笛卡尔空间类型
//!
//! 提供 3D 位姿、速度的表示，用于笛卡尔空间运动生成。
//!
//! # 设计目标
//!
//! - **完整表示**: 位姿（位置+姿态）、速度（线速度+角速度）
//! - **数值稳定**: 四元数归一化防止 NaN 传播
//! - **最短弧插值**: slerp 始终沿 ≤180° 的旋转路径
//!
//! # 示例
//!
//! ```rust
//! use kestrel_motion::types::{CartesianPose, Rad};
//!
//! let start = CartesianPose::from_position_euler(
//!     0.4, 0.0, 0.3,
//!     Rad(0.0), Rad(0.0), Rad(0.0),
//! );
//! let goal = CartesianPose::from_position_euler(
//!     0.4, 0.0, 0.3,
//!     Rad(0.0), Rad(0.0), Rad(1.57),
//! );
//!
//! // 中点姿态（最短弧）
//! let mid = start.orientation.slerp(&goal.orientation, 0.5);
//! let (_, _, yaw) = mid.to_euler();
//! assert!((yaw.0 - 0.785).abs() < 1e-2);
//! ```

use super::units::Rad;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// 四元数归一化阈值（避免除零）
///
/// 当四元数的模平方小于此值时，归一化会返回单位四元数。
const QUATERNION_NORM_THRESHOLD: f64 = 1e-10;

/// slerp 切换到线性插值的夹角阈值
///
/// 两姿态几乎平行时 sin(θ) 接近 0，除法不稳定，改用线性插值。
const SLERP_LERP_THRESHOLD: f64 = 1e-8;

/// 三维向量（位置用米，角速度轴用 rad/s）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position3D {
    /// X 分量
    pub x: f64,
    /// Y 分量
    pub y: f64,
    /// Z 分量
    pub z: f64,
}

impl Position3D {
    /// 创建新的三维向量
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Position3D { x, y, z }
    }

    /// 零向量
    pub const ZERO: Self = Position3D::new(0.0, 0.0, 0.0);

    /// 计算向量长度（范数）
    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// 归一化（单位向量）
    pub fn normalize(&self) -> Self {
        let n = self.norm();
        if n < 1e-10 {
            return Position3D::ZERO;
        }
        Position3D {
            x: self.x / n,
            y: self.y / n,
            z: self.z / n,
        }
    }

    /// 点积
    pub fn dot(&self, other: &Position3D) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// 叉积
    pub fn cross(&self, other: &Position3D) -> Position3D {
        Position3D {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// 所有分量是否有限（非 NaN/无穷）
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Position3D {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Position3D::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Position3D {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Position3D::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Position3D {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: f64) -> Self {
        Position3D::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Position3D {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Position3D::new(-self.x, -self.y, -self.z)
    }
}

impl fmt::Display for Position3D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

/// 四元数（用于表示3D旋转）
///
/// 四元数是表示3D旋转的数学工具，避免了欧拉角的万向节锁问题。
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Quaternion {
    /// 实部
    pub w: f64,
    /// 虚部 i
    pub x: f64,
    /// 虚部 j
    pub y: f64,
    /// 虚部 k
    pub z: f64,
}

impl Quaternion {
    /// 单位四元数（无旋转）
    pub const IDENTITY: Self = Quaternion {
        w: 1.0,
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// 从欧拉角创建四元数（Roll-Pitch-Yaw, ZYX顺序）
    pub fn from_euler(roll: Rad, pitch: Rad, yaw: Rad) -> Self {
        let cr = (roll.0 / 2.0).cos();
        let sr = (roll.0 / 2.0).sin();
        let cp = (pitch.0 / 2.0).cos();
        let sp = (pitch.0 / 2.0).sin();
        let cy = (yaw.0 / 2.0).cos();
        let sy = (yaw.0 / 2.0).sin();

        Quaternion {
            w: cr * cp * cy + sr * sp * sy,
            x: sr * cp * cy - cr * sp * sy,
            y: cr * sp * cy + sr * cp * sy,
            z: cr * cp * sy - sr * sp * cy,
        }
    }

    /// 从旋转轴和角度创建四元数
    ///
    /// `axis` 无需归一化；零轴返回单位四元数。
    pub fn from_axis_angle(axis: Position3D, angle: Rad) -> Self {
        let axis = axis.normalize();
        if axis == Position3D::ZERO {
            return Quaternion::IDENTITY;
        }
        let half = angle.0 / 2.0;
        let s = half.sin();
        Quaternion {
            w: half.cos(),
            x: axis.x * s,
            y: axis.y * s,
            z: axis.z * s,
        }
    }

    /// 转换为欧拉角（Roll-Pitch-Yaw）
    ///
    /// 返回 `(roll, pitch, yaw)`
    pub fn to_euler(self) -> (Rad, Rad, Rad) {
        // Roll (x-axis rotation)
        let sinr_cosp = 2.0 * (self.w * self.x + self.y * self.z);
        let cosr_cosp = 1.0 - 2.0 * (self.x * self.x + self.y * self.y);
        let roll = Rad(sinr_cosp.atan2(cosr_cosp));

        // Pitch (y-axis rotation)
        let sinp = 2.0 * (self.w * self.y - self.z * self.x);
        let pitch = if sinp.abs() >= 1.0 {
            // Gimbal lock
            Rad(std::f64::consts::FRAC_PI_2.copysign(sinp))
        } else {
            Rad(sinp.asin())
        };

        // Yaw (z-axis rotation)
        let siny_cosp = 2.0 * (self.w * self.z + self.x * self.y);
        let cosy_cosp = 1.0 - 2.0 * (self.y * self.y + self.z * self.z);
        let yaw = Rad(siny_cosp.atan2(cosy_cosp));

        (roll, pitch, yaw)
    }

    /// 归一化（确保单位四元数）
    ///
    /// # 数值稳定性
    ///
    /// 如果四元数的模接近 0（< 1e-10），返回默认单位四元数 (1, 0, 0, 0)
    /// 以避免除零错误和 NaN 扩散。
    pub fn normalize(&self) -> Self {
        let norm_sq = self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z;

        // ✅ 数值稳定性检查：避免除零
        if norm_sq < QUATERNION_NORM_THRESHOLD {
            tracing::warn!(
                "Normalizing near-zero quaternion (norm²={:.2e}), returning identity",
                norm_sq
            );
            return Quaternion::IDENTITY;
        }

        let norm = norm_sq.sqrt();
        Quaternion {
            w: self.w / norm,
            x: self.x / norm,
            y: self.y / norm,
            z: self.z / norm,
        }
    }

    /// 四元数乘法（组合旋转）
    pub fn multiply(&self, other: &Quaternion) -> Quaternion {
        Quaternion {
            w: self.w * other.w - self.x * other.x - self.y * other.y - self.z * other.z,
            x: self.w * other.x + self.x * other.w + self.y * other.z - self.z * other.y,
            y: self.w * other.y - self.x * other.z + self.y * other.w + self.z * other.x,
            z: self.w * other.z + self.x * other.y - self.y * other.x + self.z * other.w,
        }
    }

    /// 共轭（逆旋转）
    pub fn conjugate(&self) -> Quaternion {
        Quaternion {
            w: self.w,
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }

    /// 点积
    pub fn dot(&self, other: &Quaternion) -> f64 {
        self.w * other.w + self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// 用四元数旋转一个向量
    pub fn rotate(&self, v: Position3D) -> Position3D {
        // v' = q * (0, v) * q⁻¹
        let qv = Position3D::new(self.x, self.y, self.z);
        let uv = qv.cross(&v);
        let uuv = qv.cross(&uv);
        v + (uv * self.w + uuv) * 2.0
    }

    /// 所有分量是否有限（非 NaN/无穷）
    pub fn is_finite(&self) -> bool {
        self.w.is_finite() && self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// 计算到目标姿态的相对旋转（最短弧）
    ///
    /// 返回 `(单位旋转轴, 旋转角)`，满足
    /// `target ≈ from_axis_angle(axis, angle) * self`，且 `0 ≤ angle ≤ π`。
    ///
    /// 两姿态几乎重合时返回 `(ZERO, Rad(0.0))`。
    pub fn rotation_to(&self, target: &Quaternion) -> (Position3D, Rad) {
        // 相对旋转 r = target * self⁻¹（世界坐标系下的旋转轴）
        let mut r = target.multiply(&self.conjugate()).normalize();

        // 最短弧：w < 0 时取反（q 和 -q 表示同一旋转）
        if r.w < 0.0 {
            r = Quaternion {
                w: -r.w,
                x: -r.x,
                y: -r.y,
                z: -r.z,
            };
        }

        let half_angle = r.w.clamp(-1.0, 1.0).acos();
        let angle = 2.0 * half_angle;
        let s = half_angle.sin();
        if s.abs() < SLERP_LERP_THRESHOLD {
            return (Position3D::ZERO, Rad(0.0));
        }
        let axis = Position3D::new(r.x / s, r.y / s, r.z / s).normalize();
        (axis, Rad(angle))
    }

    /// 球面线性插值（slerp，最短弧）
    ///
    /// `t ∈ [0, 1]`，`t=0` 返回 `self`，`t=1` 返回 `target`。
    /// 始终沿 ≤180° 的旋转路径；两姿态几乎平行时退化为线性插值。
    pub fn slerp(&self, target: &Quaternion, t: f64) -> Quaternion {
        let q0 = self.normalize();
        let mut q1 = target.normalize();

        let mut dot = q0.dot(&q1);

        // 最短弧：点积为负时翻转目标
        if dot < 0.0 {
            q1 = Quaternion {
                w: -q1.w,
                x: -q1.x,
                y: -q1.y,
                z: -q1.z,
            };
            dot = -dot;
        }

        let dot = dot.clamp(-1.0, 1.0);
        let theta = dot.acos();

        if theta.abs() < SLERP_LERP_THRESHOLD {
            // 姿态几乎重合，线性插值足够
            return Quaternion {
                w: q0.w + (q1.w - q0.w) * t,
                x: q0.x + (q1.x - q0.x) * t,
                y: q0.y + (q1.y - q0.y) * t,
                z: q0.z + (q1.z - q0.z) * t,
            }
            .normalize();
        }

        let sin_theta = theta.sin();
        let s0 = ((1.0 - t) * theta).sin() / sin_theta;
        let s1 = (t * theta).sin() / sin_theta;

        Quaternion {
            w: q0.w * s0 + q1.w * s1,
            x: q0.x * s0 + q1.x * s1,
            y: q0.y * s0 + q1.y * s1,
            z: q0.z * s0 + q1.z * s1,
        }
        .normalize()
    }
}

impl fmt::Display for Quaternion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Q({:.3}, {:.3}, {:.3}, {:.3})",
            self.w, self.x, self.y, self.z
        )
    }
}

/// 笛卡尔空间位姿（位置 + 姿态）
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CartesianPose {
    /// 位置（米）
    pub position: Position3D,
    /// 姿态（四元数）
    pub orientation: Quaternion,
}

impl CartesianPose {
    /// 从位置和欧拉角创建
    pub fn from_position_euler(x: f64, y: f64, z: f64, roll: Rad, pitch: Rad, yaw: Rad) -> Self {
        CartesianPose {
            position: Position3D::new(x, y, z),
            orientation: Quaternion::from_euler(roll, pitch, yaw),
        }
    }

    /// 从位置和四元数创建
    pub fn from_position_quaternion(position: Position3D, orientation: Quaternion) -> Self {
        CartesianPose {
            position,
            orientation,
        }
    }

    /// 位姿复合：`self ∘ other`
    ///
    /// `other` 在 `self` 坐标系下表达，常用于相对目标
    /// （例如"在当前末端坐标系下前移 5cm"）。
    pub fn compose(&self, other: &CartesianPose) -> CartesianPose {
        CartesianPose {
            position: self.position + self.orientation.rotate(other.position),
            orientation: self.orientation.multiply(&other.orientation).normalize(),
        }
    }

    /// 所有分量是否有限（非 NaN/无穷）
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.orientation.is_finite()
    }

    /// 零位姿（原点，无旋转）
    pub const IDENTITY: Self = CartesianPose {
        position: Position3D::ZERO,
        orientation: Quaternion::IDENTITY,
    };
}

impl fmt::Display for CartesianPose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pose(pos: {}, quat: {})",
            self.position, self.orientation
        )
    }
}

/// 笛卡尔空间速度（线速度 + 角速度）
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CartesianVelocity {
    /// 线速度（米/秒）
    pub linear: Position3D,
    /// 角速度（弧度/秒，轴角表示）
    pub angular: Position3D,
}

impl CartesianVelocity {
    /// 创建新的笛卡尔速度
    pub fn new(linear: Position3D, angular: Position3D) -> Self {
        CartesianVelocity { linear, angular }
    }

    /// 零速度
    pub const ZERO: Self = CartesianVelocity {
        linear: Position3D::ZERO,
        angular: Position3D::ZERO,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position3d_norm() {
        let v = Position3D::new(3.0, 4.0, 0.0);
        assert!((v.norm() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_position3d_cross() {
        let x = Position3D::new(1.0, 0.0, 0.0);
        let y = Position3D::new(0.0, 1.0, 0.0);
        let z = x.cross(&y);
        assert!((z.z - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_quaternion_euler_roundtrip() {
        let q = Quaternion::from_euler(Rad(0.2), Rad(-0.3), Rad(1.1));
        let (r, p, y) = q.to_euler();
        assert!((r.0 - 0.2).abs() < 1e-10);
        assert!((p.0 + 0.3).abs() < 1e-10);
        assert!((y.0 - 1.1).abs() < 1e-10);
    }

    #[test]
    fn test_quaternion_rotate_vector() {
        // 绕 Z 轴转 90°，X 轴单位向量应变为 Y 轴
        let q = Quaternion::from_axis_angle(Position3D::new(0.0, 0.0, 1.0), Rad(std::f64::consts::FRAC_PI_2));
        let v = q.rotate(Position3D::new(1.0, 0.0, 0.0));
        assert!((v.x).abs() < 1e-12);
        assert!((v.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_slerp_endpoints() {
        let a = Quaternion::from_euler(Rad(0.0), Rad(0.0), Rad(0.0));
        let b = Quaternion::from_euler(Rad(0.0), Rad(0.0), Rad(1.0));
        let s0 = a.slerp(&b, 0.0);
        let s1 = a.slerp(&b, 1.0);
        assert!(s0.dot(&a).abs() > 1.0 - 1e-10);
        assert!(s1.dot(&b).abs() > 1.0 - 1e-10);
    }

    #[test]
    fn test_slerp_shorter_arc() {
        // 目标旋转 270° 等价于反向 90°，slerp 必须走 90° 短弧
        let a = Quaternion::IDENTITY;
        let b = Quaternion::from_axis_angle(
            Position3D::new(0.0, 0.0, 1.0),
            Rad(3.0 * std::f64::consts::FRAC_PI_2),
        );
        let (_, angle) = a.rotation_to(&b);
        assert!(angle.0 <= std::f64::consts::PI + 1e-9);
        assert!((angle.0 - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn test_rotation_to_identity() {
        let q = Quaternion::from_euler(Rad(0.3), Rad(0.1), Rad(-0.2));
        let (axis, angle) = q.rotation_to(&q);
        assert_eq!(axis, Position3D::ZERO);
        assert!(angle.0.abs() < 1e-12);
    }

    #[test]
    fn test_rotation_to_roundtrip() {
        let a = Quaternion::from_euler(Rad(0.1), Rad(0.2), Rad(0.3));
        let b = Quaternion::from_euler(Rad(-0.4), Rad(0.5), Rad(1.2));
        let (axis, angle) = a.rotation_to(&b);
        let rebuilt = Quaternion::from_axis_angle(axis, angle).multiply(&a).normalize();
        assert!(rebuilt.dot(&b).abs() > 1.0 - 1e-9);
    }

    #[test]
    fn test_pose_compose_relative() {
        // 末端朝 Z 轴转 90° 后，"前移 0.1m"（局部 X）应沿世界 Y 方向
        let base = CartesianPose::from_position_euler(
            0.5, 0.0, 0.3,
            Rad(0.0), Rad(0.0), Rad(std::f64::consts::FRAC_PI_2),
        );
        let offset = CartesianPose::from_position_quaternion(
            Position3D::new(0.1, 0.0, 0.0),
            Quaternion::IDENTITY,
        );
        let composed = base.compose(&offset);
        assert!((composed.position.x - 0.5).abs() < 1e-12);
        assert!((composed.position.y - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_quaternion_normalize_near_zero() {
        let q = Quaternion {
            w: 1e-20,
            x: 0.0,
            y: 0.0,
            z: 0.0,
        };
        assert_eq!(q.normalize(), Quaternion::IDENTITY);
    }
}
