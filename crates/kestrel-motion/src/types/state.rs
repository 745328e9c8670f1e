//! 机器人实测状态（只读输入）
//!
//! 由外部驱动层在每个控制周期调用 `step()` **之前**填充；
//! 本 crate 只读取，不产生。

use super::cartesian::CartesianPose;
use super::joint::{JointArray, JointPositions};
use super::units::Rad;

/// 机器人实测状态
///
/// 驱动层每周期提供一次。关节量与末端位姿来自同一反馈周期，
/// 字段间时间同步性由驱动层保证。
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RobotState {
    /// 关节位置（弧度）[J1..J7]
    pub joint_pos: JointPositions,
    /// 关节速度（rad/s）[J1..J7]
    pub joint_vel: JointArray<f64>,
    /// 末端位姿（基座坐标系）
    pub end_pose: CartesianPose,
}

impl RobotState {
    /// 创建新的实测状态
    pub fn new(
        joint_pos: JointPositions,
        joint_vel: JointArray<f64>,
        end_pose: CartesianPose,
    ) -> Self {
        RobotState {
            joint_pos,
            joint_vel,
            end_pose,
        }
    }

    /// 静止在给定关节位置的状态（测试和起始锚点常用）
    pub fn at_rest(joint_pos: JointPositions, end_pose: CartesianPose) -> Self {
        RobotState {
            joint_pos,
            joint_vel: JointArray::splat(0.0),
            end_pose,
        }
    }
}

impl Default for RobotState {
    fn default() -> Self {
        RobotState {
            joint_pos: JointArray::splat(Rad::ZERO),
            joint_vel: JointArray::splat(0.0),
            end_pose: CartesianPose::IDENTITY,
        }
    }
}
