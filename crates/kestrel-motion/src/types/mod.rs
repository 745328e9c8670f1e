//! 核心数据类型
//!
//! 强类型单位、关节数组、笛卡尔空间类型、错误体系、实测状态。

pub mod cartesian;
pub mod error;
pub mod joint;
pub mod state;
pub mod units;

pub use cartesian::{CartesianPose, CartesianVelocity, Position3D, Quaternion};
pub use error::{AbortReason, MotionError};
pub use joint::{DOF, Joint, JointArray, JointPositions, JointVelocities};
pub use state::RobotState;
pub use units::{Deg, Rad};
