//! 关节索引和数组
//!
//! 提供编译期安全的关节索引，防止越界和索引错误。
//!
//! Kestrel 是 7 自由度冗余机械臂，所有关节量均为 7 元数组。
//!
//! # 示例
//!
//! ```rust
//! use kestrel_motion::types::{Joint, JointArray, Rad};
//!
//! let positions = JointArray::new([
//!     Rad(0.0), Rad(0.1), Rad(0.2), Rad(0.3),
//!     Rad(0.4), Rad(0.5), Rad(0.6),
//! ]);
//!
//! // 类型安全的索引访问
//! assert_eq!(positions[Joint::J1], Rad(0.0));
//!
//! // 映射转换
//! let doubled = positions.map(|r| r * 2.0);
//! assert_eq!(doubled[Joint::J7], Rad(1.2));
//! ```

use super::units::Rad;
use std::fmt;
use std::ops::{Index, IndexMut};

/// 关节数量（7 自由度冗余构型）
pub const DOF: usize = 7;

/// 关节枚举
///
/// 表示 Kestrel 机械臂的 7 个关节。使用枚举提供编译期类型安全。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Joint {
    /// 关节 1（基座旋转）
    J1 = 0,
    /// 关节 2（肩部俯仰）
    J2 = 1,
    /// 关节 3（上臂旋转）
    J3 = 2,
    /// 关节 4（肘部俯仰）
    J4 = 3,
    /// 关节 5（前臂旋转）
    J5 = 4,
    /// 关节 6（腕部俯仰）
    J6 = 5,
    /// 关节 7（末端旋转）
    J7 = 6,
}

impl Joint {
    /// 所有关节的数组
    pub const ALL: [Joint; DOF] = [
        Joint::J1,
        Joint::J2,
        Joint::J3,
        Joint::J4,
        Joint::J5,
        Joint::J6,
        Joint::J7,
    ];

    /// 获取关节索引（0-6）
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// 从索引创建关节（范围检查）
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Joint::J1),
            1 => Some(Joint::J2),
            2 => Some(Joint::J3),
            3 => Some(Joint::J4),
            4 => Some(Joint::J5),
            5 => Some(Joint::J6),
            6 => Some(Joint::J7),
            _ => None,
        }
    }

    /// 获取关节名称
    pub const fn name(self) -> &'static str {
        match self {
            Joint::J1 => "J1",
            Joint::J2 => "J2",
            Joint::J3 => "J3",
            Joint::J4 => "J4",
            Joint::J5 => "J5",
            Joint::J6 => "J6",
            Joint::J7 => "J7",
        }
    }
}

impl fmt::Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 关节数组
///
/// 类型安全的 7 关节数组容器，支持索引、迭代和映射操作。
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JointArray<T> {
    data: [T; DOF],
}

// 如果 T 实现了 Copy，则 JointArray<T> 也实现 Copy
impl<T: Copy> Copy for JointArray<T> {}

impl<T> JointArray<T> {
    /// 创建新的关节数组
    #[inline]
    pub const fn new(data: [T; DOF]) -> Self {
        JointArray { data }
    }

    /// 获取内部数组的引用
    #[inline]
    pub fn as_array(&self) -> &[T; DOF] {
        &self.data
    }

    /// 获取内部数组（消耗 self）
    #[inline]
    pub fn into_array(self) -> [T; DOF] {
        self.data
    }

    /// 迭代器
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// 可变迭代器
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.data.iter_mut()
    }

    /// 映射转换
    pub fn map<U, F>(self, f: F) -> JointArray<U>
    where
        F: FnMut(T) -> U,
    {
        JointArray::new(self.data.map(f))
    }

    /// 带关节索引的映射转换
    pub fn map_with_joint<U, F>(self, mut f: F) -> JointArray<U>
    where
        F: FnMut(Joint, T) -> U,
    {
        let mut joints = Joint::ALL.iter();
        JointArray::new(self.data.map(|v| {
            let joint = *joints.next().expect("joint count matches DOF");
            f(joint, v)
        }))
    }

    /// 与另一个数组逐元素执行映射
    pub fn map_with<U, V, F>(self, other: JointArray<U>, mut f: F) -> JointArray<V>
    where
        F: FnMut(T, U) -> V,
    {
        let mut rhs = other.data.into_iter();
        JointArray::new(self.data.map(|v| {
            let o = rhs.next().expect("joint count matches DOF");
            f(v, o)
        }))
    }
}

impl<T: Copy> JointArray<T> {
    /// 创建所有元素相同的数组
    #[inline]
    pub const fn splat(value: T) -> Self {
        JointArray::new([value; DOF])
    }
}

impl<T: Default> Default for JointArray<T> {
    fn default() -> Self {
        JointArray::new(std::array::from_fn(|_| T::default()))
    }
}

// 索引访问
impl<T> Index<Joint> for JointArray<T> {
    type Output = T;

    #[inline]
    fn index(&self, joint: Joint) -> &T {
        &self.data[joint.index()]
    }
}

impl<T> IndexMut<Joint> for JointArray<T> {
    #[inline]
    fn index_mut(&mut self, joint: Joint) -> &mut T {
        &mut self.data[joint.index()]
    }
}

impl<T> Index<usize> for JointArray<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &T {
        &self.data[index]
    }
}

impl<T> IndexMut<usize> for JointArray<T> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.data[index]
    }
}

// From/Into 转换
impl<T> From<[T; DOF]> for JointArray<T> {
    #[inline]
    fn from(data: [T; DOF]) -> Self {
        JointArray::new(data)
    }
}

impl<T> From<JointArray<T>> for [T; DOF] {
    #[inline]
    fn from(arr: JointArray<T>) -> Self {
        arr.data
    }
}

// IntoIterator 实现
impl<T> IntoIterator for JointArray<T> {
    type Item = T;
    type IntoIter = std::array::IntoIter<T, DOF>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a JointArray<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

/// 关节位置（弧度）
pub type JointPositions = JointArray<Rad>;

/// 关节速度（rad/s）
pub type JointVelocities = JointArray<f64>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joint_index() {
        assert_eq!(Joint::J1.index(), 0);
        assert_eq!(Joint::J7.index(), 6);
    }

    #[test]
    fn test_joint_from_index() {
        assert_eq!(Joint::from_index(0), Some(Joint::J1));
        assert_eq!(Joint::from_index(6), Some(Joint::J7));
        assert_eq!(Joint::from_index(7), None);
    }

    #[test]
    fn test_joint_array_index() {
        let mut arr = JointArray::splat(0.0f64);
        arr[Joint::J3] = 1.5;
        assert_eq!(arr[2], 1.5);
        assert_eq!(arr[Joint::J3], 1.5);
    }

    #[test]
    fn test_joint_array_map_with() {
        let a = JointArray::splat(2.0f64);
        let b = JointArray::splat(3.0f64);
        let c = a.map_with(b, |x, y| x * y);
        assert!(c.iter().all(|&v| v == 6.0));
    }

    #[test]
    fn test_joint_array_map_with_joint() {
        let arr = JointArray::splat(1.0f64);
        let scaled = arr.map_with_joint(|joint, v| v * (joint.index() + 1) as f64);
        assert_eq!(scaled[Joint::J1], 1.0);
        assert_eq!(scaled[Joint::J7], 7.0);
    }
}
