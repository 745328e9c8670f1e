//! 标量双 S 曲线段（jerk 受限的七段速度规律）
//!
//! 单个自由度的时间参数化运动规律 q(t)：加加速度恒为 ±jmax 或 0，
//! 加速度、速度连续，且任意时刻 |v| ≤ vmax、|a| ≤ amax、|jerk| ≤ jmax。
//!
//! 七个阶段：
//!
//! ```text
//! [jerk+] [accel] [jerk-] [cruise] [jerk-] [decel] [jerk+]
//!  Tj1    Ta-2Tj1  Tj1      Tv      Tj2    Td-2Tj2  Tj2
//! ```
//!
//! # 规划算法
//!
//! 峰值速度通过对"无匀速段位移" d(vp) 的二分求解：d(vp) 在
//! vp ∈ [max(v0,v1), vmax] 上严格单调递增，
//! d(vmax) ≤ h 时存在匀速段，否则二分 d(vp) = h。
//! 二分在规划期（实时路径之外）执行，迭代次数固定上界。
//!
//! 边界速度反向、超速或停车距离不足的情况由上层
//! [`DofProfile`](super::DofProfile) 以"先停车再规划"的复合段处理。

use crate::limits::AxisLimits;

/// 时间与速度比较的数值容差
pub(crate) const EPS_TIME: f64 = 1e-9;
pub(crate) const EPS_VEL: f64 = 1e-9;
pub(crate) const EPS_POS: f64 = 1e-12;

/// 二分迭代次数（固定上界，保证有界时间）
const BISECT_ITERS: usize = 64;

/// 轨迹采样点
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// 位置
    pub position: f64,
    /// 速度
    pub velocity: f64,
    /// 加速度
    pub acceleration: f64,
    /// 加加速度
    pub jerk: f64,
}

/// 段规划失败原因（crate 内部）
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum PlanError {
    /// 边界速度反向/超速或停车距离不足，需要先停车（复合段处理）
    NeedsStop,
    /// 途经点的混合速度与该段方向或限速不相容
    InvalidBlend {
        /// 混合速度（沿段方向变换后）
        value: f64,
        /// 该段的速度上限
        limit: f64,
    },
}

/// 双 S 曲线段
///
/// 内部以"沿运动方向"的变换坐标存储（σ = ±1），
/// 采样时变换回原坐标。相位时长在构造时确定，采样为闭式求值。
#[derive(Debug, Clone, Copy)]
pub(crate) struct Segment {
    /// 起点位置（原坐标）
    q0: f64,
    /// 方向符号
    sigma: f64,
    /// 位移（变换坐标，≥ 0）
    h: f64,
    /// 起点速度（变换坐标，≥ 0）
    v0: f64,
    /// 终点速度（变换坐标，≥ 0）
    v1: f64,
    /// 规划使用的加加速度
    jerk: f64,
    /// 加速相加加速度子段时长
    t_j1: f64,
    /// 加速相总时长
    t_a: f64,
    /// 匀速相时长
    t_v: f64,
    /// 减速相加加速度子段时长
    t_j2: f64,
    /// 减速相总时长
    t_d: f64,
    /// 峰值速度（变换坐标）
    v_lim: f64,
    /// 段总时长（保持段可长于相位总和）
    duration: f64,
}

/// 速度从 v 变化到 vp 所需的相位时长 (t_j, t_total)
///
/// 要求 vp ≥ v ≥ 0。jerk 子段三角形（a 峰值未达 amax）或梯形。
fn ramp_times(v: f64, vp: f64, lim: &AxisLimits) -> (f64, f64) {
    let dv = vp - v;
    if dv <= EPS_VEL {
        return (0.0, 0.0);
    }
    if dv * lim.max_jerk < lim.max_acceleration * lim.max_acceleration {
        // 加速度未达 amax：三角形加加速度相
        let t_j = (dv / lim.max_jerk).sqrt();
        (t_j, 2.0 * t_j)
    } else {
        let t_j = lim.max_acceleration / lim.max_jerk;
        (t_j, t_j + dv / lim.max_acceleration)
    }
}

/// 无匀速段时，以峰值速度 vp 完成 v0→vp→v1 变换所需的总位移
fn distance_at_peak(v0: f64, v1: f64, vp: f64, lim: &AxisLimits) -> f64 {
    let (_, t_a) = ramp_times(v0, vp, lim);
    let (_, t_d) = ramp_times(v1, vp, lim);
    (v0 + vp) / 2.0 * t_a + (vp + v1) / 2.0 * t_d
}

impl Segment {
    /// 规划最短时间段
    ///
    /// `v0`/`v1` 为原坐标下的带符号边界速度。
    /// 返回 `NeedsStop` 的情况交由上层以复合段处理。
    pub(crate) fn plan(
        q0: f64,
        q1: f64,
        v0: f64,
        v1: f64,
        lim: &AxisLimits,
    ) -> Result<Segment, PlanError> {
        let h_signed = q1 - q0;

        // 零距离、静止边界：零时长段
        if h_signed.abs() < EPS_POS && v0.abs() < EPS_VEL && v1.abs() < EPS_VEL {
            return Ok(Segment::hold(q1, 0.0));
        }

        // 方向变换：位移为零但有初速时，方向由初速决定（下游判定 NeedsStop）
        let sigma = if h_signed.abs() >= EPS_POS {
            h_signed.signum()
        } else {
            v0.signum()
        };
        let h = sigma * h_signed;
        let v0t = sigma * v0;
        let v1t = sigma * v1;

        // 混合速度必须沿段方向且不超限
        if v1t < -EPS_VEL || v1t > lim.max_velocity * (1.0 + 1e-9) {
            return Err(PlanError::InvalidBlend {
                value: v1t,
                limit: lim.max_velocity,
            });
        }
        let v1t = v1t.clamp(0.0, lim.max_velocity);

        // 初速反向或超速：先停车
        if v0t < -EPS_VEL || v0t > lim.max_velocity * (1.0 + 1e-6) {
            return Err(PlanError::NeedsStop);
        }
        let v0t = v0t.clamp(0.0, lim.max_velocity);

        // 可行性：边界速度间直接过渡所需的最短位移
        let v_floor = v0t.max(v1t);
        let d_floor = distance_at_peak(v0t, v1t, v_floor, lim);
        if h + EPS_POS < d_floor {
            return Err(PlanError::NeedsStop);
        }

        // 峰值速度：达到 vmax 则有匀速段，否则二分
        let d_max = distance_at_peak(v0t, v1t, lim.max_velocity, lim);
        let (v_lim, t_v) = if d_max <= h {
            (lim.max_velocity, (h - d_max) / lim.max_velocity)
        } else {
            let mut lo = v_floor;
            let mut hi = lim.max_velocity;
            for _ in 0..BISECT_ITERS {
                let mid = 0.5 * (lo + hi);
                if distance_at_peak(v0t, v1t, mid, lim) <= h {
                    lo = mid;
                } else {
                    hi = mid;
                }
            }
            (lo, 0.0)
        };

        let (t_j1, t_a) = ramp_times(v0t, v_lim, lim);
        let (t_j2, t_d) = ramp_times(v1t, v_lim, lim);
        let duration = t_a + t_v + t_d;

        Ok(Segment {
            q0,
            sigma,
            h,
            v0: v0t,
            v1: v1t,
            jerk: lim.max_jerk,
            t_j1,
            t_a,
            t_v,
            t_j2,
            t_d,
            v_lim,
            duration,
        })
    }

    /// 停车段：从带符号初速 v0 减速到零（jerk 受限）
    ///
    /// 初速可以超过 vmax（在线重规划时物理上无法瞬时降速），
    /// 减速过程仍遵守 amax/jmax。
    pub(crate) fn stop_ramp(q0: f64, v0: f64, lim: &AxisLimits) -> Segment {
        let sigma = if v0 >= 0.0 { 1.0 } else { -1.0 };
        let v0t = v0.abs();
        let (t_j2, t_d) = ramp_times(0.0, v0t, lim);
        let h = v0t * t_d / 2.0;

        Segment {
            q0,
            sigma,
            h,
            v0: v0t,
            v1: 0.0,
            jerk: lim.max_jerk,
            t_j1: 0.0,
            t_a: 0.0,
            t_v: 0.0,
            t_j2,
            t_d,
            v_lim: v0t,
            duration: t_d,
        }
    }

    /// 保持段：在 q 处静止 `duration` 秒
    pub(crate) fn hold(q: f64, duration: f64) -> Segment {
        Segment {
            q0: q,
            sigma: 1.0,
            h: 0.0,
            v0: 0.0,
            v1: 0.0,
            jerk: 0.0,
            t_j1: 0.0,
            t_a: 0.0,
            t_v: 0.0,
            t_j2: 0.0,
            t_d: 0.0,
            v_lim: 0.0,
            duration,
        }
    }

    /// 段总时长
    #[inline]
    pub(crate) fn duration(&self) -> f64 {
        self.duration
    }

    /// 延长段时长（仅对终点静止的段有意义：末尾追加保持）
    pub(crate) fn extend(&mut self, extra: f64) {
        debug_assert!(self.v1.abs() < EPS_VEL);
        self.duration += extra;
    }

    /// 起点位置（原坐标）
    #[inline]
    pub(crate) fn start_position(&self) -> f64 {
        self.q0
    }

    /// 终点位置（原坐标）
    #[inline]
    pub(crate) fn end_position(&self) -> f64 {
        self.q0 + self.sigma * self.h
    }

    /// 终点速度（原坐标）
    #[inline]
    pub(crate) fn end_velocity(&self) -> f64 {
        self.sigma * self.v1
    }

    /// 起点速度（原坐标）
    #[inline]
    pub(crate) fn start_velocity(&self) -> f64 {
        self.sigma * self.v0
    }

    /// 段起点是否静止
    #[inline]
    pub(crate) fn starts_at_rest(&self) -> bool {
        self.v0.abs() < EPS_VEL
    }

    /// 闭式采样
    ///
    /// 相位总和之后（包括保持段的尾部）返回终点状态。
    pub(crate) fn sample(&self, t: f64) -> Sample {
        let phases = self.t_a + self.t_v + self.t_d;
        let j = self.jerk;

        // 变换坐标下的 (位移, 速度, 加速度, 加加速度)
        let (dq, v, a, jk) = if t <= 0.0 {
            (0.0, self.v0, 0.0, 0.0)
        } else if t >= phases {
            (self.h, self.v1, 0.0, 0.0)
        } else if t < self.t_j1 {
            // 1. 加加速
            (
                self.v0 * t + j * t.powi(3) / 6.0,
                self.v0 + j * t * t / 2.0,
                j * t,
                j,
            )
        } else if t < self.t_a - self.t_j1 {
            // 2. 匀加速
            let a_lim = j * self.t_j1;
            (
                self.v0 * t + (a_lim / 6.0) * (3.0 * t * t - 3.0 * self.t_j1 * t + self.t_j1 * self.t_j1),
                self.v0 + a_lim * (t - self.t_j1 / 2.0),
                a_lim,
                0.0,
            )
        } else if t < self.t_a {
            // 3. 减加速
            let r = self.t_a - t;
            (
                (self.v_lim + self.v0) * self.t_a / 2.0 - self.v_lim * r + j * r.powi(3) / 6.0,
                self.v_lim - j * r * r / 2.0,
                j * r,
                -j,
            )
        } else if t < self.t_a + self.t_v {
            // 4. 匀速
            (
                (self.v_lim + self.v0) * self.t_a / 2.0 + self.v_lim * (t - self.t_a),
                self.v_lim,
                0.0,
                0.0,
            )
        } else {
            // 减速相：从段末端回锚，保证终点精确落在 h
            let tau = t - (phases - self.t_d);
            let d_dec_start = self.h - (self.v_lim + self.v1) * self.t_d / 2.0;
            if tau < self.t_j2 {
                // 5. 加减速
                (
                    d_dec_start + self.v_lim * tau - j * tau.powi(3) / 6.0,
                    self.v_lim - j * tau * tau / 2.0,
                    -j * tau,
                    -j,
                )
            } else if tau < self.t_d - self.t_j2 {
                // 6. 匀减速
                let a_lim = -j * self.t_j2;
                (
                    d_dec_start
                        + self.v_lim * tau
                        + (a_lim / 6.0) * (3.0 * tau * tau - 3.0 * self.t_j2 * tau + self.t_j2 * self.t_j2),
                    self.v_lim + a_lim * (tau - self.t_j2 / 2.0),
                    a_lim,
                    0.0,
                )
            } else {
                // 7. 减减速
                let r = phases - t;
                (
                    self.h - self.v1 * r - j * r.powi(3) / 6.0,
                    self.v1 + j * r * r / 2.0,
                    -j * r,
                    j,
                )
            }
        };

        Sample {
            position: self.q0 + self.sigma * dq,
            velocity: self.sigma * v,
            acceleration: self.sigma * a,
            jerk: self.sigma * jk,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lim(v: f64, a: f64, j: f64) -> AxisLimits {
        AxisLimits::new(v, a, j).unwrap()
    }

    fn assert_within_limits(seg: &Segment, lim: &AxisLimits) {
        let n = 2000;
        let t_total = seg.duration();
        for i in 0..=n {
            let t = t_total * i as f64 / n as f64;
            let s = seg.sample(t);
            assert!(
                s.velocity.abs() <= lim.max_velocity * (1.0 + 1e-6),
                "v={} at t={}",
                s.velocity,
                t
            );
            assert!(
                s.acceleration.abs() <= lim.max_acceleration * (1.0 + 1e-6),
                "a={} at t={}",
                s.acceleration,
                t
            );
            assert!(s.jerk.abs() <= lim.max_jerk * (1.0 + 1e-6));
        }
    }

    #[test]
    fn test_rest_to_rest_reaches_target() {
        let l = lim(1.0, 2.0, 50.0);
        let seg = Segment::plan(0.0, 0.5, 0.0, 0.0, &l).unwrap();
        let end = seg.sample(seg.duration());
        assert!((end.position - 0.5).abs() < 1e-9);
        assert!(end.velocity.abs() < 1e-9);
        assert_within_limits(&seg, &l);
    }

    #[test]
    fn test_rest_to_rest_negative_direction() {
        let l = lim(1.5, 3.0, 100.0);
        let seg = Segment::plan(0.2, -0.7, 0.0, 0.0, &l).unwrap();
        let end = seg.sample(seg.duration());
        assert!((end.position + 0.7).abs() < 1e-9);
        assert_within_limits(&seg, &l);
    }

    #[test]
    fn test_long_move_has_cruise_phase() {
        let l = lim(1.0, 2.0, 50.0);
        let seg = Segment::plan(0.0, 5.0, 0.0, 0.0, &l).unwrap();
        assert!(seg.t_v > 0.0);
        assert!((seg.v_lim - 1.0).abs() < 1e-12);
        // 匀速段中点应精确达到 vmax
        let mid = seg.sample(seg.t_a + seg.t_v / 2.0);
        assert!((mid.velocity - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_move_peak_below_vmax() {
        let l = lim(1.0, 2.0, 50.0);
        let seg = Segment::plan(0.0, 0.5, 0.0, 0.0, &l).unwrap();
        assert!(seg.t_v.abs() < 1e-9);
        assert!(seg.v_lim < 1.0);
        // 手算：0.5·vp² + 0.04·vp − 0.5 = 0 → vp ≈ 0.96077
        assert!((seg.v_lim - 0.960779).abs() < 1e-4);
        assert!((seg.duration() - 1.040779).abs() < 1e-4);
    }

    #[test]
    fn test_nonzero_start_velocity() {
        let l = lim(2.0, 4.0, 100.0);
        let seg = Segment::plan(0.0, 1.0, 0.8, 0.0, &l).unwrap();
        let start = seg.sample(0.0);
        assert!((start.velocity - 0.8).abs() < 1e-12);
        let end = seg.sample(seg.duration());
        assert!((end.position - 1.0).abs() < 1e-9);
        assert!(end.velocity.abs() < 1e-9);
        assert_within_limits(&seg, &l);
    }

    #[test]
    fn test_nonzero_end_velocity_blend() {
        let l = lim(2.0, 4.0, 100.0);
        let seg = Segment::plan(0.0, 1.0, 0.0, 0.5, &l).unwrap();
        let end = seg.sample(seg.duration());
        assert!((end.position - 1.0).abs() < 1e-9);
        assert!((end.velocity - 0.5).abs() < 1e-9);
        assert_within_limits(&seg, &l);
    }

    #[test]
    fn test_reversal_needs_stop() {
        let l = lim(1.0, 2.0, 50.0);
        // 正在向负方向运动，目标在正方向
        let err = Segment::plan(0.0, 1.0, -0.5, 0.0, &l).unwrap_err();
        assert_eq!(err, PlanError::NeedsStop);
    }

    #[test]
    fn test_insufficient_stopping_distance_needs_stop() {
        let l = lim(1.0, 2.0, 50.0);
        // 初速 1.0，目标仅 1cm：无法在限加速度内停住
        let err = Segment::plan(0.0, 0.01, 1.0, 0.0, &l).unwrap_err();
        assert_eq!(err, PlanError::NeedsStop);
    }

    #[test]
    fn test_invalid_blend_velocity() {
        let l = lim(1.0, 2.0, 50.0);
        let err = Segment::plan(0.0, 1.0, 0.0, 2.0, &l).unwrap_err();
        assert!(matches!(err, PlanError::InvalidBlend { .. }));
        // 反向混合速度同样拒绝
        let err = Segment::plan(0.0, 1.0, 0.0, -0.5, &l).unwrap_err();
        assert!(matches!(err, PlanError::InvalidBlend { .. }));
    }

    #[test]
    fn test_zero_distance_at_rest() {
        let l = lim(1.0, 2.0, 50.0);
        let seg = Segment::plan(0.3, 0.3, 0.0, 0.0, &l).unwrap();
        assert!(seg.duration() < 1e-12);
        let s = seg.sample(0.0);
        assert_eq!(s.position, 0.3);
    }

    #[test]
    fn test_stop_ramp() {
        let l = lim(1.0, 2.0, 50.0);
        let seg = Segment::stop_ramp(0.5, -0.8, &l);
        let start = seg.sample(0.0);
        assert!((start.velocity + 0.8).abs() < 1e-12);
        let end = seg.sample(seg.duration());
        assert!(end.velocity.abs() < 1e-9);
        // 向负方向减速：终点位置在起点左侧
        assert!(end.position < 0.5);
        assert_within_limits(&seg, &l);
    }

    #[test]
    fn test_hold_segment() {
        let seg = Segment::hold(1.2, 0.5);
        assert_eq!(seg.duration(), 0.5);
        let s = seg.sample(0.25);
        assert_eq!(s.position, 1.2);
        assert_eq!(s.velocity, 0.0);
    }

    #[test]
    fn test_velocity_continuity_across_phases() {
        let l = lim(1.0, 2.0, 50.0);
        let seg = Segment::plan(0.0, 3.0, 0.2, 0.0, &l).unwrap();
        let dt = 1e-5;
        let n = (seg.duration() / dt) as usize;
        let mut prev = seg.sample(0.0);
        for i in 1..=n {
            let s = seg.sample(i as f64 * dt);
            // 相邻采样的速度差不超过 amax·dt（加上数值余量）
            assert!(
                (s.velocity - prev.velocity).abs() <= l.max_acceleration * dt * 1.01 + 1e-12,
                "velocity jump at t={}",
                i as f64 * dt
            );
            prev = s;
        }
    }
}
