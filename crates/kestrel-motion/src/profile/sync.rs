//! 多自由度时间同步
//!
//! 每个自由度先独立规划最短时间，取 T = max 后把其余自由度拉伸到
//! 恰好 T 完成：
//!
//! - **静止起步的自由度**：精确时间膨胀 q(αt)，α = Tmin/T ≤ 1。
//!   速度按 α、加速度按 α²、加加速度按 α³ 缩放，限制天然保持。
//! - **边界速度非零的自由度**（在线重规划的拼接点）：时间膨胀会改变
//!   边界速度、破坏拼接连续性，改为对限制做统一缩放因子的有界二分，
//!   边界速度保持不变；二分无法覆盖的残差由末尾零速保持段吸收。
//! - **零距离自由度**：时长为 T 的静止保持段。
//!
//! 复合链（停车段 + 主段）只拉伸静止起步的主段，停车段时长不变。

use smallvec::SmallVec;

use super::double_s::{EPS_TIME, EPS_VEL, PlanError, Sample, Segment};
use crate::limits::AxisLimits;

/// 限制缩放二分的迭代次数
const STRETCH_ITERS: usize = 64;

/// 带时间膨胀因子的段
#[derive(Debug, Clone, Copy)]
struct ScaledSegment {
    seg: Segment,
    /// 膨胀因子 α ∈ (0, 1]，拉伸后时长 = seg.duration() / α
    scale: f64,
    /// 在整条轨迹上的起始时刻
    t_start: f64,
}

impl ScaledSegment {
    fn stretched_duration(&self) -> f64 {
        self.seg.duration() / self.scale
    }

    fn sample(&self, t: f64) -> Sample {
        let inner = (t - self.t_start) * self.scale;
        let s = self.seg.sample(inner);
        Sample {
            position: s.position,
            velocity: s.velocity * self.scale,
            acceleration: s.acceleration * self.scale * self.scale,
            jerk: s.jerk * self.scale * self.scale * self.scale,
        }
    }
}

/// 单自由度轨迹：双 S 段链（至多 停车段 + 主段 + 保持段）
#[derive(Debug, Clone)]
pub(crate) struct DofProfile {
    segments: SmallVec<[ScaledSegment; 3]>,
    duration: f64,
}

impl DofProfile {
    /// 规划单自由度最短时间轨迹
    ///
    /// 边界速度反向、超速或停车距离不足时自动生成复合链：
    /// 先 jerk 受限地停车，再从静止规划到目标。
    pub(crate) fn plan(
        q0: f64,
        q1: f64,
        v0: f64,
        v1: f64,
        lim: &AxisLimits,
    ) -> Result<DofProfile, PlanError> {
        let mut segments: SmallVec<[ScaledSegment; 3]> = SmallVec::new();

        match Segment::plan(q0, q1, v0, v1, lim) {
            Ok(seg) => {
                segments.push(ScaledSegment {
                    seg,
                    scale: 1.0,
                    t_start: 0.0,
                });
            }
            Err(PlanError::NeedsStop) if v0.abs() > EPS_VEL => {
                let stop = Segment::stop_ramp(q0, v0, lim);
                // 停车后从静止出发，NeedsStop 不可能再出现
                let main = Segment::plan(stop.end_position(), q1, 0.0, v1, lim)?;
                segments.push(ScaledSegment {
                    seg: stop,
                    scale: 1.0,
                    t_start: 0.0,
                });
                segments.push(ScaledSegment {
                    seg: main,
                    scale: 1.0,
                    t_start: stop.duration(),
                });
            }
            Err(PlanError::NeedsStop) => {
                // 静止状态下的 NeedsStop 只剩一种成因：混合速度在
                // 给定距离内加不上去
                return Err(PlanError::InvalidBlend {
                    value: v1,
                    limit: lim.max_velocity,
                });
            }
            Err(e) => return Err(e),
        }

        let duration = segments.iter().map(|s| s.stretched_duration()).sum();
        Ok(DofProfile { segments, duration })
    }

    /// 总时长
    #[inline]
    pub(crate) fn duration(&self) -> f64 {
        self.duration
    }

    /// 终点位置
    pub(crate) fn end_position(&self) -> f64 {
        self.segments
            .last()
            .map(|s| s.seg.end_position())
            .unwrap_or(0.0)
    }

    /// 终点速度（含膨胀因子）
    pub(crate) fn end_velocity(&self) -> f64 {
        self.segments
            .last()
            .map(|s| s.seg.end_velocity() * s.scale)
            .unwrap_or(0.0)
    }

    /// 采样；t ≥ duration 时返回终点状态
    pub(crate) fn sample(&self, t: f64) -> Sample {
        for ss in &self.segments {
            if t < ss.t_start + ss.stretched_duration() {
                return ss.sample(t.max(ss.t_start));
            }
        }
        // 轨迹结束：保持终点状态
        let last = self.segments.last().expect("profile has segments");
        Sample {
            position: last.seg.end_position(),
            velocity: last.seg.end_velocity() * last.scale,
            acceleration: 0.0,
            jerk: 0.0,
        }
    }

    /// 把轨迹拉伸到恰好 `target` 秒完成
    ///
    /// 前提：`target ≥ self.duration()`（同步时 T 取各自由度最大值）。
    pub(crate) fn stretch_to(&mut self, target: f64, lim: &AxisLimits) {
        let extra = target - self.duration;
        if extra <= EPS_TIME {
            return;
        }

        let last_index = self.segments.len() - 1;
        let last = &mut self.segments[last_index];

        if last.seg.duration() < EPS_TIME {
            // 零距离自由度：换成时长合适的保持段
            let hold = Segment::hold(last.seg.end_position(), target - last.t_start);
            last.seg = hold;
            last.scale = 1.0;
        } else if last.seg.starts_at_rest() {
            // 静止起步：精确时间膨胀
            let current = last.stretched_duration();
            last.scale = last.seg.duration() / (current + extra);
        } else {
            // 拼接点速度非零：限制缩放二分，边界速度不动
            Self::stretch_moving_segment(last, extra, lim);
        }

        self.recompute_timeline();

        // 二分覆盖不到的残差：终点静止时由保持段吸收
        let shortfall = target - self.duration;
        if shortfall > EPS_TIME {
            let last = &mut self.segments[last_index];
            if last.seg.end_velocity().abs() < EPS_VEL && (last.scale - 1.0).abs() < 1e-12 {
                last.seg.extend(shortfall);
            } else {
                tracing::trace!(
                    shortfall,
                    "synchronization shortfall not absorbable, accepting closest duration"
                );
            }
            self.recompute_timeline();
        }
    }

    /// 对边界速度非零的段做限制缩放二分
    fn stretch_moving_segment(last: &mut ScaledSegment, extra: f64, lim: &AxisLimits) {
        let needed = last.stretched_duration() + extra;
        let q0 = last.seg.start_position();
        let q1 = last.seg.end_position();
        let v0 = last.seg.start_velocity();
        let v1 = last.seg.end_velocity();

        // 边界速度决定缩放下界：缩放后 vmax 不得低于边界速度
        let v_bound = v0.abs().max(v1.abs());
        let beta_min = (v_bound / lim.max_velocity * (1.0 + 1e-6)).min(1.0);
        if beta_min >= 1.0 {
            return;
        }

        let mut lo = beta_min;
        let mut hi = 1.0;
        let mut best: Option<(Segment, f64)> = None;
        for _ in 0..STRETCH_ITERS {
            let mid = 0.5 * (lo + hi);
            match Segment::plan(q0, q1, v0, v1, &lim.scaled(mid)) {
                Ok(seg) => {
                    let err = (seg.duration() - needed).abs();
                    if best.as_ref().is_none_or(|(_, e)| err < *e) {
                        best = Some((seg, err));
                    }
                    if seg.duration() < needed {
                        hi = mid;
                    } else {
                        lo = mid;
                    }
                }
                // 缩放过强导致不可行：往大因子方向收
                Err(_) => lo = mid,
            }
        }

        if let Some((seg, _)) = best {
            last.seg = seg;
            last.scale = 1.0;
        }
    }

    fn recompute_timeline(&mut self) {
        let mut t = 0.0;
        for ss in &mut self.segments {
            ss.t_start = t;
            t += ss.stretched_duration();
        }
        self.duration = t;
    }
}

/// 把一组自由度同步到公共完成时刻
///
/// 返回公共时长 T = max(各自由度最短时长)。
pub(crate) fn synchronize(profiles: &mut [DofProfile], limits: &[AxisLimits]) -> f64 {
    debug_assert_eq!(profiles.len(), limits.len());
    let t = profiles
        .iter()
        .map(|p| p.duration())
        .fold(0.0f64, f64::max);
    for (profile, lim) in profiles.iter_mut().zip(limits) {
        profile.stretch_to(t, lim);
    }
    t
}
