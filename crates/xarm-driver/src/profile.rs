//! 运动 profile：速度/加速度限制的一致快照
//!
//! profile 可在运行期被 `set_speed`/`set_acceleration` 修改，
//! 以 `ArcSwap` 原子换入不可变快照：轨迹生成在开始时取一次快照，
//! 全程看到一致的值，不需要在整个计算期间持锁。

use tracing::warn;

/// 默认关节速度（度/秒）
pub const DEFAULT_SPEED_DEGS_PER_SEC: f64 = 50.0;

/// 默认关节加速度（度/秒²）
pub const DEFAULT_ACCEL_DEGS_PER_SEC2: f64 = 500.0;

/// 运动选项允许的最小速度（度/秒）
pub const MIN_SPEED_DEGS_PER_SEC: f64 = 3.0;

/// 运动选项允许的最大速度（度/秒）
pub const MAX_SPEED_DEGS_PER_SEC: f64 = 180.0;

/// 运动选项允许的最大加速度（度/秒²）
pub const MAX_ACCEL_DEGS_PER_SEC2: f64 = 1145.0;

/// 跨路径点加速度（度/秒²）。到达巡航速度后继续跨越路径点
/// 不需要重新缓升，用这个更高的固定值。全系 xArm 上限为 1145。
pub const INTERWAYPOINT_ACCEL_DEGS_PER_SEC2: f64 = 600.0;

/// 运动 profile 快照（弧度单位）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionProfile {
    /// 最大关节速度（rad/s）
    pub speed: f64,
    /// 最大关节加速度（rad/s²）
    pub acceleration: f64,
}

impl MotionProfile {
    /// 从度单位构建
    pub fn from_degrees(speed_degs: f64, accel_degs: f64) -> Self {
        Self {
            speed: speed_degs.to_radians(),
            acceleration: accel_degs.to_radians(),
        }
    }

    /// 应用单次运动的覆盖选项
    pub(crate) fn with_options(mut self, opts: &MoveOptions) -> Self {
        if let Some(speed) = opts.max_vel_rads {
            self.speed = speed;
        }
        if let Some(acceleration) = opts.max_acc_rads {
            self.acceleration = acceleration;
        }
        self
    }
}

impl Default for MotionProfile {
    fn default() -> Self {
        Self::from_degrees(DEFAULT_SPEED_DEGS_PER_SEC, DEFAULT_ACCEL_DEGS_PER_SEC2)
    }
}

/// 单次运动的覆盖选项（弧度单位）
///
/// `None` 表示沿用当前 profile。
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MoveOptions {
    /// 本次运动的最大关节速度（rad/s）
    pub max_vel_rads: Option<f64>,
    /// 本次运动的最大关节加速度（rad/s²）
    pub max_acc_rads: Option<f64>,
}

impl MoveOptions {
    /// 把选项钳制到设备允许的范围内，越界时告警
    pub(crate) fn clamped(self) -> Self {
        Self {
            max_vel_rads: self.max_vel_rads.map(|v| {
                clamp_option(
                    v,
                    MIN_SPEED_DEGS_PER_SEC.to_radians(),
                    MAX_SPEED_DEGS_PER_SEC.to_radians(),
                    "max velocity",
                )
            }),
            max_acc_rads: self.max_acc_rads.map(|v| {
                clamp_option(v, 0.0, MAX_ACCEL_DEGS_PER_SEC2.to_radians(), "max acceleration")
            }),
        }
    }
}

fn clamp_option(val: f64, min_val: f64, max_val: f64, name: &str) -> f64 {
    if val < min_val {
        warn!("invalid {name} option {val:.2}: setting to minimum {min_val:.2}");
        min_val
    } else if val > max_val {
        warn!("invalid {name} option {val:.2}: setting to maximum {max_val:.2}");
        max_val
    } else {
        val
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_from_degrees() {
        let profile = MotionProfile::from_degrees(90.0, 180.0);
        assert!((profile.speed - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert!((profile.acceleration - std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn test_with_options_overrides() {
        let profile = MotionProfile::default();
        let opts = MoveOptions {
            max_vel_rads: Some(1.0),
            max_acc_rads: None,
        };
        let merged = profile.with_options(&opts);
        assert_eq!(merged.speed, 1.0);
        assert_eq!(merged.acceleration, profile.acceleration);
    }

    #[test]
    fn test_clamped_limits() {
        let opts = MoveOptions {
            max_vel_rads: Some(100.0), // 远超 180°/s
            max_acc_rads: Some(-1.0),
        }
        .clamped();
        assert_eq!(opts.max_vel_rads, Some(MAX_SPEED_DEGS_PER_SEC.to_radians()));
        assert_eq!(opts.max_acc_rads, Some(0.0));

        let opts = MoveOptions {
            max_vel_rads: Some(0.001), // 低于 3°/s
            max_acc_rads: None,
        }
        .clamped();
        assert_eq!(opts.max_vel_rads, Some(MIN_SPEED_DEGS_PER_SEC.to_radians()));
    }

    #[test]
    fn test_clamped_in_range_untouched() {
        let opts = MoveOptions {
            max_vel_rads: Some(1.0),
            max_acc_rads: Some(2.0),
        };
        assert_eq!(opts.clamped(), opts);
    }
}
